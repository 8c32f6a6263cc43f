//! Build graph
//!
//! Collects the action descriptors every module registers and serializes
//! them for the executor. A module's descriptors are committed all at once
//! or not at all.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::core::actions::{ActionDescriptor, Rule};
use crate::error::{GraphError, ModgraphError};

/// Format version written into the serialized graph
pub const GRAPH_FORMAT_VERSION: u32 = 1;

/// A registered action and the module that owns it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphAction {
    /// Owning module
    pub module: String,
    /// The action
    pub action: ActionDescriptor,
}

/// The build graph under construction
#[derive(Debug, Clone, Default)]
pub struct BuildGraph {
    actions: Vec<GraphAction>,
    outputs: BTreeMap<String, String>,
    generator_deps: BTreeSet<String>,
}

impl BuildGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every action of `module`
    ///
    /// If any output is already produced by another action (or twice by
    /// this set), nothing is registered.
    pub fn add_module_actions(
        &mut self,
        module: &str,
        actions: Vec<ActionDescriptor>,
    ) -> Result<(), GraphError> {
        let mut claimed = BTreeSet::new();
        for output in actions.iter().flat_map(|a| a.outputs.iter()) {
            if let Some(existing) = self.outputs.get(output) {
                return Err(GraphError::DuplicateOutput {
                    output: output.clone(),
                    module: module.to_string(),
                    existing: existing.clone(),
                });
            }
            if !claimed.insert(output.clone()) {
                return Err(GraphError::DuplicateOutput {
                    output: output.clone(),
                    module: module.to_string(),
                    existing: module.to_string(),
                });
            }
        }

        for output in claimed {
            self.outputs.insert(output, module.to_string());
        }
        self.actions.extend(actions.into_iter().map(|action| GraphAction {
            module: module.to_string(),
            action,
        }));
        Ok(())
    }

    /// Record paths that invalidate the graph itself
    pub fn add_generator_deps<I, S>(&mut self, deps: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.generator_deps.extend(deps.into_iter().map(Into::into));
    }

    /// All actions, in registration order
    pub fn actions(&self) -> &[GraphAction] {
        &self.actions
    }

    /// Actions registered by `module`
    pub fn actions_for<'a>(&'a self, module: &'a str) -> impl Iterator<Item = &'a ActionDescriptor> {
        self.actions
            .iter()
            .filter(move |a| a.module == module)
            .map(|a| &a.action)
    }

    /// Output path -> owning module
    pub fn outputs(&self) -> &BTreeMap<String, String> {
        &self.outputs
    }

    /// Generator dependencies, sorted
    pub fn generator_deps(&self) -> &BTreeSet<String> {
        &self.generator_deps
    }

    /// Number of registered actions
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether no action is registered
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Serialize the graph as pretty-printed JSON
    pub fn to_json(&self) -> Result<String, ModgraphError> {
        Ok(serde_json::to_string_pretty(&self.document())?)
    }

    /// SHA-256 of the serialized graph, hex encoded
    pub fn fingerprint(&self) -> Result<String, ModgraphError> {
        let json = self.to_json()?;
        Ok(hex::encode(Sha256::digest(json.as_bytes())))
    }

    fn document(&self) -> GraphDocument<'_> {
        let used: BTreeSet<Rule> = self.actions.iter().map(|a| a.action.rule).collect();
        GraphDocument {
            version: GRAPH_FORMAT_VERSION,
            rules: used
                .into_iter()
                .map(|rule| {
                    (
                        rule.name(),
                        RuleDocument {
                            command: rule.command(),
                            description: rule.description(),
                        },
                    )
                })
                .collect(),
            actions: self
                .actions
                .iter()
                .map(|a| ActionDocument {
                    module: &a.module,
                    command: a.action.command(),
                    action: &a.action,
                })
                .collect(),
            generator_deps: &self.generator_deps,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphDocument<'a> {
    version: u32,
    rules: BTreeMap<&'static str, RuleDocument>,
    actions: Vec<ActionDocument<'a>>,
    generator_deps: &'a BTreeSet<String>,
}

#[derive(Serialize)]
struct RuleDocument {
    command: &'static str,
    description: &'static str,
}

#[derive(Serialize)]
struct ActionDocument<'a> {
    module: &'a str,
    #[serde(flatten)]
    action: &'a ActionDescriptor,
    command: String,
}
