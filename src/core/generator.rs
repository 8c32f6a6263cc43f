//! Build graph generation
//!
//! Drives every declared module through its generation pass. The pass for
//! one module ([`generate_module`]) touches no shared mutable state, so
//! callers may run many of them at once; their results are committed to
//! the [`BuildGraph`] by [`assemble`] in dependency order.

use std::sync::Arc;

use crate::core::config::GenConfig;
use crate::core::declaration::{instantiate, DeclarationSet, ModuleInstance, ModuleTypeRegistry};
use crate::core::graph::BuildGraph;
use crate::core::module::{ContextOutput, ModuleContext};
use crate::core::resolver::DependencyGraph;
use crate::error::{Diagnostic, ModgraphError, ResolverError};
use crate::infra::filesystem::FileSystem;

/// Result of one module's generation pass
#[derive(Debug, Clone)]
pub struct ModuleOutcome {
    /// Module name
    pub module: String,
    /// Actions, property errors and glob dependencies
    pub output: ContextOutput,
}

/// Modules ready for generation
#[derive(Debug)]
pub struct Plan {
    /// Modules in dependency order
    pub modules: Vec<ModuleInstance>,
    /// Problems found while loading and ordering
    pub diagnostics: Vec<Diagnostic>,
    /// Declaration files read
    pub files: Vec<String>,
    /// Module dependency graph
    pub dependencies: DependencyGraph,
}

impl Plan {
    /// Module names in dependency order
    pub fn order(&self) -> Vec<String> {
        self.modules.iter().map(|m| m.name().to_string()).collect()
    }
}

/// Everything a generation run produced
#[derive(Debug)]
pub struct GenerationReport {
    /// The assembled build graph
    pub graph: BuildGraph,
    /// Problems, in the order they were found
    pub diagnostics: Vec<Diagnostic>,
    /// Module names in the order they were generated
    pub order: Vec<String>,
}

impl GenerationReport {
    /// Whether the run recorded no diagnostic
    pub fn is_success(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Build the dependency graph for `modules`
pub fn dependency_graph(modules: &[ModuleInstance]) -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    for instance in modules {
        graph.add_module(instance.name(), instance.module.dynamic_dependencies());
    }
    graph
}

/// Order `modules` so that dependencies come first
///
/// Returns indices into `modules`. Dependencies on unknown modules are
/// reported as diagnostics and otherwise ignored; a cycle fails the whole
/// plan.
pub fn plan_order(
    modules: &[ModuleInstance],
) -> Result<(Vec<usize>, Vec<Diagnostic>), ResolverError> {
    let graph = dependency_graph(modules);
    let diagnostics = graph
        .missing_dependencies()
        .into_iter()
        .map(Diagnostic::from)
        .collect();

    let order = graph
        .topological_sort()?
        .iter()
        .filter_map(|name| modules.iter().position(|m| m.name() == name))
        .collect();

    Ok((order, diagnostics))
}

/// Run one module's generation pass
pub fn generate_module(
    instance: &ModuleInstance,
    config: &GenConfig,
    fs: &dyn FileSystem,
) -> ModuleOutcome {
    let mut ctx = ModuleContext::new(instance.name(), &instance.module_dir, config, fs);
    instance.module.generate_build_actions(&mut ctx);
    ModuleOutcome {
        module: instance.name().to_string(),
        output: ctx.finish(),
    }
}

/// Commit module outcomes to a new build graph
///
/// A module with property errors contributes its diagnostics and no
/// actions. A module whose outputs clash with an earlier module is
/// rejected whole.
pub fn assemble(outcomes: impl IntoIterator<Item = ModuleOutcome>) -> (BuildGraph, Vec<Diagnostic>) {
    let mut graph = BuildGraph::new();
    let mut diagnostics = Vec::new();

    for outcome in outcomes {
        let ModuleOutcome { module, output } = outcome;
        graph.add_generator_deps(output.glob_deps);

        if !output.errors.is_empty() {
            for error in output.errors {
                tracing::warn!("{error}");
                diagnostics.push(Diagnostic::from(error));
            }
            continue;
        }

        let count = output.actions.len();
        match graph.add_module_actions(&module, output.actions) {
            Ok(()) => tracing::debug!("Registered {count} actions for '{module}'"),
            Err(e) => {
                tracing::warn!("{e}");
                diagnostics.push(Diagnostic::from(e));
            }
        }
    }

    (graph, diagnostics)
}

/// Loads a project's declarations and generates its build graph
#[derive(Clone)]
pub struct Generator {
    registry: ModuleTypeRegistry,
    config: Arc<GenConfig>,
    fs: Arc<dyn FileSystem>,
}

impl Generator {
    /// Create a generator with the built-in module types
    pub fn new(config: GenConfig, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            registry: ModuleTypeRegistry::with_defaults(),
            config: Arc::new(config),
            fs,
        }
    }

    /// Replace the module type registry
    #[must_use]
    pub fn with_registry(mut self, registry: ModuleTypeRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Shared configuration
    pub fn config(&self) -> &Arc<GenConfig> {
        &self.config
    }

    /// Project filesystem
    pub fn fs(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    /// Load declarations, create modules and order them
    ///
    /// Unreadable or malformed declaration files and dependency cycles are
    /// errors; problems with individual modules become diagnostics.
    pub fn plan(&self) -> Result<Plan, ModgraphError> {
        let DeclarationSet {
            declarations,
            files,
        } = DeclarationSet::load(self.fs.as_ref())?;

        let (modules, errors) = instantiate(&self.registry, declarations);
        let mut diagnostics: Vec<Diagnostic> = errors
            .into_iter()
            .inspect(|e| tracing::warn!("{e}"))
            .map(Diagnostic::from)
            .collect();

        let (order, missing) = plan_order(&modules)?;
        for diagnostic in &missing {
            tracing::warn!("{diagnostic}");
        }
        diagnostics.extend(missing);

        let dependencies = dependency_graph(&modules);
        let modules = order.into_iter().map(|i| modules[i].clone()).collect();

        Ok(Plan {
            modules,
            diagnostics,
            files,
            dependencies,
        })
    }

    /// Names of every module that can be created, in declaration order
    pub fn module_names(&self) -> Result<Vec<String>, ModgraphError> {
        let set = DeclarationSet::load(self.fs.as_ref())?;
        let (modules, _) = instantiate(&self.registry, set.declarations);
        Ok(modules.iter().map(|m| m.name().to_string()).collect())
    }

    /// Generate the build graph for the whole project, one module at a time
    pub fn generate(&self) -> Result<GenerationReport, ModgraphError> {
        let plan = self.plan()?;
        let outcomes = plan
            .modules
            .iter()
            .map(|m| generate_module(m, &self.config, self.fs.as_ref()))
            .collect::<Vec<_>>();
        Ok(Self::report(plan, outcomes))
    }

    /// Combine a plan with the outcomes of its modules, in plan order
    pub fn report(plan: Plan, outcomes: Vec<ModuleOutcome>) -> GenerationReport {
        let order = plan.order();
        let (mut graph, module_diagnostics) = assemble(outcomes);
        graph.add_generator_deps(plan.files);

        let mut diagnostics = plan.diagnostics;
        diagnostics.extend(module_diagnostics);

        tracing::info!(
            "Generated {} actions for {} modules",
            graph.len(),
            order.len()
        );

        GenerationReport {
            graph,
            diagnostics,
            order,
        }
    }
}
