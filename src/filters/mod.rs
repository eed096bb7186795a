//! Filter pipeline
//!
//! An ordered set of text-transforming passes. Each pass declares a numeric
//! order and named dependencies on other passes; the driver resolves them
//! into a schedule (topological order, ties broken by declared order),
//! verifies every pass's dependency guard, and streams the unit text
//! through each pass exactly once. Passes operate on the entire
//! accumulated text, resolving the placeholder markers earlier passes left
//! behind.

pub mod invariant;
pub mod old_state;
pub mod postcondition;
pub mod precondition;
pub mod skeleton;

use std::collections::{HashMap, HashSet};

use crate::entities::TypeDefinition;
use crate::error::WeaveError;

pub use invariant::InvariantPass;
pub use old_state::OldStatePass;
pub use postcondition::PostconditionPass;
pub use precondition::PreconditionPass;
pub use skeleton::SkeletonPass;

/// Read-only context shared by every pass of one weave.
pub struct WeaveContext<'a> {
    /// The parsed structure of the unit being woven.
    pub definition: &'a TypeDefinition,
    /// Originating path/identity of the unit, for provenance and
    /// relocation constants.
    pub identity: &'a str,
    /// Modification time of the original, embedded into the provenance
    /// hint.
    pub mtime: u64,
}

/// One text-transforming pass.
pub trait Pass {
    /// Stable name other passes declare dependencies against.
    fn name(&self) -> &'static str;

    /// Numeric order, breaking scheduling ties between independent passes.
    fn order(&self) -> u32;

    /// Names of passes that must have run before this one.
    fn dependencies(&self) -> &'static [&'static str] {
        &[]
    }

    /// Guard checked right before the pass runs.
    fn dependencies_met(&self, resolved: &HashSet<&'static str>) -> bool {
        self.dependencies().iter().all(|d| resolved.contains(d))
    }

    /// Transform the accumulated unit text.
    fn run(&self, text: String, ctx: &WeaveContext<'_>) -> Result<String, WeaveError>;
}

/// The pipeline driver.
pub struct Pipeline {
    passes: Vec<Box<dyn Pass>>,
}

impl Pipeline {
    /// A pipeline over an explicit pass set.
    pub fn new(passes: Vec<Box<dyn Pass>>) -> Self {
        Pipeline { passes }
    }

    /// The standard weave: skeleton, precondition, old-state,
    /// postcondition, invariant.
    pub fn standard() -> Self {
        Pipeline::new(vec![
            Box::new(SkeletonPass),
            Box::new(PreconditionPass),
            Box::new(OldStatePass),
            Box::new(PostconditionPass),
            Box::new(InvariantPass),
        ])
    }

    /// Stream `text` through every pass in dependency order.
    pub fn run(&self, text: String, ctx: &WeaveContext<'_>) -> Result<String, WeaveError> {
        let schedule = self.schedule()?;
        let mut resolved: HashSet<&'static str> = HashSet::new();
        let mut text = text;

        for idx in schedule {
            let pass = &self.passes[idx];
            if !pass.dependencies_met(&resolved) {
                let dependency = pass
                    .dependencies()
                    .iter()
                    .find(|d| !resolved.contains(*d))
                    .copied()
                    .unwrap_or("unknown");
                return Err(WeaveError::DependencyUnmet {
                    pass: pass.name().to_string(),
                    dependency: dependency.to_string(),
                });
            }
            log::debug!("running pass `{}` on `{}`", pass.name(), ctx.identity);
            text = pass.run(text, ctx)?;
            resolved.insert(pass.name());
        }

        Ok(text)
    }

    /// Topological order over the dependency graph. Edges only exist for
    /// dependencies present in this pipeline; a pass naming an absent one
    /// schedules normally and is caught by its guard in `run`.
    fn schedule(&self) -> Result<Vec<usize>, WeaveError> {
        let index_of: HashMap<&str, usize> = self
            .passes
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name(), i))
            .collect();

        let mut indegree = vec![0usize; self.passes.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.passes.len()];
        for (i, pass) in self.passes.iter().enumerate() {
            for dep in pass.dependencies() {
                if let Some(&d) = index_of.get(dep) {
                    dependents[d].push(i);
                    indegree[i] += 1;
                }
            }
        }

        let mut ready: Vec<usize> = (0..self.passes.len()).filter(|&i| indegree[i] == 0).collect();
        let mut schedule = Vec::with_capacity(self.passes.len());

        while !ready.is_empty() {
            // Ties between independently runnable passes break by declared
            // numeric order, then by registration order.
            ready.sort_by_key(|&i| (self.passes[i].order(), i));
            let next = ready.remove(0);
            schedule.push(next);
            for &dependent in &dependents[next] {
                indegree[dependent] -= 1;
                if indegree[dependent] == 0 {
                    ready.push(dependent);
                }
            }
        }

        if schedule.len() != self.passes.len() {
            let stuck = (0..self.passes.len())
                .find(|i| !schedule.contains(i))
                .map(|i| self.passes[i].name().to_string())
                .unwrap_or_default();
            return Err(WeaveError::DependencyCycle(stuck));
        }

        Ok(schedule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Recorder {
        name: &'static str,
        order: u32,
        dependencies: &'static [&'static str],
        counter: Arc<AtomicUsize>,
    }

    impl Pass for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }
        fn order(&self) -> u32 {
            self.order
        }
        fn dependencies(&self) -> &'static [&'static str] {
            self.dependencies
        }
        fn run(&self, text: String, _ctx: &WeaveContext<'_>) -> Result<String, WeaveError> {
            let seq = self.counter.fetch_add(1, Ordering::SeqCst);
            Ok(format!("{}{}:{};", text, self.name, seq))
        }
    }

    fn ctx_fixture() -> TypeDefinition {
        TypeDefinition::default()
    }

    #[test]
    fn passes_run_in_dependency_order_with_numeric_tiebreak() {
        let counter = Arc::new(AtomicUsize::new(0));
        // Registered out of order on purpose.
        let pipeline = Pipeline::new(vec![
            Box::new(Recorder {
                name: "post",
                order: 2,
                dependencies: &["pre", "old"],
                counter: counter.clone(),
            }),
            Box::new(Recorder {
                name: "old",
                order: 1,
                dependencies: &["skeleton"],
                counter: counter.clone(),
            }),
            Box::new(Recorder {
                name: "skeleton",
                order: 0,
                dependencies: &[],
                counter: counter.clone(),
            }),
            Box::new(Recorder {
                name: "pre",
                order: 1,
                dependencies: &["skeleton"],
                counter: counter.clone(),
            }),
        ]);

        let definition = ctx_fixture();
        let ctx = WeaveContext {
            definition: &definition,
            identity: "unit.php",
            mtime: 0,
        };
        let out = pipeline.run(String::new(), &ctx).unwrap();
        // skeleton first, then the two order-1 passes in registration
        // order, then the join point.
        assert_eq!(out, "skeleton:0;old:1;pre:2;post:3;");
    }

    #[test]
    fn missing_dependency_aborts_the_weave() {
        let counter = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new(vec![Box::new(Recorder {
            name: "post",
            order: 2,
            dependencies: &["pre"],
            counter,
        })]);
        let definition = ctx_fixture();
        let ctx = WeaveContext {
            definition: &definition,
            identity: "unit.php",
            mtime: 0,
        };
        match pipeline.run(String::new(), &ctx) {
            Err(WeaveError::DependencyUnmet { pass, dependency }) => {
                assert_eq!(pass, "post");
                assert_eq!(dependency, "pre");
            }
            other => panic!("expected DependencyUnmet, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn dependency_cycle_is_a_fatal_configuration_error() {
        let counter = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new(vec![
            Box::new(Recorder {
                name: "a",
                order: 0,
                dependencies: &["b"],
                counter: counter.clone(),
            }),
            Box::new(Recorder {
                name: "b",
                order: 1,
                dependencies: &["a"],
                counter,
            }),
        ]);
        let definition = ctx_fixture();
        let ctx = WeaveContext {
            definition: &definition,
            identity: "unit.php",
            mtime: 0,
        };
        assert!(matches!(
            pipeline.run(String::new(), &ctx),
            Err(WeaveError::DependencyCycle(_))
        ));
    }
}
