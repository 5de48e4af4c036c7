use crate::domain::model::DependencyViolations;
use crate::domain::ports::DependencyChecker;
use crate::utils::error::Result;
use std::collections::{BTreeMap, HashMap, VecDeque};

/// Dependency checker over the declared module dependency graph.
///
/// An edge `A -> B` means module A declares a dependency on module B.
#[derive(Debug, Clone, Default)]
pub struct GraphDependencyChecker {
    dependencies: BTreeMap<String, Vec<String>>,
}

impl GraphDependencyChecker {
    pub fn new<I, S>(graph: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<String>)>,
        S: Into<String>,
    {
        Self {
            dependencies: graph
                .into_iter()
                .map(|(module, deps)| (module.into(), deps))
                .collect(),
        }
    }

    /// Shortest dependency chain from `from` down to `to`, both included.
    pub fn chain(&self, from: &str, to: &str) -> Option<Vec<String>> {
        if from == to {
            return None;
        }

        let mut parents: HashMap<&str, &str> = HashMap::new();
        let mut queue = VecDeque::from([from]);

        while let Some(current) = queue.pop_front() {
            let Some(deps) = self.dependencies.get(current) else {
                continue;
            };
            for dep in deps {
                if dep == from || parents.contains_key(dep.as_str()) {
                    continue;
                }
                parents.insert(dep.as_str(), current);
                if dep == to {
                    let mut chain = vec![to.to_string()];
                    let mut node = to;
                    while let Some(parent) = parents.get(node) {
                        chain.push(parent.to_string());
                        node = parent;
                    }
                    chain.reverse();
                    return Some(chain);
                }
                queue.push_back(dep.as_str());
            }
        }
        None
    }
}

impl DependencyChecker for GraphDependencyChecker {
    fn check_dependencies_when_disabling(
        &self,
        to_disable: &[String],
        enabled: &[String],
    ) -> Result<DependencyViolations> {
        let remaining: Vec<&String> = enabled.iter().filter(|m| !to_disable.contains(m)).collect();

        let mut violations = DependencyViolations::new();
        for module in to_disable {
            let blockers: BTreeMap<String, Vec<String>> = remaining
                .iter()
                .filter_map(|candidate| {
                    self.chain(candidate, module)
                        .map(|chain| ((*candidate).clone(), chain))
                })
                .collect();
            if !blockers.is_empty() {
                tracing::debug!(module = %module, blockers = blockers.len(), "module has dependents");
            }
            violations.insert(module.clone(), blockers);
        }
        Ok(violations)
    }
}
