use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Ordered, de-duplicated list of modules a caller asked to uninstall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRequest {
    modules: Vec<String>,
}

impl ModuleRequest {
    /// Builds a request, keeping the first occurrence of repeated names.
    /// Returns `None` when no module was given.
    pub fn new<I, S>(modules: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for module in modules {
            let module = module.into();
            if !unique.contains(&module) {
                unique.push(module);
            }
        }

        if unique.is_empty() {
            None
        } else {
            Some(Self { modules: unique })
        }
    }

    pub fn modules(&self) -> &[String] {
        &self.modules
    }

    pub fn contains(&self, module: &str) -> bool {
        self.modules.iter().any(|m| m == module)
    }

    /// Comma-joined names in request order, as used in transcript lines.
    pub fn joined(&self) -> String {
        self.modules.join(", ")
    }
}

/// Enablement flags keyed by module, as persisted in the deployment
/// configuration. Insertion order is preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleRegistryState {
    entries: Vec<(String, u8)>,
}

impl ModuleRegistryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a flag, replacing an existing entry in place. Any non-zero flag is
    /// stored as 1.
    pub fn set(&mut self, module: impl Into<String>, enabled: u8) {
        let module = module.into();
        let flag = u8::from(enabled != 0);
        match self.entries.iter_mut().find(|(name, _)| *name == module) {
            Some(entry) => entry.1 = flag,
            None => self.entries.push((module, flag)),
        }
    }

    pub fn get(&self, module: &str) -> Option<u8> {
        self.entries
            .iter()
            .find(|(name, _)| name == module)
            .map(|(_, flag)| *flag)
    }

    pub fn enabled_modules(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, flag)| *flag == 1)
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u8)> {
        self.entries.iter().map(|(name, flag)| (name.as_str(), *flag))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, u8)> for ModuleRegistryState {
    fn from_iter<T: IntoIterator<Item = (S, u8)>>(iter: T) -> Self {
        let mut state = Self::new();
        for (module, flag) in iter {
            state.set(module, flag);
        }
        state
    }
}

/// One reason why a requested module list was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// Modules that are known but not required by the root package.
    NonComposerPackages(Vec<String>),
    /// Modules missing from the full module list.
    UnknownModules(Vec<String>),
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonComposerPackages(modules) if modules.len() == 1 => {
                write!(f, "{} is not an installed composer package", modules[0])
            }
            Self::NonComposerPackages(modules) => {
                write!(f, "{} are not installed composer packages", modules.join(", "))
            }
            Self::UnknownModules(modules) => {
                write!(f, "Unknown module(s): {}", modules.join(", "))
            }
        }
    }
}

/// Modules that still depend on a module being disabled.
///
/// Outer key: requested module. Inner key: blocking module, mapped to the
/// dependency chain from the blocker down to the requested module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyViolations {
    by_module: Vec<(String, BTreeMap<String, Vec<String>>)>,
}

impl DependencyViolations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, module: impl Into<String>, dependents: BTreeMap<String, Vec<String>>) {
        let module = module.into();
        match self.by_module.iter_mut().find(|(name, _)| *name == module) {
            Some(entry) => entry.1 = dependents,
            None => self.by_module.push((module, dependents)),
        }
    }

    pub fn dependents_of(&self, module: &str) -> Option<&BTreeMap<String, Vec<String>>> {
        self.by_module
            .iter()
            .find(|(name, _)| name == module)
            .map(|(_, dependents)| dependents)
    }

    pub fn has_violations(&self) -> bool {
        self.by_module.iter().any(|(_, deps)| !deps.is_empty())
    }

    /// One message per module that has at least one blocker, in insertion order.
    pub fn messages(&self) -> Vec<String> {
        self.by_module
            .iter()
            .filter(|(_, dependents)| !dependents.is_empty())
            .map(|(module, dependents)| {
                let mut message = format!(
                    "Cannot uninstall module '{}' because the following module(s) depend on it:",
                    module
                );
                for blocker in dependents.keys() {
                    message.push_str("\n\t");
                    message.push_str(blocker);
                }
                message
            })
            .collect()
    }
}

/// Result of a code backup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupArtifact {
    pub filename: String,
    pub path: PathBuf,
}

/// What a data-removal routine knows about the module it cleans up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleContext {
    pub module: String,
    /// Schema version recorded before the registry row was deleted.
    pub version: Option<String>,
}

impl ModuleContext {
    pub fn new(module: impl Into<String>, version: Option<String>) -> Self {
        Self {
            module: module.into(),
            version,
        }
    }
}

/// Shared handle given to every data-removal routine of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupContext {
    root: PathBuf,
}

impl SetupContext {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a path relative to the application root. Absolute paths and
    /// paths escaping the root through `..` are rejected.
    pub fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let candidate = Path::new(relative);
        let contained = !relative.is_empty()
            && candidate
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        contained.then(|| self.root.join(candidate))
    }
}

/// Flags selecting the optional steps of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UninstallOptions {
    pub clear_static_content: bool,
    pub remove_data: bool,
    pub backup_code: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_deduplicates_in_order() {
        let request = ModuleRequest::new(["Vendor_B", "Vendor_A", "Vendor_B"]).unwrap();
        assert_eq!(request.modules(), &["Vendor_B", "Vendor_A"]);
        assert_eq!(request.joined(), "Vendor_B, Vendor_A");
        assert!(ModuleRequest::new(Vec::<String>::new()).is_none());
    }

    #[test]
    fn test_registry_state_keeps_order_and_normalises_flags() {
        let mut state: ModuleRegistryState =
            [("Vendor_C", 0), ("Vendor_A", 1)].into_iter().collect();
        state.set("Vendor_D", 7);
        state.set("Vendor_C", 1);

        let entries: Vec<_> = state.iter().collect();
        assert_eq!(entries, vec![("Vendor_C", 1), ("Vendor_A", 1), ("Vendor_D", 1)]);
        assert_eq!(state.enabled_modules().len(), 3);
    }

    #[test]
    fn test_validation_issue_messages() {
        let one = ValidationIssue::NonComposerPackages(vec!["Vendor_C".into()]);
        assert_eq!(one.to_string(), "Vendor_C is not an installed composer package");

        let unknown = ValidationIssue::UnknownModules(vec!["Vendor_C".into(), "Vendor_D".into()]);
        assert_eq!(unknown.to_string(), "Unknown module(s): Vendor_C, Vendor_D");
    }

    #[test]
    fn test_setup_context_stays_inside_root() {
        let setup = SetupContext::new("/srv/app");
        assert_eq!(
            setup.resolve("var/import/Vendor_A"),
            Some(PathBuf::from("/srv/app/var/import/Vendor_A"))
        );
        assert_eq!(setup.resolve("../etc"), None);
        assert_eq!(setup.resolve("/etc/passwd"), None);
        assert_eq!(setup.resolve(""), None);
    }

    #[test]
    fn test_violation_messages_skip_modules_without_blockers() {
        let mut violations = DependencyViolations::new();
        violations.insert(
            "Vendor_A",
            BTreeMap::from([
                ("Vendor_E".to_string(), vec!["Vendor_E".into(), "Vendor_A".into()]),
                ("Vendor_D".to_string(), vec!["Vendor_D".into(), "Vendor_A".into()]),
            ]),
        );
        violations.insert("Vendor_B", BTreeMap::new());

        assert!(violations.has_violations());
        assert_eq!(
            violations.messages(),
            vec![
                "Cannot uninstall module 'Vendor_A' because the following module(s) depend on it:\n\tVendor_D\n\tVendor_E"
                    .to_string()
            ]
        );
    }
}
