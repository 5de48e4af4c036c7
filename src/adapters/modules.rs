//! Module manifests.
//!
//! Every module ships a `module.toml` next to its code:
//!
//! ```toml
//! name = "Vendor_Catalog"
//! package = "vendor/module-catalog"
//! version = "1.2.0"
//! sequence = ["Vendor_Store"]
//! data_paths = ["var/import/catalog"]
//! ```
//!
//! The catalog built from them answers the module list, package and
//! dependency questions and provides the data-removal routines.

use crate::core::dependency::GraphDependencyChecker;
use crate::domain::model::{DependencyViolations, ModuleContext, SetupContext};
use crate::domain::ports::{
    DependencyChecker, ModuleList, PackageInfo, Uninstall, UninstallBox, UninstallCollector,
};
use crate::utils::error::{Result, UninstallError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

pub const MANIFEST_FILE: &str = "module.toml";

/// How deep below a module directory manifests are searched
/// (`<dir>/<Vendor>/<Module>/module.toml`).
const MAX_DEPTH: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleManifest {
    pub name: String,
    #[serde(default)]
    pub package: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub sequence: Vec<String>,
    #[serde(default)]
    pub data_paths: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ComposerFile {
    #[serde(default)]
    require: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug)]
struct CatalogInner {
    root: PathBuf,
    dirs: Vec<String>,
    composer_file: PathBuf,
    manifests: OnceLock<BTreeMap<String, ModuleManifest>>,
}

/// Every module manifest found under the configured directories.
///
/// Manifests are read on first use, so a broken manifest only fails the
/// steps that need module information.
#[derive(Debug, Clone)]
pub struct ModuleCatalog {
    inner: Arc<CatalogInner>,
}

impl ModuleCatalog {
    pub fn new(root: &Path, dirs: &[String], composer_file: &str) -> Self {
        Self {
            inner: Arc::new(CatalogInner {
                root: root.to_path_buf(),
                dirs: dirs.to_vec(),
                composer_file: root.join(composer_file),
                manifests: OnceLock::new(),
            }),
        }
    }

    pub fn from_manifests<I>(manifests: I, composer_file: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = ModuleManifest>,
    {
        let manifests: BTreeMap<String, ModuleManifest> =
            manifests.into_iter().map(|m| (m.name.clone(), m)).collect();
        Self {
            inner: Arc::new(CatalogInner {
                root: PathBuf::new(),
                dirs: Vec::new(),
                composer_file: composer_file.into(),
                manifests: OnceLock::from(manifests),
            }),
        }
    }

    fn manifests(&self) -> Result<&BTreeMap<String, ModuleManifest>> {
        if let Some(manifests) = self.inner.manifests.get() {
            return Ok(manifests);
        }
        let discovered = self.discover()?;
        Ok(self.inner.manifests.get_or_init(|| discovered))
    }

    fn discover(&self) -> Result<BTreeMap<String, ModuleManifest>> {
        let mut manifests = BTreeMap::new();
        for dir in &self.inner.dirs {
            let mut found = Vec::new();
            find_manifests(&self.inner.root.join(dir), 0, &mut found)?;
            for path in found {
                let manifest = read_manifest(&path)?;
                if let Some(previous) = manifests.insert(manifest.name.clone(), manifest) {
                    return Err(UninstallError::ConfigValidationError {
                        field: path.display().to_string(),
                        message: format!("module '{}' is declared twice", previous.name),
                    });
                }
            }
        }
        tracing::debug!(
            root = %self.inner.root.display(),
            modules = manifests.len(),
            "Discovered module manifests"
        );
        Ok(manifests)
    }

    pub fn manifest(&self, module: &str) -> Result<Option<&ModuleManifest>> {
        Ok(self.manifests()?.get(module))
    }

    pub fn dependency_checker(&self) -> Result<GraphDependencyChecker> {
        Ok(GraphDependencyChecker::new(
            self.manifests()?
                .values()
                .map(|m| (m.name.clone(), m.sequence.clone())),
        ))
    }

    /// Module names ordered so that every module follows its dependencies.
    /// Ties are broken by name. Dependencies on modules outside `names` are
    /// ignored.
    fn sort_by_sequence(
        manifests: &BTreeMap<String, ModuleManifest>,
        names: &BTreeSet<&str>,
    ) -> Result<Vec<String>> {
        let mut pending: BTreeMap<&str, BTreeSet<&str>> = names
            .iter()
            .filter_map(|name| manifests.get(*name).map(|m| (*name, m)))
            .map(|(name, manifest)| {
                let deps = manifest
                    .sequence
                    .iter()
                    .map(String::as_str)
                    .filter(|dep| names.contains(dep) && *dep != name)
                    .collect();
                (name, deps)
            })
            .collect();

        let mut ordered = Vec::with_capacity(pending.len());
        while !pending.is_empty() {
            let Some(next) = pending
                .iter()
                .find(|(_, deps)| deps.is_empty())
                .map(|(name, _)| *name)
            else {
                let cycle: Vec<&str> = pending.keys().copied().collect();
                return Err(UninstallError::ConfigValidationError {
                    field: "sequence".to_string(),
                    message: format!("circular module dependency among {}", cycle.join(", ")),
                });
            };
            pending.remove(next);
            for deps in pending.values_mut() {
                deps.remove(next);
            }
            ordered.push(next.to_string());
        }
        Ok(ordered)
    }
}

fn find_manifests(dir: &Path, depth: usize, found: &mut Vec<PathBuf>) -> Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }
    let manifest = dir.join(MANIFEST_FILE);
    if manifest.is_file() {
        found.push(manifest);
        return Ok(());
    }
    if depth >= MAX_DEPTH {
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            find_manifests(&entry.path(), depth + 1, found)?;
        }
    }
    Ok(())
}

fn read_manifest(path: &Path) -> Result<ModuleManifest> {
    let content = fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| UninstallError::ConfigValidationError {
        field: path.display().to_string(),
        message: format!("invalid module manifest: {}", e),
    })
}

// Validation asks for the root packages first, so discovery errors surface
// there and the infallible lookups below only see a loaded catalog.
impl PackageInfo for ModuleCatalog {
    fn package_name(&self, module: &str) -> Option<String> {
        self.manifest(module)
            .ok()
            .flatten()
            .and_then(|m| m.package.clone())
    }

    fn root_required_packages(&self) -> Result<Vec<String>> {
        self.manifests()?;
        let content = fs::read(&self.inner.composer_file)?;
        let composer: ComposerFile = serde_json::from_slice(&content)?;
        Ok(composer.require.keys().cloned().collect())
    }
}

impl ModuleList for ModuleCatalog {
    fn has(&self, module: &str) -> bool {
        self.manifests()
            .map(|manifests| manifests.contains_key(module))
            .unwrap_or(false)
    }

    fn load_excluding(&self, excluded: &[String]) -> Result<Vec<String>> {
        let manifests = self.manifests()?;
        let names: BTreeSet<&str> = manifests
            .keys()
            .map(String::as_str)
            .filter(|name| !excluded.iter().any(|e| e == name))
            .collect();
        Self::sort_by_sequence(manifests, &names)
    }
}

impl DependencyChecker for ModuleCatalog {
    fn check_dependencies_when_disabling(
        &self,
        to_disable: &[String],
        enabled: &[String],
    ) -> Result<DependencyViolations> {
        self.dependency_checker()?
            .check_dependencies_when_disabling(to_disable, enabled)
    }
}

/// Removes the data paths a module declares in its manifest.
#[derive(Debug, Clone)]
pub struct ManifestUninstall {
    data_paths: Vec<String>,
}

impl Uninstall for ManifestUninstall {
    fn uninstall(&self, setup: &SetupContext, context: &ModuleContext) -> Result<()> {
        for relative in &self.data_paths {
            let path = setup.resolve(relative).ok_or_else(|| {
                UninstallError::InvalidConfigValueError {
                    field: format!("{}.data_paths", context.module),
                    value: relative.clone(),
                    reason: "Path must be relative to the application root".to_string(),
                }
            })?;

            if path.is_dir() {
                fs::remove_dir_all(&path)?;
            } else if path.exists() {
                fs::remove_file(&path)?;
            } else {
                continue;
            }
            tracing::info!(module = %context.module, path = %path.display(), "Removed module data");
        }
        Ok(())
    }
}

impl UninstallCollector for ModuleCatalog {
    fn collect_uninstall(&self) -> Result<BTreeMap<String, UninstallBox>> {
        Ok(self
            .manifests()?
            .values()
            .filter(|m| !m.data_paths.is_empty())
            .map(|m| {
                let routine: UninstallBox = Box::new(ManifestUninstall {
                    data_paths: m.data_paths.clone(),
                });
                (m.name.clone(), routine)
            })
            .collect())
    }
}
