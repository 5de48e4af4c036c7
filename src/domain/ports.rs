use crate::domain::model::{
    BackupArtifact, DependencyViolations, ModuleContext, ModuleRegistryState, SetupContext,
};
use crate::utils::error::Result;
use std::collections::BTreeMap;

/// Deployment configuration: install marker and the module enablement section.
pub trait DeploymentConfig {
    fn is_available(&self) -> Result<bool>;
    fn modules(&self) -> Result<ModuleRegistryState>;
    fn save_modules(&self, modules: &ModuleRegistryState) -> Result<()>;
}

/// Packaging information for modules and the root project.
pub trait PackageInfo {
    fn package_name(&self, module: &str) -> Option<String>;
    fn root_required_packages(&self) -> Result<Vec<String>>;
}

/// Every module present in the code base, enabled or not.
pub trait ModuleList {
    fn has(&self, module: &str) -> bool;
    /// Names of the modules still present once `excluded` are left out, in
    /// load order.
    fn load_excluding(&self, excluded: &[String]) -> Result<Vec<String>>;
}

pub trait DependencyChecker {
    /// For each module in `to_disable`, the modules of `enabled` that would
    /// still depend on it after the whole set is disabled.
    fn check_dependencies_when_disabling(
        &self,
        to_disable: &[String],
        enabled: &[String],
    ) -> Result<DependencyViolations>;
}

/// Module version registry (one row per installed module).
pub trait ModuleResource {
    fn db_version(&self, module: &str) -> Result<Option<String>>;
    fn delete_version(&self, module: &str) -> Result<()>;
}

pub trait MaintenanceMode {
    fn set(&self, enabled: bool) -> Result<()>;
    fn is_on(&self) -> Result<bool>;
}

pub trait Cleanup {
    fn clean_cache(&self) -> Result<()>;
    fn clear_generated_code(&self) -> Result<()>;
    fn clear_static_content(&self) -> Result<()>;
}

pub trait CodeBackup {
    fn create(&self) -> Result<BackupArtifact>;
}

/// Removes the data a module created.
pub trait Uninstall {
    fn uninstall(&self, setup: &SetupContext, context: &ModuleContext) -> Result<()>;
}

pub type UninstallBox = Box<dyn Uninstall>;

pub trait UninstallCollector {
    /// Data-removal routines keyed by module name.
    fn collect_uninstall(&self) -> Result<BTreeMap<String, UninstallBox>>;
}

pub type DeploymentConfigBox = Box<dyn DeploymentConfig>;
pub type PackageInfoBox = Box<dyn PackageInfo>;
pub type ModuleListBox = Box<dyn ModuleList>;
pub type DependencyCheckerBox = Box<dyn DependencyChecker>;
pub type ModuleResourceBox = Box<dyn ModuleResource>;
pub type MaintenanceModeBox = Box<dyn MaintenanceMode>;
pub type CleanupBox = Box<dyn Cleanup>;
pub type CodeBackupBox = Box<dyn CodeBackup>;
pub type UninstallCollectorBox = Box<dyn UninstallCollector>;
