// Adapters layer: filesystem-backed implementations of the domain ports.

pub mod backup;
pub mod cleanup;
pub mod deployment;
pub mod modules;
pub mod registry;

use crate::config::LayoutConfig;
use crate::core::uninstaller::UninstallerParts;
use crate::domain::model::SetupContext;
use crate::utils::error::Result;
use std::fs;
use std::path::Path;

use backup::ZipCodeBackup;
use cleanup::DirectoryCleanup;
use deployment::{FlagFileMaintenanceMode, JsonDeploymentConfig};
use modules::ModuleCatalog;
use registry::JsonModuleRegistry;

/// Wires the filesystem adapters for the application at `root`. Nothing is
/// read until the uninstaller asks for it.
pub fn build_parts(root: &Path, layout: &LayoutConfig) -> UninstallerParts {
    let catalog = ModuleCatalog::new(root, &layout.modules.dirs, &layout.deployment.composer);

    UninstallerParts {
        deployment_config: Box::new(JsonDeploymentConfig::new(
            root.join(&layout.deployment.config),
        )),
        package_info: Box::new(catalog.clone()),
        module_list: Box::new(catalog.clone()),
        dependency_checker: Box::new(catalog.clone()),
        module_resource: Box::new(JsonModuleRegistry::new(root.join(&layout.modules.registry))),
        maintenance_mode: Box::new(FlagFileMaintenanceMode::new(
            root.join(&layout.deployment.maintenance_flag),
        )),
        cleanup: Box::new(DirectoryCleanup::new(root, &layout.cleanup)),
        code_backup: Box::new(ZipCodeBackup::new(root, &layout.backup)),
        uninstall_collector: Box::new(catalog),
        setup: SetupContext::new(root),
    }
}

/// Writes through a sibling temporary file and renames it over `path`.
pub(crate) fn write_atomically(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    fs::write(&tmp, data)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
