pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::LayoutConfig;
pub use core::uninstaller::{ModuleUninstaller, UninstallReport, UninstallerParts};
pub use domain::model::{ModuleRequest, UninstallOptions};
pub use utils::error::{Result, UninstallError};
