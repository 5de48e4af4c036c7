// Core layer: request validation, dependency analysis and the uninstall sequence.

pub mod dependency;
pub mod uninstaller;
pub mod validator;

pub use crate::domain::model::{ModuleRequest, UninstallOptions};
pub use crate::utils::error::Result;
