use crate::domain::model::{ModuleRequest, ValidationIssue};
use crate::domain::ports::{ModuleList, PackageInfo};
use crate::utils::error::Result;

/// Checks every requested module against the root package requirements and
/// the full module list.
///
/// Returns the issues found, non-composer modules first. An empty vector
/// means the request is valid. Unknown modules are reported only as unknown.
pub fn validate_request(
    request: &ModuleRequest,
    package_info: &dyn PackageInfo,
    module_list: &dyn ModuleList,
) -> Result<Vec<ValidationIssue>> {
    let installed_packages = package_info.root_required_packages()?;

    let mut non_composer = Vec::new();
    let mut unknown = Vec::new();

    for module in request.modules() {
        let package = package_info.package_name(module);
        let is_root_package = package
            .as_deref()
            .filter(|name| !name.is_empty())
            .is_some_and(|name| installed_packages.iter().any(|p| p == name));
        let is_known = module_list.has(module);

        tracing::debug!(
            module = %module,
            package = package.as_deref().unwrap_or(""),
            is_root_package,
            is_known,
            "validated module"
        );

        if !is_known {
            unknown.push(module.clone());
        } else if !is_root_package {
            non_composer.push(module.clone());
        }
    }

    let mut issues = Vec::new();
    if !non_composer.is_empty() {
        issues.push(ValidationIssue::NonComposerPackages(non_composer));
    }
    if !unknown.is_empty() {
        issues.push(ValidationIssue::UnknownModules(unknown));
    }
    Ok(issues)
}
