use crate::utils::error::{Result, UninstallError};
use std::path::{Component, Path};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(UninstallError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(UninstallError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

/// A non-empty path that stays inside the application root.
pub fn validate_relative_path(field_name: &str, path: &str) -> Result<()> {
    validate_path(field_name, path)?;

    let escapes = Path::new(path)
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(UninstallError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path must be relative to the application root".to_string(),
        });
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(UninstallError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("root", "/srv/app").is_ok());
        assert!(validate_path("root", "").is_err());
        assert!(validate_path("root", "a\0b").is_err());
    }

    #[test]
    fn test_validate_relative_path() {
        assert!(validate_relative_path("cleanup.cache", "var/cache").is_ok());
        assert!(validate_relative_path("cleanup.cache", "./var/cache").is_ok());
        assert!(validate_relative_path("cleanup.cache", "/var/cache").is_err());
        assert!(validate_relative_path("cleanup.cache", "var/../../etc").is_err());
    }

    #[test]
    fn test_validate_non_empty_string() {
        assert!(validate_non_empty_string("module", "Vendor_A").is_ok());
        assert!(validate_non_empty_string("module", "  ").is_err());
    }
}
