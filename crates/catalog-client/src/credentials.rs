//! Catalog service credentials.
//!
//! Credentials live in a user-level YAML file and are passed in explicitly;
//! core logic never reads them from the ambient environment.

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{CatalogError, CatalogResult};

/// Account credentials for the catalog service.
///
/// Expected file contents:
///
/// ```yaml
/// username: someone@example.org
/// password: hunter2
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Load credentials from a YAML file.
    pub fn load(path: &Path) -> CatalogResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CatalogError::Credentials(format!("{}: {e}", path.display()))
        })?;
        let creds: Credentials = serde_yaml::from_str(&content)
            .map_err(|e| CatalogError::Credentials(format!("{}: {e}", path.display())))?;

        if creds.username.is_empty() || creds.password.is_empty() {
            return Err(CatalogError::Credentials(format!(
                "{}: username and password must be non-empty",
                path.display()
            )));
        }

        debug!(username = %creds.username, "Loaded catalog credentials");
        Ok(creds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_valid() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "username: user@example.org\npassword: secret").unwrap();

        let creds = Credentials::load(f.path()).unwrap();
        assert_eq!(creds.username, "user@example.org");
        assert_eq!(creds.password, "secret");
    }

    #[test]
    fn test_load_rejects_empty_fields() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "username: \"\"\npassword: secret").unwrap();
        assert!(matches!(
            Credentials::load(f.path()),
            Err(CatalogError::Credentials(_))
        ));
    }

    #[test]
    fn test_load_rejects_missing_file() {
        assert!(Credentials::load(Path::new("/nonexistent/creds.yaml")).is_err());
    }
}
