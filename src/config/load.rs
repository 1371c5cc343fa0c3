//! Configuration loading and saving.

use std::path::Path;

use super::{CONFIG_FILE, ConfigError, SiteConfig};

impl SiteConfig {
    /// Load `_config.yml` from the project root.
    ///
    /// A missing or unparsable file is an error; an empty file is an empty
    /// configuration.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(CONFIG_FILE);
        if !path.is_file() {
            return Err(ConfigError::NotFound(path));
        }

        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Read {
            path: path.clone(),
            source: e,
        })?;

        let config = if content.trim().is_empty() {
            SiteConfig::default()
        } else {
            serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.clone(),
                source: e,
            })?
        };

        config.validate()?;
        Ok(config)
    }

    /// Write the configuration back to `_config.yml`.
    pub fn save(&self, root: &Path) -> Result<(), ConfigError> {
        let path = root.join(CONFIG_FILE);
        let text = serde_yaml::to_string(self).map_err(|e| ConfigError::Parse {
            path: path.clone(),
            source: e,
        })?;

        std::fs::write(&path, text).map_err(|e| ConfigError::Write { path, source: e })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for name in self.folders.names() {
            if !name.starts_with('_') || name.contains(['/', '\\']) || name.len() < 2 {
                return Err(ConfigError::Validation(format!(
                    "reserved folder '{name}' must be a single path segment starting with '_'"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let err = SiteConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_invalid_yaml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "dest: [unclosed\n").unwrap();

        let err = SiteConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_scalar_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "just a string\n").unwrap();

        assert!(SiteConfig::load(dir.path()).is_err());
    }

    #[test]
    fn test_load_empty_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "\n").unwrap();

        let config = SiteConfig::load(dir.path()).unwrap();
        assert_eq!(config.dest, None);
    }

    #[test]
    fn test_reserved_folder_must_start_with_underscore() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "folders:\n  posts: posts\n").unwrap();

        let err = SiteConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_save_round_trip_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "title: Notes\ndest: old\n").unwrap();

        let mut config = SiteConfig::load(dir.path()).unwrap();
        config.dest = Some("new".to_string());
        config.save(dir.path()).unwrap();

        let reloaded = SiteConfig::load(dir.path()).unwrap();
        assert_eq!(reloaded.dest.as_deref(), Some("new"));
        assert_eq!(
            reloaded.extra.get("title").and_then(|v| v.as_str()),
            Some("Notes")
        );
    }
}
