//! Configuration discovery.

use std::fs;
use std::path::Path;

use crate::{Config, ConfigError};

/// Default configuration file name searched in the working directory
pub const CONFIG_FILE_NAME: &str = "radscribe.toml";

/// Environment variable pointing at an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "RADSCRIBE_CONFIG";

/// Discover and load configuration.
///
/// Precedence: `RADSCRIBE_CONFIG` (must exist when set) over
/// `radscribe.toml` in the working directory over built-in defaults;
/// an absent file yields `Config::default()`, which fails validation until
/// chains are supplied programmatically.
///
/// # Errors
///
/// Returns `ConfigError::NotFound` when an explicitly configured path does
/// not exist, and parse/validation errors from the loaded file.
pub fn discover() -> Result<Config, ConfigError> {
    if let Ok(explicit) = std::env::var(CONFIG_ENV_VAR) {
        return load_file(Path::new(&explicit));
    }

    let local = Path::new(CONFIG_FILE_NAME);
    if local.exists() {
        return load_file(local);
    }

    Ok(Config::default())
}

fn load_file(path: &Path) -> Result<Config, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|_| ConfigError::NotFound(path.display().to_string()))?;
    Config::from_toml_str(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_file_reports_missing_path() {
        let err = load_file(Path::new("/definitely/not/here/radscribe.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn load_file_parses_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let mut file = fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
                [[tasks.generate]]
                provider = "anthropic"
                model = "claude-sonnet-4-5"

                [[tasks.validate]]
                provider = "anthropic"
                model = "claude-haiku-4-5"

                [[tasks.fix]]
                provider = "anthropic"
                model = "claude-haiku-4-5"
            "#
        )
        .unwrap();

        let config = load_file(&path).unwrap();
        assert_eq!(config.tasks.generate[0].model, "claude-sonnet-4-5");
    }
}
