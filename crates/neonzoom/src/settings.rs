use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories_next::ProjectDirs;
use serde::Deserialize;

pub const ENV_CONFIG_DIR: &str = "NEONZOOM_CONFIG_DIR";
pub const SETTINGS_FILE: &str = "settings.toml";

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "neonzoom";
const APPLICATION: &str = "neonzoom";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse settings at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid settings at {path}: {message}")]
    Invalid { path: PathBuf, message: String },
}

/// Optional overrides read from `settings.toml`. Absent keys fall back to
/// built-in defaults; command-line flags take precedence over all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub vsync: Option<bool>,
    pub diagnostics: Option<bool>,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &text)
    }

    fn parse(path: &Path, text: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if settings.width == Some(0) || settings.height == Some(0) {
            return Err(SettingsError::Invalid {
                path: path.to_path_buf(),
                message: "width and height must be greater than zero".to_string(),
            });
        }
        Ok(settings)
    }

    /// Loads `explicit` when given; otherwise the default file if it exists.
    ///
    /// An explicitly named file must exist. A missing default file is not an
    /// error and yields empty settings.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), SettingsError> {
        if let Some(path) = explicit {
            return Ok((Self::load(path)?, Some(path.to_path_buf())));
        }

        match default_settings_path() {
            Some(path) if path.is_file() => Ok((Self::load(&path)?, Some(path))),
            _ => Ok((Self::default(), None)),
        }
    }
}

/// `settings.toml` inside `$NEONZOOM_CONFIG_DIR` or the platform config directory.
pub fn default_settings_path() -> Option<PathBuf> {
    if let Some(dir) = env_override(ENV_CONFIG_DIR) {
        return Some(dir.join(SETTINGS_FILE));
    }
    ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
        .map(|dirs| dirs.config_dir().join(SETTINGS_FILE))
}

fn env_override(name: &str) -> Option<PathBuf> {
    match env::var_os(name) {
        Some(value) if !value.is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_no_overrides() {
        let settings = Settings::parse(Path::new("settings.toml"), "").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn reads_every_key() {
        let text = "width = 800\nheight = 600\nvsync = true\ndiagnostics = false\n";
        let settings = Settings::parse(Path::new("settings.toml"), text).unwrap();
        assert_eq!(
            settings,
            Settings {
                width: Some(800),
                height: Some(600),
                vsync: Some(true),
                diagnostics: Some(false),
            }
        );
    }

    #[test]
    fn unknown_keys_and_bad_types_are_parse_errors() {
        let path = Path::new("settings.toml");
        assert!(matches!(
            Settings::parse(path, "fullscreen = true"),
            Err(SettingsError::Parse { .. })
        ));
        assert!(matches!(
            Settings::parse(path, "width = \"wide\""),
            Err(SettingsError::Parse { .. })
        ));
    }

    #[test]
    fn zero_dimensions_are_invalid() {
        let err = Settings::parse(Path::new("settings.toml"), "height = 0").unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { .. }));
        assert!(err.to_string().contains("greater than zero"));
    }

    #[test]
    fn explicit_file_is_loaded_and_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "vsync = true\n").unwrap();

        let (settings, source) = Settings::load_or_default(Some(path.as_path())).unwrap();
        assert_eq!(settings.vsync, Some(true));
        assert_eq!(source.as_deref(), Some(path.as_path()));

        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            Settings::load_or_default(Some(missing.as_path())),
            Err(SettingsError::Read { .. })
        ));
    }
}
