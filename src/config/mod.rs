use crate::error::{AppError, Result};
use crate::models::DynamicUpdate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone)]
pub struct Config {
    /// Image file or directory holding `setup.exe`.
    pub source: PathBuf,
    pub dynamic_update: DynamicUpdate,
    pub run_updates: bool,
    pub include_drivers: bool,
    /// Removed only after a clean, no-reboot-pending upgrade.
    pub staging_dir: PathBuf,
    pub status_log: PathBuf,
    pub setup_log_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let staging_dir = crate::paths::default_staging_dir();
        let status_log = crate::paths::status_log_path()
            .unwrap_or_else(|_| PathBuf::from("upgrade-status.log"));
        let setup_log_dir =
            crate::paths::setup_log_dir().unwrap_or_else(|_| PathBuf::from("setup-logs"));
        Self {
            source: staging_dir.clone(),
            dynamic_update: DynamicUpdate::default(),
            run_updates: true,
            include_drivers: false,
            staging_dir,
            status_log,
            setup_log_dir,
        }
    }
}

/// Values supplied on the command line; `None` leaves the lower layers alone.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub source: Option<PathBuf>,
    pub dynamic_update: Option<DynamicUpdate>,
    pub run_updates: Option<bool>,
    pub include_drivers: Option<bool>,
    pub staging_dir: Option<PathBuf>,
}

impl Config {
    /// Defaults, then `conf/config.json`, then environment, then CLI.
    pub fn load(overrides: Overrides) -> Result<Self> {
        let mut config = Self::default();

        if let Some(file_config) = Self::from_conf_file()? {
            config.apply_file(file_config)?;
        }

        config.apply_env(|key| std::env::var(key).ok())?;
        config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    fn from_conf_file() -> Result<Option<FileConfig>> {
        let path = crate::paths::conf_dir()?.join(CONFIG_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        Self::read_file(&path).map(Some)
    }

    fn read_file(path: &Path) -> Result<FileConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| AppError::Config(format!("Invalid config file {}: {}", path.display(), e)))
    }

    fn apply_file(&mut self, file_config: FileConfig) -> Result<()> {
        if let Some(source) = file_config.source {
            self.source = PathBuf::from(source);
        }
        if let Some(mode) = file_config.dynamic_update {
            self.dynamic_update = mode.parse()?;
        }
        if let Some(run_updates) = file_config.run_updates {
            self.run_updates = run_updates;
        }
        if let Some(include_drivers) = file_config.include_drivers {
            self.include_drivers = include_drivers;
        }
        if let Some(staging_dir) = file_config.staging_dir {
            self.staging_dir = PathBuf::from(staging_dir);
        }
        Ok(())
    }

    fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(source) = lookup("UPGRADE_SOURCE") {
            self.source = PathBuf::from(source);
        }
        if let Some(mode) = lookup("UPGRADE_DYNAMIC_UPDATE") {
            self.dynamic_update = mode.parse()?;
        }
        if let Some(flag) = lookup("UPGRADE_RUN_UPDATES") {
            self.run_updates = parse_flag("UPGRADE_RUN_UPDATES", &flag)?;
        }
        if let Some(flag) = lookup("UPGRADE_INCLUDE_DRIVERS") {
            self.include_drivers = parse_flag("UPGRADE_INCLUDE_DRIVERS", &flag)?;
        }
        if let Some(staging_dir) = lookup("UPGRADE_STAGING_DIR") {
            self.staging_dir = PathBuf::from(staging_dir);
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: Overrides) {
        if let Some(source) = overrides.source {
            self.source = source;
        }
        if let Some(dynamic_update) = overrides.dynamic_update {
            self.dynamic_update = dynamic_update;
        }
        if let Some(run_updates) = overrides.run_updates {
            self.run_updates = run_updates;
        }
        if let Some(include_drivers) = overrides.include_drivers {
            self.include_drivers = include_drivers;
        }
        if let Some(staging_dir) = overrides.staging_dir {
            self.staging_dir = staging_dir;
        }
    }

    fn validate(&self) -> Result<()> {
        for (name, path) in [
            ("source", &self.source),
            ("staging_dir", &self.staging_dir),
            ("status_log", &self.status_log),
            ("setup_log_dir", &self.setup_log_dir),
        ] {
            if path.as_os_str().to_string_lossy().trim().is_empty() {
                return Err(AppError::Config(format!("{} cannot be empty", name)));
            }
        }
        Ok(())
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(AppError::Config(format!(
            "{} must be a boolean, got '{}'",
            name, other
        ))),
    }
}

#[derive(Debug, Deserialize)]
struct FileConfig {
    source: Option<String>,
    dynamic_update: Option<String>,
    run_updates: Option<bool>,
    include_drivers: Option<bool>,
    staging_dir: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base() -> Config {
        Config {
            source: PathBuf::from("C:\\OSUpgrade"),
            dynamic_update: DynamicUpdate::Disable,
            run_updates: true,
            include_drivers: false,
            staging_dir: PathBuf::from("C:\\OSUpgrade"),
            status_log: PathBuf::from("status.log"),
            setup_log_dir: PathBuf::from("setup"),
        }
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"source": "D:\\media\\win.iso", "dynamic_update": "Enable", "include_drivers": true}"#,
        )
        .unwrap();

        let mut config = base();
        config.apply_file(Config::read_file(&path).unwrap()).unwrap();

        assert_eq!(config.source, PathBuf::from("D:\\media\\win.iso"));
        assert_eq!(config.dynamic_update, DynamicUpdate::Enable);
        assert!(config.include_drivers);
        assert!(config.run_updates);
    }

    #[test]
    fn file_dynamic_update_ignores_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = base();
        std::fs::write(&path, r#"{"dynamic_update": "enable"}"#).unwrap();
        config.apply_file(Config::read_file(&path).unwrap()).unwrap();
        assert_eq!(config.dynamic_update, DynamicUpdate::Enable);

        std::fs::write(&path, r#"{"dynamic_update": "DISABLE"}"#).unwrap();
        config.apply_file(Config::read_file(&path).unwrap()).unwrap();
        assert_eq!(config.dynamic_update, DynamicUpdate::Disable);

        std::fs::write(&path, r#"{"dynamic_update": "sometimes"}"#).unwrap();
        let err = base()
            .apply_file(Config::read_file(&path).unwrap())
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = Config::read_file(&path).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn env_then_cli_precedence() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("UPGRADE_DYNAMIC_UPDATE", "enable"),
            ("UPGRADE_RUN_UPDATES", "no"),
            ("UPGRADE_SOURCE", "E:\\"),
        ]);
        let mut config = base();
        config
            .apply_env(|key| env.get(key).map(|value| value.to_string()))
            .unwrap();

        assert_eq!(config.dynamic_update, DynamicUpdate::Enable);
        assert!(!config.run_updates);

        config.apply_overrides(Overrides {
            dynamic_update: Some(DynamicUpdate::Disable),
            run_updates: Some(true),
            ..Default::default()
        });

        assert_eq!(config.dynamic_update, DynamicUpdate::Disable);
        assert!(config.run_updates);
        assert_eq!(config.source, PathBuf::from("E:\\"));
    }

    #[test]
    fn bad_env_flag_is_rejected() {
        let mut config = base();
        let err = config
            .apply_env(|key| (key == "UPGRADE_INCLUDE_DRIVERS").then(|| "maybe".to_string()))
            .unwrap_err();

        assert!(err.to_string().contains("UPGRADE_INCLUDE_DRIVERS"));
    }

    #[test]
    fn empty_source_fails_validation() {
        let mut config = base();
        config.source = PathBuf::new();

        assert!(config.validate().is_err());
        assert!(base().validate().is_ok());
    }
}
