use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::reminder::ReminderPermission;
use crate::utils;

/// Current configuration version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Empty means the profile's default location
    #[serde(default)]
    pub database_path: String,
    #[serde(default)]
    pub theme: ThemeMode,
    #[serde(default)]
    pub reminders: ReminderConfig,
    #[serde(default)]
    pub key_bindings: KeyBindings,
    #[serde(default = "default_config_version")]
    pub config_version: Option<u32>,
}

/// Light or dark palette for the terminal UI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }

    pub fn palette(self) -> Theme {
        match self {
            ThemeMode::Light => Theme {
                fg: "black".to_string(),
                bg: "white".to_string(),
                highlight_bg: "blue".to_string(),
                highlight_fg: "white".to_string(),
                muted: "darkgray".to_string(),
                due_soon: "#b58900".to_string(),
                overdue: "red".to_string(),
                completed: "gray".to_string(),
            },
            ThemeMode::Dark => Theme {
                fg: "white".to_string(),
                bg: "black".to_string(),
                highlight_bg: "cyan".to_string(),
                highlight_fg: "".to_string(),
                muted: "gray".to_string(),
                due_soon: "yellow".to_string(),
                overdue: "lightred".to_string(),
                completed: "darkgray".to_string(),
            },
        }
    }
}

/// Colors used by the widgets. Values go through `parse_color`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub fg: String,
    pub bg: String,
    pub highlight_bg: String,
    /// Empty means "pick a readable color for `highlight_bg`"
    pub highlight_fg: String,
    pub muted: String,
    pub due_soon: String,
    pub overdue: String,
    pub completed: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderConfig {
    #[serde(default)]
    pub permission: ReminderPermission,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_sound")]
    pub sound: bool,
}

impl ReminderConfig {
    pub fn is_enabled(&self) -> bool {
        self.permission == ReminderPermission::Granted
    }

    /// Poll period, never shorter than one second
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            permission: ReminderPermission::default(),
            poll_interval_secs: default_poll_interval_secs(),
            sound: default_sound(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyBindings {
    #[serde(default = "default_quit")]
    pub quit: String,
    #[serde(default = "default_new")]
    pub new: String,
    #[serde(default = "default_edit")]
    pub edit: String,
    #[serde(default = "default_save")]
    pub save: String,
    #[serde(default = "default_delete")]
    pub delete: String,
    #[serde(default = "default_toggle_completed")]
    pub toggle_completed: String,
    #[serde(default = "default_sort_date")]
    pub sort_date: String,
    #[serde(default = "default_sort_title")]
    pub sort_title: String,
    #[serde(default = "default_toggle_theme")]
    pub toggle_theme: String,
    #[serde(default = "default_reminders")]
    pub reminders: String,
    #[serde(default = "default_list_up")]
    pub list_up: String,
    #[serde(default = "default_list_down")]
    pub list_down: String,
    #[serde(default = "default_help")]
    pub help: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            theme: ThemeMode::default(),
            reminders: ReminderConfig::default(),
            key_bindings: KeyBindings::default(),
            config_version: Some(CURRENT_CONFIG_VERSION),
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            quit: default_quit(),
            new: default_new(),
            edit: default_edit(),
            save: default_save(),
            delete: default_delete(),
            toggle_completed: default_toggle_completed(),
            sort_date: default_sort_date(),
            sort_title: default_sort_title(),
            toggle_theme: default_toggle_theme(),
            reminders: default_reminders(),
            list_up: default_list_up(),
            list_down: default_list_down(),
            help: default_help(),
        }
    }
}

// Default value functions
fn default_database_path() -> String {
    Config::default_database_path_for_profile(utils::Profile::Prod)
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_sound() -> bool {
    true
}

fn default_quit() -> String {
    "q".to_string()
}

fn default_new() -> String {
    "n".to_string()
}

fn default_edit() -> String {
    "e".to_string()
}

fn default_save() -> String {
    "Ctrl+s".to_string()
}

fn default_delete() -> String {
    "d".to_string()
}

fn default_toggle_completed() -> String {
    "Space".to_string()
}

fn default_sort_date() -> String {
    "s".to_string()
}

fn default_sort_title() -> String {
    "S".to_string()
}

fn default_toggle_theme() -> String {
    "t".to_string()
}

fn default_reminders() -> String {
    "r".to_string()
}

fn default_list_up() -> String {
    "k".to_string()
}

fn default_list_down() -> String {
    "j".to_string()
}

fn default_help() -> String {
    "F1".to_string()
}

fn default_config_version() -> Option<u32> {
    Some(CURRENT_CONFIG_VERSION)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config directory: {0}")]
    ConfigDirError(String),
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to write config file: {0}")]
    WriteError(String),
}

impl Config {
    /// Load configuration from the profile's config directory, creating a
    /// default file if none exists
    pub fn load_with_profile(profile: utils::Profile) -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path(profile)?;
        Self::load_from_path_with_profile(&config_path, profile)
    }

    /// Load configuration from an explicit file, creating it with defaults if missing.
    /// The database path in the file is honored as written.
    pub fn load_from_path(config_path: &Path) -> Result<Self, ConfigError> {
        Self::load_from_path_with_profile(config_path, utils::Profile::Prod)
    }

    /// Like [`Config::load_from_path`], with a missing or empty
    /// `database_path` resolved to the profile's data directory
    pub fn load_from_path_with_profile(
        config_path: &Path,
        profile: utils::Profile,
    ) -> Result<Self, ConfigError> {
        if config_path.exists() {
            let contents = fs::read_to_string(config_path)
                .map_err(|e| ConfigError::ReadError(e.to_string()))?;
            let mut config: Config = toml::from_str(&contents)?;
            if config.database_path.trim().is_empty() {
                config.database_path = Self::default_database_path_for_profile(profile);
            }
            Ok(config)
        } else {
            let mut config = Config {
                database_path: Self::default_database_path_for_profile(profile),
                ..Config::default()
            };
            if let Err(e) = config.save_to_path(config_path) {
                tracing::error!(path = %config_path.display(), error = %e, "failed to save config file");
                return Err(e);
            }
            Ok(config)
        }
    }

    /// Save configuration to a file
    pub fn save_to_path(&mut self, config_path: &Path) -> Result<(), ConfigError> {
        // Ensure config version is set before saving
        self.config_version = Some(CURRENT_CONFIG_VERSION);

        // Create parent directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::WriteError(format!("Failed to serialize config: {}", e)))?;

        fs::write(config_path, toml_string).map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn get_config_path(profile: utils::Profile) -> Result<PathBuf, ConfigError> {
        let config_dir = utils::get_config_dir(profile).ok_or_else(|| {
            ConfigError::ConfigDirError("Could not determine config directory".to_string())
        })?;
        Ok(config_dir.join("config.toml"))
    }

    /// Get default database path for a specific profile
    fn default_database_path_for_profile(profile: utils::Profile) -> String {
        if let Some(data_dir) = utils::get_data_dir(profile) {
            data_dir.join("tasks.db").to_string_lossy().to_string()
        } else {
            format!("~/.local/share/{}/tasks.db", profile.app_name())
        }
    }

    /// Get the expanded database path (with ~ expansion)
    pub fn get_database_path(&self) -> PathBuf {
        utils::expand_path(&self.database_path)
    }

    /// Colors for the active theme mode.
    /// An empty highlight foreground is derived from the highlight background.
    pub fn get_active_theme(&self) -> Theme {
        use crate::tui::widgets::color::{format_color_for_display, get_contrast_text_color, parse_color};

        let mut theme = self.theme.palette();
        if theme.highlight_fg.is_empty() {
            let calculated_fg = get_contrast_text_color(parse_color(&theme.highlight_bg));
            theme.highlight_fg = format_color_for_display(&calculated_fg);
        }
        theme
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.toml");
        let config = Config::load_from_path(&path).unwrap();

        assert!(path.exists());
        assert_eq!(config.theme, ThemeMode::Light);
        assert_eq!(config.reminders.permission, ReminderPermission::Ask);
        assert_eq!(config.reminders.poll_interval(), Duration::from_secs(60));
        assert_eq!(config.key_bindings.sort_title, "S");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "database_path = \"/tmp/x.db\"\ntheme = \"dark\"\n\n[reminders]\npermission = \"granted\"\n",
        )
        .unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.database_path, "/tmp/x.db");
        assert_eq!(config.theme, ThemeMode::Dark);
        assert!(config.reminders.is_enabled());
        assert!(config.reminders.sound);
        assert_eq!(config.key_bindings.quit, "q");
    }

    #[test]
    fn custom_database_path_survives_profile_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "database_path = \"/srv/tasks/custom.db\"\n").unwrap();

        let config = Config::load_from_path_with_profile(&path, utils::Profile::Dev).unwrap();
        assert_eq!(config.database_path, "/srv/tasks/custom.db");
        assert_eq!(config.get_database_path(), PathBuf::from("/srv/tasks/custom.db"));
    }

    #[test]
    fn missing_database_path_uses_profile_location() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "theme = \"dark\"\n").unwrap();

        let config = Config::load_from_path_with_profile(&path, utils::Profile::Dev).unwrap();
        assert!(config.database_path.contains("dueline-dev"));
        assert!(config.database_path.ends_with("tasks.db"));

        let created = dir.path().join("fresh.toml");
        let config = Config::load_from_path_with_profile(&created, utils::Profile::Dev).unwrap();
        assert!(config.database_path.contains("dueline-dev"));
        let reloaded = Config::load_from_path(&created).unwrap();
        assert_eq!(reloaded.database_path, config.database_path);
    }

    #[test]
    fn saved_permission_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::load_from_path(&path).unwrap();
        config.reminders.permission = ReminderPermission::Denied;
        config.theme = config.theme.toggled();
        config.save_to_path(&path).unwrap();

        let reloaded = Config::load_from_path(&path).unwrap();
        assert_eq!(reloaded.reminders.permission, ReminderPermission::Denied);
        assert_eq!(reloaded.theme, ThemeMode::Dark);
        assert_eq!(reloaded.config_version, Some(CURRENT_CONFIG_VERSION));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "theme = [").unwrap();
        assert!(matches!(
            Config::load_from_path(&path),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn zero_poll_interval_is_clamped() {
        let reminders = ReminderConfig {
            poll_interval_secs: 0,
            ..ReminderConfig::default()
        };
        assert_eq!(reminders.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn dark_theme_derives_highlight_foreground() {
        let config = Config {
            theme: ThemeMode::Dark,
            ..Config::default()
        };
        assert!(!config.get_active_theme().highlight_fg.is_empty());
    }
}
