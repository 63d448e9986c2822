//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/wordflash/config.toml)
//! 3. Environment variables (WORDFLASH_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable prefix
const ENV_PREFIX: &str = "WORDFLASH";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the word store
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Language of source words (audio is spoken in this language)
    #[serde(default = "default_source_lang")]
    pub source_lang: String,

    /// Language of translations
    #[serde(default = "default_target_lang")]
    pub target_lang: String,

    /// Name of generated decks
    #[serde(default = "default_deck_name")]
    pub deck_name: String,

    /// Where decks and media go; defaults to `{data_dir}/output`
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Timeout handed to image providers
    #[serde(default = "default_media_timeout_secs")]
    pub media_timeout_secs: u64,

    /// Write logs here instead of stderr
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            source_lang: default_source_lang(),
            target_lang: default_target_lang(),
            deck_name: default_deck_name(),
            output_dir: None,
            media_timeout_secs: default_media_timeout_secs(),
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (WORDFLASH_DATA_DIR, WORDFLASH_SOURCE_LANG, ...)
    /// 2. Config file (~/.config/wordflash/config.toml or WORDFLASH_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring a path given on the command line
    pub fn load_with_cli_override(config_path: Option<&PathBuf>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // WORDFLASH_DATA_DIR
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        // WORDFLASH_SOURCE_LANG
        if let Ok(val) = std::env::var(format!("{}_SOURCE_LANG", ENV_PREFIX)) {
            if !val.is_empty() {
                self.source_lang = val;
            }
        }

        // WORDFLASH_TARGET_LANG
        if let Ok(val) = std::env::var(format!("{}_TARGET_LANG", ENV_PREFIX)) {
            if !val.is_empty() {
                self.target_lang = val;
            }
        }

        // WORDFLASH_DECK_NAME
        if let Ok(val) = std::env::var(format!("{}_DECK_NAME", ENV_PREFIX)) {
            if !val.is_empty() {
                self.deck_name = val;
            }
        }
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with WORDFLASH_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wordflash")
            .join("config.toml")
    }

    /// Get the path to the word store
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("wordflash.db")
    }

    /// Get the deck output directory
    pub fn output_path(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("output"))
    }

    /// Get the image cache directory
    pub fn images_dir(&self) -> PathBuf {
        self.output_path().join("images")
    }

    /// Get the audio cache directory
    pub fn audio_dir(&self) -> PathBuf {
        self.output_path().join("audio")
    }

    pub fn media_timeout(&self) -> Duration {
        Duration::from_secs(self.media_timeout_secs)
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wordflash")
}

fn default_source_lang() -> String {
    "de".to_string()
}

fn default_target_lang() -> String {
    "en".to_string()
}

fn default_deck_name() -> String {
    "WordFlash Deck".to_string()
}

fn default_media_timeout_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            // Clear all the vars
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "WORDFLASH_DATA_DIR",
        "WORDFLASH_SOURCE_LANG",
        "WORDFLASH_TARGET_LANG",
        "WORDFLASH_DECK_NAME",
        "WORDFLASH_CONFIG",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.source_lang, "de");
        assert_eq!(config.target_lang, "en");
        assert_eq!(config.deck_name, "WordFlash Deck");
        assert_eq!(config.media_timeout(), Duration::from_secs(30));
        assert!(config.output_dir.is_none());
        assert!(config.data_dir.ends_with("wordflash"));
    }

    #[test]
    fn test_file_paths() {
        let config = Config {
            data_dir: PathBuf::from("/data/wordflash"),
            ..Config::default()
        };

        assert_eq!(
            config.database_path(),
            PathBuf::from("/data/wordflash/wordflash.db")
        );
        assert_eq!(
            config.output_path(),
            PathBuf::from("/data/wordflash/output")
        );
        assert!(config.images_dir().ends_with("output/images"));
        assert!(config.audio_dir().ends_with("output/audio"));

        let custom = Config {
            output_dir: Some(PathBuf::from("/decks")),
            ..config
        };
        assert_eq!(custom.images_dir(), PathBuf::from("/decks/images"));
    }

    #[test]
    fn test_env_override_data_dir() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("WORDFLASH_DATA_DIR", "/tmp/wordflash-test");
        config.apply_env_overrides();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/wordflash-test"));
    }

    #[test]
    fn test_env_override_languages_and_deck() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("WORDFLASH_SOURCE_LANG", "fr");
        env::set_var("WORDFLASH_TARGET_LANG", "de");
        env::set_var("WORDFLASH_DECK_NAME", "French");
        config.apply_env_overrides();
        assert_eq!(config.source_lang, "fr");
        assert_eq!(config.target_lang, "de");
        assert_eq!(config.deck_name, "French");

        // Empty values leave the setting alone
        env::set_var("WORDFLASH_SOURCE_LANG", "");
        config.apply_env_overrides();
        assert_eq!(config.source_lang, "fr");
    }

    #[test]
    fn test_config_file_path_env_override() {
        let _guard = EnvGuard::new(ENV_VARS);

        assert!(Config::config_file_path().ends_with("wordflash/config.toml"));

        env::set_var("WORDFLASH_CONFIG", "/etc/wordflash.toml");
        assert_eq!(
            Config::config_file_path(),
            PathBuf::from("/etc/wordflash.toml")
        );
    }

    #[test]
    fn test_serialization() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config {
            data_dir: PathBuf::from("/data/wordflash"),
            deck_name: "Animals".to_string(),
            log_file: Some(PathBuf::from("/tmp/wordflash.log")),
            ..Config::default()
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("data_dir"));
        assert!(toml_str.contains("deck_name"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.data_dir, config.data_dir);
        assert_eq!(parsed.deck_name, config.deck_name);
        assert_eq!(parsed.log_file, config.log_file);
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            data_dir = "/custom/data"
            source_lang = "es"
            media_timeout_secs = 5
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/custom/data"));
        assert_eq!(config.source_lang, "es");
        assert_eq!(config.target_lang, "en");
        assert_eq!(config.media_timeout_secs, 5);
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = TempDir::new().unwrap();
        env::set_var("WORDFLASH_DATA_DIR", temp_dir.path().join("data"));

        let path = PathBuf::from("/nonexistent/config.toml");
        let config = Config::load_from_path(&path).unwrap();
        // Should return defaults when file doesn't exist
        assert_eq!(config.deck_name, "WordFlash Deck");
        assert!(config.data_dir.exists());
    }

    #[test]
    fn test_save_and_reload() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let config = Config {
            data_dir: temp_dir.path().join("data"),
            target_lang: "fr".to_string(),
            ..Config::default()
        };
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_with_cli_override(Some(&path)).unwrap();
        assert_eq!(loaded.target_lang, "fr");
        assert_eq!(loaded.data_dir, temp_dir.path().join("data"));
    }
}
