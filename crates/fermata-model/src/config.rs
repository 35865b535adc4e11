use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::platform;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub radio: RadioConfig,
    #[serde(default)]
    pub scrobble: ScrobbleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Roots handed to the library scanner.
    #[serde(default = "default_music_dirs")]
    pub music_dirs: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    #[serde(default = "default_seek_step_secs")]
    pub seek_step_secs: u64,
    #[serde(default = "default_volume_step")]
    pub volume_step: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadioConfig {
    #[serde(default = "default_radio_enabled")]
    pub enabled: bool,
    /// How many tracks to ask the recommender for per fill.
    #[serde(default = "default_fill_size")]
    pub fill_size: usize,
}

/// Listening-history credentials. The session key comes from the external
/// auth flow; fermata only checks whether one is present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScrobbleConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub session_key: String,
}

impl ScrobbleConfig {
    /// Scrobbling requires opt-in plus a complete identity.
    pub fn authenticated(&self) -> bool {
        self.enabled && !self.username.is_empty() && !self.session_key.is_empty()
    }
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            music_dirs: default_music_dirs(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            seek_step_secs: default_seek_step_secs(),
            volume_step: default_volume_step(),
        }
    }
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            enabled: default_radio_enabled(),
            fill_size: default_fill_size(),
        }
    }
}

fn default_music_dirs() -> Vec<PathBuf> {
    vec![platform::default_music_dir()]
}

fn default_seek_step_secs() -> u64 {
    5
}

fn default_volume_step() -> f32 {
    0.05
}

fn default_radio_enabled() -> bool {
    true
}

fn default_fill_size() -> usize {
    10
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            library: LibraryConfig::default(),
            playback: PlaybackConfig::default(),
            radio: RadioConfig::default(),
            scrobble: ScrobbleConfig::default(),
        }
    }
}
