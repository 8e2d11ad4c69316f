//! `~/.config/flurry/config.toml` and the other file locations.
//!
//! The config file is optional and every key in it has a default. Unknown
//! keys are warned about so typos do not pass silently.
use serde::Deserialize;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::content::EntityTable;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// SEC-014: the file is over [`MAX_CONFIG_SIZE`].
    #[error("Config is {size} bytes, the limit is {MAX_CONFIG_SIZE}")]
    TooLarge { size: u64 },

    #[error("HOME environment variable not set")]
    NoHome,
}

/// SEC-014: config files larger than this are refused unread.
pub const MAX_CONFIG_SIZE: u64 = 1024 * 1024;

const KNOWN_KEYS: [&str; 6] = [
    "wrap_width",
    "smart_feed",
    "sort_ignore_prefixes",
    "mark_read_on_show",
    "entities",
    "category_colors",
];

/// Contents of `path`, or `None` if there is no such file.
fn read_capped(path: &Path) -> Result<Option<String>, ConfigError> {
    let size = match std::fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if size > MAX_CONFIG_SIZE {
        return Err(ConfigError::TooLarge { size });
    }
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        // Removed after the size check
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// ============================================================================
// Config
// ============================================================================

/// Everything `config.toml` can set. Each key is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Column width for item text. 0 = terminal width.
    pub wrap_width: usize,

    /// Whether to show the "(New headlines)" smart feed.
    pub smart_feed: bool,

    /// Title prefixes ignored when sorting feeds, matched case-insensitively.
    pub sort_ignore_prefixes: Vec<String>,

    /// Whether `show` marks the items it prints as read.
    pub mark_read_on_show: bool,

    /// Extra entity conversions for the dejunker, name -> replacement.
    pub entities: HashMap<String, String>,

    /// Display colour labels per category.
    pub category_colors: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wrap_width: 0,
            smart_feed: true,
            sort_ignore_prefixes: vec!["the ".into(), "a ".into(), "an ".into()],
            mark_read_on_show: false,
            entities: HashMap::new(),
            category_colors: HashMap::new(),
        }
    }
}

impl Config {
    /// Reads `path`. No file, or one holding only whitespace, means defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match read_capped(path)? {
            Some(content) => {
                let config = Self::from_toml(&content)?;
                tracing::debug!(path = %path.display(), "Config loaded");
                Ok(config)
            }
            None => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Parses config text. Keys flurry does not know are logged and skipped.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let table: toml::Table = content.parse()?;
        for key in table.keys().filter(|k| !KNOWN_KEYS.contains(&k.as_str())) {
            tracing::warn!(key = %key, "Ignoring unknown config key");
        }
        Ok(table.try_into()?)
    }

    /// The `[entities]` table in the form the dejunker takes.
    pub fn entity_table(&self) -> EntityTable {
        self.entities
            .iter()
            .map(|(name, text)| (name.clone(), text.clone()))
            .collect()
    }
}

// ============================================================================
// File Locations
// ============================================================================

/// Where flurry keeps its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub config_file: PathBuf,
    pub subscriptions: PathBuf,
    pub cache_dir: PathBuf,
}

impl Paths {
    /// `~/.config/flurry/` for config and subscriptions, `~/.cache/flurry/`
    /// for the feed cache.
    pub fn from_home() -> Result<Self, ConfigError> {
        let home = std::env::var_os("HOME")
            .filter(|h| !h.is_empty())
            .ok_or(ConfigError::NoHome)?;
        let home = PathBuf::from(home);
        let config_dir = home.join(".config").join("flurry");
        Ok(Self {
            config_file: config_dir.join("config.toml"),
            subscriptions: config_dir.join("feeds.toml"),
            cache_dir: home.join(".cache").join("flurry"),
        })
    }

    /// Everything under one directory.
    pub fn under(root: &Path) -> Self {
        Self {
            config_file: root.join("config.toml"),
            subscriptions: root.join("feeds.toml"),
            cache_dir: root.join("cache"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
