use std::fs::File;
use std::io::Read;

use json_comments::StripComments;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::ziplist::SIZE_SAFETY_LIMIT;

pub const CONFIG_PATH_JSON: &str = "./ziplist.json";
pub const CONFIG_PATH_TOML: &str = "./ziplist.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZipListConfig {
    /// entries above which the owner should switch to a bigger encoding
    #[serde(default = "max_entries")]
    pub max_entries: usize,
    /// longest value a zip list should hold
    #[serde(default = "max_value")]
    pub max_value: usize,
    /// hard cap on the encoded size of one list
    #[serde(default = "safety_limit")]
    pub safety_limit: usize,
    /// walk every entry when adopting foreign bytes
    #[serde(default = "deep_validate")]
    pub deep_validate: bool,
}

fn max_entries() -> usize {
    128
}

fn max_value() -> usize {
    64
}

fn safety_limit() -> usize {
    SIZE_SAFETY_LIMIT
}

fn deep_validate() -> bool {
    true
}

impl Default for ZipListConfig {
    fn default() -> Self {
        Self {
            max_entries: max_entries(),
            max_value: max_value(),
            safety_limit: safety_limit(),
            deep_validate: deep_validate(),
        }
    }
}

impl ZipListConfig {
    /// Loads `path`, or `./ziplist.json` then `./ziplist.toml`. Any failure
    /// falls back to the defaults.
    pub fn new(path: Option<&str>) -> Self {
        let config_path_show;
        let mut file = if let Some(path) = path {
            config_path_show = path;
            if let Ok(file) = File::open(path) {
                file
            } else {
                warn!("Config File: {} Read Fail, Use Default Config.", config_path_show);
                return ZipListConfig::default();
            }
        } else if let Ok(file) = File::open(CONFIG_PATH_JSON) {
            config_path_show = CONFIG_PATH_JSON;
            file
        } else if let Ok(file) = File::open(CONFIG_PATH_TOML) {
            config_path_show = CONFIG_PATH_TOML;
            file
        } else {
            info!("No config file found, Use Default Config.");
            return ZipListConfig::default();
        };

        let mut config_string = String::new();
        if let Err(e) = file.read_to_string(&mut config_string) {
            warn!("Config File: {} Read Fail {e}, Use Default Config.", config_path_show);
            return ZipListConfig::default();
        }
        info!("Config File: {}", config_path_show);
        Self::parse(&config_string).unwrap_or_else(|e| {
            warn!("Config File: {} Parse Fail {e}, Use Default Config.", config_path_show);
            ZipListConfig::default()
        })
    }

    /// TOML first, then JSON with comments stripped.
    pub fn parse(config_string: &str) -> crate::Result<Self> {
        if let Ok(config) = toml::from_str(config_string) {
            return Ok(config);
        }
        let stripped = StripComments::new(config_string.as_bytes());
        Ok(serde_json::from_reader(stripped)?)
    }

    /// Whether a list of `entries` entries may take one more value of `value_len` bytes.
    pub fn fits(&self, entries: usize, value_len: usize) -> bool {
        entries < self.max_entries && value_len <= self.max_value
    }
}
