//! User configuration loaded from `$XDG_CONFIG_HOME/revcheck/config.toml`.
//!
//! Every key is optional. A missing file means defaults; an unreadable or
//! malformed file is reported on stderr and also falls back to defaults.

use std::path::PathBuf;

use revcheck_core::{ManualPolicy, SheetFormat};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `"dark"` or `"catppuccin-mocha"`.
    pub theme: String,
    pub db_path: PathBuf,
    pub log_dir: PathBuf,
    /// Refuse empty manual corrections.
    pub require_nonempty_manual: bool,
    /// Where the review UI writes exports.
    pub export_dir: PathBuf,
    /// `"xlsx"` or `"csv"`.
    pub export_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: "catppuccin-mocha".to_owned(),
            db_path: PathBuf::from(".revcheck/review.db"),
            log_dir: PathBuf::from(".revcheck/logs"),
            require_nonempty_manual: true,
            export_dir: PathBuf::from("."),
            export_format: "xlsx".to_owned(),
        }
    }
}

/// Prefers `$XDG_CONFIG_HOME/revcheck/config.toml`; falls back to
/// `~/.config/revcheck/config.toml`.
pub fn config_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("HOME").ok().map(|h| PathBuf::from(h).join(".config")))
        .unwrap_or_else(|| PathBuf::from(".config"));
    base.join("revcheck").join("config.toml")
}

impl Config {
    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Never fails; problems are printed and defaults used.
    pub fn load() -> Self {
        let path = config_path();
        let raw = match std::fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                eprintln!("revcheck: cannot read {}: {e}", path.display());
                return Self::default();
            }
        };
        Self::from_toml(&raw).unwrap_or_else(|e| {
            eprintln!("revcheck: config parse error in {}: {e}", path.display());
            Self::default()
        })
    }

    pub fn manual_policy(&self) -> ManualPolicy {
        ManualPolicy { require_nonempty: self.require_nonempty_manual }
    }

    /// Unknown names fall back to xlsx with a warning.
    pub fn export_format(&self) -> SheetFormat {
        self.export_format.parse().unwrap_or_else(|err| {
            tracing::warn!(%err, "falling back to xlsx exports");
            SheetFormat::Excel
        })
    }
}
