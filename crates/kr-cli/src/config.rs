//! Configuration loading and management.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use kr_core::palette::builtin_codes;
use kr_core::{DEFAULT_BAR_WIDTH, DEFAULT_PALETTE, PaletteSet};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory searched recursively for `.klg` files.
    pub klog_dir: PathBuf,

    /// Program invoked as `<klog_command> json <file> [args...]`.
    pub klog_command: String,

    /// Name of the palette used for tag colors.
    pub palette: String,

    /// Length of the longest bar in each chart.
    pub bar_width: usize,

    /// Available palettes as 256-color codes, keyed by name.
    pub palettes: BTreeMap<String, Vec<u8>>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("klog_dir", &self.klog_dir)
            .field("klog_command", &self.klog_command)
            .field("palette", &self.palette)
            .field("bar_width", &self.bar_width)
            .field("palettes", &self.palettes.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            klog_dir: home.join("klog"),
            klog_command: "klog".to_string(),
            palette: DEFAULT_PALETTE.to_string(),
            bar_width: DEFAULT_BAR_WIDTH,
            palettes: builtin_codes(),
        }
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // KLOG_DIR is shared with klog itself
        figment = figment.merge(Env::raw().only(&["klog_dir"]));

        // Load from environment variables (KR_*)
        figment = figment.merge(Env::prefixed("KR_"));

        figment.extract()
    }

    /// Palettes available to the report, built-ins included unless overridden.
    pub fn palette_set(&self) -> PaletteSet {
        PaletteSet::from_codes(self.palettes.clone())
    }
}

/// Returns the platform-specific config directory for klog-report.
///
/// On Linux: `~/.config/klog-report`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("klog-report"))
}
