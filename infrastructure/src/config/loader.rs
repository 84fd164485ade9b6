//! Configuration file loader with multi-source merging

use super::file_config::{APP_DIR, FileConfig};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

/// Project-level file names, checked in order
const PROJECT_FILES: [&str; 2] = ["roundtable.toml", ".roundtable.toml"];

/// Prefix for environment overrides, e.g. `ROUNDTABLE_MEETING__ROUNDS=3`
const ENV_PREFIX: &str = "ROUNDTABLE_";

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `ROUNDTABLE_` environment variables (`__` separates sections)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./roundtable.toml` or `./.roundtable.toml`
    /// 4. Global: `<config dir>/ai-roundtable/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, Box<figment::Error>> {
        Self::figment(
            Self::global_config_path().as_deref(),
            Self::project_config_path().as_deref(),
            config_path.map(PathBuf::as_path),
        )
        .extract()
        .map_err(Box::new)
    }

    fn figment(global: Option<&Path>, project: Option<&Path>, explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(path) = global
            && path.exists()
        {
            figment = figment.merge(Toml::file(path));
        }
        if let Some(path) = project {
            figment = figment.merge(Toml::file(path));
        }
        if let Some(path) = explicit {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// Get the global config file path
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Describe the config file locations being used (for --show-config)
    pub fn config_sources() -> Vec<String> {
        let mut lines = vec!["Configuration sources (in priority order):".to_string()];
        lines.push(format!("  [ENV  ] {ENV_PREFIX}* variables"));

        match Self::project_config_path() {
            Some(path) => lines.push(format!("  [FOUND] Project: {}", path.display())),
            None => lines.push(format!(
                "  [     ] Project: ./{} or ./{}",
                PROJECT_FILES[0], PROJECT_FILES[1]
            )),
        }

        if let Some(path) = Self::global_config_path() {
            let mark = if path.exists() { "FOUND" } else { "     " };
            lines.push(format!("  [{mark}] Global:  {}", path.display()));
        }

        lines.push("  [     ] Default: built-in defaults".to_string());
        lines
    }
}
