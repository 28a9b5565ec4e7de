//! Configuration module for showcall runs.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file (`.showcall/settings.toml`)
//! - Environment variable overrides
//! - CLI argument overrides (applied by the binary)
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `SHOWCALL_` and use double
//! underscores to separate nested levels:
//! - `SHOWCALL_FRONTEND__CLANG=clang++-18` sets `frontend.clang`
//! - `SHOWCALL_REPORT__SHOW_CALL_AST=true` sets `report.show_call_ast`
//! - `SHOWCALL_DEBUG=true` sets `debug`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = ".showcall";
const CONFIG_FILE: &str = "settings.toml";
const ENV_PREFIX: &str = "SHOWCALL_";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Debug logging
    #[serde(default = "default_false")]
    pub debug: bool,

    /// How the semantic tree is produced
    #[serde(default)]
    pub frontend: FrontEndConfig,

    /// Report defaults
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FrontEndConfig {
    /// clang driver used for `-ast-dump=json`
    #[serde(default = "default_clang")]
    pub clang: String,

    /// Flags appended to every compile command
    #[serde(default)]
    pub extra_args: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct ReportConfig {
    #[serde(default = "default_false")]
    pub show_call_ast: bool,

    #[serde(default = "default_false")]
    pub show_callee_ast: bool,
}

fn default_version() -> u32 {
    1
}
fn default_false() -> bool {
    false
}
fn default_clang() -> String {
    "clang".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            debug: false,
            frontend: FrontEndConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl Default for FrontEndConfig {
    fn default() -> Self {
        Self {
            clang: default_clang(),
            extra_args: Vec::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        // Try to find the workspace config by looking for .showcall directory
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(CONFIG_FILE));
        Self::load_from(config_path)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(path.as_ref()))
            // Double underscore (__) separates nested levels
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Find `.showcall/settings.toml` from the current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(CONFIG_DIR);
            if config_dir.is_dir() {
                return Some(config_dir.join(CONFIG_FILE));
            }
        }

        None
    }

    /// Effective settings as TOML, for `--print-config`
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert_eq!(settings.frontend.clang, "clang");
        assert!(settings.frontend.extra_args.is_empty());
        assert!(!settings.report.show_call_ast);
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        let toml_content = r#"
version = 2
debug = true

[frontend]
clang = "/opt/llvm/bin/clang++"
extra_args = ["-std=c++20", "-Wno-everything"]

[report]
show_callee_ast = true
"#;

        fs::write(&config_path, toml_content).unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.version, 2);
        assert!(settings.debug);
        assert_eq!(settings.frontend.clang, "/opt/llvm/bin/clang++");
        assert_eq!(settings.frontend.extra_args, vec!["-std=c++20", "-Wno-everything"]);
        assert!(settings.report.show_callee_ast);
        // Default value should still be present
        assert!(!settings.report.show_call_ast);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings::load_from(temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings.frontend, FrontEndConfig::default());
    }

    #[test]
    fn test_env_overrides_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");
        fs::write(&config_path, "debug = false\n").unwrap();

        // Set environment variables that should override config file
        unsafe {
            std::env::set_var("SHOWCALL_DEBUG", "true");
        }

        let settings = Settings::load_from(&config_path).unwrap();
        assert!(settings.debug);

        // Clean up
        unsafe {
            std::env::remove_var("SHOWCALL_DEBUG");
        }
    }

    #[test]
    fn test_print_config_round_trips() {
        let settings = Settings::default();
        let printed = settings.to_toml().unwrap();
        assert!(printed.contains("[frontend]"));
        assert!(printed.contains("clang = \"clang\""));
        let parsed: Settings = toml::from_str(&printed).unwrap();
        assert_eq!(parsed, settings);
    }
}
