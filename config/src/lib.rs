//! Configuration loading for Bulwark.
//!
//! The file lives at `~/.bulwark/config.toml`. Every section is optional; a
//! missing file resolves to the same [`Settings`] as an empty one.
//!
//! ```toml
//! [app]
//! build_mode = "development"
//! ascii_only = false
//! high_contrast = false
//!
//! [support]
//! email = "support@example.com"
//! home_route = "/"
//! signup_route = "/register"
//!
//! [reporting]
//! sink = "jsonl"
//! path = "~/.bulwark/faults.jsonl"
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use bulwark_types::{BuildMode, RoutePath, UiOptions, UnknownBuildMode};

/// Environment variable that overrides `[app] build_mode`.
pub const BUILD_MODE_ENV: &str = "BULWARK_BUILD_MODE";

const DEFAULT_SUPPORT_EMAIL: &str = "support@example.com";
const DEFAULT_SIGNUP_ROUTE: &str = "/register";
const DEFAULT_FAULT_LOG: &str = "faults.jsonl";

#[derive(Debug, Default, Deserialize)]
pub struct BulwarkConfig {
    pub app: Option<AppConfig>,
    pub support: Option<SupportConfig>,
    pub reporting: Option<ReportingConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// `"development"` or `"production"`. Defaults to production.
    pub build_mode: Option<String>,
    /// Use ASCII-only glyphs for icons and spinners.
    #[serde(default)]
    pub ascii_only: bool,
    /// Enable a high-contrast color palette.
    #[serde(default)]
    pub high_contrast: bool,
    /// Freeze the loading spinner.
    #[serde(default)]
    pub reduced_motion: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct SupportConfig {
    pub email: Option<String>,
    pub home_route: Option<String>,
    /// Set to an empty string to hide the sign-up link.
    pub signup_route: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportingConfig {
    /// `"none"` or `"jsonl"`.
    pub sink: Option<String>,
    pub path: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error(transparent)]
    BuildMode(#[from] UnknownBuildMode),
    #[error("unknown fault sink `{0}` (expected `none` or `jsonl`)")]
    UnknownSink(String),
    #[error("fault sink path could not be determined")]
    NoSinkPath,
}

/// Where fault reports go besides the log.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReportingTarget {
    #[default]
    None,
    JsonLines(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportSettings {
    pub email: Option<String>,
    pub home_route: RoutePath,
    pub signup_route: Option<RoutePath>,
}

impl Default for SupportSettings {
    fn default() -> Self {
        Self {
            email: Some(DEFAULT_SUPPORT_EMAIL.to_string()),
            home_route: RoutePath::root(),
            signup_route: Some(RoutePath::parse(DEFAULT_SIGNUP_ROUTE)),
        }
    }
}

/// Fully resolved settings, defaults applied.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Settings {
    pub build_mode: BuildMode,
    pub ui: UiOptions,
    pub support: SupportSettings,
    pub reporting: ReportingTarget,
}

impl BulwarkConfig {
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    /// Resolve against the process environment.
    pub fn resolve(&self) -> Result<Settings, ConfigError> {
        let env_mode = env::var(BUILD_MODE_ENV).ok();
        self.resolve_with(env_mode.as_deref())
    }

    /// Resolve with an explicit build-mode override (takes precedence over the file).
    pub fn resolve_with(&self, build_mode_override: Option<&str>) -> Result<Settings, ConfigError> {
        let app = self.app.as_ref();

        let build_mode = match build_mode_override
            .filter(|raw| !raw.trim().is_empty())
            .or_else(|| app.and_then(|app| app.build_mode.as_deref()))
        {
            Some(raw) => expand_env_vars(raw).parse()?,
            None => BuildMode::default(),
        };

        let ui = app.map_or_else(UiOptions::default, |app| UiOptions {
            ascii_only: app.ascii_only,
            high_contrast: app.high_contrast,
            reduced_motion: app.reduced_motion,
        });

        Ok(Settings {
            build_mode,
            ui,
            support: self.support_settings(),
            reporting: self.reporting_target()?,
        })
    }

    fn support_settings(&self) -> SupportSettings {
        let defaults = SupportSettings::default();
        let Some(support) = self.support.as_ref() else {
            return defaults;
        };

        let email = match support.email.as_deref().map(expand_env_vars) {
            Some(email) if email.trim().is_empty() => None,
            Some(email) => Some(email.trim().to_string()),
            None => defaults.email,
        };
        let home_route = support
            .home_route
            .as_deref()
            .map_or(defaults.home_route, RoutePath::parse);
        let signup_route = match support.signup_route.as_deref() {
            Some(raw) if raw.trim().is_empty() => None,
            Some(raw) => Some(RoutePath::parse(raw)),
            None => defaults.signup_route,
        };

        SupportSettings {
            email,
            home_route,
            signup_route,
        }
    }

    fn reporting_target(&self) -> Result<ReportingTarget, ConfigError> {
        let Some(reporting) = self.reporting.as_ref() else {
            return Ok(ReportingTarget::None);
        };

        let sink = reporting
            .sink
            .as_deref()
            .unwrap_or("none")
            .trim()
            .to_ascii_lowercase();
        match sink.as_str() {
            "" | "none" => Ok(ReportingTarget::None),
            "jsonl" | "json-lines" => {
                let path = match reporting.path.as_deref() {
                    Some(raw) => expand_home(&expand_env_vars(raw)),
                    None => config_dir().map(|dir| dir.join(DEFAULT_FAULT_LOG)),
                };
                path.map(ReportingTarget::JsonLines)
                    .ok_or(ConfigError::NoSinkPath)
            }
            _ => Err(ConfigError::UnknownSink(sink)),
        }
    }
}

/// Replace `${VAR}` references with their environment values (missing → empty).
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let var = &after[..end];
                if !var.is_empty() {
                    out.push_str(&env::var(var).unwrap_or_default());
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);

    out
}

fn expand_home(raw: &str) -> Option<PathBuf> {
    match raw.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
        None => Some(PathBuf::from(raw)),
    }
}

#[must_use]
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".bulwark"))
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}
