//! Configuration loading for dossier.
//!
//! Values are layered, later layers winning:
//!
//! 1. built-in defaults ([`Config::default`]),
//! 2. a configuration file (TOML, YAML or JSON, chosen by extension),
//!    either given explicitly or found in the platform configuration
//!    directory as `config.toml`,
//! 3. environment variables prefixed with `DOSSIER_`, nested keys separated
//!    by a double underscore (`DOSSIER_POLLING__MAX_ATTEMPTS=30`).
//!
//! The default API base path comes from the `DOSSIER_API_BASE` environment
//! variable *at build time*, falling back to `/api`.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::{ProjectDirs, UserDirs};
use dossier_archive::{CompressionLimits, LOCAL_SIZE_THRESHOLD};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Base path of the compression REST API when nothing else is configured.
pub const DEFAULT_API_BASE: &str = match option_env!("DOSSIER_API_BASE") {
    Some(base) => base,
    None => "/api",
};
const ENV_PREFIX: &str = "DOSSIER_";
const APPLICATION: &str = "dossier";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub polling: PollingConfig,
    pub local: LocalConfig,
    pub limits: CompressionLimits,
    /// Where finished archives are saved.
    pub download_dir: PathBuf,
    /// Where the compression history is kept.
    pub history_file: PathBuf,
}
impl Default for Config {
    fn default() -> Self {
        let data_dir = ProjectDirs::from("", "", APPLICATION)
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        let download_dir = UserDirs::new()
            .and_then(|dirs| dirs.download_dir().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            api: ApiConfig::default(),
            polling: PollingConfig::default(),
            local: LocalConfig::default(),
            limits: CompressionLimits::default(),
            download_dir,
            history_file: data_dir.join("history.json"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Scheme and authority that relative URLs are resolved against.
    pub origin: String,
    /// Path (or absolute URL) of the API root, e.g. `/api`.
    pub base: String,
    pub timeout_secs: u64,
}
impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:8080".to_string(),
            base: DEFAULT_API_BASE.to_string(),
            timeout_secs: 30,
        }
    }
}
impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// How server-side jobs are watched until they finish.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_ms: u64,
    /// Upper bound on status requests for one job.
    pub max_attempts: u32,
}
impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2_000,
            max_attempts: 60,
        }
    }
}
impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    /// Aggregate size above which the server builds the archive.
    pub size_threshold: u64,
}
impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            size_threshold: LOCAL_SIZE_THRESHOLD,
        }
    }
}

impl Config {
    /// Load the layered configuration.
    ///
    /// An explicit `path` must exist; the implicit platform path is skipped
    /// silently when absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::from_figment(Self::figment(path)?)
    }

    /// Build the layered [`Figment`] without extracting it.
    pub fn figment(path: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        match path {
            Some(path) => {
                if !path.exists() {
                    exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
                }
                figment = merge_file(figment, path)?;
            },
            None => {
                if let Some(path) = Self::default_path().filter(|p| p.exists()) {
                    tracing::debug!(path = %path.display(), "Using configuration file");
                    figment = merge_file(figment, &path)?;
                }
            },
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Extract and validate a configuration.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract().map_err(|e| ErrorKind::Invalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// `config.toml` inside the platform configuration directory.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APPLICATION).map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Reject values that deserialize but cannot work.
    pub fn validate(&self) -> Result<()> {
        if !(self.api.origin.starts_with("http://") || self.api.origin.starts_with("https://")) {
            exn::bail!(ErrorKind::InvalidValue {
                key: "api.origin",
                reason: format!("`{}` is not an http(s) URL", self.api.origin),
            });
        }
        if self.api.base.trim().is_empty() {
            exn::bail!(ErrorKind::InvalidValue {
                key: "api.base",
                reason: "must not be empty".to_string(),
            });
        }
        if self.polling.interval_ms == 0 {
            exn::bail!(ErrorKind::InvalidValue {
                key: "polling.interval_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.polling.max_attempts == 0 {
            exn::bail!(ErrorKind::InvalidValue {
                key: "polling.max_attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.limits.allowed_formats.is_empty() {
            exn::bail!(ErrorKind::InvalidValue {
                key: "limits.allowed_formats",
                reason: "at least one format must be allowed".to_string(),
            });
        }
        Ok(())
    }
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    let extension = path.extension().and_then(|e| e.to_str()).map(str::to_lowercase);
    Ok(match extension.as_deref() {
        Some("toml") => figment.merge(Toml::file(path)),
        Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
        Some("json") => figment.merge(Json::file(path)),
        _ => exn::bail!(ErrorKind::UnsupportedFile(path.to_path_buf())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dossier_archive::ArchiveFormat;
    use figment::Jail;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.base, DEFAULT_API_BASE);
        assert_eq!(config.polling.interval(), Duration::from_secs(2));
        assert_eq!(config.polling.max_attempts, 60);
        assert_eq!(config.local.size_threshold, 100 * 1024 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_file_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "dossier.toml",
                r#"
                download_dir = "/tmp/archivos"

                [api]
                origin = "https://despacho.example"
                base = "/v2/api"

                [polling]
                max_attempts = 5

                [limits]
                allowed_formats = ["zip"]
                "#,
            )?;
            let config = Config::load(Some(Path::new("dossier.toml"))).unwrap();
            assert_eq!(config.api.origin, "https://despacho.example");
            assert_eq!(config.api.base, "/v2/api");
            assert_eq!(config.polling.max_attempts, 5);
            // Untouched keys keep their defaults.
            assert_eq!(config.polling.interval_ms, 2_000);
            assert_eq!(config.limits.allowed_formats, vec![ArchiveFormat::Zip]);
            assert_eq!(config.download_dir, PathBuf::from("/tmp/archivos"));
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("dossier.yaml", "polling:\n  interval_ms: 500\n")?;
            jail.set_env("DOSSIER_POLLING__INTERVAL_MS", "250");
            jail.set_env("DOSSIER_API__ORIGIN", "https://env.example");
            let config = Config::load(Some(Path::new("dossier.yaml"))).unwrap();
            assert_eq!(config.polling.interval_ms, 250);
            assert_eq!(config.api.origin, "https://env.example");
            Ok(())
        });
    }

    #[test]
    fn test_json_file() {
        Jail::expect_with(|jail| {
            jail.create_file("dossier.json", r#"{"local": {"size_threshold": 1024}}"#)?;
            let config = Config::load(Some(Path::new("dossier.json"))).unwrap();
            assert_eq!(config.local.size_threshold, 1024);
            Ok(())
        });
    }

    #[test]
    fn test_missing_explicit_file() {
        Jail::expect_with(|_| {
            let err = Config::load(Some(Path::new("nope.toml"))).unwrap_err();
            assert_eq!(*err, ErrorKind::NotFound(PathBuf::from("nope.toml")));
            Ok(())
        });
    }

    #[test]
    fn test_unsupported_extension() {
        Jail::expect_with(|jail| {
            jail.create_file("dossier.ini", "[api]")?;
            let err = Config::load(Some(Path::new("dossier.ini"))).unwrap_err();
            assert_eq!(*err, ErrorKind::UnsupportedFile(PathBuf::from("dossier.ini")));
            Ok(())
        });
    }

    #[test]
    fn test_wrong_type_is_invalid() {
        Jail::expect_with(|jail| {
            jail.create_file("dossier.toml", "[polling]\nmax_attempts = \"many\"\n")?;
            let err = Config::load(Some(Path::new("dossier.toml"))).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Invalid(_)));
            Ok(())
        });
    }

    #[rstest]
    #[case("api.origin", |c: &mut Config| c.api.origin = "localhost:8080".to_string())]
    #[case("api.base", |c: &mut Config| c.api.base = " ".to_string())]
    #[case("polling.interval_ms", |c: &mut Config| c.polling.interval_ms = 0)]
    #[case("polling.max_attempts", |c: &mut Config| c.polling.max_attempts = 0)]
    #[case("limits.allowed_formats", |c: &mut Config| c.limits.allowed_formats.clear())]
    fn test_validate_rejects(#[case] key: &str, #[case] mutate: fn(&mut Config)) {
        let mut config = Config::default();
        mutate(&mut config);
        let err = config.validate().unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidValue { key: k, .. } if *k == key));
    }
}
