//! Service configuration. Built-in defaults are layered under an optional
//! TOML file and `PRODCLASS__SECTION__FIELD` environment variables.

use crate::catalog::{ClassCatalog, DEFAULT_LABELS};
use crate::preprocess::TensorLayout;
use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file read when none is given on the command line
pub const DEFAULT_CONFIG_PATH: &str = "config/prodclass.toml";

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "PRODCLASS";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub fetch: FetchConfig,
    pub input: InputConfig,
    pub classes: ClassesConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Number of actix workers; 0 lets actix pick one per core
    pub workers: usize,
    /// Largest accepted request body
    pub json_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".into(),
            port: 5000,
            workers: 0,
            json_limit_bytes: 32 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the ONNX artifact
    pub path: PathBuf,
    /// Side of the square input the model expects
    pub image_size: u32,
    pub layout: TensorLayout,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            path: PathBuf::from("models/update_lenet_model_save_keras_quantized.onnx"),
            image_size: 256,
            layout: TensorLayout::Nhwc,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub max_bytes: usize,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            timeout_secs: 10,
            max_bytes: 16 * 1024 * 1024,
            user_agent: format!("prodclass/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Largest accepted width or height for inline `image_data`
    pub max_dimension: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        InputConfig { max_dimension: 4096 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassesConfig {
    pub labels: Vec<String>,
}

impl Default for ClassesConfig {
    fn default() -> Self {
        ClassesConfig {
            labels: DEFAULT_LABELS.iter().map(|l| l.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info,prodclass=debug".into(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a file (optional) and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env_prefix(path, ENV_PREFIX)
    }

    /// Same as [`AppConfig::load`], reading overrides from
    /// `<prefix>__SECTION__FIELD` variables
    pub fn load_with_env_prefix(path: Option<&Path>, prefix: &str) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        let config = Config::builder()
            .add_source(File::from(path.as_path()).required(required))
            .add_source(
                Environment::with_prefix(prefix)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("classes.labels"),
            )
            .build()
            .with_context(|| format!("failed to read configuration from {}", path.display()))?;

        let config: AppConfig = config
            .try_deserialize()
            .context("failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            bail!("server.port must be non-zero");
        }
        if self.model.image_size == 0 {
            bail!("model.image_size must be non-zero");
        }
        if self.fetch.max_bytes == 0 {
            bail!("fetch.max_bytes must be non-zero");
        }
        if self.input.max_dimension == 0 {
            bail!("input.max_dimension must be non-zero");
        }
        self.catalog()?;
        Ok(())
    }

    /// Build the class catalog named by `classes.labels`
    pub fn catalog(&self) -> Result<ClassCatalog> {
        ClassCatalog::new(self.classes.labels.iter().cloned()).context("invalid classes.labels")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.model.image_size, 256);
        assert_eq!(config.model.layout, TensorLayout::Nhwc);
        assert_eq!(
            config.model.path,
            PathBuf::from("models/update_lenet_model_save_keras_quantized.onnx")
        );
        assert_eq!(config.catalog().unwrap(), ClassCatalog::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("prodclass-test-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[server]\nport = 8081\n\n[model]\nlayout = \"nchw\"\nimage_size = 224\n\n[classes]\nlabels = [\"RINGS\", \"CHAINS\"]"
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.server.port, 8081);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.model.layout, TensorLayout::Nchw);
        assert_eq!(config.model.image_size, 224);
        assert_eq!(config.catalog().unwrap().len(), 2);
    }

    #[test]
    fn test_env_overrides() {
        // A prefix of its own keeps this test apart from the others running
        // in parallel
        let prefix = "PRODCLASSENVTEST";
        std::env::set_var("PRODCLASSENVTEST__SERVER__PORT", "8080");
        std::env::set_var("PRODCLASSENVTEST__SERVER__JSON_LIMIT_BYTES", "1234");
        std::env::set_var("PRODCLASSENVTEST__CLASSES__LABELS", "A,B,C");

        let config = AppConfig::load_with_env_prefix(None, prefix).unwrap();

        std::env::remove_var("PRODCLASSENVTEST__SERVER__PORT");
        std::env::remove_var("PRODCLASSENVTEST__SERVER__JSON_LIMIT_BYTES");
        std::env::remove_var("PRODCLASSENVTEST__CLASSES__LABELS");

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.json_limit_bytes, 1234);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(
            config.catalog().unwrap(),
            ClassCatalog::new(["A", "B", "C"]).unwrap()
        );
        assert_eq!(config.model.image_size, 256);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let path = Path::new("/nonexistent/prodclass.toml");
        assert!(AppConfig::load(Some(path)).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_size() {
        let mut config = AppConfig::default();
        config.model.image_size = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.classes.labels.clear();
        assert!(config.validate().is_err());
    }
}
