use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EcsonError, EcsonResult};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompileConfig {
    /// Validate the assembled IR before handing it out.
    pub validate_output: bool,
    /// Treat wires whose endpoints are missing as compile errors instead of warnings.
    pub strict_wires: bool,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            validate_output: true,
            strict_wires: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    pub filter: String, // any tracing EnvFilter directive, e.g. "info" or "ecson_ops=debug"
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct EcsonConfig {
    #[serde(default)]
    pub compile: CompileConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl EcsonConfig {
    pub const FILE_NAME: &'static str = "ecson.toml";

    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn load_from_file(path: &Path) -> EcsonResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents).map_err(|e| EcsonError::config(e.to_string(), path))
    }

    pub fn save_to_file(&self, path: &Path) -> EcsonResult<()> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| EcsonError::config(e.to_string(), path))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Load `path` when given, else `./ecson.toml` when present, else defaults.
    pub fn discover(path: Option<&Path>) -> EcsonResult<Self> {
        match path {
            Some(p) => Self::load_from_file(p),
            None => {
                let local = Path::new(Self::FILE_NAME);
                if local.exists() {
                    Self::load_from_file(local)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}
