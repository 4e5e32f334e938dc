//! Runner configuration loaded from YAML.

use std::path::Path;
use std::sync::LazyLock;

use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::Deserialize;

/// Sink kinds the runner knows how to construct.
pub const SINK_KINDS: &[&str] = &["console", "wasm"];

static ENV_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}").expect("valid pattern")
});

/// Top-level runner configuration.
///
/// ```yaml
/// sink: wasm
/// config:
///   module_path: ${SINK_MODULE:-./sink.wasm}
///   bind_stdout: true
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerConfig {
    /// Which sink implementation to bind.
    pub sink: String,
    /// Opaque settings handed to the sink's `init` as JSON.
    #[serde(default)]
    pub config: serde_yaml::Value,
}

impl RunnerConfig {
    /// Load a config file, expanding `${VAR}` and `${VAR:-default}` first.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let expanded = expand_env_vars(&raw);
        let config: Self = serde_yaml::from_str(&expanded)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sink.is_empty() {
            bail!("sink kind is required");
        }
        if !SINK_KINDS.contains(&self.sink.as_str()) {
            bail!(
                "unknown sink kind `{}` (expected one of: {})",
                self.sink,
                SINK_KINDS.join(", ")
            );
        }
        Ok(())
    }

    /// The sink settings re-encoded as the JSON init payload.
    pub fn config_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(&self.config).context("failed to encode sink config")
    }
}

fn expand_env_vars(input: &str) -> String {
    ENV_VAR
        .replace_all(input, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            match std::env::var(name) {
                Ok(value) => value,
                Err(_) => match caps.get(2) {
                    Some(default) => default.as_str().to_string(),
                    // Leave unresolvable references untouched.
                    None => caps[0].to_string(),
                },
            }
        })
        .into_owned()
}
