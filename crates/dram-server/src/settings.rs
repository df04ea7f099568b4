//! Runtime configuration, layered from an optional TOML file and `DRAM_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use dram_extract::MatcherOptions;
use serde::Deserialize;

/// Deserialised from `dram.toml`; every field has a default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:          String,
  pub port:          u16,
  pub database_path: PathBuf,
  pub matcher:       MatcherOptions,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:          "127.0.0.1".into(),
      port:          8080,
      database_path: PathBuf::from("dram.db"),
      matcher:       MatcherOptions::default(),
    }
  }
}

impl ServerConfig {
  /// Load from `path` (if it exists) and the environment. Nested keys use a
  /// double underscore: `DRAM_MATCHER__STRIP_MODIFIER_PREFIXES=true`.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("DRAM").separator("__"))
      .build()
      .context("failed to read config file")?;

    let mut cfg: ServerConfig = settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")?;
    cfg.database_path = expand_tilde(&cfg.database_path);
    Ok(cfg)
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_file_gives_defaults() {
    let cfg = ServerConfig::load(Path::new("/nonexistent/dram.toml")).unwrap();
    assert_eq!(cfg.port, 8080);
    assert!(!cfg.matcher.strip_modifier_prefixes);
  }

  #[test]
  fn toml_file_overrides_defaults() {
    let dir = std::env::temp_dir().join(format!("dram-config-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("dram.toml");
    std::fs::write(
      &path,
      "port = 9000\ndatabase_path = \"/tmp/x.db\"\n\n[matcher]\nstrip_modifier_prefixes = true\n",
    )
    .unwrap();

    let cfg = ServerConfig::load(&path).unwrap();
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.database_path, PathBuf::from("/tmp/x.db"));
    assert!(cfg.matcher.strip_modifier_prefixes);
    assert_eq!(cfg.address(), "127.0.0.1:9000");

    std::fs::remove_dir_all(dir).ok();
  }

  #[test]
  fn tilde_is_expanded() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/dram.db")), PathBuf::from(home).join("dram.db"));
    assert_eq!(expand_tilde(Path::new("/abs/dram.db")), PathBuf::from("/abs/dram.db"));
  }
}
