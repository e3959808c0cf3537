use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::DEPTH_LIMIT;
use crate::error::ConfigError;

/// Project configuration loaded from `.oax.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OaxConfig {
    /// Document used when a command is run without `--input`.
    pub input: String,
    pub format: OutputFormat,
    pub examples: ExampleConfig,
    pub diff: DiffConfig,
}

impl Default for OaxConfig {
    fn default() -> Self {
        Self {
            input: "openapi.yaml".to_string(),
            format: OutputFormat::Yaml,
            examples: ExampleConfig::default(),
            diff: DiffConfig::default(),
        }
    }
}

/// How command output is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Yaml,
    Json,
    Text,
}

/// Example and type generation options.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExampleConfig {
    pub max_depth: usize,
    /// Drop `null`-valued properties from object examples.
    pub skip_null_fields: bool,
}

impl Default for ExampleConfig {
    fn default() -> Self {
        Self {
            max_depth: DEPTH_LIMIT,
            skip_null_fields: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// Exit non-zero when `oax diff` finds any change.
    pub fail_on_changes: bool,
}

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = ".oax.yaml";

/// Load config from a YAML file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<OaxConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let config: OaxConfig = serde_yaml_ng::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    Ok(Some(config))
}

/// Generate the default config file content.
pub fn default_config_content() -> &'static str {
    r#"# oax configuration
input: openapi.yaml
format: yaml          # yaml | json | text

examples:
  max_depth: 5            # nodes nested deeper than this render as null / any
  skip_null_fields: false # drop null-valued properties from object examples

diff:
  fail_on_changes: false  # exit with status 1 when `oax diff` reports changes
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OaxConfig::default();
        assert_eq!(config.input, "openapi.yaml");
        assert_eq!(config.format, OutputFormat::Yaml);
        assert_eq!(config.examples.max_depth, DEPTH_LIMIT);
        assert!(!config.examples.skip_null_fields);
        assert!(!config.diff.fail_on_changes);
    }

    #[test]
    fn test_default_content_parses_to_defaults() {
        let config: OaxConfig = serde_yaml_ng::from_str(default_config_content()).unwrap();
        assert_eq!(config, OaxConfig::default());
    }

    #[test]
    fn test_parse_config_yaml() {
        let yaml = r#"
input: api/spec.json
format: text
examples:
  max_depth: 3
  skip_null_fields: true
diff:
  fail_on_changes: true
"#;
        let config: OaxConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.input, "api/spec.json");
        assert_eq!(config.format, OutputFormat::Text);
        assert_eq!(config.examples.max_depth, 3);
        assert!(config.examples.skip_null_fields);
        assert!(config.diff.fail_on_changes);
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: OaxConfig = serde_yaml_ng::from_str("format: json\n").unwrap();
        assert_eq!(config.format, OutputFormat::Json);
        // Defaults applied
        assert_eq!(config.input, "openapi.yaml");
        assert_eq!(config.examples.max_depth, DEPTH_LIMIT);
    }

    #[test]
    fn test_load_config_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        assert!(load_config(&path).unwrap().is_none());

        fs::write(&path, "examples:\n  max_depth: 2\n").unwrap();
        let config = load_config(&path).unwrap().unwrap();
        assert_eq!(config.examples.max_depth, 2);

        fs::write(&path, "examples: [not, a, map]\n").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Parse { .. })));
    }
}
