use crate::domain::config::{ConfigDict, ConfigStore, SectionDict};
use crate::domain::error::{JsonExtError, JsonExtResult};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File format strategy for configuration files
pub trait ConfigDecoder: Send + Sync {
    /// Label the decoder is registered under
    fn label(&self) -> &str;

    /// File extension used when looking for default config files
    fn file_extension(&self) -> &str;

    /// Decode file `content` into sections. `path` is only used for error
    /// reporting.
    fn decode(&self, content: &str, path: &Path) -> JsonExtResult<ConfigDict>;
}

/// Reads config files with a decoder and merges them into a store
#[derive(Clone)]
pub struct ConfigLoader {
    decoder: Arc<dyn ConfigDecoder>,
}

impl ConfigLoader {
    pub fn new(decoder: Arc<dyn ConfigDecoder>) -> Self {
        Self { decoder }
    }

    pub fn decoder(&self) -> &Arc<dyn ConfigDecoder> {
        &self.decoder
    }

    /// Parse `path` and merge it into `store`, overwriting existing values.
    ///
    /// Returns `Ok(true)` once the file has been merged. A missing or
    /// unreadable file and undecodable content are errors; the store is
    /// only modified after the whole file decoded successfully.
    pub fn parse_file(&self, store: &mut ConfigStore, path: &Path) -> JsonExtResult<bool> {
        tracing::debug!(
            "loading {} config file '{}'",
            self.decoder.label(),
            path.display()
        );
        let content = fs::read_to_string(path).map_err(|source| JsonExtError::FileAccess {
            path: path.to_path_buf(),
            source,
        })?;
        let dict = self.decoder.decode(&content, path)?;
        store.merge(&dict, true);
        Ok(true)
    }
}

impl std::fmt::Debug for ConfigLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigLoader")
            .field("decoder", &self.decoder.label())
            .finish()
    }
}

/// TOML config decoder, the default format
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlConfigDecoder;

impl ConfigDecoder for TomlConfigDecoder {
    fn label(&self) -> &str {
        "toml"
    }

    fn file_extension(&self) -> &str {
        "toml"
    }

    fn decode(&self, content: &str, path: &Path) -> JsonExtResult<ConfigDict> {
        let table: toml::Table = toml::from_str(content).map_err(|e| JsonExtError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut dict = ConfigDict::new();
        for (section, value) in table {
            match value {
                toml::Value::Table(values) => {
                    let values: SectionDict = values
                        .into_iter()
                        .map(|(key, value)| (key, toml_value_to_string(value)))
                        .collect();
                    dict.insert(section, values);
                }
                _ => {
                    tracing::warn!(
                        "ignoring top-level key '{}' in {}: not a section",
                        section,
                        path.display()
                    );
                }
            }
        }
        Ok(dict)
    }
}

fn toml_value_to_string(value: toml::Value) -> String {
    match value {
        toml::Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Default config file locations for an app, lowest precedence first:
/// `~/.config/<label>/config.<ext>`, then the nearest
/// `.<label>/config.<ext>` found walking up from the working directory.
pub fn default_config_files(label: &str, extension: &str) -> Vec<PathBuf> {
    let file_name = format!("config.{}", extension);
    let mut files = Vec::new();

    if let Some(home) = dirs::home_dir() {
        files.push(home.join(".config").join(label).join(&file_name));
    }
    if let Some(project) = find_project_config_path(label, &file_name) {
        files.push(project);
    }
    files
}

/// Find project configuration path by walking up directory tree
fn find_project_config_path(label: &str, file_name: &str) -> Option<PathBuf> {
    let current_dir = std::env::current_dir().ok()?;
    let mut path = current_dir.as_path();
    let dir_name = format!(".{}", label);

    loop {
        let config_path = path.join(&dir_name).join(file_name);
        if config_path.exists() {
            return Some(config_path);
        }

        path = path.parent()?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_toml_decode_sections() {
        let content = r#"
            name = "ignored"

            [app]
            debug = true
            level = "info"
            retries = 3
        "#;
        let dict = TomlConfigDecoder
            .decode(content, Path::new("test.toml"))
            .unwrap();

        assert_eq!(dict.len(), 1);
        assert_eq!(dict["app"]["debug"], "true");
        assert_eq!(dict["app"]["level"], "info");
        assert_eq!(dict["app"]["retries"], "3");
    }

    #[test]
    fn test_toml_decode_invalid() {
        let result = TomlConfigDecoder.decode("[app\nkey = ", Path::new("bad.toml"));
        assert!(matches!(result, Err(JsonExtError::Parse { .. })));
    }

    #[test]
    fn test_loader_merges_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[A]\nx = \"9\"\nz = \"3\"\n").unwrap();

        let mut store = ConfigStore::new();
        store.set("A", "x", "1");
        store.set("A", "y", "2");

        let loader = ConfigLoader::new(Arc::new(TomlConfigDecoder));
        assert!(loader.parse_file(&mut store, &path).unwrap());
        assert_eq!(store.get("A", "x").as_deref(), Some("9"));
        assert_eq!(store.get("A", "y").as_deref(), Some("2"));
        assert_eq!(store.get("A", "z").as_deref(), Some("3"));
    }

    #[test]
    fn test_loader_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.toml");
        let mut store = ConfigStore::new();
        store.set("A", "x", "1");
        let before = store.clone();

        let loader = ConfigLoader::new(Arc::new(TomlConfigDecoder));
        let result = loader.parse_file(&mut store, &path);
        assert!(matches!(result, Err(JsonExtError::FileAccess { .. })));
        assert_eq!(store, before);
    }

    #[test]
    fn test_default_config_files_use_label_and_extension() {
        let files = default_config_files("jsonext-test-app", "json");
        assert!(files
            .iter()
            .all(|f| f.to_string_lossy().ends_with("config.json")));
        if dirs::home_dir().is_some() {
            assert!(files[0].to_string_lossy().contains("jsonext-test-app"));
        }
    }
}
