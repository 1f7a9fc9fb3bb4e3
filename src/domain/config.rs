use crate::domain::error::{JsonExtError, JsonExtResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key/value pairs of a single config section
pub type SectionDict = BTreeMap<String, String>;

/// Section name to section contents, as produced by a config decoder
pub type ConfigDict = BTreeMap<String, SectionDict>;

/// Sectioned configuration store
///
/// Every value is a string. Sections and keys are kept sorted so that
/// rendering the store is deterministic. When an environment prefix is set,
/// `get` consults the environment before the stored value: `PREFIX_KEY` for
/// the prefix section itself and `PREFIX_SECTION_KEY` for every other one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigStore {
    sections: ConfigDict,
    #[serde(skip)]
    env_prefix: Option<String>,
}

impl ConfigStore {
    /// Create an empty store without environment overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store whose values may be overridden from the environment
    pub fn with_env_prefix(prefix: impl Into<String>) -> Self {
        Self {
            sections: ConfigDict::new(),
            env_prefix: Some(prefix.into()),
        }
    }

    /// Environment prefix, if overrides are enabled
    pub fn env_prefix(&self) -> Option<&str> {
        self.env_prefix.as_deref()
    }

    /// Merge `dict` into the store.
    ///
    /// With `override_existing` set, values already present for the same
    /// section and key are replaced; otherwise only missing keys are filled.
    /// Keys absent from `dict` are never touched.
    pub fn merge(&mut self, dict: &ConfigDict, override_existing: bool) {
        for (section, values) in dict {
            let target = self.sections.entry(section.clone()).or_default();
            for (key, value) in values {
                if override_existing || !target.contains_key(key) {
                    target.insert(key.clone(), value.clone());
                }
            }
        }
    }

    /// Look up a value, honouring environment overrides
    pub fn get(&self, section: &str, key: &str) -> Option<String> {
        if let Some(env_var) = self.env_var_name(section, key) {
            if let Ok(value) = std::env::var(&env_var) {
                tracing::trace!("config {}.{} overridden by ${}", section, key, env_var);
                return Some(value);
            }
        }
        self.sections
            .get(section)
            .and_then(|values| values.get(key))
            .cloned()
    }

    /// Set a value, creating the section when it does not exist yet
    pub fn set(&mut self, section: &str, key: &str, value: impl Into<String>) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
    }

    /// Keys of `section`, empty when the section is unknown
    pub fn keys(&self, section: &str) -> Vec<String> {
        self.sections
            .get(section)
            .map(|values| values.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn get_sections(&self) -> Vec<String> {
        self.sections.keys().cloned().collect()
    }

    /// Section contents with environment overrides applied
    pub fn get_section_dict(&self, section: &str) -> SectionDict {
        self.keys(section)
            .into_iter()
            .filter_map(|key| self.get(section, &key).map(|value| (key, value)))
            .collect()
    }

    /// Whole configuration with environment overrides applied
    pub fn get_dict(&self) -> ConfigDict {
        self.sections
            .keys()
            .map(|section| (section.clone(), self.get_section_dict(section)))
            .collect()
    }

    pub fn add_section(&mut self, section: &str) -> JsonExtResult<()> {
        if self.sections.contains_key(section) {
            return Err(JsonExtError::Config {
                message: format!("Section '{}' already exists", section),
            });
        }
        self.sections.insert(section.to_string(), SectionDict::new());
        Ok(())
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    /// Name of the environment variable overriding `section.key`
    pub fn env_var_name(&self, section: &str, key: &str) -> Option<String> {
        let prefix = self.env_prefix.as_deref()?;
        let raw = if section == prefix {
            format!("{}_{}", prefix, key)
        } else {
            format!("{}_{}_{}", prefix, section, key)
        };
        Some(normalize_env_var(&raw))
    }
}

/// Upper-case `raw` and collapse every run of non-alphanumerics into `_`
fn normalize_env_var(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_separator = false;
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_uppercase());
            in_separator = false;
        } else if !in_separator {
            out.push('_');
            in_separator = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict(entries: &[(&str, &str, &str)]) -> ConfigDict {
        let mut dict = ConfigDict::new();
        for (section, key, value) in entries {
            dict.entry(section.to_string())
                .or_default()
                .insert(key.to_string(), value.to_string());
        }
        dict
    }

    #[test]
    fn test_merge_overwrites_and_preserves() {
        let mut store = ConfigStore::new();
        store.merge(&dict(&[("A", "x", "1"), ("A", "y", "2")]), true);
        store.merge(&dict(&[("A", "x", "9"), ("A", "z", "3")]), true);

        assert_eq!(store.get("A", "x").as_deref(), Some("9"));
        assert_eq!(store.get("A", "y").as_deref(), Some("2"));
        assert_eq!(store.get("A", "z").as_deref(), Some("3"));
    }

    #[test]
    fn test_merge_without_override_only_fills_missing() {
        let mut store = ConfigStore::new();
        store.set("app", "debug", "false");
        store.merge(&dict(&[("app", "debug", "true"), ("app", "level", "info")]), false);

        assert_eq!(store.get("app", "debug").as_deref(), Some("false"));
        assert_eq!(store.get("app", "level").as_deref(), Some("info"));
    }

    #[test]
    fn test_merge_leaves_other_sections_alone() {
        let mut store = ConfigStore::new();
        store.set("B", "k", "v");
        store.merge(&dict(&[("A", "x", "1")]), true);

        assert_eq!(store.get_sections(), vec!["A".to_string(), "B".to_string()]);
        assert_eq!(store.get("B", "k").as_deref(), Some("v"));
    }

    #[test]
    fn test_add_section_twice_fails() {
        let mut store = ConfigStore::new();
        store.add_section("app").unwrap();
        assert!(store.has_section("app"));
        assert!(matches!(
            store.add_section("app"),
            Err(JsonExtError::Config { .. })
        ));
    }

    #[test]
    fn test_keys_of_unknown_section_is_empty() {
        let store = ConfigStore::new();
        assert!(store.keys("missing").is_empty());
        assert!(store.get_section_dict("missing").is_empty());
    }

    #[test]
    fn test_env_var_name() {
        let store = ConfigStore::with_env_prefix("my-app");
        assert_eq!(
            store.env_var_name("my-app", "foo").as_deref(),
            Some("MY_APP_FOO")
        );
        assert_eq!(
            store.env_var_name("other", "log.level").as_deref(),
            Some("MY_APP_OTHER_LOG_LEVEL")
        );
        assert!(ConfigStore::new().env_var_name("a", "b").is_none());
    }

    #[test]
    fn test_env_override_on_get() {
        let mut store = ConfigStore::with_env_prefix("jsonext_store_test");
        store.set("section", "value", "from-file");
        std::env::set_var("JSONEXT_STORE_TEST_SECTION_VALUE", "from-env");

        assert_eq!(store.get("section", "value").as_deref(), Some("from-env"));
        assert_eq!(
            store.get_dict()["section"]["value"],
            "from-env".to_string()
        );

        std::env::remove_var("JSONEXT_STORE_TEST_SECTION_VALUE");
        assert_eq!(store.get("section", "value").as_deref(), Some("from-file"));
    }
}
