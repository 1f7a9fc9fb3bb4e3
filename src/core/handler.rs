use crate::core::output::OutputHandler;
use crate::domain::error::{JsonExtError, JsonExtResult};
use crate::infrastructure::config::ConfigDecoder;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Capability interfaces a handler can implement
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HandlerType {
    Output,
    Config,
}

impl fmt::Display for HandlerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerType::Output => write!(f, "output"),
            HandlerType::Config => write!(f, "config"),
        }
    }
}

/// Registry of output handlers and config decoders, keyed by label
#[derive(Default)]
pub struct HandlerRegistry {
    output: Option<BTreeMap<String, Arc<dyn OutputHandler>>>,
    config: Option<BTreeMap<String, Arc<dyn ConfigDecoder>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a handler type so handlers can be registered against it
    pub fn define(&mut self, handler_type: HandlerType) -> JsonExtResult<()> {
        tracing::debug!("defining handler type '{}'", handler_type);
        if self.defined(handler_type) {
            return Err(JsonExtError::Framework(format!(
                "Handler type '{}' already defined",
                handler_type
            )));
        }
        match handler_type {
            HandlerType::Output => self.output = Some(BTreeMap::new()),
            HandlerType::Config => self.config = Some(BTreeMap::new()),
        }
        Ok(())
    }

    pub fn defined(&self, handler_type: HandlerType) -> bool {
        match handler_type {
            HandlerType::Output => self.output.is_some(),
            HandlerType::Config => self.config.is_some(),
        }
    }

    pub fn list_types(&self) -> Vec<HandlerType> {
        [HandlerType::Output, HandlerType::Config]
            .into_iter()
            .filter(|t| self.defined(*t))
            .collect()
    }

    /// Register an output handler. Registering the same handler twice is a
    /// no-op; a different handler under a taken label needs `force`.
    pub fn register_output(
        &mut self,
        handler: Arc<dyn OutputHandler>,
        force: bool,
    ) -> JsonExtResult<()> {
        let label = normalize_label(handler.label());
        let table = self
            .output
            .as_mut()
            .ok_or_else(|| undefined(HandlerType::Output))?;
        insert_handler(table, HandlerType::Output, label, handler, force)
    }

    /// Register a config decoder; same rules as [`Self::register_output`]
    pub fn register_config(
        &mut self,
        decoder: Arc<dyn ConfigDecoder>,
        force: bool,
    ) -> JsonExtResult<()> {
        let label = normalize_label(decoder.label());
        let table = self
            .config
            .as_mut()
            .ok_or_else(|| undefined(HandlerType::Config))?;
        insert_handler(table, HandlerType::Config, label, decoder, force)
    }

    pub fn registered(&self, handler_type: HandlerType, label: &str) -> bool {
        let label = normalize_label(label);
        match handler_type {
            HandlerType::Output => self
                .output
                .as_ref()
                .is_some_and(|t| t.contains_key(&label)),
            HandlerType::Config => self
                .config
                .as_ref()
                .is_some_and(|t| t.contains_key(&label)),
        }
    }

    pub fn get_output(&self, label: &str) -> JsonExtResult<Arc<dyn OutputHandler>> {
        let table = self
            .output
            .as_ref()
            .ok_or_else(|| undefined(HandlerType::Output))?;
        lookup(table, HandlerType::Output, label)
    }

    pub fn get_config(&self, label: &str) -> JsonExtResult<Arc<dyn ConfigDecoder>> {
        let table = self
            .config
            .as_ref()
            .ok_or_else(|| undefined(HandlerType::Config))?;
        lookup(table, HandlerType::Config, label)
    }

    /// Sorted labels registered for `handler_type`
    pub fn list(&self, handler_type: HandlerType) -> JsonExtResult<Vec<String>> {
        let labels = match handler_type {
            HandlerType::Output => self.output.as_ref().map(|t| t.keys().cloned().collect()),
            HandlerType::Config => self.config.as_ref().map(|t| t.keys().cloned().collect()),
        };
        labels.ok_or_else(|| undefined(handler_type))
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("output", &self.list(HandlerType::Output).ok())
            .field("config", &self.list(HandlerType::Config).ok())
            .finish()
    }
}

fn normalize_label(label: &str) -> String {
    label.replace('-', "_")
}

fn undefined(handler_type: HandlerType) -> JsonExtError {
    JsonExtError::Framework(format!("Handler type '{}' does not exist", handler_type))
}

fn insert_handler<T: ?Sized>(
    table: &mut BTreeMap<String, Arc<T>>,
    handler_type: HandlerType,
    label: String,
    handler: Arc<T>,
    force: bool,
) -> JsonExtResult<()> {
    tracing::debug!("registering handler into handlers['{}']['{}']", handler_type, label);
    if let Some(existing) = table.get(&label) {
        if Arc::ptr_eq(existing, &handler) {
            return Ok(());
        }
        if !force {
            return Err(JsonExtError::Framework(format!(
                "handlers['{}']['{}'] already exists",
                handler_type, label
            )));
        }
        tracing::debug!(
            "handlers['{}']['{}'] already exists, replacing (force)",
            handler_type,
            label
        );
    }
    table.insert(label, handler);
    Ok(())
}

fn lookup<T: ?Sized>(
    table: &BTreeMap<String, Arc<T>>,
    handler_type: HandlerType,
    label: &str,
) -> JsonExtResult<Arc<T>> {
    table
        .get(&normalize_label(label))
        .cloned()
        .ok_or_else(|| {
            JsonExtError::Framework(format!(
                "handlers['{}']['{}'] does not exist",
                handler_type, label
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    struct Fixed(&'static str);

    impl OutputHandler for Fixed {
        fn label(&self) -> &str {
            self.0
        }

        fn render(&self, _data: &Value, _template: Option<&str>) -> JsonExtResult<String> {
            Ok(self.0.to_string())
        }
    }

    fn registry() -> HandlerRegistry {
        let mut registry = HandlerRegistry::new();
        registry.define(HandlerType::Output).unwrap();
        registry
    }

    #[test]
    fn test_define_twice_fails() {
        let mut registry = registry();
        assert!(registry.define(HandlerType::Output).is_err());
        assert_eq!(registry.list_types(), vec![HandlerType::Output]);
    }

    #[test]
    fn test_register_requires_defined_type() {
        let mut registry = HandlerRegistry::new();
        let result = registry.register_output(Arc::new(Fixed("plain")), false);
        assert!(matches!(result, Err(JsonExtError::Framework(_))));
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = registry();
        registry
            .register_output(Arc::new(Fixed("my-handler")), false)
            .unwrap();

        assert!(registry.registered(HandlerType::Output, "my_handler"));
        assert!(registry.registered(HandlerType::Output, "my-handler"));
        let handler = registry.get_output("my_handler").unwrap();
        assert_eq!(handler.render(&Value::Null, None).unwrap(), "my-handler");
        assert_eq!(registry.list(HandlerType::Output).unwrap(), vec!["my_handler"]);
    }

    #[test]
    fn test_duplicate_label_needs_force() {
        let mut registry = registry();
        let first: Arc<dyn OutputHandler> = Arc::new(Fixed("dup"));
        registry.register_output(first.clone(), false).unwrap();

        // same object again is fine
        registry.register_output(first, false).unwrap();
        assert!(registry.register_output(Arc::new(Fixed("dup")), false).is_err());
        assert!(registry.register_output(Arc::new(Fixed("dup")), true).is_ok());
    }

    #[test]
    fn test_get_missing_handler() {
        let registry = registry();
        let err = registry.get_output("nope").err().unwrap();
        assert!(err.to_string().contains("handlers['output']['nope'] does not exist"));
        assert!(registry.get_config("json").is_err());
    }
}
