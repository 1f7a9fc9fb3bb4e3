use crate::core::output::{display_value, OutputHandler};
use crate::domain::error::JsonExtResult;
use serde_json::Value;

/// Plain text output, one `key: value` line per top-level key
#[derive(Debug, Clone, Copy, Default)]
pub struct TextOutputHandler;

impl OutputHandler for TextOutputHandler {
    fn label(&self) -> &str {
        "text"
    }

    fn render(&self, data: &Value, _template: Option<&str>) -> JsonExtResult<String> {
        tracing::debug!("rendering output as text");
        let output = match data {
            Value::Object(map) => map
                .iter()
                .map(|(key, value)| format!("{}: {}\n", key, display_value(value)))
                .collect::<String>(),
            Value::Null => String::new(),
            other => format!("{}\n", display_value(other)),
        };
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_object_lines() {
        let data = json!({"name": "demo", "count": 3, "tags": ["a", "b"]});
        let output = TextOutputHandler.render(&data, None).unwrap();

        assert_eq!(output, "count: 3\nname: demo\ntags: [\"a\",\"b\"]\n");
    }

    #[test]
    fn test_render_scalar_and_null() {
        assert_eq!(TextOutputHandler.render(&json!("hi"), None).unwrap(), "hi\n");
        assert_eq!(TextOutputHandler.render(&Value::Null, None).unwrap(), "");
    }

    #[test]
    fn test_template_is_ignored() {
        let data = json!({"a": 1});
        assert_eq!(
            TextOutputHandler.render(&data, Some("{{ a }}")).unwrap(),
            TextOutputHandler.render(&data, None).unwrap()
        );
    }
}
