//! JSON extension
//!
//! Provides the `json` output handler, the `json` config decoder and the
//! `--json` command line flag. Loading the extension with [`load`] registers
//! all of them with an [`App`]:
//!
//! ```no_run
//! use jsonext::{App, ext::json};
//!
//! let mut app = App::new("myapp");
//! app.add_extension("json", json::load);
//! app.run()?;
//! app.render(&serde_json::json!({"foo": "bar"}), None)?;
//! # Ok::<(), jsonext::JsonExtError>(())
//! ```
//!
//! Passing `--json` suppresses incidental output, the same as `--quiet`.
//! The JSON output itself always reaches the real output stream. Use
//! `--debug` to see what is going on while troubleshooting.

use crate::core::app::App;
use crate::core::hooks::Hook;
use crate::core::output::OutputHandler;
use crate::domain::config::{ConfigDict, SectionDict};
use crate::domain::error::{JsonExtError, JsonExtResult};
use crate::infrastructure::config::ConfigDecoder;
use clap::{Arg, ArgAction};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

/// Renders the data dictionary as JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonOutputHandler {
    pretty: bool,
}

impl JsonOutputHandler {
    /// Compact output
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Indented, multi-line output
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl OutputHandler for JsonOutputHandler {
    fn label(&self) -> &str {
        "json"
    }

    /// The template is part of the interface but ignored here.
    fn render(&self, data: &Value, _template: Option<&str>) -> JsonExtResult<String> {
        tracing::debug!("rendering output as JSON");
        let output = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(output)
    }

    fn bypasses_suppression(&self) -> bool {
        true
    }
}

/// Reads config files holding a JSON object of section objects
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonConfigDecoder;

impl ConfigDecoder for JsonConfigDecoder {
    fn label(&self) -> &str {
        "json"
    }

    fn file_extension(&self) -> &str {
        "json"
    }

    fn decode(&self, content: &str, path: &Path) -> JsonExtResult<ConfigDict> {
        let value: Value = serde_json::from_str(content).map_err(|e| JsonExtError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let Value::Object(sections) = value else {
            return Err(JsonExtError::Parse {
                path: path.to_path_buf(),
                message: "expected a JSON object at the top level".to_string(),
            });
        };

        let mut dict = ConfigDict::new();
        for (section, value) in sections {
            match value {
                Value::Object(values) => {
                    let values: SectionDict = values
                        .into_iter()
                        .map(|(key, value)| (key, json_value_to_string(value)))
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

fn json_value_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// `post_setup` hook: adds the `--json` flag to the argument parser
pub fn add_json_option(app: &mut App) -> JsonExtResult<()> {
    app.add_argument(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .global(true)
            .help("Toggle JSON output handler"),
    )
}

/// `pre_run` hook: forces the JSON output handler when `--json` was passed,
/// overriding whatever handler is configured
pub fn set_output_handler(app: &mut App) -> JsonExtResult<()> {
    if app.argv().iter().any(|arg| arg == "--json") {
        app.set_output_handler("json")?;
        app.sink_mut().suppress();
    }
    Ok(())
}

/// Register the JSON handlers and hooks with `app`
pub fn load(app: &mut App) -> JsonExtResult<()> {
    app.register_hook(Hook::PostSetup, add_json_option);
    app.register_hook(Hook::PreRun, set_output_handler);
    app.handlers_mut()
        .register_output(Arc::new(JsonOutputHandler::new()), false)?;
    app.handlers_mut()
        .register_config(Arc::new(JsonConfigDecoder), false)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::app::AppMeta;
    use crate::core::handler::HandlerType;
    use crate::core::output::{OutputSink, SharedBuffer};
    use crate::domain::config::ConfigStore;
    use crate::infrastructure::config::ConfigLoader;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn json_app(argv: &[&str]) -> (App, SharedBuffer) {
        let mut meta = AppMeta::new("jsontest");
        meta.argv = argv.iter().map(|a| a.to_string()).collect();
        meta.config_files = Some(Vec::new());
        let out = SharedBuffer::new();
        let sink = OutputSink::new(Box::new(out.clone()), Box::new(SharedBuffer::new()));
        let mut app = App::with_meta(meta).with_sink(sink);
        app.add_extension("json", load);
        (app, out)
    }

    #[test]
    fn test_render_compact_and_pretty() {
        let data = json!({"foo": "bar", "n": [1, 2]});
        assert_eq!(
            JsonOutputHandler::new().render(&data, None).unwrap(),
            r#"{"foo":"bar","n":[1,2]}"#
        );
        let pretty = JsonOutputHandler::pretty().render(&data, None).unwrap();
        assert!(pretty.contains('\n'));
        assert_eq!(serde_json::from_str::<Value>(&pretty).unwrap(), data);
    }

    #[test]
    fn test_render_ignores_template() {
        let data = json!({"foo": "bar"});
        assert_eq!(
            JsonOutputHandler::new().render(&data, Some("ignored.mustache")).unwrap(),
            JsonOutputHandler::new().render(&data, None).unwrap()
        );
    }

    #[test]
    fn test_decode_sections() {
        let dict = JsonConfigDecoder
            .decode(
                r#"{"app": {"debug": true, "name": "demo", "retries": 3, "extra": null}, "skipped": 1}"#,
                Path::new("test.json"),
            )
            .unwrap();

        assert_eq!(dict.len(), 1);
        assert_eq!(dict["app"]["debug"], "true");
        assert_eq!(dict["app"]["name"], "demo");
        assert_eq!(dict["app"]["retries"], "3");
        assert_eq!(dict["app"]["extra"], "null");
    }

    #[test]
    fn test_decode_rejects_non_object() {
        let result = JsonConfigDecoder.decode("[1, 2, 3]", Path::new("list.json"));
        assert!(matches!(result, Err(JsonExtError::Parse { .. })));
    }

    #[test]
    fn test_parse_file_invalid_json_leaves_store() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.json");
        fs::write(&path, "{not json").unwrap();

        let mut store = ConfigStore::new();
        store.set("A", "x", "1");
        let before = store.clone();

        let loader = ConfigLoader::new(Arc::new(JsonConfigDecoder));
        let result = loader.parse_file(&mut store, &path);
        assert!(matches!(result, Err(JsonExtError::Parse { .. })));
        assert_eq!(store, before);
    }

    #[test]
    fn test_load_registers_handlers_and_hooks() {
        let (mut app, _) = json_app(&[]);
        app.setup().unwrap();

        assert!(app.handlers().registered(HandlerType::Output, "json"));
        assert!(app.handlers().registered(HandlerType::Config, "json"));
        assert_eq!(app.hooks().count(Hook::PostSetup), 1);
        assert_eq!(app.hooks().count(Hook::PreRun), 1);
        assert_eq!(app.output_handler_label(), "text");
    }

    #[test]
    fn test_json_flag_forces_handler() {
        let (mut app, out) = json_app(&["--output", "table", "--json"]);
        let matches = app.run().unwrap();

        assert!(matches.get_flag("json"));
        assert_eq!(app.output_handler_label(), "json");

        app.print("incidental").unwrap();
        app.render(&json!({"foo": "bar"}), None).unwrap();
        assert_eq!(out.contents(), "{\"foo\":\"bar\"}\n");
    }

    #[test]
    fn test_without_flag_handler_is_unchanged() {
        let (mut app, _) = json_app(&[]);
        let matches = app.run().unwrap();

        assert!(!matches.get_flag("json"));
        assert_eq!(app.output_handler_label(), "text");
    }
}
