use crate::cli::args::{Args, Command};
use crate::core::app::App;
use crate::domain::config::ConfigDict;
use crate::domain::error::{JsonExtError, JsonExtResult};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
struct SectionList {
    sections: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ConfigValue<'a> {
    section: &'a str,
    key: &'a str,
    value: String,
}

/// Execute CLI command against a running app
pub fn execute_command(app: &mut App, args: Args) -> JsonExtResult<()> {
    match args.command {
        Command::Show => {
            if app.config().get_sections().is_empty() {
                app.print_err("no configuration loaded")?;
            }
            let dict = app.config().get_dict();
            app.render(&dict, None)?;
        }
        Command::Sections => {
            let list = SectionList {
                sections: app.config().get_sections(),
            };
            app.render(&list, None)?;
        }
        Command::Get { section, key } => {
            let value = app.config().get(&section, &key).ok_or_else(|| JsonExtError::Config {
                message: format!("'{}.{}' is not set", section, key),
            })?;
            app.render(
                &ConfigValue {
                    section: &section,
                    key: &key,
                    value,
                },
                None,
            )?;
        }
        Command::Set { section, key, value } => {
            app.config_mut().set(&section, &key, value);
            let mut dict = ConfigDict::new();
            dict.insert(section.clone(), app.config().get_section_dict(&section));
            app.render(&dict, None)?;
        }
        Command::Handlers => {
            let mut list = BTreeMap::new();
            for handler_type in app.handlers().list_types() {
                list.insert(handler_type.to_string(), app.handlers().list(handler_type)?);
            }
            app.render(&list, None)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::app::AppMeta;
    use crate::core::output::{OutputSink, SharedBuffer};
    use crate::ext::json;

    fn run(argv: &[&str]) -> (JsonExtResult<()>, String, String) {
        let mut meta = AppMeta::new("cmdtest");
        meta.argv = argv.iter().map(|a| a.to_string()).collect();
        meta.config_files = Some(Vec::new());
        let out = SharedBuffer::new();
        let err = SharedBuffer::new();
        let sink = OutputSink::new(Box::new(out.clone()), Box::new(err.clone()));
        let mut app = App::with_meta(meta).with_sink(sink);
        app.add_extension("json", json::load);
        app.set_args(<Args as clap::CommandFactory>::command());

        let result = app.run().and_then(|matches| {
            let args = <Args as clap::FromArgMatches>::from_arg_matches(&matches)?;
            execute_command(&mut app, args)
        });
        (result, out.contents(), err.contents())
    }

    #[test]
    fn test_set_then_render_json() {
        let (result, out, _) = run(&["--json", "set", "app", "level", "debug"]);
        result.unwrap();
        assert_eq!(out, "{\"app\":{\"level\":\"debug\"}}\n");
    }

    #[test]
    fn test_get_missing_value() {
        let (result, out, _) = run(&["get", "app", "missing"]);
        assert!(matches!(result, Err(JsonExtError::Config { .. })));
        assert!(out.is_empty());
    }

    #[test]
    fn test_handlers_lists_json() {
        let (result, out, _) = run(&["--json", "handlers"]);
        result.unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["output"], serde_json::json!(["json", "table", "text"]));
        assert_eq!(value["config"], serde_json::json!(["json", "toml"]));
    }

    #[test]
    fn test_sections_text_output() {
        let (result, out, _) = run(&["sections"]);
        result.unwrap();
        assert_eq!(out, "sections: []\n");
    }

    #[test]
    fn test_show_empty_store_notes_on_stderr() {
        let (result, out, err) = run(&["show"]);
        result.unwrap();
        assert!(out.is_empty());
        assert_eq!(err, "no configuration loaded\n");
    }

    #[test]
    fn test_show_empty_store_quiet() {
        let (result, out, err) = run(&["--quiet", "show"]);
        result.unwrap();
        assert!(out.is_empty());
        assert!(err.is_empty());
    }
}
