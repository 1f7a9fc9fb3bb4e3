use crate::core::output::{display_value, OutputHandler};
use crate::domain::error::{JsonExtError, JsonExtResult};
use serde_json::{Map, Value};
use tabled::builder::Builder;
use tabled::settings::Style;

/// Table border style
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TableStyle {
    #[default]
    Ascii,
    Psql,
    Markdown,
    Modern,
}

/// Tabular output
///
/// An object renders as a `key | value` table. An array of objects renders
/// one row per object, with the union of their keys as columns in first-seen
/// order. Arrays of scalars render as a single `value` column.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableOutputHandler {
    style: TableStyle,
}

impl TableOutputHandler {
    pub fn new(style: TableStyle) -> Self {
        Self { style }
    }

    fn build(&self, builder: Builder) -> String {
        let mut table = builder.build();
        match self.style {
            TableStyle::Ascii => table.with(Style::ascii()),
            TableStyle::Psql => table.with(Style::psql()),
            TableStyle::Markdown => table.with(Style::markdown()),
            TableStyle::Modern => table.with(Style::modern()),
        };
        format!("{}\n", table)
    }
}

impl OutputHandler for TableOutputHandler {
    fn label(&self) -> &str {
        "table"
    }

    fn render(&self, data: &Value, _template: Option<&str>) -> JsonExtResult<String> {
        tracing::debug!("rendering output as a table");
        match data {
            Value::Object(map) if map.is_empty() => Ok(String::new()),
            Value::Object(map) => {
                let mut builder = Builder::default();
                builder.push_record(vec!["key".to_string(), "value".to_string()]);
                for (key, value) in map {
                    builder.push_record(vec![key.clone(), display_value(value)]);
                }
                Ok(self.build(builder))
            }
            Value::Array(items) if items.is_empty() => Ok(String::new()),
            Value::Array(items) if items.iter().all(Value::is_object) => {
                let rows: Vec<&Map<String, Value>> =
                    items.iter().filter_map(Value::as_object).collect();
                Ok(self.build(object_rows(&rows)))
            }
            Value::Array(items) if items.iter().any(Value::is_object) => Err(JsonExtError::Output(
                "cannot render a mix of objects and values as a table".to_string(),
            )),
            Value::Array(items) => {
                let mut builder = Builder::default();
                builder.push_record(vec!["value".to_string()]);
                for item in items {
                    builder.push_record(vec![display_value(item)]);
                }
                Ok(self.build(builder))
            }
            Value::Null => Ok(String::new()),
            other => Ok(format!("{}\n", display_value(other))),
        }
    }
}

fn object_rows(rows: &[&Map<String, Value>]) -> Builder {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let mut builder = Builder::default();
    builder.push_record(columns.clone());
    for row in rows {
        let record: Vec<String> = columns
            .iter()
            .map(|column| row.get(column).map(display_value).unwrap_or_default())
            .collect();
        builder.push_record(record);
    }
    builder
}
