use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct EncodedOutput<'a> {
    frame: &'a str,
    size: usize,
    hex: String,
}

/// Print an encoded frame: hex for text formats, the bytes themselves for raw.
pub fn print_encoded(frame: &str, wire: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Raw => print_raw(wire),
        OutputFormat::Pretty => println!("{}", hex::encode(wire)),
        OutputFormat::Json | OutputFormat::Table => print_record(
            &EncodedOutput {
                frame,
                size: wire.len(),
                hex: hex::encode(wire),
            },
            format,
        ),
    }
}

/// Print a flat record. Table, pretty and raw render one line per top-level field.
pub fn print_record<T: Serialize>(record: &T, format: OutputFormat) {
    let value = serde_json::to_value(record).unwrap_or(Value::Null);
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string(&value).unwrap_or_else(|_| "{}".to_string())
        ),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"]);
            for (key, field) in fields(&value) {
                table.add_row(vec![key, render(field)]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let line: Vec<String> = fields(&value)
                .map(|(key, field)| format!("{key}={}", render(field)))
                .collect();
            println!("{}", line.join(" "));
        }
        OutputFormat::Raw => {
            for (_, field) in fields(&value) {
                println!("{}", render(field));
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// Text if the blob is UTF-8 (control characters escaped), hex otherwise.
pub fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.chars().fold(String::new(), |mut out, c| {
            if c.is_control() {
                out.extend(c.escape_unicode());
            } else {
                out.push(c);
            }
            out
        }),
        Err(_) => format!("hex:{}", hex::encode(payload)),
    }
}

fn fields(value: &Value) -> impl Iterator<Item = (String, &Value)> {
    value
        .as_object()
        .into_iter()
        .flat_map(|map| map.iter().map(|(key, field)| (key.clone(), field)))
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(text) => text.clone(),
        Value::Array(items) => items.iter().map(render).collect::<Vec<_>>().join("; "),
        Value::Object(map) => map
            .iter()
            .map(|(key, field)| format!("{key}={}", render(field)))
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn renders_nested_values_flat() {
        assert_eq!(render(&json!(null)), "-");
        assert_eq!(render(&json!("x")), "x");
        assert_eq!(render(&json!(["a", "b"])), "a; b");
        assert_eq!(
            render(&json!([{"format": "json", "size": 3}])),
            "format=json size=3"
        );
    }

    #[test]
    fn preview_escapes_record_separator() {
        assert_eq!(payload_preview(b"{\"a\":1}\x1e"), "{\"a\":1}\\u{1e}");
        assert_eq!(payload_preview(&[0xff, 0x00]), "hex:ff00");
    }

    #[test]
    fn fields_of_non_object_are_empty() {
        assert_eq!(fields(&json!([1, 2])).count(), 0);
    }
}
