//! Format registry boundary
//!
//! Converts raw text to runtime values before execution and renders result
//! values after it. The registry is immutable once built; the evaluator
//! core never calls into it — only the outermost execute boundary does.
//!
//! Built-in formats: `raw` (pass-through text), `json` (serde_json, object
//! order preserved), and `csv` (header row by default).

use crate::logging::{codes, Code};
use crate::runtime::value::{Value, ValueMap};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Errors raised at the format boundary
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormatError {
    #[error("Unsupported format '{name}'")]
    UnsupportedFormat { name: String },

    #[error("Failed to parse input as {format}: {message}")]
    Read {
        format: &'static str,
        message: String,
    },

    #[error("Failed to render output as {format}: {message}")]
    Write {
        format: &'static str,
        message: String,
    },
}

impl FormatError {
    pub fn error_code(&self) -> Code {
        match self {
            Self::UnsupportedFormat { .. } => codes::format::UNSUPPORTED_FORMAT,
            Self::Read { .. } => codes::format::READ_FAILED,
            Self::Write { .. } => codes::format::WRITE_FAILED,
        }
    }
}

/// String-valued reader/writer options (separator, indent, header, ...)
#[derive(Debug, Clone, Default)]
pub struct FormatOptions {
    options: HashMap<String, String>,
}

impl FormatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style option setter
    pub fn set(mut self, key: &str, value: &str) -> Self {
        self.options.insert(key.to_string(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(|s| s.as_str())
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.options.get(key) {
            None => default,
            Some(value) => match value.to_lowercase().as_str() {
                "true" | "yes" | "1" => true,
                "false" | "no" | "0" | "" => false,
                _ => true,
            },
        }
    }

    fn get_char(&self, key: &str, default: char) -> char {
        self.get(key)
            .and_then(|s| s.chars().next())
            .unwrap_or(default)
    }
}

type ReaderFn = fn(&str, &FormatOptions) -> Result<Value, FormatError>;
type WriterFn = fn(&Value, &FormatOptions) -> Result<String, FormatError>;

/// A registered format with optional reader and writer. A missing reader
/// passes text through as a string value; a missing writer renders the
/// value's display form.
pub struct FormatDefinition {
    pub id: &'static str,
    pub mime_type: &'static str,
    pub reader: Option<ReaderFn>,
    pub writer: Option<WriterFn>,
    aliases: &'static [&'static str],
}

struct Registry {
    formats: Vec<FormatDefinition>,
    aliases: HashMap<String, usize>,
}

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let formats = vec![
            FormatDefinition {
                id: "raw",
                mime_type: "text/plain",
                reader: None,
                writer: None,
                aliases: &["text"],
            },
            FormatDefinition {
                id: "json",
                mime_type: "application/json",
                reader: Some(json_reader),
                writer: Some(json_writer),
                aliases: &["text/json"],
            },
            FormatDefinition {
                id: "csv",
                mime_type: "application/csv",
                reader: Some(csv_reader),
                writer: Some(csv_writer),
                aliases: &["text/csv"],
            },
        ];

        let mut aliases = HashMap::new();
        for (index, format) in formats.iter().enumerate() {
            aliases.insert(format.id.to_lowercase(), index);
            aliases.insert(format.mime_type.to_lowercase(), index);
            for alias in format.aliases {
                aliases.insert(alias.to_lowercase(), index);
            }
        }

        Registry { formats, aliases }
    })
}

/// Look up a format by id, MIME type, or alias (case-insensitive)
pub fn get(name: &str) -> Option<&'static FormatDefinition> {
    let registry = registry();
    registry
        .aliases
        .get(&name.to_lowercase())
        .map(|&index| &registry.formats[index])
}

/// Parse raw text into a value using the named format
pub fn read(input: &str, format_name: &str, options: &FormatOptions) -> Result<Value, FormatError> {
    let definition = get(format_name).ok_or_else(|| FormatError::UnsupportedFormat {
        name: format_name.to_string(),
    })?;
    match definition.reader {
        None => Ok(Value::String(input.to_string())),
        Some(reader) => reader(input, options),
    }
}

/// Render a value as text using the named format
pub fn write(
    value: &Value,
    format_name: &str,
    options: &FormatOptions,
) -> Result<String, FormatError> {
    let definition = get(format_name).ok_or_else(|| FormatError::UnsupportedFormat {
        name: format_name.to_string(),
    })?;
    match definition.writer {
        None => Ok(value.to_string()),
        Some(writer) => writer(value, options),
    }
}

// ============================================================================
// VALUE <-> JSON CONVERSION
// ============================================================================

/// Convert a runtime value to a JSON value. Function values have no JSON
/// representation.
pub fn value_to_json(value: &Value) -> Result<serde_json::Value, FormatError> {
    match value {
        Value::Null => Ok(serde_json::Value::Null),
        Value::Boolean(b) => Ok(serde_json::Value::Bool(*b)),
        Value::Integer(n) => Ok(serde_json::Value::Number((*n).into())),
        Value::Double(n) => serde_json::Number::from_f64(*n)
            .map(serde_json::Value::Number)
            .ok_or_else(|| FormatError::Write {
                format: "json",
                message: "cannot represent a non-finite number".to_string(),
            }),
        Value::String(s) => Ok(serde_json::Value::String(s.clone())),
        Value::List(items) => {
            let mut array = Vec::with_capacity(items.len());
            for item in items {
                array.push(value_to_json(item)?);
            }
            Ok(serde_json::Value::Array(array))
        }
        Value::Object(map) => {
            let mut object = serde_json::Map::new();
            for (key, item) in map.iter() {
                object.insert(key.clone(), value_to_json(item)?);
            }
            Ok(serde_json::Value::Object(object))
        }
        Value::Callable(_) => Err(FormatError::Write {
            format: "json",
            message: "cannot serialize a function value".to_string(),
        }),
    }
}

/// Convert a JSON value to a runtime value. Integral numbers become
/// integers; object key order is preserved.
pub fn json_to_value(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => Value::Double(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(items) => Value::List(items.iter().map(json_to_value).collect()),
        serde_json::Value::Object(map) => {
            let mut object = ValueMap::new();
            for (key, item) in map {
                object.insert(key.clone(), json_to_value(item));
            }
            Value::Object(object)
        }
    }
}

// ============================================================================
// JSON FORMAT
// ============================================================================

fn json_reader(input: &str, _options: &FormatOptions) -> Result<Value, FormatError> {
    let json: serde_json::Value =
        serde_json::from_str(input).map_err(|error| FormatError::Read {
            format: "json",
            message: error.to_string(),
        })?;
    Ok(json_to_value(&json))
}

fn sort_json_keys(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut entries: Vec<(String, serde_json::Value)> = map
                .into_iter()
                .map(|(key, item)| (key, sort_json_keys(item)))
                .collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            serde_json::Value::Object(entries.into_iter().collect())
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(sort_json_keys).collect())
        }
        other => other,
    }
}

fn json_writer(value: &Value, options: &FormatOptions) -> Result<String, FormatError> {
    let mut json = value_to_json(value)?;
    if options.get_bool("sort_keys", false) {
        json = sort_json_keys(json);
    }

    match options.get("indent") {
        None => serde_json::to_string(&json).map_err(|error| FormatError::Write {
            format: "json",
            message: error.to_string(),
        }),
        Some(indent_text) => {
            let indent: usize = indent_text.parse().map_err(|_| FormatError::Write {
                format: "json",
                message: "JSON indent must be an integer".to_string(),
            })?;
            let indent_bytes = vec![b' '; indent];
            let mut buffer = Vec::new();
            let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent_bytes);
            let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
            json.serialize(&mut serializer)
                .map_err(|error| FormatError::Write {
                    format: "json",
                    message: error.to_string(),
                })?;
            String::from_utf8(buffer).map_err(|error| FormatError::Write {
                format: "json",
                message: error.to_string(),
            })
        }
    }
}

// ============================================================================
// CSV FORMAT
// ============================================================================

/// Minimal CSV splitter: quoted fields, doubled quotes, LF and CRLF rows
fn parse_csv_rows(text: &str, separator: char, quote: char) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == quote {
                if chars.peek() == Some(&quote) {
                    field.push(quote);
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(ch);
            }
        } else if ch == quote && field.is_empty() {
            in_quotes = true;
        } else if ch == separator {
            row.push(std::mem::take(&mut field));
        } else if ch == '\n' {
            if field.ends_with('\r') {
                field.pop();
            }
            row.push(std::mem::take(&mut field));
            rows.push(std::mem::take(&mut row));
        } else {
            field.push(ch);
        }
    }

    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    rows
}

fn csv_reader(input: &str, options: &FormatOptions) -> Result<Value, FormatError> {
    let separator = options.get_char("separator", ',');
    let quote = options.get_char("quote", '"');
    let header = options.get_bool("header", true);

    let rows = parse_csv_rows(input, separator, quote);

    if header {
        let mut iter = rows.into_iter();
        let columns = iter.next().unwrap_or_default();
        let records = iter
            .map(|row| {
                let mut record = ValueMap::new();
                for (index, column) in columns.iter().enumerate() {
                    let cell = row
                        .get(index)
                        .map(|text| Value::String(text.clone()))
                        .unwrap_or(Value::Null);
                    record.insert(column.clone(), cell);
                }
                Value::Object(record)
            })
            .collect();
        Ok(Value::List(records))
    } else {
        Ok(Value::List(
            rows.into_iter()
                .map(|row| Value::List(row.into_iter().map(Value::String).collect()))
                .collect(),
        ))
    }
}

/// Null cells render as empty fields; everything else uses its display form
fn csv_field_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn escape_csv_field(text: &str, separator: char, quote: char) -> String {
    if text.contains(separator) || text.contains(quote) || text.contains('\n') || text.contains('\r')
    {
        let doubled = text.replace(quote, &format!("{}{}", quote, quote));
        format!("{}{}{}", quote, doubled, quote)
    } else {
        text.to_string()
    }
}

fn csv_writer(value: &Value, options: &FormatOptions) -> Result<String, FormatError> {
    let separator = options.get_char("separator", ',');
    let quote = options.get_char("quote", '"');
    let header = options.get_bool("header", true);
    let newline = options.get("newline").unwrap_or("\n").to_string();

    let rows: Vec<Value> = match value {
        Value::Object(_) => vec![value.clone()],
        Value::List(items) => items.clone(),
        other => {
            return Err(FormatError::Write {
                format: "csv",
                message: format!("CSV writer expects a list or object value, got {}", other.kind_name()),
            })
        }
    };

    let mut output = String::new();
    let write_row = |output: &mut String, fields: Vec<String>| {
        let line = fields
            .iter()
            .map(|field| escape_csv_field(field, separator, quote))
            .collect::<Vec<_>>()
            .join(&separator.to_string());
        output.push_str(&line);
        output.push_str(&newline);
    };

    if let Some(Value::Object(first)) = rows.first() {
        let columns: Vec<String> = match options.get("columns") {
            Some(text) => text
                .split(',')
                .map(|segment| segment.trim().to_string())
                .filter(|segment| !segment.is_empty())
                .collect(),
            None => first.keys().map(String::from).collect(),
        };
        if columns.is_empty() {
            return Err(FormatError::Write {
                format: "csv",
                message: "CSV writer requires at least one column when writing objects"
                    .to_string(),
            });
        }

        if header {
            write_row(&mut output, columns.clone());
        }
        for row in &rows {
            match row {
                Value::Object(map) => {
                    let fields = columns
                        .iter()
                        .map(|column| {
                            map.get(column).map(csv_field_text).unwrap_or_default()
                        })
                        .collect();
                    write_row(&mut output, fields);
                }
                other => {
                    return Err(FormatError::Write {
                        format: "csv",
                        message: format!(
                            "CSV writer expected object rows, got {}",
                            other.kind_name()
                        ),
                    })
                }
            }
        }
    } else {
        for row in &rows {
            match row {
                Value::List(items) => {
                    write_row(&mut output, items.iter().map(csv_field_text).collect());
                }
                other => write_row(&mut output, vec![csv_field_text(other)]),
            }
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup_and_aliases() {
        assert_eq!(get("json").unwrap().id, "json");
        assert_eq!(get("application/json").unwrap().id, "json");
        assert_eq!(get("TEXT/JSON").unwrap().id, "json");
        assert_eq!(get("csv").unwrap().id, "csv");
        assert_eq!(get("text").unwrap().id, "raw");
        assert!(get("xml").is_none());
    }

    #[test]
    fn test_unsupported_format_error() {
        let error = read("x", "xml", &FormatOptions::new()).unwrap_err();
        assert_eq!(
            error,
            FormatError::UnsupportedFormat {
                name: "xml".to_string()
            }
        );
    }

    #[test]
    fn test_raw_passthrough() {
        let value = read("plain text", "raw", &FormatOptions::new()).unwrap();
        assert_eq!(value, Value::from("plain text"));

        let rendered = write(&Value::Integer(42), "raw", &FormatOptions::new()).unwrap();
        assert_eq!(rendered, "42");
    }

    #[test]
    fn test_json_reader_preserves_object_order_and_integers() {
        let value = read(
            r#"{"b": 2, "a": 1, "half": 0.5}"#,
            "json",
            &FormatOptions::new(),
        )
        .unwrap();

        match value {
            Value::Object(map) => {
                assert_eq!(map.keys().collect::<Vec<_>>(), vec!["b", "a", "half"]);
                assert_eq!(map.get("b"), Some(&Value::Integer(2)));
                assert_eq!(map.get("half"), Some(&Value::Double(0.5)));
            }
            other => panic!("expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_json_reader_rejects_bad_input() {
        let error = read("{not json", "json", &FormatOptions::new()).unwrap_err();
        assert!(matches!(error, FormatError::Read { format: "json", .. }));
    }

    #[test]
    fn test_json_writer_round_trip() {
        let mut map = ValueMap::new();
        map.insert("b", Value::Integer(2));
        map.insert("a", Value::Integer(1));
        let value = Value::Object(map);

        let rendered = write(&value, "json", &FormatOptions::new()).unwrap();
        assert_eq!(rendered, r#"{"b":2,"a":1}"#);

        let sorted = write(
            &value,
            "json",
            &FormatOptions::new().set("sort_keys", "true"),
        )
        .unwrap();
        assert_eq!(sorted, r#"{"a":1,"b":2}"#);
    }

    #[test]
    fn test_json_writer_indent() {
        let value = Value::List(vec![Value::Integer(1)]);
        let rendered = write(&value, "json", &FormatOptions::new().set("indent", "4")).unwrap();
        assert_eq!(rendered, "[\n    1\n]");

        let error = write(&value, "json", &FormatOptions::new().set("indent", "wide"))
            .unwrap_err();
        assert!(matches!(error, FormatError::Write { format: "json", .. }));
    }

    #[test]
    fn test_json_writer_rejects_functions() {
        let intrinsic = crate::runtime::intrinsics::lookup("_binary_plus").unwrap();
        let value = Value::Callable(crate::runtime::value::Callable::Intrinsic(intrinsic));
        let error = write(&value, "json", &FormatOptions::new()).unwrap_err();
        assert!(matches!(error, FormatError::Write { format: "json", .. }));
    }

    #[test]
    fn test_csv_reader_with_header() {
        let value = read("name,age\nada,36\ngrace,45\n", "csv", &FormatOptions::new()).unwrap();
        match value {
            Value::List(records) => {
                assert_eq!(records.len(), 2);
                match &records[0] {
                    Value::Object(map) => {
                        assert_eq!(map.get("name"), Some(&Value::from("ada")));
                        assert_eq!(map.get("age"), Some(&Value::from("36")));
                    }
                    other => panic!("expected object row, got {:?}", other),
                }
            }
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_csv_reader_without_header() {
        let value = read(
            "1,2\n3,4\n",
            "csv",
            &FormatOptions::new().set("header", "false"),
        )
        .unwrap();
        assert_eq!(
            value,
            Value::List(vec![
                Value::List(vec![Value::from("1"), Value::from("2")]),
                Value::List(vec![Value::from("3"), Value::from("4")]),
            ])
        );
    }

    #[test]
    fn test_csv_reader_quoted_fields() {
        let value = read(
            "a,b\n\"x,y\",\"with \"\"quotes\"\"\"\n",
            "csv",
            &FormatOptions::new(),
        )
        .unwrap();
        match value {
            Value::List(records) => match &records[0] {
                Value::Object(map) => {
                    assert_eq!(map.get("a"), Some(&Value::from("x,y")));
                    assert_eq!(map.get("b"), Some(&Value::from("with \"quotes\"")));
                }
                other => panic!("expected object row, got {:?}", other),
            },
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_csv_writer_objects() {
        let mut first = ValueMap::new();
        first.insert("name", Value::from("ada"));
        first.insert("age", Value::Integer(36));
        let mut second = ValueMap::new();
        second.insert("name", Value::from("grace"));
        second.insert("age", Value::Null);

        let rendered = write(
            &Value::List(vec![Value::Object(first), Value::Object(second)]),
            "csv",
            &FormatOptions::new(),
        )
        .unwrap();
        assert_eq!(rendered, "name,age\nada,36\ngrace,\n");
    }

    #[test]
    fn test_csv_writer_escapes_separator() {
        let rendered = write(
            &Value::List(vec![Value::List(vec![
                Value::from("x,y"),
                Value::Integer(1),
            ])]),
            "csv",
            &FormatOptions::new().set("header", "false"),
        )
        .unwrap();
        assert_eq!(rendered, "\"x,y\",1\n");
    }

    #[test]
    fn test_csv_writer_column_selection() {
        let mut row = ValueMap::new();
        row.insert("a", Value::Integer(1));
        row.insert("b", Value::Integer(2));

        let rendered = write(
            &Value::Object(row),
            "csv",
            &FormatOptions::new().set("columns", "b"),
        )
        .unwrap();
        assert_eq!(rendered, "b\n2\n");
    }

    #[test]
    fn test_csv_writer_rejects_scalars() {
        let error = write(&Value::Integer(1), "csv", &FormatOptions::new()).unwrap_err();
        assert!(matches!(error, FormatError::Write { format: "csv", .. }));
    }
}
