//! Comma-separated text with double-quote quoting.

use serde_json::{Map, Value};

const QUOTE: char = '"';
const FIELD_SEP: char = ',';
const ROW_SEP: char = '\n';

/// One data row, keyed by the header row. Header order is preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    fields: Vec<(String, String)>,
}

impl Row {
    /// Value for `header`. With duplicate headers the last column wins.
    pub fn get(&self, header: &str) -> Option<&str> {
        self.fields
            .iter()
            .rev()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(h, v)| (h.as_str(), v.as_str()))
    }
}

/// Raw field as scanned, before quote cleanup.
struct ScannedField {
    raw: String,
}

impl ScannedField {
    fn new() -> Self {
        Self { raw: String::new() }
    }

    /// Whitespace outside the quotes is never part of the value.
    fn finish(self) -> String {
        let trimmed = self.raw.trim();
        if !trimmed.contains(QUOTE) {
            return trimmed.to_string();
        }
        if is_clean_quoted(trimmed) {
            return trimmed[1..trimmed.len() - 1].replace("\"\"", "\"");
        }
        self.raw.replace(QUOTE, "").trim().to_string()
    }
}

/// `"..."` where every inner quote is doubled.
fn is_clean_quoted(raw: &str) -> bool {
    if raw.len() < 2 || !raw.starts_with(QUOTE) || !raw.ends_with(QUOTE) {
        return false;
    }
    let inner = &raw[1..raw.len() - 1];
    !inner.replace("\"\"", "").contains(QUOTE)
}

fn scan(text: &str) -> Vec<Vec<String>> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let chars: Vec<char> = normalized.chars().collect();

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = ScannedField::new();
    let mut in_quotes = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == QUOTE {
            if in_quotes && chars.get(i + 1) == Some(&QUOTE) {
                field.raw.push_str("\"\"");
                i += 2;
                continue;
            }
            in_quotes = !in_quotes;
            field.raw.push(c);
        } else if c == FIELD_SEP && !in_quotes {
            row.push(std::mem::replace(&mut field, ScannedField::new()).finish());
        } else if c == ROW_SEP && !in_quotes {
            row.push(std::mem::replace(&mut field, ScannedField::new()).finish());
            rows.push(std::mem::take(&mut row));
        } else {
            field.raw.push(c);
        }
        i += 1;
    }

    if !field.raw.is_empty() || !row.is_empty() {
        row.push(field.finish());
        rows.push(row);
    }

    rows.retain(|r| !(r.len() == 1 && r[0].is_empty()));
    rows
}

/// Parses delimited text into rows keyed by the first (header) row.
///
/// Never fails. Input with no data row yields an empty vec, short rows are
/// padded with empty strings and surplus trailing fields are dropped.
pub fn parse_delimited(text: &str) -> Vec<Row> {
    let mut rows = scan(text).into_iter();
    let headers = match rows.next() {
        Some(h) => h,
        None => return Vec::new(),
    };

    rows.map(|values| {
        let mut values = values.into_iter();
        let fields = headers
            .iter()
            .map(|h| (h.clone(), values.next().unwrap_or_default()))
            .collect();
        Row { fields }
    })
    .collect()
}

/// Converts rows into JSON objects for the ingestion pipeline.
pub fn to_records(rows: &[Row]) -> Vec<Value> {
    rows.iter()
        .map(|row| {
            let map: Map<String, Value> = row
                .iter()
                .map(|(h, v)| (h.to_string(), Value::String(v.to_string())))
                .collect();
            Value::Object(map)
        })
        .collect()
}

fn escape_field(value: &str) -> String {
    if value.contains([FIELD_SEP, QUOTE, ROW_SEP, '\r']) {
        format!("\"{}\"", value.replace(QUOTE, "\"\""))
    } else {
        value.to_string()
    }
}

/// Serializes a header and rows, quoting fields that need it.
pub fn write_delimited<S: AsRef<str>>(headers: &[S], rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    let header_line: Vec<String> = headers.iter().map(|h| escape_field(h.as_ref())).collect();
    out.push_str(&header_line.join(","));
    out.push(ROW_SEP);

    for row in rows {
        let line: Vec<String> = row.iter().map(|v| escape_field(v)).collect();
        out.push_str(&line.join(","));
        out.push(ROW_SEP);
    }

    out
}
