//! Per-type transforms from raw field values to indexable values.

use content_indexer_shared::{FieldType, FieldValue, RelatedItem};
use serde_json::{json, Value};

use crate::acquisition::html::{html_to_text, normalize_whitespace};

/// Output of one transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Transformed {
    pub value: Value,
    pub keywords: String,
    pub structured_type: Option<&'static str>,
}

impl Transformed {
    fn plain(value: Value, keywords: impl Into<String>) -> Self {
        Self {
            value,
            keywords: keywords.into(),
            structured_type: None,
        }
    }

    /// Structured values carry `{value, keywords}` so the raw shape survives.
    fn structured(kind: &'static str, value: Value, keywords: String) -> Self {
        Self {
            value: json!({ "value": value, "keywords": keywords }),
            keywords,
            structured_type: Some(kind),
        }
    }
}

/// Transform a scalar value. Block values are handled by the extractor.
///
/// Returns `None` for empty values and for blocks.
pub fn transform(field_type: &FieldType, value: &FieldValue) -> Option<Transformed> {
    if value.is_empty() {
        return None;
    }

    let transformed = match value {
        FieldValue::Null | FieldValue::Blocks(_) => return None,
        FieldValue::Text(text) => {
            let keywords = match field_type {
                FieldType::RichText => html_to_text(text),
                _ => normalize_whitespace(text),
            };
            Transformed::plain(Value::String(keywords.clone()), keywords)
        }
        FieldValue::Number(number) => Transformed::plain(json!(number), format_number(*number)),
        FieldValue::Bool(flag) => Transformed::plain(Value::Bool(*flag), String::new()),
        FieldValue::Date(date) => Transformed::structured(
            "date",
            Value::String(date.to_rfc3339()),
            date.format("%Y-%m-%d").to_string(),
        ),
        FieldValue::Time(time) => {
            Transformed::structured("time", Value::String(time.clone()), time.trim().to_string())
        }
        FieldValue::Money { amount, currency } => Transformed::structured(
            "money",
            json!({ "amount": amount, "currency": currency }),
            format!("{:.2} {}", amount, currency),
        ),
        FieldValue::Country { code, name } => Transformed::structured(
            "country",
            json!({ "code": code, "name": name }),
            join_non_empty([code.as_str(), name.as_str()], " "),
        ),
        FieldValue::Options(options) => Transformed::plain(
            json!(options),
            join_non_empty(options.iter().map(String::as_str), " "),
        ),
        FieldValue::Table(rows) => {
            let keywords = join_non_empty(
                rows.iter()
                    .flat_map(|row| row.iter().map(String::as_str)),
                " ",
            );
            Transformed::plain(json!(rows), keywords)
        }
        FieldValue::Relations(items) => Transformed {
            value: Value::Array(items.iter().map(relation_value).collect()),
            keywords: join_non_empty(items.iter().map(|item| item.title.as_str()), " "),
            structured_type: Some("relation"),
        },
    };

    Some(transformed)
}

fn relation_value(item: &RelatedItem) -> Value {
    json!({
        "id": item.id,
        "title": item.title,
        "slug": item.slug,
        "url": item.url,
    })
}

/// Integral numbers render without a fractional part.
fn format_number(number: f64) -> String {
    if number.fract() == 0.0 && number.abs() < 1e15 {
        format!("{}", number as i64)
    } else {
        number.to_string()
    }
}

pub(crate) fn join_non_empty<'a>(
    parts: impl IntoIterator<Item = &'a str>,
    separator: &str,
) -> String {
    parts
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}
