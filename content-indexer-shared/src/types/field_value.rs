//! Raw field values as returned by the CMS.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A related item referenced by a relation field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelatedItem {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// A raw field value.
///
/// Block values hold one map per block, keyed by the sub-field handles that
/// the block field's layout node declares as children.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Null,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(DateTime<Utc>),
    /// Time of day, "HH:MM[:SS]".
    Time(String),
    Money { amount: f64, currency: String },
    Country { code: String, name: String },
    Options(Vec<String>),
    Table(Vec<Vec<String>>),
    Relations(Vec<RelatedItem>),
    Blocks(Vec<BTreeMap<String, FieldValue>>),
}

impl FieldValue {
    /// Returns true for values that carry nothing to index.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(text) | FieldValue::Time(text) => text.trim().is_empty(),
            FieldValue::Options(options) => options.is_empty(),
            FieldValue::Table(rows) => rows.iter().all(|row| row.is_empty()),
            FieldValue::Relations(items) => items.is_empty(),
            FieldValue::Blocks(blocks) => blocks.is_empty(),
            FieldValue::Number(_)
            | FieldValue::Bool(_)
            | FieldValue::Date(_)
            | FieldValue::Money { .. }
            | FieldValue::Country { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjacently_tagged_json() {
        let value: FieldValue =
            serde_json::from_str(r#"{ "type": "money", "value": { "amount": 12.5, "currency": "EUR" } }"#)
                .unwrap();
        assert_eq!(
            value,
            FieldValue::Money {
                amount: 12.5,
                currency: "EUR".to_string()
            }
        );

        let blocks: FieldValue = serde_json::from_str(
            r#"{ "type": "blocks", "value": [ { "heading": { "type": "text", "value": "Intro" } } ] }"#,
        )
        .unwrap();
        match blocks {
            FieldValue::Blocks(ref list) => {
                assert_eq!(list[0]["heading"], FieldValue::Text("Intro".to_string()))
            }
            _ => panic!("expected blocks"),
        }
    }

    #[test]
    fn test_is_empty() {
        assert!(FieldValue::Null.is_empty());
        assert!(FieldValue::Text("  ".to_string()).is_empty());
        assert!(FieldValue::Relations(vec![]).is_empty());
        assert!(!FieldValue::Bool(false).is_empty());
        assert!(!FieldValue::Text("x".to_string()).is_empty());
    }
}
