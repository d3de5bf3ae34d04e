//! Document assembly.
//!
//! A document is built in layers: core fields, the fixed field set of the
//! item's kind, acquired content, then extra fields. Extra fields may replace
//! kind fields but never core ones.

mod extra_fields;

pub use extra_fields::{ExtraFieldRegistry, ValueResolver};

use chrono::{DateTime, SecondsFormat, Utc};
use content_indexer_shared::types::content_item::CommerceAttributes;
use content_indexer_shared::types::fields;
use content_indexer_shared::{ContentItem, Document, ItemAttributes};

use crate::acquisition::AcquisitionOutput;

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Builds [`Document`]s from items and acquisition output.
#[derive(Default)]
pub struct DocumentAssembler {
    extra_fields: ExtraFieldRegistry,
}

impl DocumentAssembler {
    pub fn new(extra_fields: ExtraFieldRegistry) -> Self {
        Self { extra_fields }
    }

    pub fn extra_fields(&self) -> &ExtraFieldRegistry {
        &self.extra_fields
    }

    pub fn assemble(
        &self,
        item: &ContentItem,
        acquisition: &AcquisitionOutput,
        indexed_at: DateTime<Utc>,
    ) -> Document {
        let mut doc = Document::new(item.id, item.site_id);
        insert_kind_fields(&mut doc, &item.attributes);
        for (name, value) in self.extra_fields.resolve(item) {
            doc.insert(name, value);
        }
        insert_core_fields(&mut doc, item, indexed_at);

        if let Some(content) = acquisition
            .content
            .as_deref()
            .filter(|text| !text.trim().is_empty())
        {
            doc.insert(fields::CONTENT, content);
        }

        doc
    }
}

fn insert_core_fields(doc: &mut Document, item: &ContentItem, indexed_at: DateTime<Utc>) {
    doc.insert(fields::ID, item.id);
    doc.insert(fields::SITE_ID, item.site_id);
    doc.insert(fields::TYPE, item.kind().as_str());
    doc.insert(fields::TITLE, item.title.as_str());
    doc.insert(fields::SLUG, item.slug.clone());
    doc.insert(fields::STATUS, item.status.as_str());
    doc.insert(fields::URL, item.url.clone());
    doc.insert(fields::DATE_CREATED, timestamp(&item.date_created));
    doc.insert(fields::DATE_UPDATED, timestamp(&item.date_updated));
    doc.insert(fields::INDEXED_AT, timestamp(&indexed_at));
    doc.insert(fields::ENABLED, item.enabled);
    doc.insert(fields::ARCHIVED, item.archived);
}

fn insert_kind_fields(doc: &mut Document, attributes: &ItemAttributes) {
    match attributes {
        ItemAttributes::Entry {
            section,
            entry_type,
            post_date,
            expiry_date,
        } => {
            doc.insert(fields::SECTION, section.as_str());
            doc.insert(fields::ENTRY_TYPE, entry_type.as_str());
            doc.insert_opt(fields::POST_DATE, post_date.as_ref().map(timestamp));
            doc.insert_opt(fields::EXPIRY_DATE, expiry_date.as_ref().map(timestamp));
        }
        ItemAttributes::Asset {
            volume,
            filename,
            asset_kind,
            size,
            width,
            height,
        } => {
            doc.insert(fields::VOLUME, volume.as_str());
            doc.insert(fields::FILENAME, filename.as_str());
            doc.insert(fields::KIND, asset_kind.as_str());
            doc.insert_opt(fields::SIZE, *size);
            doc.insert_opt(fields::WIDTH, *width);
            doc.insert_opt(fields::HEIGHT, *height);
        }
        ItemAttributes::Category {
            group,
            level,
            lft,
            rgt,
        } => {
            doc.insert(fields::GROUP, group.as_str());
            doc.insert(fields::LEVEL, *level);
            doc.insert(fields::LEFT, *lft);
            doc.insert(fields::RIGHT, *rgt);
        }
        ItemAttributes::Product(commerce) | ItemAttributes::DigitalProduct(commerce) => {
            insert_commerce_fields(doc, commerce);
        }
    }
}

fn insert_commerce_fields(doc: &mut Document, commerce: &CommerceAttributes) {
    doc.insert(fields::PRODUCT_TYPE, commerce.product_type.as_str());
    doc.insert_opt(fields::PRICE, commerce.price);
    doc.insert_opt(fields::SALE_PRICE, commerce.sale_price);
    doc.insert_opt(fields::SKU, commerce.sku.clone());
    doc.insert_opt(fields::STOCK, commerce.stock);
    doc.insert_opt(fields::WEIGHT, commerce.weight);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::ContentStrategy;
    use chrono::TimeZone;
    use content_indexer_shared::{ContentAcquisitionDiagnostic, ItemVariant};
    use serde_json::{json, Value};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn entry() -> ContentItem {
        ContentItem {
            id: 12,
            site_id: 1,
            title: "Hello World".to_string(),
            slug: Some("hello-world".to_string()),
            status: "live".to_string(),
            url: Some("https://example.com/hello-world".to_string()),
            date_created: at(1_700_000_000),
            date_updated: at(1_700_000_600),
            enabled: true,
            archived: false,
            variant: ItemVariant::Canonical,
            attributes: ItemAttributes::Entry {
                section: "news".to_string(),
                entry_type: "article".to_string(),
                post_date: Some(at(1_700_000_000)),
                expiry_date: None,
            },
        }
    }

    fn output(content: Option<&str>) -> AcquisitionOutput {
        AcquisitionOutput {
            content: content.map(str::to_string),
            strategy: content.map(|_| ContentStrategy::Structured),
            fields: Vec::new(),
            diagnostic: ContentAcquisitionDiagnostic::default(),
            content_required: true,
            truncated: false,
        }
    }

    #[test]
    fn test_core_and_entry_fields() {
        let doc = DocumentAssembler::default().assemble(
            &entry(),
            &output(Some("Hello World\nWelcome")),
            at(1_700_001_000),
        );

        assert_eq!(doc.id(), "12_1");
        assert_eq!(doc.get(fields::ID), Some(&json!(12)));
        assert_eq!(doc.get(fields::TYPE), Some(&json!("entry")));
        assert_eq!(doc.get(fields::TITLE), Some(&json!("Hello World")));
        assert_eq!(doc.get(fields::DATE_CREATED), Some(&json!("2023-11-14T22:13:20Z")));
        assert_eq!(doc.get(fields::SECTION), Some(&json!("news")));
        assert!(!doc.contains(fields::EXPIRY_DATE));
        assert_eq!(doc.content(), Some("Hello World\nWelcome"));
        for core in fields::CORE.iter().filter(|name| **name != fields::CONTENT) {
            assert!(doc.contains(core), "missing core field {core}");
        }
    }

    #[test]
    fn test_content_absent_without_text() {
        let assembler = DocumentAssembler::default();
        let doc = assembler.assemble(&entry(), &output(None), at(0));
        assert!(!doc.contains(fields::CONTENT));

        let doc = assembler.assemble(&entry(), &output(Some("  \n ")), at(0));
        assert!(!doc.contains(fields::CONTENT));
    }

    #[test]
    fn test_asset_and_commerce_fields() {
        let assembler = DocumentAssembler::default();
        let mut asset = entry();
        asset.attributes = ItemAttributes::Asset {
            volume: "documents".to_string(),
            filename: "brochure.pdf".to_string(),
            asset_kind: "pdf".to_string(),
            size: Some(2048),
            width: None,
            height: None,
        };
        let doc = assembler.assemble(&asset, &output(None), at(0));
        assert_eq!(doc.get(fields::TYPE), Some(&json!("asset")));
        assert_eq!(doc.get(fields::KIND), Some(&json!("pdf")));
        assert_eq!(doc.get(fields::SIZE), Some(&json!(2048)));
        assert!(!doc.contains(fields::WIDTH));
        assert!(!doc.contains(fields::SECTION));

        let mut product = entry();
        product.attributes = ItemAttributes::Product(CommerceAttributes {
            product_type: "shirts".to_string(),
            price: Some(19.5),
            sku: Some("SH-1".to_string()),
            ..CommerceAttributes::default()
        });
        let doc = assembler.assemble(&product, &output(None), at(0));
        assert_eq!(doc.get(fields::PRICE), Some(&json!(19.5)));
        assert_eq!(doc.get(fields::SKU), Some(&json!("SH-1")));
        assert!(!doc.contains(fields::SALE_PRICE));
    }

    #[test]
    fn test_extra_fields_override_kind_fields_only() {
        let mut registry = ExtraFieldRegistry::new();
        registry
            .register("section", json!({"type": "keyword"}), |_| {
                Ok(Some(json!("overridden")))
            })
            .unwrap();
        registry
            .register("reading_time", json!({"type": "integer"}), |_| {
                Err("no word count".into())
            })
            .unwrap();
        let assembler = DocumentAssembler::new(registry);

        let doc = assembler.assemble(&entry(), &output(None), at(0));

        assert_eq!(doc.get(fields::SECTION), Some(&json!("overridden")));
        assert!(!doc.contains("reading_time"));
        assert_eq!(doc.get(fields::TITLE), Some(&json!("Hello World")));
    }

    #[test]
    fn test_reassembly_is_deterministic() {
        let assembler = DocumentAssembler::default();
        let first = assembler.assemble(&entry(), &output(Some("text")), at(10));
        let mut second = assembler.assemble(&entry(), &output(Some("text")), at(20));

        assert_ne!(first, second);
        second.insert(fields::INDEXED_AT, Value::from(timestamp(&at(10))));
        assert_eq!(first, second);
    }
}
