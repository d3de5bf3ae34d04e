//! Content item types handed over by the CMS.
//!
//! A [`ContentItem`] is read-only from the indexer's point of view. The kind of
//! item is carried by the [`ItemAttributes`] variant, so every component can
//! match on it instead of comparing type names.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::descriptor::IndexableItemDescriptor;

/// Asset kinds whose text content is not expected to be extracted.
pub const BINARY_ASSET_KINDS: &[&str] = &["pdf", "image", "video", "audio"];

/// The kind of content item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Article-like content with a section and entry type.
    Entry,
    /// Uploaded file stored in a volume.
    Asset,
    /// Taxonomy term belonging to a category group.
    Category,
    /// Physical commerce product.
    Product,
    /// Digital commerce product.
    DigitalProduct,
}

impl ItemKind {
    /// Every supported kind, in a stable order.
    pub const ALL: [ItemKind; 5] = [
        ItemKind::Entry,
        ItemKind::Asset,
        ItemKind::Category,
        ItemKind::Product,
        ItemKind::DigitalProduct,
    ];

    /// Returns the identifier used in documents and configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Entry => "entry",
            ItemKind::Asset => "asset",
            ItemKind::Category => "category",
            ItemKind::Product => "product",
            ItemKind::DigitalProduct => "digital_product",
        }
    }

    /// Human-readable plural label, used in outcome messages.
    pub fn plural_label(&self) -> &'static str {
        match self {
            ItemKind::Entry => "entries",
            ItemKind::Asset => "assets",
            ItemKind::Category => "categories",
            ItemKind::Product => "products",
            ItemKind::DigitalProduct => "digital products",
        }
    }

    /// Returns true for the commerce kinds.
    pub fn is_commerce(&self) -> bool {
        matches!(self, ItemKind::Product | ItemKind::DigitalProduct)
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an item is the canonical version or one of its working copies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemVariant {
    #[default]
    Canonical,
    Draft,
    Revision,
}

/// Commerce attributes shared by products and digital products.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CommerceAttributes {
    pub product_type: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub sale_price: Option<f64>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default)]
    pub weight: Option<f64>,
}

/// Type-specific attributes of a content item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemAttributes {
    Entry {
        section: String,
        entry_type: String,
        #[serde(default)]
        post_date: Option<DateTime<Utc>>,
        #[serde(default)]
        expiry_date: Option<DateTime<Utc>>,
    },
    Asset {
        volume: String,
        filename: String,
        /// File kind as reported by the CMS (e.g. "pdf", "image", "text").
        asset_kind: String,
        #[serde(default)]
        size: Option<u64>,
        #[serde(default)]
        width: Option<u32>,
        #[serde(default)]
        height: Option<u32>,
    },
    Category {
        group: String,
        level: u32,
        lft: u32,
        rgt: u32,
    },
    Product(CommerceAttributes),
    DigitalProduct(CommerceAttributes),
}

impl ItemAttributes {
    /// The kind described by these attributes.
    pub fn kind(&self) -> ItemKind {
        match self {
            ItemAttributes::Entry { .. } => ItemKind::Entry,
            ItemAttributes::Asset { .. } => ItemKind::Asset,
            ItemAttributes::Category { .. } => ItemKind::Category,
            ItemAttributes::Product(_) => ItemKind::Product,
            ItemAttributes::DigitalProduct(_) => ItemKind::DigitalProduct,
        }
    }
}

/// A content unit delivered by the CMS.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentItem {
    pub id: u64,
    pub site_id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    pub status: String,
    /// Public URL, if the item has one on this site.
    #[serde(default)]
    pub url: Option<String>,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub variant: ItemVariant,
    pub attributes: ItemAttributes,
}

fn default_enabled() -> bool {
    true
}

impl ContentItem {
    /// The item's kind.
    pub fn kind(&self) -> ItemKind {
        self.attributes.kind()
    }

    /// Minimal reference used to re-fetch this item later.
    pub fn descriptor(&self) -> IndexableItemDescriptor {
        IndexableItemDescriptor::new(self.id, self.site_id, self.kind())
    }

    /// Returns the asset kind for assets, `None` for every other kind.
    pub fn asset_kind(&self) -> Option<&str> {
        match &self.attributes {
            ItemAttributes::Asset { asset_kind, .. } => Some(asset_kind.as_str()),
            _ => None,
        }
    }

    /// Returns true for assets whose kind carries no extractable text.
    pub fn is_binary(&self) -> bool {
        self.asset_kind()
            .map(|kind| {
                BINARY_ASSET_KINDS
                    .iter()
                    .any(|binary| binary.eq_ignore_ascii_case(kind))
            })
            .unwrap_or(false)
    }

    /// Returns true if the item has a non-blank public URL.
    pub fn has_url(&self) -> bool {
        self.url.as_deref().is_some_and(|url| !url.trim().is_empty())
    }
}

/// A site of the CMS deployment. Documents and indexes are site-scoped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SiteInfo {
    pub id: u64,
    #[serde(default)]
    pub handle: String,
    /// BCP 47 language tag of the site (e.g. "en-US").
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "en".to_string()
}

impl SiteInfo {
    pub fn new(id: u64, handle: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            id,
            handle: handle.into(),
            language: language.into(),
        }
    }
}
