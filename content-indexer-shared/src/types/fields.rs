//! Field names shared by document assembly and mapping generation.

pub const ID: &str = "id";
pub const SITE_ID: &str = "site_id";
pub const TYPE: &str = "type";
pub const TITLE: &str = "title";
pub const SLUG: &str = "slug";
pub const STATUS: &str = "status";
pub const URL: &str = "url";
pub const DATE_CREATED: &str = "date_created";
pub const DATE_UPDATED: &str = "date_updated";
pub const INDEXED_AT: &str = "indexed_at";
pub const ENABLED: &str = "enabled";
pub const ARCHIVED: &str = "archived";
pub const CONTENT: &str = crate::types::document::CONTENT_FIELD;

pub const SECTION: &str = "section";
pub const ENTRY_TYPE: &str = "entry_type";
pub const POST_DATE: &str = "post_date";
pub const EXPIRY_DATE: &str = "expiry_date";

pub const VOLUME: &str = "volume";
pub const FILENAME: &str = "filename";
pub const KIND: &str = "kind";
pub const SIZE: &str = "size";
pub const WIDTH: &str = "width";
pub const HEIGHT: &str = "height";

pub const GROUP: &str = "group";
pub const LEVEL: &str = "level";
pub const LEFT: &str = "left";
pub const RIGHT: &str = "right";

pub const PRODUCT_TYPE: &str = "product_type";
pub const PRICE: &str = "price";
pub const SALE_PRICE: &str = "sale_price";
pub const SKU: &str = "sku";
pub const STOCK: &str = "stock";
pub const WEIGHT: &str = "weight";

/// Fields every document carries. Extra fields may not replace these.
pub const CORE: &[&str] = &[
    ID,
    SITE_ID,
    TYPE,
    TITLE,
    SLUG,
    STATUS,
    URL,
    DATE_CREATED,
    DATE_UPDATED,
    INDEXED_AT,
    ENABLED,
    ARCHIVED,
    CONTENT,
];

/// Returns true if `name` is reserved for a core field.
pub fn is_core(name: &str) -> bool {
    CORE.contains(&name)
}
