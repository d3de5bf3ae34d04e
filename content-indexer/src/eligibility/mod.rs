//! Eligibility classification.
//!
//! Decides whether an item should be indexed and, if not, whether the cause is
//! the data (skipped) or the operator's configuration (disabled). Rules are
//! applied in order and the first match wins, so an item is never both.

use std::sync::Arc;

use content_indexer_shared::{ContentItem, ItemAttributes, ItemKind, ItemVariant};

use crate::config::IndexerSettings;

/// Data-caused reason for not indexing an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Draft,
    Revision,
    MissingUrl,
    StatusNotAllowed { status: String },
    ItemNotFound,
}

impl SkipReason {
    pub fn code(&self) -> &'static str {
        match self {
            SkipReason::Draft => "draft",
            SkipReason::Revision => "revision",
            SkipReason::MissingUrl => "missing_url",
            SkipReason::StatusNotAllowed { .. } => "status_not_allowed",
            SkipReason::ItemNotFound => "item_not_found",
        }
    }

    pub fn message(&self) -> String {
        match self {
            SkipReason::Draft => "Drafts are not indexed".to_string(),
            SkipReason::Revision => "Revisions are not indexed".to_string(),
            SkipReason::MissingUrl => "Item has no public URL".to_string(),
            SkipReason::StatusNotAllowed { status } => {
                format!("Status \"{}\" is not indexed", status)
            }
            SkipReason::ItemNotFound => "Item no longer exists".to_string(),
        }
    }
}

/// Operator-caused reason for not indexing an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisabledReason {
    TypeDisabled { kind: ItemKind },
    SectionExcluded,
    EntryTypeExcluded,
    AssetVolumeExcluded,
    AssetKindExcluded,
    CategoryGroupExcluded,
    ProductTypeExcluded,
    DigitalProductTypeExcluded,
}

impl DisabledReason {
    pub fn code(&self) -> &'static str {
        match self {
            DisabledReason::TypeDisabled { .. } => "type_disabled",
            DisabledReason::SectionExcluded => "section_excluded",
            DisabledReason::EntryTypeExcluded => "entry_type_excluded",
            DisabledReason::AssetVolumeExcluded => "asset_volume_excluded",
            DisabledReason::AssetKindExcluded => "asset_kind_excluded",
            DisabledReason::CategoryGroupExcluded => "category_group_excluded",
            DisabledReason::ProductTypeExcluded => "product_type_excluded",
            DisabledReason::DigitalProductTypeExcluded => "digital_product_type_excluded",
        }
    }

    pub fn message(&self) -> String {
        match self {
            DisabledReason::TypeDisabled { kind } => {
                format!("Indexing of {} is disabled", kind.plural_label())
            }
            DisabledReason::SectionExcluded => "Section is excluded".to_string(),
            DisabledReason::EntryTypeExcluded => "Entry type is excluded".to_string(),
            DisabledReason::AssetVolumeExcluded => "Asset volume is excluded".to_string(),
            DisabledReason::AssetKindExcluded => "Asset kind is excluded".to_string(),
            DisabledReason::CategoryGroupExcluded => "Category group is excluded".to_string(),
            DisabledReason::ProductTypeExcluded => "Product type is excluded".to_string(),
            DisabledReason::DigitalProductTypeExcluded => {
                "Digital product type is excluded".to_string()
            }
        }
    }
}

/// Classification result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eligibility {
    pub indexable: bool,
    pub skip_reason: Option<SkipReason>,
    pub disabled_reason: Option<DisabledReason>,
}

impl Eligibility {
    pub fn indexable() -> Self {
        Self {
            indexable: true,
            skip_reason: None,
            disabled_reason: None,
        }
    }

    pub fn skipped(reason: SkipReason) -> Self {
        Self {
            indexable: false,
            skip_reason: Some(reason),
            disabled_reason: None,
        }
    }

    pub fn disabled(reason: DisabledReason) -> Self {
        Self {
            indexable: false,
            skip_reason: None,
            disabled_reason: Some(reason),
        }
    }
}

/// Applies the eligibility rules of the current settings.
#[derive(Debug, Clone)]
pub struct EligibilityClassifier {
    settings: Arc<IndexerSettings>,
}

impl EligibilityClassifier {
    pub fn new(settings: Arc<IndexerSettings>) -> Self {
        Self { settings }
    }

    pub fn classify(&self, item: &ContentItem) -> Eligibility {
        match item.variant {
            ItemVariant::Draft => return Eligibility::skipped(SkipReason::Draft),
            ItemVariant::Revision => return Eligibility::skipped(SkipReason::Revision),
            ItemVariant::Canonical => {}
        }

        let kind = item.kind();
        if self.settings.require_public_url
            && !self.settings.url_exempt_kinds.contains(&kind)
            && !item.has_url()
        {
            return Eligibility::skipped(SkipReason::MissingUrl);
        }

        if let Some(reason) = self.disabled_reason(item) {
            return Eligibility::disabled(reason);
        }

        let allowed = self.settings.statuses(kind);
        if !allowed.is_empty()
            && !allowed
                .iter()
                .any(|status| status.eq_ignore_ascii_case(&item.status))
        {
            return Eligibility::skipped(SkipReason::StatusNotAllowed {
                status: item.status.clone(),
            });
        }

        Eligibility::indexable()
    }

    fn disabled_reason(&self, item: &ContentItem) -> Option<DisabledReason> {
        let kind = item.kind();
        if !self.settings.kind_enabled(kind) {
            return Some(DisabledReason::TypeDisabled { kind });
        }

        let settings = &self.settings;
        match &item.attributes {
            ItemAttributes::Entry {
                section,
                entry_type,
                ..
            } => {
                if listed(&settings.entries.excluded_sections, section) {
                    Some(DisabledReason::SectionExcluded)
                } else if listed(&settings.entries.excluded_entry_types, entry_type) {
                    Some(DisabledReason::EntryTypeExcluded)
                } else {
                    None
                }
            }
            ItemAttributes::Asset {
                volume, asset_kind, ..
            } => {
                if listed(&settings.assets.excluded_volumes, volume) {
                    Some(DisabledReason::AssetVolumeExcluded)
                } else if listed(&settings.assets.excluded_kinds, asset_kind) {
                    Some(DisabledReason::AssetKindExcluded)
                } else {
                    None
                }
            }
            ItemAttributes::Category { group, .. } => {
                listed(&settings.categories.excluded_groups, group)
                    .then_some(DisabledReason::CategoryGroupExcluded)
            }
            ItemAttributes::Product(commerce) => {
                listed(&settings.products.excluded_product_types, &commerce.product_type)
                    .then_some(DisabledReason::ProductTypeExcluded)
            }
            ItemAttributes::DigitalProduct(commerce) => listed(
                &settings.digital_products.excluded_product_types,
                &commerce.product_type,
            )
            .then_some(DisabledReason::DigitalProductTypeExcluded),
        }
    }
}

/// Exclusion lists hold CMS handles, matched exactly.
fn listed(list: &[String], handle: &str) -> bool {
    list.iter().any(|entry| entry == handle)
}
