//! Source record shapes, one per list category.
//!
//! Records arrive already parsed from the provider formats (see [`crate::loader`]) and are
//! never modified afterwards. [`ScreenedRecord`] is the one capability the index and the
//! evaluator rely on; they never match on concrete record types.

mod csl;
mod dpl;
mod ofac;

pub use csl::{BisEntity, SectoralSanction};
pub use dpl::DeniedPerson;
pub use ofac::{Address, AlternateIdentity, Sdn};

use serde::Serialize;
use std::fmt;

use crate::entity::Entity;

/// List categories, in the order they are scanned and reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Sdn,
    AltName,
    Address,
    SectoralSanction,
    DeniedPerson,
    BisEntity,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Sdn,
        Category::AltName,
        Category::Address,
        Category::SectoralSanction,
        Category::DeniedPerson,
        Category::BisEntity,
    ];

    /// Key used for this category in search responses.
    pub fn response_key(self) -> &'static str {
        match self {
            Category::Sdn => "SDNs",
            Category::AltName => "altNames",
            Category::Address => "addresses",
            Category::SectoralSanction => "sectoralSanctions",
            Category::DeniedPerson => "deniedPersons",
            Category::BisEntity => "bisEntities",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.response_key())
    }
}

/// Raw address columns of a record, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressFields {
    pub street: String,
    pub city_state: String,
    pub country: String,
}

impl AddressFields {
    pub fn is_empty(&self) -> bool {
        self.street.trim().is_empty()
            && self.city_state.trim().is_empty()
            && self.country.trim().is_empty()
    }
}

/// Common capability of every list record.
pub trait ScreenedRecord: Clone + Send + Sync + Serialize + 'static {
    const CATEGORY: Category;

    /// Whether records of this kind must carry an entity ID.
    const HAS_ENTITY_ID: bool = true;

    /// Whether records of this kind must carry at least one name.
    const NAME_BEARING: bool = true;

    fn entity_id(&self) -> &str;

    /// Stable key used to break score ties.
    fn record_key(&self) -> String {
        self.entity_id().to_string()
    }

    /// Display names this record can be matched under, primary name first.
    fn name_variants(&self) -> Vec<String>;

    fn address_fields(&self) -> Option<AddressFields> {
        None
    }

    /// Identifiers an ID lookup may match exactly.
    fn identifiers(&self) -> Vec<String> {
        let id = self.entity_id().trim();
        if id.is_empty() {
            Vec::new()
        } else {
            vec![id.to_string()]
        }
    }

    fn to_entity(&self) -> Entity<Self>;
}

/// Parses a `;`-separated program or alias column, dropping blanks.
pub(crate) fn split_list(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|item| !item.is_empty() && *item != "-0-")
        .map(str::to_string)
        .collect()
}

pub(crate) fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == "-0-" {
        None
    } else {
        Some(trimmed.to_string())
    }
}
