use serde::{Deserialize, Serialize};

use super::{non_empty, AddressFields, Category, ScreenedRecord};
use crate::entity::{Entity, EntityAddress, EntityType, SourceList};
use crate::normalize::normalize;

/// Entry from the BIS Denied Persons List. The list carries no identifier of its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeniedPerson {
    pub name: String,
    pub street_address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
    pub effective_date: String,
    pub expiration_date: String,
    pub standard_order: String,
    pub last_update: String,
    pub action: String,
    pub fr_citation: String,
}

impl ScreenedRecord for DeniedPerson {
    const CATEGORY: Category = Category::DeniedPerson;
    const HAS_ENTITY_ID: bool = false;

    fn entity_id(&self) -> &str {
        ""
    }

    fn record_key(&self) -> String {
        format!("{} {}", normalize(&self.name), normalize(&self.street_address))
            .trim()
            .to_string()
    }

    fn name_variants(&self) -> Vec<String> {
        vec![self.name.trim().to_string()]
    }

    fn address_fields(&self) -> Option<AddressFields> {
        let city_state = [&self.city, &self.state, &self.postal_code]
            .iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let fields = AddressFields {
            street: self.street_address.clone(),
            city_state,
            country: self.country.clone(),
        };
        (!fields.is_empty()).then_some(fields)
    }

    fn to_entity(&self) -> Entity<Self> {
        let address = EntityAddress {
            line1: self.street_address.trim().to_string(),
            line2: String::new(),
            city: self.city.trim().to_string(),
            postal_code: self.postal_code.trim().to_string(),
            state: self.state.trim().to_string(),
            country: self.country.trim().to_string(),
        };
        let addresses = if self.address_fields().is_some() {
            vec![address]
        } else {
            Vec::new()
        };

        Entity::new(
            self.name.trim(),
            EntityType::Business,
            SourceList::UsDpl,
            "",
            self.clone(),
        )
        .with_addresses(addresses)
        .with_sanctions(Vec::new(), non_empty(&self.action))
    }
}
