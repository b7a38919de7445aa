//! List-agnostic envelope shared by every source record.
//!
//! Each list keeps its own record shape (see [`crate::lists`]); `Entity<T>` lifts the
//! fields callers commonly need (name, type, addresses, programs) into one structure
//! while carrying the original record untouched in `source_data`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::normalize::address::StandardizedAddress;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    #[default]
    #[serde(rename = "")]
    Unknown,
    Person,
    Business,
    Organization,
    Aircraft,
    Vessel,
}

impl EntityType {
    /// Maps the free-text type columns used by the lists.
    pub fn from_list_type(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "individual" | "person" => Self::Person,
            "entity" | "business" | "company" => Self::Business,
            "organization" | "organisation" => Self::Organization,
            "aircraft" => Self::Aircraft,
            "vessel" => Self::Vessel,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceList {
    #[default]
    #[serde(rename = "")]
    Unknown,
    #[serde(rename = "us_ofac")]
    UsOfac,
    #[serde(rename = "us_csl")]
    UsCsl,
    #[serde(rename = "us_dpl")]
    UsDpl,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity<T> {
    pub name: String,
    pub entity_type: EntityType,
    pub source_list: SourceList,
    #[serde(rename = "sourceID")]
    pub source_id: String,

    pub person: Option<Person>,
    pub business: Option<Business>,
    pub organization: Option<Organization>,
    pub aircraft: Option<Aircraft>,
    pub vessel: Option<Vessel>,

    pub crypto_addresses: Option<Vec<CryptoAddress>>,
    pub addresses: Option<Vec<EntityAddress>>,
    pub affiliations: Option<Vec<Affiliation>>,
    pub sanctions_info: Option<SanctionsInfo>,
    pub historical_info: Option<Vec<HistoricalInfo>>,
    pub titles: Option<Vec<String>>,

    pub source_data: T,
}

impl<T> Entity<T> {
    /// Starts an envelope with the type-specific sub-record populated from `name`.
    pub fn new(
        name: impl Into<String>,
        entity_type: EntityType,
        source_list: SourceList,
        source_id: impl Into<String>,
        source_data: T,
    ) -> Self {
        let name = name.into();
        let mut entity = Self {
            name: name.clone(),
            entity_type,
            source_list,
            source_id: source_id.into(),
            person: None,
            business: None,
            organization: None,
            aircraft: None,
            vessel: None,
            crypto_addresses: None,
            addresses: None,
            affiliations: None,
            sanctions_info: None,
            historical_info: None,
            titles: None,
            source_data,
        };

        match entity_type {
            EntityType::Person => {
                entity.person = Some(Person {
                    name,
                    ..Person::default()
                })
            }
            EntityType::Business => {
                entity.business = Some(Business {
                    name,
                    ..Business::default()
                })
            }
            EntityType::Organization => {
                entity.organization = Some(Organization {
                    name,
                    ..Organization::default()
                })
            }
            EntityType::Aircraft => {
                entity.aircraft = Some(Aircraft {
                    name,
                    ..Aircraft::default()
                })
            }
            EntityType::Vessel => {
                entity.vessel = Some(Vessel {
                    name,
                    ..Vessel::default()
                })
            }
            EntityType::Unknown => {}
        }

        entity
    }

    /// Records alternate names on whichever sub-record is populated.
    pub fn with_alt_names(mut self, alt_names: Vec<String>) -> Self {
        if alt_names.is_empty() {
            return self;
        }
        if let Some(person) = self.person.as_mut() {
            person.alt_names = alt_names;
        } else if let Some(business) = self.business.as_mut() {
            business.alt_names = alt_names;
        } else if let Some(organization) = self.organization.as_mut() {
            organization.alt_names = alt_names;
        } else if let Some(aircraft) = self.aircraft.as_mut() {
            aircraft.alt_names = alt_names;
        } else if let Some(vessel) = self.vessel.as_mut() {
            vessel.alt_names = alt_names;
        }
        self
    }

    pub fn with_addresses(mut self, addresses: Vec<EntityAddress>) -> Self {
        if !addresses.is_empty() {
            self.addresses = Some(addresses);
        }
        self
    }

    pub fn with_sanctions(mut self, programs: Vec<String>, description: Option<String>) -> Self {
        if !programs.is_empty() || description.is_some() {
            self.sanctions_info = Some(SanctionsInfo {
                programs,
                secondary: false,
                description,
            });
        }
        self
    }

    pub fn with_titles(mut self, titles: Vec<String>) -> Self {
        if !titles.is_empty() {
            self.titles = Some(titles);
        }
        self
    }

    /// Exactly the sub-record named by `entity_type` is populated.
    pub fn is_consistent(&self) -> bool {
        let populated = [
            (EntityType::Person, self.person.is_some()),
            (EntityType::Business, self.business.is_some()),
            (EntityType::Organization, self.organization.is_some()),
            (EntityType::Aircraft, self.aircraft.is_some()),
            (EntityType::Vessel, self.vessel.is_some()),
        ];
        populated
            .iter()
            .all(|(kind, present)| *present == (*kind == self.entity_type))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub name: String,
    pub alt_names: Vec<String>,
    pub gender: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub titles: Vec<String>,
    #[serde(rename = "governmentIDs")]
    pub government_ids: Vec<GovernmentId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Business {
    pub name: String,
    pub alt_names: Vec<String>,
    pub created: Option<NaiveDate>,
    #[serde(rename = "governmentIDs")]
    pub government_ids: Vec<GovernmentId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub name: String,
    pub alt_names: Vec<String>,
    pub created: Option<NaiveDate>,
    #[serde(rename = "governmentIDs")]
    pub government_ids: Vec<GovernmentId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aircraft {
    pub name: String,
    pub alt_names: Vec<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub flag: Option<String>,
    pub serial_number: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vessel {
    pub name: String,
    pub alt_names: Vec<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub flag: Option<String>,
    pub call_sign: Option<String>,
    pub tonnage: Option<String>,
    pub gross_registered_tonnage: Option<String>,
    pub owner: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernmentId {
    #[serde(rename = "type")]
    pub kind: String,
    pub identifier: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoAddress {
    pub currency: String,
    pub address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityAddress {
    pub line1: String,
    pub line2: String,
    pub city: String,
    pub postal_code: String,
    pub state: String,
    pub country: String,
}

impl From<&StandardizedAddress> for EntityAddress {
    fn from(address: &StandardizedAddress) -> Self {
        let line1 = [address.street_number.as_str(), address.street_name.as_str()]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            line1,
            line2: address.unit.clone(),
            city: address.city.clone(),
            postal_code: address.postal_code.clone(),
            state: address.state.clone(),
            country: address.country.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Affiliation {
    pub entity_name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub details: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SanctionsInfo {
    pub programs: Vec<String>,
    pub secondary: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalInfo {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    pub date: Option<NaiveDate>,
}
