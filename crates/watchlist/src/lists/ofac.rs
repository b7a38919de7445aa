use serde::{Deserialize, Serialize};

use super::{non_empty, AddressFields, Category, ScreenedRecord};
use crate::entity::{Entity, EntityAddress, EntityType, GovernmentId, SourceList};
use crate::normalize::address::parse_address;
use crate::normalize::{extract_identifiers, reorder_sdn_name};

/// Primary designation on the Specially Designated Nationals list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sdn {
    #[serde(rename = "entityID")]
    pub entity_id: String,
    pub sdn_name: String,
    pub sdn_type: String,
    pub programs: Vec<String>,
    pub title: String,
    pub call_sign: String,
    pub vessel_type: String,
    pub tonnage: String,
    pub gross_registered_tonnage: String,
    pub vessel_flag: String,
    pub vessel_owner: String,
    pub remarks: String,
}

impl Sdn {
    /// Name as it is matched: individuals are flipped to given-name-first.
    pub fn display_name(&self) -> String {
        reorder_sdn_name(&self.sdn_name, &self.sdn_type)
    }

    /// Untyped entries are published for companies and banks, so they default to business.
    pub fn entity_type(&self) -> EntityType {
        match EntityType::from_list_type(&self.sdn_type) {
            EntityType::Unknown => EntityType::Business,
            known => known,
        }
    }
}

impl ScreenedRecord for Sdn {
    const CATEGORY: Category = Category::Sdn;

    fn entity_id(&self) -> &str {
        &self.entity_id
    }

    fn name_variants(&self) -> Vec<String> {
        vec![self.display_name()]
    }

    fn identifiers(&self) -> Vec<String> {
        let mut identifiers = vec![self.entity_id.trim().to_string()];
        for identifier in extract_identifiers(&self.remarks) {
            if !identifiers.contains(&identifier) {
                identifiers.push(identifier);
            }
        }
        identifiers.retain(|id| !id.is_empty());
        identifiers
    }

    fn to_entity(&self) -> Entity<Self> {
        let mut entity = Entity::new(
            self.display_name(),
            self.entity_type(),
            SourceList::UsOfac,
            self.entity_id.clone(),
            self.clone(),
        )
        .with_sanctions(self.programs.clone(), non_empty(&self.remarks))
        .with_titles(non_empty(&self.title).into_iter().collect());

        let government_ids: Vec<GovernmentId> = extract_identifiers(&self.remarks)
            .into_iter()
            .map(|identifier| GovernmentId {
                kind: "remarks".to_string(),
                identifier,
            })
            .collect();

        if let Some(person) = entity.person.as_mut() {
            person.government_ids = government_ids;
            person.titles = non_empty(&self.title).into_iter().collect();
        } else if let Some(business) = entity.business.as_mut() {
            business.government_ids = government_ids;
        } else if let Some(vessel) = entity.vessel.as_mut() {
            vessel.kind = non_empty(&self.vessel_type);
            vessel.flag = non_empty(&self.vessel_flag);
            vessel.call_sign = non_empty(&self.call_sign);
            vessel.tonnage = non_empty(&self.tonnage);
            vessel.gross_registered_tonnage = non_empty(&self.gross_registered_tonnage);
            vessel.owner = non_empty(&self.vessel_owner);
        } else if let Some(aircraft) = entity.aircraft.as_mut() {
            aircraft.kind = non_empty(&self.vessel_type);
            aircraft.flag = non_empty(&self.vessel_flag);
        }

        entity
    }
}

/// Alias attached to an SDN entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternateIdentity {
    #[serde(rename = "entityID")]
    pub entity_id: String,
    #[serde(rename = "alternateID")]
    pub alternate_id: String,
    pub alternate_type: String,
    pub alternate_name: String,
    pub alternate_remarks: String,
}

impl ScreenedRecord for AlternateIdentity {
    const CATEGORY: Category = Category::AltName;

    fn entity_id(&self) -> &str {
        &self.entity_id
    }

    fn name_variants(&self) -> Vec<String> {
        vec![self.alternate_name.trim().to_string()]
    }

    fn to_entity(&self) -> Entity<Self> {
        self.to_entity_of(None)
    }
}

impl AlternateIdentity {
    /// Envelope typed after the SDN entry the alias belongs to, when it is known.
    pub fn to_entity_of(&self, parent: Option<&Sdn>) -> Entity<Self> {
        Entity::new(
            self.alternate_name.trim(),
            parent.map_or(EntityType::Business, Sdn::entity_type),
            SourceList::UsOfac,
            self.entity_id.clone(),
            self.clone(),
        )
    }
}

/// Postal address attached to an SDN entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(rename = "entityID")]
    pub entity_id: String,
    #[serde(rename = "addressID")]
    pub address_id: String,
    pub address: String,
    pub city_state_province_postal_code: String,
    pub country: String,
}

impl ScreenedRecord for Address {
    const CATEGORY: Category = Category::Address;
    const NAME_BEARING: bool = false;

    fn entity_id(&self) -> &str {
        &self.entity_id
    }

    fn name_variants(&self) -> Vec<String> {
        Vec::new()
    }

    fn address_fields(&self) -> Option<AddressFields> {
        let fields = AddressFields {
            street: self.address.clone(),
            city_state: self.city_state_province_postal_code.clone(),
            country: self.country.clone(),
        };
        (!fields.is_empty()).then_some(fields)
    }

    fn to_entity(&self) -> Entity<Self> {
        self.to_entity_of(None)
    }
}

impl Address {
    /// Envelope named and typed after the SDN entry the address belongs to, when it is known.
    pub fn to_entity_of(&self, parent: Option<&Sdn>) -> Entity<Self> {
        let text = [
            self.address.as_str(),
            self.city_state_province_postal_code.as_str(),
            self.country.as_str(),
        ]
        .iter()
        .filter_map(|part| non_empty(part))
        .collect::<Vec<_>>()
        .join("\n");

        let mut address = EntityAddress::from(&parse_address(&text));
        if address.country.is_empty() {
            address.country = self.country.trim().to_string();
        }

        let (name, entity_type) = match parent {
            Some(sdn) => (sdn.display_name(), sdn.entity_type()),
            None => (String::new(), EntityType::Business),
        };

        Entity::new(
            name,
            entity_type,
            SourceList::UsOfac,
            self.entity_id.clone(),
            self.clone(),
        )
        .with_addresses(vec![address])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn zawahiri() -> Sdn {
        Sdn {
            entity_id: "2676".to_string(),
            sdn_name: "AL-ZAWAHIRI, Dr. Ayman".to_string(),
            sdn_type: "individual".to_string(),
            programs: vec!["SDGT".to_string(), "SDT".to_string()],
            title: "Operational and Military Leader of JIHAD GROUP".to_string(),
            remarks: "DOB 19 Jun 1951; POB Giza, Egypt; Passport 1084010 (Egypt); alt. Passport 19820215".to_string(),
            ..Sdn::default()
        }
    }

    #[test]
    fn sdn_serializes_with_list_field_names() {
        let value = serde_json::to_value(zawahiri()).expect("serializes");
        assert_eq!(value["entityID"], json!("2676"));
        assert_eq!(value["sdnName"], json!("AL-ZAWAHIRI, Dr. Ayman"));
        assert_eq!(value["grossRegisteredTonnage"], json!(""));
        assert_eq!(value["programs"], json!(["SDGT", "SDT"]));
    }

    #[test]
    fn individuals_are_matched_given_name_first() {
        assert_eq!(zawahiri().name_variants(), vec!["Dr. Ayman AL-ZAWAHIRI"]);
    }

    #[test]
    fn sdn_identifiers_include_remark_documents() {
        assert_eq!(zawahiri().identifiers(), vec!["2676", "1084010"]);
    }

    #[test]
    fn sdn_entity_carries_programs_and_government_ids() {
        let entity = zawahiri().to_entity();
        assert_eq!(entity.entity_type, EntityType::Person);
        assert_eq!(entity.name, "Dr. Ayman AL-ZAWAHIRI");
        assert!(entity.is_consistent());

        let person = entity.person.as_ref().expect("person populated");
        assert_eq!(person.government_ids.len(), 1);
        assert_eq!(person.government_ids[0].identifier, "1084010");

        let sanctions = entity.sanctions_info.as_ref().expect("sanctions populated");
        assert_eq!(sanctions.programs, vec!["SDGT", "SDT"]);
    }

    #[test]
    fn vessels_keep_registration_details() {
        let sdn = Sdn {
            entity_id: "15036".to_string(),
            sdn_name: "ARTAVIL".to_string(),
            sdn_type: "vessel".to_string(),
            call_sign: "9HMR9".to_string(),
            vessel_type: "Crude Oil Tanker".to_string(),
            vessel_flag: "Malta".to_string(),
            tonnage: "-0-".to_string(),
            ..Sdn::default()
        };

        let entity = sdn.to_entity();
        let vessel = entity.vessel.as_ref().expect("vessel populated");
        assert_eq!(vessel.call_sign.as_deref(), Some("9HMR9"));
        assert_eq!(vessel.flag.as_deref(), Some("Malta"));
        assert!(vessel.tonnage.is_none());
    }

    #[test]
    fn untyped_sdns_are_businesses() {
        let sdn = Sdn {
            entity_id: "2831".to_string(),
            sdn_name: "MIDCO FINANCE S.A.".to_string(),
            ..Sdn::default()
        };
        assert_eq!(sdn.to_entity().entity_type, EntityType::Business);
    }

    #[test]
    fn attached_records_take_the_parent_entity_type() {
        let alias = AlternateIdentity {
            entity_id: "2676".to_string(),
            alternate_id: "1".to_string(),
            alternate_type: "a.k.a.".to_string(),
            alternate_name: "AL-ZAWAHIRI, Ayman".to_string(),
            ..AlternateIdentity::default()
        };
        let entity = alias.to_entity_of(Some(&zawahiri()));
        assert_eq!(entity.entity_type, EntityType::Person);
        assert!(entity.is_consistent());

        let address = Address {
            entity_id: "2676".to_string(),
            address_id: "7".to_string(),
            country: "Egypt".to_string(),
            ..Address::default()
        };
        let entity = address.to_entity_of(Some(&zawahiri()));
        assert_eq!(entity.entity_type, EntityType::Person);
        assert_eq!(entity.name, "Dr. Ayman AL-ZAWAHIRI");

        let orphan = serde_json::to_value(address.to_entity()).expect("serializes");
        assert_eq!(orphan["entityType"], json!("business"));
        assert_eq!(
            serde_json::to_value(alias.to_entity()).expect("serializes")["entityType"],
            json!("business")
        );
    }

    #[test]
    fn addresses_expose_their_columns_for_matching() {
        let address = Address {
            entity_id: "173".to_string(),
            address_id: "129".to_string(),
            address: "Ibex House, The Minories".to_string(),
            city_state_province_postal_code: "London EC3N 1DY".to_string(),
            country: "United Kingdom".to_string(),
        };

        let fields = address.address_fields().expect("address present");
        assert_eq!(fields.street, "Ibex House, The Minories");
        assert!(address.name_variants().is_empty());

        let entity = address.to_entity();
        let rendered = entity.addresses.as_ref().expect("address populated");
        assert_eq!(rendered[0].city, "London");
        assert_eq!(rendered[0].postal_code, "EC3N 1DY");
        assert_eq!(rendered[0].country, "United Kingdom");
    }
}
