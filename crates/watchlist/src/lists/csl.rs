use serde::{Deserialize, Serialize};

use super::{non_empty, AddressFields, Category, ScreenedRecord};
use crate::entity::{Entity, EntityAddress, EntityType, SourceList};
use crate::normalize::address::parse_address;
use crate::normalize::normalize;

/// Sectoral Sanctions Identifications entry from the consolidated screening list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectoralSanction {
    #[serde(rename = "entityID")]
    pub entity_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub programs: Vec<String>,
    pub name: String,
    pub addresses: Vec<String>,
    pub remarks: Vec<String>,
    pub alternate_names: Vec<String>,
    pub ids: Vec<String>,
    #[serde(rename = "sourceListURL")]
    pub source_list_url: String,
    #[serde(rename = "sourceInfoURL")]
    pub source_info_url: String,
}

impl ScreenedRecord for SectoralSanction {
    const CATEGORY: Category = Category::SectoralSanction;

    fn entity_id(&self) -> &str {
        &self.entity_id
    }

    fn name_variants(&self) -> Vec<String> {
        name_with_aliases(&self.name, &self.alternate_names)
    }

    fn address_fields(&self) -> Option<AddressFields> {
        first_address_fields(&self.addresses)
    }

    fn identifiers(&self) -> Vec<String> {
        let mut identifiers = Vec::with_capacity(self.ids.len() + 1);
        for id in std::iter::once(&self.entity_id).chain(self.ids.iter()) {
            let id = id.trim();
            if !id.is_empty() && !identifiers.iter().any(|known: &String| known == id) {
                identifiers.push(id.to_string());
            }
        }
        identifiers
    }

    fn to_entity(&self) -> Entity<Self> {
        let entity_type = match EntityType::from_list_type(&self.kind) {
            EntityType::Unknown => EntityType::Business,
            known => known,
        };
        let description = non_empty(&self.remarks.join("; "));

        Entity::new(
            self.name.trim(),
            entity_type,
            SourceList::UsCsl,
            self.entity_id.clone(),
            self.clone(),
        )
        .with_alt_names(self.alternate_names.clone())
        .with_addresses(entity_addresses(&self.addresses))
        .with_sanctions(self.programs.clone(), description)
    }
}

/// Entry from the BIS Entity List.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BisEntity {
    pub name: String,
    pub alternate_names: Vec<String>,
    pub addresses: Vec<String>,
    pub start_date: String,
    pub license_requirement: String,
    pub license_policy: String,
    pub fr_notice: String,
    #[serde(rename = "sourceListURL")]
    pub source_list_url: String,
    #[serde(rename = "sourceInfoURL")]
    pub source_info_url: String,
}

impl ScreenedRecord for BisEntity {
    const CATEGORY: Category = Category::BisEntity;
    const HAS_ENTITY_ID: bool = false;

    fn entity_id(&self) -> &str {
        ""
    }

    fn record_key(&self) -> String {
        let address = self.addresses.first().map(String::as_str).unwrap_or("");
        format!("{} {}", normalize(&self.name), normalize(address))
            .trim()
            .to_string()
    }

    fn name_variants(&self) -> Vec<String> {
        name_with_aliases(&self.name, &self.alternate_names)
    }

    fn address_fields(&self) -> Option<AddressFields> {
        first_address_fields(&self.addresses)
    }

    fn to_entity(&self) -> Entity<Self> {
        Entity::new(
            self.name.trim(),
            EntityType::Business,
            SourceList::UsCsl,
            "",
            self.clone(),
        )
        .with_alt_names(self.alternate_names.clone())
        .with_addresses(entity_addresses(&self.addresses))
        .with_sanctions(Vec::new(), non_empty(&self.license_requirement))
    }
}

fn name_with_aliases(name: &str, aliases: &[String]) -> Vec<String> {
    std::iter::once(name)
        .chain(aliases.iter().map(String::as_str))
        .map(str::trim)
        .filter(|variant| !variant.is_empty())
        .map(str::to_string)
        .collect()
}

fn first_address_fields(addresses: &[String]) -> Option<AddressFields> {
    let parsed = parse_address(addresses.first()?);
    let fields = AddressFields {
        street: parsed.street(),
        city_state: parsed.city_state(),
        country: parsed.country,
    };
    (!fields.is_empty()).then_some(fields)
}

fn entity_addresses(addresses: &[String]) -> Vec<EntityAddress> {
    addresses
        .iter()
        .map(|raw| parse_address(raw))
        .filter(|parsed| !parsed.is_empty())
        .map(|parsed| EntityAddress::from(&parsed))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ssi() -> SectoralSanction {
        SectoralSanction {
            entity_id: "18736".to_string(),
            kind: "Entity".to_string(),
            programs: vec!["UKRAINE-EO13662".to_string(), "SYRIA".to_string()],
            name: "PJSC VERKHNECHONSKNEFTEGAZ".to_string(),
            addresses: vec!["Baikalskaya Street 295, Irkutsk 664050, Russia".to_string()],
            remarks: vec!["For more information on directives, please visit the following link.".to_string()],
            alternate_names: vec!["VERKHNECHONSKNEFTEGAZ".to_string(), "OJSC VERKHNECHONSKNEFTEGAZ".to_string()],
            ids: vec!["1033800918278".to_string(), "18736".to_string()],
            ..SectoralSanction::default()
        }
    }

    #[test]
    fn sectoral_sanctions_match_under_every_alias() {
        assert_eq!(
            ssi().name_variants(),
            vec![
                "PJSC VERKHNECHONSKNEFTEGAZ",
                "VERKHNECHONSKNEFTEGAZ",
                "OJSC VERKHNECHONSKNEFTEGAZ"
            ]
        );
        assert_eq!(ssi().identifiers(), vec!["18736", "1033800918278"]);
    }

    #[test]
    fn sectoral_sanction_json_uses_list_field_names() {
        let value = serde_json::to_value(ssi()).expect("serializes");
        assert_eq!(value["entityID"], json!("18736"));
        assert_eq!(value["type"], json!("Entity"));
        assert_eq!(value["sourceListURL"], json!(""));
    }

    #[test]
    fn first_address_is_structured_for_matching() {
        let fields = ssi().address_fields().expect("address present");
        assert_eq!(fields.country, "Russia");
        assert_eq!(fields.city_state, "Irkutsk 664050");
    }

    #[test]
    fn entity_list_records_key_on_name_and_address() {
        let entity = BisEntity {
            name: "Luqman Yasin Yunus Shgragi".to_string(),
            addresses: vec!["Savcili Mahalesi Turkmenler Caddesi No:2, Sahinbey, Gaziantep, TR".to_string()],
            license_requirement: "For all items subject to the EAR.".to_string(),
            ..BisEntity::default()
        };

        assert_eq!(entity.entity_id(), "");
        assert!(entity.identifiers().is_empty());
        assert!(entity.record_key().starts_with("luqman yasin yunus shgragi savcili"));

        let envelope = entity.to_entity();
        assert_eq!(envelope.source_list, SourceList::UsCsl);
        assert_eq!(envelope.entity_type, EntityType::Business);
        assert!(envelope.is_consistent());
    }
}
