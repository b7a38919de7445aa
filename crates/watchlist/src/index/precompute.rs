use rayon::prelude::*;
use rayon::ThreadPool;

use super::SnapshotError;
use crate::lists::ScreenedRecord;
use crate::normalize::{normalize, tokenize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameVariant {
    pub normalized: String,
    pub tokens: Vec<String>,
}

impl NameVariant {
    fn new(raw: &str) -> Option<Self> {
        let tokens = tokenize(raw);
        if tokens.is_empty() {
            return None;
        }
        Some(Self {
            normalized: tokens.join(" "),
            tokens,
        })
    }
}

/// Normalized address fields; an empty vector means the record has no such field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressTokens {
    pub street: Vec<String>,
    pub city_state: Vec<String>,
    pub country: Vec<String>,
}

/// A list record together with everything derived from it for matching.
#[derive(Debug, Clone)]
pub struct PrecomputedRecord<T> {
    record: T,
    key: String,
    primary_name: String,
    names: Vec<NameVariant>,
    identifiers: Vec<String>,
    address: Option<AddressTokens>,
}

impl<T: ScreenedRecord> PrecomputedRecord<T> {
    /// Normalizes every comparable field of `record` once.
    pub fn build(record: T) -> Result<Self, SnapshotError> {
        let raw_names = record.name_variants();

        if T::HAS_ENTITY_ID && record.entity_id().trim().is_empty() {
            return Err(SnapshotError::MissingEntityId {
                category: T::CATEGORY,
                record: raw_names.first().cloned().unwrap_or_default(),
            });
        }

        let mut names: Vec<NameVariant> = Vec::with_capacity(raw_names.len());
        for variant in raw_names.iter().filter_map(|raw| NameVariant::new(raw)) {
            if !names.contains(&variant) {
                names.push(variant);
            }
        }

        if T::NAME_BEARING && names.is_empty() {
            return Err(SnapshotError::MissingNames {
                category: T::CATEGORY,
                record: record.record_key(),
            });
        }

        let address = record.address_fields().map(|fields| AddressTokens {
            street: tokenize(&fields.street),
            city_state: tokenize(&fields.city_state),
            country: tokenize(&fields.country),
        });

        let primary_name = names
            .first()
            .map(|variant| variant.normalized.clone())
            .unwrap_or_default();

        Ok(Self {
            key: record.record_key(),
            identifiers: record.identifiers(),
            primary_name,
            names,
            address,
            record,
        })
    }
}

impl<T> PrecomputedRecord<T> {
    pub fn record(&self) -> &T {
        &self.record
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn primary_name(&self) -> &str {
        &self.primary_name
    }

    pub fn names(&self) -> &[NameVariant] {
        &self.names
    }

    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    pub fn address(&self) -> Option<&AddressTokens> {
        self.address.as_ref()
    }
}

/// Builds every record on `pool`, keeping input order. One bad record rejects the batch.
pub fn precompute_all<T: ScreenedRecord>(
    records: Vec<T>,
    pool: &ThreadPool,
) -> Result<Vec<PrecomputedRecord<T>>, SnapshotError> {
    pool.install(|| {
        records
            .into_par_iter()
            .map(PrecomputedRecord::build)
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lists::{Address, AlternateIdentity, Category, DeniedPerson, Sdn};

    fn pool() -> ThreadPool {
        rayon::ThreadPoolBuilder::new()
            .num_threads(2)
            .build()
            .expect("pool builds")
    }

    #[test]
    fn sdn_names_are_reordered_and_normalized() {
        let record = PrecomputedRecord::build(Sdn {
            entity_id: "2676".to_string(),
            sdn_name: "AL-ZAWAHIRI, Dr. Ayman".to_string(),
            sdn_type: "individual".to_string(),
            remarks: "Passport 1084010 (Egypt)".to_string(),
            ..Sdn::default()
        })
        .expect("record builds");

        assert_eq!(record.primary_name(), "dr ayman al zawahiri");
        assert_eq!(record.names()[0].tokens, vec!["dr", "ayman", "al", "zawahiri"]);
        assert_eq!(record.identifiers(), ["2676", "1084010"]);
        assert_eq!(record.key(), "2676");
        assert!(record.address().is_none());
    }

    #[test]
    fn duplicate_variants_collapse() {
        let record = PrecomputedRecord::build(crate::lists::SectoralSanction {
            entity_id: "1".to_string(),
            name: "Acme, LLC".to_string(),
            alternate_names: vec!["ACME LLC".to_string(), "Acme Trading".to_string()],
            ..Default::default()
        })
        .expect("record builds");

        let normalized: Vec<_> = record.names().iter().map(|n| n.normalized.as_str()).collect();
        assert_eq!(normalized, vec!["acme llc", "acme trading"]);
    }

    #[test]
    fn addresses_carry_field_tokens() {
        let record = PrecomputedRecord::build(Address {
            entity_id: "173".to_string(),
            address_id: "129".to_string(),
            address: "Ibex House, The Minories".to_string(),
            city_state_province_postal_code: "London EC3N 1DY".to_string(),
            country: "United Kingdom".to_string(),
        })
        .expect("address builds without a name");

        let tokens = record.address().expect("address tokens");
        assert_eq!(tokens.street, vec!["ibex", "house", "the", "minories"]);
        assert_eq!(tokens.city_state, vec!["london", "ec3n", "1dy"]);
        assert_eq!(tokens.country, vec!["united", "kingdom"]);
    }

    #[test]
    fn missing_entity_id_is_rejected() {
        let error = PrecomputedRecord::build(AlternateIdentity {
            alternate_name: "NAIF HAWATMEH".to_string(),
            ..AlternateIdentity::default()
        })
        .expect_err("entity ID is required");

        match error {
            SnapshotError::MissingEntityId { category, record } => {
                assert_eq!(category, Category::AltName);
                assert_eq!(record, "NAIF HAWATMEH");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unnamed_records_are_rejected() {
        let error = PrecomputedRecord::build(DeniedPerson {
            name: " -- ".to_string(),
            street_address: "P.O. BOX 28360".to_string(),
            ..DeniedPerson::default()
        })
        .expect_err("a name is required");
        assert!(matches!(error, SnapshotError::MissingNames { .. }));
    }

    #[test]
    fn batch_keeps_order_and_fails_as_a_whole() {
        let records: Vec<Sdn> = (1..=50)
            .map(|id| Sdn {
                entity_id: id.to_string(),
                sdn_name: format!("ENTITY {id}"),
                ..Sdn::default()
            })
            .collect();

        let built = precompute_all(records.clone(), &pool()).expect("batch builds");
        let keys: Vec<_> = built.iter().map(|r| r.key().to_string()).collect();
        let expected: Vec<_> = (1..=50).map(|id| id.to_string()).collect();
        assert_eq!(keys, expected);

        let mut broken = records;
        broken[17].entity_id.clear();
        assert!(precompute_all(broken, &pool()).is_err());
    }
}
