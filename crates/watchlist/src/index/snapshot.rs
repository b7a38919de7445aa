use chrono::{DateTime, Utc};
use rayon::ThreadPoolBuilder;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;
use tracing::info;

use super::precompute::{precompute_all, PrecomputedRecord};
use super::SnapshotError;
use crate::lists::{Address, AlternateIdentity, BisEntity, DeniedPerson, SectoralSanction, Sdn};
use crate::loader::ListData;

/// One complete, immutable set of precomputed records across every category.
#[derive(Debug)]
pub struct IndexSnapshot {
    generation: u64,
    built_at: DateTime<Utc>,
    sdns: Vec<PrecomputedRecord<Sdn>>,
    sdn_positions: HashMap<String, usize>,
    alt_names: Vec<PrecomputedRecord<AlternateIdentity>>,
    addresses: Vec<PrecomputedRecord<Address>>,
    sectoral_sanctions: Vec<PrecomputedRecord<SectoralSanction>>,
    denied_persons: Vec<PrecomputedRecord<DeniedPerson>>,
    bis_entities: Vec<PrecomputedRecord<BisEntity>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotStats {
    pub generation: u64,
    pub built_at: DateTime<Utc>,
    pub sdns: usize,
    pub alt_names: usize,
    pub addresses: usize,
    pub sectoral_sanctions: usize,
    pub denied_persons: usize,
    pub bis_entities: usize,
}

impl SnapshotStats {
    pub fn total(&self) -> usize {
        self.sdns
            + self.alt_names
            + self.addresses
            + self.sectoral_sanctions
            + self.denied_persons
            + self.bis_entities
    }
}

impl IndexSnapshot {
    pub fn empty() -> Self {
        Self {
            generation: 0,
            built_at: Utc::now(),
            sdns: Vec::new(),
            sdn_positions: HashMap::new(),
            alt_names: Vec::new(),
            addresses: Vec::new(),
            sectoral_sanctions: Vec::new(),
            denied_persons: Vec::new(),
            bis_entities: Vec::new(),
        }
    }

    /// Precomputes `data` on a dedicated pool of `workers` threads.
    pub fn build(data: ListData, workers: usize) -> Result<Self, SnapshotError> {
        let started = Instant::now();
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|index| format!("watchlist-precompute-{index}"))
            .build()?;

        let sdns = precompute_all(data.sdns, &pool)?;
        let sdn_positions = sdns
            .iter()
            .enumerate()
            .map(|(position, record)| (record.record().entity_id.trim().to_string(), position))
            .collect();

        let snapshot = Self {
            generation: 0,
            built_at: Utc::now(),
            sdns,
            sdn_positions,
            alt_names: precompute_all(data.alt_names, &pool)?,
            addresses: precompute_all(data.addresses, &pool)?,
            sectoral_sanctions: precompute_all(data.sectoral_sanctions, &pool)?,
            denied_persons: precompute_all(data.denied_persons, &pool)?,
            bis_entities: precompute_all(data.bis_entities, &pool)?,
        };

        info!(
            records = snapshot.stats().total(),
            workers = pool.current_num_threads(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "index snapshot built"
        );
        Ok(snapshot)
    }

    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn sdns(&self) -> &[PrecomputedRecord<Sdn>] {
        &self.sdns
    }

    /// The SDN entry an alias or address row hangs off.
    pub fn sdn(&self, entity_id: &str) -> Option<&Sdn> {
        let position = *self.sdn_positions.get(entity_id.trim())?;
        self.sdns.get(position).map(PrecomputedRecord::record)
    }

    pub fn alt_names(&self) -> &[PrecomputedRecord<AlternateIdentity>] {
        &self.alt_names
    }

    pub fn addresses(&self) -> &[PrecomputedRecord<Address>] {
        &self.addresses
    }

    pub fn sectoral_sanctions(&self) -> &[PrecomputedRecord<SectoralSanction>] {
        &self.sectoral_sanctions
    }

    pub fn denied_persons(&self) -> &[PrecomputedRecord<DeniedPerson>] {
        &self.denied_persons
    }

    pub fn bis_entities(&self) -> &[PrecomputedRecord<BisEntity>] {
        &self.bis_entities
    }

    pub fn stats(&self) -> SnapshotStats {
        SnapshotStats {
            generation: self.generation,
            built_at: self.built_at,
            sdns: self.sdns.len(),
            alt_names: self.alt_names.len(),
            addresses: self.addresses.len(),
            sectoral_sanctions: self.sectoral_sanctions.len(),
            denied_persons: self.denied_persons.len(),
            bis_entities: self.bis_entities.len(),
        }
    }
}
