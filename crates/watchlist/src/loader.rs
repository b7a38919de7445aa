//! Source loaders hand the index one complete set of parsed list records per refresh.

use serde::{Deserialize, Deserializer};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::lists::{
    non_empty, split_list, Address, AlternateIdentity, BisEntity, DeniedPerson,
    SectoralSanction, Sdn,
};

/// Every record of every category, as loaded for one refresh cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListData {
    pub sdns: Vec<Sdn>,
    pub alt_names: Vec<AlternateIdentity>,
    pub addresses: Vec<Address>,
    pub sectoral_sanctions: Vec<SectoralSanction>,
    pub denied_persons: Vec<DeniedPerson>,
    pub bis_entities: Vec<BisEntity>,
}

impl ListData {
    pub fn record_count(&self) -> usize {
        self.sdns.len()
            + self.alt_names.len()
            + self.addresses.len()
            + self.sectoral_sanctions.len()
            + self.denied_persons.len()
            + self.bis_entities.len()
    }
}

pub trait SourceLoader: Send + Sync {
    fn load(&self) -> Result<ListData, LoaderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid list data in {}: {source}", path.display())]
    Csv { path: PathBuf, source: csv::Error },
    #[error("required list file {} is missing", .0.display())]
    MissingFile(PathBuf),
}

/// Serves a fixed, in-memory set of records.
#[derive(Debug, Clone, Default)]
pub struct StaticLoader {
    data: ListData,
}

impl StaticLoader {
    pub fn new(data: ListData) -> Self {
        Self { data }
    }
}

impl SourceLoader for StaticLoader {
    fn load(&self) -> Result<ListData, LoaderError> {
        Ok(self.data.clone())
    }
}

pub const SDN_FILE: &str = "sdn.csv";
pub const ALT_FILE: &str = "alt.csv";
pub const ADDRESS_FILE: &str = "add.csv";
pub const DPL_FILE: &str = "dpl.txt";
pub const CSL_FILE: &str = "csl.csv";

/// Reads list files previously downloaded into one directory.
///
/// `sdn.csv` must exist; every other file is optional and yields an empty category
/// when absent.
#[derive(Debug, Clone)]
pub struct CsvDirectoryLoader {
    dir: PathBuf,
}

impl CsvDirectoryLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read_required<T>(
        &self,
        name: &str,
        parse: fn(BufReader<File>) -> Result<T, csv::Error>,
    ) -> Result<T, LoaderError> {
        let path = self.dir.join(name);
        if !path.is_file() {
            return Err(LoaderError::MissingFile(path));
        }
        read_file(path, parse)
    }

    fn read_optional<T: Default>(
        &self,
        name: &str,
        parse: fn(BufReader<File>) -> Result<T, csv::Error>,
    ) -> Result<T, LoaderError> {
        let path = self.dir.join(name);
        if !path.is_file() {
            debug!(file = %path.display(), "optional list file not present");
            return Ok(T::default());
        }
        read_file(path, parse)
    }
}

impl SourceLoader for CsvDirectoryLoader {
    fn load(&self) -> Result<ListData, LoaderError> {
        let sdns = self.read_required(SDN_FILE, read_sdns)?;
        let alt_names = self.read_optional(ALT_FILE, read_alternate_identities)?;
        let addresses = self.read_optional(ADDRESS_FILE, read_addresses)?;
        let denied_persons = self.read_optional(DPL_FILE, read_denied_persons)?;
        let (sectoral_sanctions, bis_entities) =
            self.read_optional(CSL_FILE, read_consolidated_list)?;

        let data = ListData {
            sdns,
            alt_names,
            addresses,
            sectoral_sanctions,
            denied_persons,
            bis_entities,
        };
        info!(
            dir = %self.dir.display(),
            records = data.record_count(),
            "loaded screening lists"
        );
        Ok(data)
    }
}

fn read_file<T>(
    path: PathBuf,
    parse: fn(BufReader<File>) -> Result<T, csv::Error>,
) -> Result<T, LoaderError> {
    let file = File::open(&path).map_err(|source| LoaderError::Io {
        path: path.clone(),
        source,
    })?;
    parse(BufReader::new(file)).map_err(|source| LoaderError::Csv { path, source })
}

fn ofac_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn ofac_field(record: &csv::StringRecord, index: usize) -> String {
    record
        .get(index)
        .and_then(non_empty)
        .unwrap_or_default()
}

// OFAC exports end with a DOS end-of-file byte and sometimes blank rows.
fn is_ofac_row(record: &csv::StringRecord, columns: usize) -> bool {
    record.len() >= columns
        && record
            .get(0)
            .map(|id| !id.trim().is_empty() && !id.contains('\u{1a}'))
            .unwrap_or(false)
}

/// Program cells look like `SDGT] [IRGC`; multiple programs may also be `;` separated.
fn split_programs(raw: &str) -> Vec<String> {
    let cleaned = raw.replace("] [", ";").replace(['[', ']'], "");
    split_list(&cleaned)
}

/// Parses the headerless OFAC `sdn.csv`.
pub fn read_sdns<R: Read>(reader: R) -> Result<Vec<Sdn>, csv::Error> {
    let mut sdns = Vec::new();
    for row in ofac_reader(reader).records() {
        let row = row?;
        if !is_ofac_row(&row, 12) {
            continue;
        }
        sdns.push(Sdn {
            entity_id: ofac_field(&row, 0),
            sdn_name: ofac_field(&row, 1),
            sdn_type: ofac_field(&row, 2),
            programs: split_programs(&ofac_field(&row, 3)),
            title: ofac_field(&row, 4),
            call_sign: ofac_field(&row, 5),
            vessel_type: ofac_field(&row, 6),
            tonnage: ofac_field(&row, 7),
            gross_registered_tonnage: ofac_field(&row, 8),
            vessel_flag: ofac_field(&row, 9),
            vessel_owner: ofac_field(&row, 10),
            remarks: ofac_field(&row, 11),
        });
    }
    Ok(sdns)
}

/// Parses the headerless OFAC `alt.csv`.
pub fn read_alternate_identities<R: Read>(
    reader: R,
) -> Result<Vec<AlternateIdentity>, csv::Error> {
    let mut alts = Vec::new();
    for row in ofac_reader(reader).records() {
        let row = row?;
        if !is_ofac_row(&row, 4) {
            continue;
        }
        alts.push(AlternateIdentity {
            entity_id: ofac_field(&row, 0),
            alternate_id: ofac_field(&row, 1),
            alternate_type: ofac_field(&row, 2),
            alternate_name: ofac_field(&row, 3),
            alternate_remarks: ofac_field(&row, 4),
        });
    }
    Ok(alts)
}

/// Parses the headerless OFAC `add.csv`.
pub fn read_addresses<R: Read>(reader: R) -> Result<Vec<Address>, csv::Error> {
    let mut addresses = Vec::new();
    for row in ofac_reader(reader).records() {
        let row = row?;
        if !is_ofac_row(&row, 5) {
            continue;
        }
        addresses.push(Address {
            entity_id: ofac_field(&row, 0),
            address_id: ofac_field(&row, 1),
            address: ofac_field(&row, 2),
            city_state_province_postal_code: ofac_field(&row, 3),
            country: ofac_field(&row, 4),
        });
    }
    Ok(addresses)
}

#[derive(Debug, Deserialize)]
struct DplRow {
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "Street_Address", default)]
    street_address: String,
    #[serde(rename = "City", default)]
    city: String,
    #[serde(rename = "State", default)]
    state: String,
    #[serde(rename = "Country", default)]
    country: String,
    #[serde(rename = "Postal_Code", default)]
    postal_code: String,
    #[serde(rename = "Effective_Date", default)]
    effective_date: String,
    #[serde(rename = "Expiration_Date", default)]
    expiration_date: String,
    #[serde(rename = "Standard_Order", default)]
    standard_order: String,
    #[serde(rename = "Last_Update", default)]
    last_update: String,
    #[serde(rename = "Action", default)]
    action: String,
    #[serde(rename = "FR_Citation", default)]
    fr_citation: String,
}

impl From<DplRow> for DeniedPerson {
    fn from(row: DplRow) -> Self {
        Self {
            name: row.name,
            street_address: row.street_address,
            city: row.city,
            state: row.state,
            country: row.country,
            postal_code: row.postal_code,
            effective_date: row.effective_date,
            expiration_date: row.expiration_date,
            standard_order: row.standard_order,
            last_update: row.last_update,
            action: row.action,
            fr_citation: row.fr_citation,
        }
    }
}

/// Parses the tab-separated Denied Persons List, header row included.
pub fn read_denied_persons<R: Read>(reader: R) -> Result<Vec<DeniedPerson>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut persons = Vec::new();
    for row in csv_reader.deserialize::<DplRow>() {
        let row = row?;
        if row.name.trim().is_empty() {
            continue;
        }
        persons.push(row.into());
    }
    Ok(persons)
}

#[derive(Debug, Deserialize)]
struct CslRow {
    #[serde(default)]
    source: String,
    #[serde(default)]
    entity_number: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default, deserialize_with = "semicolon_list")]
    programs: Vec<String>,
    #[serde(default)]
    name: String,
    #[serde(default, deserialize_with = "semicolon_list")]
    addresses: Vec<String>,
    #[serde(default)]
    federal_register_notice: String,
    #[serde(default)]
    start_date: String,
    #[serde(default)]
    license_requirement: String,
    #[serde(default)]
    license_policy: String,
    #[serde(default, deserialize_with = "semicolon_list")]
    remarks: Vec<String>,
    #[serde(default)]
    source_list_url: String,
    #[serde(default, deserialize_with = "semicolon_list")]
    alt_names: Vec<String>,
    #[serde(default)]
    source_information_url: String,
    #[serde(default, deserialize_with = "semicolon_list")]
    ids: Vec<String>,
}

fn semicolon_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().map(split_list).unwrap_or_default())
}

enum CslSource {
    SectoralSanctions,
    EntityList,
    Other,
}

impl CslSource {
    fn classify(source: &str) -> Self {
        if source.contains("(SSI)") {
            Self::SectoralSanctions
        } else if source.contains("(EL)") {
            Self::EntityList
        } else {
            Self::Other
        }
    }
}

/// Parses the Consolidated Screening List, keeping the Sectoral Sanctions and Entity
/// List rows. Rows from the other bundled lists are skipped.
pub fn read_consolidated_list<R: Read>(
    reader: R,
) -> Result<(Vec<SectoralSanction>, Vec<BisEntity>), csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut sanctions = Vec::new();
    let mut entities = Vec::new();
    let mut skipped = 0usize;

    for row in csv_reader.deserialize::<CslRow>() {
        let row = row?;
        match CslSource::classify(&row.source) {
            CslSource::SectoralSanctions => sanctions.push(SectoralSanction {
                entity_id: row.entity_number,
                kind: row.kind,
                programs: row.programs,
                name: row.name,
                addresses: row.addresses,
                remarks: row.remarks,
                alternate_names: row.alt_names,
                ids: row.ids,
                source_list_url: row.source_list_url,
                source_info_url: row.source_information_url,
            }),
            CslSource::EntityList => entities.push(BisEntity {
                name: row.name,
                alternate_names: row.alt_names,
                addresses: row.addresses,
                start_date: row.start_date,
                license_requirement: row.license_requirement,
                license_policy: row.license_policy,
                fr_notice: row.federal_register_notice,
                source_list_url: row.source_list_url,
                source_info_url: row.source_information_url,
            }),
            CslSource::Other => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!(skipped, "ignored consolidated list rows from other sources");
    }
    Ok((sanctions, entities))
}
