use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::query::{QueryError, SearchQuery};
use crate::config::ScreeningConfig;
use crate::entity::Entity;
use crate::index::{AddressTokens, IndexSnapshot, PrecomputedRecord};
use crate::lists::{
    Address, AlternateIdentity, BisEntity, DeniedPerson, ScreenedRecord, SectoralSanction, Sdn,
};
use crate::normalize::tokenize;
use crate::observer::{MatchEvent, MatchObserver};
use crate::similarity::{
    address_composite, address_coverage_score, address_field_score, name_address_composite,
    name_score,
};

/// Candidates scanned between two deadline checks.
pub const DEADLINE_CHECK_INTERVAL: usize = 4096;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error("search did not finish before its deadline")]
    DeadlineExceeded,
}

/// Defaults applied to queries that leave limit or threshold unset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchSettings {
    pub default_limit: usize,
    pub max_limit: usize,
    pub min_match: f64,
    pub timeout: Duration,
}

impl From<&ScreeningConfig> for SearchSettings {
    fn from(config: &ScreeningConfig) -> Self {
        Self {
            default_limit: config.default_limit,
            max_limit: config.max_limit,
            min_match: config.min_match,
            timeout: config.query_timeout,
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self::from(&ScreeningConfig::default())
    }
}

/// One scored record. Borrows from the snapshot it was found in.
#[derive(Debug, Clone)]
pub struct MatchResult<'s, T> {
    pub score: f64,
    pub record: &'s PrecomputedRecord<T>,
    /// Normalized name variant that produced the score.
    pub matched_name: Option<&'s str>,
}

impl<T> MatchResult<'_, T> {
    pub fn rounded_score(&self) -> f64 {
        round_score(self.score)
    }
}

/// Scores are reported with five decimals.
pub fn round_score(score: f64) -> f64 {
    (score * 100_000.0).round() / 100_000.0
}

impl<T: Serialize> Serialize for MatchResult<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Row<'a, R> {
            #[serde(flatten)]
            record: &'a R,
            #[serde(rename = "match")]
            score: f64,
            #[serde(rename = "matchedName", skip_serializing_if = "Option::is_none")]
            matched_name: Option<&'a str>,
        }

        Row {
            record: self.record.record(),
            score: self.rounded_score(),
            matched_name: self.matched_name,
        }
        .serialize(serializer)
    }
}

/// Ranked matches per category. `None` marks a category the query did not cover.
#[derive(Debug, Default, Serialize)]
pub struct SearchResults<'s> {
    #[serde(rename = "SDNs", skip_serializing_if = "Option::is_none")]
    pub sdns: Option<Vec<MatchResult<'s, Sdn>>>,
    #[serde(rename = "altNames", skip_serializing_if = "Option::is_none")]
    pub alt_names: Option<Vec<MatchResult<'s, AlternateIdentity>>>,
    #[serde(rename = "addresses", skip_serializing_if = "Option::is_none")]
    pub addresses: Option<Vec<MatchResult<'s, Address>>>,
    #[serde(rename = "sectoralSanctions", skip_serializing_if = "Option::is_none")]
    pub sectoral_sanctions: Option<Vec<MatchResult<'s, SectoralSanction>>>,
    #[serde(rename = "deniedPersons", skip_serializing_if = "Option::is_none")]
    pub denied_persons: Option<Vec<MatchResult<'s, DeniedPerson>>>,
    #[serde(rename = "bisEntities", skip_serializing_if = "Option::is_none")]
    pub bis_entities: Option<Vec<MatchResult<'s, BisEntity>>>,
    #[serde(skip)]
    pub generation: u64,
}

/// Matched records lifted into their [`Entity`] envelopes.
#[derive(Debug, Default, Serialize)]
pub struct EntityMatches {
    #[serde(rename = "SDNs", skip_serializing_if = "Option::is_none")]
    pub sdns: Option<Vec<Entity<Sdn>>>,
    #[serde(rename = "altNames", skip_serializing_if = "Option::is_none")]
    pub alt_names: Option<Vec<Entity<AlternateIdentity>>>,
    #[serde(rename = "addresses", skip_serializing_if = "Option::is_none")]
    pub addresses: Option<Vec<Entity<Address>>>,
    #[serde(rename = "sectoralSanctions", skip_serializing_if = "Option::is_none")]
    pub sectoral_sanctions: Option<Vec<Entity<SectoralSanction>>>,
    #[serde(rename = "deniedPersons", skip_serializing_if = "Option::is_none")]
    pub denied_persons: Option<Vec<Entity<DeniedPerson>>>,
    #[serde(rename = "bisEntities", skip_serializing_if = "Option::is_none")]
    pub bis_entities: Option<Vec<Entity<BisEntity>>>,
}

fn entities_of<T: ScreenedRecord>(
    matches: &Option<Vec<MatchResult<'_, T>>>,
) -> Option<Vec<Entity<T>>> {
    matches.as_ref().map(|matches| {
        matches
            .iter()
            .map(|m| m.record.record().to_entity())
            .collect()
    })
}

fn events_of<T: ScreenedRecord>(
    events: &mut Vec<MatchEvent>,
    matches: &Option<Vec<MatchResult<'_, T>>>,
    generation: u64,
) {
    for result in matches.iter().flatten() {
        events.push(MatchEvent {
            category: T::CATEGORY,
            record_key: result.record.key().to_string(),
            score: result.rounded_score(),
            matched_name: result.matched_name.map(str::to_string),
            generation,
        });
    }
}

impl SearchResults<'_> {
    pub fn len(&self) -> usize {
        fn count<T>(matches: &Option<Vec<T>>) -> usize {
            matches.as_ref().map_or(0, Vec::len)
        }
        count(&self.sdns)
            + count(&self.alt_names)
            + count(&self.addresses)
            + count(&self.sectoral_sanctions)
            + count(&self.denied_persons)
            + count(&self.bis_entities)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Envelopes for every match. Alias and address rows are typed after their SDN entry
    /// in `snapshot`.
    pub fn entities(&self, snapshot: &IndexSnapshot) -> EntityMatches {
        EntityMatches {
            sdns: entities_of(&self.sdns),
            alt_names: self.alt_names.as_ref().map(|matches| {
                matches
                    .iter()
                    .map(|m| {
                        let alias = m.record.record();
                        alias.to_entity_of(snapshot.sdn(&alias.entity_id))
                    })
                    .collect()
            }),
            addresses: self.addresses.as_ref().map(|matches| {
                matches
                    .iter()
                    .map(|m| {
                        let address = m.record.record();
                        address.to_entity_of(snapshot.sdn(&address.entity_id))
                    })
                    .collect()
            }),
            sectoral_sanctions: entities_of(&self.sectoral_sanctions),
            denied_persons: entities_of(&self.denied_persons),
            bis_entities: entities_of(&self.bis_entities),
        }
    }

    pub fn events(&self) -> Vec<MatchEvent> {
        let mut events = Vec::with_capacity(self.len());
        events_of(&mut events, &self.sdns, self.generation);
        events_of(&mut events, &self.alt_names, self.generation);
        events_of(&mut events, &self.addresses, self.generation);
        events_of(&mut events, &self.sectoral_sanctions, self.generation);
        events_of(&mut events, &self.denied_persons, self.generation);
        events_of(&mut events, &self.bis_entities, self.generation);
        events
    }
}

/// Orders record keys numerically when both are plain numbers, otherwise as text.
/// Numeric keys sort before textual ones.
pub fn compare_keys(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(left), Ok(right)) => left.cmp(&right).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

struct Clock {
    deadline: Instant,
    visited: usize,
}

impl Clock {
    fn check(&self) -> Result<(), SearchError> {
        if Instant::now() >= self.deadline {
            Err(SearchError::DeadlineExceeded)
        } else {
            Ok(())
        }
    }

    fn tick(&mut self) -> Result<(), SearchError> {
        self.visited += 1;
        if self.visited % DEADLINE_CHECK_INTERVAL == 0 {
            self.check()
        } else {
            Ok(())
        }
    }
}

/// Address fields supplied by the query, tokenized.
struct AddressQuery {
    street: Option<Vec<String>>,
    city: Option<Vec<String>>,
    state: Option<Vec<String>>,
    country: Option<Vec<String>>,
}

impl AddressQuery {
    fn from_query(query: &SearchQuery) -> Option<Self> {
        let street = query.address.as_deref().or(query.q.as_deref());
        let address = Self {
            street: tokens_of(street),
            city: tokens_of(query.city.as_deref()),
            state: tokens_of(query.state.as_deref()),
            country: tokens_of(query.country.as_deref()),
        };
        let supplied = address.street.is_some()
            || address.city.is_some()
            || address.state.is_some()
            || address.country.is_some();
        supplied.then_some(address)
    }

    fn score(&self, candidate: &AddressTokens) -> Option<f64> {
        let mut fields = Vec::with_capacity(4);
        if let Some(street) = &self.street {
            fields.push(address_field_score(street, &candidate.street));
        }
        // City, state and province are all published as one combined column.
        if let Some(city) = &self.city {
            fields.push(address_coverage_score(city, &candidate.city_state));
        }
        if let Some(state) = &self.state {
            fields.push(address_coverage_score(state, &candidate.city_state));
        }
        if let Some(country) = &self.country {
            fields.push(address_coverage_score(country, &candidate.country));
        }
        address_composite(&fields)
    }
}

fn tokens_of(text: Option<&str>) -> Option<Vec<String>> {
    text.map(tokenize).filter(|tokens| !tokens.is_empty())
}

struct Plan<'q> {
    id: Option<&'q str>,
    name: Option<Vec<String>>,
    alt_name: Option<Vec<String>>,
    address: Option<AddressQuery>,
    limit: usize,
    min_match: f64,
}

impl<'q> Plan<'q> {
    fn new(query: &'q SearchQuery, settings: &SearchSettings) -> Self {
        let limit = query
            .limit
            .unwrap_or(settings.default_limit)
            .min(settings.max_limit)
            .max(1);

        Self {
            id: query.id.as_deref(),
            name: tokens_of(query.name.as_deref().or(query.q.as_deref())),
            alt_name: tokens_of(query.alt_name.as_deref()),
            address: AddressQuery::from_query(query),
            limit,
            min_match: query.min_match.unwrap_or(settings.min_match),
        }
    }

    /// Boosts a name score with the address the record itself carries. Used for lists
    /// that publish addresses inline rather than in a separate address file.
    fn with_inline_address<'s, T>(
        &self,
        record: &'s PrecomputedRecord<T>,
        scored: Scored<'s>,
    ) -> Scored<'s> {
        let (name, matched) = scored?;
        let address = self
            .address
            .as_ref()
            .zip(record.address())
            .and_then(|(query, candidate)| query.score(candidate));
        match address {
            Some(address) => Some((name_address_composite(name, address), matched)),
            None => Some((name, matched)),
        }
    }

    /// Drops candidates under the threshold, sorts the rest and only then truncates.
    fn rank<'s, T>(&self, mut matches: Vec<MatchResult<'s, T>>) -> Vec<MatchResult<'s, T>> {
        matches.retain(|candidate| candidate.score >= self.min_match);
        matches.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| compare_keys(a.record.key(), b.record.key()))
        });
        matches.truncate(self.limit);
        matches
    }
}

type Scored<'s> = Option<(f64, Option<&'s str>)>;

fn scan<'s, T, F>(
    records: &'s [PrecomputedRecord<T>],
    clock: &mut Clock,
    mut score: F,
) -> Result<Vec<MatchResult<'s, T>>, SearchError>
where
    F: FnMut(&'s PrecomputedRecord<T>) -> Scored<'s>,
{
    let mut matches = Vec::new();
    for record in records {
        clock.tick()?;
        if let Some((score, matched_name)) = score(record) {
            matches.push(MatchResult {
                score: score.clamp(0.0, 1.0),
                record,
                matched_name,
            });
        }
    }
    Ok(matches)
}

fn best_name<'s, T>(tokens: &[String], record: &'s PrecomputedRecord<T>) -> Scored<'s> {
    let mut best: Option<(f64, &'s str)> = None;
    for variant in record.names() {
        let score = name_score(tokens, &variant.tokens);
        if best.map_or(true, |(current, _)| score > current) {
            best = Some((score, variant.normalized.as_str()));
        }
    }
    best.map(|(score, name)| (score, Some(name)))
}

/// Scores queries against a snapshot.
#[derive(Clone, Default)]
pub struct Evaluator {
    settings: SearchSettings,
    observer: Option<Arc<dyn MatchObserver>>,
}

impl std::fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator")
            .field("settings", &self.settings)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl Evaluator {
    pub fn new(settings: SearchSettings) -> Self {
        Self {
            settings,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn MatchObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Deadline for a query starting now.
    pub fn deadline(&self) -> Instant {
        Instant::now() + self.settings.timeout
    }

    pub fn evaluate<'s>(
        &self,
        query: &SearchQuery,
        snapshot: &'s IndexSnapshot,
        deadline: Instant,
    ) -> Result<SearchResults<'s>, SearchError> {
        query.validate()?;
        let started = Instant::now();
        let plan = Plan::new(query, &self.settings);
        let mut clock = Clock {
            deadline,
            visited: 0,
        };
        clock.check()?;

        let mut results = SearchResults {
            generation: snapshot.generation(),
            ..SearchResults::default()
        };

        if let Some(id) = plan.id {
            // ID lookups are exact and cover primary records only.
            let matches = scan(snapshot.sdns(), &mut clock, |record| {
                record
                    .identifiers()
                    .iter()
                    .any(|known| known == id)
                    .then_some((1.0, None))
            })?;
            results.sdns = Some(plan.rank(matches));
        } else {
            self.scan_categories(&plan, snapshot, &mut clock, &mut results)?;
        }

        debug!(
            generation = results.generation,
            matches = results.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "search evaluated"
        );
        self.notify(&results);
        Ok(results)
    }

    fn scan_categories<'s>(
        &self,
        plan: &Plan<'_>,
        snapshot: &'s IndexSnapshot,
        clock: &mut Clock,
        results: &mut SearchResults<'s>,
    ) -> Result<(), SearchError> {
        let mut best_address: HashMap<&'s str, f64> = HashMap::new();

        if let Some(address) = plan.address.as_ref() {
            let matches = scan(snapshot.addresses(), clock, |record| {
                let score = address.score(record.address()?)?;
                Some((score, None))
            })?;
            for candidate in &matches {
                let entity = candidate.record.record().entity_id();
                let best = best_address.entry(entity).or_insert(0.0);
                if candidate.score > *best {
                    *best = candidate.score;
                }
            }
            results.addresses = Some(plan.rank(matches));
            clock.check()?;
        }

        let boosted = |entity_id: &str, score: f64| match best_address.get(entity_id) {
            Some(address) => name_address_composite(score, *address),
            None => score,
        };

        if let Some(tokens) = plan.name.as_deref() {
            let matches = scan(snapshot.sdns(), clock, |record| {
                let (score, matched) = best_name(tokens, record)?;
                Some((boosted(record.record().entity_id(), score), matched))
            })?;
            results.sdns = Some(plan.rank(matches));
            clock.check()?;
        }

        if let Some(tokens) = plan.alt_name.as_deref().or(plan.name.as_deref()) {
            let matches = scan(snapshot.alt_names(), clock, |record| {
                let (score, matched) = best_name(tokens, record)?;
                Some((boosted(record.record().entity_id(), score), matched))
            })?;
            results.alt_names = Some(plan.rank(matches));
            clock.check()?;
        }

        if let Some(tokens) = plan.name.as_deref() {
            let matches = scan(snapshot.sectoral_sanctions(), clock, |record| {
                plan.with_inline_address(record, best_name(tokens, record))
            })?;
            results.sectoral_sanctions = Some(plan.rank(matches));
            clock.check()?;

            let matches = scan(snapshot.denied_persons(), clock, |record| {
                plan.with_inline_address(record, best_name(tokens, record))
            })?;
            results.denied_persons = Some(plan.rank(matches));
            clock.check()?;

            let matches = scan(snapshot.bis_entities(), clock, |record| {
                plan.with_inline_address(record, best_name(tokens, record))
            })?;
            results.bis_entities = Some(plan.rank(matches));
        }

        Ok(())
    }

    fn notify(&self, results: &SearchResults<'_>) {
        let Some(observer) = self.observer.as_ref() else {
            return;
        };
        for event in results.events() {
            if let Err(error) = observer.observe(&event) {
                warn!(%error, category = %event.category, record = %event.record_key, "match observer failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityType;
    use crate::lists::Category;
    use crate::loader::ListData;
    use crate::observer::ObserverError;
    use std::sync::Mutex;

    fn snapshot() -> IndexSnapshot {
        let data = ListData {
            sdns: vec![
                Sdn {
                    entity_id: "2831".to_string(),
                    sdn_name: "MIDCO FINANCE S.A.".to_string(),
                    sdn_type: "individual".to_string(),
                    programs: vec!["IRAQ2".to_string()],
                    remarks: "US FEIN CH-660-0-469-982-0 (United States); Switzerland.".to_string(),
                    ..Sdn::default()
                },
                Sdn {
                    entity_id: "306".to_string(),
                    sdn_name: "BANCO NACIONAL DE CUBA".to_string(),
                    ..Sdn::default()
                },
                Sdn {
                    entity_id: "40".to_string(),
                    sdn_name: "MIDCO FINANCE S.A.".to_string(),
                    ..Sdn::default()
                },
            ],
            addresses: vec![
                Address {
                    entity_id: "2831".to_string(),
                    address_id: "1965".to_string(),
                    address: "57 Rue du Rhone".to_string(),
                    city_state_province_postal_code: "Geneva CH-1204".to_string(),
                    country: "Switzerland".to_string(),
                },
                Address {
                    entity_id: "173".to_string(),
                    address_id: "129".to_string(),
                    address: "Ibex House, The Minories".to_string(),
                    city_state_province_postal_code: "London EC3N 1DY".to_string(),
                    country: "United Kingdom".to_string(),
                },
            ],
            ..ListData::default()
        };
        IndexSnapshot::build(data, 1).expect("snapshot builds")
    }

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(30)
    }

    #[test]
    fn empty_query_fails_before_scanning() {
        let error = Evaluator::default()
            .evaluate(&SearchQuery::default(), &snapshot(), far_deadline())
            .expect_err("empty query");
        assert!(matches!(error, SearchError::Query(QueryError::Empty)));
    }

    #[test]
    fn expired_deadline_is_reported() {
        let error = Evaluator::default()
            .evaluate(&SearchQuery::name("midco"), &snapshot(), Instant::now())
            .expect_err("deadline already passed");
        assert!(matches!(error, SearchError::DeadlineExceeded));
    }

    #[test]
    fn id_lookups_are_exact_and_sdn_only() {
        let snapshot = snapshot();
        let query = SearchQuery {
            id: Some("CH-660-0-469-982-0".to_string()),
            name: Some("banco".to_string()),
            ..SearchQuery::default()
        };
        let results = Evaluator::default()
            .evaluate(&query, &snapshot, far_deadline())
            .expect("search runs");

        let sdns = results.sdns.as_ref().expect("sdns in scope");
        assert_eq!(sdns.len(), 1);
        assert_eq!(sdns[0].record.key(), "2831");
        assert_eq!(sdns[0].score, 1.0);
        assert!(sdns[0].matched_name.is_none());
        assert!(results.addresses.is_none());
        assert!(results.alt_names.is_none());

        let miss = SearchQuery {
            id: Some("CH-660".to_string()),
            ..SearchQuery::default()
        };
        let results = Evaluator::default()
            .evaluate(&miss, &snapshot, far_deadline())
            .expect("search runs");
        assert_eq!(results.sdns.map(|m| m.len()), Some(0));
    }

    #[test]
    fn equal_scores_rank_by_numeric_key() {
        let snapshot = snapshot();
        let results = Evaluator::default()
            .evaluate(&SearchQuery::name("midco finance"), &snapshot, far_deadline())
            .expect("search runs");

        let keys: Vec<_> = results
            .sdns
            .as_ref()
            .expect("sdns in scope")
            .iter()
            .map(|m| m.record.key())
            .collect();
        assert_eq!(keys, vec!["40", "2831", "306"]);
    }

    #[test]
    fn weak_addresses_leave_name_scores_alone() {
        let snapshot = snapshot();
        let evaluator = Evaluator::default();
        let name_only = evaluator
            .evaluate(&SearchQuery::name("midco"), &snapshot, far_deadline())
            .expect("search runs");
        let with_country = evaluator
            .evaluate(
                &SearchQuery {
                    country: Some("United Kingdom".to_string()),
                    ..SearchQuery::name("midco")
                },
                &snapshot,
                far_deadline(),
            )
            .expect("search runs");

        let score_of = |results: &SearchResults<'_>| {
            results.sdns.as_ref().expect("sdns in scope")[0].score
        };
        assert_eq!(score_of(&name_only), score_of(&with_country));
        let addresses = with_country.addresses.as_ref().expect("addresses in scope");
        assert_eq!(addresses[0].record.key(), "173");
    }

    #[test]
    fn confirming_address_raises_the_name_score() {
        let snapshot = snapshot();
        let evaluator = Evaluator::default();
        let name_only = evaluator
            .evaluate(&SearchQuery::name("midco"), &snapshot, far_deadline())
            .expect("search runs");
        let with_address = evaluator
            .evaluate(
                &SearchQuery {
                    address: Some("57 Rue du Rhone".to_string()),
                    country: Some("Switzerland".to_string()),
                    ..SearchQuery::name("midco")
                },
                &snapshot,
                far_deadline(),
            )
            .expect("search runs");

        let top = |results: &SearchResults<'_>| {
            let sdns = results.sdns.as_ref().expect("sdns in scope");
            let hit = sdns
                .iter()
                .find(|m| m.record.key() == "2831")
                .expect("2831 returned");
            hit.score
        };
        assert!(top(&with_address) > top(&name_only));
        assert!(top(&with_address) <= 1.0);
    }

    #[test]
    fn inline_addresses_boost_denied_persons() {
        let data = ListData {
            denied_persons: vec![DeniedPerson {
                name: "AL NASER WINGS AIRLINES".to_string(),
                street_address: "P.O. BOX 28360".to_string(),
                city: "DUBAI".to_string(),
                country: "AE".to_string(),
                ..DeniedPerson::default()
            }],
            ..ListData::default()
        };
        let snapshot = IndexSnapshot::build(data, 1).expect("snapshot builds");
        let evaluator = Evaluator::default();
        let score_for = |query: SearchQuery| {
            let results = evaluator
                .evaluate(&query, &snapshot, far_deadline())
                .expect("search runs");
            results.denied_persons.as_ref().expect("denied persons in scope")[0].score
        };

        let name_only = score_for(SearchQuery::name("al naser wings"));
        let confirmed = score_for(SearchQuery {
            city: Some("Dubai".to_string()),
            country: Some("AE".to_string()),
            ..SearchQuery::name("al naser wings")
        });
        let elsewhere = score_for(SearchQuery {
            country: Some("Switzerland".to_string()),
            ..SearchQuery::name("al naser wings")
        });

        assert!(name_only < 1.0);
        assert!(confirmed > name_only, "{confirmed} <= {name_only}");
        assert_eq!(elsewhere, name_only);
    }

    #[test]
    fn a_matching_city_never_lowers_the_address_score() {
        let snapshot = snapshot();
        let evaluator = Evaluator::default();
        let score_for = |query: SearchQuery| {
            let results = evaluator
                .evaluate(&query, &snapshot, far_deadline())
                .expect("search runs");
            let addresses = results.addresses.as_ref().expect("addresses in scope");
            assert_eq!(addresses[0].record.key(), "173");
            addresses[0].score
        };
        let base = SearchQuery {
            address: Some("ibex house".to_string()),
            country: Some("United Kingdom".to_string()),
            ..SearchQuery::default()
        };

        let without_city = score_for(base.clone());
        let with_city = score_for(SearchQuery {
            city: Some("London".to_string()),
            ..base
        });
        assert!(with_city >= without_city, "{with_city} < {without_city}");
    }

    #[test]
    fn threshold_and_limit_apply_after_ranking() {
        let snapshot = snapshot();
        let results = Evaluator::default()
            .evaluate(
                &SearchQuery::name("banco nacional de cuba")
                    .with_limit(1)
                    .with_min_match(0.5),
                &snapshot,
                far_deadline(),
            )
            .expect("search runs");

        let sdns = results.sdns.as_ref().expect("sdns in scope");
        assert_eq!(sdns.len(), 1);
        assert_eq!(sdns[0].record.key(), "306");
        assert_eq!(sdns[0].score, 1.0);
        assert!(results.addresses.is_none());
    }

    #[test]
    fn limit_is_clamped_to_the_maximum() {
        let settings = SearchSettings {
            max_limit: 2,
            ..SearchSettings::default()
        };
        let snap = snapshot();
        let results = Evaluator::new(settings)
            .evaluate(&SearchQuery::name("midco").with_limit(50), &snap, far_deadline())
            .expect("search runs");
        assert_eq!(results.sdns.map(|m| m.len()), Some(2));
    }

    #[test]
    fn results_serialize_flattened_with_rounded_scores() {
        let snapshot = snapshot();
        let results = Evaluator::default()
            .evaluate(&SearchQuery::name("midco").with_limit(1), &snapshot, far_deadline())
            .expect("search runs");

        let value = serde_json::to_value(&results).expect("serializes");
        let top = &value["SDNs"][0];
        assert_eq!(top["entityID"], "40");
        assert_eq!(top["matchedName"], "midco finance s a");
        assert_eq!(top["match"], serde_json::json!(0.90357));
        assert!(value.get("addresses").is_none());
        assert!(value.get("altNames").is_some());
    }

    #[test]
    fn address_envelopes_take_their_sdn_type() {
        let snapshot = snapshot();
        let query = SearchQuery {
            address: Some("57 Rue du Rhone".to_string()),
            ..SearchQuery::default()
        };
        let results = Evaluator::default()
            .evaluate(&query, &snapshot, far_deadline())
            .expect("search runs");

        let entities = results.entities(&snapshot);
        let addresses = entities.addresses.as_ref().expect("addresses in scope");
        let geneva = addresses
            .iter()
            .find(|entity| entity.source_id == "2831")
            .expect("2831 returned");
        assert_eq!(geneva.entity_type, EntityType::Person);
        assert!(geneva.is_consistent());

        // 173 has no SDN entry in this snapshot.
        let london = addresses
            .iter()
            .find(|entity| entity.source_id == "173")
            .expect("173 returned");
        assert_eq!(london.entity_type, EntityType::Business);
    }

    #[test]
    fn compare_keys_orders_numbers_numerically() {
        assert_eq!(compare_keys("9", "10"), Ordering::Less);
        assert_eq!(compare_keys("10", "abc"), Ordering::Less);
        assert_eq!(compare_keys("abc", "abd"), Ordering::Less);
        assert_eq!(compare_keys("007", "7"), Ordering::Less);
    }

    #[derive(Default)]
    struct Recording {
        events: Mutex<Vec<MatchEvent>>,
    }

    impl MatchObserver for Recording {
        fn observe(&self, event: &MatchEvent) -> Result<(), ObserverError> {
            self.events
                .lock()
                .expect("observer mutex poisoned")
                .push(event.clone());
            Ok(())
        }
    }

    struct Failing;

    impl MatchObserver for Failing {
        fn observe(&self, _event: &MatchEvent) -> Result<(), ObserverError> {
            Err(ObserverError::Unavailable("audit sink offline".to_string()))
        }
    }

    #[test]
    fn observers_see_every_returned_match() {
        let snapshot = snapshot();
        let observer = Arc::new(Recording::default());
        let results = Evaluator::default()
            .with_observer(observer.clone())
            .evaluate(&SearchQuery::name("midco").with_limit(2), &snapshot, far_deadline())
            .expect("search runs");

        let events = observer.events.lock().expect("observer mutex poisoned");
        assert_eq!(events.len(), results.len());
        assert_eq!(events[0].category, Category::Sdn);
        assert_eq!(events[0].record_key, "40");
    }

    #[test]
    fn failing_observer_does_not_fail_the_query() {
        let snapshot = snapshot();
        let plain = Evaluator::default()
            .evaluate(&SearchQuery::name("midco"), &snapshot, far_deadline())
            .expect("search runs");
        let observed = Evaluator::default()
            .with_observer(Arc::new(Failing))
            .evaluate(&SearchQuery::name("midco"), &snapshot, far_deadline())
            .expect("observer failure is ignored");

        let scores = |results: &SearchResults<'_>| -> Vec<f64> {
            results
                .sdns
                .as_ref()
                .expect("sdns in scope")
                .iter()
                .map(|m| m.score)
                .collect()
        };
        assert_eq!(scores(&plain), scores(&observed));
    }
}
