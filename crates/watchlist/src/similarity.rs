//! Fuzzy scoring primitives.
//!
//! Every function takes already-normalized tokens and returns a score in `[0, 1]`.
//! Scores are deterministic: equal inputs always produce bit-identical output, which the
//! evaluator relies on for stable ordering.

/// Token pairs whose length ratio drops below this are penalized.
pub const LENGTH_RATIO_FLOOR: f64 = 0.9;
pub const LENGTH_PENALTY_WEIGHT: f64 = 0.3;
pub const FIRST_CHAR_PENALTY: f64 = 0.9;
/// Weight of candidate characters left unmatched by the query.
pub const UNMATCHED_WEIGHT: f64 = 0.15;
/// Query tokens considered for an address token, relative to its position.
pub const ADDRESS_WINDOW_BEHIND: usize = 3;
pub const ADDRESS_WINDOW_AHEAD: usize = 3;
/// An address only influences a name match once it scores at least this much.
pub const ADDRESS_CONFIRMATION: f64 = 0.85;
pub const ADDRESS_BOOST: f64 = 0.25;

/// Jaro-Winkler with the usual prefix boost (up to four characters, scale 0.1),
/// applied only when the base Jaro score exceeds 0.7.
pub fn jaro_winkler(a: &str, b: &str) -> f64 {
    strsim::jaro_winkler(a, b)
}

/// Jaro-Winkler tuned for comparing single name tokens: short tokens matched against
/// long ones and tokens that disagree on their first letter lose weight.
pub fn token_jaro_winkler(query: &str, candidate: &str) -> f64 {
    let mut score = jaro_winkler(query, candidate);

    let query_len = query.chars().count();
    let candidate_len = candidate.chars().count();
    let longest = query_len.max(candidate_len);
    if longest == 0 {
        return 0.0;
    }

    let ratio = query_len.min(candidate_len) as f64 / longest as f64;
    if ratio < LENGTH_RATIO_FLOOR {
        score *= 1.0 - (1.0 - ratio) * LENGTH_PENALTY_WEIGHT;
    }

    if query.chars().next() != candidate.chars().next() {
        score *= FIRST_CHAR_PENALTY;
    }

    score.clamp(0.0, 1.0)
}

/// Scores a tokenized name query against a tokenized candidate name.
///
/// Query and candidate tokens are paired one-to-one, best pairs first. Each pair counts
/// in proportion to the characters it covers, and the result is discounted by the share
/// of candidate characters no query token accounted for.
pub fn name_score<Q, C>(query: &[Q], candidate: &[C]) -> f64
where
    Q: AsRef<str>,
    C: AsRef<str>,
{
    if query.is_empty() || candidate.is_empty() {
        return 0.0;
    }

    let query_lens: Vec<usize> = query.iter().map(|t| t.as_ref().chars().count()).collect();
    let candidate_lens: Vec<usize> = candidate
        .iter()
        .map(|t| t.as_ref().chars().count())
        .collect();

    let mut pairs = Vec::with_capacity(query.len() * candidate.len());
    for (qi, q) in query.iter().enumerate() {
        for (ci, c) in candidate.iter().enumerate() {
            pairs.push((token_jaro_winkler(q.as_ref(), c.as_ref()), qi, ci));
        }
    }
    pairs.sort_by(|a, b| {
        b.0.total_cmp(&a.0)
            .then_with(|| a.1.cmp(&b.1))
            .then_with(|| a.2.cmp(&b.2))
    });

    let mut query_used = vec![false; query.len()];
    let mut candidate_used = vec![false; candidate.len()];
    let mut weighted = 0.0;
    let mut matched_candidate_len = 0usize;

    for (score, qi, ci) in pairs {
        if query_used[qi] || candidate_used[ci] {
            continue;
        }
        query_used[qi] = true;
        candidate_used[ci] = true;
        weighted += score * (query_lens[qi] + candidate_lens[ci]) as f64;
        matched_candidate_len += candidate_lens[ci];
    }

    let total_query_len: usize = query_lens.iter().sum();
    let total_candidate_len: usize = candidate_lens.iter().sum();
    let denominator = (total_query_len + matched_candidate_len) as f64;
    if denominator == 0.0 || total_candidate_len == 0 {
        return 0.0;
    }

    let coverage = matched_candidate_len as f64 / total_candidate_len as f64;
    let score = (weighted / denominator) * (1.0 - (1.0 - coverage) * UNMATCHED_WEIGHT);
    score.clamp(0.0, 1.0)
}

/// Scores one address field. Each candidate token takes its best plain Jaro-Winkler
/// against query tokens near the same position; the field score is their mean.
pub fn address_field_score<Q, C>(query: &[Q], candidate: &[C]) -> f64
where
    Q: AsRef<str>,
    C: AsRef<str>,
{
    if query.is_empty() || candidate.is_empty() {
        return 0.0;
    }

    let total: f64 = candidate
        .iter()
        .enumerate()
        .map(|(i, token)| {
            let start = i.saturating_sub(ADDRESS_WINDOW_BEHIND);
            let end = (i + ADDRESS_WINDOW_AHEAD).min(query.len());
            if start >= end {
                return 0.0;
            }
            query[start..end]
                .iter()
                .map(|q| jaro_winkler(q.as_ref(), token.as_ref()))
                .fold(0.0, f64::max)
        })
        .sum();

    (total / candidate.len() as f64).min(1.0)
}

/// Scores a locality field (city, state or country) by how much of the query it covers.
/// Each query token takes its best plain Jaro-Winkler against any candidate token and the
/// field score is their mean, so extra tokens on the candidate side (postal codes in the
/// combined city/state column) cost nothing.
pub fn address_coverage_score<Q, C>(query: &[Q], candidate: &[C]) -> f64
where
    Q: AsRef<str>,
    C: AsRef<str>,
{
    if query.is_empty() || candidate.is_empty() {
        return 0.0;
    }

    let total: f64 = query
        .iter()
        .map(|q| {
            candidate
                .iter()
                .map(|token| jaro_winkler(q.as_ref(), token.as_ref()))
                .fold(0.0, f64::max)
        })
        .sum();

    (total / query.len() as f64).min(1.0)
}

/// Mean of the address fields the query supplied. `None` when nothing was supplied.
pub fn address_composite(field_scores: &[f64]) -> Option<f64> {
    if field_scores.is_empty() {
        return None;
    }
    Some(field_scores.iter().sum::<f64>() / field_scores.len() as f64)
}

/// Combines a name score with the best address score of the same entity. A weak
/// address never lowers the name score, and the result never exceeds 1.
pub fn name_address_composite(name: f64, address: f64) -> f64 {
    if address < ADDRESS_CONFIRMATION {
        return name;
    }
    (name + (1.0 - name) * ADDRESS_BOOST * address).min(1.0)
}
