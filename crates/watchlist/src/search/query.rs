use serde::Deserialize;

/// Query string parameters exactly as received, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub name: Option<String>,
    pub alt_name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub providence: Option<String>,
    pub country: Option<String>,
    pub id: Option<String>,
    pub q: Option<String>,
    pub limit: Option<String>,
    pub min_match: Option<String>,
}

/// A validated screening request. Every text field is trimmed and `None` when blank.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
    pub name: Option<String>,
    pub alt_name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub id: Option<String>,
    /// Free text matched against names and, when nothing else is given, addresses.
    pub q: Option<String>,
    pub limit: Option<usize>,
    pub min_match: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    #[error("at least one search parameter is required")]
    Empty,
    #[error("limit must be a positive integer (found '{0}')")]
    InvalidLimit(String),
    #[error("minMatch must be a number between 0 and 1 (found '{0}')")]
    InvalidMinMatch(String),
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl SearchQuery {
    /// Validates raw parameters. `providence` is accepted as an alias for `state`.
    pub fn from_params(params: SearchParams) -> Result<Self, QueryError> {
        let limit = match present(params.limit) {
            Some(raw) => match raw.parse::<usize>() {
                Ok(limit) if limit > 0 => Some(limit),
                _ => return Err(QueryError::InvalidLimit(raw)),
            },
            None => None,
        };

        let min_match = match present(params.min_match) {
            Some(raw) => match raw.parse::<f64>() {
                Ok(value) if (0.0..=1.0).contains(&value) => Some(value),
                _ => return Err(QueryError::InvalidMinMatch(raw)),
            },
            None => None,
        };

        let query = Self {
            name: present(params.name),
            alt_name: present(params.alt_name),
            address: present(params.address),
            city: present(params.city),
            state: present(params.state).or_else(|| present(params.providence)),
            country: present(params.country),
            id: present(params.id),
            q: present(params.q),
            limit,
            min_match,
        };
        query.validate()?;
        Ok(query)
    }

    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_min_match(mut self, min_match: f64) -> Self {
        self.min_match = Some(min_match);
        self
    }

    pub fn has_search_field(&self) -> bool {
        [
            &self.name,
            &self.alt_name,
            &self.address,
            &self.city,
            &self.state,
            &self.country,
            &self.id,
            &self.q,
        ]
        .iter()
        .any(|field| field.as_deref().is_some_and(|value| !value.trim().is_empty()))
    }

    /// Checks the invariants `from_params` enforces, for queries built in code.
    pub fn validate(&self) -> Result<(), QueryError> {
        if !self.has_search_field() {
            return Err(QueryError::Empty);
        }
        if self.limit == Some(0) {
            return Err(QueryError::InvalidLimit("0".to_string()));
        }
        if let Some(min_match) = self.min_match {
            if !(0.0..=1.0).contains(&min_match) {
                return Err(QueryError::InvalidMinMatch(min_match.to_string()));
            }
        }
        Ok(())
    }
}
