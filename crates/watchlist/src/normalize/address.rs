//! Best-effort address structuring.
//!
//! List providers publish addresses as anything from clean columns to a single free-text
//! blob. [`parse_address`] classifies comma/newline separated segments from the end
//! (country, postal tail, city) and treats whatever it cannot classify as the street.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use super::normalize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardizedAddress {
    pub street_number: String,
    pub street_name: String,
    pub unit: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl StandardizedAddress {
    pub fn is_empty(&self) -> bool {
        self.street().is_empty()
            && self.city_state().is_empty()
            && self.country.trim().is_empty()
    }

    /// Street line as written: number, name and unit.
    pub fn street(&self) -> String {
        join_present(&[&self.street_number, &self.street_name, &self.unit])
    }

    /// City, state/province and postal code as one line.
    pub fn city_state(&self) -> String {
        join_present(&[&self.city, &self.state, &self.postal_code])
    }
}

fn join_present(parts: &[&String]) -> String {
    parts
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

const COUNTRIES: &[&str] = &[
    "afghanistan",
    "argentina",
    "belarus",
    "belgium",
    "brazil",
    "burma",
    "canada",
    "china",
    "colombia",
    "cuba",
    "cyprus",
    "egypt",
    "france",
    "germany",
    "great britain",
    "greece",
    "hong kong",
    "india",
    "indonesia",
    "iran",
    "iraq",
    "israel",
    "italy",
    "japan",
    "jordan",
    "kazakhstan",
    "korea north",
    "kuwait",
    "lebanon",
    "libya",
    "malaysia",
    "mexico",
    "myanmar",
    "netherlands",
    "nigeria",
    "north korea",
    "pakistan",
    "panama",
    "qatar",
    "russia",
    "russian federation",
    "saudi arabia",
    "singapore",
    "somalia",
    "south africa",
    "spain",
    "sudan",
    "switzerland",
    "syria",
    "turkey",
    "uae",
    "uk",
    "ukraine",
    "united arab emirates",
    "united kingdom",
    "united states",
    "united states of america",
    "usa",
    "uzbekistan",
    "venezuela",
    "yemen",
];

const CARE_OF_PREFIXES: &[&str] = &["c/o", "℅", "attn", "care of"];

fn state_postal_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<state>[A-Z]{2})\s+(?P<postal>\d{5}(?:-\d{4})?)$")
            .expect("state/postal pattern compiles")
    })
}

fn city_postal_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?P<city>[^\d].*?)\s+(?:(?P<state>[A-Z]{2})\s+)?(?P<postal>(?:[A-Z]{1,2}-)?\d{4,6}(?:-\d{4})?|[A-Z]{1,2}\d[A-Z\d]?\s?\d[A-Z]{2})$",
        )
        .expect("city/postal pattern compiles")
    })
}

fn postal_only_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:[A-Z]{1,2}-)?\d{4,6}(?:-\d{4})?$").expect("postal pattern compiles")
    })
}

fn unit_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\s*(?P<unit>(?:\b(?:apt|apartment|suite|ste|unit|fl|floor|room|rm)\b\.?|#)\s*#?\s*[\w-]+)$",
        )
        .expect("unit pattern compiles")
    })
}

fn street_number_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<number>\d+[A-Za-z]?(?:-\d+)?)\s+(?P<name>.+)$")
            .expect("street number pattern compiles")
    })
}

pub fn is_country(segment: &str) -> bool {
    let normalized = normalize(segment);
    COUNTRIES.iter().any(|country| *country == normalized)
}

/// Structures `text` into address components. Never fails: input that cannot be
/// classified ends up whole in `street_name`.
pub fn parse_address(text: &str) -> StandardizedAddress {
    let mut segments: Vec<&str> = text
        .split(['\n', ','])
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect();

    let mut address = StandardizedAddress::default();
    if segments.is_empty() {
        return address;
    }

    if segments.len() > 1 {
        if let Some(last) = segments.last() {
            if is_country(last) {
                address.country = last.to_string();
                segments.pop();
            }
        }
    }

    if segments.len() > 1 {
        classify_locality(&mut segments, &mut address);
    }

    segments.retain(|segment| {
        let lowered = segment.to_lowercase();
        !CARE_OF_PREFIXES
            .iter()
            .any(|prefix| lowered.starts_with(prefix))
    });

    let street = segments.join(", ");
    apply_street(&street, &mut address);
    address
}

fn classify_locality(segments: &mut Vec<&str>, address: &mut StandardizedAddress) {
    let Some(last) = segments.last().copied() else {
        return;
    };

    if let Some(caps) = state_postal_pattern().captures(last) {
        address.state = caps["state"].to_string();
        address.postal_code = caps["postal"].to_string();
        segments.pop();
        take_city(segments, address);
    } else if postal_only_pattern().is_match(last) {
        address.postal_code = last.to_string();
        segments.pop();
        take_city(segments, address);
    } else if let Some(caps) = city_postal_pattern().captures(last) {
        address.city = caps["city"].trim().to_string();
        if let Some(state) = caps.name("state") {
            address.state = state.as_str().to_string();
        }
        address.postal_code = caps["postal"].to_string();
        segments.pop();
    } else if segments.len() > 2 {
        address.city = last.to_string();
        segments.pop();
    }
}

fn take_city(segments: &mut Vec<&str>, address: &mut StandardizedAddress) {
    if segments.len() > 1 {
        if let Some(city) = segments.pop() {
            address.city = city.to_string();
        }
    }
}

fn apply_street(street: &str, address: &mut StandardizedAddress) {
    let mut remainder = street.trim().to_string();
    if remainder.is_empty() {
        return;
    }

    if let Some(caps) = unit_pattern().captures(&remainder) {
        let unit = caps["unit"].trim().to_string();
        let start = caps.get(0).map(|m| m.start()).unwrap_or(remainder.len());
        if start > 0 {
            address.unit = unit;
            remainder.truncate(start);
        }
    }

    match street_number_pattern().captures(remainder.trim()) {
        Some(caps) => {
            address.street_number = caps["number"].to_string();
            address.street_name = caps["name"].trim().to_string();
        }
        None => address.street_name = remainder.trim().to_string(),
    }
}
