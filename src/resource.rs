//! The three proxied upstream resources and the queries forwarded for them.

use std::collections::{BTreeMap, HashMap};

/// A proxied upstream entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Character,
    Location,
    Episode,
}

impl Resource {
    pub const ALL: [Resource; 3] = [Resource::Character, Resource::Location, Resource::Episode];

    /// Path segment on the upstream API.
    pub fn upstream_path(self) -> &'static str {
        match self {
            Resource::Character => "character",
            Resource::Location => "location",
            Resource::Episode => "episode",
        }
    }

    /// Collection name on the gateway (`/api/{collection}`).
    pub fn collection(self) -> &'static str {
        match self {
            Resource::Character => "characters",
            Resource::Location => "locations",
            Resource::Episode => "episodes",
        }
    }

    /// Query keys forwarded to the upstream list endpoint.
    pub fn filter_keys(self) -> &'static [&'static str] {
        match self {
            Resource::Character => &["name", "status", "species", "type", "gender"],
            Resource::Location => &["name", "type", "dimension"],
            Resource::Episode => &["name", "episode"],
        }
    }
}

/// Page number and filters for a list request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceQuery {
    pub page: Option<i64>,
    pub filters: BTreeMap<String, String>,
}

impl ResourceQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: i64) -> Self {
        self.page = Some(page);
        self
    }

    /// Adds a filter; empty values are ignored.
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.is_empty() {
            self.filters.insert(key.into(), value);
        }
        self
    }

    /// Builds a query from raw inbound parameters, keeping only the resource's
    /// filter keys and treating `page` leniently.
    pub fn from_params(resource: Resource, params: &HashMap<String, String>) -> Self {
        let page = params.get("page").map(|p| lenient_int(p)).unwrap_or(1);
        let mut query = Self::new().page(page);
        for key in resource.filter_keys() {
            if let Some(value) = params.get(*key) {
                query = query.filter(*key, value.as_str());
            }
        }
        query
    }

    /// Query pairs in the order they are sent upstream; `page` only when > 1.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.filters.len() + 1);
        if let Some(page) = self.page.filter(|p| *p > 1) {
            pairs.push(("page".to_string(), page.to_string()));
        }
        pairs.extend(
            self.filters
                .iter()
                .filter(|(_, v)| !v.is_empty())
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        pairs
    }
}

/// Integer conversion that never fails: skips leading whitespace, accepts an
/// optional sign, then reads the longest run of digits. No digits yields 0;
/// out of range values saturate.
pub fn lenient_int(raw: &str) -> i64 {
    let s = raw.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: i64 = 0;
    for digit in rest.bytes().take_while(u8::is_ascii_digit) {
        let d = i64::from(digit - b'0');
        value = if negative {
            value.saturating_mul(10).saturating_sub(d)
        } else {
            value.saturating_mul(10).saturating_add(d)
        };
    }
    value
}

/// Splits a comma separated `ids` parameter, converting each segment leniently.
pub fn parse_ids(raw: &str) -> Vec<i64> {
    raw.split(',').map(lenient_int).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_int_matches_loose_conversion() {
        assert_eq!(lenient_int("12"), 12);
        assert_eq!(lenient_int("3abc"), 3);
        assert_eq!(lenient_int("abc"), 0);
        assert_eq!(lenient_int(""), 0);
        assert_eq!(lenient_int("-4"), -4);
        assert_eq!(lenient_int("  7"), 7);
        assert_eq!(lenient_int("+9"), 9);
        assert_eq!(lenient_int("99999999999999999999999"), i64::MAX);
    }

    #[test]
    fn parse_ids_keeps_order_and_duplicates() {
        assert_eq!(parse_ids("2,2,1"), vec![2, 2, 1]);
        assert_eq!(parse_ids("1,x,3"), vec![1, 0, 3]);
    }

    #[test]
    fn first_page_is_not_forwarded() {
        assert!(ResourceQuery::new().page(1).to_pairs().is_empty());
        assert!(ResourceQuery::new().page(0).to_pairs().is_empty());
        assert!(ResourceQuery::new().to_pairs().is_empty());
        assert_eq!(
            ResourceQuery::new().page(3).to_pairs(),
            vec![("page".to_string(), "3".to_string())]
        );
    }

    #[test]
    fn from_params_drops_empty_and_unknown_keys() {
        let params: HashMap<String, String> = [
            ("name", "rick"),
            ("status", ""),
            ("dimension", "C-137"),
            ("page", "2"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let query = ResourceQuery::from_params(Resource::Character, &params);
        assert_eq!(query.page, Some(2));
        assert_eq!(query.filters.len(), 1);
        assert_eq!(query.filters.get("name").map(String::as_str), Some("rick"));

        let query = ResourceQuery::from_params(Resource::Location, &params);
        assert_eq!(query.filters.get("dimension").map(String::as_str), Some("C-137"));
        assert!(!query.filters.contains_key("status"));
    }

    #[test]
    fn zero_is_a_value_not_an_absence() {
        let params: HashMap<String, String> =
            [("name".to_string(), "0".to_string())].into_iter().collect();
        let query = ResourceQuery::from_params(Resource::Episode, &params);
        assert_eq!(query.filters.get("name").map(String::as_str), Some("0"));
        assert_eq!(parse_ids("0"), vec![0]);
    }

    #[test]
    fn missing_page_defaults_to_first() {
        let query = ResourceQuery::from_params(Resource::Episode, &HashMap::new());
        assert_eq!(query.page, Some(1));
        assert!(query.to_pairs().is_empty());
    }
}
