//! Raw search parameters as they arrive from a query string

use serde::{Deserialize, Serialize};

/// Loosely-typed event search input.
///
/// Every field is optional and kept as text; [`super::EventQuery::build`]
/// owns parsing so that a bad value can be reported against its parameter.
/// Legacy camel-case spellings are accepted as aliases.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    pub q: Option<String>,
    pub search: Option<String>,
    pub category: Option<String>,
    pub categories: Option<String>,
    pub status: Option<String>,
    #[serde(alias = "approvalStatus")]
    pub approval_status: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    #[serde(alias = "startDate")]
    pub start_date: Option<String>,
    #[serde(alias = "endDate")]
    pub end_date: Option<String>,
    pub period: Option<String>,
    pub location: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    #[serde(alias = "minPrice")]
    pub min_price: Option<String>,
    #[serde(alias = "maxPrice")]
    pub max_price: Option<String>,
    pub free: Option<String>,
    pub tags: Option<String>,
    #[serde(alias = "hasAvailability")]
    pub has_availability: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `key=value&...` query string; unknown keys are ignored.
    ///
    /// Keys and values are form-decoded (`+` and `%XX`). A value that does
    /// not decode to UTF-8 is kept as written and left to the builder to
    /// reject.
    pub fn from_query_string(query: &str) -> Self {
        let mut params = Self::default();
        for pair in query.trim_start_matches('?').split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            let key = decode_component(key);
            let value = Some(decode_component(value));
            match key.as_str() {
                "q" => params.q = value,
                "search" => params.search = value,
                "category" => params.category = value,
                "categories" => params.categories = value,
                "status" => params.status = value,
                "approval_status" | "approvalStatus" => params.approval_status = value,
                "from" => params.from = value,
                "to" => params.to = value,
                "start_date" | "startDate" => params.start_date = value,
                "end_date" | "endDate" => params.end_date = value,
                "period" => params.period = value,
                "location" => params.location = value,
                "city" => params.city = value,
                "state" => params.state = value,
                "country" => params.country = value,
                "min_price" | "minPrice" => params.min_price = value,
                "max_price" | "maxPrice" => params.max_price = value,
                "free" => params.free = value,
                "tags" => params.tags = value,
                "has_availability" | "hasAvailability" => params.has_availability = value,
                "sort" => params.sort = value,
                "page" => params.page = value,
                "limit" => params.limit = value,
                _ => {}
            }
        }
        params
    }

    pub fn with_text(mut self, q: &str) -> Self {
        self.q = Some(q.to_string());
        self
    }

    pub fn with_sort(mut self, sort: &str) -> Self {
        self.sort = Some(sort.to_string());
        self
    }

    pub fn with_page(mut self, page: u32, limit: u32) -> Self {
        self.page = Some(page.to_string());
        self.limit = Some(limit.to_string());
        self
    }
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    let decoded = urlencoding::decode(&spaced).map(|value| value.into_owned());
    decoded.unwrap_or(spaced)
}

/// Non-blank trimmed value of an optional parameter
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Comma-separated list with blanks dropped
pub(crate) fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Boolean flags are only switched on by a literal `true`
pub(crate) fn flag(value: &Option<String>) -> bool {
    present(value).map_or(false, |v| v.eq_ignore_ascii_case("true"))
}
