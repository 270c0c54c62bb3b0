//! Search query resolution
//!
//! [`EventQuery::build`] is pure: it maps [`SearchParams`] onto a list of
//! [`EventFilter`] fragments, a [`SortOrder`] and a page window, forcing the
//! visibility rules for non-admin viewers. Stores only execute the result.

use std::cmp::Ordering;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::filter::{relevance, EventFilter};
use super::params::{flag, present, split_list, SearchParams};
use crate::config::SearchConfig;
use crate::models::event::{ApprovalStatus, Event, EventStatus, EventView};
use crate::models::user::{is_admin, Actor};
use crate::utils::errors::{EventHubError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Relevance,
    DateAsc,
    DateDesc,
    PriceAsc,
    PriceDesc,
    Recent,
}

impl SortOrder {
    /// Resolve a named sort key; anything unknown sorts by upcoming date
    pub fn from_key(key: Option<&str>) -> Self {
        match key.map(|k| k.trim().to_lowercase()).as_deref() {
            Some("date_desc") => SortOrder::DateDesc,
            Some("price_asc") => SortOrder::PriceAsc,
            Some("price_desc") => SortOrder::PriceDesc,
            Some("recent") => SortOrder::Recent,
            _ => SortOrder::DateAsc,
        }
    }

    /// Order two events; relevance is handled by [`EventQuery::rank`]
    pub fn compare(&self, a: &Event, b: &Event) -> Ordering {
        let primary = match self {
            SortOrder::Relevance | SortOrder::DateAsc => a.date.cmp(&b.date),
            SortOrder::DateDesc => b.date.cmp(&a.date),
            SortOrder::PriceAsc => a.price.total_cmp(&b.price),
            SortOrder::PriceDesc => b.price.total_cmp(&a.price),
            SortOrder::Recent => b.created_at.cmp(&a.created_at),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DateRangeEcho {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceEcho {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Resolved view of the filters a search actually applied
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedFilters {
    pub text_search: bool,
    pub location: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub date_range: Option<DateRangeEcho>,
    pub period: Option<u32>,
    pub price: Option<PriceEcho>,
    pub free: bool,
    pub categories: Vec<Uuid>,
    pub tags: Vec<String>,
    pub status: Option<EventStatus>,
    pub approval_status: Option<ApprovalStatus>,
    pub has_availability: bool,
    pub sort: SortOrder,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub events: Vec<EventView>,
    pub page: u32,
    pub pages: u32,
    pub total: u64,
    pub filters: AppliedFilters,
}

#[derive(Debug, Clone)]
pub struct EventQuery {
    pub filters: Vec<EventFilter>,
    pub sort: SortOrder,
    pub page: u32,
    pub limit: u32,
    pub applied: AppliedFilters,
}

impl EventQuery {
    pub fn build(
        params: &SearchParams,
        viewer: Option<&Actor>,
        now: DateTime<Utc>,
        config: &SearchConfig,
    ) -> Result<Self> {
        let mut filters = Vec::new();

        // A query with no searchable terms is treated as absent
        let text = present(&params.q)
            .filter(|q| q.chars().any(char::is_alphanumeric))
            .map(str::to_string);
        let keyword = present(&params.search).map(str::to_string);
        match (&text, &keyword) {
            (Some(q), _) => filters.push(EventFilter::Text(q.clone())),
            (None, Some(k)) => filters.push(EventFilter::Keyword(k.clone())),
            (None, None) => {}
        }

        let categories = match (present(&params.categories), present(&params.category)) {
            (Some(list), _) => parse_ids("categories", &split_list(list))?,
            (None, Some(single)) => parse_ids("category", &[single.to_string()])?,
            (None, None) => Vec::new(),
        };
        if !categories.is_empty() {
            filters.push(EventFilter::Categories(categories.clone()));
        }

        let admin = is_admin(viewer);
        let requested_status = present(&params.status)
            .map(str::parse::<EventStatus>)
            .transpose()?;
        let requested_approval = match present(&params.approval_status) {
            Some(value) => Some(parse_approval(value)?),
            None => None,
        };
        let (status, approval) = if admin {
            (requested_status, requested_approval)
        } else {
            (
                Some(requested_status.unwrap_or(EventStatus::Active)),
                Some(ApprovalStatus::Approved),
            )
        };
        if let Some(status) = status {
            filters.push(EventFilter::Status(status));
        }
        if let Some(approval) = approval {
            filters.push(EventFilter::Approval(approval));
        }

        let from = match present(&params.start_date) {
            Some(value) => Some(parse_bound("start_date", value, false)?),
            None => present(&params.from)
                .map(|value| parse_bound("from", value, false))
                .transpose()?,
        };
        let to = match present(&params.end_date) {
            Some(value) => Some(parse_bound("end_date", value, true)?),
            None => present(&params.to)
                .map(|value| parse_bound("to", value, true))
                .transpose()?,
        };
        let (date_range, period) = if from.is_some() || to.is_some() {
            filters.push(EventFilter::DateRange { from, to });
            (Some(DateRangeEcho { from, to }), None)
        } else if let Some(value) = present(&params.period) {
            let days = parse_positive("period", value)?;
            let end = now
                .checked_add_days(Days::new(u64::from(days)))
                .ok_or_else(|| EventHubError::invalid("period", "period is out of range"))?;
            let window = DateRangeEcho {
                from: Some(now),
                to: Some(end),
            };
            filters.push(EventFilter::DateRange {
                from: window.from,
                to: window.to,
            });
            (Some(window), Some(days))
        } else {
            (None, None)
        };

        let location = present(&params.location).map(str::to_string);
        let (city, state, country) = if let Some(general) = &location {
            filters.push(EventFilter::AnyLocation(general.clone()));
            (None, None, None)
        } else {
            let city = present(&params.city).map(str::to_string);
            let state = present(&params.state).map(str::to_string);
            let country = present(&params.country).map(str::to_string);
            if let Some(city) = &city {
                filters.push(EventFilter::City(city.clone()));
            }
            if let Some(state) = &state {
                filters.push(EventFilter::State(state.clone()));
            }
            if let Some(country) = &country {
                filters.push(EventFilter::Country(country.clone()));
            }
            (city, state, country)
        };

        let free = flag(&params.free);
        let price = if free {
            filters.push(EventFilter::Free);
            Some(PriceEcho {
                min: Some(0.0),
                max: Some(0.0),
            })
        } else {
            let min = present(&params.min_price)
                .map(|value| parse_price("min_price", value))
                .transpose()?;
            let max = present(&params.max_price)
                .map(|value| parse_price("max_price", value))
                .transpose()?;
            if let (Some(min), Some(max)) = (min, max) {
                if min > max {
                    return Err(EventHubError::invalid(
                        "min_price",
                        "Minimum price cannot exceed maximum price",
                    ));
                }
            }
            if min.is_some() || max.is_some() {
                filters.push(EventFilter::PriceRange { min, max });
                Some(PriceEcho { min, max })
            } else {
                None
            }
        };

        let tags = present(&params.tags).map(split_list).unwrap_or_default();
        if !tags.is_empty() {
            filters.push(EventFilter::Tags(tags.clone()));
        }

        let has_availability = flag(&params.has_availability);
        if has_availability {
            filters.push(EventFilter::HasAvailability);
        }

        let sort = if text.is_some() {
            SortOrder::Relevance
        } else {
            SortOrder::from_key(present(&params.sort))
        };

        let page = match present(&params.page) {
            Some(value) => parse_positive("page", value)?,
            None => 1,
        };
        let limit = match present(&params.limit) {
            Some(value) => {
                let limit = parse_positive("limit", value)?;
                if limit > config.max_page_size {
                    return Err(EventHubError::invalid(
                        "limit",
                        format!("Limit cannot exceed {}", config.max_page_size),
                    ));
                }
                limit
            }
            None => config.default_page_size,
        };

        let applied = AppliedFilters {
            text_search: text.is_some() || keyword.is_some(),
            location,
            city,
            state,
            country,
            date_range,
            period,
            price,
            free,
            categories,
            tags,
            status,
            approval_status: approval,
            has_availability,
            sort,
        };

        Ok(Self {
            filters,
            sort,
            page,
            limit,
            applied,
        })
    }

    pub fn matches(&self, event: &Event) -> bool {
        self.filters.iter().all(|filter| filter.matches(event))
    }

    /// Full-text query, when the search is ordered by relevance
    pub fn text(&self) -> Option<&str> {
        self.filters.iter().find_map(|filter| match filter {
            EventFilter::Text(q) => Some(q.as_str()),
            _ => None,
        })
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    /// Sort already-filtered events into result order
    pub fn rank(&self, mut events: Vec<Event>) -> Vec<Event> {
        match (self.sort, self.text()) {
            (SortOrder::Relevance, Some(q)) => {
                let mut scored: Vec<(f64, Event)> =
                    events.into_iter().map(|e| (relevance(&e, q), e)).collect();
                scored.sort_by(|(sa, a), (sb, b)| {
                    sb.total_cmp(sa).then_with(|| SortOrder::DateAsc.compare(a, b))
                });
                scored.into_iter().map(|(_, e)| e).collect()
            }
            (sort, _) => {
                events.sort_by(|a, b| sort.compare(a, b));
                events
            }
        }
    }

    /// Cut the requested page out of a ranked list
    pub fn paginate(&self, events: Vec<Event>) -> Vec<Event> {
        events
            .into_iter()
            .skip(self.offset() as usize)
            .take(self.limit as usize)
            .collect()
    }
}

fn parse_ids(field: &str, values: &[String]) -> Result<Vec<Uuid>> {
    values
        .iter()
        .map(|value| {
            Uuid::parse_str(value)
                .map_err(|_| EventHubError::invalid(field, format!("Invalid category id: {}", value)))
        })
        .collect()
}

fn parse_approval(value: &str) -> Result<ApprovalStatus> {
    match value.to_lowercase().as_str() {
        "pending" => Ok(ApprovalStatus::Pending),
        "approved" => Ok(ApprovalStatus::Approved),
        "rejected" => Ok(ApprovalStatus::Rejected),
        other => Err(EventHubError::invalid(
            "approval_status",
            format!("Unknown approval status: {}", other),
        )),
    }
}

/// RFC 3339 timestamp or a bare `YYYY-MM-DD`; a bare upper bound covers the whole day
fn parse_bound(field: &str, value: &str, upper: bool) -> Result<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    let day = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| EventHubError::invalid(field, format!("Invalid date: {}", value)))?;
    let time = if upper {
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)
    };
    time.map(|time| Utc.from_utc_datetime(&day.and_time(time)))
        .ok_or_else(|| EventHubError::invalid(field, format!("Invalid date: {}", value)))
}

fn parse_positive(field: &str, value: &str) -> Result<u32> {
    match value.parse::<u32>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(EventHubError::invalid(
            field,
            format!("{} must be a positive integer", field),
        )),
    }
}

fn parse_price(field: &str, value: &str) -> Result<f64> {
    match value.parse::<f64>() {
        Ok(price) if price.is_finite() && price >= 0.0 => Ok(price),
        _ => Err(EventHubError::invalid(
            field,
            format!("{} must be a non-negative number", field),
        )),
    }
}
