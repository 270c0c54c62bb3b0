//! Typed predicate fragments over events

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::event::{ApprovalStatus, Event, EventStatus};

/// One recognized search option. A query matches an event when every one of
/// its fragments does.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EventFilter {
    /// Full-text search: every term must appear in title, description or address
    Text(String),
    /// Case-insensitive substring on title or description
    Keyword(String),
    Categories(Vec<Uuid>),
    Status(EventStatus),
    Approval(ApprovalStatus),
    /// Inclusive bounds on the start date
    DateRange {
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    },
    /// Substring on city, state or country
    AnyLocation(String),
    City(String),
    State(String),
    Country(String),
    PriceRange {
        min: Option<f64>,
        max: Option<f64>,
    },
    Free,
    /// Any-of tag match
    Tags(Vec<String>),
    HasAvailability,
}

impl EventFilter {
    pub fn matches(&self, event: &Event) -> bool {
        match self {
            EventFilter::Text(query) => {
                let haystack = tokenize(&searchable_text(event));
                tokenize(query).iter().all(|term| haystack.contains(term))
            }
            EventFilter::Keyword(keyword) => {
                contains_ci(&event.title, keyword) || contains_ci(&event.description, keyword)
            }
            EventFilter::Categories(ids) => ids.contains(&event.category_id),
            EventFilter::Status(status) => event.status == *status,
            EventFilter::Approval(approval) => event.approval_status == *approval,
            EventFilter::DateRange { from, to } => {
                from.map_or(true, |from| event.date >= from) && to.map_or(true, |to| event.date <= to)
            }
            EventFilter::AnyLocation(needle) => {
                contains_ci(&event.location.city, needle)
                    || contains_ci(&event.location.state, needle)
                    || contains_ci(&event.location.country, needle)
            }
            EventFilter::City(needle) => contains_ci(&event.location.city, needle),
            EventFilter::State(needle) => contains_ci(&event.location.state, needle),
            EventFilter::Country(needle) => contains_ci(&event.location.country, needle),
            EventFilter::PriceRange { min, max } => {
                min.map_or(true, |min| event.price >= min) && max.map_or(true, |max| event.price <= max)
            }
            EventFilter::Free => event.price == 0.0,
            EventFilter::Tags(tags) => event.tags.iter().any(|tag| tags.contains(tag)),
            EventFilter::HasAvailability => !event.is_fully_booked(),
        }
    }
}

/// Number of query-term occurrences in the searchable text of an event
pub fn relevance(event: &Event, query: &str) -> f64 {
    let haystack = tokenize(&searchable_text(event));
    let terms = tokenize(query);
    haystack.iter().filter(|token| terms.contains(token)).count() as f64
}

fn searchable_text(event: &Event) -> String {
    format!("{} {} {}", event.title, event.description, event.location.address)
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::{CreateEventRequest, Location};
    use crate::models::user::Actor;
    use chrono::Duration;

    fn event() -> Event {
        let now = Utc::now();
        let request = CreateEventRequest {
            title: "Blues Dance Workshop".to_string(),
            description: "Learn the basics of blues dancing".to_string(),
            date: now + Duration::days(3),
            end_date: None,
            location: Location {
                address: "Rua da Praia 100".to_string(),
                city: "Porto Alegre".to_string(),
                state: "RS".to_string(),
                country: "Brasil".to_string(),
            },
            category_id: Uuid::new_v4(),
            capacity: 1,
            price: Some(15.0),
            tags: vec!["blues".to_string(), "workshop".to_string()],
        };
        Event::new(request, &Actor::admin(Uuid::new_v4()), now)
    }

    #[test]
    fn test_text_requires_every_term() {
        let event = event();
        assert!(EventFilter::Text("blues praia".to_string()).matches(&event));
        assert!(EventFilter::Text("BLUES".to_string()).matches(&event));
        assert!(!EventFilter::Text("blues tango".to_string()).matches(&event));
    }

    #[test]
    fn test_keyword_is_substring() {
        let event = event();
        assert!(EventFilter::Keyword("shop".to_string()).matches(&event));
        assert!(!EventFilter::Keyword("praia".to_string()).matches(&event));
    }

    #[test]
    fn test_location_filters() {
        let event = event();
        assert!(EventFilter::AnyLocation("bras".to_string()).matches(&event));
        assert!(EventFilter::City("porto".to_string()).matches(&event));
        assert!(!EventFilter::State("SP".to_string()).matches(&event));
    }

    #[test]
    fn test_price_and_tags() {
        let event = event();
        assert!(EventFilter::PriceRange { min: Some(10.0), max: Some(15.0) }.matches(&event));
        assert!(!EventFilter::PriceRange { min: None, max: Some(14.99) }.matches(&event));
        assert!(!EventFilter::Free.matches(&event));
        assert!(EventFilter::Tags(vec!["jazz".to_string(), "blues".to_string()]).matches(&event));
        assert!(!EventFilter::Tags(vec!["jazz".to_string()]).matches(&event));
    }

    #[test]
    fn test_availability_both_directions() {
        let mut event = event();
        assert!(EventFilter::HasAvailability.matches(&event));
        event.join(Uuid::new_v4()).unwrap();
        assert!(!EventFilter::HasAvailability.matches(&event));
    }

    #[test]
    fn test_relevance_counts_occurrences() {
        let event = event();
        assert_eq!(relevance(&event, "blues"), 2.0);
        assert_eq!(relevance(&event, "tango"), 0.0);
    }
}
