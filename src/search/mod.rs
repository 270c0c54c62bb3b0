//! Event search
//!
//! Turns loosely-typed search parameters into a typed [`EventQuery`].

pub mod filter;
pub mod params;
pub mod query;

pub use filter::EventFilter;
pub use params::SearchParams;
pub use query::{AppliedFilters, EventQuery, SearchResult, SortOrder};
