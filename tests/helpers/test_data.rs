//! Generated test data
//!
//! Builders for users, categories and events. Free text comes from `fake`;
//! anything that must be unique (emails, category names) carries a uuid.

use chrono::{DateTime, Duration, Utc};
use fake::faker::address::en::{CityName, CountryName, StateName, StreetName};
use fake::faker::lorem::en::{Sentence, Words};
use fake::faker::name::en::Name;
use fake::Fake;
use uuid::Uuid;

use eventhub::models::{
    CreateEventRequest, Location, NewCategory, NewUser, Role, User,
};

/// Registration payload with a unique email
pub fn new_user() -> NewUser {
    NewUser {
        name: Name().fake(),
        email: unique_email(),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
        phone: None,
        bio: None,
    }
}

pub fn unique_email() -> String {
    format!("user-{}@example.com", Uuid::new_v4().simple())
}

/// A fully populated user row, for seeding stores directly
pub fn user_row(role: Role) -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        name: Name().fake(),
        email: unique_email(),
        password_hash: "hash".to_string(),
        role,
        phone: None,
        bio: None,
        last_login: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn new_category() -> NewCategory {
    NewCategory {
        name: format!("Category {}", &Uuid::new_v4().simple().to_string()[..8]),
        description: Some(Sentence(4..8).fake()),
        active: None,
    }
}

pub fn location() -> Location {
    Location {
        address: format!("{} {}", (1..999).fake::<u32>(), StreetName().fake::<String>()),
        city: CityName().fake(),
        state: StateName().fake(),
        country: CountryName().fake(),
    }
}

/// A valid event request one week out
pub fn event_request(category_id: Uuid) -> CreateEventRequest {
    event_request_at(category_id, Utc::now() + Duration::days(7))
}

pub fn event_request_at(category_id: Uuid, date: DateTime<Utc>) -> CreateEventRequest {
    let words: Vec<String> = Words(2..4).fake();
    CreateEventRequest {
        title: format!("Meetup {}", words.join(" ")),
        description: Sentence(8..14).fake(),
        date,
        end_date: Some(date + Duration::hours(3)),
        location: location(),
        category_id,
        capacity: 10,
        price: Some(0.0),
        tags: Vec::new(),
    }
}
