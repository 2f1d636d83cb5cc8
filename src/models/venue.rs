use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Venue {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub capacity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Тело POST /api/venues и PUT /api/venues/{id}
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewVenue {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 255))]
    pub location: String,
    #[validate(range(min = 1))]
    pub capacity: i32,
}

// Частичное обновление: отсутствующие поля не меняются
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct VenueChanges {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub location: Option<String>,
    #[validate(range(min = 1))]
    pub capacity: Option<i32>,
}

// PUT заменяет все поля сразу
impl From<NewVenue> for VenueChanges {
    fn from(venue: NewVenue) -> Self {
        Self {
            name: Some(venue.name),
            location: Some(venue.location),
            capacity: Some(venue.capacity),
        }
    }
}
