//! Data structures handed to the presentation layer. Everything here is
//! plain serializable output; no store access.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Artist, Venue};

/// Venues grouped under one (city, state) pair.
#[derive(Serialize, Debug, Clone)]
pub struct CityVenues {
    pub city: String,
    pub state: String,
    pub venues: Vec<VenueSummary>,
}

#[derive(Serialize, Debug, Clone)]
pub struct VenueSummary {
    pub id: i64,
    pub name: String,
    pub num_upcoming_shows: i64,
}

#[derive(Serialize, Debug, Clone)]
pub struct ArtistSummary {
    pub id: i64,
    pub name: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct SearchResults {
    pub count: usize,
    pub data: Vec<SearchHit>,
}

#[derive(Serialize, Debug, Clone)]
pub struct SearchHit {
    pub id: i64,
    pub name: String,
    pub num_upcoming_shows: i64,
}

/// A show as seen from a venue page: the artist side of the booking.
#[derive(Serialize, Debug, Clone)]
pub struct ArtistBooking {
    pub artist_id: i64,
    pub artist_name: String,
    pub artist_image_link: String,
    pub start_time: String,
}

/// A show as seen from an artist page: the venue side of the booking.
#[derive(Serialize, Debug, Clone)]
pub struct VenueBooking {
    pub venue_id: i64,
    pub venue_name: String,
    pub venue_image_link: String,
    pub start_time: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct VenuePage {
    #[serde(flatten)]
    pub venue: Venue,
    pub past_shows: Vec<ArtistBooking>,
    pub upcoming_shows: Vec<ArtistBooking>,
    pub past_shows_count: usize,
    pub upcoming_shows_count: usize,
}

#[derive(Serialize, Debug, Clone)]
pub struct ArtistPage {
    #[serde(flatten)]
    pub artist: Artist,
    pub past_shows: Vec<VenueBooking>,
    pub upcoming_shows: Vec<VenueBooking>,
    pub past_shows_count: usize,
    pub upcoming_shows_count: usize,
}

#[derive(Serialize, Debug, Clone)]
pub struct ShowListItem {
    pub venue_id: i64,
    pub venue_name: String,
    pub artist_id: i64,
    pub artist_name: String,
    pub artist_image_link: String,
    pub start_time: String,
}

/// Transient notification surfaced after a mutation, success or failure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Notice {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

impl Notice {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            id: None,
        }
    }

    pub fn with_id(message: impl Into<String>, id: i64) -> Self {
        Self {
            message: message.into(),
            id: Some(id),
        }
    }
}

/// Renders a stored timestamp for display, e.g. `Mon 06, 15, 2026 7:30PM`.
/// Unparseable values come back verbatim rather than failing the page.
pub fn format_start_time(stored: &str) -> String {
    match DateTime::parse_from_rfc3339(stored) {
        Ok(dt) => dt
            .with_timezone(&Utc)
            .format("%a %m, %d, %Y %-I:%M%p")
            .to_string(),
        Err(_) => stored.to_string(),
    }
}
