//! Form payloads for the create/edit surface, plus the parsing rules that
//! turn submitted text into store inputs. The same structs serialize back
//! out as the prefill data for the GET form pages.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::timestamp_string;
use crate::error::AppError;
use crate::models::{Artist, ArtistInput, ShowInput, Venue, VenueInput};

/// The seeking flags accept exactly the literal `"True"`; `"true"`,
/// `"TRUE"`, `"false"`, or anything else all read as false. Deliberately
/// strict rather than a general boolean parser.
pub fn parse_seeking_flag(value: &str) -> bool {
    value == "True"
}

fn seeking_flag_string(value: bool) -> String {
    if value { "True" } else { "False" }.to_string()
}

/// Splits a comma-separated genre field, trimming and dropping empties;
/// submitted order is preserved.
pub fn split_genres(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn join_genres(genres: &[String]) -> String {
    genres.join(", ")
}

fn optional(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn require(field: &'static str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(())
}

/// Accepts RFC 3339 or the common datetime-local form variants and
/// normalizes to the store's canonical UTC string. Naive inputs are taken
/// as UTC; there is no timezone negotiation.
pub fn parse_start_time(text: &str) -> Result<String, AppError> {
    let trimmed = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(timestamp_string(dt.with_timezone(&Utc)));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(timestamp_string(naive.and_utc()));
        }
    }
    Err(AppError::validation(format!(
        "start_time {trimmed:?} is not a recognized date-time"
    )))
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct SearchForm {
    pub search_term: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct VenueForm {
    pub name: String,
    pub city: String,
    pub state: String,
    pub address: String,
    pub phone: String,
    pub website: String,
    pub facebook_link: String,
    pub image_link: String,
    pub genres: String,
    pub seeking_talent: String,
    pub seeking_description: String,
}

impl VenueForm {
    pub fn from_venue(venue: &Venue) -> Self {
        Self {
            name: venue.name.clone(),
            city: venue.city.clone(),
            state: venue.state.clone(),
            address: venue.address.clone().unwrap_or_default(),
            phone: venue.phone.clone().unwrap_or_default(),
            website: venue.website.clone().unwrap_or_default(),
            facebook_link: venue.facebook_link.clone().unwrap_or_default(),
            image_link: venue.image_link.clone(),
            genres: join_genres(&venue.genres),
            seeking_talent: seeking_flag_string(venue.seeking_talent),
            seeking_description: venue.seeking_description.clone().unwrap_or_default(),
        }
    }

    fn validate(&self) -> Result<(), AppError> {
        require("name", &self.name)?;
        require("city", &self.city)?;
        require("state", &self.state)?;
        if split_genres(&self.genres).is_empty() {
            return Err(AppError::validation("at least one genre is required"));
        }
        Ok(())
    }

    /// Create keeps the submitted seeking_description verbatim, empty or not.
    pub fn into_create_input(self) -> Result<VenueInput, AppError> {
        self.validate()?;
        Ok(VenueInput {
            genres: split_genres(&self.genres),
            seeking_talent: parse_seeking_flag(&self.seeking_talent),
            seeking_description: Some(self.seeking_description),
            name: self.name,
            city: self.city,
            state: self.state,
            address: optional(self.address),
            phone: optional(self.phone),
            website: optional(self.website),
            facebook_link: optional(self.facebook_link),
            image_link: optional(self.image_link),
        })
    }

    /// Edit normalizes an empty seeking_description to unset.
    pub fn into_edit_input(self) -> Result<VenueInput, AppError> {
        self.validate()?;
        Ok(VenueInput {
            genres: split_genres(&self.genres),
            seeking_talent: parse_seeking_flag(&self.seeking_talent),
            seeking_description: optional(self.seeking_description),
            name: self.name,
            city: self.city,
            state: self.state,
            address: optional(self.address),
            phone: optional(self.phone),
            website: optional(self.website),
            facebook_link: optional(self.facebook_link),
            image_link: optional(self.image_link),
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ArtistForm {
    pub name: String,
    pub city: String,
    pub state: String,
    pub phone: String,
    pub website: String,
    pub facebook_link: String,
    pub image_link: String,
    pub genres: String,
    pub seeking_venue: String,
    pub seeking_description: String,
}

impl ArtistForm {
    pub fn from_artist(artist: &Artist) -> Self {
        Self {
            name: artist.name.clone(),
            city: artist.city.clone(),
            state: artist.state.clone(),
            phone: artist.phone.clone().unwrap_or_default(),
            website: artist.website.clone().unwrap_or_default(),
            facebook_link: artist.facebook_link.clone().unwrap_or_default(),
            image_link: artist.image_link.clone(),
            genres: join_genres(&artist.genres),
            seeking_venue: seeking_flag_string(artist.seeking_venue),
            seeking_description: artist.seeking_description.clone().unwrap_or_default(),
        }
    }

    fn validate(&self) -> Result<(), AppError> {
        require("name", &self.name)?;
        require("city", &self.city)?;
        require("state", &self.state)?;
        if split_genres(&self.genres).is_empty() {
            return Err(AppError::validation("at least one genre is required"));
        }
        Ok(())
    }

    pub fn into_create_input(self) -> Result<ArtistInput, AppError> {
        self.validate()?;
        Ok(ArtistInput {
            genres: split_genres(&self.genres),
            seeking_venue: parse_seeking_flag(&self.seeking_venue),
            seeking_description: Some(self.seeking_description),
            name: self.name,
            city: self.city,
            state: self.state,
            phone: optional(self.phone),
            website: optional(self.website),
            facebook_link: optional(self.facebook_link),
            image_link: optional(self.image_link),
        })
    }

    pub fn into_edit_input(self) -> Result<ArtistInput, AppError> {
        self.validate()?;
        Ok(ArtistInput {
            genres: split_genres(&self.genres),
            seeking_venue: parse_seeking_flag(&self.seeking_venue),
            seeking_description: optional(self.seeking_description),
            name: self.name,
            city: self.city,
            state: self.state,
            phone: optional(self.phone),
            website: optional(self.website),
            facebook_link: optional(self.facebook_link),
            image_link: optional(self.image_link),
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ShowForm {
    pub artist_id: String,
    pub venue_id: String,
    pub start_time: String,
}

impl ShowForm {
    pub fn into_input(self) -> Result<ShowInput, AppError> {
        let artist_id = self
            .artist_id
            .trim()
            .parse::<i64>()
            .map_err(|_| AppError::validation("artist_id must be an integer"))?;
        let venue_id = self
            .venue_id
            .trim()
            .parse::<i64>()
            .map_err(|_| AppError::validation("venue_id must be an integer"))?;
        let start_time = parse_start_time(&self.start_time)?;
        Ok(ShowInput {
            artist_id,
            venue_id,
            start_time,
        })
    }
}
