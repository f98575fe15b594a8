use serde::{Deserialize, Serialize};

pub const VENUE_IMAGE_PLACEHOLDER: &str =
    "https://images.unsplash.com/photo-1523730205978-59fd1b2965e3?auto=format&fit=crop&w=691&q=80";
pub const ARTIST_IMAGE_PLACEHOLDER: &str =
    "https://images.unsplash.com/photo-1470063819038-51ab7ad86ab6?auto=format&fit=crop&w=1050&q=80";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Venue {
    pub id: i64,
    pub name: String,
    pub city: String,
    pub state: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub genres: Vec<String>,
    pub image_link: String,
    pub seeking_talent: bool,
    pub seeking_description: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Artist {
    pub id: i64,
    pub name: String,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub genres: Vec<String>,
    pub image_link: String,
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Show {
    pub id: i64,
    pub artist_id: i64,
    pub venue_id: i64,
    pub start_time: String, // RFC 3339, UTC
}

/// Editable venue fields. Used for both create and edit; an edit overwrites
/// every field here wholesale (genres replaced, never merged).
#[derive(Clone, Debug)]
pub struct VenueInput {
    pub name: String,
    pub city: String,
    pub state: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub genres: Vec<String>,
    pub image_link: Option<String>,
    pub seeking_talent: bool,
    pub seeking_description: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ArtistInput {
    pub name: String,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub genres: Vec<String>,
    pub image_link: Option<String>,
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ShowInput {
    pub artist_id: i64,
    pub venue_id: i64,
    pub start_time: String, // RFC 3339, UTC
}

impl VenueInput {
    pub fn image_link_or_default(&self) -> String {
        match self.image_link.as_deref() {
            Some(link) if !link.is_empty() => link.to_string(),
            _ => VENUE_IMAGE_PLACEHOLDER.to_string(),
        }
    }
}

impl ArtistInput {
    pub fn image_link_or_default(&self) -> String {
        match self.image_link.as_deref() {
            Some(link) if !link.is_empty() => link.to_string(),
            _ => ARTIST_IMAGE_PLACEHOLDER.to_string(),
        }
    }
}
