//! Query/aggregation layer: shapes entity rows into the views the
//! presentation layer consumes. Every query takes `now` explicitly so the
//! time boundary is the moment the caller chose, not whenever SQLite ran.
//!
//! The "upcoming" boundary differs per view on purpose: the grouped venue
//! listing counts shows strictly after `now`, while search and the detail
//! pages count shows at or after `now`. Both operators are kept distinct
//! rather than unified.

use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::db::{timestamp_string, Store};
use crate::error::AppError;
use crate::views::{
    ArtistBooking, ArtistPage, ArtistSummary, CityVenues, SearchHit, SearchResults, ShowListItem,
    VenueBooking, VenuePage, VenueSummary,
};
use crate::views::format_start_time;

impl Store {
    /// All venues partitioned by (city, state). Groups are ordered by city
    /// then state, venues within a group by id, so identical input always
    /// yields identical output.
    pub fn list_venues(&self, now: DateTime<Utc>) -> Result<Vec<CityVenues>, AppError> {
        let now = timestamp_string(now);
        let mut stmt = self.conn().prepare(
            "SELECT id, name, city, state,
                    (SELECT COUNT(*) FROM shows s
                     WHERE s.venue_id = venues.id AND s.start_time > ?1)
             FROM venues
             ORDER BY city, state, id",
        )?;
        let rows = stmt.query_map(params![now], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })?;

        let mut groups: Vec<CityVenues> = Vec::new();
        for row in rows {
            let (id, name, city, state, num_upcoming_shows) = row?;
            let summary = VenueSummary {
                id,
                name,
                num_upcoming_shows,
            };
            match groups
                .last_mut()
                .filter(|group| group.city == city && group.state == state)
            {
                Some(group) => group.venues.push(summary),
                None => groups.push(CityVenues {
                    city,
                    state,
                    venues: vec![summary],
                }),
            }
        }
        Ok(groups)
    }

    pub fn list_artists(&self) -> Result<Vec<ArtistSummary>, AppError> {
        let mut stmt = self
            .conn()
            .prepare("SELECT id, name FROM artists ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(ArtistSummary {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;
        collect(rows)
    }

    /// Venues whose name contains the term, or whose "city, state" starts
    /// with it; both branches case-insensitive.
    pub fn search_venues(
        &self,
        term: &str,
        now: DateTime<Utc>,
    ) -> Result<SearchResults, AppError> {
        let now = timestamp_string(now);
        let mut stmt = self.conn().prepare(
            "SELECT id, name,
                    (SELECT COUNT(*) FROM shows s
                     WHERE s.venue_id = venues.id AND s.start_time >= ?2)
             FROM venues
             WHERE lower(name) LIKE '%' || lower(?1) || '%'
                OR lower(city || ', ' || state) LIKE lower(?1) || '%'
             ORDER BY id",
        )?;
        let rows = stmt.query_map(params![term, now], search_hit_from_row)?;
        let data = collect(rows)?;
        Ok(SearchResults {
            count: data.len(),
            data,
        })
    }

    pub fn search_artists(
        &self,
        term: &str,
        now: DateTime<Utc>,
    ) -> Result<SearchResults, AppError> {
        let now = timestamp_string(now);
        let mut stmt = self.conn().prepare(
            "SELECT id, name,
                    (SELECT COUNT(*) FROM shows s
                     WHERE s.artist_id = artists.id AND s.start_time >= ?2)
             FROM artists
             WHERE lower(name) LIKE '%' || lower(?1) || '%'
                OR lower(city || ', ' || state) LIKE lower(?1) || '%'
             ORDER BY id",
        )?;
        let rows = stmt.query_map(params![term, now], search_hit_from_row)?;
        let data = collect(rows)?;
        Ok(SearchResults {
            count: data.len(),
            data,
        })
    }

    /// Venue detail page: the venue plus its shows joined with the booked
    /// artist, split into past (before `now`) and upcoming (at/after `now`).
    pub fn venue_page(&self, id: i64, now: DateTime<Utc>) -> Result<VenuePage, AppError> {
        let venue = self.get_venue(id)?;
        let now = timestamp_string(now);

        let mut stmt = self.conn().prepare(
            "SELECT s.start_time, a.id, a.name, a.image_link
             FROM shows s JOIN artists a ON a.id = s.artist_id
             WHERE s.venue_id = ?1
             ORDER BY s.start_time, s.id",
        )?;
        let rows = stmt.query_map(params![id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                ArtistBooking {
                    start_time: String::new(),
                    artist_id: row.get(1)?,
                    artist_name: row.get(2)?,
                    artist_image_link: row.get(3)?,
                },
            ))
        })?;

        let mut past_shows = Vec::new();
        let mut upcoming_shows = Vec::new();
        for row in rows {
            let (start_time, mut booking) = row?;
            let past = start_time.as_str() < now.as_str();
            booking.start_time = format_start_time(&start_time);
            if past {
                past_shows.push(booking);
            } else {
                upcoming_shows.push(booking);
            }
        }

        Ok(VenuePage {
            venue,
            past_shows_count: past_shows.len(),
            upcoming_shows_count: upcoming_shows.len(),
            past_shows,
            upcoming_shows,
        })
    }

    pub fn artist_page(&self, id: i64, now: DateTime<Utc>) -> Result<ArtistPage, AppError> {
        let artist = self.get_artist(id)?;
        let now = timestamp_string(now);

        let mut stmt = self.conn().prepare(
            "SELECT s.start_time, v.id, v.name, v.image_link
             FROM shows s JOIN venues v ON v.id = s.venue_id
             WHERE s.artist_id = ?1
             ORDER BY s.start_time, s.id",
        )?;
        let rows = stmt.query_map(params![id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                VenueBooking {
                    start_time: String::new(),
                    venue_id: row.get(1)?,
                    venue_name: row.get(2)?,
                    venue_image_link: row.get(3)?,
                },
            ))
        })?;

        let mut past_shows = Vec::new();
        let mut upcoming_shows = Vec::new();
        for row in rows {
            let (start_time, mut booking) = row?;
            let past = start_time.as_str() < now.as_str();
            booking.start_time = format_start_time(&start_time);
            if past {
                past_shows.push(booking);
            } else {
                upcoming_shows.push(booking);
            }
        }

        Ok(ArtistPage {
            artist,
            past_shows_count: past_shows.len(),
            upcoming_shows_count: upcoming_shows.len(),
            past_shows,
            upcoming_shows,
        })
    }

    /// Every show joined with both its artist and venue, unfiltered.
    pub fn list_shows(&self) -> Result<Vec<ShowListItem>, AppError> {
        let mut stmt = self.conn().prepare(
            "SELECT s.venue_id, v.name, s.artist_id, a.name, a.image_link, s.start_time
             FROM shows s
             JOIN venues v ON v.id = s.venue_id
             JOIN artists a ON a.id = s.artist_id
             ORDER BY s.id",
        )?;
        let rows = stmt.query_map([], |row| {
            let start_time: String = row.get(5)?;
            Ok(ShowListItem {
                venue_id: row.get(0)?,
                venue_name: row.get(1)?,
                artist_id: row.get(2)?,
                artist_name: row.get(3)?,
                artist_image_link: row.get(4)?,
                start_time: format_start_time(&start_time),
            })
        })?;
        collect(rows)
    }
}

fn search_hit_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SearchHit> {
    Ok(SearchHit {
        id: row.get(0)?,
        name: row.get(1)?,
        num_upcoming_shows: row.get(2)?,
    })
}

fn collect<T>(
    rows: impl Iterator<Item = rusqlite::Result<T>>,
) -> Result<Vec<T>, AppError> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
