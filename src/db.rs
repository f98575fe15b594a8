use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, Row};

use crate::error::AppError;
use crate::models::{Artist, ArtistInput, Show, ShowInput, Venue, VenueInput};

/// Canonical textual form for stored timestamps: RFC 3339, UTC, whole
/// seconds, `+00:00` offset. One format everywhere keeps SQL string
/// comparison chronological.
pub(crate) fn timestamp_string(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Entity store over a single SQLite connection. A `Store` is opened per
/// operation and dropped at scope end, so the connection is released on every
/// exit path; mutations run inside a scoped transaction that commits on
/// success and rolls back when dropped early.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self, AppError> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, AppError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, AppError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    fn init_schema(&self) -> Result<(), AppError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS venues(
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL CHECK(length(name) > 0),
                city TEXT NOT NULL CHECK(length(city) > 0),
                state TEXT NOT NULL CHECK(length(state) > 0),
                address TEXT,
                phone TEXT,
                website TEXT,
                facebook_link TEXT,
                genres TEXT NOT NULL CHECK(genres <> '[]'),
                image_link TEXT NOT NULL,
                seeking_talent INTEGER NOT NULL,
                seeking_description TEXT
            );
            CREATE TABLE IF NOT EXISTS artists(
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL CHECK(length(name) > 0),
                city TEXT NOT NULL CHECK(length(city) > 0),
                state TEXT NOT NULL CHECK(length(state) > 0),
                phone TEXT,
                website TEXT,
                facebook_link TEXT,
                genres TEXT NOT NULL CHECK(genres <> '[]'),
                image_link TEXT NOT NULL,
                seeking_venue INTEGER NOT NULL,
                seeking_description TEXT
            );
            CREATE TABLE IF NOT EXISTS shows(
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                artist_id INTEGER NOT NULL REFERENCES artists(id),
                venue_id INTEGER NOT NULL REFERENCES venues(id) ON DELETE CASCADE,
                start_time TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    pub fn create_venue(&mut self, input: &VenueInput) -> Result<i64, AppError> {
        let genres = encode_genres(&input.genres);
        let image_link = input.image_link_or_default();
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO venues (name, city, state, address, phone, website, facebook_link,
                                 genres, image_link, seeking_talent, seeking_description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                input.name,
                input.city,
                input.state,
                input.address,
                input.phone,
                input.website,
                input.facebook_link,
                genres,
                image_link,
                input.seeking_talent,
                input.seeking_description,
            ],
        )
        .map_err(constraint_error)?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(id)
    }

    pub fn get_venue(&self, id: i64) -> Result<Venue, AppError> {
        self.conn
            .query_row(
                "SELECT id, name, city, state, address, phone, website, facebook_link,
                        genres, image_link, seeking_talent, seeking_description
                 FROM venues WHERE id = ?1",
                params![id],
                venue_from_row,
            )
            .map_err(|err| lookup_error(err, "venue", id))
    }

    /// Overwrites every editable field of the venue. Genres are replaced
    /// wholesale, never merged.
    pub fn update_venue(&mut self, id: i64, input: &VenueInput) -> Result<(), AppError> {
        let genres = encode_genres(&input.genres);
        let image_link = input.image_link_or_default();
        let tx = self.conn.transaction()?;
        let changed = tx
            .execute(
                "UPDATE venues SET name = ?2, city = ?3, state = ?4, address = ?5, phone = ?6,
                        website = ?7, facebook_link = ?8, genres = ?9, image_link = ?10,
                        seeking_talent = ?11, seeking_description = ?12
                 WHERE id = ?1",
                params![
                    id,
                    input.name,
                    input.city,
                    input.state,
                    input.address,
                    input.phone,
                    input.website,
                    input.facebook_link,
                    genres,
                    image_link,
                    input.seeking_talent,
                    input.seeking_description,
                ],
            )
            .map_err(constraint_error)?;
        if changed == 0 {
            return Err(AppError::not_found("venue", id));
        }
        tx.commit()?;
        Ok(())
    }

    /// Deletes the venue; its shows go with it via the cascade on
    /// `shows.venue_id`.
    pub fn delete_venue(&mut self, id: i64) -> Result<(), AppError> {
        let tx = self.conn.transaction()?;
        let deleted = tx.execute("DELETE FROM venues WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(AppError::not_found("venue", id));
        }
        tx.commit()?;
        Ok(())
    }

    pub fn create_artist(&mut self, input: &ArtistInput) -> Result<i64, AppError> {
        let genres = encode_genres(&input.genres);
        let image_link = input.image_link_or_default();
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO artists (name, city, state, phone, website, facebook_link,
                                  genres, image_link, seeking_venue, seeking_description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                input.name,
                input.city,
                input.state,
                input.phone,
                input.website,
                input.facebook_link,
                genres,
                image_link,
                input.seeking_venue,
                input.seeking_description,
            ],
        )
        .map_err(constraint_error)?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(id)
    }

    pub fn get_artist(&self, id: i64) -> Result<Artist, AppError> {
        self.conn
            .query_row(
                "SELECT id, name, city, state, phone, website, facebook_link,
                        genres, image_link, seeking_venue, seeking_description
                 FROM artists WHERE id = ?1",
                params![id],
                artist_from_row,
            )
            .map_err(|err| lookup_error(err, "artist", id))
    }

    pub fn update_artist(&mut self, id: i64, input: &ArtistInput) -> Result<(), AppError> {
        let genres = encode_genres(&input.genres);
        let image_link = input.image_link_or_default();
        let tx = self.conn.transaction()?;
        let changed = tx
            .execute(
                "UPDATE artists SET name = ?2, city = ?3, state = ?4, phone = ?5, website = ?6,
                        facebook_link = ?7, genres = ?8, image_link = ?9,
                        seeking_venue = ?10, seeking_description = ?11
                 WHERE id = ?1",
                params![
                    id,
                    input.name,
                    input.city,
                    input.state,
                    input.phone,
                    input.website,
                    input.facebook_link,
                    genres,
                    image_link,
                    input.seeking_venue,
                    input.seeking_description,
                ],
            )
            .map_err(constraint_error)?;
        if changed == 0 {
            return Err(AppError::not_found("artist", id));
        }
        tx.commit()?;
        Ok(())
    }

    /// Artist deletion does not cascade: an artist with booked shows is kept
    /// and the delete is rejected as a conflict.
    pub fn delete_artist(&mut self, id: i64) -> Result<(), AppError> {
        let tx = self.conn.transaction()?;
        let show_count: i64 = tx.query_row(
            "SELECT COUNT(*) FROM shows WHERE artist_id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        if show_count > 0 {
            return Err(AppError::conflict(format!(
                "artist {id} still has {show_count} show(s) booked"
            )));
        }
        let deleted = tx.execute("DELETE FROM artists WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(AppError::not_found("artist", id));
        }
        tx.commit()?;
        Ok(())
    }

    pub fn create_show(&mut self, input: &ShowInput) -> Result<i64, AppError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO shows (artist_id, venue_id, start_time) VALUES (?1, ?2, ?3)",
            params![input.artist_id, input.venue_id, input.start_time],
        )
        .map_err(constraint_error)?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(id)
    }

    pub fn get_show(&self, id: i64) -> Result<Show, AppError> {
        self.conn
            .query_row(
                "SELECT id, artist_id, venue_id, start_time FROM shows WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Show {
                        id: row.get(0)?,
                        artist_id: row.get(1)?,
                        venue_id: row.get(2)?,
                        start_time: row.get(3)?,
                    })
                },
            )
            .map_err(|err| lookup_error(err, "show", id))
    }
}

pub(crate) fn encode_genres(genres: &[String]) -> String {
    serde_json::to_string(genres).expect("genre list serialization")
}

pub(crate) fn decode_genres(payload: &str) -> rusqlite::Result<Vec<String>> {
    serde_json::from_str(payload).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(
            payload.len(),
            rusqlite::types::Type::Text,
            Box::new(err),
        )
    })
}

pub(crate) fn venue_from_row(row: &Row<'_>) -> rusqlite::Result<Venue> {
    let genres: String = row.get(8)?;
    Ok(Venue {
        id: row.get(0)?,
        name: row.get(1)?,
        city: row.get(2)?,
        state: row.get(3)?,
        address: row.get(4)?,
        phone: row.get(5)?,
        website: row.get(6)?,
        facebook_link: row.get(7)?,
        genres: decode_genres(&genres)?,
        image_link: row.get(9)?,
        seeking_talent: row.get(10)?,
        seeking_description: row.get(11)?,
    })
}

pub(crate) fn artist_from_row(row: &Row<'_>) -> rusqlite::Result<Artist> {
    let genres: String = row.get(7)?;
    Ok(Artist {
        id: row.get(0)?,
        name: row.get(1)?,
        city: row.get(2)?,
        state: row.get(3)?,
        phone: row.get(4)?,
        website: row.get(5)?,
        facebook_link: row.get(6)?,
        genres: decode_genres(&genres)?,
        image_link: row.get(8)?,
        seeking_venue: row.get(9)?,
        seeking_description: row.get(10)?,
    })
}

fn constraint_error(err: rusqlite::Error) -> AppError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            AppError::validation(format!("constraint violation: {err}"))
        }
        _ => AppError::Store(err),
    }
}

fn lookup_error(err: rusqlite::Error, entity: &'static str, id: i64) -> AppError {
    match err {
        rusqlite::Error::QueryReturnedNoRows => AppError::not_found(entity, id),
        other => AppError::Store(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    pub(crate) fn venue_input(name: &str, city: &str, state: &str) -> VenueInput {
        VenueInput {
            name: name.to_string(),
            city: city.to_string(),
            state: state.to_string(),
            address: Some("123 Main St".to_string()),
            phone: None,
            website: None,
            facebook_link: None,
            genres: vec!["Rock".to_string()],
            image_link: None,
            seeking_talent: false,
            seeking_description: None,
        }
    }

    pub(crate) fn artist_input(name: &str, city: &str, state: &str) -> ArtistInput {
        ArtistInput {
            name: name.to_string(),
            city: city.to_string(),
            state: state.to_string(),
            phone: None,
            website: None,
            facebook_link: None,
            genres: vec!["Jazz".to_string()],
            image_link: None,
            seeking_venue: false,
            seeking_description: None,
        }
    }

    #[test]
    fn create_and_get_venue_roundtrip() {
        let mut store = Store::open_in_memory().expect("open store");
        let mut input = venue_input("The Fillmore", "San Francisco", "CA");
        input.genres = vec!["Rock".to_string(), "Soul".to_string(), "Funk".to_string()];

        let id = store.create_venue(&input).expect("create venue");
        let venue = store.get_venue(id).expect("get venue");

        assert_eq!(venue.name, "The Fillmore");
        assert_eq!(venue.city, "San Francisco");
        assert_eq!(venue.state, "CA");
        assert_eq!(venue.genres, vec!["Rock", "Soul", "Funk"]);
        assert!(!venue.seeking_talent);
    }

    #[test]
    fn empty_image_link_gets_placeholder() {
        let mut store = Store::open_in_memory().expect("open store");
        let mut input = venue_input("Venus Lounge", "Austin", "TX");
        input.image_link = Some(String::new());

        let id = store.create_venue(&input).expect("create venue");
        let venue = store.get_venue(id).expect("get venue");
        assert_eq!(venue.image_link, crate::models::VENUE_IMAGE_PLACEHOLDER);
    }

    #[test]
    fn missing_venue_is_not_found() {
        let store = Store::open_in_memory().expect("open store");
        match store.get_venue(999) {
            Err(AppError::NotFound { entity, id }) => {
                assert_eq!(entity, "venue");
                assert_eq!(id, 999);
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn create_venue_rejects_empty_required_fields() {
        let mut store = Store::open_in_memory().expect("open store");
        let input = venue_input("", "Austin", "TX");
        assert!(matches!(
            store.create_venue(&input),
            Err(AppError::Validation(_))
        ));

        let mut input = venue_input("Venus Lounge", "Austin", "TX");
        input.genres = Vec::new();
        assert!(matches!(
            store.create_venue(&input),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn create_show_requires_existing_artist_and_venue() {
        let mut store = Store::open_in_memory().expect("open store");
        let venue_id = store
            .create_venue(&venue_input("Pine Box", "Seattle", "WA"))
            .expect("create venue");

        let orphan = ShowInput {
            artist_id: 42,
            venue_id,
            start_time: "2026-10-01T20:00:00+00:00".to_string(),
        };
        assert!(matches!(
            store.create_show(&orphan),
            Err(AppError::Validation(_))
        ));

        let artist_id = store
            .create_artist(&artist_input("Nile", "Greenville", "SC"))
            .expect("create artist");
        let show = ShowInput {
            artist_id,
            venue_id,
            start_time: "2026-10-01T20:00:00+00:00".to_string(),
        };
        let show_id = store.create_show(&show).expect("create show");
        let stored = store.get_show(show_id).expect("get show");
        assert_eq!(stored.artist_id, artist_id);
        assert_eq!(stored.venue_id, venue_id);
    }

    #[test]
    fn deleting_a_venue_cascades_only_its_own_shows() {
        let mut store = Store::open_in_memory().expect("open store");
        let doomed = store
            .create_venue(&venue_input("Doomed Hall", "Boise", "ID"))
            .expect("create venue");
        let survivor = store
            .create_venue(&venue_input("Survivor Stage", "Boise", "ID"))
            .expect("create venue");
        let artist_id = store
            .create_artist(&artist_input("Oddisee", "Washington", "DC"))
            .expect("create artist");

        for venue_id in [doomed, doomed, survivor] {
            store
                .create_show(&ShowInput {
                    artist_id,
                    venue_id,
                    start_time: "2026-11-05T19:00:00+00:00".to_string(),
                })
                .expect("create show");
        }

        store.delete_venue(doomed).expect("delete venue");

        let count_for = |venue_id: i64| -> i64 {
            store
                .conn()
                .query_row(
                    "SELECT COUNT(*) FROM shows WHERE venue_id = ?1",
                    params![venue_id],
                    |row| row.get(0),
                )
                .expect("count shows")
        };
        assert_eq!(count_for(doomed), 0);
        assert_eq!(count_for(survivor), 1);
        assert!(matches!(
            store.get_venue(doomed),
            Err(AppError::NotFound { .. })
        ));
    }

    #[test]
    fn deleting_an_artist_with_shows_is_blocked() {
        let mut store = Store::open_in_memory().expect("open store");
        let venue_id = store
            .create_venue(&venue_input("Treefort Stage", "Boise", "ID"))
            .expect("create venue");
        let artist_id = store
            .create_artist(&artist_input("Cryptopsy", "Montreal", "QC"))
            .expect("create artist");
        store
            .create_show(&ShowInput {
                artist_id,
                venue_id,
                start_time: "2026-09-15T21:00:00+00:00".to_string(),
            })
            .expect("create show");

        assert!(matches!(
            store.delete_artist(artist_id),
            Err(AppError::Conflict(_))
        ));
        assert!(store.get_artist(artist_id).is_ok());

        store.delete_venue(venue_id).expect("delete venue");
        store.delete_artist(artist_id).expect("delete artist");
        assert!(matches!(
            store.get_artist(artist_id),
            Err(AppError::NotFound { .. })
        ));
    }

    #[test]
    fn failed_edit_leaves_the_record_unchanged() {
        let mut store = Store::open_in_memory().expect("open store");
        let id = store
            .create_artist(&artist_input("Nile", "Greenville", "SC"))
            .expect("create artist");
        let before = store.get_artist(id).expect("get artist");

        // Empty name trips the CHECK constraint mid-transaction.
        let bad = artist_input("", "Portland", "OR");
        assert!(matches!(
            store.update_artist(id, &bad),
            Err(AppError::Validation(_))
        ));

        let after = store.get_artist(id).expect("get artist");
        assert_eq!(before, after);
    }

    #[test]
    fn edit_overwrites_every_field() {
        let mut store = Store::open_in_memory().expect("open store");
        let id = store
            .create_venue(&venue_input("Old Name", "Boise", "ID"))
            .expect("create venue");

        let replacement = VenueInput {
            name: "New Name".to_string(),
            city: "Portland".to_string(),
            state: "OR".to_string(),
            address: None,
            phone: Some("555-0101".to_string()),
            website: Some("https://newname.example.com".to_string()),
            facebook_link: None,
            genres: vec!["Folk".to_string(), "Indie".to_string()],
            image_link: Some("https://img.example.com/new.jpg".to_string()),
            seeking_talent: true,
            seeking_description: Some("Looking for openers".to_string()),
        };
        store.update_venue(id, &replacement).expect("update venue");

        let venue = store.get_venue(id).expect("get venue");
        assert_eq!(venue.name, "New Name");
        assert_eq!(venue.city, "Portland");
        assert_eq!(venue.state, "OR");
        assert_eq!(venue.address, None);
        assert_eq!(venue.genres, vec!["Folk", "Indie"]);
        assert!(venue.seeking_talent);
        assert_eq!(
            venue.seeking_description.as_deref(),
            Some("Looking for openers")
        );
    }
}
