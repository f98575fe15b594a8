//! HTTP surface: one axum router over the store. Each request opens its own
//! store on a blocking thread, does its reads/writes inside that scope, and
//! releases the connection on every exit path; no store handle outlives a
//! request.

use std::path::PathBuf;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use chrono::Utc;
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::db::Store;
use crate::error::AppError;
use crate::forms::{ArtistForm, SearchForm, ShowForm, VenueForm};
use crate::views::Notice;

#[derive(Clone, Debug)]
pub struct AppContext {
    pub database_path: PathBuf,
}

pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/venues", get(list_venues))
        .route("/venues/search", post(search_venues))
        .route("/venues/create", get(new_venue_form).post(create_venue))
        .route("/venues/:id", get(venue_detail).delete(delete_venue))
        .route("/venues/:id/edit", get(edit_venue_form).post(edit_venue))
        .route("/artists", get(list_artists))
        .route("/artists/search", post(search_artists))
        .route("/artists/create", get(new_artist_form).post(create_artist))
        .route("/artists/:id", get(artist_detail).delete(delete_artist))
        .route("/artists/:id/edit", get(edit_artist_form).post(edit_artist))
        .route("/shows", get(list_shows))
        .route("/shows/create", get(new_show_form).post(create_show))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

/// Runs a store operation on the blocking pool with a store opened just for
/// this call. Dropping the store at the end of the closure releases the
/// connection whether the operation succeeded or not.
async fn with_store<T, F>(ctx: AppContext, op: F) -> Result<T, AppError>
where
    F: FnOnce(&mut Store) -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut store = Store::open(&ctx.database_path)?;
        op(&mut store)
    })
    .await
    .map_err(|err| AppError::internal(format!("store task failed: {err}")))?
}

async fn home() -> Json<serde_json::Value> {
    Json(json!({ "message": "Welcome to Showbill" }))
}

async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "page not found" })),
    )
        .into_response()
}

//  Venues
//  ----------------------------------------------------------------

async fn list_venues(State(ctx): State<AppContext>) -> Result<Response, AppError> {
    let groups = with_store(ctx, |store| store.list_venues(Utc::now())).await?;
    Ok(Json(groups).into_response())
}

async fn search_venues(
    State(ctx): State<AppContext>,
    Form(form): Form<SearchForm>,
) -> Result<Response, AppError> {
    let results =
        with_store(ctx, move |store| store.search_venues(&form.search_term, Utc::now())).await?;
    Ok(Json(results).into_response())
}

async fn venue_detail(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let page = with_store(ctx, move |store| store.venue_page(id, Utc::now())).await?;
    Ok(Json(page).into_response())
}

async fn new_venue_form() -> Json<VenueForm> {
    Json(VenueForm::default())
}

async fn create_venue(State(ctx): State<AppContext>, Form(form): Form<VenueForm>) -> Response {
    let name = form.name.clone();
    let result = match form.into_create_input() {
        Ok(input) => with_store(ctx, move |store| store.create_venue(&input)).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(id) => {
            tracing::info!(venue_id = id, "venue listed");
            (
                StatusCode::CREATED,
                Json(Notice::with_id(
                    format!("Venue {name} was successfully listed!"),
                    id,
                )),
            )
                .into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, "venue create failed");
            (
                err.status(),
                Json(Notice::new(format!(
                    "An error occurred. Venue {name} could not be listed."
                ))),
            )
                .into_response()
        }
    }
}

async fn delete_venue(State(ctx): State<AppContext>, Path(id): Path<i64>) -> Response {
    match with_store(ctx, move |store| store.delete_venue(id)).await {
        Ok(()) => Redirect::to("/").into_response(),
        Err(err) => {
            tracing::error!(venue_id = id, error = %err, "venue delete failed");
            (
                err.status(),
                Json(Notice::new("An error occurred. Venue could not be deleted.")),
            )
                .into_response()
        }
    }
}

async fn edit_venue_form(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let venue = with_store(ctx, move |store| store.get_venue(id)).await?;
    Ok(Json(VenueForm::from_venue(&venue)).into_response())
}

async fn edit_venue(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
    Form(form): Form<VenueForm>,
) -> Response {
    let name = form.name.clone();
    let result = match form.into_edit_input() {
        Ok(input) => with_store(ctx, move |store| store.update_venue(id, &input)).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(()) => Redirect::to(&format!("/venues/{id}")).into_response(),
        Err(err) => {
            tracing::error!(venue_id = id, error = %err, "venue edit failed");
            (
                err.status(),
                Json(Notice::new(format!(
                    "An error occurred. Venue {name} info could not be edited."
                ))),
            )
                .into_response()
        }
    }
}

//  Artists
//  ----------------------------------------------------------------

async fn list_artists(State(ctx): State<AppContext>) -> Result<Response, AppError> {
    let artists = with_store(ctx, |store| store.list_artists()).await?;
    Ok(Json(artists).into_response())
}

async fn search_artists(
    State(ctx): State<AppContext>,
    Form(form): Form<SearchForm>,
) -> Result<Response, AppError> {
    let results =
        with_store(ctx, move |store| store.search_artists(&form.search_term, Utc::now())).await?;
    Ok(Json(results).into_response())
}

async fn artist_detail(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let page = with_store(ctx, move |store| store.artist_page(id, Utc::now())).await?;
    Ok(Json(page).into_response())
}

async fn new_artist_form() -> Json<ArtistForm> {
    Json(ArtistForm::default())
}

async fn create_artist(State(ctx): State<AppContext>, Form(form): Form<ArtistForm>) -> Response {
    let name = form.name.clone();
    let result = match form.into_create_input() {
        Ok(input) => with_store(ctx, move |store| store.create_artist(&input)).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(id) => {
            tracing::info!(artist_id = id, "artist listed");
            (
                StatusCode::CREATED,
                Json(Notice::with_id(
                    format!("Artist {name} was successfully listed!"),
                    id,
                )),
            )
                .into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, "artist create failed");
            (
                err.status(),
                Json(Notice::new(format!(
                    "An error occurred. Artist {name} could not be listed."
                ))),
            )
                .into_response()
        }
    }
}

async fn delete_artist(State(ctx): State<AppContext>, Path(id): Path<i64>) -> Response {
    match with_store(ctx, move |store| store.delete_artist(id)).await {
        Ok(()) => Redirect::to("/").into_response(),
        Err(err) => {
            tracing::error!(artist_id = id, error = %err, "artist delete failed");
            (
                err.status(),
                Json(Notice::new(format!(
                    "An error occurred. Artist could not be deleted: {err}"
                ))),
            )
                .into_response()
        }
    }
}

async fn edit_artist_form(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let artist = with_store(ctx, move |store| store.get_artist(id)).await?;
    Ok(Json(ArtistForm::from_artist(&artist)).into_response())
}

async fn edit_artist(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
    Form(form): Form<ArtistForm>,
) -> Response {
    let name = form.name.clone();
    let result = match form.into_edit_input() {
        Ok(input) => with_store(ctx, move |store| store.update_artist(id, &input)).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(()) => Redirect::to(&format!("/artists/{id}")).into_response(),
        Err(err) => {
            tracing::error!(artist_id = id, error = %err, "artist edit failed");
            (
                err.status(),
                Json(Notice::new(format!(
                    "An error occurred. Artist {name} info could not be edited."
                ))),
            )
                .into_response()
        }
    }
}

//  Shows
//  ----------------------------------------------------------------

async fn list_shows(State(ctx): State<AppContext>) -> Result<Response, AppError> {
    let shows = with_store(ctx, |store| store.list_shows()).await?;
    Ok(Json(shows).into_response())
}

async fn new_show_form() -> Json<ShowForm> {
    Json(ShowForm::default())
}

async fn create_show(State(ctx): State<AppContext>, Form(form): Form<ShowForm>) -> Response {
    let result = match form.into_input() {
        Ok(input) => with_store(ctx, move |store| store.create_show(&input)).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(id) => {
            tracing::info!(show_id = id, "show listed");
            (
                StatusCode::CREATED,
                Json(Notice::with_id("Show was successfully listed!", id)),
            )
                .into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, "show create failed");
            (
                err.status(),
                Json(Notice::new("An error occurred. Show could not be listed.")),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use axum_test::TestServer;
    use serde_json::Value;

    use super::*;

    fn test_server() -> (TestServer, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = AppContext {
            database_path: dir.path().join("showbill.sqlite"),
        };
        let server = TestServer::new(router(ctx)).expect("test server");
        (server, dir)
    }

    fn venue_form(name: &str, city: &str, state: &str) -> VenueForm {
        VenueForm {
            name: name.to_string(),
            city: city.to_string(),
            state: state.to_string(),
            genres: "Rock, Soul".to_string(),
            seeking_talent: "False".to_string(),
            ..VenueForm::default()
        }
    }

    fn artist_form(name: &str, city: &str, state: &str) -> ArtistForm {
        ArtistForm {
            name: name.to_string(),
            city: city.to_string(),
            state: state.to_string(),
            genres: "Jazz".to_string(),
            seeking_venue: "False".to_string(),
            ..ArtistForm::default()
        }
    }

    async fn create_venue_via(server: &TestServer, form: &VenueForm) -> i64 {
        let response = server.post("/venues/create").form(form).await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
        response.json::<Notice>().id.expect("created venue id")
    }

    async fn create_artist_via(server: &TestServer, form: &ArtistForm) -> i64 {
        let response = server.post("/artists/create").form(form).await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
        response.json::<Notice>().id.expect("created artist id")
    }

    #[tokio::test]
    async fn create_venue_then_browse_and_detail() {
        let (server, _dir) = test_server();
        let id = create_venue_via(&server, &venue_form("The Fillmore", "San Francisco", "CA")).await;

        let listing = server.get("/venues").await;
        assert_eq!(listing.status_code(), StatusCode::OK);
        let groups = listing.json::<Value>();
        assert_eq!(groups[0]["city"], "San Francisco");
        assert_eq!(groups[0]["venues"][0]["num_upcoming_shows"], 0);

        let detail = server.get(&format!("/venues/{id}")).await;
        assert_eq!(detail.status_code(), StatusCode::OK);
        let page = detail.json::<Value>();
        assert_eq!(page["name"], "The Fillmore");
        assert_eq!(page["genres"], serde_json::json!(["Rock", "Soul"]));
        assert_eq!(page["past_shows_count"], 0);
    }

    #[tokio::test]
    async fn missing_venue_detail_is_404() {
        let (server, _dir) = test_server();
        let response = server.get("/venues/999").await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_venue_with_missing_fields_is_rejected_with_a_notice() {
        let (server, _dir) = test_server();
        let mut form = venue_form("Mohawk", "Austin", "TX");
        form.genres = String::new();

        let response = server.post("/venues/create").form(&form).await;
        assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        let notice = response.json::<Notice>();
        assert_eq!(
            notice.message,
            "An error occurred. Venue Mohawk could not be listed."
        );
    }

    #[tokio::test]
    async fn venue_search_over_http() {
        let (server, _dir) = test_server();
        create_venue_via(&server, &venue_form("The Fillmore", "San Francisco", "CA")).await;
        create_venue_via(&server, &venue_form("Mohawk", "Austin", "TX")).await;

        let response = server
            .post("/venues/search")
            .form(&SearchForm {
                search_term: "fillmore".to_string(),
            })
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let results = response.json::<Value>();
        assert_eq!(results["count"], 1);
        assert_eq!(results["data"][0]["name"], "The Fillmore");
    }

    #[tokio::test]
    async fn edit_venue_redirects_to_detail() {
        let (server, _dir) = test_server();
        let id = create_venue_via(&server, &venue_form("Old Name", "Boise", "ID")).await;

        let response = server
            .post(&format!("/venues/{id}/edit"))
            .form(&venue_form("New Name", "Boise", "ID"))
            .await;
        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);

        let detail = server.get(&format!("/venues/{id}")).await;
        assert_eq!(detail.json::<Value>()["name"], "New Name");
    }

    #[tokio::test]
    async fn edit_form_is_prefilled() {
        let (server, _dir) = test_server();
        let id = create_venue_via(&server, &venue_form("Mohawk", "Austin", "TX")).await;

        let response = server.get(&format!("/venues/{id}/edit")).await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let form = response.json::<VenueForm>();
        assert_eq!(form.name, "Mohawk");
        assert_eq!(form.genres, "Rock, Soul");
        assert_eq!(form.seeking_talent, "False");
    }

    #[tokio::test]
    async fn delete_venue_cascades_and_redirects() {
        let (server, _dir) = test_server();
        let venue_id = create_venue_via(&server, &venue_form("Doomed", "Boise", "ID")).await;
        let artist_id = create_artist_via(&server, &artist_form("Nile", "Greenville", "SC")).await;

        let show = server
            .post("/shows/create")
            .form(&ShowForm {
                artist_id: artist_id.to_string(),
                venue_id: venue_id.to_string(),
                start_time: "2030-01-01 20:00:00".to_string(),
            })
            .await;
        assert_eq!(show.status_code(), StatusCode::CREATED);

        let response = server.delete(&format!("/venues/{venue_id}")).await;
        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);

        assert_eq!(
            server.get(&format!("/venues/{venue_id}")).await.status_code(),
            StatusCode::NOT_FOUND
        );
        let shows = server.get("/shows").await.json::<Value>();
        assert_eq!(shows.as_array().map(Vec::len), Some(0));
    }

    #[tokio::test]
    async fn delete_artist_with_shows_is_a_conflict() {
        let (server, _dir) = test_server();
        let venue_id = create_venue_via(&server, &venue_form("Hall", "Boise", "ID")).await;
        let artist_id = create_artist_via(&server, &artist_form("Nile", "Greenville", "SC")).await;

        server
            .post("/shows/create")
            .form(&ShowForm {
                artist_id: artist_id.to_string(),
                venue_id: venue_id.to_string(),
                start_time: "2030-01-01 20:00:00".to_string(),
            })
            .await;

        let response = server.delete(&format!("/artists/{artist_id}")).await;
        assert_eq!(response.status_code(), StatusCode::CONFLICT);

        // Artist survives the blocked delete.
        assert_eq!(
            server.get(&format!("/artists/{artist_id}")).await.status_code(),
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn create_show_with_unknown_artist_fails_with_a_notice() {
        let (server, _dir) = test_server();
        let venue_id = create_venue_via(&server, &venue_form("Hall", "Boise", "ID")).await;

        let response = server
            .post("/shows/create")
            .form(&ShowForm {
                artist_id: "424242".to_string(),
                venue_id: venue_id.to_string(),
                start_time: "2030-01-01 20:00:00".to_string(),
            })
            .await;
        assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            response.json::<Notice>().message,
            "An error occurred. Show could not be listed."
        );
    }

    #[tokio::test]
    async fn full_show_listing_over_http() {
        let (server, _dir) = test_server();
        let venue_id = create_venue_via(&server, &venue_form("Hall", "Boise", "ID")).await;
        let artist_id = create_artist_via(&server, &artist_form("Oddisee", "Washington", "DC")).await;

        server
            .post("/shows/create")
            .form(&ShowForm {
                artist_id: artist_id.to_string(),
                venue_id: venue_id.to_string(),
                start_time: "2030-01-01 20:00:00".to_string(),
            })
            .await;

        let listing = server.get("/shows").await.json::<Value>();
        assert_eq!(listing[0]["venue_name"], "Hall");
        assert_eq!(listing[0]["artist_name"], "Oddisee");
    }

    #[tokio::test]
    async fn unknown_routes_fall_back_to_404() {
        let (server, _dir) = test_server();
        let response = server.get("/nowhere").await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    }
}
