use axum::Router;
use axum::extract::{Form, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, Json, Redirect};
use axum::routing::{get, post};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::app::session::AppState;
use crate::dashboard::{Dashboard, render_html};
use crate::formats::BookRecord;
use crate::ingest::NewBook;
use crate::store::StoreError;

type HandlerError = (StatusCode, String);

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok\n" }))
        .route("/", get(index))
        .route("/books", post(add_book_form))
        .route("/api/dashboard", get(dashboard_json))
        .route("/api/books", post(add_book_json))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct IndexQuery {
    added: Option<String>,
}

async fn index(
    State(state): State<AppState>,
    Query(q): Query<IndexQuery>,
) -> Result<Html<String>, HandlerError> {
    let dashboard = state.dashboard().await.map_err(store_failure)?;
    let notice = q.added.is_some().then_some("Book added!");
    Ok(Html(render_html(&dashboard, notice)))
}

async fn dashboard_json(State(state): State<AppState>) -> Result<Json<Dashboard>, HandlerError> {
    let dashboard = state.dashboard().await.map_err(store_failure)?;
    Ok(Json(dashboard))
}

async fn add_book_form(
    State(state): State<AppState>,
    Form(input): Form<NewBook>,
) -> Result<Redirect, HandlerError> {
    require_title_and_author(&input)?;
    let record = state.add_book(input).await.map_err(store_failure)?;

    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("added", &record.title)
        .finish();
    Ok(Redirect::to(&format!("/?{query}")))
}

async fn add_book_json(
    State(state): State<AppState>,
    Json(input): Json<NewBook>,
) -> Result<(StatusCode, Json<BookRecord>), HandlerError> {
    require_title_and_author(&input)?;
    let record = state.add_book(input).await.map_err(store_failure)?;
    Ok((StatusCode::CREATED, Json(record)))
}

fn require_title_and_author(input: &NewBook) -> Result<(), HandlerError> {
    if input.title.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "title is required".to_owned()));
    }
    if input.author.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "author is required".to_owned()));
    }
    Ok(())
}

fn store_failure(err: StoreError) -> HandlerError {
    let err = anyhow::Error::from(err);
    tracing::error!(?err, "record store failure");
    (
        StatusCode::SERVICE_UNAVAILABLE,
        format!("{err:#}\nrestore the books file or recreate it with `readtrack init`\n"),
    )
}
