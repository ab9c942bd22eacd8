use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::error::Error;
use crate::http_server::routes::{GenreOptions, MutationOutcome, SearchPayload, genre_names};
use crate::http_server::state::AppState;
use crate::services::NamedRef;
use crate::services::artist::{
    ArtistDetail, ArtistFormData, ArtistInput, ArtistSearchResults, ArtistService,
};

pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<NamedRef>>, Error> {
    let service = ArtistService::new(state.db.clone());
    Ok(Json(service.list().await?))
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SearchPayload>,
) -> Result<Json<ArtistSearchResults>, Error> {
    let service = ArtistService::new(state.db.clone());
    Ok(Json(service.search(&payload.search_term).await?))
}

pub async fn detail(
    State(state): State<Arc<AppState>>,
    Path(artist_id): Path<i64>,
) -> Result<Json<ArtistDetail>, Error> {
    let service = ArtistService::new(state.db.clone());
    Ok(Json(service.get_detail(artist_id).await?))
}

pub async fn create_form(State(state): State<Arc<AppState>>) -> Result<Json<GenreOptions>, Error> {
    Ok(Json(GenreOptions {
        genres: genre_names(&state.db).await?,
    }))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(input): Json<ArtistInput>,
) -> Result<(StatusCode, Json<MutationOutcome>), Error> {
    let service = ArtistService::new(state.db.clone());
    let artist = service.create(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(MutationOutcome {
            id: artist.id,
            message: format!("Artist {} was successfully listed!", artist.name),
        }),
    ))
}

pub async fn edit_form(
    State(state): State<Arc<AppState>>,
    Path(artist_id): Path<i64>,
) -> Result<Json<ArtistFormData>, Error> {
    let service = ArtistService::new(state.db.clone());
    Ok(Json(service.edit_context(artist_id).await?))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(artist_id): Path<i64>,
    Json(input): Json<ArtistInput>,
) -> Result<Json<MutationOutcome>, Error> {
    let service = ArtistService::new(state.db.clone());
    let artist = service.update(artist_id, input).await?;
    Ok(Json(MutationOutcome {
        id: artist.id,
        message: "Artist successfully updated.".to_string(),
    }))
}
