use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::error::Error;
use crate::http_server::routes::{GenreOptions, MutationOutcome, SearchPayload, genre_names};
use crate::http_server::state::AppState;
use crate::services::venue::{
    CityGroup, VenueDetail, VenueFormData, VenueInput, VenueSearchResults, VenueService,
};

pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<CityGroup>>, Error> {
    let service = VenueService::new(state.db.clone());
    Ok(Json(service.list_grouped().await?))
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SearchPayload>,
) -> Result<Json<VenueSearchResults>, Error> {
    let service = VenueService::new(state.db.clone());
    Ok(Json(service.search(&payload.search_term).await?))
}

pub async fn detail(
    State(state): State<Arc<AppState>>,
    Path(venue_id): Path<i64>,
) -> Result<Json<VenueDetail>, Error> {
    let service = VenueService::new(state.db.clone());
    Ok(Json(service.get_detail(venue_id).await?))
}

pub async fn create_form(State(state): State<Arc<AppState>>) -> Result<Json<GenreOptions>, Error> {
    Ok(Json(GenreOptions {
        genres: genre_names(&state.db).await?,
    }))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(input): Json<VenueInput>,
) -> Result<(StatusCode, Json<MutationOutcome>), Error> {
    let service = VenueService::new(state.db.clone());
    let venue = service.create(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(MutationOutcome {
            id: venue.id,
            message: format!("Venue {} was successfully listed!", venue.name),
        }),
    ))
}

pub async fn edit_form(
    State(state): State<Arc<AppState>>,
    Path(venue_id): Path<i64>,
) -> Result<Json<VenueFormData>, Error> {
    let service = VenueService::new(state.db.clone());
    Ok(Json(service.edit_context(venue_id).await?))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(venue_id): Path<i64>,
    Json(input): Json<VenueInput>,
) -> Result<Json<MutationOutcome>, Error> {
    let service = VenueService::new(state.db.clone());
    let venue = service.update(venue_id, input).await?;
    Ok(Json(MutationOutcome {
        id: venue.id,
        message: "Venue successfully updated.".to_string(),
    }))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(venue_id): Path<i64>,
) -> Result<Json<MutationOutcome>, Error> {
    let service = VenueService::new(state.db.clone());
    let name = service.delete(venue_id).await?;
    Ok(Json(MutationOutcome {
        id: venue_id,
        message: format!("Venue {} was successfully deleted.", name),
    }))
}
