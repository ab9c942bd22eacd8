use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};

use crate::error::Error;
use crate::http_server::routes::MutationOutcome;
use crate::http_server::state::AppState;
use crate::services::show::{ShowFormOptions, ShowInput, ShowListing, ShowService};

pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<ShowListing>>, Error> {
    let service = ShowService::new(state.db.clone());
    Ok(Json(service.list().await?))
}

pub async fn create_form(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ShowFormOptions>, Error> {
    let service = ShowService::new(state.db.clone());
    Ok(Json(service.form_options().await?))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(input): Json<ShowInput>,
) -> Result<(StatusCode, Json<MutationOutcome>), Error> {
    let service = ShowService::new(state.db.clone());
    let show = service.create(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(MutationOutcome {
            id: show.id,
            message: format!("Show {} was successfully listed!", show.id),
        }),
    ))
}
