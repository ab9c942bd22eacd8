use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::entities::genre;
use crate::error::Result;

pub mod artists;
pub mod shows;
pub mod venues;

#[derive(Debug, Deserialize)]
pub struct SearchPayload {
    #[serde(default)]
    pub search_term: String,
}

/// Success signal handed back after a create/update/delete.
#[derive(Debug, Serialize)]
pub struct MutationOutcome {
    pub id: i64,
    pub message: String,
}

/// Context for the new-venue/new-artist forms: the genre vocabulary.
#[derive(Debug, Serialize)]
pub struct GenreOptions {
    pub genres: Vec<String>,
}

pub(crate) async fn genre_names(db: &Database) -> Result<Vec<String>> {
    let genres = genre::Entity::find().all(&db.conn).await?;
    Ok(genres.into_iter().map(|g| g.name).collect())
}
