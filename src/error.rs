use sea_orm::DbErr;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error taxonomy for the query and mutation layers.
///
/// `NotFound` surfaces as a 404 at the HTTP boundary, `Validation` as a 422
/// with the per-field messages, and `Database` as a generic 500 with the
/// underlying cause logged rather than exposed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error(transparent)]
    Database(#[from] DbErr),
}

impl Error {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Error::NotFound { entity, id }
    }
}
