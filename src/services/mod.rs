use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use serde::Serialize;

use crate::entities::genre;
use crate::error::Result;

pub mod artist;
pub mod show;
pub mod venue;

/// An id/name pair, used for plain listings and form option lists.
#[derive(Debug, Serialize)]
pub struct NamedRef {
    pub id: i64,
    pub name: String,
}

/// Case-insensitive substring match on a text column. The term is trimmed;
/// an empty term matches every row.
pub(crate) fn name_like<C: ColumnTrait>(column: C, term: &str) -> SimpleExpr {
    let pattern = format!("%{}%", term.trim().to_lowercase());
    Expr::expr(Func::lower(Expr::col(column))).like(pattern)
}

/// Resolve genre names against the seeded vocabulary. Names with no matching
/// row are dropped, not created.
pub(crate) async fn resolve_genres<C: ConnectionTrait>(
    conn: &C,
    names: &[String],
) -> Result<Vec<genre::Model>> {
    if names.is_empty() {
        return Ok(Vec::new());
    }
    let found = genre::Entity::find()
        .filter(genre::Column::Name.is_in(names.iter().map(String::as_str)))
        .all(conn)
        .await?;
    if found.len() < names.len() {
        let dropped: Vec<&str> = names
            .iter()
            .filter(|n| !found.iter().any(|g| &g.name == *n))
            .map(String::as_str)
            .collect();
        log::debug!("Dropping unknown genre names: {:?}", dropped);
    }
    Ok(found)
}

pub(crate) fn require(errors: &mut Vec<String>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(format!("{} is required", field));
    }
}

/// Phone numbers, when present, must carry exactly 10 digits so the detail
/// views can group them XXX-XXX-XXXX.
pub(crate) fn check_phone(errors: &mut Vec<String>, phone: Option<&str>) {
    if let Some(phone) = phone {
        if phone.trim().is_empty() {
            return;
        }
        let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
        if digits != 10 {
            errors.push("phone must contain exactly 10 digits".to_string());
        }
    }
}
