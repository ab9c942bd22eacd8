use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ActiveValue, EntityTrait};
use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::entities::{artist, show, venue};
use crate::error::{Error, Result};
use crate::format::format_start_time;
use crate::services::NamedRef;

#[derive(Debug, Serialize)]
pub struct ShowListing {
    pub venue_id: i64,
    pub venue_name: String,
    pub artist_id: i64,
    pub artist_name: String,
    pub artist_image_link: Option<String>,
    pub start_time: String,
}

/// Option lists the new-show form needs.
#[derive(Debug, Serialize)]
pub struct ShowFormOptions {
    pub venues: Vec<NamedRef>,
    pub artists: Vec<NamedRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShowInput {
    pub artist_id: i64,
    pub venue_id: i64,
    pub start_time: DateTime<Utc>,
}

pub struct ShowService {
    db: Arc<Database>,
}

impl ShowService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Every show with its venue and artist, in storage order.
    pub async fn list(&self) -> Result<Vec<ShowListing>> {
        let shows = show::Entity::find()
            .find_also_related(artist::Entity)
            .all(&self.db.conn)
            .await?;

        let mut listings = Vec::new();
        for (s, performer) in shows {
            let performer = performer.ok_or_else(|| Error::not_found("artist", s.artist_id))?;
            let place = venue::Entity::find_by_id(s.venue_id)
                .one(&self.db.conn)
                .await?
                .ok_or_else(|| Error::not_found("venue", s.venue_id))?;
            listings.push(ShowListing {
                venue_id: place.id,
                venue_name: place.name,
                artist_id: performer.id,
                artist_name: performer.name,
                artist_image_link: performer.image_link,
                start_time: format_start_time(s.start_time),
            });
        }

        Ok(listings)
    }

    pub async fn form_options(&self) -> Result<ShowFormOptions> {
        let venues = venue::Entity::find()
            .all(&self.db.conn)
            .await?
            .into_iter()
            .map(|v| NamedRef {
                id: v.id,
                name: v.name,
            })
            .collect();
        let artists = artist::Entity::find()
            .all(&self.db.conn)
            .await?
            .into_iter()
            .map(|a| NamedRef {
                id: a.id,
                name: a.name,
            })
            .collect();
        Ok(ShowFormOptions { venues, artists })
    }

    /// Insert a new show. Both referenced ids are checked up front so a bad
    /// one surfaces as a typed not-found failure rather than a storage-level
    /// constraint violation.
    pub async fn create(&self, input: ShowInput) -> Result<show::Model> {
        if artist::Entity::find_by_id(input.artist_id)
            .one(&self.db.conn)
            .await?
            .is_none()
        {
            return Err(Error::not_found("artist", input.artist_id));
        }
        if venue::Entity::find_by_id(input.venue_id)
            .one(&self.db.conn)
            .await?
            .is_none()
        {
            return Err(Error::not_found("venue", input.venue_id));
        }

        let model = show::ActiveModel {
            id: ActiveValue::NotSet,
            start_time: ActiveValue::Set(input.start_time),
            artist_id: ActiveValue::Set(input.artist_id),
            venue_id: ActiveValue::Set(input.venue_id),
        }
        .insert(&self.db.conn)
        .await?;

        log::info!(
            "Show created: artist {} at venue {} (ID: {})",
            model.artist_id,
            model.venue_id,
            model.id
        );
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_db;
    use chrono::TimeZone;

    async fn insert_artist(db: &Arc<Database>, name: &str) -> artist::Model {
        artist::ActiveModel {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(name.to_string()),
            city: ActiveValue::Set("San Francisco".to_string()),
            state: ActiveValue::Set("CA".to_string()),
            phone: ActiveValue::NotSet,
            website: ActiveValue::NotSet,
            facebook_link: ActiveValue::NotSet,
            image_link: ActiveValue::Set(Some("https://example.com/a.jpg".to_string())),
            seeking_venue: ActiveValue::Set(false),
            seeking_description: ActiveValue::NotSet,
        }
        .insert(&db.conn)
        .await
        .unwrap()
    }

    async fn insert_venue(db: &Arc<Database>, name: &str) -> venue::Model {
        venue::ActiveModel {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(name.to_string()),
            city: ActiveValue::Set("San Francisco".to_string()),
            state: ActiveValue::Set("CA".to_string()),
            address: ActiveValue::NotSet,
            phone: ActiveValue::NotSet,
            website: ActiveValue::NotSet,
            facebook_link: ActiveValue::NotSet,
            image_link: ActiveValue::NotSet,
            seeking_talent: ActiveValue::Set(false),
            seeking_description: ActiveValue::NotSet,
        }
        .insert(&db.conn)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let db = test_db().await;
        let service = ShowService::new(db.clone());

        let performer = insert_artist(&db, "Guns N Petals").await;
        let place = insert_venue(&db, "The Musical Hop").await;

        let start_time = Utc.with_ymd_and_hms(2035, 4, 1, 20, 0, 0).unwrap();
        service
            .create(ShowInput {
                artist_id: performer.id,
                venue_id: place.id,
                start_time,
            })
            .await
            .unwrap();

        let listings = service.list().await.unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].artist_name, "Guns N Petals");
        assert_eq!(listings[0].venue_name, "The Musical Hop");
        assert_eq!(listings[0].start_time, format_start_time(start_time));
    }

    #[tokio::test]
    async fn test_create_checks_artist_exists() {
        let db = test_db().await;
        let service = ShowService::new(db.clone());

        let place = insert_venue(&db, "The Musical Hop").await;
        let err = service
            .create(ShowInput {
                artist_id: 99,
                venue_id: place.id,
                start_time: Utc::now(),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::NotFound {
                entity: "artist",
                id: 99
            }
        ));
    }

    #[tokio::test]
    async fn test_create_checks_venue_exists() {
        let db = test_db().await;
        let service = ShowService::new(db.clone());

        let performer = insert_artist(&db, "Guns N Petals").await;
        let err = service
            .create(ShowInput {
                artist_id: performer.id,
                venue_id: 42,
                start_time: Utc::now(),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::NotFound {
                entity: "venue",
                id: 42
            }
        ));
    }

    #[tokio::test]
    async fn test_form_options_list_all_venues_and_artists() {
        let db = test_db().await;
        let service = ShowService::new(db.clone());

        insert_artist(&db, "Guns N Petals").await;
        insert_artist(&db, "Matt Quevedo").await;
        insert_venue(&db, "The Musical Hop").await;

        let options = service.form_options().await.unwrap();
        assert_eq!(options.artists.len(), 2);
        assert_eq!(options.venues.len(), 1);
    }
}
