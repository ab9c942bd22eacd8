use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::entities::{artist, artist_genre, genre, show, venue};
use crate::error::{Error, Result};
use crate::format::{format_phone, format_start_time};
use crate::services::{NamedRef, check_phone, name_like, require, resolve_genres};

#[derive(Debug, Serialize)]
pub struct ArtistSummary {
    pub id: i64,
    pub name: String,
    pub num_upcoming_shows: u64,
}

#[derive(Debug, Serialize)]
pub struct ArtistSearchResults {
    pub count: usize,
    pub data: Vec<ArtistSummary>,
    pub search_term: String,
}

#[derive(Debug, Serialize)]
pub struct ArtistShowInfo {
    pub venue_id: i64,
    pub venue_name: String,
    pub venue_image_link: Option<String>,
    pub start_time: String,
}

#[derive(Debug, Serialize)]
pub struct ArtistDetail {
    pub id: i64,
    pub name: String,
    pub genres: Vec<String>,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
    pub image_link: Option<String>,
    pub past_shows: Vec<ArtistShowInfo>,
    pub past_shows_count: usize,
    pub upcoming_shows: Vec<ArtistShowInfo>,
    pub upcoming_shows_count: usize,
}

/// Current field values of an artist, as the edit form expects them.
#[derive(Debug, Serialize)]
pub struct ArtistFormData {
    pub id: i64,
    pub name: String,
    pub genres: Vec<String>,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
    pub image_link: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistInput {
    pub name: String,
    pub city: String,
    pub state: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub facebook_link: Option<String>,
    #[serde(default)]
    pub image_link: Option<String>,
    #[serde(default)]
    pub seeking_venue: bool,
    #[serde(default)]
    pub seeking_description: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
}

impl ArtistInput {
    fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        require(&mut errors, "name", &self.name);
        require(&mut errors, "city", &self.city);
        require(&mut errors, "state", &self.state);
        check_phone(&mut errors, self.phone.as_deref());
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(errors))
        }
    }
}

pub struct ArtistService {
    db: Arc<Database>,
}

impl ArtistService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// All artists as id/name pairs, in storage order.
    pub async fn list(&self) -> Result<Vec<NamedRef>> {
        let artists = artist::Entity::find().all(&self.db.conn).await?;
        Ok(artists
            .into_iter()
            .map(|a| NamedRef {
                id: a.id,
                name: a.name,
            })
            .collect())
    }

    /// Case-insensitive substring search on artist names. An empty term
    /// matches every artist.
    pub async fn search(&self, term: &str) -> Result<ArtistSearchResults> {
        let now = Utc::now();
        let artists = artist::Entity::find()
            .filter(name_like(artist::Column::Name, term))
            .all(&self.db.conn)
            .await?;

        let mut data = Vec::new();
        for a in artists {
            let num_upcoming_shows = show::Entity::find()
                .filter(show::Column::ArtistId.eq(a.id))
                .filter(show::Column::StartTime.gt(now))
                .count(&self.db.conn)
                .await?;
            data.push(ArtistSummary {
                id: a.id,
                name: a.name,
                num_upcoming_shows,
            });
        }

        Ok(ArtistSearchResults {
            count: data.len(),
            data,
            search_term: term.to_string(),
        })
    }

    /// Detail view for one artist, with shows split into past and upcoming
    /// relative to now.
    pub async fn get_detail(&self, artist_id: i64) -> Result<ArtistDetail> {
        let now = Utc::now();
        let performer = artist::Entity::find_by_id(artist_id)
            .one(&self.db.conn)
            .await?
            .ok_or_else(|| Error::not_found("artist", artist_id))?;

        let genres = performer
            .find_related(genre::Entity)
            .all(&self.db.conn)
            .await?;

        let shows = show::Entity::find()
            .filter(show::Column::ArtistId.eq(artist_id))
            .find_also_related(venue::Entity)
            .all(&self.db.conn)
            .await?;

        let mut past_shows = Vec::new();
        let mut upcoming_shows = Vec::new();
        for (s, place) in shows {
            let place = place.ok_or_else(|| Error::not_found("venue", s.venue_id))?;
            let info = ArtistShowInfo {
                venue_id: place.id,
                venue_name: place.name,
                venue_image_link: place.image_link,
                start_time: format_start_time(s.start_time),
            };
            if s.start_time > now {
                upcoming_shows.push(info);
            } else {
                past_shows.push(info);
            }
        }

        Ok(ArtistDetail {
            id: performer.id,
            name: performer.name,
            genres: genres.into_iter().map(|g| g.name).collect(),
            city: performer.city,
            state: performer.state,
            phone: performer.phone.map(|p| format_phone(&p)),
            website: performer.website,
            facebook_link: performer.facebook_link,
            seeking_venue: performer.seeking_venue,
            seeking_description: performer.seeking_description,
            image_link: performer.image_link,
            past_shows_count: past_shows.len(),
            past_shows,
            upcoming_shows_count: upcoming_shows.len(),
            upcoming_shows,
        })
    }

    /// Current field values for the edit form. Fails with NotFound for an
    /// unknown id.
    pub async fn edit_context(&self, artist_id: i64) -> Result<ArtistFormData> {
        let performer = artist::Entity::find_by_id(artist_id)
            .one(&self.db.conn)
            .await?
            .ok_or_else(|| Error::not_found("artist", artist_id))?;

        let genres = performer
            .find_related(genre::Entity)
            .all(&self.db.conn)
            .await?;

        Ok(ArtistFormData {
            id: performer.id,
            name: performer.name,
            genres: genres.into_iter().map(|g| g.name).collect(),
            city: performer.city,
            state: performer.state,
            phone: performer.phone,
            website: performer.website,
            facebook_link: performer.facebook_link,
            seeking_venue: performer.seeking_venue,
            seeking_description: performer.seeking_description,
            image_link: performer.image_link,
        })
    }

    /// Insert a new artist and its genre associations in one transaction.
    /// Genre names missing from the vocabulary are dropped.
    pub async fn create(&self, input: ArtistInput) -> Result<artist::Model> {
        input.validate()?;
        log::debug!("Creating artist: '{}'", input.name);

        let txn = self.db.conn.begin().await?;

        let model = artist::ActiveModel {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(input.name),
            city: ActiveValue::Set(input.city),
            state: ActiveValue::Set(input.state),
            phone: ActiveValue::Set(input.phone),
            website: ActiveValue::Set(input.website),
            facebook_link: ActiveValue::Set(input.facebook_link),
            image_link: ActiveValue::Set(input.image_link),
            seeking_venue: ActiveValue::Set(input.seeking_venue),
            seeking_description: ActiveValue::Set(input.seeking_description),
        }
        .insert(&txn)
        .await?;

        for g in resolve_genres(&txn, &input.genres).await? {
            artist_genre::Entity::insert(artist_genre::ActiveModel {
                genre_id: ActiveValue::Set(g.id),
                artist_id: ActiveValue::Set(model.id),
            })
            .exec(&txn)
            .await?;
        }

        txn.commit().await?;
        log::info!("Artist created: '{}' (ID: {})", model.name, model.id);
        Ok(model)
    }

    /// Update an artist in place, replacing its genre set wholesale.
    pub async fn update(&self, artist_id: i64, input: ArtistInput) -> Result<artist::Model> {
        input.validate()?;
        let performer = artist::Entity::find_by_id(artist_id)
            .one(&self.db.conn)
            .await?
            .ok_or_else(|| Error::not_found("artist", artist_id))?;

        let txn = self.db.conn.begin().await?;

        let mut active: artist::ActiveModel = performer.into();
        active.name = ActiveValue::Set(input.name);
        active.city = ActiveValue::Set(input.city);
        active.state = ActiveValue::Set(input.state);
        active.phone = ActiveValue::Set(input.phone);
        active.website = ActiveValue::Set(input.website);
        active.facebook_link = ActiveValue::Set(input.facebook_link);
        active.image_link = ActiveValue::Set(input.image_link);
        active.seeking_venue = ActiveValue::Set(input.seeking_venue);
        active.seeking_description = ActiveValue::Set(input.seeking_description);
        let model = active.update(&txn).await?;

        artist_genre::Entity::delete_many()
            .filter(artist_genre::Column::ArtistId.eq(artist_id))
            .exec(&txn)
            .await?;
        for g in resolve_genres(&txn, &input.genres).await? {
            artist_genre::Entity::insert(artist_genre::ActiveModel {
                genre_id: ActiveValue::Set(g.id),
                artist_id: ActiveValue::Set(model.id),
            })
            .exec(&txn)
            .await?;
        }

        txn.commit().await?;
        log::info!("Artist updated: '{}' (ID: {})", model.name, model.id);
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_db;
    use chrono::{Duration, Utc};

    fn artist_input(name: &str) -> ArtistInput {
        ArtistInput {
            name: name.to_string(),
            city: "San Francisco".to_string(),
            state: "CA".to_string(),
            phone: Some("326-123-5000".to_string()),
            website: Some("https://www.gunsnpetalsband.com".to_string()),
            facebook_link: Some("https://www.facebook.com/GunsNPetals".to_string()),
            image_link: Some("https://example.com/artist.jpg".to_string()),
            seeking_venue: true,
            seeking_description: Some("Looking for shows to perform at".to_string()),
            genres: vec!["Rock n Roll".to_string()],
        }
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
            image_link: ActiveValue::Set(Some("https://example.com/v.jpg".to_string())),
            seeking_talent: ActiveValue::Set(false),
            seeking_description: ActiveValue::NotSet,
        }
        .insert(&db.conn)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_list_returns_id_name_pairs() {
        let db = test_db().await;
        let service = ArtistService::new(db.clone());

        service.create(artist_input("Guns N Petals")).await.unwrap();
        service.create(artist_input("Matt Quevedo")).await.unwrap();

        let artists = service.list().await.unwrap();
        assert_eq!(artists.len(), 2);
        assert_eq!(artists[0].name, "Guns N Petals");
        assert_eq!(artists[1].name, "Matt Quevedo");
    }

    #[tokio::test]
    async fn test_search_counts_upcoming_shows() {
        let db = test_db().await;
        let service = ArtistService::new(db.clone());

        let performer = service
            .create(artist_input("The Wild Sax Band"))
            .await
            .unwrap();
        let place = insert_venue(&db, "Park Square Live Music & Coffee").await;

        for offset in [-10i64, 10, 20] {
            show::ActiveModel {
                id: ActiveValue::NotSet,
                start_time: ActiveValue::Set(Utc::now() + Duration::days(offset)),
                artist_id: ActiveValue::Set(performer.id),
                venue_id: ActiveValue::Set(place.id),
            }
            .insert(&db.conn)
            .await
            .unwrap();
        }

        let results = service.search("sax").await.unwrap();
        assert_eq!(results.count, 1);
        assert_eq!(results.data[0].num_upcoming_shows, 2);
    }

    #[tokio::test]
    async fn test_detail_partitions_shows_and_formats_phone() {
        let db = test_db().await;
        let service = ArtistService::new(db.clone());

        let mut input = artist_input("Guns N Petals");
        input.phone = Some("3261235000".to_string());
        let performer = service.create(input).await.unwrap();
        let place = insert_venue(&db, "The Musical Hop").await;

        for offset in [-5i64, 5] {
            show::ActiveModel {
                id: ActiveValue::NotSet,
                start_time: ActiveValue::Set(Utc::now() + Duration::days(offset)),
                artist_id: ActiveValue::Set(performer.id),
                venue_id: ActiveValue::Set(place.id),
            }
            .insert(&db.conn)
            .await
            .unwrap();
        }

        let detail = service.get_detail(performer.id).await.unwrap();
        assert_eq!(detail.past_shows_count, 1);
        assert_eq!(detail.upcoming_shows_count, 1);
        assert_eq!(detail.upcoming_shows[0].venue_name, "The Musical Hop");
        assert_eq!(detail.phone.as_deref(), Some("326-123-5000"));
    }

    #[tokio::test]
    async fn test_concurrent_creates_get_distinct_ids() {
        let db = test_db().await;
        let service = Arc::new(ArtistService::new(db.clone()));

        let s1 = service.clone();
        let s2 = service.clone();
        let (a, b) = tokio::join!(
            tokio::spawn(async move { s1.create(artist_input("Matt Quevedo")).await }),
            tokio::spawn(async move { s2.create(artist_input("The Wild Sax Band")).await }),
        );

        let a = a.unwrap().unwrap();
        let b = b.unwrap().unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_update_replaces_genre_set() {
        let db = test_db().await;
        let service = ArtistService::new(db.clone());

        let mut input = artist_input("The Wild Sax Band");
        input.genres = vec!["Jazz".to_string(), "Classical".to_string()];
        let performer = service.create(input.clone()).await.unwrap();

        input.genres = vec!["Blues".to_string()];
        service.update(performer.id, input).await.unwrap();

        let detail = service.get_detail(performer.id).await.unwrap();
        assert_eq!(detail.genres, vec!["Blues".to_string()]);
    }

    #[tokio::test]
    async fn test_edit_context_not_found() {
        let db = test_db().await;
        let service = ArtistService::new(db.clone());

        let err = service.edit_context(7).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "artist", .. }));
    }
}
