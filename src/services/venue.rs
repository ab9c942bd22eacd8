use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::entities::{artist, genre, show, venue, venue_genre};
use crate::error::{Error, Result};
use crate::format::{format_phone, format_start_time};
use crate::services::{check_phone, name_like, require, resolve_genres};

#[derive(Debug, Serialize)]
pub struct VenueSummary {
    pub id: i64,
    pub name: String,
    pub num_upcoming_shows: u64,
}

#[derive(Debug, Serialize)]
pub struct CityGroup {
    pub city: String,
    pub state: String,
    pub venues: Vec<VenueSummary>,
}

#[derive(Debug, Serialize)]
pub struct VenueSearchResults {
    pub count: usize,
    pub data: Vec<VenueSummary>,
    pub search_term: String,
}

#[derive(Debug, Serialize)]
pub struct VenueShowInfo {
    pub artist_id: i64,
    pub artist_name: String,
    pub artist_image_link: Option<String>,
    pub start_time: String,
}

#[derive(Debug, Serialize)]
pub struct VenueDetail {
    pub id: i64,
    pub name: String,
    pub genres: Vec<String>,
    pub address: Option<String>,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub seeking_talent: bool,
    pub seeking_description: Option<String>,
    pub image_link: Option<String>,
    pub past_shows: Vec<VenueShowInfo>,
    pub past_shows_count: usize,
    pub upcoming_shows: Vec<VenueShowInfo>,
    pub upcoming_shows_count: usize,
}

/// Current field values of a venue, as the edit form expects them.
#[derive(Debug, Serialize)]
pub struct VenueFormData {
    pub id: i64,
    pub name: String,
    pub genres: Vec<String>,
    pub address: Option<String>,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub seeking_talent: bool,
    pub seeking_description: Option<String>,
    pub image_link: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VenueInput {
    pub name: String,
    pub city: String,
    pub state: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub facebook_link: Option<String>,
    #[serde(default)]
    pub image_link: Option<String>,
    #[serde(default)]
    pub seeking_talent: bool,
    #[serde(default)]
    pub seeking_description: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
}

impl VenueInput {
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

pub struct VenueService {
    db: Arc<Database>,
}

impl VenueService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// All venues grouped by (city, state) in first-encounter order, each
    /// annotated with its count of upcoming shows.
    pub async fn list_grouped(&self) -> Result<Vec<CityGroup>> {
        let now = Utc::now();
        let venues = venue::Entity::find().all(&self.db.conn).await?;

        let mut groups: Vec<CityGroup> = Vec::new();
        let mut index: HashMap<(String, String), usize> = HashMap::new();

        for v in venues {
            let num_upcoming_shows = show::Entity::find()
                .filter(show::Column::VenueId.eq(v.id))
                .filter(show::Column::StartTime.gt(now))
                .count(&self.db.conn)
                .await?;

            let summary = VenueSummary {
                id: v.id,
                name: v.name,
                num_upcoming_shows,
            };

            let key = (v.city.clone(), v.state.clone());
            match index.get(&key) {
                Some(&i) => groups[i].venues.push(summary),
                None => {
                    index.insert(key, groups.len());
                    groups.push(CityGroup {
                        city: v.city,
                        state: v.state,
                        venues: vec![summary],
                    });
                }
            }
        }

        Ok(groups)
    }

    /// Case-insensitive substring search on venue names. An empty term
    /// matches every venue.
    pub async fn search(&self, term: &str) -> Result<VenueSearchResults> {
        let now = Utc::now();
        let venues = venue::Entity::find()
            .filter(name_like(venue::Column::Name, term))
            .all(&self.db.conn)
            .await?;

        let mut data = Vec::new();
        for v in venues {
            let num_upcoming_shows = show::Entity::find()
                .filter(show::Column::VenueId.eq(v.id))
                .filter(show::Column::StartTime.gt(now))
                .count(&self.db.conn)
                .await?;
            data.push(VenueSummary {
                id: v.id,
                name: v.name,
                num_upcoming_shows,
            });
        }

        Ok(VenueSearchResults {
            count: data.len(),
            data,
            search_term: term.to_string(),
        })
    }

    /// Detail view for one venue, with its shows split into past and
    /// upcoming relative to now.
    pub async fn get_detail(&self, venue_id: i64) -> Result<VenueDetail> {
        let now = Utc::now();
        let venue = venue::Entity::find_by_id(venue_id)
            .one(&self.db.conn)
            .await?
            .ok_or_else(|| Error::not_found("venue", venue_id))?;

        let genres = venue.find_related(genre::Entity).all(&self.db.conn).await?;

        let shows = show::Entity::find()
            .filter(show::Column::VenueId.eq(venue_id))
            .find_also_related(artist::Entity)
            .all(&self.db.conn)
            .await?;

        let mut past_shows = Vec::new();
        let mut upcoming_shows = Vec::new();
        for (s, performer) in shows {
            let performer = performer.ok_or_else(|| Error::not_found("artist", s.artist_id))?;
            let info = VenueShowInfo {
                artist_id: performer.id,
                artist_name: performer.name,
                artist_image_link: performer.image_link,
                start_time: format_start_time(s.start_time),
            };
            if s.start_time > now {
                upcoming_shows.push(info);
            } else {
                past_shows.push(info);
            }
        }

        Ok(VenueDetail {
            id: venue.id,
            name: venue.name,
            genres: genres.into_iter().map(|g| g.name).collect(),
            address: venue.address,
            city: venue.city,
            state: venue.state,
            phone: venue.phone.map(|p| format_phone(&p)),
            website: venue.website,
            facebook_link: venue.facebook_link,
            seeking_talent: venue.seeking_talent,
            seeking_description: venue.seeking_description,
            image_link: venue.image_link,
            past_shows_count: past_shows.len(),
            past_shows,
            upcoming_shows_count: upcoming_shows.len(),
            upcoming_shows,
        })
    }

    /// Current field values for the edit form. Fails with NotFound for an
    /// unknown id.
    pub async fn edit_context(&self, venue_id: i64) -> Result<VenueFormData> {
        let venue = venue::Entity::find_by_id(venue_id)
            .one(&self.db.conn)
            .await?
            .ok_or_else(|| Error::not_found("venue", venue_id))?;

        let genres = venue.find_related(genre::Entity).all(&self.db.conn).await?;

        Ok(VenueFormData {
            id: venue.id,
            name: venue.name,
            genres: genres.into_iter().map(|g| g.name).collect(),
            address: venue.address,
            city: venue.city,
            state: venue.state,
            phone: venue.phone,
            website: venue.website,
            facebook_link: venue.facebook_link,
            seeking_talent: venue.seeking_talent,
            seeking_description: venue.seeking_description,
            image_link: venue.image_link,
        })
    }

    /// Insert a new venue and its genre associations in one transaction.
    /// Genre names missing from the vocabulary are dropped.
    pub async fn create(&self, input: VenueInput) -> Result<venue::Model> {
        input.validate()?;
        log::debug!("Creating venue: '{}'", input.name);

        let txn = self.db.conn.begin().await?;

        let model = venue::ActiveModel {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(input.name),
            city: ActiveValue::Set(input.city),
            state: ActiveValue::Set(input.state),
            address: ActiveValue::Set(input.address),
            phone: ActiveValue::Set(input.phone),
            website: ActiveValue::Set(input.website),
            facebook_link: ActiveValue::Set(input.facebook_link),
            image_link: ActiveValue::Set(input.image_link),
            seeking_talent: ActiveValue::Set(input.seeking_talent),
            seeking_description: ActiveValue::Set(input.seeking_description),
        }
        .insert(&txn)
        .await?;

        for g in resolve_genres(&txn, &input.genres).await? {
            venue_genre::Entity::insert(venue_genre::ActiveModel {
                genre_id: ActiveValue::Set(g.id),
                venue_id: ActiveValue::Set(model.id),
            })
            .exec(&txn)
            .await?;
        }

        txn.commit().await?;
        log::info!("Venue created: '{}' (ID: {})", model.name, model.id);
        Ok(model)
    }

    /// Update a venue in place, replacing its genre set wholesale.
    pub async fn update(&self, venue_id: i64, input: VenueInput) -> Result<venue::Model> {
        input.validate()?;
        let venue = venue::Entity::find_by_id(venue_id)
            .one(&self.db.conn)
            .await?
            .ok_or_else(|| Error::not_found("venue", venue_id))?;

        let txn = self.db.conn.begin().await?;

        let mut active: venue::ActiveModel = venue.into();
        active.name = ActiveValue::Set(input.name);
        active.city = ActiveValue::Set(input.city);
        active.state = ActiveValue::Set(input.state);
        active.address = ActiveValue::Set(input.address);
        active.phone = ActiveValue::Set(input.phone);
        active.website = ActiveValue::Set(input.website);
        active.facebook_link = ActiveValue::Set(input.facebook_link);
        active.image_link = ActiveValue::Set(input.image_link);
        active.seeking_talent = ActiveValue::Set(input.seeking_talent);
        active.seeking_description = ActiveValue::Set(input.seeking_description);
        let model = active.update(&txn).await?;

        venue_genre::Entity::delete_many()
            .filter(venue_genre::Column::VenueId.eq(venue_id))
            .exec(&txn)
            .await?;
        for g in resolve_genres(&txn, &input.genres).await? {
            venue_genre::Entity::insert(venue_genre::ActiveModel {
                genre_id: ActiveValue::Set(g.id),
                venue_id: ActiveValue::Set(model.id),
            })
            .exec(&txn)
            .await?;
        }

        txn.commit().await?;
        log::info!("Venue updated: '{}' (ID: {})", model.name, model.id);
        Ok(model)
    }

    /// Delete a venue by resolved entity, taking its dependent shows and
    /// genre associations with it in the same transaction. Returns the
    /// deleted venue's name.
    pub async fn delete(&self, venue_id: i64) -> Result<String> {
        let venue = venue::Entity::find_by_id(venue_id)
            .one(&self.db.conn)
            .await?
            .ok_or_else(|| Error::not_found("venue", venue_id))?;
        let name = venue.name.clone();

        let txn = self.db.conn.begin().await?;
        show::Entity::delete_many()
            .filter(show::Column::VenueId.eq(venue_id))
            .exec(&txn)
            .await?;
        venue_genre::Entity::delete_many()
            .filter(venue_genre::Column::VenueId.eq(venue_id))
            .exec(&txn)
            .await?;
        venue.delete(&txn).await?;
        txn.commit().await?;

        log::info!("Venue deleted: '{}' (ID: {})", name, venue_id);
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::artist;
    use crate::test_utils::test_db;
    use chrono::{Duration, Utc};

    fn venue_input(name: &str, city: &str, state: &str) -> VenueInput {
        VenueInput {
            name: name.to_string(),
            city: city.to_string(),
            state: state.to_string(),
            address: Some("1015 Folsom Street".to_string()),
            phone: Some("1231231234".to_string()),
            website: Some("https://example.com".to_string()),
            facebook_link: None,
            image_link: Some("https://example.com/venue.jpg".to_string()),
            seeking_talent: true,
            seeking_description: Some("Looking for local artists".to_string()),
            genres: vec!["Jazz".to_string()],
        }
    }

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

    async fn insert_show(
        db: &Arc<Database>,
        artist_id: i64,
        venue_id: i64,
        start_time: chrono::DateTime<Utc>,
    ) -> show::Model {
        show::ActiveModel {
            id: ActiveValue::NotSet,
            start_time: ActiveValue::Set(start_time),
            artist_id: ActiveValue::Set(artist_id),
            venue_id: ActiveValue::Set(venue_id),
        }
        .insert(&db.conn)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_grouped_listing_contains_each_venue_once() {
        let db = test_db().await;
        let service = VenueService::new(db.clone());

        service
            .create(venue_input("The Musical Hop", "San Francisco", "CA"))
            .await
            .unwrap();
        service
            .create(venue_input("The Dueling Pianos Bar", "New York", "NY"))
            .await
            .unwrap();
        service
            .create(venue_input(
                "Park Square Live Music & Coffee",
                "San Francisco",
                "CA",
            ))
            .await
            .unwrap();

        let groups = service.list_grouped().await.unwrap();
        assert_eq!(groups.len(), 2);

        let sf = groups
            .iter()
            .find(|g| g.city == "San Francisco" && g.state == "CA")
            .unwrap();
        assert_eq!(sf.venues.len(), 2);

        let ny = groups
            .iter()
            .find(|g| g.city == "New York" && g.state == "NY")
            .unwrap();
        assert_eq!(ny.venues.len(), 1);

        let total: usize = groups.iter().map(|g| g.venues.len()).sum();
        assert_eq!(total, 3);
    }

    #[tokio::test]
    async fn test_grouped_listing_counts_only_upcoming_shows() {
        let db = test_db().await;
        let service = VenueService::new(db.clone());

        let venue = service
            .create(venue_input("The Musical Hop", "San Francisco", "CA"))
            .await
            .unwrap();
        let performer = insert_artist(&db, "Guns N Petals").await;

        insert_show(&db, performer.id, venue.id, Utc::now() - Duration::days(30)).await;
        insert_show(&db, performer.id, venue.id, Utc::now() + Duration::days(30)).await;

        let groups = service.list_grouped().await.unwrap();
        assert_eq!(groups[0].venues[0].num_upcoming_shows, 1);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_substring() {
        let db = test_db().await;
        let service = VenueService::new(db.clone());

        service
            .create(venue_input("The Musical Hop", "San Francisco", "CA"))
            .await
            .unwrap();
        service
            .create(venue_input(
                "Park Square Live Music & Coffee",
                "San Francisco",
                "CA",
            ))
            .await
            .unwrap();

        let results = service.search("hop").await.unwrap();
        assert_eq!(results.count, 1);
        assert_eq!(results.data[0].name, "The Musical Hop");

        let results = service.search("Music").await.unwrap();
        assert_eq!(results.count, 2);

        let results = service.search("").await.unwrap();
        assert_eq!(results.count, 2);

        let results = service.search("zzz").await.unwrap();
        assert_eq!(results.count, 0);
    }

    #[tokio::test]
    async fn test_detail_partitions_past_and_upcoming_shows() {
        let db = test_db().await;
        let service = VenueService::new(db.clone());

        let venue = service
            .create(venue_input("The Musical Hop", "San Francisco", "CA"))
            .await
            .unwrap();
        let performer = insert_artist(&db, "Guns N Petals").await;

        insert_show(&db, performer.id, venue.id, Utc::now() - Duration::days(7)).await;
        insert_show(&db, performer.id, venue.id, Utc::now() + Duration::days(7)).await;

        let detail = service.get_detail(venue.id).await.unwrap();
        assert_eq!(detail.past_shows_count, 1);
        assert_eq!(detail.past_shows.len(), 1);
        assert_eq!(detail.upcoming_shows_count, 1);
        assert_eq!(detail.upcoming_shows.len(), 1);
        assert_eq!(detail.past_shows[0].artist_name, "Guns N Petals");
    }

    #[tokio::test]
    async fn test_detail_formats_phone() {
        let db = test_db().await;
        let service = VenueService::new(db.clone());

        let venue = service
            .create(venue_input("The Musical Hop", "San Francisco", "CA"))
            .await
            .unwrap();

        let detail = service.get_detail(venue.id).await.unwrap();
        assert_eq!(detail.phone.as_deref(), Some("123-123-1234"));
    }

    #[tokio::test]
    async fn test_detail_not_found() {
        let db = test_db().await;
        let service = VenueService::new(db.clone());

        let err = service.get_detail(999).await.unwrap_err();
        assert!(matches!(
            err,
            Error::NotFound {
                entity: "venue",
                id: 999
            }
        ));
    }

    #[tokio::test]
    async fn test_create_drops_unknown_genre_names() {
        let db = test_db().await;
        let service = VenueService::new(db.clone());

        let mut input = venue_input("The Musical Hop", "San Francisco", "CA");
        input.genres = vec!["Jazz".to_string(), "Nonexistent".to_string()];
        let venue = service.create(input).await.unwrap();

        let detail = service.get_detail(venue.id).await.unwrap();
        assert_eq!(detail.genres, vec!["Jazz".to_string()]);
    }

    #[tokio::test]
    async fn test_create_round_trip() {
        let db = test_db().await;
        let service = VenueService::new(db.clone());

        let input = venue_input("The Musical Hop", "San Francisco", "CA");
        let venue = service.create(input.clone()).await.unwrap();

        let detail = service.get_detail(venue.id).await.unwrap();
        assert_eq!(detail.name, input.name);
        assert_eq!(detail.city, input.city);
        assert_eq!(detail.state, input.state);
        assert_eq!(detail.address, input.address);
        assert_eq!(detail.website, input.website);
        assert_eq!(detail.image_link, input.image_link);
        assert_eq!(detail.seeking_talent, input.seeking_talent);
        assert_eq!(detail.seeking_description, input.seeking_description);
        assert_eq!(detail.genres, input.genres);
    }

    #[tokio::test]
    async fn test_create_rejects_missing_required_fields() {
        let db = test_db().await;
        let service = VenueService::new(db.clone());

        let mut input = venue_input("", "San Francisco", "CA");
        input.phone = Some("12345".to_string());
        let err = service.create(input).await.unwrap_err();

        match err {
            Error::Validation(messages) => {
                assert!(messages.iter().any(|m| m.contains("name")));
                assert!(messages.iter().any(|m| m.contains("phone")));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_replaces_genre_set() {
        let db = test_db().await;
        let service = VenueService::new(db.clone());

        let mut input = venue_input("The Musical Hop", "San Francisco", "CA");
        input.genres = vec!["Jazz".to_string(), "Folk".to_string()];
        let venue = service.create(input.clone()).await.unwrap();

        input.genres = vec!["Reggae".to_string()];
        service.update(venue.id, input).await.unwrap();

        let detail = service.get_detail(venue.id).await.unwrap();
        assert_eq!(detail.genres, vec!["Reggae".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_missing_venue_is_not_found() {
        let db = test_db().await;
        let service = VenueService::new(db.clone());

        let err = service.delete(42).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "venue", .. }));
    }

    #[tokio::test]
    async fn test_delete_removes_shows_and_genre_links() {
        let db = test_db().await;
        let service = VenueService::new(db.clone());

        let venue = service
            .create(venue_input("The Musical Hop", "San Francisco", "CA"))
            .await
            .unwrap();
        let performer = insert_artist(&db, "Guns N Petals").await;
        insert_show(&db, performer.id, venue.id, Utc::now() + Duration::days(7)).await;

        let name = service.delete(venue.id).await.unwrap();
        assert_eq!(name, "The Musical Hop");

        assert!(
            venue::Entity::find_by_id(venue.id)
                .one(&db.conn)
                .await
                .unwrap()
                .is_none()
        );
        let remaining_shows = show::Entity::find()
            .filter(show::Column::VenueId.eq(venue.id))
            .count(&db.conn)
            .await
            .unwrap();
        assert_eq!(remaining_shows, 0);
        let remaining_links = venue_genre::Entity::find()
            .filter(venue_genre::Column::VenueId.eq(venue.id))
            .count(&db.conn)
            .await
            .unwrap();
        assert_eq!(remaining_links, 0);
    }
}
