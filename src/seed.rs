use std::sync::Arc;

use chrono::{TimeZone, Utc};
use sea_orm::{EntityTrait, PaginatorTrait};

use crate::database::Database;
use crate::entities::venue;
use crate::error::Result;
use crate::services::artist::{ArtistInput, ArtistService};
use crate::services::show::{ShowInput, ShowService};
use crate::services::venue::{VenueInput, VenueService};

/// Load the demo dataset: three venues, three artists and five shows.
/// Everything goes through the regular mutation layer so ids are assigned by
/// the database and genre names resolve against the seeded vocabulary.
pub async fn seed(db: Arc<Database>) -> Result<()> {
    if venue::Entity::find().count(&db.conn).await? > 0 {
        log::warn!("Database already contains venues; skipping seed");
        return Ok(());
    }

    let venues = VenueService::new(db.clone());
    let artists = ArtistService::new(db.clone());
    let shows = ShowService::new(db.clone());

    log::info!("Seeding demo venues");
    let musical_hop = venues
        .create(VenueInput {
            name: "The Musical Hop".to_string(),
            city: "San Francisco".to_string(),
            state: "CA".to_string(),
            address: Some("1015 Folsom Street".to_string()),
            phone: Some("123-123-1234".to_string()),
            website: Some("https://www.themusicalhop.com".to_string()),
            facebook_link: Some("https://www.facebook.com/TheMusicalHop".to_string()),
            image_link: Some(
                "https://images.unsplash.com/photo-1543900694-133f37abaaa5?w=400".to_string(),
            ),
            seeking_talent: true,
            seeking_description: Some(
                "We are on the lookout for a local artist to play every two weeks. Please call us."
                    .to_string(),
            ),
            // "Swing" is not in the vocabulary and drops out
            genres: vec![
                "Jazz".to_string(),
                "Reggae".to_string(),
                "Swing".to_string(),
                "Classical".to_string(),
                "Folk".to_string(),
            ],
        })
        .await?;

    venues
        .create(VenueInput {
            name: "The Dueling Pianos Bar".to_string(),
            city: "New York".to_string(),
            state: "NY".to_string(),
            address: Some("335 Delancey Street".to_string()),
            phone: Some("914-003-1132".to_string()),
            website: Some("https://www.theduelingpianos.com".to_string()),
            facebook_link: Some("https://www.facebook.com/theduelingpianos".to_string()),
            image_link: Some(
                "https://images.unsplash.com/photo-1497032205916-ac775f0649ae?w=750".to_string(),
            ),
            seeking_talent: false,
            seeking_description: None,
            genres: vec![
                "Classical".to_string(),
                "R&B".to_string(),
                "Hip-Hop".to_string(),
            ],
        })
        .await?;

    let park_square = venues
        .create(VenueInput {
            name: "Park Square Live Music & Coffee".to_string(),
            city: "San Francisco".to_string(),
            state: "CA".to_string(),
            address: Some("34 Whiskey Moore Ave".to_string()),
            phone: Some("415-000-1234".to_string()),
            website: Some("https://www.parksquarelivemusicandcoffee.com".to_string()),
            facebook_link: Some(
                "https://www.facebook.com/ParkSquareLiveMusicAndCoffee".to_string(),
            ),
            image_link: Some(
                "https://images.unsplash.com/photo-1485686531765-ba63b07845a7?w=747".to_string(),
            ),
            seeking_talent: false,
            seeking_description: None,
            genres: vec![
                "Rock n Roll".to_string(),
                "Jazz".to_string(),
                "Classical".to_string(),
                "Folk".to_string(),
            ],
        })
        .await?;

    log::info!("Seeding demo artists");
    let guns_n_petals = artists
        .create(ArtistInput {
            name: "Guns N Petals".to_string(),
            city: "San Francisco".to_string(),
            state: "CA".to_string(),
            phone: Some("326-123-5000".to_string()),
            website: Some("https://www.gunsnpetalsband.com".to_string()),
            facebook_link: Some("https://www.facebook.com/GunsNPetals".to_string()),
            image_link: Some(
                "https://images.unsplash.com/photo-1549213783-8284d0336c4f?w=300".to_string(),
            ),
            seeking_venue: true,
            seeking_description: Some(
                "Looking for shows to perform at in the San Francisco Bay Area!".to_string(),
            ),
            genres: vec!["Rock n Roll".to_string()],
        })
        .await?;

    let matt_quevedo = artists
        .create(ArtistInput {
            name: "Matt Quevedo".to_string(),
            city: "New York".to_string(),
            state: "NY".to_string(),
            phone: Some("300-400-5000".to_string()),
            website: None,
            facebook_link: Some("https://www.facebook.com/mattquevedo923251523".to_string()),
            image_link: Some(
                "https://images.unsplash.com/photo-1495223153807-b916f75de8c5?w=334".to_string(),
            ),
            seeking_venue: false,
            seeking_description: None,
            genres: vec!["Jazz".to_string()],
        })
        .await?;

    let wild_sax_band = artists
        .create(ArtistInput {
            name: "The Wild Sax Band".to_string(),
            city: "San Francisco".to_string(),
            state: "CA".to_string(),
            phone: Some("432-325-5432".to_string()),
            website: None,
            facebook_link: None,
            image_link: Some(
                "https://images.unsplash.com/photo-1558369981-f9ca78462e61?w=794".to_string(),
            ),
            seeking_venue: false,
            seeking_description: None,
            genres: vec!["Jazz".to_string(), "Classical".to_string()],
        })
        .await?;

    log::info!("Seeding demo shows");
    let schedule = [
        (
            guns_n_petals.id,
            musical_hop.id,
            Utc.with_ymd_and_hms(2019, 5, 21, 21, 30, 0).unwrap(),
        ),
        (
            matt_quevedo.id,
            park_square.id,
            Utc.with_ymd_and_hms(2019, 6, 15, 23, 0, 0).unwrap(),
        ),
        (
            wild_sax_band.id,
            park_square.id,
            Utc.with_ymd_and_hms(2035, 4, 1, 20, 0, 0).unwrap(),
        ),
        (
            wild_sax_band.id,
            park_square.id,
            Utc.with_ymd_and_hms(2035, 4, 8, 20, 0, 0).unwrap(),
        ),
        (
            wild_sax_band.id,
            park_square.id,
            Utc.with_ymd_and_hms(2035, 4, 15, 20, 0, 0).unwrap(),
        ),
    ];
    for (artist_id, venue_id, start_time) in schedule {
        shows
            .create(ShowInput {
                artist_id,
                venue_id,
                start_time,
            })
            .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::venue::VenueService;
    use crate::test_utils::test_db;

    #[tokio::test]
    async fn test_seed_loads_demo_data() {
        let db = test_db().await;
        seed(db.clone()).await.unwrap();

        let venues = VenueService::new(db.clone());
        let groups = venues.list_grouped().await.unwrap();
        let total: usize = groups.iter().map(|g| g.venues.len()).sum();
        assert_eq!(total, 3);

        // "Swing" is outside the vocabulary and must have been dropped
        let detail = venues.get_detail(1).await.unwrap();
        let mut genres = detail.genres;
        genres.sort();
        assert_eq!(genres, vec!["Classical", "Folk", "Jazz", "Reggae"]);
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let db = test_db().await;
        seed(db.clone()).await.unwrap();
        seed(db.clone()).await.unwrap();

        let venues = VenueService::new(db.clone());
        let groups = venues.list_grouped().await.unwrap();
        let total: usize = groups.iter().map(|g| g.venues.len()).sum();
        assert_eq!(total, 3);
    }
}
