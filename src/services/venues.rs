//! Реестр залов.

use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

use crate::error::{AppError, Entity};
use crate::models::{NewVenue, Venue, VenueChanges};
use crate::store::Store;

#[derive(Clone)]
pub struct VenueRegistry {
    store: Arc<dyn Store>,
}

impl VenueRegistry {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, venue: NewVenue) -> Result<Venue, AppError> {
        venue.validate()?;

        if self.store.find_venue_by_name(&venue.name).await?.is_some() {
            warn!("venue name {:?} is already taken", venue.name);
            return Err(AppError::DuplicateName { name: venue.name });
        }

        let created = self.store.insert_venue(&venue).await?;
        info!("Created venue {} ({}), capacity {}", created.name, created.id, created.capacity);
        Ok(created)
    }

    pub async fn read(&self, id: i64) -> Result<Venue, AppError> {
        self.store
            .find_venue(id)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Venue, id))
    }

    pub async fn list(&self) -> Result<Vec<Venue>, AppError> {
        self.store.list_venues().await
    }

    /// Снижение вместимости ниже текущего числа мест допускается:
    /// ограничение проверяется только при создании места.
    pub async fn update(&self, id: i64, changes: VenueChanges) -> Result<Venue, AppError> {
        changes.validate()?;

        let current = self.read(id).await?;
        if let Some(name) = changes.name.as_deref().filter(|n| *n != current.name) {
            if self.store.find_venue_by_name(name).await?.is_some() {
                warn!("venue {} cannot be renamed to taken name {:?}", id, name);
                return Err(AppError::DuplicateName {
                    name: name.to_string(),
                });
            }
        }

        let updated = self.store.update_venue(id, &changes).await?;
        info!("Updated venue {}", id);
        Ok(updated)
    }

    /// Удаляет зал вместе с его местами. Если хотя бы одно место
    /// забронировано, ничего не удаляется.
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        match self.store.delete_venue(id).await {
            Ok(()) => {
                info!("Deleted venue {}", id);
                Ok(())
            }
            Err(e @ AppError::ReferentialIntegrity { .. }) => {
                warn!("venue {} still has booked seats", id);
                Err(e)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn registry() -> VenueRegistry {
        VenueRegistry::new(Arc::new(MemoryStore::new()))
    }

    fn new_venue(name: &str, capacity: i32) -> NewVenue {
        NewVenue {
            name: name.to_string(),
            location: "Test Location".to_string(),
            capacity,
        }
    }

    #[tokio::test]
    async fn test_create_and_read_venue() {
        let venues = registry();
        let created = venues.create(new_venue("New Venue", 200)).await.unwrap();

        let fetched = venues.read(created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(venues.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let venues = registry();
        venues.create(new_venue("Arena", 10)).await.unwrap();

        let err = venues.create(new_venue("Arena", 20)).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateName { ref name } if name == "Arena"));
        assert_eq!(venues.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_capacity_is_invalid() {
        let venues = registry();
        let err = venues.create(new_venue("Empty", 0)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_read_missing_venue() {
        let err = registry().read(9999).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::NotFound {
                entity: Entity::Venue,
                id: 9999
            }
        ));
    }

    #[tokio::test]
    async fn test_update_venue() {
        let venues = registry();
        let venue = venues.create(new_venue("Test Venue", 5)).await.unwrap();

        let updated = venues
            .update(
                venue.id,
                VenueChanges {
                    name: Some("Updated Venue".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Updated Venue");
        assert_eq!(updated.capacity, 5);

        // Переименование в собственное имя не конфликт
        venues
            .update(
                venue.id,
                VenueChanges {
                    name: Some("Updated Venue".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_rename_onto_taken_name() {
        let venues = registry();
        venues.create(new_venue("First", 5)).await.unwrap();
        let second = venues.create(new_venue("Second", 5)).await.unwrap();

        let err = venues
            .update(
                second.id,
                VenueChanges {
                    name: Some("First".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateName { .. }));
        assert_eq!(venues.read(second.id).await.unwrap().name, "Second");
    }

    #[tokio::test]
    async fn test_delete_empty_venue() {
        let venues = registry();
        let venue = venues.create(new_venue("Test Venue", 5)).await.unwrap();

        venues.delete(venue.id).await.unwrap();
        assert!(venues.list().await.unwrap().is_empty());

        let err = venues.delete(venue.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }
}
