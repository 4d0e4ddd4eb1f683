use anyhow::anyhow;
use chrono::Utc;
use collegium_core::{AppError, Paginated, PaginationParams};
use collegium_models::events::{
    CreateEventDto, Event, EventDetails, EventFilterParams, EventType, NewEvent,
    RegistrationStatus, UpdateEventDto,
};
use collegium_models::images::AddGalleryImageDto;
use collegium_models::{EventId, GalleryImage, UserId, UserSummary};
use tracing::{debug, info, instrument, warn};

use super::repository::{RegistrationOutcome, UnregistrationOutcome};
use crate::store::Repositories;
use crate::utils::image_cleanup::ImageCleanup;

pub struct EventService;

fn event_not_found() -> AppError {
    AppError::not_found(anyhow!("Event not found"))
}

impl EventService {
    async fn require_event(repos: &Repositories, id: EventId) -> Result<Event, AppError> {
        repos
            .events
            .find_by_id(id)
            .await?
            .ok_or_else(event_not_found)
    }

    #[instrument(skip(repos, dto), fields(db.operation = "INSERT", db.table = "events"))]
    pub async fn create_event(
        repos: &Repositories,
        created_by: UserId,
        dto: CreateEventDto,
    ) -> Result<Event, AppError> {
        if dto.end_date < dto.start_date {
            return Err(AppError::bad_request(anyhow!(
                "End date must be after start date"
            )));
        }
        let event = repos
            .events
            .create(NewEvent {
                event_name: dto.event_name,
                description: dto.description,
                event_type: dto.event_type,
                category: dto.category,
                start_date: dto.start_date,
                end_date: dto.end_date,
                venue: dto.venue,
                organizer: dto.organizer,
                image: dto.image,
                registration_link: dto.registration_link,
                max_participants: dto.max_participants,
                is_featured: dto.is_featured,
                created_by: Some(created_by),
            })
            .await?;
        info!(event.id = %event.id, event_type = %event.event_type, "event created");
        Ok(event)
    }

    #[instrument(skip(repos, cleanup, dto), fields(db.operation = "UPDATE", db.table = "events"))]
    pub async fn update_event(
        repos: &Repositories,
        cleanup: &ImageCleanup,
        id: EventId,
        dto: UpdateEventDto,
    ) -> Result<Event, AppError> {
        let mut event = Self::require_event(repos, id).await?;
        let replaced = dto.apply(&mut event);

        if event.end_date < event.start_date {
            return Err(AppError::bad_request(anyhow!(
                "End date must be after start date"
            )));
        }
        if event
            .max_participants
            .is_some_and(|max| max < event.participant_count)
        {
            return Err(AppError::bad_request(anyhow!(
                "Max participants cannot be less than current participants"
            )));
        }

        let event = repos.events.update(&event).await?;
        if let Some(public_id) = replaced {
            cleanup.delete_one(&public_id).await;
        }
        Ok(event)
    }

    /// Deletes the row, then the main image and every gallery image.
    #[instrument(skip(repos, cleanup), fields(db.operation = "DELETE", db.table = "events"))]
    pub async fn delete_event(
        repos: &Repositories,
        cleanup: &ImageCleanup,
        id: EventId,
    ) -> Result<(), AppError> {
        let event = Self::require_event(repos, id).await?;
        if !repos.events.delete(id).await? {
            return Err(event_not_found());
        }
        cleanup.delete_all(event.image_public_ids()).await;
        info!(event.id = %id, "event deleted");
        Ok(())
    }

    #[instrument(skip(repos))]
    pub async fn get_event(repos: &Repositories, id: EventId) -> Result<EventDetails, AppError> {
        let event = Self::require_event(repos, id).await?;

        let creator = match event.created_by {
            Some(user_id) => repos
                .users
                .find_by_id(user_id)
                .await?
                .map(|u| UserSummary::from(&u)),
            None => None,
        };

        let participant_ids = repos.events.participants(id).await?;
        let users = repos.users.find_many(&participant_ids).await?;
        let participants = participant_ids
            .iter()
            .filter_map(|pid| users.iter().find(|u| u.id == *pid))
            .map(UserSummary::from)
            .collect();

        Ok(EventDetails {
            event,
            creator,
            participants,
        })
    }

    #[instrument(skip(repos))]
    pub async fn list_events(
        repos: &Repositories,
        filters: EventFilterParams,
    ) -> Result<Paginated<Event>, AppError> {
        repos.events.list(&filters).await
    }

    #[instrument(skip(repos))]
    pub async fn upcoming(
        repos: &Repositories,
        pagination: PaginationParams,
    ) -> Result<Paginated<Event>, AppError> {
        repos.events.upcoming(&pagination).await
    }

    #[instrument(skip(repos))]
    pub async fn past(
        repos: &Repositories,
        pagination: PaginationParams,
    ) -> Result<Paginated<Event>, AppError> {
        repos.events.past(&pagination).await
    }

    #[instrument(skip(repos))]
    pub async fn featured(repos: &Repositories) -> Result<Vec<Event>, AppError> {
        repos.events.featured().await
    }

    #[instrument(skip(repos))]
    pub async fn list_by_type(
        repos: &Repositories,
        event_type: EventType,
    ) -> Result<Vec<Event>, AppError> {
        repos.events.list_by_type(event_type).await
    }

    #[instrument(skip(repos), fields(event.id = %id, user.id = %user_id))]
    pub async fn register(
        repos: &Repositories,
        id: EventId,
        user_id: UserId,
    ) -> Result<Event, AppError> {
        match repos.events.register(id, user_id).await? {
            RegistrationOutcome::Registered(event) => {
                info!(participants = event.participant_count, "registered for event");
                Ok(event)
            }
            RegistrationOutcome::NotFound => Err(event_not_found()),
            RegistrationOutcome::Ended => {
                Err(AppError::bad_request(anyhow!("Event has already ended")))
            }
            RegistrationOutcome::AlreadyRegistered => Err(AppError::bad_request(anyhow!(
                "Already registered for this event"
            ))),
            RegistrationOutcome::Full => {
                debug!("event is at capacity");
                Err(AppError::bad_request(anyhow!("Event is full")))
            }
        }
    }

    #[instrument(skip(repos), fields(event.id = %id, user.id = %user_id))]
    pub async fn unregister(
        repos: &Repositories,
        id: EventId,
        user_id: UserId,
    ) -> Result<Event, AppError> {
        match repos.events.unregister(id, user_id).await? {
            UnregistrationOutcome::Unregistered(event) => {
                info!(participants = event.participant_count, "unregistered from event");
                Ok(event)
            }
            UnregistrationOutcome::NotFound => Err(event_not_found()),
            UnregistrationOutcome::NotRegistered => Err(AppError::bad_request(anyhow!(
                "Not registered for this event"
            ))),
        }
    }

    #[instrument(skip(repos))]
    pub async fn registration_status(
        repos: &Repositories,
        id: EventId,
        user_id: UserId,
    ) -> Result<RegistrationStatus, AppError> {
        let event = Self::require_event(repos, id).await?;
        let is_registered = repos.events.is_registered(id, user_id).await?;
        Ok(RegistrationStatus {
            event_id: id,
            is_registered,
            participant_count: event.participant_count,
            max_participants: event.max_participants,
            spots_left: event
                .max_participants
                .map(|max| (max - event.participant_count).max(0)),
            has_ended: event.has_ended(Utc::now()),
        })
    }

    #[instrument(skip(repos, dto))]
    pub async fn add_gallery_image(
        repos: &Repositories,
        id: EventId,
        dto: AddGalleryImageDto,
    ) -> Result<Event, AppError> {
        let image = GalleryImage {
            url: dto.image.url,
            public_id: dto.image.public_id,
            caption: dto.caption,
            uploaded_at: Utc::now(),
        };
        repos
            .events
            .add_gallery_image(id, image)
            .await?
            .ok_or_else(event_not_found)
    }

    #[instrument(skip(repos, cleanup))]
    pub async fn remove_gallery_image(
        repos: &Repositories,
        cleanup: &ImageCleanup,
        id: EventId,
        public_id: &str,
    ) -> Result<Event, AppError> {
        let event = Self::require_event(repos, id).await?;
        if !event.images.iter().any(|i| i.public_id == public_id) {
            warn!(event.id = %id, public_id, "gallery image not found");
            return Err(AppError::not_found(anyhow!("Image not found")));
        }

        let event = repos
            .events
            .remove_gallery_image(id, public_id)
            .await?
            .ok_or_else(event_not_found)?;
        cleanup.delete_one(public_id).await;
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use axum::http::StatusCode;
    use chrono::Duration;
    use collegium_core::image_storage::MemoryImageStorage;
    use collegium_models::ImageRef;
    use std::sync::Arc;

    fn setup() -> (Repositories, ImageCleanup, MemoryImageStorage) {
        let repos = Repositories::from_memory(MemoryStore::new());
        let storage = MemoryImageStorage::new();
        let cleanup = ImageCleanup::new(
            Arc::new(storage.clone()),
            repos.pending_image_deletions.clone(),
        );
        (repos, cleanup, storage)
    }

    fn image(public_id: &str) -> ImageRef {
        ImageRef {
            url: format!("https://cdn.example.com/{}.png", public_id),
            public_id: public_id.to_string(),
        }
    }

    fn dto(days_from_now: i64, max: Option<i32>) -> CreateEventDto {
        let start = Utc::now() + Duration::days(days_from_now);
        CreateEventDto {
            event_name: "Hackathon".to_string(),
            description: "Twenty four hour build sprint".to_string(),
            event_type: EventType::Technical,
            category: None,
            start_date: start,
            end_date: start + Duration::hours(24),
            venue: "Lab 3".to_string(),
            organizer: "CS Club".to_string(),
            image: image("events/hack"),
            registration_link: None,
            max_participants: max,
            is_featured: false,
        }
    }

    #[tokio::test]
    async fn test_capacity_is_never_exceeded() {
        let (repos, ..) = setup();
        let event = EventService::create_event(&repos, UserId::new(), dto(2, Some(2)))
            .await
            .unwrap();

        EventService::register(&repos, event.id, UserId::new()).await.unwrap();
        EventService::register(&repos, event.id, UserId::new()).await.unwrap();
        let err = EventService::register(&repos, event.id, UserId::new())
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Event is full");

        let stored = repos.events.find_by_id(event.id).await.unwrap().unwrap();
        assert_eq!(stored.participant_count, 2);
    }

    #[tokio::test]
    async fn test_concurrent_registrations_respect_capacity() {
        let (repos, ..) = setup();
        let event = EventService::create_event(&repos, UserId::new(), dto(2, Some(3)))
            .await
            .unwrap();

        let attempts: Vec<_> = (0..10)
            .map(|_| {
                let repos = repos.clone();
                tokio::spawn(async move {
                    EventService::register(&repos, event.id, UserId::new()).await
                })
            })
            .collect();
        let mut accepted = 0;
        for attempt in attempts {
            if attempt.await.unwrap().is_ok() {
                accepted += 1;
            }
        }

        assert_eq!(accepted, 3);
        let stored = repos.events.find_by_id(event.id).await.unwrap().unwrap();
        assert_eq!(stored.participant_count, 3);
    }

    #[tokio::test]
    async fn test_duplicate_registration_and_unregister() {
        let (repos, ..) = setup();
        let user = UserId::new();
        let event = EventService::create_event(&repos, UserId::new(), dto(1, None))
            .await
            .unwrap();

        EventService::register(&repos, event.id, user).await.unwrap();
        let err = EventService::register(&repos, event.id, user).await.unwrap_err();
        assert_eq!(err.message(), "Already registered for this event");

        let status = EventService::registration_status(&repos, event.id, user)
            .await
            .unwrap();
        assert!(status.is_registered);
        assert_eq!(status.participant_count, 1);
        assert!(status.spots_left.is_none());

        let event = EventService::unregister(&repos, event.id, user).await.unwrap();
        assert_eq!(event.participant_count, 0);
        let err = EventService::unregister(&repos, event.id, user).await.unwrap_err();
        assert_eq!(err.message(), "Not registered for this event");
    }

    #[tokio::test]
    async fn test_ended_and_unknown_events_refuse_registration() {
        let (repos, ..) = setup();
        let event = EventService::create_event(&repos, UserId::new(), dto(-3, None))
            .await
            .unwrap();
        let err = EventService::register(&repos, event.id, UserId::new())
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Event has already ended");

        let err = EventService::register(&repos, EventId::new(), UserId::new())
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message(), "Event not found");
    }

    #[tokio::test]
    async fn test_upcoming_and_past_split() {
        let (repos, ..) = setup();
        let later = EventService::create_event(&repos, UserId::new(), dto(10, None))
            .await
            .unwrap();
        let sooner = EventService::create_event(&repos, UserId::new(), dto(1, None))
            .await
            .unwrap();
        let done = EventService::create_event(&repos, UserId::new(), dto(-5, None))
            .await
            .unwrap();

        let upcoming = EventService::upcoming(&repos, PaginationParams::default())
            .await
            .unwrap();
        let ids: Vec<_> = upcoming.data.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![sooner.id, later.id]);

        let past = EventService::past(&repos, PaginationParams::default())
            .await
            .unwrap();
        assert_eq!(past.data.len(), 1);
        assert_eq!(past.data[0].id, done.id);
    }

    #[tokio::test]
    async fn test_delete_removes_main_and_gallery_images() {
        let (repos, cleanup, storage) = setup();
        let event = EventService::create_event(&repos, UserId::new(), dto(2, None))
            .await
            .unwrap();
        for id in ["events/g1", "events/g2"] {
            EventService::add_gallery_image(
                &repos,
                event.id,
                AddGalleryImageDto {
                    image: image(id),
                    caption: None,
                },
            )
            .await
            .unwrap();
        }

        EventService::delete_event(&repos, &cleanup, event.id)
            .await
            .unwrap();
        assert_eq!(
            storage.delete_attempts(),
            vec!["events/hack", "events/g1", "events/g2"]
        );
        assert!(repos.events.find_by_id(event.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_gallery_image() {
        let (repos, cleanup, storage) = setup();
        let event = EventService::create_event(&repos, UserId::new(), dto(2, None))
            .await
            .unwrap();
        EventService::add_gallery_image(
            &repos,
            event.id,
            AddGalleryImageDto {
                image: image("events/g1"),
                caption: Some("Opening".to_string()),
            },
        )
        .await
        .unwrap();

        let err = EventService::remove_gallery_image(&repos, &cleanup, event.id, "events/nope")
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Image not found");

        let event = EventService::remove_gallery_image(&repos, &cleanup, event.id, "events/g1")
            .await
            .unwrap();
        assert!(event.images.is_empty());
        assert_eq!(storage.delete_attempts(), vec!["events/g1"]);
    }

    #[tokio::test]
    async fn test_update_rejects_inverted_dates_and_replaces_image() {
        let (repos, cleanup, storage) = setup();
        let event = EventService::create_event(&repos, UserId::new(), dto(2, None))
            .await
            .unwrap();

        let err = EventService::update_event(
            &repos,
            &cleanup,
            event.id,
            UpdateEventDto {
                end_date: Some(event.start_date - Duration::hours(1)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.message(), "End date must be after start date");

        let updated = EventService::update_event(
            &repos,
            &cleanup,
            event.id,
            UpdateEventDto {
                image: Some(image("events/hack-v2")),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.image.public_id, "events/hack-v2");
        assert_eq!(storage.delete_attempts(), vec!["events/hack"]);
    }
}
