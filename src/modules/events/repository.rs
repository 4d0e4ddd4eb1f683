use async_trait::async_trait;
use collegium_core::{AppError, Paginated, PaginationParams};
use collegium_models::events::{Event, EventFilterParams, EventType, NewEvent};
use collegium_models::{EventId, GalleryImage, UserId};
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder};

use crate::store::PgStore;
use crate::store::postgres::like_pattern;

/// Result of the conditional registration write.
#[derive(Debug, Clone)]
pub enum RegistrationOutcome {
    Registered(Event),
    AlreadyRegistered,
    Ended,
    Full,
    NotFound,
}

#[derive(Debug, Clone)]
pub enum UnregistrationOutcome {
    Unregistered(Event),
    NotRegistered,
    NotFound,
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn create(&self, event: NewEvent) -> Result<Event, AppError>;
    async fn find_by_id(&self, id: EventId) -> Result<Option<Event>, AppError>;
    async fn list(&self, filters: &EventFilterParams) -> Result<Paginated<Event>, AppError>;
    /// Active events starting now or later, soonest first.
    async fn upcoming(&self, pagination: &PaginationParams) -> Result<Paginated<Event>, AppError>;
    /// Active events that have ended, most recent first.
    async fn past(&self, pagination: &PaginationParams) -> Result<Paginated<Event>, AppError>;
    async fn featured(&self) -> Result<Vec<Event>, AppError>;
    async fn list_by_type(&self, event_type: EventType) -> Result<Vec<Event>, AppError>;
    async fn update(&self, event: &Event) -> Result<Event, AppError>;
    async fn delete(&self, id: EventId) -> Result<bool, AppError>;
    /// Inserts the registration and bumps `participant_count` in one
    /// transaction, refusing ended or full events.
    async fn register(
        &self,
        id: EventId,
        user_id: UserId,
    ) -> Result<RegistrationOutcome, AppError>;
    async fn unregister(
        &self,
        id: EventId,
        user_id: UserId,
    ) -> Result<UnregistrationOutcome, AppError>;
    async fn is_registered(&self, id: EventId, user_id: UserId) -> Result<bool, AppError>;
    /// Registered users in registration order.
    async fn participants(&self, id: EventId) -> Result<Vec<UserId>, AppError>;
    async fn add_gallery_image(
        &self,
        id: EventId,
        image: GalleryImage,
    ) -> Result<Option<Event>, AppError>;
    async fn remove_gallery_image(
        &self,
        id: EventId,
        public_id: &str,
    ) -> Result<Option<Event>, AppError>;
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filters: &EventFilterParams) {
    query.push(" FROM events WHERE TRUE");
    if let Some(event_type) = filters.event_type {
        query.push(" AND event_type = ").push_bind(event_type);
    }
    if let Some(is_featured) = filters.is_featured {
        query.push(" AND is_featured = ").push_bind(is_featured);
    }
    if let Some(is_active) = filters.is_active {
        query.push(" AND is_active = ").push_bind(is_active);
    }
    if let Some(search) = filters.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = like_pattern(search);
        query
            .push(" AND (event_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR venue ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl EventRepository for PgStore {
    async fn create(&self, event: NewEvent) -> Result<Event, AppError> {
        let created = sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (id, event_name, description, event_type, category, start_date,
                end_date, venue, organizer, image, registration_link, max_participants,
                is_featured, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(EventId::new())
        .bind(&event.event_name)
        .bind(&event.description)
        .bind(event.event_type)
        .bind(&event.category)
        .bind(event.start_date)
        .bind(event.end_date)
        .bind(&event.venue)
        .bind(&event.organizer)
        .bind(Json(event.image.clone()))
        .bind(&event.registration_link)
        .bind(event.max_participants)
        .bind(event.is_featured)
        .bind(event.created_by)
        .fetch_one(self.pool())
        .await?;
        Ok(created)
    }

    async fn find_by_id(&self, id: EventId) -> Result<Option<Event>, AppError> {
        let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(event)
    }

    async fn list(&self, filters: &EventFilterParams) -> Result<Paginated<Event>, AppError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        push_filters(&mut count, filters);
        let total: i64 = count.build_query_scalar().fetch_one(self.pool()).await?;

        let mut query = QueryBuilder::<Postgres>::new("SELECT *");
        push_filters(&mut query, filters);
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(filters.pagination.limit())
            .push(" OFFSET ")
            .push_bind(filters.pagination.offset());
        let events = query.build_query_as::<Event>().fetch_all(self.pool()).await?;

        Ok(Paginated::new(events, total, &filters.pagination))
    }

    async fn upcoming(&self, pagination: &PaginationParams) -> Result<Paginated<Event>, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM events WHERE is_active AND start_date >= NOW()",
        )
        .fetch_one(self.pool())
        .await?;
        let events = sqlx::query_as::<_, Event>(
            r#"
            SELECT * FROM events WHERE is_active AND start_date >= NOW()
            ORDER BY start_date ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(self.pool())
        .await?;
        Ok(Paginated::new(events, total, pagination))
    }

    async fn past(&self, pagination: &PaginationParams) -> Result<Paginated<Event>, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM events WHERE is_active AND end_date < NOW()",
        )
        .fetch_one(self.pool())
        .await?;
        let events = sqlx::query_as::<_, Event>(
            r#"
            SELECT * FROM events WHERE is_active AND end_date < NOW()
            ORDER BY end_date DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(self.pool())
        .await?;
        Ok(Paginated::new(events, total, pagination))
    }

    async fn featured(&self) -> Result<Vec<Event>, AppError> {
        let events = sqlx::query_as::<_, Event>(
            "SELECT * FROM events WHERE is_active AND is_featured ORDER BY start_date ASC",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(events)
    }

    async fn list_by_type(&self, event_type: EventType) -> Result<Vec<Event>, AppError> {
        let events = sqlx::query_as::<_, Event>(
            "SELECT * FROM events WHERE is_active AND event_type = $1 ORDER BY start_date ASC",
        )
        .bind(event_type)
        .fetch_all(self.pool())
        .await?;
        Ok(events)
    }

    async fn update(&self, event: &Event) -> Result<Event, AppError> {
        let updated = sqlx::query_as::<_, Event>(
            r#"
            UPDATE events
            SET event_name = $2, description = $3, event_type = $4, category = $5,
                start_date = $6, end_date = $7, venue = $8, organizer = $9, image = $10,
                registration_link = $11, max_participants = $12, is_active = $13,
                is_featured = $14, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(event.id)
        .bind(&event.event_name)
        .bind(&event.description)
        .bind(event.event_type)
        .bind(&event.category)
        .bind(event.start_date)
        .bind(event.end_date)
        .bind(&event.venue)
        .bind(&event.organizer)
        .bind(&event.image)
        .bind(&event.registration_link)
        .bind(event.max_participants)
        .bind(event.is_active)
        .bind(event.is_featured)
        .fetch_one(self.pool())
        .await?;
        Ok(updated)
    }

    async fn delete(&self, id: EventId) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn register(
        &self,
        id: EventId,
        user_id: UserId,
    ) -> Result<RegistrationOutcome, AppError> {
        let mut tx = self.pool().begin().await?;

        let Some(event) =
            sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
        else {
            return Ok(RegistrationOutcome::NotFound);
        };
        if event.has_ended(chrono::Utc::now()) {
            return Ok(RegistrationOutcome::Ended);
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO event_registrations (event_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
        if inserted.rows_affected() == 0 {
            return Ok(RegistrationOutcome::AlreadyRegistered);
        }

        let updated = sqlx::query_as::<_, Event>(
            r#"
            UPDATE events
            SET participant_count = participant_count + 1, updated_at = NOW()
            WHERE id = $1
              AND end_date > NOW()
              AND (max_participants IS NULL OR participant_count < max_participants)
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        match updated {
            Some(event) => {
                tx.commit().await?;
                Ok(RegistrationOutcome::Registered(event))
            }
            None => {
                tx.rollback().await?;
                Ok(RegistrationOutcome::Full)
            }
        }
    }

    async fn unregister(
        &self,
        id: EventId,
        user_id: UserId,
    ) -> Result<UnregistrationOutcome, AppError> {
        let mut tx = self.pool().begin().await?;

        let deleted =
            sqlx::query("DELETE FROM event_registrations WHERE event_id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        if deleted.rows_affected() == 0 {
            let exists =
                sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM events WHERE id = $1)")
                    .bind(id)
                    .fetch_one(&mut *tx)
                    .await?;
            return Ok(if exists {
                UnregistrationOutcome::NotRegistered
            } else {
                UnregistrationOutcome::NotFound
            });
        }

        let event = sqlx::query_as::<_, Event>(
            r#"
            UPDATE events
            SET participant_count = GREATEST(participant_count - 1, 0), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(UnregistrationOutcome::Unregistered(event))
    }

    async fn is_registered(&self, id: EventId, user_id: UserId) -> Result<bool, AppError> {
        let registered = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM event_registrations WHERE event_id = $1 AND user_id = $2)",
        )
        .bind(id)
        .bind(user_id)
        .fetch_one(self.pool())
        .await?;
        Ok(registered)
    }

    async fn participants(&self, id: EventId) -> Result<Vec<UserId>, AppError> {
        let users = sqlx::query_scalar::<_, UserId>(
            "SELECT user_id FROM event_registrations WHERE event_id = $1 ORDER BY registered_at",
        )
        .bind(id)
        .fetch_all(self.pool())
        .await?;
        Ok(users)
    }

    async fn add_gallery_image(
        &self,
        id: EventId,
        image: GalleryImage,
    ) -> Result<Option<Event>, AppError> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            UPDATE events SET images = images || $2::jsonb, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(Json(vec![image]))
        .fetch_optional(self.pool())
        .await?;
        Ok(event)
    }

    async fn remove_gallery_image(
        &self,
        id: EventId,
        public_id: &str,
    ) -> Result<Option<Event>, AppError> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            UPDATE events
            SET images = COALESCE(
                    (SELECT jsonb_agg(img) FROM jsonb_array_elements(images) AS img
                     WHERE img->>'public_id' <> $2),
                    '[]'::jsonb),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(public_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(event)
    }
}

#[cfg(any(test, feature = "test-utils"))]
mod memory {
    use super::*;
    use crate::store::MemoryStore;
    use crate::store::memory::{Registration, matches_search, newest_first};
    use anyhow::anyhow;
    use chrono::Utc;

    fn paginate_sorted(
        mut rows: Vec<Event>,
        key: impl Fn(&Event) -> chrono::DateTime<Utc>,
        descending: bool,
        pagination: &PaginationParams,
    ) -> Paginated<Event> {
        rows.sort_by_key(&key);
        if descending {
            rows.reverse();
        }
        Paginated::from_vec(rows, pagination)
    }

    impl MemoryStore {
        fn with_event(&self, id: EventId, change: impl FnOnce(&mut Event)) -> Option<Event> {
            let mut tables = self.lock();
            tables.events.iter_mut().find(|e| e.id == id).map(|e| {
                change(e);
                e.updated_at = Utc::now();
                e.clone()
            })
        }

        fn active_events(&self, keep: impl Fn(&Event) -> bool) -> Vec<Event> {
            self.lock()
                .events
                .iter()
                .filter(|e| e.is_active && keep(e))
                .cloned()
                .collect()
        }
    }

    #[async_trait]
    impl EventRepository for MemoryStore {
        async fn create(&self, event: NewEvent) -> Result<Event, AppError> {
            let now = Utc::now();
            let row = Event {
                id: EventId::new(),
                event_name: event.event_name,
                description: event.description,
                event_type: event.event_type,
                category: event.category,
                start_date: event.start_date,
                end_date: event.end_date,
                venue: event.venue,
                organizer: event.organizer,
                image: Json(event.image),
                images: Json(Vec::new()),
                registration_link: event.registration_link,
                max_participants: event.max_participants,
                participant_count: 0,
                is_active: true,
                is_featured: event.is_featured,
                created_by: event.created_by,
                created_at: now,
                updated_at: now,
            };
            self.lock().events.push(row.clone());
            Ok(row)
        }

        async fn find_by_id(&self, id: EventId) -> Result<Option<Event>, AppError> {
            Ok(self.lock().events.iter().find(|e| e.id == id).cloned())
        }

        async fn list(&self, filters: &EventFilterParams) -> Result<Paginated<Event>, AppError> {
            let rows = newest_first(
                &self.lock().events,
                |e| e.created_at,
                |e| {
                    filters.event_type.is_none_or(|t| e.event_type == t)
                        && filters.is_featured.is_none_or(|f| e.is_featured == f)
                        && filters.is_active.is_none_or(|a| e.is_active == a)
                        && matches_search(filters.search.as_deref(), &[&e.event_name, &e.venue])
                },
            );
            Ok(Paginated::from_vec(rows, &filters.pagination))
        }

        async fn upcoming(
            &self,
            pagination: &PaginationParams,
        ) -> Result<Paginated<Event>, AppError> {
            let now = Utc::now();
            let rows = self.active_events(|e| e.start_date >= now);
            Ok(paginate_sorted(rows, |e| e.start_date, false, pagination))
        }

        async fn past(&self, pagination: &PaginationParams) -> Result<Paginated<Event>, AppError> {
            let now = Utc::now();
            let rows = self.active_events(|e| e.end_date < now);
            Ok(paginate_sorted(rows, |e| e.end_date, true, pagination))
        }

        async fn featured(&self) -> Result<Vec<Event>, AppError> {
            let mut rows = self.active_events(|e| e.is_featured);
            rows.sort_by_key(|e| e.start_date);
            Ok(rows)
        }

        async fn list_by_type(&self, event_type: EventType) -> Result<Vec<Event>, AppError> {
            let mut rows = self.active_events(|e| e.event_type == event_type);
            rows.sort_by_key(|e| e.start_date);
            Ok(rows)
        }

        async fn update(&self, event: &Event) -> Result<Event, AppError> {
            let update = event.clone();
            self.with_event(event.id, move |e| {
                *e = Event {
                    images: e.images.clone(),
                    participant_count: e.participant_count,
                    created_by: e.created_by,
                    created_at: e.created_at,
                    ..update
                };
            })
            .ok_or_else(|| AppError::not_found(anyhow!("Event not found")))
        }

        async fn delete(&self, id: EventId) -> Result<bool, AppError> {
            let mut tables = self.lock();
            let before = tables.events.len();
            tables.events.retain(|e| e.id != id);
            tables.registrations.retain(|r| r.event_id != id);
            Ok(tables.events.len() < before)
        }

        async fn register(
            &self,
            id: EventId,
            user_id: UserId,
        ) -> Result<RegistrationOutcome, AppError> {
            let mut tables = self.lock();
            let now = Utc::now();
            let already = tables
                .registrations
                .iter()
                .any(|r| r.event_id == id && r.user_id == user_id);

            let Some(event) = tables.events.iter_mut().find(|e| e.id == id) else {
                return Ok(RegistrationOutcome::NotFound);
            };
            if event.has_ended(now) {
                return Ok(RegistrationOutcome::Ended);
            }
            if already {
                return Ok(RegistrationOutcome::AlreadyRegistered);
            }
            if event.is_full() {
                return Ok(RegistrationOutcome::Full);
            }
            event.participant_count += 1;
            event.updated_at = now;
            let event = event.clone();

            tables.registrations.push(Registration {
                event_id: id,
                user_id,
                registered_at: now,
            });
            Ok(RegistrationOutcome::Registered(event))
        }

        async fn unregister(
            &self,
            id: EventId,
            user_id: UserId,
        ) -> Result<UnregistrationOutcome, AppError> {
            let mut tables = self.lock();
            if !tables.events.iter().any(|e| e.id == id) {
                return Ok(UnregistrationOutcome::NotFound);
            }
            let before = tables.registrations.len();
            tables
                .registrations
                .retain(|r| !(r.event_id == id && r.user_id == user_id));
            if tables.registrations.len() == before {
                return Ok(UnregistrationOutcome::NotRegistered);
            }

            let event = tables
                .events
                .iter_mut()
                .find(|e| e.id == id)
                .ok_or_else(|| AppError::not_found(anyhow!("Event not found")))?;
            event.participant_count = (event.participant_count - 1).max(0);
            event.updated_at = Utc::now();
            Ok(UnregistrationOutcome::Unregistered(event.clone()))
        }

        async fn is_registered(&self, id: EventId, user_id: UserId) -> Result<bool, AppError> {
            Ok(self
                .lock()
                .registrations
                .iter()
                .any(|r| r.event_id == id && r.user_id == user_id))
        }

        async fn participants(&self, id: EventId) -> Result<Vec<UserId>, AppError> {
            let tables = self.lock();
            let mut rows: Vec<&Registration> =
                tables.registrations.iter().filter(|r| r.event_id == id).collect();
            rows.sort_by_key(|r| r.registered_at);
            Ok(rows.into_iter().map(|r| r.user_id).collect())
        }

        async fn add_gallery_image(
            &self,
            id: EventId,
            image: GalleryImage,
        ) -> Result<Option<Event>, AppError> {
            Ok(self.with_event(id, |e| e.images.0.push(image)))
        }

        async fn remove_gallery_image(
            &self,
            id: EventId,
            public_id: &str,
        ) -> Result<Option<Event>, AppError> {
            Ok(self.with_event(id, |e| e.images.0.retain(|i| i.public_id != public_id)))
        }
    }
}
