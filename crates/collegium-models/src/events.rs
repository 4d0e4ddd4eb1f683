//! Event models and DTOs.
//!
//! Registration is tracked per (event, user) pair in `event_registrations`;
//! `participant_count` mirrors the number of pairs and never exceeds
//! `max_participants`.

use crate::ids::{EventId, UserId};
use crate::images::{GalleryImage, ImageRef};
use crate::users::UserSummary;
use chrono::{DateTime, Utc};
use collegium_core::PaginationParams;
use collegium_core::serde::{deserialize_optional_bool, deserialize_optional_from_str};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use std::fmt;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "event_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Academic,
    Cultural,
    Sports,
    Technical,
    Workshop,
    Seminar,
    #[default]
    Other,
}

impl EventType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Academic => "academic",
            Self::Cultural => "cultural",
            Self::Sports => "sports",
            Self::Technical => "technical",
            Self::Workshop => "workshop",
            Self::Seminar => "seminar",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "academic" => Ok(Self::Academic),
            "cultural" => Ok(Self::Cultural),
            "sports" => Ok(Self::Sports),
            "technical" => Ok(Self::Technical),
            "workshop" => Ok(Self::Workshop),
            "seminar" => Ok(Self::Seminar),
            "other" => Ok(Self::Other),
            other => Err(format!("unknown event type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Event {
    pub id: EventId,
    pub event_name: String,
    pub description: String,
    pub event_type: EventType,
    pub category: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub venue: String,
    pub organizer: String,
    #[schema(value_type = ImageRef)]
    pub image: Json<ImageRef>,
    #[schema(value_type = Vec<GalleryImage>)]
    pub images: Json<Vec<GalleryImage>>,
    pub registration_link: Option<String>,
    pub max_participants: Option<i32>,
    pub participant_count: i32,
    pub is_active: bool,
    pub is_featured: bool,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        self.end_date <= now
    }

    pub fn is_full(&self) -> bool {
        self.max_participants
            .is_some_and(|max| self.participant_count >= max)
    }

    /// Main image followed by every gallery image.
    pub fn image_public_ids(&self) -> Vec<String> {
        std::iter::once(self.image.public_id.clone())
            .chain(self.images.iter().map(|i| i.public_id.clone()))
            .collect()
    }
}

/// Row values for a new event.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub event_name: String,
    pub description: String,
    pub event_type: EventType,
    pub category: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub venue: String,
    pub organizer: String,
    pub image: ImageRef,
    pub registration_link: Option<String>,
    pub max_participants: Option<i32>,
    pub is_featured: bool,
    pub created_by: Option<UserId>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EventDetails {
    #[serde(flatten)]
    pub event: Event,
    pub creator: Option<UserSummary>,
    pub participants: Vec<UserSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RegistrationStatus {
    pub event_id: EventId,
    pub is_registered: bool,
    pub participant_count: i32,
    pub max_participants: Option<i32>,
    pub spots_left: Option<i32>,
    pub has_ended: bool,
}

fn validate_event_dates(dto: &CreateEventDto) -> Result<(), ValidationError> {
    if dto.end_date < dto.start_date {
        let mut err = ValidationError::new("end_date");
        err.message = Some("End date must be after start date".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_event_dates", skip_on_field_errors = false))]
pub struct CreateEventDto {
    #[validate(length(min = 3, max = 200, message = "Event name must be between 3 and 200 characters"))]
    pub event_name: String,
    #[validate(length(min = 10, max = 5000, message = "Description must be at least 10 characters"))]
    pub description: String,
    #[serde(default)]
    pub event_type: EventType,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[validate(length(min = 2, max = 200, message = "Venue is required"))]
    pub venue: String,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub organizer: String,
    #[validate(nested)]
    pub image: ImageRef,
    #[validate(url(message = "Registration link must be a valid URL"))]
    pub registration_link: Option<String>,
    #[validate(range(min = 1, message = "Max participants must be at least 1"))]
    pub max_participants: Option<i32>,
    #[serde(default)]
    pub is_featured: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateEventDto {
    #[validate(length(min = 3, max = 200))]
    pub event_name: Option<String>,
    #[validate(length(min = 10, max = 5000))]
    pub description: Option<String>,
    pub event_type: Option<EventType>,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[validate(length(min = 2, max = 200))]
    pub venue: Option<String>,
    #[validate(length(max = 200))]
    pub organizer: Option<String>,
    #[validate(nested)]
    pub image: Option<ImageRef>,
    #[validate(url(message = "Registration link must be a valid URL"))]
    pub registration_link: Option<String>,
    #[validate(range(min = 1, message = "Max participants must be at least 1"))]
    pub max_participants: Option<i32>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
}

impl UpdateEventDto {
    /// Merges the supplied fields and returns the public id of a replaced main image.
    pub fn apply(self, event: &mut Event) -> Option<String> {
        let mut replaced = None;
        if let Some(image) = self.image {
            if event.image.public_id != image.public_id {
                replaced = Some(event.image.public_id.clone());
            }
            event.image = Json(image);
        }
        if let Some(name) = self.event_name {
            event.event_name = name;
        }
        if let Some(description) = self.description {
            event.description = description;
        }
        if let Some(event_type) = self.event_type {
            event.event_type = event_type;
        }
        if let Some(category) = self.category {
            event.category = Some(category);
        }
        if let Some(start) = self.start_date {
            event.start_date = start;
        }
        if let Some(end) = self.end_date {
            event.end_date = end;
        }
        if let Some(venue) = self.venue {
            event.venue = venue;
        }
        if let Some(organizer) = self.organizer {
            event.organizer = organizer;
        }
        if let Some(link) = self.registration_link {
            event.registration_link = Some(link);
        }
        if let Some(max) = self.max_participants {
            event.max_participants = Some(max);
        }
        if let Some(is_active) = self.is_active {
            event.is_active = is_active;
        }
        if let Some(is_featured) = self.is_featured {
            event.is_featured = is_featured;
        }
        replaced
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_from_str")]
    pub event_type: Option<EventType>,
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub is_featured: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub is_active: Option<bool>,
    /// Case-insensitive match on event name or venue
    pub search: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn image() -> ImageRef {
        ImageRef {
            url: "https://cdn.example.com/e.png".to_string(),
            public_id: "events/e".to_string(),
        }
    }

    fn create_dto() -> CreateEventDto {
        let start = Utc::now() + Duration::days(3);
        CreateEventDto {
            event_name: "Tech Fest".to_string(),
            description: "Annual technical festival".to_string(),
            event_type: EventType::Technical,
            category: None,
            start_date: start,
            end_date: start + Duration::hours(6),
            venue: "Main Hall".to_string(),
            organizer: String::new(),
            image: image(),
            registration_link: None,
            max_participants: Some(100),
            is_featured: false,
        }
    }

    #[test]
    fn test_create_event_validation() {
        assert!(create_dto().validate().is_ok());

        let mut dto = create_dto();
        dto.end_date = dto.start_date - Duration::hours(1);
        assert!(dto.validate().is_err());

        let dto = CreateEventDto {
            max_participants: Some(0),
            ..create_dto()
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_event_type_parsing() {
        assert_eq!("Workshop".parse::<EventType>().unwrap(), EventType::Workshop);
        assert!("party".parse::<EventType>().is_err());
        assert_eq!(EventType::default(), EventType::Other);
    }

    #[test]
    fn test_public_ids_include_gallery() {
        let now = Utc::now();
        let event = Event {
            id: EventId::new(),
            event_name: "Fest".to_string(),
            description: "Annual fest".to_string(),
            event_type: EventType::Cultural,
            category: None,
            start_date: now,
            end_date: now,
            venue: "Ground".to_string(),
            organizer: String::new(),
            image: Json(image()),
            images: Json(vec![GalleryImage {
                url: "u".to_string(),
                public_id: "events/g1".to_string(),
                caption: None,
                uploaded_at: now,
            }]),
            registration_link: None,
            max_participants: Some(1),
            participant_count: 1,
            is_active: true,
            is_featured: false,
            created_by: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(event.image_public_ids(), vec!["events/e", "events/g1"]);
        assert!(event.is_full());
        assert!(event.has_ended(now + Duration::seconds(1)));
    }
}
