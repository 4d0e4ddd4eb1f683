use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::state::AppState;

use super::controller::{
    add_event_image, create_event, delete_event, get_event, get_events, get_events_by_type,
    get_featured_events, get_past_events, get_registration_status, get_upcoming_events,
    register_for_event, remove_event_image, unregister_from_event, update_event,
};

pub fn init_events_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_event).get(get_events))
        .route("/upcoming", get(get_upcoming_events))
        .route("/past", get(get_past_events))
        .route("/featured", get(get_featured_events))
        .route("/type/{event_type}", get(get_events_by_type))
        .route(
            "/{id}",
            get(get_event).put(update_event).delete(delete_event),
        )
        .route("/{id}/register", post(register_for_event))
        .route("/{id}/unregister", post(unregister_from_event))
        .route("/{id}/registration", get(get_registration_status))
        .route("/{id}/images", post(add_event_image))
        .route("/{id}/images/{*public_id}", delete(remove_event_image))
}
