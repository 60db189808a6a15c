use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use uuid::Uuid;

use super::models::{CreateEventRequest, Event, UpdateEventRequest};
use crate::api::AppState;
use crate::audit::{AuditAction, AuditEntry};
use crate::error::{AppError, AppResult};

const COLLECTION: &str = "events";

/// POST /api/events
pub async fn create_event(
    State(state): State<AppState>,
    Json(req): Json<CreateEventRequest>,
) -> AppResult<(StatusCode, Json<Event>)> {
    let name = req
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| {
            AppError::InvalidInput(
                "No name was provided. Please repeat request providing a name for the new event"
                    .to_string(),
            )
        })?;

    if req.end_date < req.start_date {
        return Err(AppError::InvalidInput(
            "Event end date precedes its start date".to_string(),
        ));
    }

    let event = state
        .events
        .create_event(Event::new(name, req.description, req.start_date, req.end_date))
        .await?;

    info!("Event created: {}", event.id);
    state
        .audit
        .emit(AuditEntry::on_record(AuditAction::Created, COLLECTION, event.id));

    Ok((StatusCode::CREATED, Json(event)))
}

/// GET /api/events/:id
pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> AppResult<Json<Event>> {
    let event = state
        .events
        .find_event_by_id(event_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event {}", event_id)))?;

    state
        .audit
        .emit(AuditEntry::on_record(AuditAction::Read, COLLECTION, event.id));

    Ok(Json(event))
}

/// PUT /api/events/:id
pub async fn update_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Json(req): Json<UpdateEventRequest>,
) -> AppResult<Json<Event>> {
    let mut event = state
        .events
        .find_event_by_id(event_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event {}", event_id)))?;

    if let Some(name) = req.name {
        if name.trim().is_empty() {
            return Err(AppError::InvalidInput("Event name cannot be empty".to_string()));
        }
        event.name = name;
    }
    if let Some(description) = req.description {
        event.description = description;
    }
    if let Some(start_date) = req.start_date {
        event.start_date = start_date;
    }
    if let Some(end_date) = req.end_date {
        event.end_date = end_date;
    }

    if event.end_date < event.start_date {
        return Err(AppError::InvalidInput(
            "Event end date precedes its start date".to_string(),
        ));
    }

    let event = state.events.update_event(event).await?;

    state
        .audit
        .emit(AuditEntry::on_record(AuditAction::Update, COLLECTION, event.id));

    Ok(Json(event))
}

/// DELETE /api/events/:id
pub async fn delete_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if !state.events.delete_event(event_id).await? {
        return Err(AppError::NotFound(format!("Event {}", event_id)));
    }

    state
        .audit
        .emit(AuditEntry::on_record(AuditAction::Delete, COLLECTION, event_id));

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/events
pub async fn list_events(State(state): State<AppState>) -> AppResult<Json<Vec<Event>>> {
    let events = state.events.list_events().await?;

    state
        .audit
        .emit(AuditEntry::on_collection(AuditAction::List, COLLECTION));

    Ok(Json(events))
}
