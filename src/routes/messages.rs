use actix_web::{web, HttpResponse};
use chrono::Utc;
use std::collections::BTreeSet;
use validator::Validate;

use super::{ApiError, AppState};
use crate::core::inbox::{build_inbox, can_mark_read, counterpart, thread, validate_outgoing};
use crate::models::{ConversationsQuery, ConversationsResponse, NewMessage, SendMessageRequest, ThreadResponse};
use crate::services::Session;

/// Configure inbox routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/messages", web::post().to(send_message))
        .route("/messages/conversations", web::get().to(conversations))
        .route("/messages/thread/{user_id}", web::get().to(get_thread))
        .route("/messages/{id}/read", web::post().to(mark_read));
}

/// Conversation list for the caller
///
/// GET /api/v1/messages/conversations?q=name
async fn conversations(
    state: web::Data<AppState>,
    session: Session,
    query: web::Query<ConversationsQuery>,
) -> Result<HttpResponse, ApiError> {
    let messages = state.store.list_messages(&session.user_id).await?;

    let other_ids: Vec<String> = messages
        .iter()
        .filter_map(|m| counterpart(m, &session.user_id))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect();
    let names = state.store.profile_names(&other_ids).await?;

    let conversations = build_inbox(&messages, &session.user_id, &names, query.q.as_deref());
    let unread_total = conversations.iter().map(|c| c.unread_count).sum();

    tracing::debug!(
        "Inbox for {}: {} conversations from {} messages",
        session.user_id,
        conversations.len(),
        messages.len()
    );

    Ok(HttpResponse::Ok().json(ConversationsResponse {
        conversations,
        unread_total,
    }))
}

/// Messages with one other user, oldest first
///
/// GET /api/v1/messages/thread/{user_id}
async fn get_thread(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let other_user_id = path.into_inner();
    let messages = state.store.list_messages(&session.user_id).await?;

    Ok(HttpResponse::Ok().json(ThreadResponse {
        messages: thread(&messages, &session.user_id, &other_user_id),
        other_user_id,
    }))
}

/// Send a message
///
/// POST /api/v1/messages
async fn send_message(
    state: web::Data<AppState>,
    session: Session,
    body: web::Json<SendMessageRequest>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;
    validate_outgoing(&session.user_id, &body.receiver_id, &body.content)?;

    // Receiver must have a profile
    state.store.get_profile(&body.receiver_id).await?;

    let body = body.into_inner();
    let row = NewMessage {
        id: uuid::Uuid::new_v4().to_string(),
        sender_id: session.user_id,
        receiver_id: body.receiver_id,
        request_id: body.request_id,
        content: body.content.trim().to_string(),
        timestamp: Utc::now(),
        is_read: false,
    };

    let sent = state.store.send_message(&row).await?;

    Ok(HttpResponse::Created().json(sent))
}

/// Mark a received message as read
///
/// POST /api/v1/messages/{id}/read
async fn mark_read(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let message = state.store.get_message(&path).await?;

    if !can_mark_read(&message, &session.user_id) {
        return Err(ApiError::Forbidden("Only the receiver can mark a message read".to_string()));
    }

    if !message.is_read {
        state.store.mark_message_read(&message.id).await?;
    }

    Ok(HttpResponse::NoContent().finish())
}
