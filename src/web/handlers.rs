use actix_web::http::header::ContentType;
use actix_web::{web, HttpResponse, Responder};
use futures_util::StreamExt;
use log::{error, warn};
use serde_json::{json, Value};

use crate::config::MAX_BODY_BYTES;
use crate::error::{ChatError, INVALID_JSON};
use crate::web::cors::ALLOW_METHODS;
use crate::AppState;

// Health check endpoint
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

// CORS preflight
pub async fn preflight() -> impl Responder {
    HttpResponse::Ok()
        .insert_header(("Access-Control-Allow-Methods", ALLOW_METHODS))
        .body("ok")
}

pub async fn method_not_allowed() -> Result<HttpResponse, ChatError> {
    Err(ChatError::MethodNotAllowed)
}

// Buffers the request body up to MAX_BODY_BYTES
async fn read_body(mut payload: web::Payload) -> Result<web::BytesMut, ChatError> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| {
            warn!("Failed to read chat body: {}", e);
            ChatError::InvalidInput(INVALID_JSON)
        })?;
        if body.len() + chunk.len() > MAX_BODY_BYTES {
            warn!("Rejected chat body over {} bytes", MAX_BODY_BYTES);
            return Err(ChatError::PayloadTooLarge);
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

// Chat API endpoint
pub async fn chat(
    data: web::Data<AppState>,
    payload: web::Payload,
) -> Result<HttpResponse, ChatError> {
    let body = read_body(payload).await?;

    // Malformed JSON maps to InvalidInput rather than actix's plain-text 400
    let body: Value = serde_json::from_slice(&body).map_err(|e| {
        warn!("Rejected chat body: {}", e);
        ChatError::InvalidInput(INVALID_JSON)
    })?;

    let response = data.relay.handle(&body).await?;

    let json = serde_json::to_string(&response).map_err(|e| {
        error!("Failed to serialize chat response: {}", e);
        ChatError::InternalError
    })?;
    Ok(HttpResponse::Ok()
        .content_type(ContentType::json())
        .body(json))
}
