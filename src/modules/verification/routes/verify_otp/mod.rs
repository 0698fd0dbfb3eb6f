mod service;
mod types;

use crate::{types::Context, utils::validation};
use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::post,
    Router,
};
use self::types::request;
use std::sync::Arc;
use validator::Validate;

async fn handler(
    State(ctx): State<Arc<Context>>,
    Json(payload): Json<request::Payload>,
) -> impl IntoResponse {
    if let Err(errors) = payload.validate() {
        return validation::into_response(errors).into_response();
    }

    service::service(ctx, payload).await.into_response()
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new().route("/", post(handler))
}
