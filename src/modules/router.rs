use super::{health, notification, verification};
use crate::types::Context;
use axum::Router;
use std::sync::Arc;

pub fn get_router(ctx: Arc<Context>) -> Router<Arc<Context>> {
    Router::new()
        .merge(verification::get_router(ctx))
        .merge(notification::get_router())
        .merge(health::get_router())
}
