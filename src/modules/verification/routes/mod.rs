pub mod send_otp;
pub mod verify_otp;

use crate::{types::Context, utils::rate_limit};
use axum::{middleware, Router};
use std::sync::Arc;

pub fn get_router(ctx: Arc<Context>) -> Router<Arc<Context>> {
    Router::new()
        .nest("/send-otp", send_otp::get_router())
        .nest("/verify-otp", verify_otp::get_router())
        .route_layer(middleware::from_fn_with_state(ctx, rate_limit::middleware))
}
