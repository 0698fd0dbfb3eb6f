use super::types::{request, response};
use crate::{types::Context, utils::verify::CheckOutcome};
use std::sync::Arc;

pub async fn service(ctx: Arc<Context>, payload: request::Payload) -> response::Response {
    match ctx.verifier.check_code(&payload.to, &payload.code).await {
        Ok(CheckOutcome::Approved) => Ok(response::Success::Approved),
        Ok(CheckOutcome::Denied) => Ok(response::Success::Denied),
        Err(err) => Err(response::Error::CheckFailed(err.message().to_string())),
    }
}
