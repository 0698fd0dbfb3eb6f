use super::types::{request, response};
use crate::types::Context;
use std::sync::Arc;

pub async fn service(ctx: Arc<Context>, payload: request::Payload) -> response::Response {
    ctx.verifier
        .start_verification(&payload.to)
        .await
        .map(|started| response::Success::CodeSent {
            verification_sid: started.sid,
            to: payload.to,
            message: started.message,
        })
        .map_err(|err| response::Error::FailedToSend(err.message().to_string()))
}
