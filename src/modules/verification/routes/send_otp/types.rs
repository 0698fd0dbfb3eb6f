pub mod request {
    use serde::Deserialize;
    use validator::Validate;

    #[derive(Deserialize, Validate)]
    #[serde(rename_all = "camelCase")]
    pub struct Payload {
        #[validate(length(min = 1, message = "Destination phone number is required"))]
        pub to: String,
        #[allow(unused)]
        pub service_sid: Option<String>,
    }
}

pub mod response {
    use axum::{extract::Json, http::StatusCode, response::IntoResponse};
    use serde_json::json;

    pub enum Success {
        CodeSent {
            verification_sid: String,
            to: String,
            message: String,
        },
    }

    impl IntoResponse for Success {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::CodeSent {
                    verification_sid,
                    to,
                    message,
                } => (
                    StatusCode::OK,
                    Json(json!({
                        "success": true,
                        "verificationSid": verification_sid,
                        "to": to,
                        "message": message,
                    })),
                )
                    .into_response(),
            }
        }
    }

    pub enum Error {
        FailedToSend(String),
    }

    impl IntoResponse for Error {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::FailedToSend(error) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "success": false, "error": error })),
                )
                    .into_response(),
            }
        }
    }

    pub type Response = Result<Success, Error>;
}
