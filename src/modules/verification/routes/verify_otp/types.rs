pub mod request {
    use serde::Deserialize;
    use validator::Validate;

    #[derive(Deserialize, Validate)]
    #[serde(rename_all = "camelCase")]
    pub struct Payload {
        #[validate(length(min = 1, message = "Destination phone number is required"))]
        pub to: String,
        #[validate(length(min = 1, message = "Verification code is required"))]
        pub code: String,
        #[allow(unused)]
        pub verification_sid: Option<String>,
    }
}

pub mod response {
    use axum::{extract::Json, http::StatusCode, response::IntoResponse};
    use serde_json::json;

    pub enum Success {
        Approved,
        /// A wrong code is a normal business outcome, not a server failure.
        Denied,
    }

    impl IntoResponse for Success {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::Approved => (
                    StatusCode::OK,
                    Json(json!({ "success": true, "status": "approved" })),
                )
                    .into_response(),
                Self::Denied => (
                    StatusCode::OK,
                    Json(json!({ "success": false, "status": "denied" })),
                )
                    .into_response(),
            }
        }
    }

    pub enum Error {
        CheckFailed(String),
    }

    impl IntoResponse for Error {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::CheckFailed(error) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "success": false, "error": error })),
                )
                    .into_response(),
            }
        }
    }

    pub type Response = Result<Success, Error>;
}
