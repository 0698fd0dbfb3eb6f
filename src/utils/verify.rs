use crate::types::VerifyConfig;
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use ulid::Ulid;

const PROVIDER_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct StartedVerification {
    pub sid: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    Approved,
    Denied,
}

#[derive(Debug)]
pub enum Error {
    SendFailed(String),
    CheckFailed(String),
}

impl Error {
    pub fn message(&self) -> &str {
        match self {
            Self::SendFailed(message) => message,
            Self::CheckFailed(message) => message,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// The verification capability. One implementation talks to the live
/// provider, the other approves deterministically so the workflow stays
/// demoable without credentials. Selected once at startup and injected;
/// call sites never re-check configuration.
#[async_trait]
pub trait VerifyTransport: Send + Sync {
    async fn start_verification(&self, to: &str) -> Result<StartedVerification>;
    async fn check_code(&self, to: &str, code: &str) -> Result<CheckOutcome>;
}

pub fn from_config(config: Option<VerifyConfig>) -> Arc<dyn VerifyTransport> {
    match config {
        Some(config) => Arc::new(TwilioVerify::new(config)),
        None => {
            tracing::warn!(
                "Twilio Verify credentials not set, phone verification is running in demo mode"
            );
            Arc::new(DemoVerify)
        }
    }
}

pub struct TwilioVerify {
    account_sid: String,
    auth_token: String,
    service_sid: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct VerificationResource {
    sid: String,
    status: String,
}

impl TwilioVerify {
    pub fn new(config: VerifyConfig) -> Self {
        Self {
            account_sid: config.account_sid,
            auth_token: config.auth_token,
            service_sid: config.service_sid,
            client: reqwest::Client::builder()
                .timeout(PROVIDER_TIMEOUT)
                .build()
                .expect("Failed to build verification http client"),
        }
    }

    async fn post(&self, url: String, params: &[(&str, &str)]) -> Result<VerificationResource> {
        let res = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(params)
            .send()
            .await
            .map_err(|err| {
                tracing::error!("Failed to reach verification provider: {}", err);
                Error::SendFailed("Failed to reach verification provider".to_string())
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|err| {
            tracing::error!("Failed to get verification provider response body: {}", err);
            Error::SendFailed("Invalid response from verification provider".to_string())
        })?;

        if !status.is_success() {
            tracing::error!("Verification provider returned {}: {}", status, body);
            return Err(Error::SendFailed(body));
        }

        serde_json::from_str::<VerificationResource>(&body).map_err(|err| {
            tracing::error!("Failed to deserialize verification resource: {}", err);
            Error::SendFailed("Invalid response from verification provider".to_string())
        })
    }
}

#[async_trait]
impl VerifyTransport for TwilioVerify {
    async fn start_verification(&self, to: &str) -> Result<StartedVerification> {
        let url = format!(
            "https://verify.twilio.com/v2/Services/{}/Verifications",
            self.service_sid
        );

        let resource = self.post(url, &[("To", to), ("Channel", "sms")]).await?;

        tracing::debug!("Started verification {} for {}", resource.sid, to);

        Ok(StartedVerification {
            sid: resource.sid,
            message: "Verification code sent".to_string(),
        })
    }

    async fn check_code(&self, to: &str, code: &str) -> Result<CheckOutcome> {
        let url = format!(
            "https://verify.twilio.com/v2/Services/{}/VerificationCheck",
            self.service_sid
        );

        let resource = self
            .post(url, &[("To", to), ("Code", code)])
            .await
            .map_err(|err| Error::CheckFailed(err.message().to_string()))?;

        match resource.status.as_str() {
            "approved" => Ok(CheckOutcome::Approved),
            "pending" | "denied" | "canceled" => Ok(CheckOutcome::Denied),
            status => Err(Error::CheckFailed(format!(
                "Unexpected verification status: {}",
                status
            ))),
        }
    }
}

/// Approves any well-formed six digit code. Deliberately deterministic so the
/// lead form stays usable end to end without provider credentials.
pub struct DemoVerify;

fn demo_code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{6}$").unwrap())
}

#[async_trait]
impl VerifyTransport for DemoVerify {
    async fn start_verification(&self, to: &str) -> Result<StartedVerification> {
        tracing::debug!("Demo verification started for {}", to);

        Ok(StartedVerification {
            sid: format!("demo-{}", Ulid::new().to_string().to_lowercase()),
            message: "Verification code sent (Demo Mode)".to_string(),
        })
    }

    async fn check_code(&self, _to: &str, code: &str) -> Result<CheckOutcome> {
        if demo_code_regex().is_match(code) {
            Ok(CheckOutcome::Approved)
        } else {
            Ok(CheckOutcome::Denied)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn demo_check_approves_only_six_digit_codes() {
        let transport = DemoVerify;

        assert_eq!(
            transport.check_code("+14165550142", "123456").await.unwrap(),
            CheckOutcome::Approved
        );
        assert_eq!(
            transport.check_code("+14165550142", "12345").await.unwrap(),
            CheckOutcome::Denied
        );
        assert_eq!(
            transport.check_code("+14165550142", "abcdef").await.unwrap(),
            CheckOutcome::Denied
        );
        assert_eq!(
            transport.check_code("+14165550142", "1234567").await.unwrap(),
            CheckOutcome::Denied
        );
    }

    #[tokio::test]
    async fn demo_send_is_tagged_and_returns_a_synthetic_sid() {
        let transport = DemoVerify;

        let started = transport.start_verification("+14165550142").await.unwrap();

        assert!(started.sid.starts_with("demo-"));
        assert!(started.message.contains("(Demo Mode)"));
    }
}
