use super::LeadData;
use crate::types::{Context, SmsConfig};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

const PROVIDER_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone)]
pub enum SmsTransport {
    Live {
        account_sid: String,
        auth_token: String,
        from_number: String,
        client: reqwest::Client,
    },
    Demo,
}

impl SmsTransport {
    pub fn from_config(config: Option<SmsConfig>) -> Self {
        match config {
            Some(config) => Self::Live {
                account_sid: config.account_sid,
                auth_token: config.auth_token,
                from_number: config.from_number,
                client: reqwest::Client::builder()
                    .timeout(PROVIDER_TIMEOUT)
                    .build()
                    .expect("Failed to build sms http client"),
            },
            None => {
                tracing::warn!(
                    "TWILIO_PHONE_NUMBER not set, lead alert sms is running in demo mode"
                );
                Self::Demo
            }
        }
    }
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryResult {
    pub to: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct SmsReport {
    pub results: Vec<DeliveryResult>,
    pub message: String,
}

fn lead_sms_body(lead: &LeadData) -> String {
    format!(
        "New Coverline lead: {} ({}, {}). Phone: {}",
        lead.full_name(),
        lead.insurance_product,
        lead.province,
        lead.phone_number,
    )
}

async fn send_one(
    client: &reqwest::Client,
    account_sid: &str,
    auth_token: &str,
    from_number: &str,
    to: &str,
    body: &str,
) -> DeliveryResult {
    let url = format!(
        "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
        account_sid
    );

    let res = client
        .post(&url)
        .basic_auth(account_sid, Some(auth_token))
        .form(&[("To", to), ("From", from_number), ("Body", body)])
        .send()
        .await;

    match res {
        Ok(res) if !res.status().is_success() => {
            let detail = res.text().await.unwrap_or_default();
            tracing::error!("Failed to send lead alert sms to {}: {}", to, detail);
            DeliveryResult {
                to: to.to_string(),
                success: false,
                error: Some(detail),
            }
        }
        Ok(_) => DeliveryResult {
            to: to.to_string(),
            success: true,
            error: None,
        },
        Err(err) => {
            tracing::error!("Failed to send lead alert sms to {}: {}", to, err);
            DeliveryResult {
                to: to.to_string(),
                success: false,
                error: Some(err.to_string()),
            }
        }
    }
}

/// One provider call per configured recipient. A failed recipient is recorded
/// in its result entry and never aborts the rest of the fan out.
pub async fn send(ctx: Arc<Context>, lead: &LeadData) -> SmsReport {
    match &ctx.sms {
        SmsTransport::Demo => SmsReport {
            results: ctx
                .recipients
                .sms
                .iter()
                .map(|to| DeliveryResult {
                    to: to.clone(),
                    success: true,
                    error: None,
                })
                .collect(),
            message: "Lead alert sms processed (Demo Mode)".to_string(),
        },
        SmsTransport::Live {
            account_sid,
            auth_token,
            from_number,
            client,
        } => {
            let body = lead_sms_body(lead);
            let results = futures::future::join_all(ctx.recipients.sms.iter().map(|to| {
                send_one(
                    client,
                    account_sid.as_str(),
                    auth_token.as_str(),
                    from_number.as_str(),
                    to.as_str(),
                    body.as_str(),
                )
            }))
            .await;

            SmsReport {
                results,
                message: "Lead alert sms sent".to_string(),
            }
        }
    }
}
