use super::{Error, LeadData, Result};
use crate::types::{Context, MailConfig};
use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Arc;
use uri_parser::parse_uri;
use urlencoding::decode;

#[derive(Clone)]
pub enum MailTransport {
    Live {
        transport: AsyncSmtpTransport<Tokio1Executor>,
        sender: String,
    },
    Demo,
}

impl MailTransport {
    pub fn from_config(config: Option<MailConfig>) -> Self {
        match config {
            Some(config) => {
                let parsed_mail_uri = parse_uri(&config.uri).expect("Invalid mail uri");
                let host = parsed_mail_uri.host.expect("Invalid mail host").to_string();
                let user = parsed_mail_uri.user.expect("Invalid mail user");
                let password = decode(user.password.expect("Invalid mail password"))
                    .expect("Invalid mail password")
                    .to_string();
                let user = decode(user.name).expect("Invalid mail user").to_string();

                let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(host.as_str())
                    .expect("Invalid mail host")
                    .credentials(Credentials::new(user, password))
                    .build();

                Self::Live {
                    transport,
                    sender: config.sender,
                }
            }
            None => {
                tracing::warn!("MAIL_URI not set, lead notification email is running in demo mode");
                Self::Demo
            }
        }
    }
}

pub struct SendReport {
    pub recipients: Vec<String>,
    pub message: String,
}

fn lead_email_body(lead: &LeadData) -> String {
    format!(
        "<p>A new lead just came in through the website.</p>\
         <ul>\
         <li>Name: {}</li>\
         <li>Gender: {}</li>\
         <li>Date of birth: {}</li>\
         <li>Smoking status: {}</li>\
         <li>Province: {}</li>\
         <li>Product: {}</li>\
         <li>Phone: {}</li>\
         <li>Email: {}</li>\
         </ul>",
        lead.full_name(),
        lead.gender,
        lead.date_of_birth.format("%Y-%m-%d"),
        lead.smoking_status,
        lead.province,
        lead.insurance_product,
        lead.phone_number,
        lead.email.as_deref().unwrap_or("not provided"),
    )
}

pub async fn send(ctx: Arc<Context>, lead: &LeadData) -> Result<SendReport> {
    match &ctx.mailer {
        MailTransport::Demo => {
            tracing::info!(
                "Mail transport not configured, lead notification for {} logged only",
                lead.full_name()
            );
            Ok(SendReport {
                recipients: ctx.recipients.email.clone(),
                message: "Lead notification processed (Demo Mode)".to_string(),
            })
        }
        MailTransport::Live { transport, sender } => {
            if ctx.recipients.email.is_empty() {
                return Ok(SendReport {
                    recipients: vec![],
                    message: "No notification recipients configured".to_string(),
                });
            }

            let mut builder = Message::builder()
                .from(sender.parse().map_err(|err| {
                    tracing::error!("Invalid mail sender address: {}", err);
                    Error::NotSent
                })?)
                .subject(format!("New Lead: {}", lead.full_name()))
                .header(ContentType::TEXT_HTML);

            for recipient in ctx.recipients.email.iter() {
                builder = builder.to(recipient.parse().map_err(|err| {
                    tracing::error!("Invalid mail recipient address: {}", err);
                    Error::NotSent
                })?);
            }

            let email = builder.body(lead_email_body(lead)).map_err(|err| {
                tracing::error!("Failed to build lead notification email: {}", err);
                Error::NotSent
            })?;

            transport.send(email).await.map_err(|err| {
                tracing::error!("Failed to send lead notification email: {}", err);
                Error::NotSent
            })?;

            tracing::debug!("Lead notification email sent for {}", lead.full_name());

            Ok(SendReport {
                recipients: ctx.recipients.email.clone(),
                message: "Lead notification email sent".to_string(),
            })
        }
    }
}
