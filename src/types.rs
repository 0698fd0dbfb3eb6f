pub use crate::utils::database;
use crate::utils::{
    notification::{email::MailTransport, sms::SmsTransport},
    rate_limit::RateLimiter,
    verify::{self, VerifyTransport},
};
use async_trait::async_trait;
use std::{env, sync::Arc, time::Duration};

const OTP_RATE_LIMIT_WINDOW: Duration = Duration::from_secs(15 * 60);

#[derive(Clone)]
pub enum AppEnvironment {
    Production,
    Development,
}

impl AppEnvironment {
    pub fn from(raw_environment: String) -> Self {
        match raw_environment.as_ref() {
            "production" => Self::Production,
            _ => Self::Development,
        }
    }
}

#[derive(Clone)]
pub struct AppContext {
    pub host: String,
    pub environment: AppEnvironment,
    pub port: u32,
    pub url: String,
}

#[derive(Clone)]
pub struct RecipientsContext {
    pub email: Vec<String>,
    pub sms: Vec<String>,
}

#[derive(Clone)]
pub struct Context {
    pub app: AppContext,
    pub db_conn: database::DatabaseConnection,
    pub verifier: Arc<dyn VerifyTransport>,
    pub mailer: MailTransport,
    pub sms: SmsTransport,
    pub recipients: RecipientsContext,
    pub otp_limiter: Arc<RateLimiter>,
}

#[derive(Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub environment: AppEnvironment,
    pub port: u32,
    pub url: String,
}

#[derive(Clone)]
pub struct MailConfig {
    pub sender: String,
    pub uri: String,
}

#[derive(Clone)]
pub struct VerifyConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub service_sid: String,
}

#[derive(Clone)]
pub struct SmsConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

#[derive(Clone)]
pub struct NotificationConfig {
    pub email_recipients: Vec<String>,
    pub sms_recipients: Vec<String>,
}

#[derive(Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub app: AppConfig,
    pub mail: Option<MailConfig>,
    pub verify: Option<VerifyConfig>,
    pub sms: Option<SmsConfig>,
    pub notification: NotificationConfig,
}

fn split_recipients(raw: String) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|recipient| !recipient.is_empty())
        .map(String::from)
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL not set");
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let environment = env::var("APP_ENV").expect("APP_ENV not set");
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u32>()
            .expect("Invalid PORT number");
        let url = env::var("URL").unwrap_or_else(|_| format!("http://{}:{}", host, port));

        // provider credential groups are optional, a missing group selects
        // that concern's demo transport at startup
        let verify = match (
            env::var("TWILIO_ACCOUNT_SID"),
            env::var("TWILIO_AUTH_TOKEN"),
            env::var("TWILIO_VERIFY_SERVICE_SID"),
        ) {
            (Ok(account_sid), Ok(auth_token), Ok(service_sid)) => Some(VerifyConfig {
                account_sid,
                auth_token,
                service_sid,
            }),
            _ => None,
        };
        let sms = match (
            env::var("TWILIO_ACCOUNT_SID"),
            env::var("TWILIO_AUTH_TOKEN"),
            env::var("TWILIO_PHONE_NUMBER"),
        ) {
            (Ok(account_sid), Ok(auth_token), Ok(from_number)) => Some(SmsConfig {
                account_sid,
                auth_token,
                from_number,
            }),
            _ => None,
        };
        let mail = match (env::var("MAIL_URI"), env::var("MAIL_SENDER")) {
            (Ok(uri), Ok(sender)) => Some(MailConfig { sender, uri }),
            _ => None,
        };

        let email_recipients = env::var("LEAD_EMAIL_RECIPIENTS")
            .map(split_recipients)
            .unwrap_or_default();
        let sms_recipients = env::var("LEAD_SMS_RECIPIENTS")
            .map(split_recipients)
            .unwrap_or_default();

        Self {
            database: DatabaseConfig { url: database_url },
            app: AppConfig {
                host,
                environment: AppEnvironment::from(environment),
                port,
                url,
            },
            mail,
            verify,
            sms,
            notification: NotificationConfig {
                email_recipients,
                sms_recipients,
            },
        }
    }
}

#[async_trait]
pub trait ToContext {
    async fn to_context(self) -> Context;
}

#[async_trait]
impl ToContext for Config {
    async fn to_context(self) -> Context {
        let db_conn = database::connect(self.database.url.as_str()).await;
        database::migrate(db_conn.clone()).await;

        let max_otp_requests = match self.app.environment {
            AppEnvironment::Production => 5,
            AppEnvironment::Development => 50,
        };

        Context {
            app: AppContext {
                host: self.app.host,
                environment: self.app.environment,
                port: self.app.port,
                url: self.app.url,
            },
            db_conn: db_conn.clone(),
            verifier: verify::from_config(self.verify),
            mailer: MailTransport::from_config(self.mail),
            sms: SmsTransport::from_config(self.sms),
            recipients: RecipientsContext {
                email: self.notification.email_recipients,
                sms: self.notification.sms_recipients,
            },
            otp_limiter: Arc::new(RateLimiter::new(max_otp_requests, OTP_RATE_LIMIT_WINDOW)),
        }
    }
}
