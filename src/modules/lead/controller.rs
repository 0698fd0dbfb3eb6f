use super::{
    form::{self, FormAction, FormState, VerificationState, RESEND_COOLDOWN_SECONDS},
    repository,
};
use crate::{
    types::Context,
    utils::{
        database::DatabaseConnection,
        notification::{email, sms, LeadData},
        verify::{CheckOutcome, VerifyTransport},
    },
};
use async_trait::async_trait;
use std::{sync::Arc, time::Duration};

/// Where approved leads end up. The controller only ever reaches persistence
/// through this seam, which is what keeps the verify-before-persist rule
/// testable.
#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn create_lead(
        &self,
        payload: repository::CreateLeadPayload,
    ) -> Result<repository::Lead, repository::Error>;
}

/// Post-persistence side effects. Implementations swallow and log their own
/// failures; a lost notification never fails a captured lead.
#[async_trait]
pub trait LeadNotifier: Send + Sync {
    async fn lead_captured(&self, lead: &repository::Lead);
}

pub struct PgLeadStore {
    db: DatabaseConnection,
}

impl PgLeadStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LeadStore for PgLeadStore {
    async fn create_lead(
        &self,
        payload: repository::CreateLeadPayload,
    ) -> Result<repository::Lead, repository::Error> {
        repository::create(&self.db.pool, payload).await
    }
}

pub struct ContextNotifier {
    ctx: Arc<Context>,
}

impl ContextNotifier {
    pub fn new(ctx: Arc<Context>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl LeadNotifier for ContextNotifier {
    async fn lead_captured(&self, lead: &repository::Lead) {
        let lead_data = LeadData::from(lead.clone());

        if email::send(self.ctx.clone(), &lead_data).await.is_err() {
            tracing::error!("Lead notification email failed, continuing");
        }

        let report = sms::send(self.ctx.clone(), &lead_data).await;
        for result in report.results.iter().filter(|result| !result.success) {
            tracing::error!(
                "Lead alert sms to {} failed: {}",
                result.to,
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum RequestCodeOutcome {
    Sent,
    Failed,
    NotAllowed,
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Completed(repository::Lead),
    CodeDenied,
    TransportFailed,
    PersistenceFailed,
    NotReady,
}

/// Drives the three step wizard against the injected collaborators. A lead is
/// never persisted without an approved verification check, and a persistence
/// failure keeps the approval so the visitor is not forced to re-verify.
pub struct FormController {
    state: FormState,
    verifier: Arc<dyn VerifyTransport>,
    store: Arc<dyn LeadStore>,
    notifier: Arc<dyn LeadNotifier>,
}

impl FormController {
    pub fn new(
        verifier: Arc<dyn VerifyTransport>,
        store: Arc<dyn LeadStore>,
        notifier: Arc<dyn LeadNotifier>,
    ) -> Self {
        Self {
            state: FormState::default(),
            verifier,
            store,
            notifier,
        }
    }

    /// Wires the controller to the process context: the startup-selected
    /// verification transport, the leads table, and the notification fan out.
    pub fn for_context(ctx: Arc<Context>) -> Self {
        Self::new(
            ctx.verifier.clone(),
            Arc::new(PgLeadStore::new(ctx.db_conn.clone())),
            Arc::new(ContextNotifier::new(ctx)),
        )
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn dispatch(&mut self, action: FormAction) {
        self.state = form::reduce(std::mem::take(&mut self.state), action);
    }

    pub fn full_phone_number(&self) -> String {
        format!(
            "{}{}",
            self.state.contact.country_code.dialing_code(),
            self.state.contact.phone
        )
    }

    pub async fn request_code(&mut self) -> RequestCodeOutcome {
        if !self.state.verification.can_request_code() || self.state.contact.phone.is_empty() {
            return RequestCodeOutcome::NotAllowed;
        }

        let previous = self.state.verification;
        self.state.verification = VerificationState::Sending;

        match self.verifier.start_verification(&self.full_phone_number()).await {
            Ok(started) => {
                self.state.verification = VerificationState::Sent {
                    cooldown_seconds: RESEND_COOLDOWN_SECONDS,
                };
                self.state.status_message = Some(started.message);
                RequestCodeOutcome::Sent
            }
            Err(err) => {
                tracing::error!("Failed to send verification code: {}", err.message());
                // a failed send leaves the sent/unsent position unchanged
                self.state.verification = previous;
                self.state.status_message =
                    Some("Could not send the verification code. Please try again.".to_string());
                RequestCodeOutcome::Failed
            }
        }
    }

    /// One second ticks until the resend cooldown reaches zero. Holding
    /// `&mut self` for the duration means at most one ticker can exist.
    pub async fn run_cooldown(&mut self) {
        while let VerificationState::Sent { cooldown_seconds } = self.state.verification {
            if cooldown_seconds == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
            self.dispatch(FormAction::TickCooldown);
        }
    }

    fn lead_payload(&self) -> Option<repository::CreateLeadPayload> {
        Some(repository::CreateLeadPayload {
            first_name: self.state.personal.first_name.clone(),
            last_name: if self.state.personal.last_name.is_empty() {
                None
            } else {
                Some(self.state.personal.last_name.clone())
            },
            gender: self.state.personal.gender?,
            date_of_birth: self.state.personal.dob?,
            smoking_status: self.state.preferences.smoking_status?,
            province: self.state.preferences.province?,
            insurance_product: self.state.preferences.insurance_product?,
            email: if self.state.contact.email.is_empty() {
                None
            } else {
                Some(self.state.contact.email.clone())
            },
            phone_number: self.full_phone_number(),
        })
    }

    pub async fn submit(&mut self) -> SubmitOutcome {
        // a resubmission after a persistence failure skips re-verification
        if self.state.verification != VerificationState::Approved {
            if !form::can_submit(&self.state) {
                return SubmitOutcome::NotReady;
            }

            let to = self.full_phone_number();
            self.state.verification = VerificationState::Verifying;

            match self.verifier.check_code(&to, &self.state.contact.otp).await {
                Err(err) => {
                    tracing::error!("Verification check failed: {}", err.message());
                    self.state.verification = VerificationState::Failed;
                    self.state.status_message = Some(
                        "Verification is unavailable right now. Please try again.".to_string(),
                    );
                    return SubmitOutcome::TransportFailed;
                }
                Ok(CheckOutcome::Denied) => {
                    self.state.verification = VerificationState::Denied;
                    // inline field error only, no generic banner
                    self.state.errors.otp =
                        Some("The code you entered is incorrect".to_string());
                    return SubmitOutcome::CodeDenied;
                }
                Ok(CheckOutcome::Approved) => {
                    self.state.verification = VerificationState::Approved;
                    self.state.errors.otp = None;
                    self.state.locked = true;
                }
            }
        }

        let Some(payload) = self.lead_payload() else {
            return SubmitOutcome::NotReady;
        };

        match self.store.create_lead(payload).await {
            Ok(lead) => {
                self.notifier.lead_captured(&lead).await;
                self.state.status_message = None;
                SubmitOutcome::Completed(lead)
            }
            Err(_) => {
                self.state.status_message = Some(
                    "Something went wrong while submitting your request. Please try again."
                        .to_string(),
                );
                SubmitOutcome::PersistenceFailed
            }
        }
    }
}
