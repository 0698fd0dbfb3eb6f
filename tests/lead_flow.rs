use async_trait::async_trait;
use chrono::Utc;
use coverline_backend_rs::modules::lead::{
    controller::{FormController, LeadNotifier, LeadStore, RequestCodeOutcome, SubmitOutcome},
    form::{
        FormAction, Gender, InsuranceProduct, Province, SmokingStatus, VerificationState,
        WizardStep, RESEND_COOLDOWN_SECONDS,
    },
    repository::{CreateLeadPayload, Error as LeadError, Lead},
};
use coverline_backend_rs::utils::verify::{
    CheckOutcome, DemoVerify, Error as VerifyError, StartedVerification, VerifyTransport,
};
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};

fn lead_from(payload: &CreateLeadPayload) -> Lead {
    Lead {
        id: "01J00000000000000000000000".to_string(),
        first_name: payload.first_name.clone(),
        last_name: payload.last_name.clone(),
        gender: payload.gender.as_str().to_string(),
        date_of_birth: payload.date_of_birth,
        smoking_status: payload.smoking_status.as_str().to_string(),
        province: payload.province.as_str().to_string(),
        insurance_product: payload.insurance_product.as_str().to_string(),
        email: payload.email.clone(),
        phone_number: payload.phone_number.clone(),
        created_at: Utc::now().naive_utc(),
    }
}

#[derive(Default)]
struct RecordingStore {
    created: Mutex<Vec<CreateLeadPayload>>,
    fail: AtomicBool,
}

#[async_trait]
impl LeadStore for RecordingStore {
    async fn create_lead(&self, payload: CreateLeadPayload) -> Result<Lead, LeadError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(LeadError::UnexpectedError);
        }
        let lead = lead_from(&payload);
        self.created.lock().unwrap().push(payload);
        Ok(lead)
    }
}

#[derive(Default)]
struct CountingNotifier {
    count: AtomicUsize,
}

#[async_trait]
impl LeadNotifier for CountingNotifier {
    async fn lead_captured(&self, _lead: &Lead) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct ScriptedVerifier {
    send_fails: AtomicBool,
    check_fails: AtomicBool,
    denies: AtomicBool,
    sends: AtomicUsize,
    checks: AtomicUsize,
}

#[async_trait]
impl VerifyTransport for ScriptedVerifier {
    async fn start_verification(&self, _to: &str) -> Result<StartedVerification, VerifyError> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        if self.send_fails.load(Ordering::SeqCst) {
            Err(VerifyError::SendFailed("provider unavailable".to_string()))
        } else {
            Ok(StartedVerification {
                sid: "VE0123456789".to_string(),
                message: "Verification code sent".to_string(),
            })
        }
    }

    async fn check_code(&self, _to: &str, _code: &str) -> Result<CheckOutcome, VerifyError> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        if self.check_fails.load(Ordering::SeqCst) {
            Err(VerifyError::CheckFailed("provider unavailable".to_string()))
        } else if self.denies.load(Ordering::SeqCst) {
            Ok(CheckOutcome::Denied)
        } else {
            Ok(CheckOutcome::Approved)
        }
    }
}

fn fill_form(controller: &mut FormController) {
    for action in [
        FormAction::SetFirstName("Amelia".to_string()),
        FormAction::SetLastName("O'Brien-Smith".to_string()),
        FormAction::SetGender(Gender::Female),
        FormAction::TypeDob("03/15/1990".to_string()),
        FormAction::Advance,
        FormAction::SetSmokingStatus(SmokingStatus::NonSmoker),
        FormAction::SetProvince(Province::ON),
        FormAction::SetInsuranceProduct(InsuranceProduct::TermLife),
        FormAction::Advance,
        FormAction::SetEmail("amelia@example.com".to_string()),
        FormAction::SetPhone("4165550142".to_string()),
    ] {
        controller.dispatch(action);
    }
    assert_eq!(controller.state().step, WizardStep::Contact);
}

#[tokio::test]
async fn demo_mode_happy_path_persists_the_lead_exactly_once() {
    let store = Arc::new(RecordingStore::default());
    let notifier = Arc::new(CountingNotifier::default());
    let mut controller =
        FormController::new(Arc::new(DemoVerify), store.clone(), notifier.clone());

    fill_form(&mut controller);

    assert_eq!(controller.request_code().await, RequestCodeOutcome::Sent);
    assert_eq!(
        controller.state().verification,
        VerificationState::Sent {
            cooldown_seconds: RESEND_COOLDOWN_SECONDS
        }
    );
    assert!(controller
        .state()
        .status_message
        .as_deref()
        .unwrap()
        .contains("(Demo Mode)"));

    controller.dispatch(FormAction::SetOtp("654321".to_string()));

    let outcome = controller.submit().await;
    let lead = match outcome {
        SubmitOutcome::Completed(lead) => lead,
        other => panic!("expected completion, got {:?}", other),
    };

    let created = store.created.lock().unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].first_name, "Amelia");
    assert_eq!(created[0].last_name.as_deref(), Some("O'Brien-Smith"));
    assert_eq!(created[0].province, Province::ON);
    assert_eq!(created[0].insurance_product, InsuranceProduct::TermLife);
    assert_eq!(created[0].phone_number, "+14165550142");
    assert_eq!(lead.phone_number, "+14165550142");
    assert_eq!(notifier.count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn request_code_is_guarded_while_the_cooldown_is_running() {
    let verifier = Arc::new(ScriptedVerifier::default());
    let mut controller = FormController::new(
        verifier.clone(),
        Arc::new(RecordingStore::default()),
        Arc::new(CountingNotifier::default()),
    );

    fill_form(&mut controller);

    assert_eq!(controller.request_code().await, RequestCodeOutcome::Sent);
    assert_eq!(
        controller.request_code().await,
        RequestCodeOutcome::NotAllowed
    );
    assert_eq!(verifier.sends.load(Ordering::SeqCst), 1);

    for _ in 0..RESEND_COOLDOWN_SECONDS {
        controller.dispatch(FormAction::TickCooldown);
    }
    assert_eq!(
        controller.state().verification,
        VerificationState::Sent { cooldown_seconds: 0 }
    );

    assert_eq!(controller.request_code().await, RequestCodeOutcome::Sent);
    assert_eq!(verifier.sends.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn request_code_without_a_phone_number_is_a_no_op() {
    let verifier = Arc::new(ScriptedVerifier::default());
    let mut controller = FormController::new(
        verifier.clone(),
        Arc::new(RecordingStore::default()),
        Arc::new(CountingNotifier::default()),
    );

    assert_eq!(
        controller.request_code().await,
        RequestCodeOutcome::NotAllowed
    );
    assert_eq!(verifier.sends.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn a_denied_code_leaves_the_form_intact_and_never_persists() {
    let verifier = Arc::new(ScriptedVerifier::default());
    verifier.denies.store(true, Ordering::SeqCst);
    let store = Arc::new(RecordingStore::default());
    let mut controller = FormController::new(
        verifier.clone(),
        store.clone(),
        Arc::new(CountingNotifier::default()),
    );

    fill_form(&mut controller);
    controller.request_code().await;
    controller.dispatch(FormAction::SetOtp("000000".to_string()));

    let outcome = controller.submit().await;
    assert!(matches!(outcome, SubmitOutcome::CodeDenied));

    assert_eq!(controller.state().step, WizardStep::Contact);
    assert_eq!(controller.state().verification, VerificationState::Denied);
    assert_eq!(controller.state().personal.first_name, "Amelia");
    assert_eq!(controller.state().contact.phone, "4165550142");
    assert!(controller.state().errors.otp.is_some());
    assert!(store.created.lock().unwrap().is_empty());

    // a fresh entry clears the inline error and is allowed a new check
    // without a new send
    controller.dispatch(FormAction::SetOtp("123456".to_string()));
    assert!(controller.state().errors.otp.is_none());
    verifier.denies.store(false, Ordering::SeqCst);

    let outcome = controller.submit().await;
    assert!(matches!(outcome, SubmitOutcome::Completed(_)));
    assert_eq!(verifier.sends.load(Ordering::SeqCst), 1);
    assert_eq!(verifier.checks.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn submit_before_a_code_was_sent_never_reaches_the_collaborators() {
    let verifier = Arc::new(ScriptedVerifier::default());
    let store = Arc::new(RecordingStore::default());
    let mut controller = FormController::new(
        verifier.clone(),
        store.clone(),
        Arc::new(CountingNotifier::default()),
    );

    fill_form(&mut controller);
    controller.dispatch(FormAction::SetOtp("654321".to_string()));

    let outcome = controller.submit().await;
    assert!(matches!(outcome, SubmitOutcome::NotReady));
    assert_eq!(verifier.checks.load(Ordering::SeqCst), 0);
    assert!(store.created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn a_check_transport_failure_is_distinct_from_a_denial() {
    let verifier = Arc::new(ScriptedVerifier::default());
    verifier.check_fails.store(true, Ordering::SeqCst);
    let store = Arc::new(RecordingStore::default());
    let mut controller = FormController::new(
        verifier.clone(),
        store.clone(),
        Arc::new(CountingNotifier::default()),
    );

    fill_form(&mut controller);
    controller.request_code().await;
    controller.dispatch(FormAction::SetOtp("654321".to_string()));

    let outcome = controller.submit().await;
    assert!(matches!(outcome, SubmitOutcome::TransportFailed));

    // general status message, no inline code error, nothing persisted
    assert_eq!(controller.state().verification, VerificationState::Failed);
    assert!(controller.state().errors.otp.is_none());
    assert!(controller.state().status_message.is_some());
    assert!(store.created.lock().unwrap().is_empty());

    // the form stays resubmittable once the provider recovers
    verifier.check_fails.store(false, Ordering::SeqCst);
    let outcome = controller.submit().await;
    assert!(matches!(outcome, SubmitOutcome::Completed(_)));
}

#[tokio::test]
async fn a_failed_send_leaves_the_sent_position_unchanged() {
    let verifier = Arc::new(ScriptedVerifier::default());
    verifier.send_fails.store(true, Ordering::SeqCst);
    let mut controller = FormController::new(
        verifier.clone(),
        Arc::new(RecordingStore::default()),
        Arc::new(CountingNotifier::default()),
    );

    fill_form(&mut controller);

    let outcome = controller.request_code().await;
    assert_eq!(outcome, RequestCodeOutcome::Failed);
    assert_eq!(controller.state().verification, VerificationState::Idle);
    assert!(controller.state().status_message.is_some());

    // the retry is user initiated, nothing fires automatically
    assert_eq!(verifier.sends.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn a_persistence_failure_preserves_the_approval() {
    let verifier = Arc::new(ScriptedVerifier::default());
    let store = Arc::new(RecordingStore::default());
    let notifier = Arc::new(CountingNotifier::default());
    let mut controller = FormController::new(verifier.clone(), store.clone(), notifier.clone());

    fill_form(&mut controller);
    controller.request_code().await;
    controller.dispatch(FormAction::SetOtp("654321".to_string()));

    store.fail.store(true, Ordering::SeqCst);
    let outcome = controller.submit().await;
    assert!(matches!(outcome, SubmitOutcome::PersistenceFailed));
    assert_eq!(controller.state().verification, VerificationState::Approved);
    assert_eq!(controller.state().step, WizardStep::Contact);
    assert_eq!(controller.state().contact.otp, "654321");
    assert_eq!(notifier.count.load(Ordering::SeqCst), 0);

    // the retry goes straight to persistence, no second check call
    store.fail.store(false, Ordering::SeqCst);
    let outcome = controller.submit().await;
    assert!(matches!(outcome, SubmitOutcome::Completed(_)));
    assert_eq!(verifier.checks.load(Ordering::SeqCst), 1);
    assert_eq!(store.created.lock().unwrap().len(), 1);
    assert_eq!(notifier.count.load(Ordering::SeqCst), 1);
}
