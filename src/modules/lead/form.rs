use chrono::{Datelike, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub const MAX_NAME_LENGTH: usize = 25;
pub const RESEND_COOLDOWN_SECONDS: u32 = 30;
pub const MIN_ACCEPTED_AGE: i32 = 18;
pub const MAX_ACCEPTED_AGE: i32 = 80;

fn name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z\s\-']+$").unwrap())
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[A-Za-z]{2,}$").unwrap())
}

fn otp_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{6}$").unwrap())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WizardStep {
    Personal,
    Preferences,
    Contact,
}

impl WizardStep {
    pub fn number(self) -> u8 {
        match self {
            Self::Personal => 1,
            Self::Preferences => 2,
            Self::Contact => 3,
        }
    }

    fn next(self) -> Self {
        match self {
            Self::Personal => Self::Preferences,
            Self::Preferences | Self::Contact => Self::Contact,
        }
    }

    fn previous(self) -> Self {
        match self {
            Self::Personal | Self::Preferences => Self::Personal,
            Self::Contact => Self::Preferences,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SmokingStatus {
    Smoker,
    NonSmoker,
}

impl SmokingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Smoker => "smoker",
            Self::NonSmoker => "non-smoker",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Province {
    AB,
    BC,
    MB,
    NB,
    NL,
    NS,
    NT,
    NU,
    ON,
    PE,
    QC,
    SK,
    YT,
}

impl Province {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AB => "AB",
            Self::BC => "BC",
            Self::MB => "MB",
            Self::NB => "NB",
            Self::NL => "NL",
            Self::NS => "NS",
            Self::NT => "NT",
            Self::NU => "NU",
            Self::ON => "ON",
            Self::PE => "PE",
            Self::QC => "QC",
            Self::SK => "SK",
            Self::YT => "YT",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InsuranceProduct {
    TermLife,
    WholeLife,
    UniversalLife,
    CriticalIllness,
    Disability,
    VisitorVisa,
}

impl InsuranceProduct {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TermLife => "term-life",
            Self::WholeLife => "whole-life",
            Self::UniversalLife => "universal-life",
            Self::CriticalIllness => "critical-illness",
            Self::Disability => "disability",
            Self::VisitorVisa => "visitor-visa",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountryCode {
    #[default]
    UsCa,
    Uk,
    Au,
    In,
}

impl CountryCode {
    pub fn dialing_code(self) -> &'static str {
        match self {
            Self::UsCa => "+1",
            Self::Uk => "+44",
            Self::Au => "+61",
            Self::In => "+91",
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct PersonalInfo {
    pub first_name: String,
    pub last_name: String,
    pub gender: Option<Gender>,
    pub dob_input: String,
    pub dob: Option<NaiveDate>,
}

#[derive(Clone, Debug, Default)]
pub struct Preferences {
    pub smoking_status: Option<SmokingStatus>,
    pub province: Option<Province>,
    pub insurance_product: Option<InsuranceProduct>,
}

#[derive(Clone, Debug, Default)]
pub struct ContactInfo {
    pub email: String,
    pub country_code: CountryCode,
    pub phone: String,
    pub otp: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub dob: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub otp: Option<String>,
}

impl FieldErrors {
    pub fn is_clear(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.dob.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.otp.is_none()
    }
}

/// Verification progress as one tagged state. A contradictory combination
/// like "sending while already sent" is unrepresentable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerificationState {
    Idle,
    Sending,
    Sent { cooldown_seconds: u32 },
    Verifying,
    Approved,
    Denied,
    Failed,
}

impl VerificationState {
    /// A new send is allowed from rest states and from an expired cooldown.
    /// `Failed` is only ever entered after a code was sent, so a resend from
    /// it is a resend, not a first send.
    pub fn can_request_code(self) -> bool {
        matches!(
            self,
            Self::Idle | Self::Denied | Self::Failed | Self::Sent { cooldown_seconds: 0 }
        )
    }

    /// Whether a code has been sent and submission may attempt a check.
    /// `Denied` loops back for a fresh code entry without a new send.
    pub fn can_check(self) -> bool {
        matches!(self, Self::Sent { .. } | Self::Denied | Self::Failed)
    }
}

#[derive(Clone, Debug)]
pub struct FormState {
    pub step: WizardStep,
    pub personal: PersonalInfo,
    pub preferences: Preferences,
    pub contact: ContactInfo,
    pub verification: VerificationState,
    pub errors: FieldErrors,
    pub status_message: Option<String>,
    pub locked: bool,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            step: WizardStep::Personal,
            personal: PersonalInfo::default(),
            preferences: Preferences::default(),
            contact: ContactInfo::default(),
            verification: VerificationState::Idle,
            errors: FieldErrors::default(),
            status_message: None,
            locked: false,
        }
    }
}

#[derive(Clone, Debug)]
pub enum FormAction {
    SetFirstName(String),
    SetLastName(String),
    SetGender(Gender),
    /// Free-typed date of birth, auto-formatted as MM/DD/YYYY while typing.
    TypeDob(String),
    /// Native date picker output.
    SetDob(NaiveDate),
    SetSmokingStatus(SmokingStatus),
    SetProvince(Province),
    SetInsuranceProduct(InsuranceProduct),
    SetEmail(String),
    SetCountryCode(CountryCode),
    SetPhone(String),
    SetOtp(String),
    Advance,
    Retreat,
    TickCooldown,
}

pub fn validate_name(value: &str, required: bool) -> Result<(), String> {
    if value.is_empty() {
        return if required {
            Err("This field is required".to_string())
        } else {
            Ok(())
        };
    }
    if value.len() > MAX_NAME_LENGTH {
        return Err(format!("Must be {} characters or fewer", MAX_NAME_LENGTH));
    }
    if !name_regex().is_match(value) {
        return Err("Only letters, spaces, hyphens and apostrophes are allowed".to_string());
    }
    Ok(())
}

pub fn validate_email(value: &str) -> Result<(), String> {
    if email_regex().is_match(value) {
        Ok(())
    } else {
        Err("Enter a valid email address".to_string())
    }
}

pub fn is_valid_otp(value: &str) -> bool {
    otp_regex().is_match(value)
}

/// Keeps at most eight digits of the raw input and re-inserts the
/// MM/DD/YYYY separators, so the field stays formatted while typing.
pub fn format_dob_input(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).take(8).collect();

    let mut formatted = String::with_capacity(10);
    for (i, c) in digits.chars().enumerate() {
        if i == 2 || i == 4 {
            formatted.push('/');
        }
        formatted.push(c);
    }
    formatted
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DobError {
    Invalid,
    Future,
    OutsideAcceptedRange,
}

impl DobError {
    pub fn message(self) -> &'static str {
        match self {
            Self::Invalid => "Enter a valid date",
            Self::Future => "Date of birth cannot be in the future",
            Self::OutsideAcceptedRange => "We can only serve applicants aged 18 to 80",
        }
    }
}

/// Accepts the native picker's ISO output or the typed MM/DD/YYYY form.
/// Impossible calendar dates fail the parse itself.
pub fn parse_dob(value: &str) -> Result<NaiveDate, DobError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%m/%d/%Y"))
        .map_err(|_| DobError::Invalid)
}

fn age_on(dob: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        age -= 1;
    }
    age
}

pub fn dob_accepted(dob: NaiveDate, today: NaiveDate) -> Result<(), DobError> {
    if dob > today {
        return Err(DobError::Future);
    }
    let age = age_on(dob, today);
    if !(MIN_ACCEPTED_AGE..=MAX_ACCEPTED_AGE).contains(&age) {
        return Err(DobError::OutsideAcceptedRange);
    }
    Ok(())
}

fn apply_dob(state: &mut FormState, date: NaiveDate) {
    match dob_accepted(date, Utc::now().date_naive()) {
        Ok(()) => {
            state.personal.dob = Some(date);
            state.errors.dob = None;
        }
        Err(err) => {
            state.personal.dob = None;
            state.errors.dob = Some(err.message().to_string());
        }
    }
}

pub fn reduce(mut state: FormState, action: FormAction) -> FormState {
    // fields freeze once a verified submission has started
    if state.locked {
        return state;
    }

    match action {
        FormAction::SetFirstName(value) => {
            state.errors.first_name = validate_name(&value, true).err();
            state.personal.first_name = value;
        }
        FormAction::SetLastName(value) => {
            state.errors.last_name = validate_name(&value, false).err();
            state.personal.last_name = value;
        }
        FormAction::SetGender(gender) => {
            state.personal.gender = Some(gender);
        }
        FormAction::TypeDob(raw) => {
            let formatted = format_dob_input(&raw);
            if formatted.len() == 10 {
                match parse_dob(&formatted) {
                    Ok(date) => apply_dob(&mut state, date),
                    Err(err) => {
                        state.personal.dob = None;
                        state.errors.dob = Some(err.message().to_string());
                    }
                }
            } else {
                // still typing
                state.personal.dob = None;
                state.errors.dob = None;
            }
            state.personal.dob_input = formatted;
        }
        FormAction::SetDob(date) => {
            state.personal.dob_input = date.format("%m/%d/%Y").to_string();
            apply_dob(&mut state, date);
        }
        FormAction::SetSmokingStatus(status) => {
            state.preferences.smoking_status = Some(status);
        }
        FormAction::SetProvince(province) => {
            state.preferences.province = Some(province);
        }
        FormAction::SetInsuranceProduct(product) => {
            state.preferences.insurance_product = Some(product);
        }
        FormAction::SetEmail(value) => {
            state.errors.email = if value.is_empty() {
                None
            } else {
                validate_email(&value).err()
            };
            state.contact.email = value;
        }
        FormAction::SetCountryCode(code) => {
            state.contact.country_code = code;
        }
        FormAction::SetPhone(value) => {
            let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
            state.errors.phone = if digits.is_empty() {
                Some("Phone number is required".to_string())
            } else {
                None
            };
            state.contact.phone = digits;
        }
        FormAction::SetOtp(value) => {
            let digits: String = value.chars().filter(|c| c.is_ascii_digit()).take(6).collect();
            state.contact.otp = digits;
            // a fresh entry clears the inline denial error
            state.errors.otp = None;
        }
        FormAction::Advance => {
            if state.step != WizardStep::Contact && step_is_complete(&state, state.step) {
                state.step = state.step.next();
            }
        }
        FormAction::Retreat => {
            if state.step != WizardStep::Personal {
                state.step = state.step.previous();
            }
        }
        FormAction::TickCooldown => {
            if let VerificationState::Sent { cooldown_seconds } = state.verification {
                state.verification = VerificationState::Sent {
                    cooldown_seconds: cooldown_seconds.saturating_sub(1),
                };
            }
        }
    }

    state
}

pub fn step_is_complete(state: &FormState, step: WizardStep) -> bool {
    match step {
        WizardStep::Personal => {
            validate_name(&state.personal.first_name, true).is_ok()
                && validate_name(&state.personal.last_name, false).is_ok()
                && state.personal.gender.is_some()
                && state
                    .personal
                    .dob
                    .map(|dob| dob_accepted(dob, Utc::now().date_naive()).is_ok())
                    .unwrap_or(false)
        }
        WizardStep::Preferences => {
            state.preferences.smoking_status.is_some()
                && state.preferences.province.is_some()
                && state.preferences.insurance_product.is_some()
        }
        WizardStep::Contact => {
            !state.contact.phone.is_empty()
                && (state.contact.email.is_empty() || validate_email(&state.contact.email).is_ok())
        }
    }
}

/// The submission gate: step 3, every step valid, a sent code, a well formed
/// OTP entry, and no outstanding field errors.
pub fn can_submit(state: &FormState) -> bool {
    state.step == WizardStep::Contact
        && step_is_complete(state, WizardStep::Personal)
        && step_is_complete(state, WizardStep::Preferences)
        && step_is_complete(state, WizardStep::Contact)
        && is_valid_otp(&state.contact.otp)
        && state.verification.can_check()
        && state.errors.is_clear()
}
