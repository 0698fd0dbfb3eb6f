pub mod email;
pub mod sms;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Lead payload carried by the notification side effects. Field names match
/// the public form's wire format.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LeadData {
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    pub gender: String,
    pub date_of_birth: NaiveDate,
    pub smoking_status: String,
    pub province: String,
    pub insurance_product: String,
    #[serde(default)]
    pub email: Option<String>,
    pub phone_number: String,
}

impl LeadData {
    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last_name) => format!("{} {}", self.first_name, last_name),
            None => self.first_name.clone(),
        }
    }
}

#[derive(Debug)]
pub enum Error {
    NotSent,
}

pub type Result<T> = std::result::Result<T, Error>;
