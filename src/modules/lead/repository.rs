use super::form::{Gender, InsuranceProduct, Province, SmokingStatus};
use crate::utils::notification::LeadData;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use ulid::Ulid;

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct Lead {
    pub id: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub gender: String,
    pub date_of_birth: NaiveDate,
    pub smoking_status: String,
    pub province: String,
    pub insurance_product: String,
    pub email: Option<String>,
    pub phone_number: String,
    pub created_at: NaiveDateTime,
}

impl From<Lead> for LeadData {
    fn from(lead: Lead) -> Self {
        Self {
            first_name: lead.first_name,
            last_name: lead.last_name,
            gender: lead.gender,
            date_of_birth: lead.date_of_birth,
            smoking_status: lead.smoking_status,
            province: lead.province,
            insurance_product: lead.insurance_product,
            email: lead.email,
            phone_number: lead.phone_number,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CreateLeadPayload {
    pub first_name: String,
    pub last_name: Option<String>,
    pub gender: Gender,
    pub date_of_birth: NaiveDate,
    pub smoking_status: SmokingStatus,
    pub province: Province,
    pub insurance_product: InsuranceProduct,
    pub email: Option<String>,
    pub phone_number: String,
}

pub async fn create<'e, E>(db: E, payload: CreateLeadPayload) -> Result<Lead>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Lead>(
        "
        INSERT INTO leads (id, first_name, last_name, gender, date_of_birth, smoking_status, province, insurance_product, email, phone_number)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        ",
    )
    .bind(Ulid::new().to_string())
    .bind(payload.first_name)
    .bind(payload.last_name)
    .bind(payload.gender.as_str())
    .bind(payload.date_of_birth)
    .bind(payload.smoking_status.as_str())
    .bind(payload.province.as_str())
    .bind(payload.insurance_product.as_str())
    .bind(payload.email)
    .bind(payload.phone_number)
    .fetch_one(db)
    .await
    .map_err(|err| {
        log::error!("Error occurred while creating lead: {}", err);
        Error::UnexpectedError
    })
}

pub async fn find_by_id<'e, E>(db: E, id: String) -> Result<Option<Lead>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while trying to fetch lead by id: {}", err);
            Error::UnexpectedError
        })
}
