use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;
use uuid::Uuid;

/// Court the case belongs to. Serialized as its numeric identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TribunalType {
    Civil = 1,
    Commercial = 2,
    Social = 3,
}

/// Kind of case document. Serialized as its numeric identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CaseType {
    Hearings = 1,
    Notifications = 2,
    Enforcement = 3,
    Orders = 4,
}

impl TryFrom<u8> for TribunalType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(TribunalType::Civil),
            2 => Ok(TribunalType::Commercial),
            3 => Ok(TribunalType::Social),
            other => Err(format!("unknown tribunal type: {}", other)),
        }
    }
}

impl From<TribunalType> for u8 {
    fn from(value: TribunalType) -> Self {
        value as u8
    }
}

impl TryFrom<u8> for CaseType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(CaseType::Hearings),
            2 => Ok(CaseType::Notifications),
            3 => Ok(CaseType::Enforcement),
            4 => Ok(CaseType::Orders),
            other => Err(format!("unknown case type: {}", other)),
        }
    }
}

impl From<CaseType> for u8 {
    fn from(value: CaseType) -> Self {
        value as u8
    }
}

impl Display for TribunalType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            TribunalType::Civil => write!(f, "civil"),
            TribunalType::Commercial => write!(f, "commercial"),
            TribunalType::Social => write!(f, "social"),
        }
    }
}

impl Display for CaseType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            CaseType::Hearings => write!(f, "hearings"),
            CaseType::Notifications => write!(f, "notifications"),
            CaseType::Enforcement => write!(f, "enforcement"),
            CaseType::Orders => write!(f, "orders"),
        }
    }
}

/// Case fields as typed by the user. Numeric fields arrive as text and are
/// sanitized by the recorder.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmissionFields {
    pub year: String,
    pub code: String,
    #[serde(rename = "fileNumber")]
    pub file_number: String,
    #[serde(rename = "tribunalType")]
    #[schema(value_type = u8)]
    pub tribunal_type: TribunalType,
    #[serde(rename = "caseType")]
    #[schema(value_type = u8)]
    pub case_type: CaseType,
    /// Optional free-text label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Request body for `POST /submissions`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmissionRequest {
    #[serde(flatten)]
    pub fields: SubmissionFields,
    /// Storage keys returned by `POST /presigned-urls`, all uploaded
    #[serde(rename = "fileKeys", default)]
    pub file_keys: Vec<String>,
}

/// Persisted case submission referencing the uploaded objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    pub id: Uuid,
    pub owner: String,
    pub year: u32,
    pub code: u32,
    pub file_number: u32,
    #[schema(value_type = u8)]
    pub tribunal_type: TribunalType,
    #[schema(value_type = u8)]
    pub case_type: CaseType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(rename = "fileKeys")]
    #[schema(value_type = Vec<String>)]
    pub storage_keys: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}
