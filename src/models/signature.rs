use serde::{Deserialize, Serialize};
use mongodb::bson;
use chrono::{DateTime, Utc};
use std::fmt;

mod option_datetime_as_bson {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use chrono::{DateTime, Utc};
    use mongodb::bson;

    pub fn serialize<S>(
        date: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(dt) => bson::DateTime::from_chrono(*dt).serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt: Option<bson::DateTime> = Option::deserialize(deserializer)?;
        Ok(opt.map(|dt| dt.to_chrono()))
    }
}

fn default_signature_type() -> String {
    "electronic".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureStatus {
    Pending,
    Signed,
    Rejected,
}

impl fmt::Display for SignatureStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SignatureStatus::Pending => write!(f, "Pending"),
            SignatureStatus::Signed => write!(f, "Signed"),
            SignatureStatus::Rejected => write!(f, "Rejected"),
        }
    }
}

/// A signer's standing on one document. `deleted_at` is always written
/// (as null while live) so the partial unique index can match on it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SignatureRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub document_id: String,
    pub signer_id: String,
    pub signer_name: String,
    pub signer_email: String,
    pub signer_role: String,
    pub signature_blob: Option<String>,
    #[serde(with = "option_datetime_as_bson", default)]
    pub signed_at: Option<DateTime<Utc>>,
    #[serde(default = "default_signature_type")]
    pub signature_type: String,
    pub status: SignatureStatus,
    pub notes: Option<String>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
    #[serde(with = "option_datetime_as_bson", default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SignatureRecord {
    pub fn new(document_id: String, signer_id: String, metadata: SignerMetadata) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            document_id,
            signer_id,
            signer_name: metadata.signer_name,
            signer_email: metadata.signer_email,
            signer_role: metadata.signer_role,
            signature_blob: None,
            signed_at: None,
            signature_type: metadata.signature_type,
            status: SignatureStatus::Pending,
            notes: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// A status change the workflow may ask the store to apply.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Sign { signature_blob: String },
    Reject { reason: String },
    Reset,
}

impl Transition {
    pub fn name(&self) -> &'static str {
        match self {
            Transition::Sign { .. } => "sign",
            Transition::Reject { .. } => "reject",
            Transition::Reset => "reset",
        }
    }

    pub fn allowed_from(&self) -> &'static [SignatureStatus] {
        match self {
            Transition::Sign { .. } | Transition::Reject { .. } => &[SignatureStatus::Pending],
            Transition::Reset => &[SignatureStatus::Signed, SignatureStatus::Rejected],
        }
    }

    pub fn target(&self) -> SignatureStatus {
        match self {
            Transition::Sign { .. } => SignatureStatus::Signed,
            Transition::Reject { .. } => SignatureStatus::Rejected,
            Transition::Reset => SignatureStatus::Pending,
        }
    }

    pub fn is_allowed_from(&self, status: SignatureStatus) -> bool {
        self.allowed_from().contains(&status)
    }

    /// In-place form of the transition, used by stores that hold records in memory.
    pub fn apply(&self, record: &mut SignatureRecord, now: DateTime<Utc>) {
        match self {
            Transition::Sign { signature_blob } => {
                record.signature_blob = Some(signature_blob.clone());
                record.signed_at = Some(now);
            }
            Transition::Reject { reason } => {
                record.notes = Some(reason.clone());
            }
            Transition::Reset => {
                record.signature_blob = None;
                record.signed_at = None;
                record.notes = None;
            }
        }
        record.status = self.target();
        record.updated_at = now;
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SignerMetadata {
    pub signer_name: String,
    pub signer_email: String,
    pub signer_role: String,
    #[serde(default = "default_signature_type")]
    pub signature_type: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RequestSignatureRequest {
    pub document_id: String,
    pub signer_id: String,
    #[serde(flatten)]
    pub metadata: SignerMetadata,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct UpdateSignatureRequest {
    pub signer_name: Option<String>,
    pub signer_email: Option<String>,
    pub signer_role: Option<String>,
    pub signature_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignDocumentRequest {
    pub signature_blob: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RejectSignatureRequest {
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusQuery {
    pub status: SignatureStatus,
}

/// API view of a record, with plain RFC 3339 timestamps.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SignatureResponse {
    pub id: String,
    pub document_id: String,
    pub signer_id: String,
    pub signer_name: String,
    pub signer_email: String,
    pub signer_role: String,
    pub signature_blob: Option<String>,
    pub signed_at: Option<DateTime<Utc>>,
    pub signature_type: String,
    pub status: SignatureStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SignatureRecord> for SignatureResponse {
    fn from(record: SignatureRecord) -> Self {
        Self {
            id: record.id,
            document_id: record.document_id,
            signer_id: record.signer_id,
            signer_name: record.signer_name,
            signer_email: record.signer_email,
            signer_role: record.signer_role,
            signature_blob: record.signature_blob,
            signed_at: record.signed_at,
            signature_type: record.signature_type,
            status: record.status,
            notes: record.notes,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct SignatureStats {
    pub total: u64,
    pub pending: u64,
    pub signed: u64,
    pub rejected: u64,
}

impl SignatureStats {
    pub fn from_records(records: &[SignatureRecord]) -> Self {
        records
            .iter()
            .filter(|r| r.deleted_at.is_none())
            .fold(Self::default(), |mut stats, record| {
                stats.total += 1;
                match record.status {
                    SignatureStatus::Pending => stats.pending += 1,
                    SignatureStatus::Signed => stats.signed += 1,
                    SignatureStatus::Rejected => stats.rejected += 1,
                }
                stats
            })
    }

    pub fn is_fully_approved(&self) -> bool {
        self.total > 0 && self.signed == self.total
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentApprovalResponse {
    pub document_id: String,
    pub stats: SignatureStats,
    pub fully_approved: bool,
}
