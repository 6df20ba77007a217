use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::TryStreamExt;
use mongodb::{Client, Collection};
use mongodb::bson::{self, doc, Bson, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument, ServerApi, ServerApiVersion};
use mongodb::IndexModel;

use crate::models::{SignatureRecord, SignatureStatus, StorageError, Transition};
use crate::traits::SignatureStore;

const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Clone)]
pub struct MongoDBService {
    signatures: Collection<SignatureRecord>,
}

impl MongoDBService {
    pub async fn init(uri: &str, database: &str) -> Result<Self, mongodb::error::Error> {
        // Parse options and configure client
        let mut client_options = ClientOptions::parse(uri).await?;

        let server_api = ServerApi::builder()
            .version(ServerApiVersion::V1)
            .strict(true)
            .deprecation_errors(true)
            .build();
        client_options.server_api = Some(server_api);

        client_options.connect_timeout = Some(std::time::Duration::from_secs(10));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        let client = Client::with_options(client_options)?;

        // Test connection
        client
            .database("admin")
            .run_command(doc! {"ping": 1}, None)
            .await?;

        log::info!("Successfully connected to MongoDB, using database {}", database);

        let db = client.database(database);
        let signatures = db.collection::<SignatureRecord>("signatures");

        // One live record per (document, signer); soft-deleted rows keep a
        // non-null deleted_at and drop out of the index.
        let unique_options = IndexOptions::builder()
            .unique(true)
            .name("document_signer_live".to_string())
            .partial_filter_expression(doc! { "deleted_at": { "$type": "null" } })
            .build();
        let unique_model = IndexModel::builder()
            .keys(doc! { "document_id": 1, "signer_id": 1 })
            .options(unique_options)
            .build();
        signatures.create_index(unique_model, None).await?;

        let document_model = IndexModel::builder()
            .keys(doc! { "document_id": 1, "created_at": 1 })
            .build();
        signatures.create_index(document_model, None).await?;

        let status_model = IndexModel::builder()
            .keys(doc! { "status": 1, "created_at": 1 })
            .build();
        signatures.create_index(status_model, None).await?;

        Ok(Self { signatures })
    }

    async fn find_live(&self, mut filter: Document) -> Result<Vec<SignatureRecord>, StorageError> {
        filter.insert("deleted_at", Bson::Null);
        let options = FindOptions::builder()
            .sort(doc! { "created_at": 1 })
            .build();
        let records: Vec<SignatureRecord> = self.signatures
            .find(filter, options)
            .await?
            .try_collect()
            .await?;
        Ok(records)
    }

    async fn find_one_and_set(&self, filter: Document, set: Document) -> Result<Option<SignatureRecord>, StorageError> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let updated = self.signatures
            .find_one_and_update(filter, doc! { "$set": set }, options)
            .await
            .map_err(|e| {
                log::error!("Database error during signature update: {:?}", e);
                StorageError::Database(e)
            })?;
        Ok(updated)
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY_CODE
    )
}

fn status_bson(status: SignatureStatus) -> Result<Bson, StorageError> {
    Ok(bson::to_bson(&status)?)
}

/// `$set` body for a transition. Mirrors `Transition::apply`.
fn transition_set(transition: &Transition, now: DateTime<Utc>) -> Result<Document, StorageError> {
    let now = bson::DateTime::from_chrono(now);
    let mut set = doc! {
        "status": status_bson(transition.target())?,
        "updated_at": now,
    };
    match transition {
        Transition::Sign { signature_blob } => {
            set.insert("signature_blob", signature_blob.as_str());
            set.insert("signed_at", now);
        }
        Transition::Reject { reason } => {
            set.insert("notes", reason.as_str());
        }
        Transition::Reset => {
            set.insert("signature_blob", Bson::Null);
            set.insert("signed_at", Bson::Null);
            set.insert("notes", Bson::Null);
        }
    }
    Ok(set)
}

/// Matches the record only while it is live and in an allowed source state.
fn transition_filter(id: &str, transition: &Transition) -> Result<Document, StorageError> {
    let allowed = transition
        .allowed_from()
        .iter()
        .map(|status| status_bson(*status))
        .collect::<Result<Vec<Bson>, StorageError>>()?;
    Ok(doc! {
        "_id": id,
        "status": { "$in": allowed },
        "deleted_at": Bson::Null,
    })
}

#[async_trait]
impl SignatureStore for MongoDBService {
    async fn create(&self, record: SignatureRecord) -> Result<SignatureRecord, StorageError> {
        match self.signatures.insert_one(&record, None).await {
            Ok(_) => Ok(record),
            Err(e) if is_duplicate_key(&e) => Err(StorageError::Duplicate {
                document_id: record.document_id,
                signer_id: record.signer_id,
            }),
            Err(e) => {
                log::error!("Failed to insert signature {}: {:?}", record.id, e);
                Err(StorageError::Database(e))
            }
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<SignatureRecord>, StorageError> {
        let record = self.signatures
            .find_one(doc! { "_id": id, "deleted_at": Bson::Null }, None)
            .await?;
        Ok(record)
    }

    async fn get_by_document(&self, document_id: &str) -> Result<Vec<SignatureRecord>, StorageError> {
        self.find_live(doc! { "document_id": document_id }).await
    }

    async fn get_by_document_and_signer(
        &self,
        document_id: &str,
        signer_id: &str,
    ) -> Result<Option<SignatureRecord>, StorageError> {
        let filter = doc! {
            "document_id": document_id,
            "signer_id": signer_id,
            "deleted_at": Bson::Null,
        };
        Ok(self.signatures.find_one(filter, None).await?)
    }

    async fn list_by_status(&self, status: SignatureStatus) -> Result<Vec<SignatureRecord>, StorageError> {
        self.find_live(doc! { "status": status_bson(status)? }).await
    }

    async fn update(&self, record: &SignatureRecord) -> Result<Option<SignatureRecord>, StorageError> {
        let filter = doc! { "_id": &record.id, "deleted_at": Bson::Null };
        let set = doc! {
            "signer_name": &record.signer_name,
            "signer_email": &record.signer_email,
            "signer_role": &record.signer_role,
            "signature_type": &record.signature_type,
            "updated_at": bson::DateTime::from_chrono(record.updated_at),
        };
        self.find_one_and_set(filter, set).await
    }

    async fn soft_delete(&self, id: &str, deleted_at: DateTime<Utc>) -> Result<bool, StorageError> {
        let deleted_at = bson::DateTime::from_chrono(deleted_at);
        let result = self.signatures
            .update_one(
                doc! { "_id": id, "deleted_at": Bson::Null },
                doc! { "$set": { "deleted_at": deleted_at, "updated_at": deleted_at } },
                None,
            )
            .await?;
        Ok(result.modified_count > 0)
    }

    async fn transition(
        &self,
        id: &str,
        transition: &Transition,
        now: DateTime<Utc>,
    ) -> Result<Option<SignatureRecord>, StorageError> {
        let filter = transition_filter(id, transition)?;
        let set = transition_set(transition, now)?;
        self.find_one_and_set(filter, set).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_filter_requires_pending_and_live() {
        let filter = transition_filter("sig-1", &Transition::Sign { signature_blob: "b".to_string() }).unwrap();
        assert_eq!(filter.get_str("_id").unwrap(), "sig-1");
        assert_eq!(filter.get("deleted_at"), Some(&Bson::Null));

        let allowed = filter.get_document("status").unwrap().get_array("$in").unwrap();
        assert_eq!(allowed, &vec![Bson::String("Pending".to_string())]);
    }

    #[test]
    fn test_reset_filter_allows_both_terminal_states() {
        let filter = transition_filter("sig-1", &Transition::Reset).unwrap();
        let allowed = filter.get_document("status").unwrap().get_array("$in").unwrap();
        assert_eq!(
            allowed,
            &vec![Bson::String("Signed".to_string()), Bson::String("Rejected".to_string())]
        );
    }

    #[test]
    fn test_sign_set_stamps_blob_and_time() {
        let now = Utc::now();
        let set = transition_set(&Transition::Sign { signature_blob: "blob".to_string() }, now).unwrap();

        assert_eq!(set.get_str("status").unwrap(), "Signed");
        assert_eq!(set.get_str("signature_blob").unwrap(), "blob");
        assert_eq!(set.get_datetime("signed_at").unwrap(), &bson::DateTime::from_chrono(now));
        assert_eq!(set.get_datetime("updated_at").unwrap(), &bson::DateTime::from_chrono(now));
        assert!(!set.contains_key("notes"));
    }

    #[test]
    fn test_reset_set_clears_fields() {
        let set = transition_set(&Transition::Reset, Utc::now()).unwrap();
        assert_eq!(set.get_str("status").unwrap(), "Pending");
        for field in ["signature_blob", "signed_at", "notes"] {
            assert_eq!(set.get(field), Some(&Bson::Null));
        }
    }

    #[test]
    fn test_reject_set_stores_reason() {
        let set = transition_set(&Transition::Reject { reason: "missing page".to_string() }, Utc::now()).unwrap();
        assert_eq!(set.get_str("status").unwrap(), "Rejected");
        assert_eq!(set.get_str("notes").unwrap(), "missing page");
    }
}
