//! MongoDB-backed record store.
//!
//! Owns the client lifecycle (connect with bounded timeouts, explicit
//! shutdown), the typed `Patients` and `Emails` collection handles, the
//! insert operations used by the upload pipeline, and the
//! [`LookupGateway`] implementation the reconciliation engine queries.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::ClientOptions, Client, Collection};
use patient_model::{EmailRecord, PatientRecord};
use reconcile::LookupGateway;
use std::time::Duration;
use tracing::{debug, info};

const PATIENT_COLLECTION: &str = "Patients";
const EMAIL_COLLECTION: &str = "Emails";

/// Connection options, supplied externally (CLI/env), never hardcoded.
#[derive(Clone, Debug)]
pub struct MongoOpts {
    pub uri: String,
    pub database: String,
}

/// Scoped handle on the patient and email collections.
///
/// Acquire with [`MongoStore::connect`] before a run and release with
/// [`MongoStore::shutdown`] after it, on success and failure paths
/// alike.
pub struct MongoStore {
    client: Client,
    patients: Collection<PatientRecord>,
    emails: Collection<EmailRecord>,
}

impl MongoStore {
    pub async fn connect(opts: &MongoOpts) -> anyhow::Result<Self> {
        debug!("parsing MongoDB connection options from {}", opts.uri);
        let mut options = ClientOptions::parse(&opts.uri).await?;
        // Bound connection attempts so a dead endpoint fails the run
        // instead of hanging it.
        options.connect_timeout = Some(Duration::from_secs(10));
        options.server_selection_timeout = Some(Duration::from_secs(10));

        let client = Client::with_options(options)?;
        let db = client.database(&opts.database);
        info!(database = %opts.database, "connected to MongoDB");

        Ok(Self {
            patients: db.collection(PATIENT_COLLECTION),
            emails: db.collection(EMAIL_COLLECTION),
            client,
        })
    }

    /// Inserts a batch of patient records; empty batches are a no-op.
    pub async fn insert_patients(&self, records: &[PatientRecord]) -> anyhow::Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        self.patients.insert_many(records).await?;
        debug!(count = records.len(), "inserted patient records");
        Ok(())
    }

    /// Inserts a batch of scheduled emails; empty batches are a no-op.
    pub async fn insert_emails(&self, records: &[EmailRecord]) -> anyhow::Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        self.emails.insert_many(records).await?;
        debug!(count = records.len(), "inserted email records");
        Ok(())
    }

    /// Releases the underlying connection pool.
    pub async fn shutdown(self) {
        self.client.shutdown().await;
        debug!("MongoDB client shut down");
    }
}

#[async_trait]
impl LookupGateway for MongoStore {
    async fn find_patients(&self, member_ids: &[i64]) -> anyhow::Result<Vec<PatientRecord>> {
        if member_ids.is_empty() {
            return Ok(vec![]);
        }
        let cursor = self
            .patients
            .find(doc! { "memberId": { "$in": member_ids.to_vec() } })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_emails(&self, member_ids: &[i64]) -> anyhow::Result<Vec<EmailRecord>> {
        if member_ids.is_empty() {
            return Ok(vec![]);
        }
        let cursor = self
            .emails
            .find(doc! { "memberId": { "$in": member_ids.to_vec() } })
            .await?;
        Ok(cursor.try_collect().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opts_carry_endpoint_and_database() {
        let opts = MongoOpts {
            uri: "mongodb://localhost:27017".to_string(),
            database: "health".to_string(),
        };
        assert_eq!(opts.uri, "mongodb://localhost:27017");
        assert_eq!(opts.database, "health");
    }

    #[tokio::test]
    async fn connect_rejects_a_malformed_uri() {
        let opts = MongoOpts {
            uri: "not-a-mongodb-uri".to_string(),
            database: "health".to_string(),
        };
        assert!(MongoStore::connect(&opts).await.is_err());
    }
}
