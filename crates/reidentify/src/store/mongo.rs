//! MongoDB-backed document store.
//!
//! Only the URI syntax is checked up front. Option resolution (SRV/TXT lookups for
//! `mongodb+srv://`) and client construction happen on first use and are retried on every
//! operation until they succeed, so an unreachable deployment shows up as failed
//! operations rather than a failed boot.

use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Document};
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, ConnectionString, IndexOptions};
use mongodb::{Client, Database, IndexModel};
use tokio::sync::OnceCell;
use tracing::debug;

use super::{id_string, Collection, DocumentStore, StoreError, StoreResult};
use crate::config::StoreConfig;

const DUPLICATE_KEY: i32 = 11000;
const MAX_TIME_EXPIRED: i32 = 50;
const FALLBACK_DATABASE: &str = "test";

#[derive(Debug)]
pub struct MongoStore {
    config: StoreConfig,
    database_name: String,
    client: OnceCell<Client>,
}

impl MongoStore {
    /// Fails only when the URI is not a syntactically valid connection string.
    pub fn new(config: &StoreConfig) -> StoreResult<Self> {
        let connection = ConnectionString::parse(config.uri.as_str())
            .map_err(|err| StoreError::Validation(format!("invalid MONGO_URI: {err}")))?;

        let database_name = config
            .database
            .clone()
            .or(connection.default_database)
            .unwrap_or_else(|| FALLBACK_DATABASE.to_string());

        Ok(Self {
            config: config.clone(),
            database_name,
            client: OnceCell::new(),
        })
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    async fn database(&self) -> StoreResult<Database> {
        let client = self
            .client
            .get_or_try_init(|| self.build_client())
            .await?;
        Ok(client.database(&self.database_name))
    }

    async fn build_client(&self) -> StoreResult<Client> {
        let mut options = ClientOptions::parse(self.config.uri.as_str())
            .await
            .map_err(unavailable)?;
        options.server_selection_timeout = Some(self.config.server_selection_timeout);
        options.max_pool_size = Some(self.config.max_pool_size);
        options
            .app_name
            .get_or_insert_with(|| "reidentify".to_string());

        let client = Client::with_options(options).map_err(unavailable)?;
        debug!(database = %self.database_name, "mongo client configured");
        Ok(client)
    }

    async fn collection(
        &self,
        collection: Collection,
    ) -> StoreResult<mongodb::Collection<Document>> {
        Ok(self
            .database()
            .await?
            .collection::<Document>(collection.name()))
    }
}

/// Addresses ObjectId-shaped ids as ObjectIds and anything else as a literal `_id`.
fn id_filter(id: &str) -> Document {
    match ObjectId::parse_str(id) {
        Ok(oid) => doc! { "_id": oid },
        Err(_) => doc! { "_id": id },
    }
}

fn error_code(err: &MongoError) -> Option<i32> {
    match err.kind.as_ref() {
        ErrorKind::Command(command) => Some(command.code),
        ErrorKind::Write(WriteFailure::WriteError(write)) => Some(write.code),
        _ => None,
    }
}

fn unavailable(err: MongoError) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

fn write_error(err: MongoError) -> StoreError {
    if error_code(&err) == Some(DUPLICATE_KEY) {
        StoreError::Validation(err.to_string())
    } else {
        unavailable(err)
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn find_by_id(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>> {
        self.collection(collection)
            .await?
            .find_one(id_filter(id))
            .await
            .map_err(unavailable)
    }

    async fn insert(&self, collection: Collection, document: Document) -> StoreResult<String> {
        let result = self
            .collection(collection)
            .await?
            .insert_one(document)
            .await
            .map_err(write_error)?;
        id_string(&result.inserted_id)
            .ok_or_else(|| StoreError::Validation("unsupported _id type".to_string()))
    }

    async fn delete_by_id(&self, collection: Collection, id: &str) -> StoreResult<bool> {
        let result = self
            .collection(collection)
            .await?
            .delete_one(id_filter(id))
            .await
            .map_err(unavailable)?;
        Ok(result.deleted_count > 0)
    }

    async fn list(&self, collection: Collection) -> StoreResult<Vec<Document>> {
        let cursor = self
            .collection(collection)
            .await?
            .find(doc! {})
            .await
            .map_err(unavailable)?;
        cursor.try_collect().await.map_err(unavailable)
    }

    async fn exists(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
        max_time: Duration,
    ) -> StoreResult<bool> {
        let mut filter = Document::new();
        filter.insert(field, value);

        let found = self
            .collection(collection)
            .await?
            .find_one(filter)
            .projection(doc! { "_id": 1 })
            .max_time(max_time)
            .await
            .map_err(|err| {
                if error_code(&err) == Some(MAX_TIME_EXPIRED) {
                    StoreError::Timeout(max_time)
                } else {
                    unavailable(err)
                }
            })?;
        Ok(found.is_some())
    }

    async fn ensure_indexes(&self) -> StoreResult<()> {
        let model = IndexModel::builder()
            .keys(doc! { "facNumber": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection(Collection::FacultyNumbers)
            .await?
            .create_index(model)
            .await
            .map(|_| ())
            .map_err(write_error)
    }

    async fn ping(&self) -> StoreResult<()> {
        self.database()
            .await?
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(unavailable)
    }

    async fn close(&self) {
        if let Some(client) = self.client.get() {
            client.clone().shutdown().await;
        }
    }

    fn backend_name(&self) -> &'static str {
        "mongodb"
    }
}
