//! MongoDB storage adapter
//!
//! Users live in the `users` collection keyed by a numeric `id` drawn from a
//! per-database counter document, so ids stay integers like the relational kinds.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, DateTime as BsonDateTime, Document};
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, Credential, IndexOptions, ReturnDocument, ServerAddress};
use mongodb::{Client, Collection, IndexModel};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use super::rows::{assigned_id, id_param, not_found};
use crate::domain::storage::{BackendKind, CallContext, StorageError, UserStorage};
use crate::domain::user::{timestamp_now, User, UserDraft, UserId};

const USERS_COLLECTION: &str = "users";
const COUNTERS_COLLECTION: &str = "counters";
const USERS_COUNTER: &str = "users";
const DUPLICATE_KEY: i32 = 11000;

/// Connection parameters for a MongoDB deployment
#[derive(Clone)]
pub struct MongoConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub connect_timeout: Duration,
}

impl fmt::Debug for MongoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MongoConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}

impl MongoConfig {
    fn client_options(&self) -> ClientOptions {
        let mut options = ClientOptions::default();
        options.hosts = vec![ServerAddress::Tcp {
            host: self.host.clone(),
            port: Some(self.port),
        }];
        options.connect_timeout = Some(self.connect_timeout);
        options.server_selection_timeout = Some(self.connect_timeout);

        if !self.user.is_empty() {
            let mut credential = Credential::default();
            credential.username = Some(self.user.clone());
            credential.password = Some(self.password.clone());
            options.credential = Some(credential);
        }

        options
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserDocument {
    id: i64,
    name: String,
    email: String,
    created_at: BsonDateTime,
    updated_at: BsonDateTime,
    deleted_at: Option<BsonDateTime>,
}

impl UserDocument {
    fn from_user(user: &User) -> Result<Self, StorageError> {
        Ok(Self {
            id: id_param(user.id())?,
            name: user.name().to_string(),
            email: user.email().to_string(),
            created_at: BsonDateTime::from_chrono(user.created_at()),
            updated_at: BsonDateTime::from_chrono(user.updated_at()),
            deleted_at: user.deleted_at().map(BsonDateTime::from_chrono),
        })
    }

    fn into_user(self) -> Result<User, StorageError> {
        Ok(User::restore(
            assigned_id(self.id)?,
            self.name,
            self.email,
            self.created_at.to_chrono(),
            self.updated_at.to_chrono(),
            self.deleted_at.map(BsonDateTime::to_chrono),
        ))
    }
}

#[derive(Debug, Clone)]
struct MongoHandles {
    client: Client,
    users: Collection<UserDocument>,
    counters: Collection<Document>,
}

/// MongoDB implementation of `UserStorage`
pub struct MongoUserStorage {
    config: MongoConfig,
    handles: OnceCell<MongoHandles>,
}

impl fmt::Debug for MongoUserStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MongoUserStorage")
            .field("config", &self.config)
            .field("connected", &self.handles.initialized())
            .finish()
    }
}

impl MongoUserStorage {
    pub fn new(config: MongoConfig) -> Self {
        Self {
            config,
            handles: OnceCell::new(),
        }
    }

    fn handles(&self) -> Result<&MongoHandles, StorageError> {
        self.handles
            .get()
            .ok_or_else(|| StorageError::unavailable("MongoDB client is not connected"))
    }

    async fn open(&self) -> Result<MongoHandles, StorageError> {
        let client = Client::with_options(self.config.client_options())
            .map_err(|e| map_mongo_error("connect", e))?;
        let database = client.database(&self.config.database);

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| map_mongo_error("ping", e))?;

        let users = database.collection::<UserDocument>(USERS_COLLECTION);
        for field in ["id", "email"] {
            let mut keys = Document::new();
            keys.insert(field, 1);
            let index = IndexModel::builder()
                .keys(keys)
                .options(IndexOptions::builder().unique(true).build())
                .build();
            users
                .create_index(index)
                .await
                .map_err(|e| map_mongo_error("create users index", e))?;
        }

        Ok(MongoHandles {
            users,
            counters: database.collection::<Document>(COUNTERS_COLLECTION),
            client,
        })
    }

    async fn next_id(&self, handles: &MongoHandles) -> Result<i64, StorageError> {
        let counter = handles
            .counters
            .find_one_and_update(doc! { "_id": USERS_COUNTER }, doc! { "$inc": { "seq": 1_i64 } })
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| map_mongo_error("allocate user id", e))?
            .ok_or_else(|| StorageError::backend("allocate user id: counter document missing"))?;

        counter
            .get_i64("seq")
            .map_err(|e| StorageError::backend(format!("allocate user id: {}", e)))
    }
}

#[async_trait]
impl UserStorage for MongoUserStorage {
    fn backend(&self) -> BackendKind {
        BackendKind::DocumentStore
    }

    async fn connect(&self) -> Result<(), StorageError> {
        self.handles.get_or_try_init(|| self.open()).await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), StorageError> {
        if let Some(handles) = self.handles.get() {
            handles.client.clone().shutdown().await;
        }
        Ok(())
    }

    async fn create_user(
        &self,
        ctx: &CallContext,
        draft: UserDraft,
    ) -> Result<User, StorageError> {
        let handles = self.handles()?;
        let id = ctx.run(self.next_id(handles)).await??;
        let user = User::create(assigned_id(id)?, draft, timestamp_now());
        let document = UserDocument::from_user(&user)?;

        ctx.run(handles.users.insert_one(&document))
            .await?
            .map_err(|e| map_mongo_error("create user", e))?;

        Ok(user)
    }

    async fn get_user_by_id(&self, ctx: &CallContext, id: UserId) -> Result<User, StorageError> {
        let handles = self.handles()?;

        let document = ctx
            .run(handles.users.find_one(doc! { "id": id_param(id)? }))
            .await?
            .map_err(|e| map_mongo_error("get user", e))?;

        document.ok_or_else(|| not_found(id))?.into_user()
    }

    async fn get_all_users(&self, ctx: &CallContext) -> Result<Vec<User>, StorageError> {
        let handles = self.handles()?;

        let documents: Vec<UserDocument> = ctx
            .run(async {
                handles
                    .users
                    .find(doc! {})
                    .sort(doc! { "id": 1 })
                    .await?
                    .try_collect::<Vec<UserDocument>>()
                    .await
            })
            .await?
            .map_err(|e| map_mongo_error("list users", e))?;

        documents.into_iter().map(UserDocument::into_user).collect()
    }

    async fn update_user(
        &self,
        ctx: &CallContext,
        id: UserId,
        draft: UserDraft,
    ) -> Result<User, StorageError> {
        let handles = self.handles()?;
        let updated = self.get_user_by_id(ctx, id).await?.revise(draft);
        let document = UserDocument::from_user(&updated)?;

        let result = ctx
            .run(handles.users.replace_one(doc! { "id": document.id }, &document))
            .await?
            .map_err(|e| map_mongo_error("update user", e))?;

        if result.matched_count == 0 {
            return Err(not_found(id));
        }

        Ok(updated)
    }

    async fn delete_user(&self, ctx: &CallContext, id: UserId) -> Result<(), StorageError> {
        let handles = self.handles()?;

        let result = ctx
            .run(handles.users.delete_one(doc! { "id": id_param(id)? }))
            .await?
            .map_err(|e| map_mongo_error("delete user", e))?;

        if result.deleted_count == 0 {
            return Err(not_found(id));
        }

        Ok(())
    }
}

/// Maps a driver error raised while performing `operation`
fn map_mongo_error(operation: &str, err: MongoError) -> StorageError {
    let message = format!("{}: {}", operation, err);

    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY => {
            StorageError::constraint(message)
        }
        ErrorKind::Command(command) if command.code == DUPLICATE_KEY => {
            StorageError::constraint(message)
        }
        ErrorKind::ServerSelection { .. }
        | ErrorKind::Io(_)
        | ErrorKind::ConnectionPoolCleared { .. }
        | ErrorKind::DnsResolve { .. }
        | ErrorKind::Authentication { .. } => StorageError::unavailable(message),
        _ => StorageError::backend(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(host: &str, port: u16) -> MongoConfig {
        MongoConfig {
            host: host.to_string(),
            port,
            user: String::new(),
            password: String::new(),
            database: "userstore_test".to_string(),
            connect_timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn test_client_options_without_credentials() {
        let options = config("localhost", 27017).client_options();

        assert_eq!(
            options.hosts,
            vec![ServerAddress::Tcp {
                host: "localhost".to_string(),
                port: Some(27017),
            }]
        );
        assert_eq!(options.connect_timeout, Some(Duration::from_secs(1)));
        assert_eq!(options.server_selection_timeout, Some(Duration::from_secs(1)));
        assert!(options.credential.is_none());
    }

    #[test]
    fn test_client_options_pass_credentials_verbatim() {
        let mut config = config("db", 27018);
        config.user = "admin".to_string();
        config.password = "p@ss:word".to_string();

        let credential = config.client_options().credential.unwrap();
        assert_eq!(credential.username.as_deref(), Some("admin"));
        assert_eq!(credential.password.as_deref(), Some("p@ss:word"));
    }

    #[test]
    fn test_document_stores_bson_dates() {
        let user = User::create(
            UserId::new(7),
            UserDraft::new("Alice", "alice@example.com"),
            timestamp_now(),
        );

        let document = UserDocument::from_user(&user).unwrap();
        let bson = mongodb::bson::to_document(&document).unwrap();
        assert!(bson.get_datetime("created_at").is_ok());
        assert!(bson.get_datetime("updated_at").is_ok());
        assert_eq!(bson.get("deleted_at"), Some(&mongodb::bson::Bson::Null));

        assert_eq!(document.into_user().unwrap(), user);
    }

    #[test]
    fn test_debug_redacts_password() {
        let mut config = config("db", 27017);
        config.password = "secret".to_string();
        let rendered = format!("{:?}", MongoUserStorage::new(config));

        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("connected: false"));
    }

    #[tokio::test]
    async fn test_operations_before_connect_are_unavailable() {
        let storage = MongoUserStorage::new(config("localhost", 27017));
        let ctx = CallContext::background();

        let result = storage.get_all_users(&ctx).await;
        assert!(matches!(result, Err(StorageError::Unavailable { .. })));
        assert!(storage.close().await.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_unavailable() {
        let storage = MongoUserStorage::new(config("127.0.0.1", 1));

        let result = storage.connect().await;
        assert!(matches!(result, Err(StorageError::Unavailable { .. })));
    }

    #[tokio::test]
    #[ignore = "requires a running MongoDB server (USERSTORE_TEST_MONGO_HOST)"]
    async fn test_round_trip_against_server() {
        let Ok(host) = std::env::var("USERSTORE_TEST_MONGO_HOST") else {
            return;
        };
        let storage = MongoUserStorage::new(MongoConfig {
            database: format!("userstore_{}", uuid::Uuid::new_v4().simple()),
            ..config(&host, 27017)
        });
        storage.connect().await.unwrap();
        let ctx = CallContext::background();

        let first = storage
            .create_user(&ctx, UserDraft::new("Alice", "alice@example.com"))
            .await
            .unwrap();
        let second = storage
            .create_user(&ctx, UserDraft::new("Bob", "bob@example.com"))
            .await
            .unwrap();
        assert!(second.id() > first.id());

        let duplicate = storage
            .create_user(&ctx, UserDraft::new("Alice", "alice@example.com"))
            .await;
        assert!(matches!(duplicate, Err(StorageError::ConstraintViolation { .. })));

        let all = storage.get_all_users(&ctx).await.unwrap();
        assert_eq!(all, vec![first.clone(), second]);

        let updated = storage
            .update_user(&ctx, first.id(), UserDraft::new("Alicia", "alice@example.com"))
            .await
            .unwrap();
        assert_eq!(storage.get_user_by_id(&ctx, first.id()).await.unwrap(), updated);

        storage.delete_user(&ctx, first.id()).await.unwrap();
        assert!(storage.delete_user(&ctx, first.id()).await.unwrap_err().is_not_found());
        storage.close().await.unwrap();
    }
}
