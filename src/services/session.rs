use crate::constants::session as keys;
use crate::errors::ApiError;
use crate::services::logger::Logger;
use crate::utils::fs_atomic::atomic_write_text_file;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tokio::sync::watch;

/// Durable string key-value store backing the session, scoped to one
/// gateway deployment.
pub trait KeyValueStore: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, ApiError>;
    fn write(&self, key: &str, value: &str) -> Result<(), ApiError>;
    fn remove(&self, key: &str) -> Result<(), ApiError>;
}

#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, ApiError> {
        let guard = self.entries.read().unwrap_or_else(|err| err.into_inner());
        Ok(guard.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), ApiError> {
        let mut guard = self.entries.write().unwrap_or_else(|err| err.into_inner());
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ApiError> {
        let mut guard = self.entries.write().unwrap_or_else(|err| err.into_inner());
        guard.remove(key);
        Ok(())
    }
}

/// JSON-object file store. The whole file is loaded once and rewritten
/// atomically on every mutation.
pub struct FileStore {
    file_path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ApiError> {
        let store = Self {
            file_path: path.as_ref().to_path_buf(),
            entries: RwLock::new(BTreeMap::new()),
        };
        store.load()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn load(&self) -> Result<(), ApiError> {
        if !self.file_path.exists() {
            return Ok(());
        }
        let raw = std::fs::read_to_string(&self.file_path).map_err(|err| {
            ApiError::storage(format!("Failed to load session file: {}", err))
        })?;
        if raw.trim().is_empty() {
            return Ok(());
        }
        let parsed: Value = serde_json::from_str(&raw).map_err(|err| {
            ApiError::storage(format!("Failed to parse session file: {}", err)).with_hint(format!(
                "Remove {} to start a fresh session.",
                self.file_path.display()
            ))
        })?;
        if let Some(obj) = parsed.as_object() {
            let mut guard = self.entries.write().unwrap_or_else(|err| err.into_inner());
            for (key, value) in obj {
                let text = match value {
                    Value::String(s) => s.clone(),
                    Value::Null => continue,
                    other => other.to_string(),
                };
                guard.insert(key.clone(), text);
            }
        }
        Ok(())
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), ApiError> {
        let data = serde_json::to_string_pretty(entries)
            .map_err(|err| ApiError::storage(format!("Failed to serialize session: {}", err)))?;
        atomic_write_text_file(&self.file_path, &format!("{}\n", data), keys::FILE_MODE)
            .map_err(|err| ApiError::storage(format!("Failed to save session: {}", err)))
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, ApiError> {
        let guard = self.entries.read().unwrap_or_else(|err| err.into_inner());
        Ok(guard.get(key).cloned())
    }

    /// Memory only changes once the file has been written.
    fn write(&self, key: &str, value: &str) -> Result<(), ApiError> {
        let mut guard = self.entries.write().unwrap_or_else(|err| err.into_inner());
        let mut next = guard.clone();
        next.insert(key.to_string(), value.to_string());
        self.persist(&next)?;
        *guard = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ApiError> {
        let mut guard = self.entries.write().unwrap_or_else(|err| err.into_inner());
        if !guard.contains_key(key) {
            return Ok(());
        }
        let mut next = guard.clone();
        next.remove(key);
        self.persist(&next)?;
        *guard = next;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl UserProfile {
    pub fn new(
        id: impl Into<String>,
        email: impl Into<String>,
        username: impl Into<String>,
        full_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            username: username.into(),
            full_name: full_name.into(),
            extra: serde_json::Map::new(),
        }
    }
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "user id must be a string or number, got {}",
            other
        ))),
    }
}

/// The caller identity attached to outgoing requests. Token and user are
/// independently optional: right after login a token exists before the
/// profile has been fetched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub token: Option<String>,
    pub user: Option<UserProfile>,
}

impl SessionState {
    pub fn user_id(&self) -> Option<&str> {
        self.user
            .as_ref()
            .map(|u| u.id.as_str())
            .filter(|id| !id.is_empty())
    }
}

pub struct SessionService {
    logger: Logger,
    store: Arc<dyn KeyValueStore>,
    updates: watch::Sender<SessionState>,
}

impl SessionService {
    pub fn new(logger: Logger, store: Arc<dyn KeyValueStore>) -> Self {
        let logger = logger.child("session");
        let initial = read_state(&logger, store.as_ref()).unwrap_or_default();
        let (updates, _) = watch::channel(initial);
        Self {
            logger,
            store,
            updates,
        }
    }

    pub fn in_memory(logger: Logger) -> Self {
        Self::new(logger, Arc::new(MemoryStore::new()))
    }

    /// Reads the store afresh; never served from a cache.
    pub fn snapshot(&self) -> Result<SessionState, ApiError> {
        read_state(&self.logger, self.store.as_ref())
    }

    pub fn token(&self) -> Result<Option<String>, ApiError> {
        Ok(self.snapshot()?.token)
    }

    pub fn user(&self) -> Result<Option<UserProfile>, ApiError> {
        Ok(self.snapshot()?.user)
    }

    pub fn set_token(&self, token: Option<&str>) -> Result<(), ApiError> {
        match token.filter(|t| !t.is_empty()) {
            Some(token) => self.store.write(keys::TOKEN_KEY, token)?,
            None => self.store.remove(keys::TOKEN_KEY)?,
        }
        self.publish()
    }

    pub fn set_user(&self, user: Option<&UserProfile>) -> Result<(), ApiError> {
        match user {
            Some(user) => {
                let raw = serde_json::to_string(user).map_err(|err| {
                    ApiError::storage(format!("Failed to serialize user profile: {}", err))
                })?;
                self.store.write(keys::USER_KEY, &raw)?;
            }
            None => self.store.remove(keys::USER_KEY)?,
        }
        self.publish()
    }

    pub fn clear(&self) -> Result<(), ApiError> {
        self.store.remove(keys::TOKEN_KEY)?;
        self.store.remove(keys::USER_KEY)?;
        self.publish()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.updates.subscribe()
    }

    fn publish(&self) -> Result<(), ApiError> {
        let state = self.snapshot()?;
        self.updates.send_replace(state);
        Ok(())
    }
}

fn read_state(logger: &Logger, store: &dyn KeyValueStore) -> Result<SessionState, ApiError> {
    let token = store.read(keys::TOKEN_KEY)?.filter(|t| !t.is_empty());
    let user = match store.read(keys::USER_KEY)? {
        Some(raw) => match serde_json::from_str::<UserProfile>(&raw) {
            Ok(user) => Some(user),
            Err(err) => {
                logger.warn(
                    "Ignoring unreadable stored user profile",
                    Some(&serde_json::json!({ "error": err.to_string() })),
                );
                None
            }
        },
        None => None,
    };
    Ok(SessionState { token, user })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> UserProfile {
        UserProfile::new("u-1", "alice@example.com", "alice", "Alice Liddell")
    }

    #[test]
    fn token_and_user_are_independent() {
        let session = SessionService::in_memory(Logger::new("test"));
        session.set_token(Some("tok123")).expect("set token");

        let state = session.snapshot().expect("snapshot");
        assert_eq!(state.token.as_deref(), Some("tok123"));
        assert!(state.user.is_none());

        session.set_user(Some(&alice())).expect("set user");
        session.set_token(None).expect("drop token");
        let state = session.snapshot().expect("snapshot");
        assert!(state.token.is_none());
        assert_eq!(state.user_id(), Some("u-1"));
    }

    #[test]
    fn corrupt_user_reads_as_absent() {
        let store = Arc::new(MemoryStore::new());
        store.write(keys::USER_KEY, "{not json").expect("write");
        store.write(keys::TOKEN_KEY, "tok").expect("write");
        let session = SessionService::new(Logger::new("test"), store);

        let state = session.snapshot().expect("snapshot");
        assert_eq!(state.token.as_deref(), Some("tok"));
        assert!(state.user.is_none());
    }

    #[test]
    fn numeric_user_id_is_accepted() {
        let user: UserProfile =
            serde_json::from_str(r#"{"id": 42, "username": "bob", "is_active": true}"#)
                .expect("parse");
        assert_eq!(user.id, "42");
        assert_eq!(user.extra.get("is_active"), Some(&Value::Bool(true)));
    }

    #[test]
    fn clear_publishes_to_subscribers() {
        let session = SessionService::in_memory(Logger::new("test"));
        let rx = session.subscribe();
        session.set_token(Some("tok")).expect("set");
        assert_eq!(rx.borrow().token.as_deref(), Some("tok"));

        session.clear().expect("clear");
        assert_eq!(*rx.borrow(), SessionState::default());
    }

    #[test]
    fn failed_persist_leaves_memory_unchanged() {
        let dir = std::env::temp_dir().join(format!("chatgw-session-{}", uuid::Uuid::new_v4()));
        let path = dir.join("session.json");
        let store = FileStore::open(&path).expect("open");
        store.write(keys::TOKEN_KEY, "first").expect("write");

        // A plain file where the session directory was makes every persist fail.
        std::fs::remove_dir_all(&dir).expect("remove dir");
        std::fs::write(&dir, "blocker").expect("blocker file");

        assert!(store.write(keys::TOKEN_KEY, "second").is_err());
        assert_eq!(store.read(keys::TOKEN_KEY).expect("read").as_deref(), Some("first"));
        assert!(store.remove(keys::TOKEN_KEY).is_err());
        assert_eq!(store.read(keys::TOKEN_KEY).expect("read").as_deref(), Some("first"));

        let _ = std::fs::remove_file(&dir);
    }

    #[test]
    fn file_store_survives_reopen() {
        let path = std::env::temp_dir()
            .join(format!("chatgw-session-{}", uuid::Uuid::new_v4()))
            .join("session.json");
        {
            let store = Arc::new(FileStore::open(&path).expect("open"));
            let session = SessionService::new(Logger::new("test"), store);
            session.set_token(Some("persisted")).expect("set token");
            session.set_user(Some(&alice())).expect("set user");
        }

        let reopened = Arc::new(FileStore::open(&path).expect("reopen"));
        let session = SessionService::new(Logger::new("test"), reopened);
        let state = session.snapshot().expect("snapshot");
        assert_eq!(state.token.as_deref(), Some("persisted"));
        assert_eq!(state.user, Some(alice()));

        session.clear().expect("clear");
        let raw = std::fs::read_to_string(&path).expect("read");
        let parsed: Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(parsed, serde_json::json!({}));
        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }
}
