//! Local file storage for the two entity types that must survive a
//! primary-store outage: contact messages (one JSON file per message) and
//! administrators (one JSON file per username, keyed by an md5 of the
//! username). Writes are whole-file replacements; there is no locking
//! discipline on these directories.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDateTime, Utc};
use log::{info, warn};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

use crate::models::admin::Administrator;
use crate::models::contact::{ContactMessage, DATE_FMT};

use super::{OperationResult, StoreError};

const MESSAGES_SUBDIR: &str = "contact_messages";
const ADMIN_SUBDIR: &str = "admin";

/// On-disk schema for a contact message file. Timestamps are formatted
/// strings so the files stay readable and self-contained.
#[derive(Debug, Serialize, Deserialize)]
struct MessageFile {
    id: String,
    name: String,
    email: String,
    subject: String,
    message: String,
    status: String,
    created_at: String,
    ip_address: String,
    user_agent: String,
}

/// On-disk schema for an administrator shadow file.
#[derive(Debug, Serialize, Deserialize)]
struct AdminFile {
    id: String,
    username: String,
    password: String,
    email: String,
    created_at: String,
    last_login: Option<String>,
    status: String,
}

pub struct FallbackStore {
    root: PathBuf,
}

impl FallbackStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FallbackStore { root: root.into() }
    }

    pub fn messages_dir(&self) -> PathBuf {
        self.root.join(MESSAGES_SUBDIR)
    }

    pub fn admin_dir(&self) -> PathBuf {
        self.root.join(ADMIN_SUBDIR)
    }

    // ── Contact messages ────────────────────────────────────────────

    /// Persist one message as a new file. The filename is a
    /// timestamp + unique-suffix composite so concurrent submissions
    /// cannot collide.
    pub fn save_message(&self, msg: &ContactMessage) -> Result<OperationResult, StoreError> {
        let dir = self.messages_dir();
        fs::create_dir_all(&dir)
            .map_err(|e| StoreError::WriteFailed(format!("create {}: {}", dir.display(), e)))?;

        let filename = format!(
            "{}_{}.json",
            msg.created_at.format("%Y-%m-%d_%H-%M-%S"),
            uuid::Uuid::new_v4().simple()
        );
        let path = dir.join(filename);

        let record = MessageFile {
            id: msg.id.clone(),
            name: msg.name.clone(),
            email: msg.email.clone(),
            subject: msg.subject.clone(),
            message: msg.message.clone(),
            status: msg.status.clone(),
            created_at: msg.created_at.format(DATE_FMT).to_string(),
            ip_address: msg.ip_address.clone(),
            user_agent: msg.user_agent.clone(),
        };
        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        fs::write(&path, json)
            .map_err(|e| StoreError::WriteFailed(format!("write {}: {}", path.display(), e)))?;

        info!("contact message saved to fallback file {}", path.display());
        Ok(OperationResult::ok(1))
    }

    /// Read every message file. A file that fails to parse is skipped and
    /// counted, never aborts the read. Returns messages sorted newest
    /// first alongside the skip count.
    pub fn load_messages(&self) -> (Vec<ContactMessage>, usize) {
        let dir = self.messages_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(e) => e,
            Err(_) => return (Vec::new(), 0),
        };

        let mut messages = Vec::new();
        let mut skipped = 0usize;

        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            if path.extension().map(|ext| ext != "json").unwrap_or(true) {
                continue;
            }
            match parse_message_file(&path) {
                Some(msg) => messages.push(msg),
                None => {
                    warn!("skipping unparseable fallback file {}", path.display());
                    skipped += 1;
                }
            }
        }

        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        (messages, skipped)
    }

    // ── Administrators ──────────────────────────────────────────────

    fn admin_path(&self, username: &str) -> PathBuf {
        let digest = Md5::digest(username.as_bytes());
        self.admin_dir().join(format!("{}.json", hex::encode(digest)))
    }

    /// Seed the stock `admin` account if its file does not exist, so a
    /// fresh deployment with no database is still reachable. The default
    /// password must be changed in production.
    pub fn ensure_default_admin(&self) -> Result<(), StoreError> {
        let dir = self.admin_dir();
        fs::create_dir_all(&dir)
            .map_err(|e| StoreError::WriteFailed(format!("create {}: {}", dir.display(), e)))?;

        let path = self.admin_path("admin");
        if path.exists() {
            return Ok(());
        }

        let hash = bcrypt::hash("admin123", bcrypt::DEFAULT_COST)
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        let record = AdminFile {
            id: uuid::Uuid::new_v4().simple().to_string(),
            username: "admin".to_string(),
            password: hash,
            email: "admin@example.com".to_string(),
            created_at: Utc::now().naive_utc().format(DATE_FMT).to_string(),
            last_login: None,
            status: "active".to_string(),
        };
        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        fs::write(&path, json)
            .map_err(|e| StoreError::WriteFailed(format!("write {}: {}", path.display(), e)))?;

        warn!("default fallback admin created (username=admin) — change the password");
        Ok(())
    }

    pub fn find_admin(&self, username: &str) -> Option<Administrator> {
        let path = self.admin_path(username);
        let content = fs::read_to_string(path).ok()?;
        let record: AdminFile = serde_json::from_str(&content).ok()?;
        Some(admin_from_file(record))
    }

    /// Record a successful login in the shadow file. Best effort; returns
    /// false if the file is missing or unreadable.
    pub fn touch_last_login(&self, username: &str) -> bool {
        let path = self.admin_path(username);
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(_) => return false,
        };
        let mut record: AdminFile = match serde_json::from_str(&content) {
            Ok(r) => r,
            Err(_) => return false,
        };
        record.last_login = Some(Utc::now().naive_utc().format(DATE_FMT).to_string());
        match serde_json::to_string_pretty(&record) {
            Ok(json) => fs::write(&path, json).is_ok(),
            Err(_) => false,
        }
    }

    /// Verify credentials against the per-user file, creating the default
    /// admin first so a cold deployment is never locked out.
    pub fn authenticate(&self, username: &str, password: &str) -> Option<Administrator> {
        if let Err(e) = self.ensure_default_admin() {
            warn!("fallback admin seed failed: {}", e);
        }

        let admin = self.find_admin(username)?;
        if !bcrypt::verify(password, &admin.password_hash).unwrap_or(false) {
            return None;
        }
        self.touch_last_login(username);
        info!("administrator '{}' authenticated via file fallback", username);
        Some(admin)
    }
}

fn parse_message_file(path: &Path) -> Option<ContactMessage> {
    let content = fs::read_to_string(path).ok()?;
    let record: MessageFile = serde_json::from_str(&content).ok()?;
    let created_at = NaiveDateTime::parse_from_str(&record.created_at, DATE_FMT).ok()?;
    Some(ContactMessage {
        id: record.id,
        name: record.name,
        email: record.email,
        subject: record.subject,
        message: record.message,
        status: record.status,
        created_at,
        ip_address: record.ip_address,
        user_agent: record.user_agent,
        reply_message: None,
        replied_by: None,
        replied_at: None,
        from_fallback: true,
    })
}

fn admin_from_file(record: AdminFile) -> Administrator {
    let created_at = NaiveDateTime::parse_from_str(&record.created_at, DATE_FMT)
        .unwrap_or_else(|_| Utc::now().naive_utc());
    let last_login = record
        .last_login
        .and_then(|s| NaiveDateTime::parse_from_str(&s, DATE_FMT).ok());
    Administrator {
        id: record.id,
        username: record.username,
        password_hash: record.password,
        email: record.email,
        created_at,
        last_login,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;

    pub(crate) fn temp_store() -> FallbackStore {
        let root = std::env::temp_dir().join(format!(
            "hope-fallback-{}",
            uuid::Uuid::new_v4().simple()
        ));
        FallbackStore::new(root)
    }

    pub(crate) fn message_at(ts: NaiveDateTime, subject: &str) -> ContactMessage {
        ContactMessage {
            id: uuid::Uuid::new_v4().simple().to_string(),
            name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            subject: subject.to_string(),
            message: "Hello, I would like more information.".to_string(),
            status: "unread".to_string(),
            created_at: ts,
            ip_address: "203.0.113.9".to_string(),
            user_agent: "test-agent".to_string(),
            reply_message: None,
            replied_by: None,
            replied_at: None,
            from_fallback: true,
        }
    }

    fn ts(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn save_then_load_round_trips_one_file() {
        let store = temp_store();
        let msg = message_at(ts(4, 10), "General Inquiry");
        store.save_message(&msg).unwrap();

        let files: Vec<_> = fs::read_dir(store.messages_dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert_eq!(files.len(), 1);

        let (loaded, skipped) = store.load_messages();
        assert_eq!(skipped, 0);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].subject, "General Inquiry");
        assert_eq!(loaded[0].status, "unread");
        assert_eq!(loaded[0].created_at, msg.created_at);
        assert!(loaded[0].from_fallback);
    }

    #[test]
    fn load_sorts_newest_first() {
        let store = temp_store();
        store.save_message(&message_at(ts(1, 8), "oldest")).unwrap();
        store.save_message(&message_at(ts(3, 8), "newest")).unwrap();
        store.save_message(&message_at(ts(2, 8), "middle")).unwrap();

        let (loaded, _) = store.load_messages();
        let subjects: Vec<_> = loaded.iter().map(|m| m.subject.as_str()).collect();
        assert_eq!(subjects, vec!["newest", "middle", "oldest"]);
    }

    #[test]
    fn corrupt_file_is_skipped_not_fatal() {
        let store = temp_store();
        store.save_message(&message_at(ts(1, 9), "good")).unwrap();
        fs::write(store.messages_dir().join("broken.json"), "{not json").unwrap();

        let (loaded, skipped) = store.load_messages();
        assert_eq!(loaded.len(), 1);
        assert_eq!(skipped, 1);
    }

    #[test]
    fn non_json_files_are_ignored_silently() {
        let store = temp_store();
        store.save_message(&message_at(ts(1, 9), "good")).unwrap();
        fs::write(store.messages_dir().join("notes.txt"), "ignore me").unwrap();

        let (loaded, skipped) = store.load_messages();
        assert_eq!(loaded.len(), 1);
        assert_eq!(skipped, 0);
    }

    #[test]
    fn missing_directory_reads_as_empty() {
        let store = temp_store();
        let (loaded, skipped) = store.load_messages();
        assert!(loaded.is_empty());
        assert_eq!(skipped, 0);
    }

    #[test]
    fn default_admin_authenticates_and_updates_last_login() {
        let store = temp_store();
        let admin = store.authenticate("admin", "admin123").expect("auth failed");
        assert_eq!(admin.username, "admin");
        assert!(admin.last_login.is_none());

        // last_login was written after the record we got back
        let reread = store.find_admin("admin").unwrap();
        assert!(reread.last_login.is_some());
    }

    #[test]
    fn wrong_password_is_rejected() {
        let store = temp_store();
        assert!(store.authenticate("admin", "wrong").is_none());
    }

    #[test]
    fn unknown_username_is_rejected() {
        let store = temp_store();
        assert!(store.authenticate("nobody", "admin123").is_none());
    }

    #[test]
    fn admin_file_is_keyed_by_username_hash() {
        let store = temp_store();
        store.ensure_default_admin().unwrap();
        // md5("admin") — matches the shadow files written by earlier
        // deployments so they remain readable.
        let expected = store
            .admin_dir()
            .join("21232f297a57a5a743894a0e4a801fc3.json");
        assert!(expected.exists());
    }
}
