//! Chooses between the primary store and the file fallback per operation.
//! Contact messages degrade to files when the primary store is
//! unreachable, and admin auth additionally falls through on a username
//! the primary does not hold; both only outside production. Everything
//! else requires the primary store and surfaces `Unavailable` without it.

use log::warn;

use crate::config::Config;
use crate::db::{self, RunMode};
use crate::models::admin::Administrator;
use crate::models::contact::ContactMessage;

use super::fallback::FallbackStore;
use super::mongo::MongoStore;
use super::{OperationResult, StoreError};

pub struct Storage {
    primary: Option<MongoStore>,
    fallback: FallbackStore,
    production: bool,
}

/// Message counts per status tab, computed over the merged set so the
/// numbers agree with what the list actually shows.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct StatusCounts {
    pub all: usize,
    pub unread: usize,
    pub read: usize,
    pub replied: usize,
}

/// One page of the merged message view plus everything the list template
/// needs to render tabs and pagination.
pub struct MessageListing {
    pub messages: Vec<ContactMessage>,
    pub counts: StatusCounts,
    pub page: usize,
    pub total_pages: usize,
    pub total: usize,
    /// Unparseable fallback files encountered during the read.
    pub skipped: usize,
    pub primary_available: bool,
}

impl Storage {
    /// Negotiate a primary connection (memoized across calls) and wire up
    /// the fallback directory. A failed negotiation is not fatal here;
    /// each operation decides how to degrade.
    pub fn open(cfg: &Config, mode: RunMode) -> Storage {
        let primary = db::connect(cfg, mode).map(MongoStore::new);
        Storage {
            primary,
            fallback: FallbackStore::new(&cfg.data_dir),
            production: cfg.production,
        }
    }

    #[cfg(test)]
    pub(crate) fn offline(fallback: FallbackStore, production: bool) -> Storage {
        Storage {
            primary: None,
            fallback,
            production,
        }
    }

    pub fn primary_available(&self) -> bool {
        self.primary.is_some()
    }

    /// The primary store, or `Unavailable`. Operations with no fallback
    /// path (activities, team, pages) go through here.
    pub fn primary(&self) -> Result<&MongoStore, StoreError> {
        self.primary.as_ref().ok_or(StoreError::Unavailable)
    }

    // ── Contact messages ────────────────────────────────────────────

    /// Persist a visitor submission. Primary first; if the primary store
    /// is out of reach the message goes to a fallback file instead, but
    /// only outside production where the files are actually collected.
    pub fn submit_message(&self, msg: &ContactMessage) -> Result<OperationResult, StoreError> {
        match self.primary() {
            Ok(store) => match store.message_insert(msg) {
                Ok(result) => Ok(result),
                Err(e) if self.production => Err(e),
                Err(e) => {
                    warn!("primary insert failed ({}), using file fallback", e);
                    self.fallback.save_message(msg)
                }
            },
            Err(StoreError::Unavailable) if !self.production => self.fallback.save_message(msg),
            Err(e) => Err(e),
        }
    }

    /// The merged admin list view. Primary and fallback records are
    /// combined, sorted newest first, then filtered and paginated as one
    /// sequence.
    pub fn list_messages(
        &self,
        status: Option<&str>,
        page: usize,
        per_page: usize,
    ) -> MessageListing {
        let primary_msgs = match self.primary().and_then(|s| s.message_list(None)) {
            Ok(msgs) => msgs,
            Err(_) => Vec::new(),
        };
        let (fallback_msgs, skipped) = self.fallback.load_messages();

        let merged = merge_messages(primary_msgs, fallback_msgs);
        let counts = status_counts(&merged);

        let filtered: Vec<ContactMessage> = match status {
            Some(s) => merged.into_iter().filter(|m| m.status == s).collect(),
            None => merged,
        };
        let total = filtered.len();
        let (page, total_pages, range) = paginate(total, page, per_page);
        let messages = filtered[range].to_vec();

        MessageListing {
            messages,
            counts,
            page,
            total_pages,
            total,
            skipped,
            primary_available: self.primary_available(),
        }
    }

    /// Look a message up by id across both backends. Primary ids are
    /// 24-hex ObjectIds; fallback ids are opaque strings matched against
    /// the file contents.
    pub fn find_message(&self, id: &str) -> Result<Option<ContactMessage>, StoreError> {
        if let Ok(store) = self.primary() {
            match store.message_find(id) {
                Ok(Some(msg)) => return Ok(Some(msg)),
                Ok(None) => {}
                Err(StoreError::InvalidId) => {}
                Err(e) => return Err(e),
            }
        }
        let (fallback_msgs, _) = self.fallback.load_messages();
        Ok(fallback_msgs.into_iter().find(|m| m.id == id))
    }

    // ── Administrators ──────────────────────────────────────────────

    /// Verify admin credentials. The primary collection is authoritative
    /// for accounts it holds; a miss or an unreachable primary defers to
    /// the per-user shadow files, but never in production.
    pub fn authenticate_admin(&self, username: &str, password: &str) -> Option<Administrator> {
        let lookup = self.primary().and_then(|s| s.admin_find(username));
        match primary_auth(lookup, password) {
            PrimaryAuth::Granted(admin) => {
                if let Ok(store) = self.primary() {
                    if let Err(e) = store.admin_touch_last_login(username) {
                        warn!("failed to record last_login for '{}': {}", username, e);
                    }
                }
                Some(admin)
            }
            PrimaryAuth::Denied => None,
            PrimaryAuth::TryFallback if !self.production => {
                self.fallback.authenticate(username, password)
            }
            PrimaryAuth::TryFallback => None,
        }
    }
}

/// What a primary-store credential check concluded. A wrong password on
/// an account the primary holds is a hard denial; an unknown username or
/// an unreachable primary leaves the shadow files as the next stop.
enum PrimaryAuth {
    Granted(Administrator),
    Denied,
    TryFallback,
}

fn primary_auth(
    lookup: Result<Option<Administrator>, StoreError>,
    password: &str,
) -> PrimaryAuth {
    match lookup {
        Ok(Some(admin)) => {
            if bcrypt::verify(password, &admin.password_hash).unwrap_or(false) {
                PrimaryAuth::Granted(admin)
            } else {
                PrimaryAuth::Denied
            }
        }
        Ok(None) | Err(_) => PrimaryAuth::TryFallback,
    }
}

/// Concatenate the two sources and re-sort newest first. Ties keep the
/// primary record ahead (stable sort, primary listed first).
pub fn merge_messages(
    primary: Vec<ContactMessage>,
    fallback: Vec<ContactMessage>,
) -> Vec<ContactMessage> {
    let mut merged = primary;
    merged.extend(fallback);
    merged.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    merged
}

pub fn status_counts(messages: &[ContactMessage]) -> StatusCounts {
    let mut counts = StatusCounts {
        all: messages.len(),
        ..StatusCounts::default()
    };
    for msg in messages {
        match msg.status.as_str() {
            "unread" => counts.unread += 1,
            "read" => counts.read += 1,
            "replied" => counts.replied += 1,
            _ => {}
        }
    }
    counts
}

/// Clamp the requested page into range and return the index window for
/// it. A page past the end yields an empty window, not an error.
pub fn paginate(total: usize, page: usize, per_page: usize) -> (usize, usize, std::ops::Range<usize>) {
    let per_page = per_page.max(1);
    let total_pages = total.div_ceil(per_page).max(1);
    let page = page.clamp(1, total_pages);
    let start = (page - 1) * per_page;
    let end = (start + per_page).min(total);
    let start = start.min(total);
    (page, total_pages, start..end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fallback::tests::{message_at, temp_store};
    use chrono::NaiveDate;

    fn ts(day: u32, hour: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, day)
            .unwrap()
            .and_hms_opt(hour, 30, 0)
            .unwrap()
    }

    #[test]
    fn merge_interleaves_by_timestamp() {
        let primary = vec![message_at(ts(5, 9), "p-new"), message_at(ts(1, 9), "p-old")];
        let fallback = vec![message_at(ts(3, 9), "f-mid")];
        let merged = merge_messages(primary, fallback);
        let subjects: Vec<_> = merged.iter().map(|m| m.subject.as_str()).collect();
        assert_eq!(subjects, vec!["p-new", "f-mid", "p-old"]);
    }

    #[test]
    fn counts_cover_the_merged_set() {
        let mut read = message_at(ts(2, 8), "r");
        read.status = "read".to_string();
        let mut replied = message_at(ts(3, 8), "rp");
        replied.status = "replied".to_string();
        let msgs = vec![message_at(ts(1, 8), "u"), read, replied];
        let counts = status_counts(&msgs);
        assert_eq!(counts.all, 3);
        assert_eq!(counts.unread, 1);
        assert_eq!(counts.read, 1);
        assert_eq!(counts.replied, 1);
    }

    #[test]
    fn pagination_windows_the_merged_sequence() {
        let (page, total_pages, range) = paginate(45, 2, 20);
        assert_eq!((page, total_pages), (2, 3));
        assert_eq!(range, 20..40);

        let (page, total_pages, range) = paginate(45, 3, 20);
        assert_eq!((page, total_pages), (3, 3));
        assert_eq!(range, 40..45);
    }

    #[test]
    fn out_of_range_pages_are_clamped() {
        let (page, _, range) = paginate(10, 0, 20);
        assert_eq!(page, 1);
        assert_eq!(range, 0..10);

        let (page, total_pages, range) = paginate(10, 99, 20);
        assert_eq!((page, total_pages), (1, 1));
        assert_eq!(range, 0..10);
    }

    #[test]
    fn empty_set_still_has_one_page() {
        let (page, total_pages, range) = paginate(0, 1, 20);
        assert_eq!((page, total_pages), (1, 1));
        assert!(range.is_empty());
    }

    #[test]
    fn offline_submit_goes_to_fallback_files() {
        let storage = Storage::offline(temp_store(), false);
        let result = storage.submit_message(&message_at(ts(4, 12), "offline"));
        assert!(result.unwrap().succeeded);

        let listing = storage.list_messages(None, 1, 20);
        assert_eq!(listing.total, 1);
        assert_eq!(listing.messages[0].subject, "offline");
        assert!(listing.messages[0].from_fallback);
        assert!(!listing.primary_available);
    }

    #[test]
    fn production_refuses_the_file_fallback() {
        let storage = Storage::offline(temp_store(), true);
        let err = storage
            .submit_message(&message_at(ts(4, 12), "prod"))
            .unwrap_err();
        assert_eq!(err, StoreError::Unavailable);

        // nothing may have been written
        let listing = storage.list_messages(None, 1, 20);
        assert_eq!(listing.total, 0);
    }

    #[test]
    fn offline_list_filters_by_status() {
        let storage = Storage::offline(temp_store(), false);
        storage.submit_message(&message_at(ts(1, 8), "a")).unwrap();
        storage.submit_message(&message_at(ts(2, 8), "b")).unwrap();

        let listing = storage.list_messages(Some("unread"), 1, 20);
        assert_eq!(listing.total, 2);
        let listing = storage.list_messages(Some("replied"), 1, 20);
        assert_eq!(listing.total, 0);
        // tab counts still describe the whole merged set
        assert_eq!(listing.counts.all, 2);
    }

    #[test]
    fn find_message_matches_fallback_ids() {
        let storage = Storage::offline(temp_store(), false);
        let msg = message_at(ts(6, 8), "findable");
        storage.submit_message(&msg).unwrap();

        let found = storage.find_message(&msg.id).unwrap();
        assert_eq!(found.unwrap().subject, "findable");
        assert!(storage.find_message("missing-id").unwrap().is_none());
    }

    fn admin_with_password(password: &str) -> crate::models::admin::Administrator {
        crate::models::admin::Administrator {
            id: "0".repeat(24),
            username: "admin".to_string(),
            password_hash: bcrypt::hash(password, 4).unwrap(),
            email: "admin@example.com".to_string(),
            created_at: ts(1, 0),
            last_login: None,
        }
    }

    #[test]
    fn primary_miss_defers_to_fallback() {
        // an account that exists only as a shadow file must still be able
        // to log in while the primary store is up
        assert!(matches!(
            primary_auth(Ok(None), "admin123"),
            PrimaryAuth::TryFallback
        ));
        assert!(matches!(
            primary_auth(Err(StoreError::Unavailable), "admin123"),
            PrimaryAuth::TryFallback
        ));
    }

    #[test]
    fn primary_wrong_password_is_a_hard_denial() {
        let admin = admin_with_password("right");
        assert!(matches!(
            primary_auth(Ok(Some(admin)), "wrong"),
            PrimaryAuth::Denied
        ));
    }

    #[test]
    fn primary_match_grants_access() {
        let admin = admin_with_password("right");
        match primary_auth(Ok(Some(admin)), "right") {
            PrimaryAuth::Granted(a) => assert_eq!(a.username, "admin"),
            _ => panic!("expected a grant"),
        }
    }

    #[test]
    fn offline_auth_uses_shadow_files() {
        let storage = Storage::offline(temp_store(), false);
        let admin = storage.authenticate_admin("admin", "admin123");
        assert_eq!(admin.unwrap().username, "admin");
        assert!(storage.authenticate_admin("admin", "nope").is_none());
    }

    #[test]
    fn production_auth_never_reads_shadow_files() {
        let storage = Storage::offline(temp_store(), true);
        assert!(storage.authenticate_admin("admin", "admin123").is_none());
    }
}
