//! Primary-store adapter. Wraps a negotiated `mongodb::sync::Database`
//! handle and converts driver errors into the `StoreError` taxonomy at
//! this boundary. Documents are mapped by hand; missing or oddly typed
//! fields degrade to defaults rather than failing the whole read.

use chrono::{NaiveDateTime, Utc};
use log::warn;
use mongodb::bson::{doc, Bson, DateTime as BsonDateTime, Document};
use mongodb::options::{FindOptions, IndexOptions, UpdateOptions};
use mongodb::sync::Database;
use mongodb::IndexModel;

use crate::models::activity::{Activity, ActivityInput};
use crate::models::admin::Administrator;
use crate::models::contact::ContactMessage;
use crate::models::page::{Page, PageForm};
use crate::models::team::{TeamMember, TeamMemberInput};

use super::{parse_object_id, update_outcome, OperationResult, StoreError};

const COLL_ADMINS: &str = "administrators";
const COLL_ACTIVITIES: &str = "activities";
const COLL_PAGES: &str = "pages";
const COLL_MESSAGES: &str = "contact_messages";
const COLL_TEAM: &str = "team_members";

pub struct MongoStore {
    db: Database,
}

fn bson_now() -> BsonDateTime {
    BsonDateTime::from_chrono(Utc::now())
}

fn naive(dt: &BsonDateTime) -> NaiveDateTime {
    dt.to_chrono().naive_utc()
}

fn get_dt(doc: &Document, key: &str) -> NaiveDateTime {
    doc.get_datetime(key)
        .map(naive)
        .unwrap_or_else(|_| Utc::now().naive_utc())
}

fn get_dt_opt(doc: &Document, key: &str) -> Option<NaiveDateTime> {
    doc.get_datetime(key).ok().map(naive)
}

fn get_str(doc: &Document, key: &str) -> String {
    doc.get_str(key).unwrap_or_default().to_string()
}

fn get_str_opt(doc: &Document, key: &str) -> Option<String> {
    doc.get_str(key).ok().map(|s| s.to_string())
}

fn doc_id(doc: &Document) -> String {
    doc.get_object_id("_id")
        .map(|oid| oid.to_hex())
        .unwrap_or_default()
}

fn write_err(e: impl std::fmt::Display) -> StoreError {
    StoreError::WriteFailed(e.to_string())
}

fn message_from_doc(doc: &Document) -> ContactMessage {
    ContactMessage {
        id: doc_id(doc),
        name: get_str(doc, "name"),
        email: get_str(doc, "email"),
        subject: get_str(doc, "subject"),
        message: get_str(doc, "message"),
        status: doc.get_str("status").unwrap_or("unread").to_string(),
        created_at: get_dt(doc, "created_at"),
        ip_address: get_str(doc, "ip_address"),
        user_agent: get_str(doc, "user_agent"),
        reply_message: get_str_opt(doc, "reply_message"),
        replied_by: get_str_opt(doc, "replied_by"),
        replied_at: get_dt_opt(doc, "replied_at"),
        from_fallback: false,
    }
}

fn activity_from_doc(doc: &Document) -> Activity {
    Activity {
        id: doc_id(doc),
        title: get_str(doc, "title"),
        content: get_str(doc, "content"),
        status: doc.get_str("status").unwrap_or("draft").to_string(),
        image: get_str_opt(doc, "image").filter(|s| !s.is_empty()),
        created_at: get_dt(doc, "created_at"),
        updated_at: get_dt(doc, "updated_at"),
    }
}

fn team_from_doc(doc: &Document) -> TeamMember {
    TeamMember {
        id: doc_id(doc),
        name: get_str(doc, "name"),
        role: get_str(doc, "role"),
        email: get_str(doc, "email"),
        phone: get_str(doc, "phone"),
        bio: get_str(doc, "bio"),
        image: get_str_opt(doc, "image").filter(|s| !s.is_empty()),
        display_order: doc.get_i64("display_order").unwrap_or_else(|_| {
            doc.get_i32("display_order").map(i64::from).unwrap_or(0)
        }),
        status: doc.get_str("status").unwrap_or("active").to_string(),
        created_at: get_dt(doc, "created_at"),
        updated_at: get_dt(doc, "updated_at"),
    }
}

fn page_from_doc(doc: &Document) -> Page {
    Page {
        id: doc_id(doc),
        page_name: get_str(doc, "page_name"),
        title: get_str(doc, "title"),
        content: get_str(doc, "content"),
        updated_at: get_dt(doc, "updated_at"),
    }
}

fn admin_from_doc(doc: &Document) -> Administrator {
    Administrator {
        id: doc_id(doc),
        username: get_str(doc, "username"),
        password_hash: get_str(doc, "password"),
        email: get_str(doc, "email"),
        created_at: get_dt(doc, "created_at"),
        last_login: get_dt_opt(doc, "last_login"),
    }
}

impl MongoStore {
    pub fn new(db: Database) -> Self {
        MongoStore { db }
    }

    fn coll(&self, name: &str) -> mongodb::sync::Collection<Document> {
        self.db.collection::<Document>(name)
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    /// Create the indexes every collection relies on. Run from the batch
    /// path at boot; idempotent.
    pub fn ensure_indexes(&self) -> Result<(), StoreError> {
        let unique = || IndexOptions::builder().unique(true).build();

        self.coll(COLL_ADMINS)
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "username": 1 })
                    .options(unique())
                    .build(),
                None,
            )
            .map_err(write_err)?;

        let activities = self.coll(COLL_ACTIVITIES);
        activities
            .create_index(
                IndexModel::builder().keys(doc! { "created_at": -1 }).build(),
                None,
            )
            .map_err(write_err)?;
        activities
            .create_index(
                IndexModel::builder().keys(doc! { "status": 1 }).build(),
                None,
            )
            .map_err(write_err)?;

        self.coll(COLL_PAGES)
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "page_name": 1 })
                    .options(unique())
                    .build(),
                None,
            )
            .map_err(write_err)?;

        self.coll(COLL_MESSAGES)
            .create_index(
                IndexModel::builder().keys(doc! { "created_at": -1 }).build(),
                None,
            )
            .map_err(write_err)?;

        self.coll(COLL_TEAM)
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "display_order": 1, "created_at": 1 })
                    .build(),
                None,
            )
            .map_err(write_err)?;

        Ok(())
    }

    /// Seed the default administrator and the three static pages on a
    /// fresh database. Existing documents are left alone.
    pub fn seed_defaults(&self) -> Result<(), StoreError> {
        let admins = self.coll(COLL_ADMINS);
        let count = admins.count_documents(doc! {}, None).map_err(write_err)?;
        if count == 0 {
            let hash = bcrypt::hash("admin123", bcrypt::DEFAULT_COST).map_err(write_err)?;
            admins
                .insert_one(
                    doc! {
                        "username": "admin",
                        "password": hash,
                        "email": "admin@example.com",
                        "created_at": bson_now(),
                        "last_login": Bson::Null,
                    },
                    None,
                )
                .map_err(write_err)?;
            warn!("default administrator created (username=admin) — change the password");
        }

        let pages = self.coll(COLL_PAGES);
        let defaults = [
            ("home", "Welcome to Pearls of Hope"),
            ("about", "About Us"),
            ("contact", "Contact Us"),
        ];
        for (name, title) in defaults {
            let filter = doc! { "page_name": name };
            let update = doc! { "$setOnInsert": {
                "page_name": name,
                "title": title,
                "content": "",
                "updated_at": bson_now(),
            }};
            let opts = UpdateOptions::builder().upsert(true).build();
            pages.update_one(filter, update, opts).map_err(write_err)?;
        }

        Ok(())
    }

    // ── Contact messages ────────────────────────────────────────────

    pub fn message_insert(&self, msg: &ContactMessage) -> Result<OperationResult, StoreError> {
        let document = doc! {
            "name": &msg.name,
            "email": &msg.email,
            "subject": &msg.subject,
            "message": &msg.message,
            "status": &msg.status,
            "created_at": BsonDateTime::from_chrono(msg.created_at.and_utc()),
            "ip_address": &msg.ip_address,
            "user_agent": &msg.user_agent,
            "source": "contact_form",
        };
        self.coll(COLL_MESSAGES)
            .insert_one(document, None)
            .map_err(write_err)?;
        Ok(OperationResult::ok(1))
    }

    /// All messages matching the status filter, newest first. Pagination
    /// happens after the merge with fallback records, so none is applied
    /// here.
    pub fn message_list(&self, status: Option<&str>) -> Result<Vec<ContactMessage>, StoreError> {
        let filter = match status {
            Some(s) => doc! { "status": s },
            None => doc! {},
        };
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .build();
        let cursor = self
            .coll(COLL_MESSAGES)
            .find(filter, options)
            .map_err(|_| StoreError::Unavailable)?;
        Ok(cursor
            .filter_map(|r| r.ok())
            .map(|d| message_from_doc(&d))
            .collect())
    }

    pub fn message_find(&self, id: &str) -> Result<Option<ContactMessage>, StoreError> {
        let oid = parse_object_id(id)?;
        let found = self
            .coll(COLL_MESSAGES)
            .find_one(doc! { "_id": oid }, None)
            .map_err(|_| StoreError::Unavailable)?;
        Ok(found.map(|d| message_from_doc(&d)))
    }

    pub fn message_update_status(
        &self,
        id: &str,
        status: &str,
        by: &str,
    ) -> Result<OperationResult, StoreError> {
        let oid = parse_object_id(id)?;
        let update = doc! { "$set": {
            "status": status,
            "status_updated_at": bson_now(),
            "status_updated_by": by,
            "updated_at": bson_now(),
        }};
        let result = self
            .coll(COLL_MESSAGES)
            .update_one(doc! { "_id": oid }, update, None)
            .map_err(write_err)?;
        Ok(update_outcome(result.matched_count, result.modified_count))
    }

    pub fn message_mark_all_read(&self, by: &str) -> Result<OperationResult, StoreError> {
        let update = doc! { "$set": {
            "status": "read",
            "marked_read_at": bson_now(),
            "marked_read_by": by,
        }};
        let result = self
            .coll(COLL_MESSAGES)
            .update_many(doc! { "status": "unread" }, update, None)
            .map_err(write_err)?;
        Ok(OperationResult::ok(result.modified_count))
    }

    pub fn message_reply(
        &self,
        id: &str,
        reply: &str,
        by: &str,
    ) -> Result<OperationResult, StoreError> {
        let oid = parse_object_id(id)?;
        let update = doc! { "$set": {
            "status": "replied",
            "reply_message": reply,
            "replied_by": by,
            "replied_at": bson_now(),
            "updated_at": bson_now(),
        }};
        let result = self
            .coll(COLL_MESSAGES)
            .update_one(doc! { "_id": oid }, update, None)
            .map_err(write_err)?;
        Ok(update_outcome(result.matched_count, result.modified_count))
    }

    pub fn message_delete(&self, id: &str) -> Result<OperationResult, StoreError> {
        let oid = parse_object_id(id)?;
        let result = self
            .coll(COLL_MESSAGES)
            .delete_one(doc! { "_id": oid }, None)
            .map_err(write_err)?;
        Ok(OperationResult {
            succeeded: result.deleted_count > 0,
            affected: result.deleted_count,
        })
    }

    /// Delete a batch of messages. Ids that fail validation are dropped
    /// from the batch; an all-invalid batch is rejected outright.
    pub fn message_delete_many(&self, ids: &[String]) -> Result<OperationResult, StoreError> {
        let oids: Vec<_> = ids
            .iter()
            .filter_map(|id| parse_object_id(id).ok())
            .collect();
        if oids.is_empty() {
            return Err(StoreError::InvalidId);
        }
        let result = self
            .coll(COLL_MESSAGES)
            .delete_many(doc! { "_id": { "$in": oids } }, None)
            .map_err(write_err)?;
        Ok(OperationResult::ok(result.deleted_count))
    }

    // ── Administrators ──────────────────────────────────────────────

    pub fn admin_find(&self, username: &str) -> Result<Option<Administrator>, StoreError> {
        let found = self
            .coll(COLL_ADMINS)
            .find_one(doc! { "username": username }, None)
            .map_err(|_| StoreError::Unavailable)?;
        Ok(found.map(|d| admin_from_doc(&d)))
    }

    pub fn admin_touch_last_login(&self, username: &str) -> Result<OperationResult, StoreError> {
        let result = self
            .coll(COLL_ADMINS)
            .update_one(
                doc! { "username": username },
                doc! { "$set": { "last_login": bson_now() } },
                None,
            )
            .map_err(write_err)?;
        Ok(OperationResult::ok(result.modified_count))
    }

    // ── Activities ──────────────────────────────────────────────────

    pub fn activity_insert(&self, input: &ActivityInput) -> Result<String, StoreError> {
        let mut document = doc! {
            "title": input.title.trim(),
            "content": input.content.trim(),
            "status": &input.status,
            "created_at": bson_now(),
            "updated_at": bson_now(),
        };
        if let Some(ref image) = input.image {
            document.insert("image", image);
        }
        let result = self
            .coll(COLL_ACTIVITIES)
            .insert_one(document, None)
            .map_err(write_err)?;
        match result.inserted_id {
            Bson::ObjectId(oid) => Ok(oid.to_hex()),
            other => Err(StoreError::WriteFailed(format!(
                "unexpected inserted id {:?}",
                other
            ))),
        }
    }

    pub fn activity_update(
        &self,
        id: &str,
        input: &ActivityInput,
    ) -> Result<OperationResult, StoreError> {
        let oid = parse_object_id(id)?;
        let mut set = doc! {
            "title": input.title.trim(),
            "content": input.content.trim(),
            "status": &input.status,
            "updated_at": bson_now(),
        };
        if let Some(ref image) = input.image {
            set.insert("image", image);
        }
        let result = self
            .coll(COLL_ACTIVITIES)
            .update_one(doc! { "_id": oid }, doc! { "$set": set }, None)
            .map_err(write_err)?;
        Ok(update_outcome(result.matched_count, result.modified_count))
    }

    pub fn activity_delete(&self, id: &str) -> Result<OperationResult, StoreError> {
        let oid = parse_object_id(id)?;
        let result = self
            .coll(COLL_ACTIVITIES)
            .delete_one(doc! { "_id": oid }, None)
            .map_err(write_err)?;
        Ok(OperationResult {
            succeeded: result.deleted_count > 0,
            affected: result.deleted_count,
        })
    }

    pub fn activity_find(
        &self,
        id: &str,
        published_only: bool,
    ) -> Result<Option<Activity>, StoreError> {
        let oid = parse_object_id(id)?;
        let mut filter = doc! { "_id": oid };
        if published_only {
            filter.insert("status", "published");
        }
        let found = self
            .coll(COLL_ACTIVITIES)
            .find_one(filter, None)
            .map_err(|_| StoreError::Unavailable)?;
        Ok(found.map(|d| activity_from_doc(&d)))
    }

    pub fn activity_list(
        &self,
        status: Option<&str>,
        limit: i64,
        skip: u64,
    ) -> Result<Vec<Activity>, StoreError> {
        let filter = match status {
            Some(s) => doc! { "status": s },
            None => doc! {},
        };
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .skip(skip)
            .limit(limit)
            .build();
        let cursor = self
            .coll(COLL_ACTIVITIES)
            .find(filter, options)
            .map_err(|_| StoreError::Unavailable)?;
        Ok(cursor
            .filter_map(|r| r.ok())
            .map(|d| activity_from_doc(&d))
            .collect())
    }

    pub fn activity_count(&self, status: Option<&str>) -> Result<u64, StoreError> {
        let filter = match status {
            Some(s) => doc! { "status": s },
            None => doc! {},
        };
        self.coll(COLL_ACTIVITIES)
            .count_documents(filter, None)
            .map_err(|_| StoreError::Unavailable)
    }

    // ── Team members ────────────────────────────────────────────────

    pub fn team_insert(&self, input: &TeamMemberInput) -> Result<String, StoreError> {
        let mut document = doc! {
            "name": input.name.trim(),
            "role": input.role.trim(),
            "email": input.email.trim(),
            "phone": input.phone.trim(),
            "bio": input.bio.trim(),
            "display_order": input.display_order,
            "status": &input.status,
            "created_at": bson_now(),
            "updated_at": bson_now(),
        };
        if let Some(ref image) = input.image {
            document.insert("image", image);
        }
        let result = self
            .coll(COLL_TEAM)
            .insert_one(document, None)
            .map_err(write_err)?;
        match result.inserted_id {
            Bson::ObjectId(oid) => Ok(oid.to_hex()),
            other => Err(StoreError::WriteFailed(format!(
                "unexpected inserted id {:?}",
                other
            ))),
        }
    }

    pub fn team_update(
        &self,
        id: &str,
        input: &TeamMemberInput,
    ) -> Result<OperationResult, StoreError> {
        let oid = parse_object_id(id)?;
        let mut set = doc! {
            "name": input.name.trim(),
            "role": input.role.trim(),
            "email": input.email.trim(),
            "phone": input.phone.trim(),
            "bio": input.bio.trim(),
            "display_order": input.display_order,
            "status": &input.status,
            "updated_at": bson_now(),
        };
        if let Some(ref image) = input.image {
            set.insert("image", image);
        }
        let result = self
            .coll(COLL_TEAM)
            .update_one(doc! { "_id": oid }, doc! { "$set": set }, None)
            .map_err(write_err)?;
        Ok(update_outcome(result.matched_count, result.modified_count))
    }

    pub fn team_delete(&self, id: &str) -> Result<OperationResult, StoreError> {
        let oid = parse_object_id(id)?;
        let result = self
            .coll(COLL_TEAM)
            .delete_one(doc! { "_id": oid }, None)
            .map_err(write_err)?;
        Ok(OperationResult {
            succeeded: result.deleted_count > 0,
            affected: result.deleted_count,
        })
    }

    pub fn team_find(&self, id: &str) -> Result<Option<TeamMember>, StoreError> {
        let oid = parse_object_id(id)?;
        let found = self
            .coll(COLL_TEAM)
            .find_one(doc! { "_id": oid }, None)
            .map_err(|_| StoreError::Unavailable)?;
        Ok(found.map(|d| team_from_doc(&d)))
    }

    /// Members in display order. `active_only` filters the public view;
    /// the admin list sees everyone.
    pub fn team_list(&self, active_only: bool) -> Result<Vec<TeamMember>, StoreError> {
        let filter = if active_only {
            doc! { "status": "active" }
        } else {
            doc! {}
        };
        let options = FindOptions::builder()
            .sort(doc! { "display_order": 1, "created_at": 1 })
            .build();
        let cursor = self
            .coll(COLL_TEAM)
            .find(filter, options)
            .map_err(|_| StoreError::Unavailable)?;
        Ok(cursor
            .filter_map(|r| r.ok())
            .map(|d| team_from_doc(&d))
            .collect())
    }

    pub fn team_count(&self) -> Result<u64, StoreError> {
        self.coll(COLL_TEAM)
            .count_documents(doc! {}, None)
            .map_err(|_| StoreError::Unavailable)
    }

    // ── Pages ───────────────────────────────────────────────────────

    pub fn page_find(&self, page_name: &str) -> Result<Option<Page>, StoreError> {
        let found = self
            .coll(COLL_PAGES)
            .find_one(doc! { "page_name": page_name }, None)
            .map_err(|_| StoreError::Unavailable)?;
        Ok(found.map(|d| page_from_doc(&d)))
    }

    pub fn page_upsert(&self, form: &PageForm) -> Result<OperationResult, StoreError> {
        let filter = doc! { "page_name": &form.page_name };
        let update = doc! { "$set": {
            "page_name": &form.page_name,
            "title": form.title.trim(),
            "content": &form.content,
            "updated_at": bson_now(),
        }};
        let opts = UpdateOptions::builder().upsert(true).build();
        let result = self
            .coll(COLL_PAGES)
            .update_one(filter, update, opts)
            .map_err(write_err)?;
        let affected = result.modified_count + result.upserted_id.map(|_| 1).unwrap_or(0);
        Ok(OperationResult::ok(affected))
    }

    pub fn page_count(&self) -> Result<u64, StoreError> {
        self.coll(COLL_PAGES)
            .count_documents(doc! {}, None)
            .map_err(|_| StoreError::Unavailable)
    }
}
