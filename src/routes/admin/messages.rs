use rocket::form::Form;
use rocket::response::Redirect;
use rocket::serde::json::Json;
use rocket::State;
use rocket_dyn_templates::Template;
use serde::Deserialize;
use serde_json::{json, Value};

use super::render_admin;
use crate::auth::AdminSession;
use crate::config::Config;
use crate::db::RunMode;
use crate::store::selector::Storage;
use crate::store::StoreError;

const PER_PAGE: usize = 20;
const STATUSES: &[&str] = &["unread", "read", "replied"];

#[derive(Debug, FromForm)]
pub struct ReplyForm {
    pub reply_message: String,
}

#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub action: String,
    pub id: Option<String>,
    pub ids: Option<Vec<String>>,
    pub status: Option<String>,
}

/// Merged inbox: primary and fallback records in one list, with status
/// tabs counted over the whole set.
#[get("/messages?<status>&<page>")]
pub fn list(
    cfg: &State<Config>,
    session: AdminSession,
    status: Option<&str>,
    page: Option<usize>,
) -> Template {
    let storage = Storage::open(cfg, RunMode::Interactive);
    let filter = status.filter(|s| STATUSES.contains(s));
    let listing = storage.list_messages(filter, page.unwrap_or(1), PER_PAGE);

    render_admin(
        "admin/messages/list",
        cfg,
        &session,
        "messages",
        json!({
            "messages": listing.messages,
            "counts": listing.counts,
            "current_status": filter,
            "current_page": listing.page,
            "total_pages": listing.total_pages,
            "total": listing.total,
            "skipped": listing.skipped,
            "primary_available": listing.primary_available,
        }),
    )
}

#[get("/messages/<id>")]
pub fn view(cfg: &State<Config>, session: AdminSession, id: &str) -> Option<Template> {
    let storage = Storage::open(cfg, RunMode::Interactive);
    let message = storage.find_message(id).ok()??;

    // opening an unread primary message marks it read; fallback records
    // are display-only
    if message.status == "unread" && !message.from_fallback {
        if let Err(e) = storage
            .primary()
            .and_then(|s| s.message_update_status(id, "read", &session.username))
        {
            log::warn!("could not mark message {} read: {}", id, e);
        }
    }

    Some(render_admin(
        "admin/messages/view",
        cfg,
        &session,
        "messages",
        json!({ "message": message }),
    ))
}

#[post("/messages/<id>/reply", data = "<form>")]
pub fn reply(
    cfg: &State<Config>,
    session: AdminSession,
    id: &str,
    form: Form<ReplyForm>,
) -> Redirect {
    let text = form.reply_message.trim();
    if text.is_empty() {
        return Redirect::to(format!("/admin/messages/{}", id));
    }

    let storage = Storage::open(cfg, RunMode::Interactive);
    match storage
        .primary()
        .and_then(|s| s.message_reply(id, text, &session.username))
    {
        Ok(_) => log::info!("message {} replied to by {}", id, session.username),
        Err(e) => log::warn!("reply to message {} failed: {}", id, e),
    }
    Redirect::to(format!("/admin/messages/{}", id))
}

fn action_error(e: &StoreError) -> Json<Value> {
    let message = match e {
        StoreError::Unavailable => "The message store is currently unavailable",
        StoreError::InvalidId => "Invalid message id",
        StoreError::WriteFailed(_) => "The operation could not be completed",
    };
    Json(json!({ "success": false, "message": message }))
}

/// JSON endpoint backing the inbox toolbar. One action per request;
/// responses always carry `success` and a user-facing `message`.
#[post("/messages/actions", data = "<request>")]
pub fn actions(
    cfg: &State<Config>,
    session: AdminSession,
    request: Json<ActionRequest>,
) -> Json<Value> {
    let storage = Storage::open(cfg, RunMode::Interactive);
    let store = match storage.primary() {
        Ok(s) => s,
        Err(e) => return action_error(&e),
    };

    match request.action.as_str() {
        "mark_all_read" => match store.message_mark_all_read(&session.username) {
            Ok(result) => Json(json!({
                "success": true,
                "message": format!("{} message(s) marked as read", result.affected),
                "affected": result.affected,
            })),
            Err(e) => action_error(&e),
        },
        "update_status" => {
            let id = request.id.as_deref().unwrap_or_default();
            let status = request.status.as_deref().unwrap_or_default();
            if !STATUSES.contains(&status) {
                return Json(json!({ "success": false, "message": "Invalid status" }));
            }
            match store.message_update_status(id, status, &session.username) {
                Ok(result) if result.succeeded => Json(json!({
                    "success": true,
                    "message": "Status updated",
                    "affected": result.affected,
                })),
                Ok(_) => Json(json!({ "success": false, "message": "Message not found" })),
                Err(e) => action_error(&e),
            }
        }
        "delete_message" => {
            let id = request.id.as_deref().unwrap_or_default();
            match store.message_delete(id) {
                Ok(result) if result.succeeded => Json(json!({
                    "success": true,
                    "message": "Message deleted",
                    "affected": result.affected,
                })),
                Ok(_) => Json(json!({ "success": false, "message": "Message not found" })),
                Err(e) => action_error(&e),
            }
        }
        "delete_messages" => {
            let ids = request.ids.clone().unwrap_or_default();
            if ids.is_empty() {
                return Json(json!({ "success": false, "message": "No messages selected" }));
            }
            match store.message_delete_many(&ids) {
                Ok(result) => Json(json!({
                    "success": true,
                    "message": format!("{} message(s) deleted", result.affected),
                    "affected": result.affected,
                })),
                Err(e) => action_error(&e),
            }
        }
        _ => Json(json!({ "success": false, "message": "Unknown action" })),
    }
}
