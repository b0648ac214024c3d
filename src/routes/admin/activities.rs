use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::response::Redirect;
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use super::render_admin;
use crate::auth::AdminSession;
use crate::config::Config;
use crate::db::RunMode;
use crate::images;
use crate::models::activity::ActivityInput;
use crate::store::selector::Storage;

const PER_PAGE: usize = 10;

#[derive(FromForm)]
pub struct ActivityForm<'r> {
    pub title: String,
    pub content: String,
    pub status: String,
    pub image: Option<TempFile<'r>>,
}

#[get("/activities?<status>&<page>")]
pub fn list(
    cfg: &State<Config>,
    session: AdminSession,
    status: Option<&str>,
    page: Option<usize>,
) -> Template {
    let storage = Storage::open(cfg, RunMode::Interactive);
    let filter = status.filter(|s| *s == "draft" || *s == "published");
    let (current, skip) = crate::routes::page_skip(page, PER_PAGE);

    let (items, total, available) = match storage.primary() {
        Ok(store) => (
            store
                .activity_list(filter, PER_PAGE as i64, skip)
                .unwrap_or_default(),
            store.activity_count(filter).unwrap_or(0) as usize,
            true,
        ),
        Err(_) => (Vec::new(), 0, false),
    };

    render_admin(
        "admin/activities/list",
        cfg,
        &session,
        "activities",
        json!({
            "activities": items,
            "current_status": filter,
            "current_page": current,
            "total_pages": total.div_ceil(PER_PAGE).max(1),
            "primary_available": available,
        }),
    )
}

#[get("/activities/new")]
pub fn new_form(cfg: &State<Config>, session: AdminSession) -> Template {
    render_admin(
        "admin/activities/form",
        cfg,
        &session,
        "activities",
        json!({ "activity": null, "errors": Vec::<String>::new() }),
    )
}

#[post("/activities", data = "<form>")]
pub async fn create(
    cfg: &State<Config>,
    session: AdminSession,
    mut form: Form<ActivityForm<'_>>,
) -> Result<Redirect, Template> {
    let mut input = ActivityInput {
        title: form.title.clone(),
        content: form.content.clone(),
        status: form.status.clone(),
        image: None,
    };

    let mut errors = input.validate();
    if errors.is_empty() {
        if let Some(ref mut file) = form.image {
            if file.len() > 0 {
                match images::save_upload(file, "activity", &cfg.upload_dir).await {
                    Ok(filename) => input.image = Some(filename),
                    Err(e) => errors.push(e),
                }
            }
        }
    }

    if errors.is_empty() {
        let storage = Storage::open(cfg, RunMode::Interactive);
        match storage.primary().and_then(|s| s.activity_insert(&input)) {
            Ok(id) => {
                log::info!("activity {} created by {}", id, session.username);
                return Ok(Redirect::to("/admin/activities"));
            }
            Err(e) => errors.push(format!("Could not save the activity: {}", e)),
        }
    }

    Err(render_admin(
        "admin/activities/form",
        cfg,
        &session,
        "activities",
        json!({
            "activity": {
                "title": form.title,
                "content": form.content,
                "status": form.status,
            },
            "errors": errors,
        }),
    ))
}

#[get("/activities/<id>/edit")]
pub fn edit_form(cfg: &State<Config>, session: AdminSession, id: &str) -> Option<Template> {
    let storage = Storage::open(cfg, RunMode::Interactive);
    let activity = storage
        .primary()
        .ok()?
        .activity_find(id, false)
        .unwrap_or(None)?;
    Some(render_admin(
        "admin/activities/form",
        cfg,
        &session,
        "activities",
        json!({ "activity": activity, "errors": Vec::<String>::new() }),
    ))
}

#[post("/activities/<id>", data = "<form>")]
pub async fn update(
    cfg: &State<Config>,
    session: AdminSession,
    id: &str,
    mut form: Form<ActivityForm<'_>>,
) -> Result<Redirect, Template> {
    let storage = Storage::open(cfg, RunMode::Interactive);
    let existing = match storage.primary().and_then(|s| s.activity_find(id, false)) {
        Ok(Some(a)) => a,
        _ => return Ok(Redirect::to("/admin/activities")),
    };

    let mut input = ActivityInput {
        title: form.title.clone(),
        content: form.content.clone(),
        status: form.status.clone(),
        image: None,
    };

    let mut errors = input.validate();
    if errors.is_empty() {
        if let Some(ref mut file) = form.image {
            if file.len() > 0 {
                match images::save_upload(file, "activity", &cfg.upload_dir).await {
                    Ok(filename) => {
                        if let Some(ref old) = existing.image {
                            images::delete_upload(&cfg.upload_dir, old);
                        }
                        input.image = Some(filename);
                    }
                    Err(e) => errors.push(e),
                }
            }
        }
    }

    if errors.is_empty() {
        match storage.primary().and_then(|s| s.activity_update(id, &input)) {
            Ok(_) => {
                log::info!("activity {} updated by {}", id, session.username);
                return Ok(Redirect::to("/admin/activities"));
            }
            Err(e) => errors.push(format!("Could not save the activity: {}", e)),
        }
    }

    Err(render_admin(
        "admin/activities/form",
        cfg,
        &session,
        "activities",
        json!({
            "activity": {
                "id": id,
                "title": form.title,
                "content": form.content,
                "status": form.status,
                "image": existing.image,
            },
            "errors": errors,
        }),
    ))
}

#[post("/activities/<id>/delete")]
pub fn delete(cfg: &State<Config>, session: AdminSession, id: &str) -> Redirect {
    let storage = Storage::open(cfg, RunMode::Interactive);
    if let Ok(store) = storage.primary() {
        let image = store
            .activity_find(id, false)
            .ok()
            .flatten()
            .and_then(|a| a.image);
        match store.activity_delete(id) {
            Ok(result) if result.succeeded => {
                if let Some(ref filename) = image {
                    images::delete_upload(&cfg.upload_dir, filename);
                }
                log::info!("activity {} deleted by {}", id, session.username);
            }
            Ok(_) => {}
            Err(e) => log::warn!("activity delete failed: {}", e),
        }
    }
    Redirect::to("/admin/activities")
}
