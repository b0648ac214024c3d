use rocket::form::Form;
use rocket::response::Redirect;
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use super::render_admin;
use crate::auth::AdminSession;
use crate::config::Config;
use crate::db::RunMode;
use crate::models::page::{PageForm, EDITABLE_PAGES};
use crate::store::selector::Storage;

#[get("/pages")]
pub fn list(cfg: &State<Config>, session: AdminSession) -> Template {
    let storage = Storage::open(cfg, RunMode::Interactive);
    let pages: Vec<serde_json::Value> = EDITABLE_PAGES
        .iter()
        .map(|name| {
            let page = storage
                .primary()
                .and_then(|s| s.page_find(name))
                .unwrap_or(None);
            match page {
                Some(p) => json!({
                    "page_name": name,
                    "title": p.title,
                    "updated": crate::models::display_date(p.updated_at),
                }),
                None => json!({ "page_name": name, "title": "", "updated": "" }),
            }
        })
        .collect();

    render_admin(
        "admin/pages/list",
        cfg,
        &session,
        "pages",
        json!({
            "pages": pages,
            "primary_available": storage.primary_available(),
        }),
    )
}

#[get("/pages/<name>/edit")]
pub fn edit_form(cfg: &State<Config>, session: AdminSession, name: &str) -> Option<Template> {
    if !EDITABLE_PAGES.contains(&name) {
        return None;
    }
    let storage = Storage::open(cfg, RunMode::Interactive);
    let page = storage
        .primary()
        .and_then(|s| s.page_find(name))
        .unwrap_or(None);
    let context = match page {
        Some(p) => json!({ "page_name": name, "title": p.title, "content": p.content }),
        None => json!({ "page_name": name, "title": "", "content": "" }),
    };
    Some(render_admin(
        "admin/pages/form",
        cfg,
        &session,
        "pages",
        json!({ "page": context, "errors": Vec::<String>::new() }),
    ))
}

#[post("/pages", data = "<form>")]
pub fn save(
    cfg: &State<Config>,
    session: AdminSession,
    form: Form<PageForm>,
) -> Result<Redirect, Template> {
    let mut errors = form.validate();

    if errors.is_empty() {
        let storage = Storage::open(cfg, RunMode::Interactive);
        match storage.primary().and_then(|s| s.page_upsert(&form)) {
            Ok(_) => {
                log::info!("page '{}' saved by {}", form.page_name, session.username);
                return Ok(Redirect::to("/admin/pages"));
            }
            Err(e) => errors.push(format!("Could not save the page: {}", e)),
        }
    }

    Err(render_admin(
        "admin/pages/form",
        cfg,
        &session,
        "pages",
        json!({
            "page": {
                "page_name": form.page_name,
                "title": form.title,
                "content": form.content,
            },
            "errors": errors,
        }),
    ))
}
