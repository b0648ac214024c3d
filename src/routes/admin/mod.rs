use rocket::response::Redirect;
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use crate::auth::AdminSession;
use crate::config::Config;
use crate::db::RunMode;
use crate::store::selector::Storage;

pub mod activities;
pub mod messages;
pub mod pages;
pub mod team;

/// Context fields every admin template expects.
pub(crate) fn admin_base(cfg: &Config, session: &AdminSession, section: &str) -> serde_json::Value {
    json!({
        "site_name": cfg.site_name,
        "username": session.username,
        "section": section,
    })
}

fn merge(base: serde_json::Value, extra: serde_json::Value) -> serde_json::Value {
    let mut merged = base;
    if let (Some(obj), Some(add)) = (merged.as_object_mut(), extra.as_object()) {
        for (k, v) in add {
            obj.insert(k.clone(), v.clone());
        }
    }
    merged
}

pub(crate) fn render_admin(
    template: &'static str,
    cfg: &Config,
    session: &AdminSession,
    section: &str,
    extra: serde_json::Value,
) -> Template {
    Template::render(template, merge(admin_base(cfg, session, section), extra))
}

// ── Dashboard ──────────────────────────────────────────

#[get("/")]
pub fn dashboard(cfg: &State<Config>, session: AdminSession) -> Template {
    let storage = Storage::open(cfg, RunMode::Interactive);

    let (activity_count, team_count, page_count) = match storage.primary() {
        Ok(store) => (
            store.activity_count(None).unwrap_or(0),
            store.team_count().unwrap_or(0),
            store.page_count().unwrap_or(0),
        ),
        Err(_) => (0, 0, 0),
    };

    let listing = storage.list_messages(None, 1, 5);

    render_admin(
        "admin/dashboard",
        cfg,
        &session,
        "dashboard",
        json!({
            "activity_count": activity_count,
            "team_count": team_count,
            "page_count": page_count,
            "message_counts": listing.counts,
            "recent_messages": listing.messages,
            "primary_available": listing.primary_available,
        }),
    )
}

/// Every unauthenticated request into the admin area lands here after the
/// session guard forwards.
#[get("/<_..>", rank = 20)]
pub fn login_redirect() -> Redirect {
    Redirect::to("/admin/login")
}

#[post("/<_..>", rank = 20)]
pub fn login_redirect_post() -> Redirect {
    Redirect::to("/admin/login")
}

pub fn routes() -> Vec<rocket::Route> {
    let mut all = routes![dashboard, login_redirect, login_redirect_post];
    all.extend(routes![
        activities::list,
        activities::new_form,
        activities::create,
        activities::edit_form,
        activities::update,
        activities::delete,
    ]);
    all.extend(routes![
        team::list,
        team::new_form,
        team::create,
        team::edit_form,
        team::update,
        team::delete,
    ]);
    all.extend(routes![pages::list, pages::edit_form, pages::save]);
    all.extend(routes![
        messages::list,
        messages::view,
        messages::reply,
        messages::actions,
    ]);
    all
}
