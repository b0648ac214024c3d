use chrono::Utc;
use rocket::form::Form;
use rocket::response::Redirect;
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use crate::config::Config;
use crate::db::RunMode;
use crate::models::contact::{ContactForm, ContactMessage};
use crate::models::page::Page;
use crate::store::selector::Storage;

use super::ClientMeta;

const ACTIVITIES_PER_PAGE: usize = 9;

/// Template-facing view of an activity with its display fields resolved.
fn activity_view(a: &crate::models::activity::Activity) -> serde_json::Value {
    json!({
        "id": a.id,
        "title": a.title,
        "excerpt": a.excerpt(200),
        "content": a.content,
        "image": a.image,
        "date": a.display_date(),
    })
}

fn page_or_default(storage: &Storage, name: &str, default_title: &str) -> serde_json::Value {
    let page: Option<Page> = storage
        .primary()
        .and_then(|s| s.page_find(name))
        .unwrap_or(None);
    match page {
        Some(p) => json!({ "title": p.title, "content": p.content }),
        None => json!({ "title": default_title, "content": "" }),
    }
}

// ── Homepage ───────────────────────────────────────────

#[get("/")]
pub fn home(cfg: &State<Config>) -> Template {
    let storage = Storage::open(cfg, RunMode::Interactive);
    let page = page_or_default(&storage, "home", &cfg.site_name);
    let recent: Vec<serde_json::Value> = storage
        .primary()
        .and_then(|s| s.activity_list(Some("published"), 3, 0))
        .unwrap_or_default()
        .iter()
        .map(activity_view)
        .collect();

    Template::render(
        "public/home",
        json!({
            "site_name": cfg.site_name,
            "page": page,
            "recent_activities": recent,
            "page_type": "home",
        }),
    )
}

#[get("/about")]
pub fn about(cfg: &State<Config>) -> Template {
    let storage = Storage::open(cfg, RunMode::Interactive);
    let members = storage
        .primary()
        .and_then(|s| s.team_list(true))
        .unwrap_or_default();
    Template::render(
        "public/about",
        json!({
            "site_name": cfg.site_name,
            "page": page_or_default(&storage, "about", "About Us"),
            "members": members,
            "page_type": "about",
        }),
    )
}

// ── Activities ─────────────────────────────────────────

#[get("/activities?<page>")]
pub fn activities(cfg: &State<Config>, page: Option<usize>) -> Template {
    let storage = Storage::open(cfg, RunMode::Interactive);
    let (current, skip) = super::page_skip(page, ACTIVITIES_PER_PAGE);

    let (items, total) = match storage.primary() {
        Ok(store) => {
            let items = store
                .activity_list(Some("published"), ACTIVITIES_PER_PAGE as i64, skip)
                .unwrap_or_default();
            let total = store.activity_count(Some("published")).unwrap_or(0) as usize;
            (items, total)
        }
        Err(_) => (Vec::new(), 0),
    };
    let total_pages = total.div_ceil(ACTIVITIES_PER_PAGE).max(1);
    let views: Vec<serde_json::Value> = items.iter().map(activity_view).collect();

    Template::render(
        "public/activities",
        json!({
            "site_name": cfg.site_name,
            "activities": views,
            "current_page": current,
            "total_pages": total_pages,
            "page_type": "activities",
        }),
    )
}

#[get("/activities/<id>")]
pub fn activity_detail(cfg: &State<Config>, id: &str) -> Option<Template> {
    let storage = Storage::open(cfg, RunMode::Interactive);
    // invalid ids and drafts both 404 rather than erroring
    let activity = storage
        .primary()
        .ok()?
        .activity_find(id, true)
        .unwrap_or(None)?;

    Some(Template::render(
        "public/activity_detail",
        json!({
            "site_name": cfg.site_name,
            "activity": activity_view(&activity),
            "page_type": "activities",
        }),
    ))
}

// ── Team ───────────────────────────────────────────────

#[get("/team")]
pub fn team(cfg: &State<Config>) -> Template {
    let storage = Storage::open(cfg, RunMode::Interactive);
    let members = storage
        .primary()
        .and_then(|s| s.team_list(true))
        .unwrap_or_default();

    Template::render(
        "public/team",
        json!({
            "site_name": cfg.site_name,
            "members": members,
            "page_type": "team",
        }),
    )
}

// ── Contact ────────────────────────────────────────────

#[get("/contact?<success>")]
pub fn contact(cfg: &State<Config>, success: Option<u8>) -> Template {
    let storage = Storage::open(cfg, RunMode::Interactive);
    Template::render(
        "public/contact",
        json!({
            "site_name": cfg.site_name,
            "page": page_or_default(&storage, "contact", "Contact Us"),
            "success": success == Some(1),
            "errors": Vec::<String>::new(),
            "form": {},
            "page_type": "contact",
        }),
    )
}

#[post("/contact", data = "<form>")]
pub fn contact_submit(
    cfg: &State<Config>,
    form: Form<ContactForm>,
    meta: ClientMeta,
) -> Result<Redirect, Template> {
    let storage = Storage::open(cfg, RunMode::Interactive);

    // honeypot hits look like success to the bot
    if form.is_bot() {
        return Ok(Redirect::to("/contact?success=1"));
    }

    let errors = form.validate();
    if !errors.is_empty() {
        return Err(render_contact_errors(cfg, &storage, &form, errors));
    }

    let message = ContactMessage {
        id: uuid::Uuid::new_v4().simple().to_string(),
        name: form.name.trim().to_string(),
        email: form.email.trim().to_string(),
        subject: form.subject.trim().to_string(),
        message: form.message.trim().to_string(),
        status: "unread".to_string(),
        created_at: Utc::now().naive_utc(),
        ip_address: meta.ip,
        user_agent: meta.user_agent,
        reply_message: None,
        replied_by: None,
        replied_at: None,
        from_fallback: false,
    };

    match storage.submit_message(&message) {
        Ok(_) => Ok(Redirect::to("/contact?success=1")),
        Err(e) => {
            log::error!("contact submission failed: {}", e);
            let errors =
                vec!["Sorry, we could not send your message right now. Please try again later."
                    .to_string()];
            Err(render_contact_errors(cfg, &storage, &form, errors))
        }
    }
}

fn render_contact_errors(
    cfg: &Config,
    storage: &Storage,
    form: &ContactForm,
    errors: Vec<String>,
) -> Template {
    Template::render(
        "public/contact",
        json!({
            "site_name": cfg.site_name,
            "page": page_or_default(storage, "contact", "Contact Us"),
            "success": false,
            "errors": errors,
            "form": {
                "name": form.name,
                "email": form.email,
                "subject": form.subject,
                "message": form.message,
            },
            "page_type": "contact",
        }),
    )
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        home,
        about,
        activities,
        activity_detail,
        team,
        contact,
        contact_submit,
    ]
}
