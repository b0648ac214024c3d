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
use crate::models::team::TeamMemberInput;
use crate::store::selector::Storage;

#[derive(FromForm)]
pub struct TeamForm<'r> {
    pub name: String,
    pub role: String,
    pub email: String,
    pub phone: String,
    pub bio: String,
    pub display_order: Option<i64>,
    pub status: String,
    pub image: Option<TempFile<'r>>,
}

impl TeamForm<'_> {
    fn to_input(&self) -> TeamMemberInput {
        TeamMemberInput {
            name: self.name.clone(),
            role: self.role.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            bio: self.bio.clone(),
            image: None,
            display_order: self.display_order.unwrap_or(0),
            status: self.status.clone(),
        }
    }

    fn echo(&self) -> serde_json::Value {
        json!({
            "name": self.name,
            "role": self.role,
            "email": self.email,
            "phone": self.phone,
            "bio": self.bio,
            "display_order": self.display_order.unwrap_or(0),
            "status": self.status,
        })
    }
}

#[get("/team")]
pub fn list(cfg: &State<Config>, session: AdminSession) -> Template {
    let storage = Storage::open(cfg, RunMode::Interactive);
    let (members, available) = match storage.primary().and_then(|s| s.team_list(false)) {
        Ok(m) => (m, true),
        Err(_) => (Vec::new(), false),
    };
    render_admin(
        "admin/team/list",
        cfg,
        &session,
        "team",
        json!({ "members": members, "primary_available": available }),
    )
}

#[get("/team/new")]
pub fn new_form(cfg: &State<Config>, session: AdminSession) -> Template {
    render_admin(
        "admin/team/form",
        cfg,
        &session,
        "team",
        json!({ "member": null, "errors": Vec::<String>::new() }),
    )
}

#[post("/team", data = "<form>")]
pub async fn create(
    cfg: &State<Config>,
    session: AdminSession,
    mut form: Form<TeamForm<'_>>,
) -> Result<Redirect, Template> {
    let mut input = form.to_input();
    let mut errors = input.validate();

    if errors.is_empty() {
        if let Some(ref mut file) = form.image {
            if file.len() > 0 {
                match images::save_upload(file, "team", &cfg.upload_dir).await {
                    Ok(filename) => input.image = Some(filename),
                    Err(e) => errors.push(e),
                }
            }
        }
    }

    if errors.is_empty() {
        let storage = Storage::open(cfg, RunMode::Interactive);
        match storage.primary().and_then(|s| s.team_insert(&input)) {
            Ok(id) => {
                log::info!("team member {} created by {}", id, session.username);
                return Ok(Redirect::to("/admin/team"));
            }
            Err(e) => errors.push(format!("Could not save the team member: {}", e)),
        }
    }

    Err(render_admin(
        "admin/team/form",
        cfg,
        &session,
        "team",
        json!({ "member": form.echo(), "errors": errors }),
    ))
}

#[get("/team/<id>/edit")]
pub fn edit_form(cfg: &State<Config>, session: AdminSession, id: &str) -> Option<Template> {
    let storage = Storage::open(cfg, RunMode::Interactive);
    let member = storage.primary().ok()?.team_find(id).unwrap_or(None)?;
    Some(render_admin(
        "admin/team/form",
        cfg,
        &session,
        "team",
        json!({ "member": member, "errors": Vec::<String>::new() }),
    ))
}

#[post("/team/<id>", data = "<form>")]
pub async fn update(
    cfg: &State<Config>,
    session: AdminSession,
    id: &str,
    mut form: Form<TeamForm<'_>>,
) -> Result<Redirect, Template> {
    let storage = Storage::open(cfg, RunMode::Interactive);
    let existing = match storage.primary().and_then(|s| s.team_find(id)) {
        Ok(Some(m)) => m,
        _ => return Ok(Redirect::to("/admin/team")),
    };

    let mut input = form.to_input();
    let mut errors = input.validate();

    if errors.is_empty() {
        if let Some(ref mut file) = form.image {
            if file.len() > 0 {
                match images::save_upload(file, "team", &cfg.upload_dir).await {
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
        match storage.primary().and_then(|s| s.team_update(id, &input)) {
            Ok(_) => {
                log::info!("team member {} updated by {}", id, session.username);
                return Ok(Redirect::to("/admin/team"));
            }
            Err(e) => errors.push(format!("Could not save the team member: {}", e)),
        }
    }

    let mut echo = form.echo();
    if let Some(obj) = echo.as_object_mut() {
        obj.insert("id".to_string(), json!(id));
        obj.insert("image".to_string(), json!(existing.image));
    }
    Err(render_admin(
        "admin/team/form",
        cfg,
        &session,
        "team",
        json!({ "member": echo, "errors": errors }),
    ))
}

#[post("/team/<id>/delete")]
pub fn delete(cfg: &State<Config>, session: AdminSession, id: &str) -> Redirect {
    let storage = Storage::open(cfg, RunMode::Interactive);
    if let Ok(store) = storage.primary() {
        let image = store.team_find(id).ok().flatten().and_then(|m| m.image);
        match store.team_delete(id) {
            Ok(result) if result.succeeded => {
                if let Some(ref filename) = image {
                    images::delete_upload(&cfg.upload_dir, filename);
                }
                log::info!("team member {} deleted by {}", id, session.username);
            }
            Ok(_) => {}
            Err(e) => log::warn!("team member delete failed: {}", e),
        }
    }
    Redirect::to("/admin/team")
}
