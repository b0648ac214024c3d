use rocket::form::Form;
use rocket::http::CookieJar;
use rocket::response::Redirect;
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use crate::auth::{self, AdminSession};
use crate::config::Config;
use crate::db::RunMode;
use crate::models::admin::LoginForm;
use crate::store::selector::Storage;

fn login_context(cfg: &Config, error: Option<String>, notice: Option<String>) -> serde_json::Value {
    json!({
        "site_name": cfg.site_name,
        "error": error,
        "notice": notice,
    })
}

#[get("/login")]
pub fn login_page(
    cfg: &State<Config>,
    cookies: &CookieJar<'_>,
    session: Option<AdminSession>,
) -> Result<Redirect, Template> {
    if session.is_some() {
        return Ok(Redirect::to("/admin"));
    }
    let notice = auth::take_notice(cookies).map(|n| match n.as_str() {
        "timeout" => "Your session expired. Please sign in again.".to_string(),
        "logout" => "You have been signed out.".to_string(),
        other => other.to_string(),
    });
    Err(Template::render(
        "admin/login",
        login_context(cfg, None, notice),
    ))
}

#[post("/login", data = "<form>")]
pub fn login_submit(
    cfg: &State<Config>,
    cookies: &CookieJar<'_>,
    form: Form<LoginForm>,
) -> Result<Redirect, Template> {
    if let Some(error) = form.validate() {
        return Err(Template::render(
            "admin/login",
            login_context(cfg, Some(error), None),
        ));
    }

    let storage = Storage::open(cfg, RunMode::Interactive);
    match storage.authenticate_admin(form.username.trim(), &form.password) {
        Some(admin) => {
            log::info!("administrator '{}' signed in", admin.username);
            auth::start_session(cookies, &admin);
            Ok(Redirect::to("/admin"))
        }
        None => Err(Template::render(
            "admin/login",
            login_context(cfg, Some("Invalid username or password.".to_string()), None),
        )),
    }
}

#[get("/logout")]
pub fn logout(cookies: &CookieJar<'_>) -> Redirect {
    auth::clear_session(cookies);
    auth::set_notice(cookies, "logout");
    Redirect::to("/admin/login")
}

pub fn routes() -> Vec<rocket::Route> {
    routes![login_page, login_submit, logout]
}
