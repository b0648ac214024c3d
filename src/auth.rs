use chrono::Utc;
use rocket::http::{Cookie, CookieJar, SameSite, Status};
use rocket::request::{FromRequest, Outcome, Request};
use rocket::State;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::models::admin::Administrator;

const SESSION_COOKIE: &str = "hope_session";
const NOTICE_COOKIE: &str = "hope_login_notice";

/// Session payload kept in an encrypted private cookie, so login survives
/// a primary-store outage. `last_activity` drives the inactivity timeout
/// and is refreshed on every guarded request.
#[derive(Debug, Serialize, Deserialize)]
struct SessionData {
    admin_id: String,
    username: String,
    last_activity: i64,
}

/// Guard for the admin area. Requests without a live session forward to
/// the login redirect.
pub struct AdminSession {
    pub admin_id: String,
    pub username: String,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminSession {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let cfg = match request.guard::<&State<Config>>().await {
            Outcome::Success(c) => c,
            _ => return Outcome::Forward(Status::Unauthorized),
        };

        let cookies = request.cookies();
        let raw = match cookies.get_private(SESSION_COOKIE) {
            Some(c) => c.value().to_string(),
            None => return Outcome::Forward(Status::Unauthorized),
        };
        let session: SessionData = match serde_json::from_str(&raw) {
            Ok(s) => s,
            Err(_) => {
                clear_session(cookies);
                return Outcome::Forward(Status::Unauthorized);
            }
        };

        let now = Utc::now().timestamp();
        let idle = now.saturating_sub(session.last_activity);
        if idle > cfg.session_timeout_secs {
            clear_session(cookies);
            set_notice(cookies, "timeout");
            return Outcome::Forward(Status::Unauthorized);
        }

        // sliding expiry
        write_session(
            cookies,
            &SessionData {
                admin_id: session.admin_id.clone(),
                username: session.username.clone(),
                last_activity: now,
            },
        );

        Outcome::Success(AdminSession {
            admin_id: session.admin_id,
            username: session.username,
        })
    }
}

fn write_session(cookies: &CookieJar<'_>, session: &SessionData) {
    if let Ok(json) = serde_json::to_string(session) {
        let mut cookie = Cookie::new(SESSION_COOKIE, json);
        cookie.set_http_only(true);
        cookie.set_same_site(SameSite::Lax);
        cookie.set_path("/");
        cookies.add_private(cookie);
    }
}

pub fn start_session(cookies: &CookieJar<'_>, admin: &Administrator) {
    write_session(
        cookies,
        &SessionData {
            admin_id: admin.id.clone(),
            username: admin.username.clone(),
            last_activity: Utc::now().timestamp(),
        },
    );
}

pub fn clear_session(cookies: &CookieJar<'_>) {
    cookies.remove_private(Cookie::from(SESSION_COOKIE));
}

/// One-shot notice for the login page ("timeout", "logout"). Plain cookie,
/// consumed on next render.
pub fn set_notice(cookies: &CookieJar<'_>, notice: &str) {
    let mut cookie = Cookie::new(NOTICE_COOKIE, notice.to_string());
    cookie.set_path("/");
    cookies.add(cookie);
}

pub fn take_notice(cookies: &CookieJar<'_>) -> Option<String> {
    let notice = cookies.get(NOTICE_COOKIE).map(|c| c.value().to_string());
    if notice.is_some() {
        cookies.remove(Cookie::from(NOTICE_COOKIE));
    }
    notice
}

pub fn hash_password(password: &str) -> Result<String, String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|e| e.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let hash = hash_password("s3cret").unwrap();
        assert!(verify_password("s3cret", &hash));
        assert!(!verify_password("other", &hash));
    }

    #[test]
    fn session_data_serializes_compactly() {
        let data = SessionData {
            admin_id: "abc".to_string(),
            username: "admin".to_string(),
            last_activity: 1_700_000_000,
        };
        let json = serde_json::to_string(&data).unwrap();
        let back: SessionData = serde_json::from_str(&json).unwrap();
        assert_eq!(back.username, "admin");
        assert_eq!(back.last_activity, 1_700_000_000);
    }
}
