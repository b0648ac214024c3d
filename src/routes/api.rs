use chrono::Utc;
use rocket::serde::json::Json;
use rocket::State;
use serde_json::{json, Value};

use crate::config::Config;
use crate::db::RunMode;
use crate::store::selector::Storage;

/// Liveness probe. Reports whether the primary store answered within the
/// interactive budget; the process itself is healthy either way.
#[get("/health")]
pub fn health(cfg: &State<Config>) -> Json<Value> {
    let storage = Storage::open(cfg, RunMode::Interactive);
    let mongodb = if storage.primary_available() {
        "connected"
    } else {
        "disconnected"
    };
    let fallback = if cfg.production { "disabled" } else { "available" };

    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "environment": if cfg.production { "production" } else { "development" },
        "services": {
            "mongodb": mongodb,
            "file_fallback": fallback,
        },
    }))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![health]
}
