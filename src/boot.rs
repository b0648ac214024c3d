use log::{error, info, warn};
use std::fs;
use std::path::Path;
use std::process;

use crate::config::Config;
use crate::db::RunMode;
use crate::store::selector::Storage;

/// Required directories that will be created if missing
const REQUIRED_DIRS: &[&str] = &[
    "data",
    "data/contact_messages",
    "data/admin",
    "website",
    "website/uploads",
    "website/static",
    "website/static/css",
    "website/templates",
    "website/templates/public",
    "website/templates/admin",
];

/// Critical template files — server cannot function without these
const CRITICAL_TEMPLATES: &[&str] = &[
    "website/templates/public/base.html.tera",
    "website/templates/public/home.html.tera",
    "website/templates/admin/base.html.tera",
    "website/templates/admin/login.html.tera",
    "website/templates/admin/dashboard.html.tera",
];

/// Run all boot checks, then prepare the primary store (indexes, seed
/// data) if it is reachable. Call this before Rocket launches. Creates
/// missing directories, warns about degraded features, and aborts on
/// errors nothing can run without.
pub fn run(cfg: &Config) {
    info!("boot check starting...");

    let mut warnings = 0u32;
    let mut errors = 0u32;

    // ── 1. Directories ─────────────────────────────────
    for dir in REQUIRED_DIRS {
        let path = Path::new(dir);
        if !path.exists() {
            match fs::create_dir_all(path) {
                Ok(_) => info!("  created directory: {}", dir),
                Err(e) => {
                    error!("  FAILED to create directory {}: {}", dir, e);
                    errors += 1;
                }
            }
        }
    }

    // ── 2. Critical templates ──────────────────────────
    for file in CRITICAL_TEMPLATES {
        if !Path::new(file).exists() {
            error!("  MISSING critical template: {}", file);
            errors += 1;
        }
    }

    // ── 3. Fallback directories writable ────────────────
    for dir in [cfg.data_dir.join("contact_messages"), cfg.data_dir.join("admin")] {
        if dir.exists() {
            let test_file = dir.join(".write_test");
            match fs::write(&test_file, "test") {
                Ok(_) => {
                    let _ = fs::remove_file(&test_file);
                }
                Err(e) => {
                    error!("  fallback directory {} not writable: {}", dir.display(), e);
                    errors += 1;
                }
            }
        }
    }

    // ── 4. Uploads directory writable ───────────────────
    if cfg.upload_dir.exists() {
        let test_file = cfg.upload_dir.join(".write_test");
        match fs::write(&test_file, "test") {
            Ok(_) => {
                let _ = fs::remove_file(&test_file);
            }
            Err(e) => {
                warn!("  uploads directory not writable: {} (image uploads will fail)", e);
                warnings += 1;
            }
        }
    }

    // ── 5. Rocket.toml exists ───────────────────────────
    if !Path::new("Rocket.toml").exists() {
        warn!("  Rocket.toml not found — using default config");
        warnings += 1;
    }

    if errors > 0 {
        error!(
            "boot check FAILED: {} error(s), {} warning(s), aborting",
            errors, warnings
        );
        process::exit(1);
    }
    if warnings > 0 {
        warn!("boot check passed with {} warning(s)", warnings);
    } else {
        info!("boot check passed");
    }

    // ── 6. Primary store preparation ────────────────────
    // Batch mode: boot tolerates a slow or absent database and carries on
    // degraded rather than delaying forever.
    let storage = Storage::open(cfg, RunMode::Batch);
    match storage.primary() {
        Ok(store) => {
            if let Err(e) = store.ensure_indexes() {
                warn!("index creation failed: {}", e);
            }
            if let Err(e) = store.seed_defaults() {
                warn!("seed data failed: {}", e);
            }
            info!("primary store ready");
        }
        Err(_) => {
            if cfg.production {
                warn!("primary store unreachable at boot; running degraded");
            } else {
                warn!("primary store unreachable at boot; file fallback active");
            }
        }
    }
}
