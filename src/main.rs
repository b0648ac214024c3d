#[macro_use]
extern crate rocket;

use rocket::fairing::{Fairing, Info, Kind};
use rocket::fs::FileServer;
use rocket::http::Header;
use rocket::response::content::RawHtml;
use rocket_dyn_templates::Template;

mod auth;
mod boot;
mod config;
mod db;
mod images;
mod models;
mod routes;
mod store;

use config::Config;

/// Admin pages carry session-dependent content and must never be cached.
pub struct NoCacheAdmin;

#[rocket::async_trait]
impl Fairing for NoCacheAdmin {
    fn info(&self) -> Info {
        Info {
            name: "No-Cache Admin Pages",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, req: &'r rocket::Request<'_>, res: &mut rocket::Response<'r>) {
        if req.uri().path().starts_with("/admin") {
            res.set_header(Header::new(
                "Cache-Control",
                "no-store, no-cache, must-revalidate, max-age=0",
            ));
            res.set_header(Header::new("Pragma", "no-cache"));
        }
    }
}

#[catch(404)]
fn not_found() -> RawHtml<String> {
    RawHtml("<html><body style='font-family:sans-serif;text-align:center;padding:80px'><h1>404</h1><p>Page not found.</p><a href='/'>← Home</a></body></html>".to_string())
}

#[catch(500)]
fn server_error() -> RawHtml<String> {
    RawHtml("<html><body style='font-family:sans-serif;text-align:center;padding:80px'><h1>500</h1><p>Something went wrong on our end.</p><a href='/'>← Home</a></body></html>".to_string())
}

#[launch]
fn rocket() -> _ {
    env_logger::init();

    let cfg = Config::from_env();

    // Boot check — verify/create directories, prepare the primary store
    // if it answers within the batch budget
    boot::run(&cfg);

    rocket::build()
        .manage(cfg)
        .attach(Template::fairing())
        .attach(NoCacheAdmin)
        .mount("/static", FileServer::from("website/static"))
        .mount("/uploads", FileServer::from("website/uploads"))
        .mount("/", routes::public::routes())
        .mount("/admin", routes::auth::routes())
        .mount("/admin", routes::admin::routes())
        .mount("/api", routes::api::routes())
        .register("/", catchers![not_found, server_error])
}
