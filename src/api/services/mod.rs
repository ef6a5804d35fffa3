pub mod fallback;
pub mod helpers;
pub mod info;
pub mod links;
pub mod redirect;

pub use fallback::FallbackPage;
pub use info::info_routes;
pub use links::links_routes;
pub use redirect::{RedirectService, redirect_routes};

use actix_web::web;

/// Register every route; the catch-all redirect goes last.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(info_routes())
        .service(links_routes())
        .service(redirect_routes());
}
