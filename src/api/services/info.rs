use actix_web::{HttpResponse, web};
use serde_json::json;

pub const TAGLINE: &str = "Ladle, uhghghggh";

/// `GET /`
pub async fn service_info() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "tagline": TAGLINE }))
}

pub fn info_routes() -> actix_web::Resource {
    web::resource("/").route(web::get().to(service_info))
}
