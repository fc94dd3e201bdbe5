use actix_web::{web, HttpResponse, Responder};

pub fn config_public(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(root_handler));
}

pub fn config_api(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(is_server_active));
}

async fn root_handler() -> impl Responder {
    HttpResponse::Ok().content_type("text/plain").body("Video handoff backend is running")
}

async fn is_server_active() -> impl Responder {
    HttpResponse::Ok().body("active")
}
