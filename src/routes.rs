use crate::pages::{actions, dashboard, login, not_found, profile, sign_up};
use actix_web::web;

pub const DASHBOARD: &str = "/";
pub const LOGIN: &str = "/login";
pub const SIGN_UP: &str = "/signup";
pub const PROFILE: &str = "/p/{username}";
pub const NOT_FOUND: &str = "/not-found";
pub const LOGOUT: &str = "/logout";

pub fn profile(username: &str) -> String {
    format!("/p/{}", username)
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route(DASHBOARD, web::get().to(dashboard::dashboard))
        .route(LOGIN, web::get().to(login::login))
        .route(LOGIN, web::post().to(login::login_post))
        .route(SIGN_UP, web::get().to(sign_up::sign_up))
        .route(SIGN_UP, web::post().to(sign_up::sign_up_post))
        .route(PROFILE, web::get().to(profile::profile))
        .route("/p/{username}/follow", web::post().to(actions::follow))
        .route("/photos/{photo_id}/like", web::post().to(actions::like))
        .route("/photos/{photo_id}/comments", web::post().to(actions::comment))
        .route(NOT_FOUND, web::get().to(not_found::not_found))
        .route(LOGOUT, web::post().to(actions::logout));
}
