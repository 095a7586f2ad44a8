use super::{page_context, Tera};
use crate::context::CurrentUser;
use crate::error::AppResult;
use actix_web::{http::StatusCode, HttpResponse};

fn render_not_found(
    tera: &tera::Tera,
    current: &CurrentUser,
    status: StatusCode,
) -> AppResult<HttpResponse> {
    let ctx = page_context("Not Found - Instagram", current);
    let body = tera.render("not_found.html", &ctx)?;
    Ok(HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(body))
}

pub async fn not_found(current: CurrentUser, tera: Tera) -> AppResult<HttpResponse> {
    render_not_found(&tera, &current, StatusCode::OK)
}

/// Default service for routes nothing else matched.
pub async fn fallback(current: CurrentUser, tera: Tera) -> AppResult<HttpResponse> {
    render_not_found(&tera, &current, StatusCode::NOT_FOUND)
}
