pub mod actions;
pub mod dashboard;
pub mod login;
pub mod not_found;
pub mod profile;
pub mod sign_up;

use crate::config::Config;
use crate::context::CurrentUser;
use crate::database::TimelinePhoto;
use crate::error::AppResult;
use crate::model::{Comment, PhotoId};
use actix_web::{http::header, web, HttpResponse};
use chrono::Duration;
use serde::Serialize;

pub type Tera = web::Data<tera::Tera>;
pub type Db = web::Data<sled::Db>;
pub type Settings = web::Data<Config>;

/// Comments shown under a post before the "View all" link.
const VISIBLE_COMMENTS: usize = 3;

pub fn render(tera: &tera::Tera, name: &str, ctx: &tera::Context) -> AppResult<HttpResponse> {
    let body = tera.render(name, ctx)?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body))
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Where a form wants to land after it is handled. Only same-site paths are
/// honoured.
pub fn return_path(next: Option<&str>, fallback: &str) -> String {
    match next {
        Some(next) if next.starts_with('/') && !next.starts_with("//") => next.to_owned(),
        _ => fallback.to_owned(),
    }
}

/// Header controls. Only a visitor with a user document gets the signed-in
/// header; links use the stored username, the avatar alt the display name.
#[derive(Serialize, Debug)]
pub struct HeaderView {
    pub signed_in: bool,
    pub display_name: String,
    pub username: String,
}

impl HeaderView {
    pub fn new(current: &CurrentUser) -> Self {
        match current.profile() {
            Some((auth, user)) => Self {
                signed_in: true,
                display_name: auth.display_name.clone(),
                username: user.username.clone(),
            },
            None => Self {
                signed_in: false,
                display_name: String::new(),
                username: String::new(),
            },
        }
    }
}

pub fn page_context(title: &str, current: &CurrentUser) -> tera::Context {
    let mut ctx = tera::Context::new();
    ctx.insert("title", title);
    ctx.insert("header", &HeaderView::new(current));
    ctx
}

#[derive(Serialize, Debug)]
pub struct PostView {
    pub photo_id: PhotoId,
    pub username: String,
    pub image_src: String,
    pub caption: String,
    pub likes_count: usize,
    pub user_liked_photo: bool,
    pub comments: Vec<Comment>,
    pub comments_count: usize,
    pub show_all_comments_link: bool,
    pub posted_ago: String,
}

impl PostView {
    pub fn new(entry: TimelinePhoto, now_millis: i64) -> Self {
        let TimelinePhoto {
            photo,
            username,
            user_liked_photo,
        } = entry;
        let comments_count = photo.comments.len();
        Self {
            photo_id: photo.photo_id,
            username,
            image_src: photo.image_src,
            caption: photo.caption,
            likes_count: photo.likes.len(),
            user_liked_photo,
            comments: photo.comments.into_iter().take(VISIBLE_COMMENTS).collect(),
            comments_count,
            show_all_comments_link: comments_count >= VISIBLE_COMMENTS,
            posted_ago: format!("{} ago", format_distance(now_millis - photo.date_created)),
        }
    }
}

/// Rough human distance for an elapsed time in milliseconds ("3 days").
pub fn format_distance(elapsed_millis: i64) -> String {
    let elapsed = Duration::milliseconds(elapsed_millis.max(0));
    let seconds = elapsed.num_seconds();
    let minutes = (seconds as f64 / 60.0).round() as i64;
    let plural = |n: i64, unit: &str| {
        if n == 1 {
            format!("1 {}", unit)
        } else {
            format!("{} {}s", n, unit)
        }
    };
    let ratio = |unit_minutes: i64| (minutes as f64 / unit_minutes as f64).round() as i64;

    if seconds < 30 {
        "less than a minute".to_owned()
    } else if minutes < 45 {
        plural(minutes.max(1), "minute")
    } else if minutes < 90 {
        "about 1 hour".to_owned()
    } else if minutes < 1440 {
        format!("about {}", plural(ratio(60), "hour"))
    } else if minutes < 2520 {
        "1 day".to_owned()
    } else if minutes < 43_200 {
        plural(ratio(1440), "day")
    } else if minutes < 86_400 {
        format!("about {}", plural(ratio(43_200), "month"))
    } else if minutes < 525_600 {
        plural(ratio(43_200), "month")
    } else {
        format!("about {}", plural(ratio(525_600), "year"))
    }
}
