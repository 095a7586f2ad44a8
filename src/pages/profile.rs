use super::{page_context, redirect, render, Db, Tera};
use crate::context::CurrentUser;
use crate::database::{PhotoDb, UserDb};
use crate::error::AppResult;
use crate::model::PhotoId;
use crate::routes;
use actix_web::{web, HttpResponse};
use log::debug;
use serde::Serialize;

#[derive(Serialize, Debug)]
struct ProfileHeader {
    username: String,
    full_name: String,
    photos_count: usize,
    followers_count: usize,
    following_count: usize,
    show_follow_button: bool,
    is_following: bool,
}

#[derive(Serialize, Debug)]
struct GridPhoto {
    photo_id: PhotoId,
    image_src: String,
    caption: String,
    likes_count: usize,
    comments_count: usize,
}

pub async fn profile(
    path: web::Path<String>,
    current: CurrentUser,
    db: Db,
    tera: Tera,
) -> AppResult<HttpResponse> {
    let username = path.into_inner();
    let profile = match db.get_user_by_username(&username)? {
        Some(profile) => profile,
        None => {
            debug!("no profile for {}", username);
            return Ok(redirect(routes::NOT_FOUND));
        }
    };

    let mut photos = db.get_user_photos_by_user_id(profile.user_id)?;
    photos.sort_by(|a, b| b.date_created.cmp(&a.date_created));

    let (show_follow_button, is_following) = match current.profile() {
        Some((_, viewer)) if viewer.user_id != profile.user_id => (
            true,
            db.is_user_following_profile(&viewer.username, profile.user_id)?,
        ),
        _ => (false, false),
    };

    let header = ProfileHeader {
        photos_count: photos.len(),
        followers_count: profile.followers.len(),
        following_count: profile.following.len(),
        show_follow_button,
        is_following,
        username: profile.username,
        full_name: profile.full_name,
    };
    let grid = photos
        .into_iter()
        .map(|photo| GridPhoto {
            photo_id: photo.photo_id,
            likes_count: photo.likes.len(),
            comments_count: photo.comments.len(),
            image_src: photo.image_src,
            caption: photo.caption,
        })
        .collect::<Vec<_>>();

    let mut ctx = page_context(&format!("{} - Instagram", header.username), &current);
    ctx.insert("profile", &header);
    ctx.insert("photos", &grid);
    render(&tera, "profile.html", &ctx)
}
