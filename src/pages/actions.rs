//! Form posts behind the like, comment, follow and sign-out controls.

use super::{redirect, return_path, Db};
use crate::context::CurrentUser;
use crate::database::{PhotoDb, UserDb};
use crate::error::AppResult;
use crate::model::{Comment, PhotoId};
use crate::routes;
use actix_identity::Identity;
use actix_web::{web, HttpResponse};
use log::{debug, info};
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct ReturnTo {
    pub next: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CommentParams {
    #[serde(default)]
    pub comment: String,
    pub next: Option<String>,
}

fn back_to_post(next: Option<&str>, photo_id: PhotoId) -> HttpResponse {
    redirect(&format!(
        "{}#post-{}",
        return_path(next, routes::DASHBOARD),
        photo_id
    ))
}

pub async fn like(
    path: web::Path<PhotoId>,
    form: web::Form<ReturnTo>,
    current: CurrentUser,
    db: Db,
) -> AppResult<HttpResponse> {
    let photo_id = path.into_inner();
    let auth = match &current.auth {
        Some(auth) => auth,
        None => return Ok(redirect(routes::LOGIN)),
    };
    let photo = match db.get_photo(photo_id)? {
        Some(photo) => photo,
        None => return Ok(redirect(routes::NOT_FOUND)),
    };
    let toggle_liked = photo.likes.contains(&auth.uid);
    db.update_photo_likes(photo_id, auth.uid, toggle_liked)?;
    debug!(
        "user {} {} photo {}",
        auth.uid,
        if toggle_liked { "unliked" } else { "liked" },
        photo_id
    );
    Ok(back_to_post(form.next.as_deref(), photo_id))
}

pub async fn comment(
    path: web::Path<PhotoId>,
    form: web::Form<CommentParams>,
    current: CurrentUser,
    db: Db,
) -> AppResult<HttpResponse> {
    let photo_id = path.into_inner();
    let form = form.into_inner();
    let auth = match &current.auth {
        Some(auth) => auth,
        None => return Ok(redirect(routes::LOGIN)),
    };
    if form.comment.is_empty() {
        debug!("empty comment on photo {} ignored", photo_id);
        return Ok(back_to_post(form.next.as_deref(), photo_id));
    }
    let comment = Comment {
        display_name: auth.display_name.clone(),
        comment: form.comment,
    };
    if db.add_comment(photo_id, comment)?.is_none() {
        return Ok(redirect(routes::NOT_FOUND));
    }
    Ok(back_to_post(form.next.as_deref(), photo_id))
}

pub async fn follow(
    path: web::Path<String>,
    form: web::Form<ReturnTo>,
    current: CurrentUser,
    db: Db,
) -> AppResult<HttpResponse> {
    let username = path.into_inner();
    let viewer = match current.profile() {
        Some((_, viewer)) => viewer,
        None => return Ok(redirect(routes::LOGIN)),
    };
    let profile = match db.get_user_by_username(&username)? {
        Some(profile) => profile,
        None => return Ok(redirect(routes::NOT_FOUND)),
    };
    let back = return_path(form.next.as_deref(), &routes::profile(&profile.username));
    if profile.user_id == viewer.user_id {
        return Ok(redirect(&back));
    }
    let is_following = db.is_user_following_profile(&viewer.username, profile.user_id)?;
    db.toggle_follow(is_following, viewer.user_id, profile.user_id)?;
    info!(
        "{} {} {}",
        viewer.username,
        if is_following { "unfollowed" } else { "followed" },
        profile.username
    );
    Ok(redirect(&back))
}

pub async fn logout(id: Identity) -> HttpResponse {
    id.forget();
    redirect(routes::LOGIN)
}
