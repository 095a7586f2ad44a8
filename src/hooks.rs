//! Loaders that pages call to fill their state before rendering.

use crate::database::{PhotoDb, TimelinePhoto, UserDb};
use crate::error::DbError;
use crate::model::{User, UserId};

/// The user with `user_id`, or the empty record when the id is absent or has
/// no match. No request is made for an absent id.
pub fn use_user(db: &sled::Db, user_id: Option<UserId>) -> Result<User, DbError> {
    match user_id {
        Some(user_id) => Ok(db.get_user_by_user_id(user_id)?.unwrap_or_default()),
        None => Ok(User::default()),
    }
}

/// Timeline of everyone `user` follows, newest first.
pub fn use_photos(db: &sled::Db, user: &User) -> Result<Vec<TimelinePhoto>, DbError> {
    if user.following.is_empty() {
        return Ok(Vec::new());
    }
    let mut photos = db.get_photos(user.user_id, &user.following)?;
    photos.sort_by(|a, b| b.photo.date_created.cmp(&a.photo.date_created));
    Ok(photos)
}
