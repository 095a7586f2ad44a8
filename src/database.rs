use crate::config::StorageConfig;
use crate::error::DbError;
use crate::model::*;
use serde::{de::DeserializeOwned, Serialize};
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionError, Transactional,
};

/// Number of users read when looking for profiles to suggest.
pub const SUGGESTED_PROFILES_LIMIT: usize = 10;

pub fn open(config: &StorageConfig) -> sled::Result<sled::Db> {
    match &config.path {
        Some(path) => sled::Config::new().path(path).open(),
        None => sled::Config::new().temporary(true).open(),
    }
}

pub(crate) fn serialize_id(id: u64) -> [u8; 8] {
    id.to_le_bytes()
}

pub(crate) fn deserialize_id<V: AsRef<[u8]>>(id: V, index: &'static str) -> Result<u64, DbError> {
    use std::convert::TryInto;
    let bytes: [u8; 8] = id
        .as_ref()
        .try_into()
        .map_err(|_| DbError::BadIndex(index))?;
    Ok(u64::from_le_bytes(bytes))
}

pub(crate) fn get_document<T: DeserializeOwned>(
    tree: &sled::Tree,
    id: u64,
) -> Result<Option<T>, DbError> {
    match tree.get(serialize_id(id))? {
        Some(raw) => Ok(Some(bincode::deserialize(&raw)?)),
        None => Ok(None),
    }
}

fn abort<E: Into<DbError>>(err: E) -> ConflictableTransactionError<DbError> {
    ConflictableTransactionError::Abort(err.into())
}

fn unwrap_transaction(err: TransactionError<DbError>) -> DbError {
    match err {
        TransactionError::Abort(e) => e,
        TransactionError::Storage(e) => e.into(),
    }
}

/// Read-modify-write of a single document inside one transaction. Returns the
/// updated document, or `None` when no document has that id.
pub(crate) fn update_document<T, F>(tree: &sled::Tree, id: u64, f: F) -> Result<Option<T>, DbError>
where
    T: Serialize + DeserializeOwned,
    F: Fn(&mut T),
{
    let key = serialize_id(id);
    tree.transaction(|tx| -> ConflictableTransactionResult<Option<T>, DbError> {
        let raw = match tx.get(&key[..])? {
            Some(raw) => raw,
            None => return Ok(None),
        };
        let mut doc: T = bincode::deserialize(&raw).map_err(abort)?;
        f(&mut doc);
        tx.insert(&key[..], bincode::serialize(&doc).map_err(abort)?)?;
        Ok(Some(doc))
    })
    .map_err(unwrap_transaction)
}

fn scan<T: DeserializeOwned>(tree: &sled::Tree) -> impl Iterator<Item = Result<T, DbError>> {
    tree.iter()
        .values()
        .map(|raw| -> Result<T, DbError> { Ok(bincode::deserialize(&raw?)?) })
}

/// Set-like updates of id lists, applied inside a document transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldUpdate {
    ArrayUnion(u64),
    ArrayRemove(u64),
}

impl FieldUpdate {
    /// Removes `id` if it is currently present, adds it otherwise.
    pub fn toggle(id: u64, currently_present: bool) -> Self {
        if currently_present {
            FieldUpdate::ArrayRemove(id)
        } else {
            FieldUpdate::ArrayUnion(id)
        }
    }

    pub fn apply(self, ids: &mut Vec<u64>) {
        match self {
            FieldUpdate::ArrayUnion(id) => {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
            FieldUpdate::ArrayRemove(id) => ids.retain(|existing| *existing != id),
        }
    }
}

pub trait UserDb {
    /// Stores `user` under its own `user_id`. Returns `false` without writing
    /// anything when the username is already taken.
    fn add_user(&self, user: &User) -> Result<bool, DbError>;
    fn get_user_by_user_id(&self, user_id: UserId) -> Result<Option<User>, DbError>;
    fn get_user_by_username(&self, username: &str) -> Result<Option<User>, DbError>;
    fn does_username_exist(&self, username: &str) -> Result<bool, DbError>;
    fn is_user_following_profile(
        &self,
        logged_in_username: &str,
        profile_user_id: UserId,
    ) -> Result<bool, DbError>;
    fn get_suggested_profiles(
        &self,
        user_id: UserId,
        following: &[UserId],
    ) -> Result<Vec<User>, DbError>;
    fn update_logged_in_user_following(
        &self,
        logged_in_user_id: UserId,
        profile_id: UserId,
        is_following_profile: bool,
    ) -> Result<Option<User>, DbError>;
    fn update_followed_user_followers(
        &self,
        profile_id: UserId,
        logged_in_user_id: UserId,
        is_following_profile: bool,
    ) -> Result<Option<User>, DbError>;
    fn toggle_follow(
        &self,
        is_following_profile: bool,
        active_user_id: UserId,
        profile_user_id: UserId,
    ) -> Result<(), DbError>;
}

pub(crate) const USERS: &[u8] = b"users";
pub(crate) const USERS_USERNAME: &[u8] = b"USERS_USERNAME";

impl UserDb for sled::Db {
    fn add_user(&self, user: &User) -> Result<bool, DbError> {
        let users = self.open_tree(USERS)?;
        let users_username = self.open_tree(USERS_USERNAME)?;
        let id = serialize_id(user.user_id);
        let encoded = bincode::serialize(user)?;
        let result = (&users, &users_username).transaction(
            |(users, users_username)| -> ConflictableTransactionResult<(), ()> {
                if users_username
                    .insert(user.username.as_bytes(), &id[..])?
                    .is_some()
                {
                    return Err(ConflictableTransactionError::Abort(()));
                }
                users.insert(&id[..], encoded.clone())?;
                Ok(())
            },
        );
        match result {
            Ok(()) => Ok(true),
            Err(TransactionError::Abort(())) => Ok(false),
            Err(TransactionError::Storage(e)) => Err(e.into()),
        }
    }

    fn get_user_by_user_id(&self, user_id: UserId) -> Result<Option<User>, DbError> {
        get_document(&self.open_tree(USERS)?, user_id)
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>, DbError> {
        let users_username = self.open_tree(USERS_USERNAME)?;
        let users = self.open_tree(USERS)?;
        match users_username.get(username.to_lowercase())? {
            Some(id) => {
                let raw = users.get(&id)?.ok_or(DbError::BadIndex("users_username"))?;
                Ok(Some(bincode::deserialize(&raw)?))
            }
            None => Ok(None),
        }
    }

    fn does_username_exist(&self, username: &str) -> Result<bool, DbError> {
        let users_username = self.open_tree(USERS_USERNAME)?;
        Ok(users_username.contains_key(username.to_lowercase())?)
    }

    fn is_user_following_profile(
        &self,
        logged_in_username: &str,
        profile_user_id: UserId,
    ) -> Result<bool, DbError> {
        Ok(self
            .get_user_by_username(logged_in_username)?
            .map_or(false, |user| user.following.contains(&profile_user_id)))
    }

    fn get_suggested_profiles(
        &self,
        user_id: UserId,
        following: &[UserId],
    ) -> Result<Vec<User>, DbError> {
        let users = self.open_tree(USERS)?;
        let listed = scan::<User>(&users)
            .take(SUGGESTED_PROFILES_LIMIT)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(listed
            .into_iter()
            .filter(|profile| profile.user_id != user_id && !following.contains(&profile.user_id))
            .collect())
    }

    fn update_logged_in_user_following(
        &self,
        logged_in_user_id: UserId,
        profile_id: UserId,
        is_following_profile: bool,
    ) -> Result<Option<User>, DbError> {
        let update = FieldUpdate::toggle(profile_id, is_following_profile);
        update_document(&self.open_tree(USERS)?, logged_in_user_id, |user: &mut User| {
            update.apply(&mut user.following)
        })
    }

    fn update_followed_user_followers(
        &self,
        profile_id: UserId,
        logged_in_user_id: UserId,
        is_following_profile: bool,
    ) -> Result<Option<User>, DbError> {
        let update = FieldUpdate::toggle(logged_in_user_id, is_following_profile);
        update_document(&self.open_tree(USERS)?, profile_id, |user: &mut User| {
            update.apply(&mut user.followers)
        })
    }

    fn toggle_follow(
        &self,
        is_following_profile: bool,
        active_user_id: UserId,
        profile_user_id: UserId,
    ) -> Result<(), DbError> {
        self.update_logged_in_user_following(
            active_user_id,
            profile_user_id,
            is_following_profile,
        )?;
        self.update_followed_user_followers(profile_user_id, active_user_id, is_following_profile)?;
        Ok(())
    }
}

/// A photo as it appears on someone's timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelinePhoto {
    pub photo: Photo,
    pub username: String,
    pub user_liked_photo: bool,
}

pub trait PhotoDb {
    /// Stores `photo` under a freshly generated id, which is returned.
    fn add_photo(&self, photo: Photo) -> Result<PhotoId, DbError>;
    fn get_photo(&self, photo_id: PhotoId) -> Result<Option<Photo>, DbError>;
    /// Photos owned by anyone in `following`, annotated for the viewer `user_id`.
    fn get_photos(
        &self,
        user_id: UserId,
        following: &[UserId],
    ) -> Result<Vec<TimelinePhoto>, DbError>;
    fn get_user_photos_by_user_id(&self, user_id: UserId) -> Result<Vec<Photo>, DbError>;
    /// `toggle_liked` is the like state before the toggle.
    fn update_photo_likes(
        &self,
        photo_id: PhotoId,
        user_id: UserId,
        toggle_liked: bool,
    ) -> Result<Option<Photo>, DbError>;
    fn add_comment(&self, photo_id: PhotoId, comment: Comment) -> Result<Option<Photo>, DbError>;
}

const PHOTOS: &[u8] = b"photos";

impl PhotoDb for sled::Db {
    fn add_photo(&self, mut photo: Photo) -> Result<PhotoId, DbError> {
        let photos = self.open_tree(PHOTOS)?;
        let id = self.generate_id()?;
        photo.photo_id = id;
        photos.insert(&serialize_id(id)[..], bincode::serialize(&photo)?)?;
        Ok(id)
    }

    fn get_photo(&self, photo_id: PhotoId) -> Result<Option<Photo>, DbError> {
        get_document(&self.open_tree(PHOTOS)?, photo_id)
    }

    fn get_photos(
        &self,
        user_id: UserId,
        following: &[UserId],
    ) -> Result<Vec<TimelinePhoto>, DbError> {
        let photos = self.open_tree(PHOTOS)?;
        let mut timeline = Vec::new();
        for photo in scan::<Photo>(&photos) {
            let photo = photo?;
            if !following.contains(&photo.user_id) {
                continue;
            }
            let username = self
                .get_user_by_user_id(photo.user_id)?
                .map(|owner| owner.username)
                .unwrap_or_default();
            let user_liked_photo = photo.likes.contains(&user_id);
            timeline.push(TimelinePhoto {
                photo,
                username,
                user_liked_photo,
            });
        }
        Ok(timeline)
    }

    fn get_user_photos_by_user_id(&self, user_id: UserId) -> Result<Vec<Photo>, DbError> {
        let photos = self.open_tree(PHOTOS)?;
        scan::<Photo>(&photos)
            .filter(|photo| photo.as_ref().map_or(true, |photo| photo.user_id == user_id))
            .collect()
    }

    fn update_photo_likes(
        &self,
        photo_id: PhotoId,
        user_id: UserId,
        toggle_liked: bool,
    ) -> Result<Option<Photo>, DbError> {
        let update = FieldUpdate::toggle(user_id, toggle_liked);
        update_document(&self.open_tree(PHOTOS)?, photo_id, |photo: &mut Photo| {
            update.apply(&mut photo.likes)
        })
    }

    fn add_comment(&self, photo_id: PhotoId, comment: Comment) -> Result<Option<Photo>, DbError> {
        update_document(&self.open_tree(PHOTOS)?, photo_id, |photo: &mut Photo| {
            photo.comments.push(comment.clone())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{photo, temporary_db, user};

    #[test]
    fn field_updates_behave_like_sets() {
        let mut ids = vec![1, 2];
        FieldUpdate::ArrayUnion(2).apply(&mut ids);
        assert_eq!(ids, vec![1, 2]);
        FieldUpdate::ArrayUnion(3).apply(&mut ids);
        assert_eq!(ids, vec![1, 2, 3]);
        FieldUpdate::ArrayRemove(1).apply(&mut ids);
        assert_eq!(ids, vec![2, 3]);
        assert_eq!(FieldUpdate::toggle(7, true), FieldUpdate::ArrayRemove(7));
        assert_eq!(FieldUpdate::toggle(7, false), FieldUpdate::ArrayUnion(7));
    }

    #[test]
    fn usernames_are_unique() {
        let db = temporary_db();
        assert!(db.add_user(&user(1, "orwell", "George Orwell")).unwrap());
        assert!(!db.add_user(&user(2, "orwell", "Eric Blair")).unwrap());
        assert!(db.get_user_by_user_id(2).unwrap().is_none());
        assert!(db.does_username_exist("Orwell").unwrap());
        assert!(!db.does_username_exist("dali").unwrap());
        let found = db.get_user_by_username("orwell").unwrap().unwrap();
        assert_eq!(found.full_name, "George Orwell");
    }

    #[test]
    fn follow_toggles_both_documents() {
        let db = temporary_db();
        db.add_user(&user(1, "xli", "Xavier Li")).unwrap();
        db.add_user(&user(2, "orwell", "George Orwell")).unwrap();

        db.toggle_follow(false, 1, 2).unwrap();
        assert!(db.is_user_following_profile("xli", 2).unwrap());
        assert_eq!(db.get_user_by_user_id(2).unwrap().unwrap().followers, vec![1]);

        db.toggle_follow(true, 1, 2).unwrap();
        assert!(!db.is_user_following_profile("xli", 2).unwrap());
        assert!(db.get_user_by_user_id(2).unwrap().unwrap().followers.is_empty());
    }

    #[test]
    fn suggestions_skip_self_and_followed() {
        let db = temporary_db();
        for (id, name) in [(1, "xli"), (2, "karl"), (3, "raphael"), (4, "dali")] {
            db.add_user(&user(id, name, name)).unwrap();
        }
        let mut suggested = db
            .get_suggested_profiles(1, &[2])
            .unwrap()
            .into_iter()
            .map(|profile| profile.username)
            .collect::<Vec<_>>();
        suggested.sort();
        assert_eq!(suggested, vec!["dali", "raphael"]);
    }

    #[test]
    fn suggestions_read_a_limited_listing() {
        let db = temporary_db();
        for id in 1..=15 {
            db.add_user(&user(id, &format!("user{}", id), "Someone")).unwrap();
        }
        assert_eq!(
            db.get_suggested_profiles(100, &[]).unwrap().len(),
            SUGGESTED_PROFILES_LIMIT
        );
    }

    #[test]
    fn timeline_only_holds_followed_owners() {
        let db = temporary_db();
        db.add_user(&user(1, "xli", "Xavier Li")).unwrap();
        db.add_user(&user(2, "raphael", "Raffaello Sanzio da Urbino")).unwrap();
        db.add_user(&user(3, "dali", "Salvador Dalí")).unwrap();
        let liked = db.add_photo(photo(2, "Saint George and the Dragon")).unwrap();
        db.add_photo(photo(3, "The Persistence of Memory")).unwrap();
        db.update_photo_likes(liked, 1, false).unwrap();

        let timeline = db.get_photos(1, &[2]).unwrap();
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline[0].username, "raphael");
        assert!(timeline[0].user_liked_photo);
        assert_eq!(db.get_user_photos_by_user_id(3).unwrap().len(), 1);
    }

    #[test]
    fn likes_and_comments_update_one_photo() {
        let db = temporary_db();
        let id = db
            .add_photo(Photo {
                comments: Vec::new(),
                ..photo(2, "Saint George and the Dragon")
            })
            .unwrap();

        let liked = db.update_photo_likes(id, 1, false).unwrap().unwrap();
        assert_eq!(liked.likes, vec![1]);
        let unliked = db.update_photo_likes(id, 1, true).unwrap().unwrap();
        assert!(unliked.likes.is_empty());

        let comment = Comment {
            display_name: "xli".to_owned(),
            comment: "Amazing photo!".to_owned(),
        };
        let commented = db.add_comment(id, comment.clone()).unwrap().unwrap();
        assert_eq!(commented.comments, vec![comment.clone()]);
        assert!(db.add_comment(id + 1000, comment).unwrap().is_none());
    }
}
