use serde::{Deserialize, Serialize};

pub type UserId = u64;
pub type PhotoId = u64;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct User {
    pub user_id: UserId,
    pub username: String,
    pub full_name: String,
    pub email_address: String,
    pub followers: Vec<UserId>,
    pub following: Vec<UserId>,
    pub date_created: i64,
}

impl User {
    /// The record handed out when a lookup has no match.
    pub fn is_empty(&self) -> bool {
        self.username.is_empty()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Comment {
    pub display_name: String,
    pub comment: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Photo {
    pub photo_id: PhotoId,
    pub user_id: UserId,
    pub image_src: String,
    pub caption: String,
    pub likes: Vec<UserId>,
    pub comments: Vec<Comment>,
    pub user_latitude: String,
    pub user_longitude: String,
    pub date_created: i64,
}

/// Credentials kept by the authentication side of the store. `uid` is also
/// the id of the matching `User` document.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Account {
    pub uid: UserId,
    pub email: String,
    pub password_hash: String,
    pub display_name: Option<String>,
}
