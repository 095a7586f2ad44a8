use crate::auth::AuthDb;
use crate::config::Config;
use crate::database::{PhotoDb, UserDb};
use crate::error::AuthError;
use crate::model::{Comment, Photo, User};
use chrono::Utc;
use log::info;

const SEED_USERS: &[(&str, &str)] = &[
    ("karl", "Karl Hadwen"),
    ("raphael", "Raffaello Sanzio da Urbino"),
    ("dali", "Salvador Dalí"),
    ("orwell", "George Orwell"),
];

const SEED_PHOTOS: u32 = 5;

/// Writes the demo users and raphael's photos. Does nothing and returns
/// `false` when the first demo user already exists.
pub fn seed(db: &sled::Db, config: &Config) -> Result<bool, AuthError> {
    if db.does_username_exist(SEED_USERS[0].0)? {
        return Ok(false);
    }
    let now = Utc::now().timestamp_millis();

    let mut ids = Vec::with_capacity(SEED_USERS.len());
    for (username, full_name) in SEED_USERS {
        let email = format!("{}@instaclone.test", username);
        let account = db.create_user_with_profile(
            &email,
            &config.seed.password,
            config.auth.bcrypt_cost,
            username,
            User {
                username: username.to_string(),
                full_name: full_name.to_string(),
                email_address: email.clone(),
                date_created: now,
                ..User::default()
            },
        )?;
        ids.push(account.uid);
    }
    // raphael follows karl, karl is followed by raphael
    db.toggle_follow(false, ids[1], ids[0])?;

    for i in 1..=SEED_PHOTOS {
        db.add_photo(Photo {
            user_id: ids[1],
            image_src: format!("/images/users/raphael/{}.jpg", i),
            caption: "Saint George and the Dragon".to_owned(),
            comments: vec![
                Comment {
                    display_name: "dali".to_owned(),
                    comment: "Love this place, looks like my animal farm!".to_owned(),
                },
                Comment {
                    display_name: "orwell".to_owned(),
                    comment: "Would you mind if I used this picture?".to_owned(),
                },
            ],
            user_latitude: "40.7128°".to_owned(),
            user_longitude: "74.0060°".to_owned(),
            date_created: now,
            ..Photo::default()
        })?;
    }
    info!("seeded {} users", SEED_USERS.len());
    Ok(true)
}
