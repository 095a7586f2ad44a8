use crate::auth::AuthDb;
use crate::config::Config;
use crate::database::UserDb;
use crate::model::{Comment, Photo, User, UserId};
use actix_web::{body::MessageBody, dev::ServiceResponse, http::header, test};

/// Cheapest cost bcrypt accepts.
pub const TEST_COST: u32 = 4;

pub fn temporary_db() -> sled::Db {
    sled::Config::new().temporary(true).open().unwrap()
}

pub fn config() -> Config {
    let mut config = Config::default();
    config.auth.bcrypt_cost = TEST_COST;
    config.seed.enabled = false;
    config
}

pub fn tera() -> tera::Tera {
    tera::Tera::new(&config().templates.glob()).unwrap()
}

pub fn user(user_id: UserId, username: &str, full_name: &str) -> User {
    User {
        user_id,
        username: username.to_owned(),
        full_name: full_name.to_owned(),
        email_address: format!("{}@example.com", username),
        ..User::default()
    }
}

pub fn photo(user_id: UserId, caption: &str) -> Photo {
    Photo {
        user_id,
        image_src: "/images/users/raphael/1.jpg".to_owned(),
        caption: caption.to_owned(),
        comments: vec![Comment {
            display_name: "dali".to_owned(),
            comment: "Love this place, looks like my animal farm!".to_owned(),
        }],
        date_created: 1_600_000_000_000,
        ..Photo::default()
    }
}

/// An account that can sign in plus its user document.
pub fn register(
    db: &sled::Db,
    email: &str,
    password: &str,
    username: &str,
    full_name: &str,
) -> User {
    let account = db
        .create_user_with_email_and_password(email, password, TEST_COST)
        .unwrap();
    db.update_profile(account.uid, username).unwrap();
    let user = User {
        email_address: email.to_owned(),
        ..user(account.uid, username, full_name)
    };
    assert!(db.add_user(&user).unwrap());
    user
}

pub async fn body_string<B: MessageBody>(resp: ServiceResponse<B>) -> String {
    String::from_utf8(test::read_body(resp).await.to_vec()).unwrap()
}

pub fn location<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_owned()
}

macro_rules! init_app {
    ($db:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap($crate::context::identity_service(
                    &$crate::test_support::config().session,
                ))
                .app_data(actix_web::web::Data::new($crate::test_support::tera()))
                .app_data(actix_web::web::Data::new($db.clone()))
                .app_data(actix_web::web::Data::new($crate::test_support::config()))
                .configure($crate::routes::configure)
                .default_service(actix_web::web::to($crate::pages::not_found::fallback)),
        )
        .await
    };
}

/// Posts the login form and returns the identity cookie it sets.
macro_rules! sign_in {
    ($app:expr, $email:expr, $password:expr) => {{
        let req = actix_web::test::TestRequest::post()
            .uri($crate::routes::LOGIN)
            .set_form(&[("email_address", $email), ("password", $password)])
            .to_request();
        let resp = actix_web::test::call_service(&$app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::FOUND);
        let cookie: actix_web::cookie::Cookie<'static> = resp
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "auth-cookie")
            .map(|cookie| cookie.into_owned())
            .unwrap();
        cookie
    }};
}
