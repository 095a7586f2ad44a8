use super::{page_context, redirect, render, Db, Settings, Tera};
use crate::auth::AuthDb;
use crate::config::Config;
use crate::context::CurrentUser;
use crate::database::UserDb;
use crate::error::{AppResult, AuthError, USERNAME_TAKEN};
use crate::model::{Account, User};
use crate::routes;
use actix_identity::Identity;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

const TITLE: &str = "Sign Up - Instagram";

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
pub struct SignUpParams {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email_address: String,
    #[serde(default)]
    pub password: String,
}

impl SignUpParams {
    fn is_invalid(&self) -> bool {
        self.username.is_empty() || self.email_address.is_empty() || self.password.is_empty()
    }
}

/// Creates the account with the entered credentials, named after the
/// username, together with the matching user document.
pub fn create_account(
    db: &sled::Db,
    config: &Config,
    params: &SignUpParams,
) -> Result<Account, AuthError> {
    let mut following = Vec::new();
    for name in &config.sign_up.default_following {
        match db.get_user_by_username(name)? {
            Some(user) => following.push(user.user_id),
            None => debug!("default follow {} does not exist", name),
        }
    }
    let user = User {
        username: params.username.to_lowercase(),
        full_name: params.full_name.clone(),
        email_address: params.email_address.to_lowercase(),
        following,
        date_created: Utc::now().timestamp_millis(),
        ..User::default()
    };
    db.create_user_with_profile(
        &params.email_address,
        &params.password,
        config.auth.bcrypt_cost,
        &params.username,
        user,
    )
}

fn render_sign_up(
    tera: &tera::Tera,
    current: &CurrentUser,
    params: &SignUpParams,
    error: Option<&str>,
) -> AppResult<HttpResponse> {
    let mut ctx = page_context(TITLE, current);
    ctx.insert("username", &params.username);
    ctx.insert("full_name", &params.full_name);
    ctx.insert("email_address", &params.email_address);
    ctx.insert("error", &error);
    render(tera, "sign_up.html", &ctx)
}

fn render_username_taken(
    tera: &tera::Tera,
    current: &CurrentUser,
    params: SignUpParams,
) -> AppResult<HttpResponse> {
    let kept = SignUpParams {
        username: String::new(),
        password: String::new(),
        ..params
    };
    render_sign_up(tera, current, &kept, Some(USERNAME_TAKEN))
}

pub async fn sign_up(current: CurrentUser, tera: Tera) -> AppResult<HttpResponse> {
    if current.is_signed_in() {
        return Ok(redirect(routes::DASHBOARD));
    }
    render_sign_up(&tera, &current, &SignUpParams::default(), None)
}

pub async fn sign_up_post(
    params: web::Form<SignUpParams>,
    current: CurrentUser,
    id: Identity,
    db: Db,
    settings: Settings,
    tera: Tera,
) -> AppResult<HttpResponse> {
    let params = params.into_inner();
    if params.is_invalid() {
        let kept = SignUpParams {
            password: String::new(),
            ..params
        };
        return render_sign_up(
            &tera,
            &current,
            &kept,
            Some("Please fill in a username, email address and password."),
        );
    }

    if db.does_username_exist(&params.username)? {
        return render_username_taken(&tera, &current, params);
    }

    match create_account(&db, &settings, &params) {
        Ok(account) => {
            info!("user {} signed up as {}", account.uid, params.username);
            id.remember(account.uid.to_string());
            Ok(redirect(routes::DASHBOARD))
        }
        Err(AuthError::UsernameTaken) => render_username_taken(&tera, &current, params),
        Err(err) => {
            warn!("sign up failed for {}: {}", params.username, err);
            render_sign_up(
                &tera,
                &current,
                &SignUpParams::default(),
                Some(&err.to_string()),
            )
        }
    }
}
