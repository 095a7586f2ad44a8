use super::{page_context, redirect, render, Db, Tera};
use crate::auth::AuthDb;
use crate::context::CurrentUser;
use crate::error::AppResult;
use crate::routes;
use actix_identity::Identity;
use actix_web::{web, HttpResponse};
use log::{debug, info};
use serde::{Deserialize, Serialize};

const TITLE: &str = "Login - Instagram";

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct LoginParams {
    #[serde(default)]
    pub email_address: String,
    #[serde(default)]
    pub password: String,
}

impl LoginParams {
    fn is_invalid(&self) -> bool {
        self.email_address.is_empty() || self.password.is_empty()
    }
}

fn render_login(
    tera: &tera::Tera,
    current: &CurrentUser,
    email_address: &str,
    error: Option<&str>,
) -> AppResult<HttpResponse> {
    let mut ctx = page_context(TITLE, current);
    ctx.insert("email_address", email_address);
    ctx.insert("error", &error);
    render(tera, "login.html", &ctx)
}

pub async fn login(current: CurrentUser, tera: Tera) -> AppResult<HttpResponse> {
    if current.is_signed_in() {
        return Ok(redirect(routes::DASHBOARD));
    }
    render_login(&tera, &current, "", None)
}

pub async fn login_post(
    params: web::Form<LoginParams>,
    current: CurrentUser,
    id: Identity,
    db: Db,
    tera: Tera,
) -> AppResult<HttpResponse> {
    let params = params.into_inner();
    if params.is_invalid() {
        return render_login(
            &tera,
            &current,
            &params.email_address,
            Some("Please enter your email address and password."),
        );
    }
    match db.sign_in_with_email_and_password(&params.email_address, &params.password) {
        Ok(account) => {
            info!("user {} signed in", account.uid);
            id.remember(account.uid.to_string());
            Ok(redirect(routes::DASHBOARD))
        }
        Err(err) => {
            debug!("sign in failed for {}: {:?}", params.email_address, err);
            render_login(&tera, &current, "", Some(&err.to_string()))
        }
    }
}
