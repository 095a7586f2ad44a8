//! Per-request ambient values: who is signed in and their user record.

use crate::auth::AuthDb;
use crate::config::SessionConfig;
use crate::error::AppError;
use crate::hooks::use_user;
use crate::model::{User, UserId};
use actix_identity::{CookieIdentityPolicy, IdentityService, RequestIdentity};
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use log::debug;
use std::future::{ready, Ready};

pub fn identity_service(config: &SessionConfig) -> IdentityService<CookieIdentityPolicy> {
    IdentityService::new(
        CookieIdentityPolicy::new(config.key.as_bytes())
            .name(config.cookie_name.clone())
            .secure(config.secure),
    )
}

/// The authenticated identity behind the session cookie.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub uid: UserId,
    pub display_name: String,
}

/// `auth` is `None` for anonymous visitors. `user` is the empty record when
/// there is no session or no user document for it.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub auth: Option<AuthUser>,
    pub user: User,
}

impl CurrentUser {
    pub fn is_signed_in(&self) -> bool {
        self.auth.is_some()
    }

    /// Signed in and backed by a user document.
    pub fn profile(&self) -> Option<(&AuthUser, &User)> {
        match &self.auth {
            Some(auth) if !self.user.is_empty() => Some((auth, &self.user)),
            _ => None,
        }
    }

    fn load(req: &HttpRequest) -> Result<Self, AppError> {
        let db = req
            .app_data::<web::Data<sled::Db>>()
            .ok_or(AppError::MissingState("database"))?;
        let uid = match req.get_identity().map(|id| id.parse::<UserId>()) {
            Some(Ok(uid)) => uid,
            Some(Err(err)) => {
                debug!("ignoring malformed identity: {}", err);
                return Ok(Self::anonymous());
            }
            None => return Ok(Self::anonymous()),
        };
        let account = match db.get_account(uid)? {
            Some(account) => account,
            None => {
                debug!("identity {} has no account", uid);
                return Ok(Self::anonymous());
            }
        };
        let user = use_user(db, Some(uid))?;
        Ok(Self {
            auth: Some(AuthUser {
                uid,
                display_name: account.display_name.unwrap_or_default(),
            }),
            user,
        })
    }

    fn anonymous() -> Self {
        Self {
            auth: None,
            user: User::default(),
        }
    }
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::load(req))
    }
}
