use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use log::debug;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("corrupt document: {0}")]
    Codec(#[from] bincode::Error),

    #[error("bad index entry in {0}")]
    BadIndex(&'static str),
}

pub const USERNAME_TAKEN: &str = "That username is already taken, please try another.";

/// Failures of the authentication side of the store. The messages are the
/// ones shown to the user on the login and sign-up forms.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("The email address is badly formatted.")]
    InvalidEmail,

    #[error("Password should be at least 6 characters")]
    WeakPassword,

    #[error("The email address is already in use by another account.")]
    EmailInUse,

    #[error("There is no user record corresponding to this identifier. The user may have been deleted.")]
    UserNotFound,

    #[error("The password is invalid or the user does not have a password.")]
    WrongPassword,

    #[error("{}", USERNAME_TAKEN)]
    UsernameTaken,

    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error(transparent)]
    Db(#[from] DbError),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error")]
    Db(#[from] DbError),

    #[error("Template error")]
    Template(#[from] tera::Error),

    #[error("Authentication error")]
    Auth(#[from] AuthError),

    #[error("Server misconfigured")]
    MissingState(&'static str),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Db(err) => debug!("{:?}", err),
            AppError::Template(err) => debug!("{:?}", err),
            AppError::Auth(err) => debug!("{:?}", err),
            AppError::MissingState(name) => debug!("no {} registered as app data", name),
        }
        HttpResponse::build(self.status_code())
            .content_type("text/plain; charset=utf-8")
            .body(self.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
