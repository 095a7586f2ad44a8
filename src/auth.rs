//! Email/password accounts. Users sign in against these records; the session
//! identity is the account uid.

use crate::database::{
    deserialize_id, get_document, serialize_id, update_document, USERS, USERS_USERNAME,
};
use crate::error::{AuthError, DbError};
use crate::model::{Account, User, UserId};
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionError,
    TransactionResult, Transactional,
};
use validator::ValidateEmail;

const ACCOUNTS: &[u8] = b"accounts";
const ACCOUNTS_EMAIL: &[u8] = b"ACCOUNTS_EMAIL";

const MIN_PASSWORD_LEN: usize = 6;

pub trait AuthDb {
    fn create_user_with_email_and_password(
        &self,
        email: &str,
        password: &str,
        cost: u32,
    ) -> Result<Account, AuthError>;
    /// Creates the account named `display_name` and stores `user` under the
    /// new uid. Nothing is written when either the email or the username is
    /// already taken.
    fn create_user_with_profile(
        &self,
        email: &str,
        password: &str,
        cost: u32,
        display_name: &str,
        user: User,
    ) -> Result<Account, AuthError>;
    fn sign_in_with_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Account, AuthError>;
    fn update_profile(&self, uid: UserId, display_name: &str) -> Result<Option<Account>, AuthError>;
    fn get_account(&self, uid: UserId) -> Result<Option<Account>, AuthError>;
}

fn new_account(
    db: &sled::Db,
    email: &str,
    password: &str,
    cost: u32,
    display_name: Option<&str>,
) -> Result<Account, AuthError> {
    if !email.validate_email() {
        return Err(AuthError::InvalidEmail);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::WeakPassword);
    }
    Ok(Account {
        uid: db.generate_id().map_err(DbError::from)?,
        email: email.to_lowercase(),
        password_hash: bcrypt::hash(password, cost)?,
        display_name: display_name.map(str::to_owned),
    })
}

fn finish(result: TransactionResult<(), AuthError>) -> Result<(), AuthError> {
    match result {
        Ok(()) => Ok(()),
        Err(TransactionError::Abort(err)) => Err(err),
        Err(TransactionError::Storage(err)) => Err(DbError::from(err).into()),
    }
}

impl AuthDb for sled::Db {
    fn create_user_with_email_and_password(
        &self,
        email: &str,
        password: &str,
        cost: u32,
    ) -> Result<Account, AuthError> {
        let account = new_account(self, email, password, cost, None)?;
        let accounts = self.open_tree(ACCOUNTS).map_err(DbError::from)?;
        let accounts_email = self.open_tree(ACCOUNTS_EMAIL).map_err(DbError::from)?;
        let encoded = bincode::serialize(&account).map_err(DbError::from)?;
        let id = serialize_id(account.uid);
        finish((&accounts, &accounts_email).transaction(
            |(accounts, accounts_email)| -> ConflictableTransactionResult<(), AuthError> {
                if accounts_email.get(account.email.as_bytes())?.is_some() {
                    return Err(ConflictableTransactionError::Abort(AuthError::EmailInUse));
                }
                accounts_email.insert(account.email.as_bytes(), &id[..])?;
                accounts.insert(&id[..], encoded.clone())?;
                Ok(())
            },
        ))?;
        Ok(account)
    }

    fn create_user_with_profile(
        &self,
        email: &str,
        password: &str,
        cost: u32,
        display_name: &str,
        mut user: User,
    ) -> Result<Account, AuthError> {
        let account = new_account(self, email, password, cost, Some(display_name))?;
        user.user_id = account.uid;
        let accounts = self.open_tree(ACCOUNTS).map_err(DbError::from)?;
        let accounts_email = self.open_tree(ACCOUNTS_EMAIL).map_err(DbError::from)?;
        let users = self.open_tree(USERS).map_err(DbError::from)?;
        let users_username = self.open_tree(USERS_USERNAME).map_err(DbError::from)?;
        let encoded_account = bincode::serialize(&account).map_err(DbError::from)?;
        let encoded_user = bincode::serialize(&user).map_err(DbError::from)?;
        let id = serialize_id(account.uid);
        let trees = (&accounts, &accounts_email, &users, &users_username);
        finish(trees.transaction(
            |(accounts, accounts_email, users, users_username)| -> ConflictableTransactionResult<(), AuthError> {
                if accounts_email.get(account.email.as_bytes())?.is_some() {
                    return Err(ConflictableTransactionError::Abort(AuthError::EmailInUse));
                }
                if users_username.get(user.username.as_bytes())?.is_some() {
                    return Err(ConflictableTransactionError::Abort(AuthError::UsernameTaken));
                }
                accounts_email.insert(account.email.as_bytes(), &id[..])?;
                users_username.insert(user.username.as_bytes(), &id[..])?;
                accounts.insert(&id[..], encoded_account.clone())?;
                users.insert(&id[..], encoded_user.clone())?;
                Ok(())
            },
        ))?;
        Ok(account)
    }

    fn sign_in_with_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Account, AuthError> {
        if !email.validate_email() {
            return Err(AuthError::InvalidEmail);
        }
        let accounts_email = self.open_tree(ACCOUNTS_EMAIL).map_err(DbError::from)?;
        let uid = match accounts_email
            .get(email.to_lowercase())
            .map_err(DbError::from)?
        {
            Some(uid) => deserialize_id(uid, "accounts_email")?,
            None => return Err(AuthError::UserNotFound),
        };
        let account = self
            .get_account(uid)?
            .ok_or(DbError::BadIndex("accounts_email"))?;
        if bcrypt::verify(password, &account.password_hash)? {
            Ok(account)
        } else {
            Err(AuthError::WrongPassword)
        }
    }

    fn update_profile(&self, uid: UserId, display_name: &str) -> Result<Option<Account>, AuthError> {
        let accounts = self.open_tree(ACCOUNTS).map_err(DbError::from)?;
        Ok(update_document(&accounts, uid, |account: &mut Account| {
            account.display_name = Some(display_name.to_owned())
        })?)
    }

    fn get_account(&self, uid: UserId) -> Result<Option<Account>, AuthError> {
        let accounts = self.open_tree(ACCOUNTS).map_err(DbError::from)?;
        Ok(get_document(&accounts, uid)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::UserDb;
    use crate::test_support::{temporary_db, TEST_COST};

    #[test]
    fn badly_formatted_emails_are_rejected() {
        let db = temporary_db();
        for email in [
            "xavierli.com",
            "@gmail.com",
            "xavierli@",
            "xavier li@gmail.com",
            "xavierli@.com",
            "xavierli@gmail..com",
        ] {
            assert!(
                matches!(
                    db.create_user_with_email_and_password(email, "test-password", TEST_COST),
                    Err(AuthError::InvalidEmail)
                ),
                "{} was accepted",
                email
            );
            assert!(matches!(
                db.sign_in_with_email_and_password(email, "test-password"),
                Err(AuthError::InvalidEmail)
            ));
        }
    }

    #[test]
    fn sign_in_after_create() {
        let db = temporary_db();
        let created = db
            .create_user_with_email_and_password("XavierLi@gmail.com", "test-password", TEST_COST)
            .unwrap();
        assert_eq!(created.email, "xavierli@gmail.com");

        let signed_in = db
            .sign_in_with_email_and_password("xavierli@gmail.com", "test-password")
            .unwrap();
        assert_eq!(signed_in.uid, created.uid);
        assert!(matches!(
            db.sign_in_with_email_and_password("xavierli@gmail.com", "wrong-password"),
            Err(AuthError::WrongPassword)
        ));
        assert!(matches!(
            db.sign_in_with_email_and_password("nobody@gmail.com", "test-password"),
            Err(AuthError::UserNotFound)
        ));
    }

    #[test]
    fn create_rejects_bad_input_and_duplicates() {
        let db = temporary_db();
        assert!(matches!(
            db.create_user_with_email_and_password("xavierli.com", "test-password", TEST_COST),
            Err(AuthError::InvalidEmail)
        ));
        assert!(matches!(
            db.create_user_with_email_and_password("xavierli@gmail.com", "short", TEST_COST),
            Err(AuthError::WeakPassword)
        ));
        db.create_user_with_email_and_password("xavierli@gmail.com", "test-password", TEST_COST)
            .unwrap();
        assert!(matches!(
            db.create_user_with_email_and_password("xavierli@gmail.com", "other-password", TEST_COST),
            Err(AuthError::EmailInUse)
        ));
    }

    #[test]
    fn display_name_is_stored() {
        let db = temporary_db();
        let account = db
            .create_user_with_email_and_password("xavierli@gmail.com", "test-password", TEST_COST)
            .unwrap();
        assert!(account.display_name.is_none());
        db.update_profile(account.uid, "xli").unwrap();
        let stored = db.get_account(account.uid).unwrap().unwrap();
        assert_eq!(stored.display_name.as_deref(), Some("xli"));
        assert!(db.update_profile(account.uid + 1000, "ghost").unwrap().is_none());
    }

    fn profile(username: &str) -> User {
        User {
            username: username.to_owned(),
            full_name: "Xavier Li".to_owned(),
            ..User::default()
        }
    }

    #[test]
    fn profile_is_created_with_the_account() {
        let db = temporary_db();
        let account = db
            .create_user_with_profile("xavierli@gmail.com", "test-password", TEST_COST, "XLi", profile("xli"))
            .unwrap();
        assert_eq!(account.display_name.as_deref(), Some("XLi"));
        let user = db.get_user_by_username("xli").unwrap().unwrap();
        assert_eq!(user.user_id, account.uid);
        let signed_in = db
            .sign_in_with_email_and_password("xavierli@gmail.com", "test-password")
            .unwrap();
        assert_eq!(signed_in.display_name.as_deref(), Some("XLi"));
    }

    #[test]
    fn taken_username_leaves_no_account_behind() {
        let db = temporary_db();
        db.create_user_with_profile("a@gmail.com", "test-password", TEST_COST, "xli", profile("xli"))
            .unwrap();
        assert!(matches!(
            db.create_user_with_profile("b@gmail.com", "test-password", TEST_COST, "xli", profile("xli")),
            Err(AuthError::UsernameTaken)
        ));
        assert!(matches!(
            db.sign_in_with_email_and_password("b@gmail.com", "test-password"),
            Err(AuthError::UserNotFound)
        ));
        let retried = db
            .create_user_with_profile("b@gmail.com", "test-password", TEST_COST, "bee", profile("bee"))
            .unwrap();
        assert_eq!(db.get_user_by_username("bee").unwrap().unwrap().user_id, retried.uid);
    }

    #[test]
    fn taken_email_leaves_username_free() {
        let db = temporary_db();
        db.create_user_with_email_and_password("xavierli@gmail.com", "test-password", TEST_COST)
            .unwrap();
        assert!(matches!(
            db.create_user_with_profile("xavierli@gmail.com", "test-password", TEST_COST, "xli", profile("xli")),
            Err(AuthError::EmailInUse)
        ));
        assert!(!db.does_username_exist("xli").unwrap());
    }
}
