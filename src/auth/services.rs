use lazy_static::lazy_static;
use regex::Regex;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::dto::{LoginRequest, PublicUser, RegisterRequest};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo::User;
use crate::error::{internal, ApiError};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Trimmed registration fields, validated before touching the store.
#[derive(Debug)]
pub(crate) struct RegisterFields {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
}

pub(crate) fn validate_register(req: &RegisterRequest) -> Result<RegisterFields, ApiError> {
    let name = req.name.trim();
    let email = req.email.trim();
    let phone = req.mobile.trim();
    let password = req.password.trim();

    if name.is_empty() {
        return Err(ApiError::Validation("Name is required".into()));
    }
    if email.is_empty() {
        return Err(ApiError::Validation("Email is required".into()));
    }
    if !is_valid_email(email) {
        return Err(ApiError::Validation("Invalid email".into()));
    }
    if password.is_empty() {
        return Err(ApiError::Validation("Password is required".into()));
    }

    Ok(RegisterFields {
        name: name.to_string(),
        email: email.to_string(),
        phone: (!phone.is_empty()).then(|| phone.to_string()),
        password: password.to_string(),
    })
}

/// Register a new user, storing the password only as a salted hash.
///
/// The email lookup is a fast path for a friendly error; the unique
/// constraint on `users.email` is the authoritative guard against a
/// concurrent registration racing past the check.
pub async fn register(db: &PgPool, req: RegisterRequest) -> Result<Uuid, ApiError> {
    let fields = validate_register(&req)?;

    if User::find_by_email(db, &fields.email)
        .await
        .map_err(internal)?
        .is_some()
    {
        warn!(email = %fields.email, "email already registered");
        return Err(ApiError::DuplicateEmail);
    }

    let hash = hash_password(&fields.password).map_err(internal)?;

    let user = User::create(
        db,
        &fields.name,
        &fields.email,
        fields.phone.as_deref(),
        &hash,
    )
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            ApiError::DuplicateEmail
        } else {
            internal(e)
        }
    })?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(user.id)
}

/// Authenticate by email and password. The error is identical whether the
/// email is unknown or the password is wrong.
pub async fn login(db: &PgPool, req: LoginRequest) -> Result<PublicUser, ApiError> {
    let email = req.email.trim();
    let password = req.password.trim();

    let Some(user) = User::find_by_email(db, email).await.map_err(internal)? else {
        warn!(email = %email, "login unknown email");
        return Err(ApiError::Auth);
    };

    if !verify_password(password, &user.password_hash) {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::Auth);
    }

    info!(user_id = %user.id, "user logged in");
    Ok(PublicUser {
        id: user.id,
        name: user.name,
        email: user.email,
    })
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|d| d.code())
        .is_some_and(|c| c == "23505")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(name: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: name.into(),
            email: email.into(),
            mobile: String::new(),
            password: password.into(),
        }
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("user.name+tag@example.org"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("spaces in@example.com"));
        assert!(!is_valid_email("missing@tld"));
    }

    #[test]
    fn register_rejects_blank_fields() {
        for bad in [
            req("", "a@b.co", "pw"),
            req("   ", "a@b.co", "pw"),
            req("Ada", "", "pw"),
            req("Ada", "a@b.co", ""),
            req("Ada", "a@b.co", "   "),
        ] {
            assert!(matches!(
                validate_register(&bad),
                Err(ApiError::Validation(_))
            ));
        }
    }

    #[test]
    fn register_rejects_malformed_email() {
        let err = validate_register(&req("Ada", "not-an-email", "pw")).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn register_trims_whitespace() {
        let fields = validate_register(&RegisterRequest {
            name: "  Ada  ".into(),
            email: " ada@example.com ".into(),
            mobile: " 555-0100 ".into(),
            password: " secret ".into(),
        })
        .unwrap();
        assert_eq!(fields.name, "Ada");
        assert_eq!(fields.email, "ada@example.com");
        assert_eq!(fields.phone.as_deref(), Some("555-0100"));
        assert_eq!(fields.password, "secret");
    }

    #[test]
    fn empty_mobile_becomes_none() {
        let fields = validate_register(&req("Ada", "ada@example.com", "pw")).unwrap();
        assert_eq!(fields.phone, None);
    }
}
