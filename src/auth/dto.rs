use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request body for user registration. The frontend sends the phone
/// number under `mobile`.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub mobile: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public part of the user returned to the client. Never carries the
/// password hash.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub user: PublicUser,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_request_accepts_mobile_field() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{"name":"Ada","email":"ada@example.com","mobile":"555-0100","password":"pw"}"#,
        )
        .unwrap();
        assert_eq!(req.mobile, "555-0100");
    }

    #[test]
    fn register_request_mobile_defaults_empty() {
        let req: RegisterRequest =
            serde_json::from_str(r#"{"name":"Ada","email":"ada@example.com","password":"pw"}"#)
                .unwrap();
        assert_eq!(req.mobile, "");
    }

    #[test]
    fn public_user_has_no_password_field() {
        let user = PublicUser {
            id: Uuid::new_v4(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("ada@example.com"));
        assert!(!json.contains("password"));
    }
}
