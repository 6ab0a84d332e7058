use lazy_static::lazy_static;
use regex::Regex;

use crate::auth::{
    dto::{LoginRequest, SignupRequest},
    error::AuthError,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn validate_signup(payload: &SignupRequest) -> Result<(), AuthError> {
    if payload.name.trim().is_empty() {
        return Err(AuthError::Validation("Name is required".into()));
    }
    if !is_valid_email(&payload.email) {
        return Err(AuthError::Validation("Invalid email".into()));
    }
    if payload.password.len() < 6 {
        return Err(AuthError::Validation("Password too short".into()));
    }
    Ok(())
}

/// Login only checks the email shape; a wrong password of any length must
/// come back as "Invalid credentials", not a validation hint.
pub fn validate_login(payload: &LoginRequest) -> Result<(), AuthError> {
    if !is_valid_email(&payload.email) {
        return Err(AuthError::Validation("Invalid email".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(name: &str, email: &str, password: &str) -> SignupRequest {
        SignupRequest {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn accepts_a_well_formed_signup() {
        assert!(validate_signup(&signup("Ann", "ann@x.com", "secret1")).is_ok());
    }

    #[test]
    fn rejects_blank_name() {
        let err = validate_signup(&signup("  ", "ann@x.com", "secret1")).unwrap_err();
        assert_eq!(err.to_string(), "Name is required");
    }

    #[test]
    fn rejects_bad_email() {
        assert!(validate_signup(&signup("Ann", "not-an-email", "secret1")).is_err());
        assert!(validate_signup(&signup("Ann", "a b@x.com", "secret1")).is_err());
        assert!(validate_signup(&signup("Ann", "ann@nodot", "secret1")).is_err());
    }

    #[test]
    fn rejects_short_password() {
        let err = validate_signup(&signup("Ann", "ann@x.com", "12345")).unwrap_err();
        assert_eq!(err.to_string(), "Password too short");
    }

    #[test]
    fn login_checks_email_shape_only() {
        let ok = LoginRequest {
            email: "ann@x.com".into(),
            password: "wrong".into(),
        };
        assert!(validate_login(&ok).is_ok());

        let bad = LoginRequest {
            email: "nope".into(),
            password: "whatever".into(),
        };
        assert!(validate_login(&bad).is_err());
    }
}
