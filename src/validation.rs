use crate::error::FieldError;
use crate::models::{LoginRequest, RegisterRequest};
use lazy_static::lazy_static;
use regex::Regex;

pub const MIN_PASSWORD_LEN: usize = 6;

lazy_static! {
    // local@domain.tld, no whitespace, single @
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)+$").expect("email regex compiles");
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// Lowercased, trimmed form used for storage and lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_registration(req: &RegisterRequest) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();
    if req.first_name.trim().is_empty() {
        errors.push(FieldError {
            field: "firstName",
            message: "First name is required",
        });
    }
    if req.last_name.trim().is_empty() {
        errors.push(FieldError {
            field: "lastName",
            message: "Last name is required",
        });
    }
    if !is_valid_email(&req.email) {
        errors.push(FieldError {
            field: "email",
            message: "Valid email is required",
        });
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(FieldError {
            field: "password",
            message: "Password must be at least 6 characters long",
        });
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

pub fn validate_login(req: &LoginRequest) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();
    if !is_valid_email(&req.email) {
        errors.push(FieldError {
            field: "email",
            message: "Valid email is required",
        });
    }
    if req.password.is_empty() {
        errors.push(FieldError {
            field: "password",
            message: "Password is required",
        });
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(first: &str, last: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            first_name: first.into(),
            last_name: last.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn accepts_complete_registration() {
        assert!(validate_registration(&register("Jane", "Doe", "jane@x.com", "secret1")).is_ok());
    }

    #[test]
    fn short_password_is_rejected() {
        let errors = validate_registration(&register("Jane", "Doe", "jane@x.com", "abc")).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "password");
    }

    #[test]
    fn password_length_counts_characters() {
        assert!(validate_registration(&register("Jane", "Doe", "jane@x.com", "ééééé")).is_err());
        assert!(validate_registration(&register("Jane", "Doe", "jane@x.com", "éééééé")).is_ok());
    }

    #[test]
    fn reports_every_bad_field() {
        let errors = validate_registration(&register(" ", "", "nope", "")).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["firstName", "lastName", "email", "password"]);
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a.b@example.co.uk"));
        assert!(is_valid_email(" Jane@X.com "));
        assert!(!is_valid_email("jane@"));
        assert!(!is_valid_email("jane@localhost"));
        assert!(!is_valid_email("ja ne@x.com"));
        assert!(!is_valid_email("jane@@x.com"));
    }

    #[test]
    fn normalize_lowercases_and_trims() {
        assert_eq!(normalize_email("  Jane@X.COM "), "jane@x.com");
    }

    #[test]
    fn login_requires_password() {
        let req = LoginRequest {
            email: "jane@x.com".into(),
            password: String::new(),
        };
        let errors = validate_login(&req).unwrap_err();
        assert_eq!(errors[0].field, "password");
    }
}
