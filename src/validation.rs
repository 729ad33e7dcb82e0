//! Explicit validation functions for registration input.
//!
//! Each function checks a single policy and returns `Ok(())` or a
//! [Error::Validation] naming the offending field, so the caller can compose
//! them in a fixed order and report the first failure.

use std::str::FromStr;

use email_address::EmailAddress;

use crate::Error;

/// The characters that count as 'special' for the password policy.
pub const SPECIAL_CHARACTERS: &str = "!@#$%^&*(),.?\":{}|<>";

/// The minimum number of characters in a password.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// The minimum number of characters in a first or last name.
pub const MIN_NAME_LENGTH: usize = 3;

/// Check that `email` looks like a valid email address.
pub fn validate_email(email: &str) -> Result<(), Error> {
    if EmailAddress::from_str(email).is_err() {
        return Err(Error::Validation {
            field: "email",
            message: "Please enter a valid email address".to_owned(),
        });
    }

    Ok(())
}

/// Check that a first or last name has at least [MIN_NAME_LENGTH] characters.
///
/// `field` is the request field name and `label` the human readable name used
/// in the error message, e.g. `("first_name", "First name")`.
pub fn validate_name(field: &'static str, label: &str, value: &str) -> Result<(), Error> {
    if value.chars().count() < MIN_NAME_LENGTH {
        return Err(Error::Validation {
            field,
            message: format!("{label} must be more than 2 letters"),
        });
    }

    Ok(())
}

/// Check the password policy and that the password matches its confirmation.
///
/// The policy requires at least [MIN_PASSWORD_LENGTH] characters, an
/// uppercase letter, a lowercase letter, a digit, and a character from
/// [SPECIAL_CHARACTERS].
pub fn validate_password(password: &str, confirm_password: &str) -> Result<(), Error> {
    if password != confirm_password {
        return Err(Error::Validation {
            field: "confirm_password",
            message: "Passwords do not match.".to_owned(),
        });
    }

    let failure = if password.chars().count() < MIN_PASSWORD_LENGTH {
        Some("Password must be at least 8 characters long.")
    } else if !password.chars().any(|character| character.is_ascii_uppercase()) {
        Some("Password must contain at least one uppercase letter.")
    } else if !password.chars().any(|character| character.is_ascii_lowercase()) {
        Some("Password must contain at least one lowercase letter.")
    } else if !password.chars().any(|character| character.is_ascii_digit()) {
        Some("Password must contain at least one digit.")
    } else if !password
        .chars()
        .any(|character| SPECIAL_CHARACTERS.contains(character))
    {
        Some("Password must contain at least one special character.")
    } else {
        None
    };

    match failure {
        Some(message) => Err(Error::Validation {
            field: "password",
            message: message.to_owned(),
        }),
        None => Ok(()),
    }
}
