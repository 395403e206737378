//! Account signup form and its field rules.
//!
//! User-facing messages are German, matching the rest of the application.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

/// Maximum user name length in characters.
pub const MAX_NAME_LENGTH: u64 = 15;

/// Minimum password length in characters.
pub const MIN_PASSWORD_LENGTH: u64 = 8;

pub const MSG_REQUIRED: &str = "Dieses Feld ist erforderlich.";
pub const MSG_NAME_TOO_LONG: &str = "Maximal 15 Zeichen zulässig";
pub const MSG_PASSWORD_TOO_SHORT: &str = "Das Passwort sollte min. 8 Zeichen lang sein.";
pub const MSG_PASSWORD_MISMATCH: &str = "Die Passwörter stimmen nicht überein";

/// Shown when the chosen user name already exists.
pub const MSG_NAME_TAKEN: &str = "Der Benutzername ist bereits vergeben.";

/// Shown for every signup failure that is neither validation nor conflict.
pub const MSG_UNKNOWN_ERROR: &str = "Ein unbekannter Fehler ist aufgetreten.";

/// Body of a signup request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignupForm {
    #[validate(
        custom(function = "required", message = "Dieses Feld ist erforderlich."),
        length(max = 15, message = "Maximal 15 Zeichen zulässig")
    )]
    pub name: String,

    #[validate(
        custom(function = "required", message = "Dieses Feld ist erforderlich."),
        length(min = 8, message = "Das Passwort sollte min. 8 Zeichen lang sein.")
    )]
    pub password: String,

    #[validate(
        custom(function = "required", message = "Dieses Feld ist erforderlich."),
        must_match(other = "password", message = "Die Passwörter stimmen nicht überein")
    )]
    pub password2: String,

    /// Avatar URL, e.g. `/avatars/fox.png`.
    #[serde(default)]
    pub image: Option<String>,
}

fn required(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

/// Flatten validation errors into `field -> first message`.
pub fn field_messages(errors: &ValidationErrors) -> BTreeMap<String, String> {
    errors
        .field_errors()
        .into_iter()
        .filter_map(|(field, errs)| {
            let first = errs.first()?;
            let message = first
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| first.code.to_string());
            Some((field.to_string(), message))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, password: &str, password2: &str) -> SignupForm {
        SignupForm {
            name: name.to_string(),
            password: password.to_string(),
            password2: password2.to_string(),
            image: None,
        }
    }

    #[test]
    fn valid_form_passes() {
        assert!(form("clara", "geheim123", "geheim123").validate().is_ok());
    }

    #[test]
    fn name_limit_is_inclusive() {
        assert!(form("a".repeat(15).as_str(), "geheim123", "geheim123")
            .validate()
            .is_ok());
        let errors = form(&"a".repeat(16), "geheim123", "geheim123")
            .validate()
            .unwrap_err();
        assert_eq!(field_messages(&errors)["name"], MSG_NAME_TOO_LONG);
    }

    #[test]
    fn short_password_rejected() {
        let errors = form("clara", "kurz", "kurz").validate().unwrap_err();
        assert_eq!(field_messages(&errors)["password"], MSG_PASSWORD_TOO_SHORT);
    }

    #[test]
    fn mismatched_passwords_rejected() {
        let errors = form("clara", "geheim123", "geheim124")
            .validate()
            .unwrap_err();
        let messages = field_messages(&errors);
        assert_eq!(messages["password2"], MSG_PASSWORD_MISMATCH);
        assert!(!messages.contains_key("password"));
    }

    #[test]
    fn empty_fields_are_required() {
        let errors = form("", "geheim123", "geheim123").validate().unwrap_err();
        assert_eq!(field_messages(&errors)["name"], MSG_REQUIRED);
    }

    #[test]
    fn image_is_optional_when_deserializing() {
        let parsed: SignupForm = serde_json::from_value(serde_json::json!({
            "name": "clara",
            "password": "geheim123",
            "password2": "geheim123"
        }))
        .unwrap();
        assert!(parsed.image.is_none());
    }

    /// Every rule reports exactly the message constant callers match on.
    #[test]
    fn every_rule_uses_its_message_constant() {
        let long_name = "a".repeat(16);
        let cases = [
            (form("", "geheim123", "geheim123"), "name", MSG_REQUIRED),
            (form(&long_name, "geheim123", "geheim123"), "name", MSG_NAME_TOO_LONG),
            (form("clara", "", ""), "password", MSG_REQUIRED),
            (form("clara", "kurz", "kurz"), "password", MSG_PASSWORD_TOO_SHORT),
            (form("clara", "geheim123", ""), "password2", MSG_REQUIRED),
            (form("clara", "geheim123", "geheim124"), "password2", MSG_PASSWORD_MISMATCH),
        ];

        for (input, field, expected) in cases {
            let errors = input.validate().unwrap_err();
            let field_errors = errors.field_errors();
            let messages: Vec<String> = field_errors
                .get(field)
                .unwrap_or_else(|| panic!("no error on {field}"))
                .iter()
                .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                .collect();
            assert!(
                messages.iter().any(|m| m == expected),
                "{field}: {messages:?} does not contain {expected:?}"
            );
        }
    }

    #[test]
    fn limits_match_messages() {
        assert!(MSG_NAME_TOO_LONG.contains(&MAX_NAME_LENGTH.to_string()));
        assert!(MSG_PASSWORD_TOO_SHORT.contains(&MIN_PASSWORD_LENGTH.to_string()));
    }
}
