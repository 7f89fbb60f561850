use serde::{Deserialize, Serialize};

use fiscoerp_core::ValueObject;

/// Postal address as registered for a party.
///
/// Every field is optional because customer records are frequently
/// incomplete. Emitters must have a complete one (see `Emitter::validate`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Address {
    /// Logradouro.
    pub street: Option<String>,
    pub number: Option<String>,
    pub complement: Option<String>,
    /// Bairro.
    pub district: Option<String>,
    /// Município (name).
    pub municipality: Option<String>,
    /// UF, two letters.
    pub state: Option<String>,
    /// CEP, digits only or `00000-000`.
    pub postal_code: Option<String>,
}

impl ValueObject for Address {}

impl Address {
    /// CEP with punctuation removed, if present and non-blank.
    pub fn postal_code_digits(&self) -> Option<String> {
        self.postal_code
            .as_deref()
            .map(|c| c.chars().filter(|ch| ch.is_ascii_digit()).collect::<String>())
            .filter(|c| !c.is_empty())
    }
}

/// Returns the trimmed value when present and non-blank.
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postal_code_digits_strips_punctuation() {
        let addr = Address {
            postal_code: Some("01001-000".to_string()),
            ..Address::default()
        };
        assert_eq!(addr.postal_code_digits().as_deref(), Some("01001000"));
    }

    #[test]
    fn blank_values_are_absent() {
        assert_eq!(non_blank(&Some("   ".to_string())), None);
        assert_eq!(non_blank(&None), None);
        assert_eq!(non_blank(&Some(" Centro ".to_string())), Some("Centro"));
    }
}
