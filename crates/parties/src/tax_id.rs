//! Brazilian taxpayer ids: CPF (natural person) and CNPJ (legal entity).

use serde::{Deserialize, Serialize};

use fiscoerp_core::{DomainError, DomainResult, ValueObject};

/// A validated CPF or CNPJ, stored as digits only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TaxId {
    Cpf(String),
    Cnpj(String),
}

impl ValueObject for TaxId {}

impl TaxId {
    /// Parse a CPF/CNPJ, accepting the usual punctuation (`529.982.247-25`,
    /// `11.222.333/0001-81`). Check digits are verified.
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
        let stray = raw
            .chars()
            .any(|c| !c.is_ascii_digit() && !matches!(c, '.' | '-' | '/' | ' '));
        if stray {
            return Err(DomainError::validation(format!("tax id '{raw}' has invalid characters")));
        }

        match digits.len() {
            11 if cpf_check_digits_ok(&digits) => Ok(TaxId::Cpf(digits)),
            14 if cnpj_check_digits_ok(&digits) => Ok(TaxId::Cnpj(digits)),
            11 | 14 => Err(DomainError::validation(format!(
                "tax id '{raw}' has invalid check digits"
            ))),
            n => Err(DomainError::validation(format!(
                "tax id '{raw}' must have 11 (CPF) or 14 (CNPJ) digits, got {n}"
            ))),
        }
    }

    pub fn digits(&self) -> &str {
        match self {
            TaxId::Cpf(d) | TaxId::Cnpj(d) => d,
        }
    }

    pub fn is_cnpj(&self) -> bool {
        matches!(self, TaxId::Cnpj(_))
    }
}

impl core::fmt::Display for TaxId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.digits())
    }
}

impl TryFrom<String> for TaxId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TaxId::parse(&value)
    }
}

impl From<TaxId> for String {
    fn from(value: TaxId) -> Self {
        value.digits().to_string()
    }
}

fn digit_values(digits: &str) -> Vec<u32> {
    digits.chars().filter_map(|c| c.to_digit(10)).collect()
}

fn all_same(d: &[u32]) -> bool {
    d.windows(2).all(|w| w[0] == w[1])
}

fn cpf_check_digits_ok(digits: &str) -> bool {
    let d = digit_values(digits);
    if all_same(&d) {
        return false;
    }
    [9usize, 10].iter().all(|&n| {
        let sum: u32 = (0..n).map(|i| d[i] * (n as u32 + 1 - i as u32)).sum();
        (sum * 10) % 11 % 10 == d[n]
    })
}

fn cnpj_check_digits_ok(digits: &str) -> bool {
    const W1: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
    const W2: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

    let d = digit_values(digits);
    if all_same(&d) {
        return false;
    }
    let check = |weights: &[u32]| {
        let sum: u32 = weights.iter().zip(&d).map(|(w, v)| w * v).sum();
        match sum % 11 {
            0 | 1 => 0,
            r => 11 - r,
        }
    };
    check(&W1) == d[12] && check(&W2) == d[13]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_punctuated_cpf() {
        let id = TaxId::parse("529.982.247-25").unwrap();
        assert_eq!(id, TaxId::Cpf("52998224725".to_string()));
        assert!(!id.is_cnpj());
    }

    #[test]
    fn parses_punctuated_cnpj() {
        let id = TaxId::parse("11.222.333/0001-81").unwrap();
        assert_eq!(id.digits(), "11222333000181");
        assert!(id.is_cnpj());
    }

    #[test]
    fn rejects_bad_check_digit() {
        let err = TaxId::parse("529.982.247-26").unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("check digits")));
    }

    #[test]
    fn rejects_repeated_digits() {
        assert!(TaxId::parse("111.111.111-11").is_err());
        assert!(TaxId::parse("00000000000000").is_err());
    }

    #[test]
    fn rejects_wrong_length_and_letters() {
        assert!(TaxId::parse("1234").is_err());
        assert!(TaxId::parse("5299822472A").is_err());
    }

    #[test]
    fn serde_uses_digit_string() {
        let id = TaxId::parse("11.222.333/0001-81").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"11222333000181\"");
        let back: TaxId = serde_json::from_str("\"529.982.247-25\"").unwrap();
        assert_eq!(back, TaxId::Cpf("52998224725".to_string()));
    }
}
