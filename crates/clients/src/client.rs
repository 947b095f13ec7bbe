//! Client records, registration input and the sanitized profile view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use smartquota_auth::ResetToken;
use smartquota_core::{ClientId, Currency, Email, UNSUPPORTED_CURRENCY, input::{loose_object, loose_text}};

/// Postal address (`endereco` on the wire).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(rename = "rua")]
    pub street: String,
    #[serde(rename = "numero")]
    pub number: String,
    #[serde(rename = "cidade")]
    pub city: String,
    #[serde(rename = "estado")]
    pub state: String,
    #[serde(rename = "pais")]
    pub country: String,
}

/// A registered client as held by the repository.
///
/// The password hash and reset token never leave the registry; callers render
/// [`ClientProfile`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub email: Email,
    pub phone: String,
    pub address: Address,
    pub password_hash: String,
    pub currency: Currency,
    pub confirmed: bool,
    pub created_at: DateTime<Utc>,
    pub reset: Option<ResetToken>,
}

impl Client {
    pub fn profile(&self) -> ClientProfile {
        ClientProfile {
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
            currency: self.currency,
            confirmed: self.confirmed,
            created_at: self.created_at,
        }
    }

    /// First word of the name, for greetings.
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}

/// Sanitized client view returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientProfile {
    #[serde(rename = "nome")]
    pub name: String,
    pub email: Email,
    #[serde(rename = "telefone")]
    pub phone: String,
    #[serde(rename = "endereco")]
    pub address: Address,
    #[serde(rename = "moeda")]
    pub currency: Currency,
    #[serde(rename = "confirmado")]
    pub confirmed: bool,
    #[serde(rename = "criadoEm")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressInput {
    #[serde(default, rename = "rua", deserialize_with = "loose_text")]
    pub street: Option<String>,
    #[serde(default, rename = "numero", deserialize_with = "loose_text")]
    pub number: Option<String>,
    #[serde(default, rename = "cidade", deserialize_with = "loose_text")]
    pub city: Option<String>,
    #[serde(default, rename = "estado", deserialize_with = "loose_text")]
    pub state: Option<String>,
    #[serde(default, rename = "pais", deserialize_with = "loose_text")]
    pub country: Option<String>,
}

/// Raw registration payload. Every field is optional so that validation can
/// report all problems at once.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Registration {
    #[serde(default, rename = "nome", deserialize_with = "loose_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub email: Option<String>,
    #[serde(default, rename = "telefone", deserialize_with = "loose_text")]
    pub phone: Option<String>,
    #[serde(default, rename = "senha", deserialize_with = "loose_text")]
    pub password: Option<String>,
    #[serde(default, rename = "moeda", deserialize_with = "loose_text")]
    pub currency: Option<String>,
    #[serde(default, rename = "endereco", deserialize_with = "loose_object")]
    pub address: Option<AddressInput>,
}

/// A registration that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRegistration {
    pub name: String,
    pub email: Email,
    pub phone: String,
    pub password: String,
    pub currency: Currency,
    pub address: Address,
}

fn required(value: &Option<String>, message: &'static str, errors: &mut Vec<&'static str>) -> String {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => {
            errors.push(message);
            String::new()
        }
    }
}

impl Registration {
    /// Validate the payload, returning either the clean registration or every
    /// validation message that applies.
    pub fn validate(self) -> Result<ValidRegistration, Vec<&'static str>> {
        let mut errors = Vec::new();

        let name = required(&self.name, "Nome é obrigatório", &mut errors);
        let email = required(&self.email, "Email é obrigatório", &mut errors);
        let phone = required(&self.phone, "Telefone é obrigatório", &mut errors);
        if self.password.as_deref().is_none_or(|p| p.trim().is_empty()) {
            errors.push("Senha é obrigatória");
        }
        let currency = required(&self.currency, "Moeda é obrigatória", &mut errors);

        let addr = self.address.unwrap_or_default();
        let address = Address {
            street: required(&addr.street, "Rua é obrigatória", &mut errors),
            number: required(&addr.number, "Número é obrigatório", &mut errors),
            city: required(&addr.city, "Cidade é obrigatória", &mut errors),
            state: required(&addr.state, "Estado/Província é obrigatório", &mut errors),
            country: required(&addr.country, "País é obrigatório", &mut errors),
        };

        let currency = if currency.is_empty() {
            None
        } else {
            match currency.parse::<Currency>() {
                Ok(c) => Some(c),
                Err(_) => {
                    errors.push(UNSUPPORTED_CURRENCY);
                    None
                }
            }
        };

        match (errors.is_empty(), Email::parse(&email), currency, self.password) {
            (true, Some(email), Some(currency), Some(password)) => Ok(ValidRegistration {
                name,
                email,
                phone,
                password,
                currency,
                address,
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn ana() -> serde_json::Value {
        json!({
            "nome": " Ana Souza ",
            "email": "Ana@B.com",
            "telefone": 123,
            "senha": "x",
            "moeda": "eur",
            "endereco": {"rua": "Rua A", "numero": 10, "cidade": "Lisboa", "estado": "LX", "pais": "PT"}
        })
    }

    #[test]
    fn valid_payload_is_normalized() {
        let reg: Registration = serde_json::from_value(ana()).unwrap();
        let valid = reg.validate().unwrap();
        assert_eq!(valid.name, "Ana Souza");
        assert_eq!(valid.email.as_str(), "ana@b.com");
        assert_eq!(valid.phone, "123");
        assert_eq!(valid.currency, Currency::Eur);
        assert_eq!(valid.address.number, "10");
    }

    #[test]
    fn every_missing_field_is_reported() {
        let reg: Registration = serde_json::from_value(json!({"nome": "Ana", "endereco": {"rua": "  "}})).unwrap();
        let errors = reg.validate().unwrap_err();
        assert_eq!(
            errors,
            vec![
                "Email é obrigatório",
                "Telefone é obrigatório",
                "Senha é obrigatória",
                "Moeda é obrigatória",
                "Rua é obrigatória",
                "Número é obrigatório",
                "Cidade é obrigatória",
                "Estado/Província é obrigatório",
                "País é obrigatório",
            ]
        );
    }

    #[test]
    fn address_given_as_text_only_fails_the_address_fields() {
        let mut body = ana();
        body["endereco"] = json!("Rua A 1, Lisboa");
        let reg: Registration = serde_json::from_value(body).unwrap();
        assert_eq!(
            reg.validate().unwrap_err(),
            vec![
                "Rua é obrigatória",
                "Número é obrigatório",
                "Cidade é obrigatória",
                "Estado/Província é obrigatório",
                "País é obrigatório",
            ]
        );
    }

    #[test]
    fn unsupported_currency_is_a_validation_error() {
        let mut body = ana();
        body["moeda"] = json!("XYZ");
        let reg: Registration = serde_json::from_value(body).unwrap();
        assert_eq!(reg.validate().unwrap_err(), vec![UNSUPPORTED_CURRENCY]);
    }

    #[test]
    fn profile_uses_wire_names_and_hides_secrets() {
        let reg: Registration = serde_json::from_value(ana()).unwrap();
        let valid = reg.validate().unwrap();
        let client = Client {
            id: ClientId::new(),
            name: valid.name,
            email: valid.email,
            phone: valid.phone,
            address: valid.address,
            password_hash: "$argon2id$secret".into(),
            currency: valid.currency,
            confirmed: false,
            created_at: Utc::now(),
            reset: None,
        };
        assert_eq!(client.first_name(), "Ana");

        let v = serde_json::to_value(client.profile()).unwrap();
        assert_eq!(v["nome"], "Ana Souza");
        assert_eq!(v["moeda"], "EUR");
        assert_eq!(v["confirmado"], false);
        assert_eq!(v["endereco"]["cidade"], "Lisboa");
        assert!(v.get("senha").is_none());
        assert!(!v.to_string().contains("argon2"));
    }
}
