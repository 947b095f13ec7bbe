//! Supported currencies and their display metadata.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// User-facing message for an unsupported currency code.
pub const UNSUPPORTED_CURRENCY: &str = "Moeda não suportada";

/// The fixed set of currencies a ledger bucket or client profile can use.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Eur,
    Usd,
    Brl,
    Gbp,
    Jpy,
}

/// Display metadata for a currency (`nome`, `simbolo`, `locale` on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CurrencyInfo {
    #[serde(rename = "nome")]
    pub name: &'static str,
    #[serde(rename = "simbolo")]
    pub symbol: &'static str,
    pub locale: &'static str,
}

impl Currency {
    pub const ALL: [Currency; 5] = [
        Currency::Eur,
        Currency::Usd,
        Currency::Brl,
        Currency::Gbp,
        Currency::Jpy,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
            Currency::Brl => "BRL",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
        }
    }

    pub fn info(&self) -> CurrencyInfo {
        match self {
            Currency::Eur => CurrencyInfo { name: "Euro", symbol: "€", locale: "pt-PT" },
            Currency::Usd => CurrencyInfo { name: "Dólar Americano", symbol: "$", locale: "en-US" },
            Currency::Brl => CurrencyInfo { name: "Real Brasileiro", symbol: "R$", locale: "pt-BR" },
            Currency::Gbp => CurrencyInfo { name: "Libra Esterlina", symbol: "£", locale: "en-GB" },
            Currency::Jpy => CurrencyInfo { name: "Iene Japonês", symbol: "¥", locale: "ja-JP" },
        }
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = DomainError;

    /// Codes are matched case-insensitively after trimming.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        Currency::ALL
            .into_iter()
            .find(|c| c.code() == code)
            .ok_or_else(|| DomainError::validation(UNSUPPORTED_CURRENCY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_codes_case_insensitively() {
        assert_eq!("brl".parse::<Currency>().unwrap(), Currency::Brl);
        assert_eq!(" USD ".parse::<Currency>().unwrap(), Currency::Usd);
    }

    #[test]
    fn rejects_unknown_codes() {
        let err = "XYZ".parse::<Currency>().unwrap_err();
        assert_eq!(err, DomainError::validation(UNSUPPORTED_CURRENCY));
    }

    #[test]
    fn serializes_as_code() {
        assert_eq!(serde_json::to_value(Currency::Gbp).unwrap(), "GBP");
        assert_eq!(Currency::default(), Currency::Eur);
    }

    #[test]
    fn info_uses_portuguese_wire_names() {
        let v = serde_json::to_value(Currency::Jpy.info()).unwrap();
        assert_eq!(v["nome"], "Iene Japonês");
        assert_eq!(v["simbolo"], "¥");
        assert_eq!(v["locale"], "ja-JP");
    }
}
