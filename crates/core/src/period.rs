//! Calendar month addressing for ledger buckets.

use serde::{Serialize, Serializer};

use crate::error::DomainError;

/// A calendar month (`year`, `month`).
///
/// On the wire the month is the two-digit zero-padded string (`"03"`) and the
/// year its plain decimal string (`"2024"`), matching what clients send as
/// `mes`/`ano`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Period {
    year: u16,
    month: u8,
}

impl Period {
    pub fn new(year: u16, month: u8) -> Result<Self, DomainError> {
        if !(1..=9999).contains(&year) {
            return Err(DomainError::validation("Ano inválido"));
        }
        if !(1..=12).contains(&month) {
            return Err(DomainError::validation("Mês inválido"));
        }
        Ok(Self { year, month })
    }

    /// Parse the textual `mes`/`ano` pair sent by clients (`"3"`, `"03"`, `"2024"`).
    pub fn parse(month: &str, year: &str) -> Result<Self, DomainError> {
        let month: u8 = month
            .trim()
            .parse()
            .map_err(|_| DomainError::validation("Mês inválido"))?;
        let year: u16 = year
            .trim()
            .parse()
            .map_err(|_| DomainError::validation("Ano inválido"))?;
        Self::new(year, month)
    }

    pub fn month_label(&self) -> String {
        format!("{:02}", self.month)
    }

    pub fn year_label(&self) -> String {
        self.year.to_string()
    }
}

impl core::fmt::Display for Period {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_and_unpadded_months_are_the_same_period() {
        assert_eq!(Period::parse("3", "2024").unwrap(), Period::parse("03", "2024").unwrap());
    }

    #[test]
    fn labels_are_zero_padded() {
        let p = Period::parse("7", " 2025 ").unwrap();
        assert_eq!(p.month_label(), "07");
        assert_eq!(p.year_label(), "2025");
        assert_eq!(p.to_string(), "2025-07");
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert_eq!(Period::parse("13", "2024"), Err(DomainError::validation("Mês inválido")));
        assert_eq!(Period::parse("0", "2024"), Err(DomainError::validation("Mês inválido")));
        assert_eq!(Period::parse("1", "0"), Err(DomainError::validation("Ano inválido")));
        assert_eq!(Period::parse("abc", "2024"), Err(DomainError::validation("Mês inválido")));
        assert_eq!(Period::parse("1", "20x4"), Err(DomainError::validation("Ano inválido")));
    }
}
