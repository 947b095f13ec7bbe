//! Ledger operations over an injected [`LedgerStore`].
//!
//! Inputs arrive as loosely-typed request fields; every operation validates
//! them and reports problems as `DomainError::Validation`.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use smartquota_core::{Currency, CurrencyInfo, DomainError, DomainResult, Email, Period};

use crate::bucket::{Bucket, ExpenseEntry, IncomeEntry, Summary};
use crate::store::LedgerStore;

/// Which list a replace operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Income,
    Expense,
}

impl EntryKind {
    fn missing_message(&self) -> &'static str {
        match self {
            EntryKind::Income => "Informe mes, ano e array de ganhos",
            EntryKind::Expense => "Informe mes, ano e array de despesas",
        }
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn period(month: Option<&str>, year: Option<&str>, missing: &'static str) -> DomainResult<Period> {
    match (present(month), present(year)) {
        (Some(m), Some(y)) => Period::parse(m, y),
        _ => Err(DomainError::validation(missing)),
    }
}

fn optional_currency(currency: Option<&str>) -> DomainResult<Option<Currency>> {
    present(currency).map(str::parse::<Currency>).transpose()
}

#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
}

impl LedgerService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// The supported currencies keyed by code.
    pub fn currencies(&self) -> BTreeMap<&'static str, CurrencyInfo> {
        Currency::ALL.into_iter().map(|c| (c.code(), c.info())).collect()
    }

    pub fn bucket(&self, owner: &Email, month: Option<&str>, year: Option<&str>) -> DomainResult<(Period, Bucket)> {
        let period = period(month, year, "Parâmetros mes e ano são obrigatórios")?;
        Ok((period, self.store.get_or_create(owner, period)?))
    }

    /// Replace the income or expense list wholesale, optionally switching currency.
    pub fn replace_entries(
        &self,
        owner: &Email,
        kind: EntryKind,
        month: Option<&str>,
        year: Option<&str>,
        items: Option<&Value>,
        currency: Option<&str>,
    ) -> DomainResult<(Period, Bucket)> {
        let (Some(period_result), Some(items)) = (
            present(month).zip(present(year)).map(|(m, y)| Period::parse(m, y)),
            items.and_then(Value::as_array),
        ) else {
            return Err(DomainError::validation(kind.missing_message()));
        };
        let period = period_result?;
        let currency = optional_currency(currency)?;

        let bucket = match kind {
            EntryKind::Income => {
                let mut entries: Vec<IncomeEntry> = items.iter().map(IncomeEntry::sanitize).collect();
                self.store.update(owner, period, &mut |b: &mut Bucket| {
                    b.income = std::mem::take(&mut entries);
                    if let Some(c) = currency {
                        b.currency = c;
                    }
                })?
            }
            EntryKind::Expense => {
                let mut entries: Vec<ExpenseEntry> = items.iter().map(ExpenseEntry::sanitize).collect();
                self.store.update(owner, period, &mut |b: &mut Bucket| {
                    b.expenses = std::mem::take(&mut entries);
                    if let Some(c) = currency {
                        b.currency = c;
                    }
                })?
            }
        };

        tracing::debug!(owner = %owner, %period, ?kind, "ledger entries replaced");
        Ok((period, bucket))
    }

    pub fn replace_income(
        &self,
        owner: &Email,
        month: Option<&str>,
        year: Option<&str>,
        items: Option<&Value>,
        currency: Option<&str>,
    ) -> DomainResult<(Period, Bucket)> {
        self.replace_entries(owner, EntryKind::Income, month, year, items, currency)
    }

    pub fn replace_expenses(
        &self,
        owner: &Email,
        month: Option<&str>,
        year: Option<&str>,
        items: Option<&Value>,
        currency: Option<&str>,
    ) -> DomainResult<(Period, Bucket)> {
        self.replace_entries(owner, EntryKind::Expense, month, year, items, currency)
    }

    pub fn set_currency(
        &self,
        owner: &Email,
        month: Option<&str>,
        year: Option<&str>,
        currency: Option<&str>,
    ) -> DomainResult<(Period, Currency)> {
        const MISSING: &str = "Informe mes, ano e moeda";
        let currency = present(currency).ok_or_else(|| DomainError::validation(MISSING))?;
        let period = period(month, year, MISSING)?;
        let currency: Currency = currency.parse()?;

        let bucket = self.store.update(owner, period, &mut |b: &mut Bucket| b.currency = currency)?;
        Ok((period, bucket.currency))
    }

    /// Remove at most one expense by id; a missing id is not an error.
    pub fn delete_expense(
        &self,
        owner: &Email,
        id: Option<&str>,
        month: Option<&str>,
        year: Option<&str>,
    ) -> DomainResult<usize> {
        const MISSING: &str = "Informe id, mes e ano";
        let id = present(id).ok_or_else(|| DomainError::validation(MISSING))?;
        let period = period(month, year, MISSING)?;

        let mut removed = 0;
        self.store.update(owner, period, &mut |b: &mut Bucket| removed = b.remove_expense(id))?;
        Ok(removed)
    }

    pub fn summary(
        &self,
        owner: &Email,
        month: Option<&str>,
        year: Option<&str>,
    ) -> DomainResult<(Period, Currency, Summary)> {
        let (period, bucket) = self.bucket(owner, month, year)?;
        Ok((period, bucket.currency, bucket.summary()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::store::InMemoryLedgerStore;

    fn service() -> LedgerService {
        LedgerService::new(Arc::new(InMemoryLedgerStore::new()))
    }

    fn ana() -> Email {
        Email::parse("ana@b.com").unwrap()
    }

    #[test]
    fn replace_income_then_summary() {
        let ledger = service();
        let items = json!([{"descricao": "Salário", "valor": 1000}]);
        ledger.replace_income(&ana(), Some("3"), Some("2024"), Some(&items), None).unwrap();

        let (period, currency, s) = ledger.summary(&ana(), Some("03"), Some("2024")).unwrap();
        assert_eq!(period.month_label(), "03");
        assert_eq!(currency, Currency::Eur);
        assert_eq!(s.total_income, 1000.0);
        assert_eq!(s.total_expense, 0.0);
        assert_eq!(s.balance, 1000.0);
    }

    #[test]
    fn replace_is_wholesale() {
        let ledger = service();
        let first = json!([{"id": "a", "valor": 1}, {"id": "b", "valor": 2}]);
        let second = json!([{"id": "c", "valor": 5}]);
        ledger.replace_expenses(&ana(), Some("1"), Some("2024"), Some(&first), None).unwrap();
        let (_, bucket) = ledger.replace_expenses(&ana(), Some("1"), Some("2024"), Some(&second), None).unwrap();

        assert_eq!(bucket.expenses.len(), 1);
        assert_eq!(bucket.expenses[0].id, "c");
    }

    #[test]
    fn replace_can_switch_currency() {
        let ledger = service();
        let (_, bucket) = ledger
            .replace_income(&ana(), Some("1"), Some("2024"), Some(&json!([])), Some("brl"))
            .unwrap();
        assert_eq!(bucket.currency, Currency::Brl);
    }

    #[test]
    fn replace_rejects_missing_or_malformed_input() {
        let ledger = service();
        let items = json!([]);

        let err = ledger.replace_income(&ana(), None, Some("2024"), Some(&items), None).unwrap_err();
        assert_eq!(err, DomainError::validation("Informe mes, ano e array de ganhos"));

        let err = ledger
            .replace_expenses(&ana(), Some("1"), Some("2024"), Some(&json!({"not": "a list"})), None)
            .unwrap_err();
        assert_eq!(err, DomainError::validation("Informe mes, ano e array de despesas"));

        let err = ledger.replace_income(&ana(), Some("13"), Some("2024"), Some(&items), None).unwrap_err();
        assert_eq!(err, DomainError::validation("Mês inválido"));

        let err = ledger
            .replace_income(&ana(), Some("1"), Some("2024"), Some(&items), Some("XYZ"))
            .unwrap_err();
        assert_eq!(err, DomainError::validation("Moeda não suportada"));
    }

    #[test]
    fn set_currency_validates_against_supported_set() {
        let ledger = service();
        let (_, c) = ledger.set_currency(&ana(), Some("2"), Some("2024"), Some("GBP")).unwrap();
        assert_eq!(c, Currency::Gbp);

        let err = ledger.set_currency(&ana(), Some("2"), Some("2024"), Some("DOGE")).unwrap_err();
        assert_eq!(err, DomainError::validation("Moeda não suportada"));

        let err = ledger.set_currency(&ana(), Some("2"), Some("2024"), None).unwrap_err();
        assert_eq!(err, DomainError::validation("Informe mes, ano e moeda"));

        let (_, bucket) = ledger.bucket(&ana(), Some("2"), Some("2024")).unwrap();
        assert_eq!(bucket.currency, Currency::Gbp);
    }

    #[test]
    fn delete_missing_expense_removes_nothing() {
        let ledger = service();
        let items = json!([{"id": "a", "valor": 1}, {"id": "b", "valor": 2}]);
        ledger.replace_expenses(&ana(), Some("5"), Some("2024"), Some(&items), None).unwrap();

        assert_eq!(ledger.delete_expense(&ana(), Some("zzz"), Some("5"), Some("2024")).unwrap(), 0);
        assert_eq!(ledger.delete_expense(&ana(), Some("a"), Some("05"), Some("2024")).unwrap(), 1);

        let (_, bucket) = ledger.bucket(&ana(), Some("5"), Some("2024")).unwrap();
        assert_eq!(bucket.expenses.len(), 1);
        assert_eq!(bucket.expenses[0].id, "b");
    }

    #[test]
    fn currencies_lists_the_fixed_set() {
        let all = service().currencies();
        assert_eq!(all.keys().copied().collect::<Vec<_>>(), vec!["BRL", "EUR", "GBP", "JPY", "USD"]);
        assert_eq!(all["BRL"].symbol, "R$");
    }
}
