//! Monthly buckets: income and expense lists plus the currency they are kept in.

use serde::Serialize;
use serde_json::Value;

use smartquota_core::{Currency, input::{lenient_amount, scalar_text}, new_entry_id};

pub const DEFAULT_CATEGORY: &str = "Outros";

/// One income line (`ganhos[]`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncomeEntry {
    pub id: String,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "valor")]
    pub amount: f64,
}

/// One expense line (`despesas[]`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseEntry {
    pub id: String,
    #[serde(rename = "categoria")]
    pub category: String,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "valor")]
    pub amount: f64,
}

fn text_field(item: &Value, key: &str) -> Option<String> {
    item.get(key).and_then(scalar_text).filter(|s| !s.is_empty())
}

impl IncomeEntry {
    /// Coerce an arbitrary submitted item. Never fails: missing ids are
    /// generated, missing text becomes empty and bad amounts become zero.
    pub fn sanitize(item: &Value) -> Self {
        Self {
            id: text_field(item, "id").unwrap_or_else(new_entry_id),
            description: text_field(item, "descricao").unwrap_or_default(),
            amount: lenient_amount(item.get("valor")),
        }
    }
}

impl ExpenseEntry {
    pub fn sanitize(item: &Value) -> Self {
        Self {
            id: text_field(item, "id").unwrap_or_else(new_entry_id),
            category: text_field(item, "categoria").unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            description: text_field(item, "descricao").unwrap_or_default(),
            amount: lenient_amount(item.get("valor")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Bucket {
    #[serde(rename = "ganhos")]
    pub income: Vec<IncomeEntry>,
    #[serde(rename = "despesas")]
    pub expenses: Vec<ExpenseEntry>,
    #[serde(rename = "moeda")]
    pub currency: Currency,
}

/// Monthly totals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    #[serde(rename = "totalGanhos")]
    pub total_income: f64,
    #[serde(rename = "totalDespesas")]
    pub total_expense: f64,
    #[serde(rename = "saldo")]
    pub balance: f64,
}

impl Bucket {
    pub fn summary(&self) -> Summary {
        let total_income: f64 = self.income.iter().map(|e| e.amount).sum();
        let total_expense: f64 = self.expenses.iter().map(|e| e.amount).sum();
        Summary {
            total_income,
            total_expense,
            balance: total_income - total_expense,
        }
    }

    /// Remove the first expense with `id`. Returns how many entries were removed (0 or 1).
    pub fn remove_expense(&mut self, id: &str) -> usize {
        match self.expenses.iter().position(|e| e.id == id) {
            Some(idx) => {
                self.expenses.remove(idx);
                1
            }
            None => 0,
        }
    }
}
