use axum::{
    Json,
    extract::{
        Query,
        rejection::{JsonRejection, QueryRejection},
    },
};
use serde::Deserialize;
use serde_json::{Value, json};

use smartquota_clients::Client;
use smartquota_core::{Currency, Period, input::loose_text};
use smartquota_ledger::{Bucket, Summary};

// -------------------------
// Request DTOs
// -------------------------

/// Unwrap a JSON body. A missing or unparseable body is treated as an empty
/// payload so the handler reports its own validation message.
pub fn payload<T: Default>(body: Result<Json<T>, JsonRejection>) -> T {
    match body {
        Ok(Json(v)) => v,
        Err(rejection) => {
            tracing::debug!(reason = %rejection.body_text(), "request body rejected");
            T::default()
        }
    }
}

/// Unwrap a query string the same way: one that does not deserialize (repeated
/// or malformed keys) reads as empty.
pub fn query<T: Default>(query: Result<Query<T>, QueryRejection>) -> T {
    match query {
        Ok(Query(v)) => v,
        Err(rejection) => {
            tracing::debug!(reason = %rejection.body_text(), "query string rejected");
            T::default()
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default, deserialize_with = "loose_text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub senha: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub password: Option<String>,
}

impl LoginRequest {
    /// `senha` wins over `password` when both are given.
    pub fn password(&self) -> Option<&str> {
        non_blank(&self.senha).or_else(|| non_blank(&self.password))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default, deserialize_with = "loose_text")]
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default, deserialize_with = "loose_text")]
    pub token: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub senha: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub password: Option<String>,
}

impl ResetPasswordRequest {
    pub fn password(&self) -> Option<&str> {
        non_blank(&self.senha).or_else(|| non_blank(&self.password))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfirmQuery {
    pub email: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    pub mes: Option<String>,
    pub ano: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReplaceIncomeRequest {
    #[serde(default, deserialize_with = "loose_text")]
    pub mes: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub ano: Option<String>,
    #[serde(default)]
    pub ganhos: Option<Value>,
    #[serde(default, deserialize_with = "loose_text")]
    pub moeda: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReplaceExpensesRequest {
    #[serde(default, deserialize_with = "loose_text")]
    pub mes: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub ano: Option<String>,
    #[serde(default)]
    pub despesas: Option<Value>,
    #[serde(default, deserialize_with = "loose_text")]
    pub moeda: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SetCurrencyRequest {
    #[serde(default, deserialize_with = "loose_text")]
    pub mes: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub ano: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub moeda: Option<String>,
}

// -------------------------
// Response mapping helpers
// -------------------------

pub fn login_user_to_json(client: &Client) -> Value {
    json!({
        "nome": client.name,
        "email": client.email,
        "confirmado": client.confirmed,
    })
}

pub fn me_user_to_json(client: &Client) -> Value {
    json!({
        "nome": client.name,
        "email": client.email,
        "confirmado": client.confirmed,
        "moeda": client.currency,
        "locale": client.currency.info().locale,
    })
}

pub fn bucket_to_json(period: Period, bucket: &Bucket) -> Value {
    json!({
        "mes": period.month_label(),
        "ano": period.year_label(),
        "moeda": bucket.currency,
        "ganhos": bucket.income,
        "despesas": bucket.expenses,
    })
}

pub fn summary_to_json(period: Period, currency: Currency, summary: Summary) -> Value {
    json!({
        "mes": period.month_label(),
        "ano": period.year_label(),
        "moeda": currency,
        "totalGanhos": summary.total_income,
        "totalDespesas": summary.total_expense,
        "saldo": summary.balance,
    })
}
