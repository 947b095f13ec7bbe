use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Extension, Path, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    response::{IntoResponse, Response},
    routing::{delete, get, put},
};
use serde_json::json;

use crate::app::dto;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

/// Ledger routes; callers wrap them in the bearer-token middleware.
pub fn router() -> Router {
    Router::new()
        .route("/", get(get_bucket))
        .route("/moedas", get(list_currencies))
        .route("/renda", put(replace_income))
        .route("/despesas", put(replace_expenses))
        .route("/despesas/:id", delete(delete_expense))
        .route("/moeda", put(set_currency))
        .route("/resumo", get(summary))
}

pub async fn list_currencies(Extension(services): Extension<Arc<AppServices>>) -> Response {
    Json(json!({ "moedas": services.ledger.currencies() })).into_response()
}

pub async fn get_bucket(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    query: Result<Query<dto::PeriodQuery>, QueryRejection>,
) -> Response {
    let query = dto::query(query);
    match services.ledger.bucket(principal.email(), query.mes.as_deref(), query.ano.as_deref()) {
        Ok((period, bucket)) => Json(dto::bucket_to_json(period, &bucket)).into_response(),
        Err(e) => services.ledger_error(e),
    }
}

pub async fn replace_income(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<dto::ReplaceIncomeRequest>, JsonRejection>,
) -> Response {
    let body = dto::payload(body);
    let replaced = services.ledger.replace_income(
        principal.email(),
        body.mes.as_deref(),
        body.ano.as_deref(),
        body.ganhos.as_ref(),
        body.moeda.as_deref(),
    );

    match replaced {
        Ok((_, bucket)) => Json(json!({
            "ok": true,
            "ganhos": bucket.income,
            "moeda": bucket.currency,
        }))
        .into_response(),
        Err(e) => services.ledger_error(e),
    }
}

pub async fn replace_expenses(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<dto::ReplaceExpensesRequest>, JsonRejection>,
) -> Response {
    let body = dto::payload(body);
    let replaced = services.ledger.replace_expenses(
        principal.email(),
        body.mes.as_deref(),
        body.ano.as_deref(),
        body.despesas.as_ref(),
        body.moeda.as_deref(),
    );

    match replaced {
        Ok((_, bucket)) => Json(json!({
            "ok": true,
            "despesas": bucket.expenses,
            "moeda": bucket.currency,
        }))
        .into_response(),
        Err(e) => services.ledger_error(e),
    }
}

pub async fn set_currency(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<dto::SetCurrencyRequest>, JsonRejection>,
) -> Response {
    let body = dto::payload(body);
    match services
        .ledger
        .set_currency(principal.email(), body.mes.as_deref(), body.ano.as_deref(), body.moeda.as_deref())
    {
        Ok((_, currency)) => Json(json!({ "ok": true, "moeda": currency })).into_response(),
        Err(e) => services.ledger_error(e),
    }
}

pub async fn delete_expense(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    query: Result<Query<dto::PeriodQuery>, QueryRejection>,
) -> Response {
    let query = dto::query(query);
    match services
        .ledger
        .delete_expense(principal.email(), Some(&id), query.mes.as_deref(), query.ano.as_deref())
    {
        Ok(removed) => Json(json!({ "ok": true, "removed": removed })).into_response(),
        Err(e) => services.ledger_error(e),
    }
}

pub async fn summary(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    query: Result<Query<dto::PeriodQuery>, QueryRejection>,
) -> Response {
    let query = dto::query(query);
    match services.ledger.summary(principal.email(), query.mes.as_deref(), query.ano.as_deref()) {
        Ok((period, currency, totals)) => Json(dto::summary_to_json(period, currency, totals)).into_response(),
        Err(e) => services.ledger_error(e),
    }
}
