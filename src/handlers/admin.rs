// src/handlers/admin.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::i18n::Locale,
    models::reconciliacao::RelatorioReconciliacao,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReconciliacaoQuery {
    /// Só calcula o relatório, sem gravar nada.
    #[serde(default)]
    pub simular: bool,
}

// POST /api/admin/limpar-dados-estoque-inconsistentes
#[utoipa::path(
    post,
    path = "/api/admin/limpar-dados-estoque-inconsistentes",
    tag = "Admin",
    params(ReconciliacaoQuery),
    responses(
        (status = 200, description = "Relatório das correções aplicadas", body = RelatorioReconciliacao)
    )
)]
pub async fn limpar_dados_estoque_inconsistentes(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<ReconciliacaoQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let relatorio = app_state
        .reconciliation_service
        .reconciliar(query.simular)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(relatorio)))
}
