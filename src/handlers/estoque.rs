// src/handlers/estoque.rs

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::estoque::{EstoqueItemResponse, ResultadoUsoEstoque},
};

// ---
// Validação Customizada
// ---
fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("A quantidade deve ser maior que zero.".into());
        return Err(err);
    }
    Ok(())
}

// GET /api/estoque
#[utoipa::path(
    get,
    path = "/api/estoque",
    tag = "Estoque",
    responses(
        (status = 200, description = "Estoque disponível por código de item", body = [EstoqueItemResponse])
    )
)]
pub async fn listar_estoque(State(app_state): State<AppState>) -> impl IntoResponse {
    let itens: Vec<EstoqueItemResponse> = app_state
        .ledger_service
        .listar()
        .await
        .into_values()
        .map(EstoqueItemResponse::from)
        .collect();

    (StatusCode::OK, Json(itens))
}

// GET /api/estoque/mapa
#[utoipa::path(
    get,
    path = "/api/estoque/mapa",
    tag = "Estoque",
    responses(
        (status = 200, description = "Objeto JSON {codigo_item: disponível}")
    )
)]
pub async fn mapa_estoque(State(app_state): State<AppState>) -> impl IntoResponse {
    let mapa: HashMap<String, Decimal> = app_state.ledger_service.mapa().await;
    (StatusCode::OK, Json(mapa))
}

// GET /api/estoque/verificar/{codigo_item}
#[utoipa::path(
    get,
    path = "/api/estoque/verificar/{codigo_item}",
    tag = "Estoque",
    params(
        ("codigo_item" = String, Path, description = "Código do item")
    ),
    responses(
        (status = 200, description = "Entrada do ledger (zerada se o código não tem estoque)", body = EstoqueItemResponse)
    )
)]
pub async fn verificar_estoque(
    State(app_state): State<AppState>,
    Path(codigo_item): Path<String>,
) -> impl IntoResponse {
    let entrada = app_state.ledger_service.verificar(&codigo_item).await;
    (StatusCode::OK, Json(EstoqueItemResponse::from(entrada)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UsarEstoquePayload {
    pub po_id: Uuid,
    #[schema(example = 0)]
    pub item_index: usize,
    #[validate(custom(function = "validate_positive"))]
    #[schema(example = "2")]
    pub quantidade_usar: Decimal,
}

// POST /api/estoque/usar
#[utoipa::path(
    post,
    path = "/api/estoque/usar",
    tag = "Estoque",
    request_body = UsarEstoquePayload,
    responses(
        (status = 200, description = "Quantidade retirada do estoque (pode ser parcial)", body = ResultadoUsoEstoque),
        (status = 400, description = "Quantidade inválida ou item não elegível"),
        (status = 404, description = "OC ou item não encontrado")
    )
)]
pub async fn usar_estoque(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<UsarEstoquePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let resultado = app_state
        .allocation_service
        .usar_estoque(payload.po_id, payload.item_index, payload.quantidade_usar)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(resultado)))
}
