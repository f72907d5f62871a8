// src/handlers/purchase_orders.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::i18n::Locale,
    models::purchase_order::{ItemStatus, ResultadoStatus},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AtualizarStatusPayload {
    #[schema(example = "cotado")]
    pub status: ItemStatus,
}

// PATCH /api/purchase-orders/{po_id}/itens/{item_index}/status
// Regressão para pendente/cotado reverte o uso de estoque do item.
#[utoipa::path(
    patch,
    path = "/api/purchase-orders/{po_id}/itens/{item_index}/status",
    tag = "Ordens de Compra",
    request_body = AtualizarStatusPayload,
    params(
        ("po_id" = Uuid, Path, description = "ID da OC"),
        ("item_index" = usize, Path, description = "Posição do item na OC")
    ),
    responses(
        (status = 200, description = "Status atualizado (com a reversão, se houve)", body = ResultadoStatus),
        (status = 404, description = "OC ou item não encontrado")
    )
)]
pub async fn atualizar_status_item(
    State(app_state): State<AppState>,
    locale: Locale,
    Path((po_id, item_index)): Path<(Uuid, usize)>,
    Json(payload): Json<AtualizarStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let resultado = app_state
        .status_service
        .atualizar_status(po_id, item_index, payload.status)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(resultado)))
}
