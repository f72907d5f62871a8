// src/routes.rs

use axum::{
    routing::{get, patch, post},
    Json, Router,
};
use utoipa::OpenApi;

use crate::{config::AppState, docs::ApiDoc, handlers};

/// Router completo da aplicação (também usado pelos testes).
pub fn app(app_state: AppState) -> Router {
    let estoque_routes = Router::new()
        .route("/", get(handlers::estoque::listar_estoque))
        .route("/mapa", get(handlers::estoque::mapa_estoque))
        .route("/verificar/{codigo_item}", get(handlers::estoque::verificar_estoque))
        .route("/usar", post(handlers::estoque::usar_estoque));

    let purchase_order_routes = Router::new().route(
        "/{po_id}/itens/{item_index}/status",
        patch(handlers::purchase_orders::atualizar_status_item),
    );

    let admin_routes = Router::new().route(
        "/limpar-dados-estoque-inconsistentes",
        post(handlers::admin::limpar_dados_estoque_inconsistentes),
    );

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .nest("/api/estoque", estoque_routes)
        .nest("/api/purchase-orders", purchase_order_routes)
        .nest("/api/admin", admin_routes)
        .with_state(app_state)
}
