// src/docs.rs

use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- ESTOQUE ---
        handlers::estoque::listar_estoque,
        handlers::estoque::mapa_estoque,
        handlers::estoque::verificar_estoque,
        handlers::estoque::usar_estoque,

        // --- ORDENS DE COMPRA ---
        handlers::purchase_orders::atualizar_status_item,

        // --- ADMIN ---
        handlers::admin::limpar_dados_estoque_inconsistentes,
    ),
    components(
        schemas(
            // --- Ordens de Compra ---
            models::purchase_order::ItemStatus,
            models::purchase_order::TipoOrigem,
            models::purchase_order::FonteCompra,
            models::purchase_order::UsoEstoque,
            models::purchase_order::OrigemEstoque,
            models::purchase_order::PurchaseOrderItem,
            models::purchase_order::PurchaseOrder,
            models::purchase_order::ResultadoStatus,

            // --- Estoque ---
            models::estoque::EstoqueManual,
            models::estoque::EntradaHistorico,
            models::estoque::OcOrigem,
            models::estoque::EstoqueItemResponse,
            models::estoque::ResultadoUsoEstoque,
            models::estoque::ResultadoReversao,

            // --- Reconciliação ---
            models::reconciliacao::CorrecaoCredor,
            models::reconciliacao::OrigemOrfa,
            models::reconciliacao::RelatorioReconciliacao,

            // --- Payloads ---
            handlers::estoque::UsarEstoquePayload,
            handlers::purchase_orders::AtualizarStatusPayload,
        )
    ),
    tags(
        (name = "Estoque", description = "Estoque disponível e uso de excedente entre OCs"),
        (name = "Ordens de Compra", description = "Status dos itens das OCs"),
        (name = "Admin", description = "Reparo de dados de estoque")
    )
)]
pub struct ApiDoc;
