// src/models/reconciliacao.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Uma correção aplicada (ou que seria aplicada, em simulação) num credor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CorrecaoCredor {
    pub po_id: Uuid,
    pub numero_oc: String,
    pub item_index: usize,
    pub codigo_item: String,
    pub valor_antigo: Decimal,
    pub valor_novo: Decimal,
    pub registros_antigos: usize,
    pub registros_novos: usize,
}

/// Origem de consumidor que aponta para um credor inexistente.
/// Só é reportada; nenhuma escrita é feita.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrigemOrfa {
    pub consumidor_po_id: Uuid,
    pub consumidor_item_index: usize,
    pub codigo_item: String,
    pub numero_oc_credor: Option<String>,
    pub quantidade: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RelatorioReconciliacao {
    pub simulacao: bool,
    pub itens_verificados: usize,
    pub correcoes: Vec<CorrecaoCredor>,
    pub origens_orfas: Vec<OrigemOrfa>,
    pub falhas_escrita: Vec<Uuid>,
}
