// src/models/estoque.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::purchase_order::TipoOrigem;

// --- ESTOQUE MANUAL (entradas sem OC) ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EntradaHistorico {
    pub quantidade: Decimal,
    #[serde(default)]
    pub preco_unitario: Option<Decimal>,
    #[serde(default)]
    pub fornecedor: Option<String>,
    #[serde(default)]
    pub observacao: Option<String>,
    pub data: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EstoqueManual {
    pub id: Uuid,
    pub codigo_item: String,
    #[serde(default)]
    pub descricao: String,
    #[serde(default)]
    pub unidade: Option<String>,
    pub quantidade: Decimal,
    #[serde(default)]
    pub quantidade_usada: Decimal,
    #[serde(default)]
    pub fornecedor: Option<String>,
    #[serde(default)]
    pub preco_unitario: Option<Decimal>,
    #[serde(default)]
    pub imagem_url: Option<String>,
    #[serde(default)]
    pub historico: Vec<EntradaHistorico>,
}

impl EstoqueManual {
    pub fn disponivel(&self) -> Decimal {
        self.quantidade - self.quantidade_usada
    }
}

// --- LEDGER (calculado, nunca gravado) ---

/// Uma contribuição de excedente para um código.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrigemLedger {
    pub tipo: TipoOrigem,
    pub numero_oc: Option<String>,
    pub po_id: Option<Uuid>,
    pub item_index: Option<usize>,
    pub quantidade: Decimal,
    pub preco_unitario: Decimal,
    pub fornecedor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EntradaLedger {
    #[schema(example = "114641")]
    pub codigo_item: String,
    pub descricao: String,
    pub unidade: Option<String>,
    // Total comprado/adicionado pelas origens que ainda têm saldo
    pub quantidade_estoque: Decimal,
    #[schema(example = "19")]
    pub disponivel: Decimal,
    pub preco_unitario: Option<Decimal>,
    pub fornecedor: Option<String>,
    pub imagem_url: Option<String>,
    pub origens: Vec<OrigemLedger>,
}

impl EntradaLedger {
    /// Entrada zerada: o ledger nunca devolve erro para código desconhecido.
    pub fn vazia(codigo_item: &str) -> Self {
        Self {
            codigo_item: codigo_item.to_string(),
            descricao: String::new(),
            unidade: None,
            quantidade_estoque: Decimal::ZERO,
            disponivel: Decimal::ZERO,
            preco_unitario: None,
            fornecedor: None,
            imagem_url: None,
            origens: Vec::new(),
        }
    }
}

// --- RESPOSTAS DA API ---

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OcOrigem {
    pub tipo: TipoOrigem,
    pub numero_oc: Option<String>,
    pub po_id: Option<Uuid>,
    pub item_index: Option<usize>,
    pub quantidade: Decimal,
}

/// Formato de `GET /estoque` e `GET /estoque/verificar/{codigo}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EstoqueItemResponse {
    pub codigo_item: String,
    pub descricao: String,
    pub unidade: Option<String>,
    pub quantidade_estoque: Decimal,
    pub disponivel: Decimal,
    pub fornecedor: Option<String>,
    pub preco_unitario: Option<Decimal>,
    pub imagem_url: Option<String>,
    #[schema(example = "pedido")]
    pub origem: Option<String>,
    pub ocs_origem: Vec<OcOrigem>,
}

impl From<EntradaLedger> for EstoqueItemResponse {
    fn from(entrada: EntradaLedger) -> Self {
        let tem_pedido = entrada.origens.iter().any(|o| o.tipo == TipoOrigem::Pedido);
        let tem_manual = entrada.origens.iter().any(|o| o.tipo == TipoOrigem::Manual);
        let origem = match (tem_pedido, tem_manual) {
            (true, true) => Some("misto".to_string()),
            (true, false) => Some("pedido".to_string()),
            (false, true) => Some("manual".to_string()),
            (false, false) => None,
        };

        Self {
            codigo_item: entrada.codigo_item,
            descricao: entrada.descricao,
            unidade: entrada.unidade,
            quantidade_estoque: entrada.quantidade_estoque,
            disponivel: entrada.disponivel,
            fornecedor: entrada.fornecedor,
            preco_unitario: entrada.preco_unitario,
            imagem_url: entrada.imagem_url,
            origem,
            ocs_origem: entrada
                .origens
                .into_iter()
                .map(|o| OcOrigem {
                    tipo: o.tipo,
                    numero_oc: o.numero_oc,
                    po_id: o.po_id,
                    item_index: o.item_index,
                    quantidade: o.quantidade,
                })
                .collect(),
        }
    }
}

/// Resultado de `Use`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ResultadoUsoEstoque {
    pub quantidade_usada: Decimal,
    pub atendido_totalmente: bool,
    pub origens: Vec<crate::models::purchase_order::OrigemEstoque>,
}

/// Resultado de `Revert`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ResultadoReversao {
    pub revertido: bool,
    pub quantidade_revertida: Decimal,
}
