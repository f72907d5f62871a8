// src/models/purchase_order.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Fornecedor gravado na fonte de compra sintética criada pelo uso de estoque.
pub const FORNECEDOR_ESTOQUE_INTERNO: &str = "ESTOQUE INTERNO";

// --- Enums ---

/// Fluxo de status de um item de OC. A ordem das variantes É a ordem do fluxo.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    Pendente,
    Cotado,
    Comprado,
    EmSeparacao,
    ProntoEnvio,
    EmTransito,
    Entregue,
}

impl ItemStatus {
    /// "Comprado ou além": itens nesse estado podem emprestar excedente.
    pub fn is_comprado_ou_alem(self) -> bool {
        self >= ItemStatus::Comprado
    }

    /// Uma regressão que desfaz o uso de estoque: de comprado (ou além)
    /// de volta para pendente/cotado.
    pub fn is_regressao_para(self, novo: ItemStatus) -> bool {
        self.is_comprado_ou_alem() && !novo.is_comprado_ou_alem()
    }
}

/// De onde veio uma quantidade emprestada.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TipoOrigem {
    /// Excedente de outro item de OC.
    #[default]
    Pedido,
    /// Entrada de estoque manual (sem OC).
    Manual,
}

// --- Sub-registros do item ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FonteCompra {
    #[schema(example = "20")]
    pub quantidade: Decimal,
    #[schema(example = "12.50")]
    pub preco_unitario: Decimal,
    #[serde(default)]
    pub frete: Decimal,
    #[serde(default)]
    pub fornecedor: Option<String>,
    // true somente na fonte sintética criada pelo uso de estoque interno
    #[serde(default)]
    pub origem_estoque: bool,
}

/// Registro no LADO DO CREDOR: quem pegou emprestado deste item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UsoEstoque {
    pub po_id: Uuid,
    #[serde(default)]
    pub numero_oc: Option<String>,
    #[serde(default)]
    pub item_index: Option<usize>,
    pub quantidade: Decimal,
    #[serde(default)]
    pub data: Option<DateTime<Utc>>,
}

/// Registro no LADO DO CONSUMIDOR: de onde veio a quantidade emprestada.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrigemEstoque {
    #[serde(default)]
    pub tipo: TipoOrigem,
    #[serde(default)]
    pub numero_oc: Option<String>,
    #[serde(default)]
    pub po_id: Option<Uuid>,
    #[serde(default)]
    pub item_index: Option<usize>,
    pub quantidade: Decimal,
    #[serde(default)]
    pub preco_unitario: Decimal,
}

// --- Item da OC ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PurchaseOrderItem {
    #[schema(example = "114641")]
    pub codigo_item: String,
    #[serde(default)]
    pub descricao: String,
    #[serde(default)]
    pub unidade: Option<String>,
    #[serde(default)]
    pub imagem_url: Option<String>,

    // Necessidade da OC (imutável)
    pub quantidade: Decimal,
    // Campo gravado; só vale quando não há fontes de compra
    #[serde(default)]
    pub quantidade_comprada: Decimal,
    #[serde(default)]
    pub preco_unitario: Option<Decimal>,
    #[serde(default)]
    pub status: ItemStatus,
    #[serde(default)]
    pub fontes_compra: Vec<FonteCompra>,

    // Lado credor
    #[serde(default)]
    pub quantidade_usada_estoque: Decimal,
    #[serde(default)]
    pub estoque_usado_em: Vec<UsoEstoque>,

    // Lado consumidor
    #[serde(default)]
    pub atendido_por_estoque: bool,
    #[serde(default)]
    pub parcialmente_atendido_estoque: bool,
    #[serde(default)]
    pub quantidade_do_estoque: Decimal,
    #[serde(default)]
    pub preco_unitario_estoque: Option<Decimal>,
    #[serde(default)]
    pub estoque_origem: Vec<OrigemEstoque>,
}

impl PurchaseOrderItem {
    pub fn new(codigo_item: impl Into<String>, quantidade: Decimal) -> Self {
        Self {
            codigo_item: codigo_item.into(),
            descricao: String::new(),
            unidade: None,
            imagem_url: None,
            quantidade,
            quantidade_comprada: Decimal::ZERO,
            preco_unitario: None,
            status: ItemStatus::Pendente,
            fontes_compra: Vec::new(),
            quantidade_usada_estoque: Decimal::ZERO,
            estoque_usado_em: Vec::new(),
            atendido_por_estoque: false,
            parcialmente_atendido_estoque: false,
            quantidade_do_estoque: Decimal::ZERO,
            preco_unitario_estoque: None,
            estoque_origem: Vec::new(),
        }
    }

    fn fontes_reais(&self) -> impl Iterator<Item = &FonteCompra> {
        self.fontes_compra.iter().filter(|f| !f.origem_estoque)
    }

    /// Quantidade efetivamente comprada: soma das fontes (exceto a sintética
    /// de estoque interno) ou, sem fontes, o campo gravado.
    pub fn quantidade_comprada_efetiva(&self) -> Decimal {
        let mut fontes = self.fontes_reais().peekable();
        if fontes.peek().is_none() {
            return self.quantidade_comprada;
        }
        fontes.map(|f| f.quantidade).sum()
    }

    /// Excedente disponível para empréstimo. Pode ser <= 0.
    pub fn excedente(&self) -> Decimal {
        self.quantidade_comprada_efetiva() - self.quantidade - self.quantidade_usada_estoque
    }

    /// Preço unitário do lote: média ponderada das fontes reais,
    /// senão o preço gravado, senão zero.
    pub fn preco_unitario_lote(&self) -> Decimal {
        let (qtd, total) = self
            .fontes_reais()
            .fold((Decimal::ZERO, Decimal::ZERO), |(q, t), f| {
                (q + f.quantidade, t + f.quantidade * f.preco_unitario)
            });

        if qtd > Decimal::ZERO {
            return total / qtd;
        }
        self.preco_unitario.unwrap_or(Decimal::ZERO)
    }

    pub fn fornecedor_principal(&self) -> Option<&str> {
        self.fontes_reais().find_map(|f| f.fornecedor.as_deref())
    }

    /// O item já se atende pelas próprias compras?
    pub fn is_autoatendido(&self) -> bool {
        let comprado: Decimal = self.fontes_reais().map(|f| f.quantidade).sum();
        comprado > Decimal::ZERO && comprado >= self.quantidade
    }

    /// Zera todos os campos de consumidor (uso na reversão).
    pub fn limpar_emprestimo(&mut self) {
        self.quantidade_do_estoque = Decimal::ZERO;
        self.estoque_origem.clear();
        self.atendido_por_estoque = false;
        self.parcialmente_atendido_estoque = false;
        self.preco_unitario_estoque = None;
        self.fontes_compra.retain(|f| !f.origem_estoque);
    }
}

// --- Agregado ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PurchaseOrder {
    pub id: Uuid,
    #[schema(example = "OC-2024-0042")]
    pub numero_oc: String,
    pub itens: Vec<PurchaseOrderItem>,
    // Versão para escrita condicional (incrementada a cada replace)
    #[serde(default)]
    pub versao: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PurchaseOrder {
    pub fn new(numero_oc: impl Into<String>, itens: Vec<PurchaseOrderItem>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            numero_oc: numero_oc.into(),
            itens,
            versao: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn item_por_codigo(&self, codigo_item: &str) -> Option<(usize, &PurchaseOrderItem)> {
        self.itens
            .iter()
            .enumerate()
            .find(|(_, item)| item.codigo_item == codigo_item)
    }
}

/// Resultado da mudança de status de um item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ResultadoStatus {
    pub status_anterior: ItemStatus,
    pub status_novo: ItemStatus,
    pub reversao: Option<crate::models::estoque::ResultadoReversao>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn fonte(quantidade: Decimal, preco: Decimal) -> FonteCompra {
        FonteCompra {
            quantidade,
            preco_unitario: preco,
            frete: Decimal::ZERO,
            fornecedor: Some("Fornecedor A".into()),
            origem_estoque: false,
        }
    }

    #[test]
    fn status_order_follows_workflow() {
        assert!(ItemStatus::Pendente < ItemStatus::Cotado);
        assert!(ItemStatus::Comprado.is_comprado_ou_alem());
        assert!(ItemStatus::Entregue.is_comprado_ou_alem());
        assert!(!ItemStatus::Cotado.is_comprado_ou_alem());
    }

    #[test]
    fn regression_only_when_leaving_purchased_range() {
        assert!(ItemStatus::EmTransito.is_regressao_para(ItemStatus::Cotado));
        assert!(ItemStatus::Comprado.is_regressao_para(ItemStatus::Pendente));
        assert!(!ItemStatus::Entregue.is_regressao_para(ItemStatus::Comprado));
        assert!(!ItemStatus::Cotado.is_regressao_para(ItemStatus::Pendente));
    }

    #[test]
    fn purchased_quantity_prefers_sources_over_stored_field() {
        let mut item = PurchaseOrderItem::new("114641", dec!(1));
        item.quantidade_comprada = dec!(5);
        assert_eq!(item.quantidade_comprada_efetiva(), dec!(5));

        item.fontes_compra = vec![fonte(dec!(12), dec!(2)), fonte(dec!(8), dec!(4))];
        assert_eq!(item.quantidade_comprada_efetiva(), dec!(20));
        assert_eq!(item.excedente(), dec!(19));
    }

    #[test]
    fn synthetic_stock_source_is_not_counted_as_purchase() {
        let mut item = PurchaseOrderItem::new("114641", dec!(2));
        item.fontes_compra.push(FonteCompra {
            origem_estoque: true,
            ..fonte(dec!(5), dec!(1))
        });
        assert_eq!(item.quantidade_comprada_efetiva(), Decimal::ZERO);
        assert!(!item.is_autoatendido());
    }

    #[test]
    fn lot_price_is_weighted_average() {
        let mut item = PurchaseOrderItem::new("A", dec!(1));
        item.fontes_compra = vec![fonte(dec!(10), dec!(2)), fonte(dec!(30), dec!(6))];
        assert_eq!(item.preco_unitario_lote(), dec!(5));
    }

    #[test]
    fn missing_bookkeeping_fields_deserialize_to_defaults() {
        let raw = r#"{"codigo_item":"X1","quantidade":3}"#;
        let item: PurchaseOrderItem = serde_json::from_str(raw).unwrap();
        assert_eq!(item.status, ItemStatus::Pendente);
        assert!(item.estoque_usado_em.is_empty());
        assert_eq!(item.quantidade_usada_estoque, Decimal::ZERO);
        assert!(!item.atendido_por_estoque);
    }
}
