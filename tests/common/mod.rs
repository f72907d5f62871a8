//! Helpers compartilhados pelos testes de integração.

#![allow(dead_code)]

use std::sync::Arc;

use compras_backend::{
    config::AppState,
    db::{InMemoryManualStockStore, InMemoryPurchaseOrderStore, PurchaseOrderStore},
    models::{
        estoque::EstoqueManual,
        purchase_order::{FonteCompra, ItemStatus, PurchaseOrder, PurchaseOrderItem},
    },
};
use rust_decimal::Decimal;
use uuid::Uuid;

pub const CODIGO: &str = "114641";

pub struct Cenario {
    pub pedidos: Arc<InMemoryPurchaseOrderStore>,
    pub manual: Arc<InMemoryManualStockStore>,
    pub state: AppState,
}

pub fn cenario(orders: Vec<PurchaseOrder>, manuais: Vec<EstoqueManual>) -> Cenario {
    let pedidos = Arc::new(InMemoryPurchaseOrderStore::with_orders(orders));
    let manual = Arc::new(InMemoryManualStockStore::with_entries(manuais));
    let state = AppState::from_stores(pedidos.clone(), manual.clone());
    Cenario { pedidos, manual, state }
}

/// Item já comprado com `comprada` unidades para uma necessidade de `necessaria`.
pub fn credor(codigo: &str, comprada: i64, necessaria: i64) -> PurchaseOrderItem {
    let mut item = PurchaseOrderItem::new(codigo, Decimal::from(necessaria));
    item.descricao = "Cabo flexível 2,5mm".into();
    item.unidade = Some("UN".into());
    item.status = ItemStatus::Comprado;
    item.fontes_compra.push(FonteCompra {
        quantidade: Decimal::from(comprada),
        preco_unitario: Decimal::from(10),
        frete: Decimal::ZERO,
        fornecedor: Some("Fornecedor A".into()),
        origem_estoque: false,
    });
    item
}

/// Item pendente que ainda precisa de `necessaria` unidades.
pub fn consumidor(codigo: &str, necessaria: i64) -> PurchaseOrderItem {
    let mut item = PurchaseOrderItem::new(codigo, Decimal::from(necessaria));
    item.descricao = "Cabo flexível 2,5mm".into();
    item
}

pub fn manual(codigo: &str, quantidade: i64, usada: i64) -> EstoqueManual {
    EstoqueManual {
        id: Uuid::new_v4(),
        codigo_item: codigo.into(),
        descricao: "Cabo avulso".into(),
        unidade: Some("UN".into()),
        quantidade: Decimal::from(quantidade),
        quantidade_usada: Decimal::from(usada),
        fornecedor: Some("Depósito".into()),
        preco_unitario: Some(Decimal::from(8)),
        imagem_url: None,
        historico: Vec::new(),
    }
}

pub fn oc(numero: &str, itens: Vec<PurchaseOrderItem>) -> PurchaseOrder {
    PurchaseOrder::new(numero, itens)
}

pub async fn item(pedidos: &InMemoryPurchaseOrderStore, po_id: Uuid, item_index: usize) -> PurchaseOrderItem {
    pedidos
        .read_one(po_id)
        .await
        .unwrap()
        .expect("OC existe")
        .itens[item_index]
        .clone()
}

pub fn dec(valor: i64) -> Decimal {
    Decimal::from(valor)
}
