// src/db/memory_repo.rs

// Stores em memória: modo `ESTOQUE_STORAGE=memory` e testes.

use std::collections::HashSet;
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ManualStockStore, PurchaseOrderStore},
    models::{
        estoque::EstoqueManual,
        purchase_order::{PurchaseOrder, PurchaseOrderItem},
    },
};

fn lock_poisoned() -> AppError {
    AppError::InternalServerError(anyhow::anyhow!("lock do store em memória envenenado"))
}

#[derive(Debug, Default)]
pub struct InMemoryPurchaseOrderStore {
    // Vec mantém a ordem de inserção (ordem do ledger)
    pedidos: RwLock<Vec<PurchaseOrder>>,
    // OCs cujas escritas devem falhar (simula queda no meio da sequência)
    falhas: Mutex<HashSet<Uuid>>,
}

impl InMemoryPurchaseOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_orders(orders: Vec<PurchaseOrder>) -> Self {
        Self {
            pedidos: RwLock::new(orders),
            falhas: Mutex::new(HashSet::new()),
        }
    }

    pub fn insert(&self, order: PurchaseOrder) -> Result<(), AppError> {
        let mut pedidos = self.pedidos.write().map_err(|_| lock_poisoned())?;
        pedidos.retain(|p| p.id != order.id);
        pedidos.push(order);
        Ok(())
    }

    /// Remove a OC sem passar pelo motor (simula exclusão sem reversão).
    pub fn remove(&self, po_id: Uuid) -> Result<(), AppError> {
        let mut pedidos = self.pedidos.write().map_err(|_| lock_poisoned())?;
        pedidos.retain(|p| p.id != po_id);
        Ok(())
    }

    pub fn fail_writes_for(&self, po_id: Uuid) {
        if let Ok(mut falhas) = self.falhas.lock() {
            falhas.insert(po_id);
        }
    }

    pub fn restore_writes_for(&self, po_id: Uuid) {
        if let Ok(mut falhas) = self.falhas.lock() {
            falhas.remove(&po_id);
        }
    }
}

#[async_trait]
impl PurchaseOrderStore for InMemoryPurchaseOrderStore {
    async fn read_one(&self, po_id: Uuid) -> Result<Option<PurchaseOrder>, AppError> {
        let pedidos = self.pedidos.read().map_err(|_| lock_poisoned())?;
        Ok(pedidos.iter().find(|p| p.id == po_id).cloned())
    }

    async fn read_all(&self) -> Result<Vec<PurchaseOrder>, AppError> {
        let pedidos = self.pedidos.read().map_err(|_| lock_poisoned())?;
        Ok(pedidos.clone())
    }

    async fn replace_items(
        &self,
        po_id: Uuid,
        itens: &[PurchaseOrderItem],
        versao_esperada: i64,
    ) -> Result<i64, AppError> {
        let falhar = self
            .falhas
            .lock()
            .map_err(|_| lock_poisoned())?
            .contains(&po_id);
        if falhar {
            return Err(AppError::StorageWriteFailure(format!(
                "escrita recusada para a OC {}",
                po_id
            )));
        }

        let mut pedidos = self.pedidos.write().map_err(|_| lock_poisoned())?;
        let pedido = pedidos
            .iter_mut()
            .find(|p| p.id == po_id)
            .ok_or(AppError::PurchaseOrderNotFound(po_id))?;

        if pedido.versao != versao_esperada {
            return Err(AppError::ConcurrentModification(po_id));
        }

        pedido.itens = itens.to_vec();
        pedido.versao += 1;
        pedido.updated_at = Utc::now();
        Ok(pedido.versao)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryManualStockStore {
    entradas: RwLock<Vec<EstoqueManual>>,
}

impl InMemoryManualStockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<EstoqueManual>) -> Self {
        Self {
            entradas: RwLock::new(entries),
        }
    }
}

#[async_trait]
impl ManualStockStore for InMemoryManualStockStore {
    async fn read_all(&self) -> Result<Vec<EstoqueManual>, AppError> {
        let entradas = self.entradas.read().map_err(|_| lock_poisoned())?;
        Ok(entradas.clone())
    }

    async fn update_usage(&self, codigo_item: &str, delta: Decimal) -> Result<(), AppError> {
        let mut entradas = self.entradas.write().map_err(|_| lock_poisoned())?;
        let entrada = entradas
            .iter_mut()
            .find(|e| e.codigo_item == codigo_item)
            .ok_or_else(|| {
                AppError::StorageWriteFailure(format!("estoque manual '{}' não existe", codigo_item))
            })?;

        entrada.quantidade_usada = (entrada.quantidade_usada + delta).max(Decimal::ZERO);
        Ok(())
    }
}
