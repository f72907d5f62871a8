// src/services/status_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{atualizar_itens, PurchaseOrderStore},
    models::purchase_order::{ItemStatus, ResultadoStatus},
    services::{allocation_service::AllocationService, travas::TravasEstoque},
};

/// Caminho de atualização de status dos itens. A única regra do núcleo
/// aqui: regredir de "comprado ou além" para pendente/cotado reverte o
/// uso de estoque antes de gravar o novo status.
#[derive(Clone)]
pub struct StatusService {
    pedidos: Arc<dyn PurchaseOrderStore>,
    allocation: AllocationService,
    travas: Arc<TravasEstoque>,
}

impl StatusService {
    pub fn new(
        pedidos: Arc<dyn PurchaseOrderStore>,
        allocation: AllocationService,
        travas: Arc<TravasEstoque>,
    ) -> Self {
        Self {
            pedidos,
            allocation,
            travas,
        }
    }

    pub async fn atualizar_status(
        &self,
        po_id: Uuid,
        item_index: usize,
        novo_status: ItemStatus,
    ) -> Result<ResultadoStatus, AppError> {
        let pedido = self
            .pedidos
            .read_one(po_id)
            .await?
            .ok_or(AppError::PurchaseOrderNotFound(po_id))?;
        let item = pedido
            .itens
            .get(item_index)
            .ok_or(AppError::ItemNotFound { po_id, item_index })?;

        let _trava = self.travas.travar_codigo(&item.codigo_item).await;

        // 1. Status atual, relido com a trava
        let status_anterior = self
            .pedidos
            .read_one(po_id)
            .await?
            .and_then(|p| p.itens.get(item_index).map(|i| i.status))
            .ok_or(AppError::ItemNotFound { po_id, item_index })?;

        // 2. Regressão: desfaz o empréstimo primeiro
        let reversao = if status_anterior.is_regressao_para(novo_status) {
            Some(self.allocation.reverter_sem_trava(po_id, item_index).await?)
        } else {
            None
        };

        // 3. Grava o novo status
        atualizar_itens(self.pedidos.as_ref(), po_id, |pedido| {
            let item = pedido
                .itens
                .get_mut(item_index)
                .ok_or(AppError::ItemNotFound { po_id, item_index })?;
            if item.status == novo_status {
                return Ok(None);
            }
            item.status = novo_status;
            Ok(Some(()))
        })
        .await?;

        tracing::info!(
            "Status: OC {} item {} {:?} -> {:?}",
            po_id,
            item_index,
            status_anterior,
            novo_status
        );

        Ok(ResultadoStatus {
            status_anterior,
            status_novo: novo_status,
            reversao,
        })
    }
}
