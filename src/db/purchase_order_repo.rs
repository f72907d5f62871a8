// src/db/purchase_order_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::purchase_order::{PurchaseOrder, PurchaseOrderItem},
};

/// Armazenamento das OCs. Cada OC é um documento; o array de itens é
/// substituído inteiro, de forma atômica, em `replace_items`.
#[async_trait]
pub trait PurchaseOrderStore: Send + Sync {
    async fn read_one(&self, po_id: Uuid) -> Result<Option<PurchaseOrder>, AppError>;

    /// Todas as OCs, em ordem de criação (é a ordem do ledger).
    async fn read_all(&self) -> Result<Vec<PurchaseOrder>, AppError>;

    /// Substitui o array de itens se a versão gravada ainda for
    /// `versao_esperada`. Devolve a nova versão.
    async fn replace_items(
        &self,
        po_id: Uuid,
        itens: &[PurchaseOrderItem],
        versao_esperada: i64,
    ) -> Result<i64, AppError>;
}

// Linha da tabela `purchase_orders`; `itens` é JSONB.
#[derive(Debug, FromRow)]
struct PurchaseOrderRow {
    id: Uuid,
    numero_oc: String,
    itens: Json<Vec<PurchaseOrderItem>>,
    versao: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PurchaseOrderRow> for PurchaseOrder {
    fn from(row: PurchaseOrderRow) -> Self {
        Self {
            id: row.id,
            numero_oc: row.numero_oc,
            itens: row.itens.0,
            versao: row.versao,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct PurchaseOrderRepository {
    pool: PgPool,
}

impl PurchaseOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PurchaseOrderStore for PurchaseOrderRepository {
    async fn read_one(&self, po_id: Uuid) -> Result<Option<PurchaseOrder>, AppError> {
        let row = sqlx::query_as::<_, PurchaseOrderRow>(
            "SELECT id, numero_oc, itens, versao, created_at, updated_at FROM purchase_orders WHERE id = $1",
        )
        .bind(po_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(PurchaseOrder::from))
    }

    async fn read_all(&self) -> Result<Vec<PurchaseOrder>, AppError> {
        let rows = sqlx::query_as::<_, PurchaseOrderRow>(
            "SELECT id, numero_oc, itens, versao, created_at, updated_at FROM purchase_orders ORDER BY created_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PurchaseOrder::from).collect())
    }

    async fn replace_items(
        &self,
        po_id: Uuid,
        itens: &[PurchaseOrderItem],
        versao_esperada: i64,
    ) -> Result<i64, AppError> {
        // Escrita condicional: só grava se ninguém alterou a OC desde a leitura
        let nova_versao: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE purchase_orders
            SET itens = $1, versao = versao + 1, updated_at = NOW()
            WHERE id = $2 AND versao = $3
            RETURNING versao
            "#,
        )
        .bind(Json(itens))
        .bind(po_id)
        .bind(versao_esperada)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(versao) = nova_versao {
            return Ok(versao);
        }

        // Nenhuma linha: ou a OC sumiu, ou a versão mudou
        let existe: Option<Uuid> = sqlx::query_scalar("SELECT id FROM purchase_orders WHERE id = $1")
            .bind(po_id)
            .fetch_optional(&self.pool)
            .await?;

        match existe {
            Some(_) => Err(AppError::ConcurrentModification(po_id)),
            None => Err(AppError::PurchaseOrderNotFound(po_id)),
        }
    }
}

/// Tentativas de ler-alterar-gravar um único documento antes de desistir.
pub const MAX_TENTATIVAS_ESCRITA: usize = 3;

/// Lê a OC, aplica `mutacao` nos itens e grava com escrita condicional.
/// Em conflito de versão relê e reaplica (somente este documento).
/// `Ok(None)` da mutação significa "nada a mudar": nenhuma escrita é feita.
pub async fn atualizar_itens<T, F>(
    store: &dyn PurchaseOrderStore,
    po_id: Uuid,
    mut mutacao: F,
) -> Result<Option<T>, AppError>
where
    F: FnMut(&mut PurchaseOrder) -> Result<Option<T>, AppError> + Send,
    T: Send,
{
    let mut tentativa = 1;
    loop {
        let mut pedido = store
            .read_one(po_id)
            .await?
            .ok_or(AppError::PurchaseOrderNotFound(po_id))?;

        let Some(resultado) = mutacao(&mut pedido)? else {
            return Ok(None);
        };

        match store.replace_items(po_id, &pedido.itens, pedido.versao).await {
            Ok(_) => return Ok(Some(resultado)),
            Err(AppError::ConcurrentModification(_)) if tentativa < MAX_TENTATIVAS_ESCRITA => {
                tracing::warn!(
                    "OC {} alterada durante a escrita (tentativa {}), relendo",
                    po_id,
                    tentativa
                );
                tentativa += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
