// src/db/estoque_manual_repo.rs

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::estoque::{EntradaHistorico, EstoqueManual},
};

/// Estoque avulso (entradas sem OC). O núcleo só lê e ajusta o consumo.
#[async_trait]
pub trait ManualStockStore: Send + Sync {
    async fn read_all(&self) -> Result<Vec<EstoqueManual>, AppError>;

    /// Soma `delta` (pode ser negativo) em `quantidade_usada`, nunca abaixo de zero.
    async fn update_usage(&self, codigo_item: &str, delta: Decimal) -> Result<(), AppError>;
}

#[derive(Debug, FromRow)]
struct EstoqueManualRow {
    id: Uuid,
    codigo_item: String,
    descricao: String,
    unidade: Option<String>,
    quantidade: Decimal,
    quantidade_usada: Decimal,
    fornecedor: Option<String>,
    preco_unitario: Option<Decimal>,
    imagem_url: Option<String>,
    historico: Json<Vec<EntradaHistorico>>,
}

impl From<EstoqueManualRow> for EstoqueManual {
    fn from(row: EstoqueManualRow) -> Self {
        Self {
            id: row.id,
            codigo_item: row.codigo_item,
            descricao: row.descricao,
            unidade: row.unidade,
            quantidade: row.quantidade,
            quantidade_usada: row.quantidade_usada,
            fornecedor: row.fornecedor,
            preco_unitario: row.preco_unitario,
            imagem_url: row.imagem_url,
            historico: row.historico.0,
        }
    }
}

#[derive(Clone)]
pub struct EstoqueManualRepository {
    pool: PgPool,
}

impl EstoqueManualRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ManualStockStore for EstoqueManualRepository {
    async fn read_all(&self) -> Result<Vec<EstoqueManual>, AppError> {
        let rows = sqlx::query_as::<_, EstoqueManualRow>(
            r#"
            SELECT id, codigo_item, descricao, unidade, quantidade, quantidade_usada,
                   fornecedor, preco_unitario, imagem_url, historico
            FROM estoque_manual
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(EstoqueManual::from).collect())
    }

    async fn update_usage(&self, codigo_item: &str, delta: Decimal) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE estoque_manual
            SET quantidade_usada = GREATEST(quantidade_usada + $1, 0), updated_at = NOW()
            WHERE codigo_item = $2
            "#,
        )
        .bind(delta)
        .bind(codigo_item)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::StorageWriteFailure(format!(
                "estoque manual '{}' não existe",
                codigo_item
            )));
        }
        Ok(())
    }
}
