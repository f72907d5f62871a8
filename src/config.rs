// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::{
    common::i18n::I18nStore,
    db::{
        EstoqueManualRepository, InMemoryManualStockStore, InMemoryPurchaseOrderStore,
        ManualStockStore, PurchaseOrderRepository, PurchaseOrderStore,
    },
    services::{
        allocation_service::AllocationService, ledger_service::LedgerService,
        reconciliation_service::ReconciliationService, status_service::StatusService,
        travas::TravasEstoque,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

/// Configuração lida do ambiente (e do `.env`, se existir).
#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let storage = match env::var("ESTOQUE_STORAGE").as_deref() {
            Ok("memory") => StorageBackend::Memory,
            Ok("postgres") | Err(_) => StorageBackend::Postgres,
            Ok(outro) => anyhow::bail!("ESTOQUE_STORAGE inválido: '{}' (use postgres ou memory)", outro),
        };

        let database_url = env::var("DATABASE_URL").ok();
        if storage == StorageBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL deve ser definida quando ESTOQUE_STORAGE=postgres");
        }

        let db_max_connections = match env::var("DB_MAX_CONNECTIONS") {
            Ok(valor) => valor
                .parse()
                .with_context(|| format!("DB_MAX_CONNECTIONS inválido: '{}'", valor))?,
            Err(_) => 5,
        };

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        Ok(Self {
            storage,
            database_url,
            db_max_connections,
            bind_addr,
        })
    }
}

// O estado compartilhado, acessível em todos os handlers
#[derive(Clone)]
pub struct AppState {
    pub ledger_service: LedgerService,
    pub allocation_service: AllocationService,
    pub status_service: StatusService,
    pub reconciliation_service: ReconciliationService,
    pub i18n_store: Arc<I18nStore>,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        match config.storage {
            StorageBackend::Memory => {
                tracing::warn!("⚠️ Usando armazenamento em memória: os dados somem ao reiniciar.");
                Ok(Self::from_stores(
                    Arc::new(InMemoryPurchaseOrderStore::new()),
                    Arc::new(InMemoryManualStockStore::new()),
                ))
            }
            StorageBackend::Postgres => {
                let database_url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL deve ser definida")?;

                let db_pool = PgPoolOptions::new()
                    .max_connections(config.db_max_connections)
                    .acquire_timeout(Duration::from_secs(3))
                    .connect(database_url)
                    .await
                    .context("Falha ao conectar ao banco de dados")?;

                tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

                sqlx::migrate!()
                    .run(&db_pool)
                    .await
                    .context("Falha ao rodar as migrações do banco de dados")?;

                tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

                Ok(Self::from_stores(
                    Arc::new(PurchaseOrderRepository::new(db_pool.clone())),
                    Arc::new(EstoqueManualRepository::new(db_pool)),
                ))
            }
        }
    }

    /// Monta o gráfico de dependências a partir dos stores.
    pub fn from_stores(
        pedidos: Arc<dyn PurchaseOrderStore>,
        estoque_manual: Arc<dyn ManualStockStore>,
    ) -> Self {
        let travas = Arc::new(TravasEstoque::new());

        let ledger_service = LedgerService::new(pedidos.clone(), estoque_manual.clone());
        let allocation_service = AllocationService::new(
            pedidos.clone(),
            estoque_manual,
            ledger_service.clone(),
            travas.clone(),
        );
        let status_service =
            StatusService::new(pedidos.clone(), allocation_service.clone(), travas.clone());
        let reconciliation_service = ReconciliationService::new(pedidos, travas);

        Self {
            ledger_service,
            allocation_service,
            status_service,
            reconciliation_service,
            i18n_store: Arc::new(I18nStore::default()),
        }
    }
}
