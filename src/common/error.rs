// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;

// Erros de domínio e de infraestrutura. Os handlers convertem para ApiError.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Ordem de compra {0} não encontrada")]
    PurchaseOrderNotFound(Uuid),

    #[error("Item {item_index} não encontrado na ordem de compra {po_id}")]
    ItemNotFound { po_id: Uuid, item_index: usize },

    #[error("Quantidade inválida: {0}")]
    InvalidQuantity(rust_decimal::Decimal),

    #[error("Item não elegível para uso de estoque: {0}")]
    ItemNotEligible(String),

    #[error("Ordem de compra {0} foi alterada por outra operação")]
    ConcurrentModification(Uuid),

    // Falha no meio de uma sequência de escritas: deixa drift reparável
    #[error("Falha de escrita no armazenamento: {0}")]
    StorageWriteFailure(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro de serialização: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

/// Erro pronto para virar resposta HTTP.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl AppError {
    /// Chave de mensagem no I18nStore.
    pub fn message_key(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation_error",
            AppError::PurchaseOrderNotFound(_) => "purchase_order_not_found",
            AppError::ItemNotFound { .. } => "item_not_found",
            AppError::InvalidQuantity(_) => "invalid_quantity",
            AppError::ItemNotEligible(_) => "item_not_eligible",
            AppError::ConcurrentModification(_) => "concurrent_modification",
            AppError::StorageWriteFailure(_) => "storage_write_failure",
            AppError::DatabaseError(_)
            | AppError::SerializationError(_)
            | AppError::InternalServerError(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidQuantity(_)
            | AppError::ItemNotEligible(_) => StatusCode::BAD_REQUEST,
            AppError::PurchaseOrderNotFound(_) | AppError::ItemNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            AppError::ConcurrentModification(_) => StatusCode::CONFLICT,
            AppError::StorageWriteFailure(_)
            | AppError::DatabaseError(_)
            | AppError::SerializationError(_)
            | AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Traduz o erro para o idioma do cliente.
    pub fn to_api_error(self, locale: &Locale, i18n_store: &I18nStore) -> ApiError {
        let status = self.status_code();
        let error = i18n_store.translate(&locale.0, self.message_key());

        if status.is_server_error() {
            // O detalhe fica só no log; o cliente recebe a mensagem genérica
            tracing::error!("Erro Interno do Servidor: {}", self);
            return ApiError { status, error, details: None };
        }

        let details = match self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), json!(messages));
                }
                Some(Value::Object(details))
            }
            other => Some(json!(other.to_string())),
        };

        ApiError { status, error, details }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

// Fallback sem idioma (usado fora dos handlers, ex.: extratores)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let locale = Locale::default();
        self.to_api_error(&locale, &I18nStore::default()).into_response()
    }
}
