// src/common/i18n.rs

use std::collections::HashMap;

pub const DEFAULT_LANG: &str = "pt";

// Mensagens de erro por idioma. Chave -> texto.
const MESSAGES_PT: &[(&str, &str)] = &[
    ("validation_error", "Um ou mais campos são inválidos."),
    ("purchase_order_not_found", "Ordem de compra não encontrada."),
    ("item_not_found", "Item não encontrado na ordem de compra."),
    ("invalid_quantity", "A quantidade deve ser maior que zero."),
    ("item_not_eligible", "Este item não pode usar estoque."),
    ("concurrent_modification", "A ordem de compra foi alterada por outra operação. Tente novamente."),
    ("storage_write_failure", "Falha ao gravar os dados. Execute a limpeza de dados de estoque."),
    ("internal_error", "Ocorreu um erro inesperado."),
];

const MESSAGES_EN: &[(&str, &str)] = &[
    ("validation_error", "One or more fields are invalid."),
    ("purchase_order_not_found", "Purchase order not found."),
    ("item_not_found", "Item not found in purchase order."),
    ("invalid_quantity", "Quantity must be greater than zero."),
    ("item_not_eligible", "This item cannot use stock."),
    ("concurrent_modification", "The purchase order was changed by another operation. Try again."),
    ("storage_write_failure", "Failed to write data. Run the stock data cleanup."),
    ("internal_error", "An unexpected error occurred."),
];

#[derive(Debug, Clone)]
pub struct I18nStore {
    messages: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl Default for I18nStore {
    fn default() -> Self {
        let mut messages = HashMap::new();
        messages.insert("pt", MESSAGES_PT.iter().copied().collect());
        messages.insert("en", MESSAGES_EN.iter().copied().collect());
        Self { messages }
    }
}

impl I18nStore {
    /// Idioma desconhecido cai no padrão (pt); chave desconhecida volta como está.
    pub fn translate(&self, lang: &str, key: &str) -> String {
        self.messages
            .get(lang)
            .or_else(|| self.messages.get(DEFAULT_LANG))
            .and_then(|table| table.get(key))
            .map(|msg| msg.to_string())
            .unwrap_or_else(|| key.to_string())
    }
}
