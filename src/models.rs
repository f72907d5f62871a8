pub mod estoque;
pub mod purchase_order;
pub mod reconciliacao;
