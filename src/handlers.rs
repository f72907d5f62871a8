pub mod admin;
pub mod estoque;
pub mod purchase_orders;
