pub mod mock;
pub mod phyphox;
