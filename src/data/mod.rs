pub mod market;
pub mod retry;
pub mod store;
