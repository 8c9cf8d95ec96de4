pub mod api;
pub mod execution;
pub mod factory;

pub use execution::{transaction_namespace, NAMESPACE};
