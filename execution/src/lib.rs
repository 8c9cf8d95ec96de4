pub mod evolution;
pub mod fixed;
pub mod pricing;
pub mod progression;
pub mod views;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

mod layer;

mod state;

pub use layer::Layer;
pub use state::{nonce, Memory, PrepareError, State, Status};
