// -----------------------------------------------------------------------------
// Modules

mod impls;
mod methods;

// -----------------------------------------------------------------------------
// Exports

pub use impls::{Engine, EngineStatus};
