// Solver backend adapters

#[cfg(feature = "coin_cbc")]
pub mod cbc_backend;
pub mod factory;
#[cfg(feature = "highs")]
pub mod highs_backend;

#[cfg(feature = "coin_cbc")]
pub use cbc_backend::CbcBackend;
pub use factory::SolverFactory;
#[cfg(feature = "highs")]
pub use highs_backend::HighsBackend;
