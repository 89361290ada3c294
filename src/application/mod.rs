// Application layer: problem flattening, result mapping, solve orchestration

pub mod mappers;
pub mod orchestrator;

pub use mappers::{flatten, map_solution};
pub use orchestrator::{
    dispatch, dispatch_with_cancel, solve_model, solve_model_with_cancel,
    solve_model_with_timeout, BackendGate,
};
