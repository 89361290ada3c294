// Domain module: modeling types and the backend contract

pub mod backend;
pub mod models;
pub mod value_objects;

pub use backend::*;
pub use models::*;
pub use value_objects::*;
