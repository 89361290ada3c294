use crate::domain::backend::{SolveError, SolverBackend};
use crate::domain::value_objects::BackendKind;
use std::sync::Arc;

/// Factory for creating solver backends based on configuration
pub struct SolverFactory;

impl SolverFactory {
    /// Create a backend for a specific kind. Backends compiled out of this
    /// build yield [`SolveError::BackendUnavailable`].
    pub fn create(
        kind: BackendKind,
        _is_mip: bool,
    ) -> Result<Arc<dyn SolverBackend>, SolveError> {
        match kind {
            BackendKind::Auto => Self::auto_backend(),
            BackendKind::Highs => Self::highs_backend(),
            BackendKind::CoinCbc => Self::coin_cbc_backend(),
        }
    }

    /// Get the default backend (HiGHS when compiled in).
    pub fn default_backend() -> Result<Arc<dyn SolverBackend>, SolveError> {
        Self::auto_backend()
    }

    fn auto_backend() -> Result<Arc<dyn SolverBackend>, SolveError> {
        #[cfg(feature = "highs")]
        {
            Self::highs_backend()
        }
        #[cfg(all(not(feature = "highs"), feature = "coin_cbc"))]
        {
            Self::coin_cbc_backend()
        }
        #[cfg(not(any(feature = "highs", feature = "coin_cbc")))]
        {
            Err(SolveError::BackendUnavailable(
                "no solver compiled in; enable the `highs` or `coin_cbc` feature".to_string(),
            ))
        }
    }

    #[cfg(feature = "highs")]
    fn highs_backend() -> Result<Arc<dyn SolverBackend>, SolveError> {
        Ok(Arc::new(crate::solver::HighsBackend::new()))
    }

    #[cfg(not(feature = "highs"))]
    fn highs_backend() -> Result<Arc<dyn SolverBackend>, SolveError> {
        Err(SolveError::BackendUnavailable(
            "built without the `highs` feature".to_string(),
        ))
    }

    #[cfg(feature = "coin_cbc")]
    fn coin_cbc_backend() -> Result<Arc<dyn SolverBackend>, SolveError> {
        Ok(Arc::new(crate::solver::CbcBackend::new()))
    }

    #[cfg(not(feature = "coin_cbc"))]
    fn coin_cbc_backend() -> Result<Arc<dyn SolverBackend>, SolveError> {
        Err(SolveError::BackendUnavailable(
            "built without the `coin_cbc` feature".to_string(),
        ))
    }
}
