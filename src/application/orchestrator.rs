// Solve orchestration: serializes every backend invocation behind a
// process-wide gate and layers cancellation on top of a blocking call that
// cannot be interrupted.
//
// The backend runs on a blocking thread holding the gate. Cancellation only
// abandons the waiting side: the orphaned call keeps the gate until the
// backend returns on its own, and later solves of any model queue behind it.
// Repeated cancellation under load can therefore starve the gate; callers are
// told so in the public docs rather than shielded from it.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::mappers;
use crate::domain::backend::{FlatProblem, RawSolution, SolveError, SolverBackend};
use crate::domain::models::{Model, Solution};

/// Exclusive-access gate for a non-reentrant solver backend.
///
/// Cloning yields another handle to the same gate. All solves funnel through
/// [`BackendGate::process_wide`]; separate gates are only appropriate for
/// backends known not to share any state, such as test doubles.
#[derive(Clone)]
pub struct BackendGate {
    inner: Arc<Mutex<()>>,
}

impl BackendGate {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(())),
        }
    }

    /// The gate shared by every solve in this process.
    pub fn process_wide() -> Self {
        static GATE: OnceLock<BackendGate> = OnceLock::new();
        GATE.get_or_init(BackendGate::new).clone()
    }

    fn acquire(&self) -> MutexGuard<'_, ()> {
        // a panicked backend must not wedge the gate for the whole process
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for BackendGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Run one backend invocation under the gate, blocking the task until the
/// solver finishes.
pub async fn dispatch(
    gate: BackendGate,
    backend: Arc<dyn SolverBackend>,
    problem: FlatProblem,
) -> Result<RawSolution, SolveError> {
    join(spawn_solve(gate, backend, problem).await)
}

/// Run one backend invocation under the gate, racing it against `cancel`.
///
/// If `cancel` resolves first the caller gets [`SolveError::Cancelled`]
/// immediately; the backend call is abandoned, not stopped, and releases the
/// gate whenever it finishes.
pub async fn dispatch_with_cancel(
    gate: BackendGate,
    backend: Arc<dyn SolverBackend>,
    problem: FlatProblem,
    cancel: impl Future<Output = ()>,
) -> Result<RawSolution, SolveError> {
    let model = problem.name.clone();
    let handle = spawn_solve(gate, backend, problem);
    tokio::select! {
        outcome = handle => join(outcome),
        _ = cancel => {
            warn!(
                model = %model,
                "solve abandoned before backend completion; the backend keeps the solver gate until it finishes"
            );
            Err(SolveError::Cancelled)
        }
    }
}

fn spawn_solve(
    gate: BackendGate,
    backend: Arc<dyn SolverBackend>,
    problem: FlatProblem,
) -> JoinHandle<Result<RawSolution, SolveError>> {
    debug!(
        model = %problem.name,
        backend = backend.name(),
        columns = problem.column_count(),
        rows = problem.row_count(),
        "dispatching solve to backend"
    );
    tokio::task::spawn_blocking(move || {
        let _guard = gate.acquire();
        let started = Instant::now();
        let result = backend.solve(&problem);
        match &result {
            Ok(raw) => debug!(
                model = %problem.name,
                backend = backend.name(),
                status = %raw.status,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "backend finished"
            ),
            Err(err) => debug!(
                model = %problem.name,
                backend = backend.name(),
                error = %err,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "backend failed"
            ),
        }
        result
    })
}

fn join(
    outcome: Result<Result<RawSolution, SolveError>, tokio::task::JoinError>,
) -> Result<RawSolution, SolveError> {
    match outcome {
        Ok(result) => result,
        Err(err) => Err(SolveError::BackendFailure(format!(
            "solver task failed: {err}"
        ))),
    }
}

/// Flatten, solve under the process-wide gate, and map the result back to the
/// model's variables.
pub async fn solve_model(
    model: &Model,
    backend: Arc<dyn SolverBackend>,
) -> Result<Solution, SolveError> {
    let problem = mappers::flatten(model);
    let raw = dispatch(BackendGate::process_wide(), backend, problem).await?;
    Ok(mappers::map_solution(model, raw))
}

/// [`solve_model`], racing the backend against a cancellation future.
pub async fn solve_model_with_cancel(
    model: &Model,
    backend: Arc<dyn SolverBackend>,
    cancel: impl Future<Output = ()>,
) -> Result<Solution, SolveError> {
    let problem = mappers::flatten(model);
    let raw = dispatch_with_cancel(BackendGate::process_wide(), backend, problem, cancel).await?;
    Ok(mappers::map_solution(model, raw))
}

/// [`solve_model`] with a deadline; [`SolveError::DeadlineExceeded`] when the
/// limit expires before the backend finishes.
pub async fn solve_model_with_timeout(
    model: &Model,
    backend: Arc<dyn SolverBackend>,
    limit: Duration,
) -> Result<Solution, SolveError> {
    match solve_model_with_cancel(model, backend, tokio::time::sleep(limit)).await {
        Err(SolveError::Cancelled) => Err(SolveError::DeadlineExceeded),
        other => other,
    }
}
