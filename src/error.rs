use std::backtrace::Backtrace;
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// The domain-level error taxonomy for the crate.
///
/// Note that "the model is unsatisfiable" is deliberately absent: proving
/// unsatisfiability is a valid terminal outcome of a solve, reported through
/// [`crate::engine::RefinementOutcome`], never through this enum.
#[derive(Debug, thiserror::Error)]
pub enum PuzzleError {
    /// A grid, wall, or direction was structurally invalid (ragged rows, a
    /// wall referencing an out-of-grid position, a `Direction::None` where a
    /// real connection is required).
    #[error("malformed topology: {0}")]
    MalformedTopology(String),

    /// Open-border data did not yield a total partition of the grid into
    /// regions within the bounded number of discovery attempts.
    #[error("region model: {0}")]
    RegionModel(String),

    /// The refinement loop hit its iteration budget without reaching a
    /// terminal state. Distinct from unsatisfiability: the model may still
    /// have a solution we gave up looking for.
    #[error("refinement budget of {budget} iterations exhausted after {iterations} refinements")]
    RefinementBudgetExceeded { budget: usize, iterations: usize },

    /// The constraint backend itself faulted (as opposed to returning a clean
    /// SAT/UNSAT verdict).
    #[error("solver backend failure: {0}")]
    SolverBackend(String),

    /// The requested puzzle variant exists but has no encoder yet.
    #[error("not supported: {0}")]
    NotSupported(String),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Inner: {inner}\n{backtrace}")]
    Inner {
        inner: Box<PuzzleError>,
        backtrace: Box<Backtrace>,
    },
}

impl From<PuzzleError> for Error {
    fn from(inner: PuzzleError) -> Self {
        Error::Inner {
            inner: Box::new(inner),
            backtrace: Box::new(std::backtrace::Backtrace::capture()),
        }
    }
}

impl Error {
    /// The wrapped domain error, for callers that branch on the kind.
    pub fn kind(&self) -> &PuzzleError {
        match self {
            Error::Inner { inner, .. } => inner,
        }
    }

    pub fn malformed_topology(msg: impl Into<String>) -> Self {
        PuzzleError::MalformedTopology(msg.into()).into()
    }

    pub fn region_model(msg: impl Into<String>) -> Self {
        PuzzleError::RegionModel(msg.into()).into()
    }

    pub fn solver_backend(msg: impl Into<String>) -> Self {
        PuzzleError::SolverBackend(msg.into()).into()
    }

    pub fn not_supported(msg: impl Into<String>) -> Self {
        PuzzleError::NotSupported(msg.into()).into()
    }
}
