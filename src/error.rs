use thiserror::Error;

/// Failure modes exposed by the table's public API.
///
/// Per the external interface contract, `get`, `contains`, `delete`, `len`,
/// `capacity`, `num_levels`, `level_stats` and iteration are infallible —
/// only operations that size a sub-array (`new`, `with_params`, `insert`,
/// the internal rebuild) can fail, and only on allocation failure.
#[derive(Error, Debug)]
pub enum ElasticHashError {
    #[error("allocation failed while sizing the table")]
    AllocationFailure,
}

pub type Result<T> = std::result::Result<T, ElasticHashError>;
