use bob_alias::AliasError;
use bob_store::StoreError;

/// Backend failures while resolving a request.
///
/// A request that simply does not match anything is not an error; see
/// [`Outcome::NotFound`](crate::Outcome::NotFound).
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("alias lookup failed: {0}")]
    Alias(#[from] AliasError),

    #[error("artifact read failed: {0}")]
    Store(#[from] StoreError),
}

/// Result alias for resolution.
pub type ResolveResult<T> = Result<T, ResolveError>;
