//! Optimistic mutation with revert-by-refresh.

use std::future::Future;

use tracing::warn;

use crate::error::EngineResult;

/// Applies a local change, then performs the server write.
///
/// If the write fails, local state is reconciled by running `refresh` to
/// completion before the write error is returned. A failing refresh is
/// logged; the caller still sees the write error.
pub async fn mutate_or_refresh<T, Apply, Write, Refresh, RefreshFut>(
    apply: Apply,
    write: Write,
    refresh: Refresh,
) -> EngineResult<T>
where
    Apply: FnOnce(),
    Write: Future<Output = EngineResult<T>>,
    Refresh: FnOnce() -> RefreshFut,
    RefreshFut: Future<Output = EngineResult<()>>,
{
    apply();
    match write.await {
        Ok(value) => Ok(value),
        Err(error) => {
            if let Err(refresh_error) = refresh().await {
                warn!(error = %refresh_error, "refresh after failed write also failed");
            }
            Err(error)
        }
    }
}
