use std::future::Future;

/// Undoes one speculative change. Given the view in the exact state the
/// speculation left it in, the rollback restores the exact state from
/// before.
pub type Rollback<V> = Box<dyn FnOnce(&mut V)>;

/// Applies a speculative change to a local view, then awaits the store's
/// confirmation.
///
/// `speculate` mutates the view and hands back the rollback for that
/// mutation. If `commit` fails, the rollback runs before the error
/// propagates; if it succeeds, the store's confirmed value is returned for
/// the caller to reconcile into the view.
pub async fn commit_or_revert<V, T, E>(
    view: &mut V,
    speculate: impl FnOnce(&mut V) -> Rollback<V>,
    commit: impl Future<Output = Result<T, E>>,
) -> Result<T, E> {
    let rollback = speculate(view);
    match commit.await {
        Ok(confirmed) => Ok(confirmed),
        Err(err) => {
            rollback(view);
            Err(err)
        }
    }
}
