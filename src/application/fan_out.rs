// Scoped fan-out: one task per child, results in input order
use crate::domain::error::{SnapshotError, SnapshotResult};
use std::future::Future;
use tokio::task::JoinSet;

/// Spawn one task per item on a task set owned by this call.
///
/// Results are written to index slots, so the output follows input order no
/// matter which task finishes first. The first failure (an error, a panic or a
/// cancelled task) aborts every remaining sibling and is returned.
pub async fn fan_out<I, T, F, Fut>(items: Vec<I>, task: F) -> SnapshotResult<Vec<T>>
where
    I: Send + 'static,
    T: Send + 'static,
    F: Fn(I) -> Fut,
    Fut: Future<Output = SnapshotResult<T>> + Send + 'static,
{
    let total = items.len();
    let mut tasks = JoinSet::new();
    for (index, item) in items.into_iter().enumerate() {
        let child = task(item);
        tasks.spawn(async move { (index, child.await) });
    }

    tracing::debug!("Fanned out {} snapshot tasks", total);

    let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(total).collect();
    while let Some(joined) = tasks.join_next().await {
        let outcome = joined.map_err(|e| SnapshotError::Task(e.to_string()));
        match outcome {
            Ok((index, Ok(value))) => slots[index] = Some(value),
            Ok((index, Err(e))) => {
                tracing::warn!("Snapshot task {} of {} failed: {}", index, total, e);
                tasks.abort_all();
                return Err(e);
            }
            Err(e) => {
                tasks.abort_all();
                return Err(e);
            }
        }
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.ok_or_else(|| SnapshotError::Task(format!("task {} produced no result", index)))
        })
        .collect()
}
