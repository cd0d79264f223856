use crossbeam_channel::unbounded;

use std::thread;

/// A scoped fan-out pool. Splits `items` into at most `num_threads` chunks, processes each chunk
/// on its own thread and joins every thread before returning. Because the threads are scoped,
/// `items` and `f` may borrow from the caller.
///
/// Results arrive in completion order, not input order.
///
/// ```
/// use evmstate_common::utils::threading::fan_out;
///
/// let items = vec![1, 2, 3, 4, 5];
/// let mut results = fan_out(&items, 2, |item| item * 2);
///
/// // sort
/// results.sort();
///
/// assert_eq!(results, vec![2, 4, 6, 8, 10]);
/// ```
pub fn fan_out<T, R, F>(items: &[T], num_threads: usize, f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
{
    if items.is_empty() {
        return Vec::new();
    }

    // a single worker needs no threads at all
    let num_threads = num_threads.clamp(1, items.len());
    if num_threads == 1 {
        return items.iter().map(f).collect();
    }

    let (tx, rx) = unbounded();
    let chunk_size = items.len().div_ceil(num_threads);
    let f = &f;

    thread::scope(|scope| {
        for chunk in items.chunks(chunk_size) {
            let tx = tx.clone();
            scope.spawn(move || {
                let chunk_results: Vec<R> = chunk.iter().map(f).collect();
                let _ = tx.send(chunk_results);
            });
        }
    });

    // every sender clone has been dropped by its thread; drop ours so the receiver terminates
    drop(tx);
    rx.into_iter().flatten().collect()
}
