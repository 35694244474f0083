//! A small bounded worker pool for fanning out the I/O-bound sub-tasks of
//! a single document request (catalog resolution, provisioning, per-resource
//! parsing) across `Config::worker_pool_size` threads, per "the orchestrator
//! may fan out I/O-bound sub-tasks ... across a fixed-size worker pool."
//!
//! Results are handed back in the same order as the input items regardless
//! of completion order, so callers don't need to re-sort; downstream
//! assembly still collects everything into canonically keyed maps before
//! composing the document, which is what actually makes the final HTML
//! independent of fan-out completion order.

use std::collections::VecDeque;
use std::sync::Mutex;

/// Runs `work` over `items` using at most `pool_size` threads at once and
/// returns results in the same order as `items`. `pool_size` is clamped to
/// `[1, items.len()]` so a configured pool larger than the item count
/// doesn't spawn threads that would never pick up work.
pub fn fan_out<T, R, F>(items: Vec<T>, pool_size: usize, work: F) -> Vec<R>
where
    T: Send,
    R: Send,
    F: Fn(T) -> R + Sync,
{
    if items.is_empty() {
        return Vec::new();
    }
    let pool_size = pool_size.clamp(1, items.len());
    let queue: Mutex<VecDeque<(usize, T)>> = Mutex::new(items.into_iter().enumerate().collect());
    let results: Mutex<Vec<(usize, R)>> = Mutex::new(Vec::new());

    std::thread::scope(|scope| {
        for _ in 0..pool_size {
            scope.spawn(|| loop {
                let next = queue.lock().unwrap().pop_front();
                let Some((index, item)) = next else {
                    break;
                };
                let result = work(item);
                results.lock().unwrap().push((index, result));
            });
        }
    });

    let mut results = results.into_inner().unwrap();
    results.sort_by_key(|(index, _)| *index);
    results.into_iter().map(|(_, r)| r).collect()
}
