//! Parallel prefetch of source contents for large batches

use super::unit::SourceUnit;
use std::thread;

/// Reads sources on a small pool of scoped worker threads
#[derive(Debug, Clone)]
pub struct ReadManager {
    threads: usize,
}

impl ReadManager {
    pub fn new(threads: usize) -> Self {
        Self {
            threads: threads.max(1),
        }
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Load every source that is not loaded yet; order is preserved
    ///
    /// Read failures are kept inside the units and surface when the front
    /// end asks for their contents.
    pub fn prefetch(&self, sources: &mut [SourceUnit], max_size: u64) -> usize {
        if sources.is_empty() {
            return 0;
        }

        let chunk_size = calculate_chunk_size(sources.len(), self.threads);

        crate::log_debug!("Prefetching sources",
            "sources" => sources.len(),
            "threads" => self.threads,
            "chunk_size" => chunk_size
        );

        for_each_in_rounds(sources, self.threads, chunk_size, |source| {
            source.load(max_size);
        });

        sources.iter().filter(|s| s.is_readable()).count()
    }
}

/// Apply `f` to every item, one chunk per worker and at most `threads`
/// workers alive at a time
fn for_each_in_rounds<T, F>(items: &mut [T], threads: usize, chunk_size: usize, f: F)
where
    T: Send,
    F: Fn(&mut T) + Sync,
{
    let chunk_size = chunk_size.max(1);
    let round_size = chunk_size * threads.max(1);
    let f = &f;

    for round in items.chunks_mut(round_size) {
        thread::scope(|scope| {
            for chunk in round.chunks_mut(chunk_size) {
                scope.spawn(move || chunk.iter_mut().for_each(f));
            }
        });
    }
}

fn calculate_chunk_size(total: usize, threads: usize) -> usize {
    const MIN_CHUNK_SIZE: usize = 1;
    const MAX_CHUNK_SIZE: usize = 50;

    total
        .div_ceil(threads.max(1))
        .clamp(MIN_CHUNK_SIZE, MAX_CHUNK_SIZE)
}
