//! Per-worker random streams and static work partitions.
//!
//! Work over `total` items is split into exactly `workers` contiguous
//! chunks. Chunk `w` of a loop draws from `ChaCha8Rng::seed_from_u64(seed)`
//! on stream `(lane << 32) | w`, where the lane names the loop (its purpose
//! and entry). Results therefore depend only on the seed and the worker
//! count, never on scheduling.

use std::ops::Range;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use corrsky_core::EntryIndex;

/// Loops that draw random numbers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamPurpose {
    /// Galaxy counts per pixel.
    Counts = 1,
    /// Catalog positions, redshifts and ellipticities.
    Catalog = 2,
}

/// Lane of `purpose` for `entry`.
pub fn lane(purpose: StreamPurpose, entry: EntryIndex) -> u32 {
    ((purpose as u32) << 24) | (entry.0 & 0x00FF_FFFF)
}

/// Seed and worker count shared by every parallel loop of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkerStreams {
    seed: u64,
    workers: usize,
}

impl WorkerStreams {
    /// Streams for `workers` chunks (at least 1).
    pub fn new(seed: u64, workers: usize) -> Self {
        Self {
            seed,
            workers: workers.max(1),
        }
    }

    /// Streams sized to `pool`.
    pub fn for_pool(seed: u64, pool: &rayon::ThreadPool) -> Self {
        Self::new(seed, pool.current_num_threads())
    }

    /// Master seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of chunks.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Generator for chunk `worker` of loop `lane`.
    pub fn stream(&self, lane: u32, worker: usize) -> ChaCha8Rng {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        rng.set_stream((u64::from(lane) << 32) | worker as u64);
        rng
    }

    /// Item range of chunk `worker` out of `total` items.
    pub fn chunk(&self, worker: usize, total: usize) -> Range<usize> {
        let w = self.workers;
        (worker * total / w)..((worker + 1) * total / w)
    }

    /// All chunk ranges in order.
    pub fn chunks(&self, total: usize) -> Vec<Range<usize>> {
        (0..self.workers).map(|w| self.chunk(w, total)).collect()
    }

    /// Split `data` into the disjoint mutable chunks of [`chunks`](Self::chunks),
    /// each tagged with its worker index and starting offset.
    pub fn split_mut<'a, T>(&self, data: &'a mut [T]) -> Vec<(usize, usize, &'a mut [T])> {
        let total = data.len();
        let mut rest = data;
        let mut out = Vec::with_capacity(self.workers);
        for (w, range) in self.chunks(total).into_iter().enumerate() {
            let (head, tail) = std::mem::take(&mut rest).split_at_mut(range.len());
            out.push((w, range.start, head));
            rest = tail;
        }
        out
    }
}
