//! Parallel decompression of the blocks of a tile

use std::thread;

use tracing::trace;

use crate::error::{Error, Result};
use crate::layers::Layer;
use crate::types::{BlockDescriptor, TILE_CELLS};

/// A compressed block to decode into one layer of a tile
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Job {
    pub block: usize,
    pub layer: Layer,
}

/// Compressed blocks of a terrain file
#[derive(Debug, Copy, Clone)]
pub(crate) struct BlockSource<'a> {
    /// Compressed data, descriptor offsets are relative to its start
    pub data: &'a [u8],
    pub descriptors: &'a [BlockDescriptor],
}

impl BlockSource<'_> {
    /// Decompress one block and check it against its layer.
    pub fn decode(&self, job: &Job) -> Result<Vec<u8>> {
        let corrupt = |reason: String| Error::CorruptBlock {
            block: job.block,
            reason,
        };

        let descriptor = self
            .descriptors
            .get(job.block)
            .ok_or_else(|| corrupt("no such block".to_owned()))?;
        let start = descriptor.offset as usize;
        let src = start
            .checked_add(descriptor.size as usize)
            .and_then(|end| self.data.get(start..end))
            .ok_or_else(|| corrupt("data lies outside the file".to_owned()))?;

        let expected = job.layer.payload_size();
        let payload = bgs_inflate::decompress_to_vec(src, expected)?;
        if payload.len() != expected {
            return Err(corrupt(format!(
                "decompressed to {} bytes, expected {expected}",
                payload.len()
            )));
        }

        let cells = TILE_CELLS as u8;
        if payload[0] >= cells || payload[1] >= cells {
            return Err(corrupt(format!(
                "cell position ({}, {}) lies outside the tile",
                payload[0], payload[1]
            )));
        }

        trace!(block = job.block, bytes = payload.len(), "decoded block");
        Ok(payload)
    }
}

/// Run `work` over `jobs` on `workers` scoped threads and return the results in job order.
///
/// Worker `w` handles the jobs whose index modulo `workers` is `w`. Every worker is joined
/// before returning; the first error in worker order is returned. With a single worker the
/// jobs run on the calling thread.
pub(crate) fn fork_join<J, T, F>(jobs: &[J], workers: usize, work: F) -> Result<Vec<T>>
where
    J: Sync,
    T: Send,
    F: Fn(&J) -> Result<T> + Sync,
{
    let workers = workers.clamp(1, jobs.len().max(1));
    if workers == 1 {
        return jobs.iter().map(&work).collect();
    }

    let work = &work;
    let outcomes: Vec<Result<Vec<(usize, T)>>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|worker| {
                scope.spawn(move || {
                    jobs.iter()
                        .enumerate()
                        .skip(worker)
                        .step_by(workers)
                        .map(|(index, job)| work(job).map(|result| (index, result)))
                        .collect::<Result<Vec<_>>>()
                })
            })
            .collect();

        handles
            .into_iter()
            .enumerate()
            .map(|(worker, handle)| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(Error::WorkerPanic(worker)))
            })
            .collect()
    });

    let mut results: Vec<Option<T>> = jobs.iter().map(|_| None).collect();
    for outcome in outcomes {
        for (index, result) in outcome? {
            results[index] = Some(result);
        }
    }

    Ok(results.into_iter().flatten().collect())
}
