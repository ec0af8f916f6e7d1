// Parallel extraction over replicated pipelines
//
// The sample range is cut into hop-aligned chunks, one replica per chunk.
// Each chunk's end is extended by one frame length so that the last frame
// starting inside the chunk is kept; concatenating the chunk results then
// reproduces the sequential frame sequence exactly.

use rayon::prelude::*;

use super::features::{FeatureFrame, FeaturePipeline};
use crate::error::{log_pipeline_error, PipelineError};

/// Hop-aligned sub-ranges covering the frames of [start, end)
///
/// Returns `(chunk_start, chunk_end)` pairs in order. Chunk k holds the
/// frames whose start lies in [chunk_start_k, chunk_start_{k+1}).
pub fn chunk_ranges(
    start: usize,
    end: usize,
    frame_size: usize,
    hop_size: usize,
    total_frames: usize,
    workers: usize,
) -> Vec<(usize, usize)> {
    if total_frames == 0 {
        return Vec::new();
    }

    let workers = workers.clamp(1, total_frames);
    let frames_per_chunk = total_frames.div_ceil(workers);

    (0..total_frames)
        .step_by(frames_per_chunk)
        .map(|first_frame| {
            let next_frame = (first_frame + frames_per_chunk).min(total_frames);
            let chunk_start = start + first_frame * hop_size;
            let chunk_end = (start + next_frame * hop_size + frame_size).min(end);
            (chunk_start, chunk_end)
        })
        .collect()
}

impl FeaturePipeline {
    /// Extract feature frames over [start, end) on a pool of `workers`
    /// threads, one replicated pipeline per hop-aligned chunk
    ///
    /// Produces the same frames, in the same order, as [`FeaturePipeline::extract`].
    ///
    /// # Errors
    /// Same as `extract`, plus `WorkerPool` if the thread pool cannot be built
    pub fn extract_parallel(
        &self,
        signal: &[f32],
        start: usize,
        end: usize,
        workers: usize,
    ) -> Result<Vec<FeatureFrame>, PipelineError> {
        if start >= end || end > signal.len() {
            let err = PipelineError::InvalidRange { start, end };
            log_pipeline_error(&err, "extract_parallel");
            return Err(err);
        }
        if let Err(err) = self.validate() {
            log_pipeline_error(&err, "extract_parallel");
            return Err(err);
        }

        let total_frames = self.frame_count(start, end);
        let chunks = chunk_ranges(
            start,
            end,
            self.frame_size(),
            self.hop_size(),
            total_frames,
            workers,
        );
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let num_workers = chunks.len();
        tracing::info!(
            "[FeaturePipeline] Extracting {} frames on {} parallel workers",
            total_frames,
            num_workers
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_workers)
            .build()
            .map_err(|err| PipelineError::WorkerPool {
                reason: err.to_string(),
            })?;

        let results: Result<Vec<Vec<FeatureFrame>>, PipelineError> = pool.install(|| {
            chunks
                .par_iter()
                .map(|&(chunk_start, chunk_end)| {
                    let mut replica = self.replicate();
                    replica.extract(signal, chunk_start, chunk_end)
                })
                .collect()
        });

        let frames: Vec<FeatureFrame> = results?.into_iter().flatten().collect();
        debug_assert_eq!(frames.len(), total_frames);
        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunks_cover_all_frames() {
        // frame 400, hop 160, 98 frames over 16000 samples
        let chunks = chunk_ranges(0, 16000, 400, 160, 98, 4);
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0], (0, 25 * 160 + 400));
        assert_eq!(chunks[1].0, 25 * 160);
        assert_eq!(chunks[3].1, 16000);

        let per_chunk: usize = chunks
            .iter()
            .map(|&(s, e)| if e > s + 400 { (e - s - 400).div_ceil(160) } else { 0 })
            .sum();
        assert_eq!(per_chunk, 98);
    }

    #[test]
    fn test_more_workers_than_frames() {
        let chunks = chunk_ranges(0, 1000, 400, 160, 4, 16);
        assert_eq!(chunks.len(), 4);
        assert!(chunks.iter().all(|&(s, e)| s < e));
    }

    #[test]
    fn test_no_frames_no_chunks() {
        assert!(chunk_ranges(0, 300, 400, 160, 0, 4).is_empty());
    }
}
