use log::{debug, error};
use rayon::prelude::*;
use std::fmt::Display;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParallelError {
    #[error("Thread error: {0}")]
    ThreadError(String),

    #[error("Invalid chunk size: {0}")]
    InvalidChunkSize(usize),
}

/// Configuration for parallel processing
#[derive(Debug, Clone)]
pub struct ParallelConfig {
    /// Number of threads to use
    pub threads: usize,

    /// Size of chunks for processing
    pub chunk_size: usize,

    /// Whether to continue on errors
    pub continue_on_error: bool,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        ParallelConfig {
            threads: num_cpus::get(),
            chunk_size: 1000,
            continue_on_error: false,
        }
    }
}

/// Process items in parallel using rayon.
///
/// Results keep the order of `items`. With `continue_on_error` a failing
/// item is logged and yields `None`; otherwise the first error in item order
/// is returned.
pub fn parallel_process<T, U, F, E>(
    items: &[T],
    processor: F,
    config: &ParallelConfig,
) -> Result<Vec<Option<U>>, E>
where
    T: Send + Sync,
    U: Send,
    F: Fn(&T) -> Result<U, E> + Send + Sync,
    E: From<ParallelError> + Send + Display,
{
    if config.chunk_size == 0 {
        return Err(ParallelError::InvalidChunkSize(0).into());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()
        .map_err(|e| ParallelError::ThreadError(format!("Failed to build thread pool: {}", e)))?;

    debug!(
        "Processing {} items on {} threads in chunks of {}",
        items.len(),
        pool.current_num_threads(),
        config.chunk_size
    );

    let results: Vec<Result<U, E>> = pool.install(|| {
        items
            .par_chunks(config.chunk_size)
            .flat_map_iter(|chunk| chunk.iter().map(&processor).collect::<Vec<_>>())
            .collect()
    });

    let mut processed = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(value) => processed.push(Some(value)),
            Err(e) if config.continue_on_error => {
                error!("Skipping item after error: {}", e);
                processed.push(None);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(processed)
}
