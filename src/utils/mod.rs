pub mod parallel;

pub use parallel::{parallel_process, ParallelConfig, ParallelError};
