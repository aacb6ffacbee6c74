//! Parallel processing configuration
//!
//! Grid attribution and the weight matrix run on Rayon's global pool. This
//! module configures that pool once at start-up and reports on it.

use crate::errors::{AeroCountryError, Result};
use rayon::ThreadPoolBuilder;
use tracing::info;

/// Configuration for parallel processing
#[derive(Debug, Clone, Default)]
pub struct ParallelConfig {
    pub num_threads: Option<usize>,
}

impl ParallelConfig {
    pub fn new(num_threads: Option<usize>) -> Self {
        Self { num_threads }
    }

    /// Set up the global Rayon thread pool
    ///
    /// # Errors
    ///
    /// Fails if the thread count is zero or the global pool was already built.
    pub fn setup_global_pool(&self) -> Result<()> {
        match self.num_threads {
            Some(0) => {
                return Err(AeroCountryError::ThreadPoolError(
                    "thread count must be at least 1".to_string(),
                ))
            }
            Some(num_threads) => {
                ThreadPoolBuilder::new()
                    .num_threads(num_threads)
                    .build_global()
                    .map_err(|e| {
                        AeroCountryError::ThreadPoolError(format!(
                            "Failed to initialize thread pool with {} threads: {}",
                            num_threads, e
                        ))
                    })?;
                info!(threads = num_threads, "Configured parallel processing");
            }
            None => info!(
                threads = rayon::current_num_threads(),
                "Using default thread pool configuration"
            ),
        }
        Ok(())
    }

    /// Use every available CPU core
    pub fn all_cores() -> Self {
        Self {
            num_threads: Some(num_cpus::get()),
        }
    }
}

/// Get information about the current parallel configuration
pub fn get_parallel_info() -> ParallelInfo {
    ParallelInfo {
        current_threads: rayon::current_num_threads(),
        available_cores: num_cpus::get(),
        available_parallelism: std::thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(1),
    }
}

/// Information about the parallel processing environment
#[derive(Debug, Clone)]
pub struct ParallelInfo {
    pub current_threads: usize,
    pub available_cores: usize,
    pub available_parallelism: usize,
}

impl ParallelInfo {
    pub fn print_info(&self) {
        println!("📊 Parallel Processing Information:");
        println!("   Current threads: {}", self.current_threads);
        println!("   Available CPU cores: {}", self.available_cores);
        println!("   Available parallelism: {}", self.available_parallelism);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_threads_rejected() {
        let result = ParallelConfig::new(Some(0)).setup_global_pool();
        assert!(matches!(result, Err(AeroCountryError::ThreadPoolError(_))));
    }

    #[test]
    fn info_reports_cores() {
        let info = get_parallel_info();
        assert!(info.available_cores >= 1);
        assert!(info.current_threads >= 1);
    }
}
