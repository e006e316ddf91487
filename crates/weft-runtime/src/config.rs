//! Runtime configuration.
//!
//! Compile-time defaults with environment overrides, in builder form:
//!
//! - `WEFT_NUM_CORES` - kernel threads to start (default: all cores)
//! - `WEFT_STACK_SIZE` - usable stack bytes per user thread
//! - `WEFT_PIN_CORES` - pin each kernel thread to its core index

use weft_core::env::{env_get, env_get_bool};
use weft_core::error::{RuntimeError, RuntimeResult};

use crate::stack::PAGE_SIZE;

/// Default usable stack per user thread.
const DEFAULT_STACK_SIZE: usize = 1024 * 1024;

/// Smallest stack the runtime will hand a thread.
const MIN_STACK_SIZE: usize = 64 * 1024;

/// Upper bound on kernel threads.
const MAX_CORES: usize = 256;

/// Configuration for [`crate::runtime::init`].
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Kernel threads to start, one per core.
    pub num_cores: usize,

    /// Usable stack bytes per user thread (page multiple).
    pub stack_size: usize,

    /// Pin each kernel thread to its core index. Failure to pin is
    /// logged and ignored; restricted CPU masks are common in
    /// containers.
    pub pin_cores: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl RuntimeConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self {
            num_cores: env_get("WEFT_NUM_CORES", hardware_concurrency()),
            stack_size: env_get("WEFT_STACK_SIZE", DEFAULT_STACK_SIZE),
            pin_cores: env_get_bool("WEFT_PIN_CORES", true),
        }
    }

    /// Explicit defaults, no environment consulted. Tests use this for
    /// full control.
    pub fn new() -> Self {
        Self {
            num_cores: hardware_concurrency(),
            stack_size: DEFAULT_STACK_SIZE,
            pin_cores: true,
        }
    }

    pub fn num_cores(mut self, n: usize) -> Self {
        self.num_cores = n;
        self
    }

    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = bytes;
        self
    }

    pub fn pin_cores(mut self, pin: bool) -> Self {
        self.pin_cores = pin;
        self
    }

    /// Check the configuration before the runtime commits to it.
    pub fn validate(&self) -> RuntimeResult<()> {
        if self.num_cores == 0 {
            return Err(RuntimeError::InvalidConfig("num_cores must be > 0"));
        }
        if self.num_cores > MAX_CORES {
            return Err(RuntimeError::InvalidConfig("num_cores must be <= 256"));
        }
        if self.stack_size < MIN_STACK_SIZE {
            return Err(RuntimeError::InvalidConfig("stack_size must be >= 64 KiB"));
        }
        if self.stack_size % PAGE_SIZE != 0 {
            return Err(RuntimeError::InvalidConfig(
                "stack_size must be a multiple of the page size",
            ));
        }
        Ok(())
    }
}

fn hardware_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = RuntimeConfig::new();
        assert!(config.num_cores >= 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = RuntimeConfig::new()
            .num_cores(4)
            .stack_size(128 * 1024)
            .pin_cores(false);

        assert_eq!(config.num_cores, 4);
        assert_eq!(config.stack_size, 128 * 1024);
        assert!(!config.pin_cores);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects() {
        assert!(RuntimeConfig::new().num_cores(0).validate().is_err());
        assert!(RuntimeConfig::new().num_cores(1000).validate().is_err());
        assert!(RuntimeConfig::new().stack_size(4096).validate().is_err());
        assert!(RuntimeConfig::new()
            .stack_size(128 * 1024 + 1)
            .validate()
            .is_err());
    }
}
