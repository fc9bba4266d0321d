// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Backend for the `log` facade.
//!
//! The crate logs through `log::debug!` and friends. Nothing is printed
//! until an application installs a logger; this module provides a small
//! one with console and file outputs:
//!
//! ```ignore
//! use hdds_intra::logging::{init_logger, ConsoleOutput, LogLevel};
//! use std::sync::Arc;
//!
//! let console = Arc::new(ConsoleOutput::new(LogLevel::Debug));
//! init_logger(console, LogLevel::Debug);
//! log::info!("ready");
//! ```
//!
//! Applications that already use another `log` backend can skip this
//! module entirely.

pub mod logger;
mod output;

pub use logger::{flush_logger, init_logger};
pub use output::{ConsoleOutput, FileOutput, LogLevel, Output};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_multiple_init_calls_safe() {
        let console = Arc::new(ConsoleOutput::new(LogLevel::Info));
        init_logger(console.clone(), LogLevel::Info);

        // Second call is ignored.
        init_logger(console, LogLevel::Debug);

        log::info!("still works");
        assert!(flush_logger().is_ok());
    }
}
