// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Global logger installed into the `log` facade.

use super::output::{LogLevel, Output};
use std::io;
use std::sync::{Arc, OnceLock};

static LOGGER: OnceLock<GlobalLogger> = OnceLock::new();

/// Forwards `log` records to one [`Output`].
pub struct GlobalLogger {
    output: Arc<dyn Output>,
    level_filter: LogLevel,
}

impl log::Log for GlobalLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        LogLevel::from_log(metadata.level()) >= self.level_filter
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = format!("{}: {}", record.target(), record.args());
        // A failing sink must not take the caller down.
        let _ = self
            .output
            .write(LogLevel::from_log(record.level()), &message);
    }

    fn flush(&self) {
        let _ = self.output.flush();
    }
}

/// Install the global logger.
///
/// Only the first call takes effect; later calls (or another `log` backend
/// installed earlier) leave the existing logger in place.
pub fn init_logger(output: Arc<dyn Output>, level: LogLevel) {
    let mut installed = false;
    let logger = LOGGER.get_or_init(|| {
        installed = true;
        GlobalLogger {
            output,
            level_filter: level,
        }
    });
    if !installed {
        return;
    }
    if log::set_logger(logger).is_ok() {
        log::set_max_level(level.to_filter());
    }
}

/// Flush the installed output. No-op before [`init_logger`].
pub fn flush_logger() -> io::Result<()> {
    match LOGGER.get() {
        Some(logger) => logger.output.flush(),
        None => Ok(()),
    }
}
