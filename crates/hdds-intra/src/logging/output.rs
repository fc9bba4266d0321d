// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Log output backends (console and file).

use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warning = 2,
    Error = 3,
}

impl LogLevel {
    /// Fixed-width label used as the line prefix.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO ",
            Self::Warning => "WARN ",
            Self::Error => "ERROR",
        }
    }

    /// `log::Level::Trace` folds into `Debug`.
    pub fn from_log(level: log::Level) -> Self {
        match level {
            log::Level::Error => Self::Error,
            log::Level::Warn => Self::Warning,
            log::Level::Info => Self::Info,
            log::Level::Debug | log::Level::Trace => Self::Debug,
        }
    }

    pub fn to_filter(self) -> log::LevelFilter {
        match self {
            Self::Debug => log::LevelFilter::Trace,
            Self::Info => log::LevelFilter::Info,
            Self::Warning => log::LevelFilter::Warn,
            Self::Error => log::LevelFilter::Error,
        }
    }
}

/// Output destination for log lines.
pub trait Output: Send + Sync {
    /// Write one message. Messages below the output's own level are skipped.
    fn write(&self, level: LogLevel, message: &str) -> io::Result<()>;

    fn flush(&self) -> io::Result<()>;
}

/// Writes to stderr.
pub struct ConsoleOutput {
    level_filter: Mutex<LogLevel>,
}

impl ConsoleOutput {
    pub fn new(level_filter: LogLevel) -> Self {
        Self {
            level_filter: Mutex::new(level_filter),
        }
    }

    pub fn set_level(&self, level: LogLevel) {
        *self.level_filter.lock() = level;
    }
}

impl Output for ConsoleOutput {
    fn write(&self, level: LogLevel, message: &str) -> io::Result<()> {
        if level < *self.level_filter.lock() {
            return Ok(());
        }
        let mut stderr = io::stderr().lock();
        writeln!(stderr, "[{}] {}", level.as_str(), message)
    }

    fn flush(&self) -> io::Result<()> {
        io::stderr().flush()
    }
}

/// Appends to a file, truncated on creation.
pub struct FileOutput {
    file: Mutex<File>,
    level_filter: Mutex<LogLevel>,
}

impl FileOutput {
    pub fn new<P: AsRef<Path>>(path: P, level_filter: LogLevel) -> io::Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            file: Mutex::new(file),
            level_filter: Mutex::new(level_filter),
        })
    }

    pub fn set_level(&self, level: LogLevel) {
        *self.level_filter.lock() = level;
    }
}

impl Output for FileOutput {
    fn write(&self, level: LogLevel, message: &str) -> io::Result<()> {
        if level < *self.level_filter.lock() {
            return Ok(());
        }
        let mut file = self.file.lock();
        writeln!(file, "[{}] {}", level.as_str(), message)
    }

    fn flush(&self) -> io::Result<()> {
        self.file.lock().flush()
    }
}
