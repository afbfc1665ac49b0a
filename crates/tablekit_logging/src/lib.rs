//! Tracing setup shared by Tablekit hosts.
//!
//! Two layers: a size-rotated log file under the Tablekit home directory,
//! and stderr. Filters come from `TABLEKIT_LOG` (standard `EnvFilter`
//! syntax) with a library-scoped default.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const FILTER_ENV: &str = "TABLEKIT_LOG";
const DEFAULT_FILTER: &str = "tablekit_engine=info,tablekit_forms=info,tablekit_schema=info";
const KEPT_ROTATIONS: usize = 4;
const MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// Per-host logging options.
pub struct LogOptions<'a> {
    /// Base name of the log file, usually the binary name.
    pub app_name: &'a str,
    /// Mirror the full file filter to stderr instead of warnings only.
    pub verbose: bool,
}

/// Install the global subscriber: rotating file layer plus stderr layer.
pub fn init(options: LogOptions<'_>) -> Result<()> {
    let dir = logs_dir();
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;
    let writer = RollingWriter::open(&dir, options.app_name)
        .with_context(|| format!("failed to open log file for {}", options.app_name))?;

    let file_filter = env_filter();
    let stderr_filter = if options.verbose {
        env_filter()
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(file_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_filter(stderr_filter),
        )
        .init();
    Ok(())
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(FILTER_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// The Tablekit home directory: `$TABLEKIT_HOME` or `~/.tablekit`.
pub fn tablekit_home() -> PathBuf {
    if let Ok(path) = std::env::var("TABLEKIT_HOME") {
        return PathBuf::from(path);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tablekit")
}

pub fn logs_dir() -> PathBuf {
    tablekit_home().join("logs")
}

/// `MakeWriter` over a size-rotated log file. `name.log` is current;
/// `name.log.1` is the newest rotation, up to `name.log.4`.
#[derive(Clone)]
struct RollingWriter {
    state: Arc<Mutex<RollingState>>,
}

struct RollingState {
    dir: PathBuf,
    name: String,
    file: File,
    written: u64,
}

impl RollingWriter {
    fn open(dir: &Path, name: &str) -> io::Result<Self> {
        let name = sanitize(name);
        let (file, written) = open_current(dir, &name)?;
        Ok(Self {
            state: Arc::new(Mutex::new(RollingState {
                dir: dir.to_path_buf(),
                name,
                file,
                written,
            })),
        })
    }
}

impl RollingState {
    fn current_path(&self) -> PathBuf {
        self.dir.join(format!("{}.log", self.name))
    }

    fn rotated_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("{}.log.{}", self.name, index))
    }

    /// Shift `name.log` to `name.log.1` and so on, dropping the oldest.
    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        let oldest = self.rotated_path(KEPT_ROTATIONS);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for index in (1..KEPT_ROTATIONS).rev() {
            let from = self.rotated_path(index);
            if from.exists() {
                fs::rename(&from, self.rotated_path(index + 1))?;
            }
        }
        if self.current_path().exists() {
            fs::rename(self.current_path(), self.rotated_path(1))?;
        }
        let (file, written) = open_current(&self.dir, &self.name)?;
        self.file = file;
        self.written = written;
        Ok(())
    }
}

fn open_current(dir: &Path, name: &str) -> io::Result<(File, u64)> {
    let path = dir.join(format!("{name}.log"));
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let written = file.metadata()?.len();
    Ok((file, written))
}

struct RollingGuard {
    state: Arc<Mutex<RollingState>>,
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for RollingWriter {
    type Writer = RollingGuard;

    fn make_writer(&'a self) -> Self::Writer {
        RollingGuard {
            state: Arc::clone(&self.state),
        }
    }
}

impl Write for RollingGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))?;
        if state.written + buf.len() as u64 > MAX_FILE_BYTES {
            state.rotate()?;
        }
        let bytes = state.file.write(buf)?;
        state.written += bytes as u64;
        Ok(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))?;
        state.file.flush()
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}
