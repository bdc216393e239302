use anyhow::{Context, Result};
use chrono::Local;
use env_logger::{Builder, Env, Target};
use log::Level;
use std::{
    fmt::Display,
    fs::{self, File, OpenOptions},
    io::{self, Write},
    path::Path,
};

pub const DEFAULT_LOG_FILE: &str = "logs/etl.log";

/// Used when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "info,weather_etl=debug,weather_etl_core=debug";

/// Install the process-wide logger: stderr plus an append-mode log file.
///
/// Called once from `main`; library code only uses the `log` macros.
pub fn init(log_file: &Path) -> Result<()> {
    if let Some(dir) = log_file.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("Failed to open log file: {}", log_file.display()))?;

    Builder::from_env(Env::default().default_filter_or(DEFAULT_FILTER))
        .format(|buf, record| {
            let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
            writeln!(buf, "{}", format_line(timestamp, record.level(), record.args()))
        })
        .target(Target::Pipe(Box::new(Tee::new(file))))
        .try_init()
        .context("Logger was already initialised")
}

/// `[timestamp] LEVEL - message`
fn format_line(timestamp: impl Display, level: Level, message: impl Display) -> String {
    format!("[{timestamp}] {level} - {message}")
}

/// Writes every line to stderr and the log file.
struct Tee {
    file: File,
}

impl Tee {
    fn new(file: File) -> Self {
        Self { file }
    }
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn line_format() {
        let line = format_line("2023-11-15 01:00:00.000", Level::Warn, "Missing field: wind");
        assert_eq!(line, "[2023-11-15 01:00:00.000] WARN - Missing field: wind");
    }

    #[test]
    fn tee_appends_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("etl.log");
        fs::write(&path, "existing\n").unwrap();

        let file = OpenOptions::new().append(true).open(&path).unwrap();
        let mut tee = Tee::new(file);
        tee.write_all(b"[ts] INFO - hello\n").unwrap();
        tee.flush().unwrap();

        let mut contents = String::new();
        File::open(&path)
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "existing\n[ts] INFO - hello\n");
    }
}
