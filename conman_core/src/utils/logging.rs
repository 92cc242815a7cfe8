use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use env_logger::Target;
use log::LevelFilter;

/// Initialize logging using env_logger.
/// Defaults to `info`; the RUST_LOG environment variable overrides it,
/// e.g. `RUST_LOG=conman_storage=debug conman list`.
///
/// With `log_file`, records are appended to that file instead of stderr.
/// Rotating it is left to the system's log tooling.
pub fn init_logging(log_file: Option<&Path>) -> io::Result<()> {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                buf.timestamp(),
                record.level(),
                record.args()
            )
        });

    if let Some(path) = log_file {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        builder.target(Target::Pipe(Box::new(file)));
    }

    builder
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
}

/// `~/.local/share/conman/logs/app.log` on Linux, the platform equivalent elsewhere.
pub fn default_log_file() -> Option<PathBuf> {
    ProjectDirs::from("", "", "conman").map(|proj| proj.data_local_dir().join("logs").join("app.log"))
}
