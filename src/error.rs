use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("sysctl error: {0}")]
    Sysctl(#[source] io::Error),
    #[error("cannot list {}: {source}", .path.display())]
    ProcRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot read status of pid {pid}: {source}")]
    Status {
        pid: i32,
        #[source]
        source: io::Error,
    },
    #[error("malformed record for pid {pid}: {detail}")]
    Decode { pid: i32, detail: String },
    #[error("process {0} no longer exists")]
    Vanished(i32),
    #[error("process enumeration is not supported on this platform")]
    Unsupported,
}

impl ProcessError {
    /// True when the process exited between being listed and being read.
    pub fn is_vanished(&self) -> bool { matches!(self, ProcessError::Vanished(_)) }

    /// True for errors that concern a single process rather than the whole table.
    pub fn is_per_process(&self) -> bool {
        matches!(self, ProcessError::Status { .. } | ProcessError::Decode { .. } | ProcessError::Vanished(_))
    }

    pub(crate) fn from_io(pid: i32, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => ProcessError::Vanished(pid),
            _ if err.raw_os_error() == Some(libc::ESRCH) => ProcessError::Vanished(pid),
            _ => ProcessError::Status { pid, source: err },
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
