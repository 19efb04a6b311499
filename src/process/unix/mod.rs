pub mod kinfo;

#[cfg(unix)]
pub mod procfs;

#[cfg(target_os = "macos")]
pub mod sysctl;

pub use kinfo::{DARWIN_KINFO_PROC, KINFO_PROC_SIZE, KERNEL_PLACEHOLDER_PID};

/// Mount point of the proc filesystem.
pub const PROC_ROOT: &str = "/proc";
