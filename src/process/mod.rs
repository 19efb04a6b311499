pub mod unix;

use crate::{account::AccountTable, error::ProcessError};
use serde::Serialize;

pub use unix::kinfo::{ByteOrder, Field, KinfoRecord, KinfoTable, Layout};

#[cfg(target_os = "macos")]
pub use unix::sysctl::KernelSnapshot;

#[cfg(unix)]
pub use unix::procfs::{ProcFs, StatRecord};

/// One entry of the process table, captured at the moment it was read.
///
/// Fields the source does not expose are `None`: the kernel snapshot carries
/// no run state or session, the proc filesystem carries everything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Process {
    pid: i32,
    ppid: i32,
    uid: Option<u32>,
    user: String,
    state: Option<char>,
    pgrp: Option<i32>,
    sid: Option<i32>,
    executable: String,
}

impl Process {
    pub(crate) fn from_kinfo(record: KinfoRecord, accounts: &AccountTable) -> Self {
        Process {
            pid: record.pid,
            ppid: record.ppid,
            uid: Some(record.uid),
            user: accounts.name(record.uid).to_string(),
            state: None,
            pgrp: Some(record.pgrp),
            sid: None,
            executable: record.comm,
        }
    }

    #[cfg(unix)]
    pub(crate) fn from_stat(pid: i32, uid: u32, stat: StatRecord, accounts: &AccountTable) -> Self {
        Process {
            pid,
            ppid: stat.ppid,
            uid: Some(uid),
            user: accounts.name(uid).to_string(),
            state: Some(stat.state),
            pgrp: Some(stat.pgrp),
            sid: Some(stat.sid),
            executable: stat.comm,
        }
    }

    pub fn pid(&self) -> i32 { self.pid }
    pub fn ppid(&self) -> i32 { self.ppid }
    pub fn uid(&self) -> Option<u32> { self.uid }
    pub fn user(&self) -> &str { &self.user }
    pub fn executable(&self) -> &str { &self.executable }
    pub fn state(&self) -> Option<char> { self.state }
    pub fn pgrp(&self) -> Option<i32> { self.pgrp }
    pub fn sid(&self) -> Option<i32> { self.sid }
}

/// A source of process table snapshots.
pub trait ProcessReader {
    /// Every process currently in the table, in platform order.
    fn processes(&self) -> Result<Vec<Process>, ProcessError>;

    /// The process with `pid`, or `None` when no such process exists.
    fn find(&self, pid: i32) -> Result<Option<Process>, ProcessError> {
        Ok(self.processes()?.into_iter().find(|process| process.pid() == pid))
    }
}

#[cfg(target_os = "macos")]
pub type NativeReader<'a> = KernelSnapshot<'a>;

#[cfg(all(unix, not(target_os = "macos")))]
pub type NativeReader<'a> = ProcFs<'a>;

#[cfg(not(unix))]
pub type NativeReader<'a> = Unsupported<'a>;

/// Builds the reader this platform enumerates processes with.
pub fn native_reader(accounts: &AccountTable) -> NativeReader<'_> { NativeReader::new(accounts) }

/// Snapshot of all running processes.
pub fn processes() -> Result<Vec<Process>, ProcessError> { native_reader(AccountTable::system()).processes() }

/// Looks up a single running process by pid.
pub fn find_process(pid: i32) -> Result<Option<Process>, ProcessError> { native_reader(AccountTable::system()).find(pid) }

#[cfg(not(unix))]
pub struct Unsupported<'a> {
    _accounts: &'a AccountTable,
}

#[cfg(not(unix))]
impl<'a> Unsupported<'a> {
    pub fn new(accounts: &'a AccountTable) -> Self { Unsupported { _accounts: accounts } }
}

#[cfg(not(unix))]
impl ProcessReader for Unsupported<'_> {
    fn processes(&self) -> Result<Vec<Process>, ProcessError> { Err(ProcessError::Unsupported) }
    fn find(&self, _pid: i32) -> Result<Option<Process>, ProcessError> { Err(ProcessError::Unsupported) }
}
