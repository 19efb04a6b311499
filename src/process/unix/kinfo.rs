//! Decoding of the `struct kinfo_proc` table returned by
//! `sysctl(CTL_KERN, KERN_PROC, KERN_PROC_ALL)`.
//!
//! The record layout is described once, as a [`Layout`] of [`Field`]s, and read
//! through a single generic decoder. Nothing here touches the kernel, so the
//! decoder builds and runs on every platform.

use crate::{account::AccountTable, error::ProcessError, process::Process};

/// Size of `struct kinfo_proc` on 64-bit macOS.
pub const KINFO_PROC_SIZE: usize = 648;

/// `kernel_task`. XNU lists `allproc` newest first, so this entry sits at the
/// end of a `KERN_PROC_ALL` table; it is dropped by pid, not by position.
pub const KERNEL_PLACEHOLDER_PID: i32 = 0;

/// `MAXCOMLEN` plus the terminating NUL.
pub const COMM_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

/// One fixed-width field of a binary record.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub offset: usize,
    pub width: usize,
    pub order: ByteOrder,
}

impl Field {
    pub const fn new(name: &'static str, offset: usize, width: usize, order: ByteOrder) -> Self { Field { name, offset, width, order } }

    pub const fn end(&self) -> usize { self.offset + self.width }

    fn bytes<'r>(&self, record: &'r [u8]) -> Option<&'r [u8]> { record.get(self.offset..self.end()) }

    /// Reads a signed integer of 1 to 8 bytes, sign-extended to `i64`.
    pub fn read_int(&self, record: &[u8]) -> Option<i64> {
        if self.width == 0 || self.width > 8 {
            return None;
        }

        let bytes = self.bytes(record)?;
        let raw = match self.order {
            ByteOrder::Little => bytes.iter().rev().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)),
            ByteOrder::Big => bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)),
        };

        let shift = 64 - 8 * self.width as u32;
        Some(((raw << shift) as i64) >> shift)
    }

    /// Reads a NUL-padded C string; bytes after the first NUL are ignored.
    pub fn read_cstr(&self, record: &[u8]) -> Option<String> {
        let bytes = self.bytes(record)?;
        let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Some(String::from_utf8_lossy(&bytes[..len]).into_owned())
    }
}

/// Byte layout of one fixed-stride kernel process record.
#[derive(Debug, Clone, Copy)]
pub struct Layout {
    pub stride: usize,
    pub pid: Field,
    pub ppid: Field,
    pub uid: Field,
    pub pgrp: Field,
    pub comm: Field,
}

impl Layout {
    const fn fits(&self) -> bool {
        self.pid.end() <= self.stride
            && self.ppid.end() <= self.stride
            && self.uid.end() <= self.stride
            && self.pgrp.end() <= self.stride
            && self.comm.end() <= self.stride
    }

    fn int(&self, field: &Field, record: &[u8]) -> Result<i64, ProcessError> {
        field.read_int(record).ok_or_else(|| ProcessError::Decode {
            pid: 0,
            detail: format!("{} does not fit in a {}-byte record", field.name, record.len()),
        })
    }

    /// Decodes one window of exactly `stride` bytes.
    pub fn decode(&self, record: &[u8]) -> Result<KinfoRecord, ProcessError> {
        if record.len() != self.stride {
            return Err(ProcessError::Decode {
                pid: 0,
                detail: format!("record is {} bytes, expected {}", record.len(), self.stride),
            });
        }

        let pid = self.int(&self.pid, record)? as i32;
        let comm = self.comm.read_cstr(record).ok_or_else(|| ProcessError::Decode {
            pid,
            detail: format!("{} does not fit in a {}-byte record", self.comm.name, record.len()),
        })?;

        Ok(KinfoRecord {
            pid,
            ppid: self.int(&self.ppid, record)? as i32,
            uid: self.int(&self.uid, record)? as u32,
            pgrp: self.int(&self.pgrp, record)? as i32,
            comm,
        })
    }
}

/// `struct kinfo_proc` as laid out by the 64-bit macOS kernel:
/// `kp_proc` (`struct extern_proc`, 296 bytes) followed by `kp_eproc`.
pub const DARWIN_KINFO_PROC: Layout = Layout {
    stride: KINFO_PROC_SIZE,
    pid: Field::new("p_pid", 40, 4, ByteOrder::Little),
    comm: Field::new("p_comm", 243, COMM_LEN, ByteOrder::Little),
    uid: Field::new("e_ucred.cr_uid", 420, 4, ByteOrder::Little),
    ppid: Field::new("e_ppid", 560, 4, ByteOrder::Little),
    pgrp: Field::new("e_pgid", 564, 4, ByteOrder::Little),
};

const _: () = assert!(DARWIN_KINFO_PROC.fits());

/// The fields this crate keeps from one kernel record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KinfoRecord {
    pub pid: i32,
    pub ppid: i32,
    pub uid: u32,
    pub pgrp: i32,
    pub comm: String,
}

/// A raw process table buffer viewed through a [`Layout`].
pub struct KinfoTable<'b> {
    buf: &'b [u8],
    layout: &'b Layout,
}

impl<'b> KinfoTable<'b> {
    pub fn new(buf: &'b [u8], layout: &'b Layout) -> Self { KinfoTable { buf, layout } }

    /// Number of whole records in the buffer. A trailing partial record is not counted.
    pub fn len(&self) -> usize { self.buf.len() / self.layout.stride }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Trailing bytes that do not make up a whole record.
    pub fn remainder(&self) -> usize { self.buf.len() % self.layout.stride }

    /// Every whole record in the buffer, placeholder included.
    pub fn records(&self) -> impl Iterator<Item = Result<KinfoRecord, ProcessError>> + '_ {
        self.buf.chunks_exact(self.layout.stride).map(|window| self.layout.decode(window))
    }

    /// Decodes the table into processes, dropping the kernel placeholder.
    /// Any undecodable record fails the whole table.
    pub fn processes(&self, accounts: &AccountTable) -> Result<Vec<Process>, ProcessError> {
        if self.is_empty() {
            log::debug!("kinfo_proc table holds no whole record ({} bytes)", self.buf.len());
        } else if self.remainder() != 0 {
            log::debug!("discarding {} trailing bytes of kinfo_proc table", self.remainder());
        }

        let mut processes = Vec::with_capacity(self.len());
        for record in self.records() {
            let record = record?;
            if record.pid == KERNEL_PLACEHOLDER_PID {
                log::trace!("dropping kernel placeholder {}", record.comm);
                continue;
            }
            processes.push(Process::from_kinfo(record, accounts));
        }

        Ok(processes)
    }
}
