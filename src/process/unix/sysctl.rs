use super::kinfo::{KinfoTable, DARWIN_KINFO_PROC};
use crate::{account::AccountTable, error::ProcessError, process::Process, process::ProcessReader};
use std::{io, ptr};

/// Reads the whole process table with one `KERN_PROC_ALL` sysctl.
pub struct KernelSnapshot<'a> {
    accounts: &'a AccountTable,
}

impl<'a> KernelSnapshot<'a> {
    pub fn new(accounts: &'a AccountTable) -> Self { KernelSnapshot { accounts } }
}

impl ProcessReader for KernelSnapshot<'_> {
    fn processes(&self) -> Result<Vec<Process>, ProcessError> {
        let buf = kern_proc_all()?;
        log::trace!("kern.proc.all returned {} bytes", buf.len());

        KinfoTable::new(&buf, &DARWIN_KINFO_PROC).processes(self.accounts)
    }
}

/// Queries the table size, then fetches the table into a buffer of that size.
fn kern_proc_all() -> Result<Vec<u8>, ProcessError> {
    let mut name: [libc::c_int; 4] = [libc::CTL_KERN, libc::KERN_PROC, libc::KERN_PROC_ALL, 0];
    let mut size: libc::size_t = 0;

    let result = unsafe { libc::sysctl(name.as_mut_ptr(), name.len() as libc::c_uint, ptr::null_mut(), &mut size, ptr::null_mut(), 0) };
    if result != 0 {
        return Err(ProcessError::Sysctl(io::Error::last_os_error()));
    }

    let mut buf: Vec<u8> = vec![0; size];
    let result = unsafe {
        libc::sysctl(
            name.as_mut_ptr(),
            name.len() as libc::c_uint,
            buf.as_mut_ptr() as *mut libc::c_void,
            &mut size,
            ptr::null_mut(),
            0,
        )
    };
    if result != 0 {
        return Err(ProcessError::Sysctl(io::Error::last_os_error()));
    }

    buf.truncate(size);
    Ok(buf)
}
