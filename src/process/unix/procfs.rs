use super::PROC_ROOT;
use crate::{account::AccountTable, error::ProcessError, process::Process, process::ProcessReader};
use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::PathBuf;

/// The fields kept from `/proc/<pid>/stat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatRecord {
    pub comm: String,
    pub state: char,
    pub ppid: i32,
    pub pgrp: i32,
    pub sid: i32,
}

impl StatRecord {
    /// Parses `pid (comm) state ppid pgrp session ...`.
    ///
    /// The command name may itself contain spaces and parentheses, so it is
    /// taken from the first `(` to the last `)`; the fields after it are
    /// whitespace separated.
    pub fn parse(pid: i32, contents: &str) -> Result<Self, ProcessError> {
        let decode = |detail: &str| ProcessError::Decode { pid, detail: detail.to_string() };

        let open = contents.find('(').ok_or_else(|| decode("missing '(' before command name"))?;
        let close = contents.rfind(')').ok_or_else(|| decode("missing ')' after command name"))?;
        if close < open {
            return Err(decode("unbalanced command name"));
        }

        let comm = contents[open + 1..close].to_string();
        let parts: Vec<&str> = contents[close + 1..].split_whitespace().collect();
        if parts.len() < 4 {
            return Err(decode(&format!("expected at least 4 fields after command name, found {}", parts.len())));
        }

        let state = parts[0].chars().next().ok_or_else(|| decode("empty state field"))?;
        let field = |index: usize, name: &str| parts[index].parse::<i32>().map_err(|err| decode(&format!("invalid {name} '{}': {err}", parts[index])));

        Ok(StatRecord {
            comm,
            state,
            ppid: field(1, "ppid")?,
            pgrp: field(2, "pgrp")?,
            sid: field(3, "session")?,
        })
    }
}

/// Reads the process table from a procfs mount, one directory per process.
pub struct ProcFs<'a> {
    root: PathBuf,
    accounts: &'a AccountTable,
}

impl<'a> ProcFs<'a> {
    pub fn new(accounts: &'a AccountTable) -> Self { Self::with_root(PROC_ROOT, accounts) }

    pub fn with_root<P: Into<PathBuf>>(root: P, accounts: &'a AccountTable) -> Self { ProcFs { root: root.into(), accounts } }

    /// Reads one process directory. The owner of the directory is the owner of the process.
    ///
    /// The command name is whatever bytes the process set, so `stat` is decoded lossily.
    pub fn read_process(&self, pid: i32) -> Result<Process, ProcessError> {
        let dir = self.root.join(pid.to_string());
        let metadata = fs::metadata(&dir).map_err(|err| ProcessError::from_io(pid, err))?;
        let contents = fs::read(dir.join("stat")).map_err(|err| ProcessError::from_io(pid, err))?;
        let stat = StatRecord::parse(pid, &String::from_utf8_lossy(&contents))?;

        Ok(Process::from_stat(pid, metadata.uid(), stat, self.accounts))
    }
}

/// Turns a lookup that lost the race with process exit into `None`.
fn vanished_as_none<T>(result: Result<T, ProcessError>) -> Result<Option<T>, ProcessError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_vanished() => Ok(None),
        Err(err) => Err(err),
    }
}

fn is_process_dir(entry: &fs::DirEntry) -> bool {
    let numeric = entry.file_name().as_encoded_bytes().first().map_or(false, u8::is_ascii_digit);
    numeric && entry.file_type().map(|kind| kind.is_dir()).unwrap_or(false)
}

impl ProcessReader for ProcFs<'_> {
    fn processes(&self) -> Result<Vec<Process>, ProcessError> {
        let proc_dir = fs::read_dir(&self.root).map_err(|source| ProcessError::ProcRoot { path: self.root.clone(), source })?;
        let mut processes = Vec::new();

        for entry in proc_dir {
            let entry = entry.map_err(|source| ProcessError::ProcRoot { path: self.root.clone(), source })?;
            if !is_process_dir(&entry) {
                continue;
            }

            let pid = match entry.file_name().to_str().and_then(|name| name.parse::<i32>().ok()) {
                Some(pid) => pid,
                None => {
                    log::trace!("skipping {:?}: not a pid", entry.file_name());
                    continue;
                }
            };

            match self.read_process(pid) {
                Ok(process) => processes.push(process),
                Err(err) if err.is_vanished() => log::trace!("skipping pid {pid}: exited during scan"),
                Err(err) => log::debug!("skipping pid {pid}: {err}"),
            }
        }

        Ok(processes)
    }

    fn find(&self, pid: i32) -> Result<Option<Process>, ProcessError> {
        let exists = fs::metadata(self.root.join(pid.to_string())).map_err(|err| ProcessError::from_io(pid, err));
        if vanished_as_none(exists)?.is_none() {
            return Ok(None);
        }

        vanished_as_none(self.read_process(pid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::Path;
    use tempfile::TempDir;

    const BASH_STAT: &str = "4021 (bash) S 4012 4021 4021 34817 4290 4194304 9281 0 0 0 12 5 0 0 20 0 1 0 31337 11452416 1303 18446744073709551615\n";

    fn add_process(root: &Path, pid: &str, stat: Option<&str>) {
        let dir = root.join(pid);
        fs::create_dir(&dir).unwrap();
        if let Some(stat) = stat {
            fs::write(dir.join("stat"), stat).unwrap();
        }
    }

    fn stat_line(pid: i32, comm: &str, ppid: i32) -> String { format!("{pid} ({comm}) S {ppid} {pid} {pid} 0 -1 4194560 100 0 0 0 1 1 0 0 20 0 1 0 500 1000 100\n") }

    fn fake_proc() -> TempDir {
        let root = tempfile::tempdir().unwrap();
        add_process(root.path(), "1", Some(stat_line(1, "init", 0).as_str()));
        add_process(root.path(), "42", Some(stat_line(42, "sshd", 1).as_str()));
        add_process(root.path(), "self", None);
        add_process(root.path(), "sys", None);
        fs::write(root.path().join("uptime"), "1234.5 678.9\n").unwrap();
        fs::write(root.path().join("7"), "a file, not a directory").unwrap();
        root
    }

    #[test]
    fn test_parse_stat() {
        let stat = StatRecord::parse(4021, BASH_STAT).unwrap();

        assert_eq!(stat.comm, "bash");
        assert_eq!(stat.state, 'S');
        assert_eq!(stat.ppid, 4012);
        assert_eq!(stat.pgrp, 4021);
        assert_eq!(stat.sid, 4021);
    }

    #[test]
    fn test_parse_stat_comm_with_spaces_and_parens() {
        let stat = StatRecord::parse(900, "900 (Web Content (x)) R 1 900 850 0 -1 0\n").unwrap();

        assert_eq!(stat.comm, "Web Content (x)");
        assert_eq!(stat.state, 'R');
        assert_eq!(stat.ppid, 1);
        assert_eq!(stat.sid, 850);
    }

    #[test]
    fn test_parse_stat_kernel_thread() {
        let stat = StatRecord::parse(2, "2 (kthreadd) S 0 0 0 0 -1 2129984 0 0 0 0 0 0 0 0 20 0 1 0 2 0 0\n").unwrap();
        assert_eq!(stat.ppid, 0);
        assert_eq!(stat.comm, "kthreadd");
    }

    #[test]
    fn test_parse_stat_malformed() {
        assert!(matches!(StatRecord::parse(5, "5 bash S 1 5 5"), Err(ProcessError::Decode { pid: 5, .. })));
        assert!(matches!(StatRecord::parse(5, "5 (bash) S 1"), Err(ProcessError::Decode { .. })));
        assert!(matches!(StatRecord::parse(5, "5 (bash) S one 5 5"), Err(ProcessError::Decode { .. })));
        assert!(matches!(StatRecord::parse(5, ""), Err(ProcessError::Decode { .. })));
    }

    #[test]
    fn test_enumerate_only_numeric_directories() {
        let root = fake_proc();
        let accounts = AccountTable::new();
        let mut processes = ProcFs::with_root(root.path(), &accounts).processes().unwrap();
        processes.sort_by_key(|p| p.pid());

        let pids: Vec<i32> = processes.iter().map(|p| p.pid()).collect();
        assert_eq!(pids, vec![1, 42]);
        assert_eq!(processes[1].executable(), "sshd");
        assert_eq!(processes[1].ppid(), 1);
        assert_eq!(processes[1].state(), Some('S'));
    }

    #[test]
    fn test_enumerate_skips_vanished_and_malformed() {
        let root = fake_proc();
        add_process(root.path(), "4242", None);
        add_process(root.path(), "4343", Some("garbage"));
        add_process(root.path(), "12abc", Some(stat_line(12, "odd", 1).as_str()));

        let accounts = AccountTable::new();
        let processes = ProcFs::with_root(root.path(), &accounts).processes().unwrap();

        assert_eq!(processes.len(), 2);
        assert!(processes.iter().all(|p| p.pid() == 1 || p.pid() == 42));
    }

    #[test]
    fn test_enumerate_missing_root_is_fatal() {
        let accounts = AccountTable::new();
        let err = ProcFs::with_root("/nonexistent/procsnap/proc", &accounts).processes().unwrap_err();
        assert!(matches!(err, ProcessError::ProcRoot { .. }));
    }

    #[test]
    fn test_uid_comes_from_directory_owner() {
        let root = fake_proc();
        let owner = fs::metadata(root.path().join("42")).unwrap().uid();
        let accounts: AccountTable = [(owner, "owner".to_string())].into_iter().collect();

        let process = ProcFs::with_root(root.path(), &accounts).find(42).unwrap().unwrap();
        assert_eq!(process.uid(), Some(owner));
        assert_eq!(process.user(), "owner");
    }

    #[test]
    fn test_find() {
        let root = fake_proc();
        let accounts = AccountTable::new();
        let procfs = ProcFs::with_root(root.path(), &accounts);

        assert_eq!(procfs.find(42).unwrap().unwrap().executable(), "sshd");
        assert!(procfs.find(31337).unwrap().is_none());
    }

    #[test]
    fn test_find_distinguishes_decode_errors() {
        let root = fake_proc();
        add_process(root.path(), "4343", Some("garbage"));
        add_process(root.path(), "4242", None);

        let accounts = AccountTable::new();
        let procfs = ProcFs::with_root(root.path(), &accounts);

        assert!(matches!(procfs.find(4343), Err(ProcessError::Decode { pid: 4343, .. })));
        assert!(procfs.find(4242).unwrap().is_none());
        assert!(matches!(procfs.read_process(4242), Err(ProcessError::Vanished(4242))));
    }

    #[test]
    fn test_non_utf8_command_name_is_kept() {
        let root = fake_proc();
        let dir = root.path().join("55");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("stat"), b"55 (bad\xffname) S 1 55 55 0 -1 0\n").unwrap();

        let accounts = AccountTable::new();
        let procfs = ProcFs::with_root(root.path(), &accounts);

        let listed = procfs.processes().unwrap();
        let entry = listed.iter().find(|p| p.pid() == 55).expect("pid 55 should be listed");
        assert_eq!(entry.executable(), "bad\u{FFFD}name");
        assert_eq!(entry.ppid(), 1);

        let found = procfs.find(55).unwrap().unwrap();
        assert_eq!(found.executable(), entry.executable());
        assert_eq!(found.sid(), Some(55));
    }

    #[test]
    fn test_exit_race_errors_become_none() {
        let esrch = ProcessError::from_io(77, io::Error::from_raw_os_error(libc::ESRCH));
        assert!(vanished_as_none::<()>(Err(esrch)).unwrap().is_none());

        let enoent = ProcessError::from_io(77, io::Error::from(io::ErrorKind::NotFound));
        assert!(vanished_as_none::<()>(Err(enoent)).unwrap().is_none());

        let denied = ProcessError::from_io(77, io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(vanished_as_none::<()>(Err(denied)), Err(ProcessError::Status { pid: 77, .. })));

        assert_eq!(vanished_as_none::<i32>(Ok(3)).unwrap(), Some(3));
    }
}
