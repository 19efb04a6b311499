use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub const PASSWD_PATH: &str = "/etc/passwd";

static SYSTEM: OnceCell<AccountTable> = OnceCell::new();

/// Mapping from numeric user id to user name, read from a passwd-style file.
///
/// Built once and never mutated afterwards. Lookups are best effort: an
/// unknown id resolves to an empty name.
#[derive(Debug, Clone, Default)]
pub struct AccountTable {
    users: HashMap<u32, String>,
}

impl AccountTable {
    pub fn new() -> Self { Self::default() }

    /// Process-wide table loaded from `/etc/passwd` on first use.
    pub fn system() -> &'static AccountTable { SYSTEM.get_or_init(|| AccountTable::load(PASSWD_PATH)) }

    /// Loads the table from `path`. A missing or unreadable file yields an empty table.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        match fs::read(path) {
            Ok(bytes) => {
                let table = Self::parse(&String::from_utf8_lossy(&bytes));
                if table.is_empty() {
                    log::warn!("no accounts found in {}, user names will be empty", path.display());
                } else {
                    log::debug!("loaded {} accounts from {}", table.len(), path.display());
                }
                table
            }
            Err(err) => {
                log::debug!("account database {} unavailable: {err}", path.display());
                Self::new()
            }
        }
    }

    /// Parses `name:password:uid:...` lines, skipping any line that does not
    /// carry at least three fields or whose third field is not a number.
    pub fn parse(contents: &str) -> Self {
        let mut users = HashMap::new();

        for line in contents.lines() {
            let fields: Vec<&str> = line.split(':').collect();
            if fields.len() < 3 {
                continue;
            }

            match parse_uid(fields[2]) {
                Some(uid) => {
                    users.insert(uid, fields[0].to_string());
                }
                None => continue,
            }
        }

        AccountTable { users }
    }

    pub fn name(&self, uid: u32) -> &str { self.users.get(&uid).map(String::as_str).unwrap_or("") }

    pub fn len(&self) -> usize { self.users.len() }

    pub fn is_empty(&self) -> bool { self.users.is_empty() }
}

// negative ids such as nobody's -2 wrap the same way the kernel stores them
fn parse_uid(field: &str) -> Option<u32> {
    match field.parse::<u32>() {
        Ok(uid) => Some(uid),
        Err(_) => field.parse::<i32>().ok().map(|uid| uid as u32),
    }
}

impl FromIterator<(u32, String)> for AccountTable {
    fn from_iter<I: IntoIterator<Item = (u32, String)>>(iter: I) -> Self { AccountTable { users: iter.into_iter().collect() } }
}
