use crate::{account::PASSWD_PATH, process::unix::PROC_ROOT};
use macros_rs::string;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: Paths,
    pub display: Display,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Paths {
    pub passwd: String,
    pub proc_root: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Display {
    pub format: String,
}

impl Default for Paths {
    fn default() -> Self {
        Paths {
            passwd: string!(PASSWD_PATH),
            proc_root: string!(PROC_ROOT),
        }
    }
}

impl Default for Display {
    fn default() -> Self { Display { format: string!("default") } }
}
