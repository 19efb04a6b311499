use colored::Colorize;
use once_cell::sync::Lazy;

pub static FAIL: Lazy<colored::ColoredString> = Lazy::new(|| "[PSN]".red());
pub static WARN: Lazy<colored::ColoredString> = Lazy::new(|| "[PSN]".yellow());

/// Renders an optional field, using `-` when the source did not provide it.
pub fn or_dash<T: ToString>(value: Option<T>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "-".to_string(),
    }
}
