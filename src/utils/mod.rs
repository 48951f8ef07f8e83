pub mod clock;
pub mod setting;

use anyhow::Result;
use regex::Regex;
use std::sync::OnceLock;

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("static regex is valid"))
}

/// Checks that a table name is a plain SQL identifier so it can be spliced into queries.
pub fn validate_identifier(name: &str) -> Result<()> {
    if identifier_pattern().is_match(name) {
        Ok(())
    } else {
        Err(anyhow::anyhow!("'{}' is not a valid SQL identifier", name))
    }
}
