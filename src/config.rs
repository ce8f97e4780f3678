use std::env;

use crate::error::VisitError;

const TABLE_NAME_VAR: &str = "TABLE_NAME";

/// Settings resolved once per process, before the runtime starts polling.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub table_name: String,
}

impl Config {
    pub fn from_env() -> Result<Self, VisitError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, VisitError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let table_name = lookup(TABLE_NAME_VAR)
            .filter(|name| !name.trim().is_empty())
            .ok_or(VisitError::MissingConfig(TABLE_NAME_VAR))?;

        Ok(Config { table_name })
    }
}
