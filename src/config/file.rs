//! TOML loading for [`Configuration`].
//!
//! Nested tables flatten into dotted keys, so
//!
//! ```toml
//! [hadoop.security]
//! "sasl.mechanism" = "SCRAM"
//! ```
//!
//! yields `hadoop.security.sasl.mechanism = SCRAM`. Scalars are stored in
//! their string form; arrays are joined with `,`. A table inside an array has
//! no flat form and is rejected.

use super::{ConfigError, Configuration};
use std::path::Path;
use toml::{Table, Value};

impl Configuration {
    /// Parses a TOML document into a flat configuration.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let table: Table = toml::from_str(text)?;
        let mut conf = Self::new();
        flatten(&mut conf, None, &table)?;
        Ok(conf)
    }

    /// Reads and parses a TOML configuration file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

fn flatten(
    conf: &mut Configuration,
    prefix: Option<&str>,
    table: &Table,
) -> Result<(), ConfigError> {
    for (key, value) in table {
        let full = match prefix {
            Some(p) => format!("{p}.{key}"),
            None => key.clone(),
        };
        match value {
            Value::Table(inner) => flatten(conf, Some(&full), inner)?,
            other => {
                let flat = scalar(&full, other)?;
                conf.set(full, flat);
            }
        }
    }
    Ok(())
}

fn scalar(key: &str, value: &Value) -> Result<String, ConfigError> {
    Ok(match value {
        Value::String(s) => s.clone(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Datetime(dt) => dt.to_string(),
        Value::Array(items) => items
            .iter()
            .map(|item| scalar(key, item))
            .collect::<Result<Vec<_>, _>>()?
            .join(","),
        Value::Table(table) => {
            return Err(ConfigError::invalid(
                key,
                &format!("{table:?}"),
                "tables inside arrays are not supported",
            ));
        }
    })
}
