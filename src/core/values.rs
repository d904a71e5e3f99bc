//! Supplementary plaintext source.
//!
//! The platform never returns the value of an existing secret, so a real
//! migration needs the values from somewhere else. They are read from a
//! dotenv-style file (`NAME=value`) and held in zeroizing memory.

use std::collections::HashMap;
use std::path::Path;

use zeroize::Zeroizing;

use crate::error::{ConfigError, Result};

/// Plaintext values keyed by case-insensitive secret name.
#[derive(Default)]
pub struct ValueSource {
    values: HashMap<String, Zeroizing<String>>,
}

impl ValueSource {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Read a dotenv-style values file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValuesFile` if the file cannot be read.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents =
            Zeroizing::new(std::fs::read_to_string(path).map_err(|source| {
                ConfigError::ValuesFile {
                    path: path.display().to_string(),
                    source,
                }
            })?);
        Ok(Self::parse(&contents))
    }

    /// Parse dotenv-style content.
    ///
    /// Skips empty lines and comments, accepts an `export ` prefix, and
    /// supports single- and double-quoted values.
    pub fn parse(contents: &str) -> Self {
        let mut values = HashMap::new();

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let line = line.strip_prefix("export ").unwrap_or(line);

            if let Some((name, value)) = line.split_once('=') {
                let name = name.trim();
                if name.is_empty() {
                    continue;
                }
                values.insert(
                    name.to_ascii_uppercase(),
                    Zeroizing::new(parse_value(value.trim())),
                );
            }
        }

        Self { values }
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_ascii_uppercase(), Zeroizing::new(v.into())))
            .collect();
        Self { values }
    }

    /// Value for a secret name, compared case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(&name.to_ascii_uppercase())
            .map(|v| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl std::fmt::Debug for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.values.keys().collect();
        names.sort();
        f.debug_struct("ValueSource").field("names", &names).finish()
    }
}

fn parse_value(raw: &str) -> String {
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        return unescape_double_quoted(&raw[1..raw.len() - 1]);
    }

    if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        return raw[1..raw.len() - 1].to_string();
    }

    raw.to_string()
}

fn unescape_double_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }

        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}
