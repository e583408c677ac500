//! Entry attributes
//!
//! Attributes are an open-ended map from name to value. A fixed set of keys
//! (`size`, `sha1`, `mode`, `uid`, `gid`) is typed and validated on insert;
//! every other key carries a free-form string.

use crate::error::ManifestError;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A single attribute value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttrValue {
    Int(u64),
    Text(String),
}

impl AttrValue {
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            AttrValue::Int(v) => Some(*v),
            AttrValue::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            AttrValue::Int(_) => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Int(v) => write!(f, "{}", v),
            AttrValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for AttrValue {
    fn from(v: u64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Text(s)
    }
}

/// Attribute keys with required parse/validate semantics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttrKey {
    Gid,
    Mode,
    Sha1,
    Size,
    Uid,
}

impl AttrKey {
    pub const ALL: [AttrKey; 5] = [
        AttrKey::Gid,
        AttrKey::Mode,
        AttrKey::Sha1,
        AttrKey::Size,
        AttrKey::Uid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AttrKey::Gid => "gid",
            AttrKey::Mode => "mode",
            AttrKey::Sha1 => "sha1",
            AttrKey::Size => "size",
            AttrKey::Uid => "uid",
        }
    }

    /// Look up a known key by attribute name (exact, lowercase)
    pub fn known(name: &str) -> Option<AttrKey> {
        AttrKey::ALL.iter().copied().find(|k| k.as_str() == name)
    }

    /// Parse a textual value for this key
    pub fn parse_value(&self, raw: &str) -> Result<AttrValue, ManifestError> {
        let invalid = || ManifestError::InvalidAttributeValue {
            key: self.as_str().to_string(),
            value: raw.to_string(),
        };
        match self {
            AttrKey::Sha1 => {
                let sha1 = raw.trim().to_ascii_lowercase();
                if is_sha1_hex(&sha1) {
                    Ok(AttrValue::Text(sha1))
                } else {
                    Err(invalid())
                }
            }
            _ => parse_uint(raw).map(AttrValue::Int).ok_or_else(invalid),
        }
    }

    /// Check that an already-typed value satisfies this key's validator
    pub fn validate(&self, value: &AttrValue) -> Result<(), ManifestError> {
        let ok = match (self, value) {
            (AttrKey::Sha1, AttrValue::Text(s)) => is_sha1_hex(s),
            (AttrKey::Sha1, AttrValue::Int(_)) => false,
            (_, AttrValue::Int(_)) => true,
            (_, AttrValue::Text(_)) => false,
        };
        if ok {
            Ok(())
        } else {
            Err(ManifestError::InvalidAttributeValue {
                key: self.as_str().to_string(),
                value: value.to_string(),
            })
        }
    }

    /// Render a value so that `parse_value` reads it back unchanged
    pub fn format_value(&self, value: &AttrValue) -> String {
        match (self, value) {
            (AttrKey::Mode, AttrValue::Int(mode)) => format!("0o{:06o}", mode),
            _ => value.to_string(),
        }
    }
}

impl fmt::Display for AttrKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttrKey {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        AttrKey::known(&name).ok_or(ManifestError::UnknownAttribute(name))
    }
}

/// Non-negative integer in decimal or `0x`/`0o`/`0b` notation
fn parse_uint(raw: &str) -> Option<u64> {
    let s = raw.trim();
    let (digits, radix) = match s.get(..2).map(|p| p.to_ascii_lowercase()).as_deref() {
        Some("0x") => (&s[2..], 16),
        Some("0o") => (&s[2..], 8),
        Some("0b") => (&s[2..], 2),
        _ => (s, 10),
    };
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return None;
    }
    u64::from_str_radix(digits, radix).ok()
}

fn is_sha1_hex(s: &str) -> bool {
    s.len() == 40
        && !s.bytes().any(|b| b.is_ascii_uppercase())
        && hex::decode(s).is_ok()
}

/// Attribute map of a single entry, sorted by key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(BTreeMap<String, AttrValue>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a typed value
    ///
    /// The key is trimmed and lowercased. Values of known keys must pass the
    /// key's validator; values of other keys are stored as text.
    pub fn insert(
        &mut self,
        key: impl AsRef<str>,
        value: impl Into<AttrValue>,
    ) -> Result<Option<AttrValue>, ManifestError> {
        let key = key.as_ref().trim().to_ascii_lowercase();
        let value = match (AttrKey::known(&key), value.into()) {
            (Some(known), value) => {
                known.validate(&value)?;
                value
            }
            (None, AttrValue::Int(v)) => AttrValue::Text(v.to_string()),
            (None, text) => text,
        };
        Ok(self.0.insert(key, value))
    }

    /// Insert from the textual `key: value` form
    ///
    /// The key is trimmed and lowercased. Known keys are parsed to their
    /// typed form; anything else is stored as the trimmed string.
    pub fn insert_parsed(&mut self, key: &str, raw: &str) -> Result<(), ManifestError> {
        let key = key.trim().to_ascii_lowercase();
        let value = match AttrKey::known(&key) {
            Some(known) => known.parse_value(raw)?,
            None => AttrValue::Text(raw.trim().to_string()),
        };
        self.0.insert(key, value);
        Ok(())
    }

    /// Build a validated map from `(key, value)` pairs
    pub fn try_from_pairs<K, V, I>(pairs: I) -> Result<Self, ManifestError>
    where
        K: AsRef<str>,
        V: Into<AttrValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut attrs = Attributes::new();
        for (k, v) in pairs {
            attrs.insert(k, v)?;
        }
        Ok(attrs)
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.0.get(key)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(AttrValue::as_u64)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Copy of this map restricted to the given keys
    pub fn filtered<S: AsRef<str>>(&self, keys: &[S]) -> Attributes {
        Attributes(
            self.0
                .iter()
                .filter(|(k, _)| keys.iter().any(|want| want.as_ref() == k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}
