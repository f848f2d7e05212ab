//! Search keys and index entries

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::types::{RowId, Value};

/// A borrowed, immutable search key.
///
/// May be shorter than the index key (a prefix); comparisons against index
/// entries only look at the leading `len()` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchKey<'a> {
    values: &'a [Value],
}

impl<'a> SearchKey<'a> {
    pub fn new(values: &'a [Value]) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &'a [Value] {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Deterministic binary encoding of the key.
    ///
    /// Layout per value: one tag byte, then a big-endian payload
    /// (strings are length-prefixed with a u32).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.values.len() * 9);
        for value in self.values {
            match value {
                Value::Null => out.push(0),
                Value::Boolean(b) => {
                    out.push(1);
                    out.push(*b as u8);
                }
                Value::Integer(i) => {
                    out.push(2);
                    out.extend_from_slice(&i.to_be_bytes());
                }
                Value::Double(d) => {
                    out.push(3);
                    out.extend_from_slice(&d.to_bits().to_be_bytes());
                }
                Value::Varchar(s) => {
                    out.push(4);
                    out.extend_from_slice(&(s.len() as u32).to_be_bytes());
                    out.extend_from_slice(s.as_bytes());
                }
            }
        }
        out
    }
}

/// One index entry: the full key plus the row it points at.
///
/// Entries order by key, then by row id; rows sharing a key form the
/// duplicate chain in row-id order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndexEntry {
    pub key: Vec<Value>,
    pub row: RowId,
}

impl IndexEntry {
    pub fn new(key: Vec<Value>, row: RowId) -> Self {
        Self { key, row }
    }

    /// Smallest possible entry whose key starts with `prefix`
    pub(crate) fn floor(prefix: &[Value]) -> Self {
        Self {
            key: prefix.to_vec(),
            row: RowId(0),
        }
    }

    /// Compare the entry's leading columns against a prefix
    pub fn prefix_cmp(&self, prefix: &[Value]) -> Ordering {
        let n = prefix.len().min(self.key.len());
        self.key[..n].cmp(&prefix[..n])
    }
}
