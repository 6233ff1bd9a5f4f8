//! Bucket (table) name validation

use crate::error::{KvError, KvResult, bool_to_error};

/// Checks bucket names against an SQL identifier grammar:
/// a lowercase ASCII letter followed by lowercase letters, digits or `_`,
/// at most `max_len` bytes in total.
///
/// Names that pass need no quoting, so they can be pasted into templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableNameValidator {
    max_len: usize,
}

impl TableNameValidator {
    /// Postgres identifiers are capped at 63 bytes. 59 leaves room for the
    /// `_pkc` constraint suffix the templates append.
    pub const POSTGRES: TableNameValidator = TableNameValidator::new(59);

    /// SQLite has no practical identifier limit; keep names portable.
    pub const SQLITE: TableNameValidator = TableNameValidator::new(59);

    pub const fn new(max_len: usize) -> Self {
        Self { max_len }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn is_valid(&self, name: &str) -> bool {
        let bytes = name.as_bytes();
        match bytes.split_first() {
            Some((first, rest)) => {
                bytes.len() <= self.max_len
                    && first.is_ascii_lowercase()
                    && rest
                        .iter()
                        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'_')
            }
            None => false,
        }
    }

    pub fn validate(&self, name: &str) -> KvResult<()> {
        bool_to_error(self.is_valid(name), || {
            KvError::InvalidBucketName(name.to_string())
        })
    }
}
