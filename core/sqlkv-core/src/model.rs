//! Key/value records moved through the write path.

use serde::{Deserialize, Serialize};

/// One key/value entry.
///
/// The type puts no constraint on the key; backends reject keys they cannot
/// store (the bundled SQLite schema refuses empty keys, for instance).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pair {
    pub key: Vec<u8>,
    pub val: Vec<u8>,
}

impl Pair {
    pub fn new(key: impl Into<Vec<u8>>, val: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            val: val.into(),
        }
    }
}

impl<K, V> From<(K, V)> for Pair
where
    K: Into<Vec<u8>>,
    V: Into<Vec<u8>>,
{
    fn from((key, val): (K, V)) -> Self {
        Self::new(key, val)
    }
}

/// A pair addressed to a specific bucket, so one call can write to many
/// buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    bucket: String,
    pair: Pair,
}

impl Batch {
    pub fn new(bucket: impl Into<String>, key: impl Into<Vec<u8>>, val: impl Into<Vec<u8>>) -> Self {
        Self {
            bucket: bucket.into(),
            pair: Pair::new(key, val),
        }
    }

    pub fn from_pair(bucket: impl Into<String>, pair: Pair) -> Self {
        Self {
            bucket: bucket.into(),
            pair,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn pair(&self) -> &Pair {
        &self.pair
    }

    pub fn into_parts(self) -> (String, Pair) {
        (self.bucket, self.pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_from_tuple() {
        let p: Pair = ("k", "v").into();
        assert_eq!(p, Pair::new(b"k".to_vec(), b"v".to_vec()));
    }

    #[test]
    fn batch_accessors() {
        let b = Batch::new("users", "k", "v");
        assert_eq!(b.bucket(), "users");
        assert_eq!(b.pair().key, b"k");

        let (bucket, pair) = b.into_parts();
        assert_eq!(bucket, "users");
        assert_eq!(pair.val, b"v");
    }

    #[test]
    fn empty_key_is_representable() {
        let b = Batch::from_pair("t", Pair::new(Vec::new(), "v"));
        assert!(b.pair().key.is_empty());
    }

    #[test]
    fn pair_json_round_trip() {
        let p = Pair::new("k", "v");
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(serde_json::from_str::<Pair>(&json).unwrap(), p);
    }
}
