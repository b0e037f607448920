//! Namespace Module
//!
//! The fixed cache buckets and the `<prefix>_<encoded-query>` key format.

use std::borrow::Cow;
use std::fmt;

use serde::Serialize;

/// Longest encoded query kept in a key before truncation kicks in.
pub const MAX_ENCODED_QUERY_LEN: usize = 200;

// == Namespace ==
/// Logical bucket a cache key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    /// Place lookups
    Place,
    /// Static map images
    StaticMap,
    /// Route and directions data
    Route,
    /// Autocomplete suggestions
    Autocomplete,
}

impl Namespace {
    /// Every recognized namespace.
    pub const ALL: [Namespace; 4] = [
        Namespace::Place,
        Namespace::StaticMap,
        Namespace::Route,
        Namespace::Autocomplete,
    ];

    /// Key prefix, without the `_` separator.
    pub fn prefix(self) -> &'static str {
        match self {
            Namespace::Place => "place",
            Namespace::StaticMap => "staticmap",
            Namespace::Route => "route",
            Namespace::Autocomplete => "autocomplete",
        }
    }

    /// Finds the namespace a key belongs to.
    pub fn of_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ns| ns.owns(key))
    }

    /// Returns true if `key` has this namespace's `<prefix>_` head.
    pub fn owns(self, key: &str) -> bool {
        key.strip_prefix(self.prefix())
            .is_some_and(|rest| rest.starts_with('_'))
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

// == Key Encoding ==
/// Builds a cache key for `query` in `namespace`.
///
/// The query is percent-encoded so keys stay URL-safe. Encodings longer than
/// [`MAX_ENCODED_QUERY_LEN`] are cut short without splitting a `%XX` escape;
/// such keys only decode to a prefix of the original query.
pub fn cache_key(namespace: Namespace, query: &str) -> String {
    let encoded = urlencoding::encode(query);
    format!("{}_{}", namespace.prefix(), truncate_encoded(&encoded))
}

/// Splits a cache key into its namespace and decoded query.
///
/// Returns `None` for keys outside the recognized namespaces.
pub fn decode_key(key: &str) -> Option<(Namespace, String)> {
    let namespace = Namespace::of_key(key)?;
    let encoded = &key[namespace.prefix().len() + 1..];
    let query = match urlencoding::decode(encoded) {
        Ok(query) => query.into_owned(),
        // Truncation can cut a multi-byte character in half
        Err(_) => String::from_utf8_lossy(&urlencoding::decode_binary(encoded.as_bytes()))
            .into_owned(),
    };
    Some((namespace, query))
}

fn truncate_encoded(encoded: &str) -> Cow<'_, str> {
    if encoded.len() <= MAX_ENCODED_QUERY_LEN {
        return Cow::Borrowed(encoded);
    }

    // Percent-encoded output is pure ASCII, so any byte index is a char boundary
    let mut cut = MAX_ENCODED_QUERY_LEN;
    let bytes = encoded.as_bytes();
    if bytes[cut - 1] == b'%' {
        cut -= 1;
    } else if cut >= 2 && bytes[cut - 2] == b'%' {
        cut -= 2;
    }
    Cow::Owned(encoded[..cut].to_string())
}
