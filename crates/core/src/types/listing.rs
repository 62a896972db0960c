//! Union over the backend's collection response shapes.
//!
//! The REST backend is not consistent about how it returns collections:
//! list endpoints may respond with a paginated envelope, a bare array, a
//! `{"items": [...]}` wrapper, or (for single-record endpoints queried
//! without an id) a lone object. Rather than shape-sniffing at every call
//! site, decode into this union once and normalize with
//! [`Listing::into_vec`].

use serde::Deserialize;

/// A collection response in any of the shapes the backend produces.
///
/// Variant order matters: `serde(untagged)` tries variants top to bottom,
/// so the envelope shapes (which require their marker key) are attempted
/// before the catch-all single object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    /// Paginated envelope: `{"count": n, "next": ..., "results": [...]}`.
    Paginated {
        #[serde(default)]
        count: Option<u64>,
        #[serde(default)]
        next: Option<String>,
        #[serde(default)]
        previous: Option<String>,
        results: Vec<T>,
    },
    /// Wrapped list: `{"items": [...]}`.
    Wrapped { items: Vec<T> },
    /// Bare array: `[...]`.
    Many(Vec<T>),
    /// A single record returned without any envelope.
    One(T),
}

impl<T> Listing<T> {
    /// Flatten whichever shape was received into a plain vector.
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Paginated { results, .. } => results,
            Self::Wrapped { items } => items,
            Self::Many(items) => items,
            Self::One(item) => vec![item],
        }
    }

    /// Number of records in the response body (not the paginated total).
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Paginated { results, .. } => results.len(),
            Self::Wrapped { items } | Self::Many(items) => items.len(),
            Self::One(_) => 1,
        }
    }

    /// True when the response carried no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Rec {
        id: i64,
    }

    #[test]
    fn decodes_paginated_envelope() {
        let body = r#"{"count": 2, "next": null, "previous": null, "results": [{"id": 1}, {"id": 2}]}"#;
        let listing: Listing<Rec> = serde_json::from_str(body).expect("decode");
        assert_eq!(listing.into_vec(), vec![Rec { id: 1 }, Rec { id: 2 }]);
    }

    #[test]
    fn decodes_bare_array() {
        let body = r#"[{"id": 3}]"#;
        let listing: Listing<Rec> = serde_json::from_str(body).expect("decode");
        assert_eq!(listing.into_vec(), vec![Rec { id: 3 }]);
    }

    #[test]
    fn decodes_items_wrapper() {
        let body = r#"{"items": [{"id": 4}, {"id": 5}]}"#;
        let listing: Listing<Rec> = serde_json::from_str(body).expect("decode");
        assert_eq!(listing.len(), 2);
    }

    #[test]
    fn decodes_single_object_as_one_record() {
        let body = r#"{"id": 9}"#;
        let listing: Listing<Rec> = serde_json::from_str(body).expect("decode");
        assert_eq!(listing.into_vec(), vec![Rec { id: 9 }]);
    }

    #[test]
    fn empty_paginated_envelope_is_empty() {
        let body = r#"{"count": 0, "results": []}"#;
        let listing: Listing<Rec> = serde_json::from_str(body).expect("decode");
        assert!(listing.is_empty());
    }
}
