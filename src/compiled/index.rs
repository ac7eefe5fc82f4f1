//! First-segment index over the compiled templates.
//!
//! Templates whose pattern opens with an ASCII static byte are bucketed by
//! that byte; templates opening with a parameter, a wildcard, or a
//! non-ASCII byte go to a shared fallback list scanned alongside every
//! bucket. A request only ever scans one bucket plus the fallback.
//!
//! Scanning the bucket before the fallback preserves global specificity
//! order: every bucketed template opens with a static token, which outranks
//! the param/wildcard openers that dominate the fallback, and non-ASCII
//! static openers in the fallback can only match paths whose bucket is
//! empty anyway.

use crate::compiled::template::{CompiledTemplate, compare_templates};
use ahash::AHashMap;

#[derive(Debug, Clone, Default)]
pub(crate) struct FirstSegmentIndex {
    buckets: AHashMap<u8, Vec<u32>>,
    fallback: Vec<u32>,
}

impl FirstSegmentIndex {
    /// Builds the index. `templates` must already be sorted by
    /// [`compare_templates`]; bucket and fallback lists inherit that order.
    pub(crate) fn build(templates: &[CompiledTemplate]) -> Self {
        debug_assert!(templates.is_sorted_by(|a, b| compare_templates(a, b).is_le()));
        let mut index = Self::default();
        for (i, template) in templates.iter().enumerate() {
            match template.first_static_byte() {
                Some(byte) => index.buckets.entry(byte).or_default().push(i as u32),
                None => index.fallback.push(i as u32),
            }
        }
        index
    }

    /// Template indices to scan for a path opening with `first_byte`, in
    /// specificity order: the byte's bucket, then the shared fallback.
    pub(crate) fn candidates(&self, first_byte: Option<u8>) -> impl Iterator<Item = u32> + '_ {
        let bucket = first_byte
            .and_then(|b| self.buckets.get(&b))
            .map_or(&[][..], Vec::as_slice);
        bucket.iter().chain(self.fallback.iter()).copied()
    }
}

/// First byte of the first non-empty path segment.
pub(crate) fn first_segment_byte(path: &str) -> Option<u8> {
    path.trim_start_matches('/').as_bytes().first().copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::RoutePattern;
    use std::sync::Arc;

    fn template(pattern: &str, id: usize) -> CompiledTemplate {
        let parsed = RoutePattern::parse(pattern).unwrap();
        CompiledTemplate {
            route: id,
            tokens: parsed.tokens().to_vec(),
            constraints: Default::default(),
            specificity: parsed.specificity(),
            template: Arc::from(pattern),
        }
    }

    #[test]
    fn test_bucketing() {
        let mut templates = vec![
            template("/users/:id", 0),
            template("/uploads/:name", 1),
            template("/:resource/all", 2),
            template("/files/*rest", 3),
        ];
        templates.sort_by(compare_templates);
        let index = FirstSegmentIndex::build(&templates);

        let scan = |byte: Option<u8>| -> Vec<usize> {
            index
                .candidates(byte)
                .map(|i| templates[i as usize].route)
                .collect()
        };

        // 'u' bucket holds both /u… templates plus the fallback.
        let u = scan(Some(b'u'));
        assert!(u.contains(&0) && u.contains(&1) && u.contains(&2));
        assert!(!u.contains(&3));

        // 'f' bucket holds the files template plus the fallback.
        assert_eq!(scan(Some(b'f')), vec![3, 2]);

        // Unknown byte scans only the fallback.
        assert_eq!(scan(Some(b'z')), vec![2]);
        assert_eq!(scan(None), vec![2]);
    }

    #[test]
    fn test_first_segment_byte() {
        assert_eq!(first_segment_byte("/users/1"), Some(b'u'));
        assert_eq!(first_segment_byte("//x"), Some(b'x'));
        assert_eq!(first_segment_byte("/"), None);
        assert_eq!(first_segment_byte(""), None);
    }
}
