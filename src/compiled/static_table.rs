//! Frozen lookup table for fully static paths.
//!
//! A hit costs one fingerprint, up to `k` bloom probes, and one map probe.
//! A miss is usually confirmed by the bloom filter alone. The map stores
//! route ids; the raw template is compared on a hit so a fingerprint
//! collision degrades to a miss instead of dispatching the wrong route.

use crate::compiled::bloom::BloomFilter;
use crate::compiled::fingerprint::fingerprint;
use crate::types::{RouteEntry, RouteId};
use ahash::AHashMap;

#[derive(Debug, Clone)]
pub(crate) struct StaticTable {
    map: AHashMap<u64, RouteId>,
    bloom: BloomFilter,
}

impl StaticTable {
    /// Builds the table from `(path, id)` pairs of every static terminal.
    pub(crate) fn build(
        routes: &[(&str, RouteId)],
        configured_bits: Option<usize>,
        hashes: usize,
    ) -> Self {
        let mut map = AHashMap::with_capacity(routes.len());
        let mut bloom = BloomFilter::new(routes.len(), configured_bits, hashes);
        for (path, id) in routes {
            let fp = fingerprint(path);
            map.insert(fp, *id);
            bloom.insert(fp);
        }
        Self { map, bloom }
    }

    pub(crate) fn lookup(&self, path: &str, registry: &[RouteEntry]) -> Option<RouteId> {
        let fp = fingerprint(path);
        if !self.bloom.contains(fp) {
            return None;
        }
        let id = *self.map.get(&fp)?;
        (registry[id].template.as_ref() == path).then_some(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }

    pub(crate) fn bloom(&self) -> &BloomFilter {
        &self.bloom
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::RoutePattern;
    use std::sync::Arc;

    fn registry(paths: &[&str]) -> Vec<RouteEntry> {
        paths
            .iter()
            .map(|p| RouteEntry {
                pattern: RoutePattern::parse(p).unwrap(),
                template: Arc::from(*p),
                method: "GET".to_string(),
                version: None,
                chain: Arc::from(Vec::new().into_boxed_slice()),
                constraints: Default::default(),
                name: None,
                description: None,
                tags: Vec::new(),
            })
            .collect()
    }

    #[test]
    fn test_hit_and_miss() {
        let reg = registry(&["/users", "/users/all", "/health"]);
        let pairs: Vec<(&str, RouteId)> = reg
            .iter()
            .enumerate()
            .map(|(i, e)| (e.template.as_ref(), i))
            .collect();
        let table = StaticTable::build(&pairs, None, 3);

        assert_eq!(table.lookup("/users", &reg), Some(0));
        assert_eq!(table.lookup("/users/all", &reg), Some(1));
        assert_eq!(table.lookup("/health", &reg), Some(2));
        assert_eq!(table.lookup("/missing", &reg), None);
        assert_eq!(table.lookup("/users/", &reg), None);
        assert_eq!(table.len(), 3);
    }
}
