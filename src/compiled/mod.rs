//! Freeze-time compiled lookup structures.
//!
//! One [`CompiledSet`] is built per `(version, method)` tree when the router
//! freezes: a bloom-gated fingerprint table for the fully static terminals,
//! and a first-segment-indexed, specificity-sorted template list for the
//! dynamic ones. The tree itself stays available as the safety-net path, and
//! both paths return identical results by construction.

pub(crate) mod bloom;
pub(crate) mod fingerprint;
pub(crate) mod index;
pub(crate) mod static_table;
pub(crate) mod template;

use crate::config::RouterConfig;
use crate::diagnostics::MatchSource;
use crate::operations::Captures;
use crate::tree::Tree;
use crate::types::{RouteEntry, RouteId};
use index::{FirstSegmentIndex, first_segment_byte};
use static_table::StaticTable;
use template::{CompiledTemplate, compare_templates};

#[derive(Debug, Clone)]
pub(crate) struct CompiledSet {
    static_table: StaticTable,
    templates: Vec<CompiledTemplate>,
    index: FirstSegmentIndex,
}

impl CompiledSet {
    /// Compiles one tree. The terminal count is returned so the caller can
    /// cross-check it against the registry.
    pub(crate) fn build(tree: &Tree, registry: &[RouteEntry], config: &RouterConfig) -> Self {
        let terminals = tree.collect_terminals();

        let mut static_routes: Vec<(&str, RouteId)> = Vec::new();
        let mut templates: Vec<CompiledTemplate> = Vec::new();
        for id in terminals {
            let entry = &registry[id];
            if entry.pattern.is_static() {
                static_routes.push((entry.template.as_ref(), id));
            } else {
                templates.push(CompiledTemplate::from_entry(id, entry));
            }
        }

        let static_table = StaticTable::build(
            &static_routes,
            config.bloom_size,
            config.clamped_bloom_hashes(),
        );
        templates.sort_by(compare_templates);
        let index = FirstSegmentIndex::build(&templates);

        if let Some(top) = templates.first() {
            tracing::trace!(
                template = %top.template,
                specificity = top.specificity,
                "most specific dynamic template"
            );
        }
        tracing::debug!(
            static_routes = static_table.len(),
            dynamic_templates = templates.len(),
            bloom_bits = static_table.bloom().bit_count(),
            bloom_hashes = static_table.bloom().hash_count(),
            "compiled route tables built"
        );

        Self {
            static_table,
            templates,
            index,
        }
    }

    pub(crate) fn route_count(&self) -> usize {
        self.static_table.len() + self.templates.len()
    }

    /// The fast-path lookup: static table first, then the indexed template
    /// scan. `None` sends the caller to the tree walk.
    pub(crate) fn find<'t, 'p>(
        &'t self,
        path: &'p str,
        registry: &'t [RouteEntry],
        template_routing: bool,
    ) -> Option<(RouteId, Captures<'t, 'p>, MatchSource)> {
        if let Some(id) = self.static_table.lookup(path, registry) {
            return Some((id, Captures::new(), MatchSource::StaticTable));
        }

        if template_routing {
            let mut captures = Captures::new();
            for i in self.index.candidates(first_segment_byte(path)) {
                let candidate = &self.templates[i as usize];
                if candidate.match_and_bind(path, &mut captures) {
                    return Some((candidate.route, captures, MatchSource::CompiledTemplate));
                }
            }
        }

        None
    }
}
