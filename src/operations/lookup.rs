//! Tree walk.
//!
//! The walk is recursive with the precedence static > param > wildcard at
//! every node. Captures are pushed on descent and popped on backtrack, so a
//! constrained parameter that rejects its segment falls through to the
//! wildcard edge of the nearest ancestor that has one.
//!
//! Request paths with empty segments (`//`) never match a parameter edge
//! (parameters consume exactly one non-empty segment); only a wildcard can
//! absorb them, and the capture then preserves the raw remainder.

use crate::tree::{Node, Tree};
use crate::types::{RouteEntry, RouteId};
use smallvec::SmallVec;

/// Parameter captures: edge-name and path-slice pairs, inline up to the same
/// eight entries the context's parameter store holds before spilling.
pub(crate) type Captures<'t, 'p> = SmallVec<[(&'t str, &'p str); 8]>;

/// Walks the tree for `path`, returning the matched route and its captures.
pub(crate) fn lookup_route<'t, 'p>(
    tree: &'t Tree,
    registry: &'t [RouteEntry],
    path: &'p str,
) -> Option<(RouteId, Captures<'t, 'p>)> {
    let mut captures = Captures::new();
    let id = walk(&tree.root, path, registry, &mut captures)?;
    Some((id, captures))
}

fn constraints_ok(registry: &[RouteEntry], id: RouteId, captures: &Captures<'_, '_>) -> bool {
    let constraints = &registry[id].constraints;
    constraints.is_empty() || constraints.accepts_all(captures.iter().copied())
}

fn walk<'t, 'p>(
    node: &'t Node,
    remaining: &'p str,
    registry: &'t [RouteEntry],
    captures: &mut Captures<'t, 'p>,
) -> Option<RouteId> {
    if remaining.is_empty() {
        if let Some(id) = node.route {
            if constraints_ok(registry, id, captures) {
                return Some(id);
            }
        }
        // A wildcard hangs off a node whose text ends with '/', so an empty
        // remainder here is the "/files/" shape: the capture is empty.
        if let Some(edge) = &node.wildcard_child {
            captures.push((edge.name.as_str(), ""));
            if constraints_ok(registry, edge.route, captures) {
                return Some(edge.route);
            }
            captures.pop();
        }
        return None;
    }

    // 1. Static child, matched by fragment prefix.
    if let Some(child) = node.children.get(&remaining.as_bytes()[0]) {
        if let Some(rest) = remaining.strip_prefix(child.fragment.as_str()) {
            if let Some(id) = walk(child, rest, registry, captures) {
                return Some(id);
            }
        }
    }

    // 2. Parameter edge: one non-empty segment.
    if let Some(edge) = &node.param_child {
        let seg_end = remaining.find('/').unwrap_or(remaining.len());
        if seg_end > 0 {
            captures.push((edge.name.as_str(), &remaining[..seg_end]));
            if let Some(id) = walk(&edge.node, &remaining[seg_end..], registry, captures) {
                return Some(id);
            }
            captures.pop();
        }
    }

    // 3. Wildcard: the rest of the path, as is.
    if let Some(edge) = &node.wildcard_child {
        captures.push((edge.name.as_str(), remaining));
        if constraints_ok(registry, edge.route, captures) {
            return Some(edge.route);
        }
        captures.pop();
    }

    None
}
