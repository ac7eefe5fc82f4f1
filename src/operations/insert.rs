//! Tree insertion.
//!
//! Insertion is two-pass: a read-only conflict check over the existing
//! structure, then the actual descent. A rejected registration therefore
//! leaves the tree exactly as it was, which is what lets registration
//! failures surface to the caller without poisoning the router.

use crate::error::RouterError;
use crate::pattern::RoutePattern;
use crate::tree::{Node, ParamEdge, Piece, Tree, WildcardEdge, common_prefix_len, flatten};
use crate::types::RouteId;

/// Inserts a parsed pattern into the tree, terminating at `route`.
pub(crate) fn insert_route(
    tree: &mut Tree,
    pattern: &RoutePattern,
    method: &str,
    route: RouteId,
) -> Result<(), RouterError> {
    let pieces = flatten(pattern);
    check_conflicts(&tree.root, &pieces, pattern, method)?;

    let mut node = &mut tree.root;
    for piece in &pieces {
        match piece {
            Piece::Text(text) => node = descend_static(node, text),
            Piece::Param(name) => {
                let edge = node.param_child.get_or_insert_with(|| {
                    Box::new(ParamEdge {
                        name: name.clone(),
                        node: Node::default(),
                    })
                });
                node = &mut edge.node;
            }
            Piece::Wild(name) => {
                node.wildcard_child = Some(WildcardEdge {
                    name: name.clone(),
                    route,
                });
                return Ok(());
            }
        }
    }
    node.route = Some(route);
    Ok(())
}

/// Where a read-only descent ended up.
enum CheckPos<'t> {
    /// Exactly at an existing node boundary.
    At(&'t Node),
    /// The pattern leaves the existing structure here; everything below is
    /// new, so no conflict is possible.
    Fresh,
}

fn check_conflicts(
    root: &Node,
    pieces: &[Piece],
    pattern: &RoutePattern,
    method: &str,
) -> Result<(), RouterError> {
    let mut pos = CheckPos::At(root);
    for piece in pieces {
        let node = match pos {
            CheckPos::At(node) => node,
            CheckPos::Fresh => return Ok(()),
        };
        match piece {
            Piece::Text(text) => pos = check_descend_text(node, text),
            Piece::Param(name) => match &node.param_child {
                Some(edge) if edge.name != *name => {
                    return Err(RouterError::ConflictingParamName {
                        existing: edge.name.clone(),
                        new: name.clone(),
                        pattern: pattern.raw().to_string(),
                    });
                }
                Some(edge) => pos = CheckPos::At(&edge.node),
                None => return Ok(()),
            },
            Piece::Wild(name) => match &node.wildcard_child {
                Some(edge) if edge.name != *name => {
                    return Err(RouterError::ConflictingParamName {
                        existing: edge.name.clone(),
                        new: name.clone(),
                        pattern: pattern.raw().to_string(),
                    });
                }
                Some(_) => {
                    return Err(RouterError::DuplicateRoute {
                        method: method.to_string(),
                        pattern: pattern.raw().to_string(),
                    });
                }
                None => return Ok(()),
            },
        }
    }

    if let CheckPos::At(node) = pos {
        if node.route.is_some() {
            return Err(RouterError::DuplicateRoute {
                method: method.to_string(),
                pattern: pattern.raw().to_string(),
            });
        }
    }
    Ok(())
}

fn check_descend_text<'t>(node: &'t Node, text: &str) -> CheckPos<'t> {
    if text.is_empty() {
        return CheckPos::At(node);
    }
    match node.children.get(&text.as_bytes()[0]) {
        None => CheckPos::Fresh,
        Some(child) => {
            let common = common_prefix_len(&child.fragment, text);
            if common == child.fragment.len() {
                check_descend_text(child, &text[common..])
            } else {
                // Ends or diverges mid-fragment: insertion will split the
                // child and the new boundary node carries no edges yet.
                CheckPos::Fresh
            }
        }
    }
}

/// Descends (and extends) the static structure for one text piece, merging
/// by longest common prefix and splitting existing children as needed.
fn descend_static<'t>(node: &'t mut Node, text: &str) -> &'t mut Node {
    if text.is_empty() {
        return node;
    }
    let first = text.as_bytes()[0];
    let child = node
        .children
        .entry(first)
        .or_insert_with(|| Box::new(Node::new(text)));
    let common = common_prefix_len(&child.fragment, text);
    if common < child.fragment.len() {
        split_node(child, common);
    }
    if common == text.len() {
        child
    } else {
        descend_static(child, &text[common..])
    }
}

/// Splits a node's fragment at `common`, pushing everything the node owned
/// down into a new child that keeps the suffix.
fn split_node(child: &mut Node, common: usize) {
    let suffix = child.fragment.split_off(common);
    let lower = Node {
        fragment: suffix,
        children: std::mem::take(&mut child.children),
        param_child: child.param_child.take(),
        wildcard_child: child.wildcard_child.take(),
        route: child.route.take(),
    };
    let first = lower.fragment.as_bytes()[0];
    child.children.insert(first, Box::new(lower));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert(tree: &mut Tree, pattern: &str, id: RouteId) -> Result<(), RouterError> {
        let parsed = RoutePattern::parse(pattern).unwrap();
        insert_route(tree, &parsed, "GET", id)
    }

    #[test]
    fn test_prefix_split() {
        let mut tree = Tree::default();
        insert(&mut tree, "/users", 0).unwrap();
        insert(&mut tree, "/user", 1).unwrap();

        // "/user" is now an intermediate node with an "s" child.
        let top = tree.root.children.get(&b'/').unwrap();
        assert_eq!(top.fragment, "/user");
        assert_eq!(top.route, Some(1));
        let s = top.children.get(&b's').unwrap();
        assert_eq!(s.fragment, "s");
        assert_eq!(s.route, Some(0));
    }

    #[test]
    fn test_duplicate_route_rejected_without_mutation() {
        let mut tree = Tree::default();
        insert(&mut tree, "/a/b", 0).unwrap();
        let err = insert(&mut tree, "/a/b", 1).unwrap_err();
        assert!(matches!(err, RouterError::DuplicateRoute { .. }));
        assert_eq!(tree.collect_terminals(), vec![0]);
    }

    #[test]
    fn test_conflicting_param_name() {
        let mut tree = Tree::default();
        insert(&mut tree, "/users/:id", 0).unwrap();
        let err = insert(&mut tree, "/users/:userId/posts", 1).unwrap_err();
        assert!(matches!(
            err,
            RouterError::ConflictingParamName { existing, new, .. }
                if existing == "id" && new == "userId"
        ));
        // Same name is fine.
        insert(&mut tree, "/users/:id/posts", 2).unwrap();
        assert_eq!(tree.collect_terminals(), vec![0, 2]);
    }

    #[test]
    fn test_duplicate_wildcard_rejected() {
        let mut tree = Tree::default();
        insert(&mut tree, "/files/*path", 0).unwrap();
        let err = insert(&mut tree, "/files/*path", 1).unwrap_err();
        assert!(matches!(err, RouterError::DuplicateRoute { .. }));
        let err = insert(&mut tree, "/files/*other", 2).unwrap_err();
        assert!(matches!(err, RouterError::ConflictingParamName { .. }));
    }

    #[test]
    fn test_wildcard_next_to_static_children() {
        // The parent of a wildcard edge may still grow static branches;
        // only the wildcard node itself is terminal.
        let mut tree = Tree::default();
        insert(&mut tree, "/a/*", 0).unwrap();
        insert(&mut tree, "/a/users/:id", 1).unwrap();
        insert(&mut tree, "/a/users/:id/posts", 2).unwrap();
        assert_eq!(tree.collect_terminals(), vec![0, 1, 2]);
    }
}
