//! Compiled dynamic templates.
//!
//! A template is one dynamic pattern flattened for a linear scan: the token
//! list, the route's constraints, and a specificity score. Scanning the
//! sorted template list must agree with the tree walk on every input, so the
//! sort order is the tree's precedence spelled out: token weights compared
//! left to right (static 3, param 2, wildcard 1), heavier first, longer
//! pattern first on a shared prefix.

use crate::constraint::ConstraintSet;
use crate::operations::Captures;
use crate::pattern::Token;
use crate::types::{RouteEntry, RouteId};
use std::cmp::Ordering;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub(crate) struct CompiledTemplate {
    pub route: RouteId,
    pub tokens: Vec<Token>,
    pub constraints: ConstraintSet,
    /// Summed token weights, retained for observability and tie context.
    pub specificity: u32,
    pub template: Arc<str>,
}

impl CompiledTemplate {
    pub(crate) fn from_entry(id: RouteId, entry: &RouteEntry) -> Self {
        Self {
            route: id,
            tokens: entry.pattern.tokens().to_vec(),
            constraints: entry.constraints.clone(),
            specificity: entry.pattern.specificity(),
            template: entry.template.clone(),
        }
    }

    /// First byte of the leading static token, when it is ASCII. Anything
    /// else scans from the shared fallback list.
    pub(crate) fn first_static_byte(&self) -> Option<u8> {
        match self.tokens.first() {
            Some(Token::Static(s)) => s.as_bytes().first().copied().filter(u8::is_ascii),
            _ => None,
        }
    }

    /// Walks the token list against `path`, capturing parameters and
    /// enforcing constraints inline. On failure the captures vector is
    /// rolled back to its entry state.
    pub(crate) fn match_and_bind<'t, 'p>(
        &'t self,
        path: &'p str,
        captures: &mut Captures<'t, 'p>,
    ) -> bool {
        let rollback = captures.len();
        if self.walk_tokens(path, captures) {
            true
        } else {
            captures.truncate(rollback);
            false
        }
    }

    fn walk_tokens<'t, 'p>(&'t self, path: &'p str, captures: &mut Captures<'t, 'p>) -> bool {
        let bytes = path.as_bytes();
        let len = path.len();
        let mut pos = 0usize;

        for token in &self.tokens {
            // Every token is preceded by exactly one separator.
            if pos >= len || bytes[pos] != b'/' {
                return false;
            }
            pos += 1;

            match token {
                Token::Static(s) => {
                    if !path[pos..].starts_with(s.as_str()) {
                        return false;
                    }
                    pos += s.len();
                    if pos < len && bytes[pos] != b'/' {
                        return false;
                    }
                }
                Token::Param(name) => {
                    let seg_end = path[pos..]
                        .find('/')
                        .map_or(len, |offset| pos + offset);
                    if seg_end == pos {
                        return false;
                    }
                    let value = &path[pos..seg_end];
                    if let Some(validator) = self.constraints.get(name) {
                        if !validator.accepts(value) {
                            return false;
                        }
                    }
                    captures.push((name.as_str(), value));
                    pos = seg_end;
                }
                Token::Wildcard(name) => {
                    captures.push((name.as_str(), &path[pos..]));
                    pos = len;
                }
            }
        }

        pos == len
    }
}

/// Template order for bucket scans: more specific first, where "specific"
/// means exactly what the tree walk prefers.
pub(crate) fn compare_templates(a: &CompiledTemplate, b: &CompiledTemplate) -> Ordering {
    let mut left = a.tokens.iter();
    let mut right = b.tokens.iter();
    loop {
        match (left.next(), right.next()) {
            (Some(x), Some(y)) => match y.weight().cmp(&x.weight()) {
                Ordering::Equal => continue,
                unequal => return unequal,
            },
            // Longer pattern first when one is a prefix of the other.
            (Some(_), None) => return Ordering::Less,
            (None, Some(_)) => return Ordering::Greater,
            (None, None) => {
                return b.template.len().cmp(&a.template.len());
            }
        }
    }
}
