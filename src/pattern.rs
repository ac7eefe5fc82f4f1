//! Route pattern parsing.
//!
//! A pattern is an ordered list of segment tokens: literal text, `:name`
//! parameters matching exactly one segment, and a trailing `*` / `*name`
//! wildcard matching zero or more segments. Parsing happens once at
//! registration; everything downstream (tree insertion, template
//! compilation) works on the token list.

use crate::error::RouterError;

/// Name bound to a bare `*` wildcard. Parameter names cannot contain `*`,
/// so the sentinel never collides with a user-chosen name.
pub const WILDCARD_SENTINEL: &str = "*";

/// Token weights used for template specificity scoring.
const WEIGHT_STATIC: u32 = 3;
const WEIGHT_PARAM: u32 = 2;
const WEIGHT_WILDCARD: u32 = 1;

/// One segment of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Literal text, matched byte for byte (case-sensitive).
    Static(String),
    /// `:name`, matches exactly one non-empty segment and captures it.
    Param(String),
    /// `*` or `*name`, matches the zero-or-more remaining segments.
    Wildcard(String),
}

impl Token {
    pub(crate) fn weight(&self) -> u32 {
        match self {
            Token::Static(_) => WEIGHT_STATIC,
            Token::Param(_) => WEIGHT_PARAM,
            Token::Wildcard(_) => WEIGHT_WILDCARD,
        }
    }
}

/// A parsed route pattern: the original string plus its token list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    raw: String,
    tokens: Vec<Token>,
}

impl RoutePattern {
    /// Parses a pattern string.
    ///
    /// Patterns must begin with `/`. `/` alone is the root pattern with an
    /// empty token list. Static segments match case-sensitively. Empty
    /// segments (`//`, trailing `/`) are rejected rather than normalized, so
    /// a registered pattern always means exactly one path shape.
    pub fn parse(pattern: &str) -> Result<Self, RouterError> {
        let invalid = |reason: &str| RouterError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        if pattern.is_empty() {
            return Err(invalid("pattern is empty"));
        }
        if !pattern.starts_with('/') {
            return Err(invalid("pattern must begin with '/'"));
        }
        if pattern == "/" {
            return Ok(Self {
                raw: pattern.to_string(),
                tokens: Vec::new(),
            });
        }

        let segments: Vec<&str> = pattern[1..].split('/').collect();
        let mut tokens = Vec::with_capacity(segments.len());
        let mut seen_names: Vec<&str> = Vec::new();

        for (i, segment) in segments.iter().enumerate() {
            let is_last = i == segments.len() - 1;

            if segment.is_empty() {
                return Err(invalid("empty segments are not allowed"));
            }

            if let Some(name) = segment.strip_prefix(':') {
                if name.is_empty() {
                    return Err(invalid("parameter must have a name"));
                }
                if name.contains([':', '*']) {
                    return Err(invalid("parameter name contains reserved characters"));
                }
                if seen_names.contains(&name) {
                    return Err(invalid("duplicate parameter name"));
                }
                seen_names.push(name);
                tokens.push(Token::Param(name.to_string()));
            } else if let Some(name) = segment.strip_prefix('*') {
                if !is_last {
                    return Err(invalid("wildcard must be the final segment"));
                }
                if name.contains([':', '*']) {
                    return Err(invalid("wildcard name contains reserved characters"));
                }
                let name = if name.is_empty() {
                    WILDCARD_SENTINEL
                } else {
                    name
                };
                if seen_names.contains(&name) {
                    return Err(invalid("duplicate parameter name"));
                }
                tokens.push(Token::Wildcard(name.to_string()));
            } else if segment.contains([':', '*']) {
                return Err(invalid(
                    "':' and '*' may only introduce a segment, not appear inside one",
                ));
            } else {
                tokens.push(Token::Static((*segment).to_string()));
            }
        }

        Ok(Self {
            raw: pattern.to_string(),
            tokens,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// True when the pattern has no parameters or wildcard.
    pub fn is_static(&self) -> bool {
        self.tokens
            .iter()
            .all(|t| matches!(t, Token::Static(_)))
    }

    /// Number of values this pattern binds (parameters plus wildcard).
    pub fn param_count(&self) -> usize {
        self.tokens
            .iter()
            .filter(|t| !matches!(t, Token::Static(_)))
            .count()
    }

    /// True when the pattern binds a parameter or wildcard of this name.
    pub fn binds(&self, name: &str) -> bool {
        self.tokens.iter().any(|t| match t {
            Token::Param(n) | Token::Wildcard(n) => n == name,
            Token::Static(_) => false,
        })
    }

    /// Summed token weights. Static segments rank highest, wildcards lowest.
    pub fn specificity(&self) -> u32 {
        self.tokens.iter().map(Token::weight).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(p: &str) -> RoutePattern {
        RoutePattern::parse(p).unwrap()
    }

    fn parse_err(p: &str) -> RouterError {
        RoutePattern::parse(p).unwrap_err()
    }

    #[test]
    fn test_parse_static() {
        let pattern = parse("/users/all");
        assert_eq!(
            pattern.tokens(),
            &[
                Token::Static("users".to_string()),
                Token::Static("all".to_string())
            ]
        );
        assert!(pattern.is_static());
        assert_eq!(pattern.param_count(), 0);
    }

    #[test]
    fn test_parse_root() {
        let pattern = parse("/");
        assert!(pattern.tokens().is_empty());
        assert!(pattern.is_static());
    }

    #[test]
    fn test_parse_params_and_wildcard() {
        let pattern = parse("/users/:id/files/*path");
        assert_eq!(
            pattern.tokens(),
            &[
                Token::Static("users".to_string()),
                Token::Param("id".to_string()),
                Token::Static("files".to_string()),
                Token::Wildcard("path".to_string()),
            ]
        );
        assert!(!pattern.is_static());
        assert_eq!(pattern.param_count(), 2);
        assert!(pattern.binds("id"));
        assert!(pattern.binds("path"));
        assert!(!pattern.binds("files"));
    }

    #[test]
    fn test_parse_bare_wildcard_gets_sentinel() {
        let pattern = parse("/files/*");
        assert_eq!(
            pattern.tokens().last(),
            Some(&Token::Wildcard(WILDCARD_SENTINEL.to_string()))
        );
    }

    #[test]
    fn test_parse_rejections() {
        assert!(matches!(parse_err(""), RouterError::InvalidPattern { .. }));
        assert!(matches!(
            parse_err("users"),
            RouterError::InvalidPattern { reason, .. } if reason.contains("begin with '/'")
        ));
        assert!(matches!(
            parse_err("/a//b"),
            RouterError::InvalidPattern { reason, .. } if reason.contains("empty segments")
        ));
        assert!(matches!(
            parse_err("/a/"),
            RouterError::InvalidPattern { reason, .. } if reason.contains("empty segments")
        ));
        assert!(matches!(
            parse_err("/a/:"),
            RouterError::InvalidPattern { reason, .. } if reason.contains("must have a name")
        ));
        assert!(matches!(
            parse_err("/a/*rest/b"),
            RouterError::InvalidPattern { reason, .. } if reason.contains("final segment")
        ));
        assert!(matches!(
            parse_err("/a/*x/*y"),
            RouterError::InvalidPattern { reason, .. } if reason.contains("final segment")
        ));
        assert!(matches!(
            parse_err("/:id/:id"),
            RouterError::InvalidPattern { reason, .. } if reason.contains("duplicate")
        ));
        assert!(matches!(
            parse_err("/a/b:c"),
            RouterError::InvalidPattern { reason, .. } if reason.contains("introduce")
        ));
    }

    #[test]
    fn test_specificity_weights() {
        assert_eq!(parse("/a/b").specificity(), 6);
        assert_eq!(parse("/a/:x").specificity(), 5);
        assert_eq!(parse("/a/*rest").specificity(), 4);
        assert_eq!(parse("/:x").specificity(), 2);
    }
}
