//! Parameter constraints.
//!
//! A constraint pairs a parameter name with a validator. Validators are
//! fully prepared at registration: regexes are anchored and compiled once,
//! typed predicates are fixed byte scans. At match time validation is a
//! single call that never allocates; a rejected value simply makes the
//! parameter edge non-matching.

use crate::error::RouterError;
use regex::Regex;

/// Named typed predicates with fixed semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypedKind {
    /// One or more ASCII digits with an optional leading `+` or `-`.
    Integer,
    /// One or more ASCII digits.
    UnsignedInteger,
    /// One or more ASCII letters.
    Alpha,
    /// One or more ASCII letters or digits.
    AlphaNumeric,
    /// Canonical 8-4-4-4-12 lowercase hex UUID.
    Uuid,
}

impl TypedKind {
    fn accepts(self, value: &str) -> bool {
        let bytes = value.as_bytes();
        match self {
            TypedKind::Integer => {
                let digits = match bytes.first() {
                    Some(b'+' | b'-') => &bytes[1..],
                    _ => bytes,
                };
                !digits.is_empty() && digits.iter().all(u8::is_ascii_digit)
            }
            TypedKind::UnsignedInteger => {
                !bytes.is_empty() && bytes.iter().all(u8::is_ascii_digit)
            }
            TypedKind::Alpha => !bytes.is_empty() && bytes.iter().all(u8::is_ascii_alphabetic),
            TypedKind::AlphaNumeric => {
                !bytes.is_empty() && bytes.iter().all(u8::is_ascii_alphanumeric)
            }
            TypedKind::Uuid => is_canonical_uuid(bytes),
        }
    }
}

fn is_canonical_uuid(bytes: &[u8]) -> bool {
    if bytes.len() != 36 {
        return false;
    }
    bytes.iter().enumerate().all(|(i, &b)| match i {
        8 | 13 | 18 | 23 => b == b'-',
        _ => b.is_ascii_digit() || (b'a'..=b'f').contains(&b),
    })
}

/// A compiled validator attached to one parameter.
#[derive(Debug, Clone)]
pub enum Validator {
    /// Anchored regex, compiled at registration.
    Regex(Regex),
    Typed(TypedKind),
}

impl Validator {
    /// Compiles a regex validator. The pattern is anchored with `^(?:…)$`
    /// unless it already carries both anchors, so `[0-9]+` cannot match in
    /// the middle of a segment. Compile failure surfaces immediately as
    /// [`RouterError::InvalidConstraint`].
    pub fn regex(param: &str, pattern: &str) -> Result<Self, RouterError> {
        let anchored = if pattern.starts_with('^') && pattern.ends_with('$') {
            pattern.to_string()
        } else {
            format!("^(?:{pattern})$")
        };
        let compiled = Regex::new(&anchored).map_err(|e| RouterError::InvalidConstraint {
            param: param.to_string(),
            detail: e.to_string(),
        })?;
        Ok(Validator::Regex(compiled))
    }

    pub fn typed(kind: TypedKind) -> Self {
        Validator::Typed(kind)
    }

    /// True when the captured value satisfies the validator.
    pub fn accepts(&self, value: &str) -> bool {
        match self {
            Validator::Regex(re) => re.is_match(value),
            Validator::Typed(kind) => kind.accepts(value),
        }
    }
}

/// Constraints of one route, keyed by parameter name. Routes bind a handful
/// of parameters at most, so a linear scan beats a map here.
#[derive(Debug, Clone, Default)]
pub(crate) struct ConstraintSet {
    entries: Vec<(String, Validator)>,
}

impl ConstraintSet {
    pub(crate) fn insert(&mut self, param: &str, validator: Validator) {
        match self.entries.iter_mut().find(|(name, _)| name == param) {
            Some((_, existing)) => *existing = validator,
            None => self.entries.push((param.to_string(), validator)),
        }
    }

    pub(crate) fn get(&self, param: &str) -> Option<&Validator> {
        self.entries
            .iter()
            .find(|(name, _)| name == param)
            .map(|(_, v)| v)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validates every captured `(name, value)` pair that has a constraint.
    pub(crate) fn accepts_all<'n, 'v, I>(&self, captures: I) -> bool
    where
        I: IntoIterator<Item = (&'n str, &'v str)>,
    {
        if self.entries.is_empty() {
            return true;
        }
        captures
            .into_iter()
            .all(|(name, value)| self.get(name).is_none_or(|v| v.accepts(value)))
    }
}
