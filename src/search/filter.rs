//! Structured record predicates.
//!
//! Filters are values, evaluated against decoded records in process. Caller
//! input is never spliced into a query string.

use super::store::Record;

/// Boolean condition over record fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Field rendered as text equals `value` exactly.
    Eq {
        /// Field name.
        field: String,
        /// Expected value.
        value: String,
    },
    /// At least one inner predicate holds.
    Any(Vec<Self>),
    /// Every inner predicate holds.
    All(Vec<Self>),
}

impl Predicate {
    /// `field = value`.
    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Matches a platform by full name or alias.
    #[must_use]
    pub fn platform(name: &str) -> Self {
        Self::Any(vec![
            Self::eq("platform_name", name),
            Self::eq("platform_alias", name),
        ])
    }

    /// Conjunction of `self` and `other`, flattening nested `All`s.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match (self, other) {
            (Self::All(mut a), Self::All(b)) => {
                a.extend(b);
                Self::All(a)
            }
            (Self::All(mut a), p) => {
                a.push(p);
                Self::All(a)
            }
            (p, Self::All(mut b)) => {
                b.insert(0, p);
                Self::All(b)
            }
            (a, b) => Self::All(vec![a, b]),
        }
    }

    /// Combines optional filters; `None` when both are absent.
    #[must_use]
    pub fn all_of(filters: impl IntoIterator<Item = Option<Self>>) -> Option<Self> {
        filters
            .into_iter()
            .flatten()
            .reduce(Self::and)
    }

    /// Evaluates the predicate against `record`.
    ///
    /// A missing field never equals anything. `Any([])` is false and
    /// `All([])` is true.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::Eq { field, value } => record.display(field).is_some_and(|v| v == *value),
            Self::Any(preds) => preds.iter().any(|p| p.matches(record)),
            Self::All(preds) => preds.iter().all(|p| p.matches(record)),
        }
    }
}
