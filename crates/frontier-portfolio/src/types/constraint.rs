//! Named constraint kinds and validated constraint sets.

use crate::error::{PortfolioError, PortfolioResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A constraint the optimizer knows how to express.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    /// Weights sum to one (fully invested).
    SumToOne,
    /// No short positions.
    LongOnly,
    /// Gross exposure ‖w‖₁ bounded by the leverage limit.
    LeverageLimit,
}

impl ConstraintKind {
    /// Every supported kind.
    pub const ALL: [ConstraintKind; 3] = [
        ConstraintKind::SumToOne,
        ConstraintKind::LongOnly,
        ConstraintKind::LeverageLimit,
    ];

    /// Canonical name, as accepted by [`FromStr`].
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SumToOne => "sum_to_one",
            Self::LongOnly => "long_only",
            Self::LeverageLimit => "leverage_limit",
        }
    }

    /// Kinds that cannot be combined with this one.
    #[must_use]
    pub fn conflicts_with(self, other: ConstraintKind) -> bool {
        matches!(
            (self, other),
            (Self::LongOnly, Self::LeverageLimit) | (Self::LeverageLimit, Self::LongOnly)
        )
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConstraintKind {
    type Err = PortfolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| PortfolioError::UnsupportedConstraint {
                names: vec![s.to_string()],
            })
    }
}

/// A validated set of constraint kinds.
///
/// Construction rejects conflicting combinations, so any value of this type
/// can be handed to the constraint catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ConstraintKind>", into = "Vec<ConstraintKind>")]
pub struct ConstraintSet {
    kinds: BTreeSet<ConstraintKind>,
}

impl ConstraintSet {
    /// An unconstrained set.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a set from kinds, rejecting conflicts.
    pub fn new(kinds: impl IntoIterator<Item = ConstraintKind>) -> PortfolioResult<Self> {
        let kinds: BTreeSet<ConstraintKind> = kinds.into_iter().collect();
        for a in &kinds {
            if let Some(b) = kinds.iter().find(|b| a.conflicts_with(**b)) {
                return Err(PortfolioError::ConflictingConstraints {
                    first: a.as_str().to_string(),
                    second: b.as_str().to_string(),
                });
            }
        }
        Ok(Self { kinds })
    }

    /// Parses constraint names.
    ///
    /// Every unknown name is reported in one error, in the order given.
    pub fn from_names<I, S>(names: I) -> PortfolioResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut kinds = Vec::new();
        let mut unknown = Vec::new();
        for name in names {
            match name.as_ref().parse::<ConstraintKind>() {
                Ok(kind) => kinds.push(kind),
                Err(_) => unknown.push(name.as_ref().to_string()),
            }
        }
        if !unknown.is_empty() {
            return Err(PortfolioError::UnsupportedConstraint { names: unknown });
        }
        Self::new(kinds)
    }

    /// True if the set contains `kind`.
    #[must_use]
    pub fn contains(&self, kind: ConstraintKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// Iterates the kinds in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = ConstraintKind> + '_ {
        self.kinds.iter().copied()
    }

    /// Number of kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// True if no constraints are requested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl TryFrom<Vec<ConstraintKind>> for ConstraintSet {
    type Error = PortfolioError;

    fn try_from(kinds: Vec<ConstraintKind>) -> Result<Self, Self::Error> {
        Self::new(kinds)
    }
}

impl From<ConstraintSet> for Vec<ConstraintKind> {
    fn from(set: ConstraintSet) -> Self {
        set.kinds.into_iter().collect()
    }
}

impl fmt::Display for ConstraintSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(ConstraintKind::as_str).collect();
        write!(f, "[{}]", names.join(", "))
    }
}
