//! # Features Module
//!
//! Feature configurations describe the product variants in which a state or transition of a
//! [conditional automaton](crate::automaton::ConditionalAutomaton) is valid.
//!
//! Two different things can be meant by "no features": either nothing has been asserted yet, or
//! every feature has been ruled out. These are kept apart by [Features]:
//!
//! - [Features::Unconstrained] means no constraint has been recorded.
//! - [Features::Only] carries a concrete set. `Only` of the empty set means no feature survives.
//!
//! ```
//! use rust_ffsm::features::{unify, Features};
//!
//! let a = Features::only(["f1", "f2"]);
//! let b = Features::only(["f2", "f3"]);
//!
//! assert_eq!(unify(&a, &b), Features::only(["f2"]));
//! assert_eq!(unify(&Features::Unconstrained, &b), b);
//! assert!(unify(&Features::only(["f1"]), &Features::only(["f3"])).is_infeasible());
//! ```

use crate::error::BuildError;
use std::collections::BTreeSet;
use std::fmt;

/// Separator used by feature declarations and labels.
pub const FEATURE_DELIMITER: char = '|';

/// Marker that stands for every feature in the declared universe.
pub const ALL_FEATURES: &str = "True";

/// A concrete, ordered set of feature identifiers.
pub type FeatureSet = BTreeSet<String>;

/// Parse a `|`-delimited feature declaration such as `"f1|f2|f3"`.
///
/// Blank entries are ignored.
///
/// ```
/// use rust_ffsm::features::parse_delimited;
///
/// let universe = parse_delimited("f1| f2 |f3");
/// assert_eq!(universe.len(), 3);
/// assert!(universe.contains("f2"));
/// ```
pub fn parse_delimited(declaration: &str) -> FeatureSet {
    declaration
        .split(FEATURE_DELIMITER)
        .map(str::trim)
        .filter(|feature| !feature.is_empty())
        .map(String::from)
        .collect()
}

/// Resolve a feature label against the declared universe.
///
/// The label [ALL_FEATURES] expands to the whole universe. Features outside the universe are
/// rejected.
pub fn parse_label(label: &str, universe: &FeatureSet) -> Result<FeatureSet, BuildError> {
    if label.trim() == ALL_FEATURES {
        return Ok(universe.clone());
    }

    let features = parse_delimited(label);
    if let Some(unknown) = features.iter().find(|f| !universe.contains(*f)) {
        return Err(BuildError::UnknownFeature(unknown.clone()));
    }

    Ok(features)
}

/// Feature information attached to a branch of a simulation or asserted by a caller.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Features {
    /// Nothing has been asserted.
    #[default]
    Unconstrained,
    /// Only these features remain. An empty set is infeasible.
    Only(FeatureSet),
}

impl Features {
    /// Convenience constructor for a concrete feature set.
    pub fn only<I, S>(features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Features::Only(features.into_iter().map(Into::into).collect())
    }

    /// True when this value rules out every feature.
    pub fn is_infeasible(&self) -> bool {
        matches!(self, Features::Only(set) if set.is_empty())
    }
}

impl fmt::Display for Features {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Features::Unconstrained => write!(f, "*"),
            Features::Only(set) => {
                let joined: Vec<&str> = set.iter().map(String::as_str).collect();
                write!(f, "{{{}}}", joined.join(", "))
            }
        }
    }
}

/// Merge two feature values.
///
/// An unconstrained side defers to the other one; two concrete sets are intersected.
pub fn unify(current: &Features, new: &Features) -> Features {
    match (current, new) {
        (Features::Unconstrained, other) | (other, Features::Unconstrained) => other.clone(),
        (Features::Only(a), Features::Only(b)) => {
            Features::Only(a.intersection(b).cloned().collect())
        }
    }
}
