//! Variable-selection and value-ordering heuristics for the reference
//! backend's backtracking search.

use std::cell::RefCell;

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use rand_core::SeedableRng;

use crate::model::{Domains, Value, VarId};

/// A strategy for choosing which unassigned variable to branch on next.
pub trait VariableSelectionHeuristic {
    /// Selects the next variable to assign, or `None` when every domain is
    /// already a singleton.
    fn select_variable(&self, domains: &Domains) -> Option<VarId>;
}

/// Selects the first unassigned variable, ordered by [`VarId`]. Basic and
/// deterministic.
pub struct SelectFirstHeuristic;

impl VariableSelectionHeuristic for SelectFirstHeuristic {
    fn select_variable(&self, domains: &Domains) -> Option<VarId> {
        domains
            .iter()
            .filter(|(_, domain)| domain.len() > 1)
            .min_by_key(|(var, _)| *var)
            .map(|(var, _)| *var)
    }
}

/// Minimum Remaining Values: branch on the most constrained variable first.
/// Ties break toward the lower [`VarId`] for determinism.
pub struct MinimumRemainingValuesHeuristic;

impl VariableSelectionHeuristic for MinimumRemainingValuesHeuristic {
    fn select_variable(&self, domains: &Domains) -> Option<VarId> {
        domains
            .iter()
            .filter(|(_, domain)| domain.len() > 1)
            .min_by(|(var_a, domain_a), (var_b, domain_b)| {
                (domain_a.len(), *var_a).cmp(&(domain_b.len(), *var_b))
            })
            .map(|(var, _)| *var)
    }
}

/// A strategy for the order in which a variable's candidate values are tried.
pub trait ValueOrderingHeuristic {
    fn order_values(&self, domain: &im::OrdSet<Value>) -> Vec<Value>;
}

/// Tries values in their natural ascending order.
pub struct IdentityValueHeuristic;

impl ValueOrderingHeuristic for IdentityValueHeuristic {
    fn order_values(&self, domain: &im::OrdSet<Value>) -> Vec<Value> {
        domain.iter().copied().collect()
    }
}

/// Tries values in a shuffled order drawn from a seeded generator, so
/// randomized runs stay reproducible.
pub struct ShuffledValueHeuristic {
    rng: RefCell<ChaCha8Rng>,
}

impl ShuffledValueHeuristic {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: RefCell::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }
}

impl ValueOrderingHeuristic for ShuffledValueHeuristic {
    fn order_values(&self, domain: &im::OrdSet<Value>) -> Vec<Value> {
        let mut values: Vec<Value> = domain.iter().copied().collect();
        values.shuffle(&mut *self.rng.borrow_mut());
        values
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn domains() -> Domains {
        im::hashmap! {
            VarId(0) => [Value::Int(1), Value::Int(2), Value::Int(3)]
                .into_iter().collect::<im::OrdSet<_>>(),
            VarId(1) => [Value::Int(7)].into_iter().collect(),
            VarId(2) => [Value::Int(1), Value::Int(2)].into_iter().collect(),
        }
    }

    #[test]
    fn select_first_picks_lowest_unassigned_id() {
        assert_eq!(
            SelectFirstHeuristic.select_variable(&domains()),
            Some(VarId(0))
        );
    }

    #[test]
    fn mrv_picks_smallest_open_domain() {
        assert_eq!(
            MinimumRemainingValuesHeuristic.select_variable(&domains()),
            Some(VarId(2))
        );
    }

    #[test]
    fn all_singleton_domains_select_nothing() {
        let domains: Domains = im::hashmap! {
            VarId(0) => [Value::Bool(true)].into_iter().collect::<im::OrdSet<_>>(),
        };
        assert_eq!(SelectFirstHeuristic.select_variable(&domains), None);
    }

    #[test]
    fn seeded_shuffle_is_reproducible() {
        let domain: im::OrdSet<Value> = (0..8).map(Value::Int).collect();
        let first = ShuffledValueHeuristic::seeded(42).order_values(&domain);
        let second = ShuffledValueHeuristic::seeded(42).order_values(&domain);
        assert_eq!(first, second);
        assert_eq!(first.len(), 8);
    }
}
