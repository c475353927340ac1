//! The reference [`ConstraintModel`] backend: a finite-domain solver built on
//! persistent domain maps, generic arc revision, and backtracking search.

use std::collections::{HashMap, HashSet, VecDeque};

use im::OrdSet;
use tracing::{debug, trace};

use crate::{
    error::{Error, Result},
    model::{
        expr::{CmpOp, Expr, Term},
        heuristics::{
            IdentityValueHeuristic, MinimumRemainingValuesHeuristic, ValueOrderingHeuristic,
            VariableSelectionHeuristic,
        },
        ConstraintModel, Domains, SolveOutcome, Value, VarId,
    },
};

type ConstraintId = usize;

/// Three-valued verdict of a constraint over partially assigned domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Truth {
    True,
    False,
    Unknown,
}

impl Truth {
    fn negate(self) -> Truth {
        match self {
            Truth::True => Truth::False,
            Truth::False => Truth::True,
            Truth::Unknown => Truth::Unknown,
        }
    }
}

/// Counters for the most recent `solve()` call.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchStats {
    pub nodes_visited: u64,
    pub backtracks: u64,
    pub revisions: u64,
    pub prunings: u64,
}

/// Deduplicating FIFO of `(variable, constraint)` arcs awaiting revision.
struct WorkList {
    queue: VecDeque<(VarId, ConstraintId)>,
    queue_members: HashSet<(VarId, ConstraintId)>,
}

impl WorkList {
    fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            queue_members: HashSet::new(),
        }
    }

    fn push_back(&mut self, variable: VarId, constraint: ConstraintId) {
        if self.queue_members.insert((variable, constraint)) {
            self.queue.push_back((variable, constraint));
        }
    }

    fn pop_front(&mut self) -> Option<(VarId, ConstraintId)> {
        let item = self.queue.pop_front()?;
        self.queue_members.remove(&item);
        Some(item)
    }
}

/// The crate's reference constraint backend.
///
/// Variables and constraints persist across `solve()` calls; the constraint
/// store is append-only, so incremental refinement never rebuilds prior
/// state. Each solve starts from the declared domains, establishes arc
/// consistency with a worklist loop, then falls back to backtracking search
/// with pluggable heuristics.
pub struct CpModel {
    next_var: u32,
    domains: Domains,
    constraints: Vec<Expr>,
    assignment: Option<im::HashMap<VarId, Value>>,
    variable_heuristic: Box<dyn VariableSelectionHeuristic>,
    value_heuristic: Box<dyn ValueOrderingHeuristic>,
    node_limit: Option<u64>,
    stats: SearchStats,
}

impl CpModel {
    /// A model with the default heuristics (minimum remaining values,
    /// ascending value order).
    pub fn new() -> Self {
        Self::with_heuristics(
            Box::new(MinimumRemainingValuesHeuristic),
            Box::new(IdentityValueHeuristic),
        )
    }

    pub fn with_heuristics(
        variable_heuristic: Box<dyn VariableSelectionHeuristic>,
        value_heuristic: Box<dyn ValueOrderingHeuristic>,
    ) -> Self {
        Self {
            next_var: 0,
            domains: Domains::new(),
            constraints: Vec::new(),
            assignment: None,
            variable_heuristic,
            value_heuristic,
            node_limit: None,
            stats: SearchStats::default(),
        }
    }

    /// Caps the number of search nodes one `solve()` may visit; exceeding the
    /// cap is reported as a backend failure, not as `Unsat`.
    pub fn with_node_limit(mut self, limit: u64) -> Self {
        self.node_limit = Some(limit);
        self
    }

    /// Counters from the most recent `solve()`.
    pub fn search_stats(&self) -> &SearchStats {
        &self.stats
    }

    /// Number of constraints posted so far. Monotonically non-decreasing.
    pub fn constraints_number(&self) -> usize {
        self.constraints.len()
    }

    fn allocate(&mut self, domain: OrdSet<Value>) -> VarId {
        let id = VarId(self.next_var);
        self.next_var += 1;
        self.domains.insert(id, domain);
        id
    }

    fn domain_of<'d>(domains: &'d Domains, variable: VarId) -> Result<&'d OrdSet<Value>> {
        domains
            .get(&variable)
            .ok_or_else(|| Error::solver_backend(format!("unknown variable {variable}")))
    }

    fn term_candidates(domains: &Domains, term: Term) -> Result<OrdSet<Value>> {
        match term {
            Term::Var(v) => Ok(Self::domain_of(domains, v)?.clone()),
            Term::Const(c) => Ok(OrdSet::unit(c)),
        }
    }

    /// Kleene evaluation of a constraint against the current domains.
    fn eval(domains: &Domains, constraint: &Expr) -> Result<Truth> {
        match constraint {
            Expr::Var(v) => {
                let domain = Self::domain_of(domains, *v)?;
                if domain.iter().any(|value| matches!(value, Value::Int(_))) {
                    return Err(Error::solver_backend(format!(
                        "integer variable {v} used as a boolean literal"
                    )));
                }
                let can_true = domain.contains(&Value::Bool(true));
                let can_false = domain.contains(&Value::Bool(false));
                Ok(match (can_true, can_false) {
                    (true, true) => Truth::Unknown,
                    (true, false) => Truth::True,
                    _ => Truth::False,
                })
            }
            Expr::Not(inner) => Ok(Self::eval(domains, inner)?.negate()),
            Expr::And(clauses) => {
                let mut verdict = Truth::True;
                for clause in clauses {
                    match Self::eval(domains, clause)? {
                        Truth::False => return Ok(Truth::False),
                        Truth::Unknown => verdict = Truth::Unknown,
                        Truth::True => {}
                    }
                }
                Ok(verdict)
            }
            Expr::Or(clauses) => {
                let mut verdict = Truth::False;
                for clause in clauses {
                    match Self::eval(domains, clause)? {
                        Truth::True => return Ok(Truth::True),
                        Truth::Unknown => verdict = Truth::Unknown,
                        Truth::False => {}
                    }
                }
                Ok(verdict)
            }
            Expr::Implies(antecedent, consequent) => {
                match (
                    Self::eval(domains, antecedent)?,
                    Self::eval(domains, consequent)?,
                ) {
                    (Truth::False, _) | (_, Truth::True) => Ok(Truth::True),
                    (Truth::True, Truth::False) => Ok(Truth::False),
                    _ => Ok(Truth::Unknown),
                }
            }
            Expr::Eq(a, b) => {
                let left = Self::term_candidates(domains, *a)?;
                let right = Self::term_candidates(domains, *b)?;
                let overlap = left.iter().any(|v| right.contains(v));
                Ok(if !overlap {
                    Truth::False
                } else if left.len() == 1 && right.len() == 1 {
                    Truth::True
                } else {
                    Truth::Unknown
                })
            }
            Expr::Ne(a, b) => {
                Self::eval(domains, &Expr::Eq(*a, *b)).map(Truth::negate)
            }
            Expr::LinearSum { terms, op, rhs } => {
                // Bounds reasoning: the sum is decided once its reachable
                // interval falls entirely inside or outside the comparison.
                let mut min_sum: i64 = 0;
                let mut max_sum: i64 = 0;
                for &term in terms {
                    let domain = Self::domain_of(domains, term)?;
                    let Some(min) = domain.iter().map(|v| v.as_sum_term()).min() else {
                        return Ok(Truth::False);
                    };
                    let max = domain.iter().map(|v| v.as_sum_term()).max().unwrap_or(min);
                    min_sum += min;
                    max_sum += max;
                }
                Ok(match op {
                    CmpOp::Le => decide(max_sum <= *rhs, min_sum > *rhs),
                    CmpOp::Lt => decide(max_sum < *rhs, min_sum >= *rhs),
                    CmpOp::Ge => decide(min_sum >= *rhs, max_sum < *rhs),
                    CmpOp::Gt => decide(min_sum > *rhs, max_sum <= *rhs),
                    CmpOp::Eq => decide(
                        min_sum == *rhs && max_sum == *rhs,
                        *rhs < min_sum || *rhs > max_sum,
                    ),
                    CmpOp::Ne => decide(
                        *rhs < min_sum || *rhs > max_sum,
                        min_sum == *rhs && max_sum == *rhs,
                    ),
                })
            }
            Expr::AllDifferent(terms) => {
                let mut fixed = HashSet::new();
                let mut all_fixed = true;
                for &term in terms {
                    let domain = Self::domain_of(domains, term)?;
                    if domain.is_empty() {
                        return Ok(Truth::False);
                    }
                    if domain.len() == 1 {
                        let value = *domain.get_min().unwrap_or(&Value::Int(0));
                        if !fixed.insert(value) {
                            return Ok(Truth::False);
                        }
                    } else {
                        all_fixed = false;
                    }
                }
                Ok(if all_fixed { Truth::True } else { Truth::Unknown })
            }
            Expr::ExactlyOne(terms) => {
                let mut must_true = 0usize;
                let mut may_true = 0usize;
                for &term in terms {
                    let domain = Self::domain_of(domains, term)?;
                    if domain.contains(&Value::Bool(true)) {
                        may_true += 1;
                        if domain.len() == 1 {
                            must_true += 1;
                        }
                    }
                }
                Ok(if must_true > 1 {
                    Truth::False
                } else if may_true == 0 {
                    Truth::False
                } else if must_true == 1 && may_true == 1 {
                    Truth::True
                } else {
                    Truth::Unknown
                })
            }
        }
    }

    /// Generic arc revision: drop every value of `target` that immediately
    /// falsifies `constraint`. Returns the narrowed domains when anything was
    /// pruned.
    fn revise(
        domains: &Domains,
        constraint: &Expr,
        target: VarId,
    ) -> Result<Option<Domains>> {
        let domain = Self::domain_of(domains, target)?.clone();
        let mut retained = OrdSet::new();
        for &value in domain.iter() {
            let probe = domains.update(target, OrdSet::unit(value));
            if Self::eval(&probe, constraint)? != Truth::False {
                retained.insert(value);
            }
        }
        if retained.len() < domain.len() {
            trace!(%target, constraint = %constraint, kept = retained.len(), "revise pruned domain");
            Ok(Some(domains.update(target, retained)))
        } else {
            Ok(None)
        }
    }

    /// AC-3 style propagation loop over all posted constraints.
    fn arc_consistency(
        &self,
        initial: Domains,
        stats: &mut SearchStats,
    ) -> Result<Option<Domains>> {
        let mut domains = initial;

        let mut dependency_graph: HashMap<VarId, Vec<ConstraintId>> = HashMap::new();
        let mut scopes: Vec<Vec<VarId>> = Vec::with_capacity(self.constraints.len());
        for (i, constraint) in self.constraints.iter().enumerate() {
            let scope = constraint.variables();
            for &var in &scope {
                dependency_graph.entry(var).or_default().push(i);
            }
            scopes.push(scope);
        }

        let mut worklist = WorkList::new();
        for (constraint_id, scope) in scopes.iter().enumerate() {
            for &var in scope {
                worklist.push_back(var, constraint_id);
            }
        }

        while let Some((target, constraint_id)) = worklist.pop_front() {
            stats.revisions += 1;
            if let Some(new_domains) =
                Self::revise(&domains, &self.constraints[constraint_id], target)?
            {
                if Self::domain_of(&new_domains, target)?.is_empty() {
                    return Ok(None); // Inconsistent.
                }
                stats.prunings += 1;
                domains = new_domains;

                if let Some(dependents) = dependency_graph.get(&target) {
                    for &dependent_id in dependents {
                        for &neighbor in &scopes[dependent_id] {
                            if neighbor != target {
                                worklist.push_back(neighbor, dependent_id);
                            }
                        }
                    }
                }
            }
        }

        Ok(Some(domains))
    }

    fn search(&self, domains: Domains, stats: &mut SearchStats) -> Result<Option<Domains>> {
        if let Some(limit) = self.node_limit {
            if stats.nodes_visited >= limit {
                return Err(Error::solver_backend(format!(
                    "search node limit of {limit} exhausted"
                )));
            }
        }
        stats.nodes_visited += 1;

        let Some(branch_var) = self.variable_heuristic.select_variable(&domains) else {
            // Every domain is a singleton: a complete assignment.
            return Ok(Some(domains));
        };
        let domain = Self::domain_of(&domains, branch_var)?.clone();

        for value in self.value_heuristic.order_values(&domain) {
            let guess = domains.update(branch_var, OrdSet::unit(value));
            if let Some(propagated) = self.arc_consistency(guess, stats)? {
                if let Some(found) = self.search(propagated, stats)? {
                    return Ok(Some(found));
                }
            }
            stats.backtracks += 1;
        }

        Ok(None)
    }

    fn is_complete(domains: &Domains) -> bool {
        domains.values().all(|domain| domain.len() == 1)
    }

    fn extract_assignment(domains: &Domains) -> im::HashMap<VarId, Value> {
        domains
            .iter()
            .filter_map(|(var, domain)| domain.get_min().map(|value| (*var, *value)))
            .collect()
    }
}

fn decide(definitely: bool, impossible: bool) -> Truth {
    if definitely {
        Truth::True
    } else if impossible {
        Truth::False
    } else {
        Truth::Unknown
    }
}

impl Default for CpModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstraintModel for CpModel {
    fn new_bool(&mut self) -> VarId {
        self.allocate([Value::Bool(false), Value::Bool(true)].into_iter().collect())
    }

    fn new_int(&mut self, lo: i64, hi: i64) -> VarId {
        self.allocate((lo..=hi).map(Value::Int).collect())
    }

    fn add(&mut self, constraint: Expr) {
        self.constraints.push(constraint);
    }

    fn solve(&mut self) -> Result<SolveOutcome> {
        let mut stats = SearchStats::default();
        let propagated = self.arc_consistency(self.domains.clone(), &mut stats)?;

        let solved = match propagated {
            None => None,
            Some(domains) if Self::is_complete(&domains) => Some(domains),
            Some(domains) => self.search(domains, &mut stats)?,
        };

        debug!(
            nodes = stats.nodes_visited,
            backtracks = stats.backtracks,
            revisions = stats.revisions,
            sat = solved.is_some(),
            "solve finished"
        );
        self.stats = stats;

        match solved {
            Some(domains) => {
                self.assignment = Some(Self::extract_assignment(&domains));
                Ok(SolveOutcome::Sat)
            }
            None => Ok(SolveOutcome::Unsat),
        }
    }

    fn value_of(&self, variable: VarId) -> Result<Value> {
        let assignment = self.assignment.as_ref().ok_or_else(|| {
            Error::solver_backend("value_of called before a successful solve")
        })?;
        assignment.get(&variable).copied().ok_or_else(|| {
            Error::solver_backend(format!("no assignment recorded for {variable}"))
        })
    }
}
