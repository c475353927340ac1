//! The constraint expression language posted through the model port.

use crate::model::{Value, VarId};

/// One side of an (in)equality: a variable or a literal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Term {
    Var(VarId),
    Const(Value),
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Term::Var(v) => write!(f, "{v}"),
            Term::Const(c) => write!(f, "{c}"),
        }
    }
}

/// Comparison operator of a linear-sum constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Le,
    Lt,
    Ge,
    Gt,
}

impl CmpOp {
    pub fn holds(self, lhs: i64, rhs: i64) -> bool {
        match self {
            CmpOp::Eq => lhs == rhs,
            CmpOp::Ne => lhs != rhs,
            CmpOp::Le => lhs <= rhs,
            CmpOp::Lt => lhs < rhs,
            CmpOp::Ge => lhs >= rhs,
            CmpOp::Gt => lhs > rhs,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Le => "<=",
            CmpOp::Lt => "<",
            CmpOp::Ge => ">=",
            CmpOp::Gt => ">",
        }
    }
}

/// A constraint over decision variables.
///
/// Booleans in a [`Expr::LinearSum`] count as 0/1, so cardinality constraints
/// ("exactly k of these cells are shaded") are plain sums over boolean
/// variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A boolean variable used as a literal.
    Var(VarId),
    Not(Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Implies(Box<Expr>, Box<Expr>),
    Eq(Term, Term),
    Ne(Term, Term),
    LinearSum {
        terms: Vec<VarId>,
        op: CmpOp,
        rhs: i64,
    },
    AllDifferent(Vec<VarId>),
    ExactlyOne(Vec<VarId>),
}

impl Expr {
    pub fn var(variable: VarId) -> Expr {
        Expr::Var(variable)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: Expr) -> Expr {
        Expr::Not(Box::new(inner))
    }

    pub fn and(clauses: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::And(clauses.into_iter().collect())
    }

    pub fn or(clauses: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::Or(clauses.into_iter().collect())
    }

    pub fn implies(antecedent: Expr, consequent: Expr) -> Expr {
        Expr::Implies(Box::new(antecedent), Box::new(consequent))
    }

    /// `variable == value`
    pub fn eq(variable: VarId, value: Value) -> Expr {
        Expr::Eq(Term::Var(variable), Term::Const(value))
    }

    /// `variable != value`
    pub fn ne(variable: VarId, value: Value) -> Expr {
        Expr::Ne(Term::Var(variable), Term::Const(value))
    }

    /// `Σ terms <op> rhs`
    pub fn sum(terms: impl IntoIterator<Item = VarId>, op: CmpOp, rhs: i64) -> Expr {
        Expr::LinearSum {
            terms: terms.into_iter().collect(),
            op,
            rhs,
        }
    }

    /// Every variable this expression mentions, in syntactic order, with
    /// duplicates removed.
    pub fn variables(&self) -> Vec<VarId> {
        let mut out = Vec::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut Vec<VarId>) {
        let push = |out: &mut Vec<VarId>, v: VarId| {
            if !out.contains(&v) {
                out.push(v);
            }
        };
        match self {
            Expr::Var(v) => push(out, *v),
            Expr::Not(inner) => inner.collect_variables(out),
            Expr::And(clauses) | Expr::Or(clauses) => {
                for clause in clauses {
                    clause.collect_variables(out);
                }
            }
            Expr::Implies(a, b) => {
                a.collect_variables(out);
                b.collect_variables(out);
            }
            Expr::Eq(a, b) | Expr::Ne(a, b) => {
                for term in [a, b] {
                    if let Term::Var(v) = term {
                        push(out, *v);
                    }
                }
            }
            Expr::LinearSum { terms, .. }
            | Expr::AllDifferent(terms)
            | Expr::ExactlyOne(terms) => {
                for &v in terms {
                    push(out, v);
                }
            }
        }
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn join(clauses: &[Expr], separator: &str) -> String {
            clauses
                .iter()
                .map(|c| format!("({c})"))
                .collect::<Vec<_>>()
                .join(separator)
        }
        fn vars(ids: &[VarId]) -> String {
            ids.iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        }
        match self {
            Expr::Var(v) => write!(f, "{v}"),
            Expr::Not(inner) => write!(f, "NOT ({inner})"),
            Expr::And(clauses) => write!(f, "{}", join(clauses, " AND ")),
            Expr::Or(clauses) => write!(f, "{}", join(clauses, " OR ")),
            Expr::Implies(a, b) => write!(f, "({a}) ==> ({b})"),
            Expr::Eq(a, b) => write!(f, "{a} == {b}"),
            Expr::Ne(a, b) => write!(f, "{a} != {b}"),
            Expr::LinearSum { terms, op, rhs } => {
                write!(f, "sum({}) {} {rhs}", vars(terms), op.symbol())
            }
            Expr::AllDifferent(terms) => write!(f, "alldifferent({})", vars(terms)),
            Expr::ExactlyOne(terms) => write!(f, "exactlyone({})", vars(terms)),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn variables_are_collected_without_duplicates() {
        let a = VarId(0);
        let b = VarId(1);
        let expr = Expr::or([
            Expr::eq(a, Value::Int(1)),
            Expr::and([Expr::var(b), Expr::not(Expr::var(a))]),
        ]);
        assert_eq!(expr.variables(), vec![a, b]);
    }

    #[test]
    fn display_reads_like_a_formula() {
        let expr = Expr::sum([VarId(3), VarId(4)], CmpOp::Le, 2);
        assert_eq!(expr.to_string(), "sum(?3, ?4) <= 2");
        let expr = Expr::implies(Expr::var(VarId(0)), Expr::ne(VarId(1), Value::Bool(true)));
        assert_eq!(expr.to_string(), "(?0) ==> (?1 != true)");
    }
}
