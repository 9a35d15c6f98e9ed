//! Composable three-valued predicates over batted-ball events.

use std::fmt;
use std::ops::{BitAnd, BitOr, Not};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::data::model::BattedBallEvent;
use crate::metrics::Metric;

// ---------------------------------------------------------------------------
// Truth – Kleene three-valued logic
// ---------------------------------------------------------------------------

/// Outcome of evaluating a predicate against one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Truth {
    True,
    False,
    /// The event lacks the data needed to answer.
    Undetermined,
}

impl Truth {
    pub fn and(self, other: Truth) -> Truth {
        match (self, other) {
            (Truth::False, _) | (_, Truth::False) => Truth::False,
            (Truth::True, Truth::True) => Truth::True,
            _ => Truth::Undetermined,
        }
    }

    pub fn or(self, other: Truth) -> Truth {
        match (self, other) {
            (Truth::True, _) | (_, Truth::True) => Truth::True,
            (Truth::False, Truth::False) => Truth::False,
            _ => Truth::Undetermined,
        }
    }

    pub fn negate(self) -> Truth {
        match self {
            Truth::True => Truth::False,
            Truth::False => Truth::True,
            Truth::Undetermined => Truth::Undetermined,
        }
    }

    pub fn is_true(self) -> bool {
        self == Truth::True
    }

    pub fn is_determined(self) -> bool {
        self != Truth::Undetermined
    }
}

impl From<bool> for Truth {
    fn from(b: bool) -> Self {
        if b { Truth::True } else { Truth::False }
    }
}

impl From<Option<bool>> for Truth {
    fn from(b: Option<bool>) -> Self {
        b.map_or(Truth::Undetermined, Truth::from)
    }
}

impl BitAnd for Truth {
    type Output = Truth;
    fn bitand(self, rhs: Truth) -> Truth {
        self.and(rhs)
    }
}

impl BitOr for Truth {
    type Output = Truth;
    fn bitor(self, rhs: Truth) -> Truth {
        self.or(rhs)
    }
}

impl Not for Truth {
    type Output = Truth;
    fn not(self) -> Truth {
        self.negate()
    }
}

// ---------------------------------------------------------------------------
// CompareOp
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
}

impl CompareOp {
    pub fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            CompareOp::Lt => lhs < rhs,
            CompareOp::Le => lhs <= rhs,
            CompareOp::Eq => lhs == rhs,
            CompareOp::Ge => lhs >= rhs,
            CompareOp::Gt => lhs > rhs,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Eq => "==",
            CompareOp::Ge => ">=",
            CompareOp::Gt => ">",
        }
    }
}

// ---------------------------------------------------------------------------
// Predicate
// ---------------------------------------------------------------------------

/// Immutable predicate tree, evaluated by structural recursion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    Compare { metric: Metric, op: CompareOp, value: f64 },
    /// Event belongs to this batter id.
    Batter(i64),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn compare(metric: Metric, op: CompareOp, value: f64) -> Self {
        Predicate::Compare { metric, op, value }
    }

    pub fn batter(id: i64) -> Self {
        Predicate::Batter(id)
    }

    pub fn hard_hit() -> Self {
        Predicate::compare(Metric::HardHit, CompareOp::Eq, 1.0)
    }

    pub fn optimal_launch_angle() -> Self {
        Predicate::compare(Metric::OptimalLaunchAngle, CompareOp::Eq, 1.0)
    }

    pub fn and(self, other: Predicate) -> Self {
        Predicate::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Predicate) -> Self {
        Predicate::Or(Box::new(self), Box::new(other))
    }

    pub fn negate(self) -> Self {
        Predicate::Not(Box::new(self))
    }

    pub fn evaluate(&self, event: &BattedBallEvent, config: &EngineConfig) -> Truth {
        match self {
            Predicate::Compare { metric, op, value } => match metric.derive(event, config) {
                Some(v) => op.apply(v, *value).into(),
                None => Truth::Undetermined,
            },
            Predicate::Batter(id) => event.batter.map(|b| b == *id).into(),
            Predicate::And(p, q) => p.evaluate(event, config) & q.evaluate(event, config),
            Predicate::Or(p, q) => p.evaluate(event, config) | q.evaluate(event, config),
            Predicate::Not(p) => !p.evaluate(event, config),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Compare { metric, op, value } => {
                write!(f, "{metric} {} {value}", op.symbol())
            }
            Predicate::Batter(id) => write!(f, "batter == {id}"),
            Predicate::And(p, q) => write!(f, "({p} AND {q})"),
            Predicate::Or(p, q) => write!(f, "({p} OR {q})"),
            Predicate::Not(p) => write!(f, "NOT {p}"),
        }
    }
}

/// Parse a single comparison such as `launch_angle>=8` or `exit_velocity < 90`.
impl FromStr for Predicate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Two-character operators first so `>=` is not read as `>`.
        const OPS: [(&str, CompareOp); 6] = [
            ("<=", CompareOp::Le),
            (">=", CompareOp::Ge),
            ("==", CompareOp::Eq),
            ("<", CompareOp::Lt),
            (">", CompareOp::Gt),
            ("=", CompareOp::Eq),
        ];
        let (idx, sym, op) = OPS
            .iter()
            .find_map(|(sym, op)| s.find(sym).map(|i| (i, *sym, *op)))
            .ok_or_else(|| format!("no comparison operator in '{s}'"))?;

        let metric: Metric = s[..idx].parse()?;
        let rhs = s[idx + sym.len()..].trim();
        let value: f64 = rhs
            .parse()
            .map_err(|_| format!("'{rhs}' is not a number"))?;
        Ok(Predicate::compare(metric, op, value))
    }
}

// ---------------------------------------------------------------------------
// Named views
// ---------------------------------------------------------------------------

/// A predicate with a stable name, reusable as a saved view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedPredicate {
    pub name: String,
    pub predicate: Predicate,
}

impl NamedPredicate {
    pub fn new(name: impl Into<String>, predicate: Predicate) -> Self {
        Self {
            name: name.into(),
            predicate,
        }
    }
}

/// The built-in views.
pub fn standard_views() -> Vec<NamedPredicate> {
    vec![
        NamedPredicate::new("hard_hit", Predicate::hard_hit()),
        NamedPredicate::new("optimal_launch_angle", Predicate::optimal_launch_angle()),
        NamedPredicate::new(
            "barrel_window",
            Predicate::hard_hit().and(Predicate::optimal_launch_angle()),
        ),
        NamedPredicate::new(
            "pulled",
            Predicate::compare(Metric::SprayAngle, CompareOp::Gt, 0.0),
        ),
        NamedPredicate::new(
            "opposite_field",
            Predicate::compare(Metric::SprayAngle, CompareOp::Lt, 0.0),
        ),
    ]
}

/// Look up a built-in view by name.
pub fn standard_view(name: &str) -> Option<NamedPredicate> {
    let name = name.trim().replace('-', "_");
    standard_views().into_iter().find(|v| v.name == name)
}
