use super::domain::Student;
use super::resolver::resolve_ref;
use super::scope::Population;
use super::scoring::safe_pct;
use super::taxonomy::CriterionRef;
use serde::Serialize;

/// Pass/fail test for one skill level.
pub trait GatePredicate {
    fn clears(&self, student: &Student) -> bool;
}

impl<F> GatePredicate for F
where
    F: Fn(&Student) -> bool,
{
    fn clears(&self, student: &Student) -> bool {
        self(student)
    }
}

/// Declarative gate built from checked criterion references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateRule {
    /// Grade A or B on the criterion. Ungraded fails.
    Clears(CriterionRef),
    All(Vec<GateRule>),
    Any(Vec<GateRule>),
}

impl GatePredicate for GateRule {
    fn clears(&self, student: &Student) -> bool {
        match self {
            GateRule::Clears(criterion) => {
                resolve_ref(student, criterion).is_some_and(|grade| grade.is_passing())
            }
            GateRule::All(rules) => rules.iter().all(|rule| rule.clears(student)),
            GateRule::Any(rules) => rules.iter().any(|rule| rule.clears(student)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FunnelGate<P> {
    pub label: String,
    pub predicate: P,
}

impl<P> FunnelGate<P> {
    pub fn new(label: impl Into<String>, predicate: P) -> Self {
        Self {
            label: label.into(),
            predicate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunnelStep {
    pub label: String,
    pub count: usize,
    /// Share of the whole population clearing this gate.
    pub percentage: f64,
    /// `count / previous count`, absent for the first gate.
    pub retention_from_previous: Option<f64>,
}

/// Evaluates each gate independently over the whole population.
///
/// Gates are distinct skill checks, not a cumulative pipeline: a student may
/// clear a later gate without clearing an earlier one, so retention can exceed
/// 100%.
pub fn funnel<P: GatePredicate>(
    population: &Population<'_>,
    gates: &[FunnelGate<P>],
) -> Vec<FunnelStep> {
    let size = population.len() as f64;
    let mut steps: Vec<FunnelStep> = Vec::with_capacity(gates.len());

    for gate in gates {
        let count = population
            .students()
            .filter(|student| gate.predicate.clears(student))
            .count();
        let retention_from_previous = steps
            .last()
            .map(|previous| safe_pct(count as f64, previous.count as f64));

        steps.push(FunnelStep {
            label: gate.label.clone(),
            count,
            percentage: safe_pct(count as f64, size),
            retention_from_previous,
        });
    }

    steps
}
