use std::str::FromStr;

use serde::Deserialize;

/// Integral time unit shared by both analysis engines.
///
/// Signed on purpose: derived quantities such as enforcement timeouts and
/// zero-slack instants can become negative, which is how an infeasible task
/// is reported.
pub type Time = i64;

/// Criticality level of a flat task (0 = lowest).
pub type Criticality = usize;

/// Which schedulability test the CLI should run on a workload.
///
/// - `Base`: layered-trust response-time test.
/// - `Exact`: utilization gate + hyper test + exact guest busy-period test.
/// - `Predictive`: like `Exact`, using predicted hyper budgets.
/// - `Zsrm`: zero-slack criticality-degradation test.
/// - `Modal`: digraph engine over every mode and mode transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    Base,
    Exact,
    Predictive,
    Zsrm,
    Modal,
}

impl Default for AnalysisKind {
    fn default() -> Self {
        AnalysisKind::Exact
    }
}

impl FromStr for AnalysisKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "base" => Ok(AnalysisKind::Base),
            "exact" => Ok(AnalysisKind::Exact),
            "predictive" => Ok(AnalysisKind::Predictive),
            "zsrm" => Ok(AnalysisKind::Zsrm),
            "modal" => Ok(AnalysisKind::Modal),
            other => Err(format!(
                "invalid analysis: {other} (expected \"base\", \"exact\", \"predictive\", \"zsrm\" or \"modal\")"
            )),
        }
    }
}

/// `ceil(a / b)` for a positive divisor, with non-positive numerators
/// counting zero releases.
pub fn ceil_div(a: Time, b: Time) -> Time {
    debug_assert!(b > 0, "divisor must be positive");
    if a <= 0 { 0 } else { (a + b - 1) / b }
}

/// `floor(a / b)` for a non-negative numerator and positive divisor.
pub fn floor_div(a: Time, b: Time) -> Time {
    debug_assert!(b > 0, "divisor must be positive");
    if a <= 0 { 0 } else { a / b }
}
