//! Revision gating.
//!
//! A component is converged once per generation. The generation last converged
//! is persisted in `status.revNumber`; an observation whose generation matches
//! it is a redelivery and needs no work.

use kiln_store::{Component, ComponentStatus};

/// What to do with an observed component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Run the convergence sequence.
    Admit,
    /// Deletion marker present; owned objects are garbage collected by the store.
    Deleting,
    /// This generation has already been converged.
    UpToDate,
}

/// Decide whether `component` needs a convergence run.
pub fn evaluate(component: &Component) -> GateDecision {
    if component.metadata.is_deleting() {
        return GateDecision::Deleting;
    }

    let marker = component.status.rev_number.as_str();
    if marker.is_empty() || marker != component.generation_token() {
        GateDecision::Admit
    } else {
        GateDecision::UpToDate
    }
}

/// Whether `component` needs a convergence run.
pub fn is_eligible(component: &Component) -> bool {
    evaluate(component) == GateDecision::Admit
}

/// Status closing the gate for the component's current generation.
pub fn converged_status(component: &Component) -> ComponentStatus {
    ComponentStatus {
        rev_number: component.generation_token(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use kiln_store::ComponentSpec;

    use super::*;

    fn component(generation: i64, rev_number: &str) -> Component {
        let mut component = Component::new("dev", "web", ComponentSpec::new("src", "nodejs"));
        component.metadata.generation = generation;
        component.status.rev_number = rev_number.to_string();
        component
    }

    #[test]
    fn test_unset_marker_admits() {
        assert_eq!(evaluate(&component(1, "")), GateDecision::Admit);
        assert!(is_eligible(&component(1, "")));
    }

    #[test]
    fn test_matching_marker_is_up_to_date() {
        assert_eq!(evaluate(&component(3, "3")), GateDecision::UpToDate);
        assert!(!is_eligible(&component(3, "3")));
    }

    #[test]
    fn test_stale_marker_admits() {
        assert_eq!(evaluate(&component(4, "3")), GateDecision::Admit);
    }

    #[test]
    fn test_deletion_wins() {
        let mut deleting = component(1, "");
        deleting.metadata.deletion_timestamp = Some(Utc::now());
        assert_eq!(evaluate(&deleting), GateDecision::Deleting);
        assert!(!is_eligible(&deleting));
    }

    #[test]
    fn test_converged_status_closes_gate() {
        let mut c = component(7, "");
        c.status = converged_status(&c);
        assert_eq!(c.status.rev_number, "7");
        assert_eq!(evaluate(&c), GateDecision::UpToDate);
    }
}
