//! Episode review decisions and their client-side validation.
//!
//! Approve and reject are only offered while an episode is
//! `AWAITING_APPROVAL`. A rejection must carry a non-blank reason; the check
//! runs before any request is built.

use crate::error::CoreError;
use crate::models::episode::{EpisodeStatus, RejectEpisode};

/// A reviewer's verdict on an episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject { reason: String },
}

/// The kind of a [`Decision`], without its payload. What a reviewer is
/// offered before they fill in a reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecisionKind {
    Approve,
    Reject,
}

impl DecisionKind {
    pub fn label(self) -> &'static str {
        match self {
            DecisionKind::Approve => "approve",
            DecisionKind::Reject => "reject",
        }
    }
}

impl Decision {
    pub fn kind(&self) -> DecisionKind {
        match self {
            Decision::Approve => DecisionKind::Approve,
            Decision::Reject { .. } => DecisionKind::Reject,
        }
    }

    pub fn label(&self) -> &'static str {
        self.kind().label()
    }
}

/// Decisions available for an episode in `status`.
pub fn available_decisions(status: &EpisodeStatus) -> &'static [DecisionKind] {
    if status.is_reviewable() {
        &[DecisionKind::Approve, DecisionKind::Reject]
    } else {
        &[]
    }
}

/// Validate a rejection reason and build the request body. The reason is
/// trimmed.
pub fn validate_rejection(reason: &str) -> Result<RejectEpisode, CoreError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(CoreError::Validation(
            "A rejection reason is required".to_string(),
        ));
    }
    Ok(RejectEpisode {
        reason: reason.to_string(),
    })
}

/// Check a decision against the episode's current status.
pub fn validate_decision(status: &EpisodeStatus, decision: &Decision) -> Result<(), CoreError> {
    if !status.is_reviewable() {
        return Err(CoreError::Conflict(format!(
            "Cannot {} an episode that is {}",
            decision.label(),
            status.label()
        )));
    }
    if let Decision::Reject { reason } = decision {
        validate_rejection(reason)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn test_blank_reason_rejected() {
        assert_matches!(validate_rejection(""), Err(CoreError::Validation(_)));
        assert_matches!(validate_rejection("   \n\t"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn test_reason_is_trimmed() {
        let body = validate_rejection("  audio out of sync  ").unwrap();
        assert_eq!(body.reason, "audio out of sync");
    }

    #[test]
    fn test_only_awaiting_approval_offers_decisions() {
        assert_eq!(
            available_decisions(&EpisodeStatus::AwaitingApproval),
            &[DecisionKind::Approve, DecisionKind::Reject]
        );
        assert!(available_decisions(&EpisodeStatus::Rendering).is_empty());
        assert!(available_decisions(&EpisodeStatus::Other("ARCHIVED".into())).is_empty());
    }

    #[test]
    fn test_decision_kind_drops_reason() {
        let reject = Decision::Reject {
            reason: "too dark".into(),
        };
        assert_eq!(reject.kind(), DecisionKind::Reject);
        assert_eq!(reject.label(), "reject");
        assert_eq!(Decision::Approve.kind(), DecisionKind::Approve);
    }

    #[test]
    fn test_decision_on_wrong_status_conflicts() {
        let result = validate_decision(&EpisodeStatus::Published, &Decision::Approve);
        assert_matches!(result, Err(CoreError::Conflict(msg)) if msg.contains("Published"));
    }

    #[test]
    fn test_reject_decision_checks_reason() {
        let result = validate_decision(
            &EpisodeStatus::AwaitingApproval,
            &Decision::Reject {
                reason: " ".into(),
            },
        );
        assert_matches!(result, Err(CoreError::Validation(_)));
    }
}
