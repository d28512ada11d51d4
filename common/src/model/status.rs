use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a letter request.
///
/// The workflow is strictly linear: Submitted -> Approved -> Processing ->
/// Completed. There is no rejection state and no branching; an admin may jump
/// a request forward (or backward, as a manual correction), but the UI only
/// ever suggests the next state in the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    Submitted,
    Approved,
    Processing,
    Completed,
}

/// The fixed workflow order. Progress rendering and "next state" suggestions
/// both index into this list.
pub const WORKFLOW: [RequestStatus; 4] = [
    RequestStatus::Submitted,
    RequestStatus::Approved,
    RequestStatus::Processing,
    RequestStatus::Completed,
];

impl RequestStatus {
    /// Index of this state in [`WORKFLOW`].
    pub fn position(self) -> usize {
        WORKFLOW.iter().position(|s| *s == self).unwrap_or(0)
    }

    /// The state after this one, or `None` at the terminal state.
    pub fn next(self) -> Option<RequestStatus> {
        WORKFLOW.get(self.position() + 1).copied()
    }

    /// Progress-bar fill fraction: `position / (len - 1)`.
    pub fn progress(self) -> f32 {
        self.position() as f32 / (WORKFLOW.len() - 1) as f32
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Submitted => "Submitted",
            RequestStatus::Approved => "Approved",
            RequestStatus::Processing => "Processing",
            RequestStatus::Completed => "Completed",
        }
    }

    /// Human-facing Indonesian label, as shown on badges and in emails.
    pub fn label(self) -> &'static str {
        match self {
            RequestStatus::Submitted => "Diajukan",
            RequestStatus::Approved => "Disetujui",
            RequestStatus::Processing => "Diproses",
            RequestStatus::Completed => "Selesai",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "submitted" => Ok(RequestStatus::Submitted),
            "approved" => Ok(RequestStatus::Approved),
            "processing" => Ok(RequestStatus::Processing),
            "completed" => Ok(RequestStatus::Completed),
            other => Err(format!("unknown request status: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_walks_the_workflow_in_order() {
        assert_eq!(RequestStatus::Submitted.next(), Some(RequestStatus::Approved));
        assert_eq!(RequestStatus::Approved.next(), Some(RequestStatus::Processing));
        assert_eq!(RequestStatus::Processing.next(), Some(RequestStatus::Completed));
    }

    #[test]
    fn terminal_state_has_no_next() {
        assert_eq!(RequestStatus::Completed.next(), None);
    }

    #[test]
    fn progress_is_index_over_three() {
        assert_eq!(RequestStatus::Submitted.progress(), 0.0);
        assert_eq!(RequestStatus::Approved.progress(), 1.0 / 3.0);
        assert_eq!(RequestStatus::Processing.progress(), 2.0 / 3.0);
        assert_eq!(RequestStatus::Completed.progress(), 1.0);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("processing".parse::<RequestStatus>().unwrap(), RequestStatus::Processing);
        assert_eq!("SUBMITTED".parse::<RequestStatus>().unwrap(), RequestStatus::Submitted);
        assert!("rejected".parse::<RequestStatus>().is_err());
    }

    #[test]
    fn wire_format_matches_variant_names() {
        let json = serde_json::to_string(&RequestStatus::Approved).unwrap();
        assert_eq!(json, "\"Approved\"");
    }
}
