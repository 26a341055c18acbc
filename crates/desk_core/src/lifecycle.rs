//! Ticket status lifecycle.
//!
//! The legal moves are a fixed edge set consulted once per transition, so the
//! whole state machine can be audited (and tested) by enumeration instead of
//! being scattered across branching logic.

use serde::{Deserialize, Serialize};

/// Status of a ticket in the helpdesk workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Ticket created, nobody working on it yet
    #[default]
    Open,
    /// An agent is actively working the ticket
    InProgress,
    /// Work done, awaiting review
    Review,
    /// Parked, waiting on the requester or a third party
    OnHold,
    /// Fix confirmed; still reopens into closure flow
    Resolved,
    /// Fully done, no further transitions
    Closed,
    /// Abandoned before any work happened, no further transitions
    Cancelled,
}

/// Permitted lifecycle transitions as (from, to) edges.
///
/// `Closed` and `Cancelled` have no outgoing edges.
const TRANSITIONS: &[(TicketStatus, TicketStatus)] = &[
    (TicketStatus::Open, TicketStatus::InProgress),
    (TicketStatus::Open, TicketStatus::OnHold),
    (TicketStatus::Open, TicketStatus::Cancelled),
    (TicketStatus::InProgress, TicketStatus::Review),
    (TicketStatus::InProgress, TicketStatus::OnHold),
    (TicketStatus::OnHold, TicketStatus::InProgress),
    (TicketStatus::Review, TicketStatus::Resolved),
    (TicketStatus::Review, TicketStatus::InProgress),
    (TicketStatus::Resolved, TicketStatus::Closed),
];

/// Check whether a transition is a legal lifecycle move.
pub fn can_transition(from: TicketStatus, to: TicketStatus) -> bool {
    TRANSITIONS.iter().any(|&(f, t)| f == from && t == to)
}

/// All statuses reachable in one step from `from`.
pub fn allowed_from(from: TicketStatus) -> Vec<TicketStatus> {
    TRANSITIONS
        .iter()
        .filter(|&&(f, _)| f == from)
        .map(|&(_, t)| t)
        .collect()
}

impl TicketStatus {
    /// All statuses, in workflow order.
    pub const ALL: [TicketStatus; 7] = [
        TicketStatus::Open,
        TicketStatus::InProgress,
        TicketStatus::Review,
        TicketStatus::OnHold,
        TicketStatus::Resolved,
        TicketStatus::Closed,
        TicketStatus::Cancelled,
    ];

    /// No outgoing transitions at all.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TicketStatus::Closed | TicketStatus::Cancelled)
    }

    /// Still being worked: counts toward open totals and SLA breach scans.
    pub fn is_active(&self) -> bool {
        !matches!(
            self,
            TicketStatus::Resolved | TicketStatus::Closed | TicketStatus::Cancelled
        )
    }

    /// Parse from the snake_case wire form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(TicketStatus::Open),
            "in_progress" => Some(TicketStatus::InProgress),
            "review" => Some(TicketStatus::Review),
            "on_hold" => Some(TicketStatus::OnHold),
            "resolved" => Some(TicketStatus::Resolved),
            "closed" => Some(TicketStatus::Closed),
            "cancelled" => Some(TicketStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketStatus::Open => write!(f, "open"),
            TicketStatus::InProgress => write!(f, "in_progress"),
            TicketStatus::Review => write!(f, "review"),
            TicketStatus::OnHold => write!(f, "on_hold"),
            TicketStatus::Resolved => write!(f, "resolved"),
            TicketStatus::Closed => write!(f, "closed"),
            TicketStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
