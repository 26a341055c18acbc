//! Ticket and comment data model.
//!
//! Tickets carry their own SLA fields; the time math lives here as methods
//! taking an explicit `now` so nothing in the model touches the wall clock.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DeskError, Result};
use crate::lifecycle::TicketStatus;

/// Ticket priority, most severe first. Stored as level 1-4 (1 = critical).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// All priorities, most severe first.
    pub const ALL: [Priority; 4] = [
        Priority::Critical,
        Priority::High,
        Priority::Medium,
        Priority::Low,
    ];

    /// Numeric severity level (1 = critical ... 4 = low).
    pub fn level(&self) -> i64 {
        match self {
            Priority::Critical => 1,
            Priority::High => 2,
            Priority::Medium => 3,
            Priority::Low => 4,
        }
    }

    /// Parse a numeric level. Anything outside 1-4 is rejected.
    pub fn from_level(level: i64) -> Result<Self> {
        match level {
            1 => Ok(Priority::Critical),
            2 => Ok(Priority::High),
            3 => Ok(Priority::Medium),
            4 => Ok(Priority::Low),
            other => Err(DeskError::InvalidArgument(format!(
                "priority level must be 1-4, got {other}"
            ))),
        }
    }

    /// Human label used in reports and SLA snapshots.
    pub fn label(&self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    /// One severity step up; already-critical stays critical.
    pub fn escalated(&self) -> Priority {
        match self {
            Priority::Critical | Priority::High => Priority::Critical,
            Priority::Medium => Priority::High,
            Priority::Low => Priority::Medium,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A helpdesk ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// Unique ticket id (UUID v4)
    pub id: String,
    pub title: String,
    pub description: String,
    /// Who raised the ticket
    pub requester: String,
    pub priority: Priority,
    pub status: TicketStatus,
    /// Agent currently holding the ticket, if any
    pub assignee: Option<String>,
    /// SLA budget in wall-clock hours from creation
    pub sla_hours: i64,
    /// Set at creation, never changes afterwards
    pub created_at: DateTime<Utc>,
    /// Advanced on every mutation
    pub updated_at: DateTime<Utc>,
    /// Stamped once, on first entering the resolved status
    pub resolved_at: Option<DateTime<Utc>>,
    /// Free-form labels, insertion order preserved
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Ticket {
    /// The instant the SLA budget runs out: `created_at + sla_hours`.
    pub fn sla_deadline(&self) -> DateTime<Utc> {
        self.created_at + Duration::hours(self.sla_hours)
    }

    /// Whether the ticket has blown its SLA.
    ///
    /// Settled tickets (resolved/closed/cancelled) are judged against the
    /// instant they were resolved, so history stays honest; everything else
    /// is judged against `now`.
    pub fn is_breached(&self, now: DateTime<Utc>) -> bool {
        if self.status.is_active() {
            now > self.sla_deadline()
        } else {
            let reference = self.resolved_at.unwrap_or(self.updated_at);
            reference > self.sla_deadline()
        }
    }

    /// Signed hours until the SLA deadline. Negative means overdue.
    pub fn hours_remaining(&self, now: DateTime<Utc>) -> f64 {
        (self.sla_deadline() - now).num_milliseconds() as f64 / 3_600_000.0
    }

    /// Hours since the ticket was created.
    pub fn age_hours(&self, now: DateTime<Utc>) -> f64 {
        (now - self.created_at).num_milliseconds() as f64 / 3_600_000.0
    }

    /// Hours from creation to resolution, if the ticket has resolved.
    pub fn resolution_hours(&self) -> Option<f64> {
        self.resolved_at
            .map(|resolved| (resolved - self.created_at).num_milliseconds() as f64 / 3_600_000.0)
    }
}

/// Input for creating a ticket.
///
/// Priority and SLA hours fall back to classifier output when omitted;
/// `created_at` defaults to the desk clock and exists for imports/backfill.
#[derive(Debug, Clone, Default)]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    pub requester: String,
    pub priority: Option<Priority>,
    pub sla_hours: Option<i64>,
    pub assignee: Option<String>,
    pub tags: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// A comment on a ticket. Stored separately, immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Unique comment id (UUID v4)
    pub id: String,
    /// Ticket this comment belongs to
    pub ticket_id: String,
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    /// Internal notes are hidden from requester-facing views
    pub is_internal: bool,
}

/// Input for adding a comment.
#[derive(Debug, Clone, Default)]
pub struct NewComment {
    pub ticket_id: String,
    pub author: String,
    pub body: String,
    pub is_internal: bool,
}

// ============================================================================
// Tests
// ============================================================================
