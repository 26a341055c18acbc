//! SLA snapshots and breach scanning.
//!
//! Pure computation over ticket snapshots and an explicit `now`; the desk
//! supplies tickets from the store and the clock instant. Straight wall-clock
//! hours, no calendar or business-hours logic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ticket::{Priority, Ticket};

/// Point-in-time SLA view of a single ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlaSnapshot {
    pub ticket_id: String,
    pub priority: Priority,
    pub priority_label: String,
    pub sla_hours: i64,
    pub created_at: DateTime<Utc>,
    pub sla_deadline: DateTime<Utc>,
    pub is_breached: bool,
    /// Positive = time left, negative = overdue. Rounded to two decimals.
    pub hours_remaining: f64,
}

/// A ticket past its SLA deadline, as returned by the breach scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreachedTicket {
    pub ticket_id: String,
    pub title: String,
    pub priority_label: String,
    pub assignee: Option<String>,
    /// Hours past the deadline, rounded to one decimal
    pub overdue_hours: f64,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Build the SLA snapshot for a ticket at `now`.
pub fn check(ticket: &Ticket, now: DateTime<Utc>) -> SlaSnapshot {
    SlaSnapshot {
        ticket_id: ticket.id.clone(),
        priority: ticket.priority,
        priority_label: ticket.priority.label().to_string(),
        sla_hours: ticket.sla_hours,
        created_at: ticket.created_at,
        sla_deadline: ticket.sla_deadline(),
        is_breached: ticket.is_breached(now),
        hours_remaining: round2(ticket.hours_remaining(now)),
    }
}

/// Scan tickets for SLA breaches.
///
/// Only active tickets count; resolved, closed and cancelled tickets never
/// appear here. Most overdue first, ties broken by ticket id so the order is
/// stable.
pub fn breached(tickets: &[Ticket], now: DateTime<Utc>) -> Vec<BreachedTicket> {
    let mut result: Vec<BreachedTicket> = tickets
        .iter()
        .filter(|ticket| ticket.status.is_active() && ticket.is_breached(now))
        .map(|ticket| BreachedTicket {
            ticket_id: ticket.id.clone(),
            title: ticket.title.clone(),
            priority_label: ticket.priority.label().to_string(),
            assignee: ticket.assignee.clone(),
            overdue_hours: round1(-ticket.hours_remaining(now)),
        })
        .collect();

    result.sort_by(|a, b| {
        b.overdue_hours
            .partial_cmp(&a.overdue_hours)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.ticket_id.cmp(&b.ticket_id))
    });
    result
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::TicketStatus;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone};

    fn ticket(id: &str, status: TicketStatus, created: DateTime<Utc>, sla_hours: i64) -> Ticket {
        Ticket {
            id: id.to_string(),
            title: format!("ticket {id}"),
            description: String::new(),
            requester: "user@example.com".to_string(),
            priority: Priority::High,
            status,
            assignee: None,
            sla_hours,
            created_at: created,
            updated_at: created,
            resolved_at: None,
            tags: Vec::new(),
        }
    }

    #[test]
    fn test_snapshot_backdated_ticket() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 14, 0, 0).unwrap();
        let created = now - Duration::hours(5);
        let t = ticket("t-1", TicketStatus::Open, created, 4);

        let snapshot = check(&t, now);
        assert!(snapshot.is_breached);
        assert_relative_eq!(snapshot.hours_remaining, -1.0);
        assert_eq!(snapshot.sla_deadline, created + Duration::hours(4));
        assert_eq!(snapshot.priority_label, "high");
    }

    #[test]
    fn test_snapshot_within_budget() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 14, 0, 0).unwrap();
        let t = ticket("t-1", TicketStatus::InProgress, now - Duration::hours(1), 24);

        let snapshot = check(&t, now);
        assert!(!snapshot.is_breached);
        assert_relative_eq!(snapshot.hours_remaining, 23.0);
    }

    #[test]
    fn test_breach_scan_skips_settled_tickets() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 14, 0, 0).unwrap();
        let old = now - Duration::hours(50);

        let mut resolved = ticket("t-resolved", TicketStatus::Resolved, old, 4);
        resolved.resolved_at = Some(now - Duration::hours(1));
        let closed = ticket("t-closed", TicketStatus::Closed, old, 4);
        let cancelled = ticket("t-cancelled", TicketStatus::Cancelled, old, 4);
        let open = ticket("t-open", TicketStatus::Open, old, 4);

        let hits = breached(&[resolved, closed, cancelled, open], now);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].ticket_id, "t-open");
        assert_relative_eq!(hits[0].overdue_hours, 46.0);
    }

    #[test]
    fn test_breach_scan_sorts_most_overdue_first() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 14, 0, 0).unwrap();
        let a = ticket("a", TicketStatus::Open, now - Duration::hours(10), 4);
        let b = ticket("b", TicketStatus::Open, now - Duration::hours(30), 4);
        let c = ticket("c", TicketStatus::Open, now - Duration::hours(10), 4);

        let hits = breached(&[a, b, c], now);
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].ticket_id, "b");
        // Equal overdue magnitude: id tie-break keeps the order deterministic.
        assert_eq!(hits[1].ticket_id, "a");
        assert_eq!(hits[2].ticket_id, "c");
    }

    #[test]
    fn test_breach_scan_empty_when_all_within_budget() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 14, 0, 0).unwrap();
        let a = ticket("a", TicketStatus::Open, now - Duration::hours(1), 24);
        assert!(breached(&[a], now).is_empty());
    }
}
