//! Activity report aggregation.
//!
//! Pure computation over ticket snapshots: the desk scans the store for the
//! window and hands the slices in here, so the whole report is testable on
//! fixed instants with hand-built tickets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ticket::{Priority, Ticket};

/// Opened/resolved counts for one priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityCounts {
    pub opened: u64,
    pub resolved: u64,
}

/// Activity summary for a trailing window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityReport {
    /// Window length in days
    pub window_days: i64,
    pub generated_at: DateTime<Utc>,
    /// Tickets created inside the window
    pub total_opened: u64,
    /// Tickets resolved inside the window
    pub total_resolved: u64,
    /// Mean creation-to-resolution hours over resolved-in-window tickets;
    /// None when nothing resolved in the window
    pub avg_resolution_hours: Option<f64>,
    /// Share of resolved-in-window tickets that blew their SLA, percent
    pub sla_breach_rate_pct: f64,
    /// Opened/resolved counts per priority label; all four labels present
    pub by_priority: BTreeMap<String, PriorityCounts>,
    /// Currently active tickets grouped by assignee ("unassigned" bucket for
    /// nobody); not window-scoped
    pub open_by_assignee: BTreeMap<String, u64>,
    /// Currently active ticket count; not window-scoped
    pub currently_open: u64,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

impl ActivityReport {
    /// Aggregate a report from window scans.
    ///
    /// `opened` = created in window, `resolved` = resolved in window,
    /// `active` = currently not resolved/closed/cancelled.
    pub fn build(
        now: DateTime<Utc>,
        window_days: i64,
        opened: &[Ticket],
        resolved: &[Ticket],
        active: &[Ticket],
    ) -> Self {
        let resolution_times: Vec<f64> =
            resolved.iter().filter_map(|t| t.resolution_hours()).collect();
        let avg_resolution_hours = if resolution_times.is_empty() {
            None
        } else {
            Some(round1(
                resolution_times.iter().sum::<f64>() / resolution_times.len() as f64,
            ))
        };

        // Breach rate over resolved-in-window tickets: resolved after the
        // deadline counts as a breach.
        let breached = resolved
            .iter()
            .filter(|t| {
                t.resolved_at
                    .map(|resolved_at| resolved_at > t.sla_deadline())
                    .unwrap_or(false)
            })
            .count();
        let sla_breach_rate_pct = if resolved.is_empty() {
            0.0
        } else {
            round1(breached as f64 / resolved.len() as f64 * 100.0)
        };

        let mut by_priority: BTreeMap<String, PriorityCounts> = BTreeMap::new();
        for priority in Priority::ALL {
            by_priority.insert(priority.label().to_string(), PriorityCounts::default());
        }
        for ticket in opened {
            if let Some(counts) = by_priority.get_mut(ticket.priority.label()) {
                counts.opened += 1;
            }
        }
        for ticket in resolved {
            if let Some(counts) = by_priority.get_mut(ticket.priority.label()) {
                counts.resolved += 1;
            }
        }

        let mut open_by_assignee: BTreeMap<String, u64> = BTreeMap::new();
        for ticket in active {
            let bucket = ticket
                .assignee
                .clone()
                .unwrap_or_else(|| "unassigned".to_string());
            *open_by_assignee.entry(bucket).or_insert(0) += 1;
        }

        Self {
            window_days,
            generated_at: now,
            total_opened: opened.len() as u64,
            total_resolved: resolved.len() as u64,
            avg_resolution_hours,
            sla_breach_rate_pct,
            by_priority,
            open_by_assignee,
            currently_open: active.len() as u64,
        }
    }
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

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 8, 12, 0, 0).unwrap()
    }

    fn ticket(id: &str, priority: Priority, created: DateTime<Utc>) -> Ticket {
        Ticket {
            id: id.to_string(),
            title: format!("ticket {id}"),
            description: String::new(),
            requester: "user@example.com".to_string(),
            priority,
            status: TicketStatus::Open,
            assignee: None,
            sla_hours: 24,
            created_at: created,
            updated_at: created,
            resolved_at: None,
            tags: Vec::new(),
        }
    }

    fn resolved_ticket(
        id: &str,
        priority: Priority,
        created: DateTime<Utc>,
        resolved_after: Duration,
    ) -> Ticket {
        let mut t = ticket(id, priority, created);
        t.status = TicketStatus::Resolved;
        t.resolved_at = Some(created + resolved_after);
        t.updated_at = created + resolved_after;
        t
    }

    #[test]
    fn test_empty_store_report() {
        let report = ActivityReport::build(now(), 7, &[], &[], &[]);
        assert_eq!(report.total_opened, 0);
        assert_eq!(report.total_resolved, 0);
        assert_eq!(report.avg_resolution_hours, None);
        assert_relative_eq!(report.sla_breach_rate_pct, 0.0);
        assert_eq!(report.currently_open, 0);
        // All four priority buckets are present even with no data.
        assert_eq!(report.by_priority.len(), 4);
        assert!(report.open_by_assignee.is_empty());
    }

    #[test]
    fn test_counts_and_avg_resolution() {
        let created = now() - Duration::days(2);
        let opened = vec![
            ticket("a", Priority::Critical, created),
            ticket("b", Priority::Medium, created),
        ];
        let resolved = vec![
            resolved_ticket("c", Priority::Medium, created, Duration::hours(10)),
            resolved_ticket("d", Priority::High, created, Duration::hours(20)),
        ];
        let active = opened.clone();

        let report = ActivityReport::build(now(), 7, &opened, &resolved, &active);
        assert_eq!(report.total_opened, 2);
        assert_eq!(report.total_resolved, 2);
        assert_relative_eq!(report.avg_resolution_hours.unwrap(), 15.0);
        assert_eq!(report.currently_open, 2);
    }

    #[test]
    fn test_breach_rate_over_resolved_tickets() {
        let created = now() - Duration::days(3);
        // sla_hours = 24: one resolves in 10h (fine), one in 30h (breach).
        let resolved = vec![
            resolved_ticket("ok", Priority::Medium, created, Duration::hours(10)),
            resolved_ticket("late", Priority::Medium, created, Duration::hours(30)),
        ];

        let report = ActivityReport::build(now(), 7, &[], &resolved, &[]);
        assert_relative_eq!(report.sla_breach_rate_pct, 50.0);
    }

    #[test]
    fn test_breach_rate_rounding() {
        let created = now() - Duration::days(3);
        let resolved = vec![
            resolved_ticket("a", Priority::Medium, created, Duration::hours(30)),
            resolved_ticket("b", Priority::Medium, created, Duration::hours(10)),
            resolved_ticket("c", Priority::Medium, created, Duration::hours(10)),
        ];

        let report = ActivityReport::build(now(), 7, &[], &resolved, &[]);
        // 1/3 breached -> 33.3 after one-decimal rounding.
        assert_relative_eq!(report.sla_breach_rate_pct, 33.3);
    }

    #[test]
    fn test_by_priority_breakdown() {
        let created = now() - Duration::days(1);
        let opened = vec![
            ticket("a", Priority::Critical, created),
            ticket("b", Priority::Critical, created),
            ticket("c", Priority::Low, created),
        ];
        let resolved = vec![resolved_ticket(
            "d",
            Priority::Critical,
            created,
            Duration::hours(2),
        )];

        let report = ActivityReport::build(now(), 7, &opened, &resolved, &[]);
        assert_eq!(
            report.by_priority["critical"],
            PriorityCounts {
                opened: 2,
                resolved: 1
            }
        );
        assert_eq!(report.by_priority["low"].opened, 1);
        assert_eq!(report.by_priority["high"], PriorityCounts::default());
        assert_eq!(report.by_priority["medium"], PriorityCounts::default());
    }

    #[test]
    fn test_open_by_assignee_buckets() {
        let created = now() - Duration::days(1);
        let mut a = ticket("a", Priority::Medium, created);
        a.assignee = Some("agent1".to_string());
        let mut b = ticket("b", Priority::Medium, created);
        b.assignee = Some("agent1".to_string());
        let c = ticket("c", Priority::Medium, created);

        let report = ActivityReport::build(now(), 7, &[], &[], &[a, b, c]);
        assert_eq!(report.open_by_assignee["agent1"], 2);
        assert_eq!(report.open_by_assignee["unassigned"], 1);
        assert_eq!(report.currently_open, 3);
    }

    #[test]
    fn test_report_serializes() {
        let report = ActivityReport::build(now(), 7, &[], &[], &[]);
        let json = serde_json::to_string(&report).unwrap();
        let parsed: ActivityReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.window_days, 7);
        assert_eq!(parsed.avg_resolution_hours, None);
    }
}
