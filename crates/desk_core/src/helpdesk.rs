//! Helpdesk service facade.
//!
//! Composes the ticket store, the desk configuration, and a clock into the
//! public operation set: ticket creation, assignment, lifecycle transitions,
//! escalation, SLA checks, comments, queue filtering, and activity reports.

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::classify::PriorityClassifier;
use crate::clock::{Clock, SystemClock};
use crate::config::DeskConfig;
use crate::error::{DeskError, Result};
use crate::lifecycle::{self, TicketStatus};
use crate::report::ActivityReport;
use crate::sla::{self, BreachedTicket, SlaSnapshot};
use crate::store::{QueueFilter, SlaEvent, TicketStore};
use crate::ticket::{Comment, NewComment, NewTicket, Priority, Ticket};

/// Author recorded on comments the desk writes itself.
const SYSTEM_AUTHOR: &str = "system";

/// The helpdesk service.
pub struct Helpdesk {
    store: TicketStore,
    config: DeskConfig,
    classifier: PriorityClassifier,
    clock: Arc<dyn Clock>,
}

impl Helpdesk {
    /// Desk over a store with the system clock.
    pub fn new(store: TicketStore, config: DeskConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    /// Desk with an injected clock (tests, replays).
    pub fn with_clock(store: TicketStore, config: DeskConfig, clock: Arc<dyn Clock>) -> Self {
        let classifier = PriorityClassifier::new(config.classifier.clone(), config.sla.clone());
        Self {
            store,
            config,
            classifier,
            clock,
        }
    }

    // ── tickets ──────────────────────────────────────────────────────────

    /// Create a ticket.
    ///
    /// Priority falls back to the classifier over title + description, SLA
    /// hours to the priority's configured budget. An explicit non-positive
    /// SLA budget is rejected.
    pub fn create_ticket(&self, new: NewTicket) -> Result<Ticket> {
        if let Some(hours) = new.sla_hours {
            if hours <= 0 {
                return Err(DeskError::InvalidArgument(format!(
                    "sla_hours must be positive, got {hours}"
                )));
            }
        }

        let (priority, default_hours) = match new.priority {
            Some(priority) => (priority, self.config.sla.hours_for(priority)),
            None => {
                let text = format!("{} {}", new.title, new.description);
                let classified = self.classifier.classify(&text);
                (classified.priority, classified.sla_hours)
            }
        };
        let sla_hours = new.sla_hours.unwrap_or(default_hours);

        let now = self.clock.now();
        let created_at = new.created_at.unwrap_or(now);
        let ticket = Ticket {
            id: Uuid::new_v4().to_string(),
            title: new.title,
            description: new.description,
            requester: new.requester,
            priority,
            status: TicketStatus::Open,
            assignee: new.assignee,
            sla_hours,
            created_at,
            updated_at: created_at,
            resolved_at: None,
            tags: new.tags,
        };

        self.store.insert(&ticket)?;
        self.store
            .log_sla_event(&ticket.id, "created", Some(sla_hours), false, now)?;
        info!(
            "created ticket {} priority={} sla={}h",
            ticket.id, ticket.priority, ticket.sla_hours
        );
        Ok(ticket)
    }

    /// Fetch a ticket by id.
    pub fn get_ticket(&self, id: &str) -> Result<Ticket> {
        self.store.get(id)
    }

    /// Assign a ticket to an agent.
    ///
    /// An open ticket moves to in_progress through the normal transition
    /// check; other statuses keep their state and just change hands.
    pub fn assign_ticket(&self, id: &str, assignee: &str) -> Result<Ticket> {
        let now = self.clock.now();
        let assignee = assignee.to_string();
        let updated = self.store.update_with(id, |ticket| {
            if ticket.status == TicketStatus::Open {
                if !lifecycle::can_transition(ticket.status, TicketStatus::InProgress) {
                    return Err(DeskError::InvalidTransition {
                        from: ticket.status,
                        to: TicketStatus::InProgress,
                    });
                }
                ticket.status = TicketStatus::InProgress;
            }
            ticket.assignee = Some(assignee);
            ticket.updated_at = now;
            Ok(())
        })?;
        info!("assigned ticket {} to {:?}", id, updated.assignee);
        Ok(updated)
    }

    /// Move a ticket through the status lifecycle.
    ///
    /// Rejected transitions leave the ticket untouched. Entering resolved
    /// stamps `resolved_at` once. A note becomes an internal comment by
    /// `author`.
    pub fn update_status(
        &self,
        id: &str,
        new_status: TicketStatus,
        author: &str,
        note: Option<&str>,
    ) -> Result<Ticket> {
        let now = self.clock.now();
        let mut was_breached = false;
        let updated = self.store.update_with(id, |ticket| {
            if !lifecycle::can_transition(ticket.status, new_status) {
                return Err(DeskError::InvalidTransition {
                    from: ticket.status,
                    to: new_status,
                });
            }
            was_breached = ticket.is_breached(now);
            ticket.status = new_status;
            ticket.updated_at = now;
            if new_status == TicketStatus::Resolved && ticket.resolved_at.is_none() {
                ticket.resolved_at = Some(now);
            }
            Ok(())
        })?;

        self.store.log_sla_event(
            id,
            &format!("status:{new_status}"),
            Some(updated.sla_hours),
            was_breached,
            now,
        )?;
        if let Some(note) = note {
            self.write_internal_comment(id, author, note)?;
        }
        info!("ticket {} moved to {}", id, new_status);
        Ok(updated)
    }

    /// Bump a ticket one priority step and reset its SLA budget.
    ///
    /// An already-critical ticket keeps its priority but still gets the
    /// budget recomputed and the escalation recorded.
    pub fn escalate(&self, id: &str, reason: &str) -> Result<Ticket> {
        let now = self.clock.now();
        let sla_config = self.config.sla.clone();
        let updated = self.store.update_with(id, |ticket| {
            ticket.priority = ticket.priority.escalated();
            ticket.sla_hours = sla_config.hours_for(ticket.priority);
            ticket.updated_at = now;
            Ok(())
        })?;

        self.store
            .log_sla_event(id, "escalated", Some(updated.sla_hours), false, now)?;
        let body = if reason.is_empty() {
            "Escalated".to_string()
        } else {
            format!("Escalated: {reason}")
        };
        self.write_internal_comment(id, SYSTEM_AUTHOR, &body)?;
        info!(
            "escalated ticket {} to priority={} sla={}h",
            id, updated.priority, updated.sla_hours
        );
        Ok(updated)
    }

    // ── SLA ──────────────────────────────────────────────────────────────

    /// SLA snapshot for one ticket at the current instant.
    pub fn check_sla_breach(&self, id: &str) -> Result<SlaSnapshot> {
        let ticket = self.store.get(id)?;
        Ok(sla::check(&ticket, self.clock.now()))
    }

    /// All active tickets past their deadline, most overdue first.
    pub fn get_breached_tickets(&self) -> Result<Vec<BreachedTicket>> {
        let active = self.store.active_tickets()?;
        let breached = sla::breached(&active, self.clock.now());
        if !breached.is_empty() {
            warn!("{} ticket(s) past SLA deadline", breached.len());
        }
        Ok(breached)
    }

    /// Infer (priority, sla_hours) from free text.
    pub fn auto_priority(&self, text: &str) -> (Priority, i64) {
        let classified = self.classifier.classify(text);
        (classified.priority, classified.sla_hours)
    }

    /// SLA audit trail for a ticket.
    pub fn sla_history(&self, id: &str) -> Result<Vec<SlaEvent>> {
        self.store.sla_history(id)
    }

    // ── comments ─────────────────────────────────────────────────────────

    /// Attach a comment to an existing ticket. Comment activity advances the
    /// ticket's updated_at.
    pub fn add_comment(&self, new: NewComment) -> Result<Comment> {
        // The referenced ticket must exist at creation time.
        self.store.get(&new.ticket_id)?;

        let now = self.clock.now();
        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            ticket_id: new.ticket_id,
            author: new.author,
            body: new.body,
            created_at: now,
            is_internal: new.is_internal,
        };
        self.store.insert_comment(&comment)?;
        self.store.touch(&comment.ticket_id, now)?;
        Ok(comment)
    }

    /// Comments for a ticket, oldest first.
    pub fn get_comments(&self, ticket_id: &str, include_internal: bool) -> Result<Vec<Comment>> {
        self.store.comments_for(ticket_id, include_internal)
    }

    fn write_internal_comment(&self, ticket_id: &str, author: &str, body: &str) -> Result<Comment> {
        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            ticket_id: ticket_id.to_string(),
            author: author.to_string(),
            body: body.to_string(),
            created_at: self.clock.now(),
            is_internal: true,
        };
        self.store.insert_comment(&comment)?;
        Ok(comment)
    }

    // ── queue & report ───────────────────────────────────────────────────

    /// Filtered, priority-sorted queue. An empty filter returns every
    /// ticket.
    pub fn get_queue(&self, filter: &QueueFilter) -> Result<Vec<Ticket>> {
        let tickets = self.store.scan(filter)?;
        debug!("queue scan matched {} ticket(s)", tickets.len());
        Ok(tickets)
    }

    /// Activity summary for the trailing `days` days.
    pub fn generate_report(&self, days: i64) -> Result<ActivityReport> {
        if days <= 0 {
            return Err(DeskError::InvalidArgument(format!(
                "report window must be positive, got {days} days"
            )));
        }

        let now = self.clock.now();
        let since = now - Duration::days(days);
        let opened = self.store.created_since(since)?;
        let resolved = self.store.resolved_since(since)?;
        let active = self.store.active_tickets()?;

        debug!(
            "report window {}d: {} opened, {} resolved, {} active",
            days,
            opened.len(),
            resolved.len(),
            active.len()
        );
        Ok(ActivityReport::build(now, days, &opened, &resolved, &active))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{DateTime, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    fn desk_at(now: DateTime<Utc>) -> (Helpdesk, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(now));
        let desk = Helpdesk::with_clock(
            TicketStore::open_in_memory().unwrap(),
            DeskConfig::default(),
            clock.clone(),
        );
        (desk, clock)
    }

    fn new_ticket(title: &str, description: &str) -> NewTicket {
        NewTicket {
            title: title.to_string(),
            description: description.to_string(),
            requester: "user@example.com".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_uses_classifier_when_priority_omitted() {
        let (desk, _) = desk_at(t0());
        let ticket = desk
            .create_ticket(new_ticket("Login broken", "production outage"))
            .unwrap();
        assert_eq!(ticket.priority, Priority::Critical);
        assert_eq!(ticket.sla_hours, 4);
        assert_eq!(ticket.status, TicketStatus::Open);
        assert_eq!(ticket.created_at, t0());
    }

    #[test]
    fn test_create_respects_explicit_priority_and_sla() {
        let (desk, _) = desk_at(t0());
        let ticket = desk
            .create_ticket(NewTicket {
                priority: Some(Priority::Low),
                sla_hours: Some(8),
                ..new_ticket("Question", "how do I export data")
            })
            .unwrap();
        assert_eq!(ticket.priority, Priority::Low);
        assert_eq!(ticket.sla_hours, 8);
    }

    #[test]
    fn test_create_rejects_non_positive_sla() {
        let (desk, _) = desk_at(t0());
        let result = desk.create_ticket(NewTicket {
            sla_hours: Some(0),
            ..new_ticket("t", "d")
        });
        assert!(matches!(result, Err(DeskError::InvalidArgument(_))));
    }

    #[test]
    fn test_create_logs_sla_event() {
        let (desk, _) = desk_at(t0());
        let ticket = desk.create_ticket(new_ticket("t", "bug")).unwrap();
        let events = desk.sla_history(&ticket.id).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, "created");
        assert_eq!(events[0].sla_hours, Some(72));
    }

    #[test]
    fn test_operations_on_missing_ticket_are_not_found() {
        let (desk, _) = desk_at(t0());
        assert!(matches!(
            desk.get_ticket("nope"),
            Err(DeskError::NotFound(_))
        ));
        assert!(matches!(
            desk.assign_ticket("nope", "agent1"),
            Err(DeskError::NotFound(_))
        ));
        assert!(matches!(
            desk.update_status("nope", TicketStatus::InProgress, "agent1", None),
            Err(DeskError::NotFound(_))
        ));
        assert!(matches!(
            desk.escalate("nope", "because"),
            Err(DeskError::NotFound(_))
        ));
        assert!(matches!(
            desk.check_sla_breach("nope"),
            Err(DeskError::NotFound(_))
        ));
        assert!(matches!(
            desk.add_comment(NewComment {
                ticket_id: "nope".to_string(),
                author: "agent1".to_string(),
                body: "hello".to_string(),
                is_internal: false,
            }),
            Err(DeskError::NotFound(_))
        ));
    }

    #[test]
    fn test_generate_report_rejects_non_positive_window() {
        let (desk, _) = desk_at(t0());
        assert!(matches!(
            desk.generate_report(0),
            Err(DeskError::InvalidArgument(_))
        ));
        assert!(matches!(
            desk.generate_report(-3),
            Err(DeskError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_auto_priority_pair() {
        let (desk, _) = desk_at(t0());
        assert_eq!(
            desk.auto_priority("production outage, all down"),
            (Priority::Critical, 4)
        );
        assert_eq!(
            desk.auto_priority("feature request for dark mode"),
            (Priority::Low, 168)
        );
        assert_eq!(desk.auto_priority("hello there"), (Priority::Medium, 72));
    }
}
