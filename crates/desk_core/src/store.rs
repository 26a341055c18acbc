//! SQLite-backed ticket store.
//!
//! Durable storage for tickets, comments, and SLA events. Schema is applied
//! on open (idempotent), WAL mode keeps concurrent readers cheap, and every
//! ticket mutation goes through `update_with`, a read-modify-write wrapped in
//! a single transaction so two writers on the same ticket cannot interleave
//! into a half-applied state.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row, ToSql};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

use crate::error::{DeskError, Result};
use crate::lifecycle::TicketStatus;
use crate::ticket::{Comment, Priority, Ticket};

const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS tickets (
    id          TEXT PRIMARY KEY,
    title       TEXT NOT NULL,
    description TEXT NOT NULL,
    requester   TEXT NOT NULL,
    priority    INTEGER NOT NULL DEFAULT 3,
    status      TEXT NOT NULL DEFAULT 'open',
    assignee    TEXT,
    sla_hours   INTEGER NOT NULL DEFAULT 72,
    tags        TEXT NOT NULL DEFAULT '[]',
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    resolved_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_tickets_status   ON tickets(status);
CREATE INDEX IF NOT EXISTS idx_tickets_assignee ON tickets(assignee);
CREATE INDEX IF NOT EXISTS idx_tickets_priority ON tickets(priority);
CREATE INDEX IF NOT EXISTS idx_tickets_created  ON tickets(created_at);

CREATE TABLE IF NOT EXISTS comments (
    id          TEXT PRIMARY KEY,
    ticket_id   TEXT NOT NULL REFERENCES tickets(id),
    author      TEXT NOT NULL,
    body        TEXT NOT NULL,
    is_internal INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_comments_ticket ON comments(ticket_id);

CREATE TABLE IF NOT EXISTS sla_events (
    id           TEXT PRIMARY KEY,
    ticket_id    TEXT NOT NULL REFERENCES tickets(id),
    event        TEXT NOT NULL,
    occurred_at  TEXT NOT NULL,
    sla_hours    INTEGER,
    was_breached INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_sla_events_ticket ON sla_events(ticket_id);
"#;

const TICKET_COLUMNS: &str =
    "id, title, description, requester, priority, status, assignee, sla_hours, \
     tags, created_at, updated_at, resolved_at";

/// Filter for queue scans. Empty filter matches every ticket.
#[derive(Debug, Clone, Default)]
pub struct QueueFilter {
    pub assignee: Option<String>,
    pub status: Option<TicketStatus>,
    pub priority: Option<Priority>,
}

/// One entry in a ticket's SLA audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlaEvent {
    pub id: String,
    pub ticket_id: String,
    /// "created", "status:<to>", "escalated"
    pub event: String,
    pub occurred_at: DateTime<Utc>,
    pub sla_hours: Option<i64>,
    /// Whether the ticket was past its deadline when the event happened
    pub was_breached: bool,
}

/// SQLite-backed store for tickets, comments, and SLA events.
pub struct TicketStore {
    conn: Connection,
}

impl TicketStore {
    /// Open or create the database at a path.
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(DDL)?;
        Ok(Self { conn })
    }

    // ── tickets ──────────────────────────────────────────────────────────

    /// Insert a new ticket.
    pub fn insert(&self, ticket: &Ticket) -> Result<()> {
        self.conn.execute(
            "INSERT INTO tickets (id, title, description, requester, priority, status, \
             assignee, sla_hours, tags, created_at, updated_at, resolved_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                ticket.id,
                ticket.title,
                ticket.description,
                ticket.requester,
                ticket.priority.level(),
                ticket.status.to_string(),
                ticket.assignee,
                ticket.sla_hours,
                serde_json::to_string(&ticket.tags)?,
                ticket.created_at,
                ticket.updated_at,
                ticket.resolved_at,
            ],
        )?;
        Ok(())
    }

    /// Fetch a ticket by id.
    pub fn get(&self, id: &str) -> Result<Ticket> {
        Self::fetch(&self.conn, id)?.ok_or_else(|| DeskError::NotFound(id.to_string()))
    }

    fn fetch(conn: &Connection, id: &str) -> Result<Option<Ticket>> {
        let result = conn.query_row(
            &format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = ?1"),
            params![id],
            row_to_ticket,
        );
        match result {
            Ok(ticket) => Ok(Some(ticket)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Atomic read-modify-write on one ticket.
    ///
    /// The select, the mutator, and the write-back run inside one
    /// transaction; a mutator error rolls the whole thing back, so a failed
    /// mutation leaves the stored row untouched. `id` and `created_at` are
    /// never written back.
    pub fn update_with<F>(&self, id: &str, mutate: F) -> Result<Ticket>
    where
        F: FnOnce(&mut Ticket) -> Result<()>,
    {
        let tx = self.conn.unchecked_transaction()?;
        let mut ticket =
            Self::fetch(&tx, id)?.ok_or_else(|| DeskError::NotFound(id.to_string()))?;
        mutate(&mut ticket)?;
        tx.execute(
            "UPDATE tickets SET title = ?2, description = ?3, requester = ?4, \
             priority = ?5, status = ?6, assignee = ?7, sla_hours = ?8, tags = ?9, \
             updated_at = ?10, resolved_at = ?11 WHERE id = ?1",
            params![
                ticket.id,
                ticket.title,
                ticket.description,
                ticket.requester,
                ticket.priority.level(),
                ticket.status.to_string(),
                ticket.assignee,
                ticket.sla_hours,
                serde_json::to_string(&ticket.tags)?,
                ticket.updated_at,
                ticket.resolved_at,
            ],
        )?;
        tx.commit()?;
        Ok(ticket)
    }

    /// Advance a ticket's updated_at (comment activity).
    pub fn touch(&self, id: &str, now: DateTime<Utc>) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE tickets SET updated_at = ?2 WHERE id = ?1",
            params![id, now],
        )?;
        if changed == 0 {
            return Err(DeskError::NotFound(id.to_string()));
        }
        Ok(())
    }

    /// Filtered, ordered scan: most severe priority first, oldest first
    /// within a priority, id as the final tie-break.
    pub fn scan(&self, filter: &QueueFilter) -> Result<Vec<Ticket>> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(assignee) = &filter.assignee {
            clauses.push("assignee = ?");
            values.push(Box::new(assignee.clone()));
        }
        if let Some(status) = filter.status {
            clauses.push("status = ?");
            values.push(Box::new(status.to_string()));
        }
        if let Some(priority) = filter.priority {
            clauses.push("priority = ?");
            values.push(Box::new(priority.level()));
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {} ", clauses.join(" AND "))
        };
        let sql = format!(
            "SELECT {TICKET_COLUMNS} FROM tickets {where_clause}\
             ORDER BY priority ASC, created_at ASC, id ASC"
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            rusqlite::params_from_iter(values.iter().map(|v| v.as_ref())),
            row_to_ticket,
        )?;

        let mut tickets = Vec::new();
        for row in rows {
            tickets.push(row?);
        }
        Ok(tickets)
    }

    /// Tickets created at or after `since`, oldest first.
    pub fn created_since(&self, since: DateTime<Utc>) -> Result<Vec<Ticket>> {
        self.query_tickets(
            &format!(
                "SELECT {TICKET_COLUMNS} FROM tickets WHERE created_at >= ?1 \
                 ORDER BY created_at ASC, id ASC"
            ),
            params![since],
        )
    }

    /// Tickets resolved at or after `since`, oldest resolution first.
    pub fn resolved_since(&self, since: DateTime<Utc>) -> Result<Vec<Ticket>> {
        self.query_tickets(
            &format!(
                "SELECT {TICKET_COLUMNS} FROM tickets \
                 WHERE resolved_at IS NOT NULL AND resolved_at >= ?1 \
                 ORDER BY resolved_at ASC, id ASC"
            ),
            params![since],
        )
    }

    /// Tickets still being worked (not resolved/closed/cancelled).
    pub fn active_tickets(&self) -> Result<Vec<Ticket>> {
        self.query_tickets(
            &format!(
                "SELECT {TICKET_COLUMNS} FROM tickets \
                 WHERE status NOT IN ('resolved', 'closed', 'cancelled') \
                 ORDER BY priority ASC, created_at ASC, id ASC"
            ),
            [],
        )
    }

    fn query_tickets<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<Ticket>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, row_to_ticket)?;
        let mut tickets = Vec::new();
        for row in rows {
            tickets.push(row?);
        }
        Ok(tickets)
    }

    // ── comments ─────────────────────────────────────────────────────────

    /// Insert a comment. The caller is responsible for the ticket existing.
    pub fn insert_comment(&self, comment: &Comment) -> Result<()> {
        self.conn.execute(
            "INSERT INTO comments (id, ticket_id, author, body, is_internal, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                comment.id,
                comment.ticket_id,
                comment.author,
                comment.body,
                comment.is_internal as i64,
                comment.created_at,
            ],
        )?;
        Ok(())
    }

    /// Comments for a ticket, oldest first. `include_internal = false` hides
    /// internal notes.
    pub fn comments_for(&self, ticket_id: &str, include_internal: bool) -> Result<Vec<Comment>> {
        let sql = if include_internal {
            "SELECT id, ticket_id, author, body, is_internal, created_at \
             FROM comments WHERE ticket_id = ?1 ORDER BY created_at ASC, id ASC"
        } else {
            "SELECT id, ticket_id, author, body, is_internal, created_at \
             FROM comments WHERE ticket_id = ?1 AND is_internal = 0 \
             ORDER BY created_at ASC, id ASC"
        };
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params![ticket_id], row_to_comment)?;
        let mut comments = Vec::new();
        for row in rows {
            comments.push(row?);
        }
        Ok(comments)
    }

    // ── SLA audit trail ──────────────────────────────────────────────────

    /// Append an SLA event for a ticket.
    pub fn log_sla_event(
        &self,
        ticket_id: &str,
        event: &str,
        sla_hours: Option<i64>,
        was_breached: bool,
        occurred_at: DateTime<Utc>,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO sla_events (id, ticket_id, event, occurred_at, sla_hours, was_breached) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                Uuid::new_v4().to_string(),
                ticket_id,
                event,
                occurred_at,
                sla_hours,
                was_breached as i64,
            ],
        )?;
        Ok(())
    }

    /// SLA events for a ticket in order of occurrence.
    pub fn sla_history(&self, ticket_id: &str) -> Result<Vec<SlaEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, ticket_id, event, occurred_at, sla_hours, was_breached \
             FROM sla_events WHERE ticket_id = ?1 ORDER BY occurred_at ASC, id ASC",
        )?;
        let rows = stmt.query_map(params![ticket_id], |row| {
            Ok(SlaEvent {
                id: row.get(0)?,
                ticket_id: row.get(1)?,
                event: row.get(2)?,
                occurred_at: row.get(3)?,
                sla_hours: row.get(4)?,
                was_breached: row.get::<_, i64>(5)? != 0,
            })
        })?;
        let mut events = Vec::new();
        for row in rows {
            events.push(row?);
        }
        Ok(events)
    }
}

fn row_to_ticket(row: &Row<'_>) -> rusqlite::Result<Ticket> {
    let tags_json: String = row.get(8)?;
    Ok(Ticket {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        requester: row.get(3)?,
        priority: Priority::from_level(row.get(4)?).unwrap_or_default(),
        status: TicketStatus::parse(&row.get::<_, String>(5)?).unwrap_or_default(),
        assignee: row.get(6)?,
        sla_hours: row.get(7)?,
        tags: serde_json::from_str(&tags_json).unwrap_or_default(),
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
        resolved_at: row.get(11)?,
    })
}

fn row_to_comment(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        ticket_id: row.get(1)?,
        author: row.get(2)?,
        body: row.get(3)?,
        is_internal: row.get::<_, i64>(4)? != 0,
        created_at: row.get(5)?,
    })
}

// ============================================================================
// Tests
// ============================================================================
