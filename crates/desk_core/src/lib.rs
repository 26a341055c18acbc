//! Desk Core - Helpdesk ticket tracking engine.
//!
//! Ticket lifecycle state machine, SLA deadline tracking, keyword-based
//! priority classification, and activity reporting over a SQLite store.
//! Synchronous, single-process; callers own any notification or billing
//! integration on top.

pub mod classify;
pub mod clock;
pub mod config;
pub mod error;
pub mod helpdesk;
pub mod lifecycle;
pub mod report;
pub mod sla;
pub mod store;
pub mod ticket;

pub use classify::{Classification, PriorityClassifier};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ClassifierConfig, DeskConfig, SlaConfig};
pub use error::{DeskError, Result};
pub use helpdesk::Helpdesk;
pub use lifecycle::TicketStatus;
pub use report::{ActivityReport, PriorityCounts};
pub use sla::{BreachedTicket, SlaSnapshot};
pub use store::{QueueFilter, SlaEvent, TicketStore};
pub use ticket::{Comment, NewComment, NewTicket, Priority, Ticket};
