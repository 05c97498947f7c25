// libs/booking-cell/src/models.rs
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use shared_chat::BotReply;

// ==============================================================================
// CONVERSATION STATE
// ==============================================================================

/// Where one conversation currently is in the booking dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStep {
    Start,
    AwaitingIdentity,
    AwaitingSpecialty,
    AwaitingPractitioner,
    AwaitingDate,
    AwaitingTime,
    AwaitingNote,
}

impl fmt::Display for BookingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingStep::Start => write!(f, "start"),
            BookingStep::AwaitingIdentity => write!(f, "awaiting_identity"),
            BookingStep::AwaitingSpecialty => write!(f, "awaiting_specialty"),
            BookingStep::AwaitingPractitioner => write!(f, "awaiting_practitioner"),
            BookingStep::AwaitingDate => write!(f, "awaiting_date"),
            BookingStep::AwaitingTime => write!(f, "awaiting_time"),
            BookingStep::AwaitingNote => write!(f, "awaiting_note"),
        }
    }
}

/// In-memory state of one booking dialog. One per active conversation,
/// mutated exactly once per inbound message, never persisted.
#[derive(Debug, Clone)]
pub struct BookingSession {
    pub step: BookingStep,
    pub patient_id: Option<Uuid>,
    pub specialty: Option<String>,
    pub practitioner_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveDateTime>,
}

impl BookingSession {
    pub fn new() -> Self {
        Self {
            step: BookingStep::Start,
            patient_id: None,
            specialty: None,
            practitioner_id: None,
            date: None,
            start_time: None,
        }
    }
}

impl Default for BookingSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of feeding one inbound message to the state machine.
#[derive(Debug)]
pub struct StepOutcome {
    pub replies: Vec<BotReply>,
    /// True once the flow committed a visit; the caller must drop the session.
    pub done: bool,
}

impl StepOutcome {
    pub fn reply(reply: BotReply) -> Self {
        Self {
            replies: vec![reply],
            done: false,
        }
    }

    pub fn finished(reply: BotReply) -> Self {
        Self {
            replies: vec![reply],
            done: true,
        }
    }
}

// ==============================================================================
// VISITS
// ==============================================================================

/// A booked visit as stored. `end_time` and the notified flag are written
/// by external processes; booking only creates rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visit {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub practitioner_id: Uuid,
    pub start_time: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
    pub note: Option<String>,
    pub notified: bool,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("session at step {step} is missing {field}")]
    MissingSessionField {
        step: BookingStep,
        field: &'static str,
    },

    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),
}
