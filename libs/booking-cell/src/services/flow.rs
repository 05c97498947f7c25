use std::sync::Arc;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::{debug, info};

use doctor_cell::services::{AvailabilityService, DirectoryService, bookable_dates};
use patient_cell::services::{PatientService, is_valid_identity_number};
use shared_chat::{BotReply, ChatId};
use shared_config::AppConfig;

use crate::models::{BookingError, BookingSession, BookingStep, StepOutcome};
use crate::services::session::PatientChatIndex;
use crate::services::visits::VisitService;

/// Specialty and practitioner choices render two per row.
const LIST_COLUMNS: usize = 2;
/// Date and time choices render three per row.
const CALENDAR_COLUMNS: usize = 3;

const DATE_FORMAT: &str = "%d.%m.%Y";
const TIME_FORMAT: &str = "%H:%M";

const IDENTITY_PROMPT: &str = "Enter your personal identity number (format XXX-XXX-XXX XX):";
const NOTE_PROMPT: &str = "Enter a note for the booking (or send /skip to leave it empty):";
const NOTE_ABSENT: &str = "not specified";

/// The per-conversation booking dialog. Consumes one inbound message at a
/// time, validates it against live directory/availability data, mutates
/// the session and emits the next prompt.
pub struct BookingFlowService {
    patients: PatientService,
    directory: DirectoryService,
    availability: AvailabilityService,
    visits: VisitService,
    index: Arc<PatientChatIndex>,
}

impl BookingFlowService {
    pub fn new(config: &AppConfig, index: Arc<PatientChatIndex>) -> Self {
        Self {
            patients: PatientService::new(config),
            directory: DirectoryService::new(config),
            availability: AvailabilityService::new(config),
            visits: VisitService::new(config),
            index,
        }
    }

    /// Feeds one inbound message to the state machine. Validation failures
    /// and lookup misses re-prompt without changing the step; only errors
    /// from the store or transport propagate.
    pub async fn advance(
        &self,
        chat: ChatId,
        session: &mut BookingSession,
        text: &str,
    ) -> Result<StepOutcome, BookingError> {
        debug!("Chat {} at step {}: processing message", chat, session.step);

        match session.step {
            BookingStep::Start => self.on_start(session).await,
            BookingStep::AwaitingIdentity => self.on_identity(chat, session, text).await,
            BookingStep::AwaitingSpecialty => self.on_specialty(session, text).await,
            BookingStep::AwaitingPractitioner => self.on_practitioner(session, text).await,
            BookingStep::AwaitingDate => self.on_date(session, text).await,
            BookingStep::AwaitingTime => self.on_time(session, text).await,
            BookingStep::AwaitingNote => self.on_note(session, text).await,
        }
    }

    /// The first message of a conversation is consumed as a trigger, not
    /// as data.
    async fn on_start(&self, session: &mut BookingSession) -> Result<StepOutcome, BookingError> {
        session.step = BookingStep::AwaitingIdentity;
        Ok(StepOutcome::reply(BotReply::text(IDENTITY_PROMPT)))
    }

    async fn on_identity(
        &self,
        chat: ChatId,
        session: &mut BookingSession,
        text: &str,
    ) -> Result<StepOutcome, BookingError> {
        if !is_valid_identity_number(text) {
            return Ok(StepOutcome::reply(BotReply::text(
                "Invalid identity number format. Enter it as XXX-XXX-XXX XX:",
            )));
        }

        let Some(patient) = self.patients.find_by_identity_number(text).await? else {
            return Ok(StepOutcome::reply(BotReply::text(
                "No patient found with that identity number. Try again:",
            )));
        };

        session.patient_id = Some(patient.id);
        self.index.record(chat, patient.id);

        let specialties = self.directory.list_specialties().await?;
        session.step = BookingStep::AwaitingSpecialty;
        Ok(StepOutcome::reply(BotReply::with_choices(
            "Choose a practitioner specialty:",
            specialties,
            LIST_COLUMNS,
        )))
    }

    async fn on_specialty(
        &self,
        session: &mut BookingSession,
        text: &str,
    ) -> Result<StepOutcome, BookingError> {
        // Re-fetched at match time; the list shown earlier is not trusted.
        let specialties = self.directory.list_specialties().await?;
        if !specialties.iter().any(|s| s == text) {
            return Ok(StepOutcome::reply(BotReply::with_choices(
                "Please choose a specialty from the list:",
                specialties,
                LIST_COLUMNS,
            )));
        }

        session.specialty = Some(text.to_string());

        let practitioners = self.directory.list_by_specialty(text).await?;
        let names: Vec<String> = practitioners.into_iter().map(|p| p.full_name).collect();
        session.step = BookingStep::AwaitingPractitioner;
        Ok(StepOutcome::reply(BotReply::with_choices(
            "Choose a practitioner:",
            names,
            LIST_COLUMNS,
        )))
    }

    async fn on_practitioner(
        &self,
        session: &mut BookingSession,
        text: &str,
    ) -> Result<StepOutcome, BookingError> {
        let specialty =
            session
                .specialty
                .clone()
                .ok_or(BookingError::MissingSessionField {
                    step: session.step,
                    field: "specialty",
                })?;

        let practitioners = self.directory.list_by_specialty(&specialty).await?;
        let Some(practitioner) = practitioners.iter().find(|p| p.full_name == text) else {
            let names: Vec<String> = practitioners.into_iter().map(|p| p.full_name).collect();
            return Ok(StepOutcome::reply(BotReply::with_choices(
                "Please choose a practitioner from the list:",
                names,
                LIST_COLUMNS,
            )));
        };

        session.practitioner_id = Some(practitioner.id);
        session.step = BookingStep::AwaitingDate;
        Ok(StepOutcome::reply(date_prompt("Choose a date:")))
    }

    async fn on_date(
        &self,
        session: &mut BookingSession,
        text: &str,
    ) -> Result<StepOutcome, BookingError> {
        let Ok(date) = NaiveDate::parse_from_str(text, DATE_FORMAT) else {
            return Ok(StepOutcome::reply(BotReply::text(
                "Invalid date format. Enter the date as DD.MM.YYYY:",
            )));
        };

        // A well-formed date outside the offered window is rejected too,
        // so availability is only ever computed for listed dates.
        if !bookable_dates(Local::now().date_naive()).contains(&date) {
            return Ok(StepOutcome::reply(date_prompt(
                "Please choose a date from the list:",
            )));
        }

        let practitioner_id =
            session
                .practitioner_id
                .ok_or(BookingError::MissingSessionField {
                    step: session.step,
                    field: "practitioner_id",
                })?;

        session.date = Some(date);

        let slots = self.availability.open_slots(practitioner_id, date).await?;
        let times: Vec<String> = slots
            .into_iter()
            .map(|slot| slot.format(TIME_FORMAT).to_string())
            .collect();
        session.step = BookingStep::AwaitingTime;
        Ok(StepOutcome::reply(BotReply::with_choices(
            "Choose a time:",
            times,
            CALENDAR_COLUMNS,
        )))
    }

    async fn on_time(
        &self,
        session: &mut BookingSession,
        text: &str,
    ) -> Result<StepOutcome, BookingError> {
        let Ok(time) = NaiveTime::parse_from_str(text, TIME_FORMAT) else {
            return Ok(StepOutcome::reply(BotReply::text(
                "Invalid time format. Please choose a time from the list:",
            )));
        };

        let practitioner_id =
            session
                .practitioner_id
                .ok_or(BookingError::MissingSessionField {
                    step: session.step,
                    field: "practitioner_id",
                })?;
        let date = session.date.ok_or(BookingError::MissingSessionField {
            step: session.step,
            field: "date",
        })?;

        let candidate: NaiveDateTime = date.and_time(time);

        // Authoritative re-check, independent of the list shown earlier.
        // This is the only defense against two chats racing for one slot.
        if !self
            .availability
            .is_slot_free(practitioner_id, candidate)
            .await?
        {
            return Ok(StepOutcome::reply(BotReply::text(
                "That time is already taken. Please choose another time:",
            )));
        }

        session.start_time = Some(candidate);
        session.step = BookingStep::AwaitingNote;
        Ok(StepOutcome::reply(BotReply::text(NOTE_PROMPT)))
    }

    async fn on_note(
        &self,
        session: &mut BookingSession,
        text: &str,
    ) -> Result<StepOutcome, BookingError> {
        let patient_id = session.patient_id.ok_or(BookingError::MissingSessionField {
            step: session.step,
            field: "patient_id",
        })?;
        let practitioner_id =
            session
                .practitioner_id
                .ok_or(BookingError::MissingSessionField {
                    step: session.step,
                    field: "practitioner_id",
                })?;
        let start_time = session.start_time.ok_or(BookingError::MissingSessionField {
            step: session.step,
            field: "start_time",
        })?;

        let note = if text.eq_ignore_ascii_case("/skip") {
            None
        } else {
            Some(text.to_string())
        };

        let visit = self
            .visits
            .create_visit(patient_id, practitioner_id, start_time, note.as_deref())
            .await?;
        info!("Visit {} booked for patient {}", visit.id, patient_id);

        let confirmation = format!(
            "You are booked for {} at {}!\nNote: {}",
            start_time.format(DATE_FORMAT),
            start_time.format(TIME_FORMAT),
            note.as_deref().unwrap_or(NOTE_ABSENT),
        );
        Ok(StepOutcome::finished(BotReply::text(confirmation)))
    }
}

fn date_prompt(text: &str) -> BotReply {
    let dates: Vec<String> = bookable_dates(Local::now().date_naive())
        .into_iter()
        .map(|date| date.format(DATE_FORMAT).to_string())
        .collect();
    BotReply::with_choices(text, dates, CALENDAR_COLUMNS)
}
