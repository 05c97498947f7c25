use std::collections::HashSet;

use anyhow::Result;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::BookedVisit;

/// Patients may book up to this many calendar days ahead.
pub const BOOKING_HORIZON_DAYS: i64 = 14;

const SLOT_MINUTES: i64 = 30;

fn opening() -> NaiveTime {
    NaiveTime::from_hms_opt(8, 0, 0).unwrap()
}

fn closing() -> NaiveTime {
    NaiveTime::from_hms_opt(18, 0, 0).unwrap()
}

fn lunch_start() -> NaiveTime {
    NaiveTime::from_hms_opt(13, 0, 0).unwrap()
}

fn lunch_end() -> NaiveTime {
    NaiveTime::from_hms_opt(14, 0, 0).unwrap()
}

/// The bookable dates offered to a patient: the 14 calendar days after
/// `today`, excluding Saturday and Sunday, in ascending order.
pub fn bookable_dates(today: NaiveDate) -> Vec<NaiveDate> {
    (1..=BOOKING_HORIZON_DAYS)
        .map(|offset| today + Duration::days(offset))
        .filter(|date| !matches!(date.weekday(), Weekday::Sat | Weekday::Sun))
        .collect()
}

/// The full half-hour slot grid for one working day: 08:00 inclusive to
/// 18:00 exclusive, skipping the 13:00-14:00 lunch window.
pub fn slot_grid() -> Vec<NaiveTime> {
    let mut slots = Vec::new();
    let mut time = opening();
    while time < closing() {
        if time < lunch_start() || time >= lunch_end() {
            slots.push(time);
        }
        time += Duration::minutes(SLOT_MINUTES);
    }
    slots
}

fn pg_timestamp(value: NaiveDateTime) -> String {
    value.format("%Y-%m-%dT%H:%M:%S").to_string()
}

pub struct AvailabilityService {
    supabase: SupabaseClient,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Free slots for a practitioner on one date: the slot grid minus the
    /// start times of visits already booked that day.
    pub async fn open_slots(
        &self,
        practitioner_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<NaiveTime>> {
        debug!("Fetching open slots for practitioner {} on {}", practitioner_id, date);

        let day_start = date.and_hms_opt(0, 0, 0).unwrap();
        let day_end = (date + Duration::days(1)).and_hms_opt(0, 0, 0).unwrap();

        let path = format!(
            "/rest/v1/visits?practitioner_id=eq.{}&start_time=gte.{}&start_time=lt.{}&select=start_time",
            practitioner_id,
            pg_timestamp(day_start),
            pg_timestamp(day_end),
        );
        let result: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;

        let booked: Vec<BookedVisit> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<_>, _>>()?;
        let booked_times: HashSet<NaiveTime> =
            booked.into_iter().map(|visit| visit.start_time.time()).collect();

        let slots = slot_grid()
            .into_iter()
            .filter(|slot| !booked_times.contains(slot))
            .collect();

        Ok(slots)
    }

    /// Authoritative point check: a slot is free iff no visit exists with
    /// this exact practitioner and start time. Not a range/overlap check;
    /// visits occupy a single grid cell.
    pub async fn is_slot_free(
        &self,
        practitioner_id: Uuid,
        start_time: NaiveDateTime,
    ) -> Result<bool> {
        debug!("Checking slot {} for practitioner {}", start_time, practitioner_id);

        let path = format!(
            "/rest/v1/visits?practitioner_id=eq.{}&start_time=eq.{}&select=id",
            practitioner_id,
            pg_timestamp(start_time),
        );
        let result: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;

        Ok(result.is_empty())
    }
}
