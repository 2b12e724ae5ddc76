use crate::schema::{agendamentos, usuarios};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use serde::Deserialize;

/// Formats with a UTC offset accepted for `data_hora`. A trailing `Z` is
/// rewritten to `+00:00` first.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M%:z",
];

/// Formats without an offset accepted for `data_hora`.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable)]
#[diesel(table_name = usuarios)]
pub struct User {
    pub id: i32,
    #[diesel(column_name = nome)]
    pub name: String,
    pub email: String,
    #[diesel(column_name = senha)]
    pub password: String,
}

/// Registration and edit form for a user. Also used as the insert and
/// update payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Insertable, AsChangeset)]
#[diesel(table_name = usuarios)]
pub struct NewUser {
    #[serde(rename = "nome")]
    #[diesel(column_name = nome)]
    pub name: String,
    pub email: String,
    #[serde(rename = "senha")]
    #[diesel(column_name = senha)]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable)]
#[diesel(table_name = agendamentos)]
pub struct Appointment {
    pub id: i32,
    #[diesel(column_name = titulo)]
    pub title: String,
    #[diesel(column_name = data_hora)]
    pub date_time: NaiveDateTime,
    /// Unset once the owning user has been deleted.
    #[diesel(column_name = usuario_id)]
    pub user_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Insertable, AsChangeset)]
#[diesel(table_name = agendamentos)]
pub struct NewAppointment {
    #[diesel(column_name = titulo)]
    pub title: String,
    #[diesel(column_name = data_hora)]
    pub date_time: NaiveDateTime,
    #[diesel(column_name = usuario_id)]
    pub user_id: i32,
}

/// Booking and edit form for an appointment, before `data_hora` is parsed.
#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentForm {
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "data_hora")]
    pub date_time: String,
    #[serde(rename = "usuario_id")]
    pub user_id: i32,
}

impl AppointmentForm {
    /// Returns the form unchanged as `Err` when `data_hora` is not a valid
    /// ISO-8601 date or date-time.
    pub fn into_new_appointment(self) -> Result<NewAppointment, Self> {
        match parse_date_time(&self.date_time) {
            Some(date_time) => Ok(NewAppointment {
                title: self.title,
                date_time,
                user_id: self.user_id,
            }),
            None => Err(self),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    pub email: String,
    #[serde(rename = "senha")]
    pub password: String,
}

/// Parses an ISO-8601 date or date-time. Offsets are normalised to UTC and
/// dropped; a bare date means midnight and a bare hour means minute zero.
pub fn parse_date_time(input: &str) -> Option<NaiveDateTime> {
    let input = match input.strip_suffix('Z') {
        Some(local) => format!("{local}+00:00"),
        None => input.to_owned(),
    };

    OFFSET_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(&input, format).ok())
        .map(|date_time| date_time.naive_utc())
        .or_else(|| {
            NAIVE_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(&input, format).ok())
        })
        .or_else(|| {
            // chrono needs minutes, so `2025-03-14T09` is read as `09:00`.
            let with_minutes = format!("{input}:00");
            ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
                .iter()
                .filter(|_| !input.contains(':'))
                .find_map(|format| NaiveDateTime::parse_from_str(&with_minutes, format).ok())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(&input, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
