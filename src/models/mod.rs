pub mod record;
pub mod user;
pub mod validation;
pub mod vital_sign;

pub use record::{HealthRecord, HealthRecordRow, HealthRecordUpdate, NewHealthRecord, RecordDraft};
pub use user::{User, UserRow};
pub use vital_sign::{NewVitalSign, TimeOfDay, VitalSign, VitalSignDraft, VitalSignRow, VitalSignUpdate};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Convert a stored Unix timestamp in milliseconds back to a UTC datetime
pub fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

/// Deserialize a field so that "absent" and "explicit null" are distinguishable.
///
/// Use with `#[serde(default, deserialize_with = "nullable")]`:
/// missing → `None`, `null` → `Some(None)`, value → `Some(Some(v))`.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Drop notes that are empty once trimmed
pub(crate) fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes.filter(|n| !n.trim().is_empty())
}
