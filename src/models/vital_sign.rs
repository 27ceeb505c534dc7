use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::validation::{parse_time_of_day, resolve_datetime, validate_measurements};
use crate::models::{millis_to_datetime, normalize_notes, nullable};

/// Part of the day a vital sign was taken in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub const ALL: [TimeOfDay; 4] = [
        TimeOfDay::Morning,
        TimeOfDay::Afternoon,
        TimeOfDay::Evening,
        TimeOfDay::Night,
    ];

    /// Parse the wire name; matching is exact and case-sensitive
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "morning" => Some(TimeOfDay::Morning),
            "afternoon" => Some(TimeOfDay::Afternoon),
            "evening" => Some(TimeOfDay::Evening),
            "night" => Some(TimeOfDay::Night),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
            TimeOfDay::Night => "night",
        }
    }
}

/// Vital sign stored in redb
/// Timestamps are Unix milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalSignRow {
    pub record_id: u64,
    pub timestamp: i64,
    pub time_of_day: TimeOfDay,
    pub heart_rate: Option<i32>,
    pub blood_pressure_systolic: Option<i32>,
    pub blood_pressure_diastolic: Option<i32>,
    pub temperature: Option<f64>,
    pub oxygen_saturation: Option<i32>,
    pub notes: Option<String>,
    pub created_at: i64,
}

/// Vital sign as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalSign {
    pub id: u64,
    pub record_id: u64,
    pub timestamp: DateTime<Utc>,
    pub time_of_day: TimeOfDay,
    pub heart_rate: Option<i32>,
    pub blood_pressure_systolic: Option<i32>,
    pub blood_pressure_diastolic: Option<i32>,
    pub temperature: Option<f64>,
    pub oxygen_saturation: Option<i32>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl VitalSign {
    pub fn from_row(id: u64, record: VitalSignRow) -> Self {
        Self {
            id,
            record_id: record.record_id,
            timestamp: millis_to_datetime(record.timestamp),
            time_of_day: record.time_of_day,
            heart_rate: record.heart_rate,
            blood_pressure_systolic: record.blood_pressure_systolic,
            blood_pressure_diastolic: record.blood_pressure_diastolic,
            temperature: record.temperature,
            oxygen_saturation: record.oxygen_saturation,
            notes: record.notes,
            created_at: millis_to_datetime(record.created_at),
        }
    }
}

/// Request body for a new vital sign, either standalone or nested in a record
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVitalSign {
    pub timestamp: Option<String>,
    pub time_of_day: Option<String>,
    pub heart_rate: Option<i32>,
    pub blood_pressure_systolic: Option<i32>,
    pub blood_pressure_diastolic: Option<i32>,
    pub temperature: Option<f64>,
    pub oxygen_saturation: Option<i32>,
    pub notes: Option<String>,
}

/// A validated vital sign not yet attached to a record
#[derive(Debug, Clone, PartialEq)]
pub struct VitalSignDraft {
    timestamp: i64,
    time_of_day: TimeOfDay,
    heart_rate: Option<i32>,
    blood_pressure_systolic: Option<i32>,
    blood_pressure_diastolic: Option<i32>,
    temperature: Option<f64>,
    oxygen_saturation: Option<i32>,
    notes: Option<String>,
}

impl NewVitalSign {
    pub fn validate(self, now: DateTime<Utc>) -> Result<VitalSignDraft> {
        let time_of_day = parse_time_of_day(self.time_of_day.as_deref())?;
        validate_measurements(
            self.heart_rate,
            self.blood_pressure_systolic,
            self.blood_pressure_diastolic,
            self.oxygen_saturation,
        )?;
        let timestamp = resolve_datetime(self.timestamp.as_deref(), "timestamp", now)?;

        Ok(VitalSignDraft {
            timestamp: timestamp.timestamp_millis(),
            time_of_day,
            heart_rate: self.heart_rate,
            blood_pressure_systolic: self.blood_pressure_systolic,
            blood_pressure_diastolic: self.blood_pressure_diastolic,
            temperature: self.temperature,
            oxygen_saturation: self.oxygen_saturation,
            notes: normalize_notes(self.notes),
        })
    }
}

impl VitalSignDraft {
    pub fn attach(self, record_id: u64, created_at: i64) -> VitalSignRow {
        VitalSignRow {
            record_id,
            timestamp: self.timestamp,
            time_of_day: self.time_of_day,
            heart_rate: self.heart_rate,
            blood_pressure_systolic: self.blood_pressure_systolic,
            blood_pressure_diastolic: self.blood_pressure_diastolic,
            temperature: self.temperature,
            oxygen_saturation: self.oxygen_saturation,
            notes: self.notes,
            created_at,
        }
    }
}

/// Partial update for a vital sign
///
/// Omitted fields keep their stored value; explicit `null` clears an optional field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalSignUpdate {
    pub timestamp: Option<String>,
    pub time_of_day: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub heart_rate: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub blood_pressure_systolic: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub blood_pressure_diastolic: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub temperature: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub oxygen_saturation: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
}

impl VitalSignUpdate {
    /// Merge into `current`, validating the merged result before returning it
    pub fn apply(self, current: &VitalSignRow, now: DateTime<Utc>) -> Result<VitalSignRow> {
        let mut merged = current.clone();

        if let Some(raw) = self.time_of_day.as_deref() {
            merged.time_of_day = parse_time_of_day(Some(raw))?;
        }
        if let Some(raw) = self.timestamp.as_deref() {
            merged.timestamp = resolve_datetime(Some(raw), "timestamp", now)?.timestamp_millis();
        }
        if let Some(v) = self.heart_rate {
            merged.heart_rate = v;
        }
        if let Some(v) = self.blood_pressure_systolic {
            merged.blood_pressure_systolic = v;
        }
        if let Some(v) = self.blood_pressure_diastolic {
            merged.blood_pressure_diastolic = v;
        }
        if let Some(v) = self.temperature {
            merged.temperature = v;
        }
        if let Some(v) = self.oxygen_saturation {
            merged.oxygen_saturation = v;
        }
        if let Some(v) = self.notes {
            merged.notes = normalize_notes(v);
        }

        validate_measurements(
            merged.heart_rate,
            merged.blood_pressure_systolic,
            merged.blood_pressure_diastolic,
            merged.oxygen_saturation,
        )?;

        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn stored() -> VitalSignRow {
        VitalSignRow {
            record_id: 1,
            timestamp: 1_760_000_000_000,
            time_of_day: TimeOfDay::Morning,
            heart_rate: Some(72),
            blood_pressure_systolic: Some(120),
            blood_pressure_diastolic: Some(80),
            temperature: Some(36.6),
            oxygen_saturation: Some(98),
            notes: Some("resting".to_string()),
            created_at: 1_760_000_000_000,
        }
    }

    #[test]
    fn test_time_of_day_wire_names() {
        for tod in TimeOfDay::ALL {
            assert_eq!(TimeOfDay::parse(tod.as_str()), Some(tod));
            let json = serde_json::to_string(&tod).unwrap();
            assert_eq!(json, format!("\"{}\"", tod.as_str()));
        }
    }

    #[test]
    fn test_new_vital_sign_requires_time_of_day() {
        let input = NewVitalSign {
            heart_rate: Some(70),
            ..Default::default()
        };
        assert!(matches!(
            input.validate(Utc::now()),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_new_vital_sign_rejects_out_of_range() {
        let input = NewVitalSign {
            time_of_day: Some("evening".to_string()),
            heart_rate: Some(20),
            ..Default::default()
        };
        assert!(input.validate(Utc::now()).is_err());
    }

    #[test]
    fn test_draft_attach_keeps_fields() {
        let now = Utc::now();
        let input = NewVitalSign {
            time_of_day: Some("night".to_string()),
            heart_rate: Some(58),
            notes: Some("   ".to_string()),
            ..Default::default()
        };
        let record = input.validate(now).unwrap().attach(9, 5);
        assert_eq!(record.record_id, 9);
        assert_eq!(record.created_at, 5);
        assert_eq!(record.time_of_day, TimeOfDay::Night);
        assert_eq!(record.heart_rate, Some(58));
        assert_eq!(record.timestamp, now.timestamp_millis());
        assert_eq!(record.notes, None);
    }

    #[test]
    fn test_update_omitted_fields_unchanged() {
        let update: VitalSignUpdate = serde_json::from_str(r#"{"heartRate": 75}"#).unwrap();
        let merged = update.apply(&stored(), Utc::now()).unwrap();
        assert_eq!(merged.heart_rate, Some(75));
        assert_eq!(merged.blood_pressure_systolic, Some(120));
        assert_eq!(merged.notes.as_deref(), Some("resting"));
        assert_eq!(merged.time_of_day, TimeOfDay::Morning);
    }

    #[test]
    fn test_update_explicit_null_clears() {
        let update: VitalSignUpdate =
            serde_json::from_str(r#"{"temperature": null, "notes": null}"#).unwrap();
        let merged = update.apply(&stored(), Utc::now()).unwrap();
        assert_eq!(merged.temperature, None);
        assert_eq!(merged.notes, None);
        assert_eq!(merged.heart_rate, Some(72));
    }

    #[test]
    fn test_update_validates_merged_values() {
        let update: VitalSignUpdate =
            serde_json::from_str(r#"{"bloodPressureDiastolic": 140}"#).unwrap();
        assert!(update.apply(&stored(), Utc::now()).is_err());

        let update: VitalSignUpdate = serde_json::from_str(r#"{"timeOfDay": "noon"}"#).unwrap();
        assert!(update.apply(&stored(), Utc::now()).is_err());
    }
}
