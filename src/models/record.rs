use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::validation::{resolve_datetime, validate_daily_metrics};
use crate::models::{millis_to_datetime, normalize_notes, nullable, NewVitalSign, VitalSign, VitalSignDraft};

/// Health record stored in redb
/// Timestamps are Unix milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthRecordRow {
    /// Owning user
    pub user_id: u64,
    pub date: i64,
    pub weight: Option<f64>,
    pub steps: Option<i32>,
    pub sleep_hours: Option<f64>,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Health record as returned by the API, with its vital signs
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthRecord {
    pub id: u64,
    pub user_id: u64,
    pub date: DateTime<Utc>,
    pub weight: Option<f64>,
    pub steps: Option<i32>,
    pub sleep_hours: Option<f64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub vital_signs: Vec<VitalSign>,
}

impl HealthRecord {
    pub fn from_row(id: u64, record: HealthRecordRow, vital_signs: Vec<VitalSign>) -> Self {
        Self {
            id,
            user_id: record.user_id,
            date: millis_to_datetime(record.date),
            weight: record.weight,
            steps: record.steps,
            sleep_hours: record.sleep_hours,
            notes: record.notes,
            created_at: millis_to_datetime(record.created_at),
            updated_at: millis_to_datetime(record.updated_at),
            vital_signs,
        }
    }
}

/// Request body for creating a record, optionally with nested vital signs
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHealthRecord {
    pub date: Option<String>,
    pub weight: Option<f64>,
    pub steps: Option<i32>,
    pub sleep_hours: Option<f64>,
    pub notes: Option<String>,
    pub vital_signs: Option<Vec<NewVitalSign>>,
}

/// A validated record and its vital signs, ready to be written in one transaction
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDraft {
    pub date: i64,
    pub weight: Option<f64>,
    pub steps: Option<i32>,
    pub sleep_hours: Option<f64>,
    pub notes: Option<String>,
    pub vital_signs: Vec<VitalSignDraft>,
}

impl NewHealthRecord {
    /// Validate the record and every nested vital sign.
    ///
    /// The first invalid field anywhere aborts the whole draft.
    pub fn validate(self, now: DateTime<Utc>) -> Result<RecordDraft> {
        validate_daily_metrics(self.weight, self.steps, self.sleep_hours)?;
        let date = resolve_datetime(self.date.as_deref(), "date", now)?;

        let vital_signs = self
            .vital_signs
            .unwrap_or_default()
            .into_iter()
            .map(|v| v.validate(now))
            .collect::<Result<Vec<_>>>()?;

        Ok(RecordDraft {
            date: date.timestamp_millis(),
            weight: self.weight,
            steps: self.steps,
            sleep_hours: self.sleep_hours,
            notes: normalize_notes(self.notes),
            vital_signs,
        })
    }
}

impl RecordDraft {
    /// Split into the stored record and its pending vital signs
    pub fn into_parts(self, user_id: u64, now: i64) -> (HealthRecordRow, Vec<VitalSignDraft>) {
        let record = HealthRecordRow {
            user_id,
            date: self.date,
            weight: self.weight,
            steps: self.steps,
            sleep_hours: self.sleep_hours,
            notes: self.notes,
            created_at: now,
            updated_at: now,
        };
        (record, self.vital_signs)
    }
}

/// Partial update for a record's daily metrics
///
/// Omitted fields keep their stored value; explicit `null` clears the field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthRecordUpdate {
    #[serde(default, deserialize_with = "nullable")]
    pub weight: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub steps: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub sleep_hours: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
}

impl HealthRecordUpdate {
    /// Merge into `current`, validating the merged result before returning it
    pub fn apply(self, current: &HealthRecordRow, now: i64) -> Result<HealthRecordRow> {
        let mut merged = current.clone();

        if let Some(v) = self.weight {
            merged.weight = v;
        }
        if let Some(v) = self.steps {
            merged.steps = v;
        }
        if let Some(v) = self.sleep_hours {
            merged.sleep_hours = v;
        }
        if let Some(v) = self.notes {
            merged.notes = normalize_notes(v);
        }

        validate_daily_metrics(merged.weight, merged.steps, merged.sleep_hours)?;
        merged.updated_at = now;

        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> HealthRecordRow {
        HealthRecordRow {
            user_id: 1,
            date: 0,
            weight: Some(70.5),
            steps: Some(8000),
            sleep_hours: Some(7.5),
            notes: None,
            created_at: 10,
            updated_at: 10,
        }
    }

    #[test]
    fn test_nested_invalid_vital_aborts_draft() {
        let input: NewHealthRecord = serde_json::from_str(
            r#"{
                "weight": 70.5,
                "vitalSigns": [
                    {"timeOfDay": "morning", "heartRate": 72},
                    {"timeOfDay": "evening", "heartRate": 20}
                ]
            }"#,
        )
        .unwrap();
        assert!(input.validate(Utc::now()).is_err());
    }

    #[test]
    fn test_draft_defaults_date_to_now() {
        let now = Utc::now();
        let draft = NewHealthRecord::default().validate(now).unwrap();
        assert_eq!(draft.date, now.timestamp_millis());
        assert!(draft.vital_signs.is_empty());
    }

    #[test]
    fn test_into_parts_sets_owner_and_timestamps() {
        let input = NewHealthRecord {
            steps: Some(1200),
            vital_signs: Some(vec![NewVitalSign {
                time_of_day: Some("afternoon".to_string()),
                ..Default::default()
            }]),
            ..Default::default()
        };
        let (record, vitals) = input.validate(Utc::now()).unwrap().into_parts(7, 99);
        assert_eq!(record.user_id, 7);
        assert_eq!(record.steps, Some(1200));
        assert_eq!(record.created_at, 99);
        assert_eq!(record.updated_at, 99);
        assert_eq!(vitals.len(), 1);
    }

    #[test]
    fn test_update_merges_and_touches_updated_at() {
        let update: HealthRecordUpdate = serde_json::from_str(r#"{"steps": 9000}"#).unwrap();
        let merged = update.apply(&stored(), 20).unwrap();
        assert_eq!(merged.steps, Some(9000));
        assert_eq!(merged.weight, Some(70.5));
        assert_eq!(merged.sleep_hours, Some(7.5));
        assert_eq!(merged.created_at, 10);
        assert_eq!(merged.updated_at, 20);
    }

    #[test]
    fn test_update_null_clears_and_invalid_rejected() {
        let update: HealthRecordUpdate = serde_json::from_str(r#"{"weight": null}"#).unwrap();
        assert_eq!(update.apply(&stored(), 20).unwrap().weight, None);

        let update: HealthRecordUpdate = serde_json::from_str(r#"{"sleepHours": 30}"#).unwrap();
        assert!(update.apply(&stored(), 20).is_err());
    }
}
