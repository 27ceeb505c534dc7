//! Health record and vital sign persistence.
//!
//! Every operation on an existing record takes an [`Owned`] constraint; a
//! record that exists but belongs to another user is reported exactly like a
//! missing one ([`AppError::RecordNotFound`]).

use redb::{Database, ReadableTable, Table};
use std::cmp::Ordering;

use crate::db::{decode, encode, load_ids, next_id, tables, Bytes};
use crate::error::{AppError, Result};
use crate::models::{
    HealthRecord, HealthRecordRow, HealthRecordUpdate, RecordDraft, VitalSign, VitalSignDraft,
    VitalSignRow, VitalSignUpdate,
};

/// Ownership constraint: record `id` must belong to `user_id`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owned {
    pub id: u64,
    pub user_id: u64,
}

impl Owned {
    pub fn new(id: u64, user_id: u64) -> Self {
        Self { id, user_id }
    }
}

/// Field used to order the record list (always newest/largest first)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    Date,
    Weight,
    Steps,
    SleepHours,
    CreatedAt,
}

impl SortBy {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "date" => Some(SortBy::Date),
            "weight" => Some(SortBy::Weight),
            "steps" => Some(SortBy::Steps),
            "sleepHours" => Some(SortBy::SleepHours),
            "createdAt" => Some(SortBy::CreatedAt),
            _ => None,
        }
    }

    /// Descending order; absent values sort last, ties broken by newest id
    fn compare(&self, a: &(u64, HealthRecordRow), b: &(u64, HealthRecordRow)) -> Ordering {
        fn desc<T: PartialOrd>(a: Option<T>, b: Option<T>) -> Ordering {
            match (a, b) {
                (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        }

        let (ra, rb) = (&a.1, &b.1);
        let primary = match self {
            SortBy::Date => rb.date.cmp(&ra.date),
            SortBy::Weight => desc(ra.weight, rb.weight),
            SortBy::Steps => desc(ra.steps, rb.steps),
            SortBy::SleepHours => desc(ra.sleep_hours, rb.sleep_hours),
            SortBy::CreatedAt => rb.created_at.cmp(&ra.created_at),
        };
        primary.then_with(|| b.0.cmp(&a.0))
    }
}

fn load_owned<T: ReadableTable<u64, Bytes>>(records: &T, owned: Owned) -> Result<HealthRecordRow> {
    let row: HealthRecordRow = records
        .get(owned.id)?
        .map(|g| decode(g.value()))
        .transpose()?
        .ok_or(AppError::RecordNotFound)?;

    if row.user_id != owned.user_id {
        tracing::warn!(
            "User {} attempted to access record {} owned by another user",
            owned.user_id,
            owned.id
        );
        return Err(AppError::RecordNotFound);
    }
    Ok(row)
}

/// All vital signs of a record, ordered by timestamp then id
fn load_vital_signs<V, I>(vitals: &V, index: &I, record_id: u64) -> Result<Vec<VitalSign>>
where
    V: ReadableTable<u64, Bytes>,
    I: ReadableTable<u64, Bytes>,
{
    let mut out = Vec::new();
    for vital_id in load_ids(index, record_id)? {
        if let Some(guard) = vitals.get(vital_id)? {
            let row: VitalSignRow = decode(guard.value())?;
            out.push(VitalSign::from_row(vital_id, row));
        }
    }
    out.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
    Ok(out)
}

fn write_ids(table: &mut Table<u64, Bytes>, key: u64, ids: &[u64]) -> Result<()> {
    let bytes = encode(&ids)?;
    table.insert(key, bytes.as_slice())?;
    Ok(())
}

/// Create a record and all of its vital signs in one transaction
pub fn create_record(db: &Database, user_id: u64, draft: RecordDraft, now: i64) -> Result<HealthRecord> {
    let (row, vital_drafts) = draft.into_parts(user_id, now);

    let write_txn = db.begin_write()?;
    let record = {
        let record_id = next_id(&write_txn, tables::SEQ_RECORDS)?;

        let mut records = write_txn.open_table(tables::HEALTH_RECORDS)?;
        let bytes = encode(&row)?;
        records.insert(record_id, bytes.as_slice())?;
        drop(records);

        let mut user_records = write_txn.open_table(tables::USER_RECORDS)?;
        let mut ids = load_ids(&user_records, user_id)?;
        ids.push(record_id);
        write_ids(&mut user_records, user_id, &ids)?;
        drop(user_records);

        let mut vitals = write_txn.open_table(tables::VITAL_SIGNS)?;
        let mut vital_ids = Vec::with_capacity(vital_drafts.len());
        let mut vital_signs = Vec::with_capacity(vital_drafts.len());
        for draft in vital_drafts {
            let vital_id = next_id(&write_txn, tables::SEQ_VITALS)?;
            let vital = draft.attach(record_id, now);
            let bytes = encode(&vital)?;
            vitals.insert(vital_id, bytes.as_slice())?;
            vital_ids.push(vital_id);
            vital_signs.push(VitalSign::from_row(vital_id, vital));
        }
        drop(vitals);

        let mut record_vitals = write_txn.open_table(tables::RECORD_VITALS)?;
        write_ids(&mut record_vitals, record_id, &vital_ids)?;

        vital_signs.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        HealthRecord::from_row(record_id, row, vital_signs)
    };
    write_txn.commit()?;

    tracing::info!(
        "Record {} created for user {} with {} vital signs",
        record.id,
        user_id,
        record.vital_signs.len()
    );
    Ok(record)
}

/// Owner-scoped record list with vital signs, sorted and truncated to `limit`
pub fn list_records(db: &Database, user_id: u64, sort_by: SortBy, limit: usize) -> Result<Vec<HealthRecord>> {
    let read_txn = db.begin_read()?;
    let records = read_txn.open_table(tables::HEALTH_RECORDS)?;
    let user_records = read_txn.open_table(tables::USER_RECORDS)?;
    let vitals = read_txn.open_table(tables::VITAL_SIGNS)?;
    let record_vitals = read_txn.open_table(tables::RECORD_VITALS)?;

    let mut rows = Vec::new();
    for record_id in load_ids(&user_records, user_id)? {
        if let Some(guard) = records.get(record_id)? {
            let row: HealthRecordRow = decode(guard.value())?;
            rows.push((record_id, row));
        }
    }

    rows.sort_by(|a, b| sort_by.compare(a, b));
    rows.truncate(limit);

    rows.into_iter()
        .map(|(id, row)| {
            let vital_signs = load_vital_signs(&vitals, &record_vitals, id)?;
            Ok(HealthRecord::from_row(id, row, vital_signs))
        })
        .collect()
}

/// Every record the user owns, unordered; input for the statistics aggregator
pub fn all_records(db: &Database, user_id: u64) -> Result<Vec<HealthRecord>> {
    list_records(db, user_id, SortBy::Date, usize::MAX)
}

pub fn get_record(db: &Database, owned: Owned) -> Result<HealthRecord> {
    let read_txn = db.begin_read()?;
    let records = read_txn.open_table(tables::HEALTH_RECORDS)?;
    let row = load_owned(&records, owned)?;

    let vitals = read_txn.open_table(tables::VITAL_SIGNS)?;
    let record_vitals = read_txn.open_table(tables::RECORD_VITALS)?;
    let vital_signs = load_vital_signs(&vitals, &record_vitals, owned.id)?;

    Ok(HealthRecord::from_row(owned.id, row, vital_signs))
}

/// Merge `update` into an owned record; the merged values are validated before writing
pub fn update_record(
    db: &Database,
    owned: Owned,
    update: HealthRecordUpdate,
    now: i64,
) -> Result<HealthRecord> {
    let write_txn = db.begin_write()?;
    let record = {
        let mut records = write_txn.open_table(tables::HEALTH_RECORDS)?;
        let current = load_owned(&records, owned)?;
        let merged = update.apply(&current, now)?;

        let bytes = encode(&merged)?;
        records.insert(owned.id, bytes.as_slice())?;

        let vitals = write_txn.open_table(tables::VITAL_SIGNS)?;
        let record_vitals = write_txn.open_table(tables::RECORD_VITALS)?;
        let vital_signs = load_vital_signs(&vitals, &record_vitals, owned.id)?;

        HealthRecord::from_row(owned.id, merged, vital_signs)
    };
    write_txn.commit()?;

    tracing::info!("Record {} updated by user {}", owned.id, owned.user_id);
    Ok(record)
}

/// Delete an owned record together with all of its vital signs
pub fn delete_record(db: &Database, owned: Owned) -> Result<()> {
    let write_txn = db.begin_write()?;
    let removed_vitals = {
        let mut records = write_txn.open_table(tables::HEALTH_RECORDS)?;
        load_owned(&records, owned)?;

        // Cascade: vitals first, then their index, then the record itself
        let mut record_vitals = write_txn.open_table(tables::RECORD_VITALS)?;
        let vital_ids = load_ids(&record_vitals, owned.id)?;

        let mut vitals = write_txn.open_table(tables::VITAL_SIGNS)?;
        for vital_id in &vital_ids {
            vitals.remove(*vital_id)?;
        }
        drop(vitals);

        record_vitals.remove(owned.id)?;
        drop(record_vitals);

        records.remove(owned.id)?;
        drop(records);

        let mut user_records = write_txn.open_table(tables::USER_RECORDS)?;
        let mut ids = load_ids(&user_records, owned.user_id)?;
        ids.retain(|id| *id != owned.id);
        write_ids(&mut user_records, owned.user_id, &ids)?;

        vital_ids.len()
    };
    write_txn.commit()?;

    tracing::info!(
        "Record {} deleted by user {} ({} vital signs removed)",
        owned.id,
        owned.user_id,
        removed_vitals
    );
    Ok(())
}

/// Attach a validated vital sign to an owned record
pub fn add_vital_sign(db: &Database, owned: Owned, draft: VitalSignDraft, now: i64) -> Result<VitalSign> {
    let write_txn = db.begin_write()?;
    let vital_sign = {
        let records = write_txn.open_table(tables::HEALTH_RECORDS)?;
        load_owned(&records, owned)?;
        drop(records);

        let vital_id = next_id(&write_txn, tables::SEQ_VITALS)?;
        let vital = draft.attach(owned.id, now);

        let mut vitals = write_txn.open_table(tables::VITAL_SIGNS)?;
        let bytes = encode(&vital)?;
        vitals.insert(vital_id, bytes.as_slice())?;
        drop(vitals);

        let mut record_vitals = write_txn.open_table(tables::RECORD_VITALS)?;
        let mut ids = load_ids(&record_vitals, owned.id)?;
        ids.push(vital_id);
        write_ids(&mut record_vitals, owned.id, &ids)?;

        VitalSign::from_row(vital_id, vital)
    };
    write_txn.commit()?;

    tracing::info!("Vital sign {} added to record {}", vital_sign.id, owned.id);
    Ok(vital_sign)
}

/// Load a vital sign that must belong to the (already owner-checked) record
fn load_child_vital<T: ReadableTable<u64, Bytes>>(
    vitals: &T,
    record_id: u64,
    vital_id: u64,
) -> Result<VitalSignRow> {
    let row: VitalSignRow = vitals
        .get(vital_id)?
        .map(|g| decode(g.value()))
        .transpose()?
        .ok_or(AppError::VitalSignNotFound)?;

    if row.record_id != record_id {
        return Err(AppError::VitalSignNotFound);
    }
    Ok(row)
}

pub fn update_vital_sign(
    db: &Database,
    owned: Owned,
    vital_id: u64,
    update: VitalSignUpdate,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<VitalSign> {
    let write_txn = db.begin_write()?;
    let vital_sign = {
        let records = write_txn.open_table(tables::HEALTH_RECORDS)?;
        load_owned(&records, owned)?;
        drop(records);

        let mut vitals = write_txn.open_table(tables::VITAL_SIGNS)?;
        let current = load_child_vital(&vitals, owned.id, vital_id)?;
        let merged = update.apply(&current, now)?;

        let bytes = encode(&merged)?;
        vitals.insert(vital_id, bytes.as_slice())?;

        VitalSign::from_row(vital_id, merged)
    };
    write_txn.commit()?;

    tracing::info!("Vital sign {} on record {} updated", vital_id, owned.id);
    Ok(vital_sign)
}

pub fn delete_vital_sign(db: &Database, owned: Owned, vital_id: u64) -> Result<()> {
    let write_txn = db.begin_write()?;
    {
        let records = write_txn.open_table(tables::HEALTH_RECORDS)?;
        load_owned(&records, owned)?;
        drop(records);

        let mut vitals = write_txn.open_table(tables::VITAL_SIGNS)?;
        load_child_vital(&vitals, owned.id, vital_id)?;
        vitals.remove(vital_id)?;
        drop(vitals);

        let mut record_vitals = write_txn.open_table(tables::RECORD_VITALS)?;
        let mut ids = load_ids(&record_vitals, owned.id)?;
        ids.retain(|id| *id != vital_id);
        write_ids(&mut record_vitals, owned.id, &ids)?;
    }
    write_txn.commit()?;

    tracing::info!("Vital sign {} deleted from record {}", vital_id, owned.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::temp_db;
    use crate::models::{NewHealthRecord, NewVitalSign};
    use chrono::Utc;
    use redb::ReadableTableMetadata;

    fn vital(time_of_day: &str, heart_rate: i32) -> NewVitalSign {
        NewVitalSign {
            time_of_day: Some(time_of_day.to_string()),
            heart_rate: Some(heart_rate),
            ..Default::default()
        }
    }

    fn draft(weight: f64, vitals: Vec<NewVitalSign>) -> RecordDraft {
        NewHealthRecord {
            weight: Some(weight),
            vital_signs: Some(vitals),
            ..Default::default()
        }
        .validate(Utc::now())
        .unwrap()
    }

    fn vital_count(db: &Database) -> u64 {
        let txn = db.begin_read().unwrap();
        txn.open_table(tables::VITAL_SIGNS).unwrap().len().unwrap()
    }

    #[test]
    fn test_create_and_get_record_with_vitals() {
        let (_dir, db) = temp_db();
        let created = create_record(
            &db,
            1,
            draft(70.5, vec![vital("morning", 72), vital("evening", 80)]),
            0,
        )
        .unwrap();

        let fetched = get_record(&db, Owned::new(created.id, 1)).unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.vital_signs.len(), 2);
        assert!(fetched.vital_signs.iter().all(|v| v.record_id == created.id));
    }

    #[test]
    fn test_other_owner_sees_not_found() {
        let (_dir, db) = temp_db();
        let created = create_record(&db, 1, draft(70.0, vec![]), 0).unwrap();
        let foreign = Owned::new(created.id, 2);

        assert!(matches!(get_record(&db, foreign), Err(AppError::RecordNotFound)));
        assert!(matches!(
            update_record(&db, foreign, HealthRecordUpdate::default(), 1),
            Err(AppError::RecordNotFound)
        ));
        assert!(matches!(delete_record(&db, foreign), Err(AppError::RecordNotFound)));
        assert!(get_record(&db, Owned::new(created.id, 1)).is_ok());
    }

    #[test]
    fn test_delete_record_cascades_vitals() {
        let (_dir, db) = temp_db();
        let keep = create_record(&db, 1, draft(71.0, vec![vital("night", 60)]), 0).unwrap();
        let gone = create_record(
            &db,
            1,
            draft(70.0, vec![vital("morning", 72), vital("afternoon", 90)]),
            0,
        )
        .unwrap();
        assert_eq!(vital_count(&db), 3);

        delete_record(&db, Owned::new(gone.id, 1)).unwrap();

        assert_eq!(vital_count(&db), 1);
        assert!(get_record(&db, Owned::new(gone.id, 1)).is_err());
        let remaining = list_records(&db, 1, SortBy::Date, 10).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, keep.id);
    }

    #[test]
    fn test_list_is_owner_scoped_sorted_and_limited() {
        let (_dir, db) = temp_db();
        create_record(&db, 1, draft(80.0, vec![]), 0).unwrap();
        create_record(&db, 1, draft(60.0, vec![]), 0).unwrap();
        create_record(&db, 1, draft(70.0, vec![]), 0).unwrap();
        create_record(&db, 2, draft(99.0, vec![]), 0).unwrap();

        let by_weight = list_records(&db, 1, SortBy::Weight, 10).unwrap();
        let weights: Vec<_> = by_weight.iter().map(|r| r.weight.unwrap()).collect();
        assert_eq!(weights, vec![80.0, 70.0, 60.0]);

        let limited = list_records(&db, 1, SortBy::Weight, 2).unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn test_vital_sign_lifecycle() {
        let (_dir, db) = temp_db();
        let record = create_record(&db, 1, draft(70.0, vec![]), 0).unwrap();
        let owned = Owned::new(record.id, 1);

        let added = add_vital_sign(&db, owned, vital("morning", 65).validate(Utc::now()).unwrap(), 0)
            .unwrap();

        let update: VitalSignUpdate = serde_json::from_str(r#"{"heartRate": 75}"#).unwrap();
        let updated = update_vital_sign(&db, owned, added.id, update, Utc::now()).unwrap();
        assert_eq!(updated.heart_rate, Some(75));

        // Vital sign exists but belongs to a different record
        let other = create_record(&db, 1, draft(70.0, vec![]), 0).unwrap();
        assert!(matches!(
            delete_vital_sign(&db, Owned::new(other.id, 1), added.id),
            Err(AppError::VitalSignNotFound)
        ));

        delete_vital_sign(&db, owned, added.id).unwrap();
        assert!(get_record(&db, owned).unwrap().vital_signs.is_empty());
        assert_eq!(vital_count(&db), 0);
    }
}
