use redb::TableDefinition;

/// Users table: user_id -> UserRow (serialized)
pub const USERS: TableDefinition<u64, &[u8]> = TableDefinition::new("users");

/// Unique index: username -> user_id
pub const USERNAMES: TableDefinition<&str, u64> = TableDefinition::new("usernames");

/// Unique index: normalized email -> user_id
pub const EMAILS: TableDefinition<&str, u64> = TableDefinition::new("emails");

/// Id sequences: sequence name -> last issued id
pub const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

/// Health records table: record_id -> HealthRecordRow (serialized)
pub const HEALTH_RECORDS: TableDefinition<u64, &[u8]> = TableDefinition::new("health_records");

/// Vital signs table: vital_id -> VitalSignRow (serialized)
pub const VITAL_SIGNS: TableDefinition<u64, &[u8]> = TableDefinition::new("vital_signs");

/// User records index: user_id -> Vec<record_id>
/// Used for owner-scoped listing
pub const USER_RECORDS: TableDefinition<u64, &[u8]> = TableDefinition::new("user_records");

/// Record vitals index: record_id -> Vec<vital_id>
/// Used for cascade delete when a record is removed
pub const RECORD_VITALS: TableDefinition<u64, &[u8]> = TableDefinition::new("record_vitals");

/// Sequence names
pub const SEQ_USERS: &str = "users";
pub const SEQ_RECORDS: &str = "health_records";
pub const SEQ_VITALS: &str = "vital_signs";
