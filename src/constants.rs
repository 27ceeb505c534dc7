/// Session token lifetime (7 days)
pub const TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 6;

/// Default number of records returned by the list endpoint
pub const DEFAULT_LIST_LIMIT: usize = 30;

/// Upper bound on `limit` for the list endpoint
pub const MAX_LIST_LIMIT: usize = 1000;

// =============================================================================
// Measurement Ranges (inclusive)
// =============================================================================

pub const SLEEP_HOURS_RANGE: (f64, f64) = (0.0, 24.0);
pub const HEART_RATE_RANGE: (i32, i32) = (30, 250);
pub const SYSTOLIC_RANGE: (i32, i32) = (70, 200);
pub const DIASTOLIC_RANGE: (i32, i32) = (40, 130);
pub const OXYGEN_SATURATION_RANGE: (i32, i32) = (0, 100);

// =============================================================================
// Error Messages
// =============================================================================

pub const ERR_WEIGHT_NOT_POSITIVE: &str = "Weight must be positive";

pub const ERR_STEPS_NEGATIVE: &str = "Steps cannot be negative";

pub const ERR_SLEEP_HOURS_RANGE: &str = "Sleep hours must be between 0-24";

pub const ERR_HEART_RATE_RANGE: &str = "Heart rate must be between 30-250 bpm";

pub const ERR_SYSTOLIC_RANGE: &str = "Blood pressure systolic must be between 70-200";

pub const ERR_DIASTOLIC_RANGE: &str = "Blood pressure diastolic must be between 40-130";

pub const ERR_OXYGEN_SATURATION_RANGE: &str = "Oxygen saturation must be between 0-100";

pub const ERR_TIME_OF_DAY: &str = "timeOfDay must be: morning, afternoon, evening, or night";

pub const ERR_PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters";

pub const ERR_REGISTER_FIELDS_REQUIRED: &str = "All fields are required";

pub const ERR_LOGIN_FIELDS_REQUIRED: &str = "Email and password are required";
