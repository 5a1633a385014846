/// Order primary keys are PostgreSQL SERIAL/BIGSERIAL on the write path.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
