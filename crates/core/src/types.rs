/// Opaque job identifier (caller-supplied or generated at submission).
pub type JobId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
