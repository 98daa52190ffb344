/// One week, in seconds.
pub const REAP_AGE_DEFAULT_SECS: i64 = 7 * 24 * 60 * 60;

pub const DEFAULT_BYPASS_TAG: &str = "do-not-delete";
