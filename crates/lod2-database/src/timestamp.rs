//! Conversion between `DateTime<Utc>` and the integer millisecond columns.

use chrono::{DateTime, Utc};

pub(crate) fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub(crate) fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millisecond_precision_survives() {
        let at = DateTime::from_timestamp_millis(1_717_171_717_123).unwrap();
        assert_eq!(from_millis(to_millis(at)), at);
    }
}
