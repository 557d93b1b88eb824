//! Small helpers shared across modules.

use chrono::Local;

/// Timestamp layout used in file and backup names, e.g. `18-10-26_14-03-59`.
pub const STAMP_FORMAT: &str = "%d-%m-%y_%H-%M-%S";

pub fn now_standard() -> String {
    Local::now().format(STAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    #[test]
    fn stamps_parse_back() {
        let stamp = now_standard();
        assert_eq!(stamp.len(), 17);
        assert!(NaiveDateTime::parse_from_str(&stamp, STAMP_FORMAT).is_ok());
    }
}
