//! Property-based tests for error messages and ordering.

use anapad_errors::prelude::*;
use proptest::prelude::*;

proptest! {
    #[test]
    fn test_severity_ordering(a in 0u8..=3, b in 0u8..=3) {
        let to_severity = |v: u8| match v {
            0 => ErrorSeverity::Info,
            1 => ErrorSeverity::Warning,
            2 => ErrorSeverity::Error,
            _ => ErrorSeverity::Critical,
        };
        prop_assert_eq!(a.cmp(&b), to_severity(a).cmp(&to_severity(b)));
    }

    #[test]
    fn test_transfer_error_keeps_message(slave in 0u16..0x80, message in "[a-zA-Z ]{1,32}") {
        let err = BusError::transfer(slave, message.clone());
        prop_assert!(err.to_string().contains(&message));
        prop_assert_eq!(err.slave(), Some(slave));
    }

    #[test]
    fn test_bit_range_display_mentions_both_ends(msb in 0u8..8, lsb in 0u8..8) {
        let msg = ConfigurationError::InvalidBitRange { msb, lsb }.to_string();
        prop_assert!(msg.contains(&msb.to_string()));
        prop_assert!(msg.contains(&lsb.to_string()));
    }
}
