//! Unit tests for error display, classification and conversions.

use anapad_errors::prelude::*;

mod bus_error_tests {
    use super::*;

    #[test]
    fn test_display_includes_slave_address() -> AnapadResult<()> {
        let err = BusError::transfer(0x2A, "remote I/O error");
        let msg = err.to_string();
        assert!(msg.contains("0x2a"), "message was {msg}");
        assert!(msg.contains("remote I/O error"));
        Ok(())
    }

    #[test]
    fn test_timeout_display() -> AnapadResult<()> {
        let err = BusError::timeout(0x2A, 0x00, 50);
        assert!(err.to_string().contains("50ms"));
        assert_eq!(err.slave(), Some(0x2A));
        Ok(())
    }

    #[test]
    fn test_retryable_classification() -> AnapadResult<()> {
        assert!(BusError::transfer(0x70, "nak").is_retryable());
        assert!(BusError::NotAcknowledged { slave: 0x5D }.is_retryable());
        assert!(BusError::timeout(0x2A, 0, 10).is_retryable());
        assert!(!BusError::open("/dev/i2c-1", "no such file").is_retryable());
        assert!(!BusError::Closed { bus: 1 }.is_retryable());
        assert!(AnapadError::from(BusError::transfer(0x70, "nak")).is_retryable());
        assert!(!AnapadError::NotRunning("haptics").is_retryable());
        Ok(())
    }

    #[test]
    fn test_open_error_has_no_slave() -> AnapadResult<()> {
        assert_eq!(BusError::open("/dev/i2c-3", "denied").slave(), None);
        Ok(())
    }
}

mod protocol_error_tests {
    use super::*;

    #[test]
    fn test_calibration_failure_display() -> AnapadResult<()> {
        let err = ProtocolError::CalibrationFailed {
            channel: 2,
            attempts: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("channel 2"));
        assert!(msg.contains("3 attempt"));
        assert_eq!(err.severity(), ErrorSeverity::Error);
        Ok(())
    }

    #[test]
    fn test_configuration_length_display() -> AnapadResult<()> {
        let err = ProtocolError::ConfigurationLength {
            expected: 184,
            actual: 12,
        };
        assert!(err.to_string().contains("184"));
        Ok(())
    }
}

mod configuration_error_tests {
    use super::*;

    #[test]
    fn test_always_critical() -> AnapadResult<()> {
        let errors = [
            ConfigurationError::InvalidBitRange { msb: 1, lsb: 4 },
            ConfigurationError::BitIndexOutOfRange { index: 8 },
            ConfigurationError::InvalidChannel(9),
            ConfigurationError::DuplicateReference("C3".to_string()),
            ConfigurationError::invalid("bus_index", "out of range"),
        ];
        for err in errors {
            assert_eq!(err.severity(), ErrorSeverity::Critical);
            assert!(!err.to_string().is_empty());
        }
        Ok(())
    }
}

mod anapad_error_tests {
    use super::*;

    #[test]
    fn test_from_conversions() -> AnapadResult<()> {
        let err: AnapadError = BusError::Closed { bus: 1 }.into();
        assert!(matches!(err, AnapadError::Bus(_)));

        let err: AnapadError = ConfigurationError::InvalidPortIndex(9).into();
        assert!(matches!(err, AnapadError::Configuration(_)));

        let err: AnapadError = std::io::Error::other("disk").into();
        assert!(matches!(err, AnapadError::Io(_)));
        Ok(())
    }

    #[test]
    fn test_severity_delegates() -> AnapadResult<()> {
        let err: AnapadError = BusError::timeout(0x5D, 0x814E, 5).into();
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert!(err.is_recoverable());

        let err: AnapadError = BusError::open("/dev/i2c-1", "gone").into();
        assert!(!err.is_recoverable());
        Ok(())
    }

    #[test]
    fn test_lifecycle_display() -> AnapadResult<()> {
        assert_eq!(
            AnapadError::NotRunning("load surface").to_string(),
            "load surface is not running"
        );
        let spawn = AnapadError::thread_spawn("touch-poll", std::io::Error::other("limit"));
        assert!(spawn.to_string().contains("touch-poll"));
        Ok(())
    }
}
