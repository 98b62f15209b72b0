//! Tests for core_kernel error types

use core_kernel::error::CoreError;
use core_kernel::PortError;

#[test]
fn test_unknown_value_message_names_the_kind() {
    let error = CoreError::unknown_value("payment method", "BITCOIN");

    assert_eq!(error.to_string(), "Invalid payment method: BITCOIN");
    assert!(matches!(
        error,
        CoreError::UnknownValue { kind: "payment method", ref value } if value == "BITCOIN"
    ));
}

#[test]
fn test_port_error_helpers() {
    assert!(PortError::not_found("Receipt", "RCT-1").is_not_found());
    assert!(PortError::conflict("stale").is_conflict());
    assert!(!PortError::internal("boom").is_conflict());
    assert!(PortError::validation("bad").to_string().contains("bad"));
}
