//! Pre-built Test Fixtures
//!
//! Ready-to-use, predictable test data for the billing workspace.

use chrono::{DateTime, TimeZone, Utc};
use core_kernel::{Currency, Money};
use domain_billing::{CustomerContact, Recorder};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use rust_decimal_macros::dec;

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// Standard invoice total used in the payment scenarios
    pub fn xof_100_000() -> Money {
        Money::new(dec!(100000), Currency::XOF)
    }

    /// Deposit paid against [`MoneyFixtures::xof_100_000`]
    pub fn xof_40_000() -> Money {
        Money::new(dec!(40000), Currency::XOF)
    }

    /// Balance left after the deposit
    pub fn xof_60_000() -> Money {
        Money::new(dec!(60000), Currency::XOF)
    }

    pub fn xof_zero() -> Money {
        Money::zero(Currency::XOF)
    }

    /// A EUR amount with cents
    pub fn eur_250() -> Money {
        Money::new(dec!(250.00), Currency::EUR)
    }
}

/// Fixture for timestamps
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// A fixed recording time (Mar 2, 2026)
    pub fn recorded_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 10, 15, 0).unwrap()
    }

    /// A payment date earlier than [`TemporalFixtures::recorded_at`]
    pub fn paid_last_week() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 23, 16, 40, 0).unwrap()
    }
}

/// Fixture for people and contacts
pub struct ContactFixtures;

impl ContactFixtures {
    /// A fixed customer with every contact field set
    pub fn customer() -> CustomerContact {
        CustomerContact {
            name: "Aminata Diallo".to_string(),
            email: Some("aminata.diallo@example.com".to_string()),
            phone: Some("+225 07 12 34 56 78".to_string()),
            address: Some("Cocody, Abidjan".to_string()),
        }
    }

    /// A randomly generated customer
    pub fn random_customer() -> CustomerContact {
        CustomerContact::named(Name().fake::<String>())
            .with_email(SafeEmail().fake::<String>())
            .with_phone(PhoneNumber().fake::<String>())
    }

    /// The manager recording payments in tests
    pub fn manager() -> Recorder {
        Recorder {
            user_id: "usr-manager-01".to_string(),
            name: "Ibrahim Ouattara".to_string(),
        }
    }
}

/// Fixture for common string values
pub struct StringFixtures;

impl StringFixtures {
    pub fn invoice_number() -> &'static str {
        "INV-2026-0001"
    }

    pub fn mobile_money_reference() -> &'static str {
        "OM-20260302-8841"
    }

    /// Secret shared by API tests to sign bearer tokens
    pub fn jwt_secret() -> &'static str {
        "test-secret-key-for-billing-api"
    }
}
