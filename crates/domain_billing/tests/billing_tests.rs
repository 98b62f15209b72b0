//! Integration tests for domain_billing

use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{Currency, Money};

use domain_billing::invoice::{CustomerContact, Invoice, InvoiceStatus};
use domain_billing::ledger::{PaymentLedger, PaymentSummary};
use domain_billing::payment::{NewPayment, PaymentMethod, PaymentType, Recorder};
use domain_billing::receipt::ReceiptNumber;
use domain_billing::{BillingError, InvoiceLedgerPort, MockInvoiceLedgerPort, PaymentLedgerService};

fn customer() -> CustomerContact {
    CustomerContact::named("Atelier Kente SARL")
        .with_email("compta@kente.ci")
        .with_phone("+225 01 02 03 04")
}

fn invoice_for(total: Decimal, status: InvoiceStatus) -> Invoice {
    Invoice::new("INV-2026-0317", customer(), Money::new(total, Currency::XOF)).with_status(status)
}

fn request(amount: Decimal, method: PaymentMethod) -> NewPayment {
    NewPayment {
        amount,
        method,
        requested_type: None,
        reference: None,
        notes: None,
        paid_at: None,
        recorded_by: Recorder {
            user_id: "usr-42".to_string(),
            name: "Koffi".to_string(),
        },
    }
}

/// Applies a sequence of payments with the pure ledger rules
fn pay_all(invoice: &mut Invoice, amounts: &[Decimal]) -> Vec<PaymentType> {
    let mut types = Vec::new();
    for (prior, amount) in amounts.iter().enumerate() {
        let plan = PaymentLedger::plan_payment(
            invoice,
            prior as u64,
            request(*amount, PaymentMethod::Cash),
            Utc::now(),
        )
        .unwrap();
        invoice.apply_update(&plan.invoice);
        types.push(plan.payment.payment_type);
    }
    types
}

// ============================================================================
// Payment Recording Tests
// ============================================================================

mod recording_tests {
    use super::*;

    #[test]
    fn test_first_partial_payment_is_deposit() {
        let invoice = invoice_for(dec!(100000), InvoiceStatus::Sent);
        let plan = PaymentLedger::plan_payment(
            &invoice,
            0,
            request(dec!(40000), PaymentMethod::OrangeMoney),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(plan.payment.payment_type, PaymentType::Deposit);
        assert_eq!(plan.invoice.status, InvoiceStatus::Partial);
        assert_eq!(plan.invoice.amount_paid.amount(), dec!(40000));
        assert_eq!(plan.invoice.expected_version, 0);
        assert!(plan.invoice.paid_date.is_none());
        assert!(!plan.is_fully_paid);
        assert!(plan.overpayment.is_none());
    }

    #[test]
    fn test_settling_payment_is_final_even_if_deposit_requested() {
        let invoice = invoice_for(dec!(25000), InvoiceStatus::Sent);
        let mut req = request(dec!(25000), PaymentMethod::Wave);
        req.requested_type = Some(PaymentType::Deposit);

        let plan = PaymentLedger::plan_payment(&invoice, 0, req, Utc::now()).unwrap();
        assert_eq!(plan.payment.payment_type, PaymentType::Final);
        assert_eq!(plan.invoice.status, InvoiceStatus::Paid);
        assert!(plan.invoice.paid_date.is_some());
    }

    #[test]
    fn test_requested_type_kept_when_not_settling() {
        let invoice = invoice_for(dec!(25000), InvoiceStatus::Sent);
        let mut req = request(dec!(5000), PaymentMethod::BankTransfer);
        req.requested_type = Some(PaymentType::Installment);

        let plan = PaymentLedger::plan_payment(&invoice, 0, req, Utc::now()).unwrap();
        assert_eq!(plan.payment.payment_type, PaymentType::Installment);
    }

    #[test]
    fn test_payment_on_draft_and_overdue_invoices() {
        for status in [InvoiceStatus::Draft, InvoiceStatus::Overdue, InvoiceStatus::Partial] {
            let invoice = invoice_for(dec!(10000), status);
            let plan = PaymentLedger::plan_payment(
                &invoice,
                0,
                request(dec!(1000), PaymentMethod::Cash),
                Utc::now(),
            )
            .unwrap();
            assert_eq!(plan.invoice.status, InvoiceStatus::Partial);
        }
    }

    #[test]
    fn test_closed_invoices_reject_payments() {
        for status in [InvoiceStatus::Paid, InvoiceStatus::Cancelled, InvoiceStatus::Refunded] {
            let invoice = invoice_for(dec!(10000), status);
            let result = PaymentLedger::plan_payment(
                &invoice,
                0,
                request(dec!(1000), PaymentMethod::Cash),
                Utc::now(),
            );
            match result {
                Err(BillingError::InvoiceNotPayable { status: got, .. }) => assert_eq!(got, status),
                other => panic!("expected InvoiceNotPayable, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_negative_amount_rejected() {
        let invoice = invoice_for(dec!(10000), InvoiceStatus::Sent);
        let result = PaymentLedger::plan_payment(
            &invoice,
            0,
            request(dec!(-5), PaymentMethod::Cash),
            Utc::now(),
        );
        assert!(matches!(result, Err(BillingError::InvalidAmount(_))));
    }

    #[test]
    fn test_explicit_paid_at_flows_to_receipt() {
        let invoice = invoice_for(dec!(10000), InvoiceStatus::Sent);
        let paid_at = Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap();
        let mut req = request(dec!(1000), PaymentMethod::Check);
        req.paid_at = Some(paid_at);
        req.reference = Some("CHQ-0091".to_string());

        let plan = PaymentLedger::plan_payment(&invoice, 0, req, Utc::now()).unwrap();
        assert_eq!(plan.payment.paid_at, paid_at);
        assert_eq!(plan.receipt.payment_date, paid_at);
        assert_eq!(plan.payment.reference.as_deref(), Some("CHQ-0091"));
        assert_eq!(plan.receipt.payment_method, PaymentMethod::Check);
        assert_eq!(plan.receipt.customer_email.as_deref(), Some("compta@kente.ci"));
    }

    #[test]
    fn test_amount_uses_invoice_currency() {
        let invoice = Invoice::new("INV-EU-1", customer(), Money::new(dec!(200.00), Currency::EUR))
            .with_status(InvoiceStatus::Sent);
        let plan = PaymentLedger::plan_payment(
            &invoice,
            0,
            request(dec!(50.25), PaymentMethod::Card),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(plan.payment.amount.currency(), Currency::EUR);
        assert_eq!(plan.invoice.amount_paid.amount(), dec!(50.25));
    }
}

// ============================================================================
// Payment Reversal Tests
// ============================================================================

mod reversal_tests {
    use super::*;

    #[test]
    fn test_reversing_only_payment_returns_invoice_to_sent() {
        let mut invoice = invoice_for(dec!(50000), InvoiceStatus::Sent);
        let plan = PaymentLedger::plan_payment(
            &invoice,
            0,
            request(dec!(20000), PaymentMethod::MtnMobileMoney),
            Utc::now(),
        )
        .unwrap();
        invoice.apply_update(&plan.invoice);
        assert_eq!(invoice.status, InvoiceStatus::Partial);

        let reversal = PaymentLedger::plan_reversal(&invoice, plan.payment, Utc::now()).unwrap();
        assert_eq!(reversal.invoice.status, InvoiceStatus::Sent);
        assert!(reversal.invoice.amount_paid.is_zero());
        assert_eq!(reversal.invoice.expected_version, 1);
    }

    #[test]
    fn test_reversing_final_payment_clears_paid_date() {
        let mut invoice = invoice_for(dec!(50000), InvoiceStatus::Sent);
        pay_all(&mut invoice, &[dec!(20000)]);
        let plan = PaymentLedger::plan_payment(
            &invoice,
            1,
            request(dec!(30000), PaymentMethod::Cash),
            Utc::now(),
        )
        .unwrap();
        invoice.apply_update(&plan.invoice);
        assert_eq!(invoice.status, InvoiceStatus::Paid);
        assert!(invoice.paid_date.is_some());

        let reversal = PaymentLedger::plan_reversal(&invoice, plan.payment, Utc::now()).unwrap();
        invoice.apply_update(&reversal.invoice);
        assert_eq!(invoice.status, InvoiceStatus::Partial);
        assert!(invoice.paid_date.is_none());
        assert_eq!(invoice.amount_paid.amount(), dec!(20000));
    }

    #[test]
    fn test_amount_paid_never_goes_negative() {
        let mut invoice = invoice_for(dec!(50000), InvoiceStatus::Sent);
        let plan = PaymentLedger::plan_payment(
            &invoice,
            0,
            request(dec!(20000), PaymentMethod::Cash),
            Utc::now(),
        )
        .unwrap();
        // Drifted paid amount lower than the payment being removed
        invoice.amount_paid = Money::new(dec!(5000), Currency::XOF);

        let reversal = PaymentLedger::plan_reversal(&invoice, plan.payment, Utc::now()).unwrap();
        assert!(reversal.invoice.amount_paid.is_zero());
        assert_eq!(reversal.invoice.status, InvoiceStatus::Sent);
    }

    #[test]
    fn test_cancelled_invoice_status_is_recomputed_on_reversal() {
        let mut invoice = invoice_for(dec!(50000), InvoiceStatus::Sent);
        let plan = PaymentLedger::plan_payment(
            &invoice,
            0,
            request(dec!(10000), PaymentMethod::Cash),
            Utc::now(),
        )
        .unwrap();
        invoice.apply_update(&plan.invoice);
        invoice.status = InvoiceStatus::Cancelled;

        let reversal = PaymentLedger::plan_reversal(&invoice, plan.payment, Utc::now()).unwrap();
        assert_eq!(reversal.invoice.status, InvoiceStatus::Sent);
    }
}

// ============================================================================
// Receipt Tests
// ============================================================================

mod receipt_tests {
    use super::*;

    #[test]
    fn test_receipt_number_format() {
        let number = ReceiptNumber::from_sequence(2026, 42);
        assert_eq!(number.as_str(), "REC-2026-000042");
        assert_eq!(number.sequence(), Some(42));
    }

    #[test]
    fn test_receipt_numbers_order_by_sequence() {
        let a = ReceiptNumber::from_sequence(2026, 9);
        let b = ReceiptNumber::from_sequence(2026, 10);
        assert!(a < b);
    }

    #[tokio::test]
    async fn test_each_payment_issues_one_receipt() {
        let invoice = invoice_for(dec!(90000), InvoiceStatus::Sent);
        let id = invoice.id;
        let port = Arc::new(MockInvoiceLedgerPort::with_invoices(vec![invoice]).await);
        let service = PaymentLedgerService::new(port.clone());

        for _ in 0..3 {
            service
                .add_payment(id, request(dec!(30000), PaymentMethod::MoovMoney))
                .await
                .unwrap();
        }

        let receipts = service.list_receipts(id).await.unwrap();
        assert_eq!(receipts.len(), 3);
        let year = Utc::now().year();
        for receipt in &receipts {
            assert!(receipt.receipt_number.as_str().starts_with(&format!("REC-{}-", year)));
            assert_eq!(receipt.invoice_number, "INV-2026-0317");
            assert_eq!(receipt.customer_name, "Atelier Kente SARL");
        }

        let payments = port.list_payments(id).await.unwrap();
        for payment in payments {
            assert!(receipts.iter().any(|r| r.id == payment.receipt_id
                && r.invoice_payment_id == payment.id
                && r.amount == payment.amount));
        }
    }
}

// ============================================================================
// Service Scenario Tests
// ============================================================================

mod scenario_tests {
    use super::*;

    #[tokio::test]
    async fn test_installment_plan_to_paid_and_back() {
        let invoice = invoice_for(dec!(100000), InvoiceStatus::Sent)
            .with_due_date(NaiveDate::from_ymd_opt(2026, 12, 31).unwrap());
        let id = invoice.id;
        let port = Arc::new(MockInvoiceLedgerPort::with_invoices(vec![invoice]).await);
        let service = PaymentLedgerService::new(port.clone());

        let deposit = service
            .add_payment(id, request(dec!(40000), PaymentMethod::OrangeMoney))
            .await
            .unwrap();
        assert_eq!(deposit.payment.payment_type, PaymentType::Deposit);
        assert_eq!(deposit.invoice.status, InvoiceStatus::Partial);

        let settle = service
            .add_payment(id, request(dec!(60000), PaymentMethod::Cash))
            .await
            .unwrap();
        assert_eq!(settle.payment.payment_type, PaymentType::Final);
        assert_eq!(settle.invoice.status, InvoiceStatus::Paid);
        assert!(settle.invoice.remaining_balance.is_zero());

        let rejected = service
            .add_payment(id, request(dec!(1000), PaymentMethod::Cash))
            .await;
        assert!(matches!(rejected, Err(BillingError::InvoiceNotPayable { .. })));

        let reversal = service.delete_payment(id, settle.payment.id).await.unwrap();
        assert_eq!(reversal.new_status, InvoiceStatus::Partial);

        let listing = service.list_payments(id).await.unwrap();
        assert_eq!(listing.payments.len(), 1);
        assert_eq!(
            listing.summary,
            PaymentSummary {
                total: Money::new(dec!(100000), Currency::XOF),
                amount_paid: Money::new(dec!(40000), Currency::XOF),
                remaining_balance: Money::new(dec!(60000), Currency::XOF),
            }
        );
        assert!(matches!(
            service.get_receipt(settle.receipt.id).await,
            Err(BillingError::ReceiptNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_payment_from_other_invoice_is_rejected() {
        let first = invoice_for(dec!(10000), InvoiceStatus::Sent);
        let second = invoice_for(dec!(10000), InvoiceStatus::Sent);
        let (first_id, second_id) = (first.id, second.id);
        let port = Arc::new(MockInvoiceLedgerPort::with_invoices(vec![first, second]).await);
        let service = PaymentLedgerService::new(port);

        let recorded = service
            .add_payment(first_id, request(dec!(2000), PaymentMethod::Cash))
            .await
            .unwrap();

        let result = service.delete_payment(second_id, recorded.payment.id).await;
        assert!(matches!(result, Err(BillingError::PaymentInvoiceMismatch { .. })));
        assert_eq!(service.list_payments(first_id).await.unwrap().payments.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_payments_all_land_or_conflict() {
        let invoice = invoice_for(dec!(1000000), InvoiceStatus::Sent);
        let id = invoice.id;
        let port = Arc::new(MockInvoiceLedgerPort::with_invoices(vec![invoice]).await);
        let service = PaymentLedgerService::new(port.clone());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service.add_payment(id, request(dec!(1000), PaymentMethod::Cash)).await
            }));
        }

        let mut succeeded = 0u32;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(BillingError::ConcurrentModification(_)) => {}
                Err(other) => panic!("unexpected error: {:?}", other),
            }
        }

        let stored = port.get_invoice(id).await.unwrap();
        assert_eq!(stored.amount_paid.amount(), Decimal::from(succeeded) * dec!(1000));
        assert_eq!(stored.version, i64::from(succeeded));
        assert_eq!(port.receipt_count().await, succeeded as usize);
    }

    #[tokio::test]
    async fn test_payments_listed_newest_first() {
        let invoice = invoice_for(dec!(100000), InvoiceStatus::Sent);
        let id = invoice.id;
        let port = Arc::new(MockInvoiceLedgerPort::with_invoices(vec![invoice]).await);
        let service = PaymentLedgerService::new(port);

        let now = Utc::now();
        for days_ago in [5, 1, 3] {
            let mut req = request(dec!(1000), PaymentMethod::Cash);
            req.paid_at = Some(now - Duration::days(days_ago));
            service.add_payment(id, req).await.unwrap();
        }

        let listing = service.list_payments(id).await.unwrap();
        let dates: Vec<_> = listing.payments.iter().map(|p| p.paid_at).collect();
        let mut sorted = dates.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(dates, sorted);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

mod property_tests {
    use super::*;

    fn amounts() -> impl Strategy<Value = Vec<Decimal>> {
        prop::collection::vec(1i64..50_000, 1..8)
            .prop_map(|v| v.into_iter().map(Decimal::from).collect())
    }

    proptest! {
        #[test]
        fn prop_amount_paid_is_sum_of_payments(total in 1i64..500_000, payments in amounts()) {
            let total = Decimal::from(total);
            let mut invoice = invoice_for(total, InvoiceStatus::Sent);
            let mut applied = Decimal::ZERO;

            for (prior, amount) in payments.iter().enumerate() {
                if !invoice.status.accepts_payments() {
                    break;
                }
                let plan = PaymentLedger::plan_payment(
                    &invoice,
                    prior as u64,
                    request(*amount, PaymentMethod::Cash),
                    Utc::now(),
                ).unwrap();
                invoice.apply_update(&plan.invoice);
                applied += *amount;
            }

            prop_assert_eq!(invoice.amount_paid.amount(), applied);
            prop_assert_eq!(invoice.remaining_balance().amount(), total - applied);
        }

        #[test]
        fn prop_paid_status_iff_fully_paid(total in 1i64..200_000, payments in amounts()) {
            let total = Decimal::from(total);
            let mut invoice = invoice_for(total, InvoiceStatus::Sent);

            for (prior, amount) in payments.iter().enumerate() {
                if !invoice.status.accepts_payments() {
                    break;
                }
                let plan = PaymentLedger::plan_payment(
                    &invoice,
                    prior as u64,
                    request(*amount, PaymentMethod::Cash),
                    Utc::now(),
                ).unwrap();
                invoice.apply_update(&plan.invoice);

                prop_assert_eq!(invoice.status == InvoiceStatus::Paid, invoice.is_fully_paid());
                prop_assert_eq!(invoice.paid_date.is_some(), invoice.is_fully_paid());
                if !invoice.is_fully_paid() {
                    prop_assert_eq!(invoice.status, InvoiceStatus::Partial);
                }
            }
        }

        #[test]
        fn prop_at_most_one_final_payment(total in 1i64..200_000, payments in amounts()) {
            let mut invoice = invoice_for(Decimal::from(total), InvoiceStatus::Sent);
            let mut types = Vec::new();

            for (prior, amount) in payments.iter().enumerate() {
                if !invoice.status.accepts_payments() {
                    break;
                }
                types.extend(pay_all_from(&mut invoice, prior as u64, *amount));
            }

            let finals = types.iter().filter(|t| **t == PaymentType::Final).count();
            prop_assert!(finals <= 1);
            prop_assert_eq!(finals == 1, invoice.is_fully_paid());
            if let Some(last) = types.last() {
                if finals == 1 {
                    prop_assert_eq!(*last, PaymentType::Final);
                }
            }
            prop_assert_eq!(types[0] == PaymentType::Deposit, types.len() > 1 || !invoice.is_fully_paid());
        }

        #[test]
        fn prop_record_then_reverse_restores_amount(
            total in 1i64..200_000,
            already in 0i64..200_000,
            amount in 1i64..100_000,
        ) {
            let total = Decimal::from(total);
            let mut invoice = invoice_for(total, InvoiceStatus::Sent);
            if already > 0 {
                pay_all(&mut invoice, &[Decimal::from(already)]);
            }
            prop_assume!(invoice.status.accepts_payments());
            let before = invoice.amount_paid;

            let plan = PaymentLedger::plan_payment(
                &invoice,
                1,
                request(Decimal::from(amount), PaymentMethod::Cash),
                Utc::now(),
            ).unwrap();
            invoice.apply_update(&plan.invoice);

            let reversal = PaymentLedger::plan_reversal(&invoice, plan.payment, Utc::now()).unwrap();
            invoice.apply_update(&reversal.invoice);

            prop_assert_eq!(invoice.amount_paid, before);
            prop_assert!(invoice.paid_date.is_none());
            let expected = if before.is_zero() { InvoiceStatus::Sent } else { InvoiceStatus::Partial };
            prop_assert_eq!(invoice.status, expected);
        }
    }

    fn pay_all_from(invoice: &mut Invoice, prior: u64, amount: Decimal) -> Option<PaymentType> {
        let plan = PaymentLedger::plan_payment(
            invoice,
            prior,
            request(amount, PaymentMethod::Cash),
            Utc::now(),
        )
        .ok()?;
        invoice.apply_update(&plan.invoice);
        Some(plan.payment.payment_type)
    }
}
