//! End-to-end tests across the full stack: services → store → domain crates.
//!
//! Covers the order→invoice→payment→refund lifecycle, tenant isolation,
//! appointment idempotency, purchasing, and the concurrency guarantees
//! (parallel confirms, parallel refunds, parallel stock checks).

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use chrono::Utc;

    use clinerp_accounting::{AccountKind, JournalLine, SourceRef};
    use clinerp_audit::InMemoryAuditSink;
    use clinerp_auth::Actor;
    use clinerp_core::{DomainError, EntityId, Money, TenantId, UserId};
    use clinerp_inventory::StockRef;
    use clinerp_invoicing::{InvoiceId, InvoiceStatus, PaymentMethod};
    use clinerp_parties::{ContactInfo, PartyId, PartyKind};
    use clinerp_products::ProductId;
    use clinerp_purchasing::PurchaseOrderStatus;
    use clinerp_sales::OrderId;
    use clinerp_tenancy::Tenant;

    use crate::Services;
    use crate::services::{NewOrderItem, NewPurchaseLine};

    fn money(cents: i64) -> Money {
        Money::from_cents(cents)
    }

    struct Fixture {
        services: Services,
        sink: Arc<InMemoryAuditSink>,
        root: Actor,
        staff: Actor,
        customer: PartyId,
        supplier: PartyId,
        /// 10.00 each, 10 on hand.
        amoxicillin: ProductId,
        /// 5.00 each, 5 on hand.
        gauze: ProductId,
    }

    fn setup() -> Fixture {
        clinerp_observability::init();
        let sink = Arc::new(InMemoryAuditSink::new());
        let services = Services::with_audit(sink.clone());

        let root = Actor::super_admin(UserId::new());
        let tenant = services
            .onboard_tenant(&root, "Sunrise Clinic", "sunrise")
            .unwrap();
        let staff = Actor::member(UserId::new(), tenant.id_typed());

        let customer = services
            .create_party(&staff, PartyKind::Customer, "Jamie Rivers", ContactInfo::default())
            .unwrap()
            .id_typed();
        let supplier = services
            .create_party(&staff, PartyKind::Supplier, "MedSupply Co", ContactInfo::default())
            .unwrap()
            .id_typed();

        let amoxicillin = services
            .create_product(&staff, "AMOX-500", "Amoxicillin 500mg", money(1000))
            .unwrap()
            .id_typed();
        services
            .receive_stock(&staff, amoxicillin, 10, StockRef::Adjustment)
            .unwrap();

        let gauze = services
            .create_product(&staff, "GAUZE", "Sterile Gauze", money(500))
            .unwrap()
            .id_typed();
        services
            .receive_stock(&staff, gauze, 5, StockRef::Adjustment)
            .unwrap();

        Fixture {
            services,
            sink,
            root,
            staff,
            customer,
            supplier,
            amoxicillin,
            gauze,
        }
    }

    fn confirmed_invoice(f: &Fixture, items: Vec<NewOrderItem>) -> (OrderId, InvoiceId) {
        let order = f.services.create_order(&f.staff, f.customer, items).unwrap();
        let invoice = f
            .services
            .confirm_order(&f.staff, order.id_typed())
            .unwrap();
        (order.id_typed(), invoice.id_typed())
    }

    #[test]
    fn order_to_paid_lifecycle() {
        let f = setup();

        // 2 items: qty 3 @ 10.00, qty 1 @ 5.00.
        let order = f
            .services
            .create_order(
                &f.staff,
                f.customer,
                vec![
                    NewOrderItem { product_id: f.amoxicillin, quantity: 3 },
                    NewOrderItem { product_id: f.gauze, quantity: 1 },
                ],
            )
            .unwrap();
        assert_eq!(order.total(), money(3500));
        assert_eq!(
            f.services.product(&f.staff, f.amoxicillin).unwrap().stock_quantity(),
            7
        );

        let invoice = f.services.confirm_order(&f.staff, order.id_typed()).unwrap();
        assert_eq!(invoice.total(), money(3500));
        assert_eq!(invoice.status(), InvoiceStatus::Unpaid);
        assert!(invoice.number().as_str().starts_with("INV-"));

        // Customer ledger carries the invoice debit.
        let stmt = f
            .services
            .customer_statement(&f.staff, f.customer, None, None)
            .unwrap();
        assert_eq!(stmt.rows.len(), 1);
        assert_eq!(stmt.closing_balance, money(3500));

        // Pay 20.00: partially paid, remaining 15.00, Cash Dr / AR Cr posted.
        let p1 = f
            .services
            .record_payment(&f.staff, invoice.id_typed(), money(2000), PaymentMethod::Cash)
            .unwrap();
        assert_eq!(
            f.services.invoice(&f.staff, invoice.id_typed()).unwrap().status(),
            InvoiceStatus::PartiallyPaid
        );
        assert_eq!(
            f.services.invoice_remaining(&f.staff, invoice.id_typed()).unwrap(),
            money(1500)
        );
        let journal = f.services.journal_entries(&f.staff).unwrap();
        let entry = journal
            .iter()
            .find(|e| e.source() == Some(SourceRef::Payment(p1.id_typed().0)))
            .unwrap();
        assert_eq!(entry.debit_total(), money(2000));
        assert_eq!(entry.credit_total(), money(2000));

        // Pay the remaining 15.00: paid, remaining 0.
        f.services
            .record_payment(&f.staff, invoice.id_typed(), money(1500), PaymentMethod::Card)
            .unwrap();
        assert_eq!(
            f.services.invoice(&f.staff, invoice.id_typed()).unwrap().status(),
            InvoiceStatus::Paid
        );
        assert_eq!(
            f.services.invoice_remaining(&f.staff, invoice.id_typed()).unwrap(),
            Money::ZERO
        );
        let stmt = f
            .services
            .customer_statement(&f.staff, f.customer, None, None)
            .unwrap();
        assert_eq!(stmt.closing_balance, Money::ZERO);
    }

    #[test]
    fn payment_beyond_remaining_is_rejected_with_no_writes() {
        let f = setup();
        let (_, invoice_id) = confirmed_invoice(
            &f,
            vec![NewOrderItem { product_id: f.amoxicillin, quantity: 3 }],
        );

        let err = f
            .services
            .record_payment(&f.staff, invoice_id, money(4000), PaymentMethod::Cash)
            .unwrap_err();
        assert!(
            matches!(err, DomainError::Conflict(ref msg) if msg.contains("remaining=30.00")),
            "{err:?}"
        );

        assert!(f.services.invoice_payments(&f.staff, invoice_id).unwrap().is_empty());
        assert!(f.services.journal_entries(&f.staff).unwrap().is_empty());
        assert_eq!(
            f.services.invoice(&f.staff, invoice_id).unwrap().status(),
            InvoiceStatus::Unpaid
        );
    }

    #[test]
    fn refunds_accumulate_against_the_payment_cap() {
        let f = setup();
        let (_, invoice_id) = confirmed_invoice(
            &f,
            vec![
                NewOrderItem { product_id: f.amoxicillin, quantity: 3 },
                NewOrderItem { product_id: f.gauze, quantity: 1 },
            ],
        );

        f.services
            .record_payment(&f.staff, invoice_id, money(2000), PaymentMethod::Cash)
            .unwrap();
        let p2 = f
            .services
            .record_payment(&f.staff, invoice_id, money(1500), PaymentMethod::Cash)
            .unwrap();

        // Refund 5.00 on the 15.00 payment: allowed, invoice back to
        // partially paid with 5.00 remaining.
        f.services
            .refund_payment(&f.staff, p2.id_typed(), money(500))
            .unwrap();
        assert_eq!(
            f.services.invoice(&f.staff, invoice_id).unwrap().status(),
            InvoiceStatus::PartiallyPaid
        );
        assert_eq!(
            f.services.invoice_remaining(&f.staff, invoice_id).unwrap(),
            money(500)
        );

        // The reversing entry (Dr AR / Cr Cash) is in the journal.
        let journal = f.services.journal_entries(&f.staff).unwrap();
        let refund_entry = journal
            .iter()
            .find(|e| e.source() == Some(SourceRef::Refund(p2.id_typed().0)))
            .unwrap();
        assert_eq!(refund_entry.debit_total(), money(500));
        let journal_len = journal.len();

        // 20.00 against 10.00 still refundable: rejected, remaining reported,
        // nothing written.
        let err = f
            .services
            .refund_payment(&f.staff, p2.id_typed(), money(2000))
            .unwrap_err();
        assert!(
            matches!(err, DomainError::Conflict(ref msg) if msg.contains("remaining=10.00")),
            "{err:?}"
        );
        assert_eq!(f.services.journal_entries(&f.staff).unwrap().len(), journal_len);
        assert_eq!(
            f.services
                .payment(&f.staff, p2.id_typed())
                .unwrap()
                .refunded_total(),
            money(500)
        );
    }

    #[test]
    fn cancelling_an_order_restores_stock_exactly_once() {
        let f = setup();
        let order = f
            .services
            .create_order(
                &f.staff,
                f.customer,
                vec![NewOrderItem { product_id: f.amoxicillin, quantity: 3 }],
            )
            .unwrap();
        assert_eq!(
            f.services.product(&f.staff, f.amoxicillin).unwrap().stock_quantity(),
            7
        );

        f.services.cancel_order(&f.staff, order.id_typed()).unwrap();
        assert_eq!(
            f.services.product(&f.staff, f.amoxicillin).unwrap().stock_quantity(),
            10
        );
        assert!(f.services.stock_reconciles(&f.staff, f.amoxicillin).unwrap());

        // Guarded, not silently repeated.
        let err = f.services.cancel_order(&f.staff, order.id_typed()).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(ref msg) if msg.contains("already cancelled")));
        assert_eq!(
            f.services.product(&f.staff, f.amoxicillin).unwrap().stock_quantity(),
            10
        );
        assert!(f.services.confirm_order(&f.staff, order.id_typed()).is_err());
    }

    #[test]
    fn one_invoice_per_order() {
        let f = setup();
        let (order_id, invoice_id) = confirmed_invoice(
            &f,
            vec![NewOrderItem { product_id: f.gauze, quantity: 1 }],
        );

        let err = f.services.confirm_order(&f.staff, order_id).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(
            f.services.invoice_for_order(&f.staff, order_id).unwrap().id_typed(),
            invoice_id
        );
        // A confirmed order cannot be cancelled.
        assert!(f.services.cancel_order(&f.staff, order_id).is_err());
    }

    #[test]
    fn concurrent_confirms_produce_exactly_one_invoice() {
        let f = setup();
        let order = f
            .services
            .create_order(
                &f.staff,
                f.customer,
                vec![NewOrderItem { product_id: f.gauze, quantity: 2 }],
            )
            .unwrap();
        let order_id = order.id_typed();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let services = f.services.clone();
                let staff = f.staff;
                thread::spawn(move || services.confirm_order(&staff, order_id).is_ok())
            })
            .collect();
        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&ok| ok)
            .count();

        assert_eq!(successes, 1);
        // Exactly one invoice and one ledger entry exist afterwards.
        assert!(f.services.invoice_for_order(&f.staff, order_id).is_ok());
        let stmt = f
            .services
            .customer_statement(&f.staff, f.customer, None, None)
            .unwrap();
        assert_eq!(stmt.rows.len(), 1);
    }

    #[test]
    fn concurrent_refunds_never_exceed_the_cap() {
        let f = setup();
        let (_, invoice_id) = confirmed_invoice(
            &f,
            vec![NewOrderItem { product_id: f.amoxicillin, quantity: 3 }],
        );
        let payment = f
            .services
            .record_payment(&f.staff, invoice_id, money(3000), PaymentMethod::Cash)
            .unwrap();
        let payment_id = payment.id_typed();

        // 8 × 10.00 against a 30.00 payment: exactly 3 can fit.
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let services = f.services.clone();
                let staff = f.staff;
                thread::spawn(move || {
                    services
                        .refund_payment(&staff, payment_id, money(1000))
                        .is_ok()
                })
            })
            .collect();
        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&ok| ok)
            .count();

        assert_eq!(successes, 3);
        let payment = f.services.payment(&f.staff, payment_id).unwrap();
        assert_eq!(payment.refunded_total(), money(3000));
        assert_eq!(
            f.services.invoice_remaining(&f.staff, invoice_id).unwrap(),
            money(3000)
        );
    }

    #[test]
    fn concurrent_orders_never_oversell() {
        let f = setup();

        // 5 gauze on hand; two orders of 3 cannot both pass the check.
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let services = f.services.clone();
                let staff = f.staff;
                let customer = f.customer;
                let gauze = f.gauze;
                thread::spawn(move || {
                    services
                        .create_order(
                            &staff,
                            customer,
                            vec![NewOrderItem { product_id: gauze, quantity: 3 }],
                        )
                        .is_ok()
                })
            })
            .collect();
        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&ok| ok)
            .count();

        assert_eq!(successes, 1);
        assert_eq!(f.services.product(&f.staff, f.gauze).unwrap().stock_quantity(), 2);
        assert!(f.services.stock_reconciles(&f.staff, f.gauze).unwrap());
    }

    #[test]
    fn appointment_completion_is_idempotent() {
        let f = setup();
        let appointment_id = EntityId::new();

        let invoice = f
            .services
            .complete_appointment(&f.staff, appointment_id, f.customer, money(5000))
            .unwrap();
        assert_eq!(invoice.total(), money(5000));

        // Dr AR / Cr Sales posted once.
        let journal = f.services.journal_entries(&f.staff).unwrap();
        assert_eq!(journal.len(), 1);
        assert_eq!(
            journal[0].source(),
            Some(SourceRef::Invoice(invoice.id_typed().0))
        );
        assert_eq!(journal[0].debit_total(), money(5000));

        // Completing again returns the same invoice and writes nothing new.
        let again = f
            .services
            .complete_appointment(&f.staff, appointment_id, f.customer, money(5000))
            .unwrap();
        assert_eq!(again.id_typed(), invoice.id_typed());
        assert_eq!(f.services.journal_entries(&f.staff).unwrap().len(), 1);
        let stmt = f
            .services
            .customer_statement(&f.staff, f.customer, None, None)
            .unwrap();
        assert_eq!(stmt.rows.len(), 1);

        // A zero-amount appointment gets an invoice but no postings.
        let free = f
            .services
            .complete_appointment(&f.staff, EntityId::new(), f.customer, Money::ZERO)
            .unwrap();
        assert_eq!(free.total(), Money::ZERO);
        assert_eq!(f.services.journal_entries(&f.staff).unwrap().len(), 1);
    }

    #[test]
    fn appointment_invoicing_requires_the_chart_accounts() {
        let f = setup();

        // A tenant that skipped onboarding has no chart of accounts.
        let bare = Tenant::onboard(TenantId::new(), "Bare Clinic", "bare", Utc::now()).unwrap();
        f.services
            .store()
            .write(|state| {
                state.upsert_tenant(bare.clone());
                Ok(())
            })
            .unwrap();
        let bare_staff = Actor::member(UserId::new(), bare.id_typed());
        let customer = f
            .services
            .create_party(&bare_staff, PartyKind::Customer, "Pat", ContactInfo::default())
            .unwrap()
            .id_typed();

        let err = f
            .services
            .complete_appointment(&bare_staff, EntityId::new(), customer, money(100))
            .unwrap_err();
        assert!(
            matches!(err, DomainError::Configuration(ref msg) if msg.contains("1100")),
            "{err:?}"
        );
    }

    #[test]
    fn tenant_isolation_hides_foreign_rows() {
        let f = setup();
        let (_, invoice_id) = confirmed_invoice(
            &f,
            vec![NewOrderItem { product_id: f.gauze, quantity: 1 }],
        );

        let other = f
            .services
            .onboard_tenant(&f.root, "Lakeside Clinic", "lakeside")
            .unwrap();
        let other_staff = Actor::member(UserId::new(), other.id_typed());

        // Wrong tenant is indistinguishable from absent.
        assert_eq!(
            f.services.invoice(&other_staff, invoice_id).unwrap_err(),
            DomainError::NotFound
        );
        // A caller without any tenant sees nothing.
        let detached = Actor::detached(UserId::new());
        assert_eq!(
            f.services.invoice(&detached, invoice_id).unwrap_err(),
            DomainError::NotFound
        );
        // Super-admins bypass scoping.
        assert!(f.services.invoice(&f.root, invoice_id).is_ok());
    }

    #[test]
    fn cross_tenant_account_references_are_rejected() {
        let f = setup();
        let other = f
            .services
            .onboard_tenant(&f.root, "Lakeside Clinic", "lakeside")
            .unwrap();
        let other_staff = Actor::member(UserId::new(), other.id_typed());

        let foreign_cash = f.services.account_by_code(&f.staff, "1000").unwrap();
        let err = f
            .services
            .create_account(
                &other_staff,
                None,
                "1010",
                "Petty Cash",
                AccountKind::Asset,
                Some(foreign_cash.id_typed()),
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(ref msg) if msg.contains("cross-tenant")));

        // An explicit foreign tenant id on creation is rejected up front.
        let err = f
            .services
            .create_account(
                &other_staff,
                Some(f.staff.tenant_id.unwrap()),
                "1010",
                "Petty Cash",
                AccountKind::Asset,
                None,
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(ref msg) if msg.contains("cross-tenant")));
    }

    #[test]
    fn purchase_order_flow_updates_stock_and_supplier_ledger() {
        let f = setup();
        let po = f
            .services
            .create_purchase_order(
                &f.staff,
                f.supplier,
                vec![NewPurchaseLine {
                    product_id: f.amoxicillin,
                    quantity: 10,
                    unit_cost: money(600),
                }],
            )
            .unwrap();
        assert_eq!(po.total(), money(6000));

        // Paying a draft order is rejected.
        assert!(
            f.services
                .pay_supplier(&f.staff, po.id_typed(), money(1000), PaymentMethod::BankTransfer)
                .is_err()
        );

        let po_id = po.id_typed();
        f.services.place_purchase_order(&f.staff, po_id).unwrap();
        f.services.receive_purchase_order(&f.staff, po_id).unwrap();
        assert_eq!(
            f.services.product(&f.staff, f.amoxicillin).unwrap().stock_quantity(),
            20
        );
        assert!(f.services.stock_reconciles(&f.staff, f.amoxicillin).unwrap());

        // We owe the supplier the full total.
        assert_eq!(
            f.services.party_balance(&f.staff, f.supplier).unwrap(),
            money(-6000)
        );

        f.services
            .pay_supplier(&f.staff, po_id, money(2000), PaymentMethod::BankTransfer)
            .unwrap();
        assert_eq!(
            f.services.purchase_order(&f.staff, po_id).unwrap().status(),
            PurchaseOrderStatus::Received
        );

        let err = f
            .services
            .pay_supplier(&f.staff, po_id, money(5000), PaymentMethod::BankTransfer)
            .unwrap_err();
        assert!(
            matches!(err, DomainError::Conflict(ref msg) if msg.contains("remaining=40.00")),
            "{err:?}"
        );

        f.services
            .pay_supplier(&f.staff, po_id, money(4000), PaymentMethod::BankTransfer)
            .unwrap();
        assert_eq!(
            f.services.purchase_order(&f.staff, po_id).unwrap().status(),
            PurchaseOrderStatus::Paid
        );
        assert_eq!(
            f.services.party_balance(&f.staff, f.supplier).unwrap(),
            Money::ZERO
        );

        let stmt = f
            .services
            .supplier_statement(&f.staff, f.supplier, None, None)
            .unwrap();
        assert_eq!(stmt.rows.len(), 3);
        assert_eq!(stmt.closing_balance, Money::ZERO);
    }

    #[test]
    fn journal_reversal_compensates_without_mutation() {
        let f = setup();
        let cash = f.services.account_by_code(&f.staff, "1000").unwrap();
        let sales = f.services.account_by_code(&f.staff, "4000").unwrap();

        let entry = f
            .services
            .post_journal_entry(
                &f.staff,
                None,
                "Opening cash sale",
                vec![
                    JournalLine::debit(cash.id_typed(), money(10000)),
                    JournalLine::credit(sales.id_typed(), money(10000)),
                ],
                None,
            )
            .unwrap();

        let reversal = f
            .services
            .reverse_journal_entry(&f.staff, entry.id_typed())
            .unwrap();
        assert_eq!(reversal.source(), Some(SourceRef::Reversal(entry.id_typed().0)));

        let journal = f.services.journal_entries(&f.staff).unwrap();
        assert_eq!(journal.len(), 2);
        // The original is untouched.
        assert!(journal.iter().any(|e| *e == entry));

        // An unbalanced post fails atomically.
        let err = f
            .services
            .post_journal_entry(
                &f.staff,
                None,
                "Broken",
                vec![
                    JournalLine::debit(cash.id_typed(), money(100)),
                    JournalLine::credit(sales.id_typed(), money(99)),
                ],
                None,
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(ref msg) if msg.contains("unbalanced")));
        assert_eq!(f.services.journal_entries(&f.staff).unwrap().len(), 2);

        // Lines referencing accounts outside the caller's tenant do not post.
        let other = f
            .services
            .onboard_tenant(&f.root, "Lakeside Clinic", "lakeside")
            .unwrap();
        let other_staff = Actor::member(UserId::new(), other.id_typed());
        let err = f
            .services
            .post_journal_entry(
                &other_staff,
                None,
                "Foreign accounts",
                vec![
                    JournalLine::debit(cash.id_typed(), money(100)),
                    JournalLine::credit(sales.id_typed(), money(100)),
                ],
                None,
            )
            .unwrap_err();
        assert_eq!(err, DomainError::NotFound);
    }

    #[test]
    fn audit_events_trail_the_money_movements() {
        let f = setup();
        let (_, invoice_id) = confirmed_invoice(
            &f,
            vec![NewOrderItem { product_id: f.gauze, quantity: 1 }],
        );
        f.services
            .record_payment(&f.staff, invoice_id, money(500), PaymentMethod::Cash)
            .unwrap();

        let actions: Vec<String> = f.sink.all().into_iter().map(|e| e.action).collect();
        for expected in [
            "tenant.onboarded",
            "product.created",
            "stock.received",
            "order.created",
            "order.confirmed",
            "payment.recorded",
        ] {
            assert!(actions.iter().any(|a| a == expected), "missing {expected}");
        }
    }

    #[test]
    fn cancelled_invoices_reject_payments() {
        let f = setup();
        let (_, invoice_id) = confirmed_invoice(
            &f,
            vec![NewOrderItem { product_id: f.gauze, quantity: 1 }],
        );

        f.services.cancel_invoice(&f.staff, invoice_id).unwrap();
        let err = f
            .services
            .record_payment(&f.staff, invoice_id, money(100), PaymentMethod::Cash)
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(ref msg) if msg.contains("cancelled")));

        // An invoice with net payments cannot be cancelled.
        let (_, paid_invoice) = confirmed_invoice(
            &f,
            vec![NewOrderItem { product_id: f.gauze, quantity: 2 }],
        );
        f.services
            .record_payment(&f.staff, paid_invoice, money(500), PaymentMethod::Cash)
            .unwrap();
        assert!(f.services.cancel_invoice(&f.staff, paid_invoice).is_err());
    }
}
