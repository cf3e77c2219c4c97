//! Concurrent settlement against a shared ledger handle.
//!
//! Threads hammer the same investors; no credit may be lost and no debit may
//! overdraw a balance.

use bazaar_treasury::{InvestOutcome, InvestorLedger};
use bazaar_types::{Amount, Investor, InvestorId};
use rust_decimal_macros::dec;
use std::sync::{Arc, Barrier};
use std::thread;

fn shared_ledger(balance: Amount) -> Arc<InvestorLedger> {
    Arc::new(
        InvestorLedger::new(
            10_000,
            vec![
                Investor::new("alpha", "Alpha", 4000, balance),
                Investor::new("beta", "Beta", 6000, balance),
            ],
        )
        .unwrap(),
    )
}

#[test]
fn concurrent_debits_never_overdraw() {
    // a + b > c, each individually <= c
    for _ in 0..50 {
        let ledger = shared_ledger(dec!(100));
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = [dec!(70), dec!(60)]
            .into_iter()
            .map(|amount| {
                let ledger = Arc::clone(&ledger);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    ledger
                        .invest_funds(&InvestorId::from("alpha"), amount)
                        .unwrap()
                })
            })
            .collect();

        let outcomes: Vec<InvestOutcome> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();
        let successes = outcomes.iter().filter(|o| o.is_success()).count();
        assert_eq!(successes, 1, "exactly one debit must win: {outcomes:?}");

        let balance = ledger.find_one(&"alpha".into()).unwrap().balance;
        assert!(balance == dec!(30) || balance == dec!(40));
    }
}

#[test]
fn many_small_debits_stop_at_zero() {
    let ledger = shared_ledger(dec!(50));
    let handles: Vec<_> = (0..16)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                (0..10)
                    .filter(|_| {
                        ledger
                            .invest_funds(&InvestorId::from("beta"), dec!(1))
                            .unwrap()
                            .is_success()
                    })
                    .count()
            })
        })
        .collect();

    let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(total, 50);
    assert_eq!(ledger.find_one(&"beta".into()).unwrap().balance, dec!(0));
}

#[test]
fn concurrent_credits_are_not_lost() {
    let ledger = shared_ledger(dec!(0));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                for _ in 0..100 {
                    ledger
                        .pay_dividend(&InvestorId::from("alpha"), dec!(0.5))
                        .unwrap();
                    ledger.distribute_pool(dec!(10)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // 800 dividends of 0.5 plus 800 pools of 10 at 40% / 60%
    let alpha = ledger.find_one(&"alpha".into()).unwrap();
    let beta = ledger.find_one(&"beta".into()).unwrap();
    assert_eq!(alpha.balance, dec!(400) + dec!(3200));
    assert_eq!(alpha.total_dividends, alpha.balance);
    assert_eq!(beta.balance, dec!(4800));
}

#[test]
fn debits_racing_a_distribution_stay_consistent() {
    let ledger = shared_ledger(dec!(10));
    let distributor = {
        let ledger = Arc::clone(&ledger);
        thread::spawn(move || {
            for _ in 0..100 {
                ledger.distribute_pool(dec!(1)).unwrap();
            }
        })
    };
    let investor = {
        let ledger = Arc::clone(&ledger);
        thread::spawn(move || {
            let mut spent = Amount::ZERO;
            for _ in 0..200 {
                if ledger
                    .invest_funds(&InvestorId::from("alpha"), dec!(0.3))
                    .unwrap()
                    .is_success()
                {
                    spent += dec!(0.3);
                }
            }
            spent
        })
    };

    distributor.join().unwrap();
    let spent = investor.join().unwrap();

    let alpha = ledger.find_one(&"alpha".into()).unwrap();
    assert!(alpha.balance >= Amount::ZERO);
    assert_eq!(alpha.total_dividends, dec!(40));
    assert_eq!(alpha.balance, dec!(10) + dec!(40) - spent);
}
