use super::*;
use crate::mocks::{
    create_account_keypair, randomness_for, rejection_code, Harness, TEST_ENTRY_FEE,
    TEST_SPIN_FEE,
};
use crate::Memory;
use commonware_runtime::deterministic::Runner;
use commonware_runtime::Runner as _;
use wheel_types::{
    wheel::{
        PlayerStatus, PoolState, Prize, ERROR_ACCESS_DENIED, ERROR_INSUFFICIENT_PAYMENT,
        ERROR_INSUFFICIENT_STAKE, ERROR_INVALID_AMOUNT, ERROR_INVALID_CONFIG,
        ERROR_NOTHING_TO_CLAIM, ERROR_NO_STAKE, ERROR_POOL_ALREADY_EXISTS, ERROR_POOL_CLOSED,
        ERROR_POOL_NOT_FOUND, ERROR_POOL_NOT_OPEN, ERROR_SPIN_ALREADY_PENDING,
        ERROR_UNKNOWN_REQUEST,
    },
    NAMESPACE,
};

#[test]
fn test_nonce_validation() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let state = Memory::default();
        let mut layer = Layer::new(&state, NAMESPACE);
        let (signer, _) = create_account_keypair(1);

        // Wrong nonce should fail
        let tx = Transaction::sign(&signer, 1, Instruction::Spin);
        assert!(layer.prepare(&tx).await.is_err());

        // Correct nonce should succeed
        let tx = Transaction::sign(&signer, 0, Instruction::Spin);
        assert!(layer.prepare(&tx).await.is_ok());

        let _ = layer.commit();
    });
}

#[test]
fn test_execute_drops_bad_nonces_and_signatures() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let state = Memory::default();
        let mut layer = Layer::new(&state, NAMESPACE);
        let (signer, public) = create_account_keypair(1);
        let (other, _) = create_account_keypair(2);

        let skipped = Transaction::sign(&signer, 5, Instruction::Spin);
        let mut forged = Transaction::sign(&other, 0, Instruction::Close);
        forged.public = public.clone();
        let accepted = Transaction::sign(&signer, 0, Instruction::Spin);

        let (outputs, nonces) = layer
            .execute(vec![skipped, forged, accepted.clone()])
            .await
            .unwrap();

        // Spin before creation is rejected but still consumes the nonce
        assert_eq!(outputs.len(), 2);
        assert!(matches!(
            &outputs[0],
            Output::Event(Event::TransactionRejected { code, .. }) if *code == ERROR_POOL_NOT_FOUND
        ));
        assert_eq!(outputs[1], Output::Transaction(accepted));
        assert_eq!(nonces.get(&public), Some(&1));
    });
}

#[test]
fn test_create_pool() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let harness = Harness::new().await;
        let pool = harness.pool().await;
        assert_eq!(pool.state, PoolState::Idle);
        assert_eq!(pool.operator, harness.operator.1);
        assert_eq!(pool.coordinator, harness.coordinator.1);
        assert_eq!(pool.minimum_funding, 10 * TEST_ENTRY_FEE);

        let mut harness = harness;
        let (intruder, _) = create_account_keypair(9);
        let coordinator = harness.coordinator.1.clone();
        let events = harness
            .submit(
                &intruder,
                Instruction::CreatePool {
                    entry_fee: 1,
                    spin_fee: 1,
                    coordinator,
                },
            )
            .await;
        assert_eq!(rejection_code(&events), Some(ERROR_POOL_ALREADY_EXISTS));
        assert_eq!(harness.pool().await.operator, harness.operator.1);
    });
}

#[test]
fn test_create_pool_rejects_zero_fee() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let mut state = Memory::default();
        let (operator, _) = create_account_keypair(1);
        let (_, coordinator) = create_account_keypair(2);
        let tx = Transaction::sign(
            &operator,
            0,
            Instruction::CreatePool {
                entry_fee: TEST_ENTRY_FEE,
                spin_fee: 0,
                coordinator,
            },
        );
        let mut layer = Layer::new(&state, NAMESPACE);
        let (outputs, _) = layer.execute(vec![tx]).await.unwrap();
        assert!(matches!(
            &outputs[0],
            Output::Event(Event::TransactionRejected { code, .. }) if *code == ERROR_INVALID_CONFIG
        ));
        let changes = layer.commit();

        // Only the nonce is written
        assert_eq!(changes.len(), 1);
        state.apply(changes).await.unwrap();
        assert!(state.get(&Key::Pool).await.unwrap().is_none());
    });
}

#[test]
fn test_funding_lifecycle() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let mut harness = Harness::new().await;

        assert_eq!(rejection_code(&harness.fund(0).await), Some(ERROR_INVALID_AMOUNT));

        let events = harness.fund(9 * TEST_ENTRY_FEE).await;
        assert_eq!(
            events,
            vec![Event::PoolFunded {
                amount: 9 * TEST_ENTRY_FEE,
                total_held: 9 * TEST_ENTRY_FEE,
            }]
        );
        assert_eq!(harness.pool().await.state, PoolState::Idle);

        // Entry is refused while idle
        let alice = harness.player(10);
        let events = harness.enter(&alice, TEST_ENTRY_FEE).await;
        assert_eq!(rejection_code(&events), Some(ERROR_POOL_NOT_OPEN));

        let events = harness.fund(TEST_ENTRY_FEE).await;
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[1],
            Event::PoolOpened {
                total_held: 10 * TEST_ENTRY_FEE
            }
        );

        // Topping up does not reopen
        let events = harness.fund(TEST_ENTRY_FEE).await;
        assert_eq!(events.len(), 1);
        assert_eq!(harness.pool().await.house_reserve, 11 * TEST_ENTRY_FEE);
    });
}

#[test]
fn test_operator_actions_require_operator() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let mut harness = Harness::new().await;
        let before = harness.pool().await;
        let mallory = harness.player(66);

        let events = harness
            .submit(&mallory.0, Instruction::Fund { amount: 10 * TEST_ENTRY_FEE })
            .await;
        assert_eq!(rejection_code(&events), Some(ERROR_ACCESS_DENIED));
        let events = harness.submit(&mallory.0, Instruction::Close).await;
        assert_eq!(rejection_code(&events), Some(ERROR_ACCESS_DENIED));

        assert_eq!(harness.pool().await, before);
    });
}

#[test]
fn test_enter() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let mut harness = Harness::open().await;
        let alice = harness.player(10);

        let events = harness.enter(&alice, TEST_ENTRY_FEE - 1).await;
        assert_eq!(rejection_code(&events), Some(ERROR_INSUFFICIENT_PAYMENT));
        assert!(harness.ledger(&alice.1).await.is_none());

        let events = harness.enter(&alice, TEST_ENTRY_FEE).await;
        assert_eq!(
            events,
            vec![Event::PlayerEntered {
                player: alice.1.clone(),
                payment: TEST_ENTRY_FEE,
                balance: TEST_ENTRY_FEE,
                first_entry: true,
            }]
        );

        // Re-entry tops up without counting a new participant
        let events = harness.enter(&alice, 2 * TEST_ENTRY_FEE).await;
        assert!(matches!(
            &events[0],
            Event::PlayerEntered { balance, first_entry: false, .. } if *balance == 3 * TEST_ENTRY_FEE
        ));
        let pool = harness.pool().await;
        assert_eq!(pool.participants, 1);
        assert_eq!(pool.total_balances, 3 * TEST_ENTRY_FEE);
        assert_eq!(pool.total_held, 13 * TEST_ENTRY_FEE);
    });
}

#[test]
fn test_spin_validation() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let mut harness = Harness::open().await;
        let alice = harness.player(10);

        let events = harness.submit(&alice.0, Instruction::Spin).await;
        assert_eq!(rejection_code(&events), Some(ERROR_NO_STAKE));

        harness.enter(&alice, TEST_ENTRY_FEE).await;
        let request_id = harness.spin(&alice).await.expect("first spin");

        let events = harness.submit(&alice.0, Instruction::Spin).await;
        assert_eq!(rejection_code(&events), Some(ERROR_SPIN_ALREADY_PENDING));

        let player = harness.ledger(&alice.1).await.unwrap();
        assert_eq!(player.balance, TEST_ENTRY_FEE - TEST_SPIN_FEE);
        assert_eq!(player.pending_request, Some(request_id));
        assert!(matches!(
            harness.state.get(&Key::PendingSpin(request_id)).await.unwrap(),
            Some(Value::PendingSpin(_))
        ));
    });
}

#[test]
fn test_spin_rejects_sub_fee_stake() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let mut harness = Harness::open().await;
        let alice = harness.player(10);
        harness.enter(&alice, TEST_ENTRY_FEE).await;

        // 0.9 - 0.5 = 0.4, then 0.3 - 0.3 = 0
        harness.spin_to(&alice, Prize::Lose5).await;
        harness.spin_to(&alice, Prize::Lose3).await;
        let player = harness.ledger(&alice.1).await.unwrap();
        assert_eq!(player.balance, 0);
        assert_eq!(player.status, PlayerStatus::Depleted);

        harness.enter(&alice, TEST_ENTRY_FEE).await;
        let player = harness.ledger(&alice.1).await.unwrap();
        assert_eq!(player.status, PlayerStatus::Active);

        // 1.05 leaves 0.05 after ten spins
        let bob = harness.player(11);
        harness.enter(&bob, TEST_ENTRY_FEE + TEST_SPIN_FEE / 2).await;
        for _ in 0..10 {
            harness.spin_to(&bob, Prize::Win5).await;
        }
        let player = harness.ledger(&bob.1).await.unwrap();
        assert_eq!(player.balance, TEST_SPIN_FEE / 2);
        let events = harness.submit(&bob.0, Instruction::Spin).await;
        assert_eq!(rejection_code(&events), Some(ERROR_INSUFFICIENT_STAKE));
    });
}

#[test]
fn test_fulfill_requires_coordinator_and_known_request() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let mut harness = Harness::open().await;
        let alice = harness.player(10);
        harness.enter(&alice, TEST_ENTRY_FEE).await;
        let request_id = harness.spin(&alice).await.unwrap();

        // Participants cannot resolve their own spins
        let events = harness
            .submit(
                &alice.0,
                Instruction::FulfillRandomness {
                    request_id,
                    randomness: randomness_for(Prize::Win30),
                },
            )
            .await;
        assert_eq!(rejection_code(&events), Some(ERROR_ACCESS_DENIED));

        let bogus = randomness_for(Prize::LoseAll);
        let events = harness.fulfill(bogus, randomness_for(Prize::Win30)).await;
        assert_eq!(rejection_code(&events), Some(ERROR_UNKNOWN_REQUEST));

        let events = harness
            .fulfill(request_id, randomness_for(Prize::Win5))
            .await;
        assert_eq!(
            events,
            vec![Event::PrizeResolved {
                player: alice.1.clone(),
                request_id,
                prize: Prize::Win5,
                balance: TEST_ENTRY_FEE - TEST_SPIN_FEE,
                unclaimed_winnings: 5 * TEST_SPIN_FEE,
                credited: 5 * TEST_SPIN_FEE,
                debited: 0,
            }]
        );
        assert!(harness
            .state
            .get(&Key::PendingSpin(request_id))
            .await
            .unwrap()
            .is_none());
    });
}

#[test]
fn test_claim_by_third_party_pays_player() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let mut harness = Harness::open().await;
        let alice = harness.player(10);
        let relayer = harness.player(12);
        harness.enter(&alice, TEST_ENTRY_FEE).await;

        let events = harness.claim(&relayer, &alice.1).await;
        assert_eq!(rejection_code(&events), Some(ERROR_NOTHING_TO_CLAIM));
        let events = harness.claim(&relayer, &relayer.1).await;
        assert_eq!(rejection_code(&events), Some(ERROR_NOTHING_TO_CLAIM));

        harness.spin_to(&alice, Prize::Win20).await;
        let events = harness.claim(&relayer, &alice.1).await;
        assert_eq!(
            events,
            vec![Event::WinningsClaimed {
                player: alice.1.clone(),
                amount: 20 * TEST_SPIN_FEE,
            }]
        );
        assert!(harness.ledger(&relayer.1).await.is_none());
        assert_eq!(harness.ledger(&alice.1).await.unwrap().total_claimed, 20 * TEST_SPIN_FEE);
    });
}

#[test]
fn test_close_settles_every_participant() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let mut harness = Harness::open().await;
        let alice = harness.player(10);
        let bob = harness.player(11);
        harness.enter(&alice, TEST_ENTRY_FEE).await;
        harness.enter(&bob, 2 * TEST_ENTRY_FEE).await;
        harness.spin_to(&alice, Prize::Win10).await;

        let events = harness.close().await;
        assert_eq!(
            events,
            vec![Event::PoolClosed {
                operator: harness.operator.1.clone(),
                amount: 13 * TEST_ENTRY_FEE - 10 * TEST_SPIN_FEE,
                reserved_winnings: 10 * TEST_SPIN_FEE,
            }]
        );
        let pool = harness.pool().await;
        assert_eq!(pool.state, PoolState::Closed);
        assert_eq!(pool.total_held, 10 * TEST_SPIN_FEE);
        for who in [&alice, &bob] {
            let player = harness.ledger(&who.1).await.unwrap();
            assert_eq!(player.balance, 0);
            assert_eq!(player.status, PlayerStatus::Depleted);
        }

        // Terminal: no funding, entry, spin or second close
        assert_eq!(rejection_code(&harness.fund(1).await), Some(ERROR_POOL_CLOSED));
        assert_eq!(rejection_code(&harness.close().await), Some(ERROR_POOL_CLOSED));
        assert_eq!(
            rejection_code(&harness.enter(&bob, TEST_ENTRY_FEE).await),
            Some(ERROR_POOL_NOT_OPEN)
        );
        assert_eq!(
            rejection_code(&harness.submit(&bob.0, Instruction::Spin).await),
            Some(ERROR_POOL_NOT_OPEN)
        );

        // Winnings stay redeemable
        let events = harness.claim(&alice, &alice.1).await;
        assert!(matches!(
            &events[0],
            Event::WinningsClaimed { amount, .. } if *amount == 10 * TEST_SPIN_FEE
        ));
        let pool = harness.pool().await;
        assert_eq!(pool.total_held, 0);
        pool.check_conservation().unwrap();
    });
}

#[test]
fn test_pending_spin_resolves_after_close() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let mut harness = Harness::open().await;
        let alice = harness.player(10);
        harness.enter(&alice, TEST_ENTRY_FEE).await;
        let request_id = harness.spin(&alice).await.unwrap();
        harness.close().await;

        // The house reserve left with the operator, so the win cannot be paid
        let events = harness
            .fulfill(request_id, randomness_for(Prize::Win30))
            .await;
        assert!(matches!(
            &events[0],
            Event::PrizeResolved { credited: 0, unclaimed_winnings: 0, .. }
        ));
        let player = harness.ledger(&alice.1).await.unwrap();
        assert!(player.pending_request.is_none());
        assert_eq!(player.last_prize, Some(Prize::Win30));
        harness.pool().await.check_conservation().unwrap();
    });
}

#[test]
fn test_rejections_leave_ledger_untouched() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let mut harness = Harness::open().await;
        let alice = harness.player(10);
        harness.enter(&alice, TEST_ENTRY_FEE).await;

        let spin = harness.sign(&alice.0, Instruction::Spin).await;
        let again = Transaction::sign(&alice.0, spin.nonce + 1, Instruction::Spin);
        let claim = Transaction::sign(
            &alice.0,
            spin.nonce + 2,
            Instruction::Claim {
                player: alice.1.clone(),
            },
        );
        let events = harness.execute(vec![spin, again, claim]).await;
        assert!(matches!(events[0], Event::SpinRequested { .. }));
        assert_eq!(rejection_code(&events[1..2]), Some(ERROR_SPIN_ALREADY_PENDING));
        assert_eq!(rejection_code(&events[2..]), Some(ERROR_NOTHING_TO_CLAIM));

        let pool = harness.pool().await;
        assert_eq!(pool.request_nonce, 1);
        assert_eq!(pool.house_reserve, 10 * TEST_ENTRY_FEE + TEST_SPIN_FEE);
        assert_eq!(
            crate::state::nonce(&harness.state, &alice.1).await.unwrap(),
            4
        );
    });
}

#[test]
fn test_rejected_instruction_clears_staging() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let harness = Harness::open().await;
        let alice = harness.player(10);
        let mut layer = Layer::new(&harness.state, NAMESPACE);

        layer.insert(Key::Participant(99), Value::Participant(alice.1.clone()));
        assert!(layer.get(&Key::Participant(99)).await.unwrap().is_some());

        let tx = Transaction::sign(&alice.0, 0, Instruction::Spin);
        layer.prepare(&tx).await.unwrap();
        let events = layer.apply(&tx).await.unwrap();
        assert_eq!(rejection_code(&events), Some(ERROR_NO_STAKE));

        assert!(layer.get(&Key::Participant(99)).await.unwrap().is_none());
        let changes = layer.commit();
        assert_eq!(changes.len(), 1);
        assert!(matches!(changes[0].0, Key::Account(_)));
    });
}
