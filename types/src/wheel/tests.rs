use super::*;
use commonware_codec::{DecodeExt, Encode, FixedSize, ReadExt};
use commonware_cryptography::{
    ed25519::{PrivateKey, PublicKey},
    Signer,
};
use commonware_math::algebra::Random;
use proptest::prelude::*;
use rand::{rngs::StdRng, SeedableRng};

const ENTRY_FEE: u64 = 1_000_000_000;
const SPIN_FEE: u64 = 100_000_000;

fn public_key(seed: u64) -> PublicKey {
    let mut rng = StdRng::seed_from_u64(seed);
    PrivateKey::random(&mut rng).public_key()
}

fn open_pool() -> Pool {
    let mut pool = Pool::new(public_key(1), public_key(2), ENTRY_FEE, SPIN_FEE).unwrap();
    assert!(pool.fund(ENTRY_FEE * FUNDING_THRESHOLD_MULTIPLE).unwrap());
    pool
}

#[test]
fn test_pool_rejects_zero_fees() {
    assert_eq!(
        Pool::new(public_key(1), public_key(2), 0, SPIN_FEE),
        Err(WheelError::InvalidConfig)
    );
    assert_eq!(
        Pool::new(public_key(1), public_key(2), ENTRY_FEE, 0),
        Err(WheelError::InvalidConfig)
    );
    assert_eq!(
        Pool::new(public_key(1), public_key(2), u64::MAX, SPIN_FEE),
        Err(WheelError::InvalidConfig)
    );
}

#[test]
fn test_funding_opens_at_threshold_only() {
    let mut pool = Pool::new(public_key(1), public_key(2), ENTRY_FEE, SPIN_FEE).unwrap();
    assert_eq!(pool.minimum_funding, 10 * ENTRY_FEE);
    assert_eq!(pool.fund(0), Err(WheelError::InvalidAmount));

    assert!(!pool.fund(9 * ENTRY_FEE).unwrap());
    assert_eq!(pool.state, PoolState::Idle);
    assert!(pool.fund(ENTRY_FEE).unwrap());
    assert_eq!(pool.state, PoolState::Open);

    // Topping up an open pool does not reopen it
    assert!(!pool.fund(ENTRY_FEE).unwrap());
    assert_eq!(pool.house_reserve, 11 * ENTRY_FEE);
    pool.check_conservation().unwrap();
}

#[test]
fn test_spin_fee_checks_in_order() {
    let mut pool = Pool::new(public_key(1), public_key(2), ENTRY_FEE, SPIN_FEE).unwrap();
    let mut player = Player::default();
    assert_eq!(
        pool.deposit_stake(&mut player, ENTRY_FEE),
        Err(WheelError::PoolNotOpen)
    );

    let mut pool = open_pool();
    assert_eq!(pool.collect_spin_fee(&mut player), Err(WheelError::NoStake));
    assert_eq!(
        pool.deposit_stake(&mut player, ENTRY_FEE - 1),
        Err(WheelError::InsufficientPayment)
    );
    pool.deposit_stake(&mut player, ENTRY_FEE).unwrap();

    pool.collect_spin_fee(&mut player).unwrap();
    assert_eq!(player.balance, ENTRY_FEE - SPIN_FEE);
    assert_eq!(pool.house_reserve, 10 * ENTRY_FEE + SPIN_FEE);
    pool.check_conservation().unwrap();

    player.pending_request = Some(request_id(b"test", &public_key(3), 0));
    assert_eq!(
        pool.collect_spin_fee(&mut player),
        Err(WheelError::SpinAlreadyPending)
    );

    player.pending_request = None;
    player.balance = SPIN_FEE - 1;
    assert_eq!(
        pool.collect_spin_fee(&mut player),
        Err(WheelError::InsufficientStake)
    );
}

#[test]
fn test_settle_clamps_house_credits_to_reserve() {
    let mut pool = open_pool();
    let mut player = Player::default();
    pool.deposit_stake(&mut player, ENTRY_FEE).unwrap();

    // Drain the reserve to a single spin fee
    pool.house_reserve = SPIN_FEE;
    pool.total_held = SPIN_FEE + pool.total_balances;

    let effect = Prize::Win30.effect(player.balance, SPIN_FEE);
    let settlement = pool.settle(&mut player, effect).unwrap();
    assert_eq!(settlement.credited, SPIN_FEE);
    assert_eq!(player.unclaimed_winnings, SPIN_FEE);
    assert_eq!(pool.house_reserve, 0);
    pool.check_conservation().unwrap();
}

#[test]
fn test_double_up_moves_stake_into_winnings() {
    let mut pool = open_pool();
    let mut player = Player::default();
    pool.deposit_stake(&mut player, ENTRY_FEE).unwrap();
    pool.collect_spin_fee(&mut player).unwrap();

    let effect = Prize::DoubleUp.effect(player.balance, SPIN_FEE);
    let settlement = pool.settle(&mut player, effect).unwrap();
    player.refresh_status();

    assert_eq!(player.balance, 0);
    assert_eq!(player.unclaimed_winnings, 2 * (ENTRY_FEE - SPIN_FEE));
    assert_eq!(player.status, PlayerStatus::Depleted);
    assert_eq!(settlement.credited, ENTRY_FEE - SPIN_FEE);
    assert_eq!(settlement.debited, 0);
    pool.check_conservation().unwrap();
}

#[test]
fn test_payout_zeroes_winnings() {
    let mut pool = open_pool();
    let mut player = Player::default();
    assert_eq!(
        pool.pay_out_winnings(&mut player),
        Err(WheelError::NothingToClaim)
    );

    pool.deposit_stake(&mut player, ENTRY_FEE).unwrap();
    let effect = Prize::Win10.effect(player.balance, SPIN_FEE);
    pool.settle(&mut player, effect).unwrap();
    let held = pool.total_held;

    let amount = pool.pay_out_winnings(&mut player).unwrap();
    assert_eq!(amount, 10 * SPIN_FEE);
    assert_eq!(player.unclaimed_winnings, 0);
    assert_eq!(player.total_claimed, amount);
    assert_eq!(pool.total_held, held - amount);
    assert_eq!(
        pool.pay_out_winnings(&mut player),
        Err(WheelError::NothingToClaim)
    );
    pool.check_conservation().unwrap();
}

#[test]
fn test_close_releases_reserve_and_escrows_winnings() {
    let mut pool = open_pool();
    let mut player = Player::default();
    pool.deposit_stake(&mut player, 2 * ENTRY_FEE).unwrap();
    let effect = Prize::Win5.effect(player.balance, SPIN_FEE);
    pool.settle(&mut player, effect).unwrap();

    let forfeited = pool.forfeit_stake(&mut player).unwrap();
    assert_eq!(forfeited, 2 * ENTRY_FEE);
    assert_eq!(player.status, PlayerStatus::Depleted);

    let released = pool.close().unwrap();
    assert_eq!(released, 12 * ENTRY_FEE - 5 * SPIN_FEE);
    assert_eq!(pool.total_held, 5 * SPIN_FEE);
    assert_eq!(pool.total_winnings, 5 * SPIN_FEE);
    assert_eq!(pool.state, PoolState::Closed);
    assert_eq!(pool.close(), Err(WheelError::PoolClosed));
    assert_eq!(pool.fund(1), Err(WheelError::PoolClosed));
    pool.check_conservation().unwrap();
}

#[test]
fn test_pool_codec_rejects_unbalanced_ledger() {
    let mut pool = open_pool();
    let decoded = Pool::decode(pool.encode()).unwrap();
    assert_eq!(decoded, pool);
    assert_eq!(pool.encode().len(), Pool::SIZE);

    pool.total_held += 1;
    assert!(matches!(
        Pool::decode(pool.encode()),
        Err(commonware_codec::Error::Invalid("Pool", _))
    ));
}

#[test]
fn test_player_roundtrip() {
    let player = Player {
        balance: 700_000_000,
        unclaimed_winnings: 500_000_000,
        last_prize: Some(Prize::Win5),
        status: PlayerStatus::Active,
        pending_request: Some(request_id(b"test", &public_key(4), 9)),
        spins: 3,
        total_claimed: 0,
    };
    player.validate_invariants().unwrap();
    let encoded = player.encode();
    let decoded = Player::read(&mut &encoded[..]).unwrap();
    assert_eq!(player, decoded);
}

#[test]
fn test_player_invariants() {
    let player = Player {
        balance: 1,
        status: PlayerStatus::Depleted,
        ..Player::default()
    };
    assert_eq!(
        player.validate_invariants(),
        Err(PlayerInvariantError::DepletedWithStake { balance: 1 })
    );
    assert_eq!(
        Player::default().validate_invariants(),
        Err(PlayerInvariantError::ActiveWithoutStake)
    );
}

#[test]
fn test_request_ids_are_distinct() {
    let requester = public_key(5);
    let first = request_id(b"wheel", &requester, 0);
    assert_eq!(first, request_id(b"wheel", &requester, 0));
    assert_ne!(first, request_id(b"wheel", &requester, 1));
    assert_ne!(first, request_id(b"wheel", &public_key(6), 0));
    assert_ne!(first, request_id(b"other", &requester, 0));

    let pending = PendingSpin {
        request_id: first,
        player: requester,
        requested_at: 0,
    };
    assert_eq!(PendingSpin::decode(pending.encode()).unwrap(), pending);
}

#[test]
fn test_error_codes_are_stable() {
    for code in 1..=ERROR_ARITHMETIC_OVERFLOW {
        let error = WheelError::from_code(code).expect("known code");
        assert_eq!(error.code(), code);
    }
    assert_eq!(WheelError::from_code(0), None);
    assert_eq!(WheelError::from_code(ERROR_ARITHMETIC_OVERFLOW + 1), None);
}

#[derive(Clone, Debug)]
enum Step {
    Fund(u64),
    Enter(usize, u64),
    Spin(usize, [u8; 32]),
    Claim(usize),
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (1u64..=5 * ENTRY_FEE).prop_map(Step::Fund),
        (0usize..4, ENTRY_FEE..=3 * ENTRY_FEE).prop_map(|(p, a)| Step::Enter(p, a)),
        (0usize..4, prop::array::uniform32(any::<u8>())).prop_map(|(p, r)| Step::Spin(p, r)),
        (0usize..4).prop_map(Step::Claim),
    ]
}

proptest! {
    /// Conservation holds after every step and no credit ever exceeds the reserve.
    #[test]
    fn prop_ledger_conserves_value(steps in prop::collection::vec(arb_step(), 1..120)) {
        let mut pool = open_pool();
        let mut players = vec![Player::default(); 4];
        let mut paid_in = pool.total_held as u128;
        let mut paid_out = 0u128;

        for step in steps {
            match step {
                Step::Fund(amount) => {
                    pool.fund(amount).unwrap();
                    paid_in += amount as u128;
                }
                Step::Enter(p, amount) => {
                    pool.deposit_stake(&mut players[p], amount).unwrap();
                    paid_in += amount as u128;
                }
                Step::Spin(p, randomness) => {
                    let player = &mut players[p];
                    if pool.collect_spin_fee(player).is_err() {
                        continue;
                    }
                    let reserve = pool.house_reserve;
                    let prize = Prize::from_randomness(&randomness);
                    let effect = prize.effect(player.balance, pool.spin_fee);
                    let settlement = pool.settle(player, effect).unwrap();
                    player.refresh_status();
                    prop_assert!(settlement.credited <= reserve + settlement.debited);
                    player.validate_invariants().unwrap();
                }
                Step::Claim(p) => {
                    if let Ok(amount) = pool.pay_out_winnings(&mut players[p]) {
                        paid_out += amount as u128;
                    }
                    prop_assert_eq!(players[p].unclaimed_winnings, 0);
                }
            }
            prop_assert!(pool.check_conservation().is_ok());
            prop_assert_eq!(pool.total_held as u128, paid_in - paid_out);
            let balances: u64 = players.iter().map(|p| p.balance).sum();
            let winnings: u64 = players.iter().map(|p| p.unclaimed_winnings).sum();
            prop_assert_eq!(balances, pool.total_balances);
            prop_assert_eq!(winnings, pool.total_winnings);
        }
    }

    /// Any random word lands on a tier and never debits more than the stake.
    #[test]
    fn prop_effects_respect_stake(randomness in prop::array::uniform32(any::<u8>()), balance in 0u64..=10 * ENTRY_FEE) {
        let prize = Prize::from_randomness(&randomness);
        let effect = prize.effect(balance, SPIN_FEE);
        prop_assert!(effect.balance_to_house + effect.balance_to_winnings <= balance);
    }
}
