use super::super::*;
use wheel_types::wheel::{request_id, PendingSpin};

impl<'a, S: State> Layer<'a, S> {
    pub(in crate::layer) async fn handle_enter(
        &mut self,
        public: &PublicKey,
        payment: u64,
    ) -> Result<Vec<Event>, ApplyError> {
        let mut pool = self.load_pool().await?;
        let existing = self.load_player(public).await?;
        let first_entry = existing.is_none();
        let mut player = existing.unwrap_or_default();

        pool.deposit_stake(&mut player, payment)?;

        // Register the account so close can settle its stake
        if first_entry {
            let index = pool.participants;
            pool.participants = index
                .checked_add(1)
                .ok_or(WheelError::ArithmeticOverflow)?;
            self.insert(Key::Participant(index), Value::Participant(public.clone()));
        }

        let event = Event::PlayerEntered {
            player: public.clone(),
            payment,
            balance: player.balance,
            first_entry,
        };
        self.store_player(public, player);
        self.store_pool(pool)?;

        Ok(vec![event])
    }

    pub(in crate::layer) async fn handle_spin(
        &mut self,
        public: &PublicKey,
    ) -> Result<Vec<Event>, ApplyError> {
        let mut pool = self.load_pool().await?;
        if !pool.is_open() {
            return Err(WheelError::PoolNotOpen.into());
        }
        let Some(mut player) = self.load_player(public).await? else {
            return Err(WheelError::NoStake.into());
        };
        pool.collect_spin_fee(&mut player)?;

        let nonce = pool.next_request_nonce();
        let request_id = request_id(&self.namespace, public, nonce);
        if self.get(&Key::PendingSpin(request_id)).await?.is_some() {
            return Err(anyhow::anyhow!("request identifier collision at nonce {nonce}").into());
        }
        player.pending_request = Some(request_id);
        self.insert(
            Key::PendingSpin(request_id),
            Value::PendingSpin(PendingSpin {
                request_id,
                player: public.clone(),
                requested_at: player.spins,
            }),
        );
        debug!(player = ?public, ?request_id, balance = player.balance, "spin requested");
        self.store_player(public, player);
        self.store_pool(pool)?;

        Ok(vec![Event::SpinRequested {
            player: public.clone(),
            request_id,
        }])
    }

    /// Pay out `player`'s winnings. Anyone may trigger it; the transfer always goes to
    /// `player`.
    pub(in crate::layer) async fn handle_claim(
        &mut self,
        _public: &PublicKey,
        player_key: &PublicKey,
    ) -> Result<Vec<Event>, ApplyError> {
        let mut pool = self.load_pool().await?;
        let Some(mut player) = self.load_player(player_key).await? else {
            return Err(WheelError::NothingToClaim.into());
        };

        // Ledger is zeroed before the outbound transfer is recorded
        let amount = pool.pay_out_winnings(&mut player)?;
        self.store_player(player_key, player);
        self.store_pool(pool)?;

        Ok(vec![Event::WinningsClaimed {
            player: player_key.clone(),
            amount,
        }])
    }
}
