use super::super::*;
use commonware_cryptography::sha256::Digest;
use wheel_types::wheel::Prize;

impl<'a, S: State> Layer<'a, S> {
    /// Resolve a pending spin with the coordinator's random word.
    ///
    /// The request is consumed in the same unit as the ledger change, so a replayed or
    /// late delivery finds nothing and is rejected.
    pub(in crate::layer) async fn handle_fulfill_randomness(
        &mut self,
        public: &PublicKey,
        request_id: &Digest,
        randomness: &Digest,
    ) -> Result<Vec<Event>, ApplyError> {
        let mut pool = self.load_pool().await?;
        if !pool.is_coordinator(public) {
            return Err(WheelError::AccessDenied.into());
        }
        let pending = match self.get(&Key::PendingSpin(*request_id)).await? {
            Some(Value::PendingSpin(pending)) => pending,
            _ => return Err(WheelError::UnknownRequest.into()),
        };
        let Some(mut player) = self.load_player(&pending.player).await? else {
            return Err(anyhow::anyhow!("pending spin {request_id:?} has no player").into());
        };
        if player.pending_request.as_ref() != Some(request_id) {
            return Err(anyhow::anyhow!("pending spin {request_id:?} not bound to its player").into());
        }

        self.remove(Key::PendingSpin(*request_id));
        player.pending_request = None;

        let prize = Prize::from_randomness(randomness.as_ref());
        let effect = prize.effect(player.balance, pool.spin_fee);
        let settlement = pool.settle(&mut player, effect)?;
        player.last_prize = Some(prize);
        player.spins = player
            .spins
            .checked_add(1)
            .ok_or(WheelError::ArithmeticOverflow)?;
        player.refresh_status();

        debug!(
            player = ?pending.player,
            ?prize,
            credited = settlement.credited,
            debited = settlement.debited,
            "prize resolved"
        );
        let event = Event::PrizeResolved {
            player: pending.player.clone(),
            request_id: *request_id,
            prize,
            balance: player.balance,
            unclaimed_winnings: player.unclaimed_winnings,
            credited: settlement.credited,
            debited: settlement.debited,
        };
        self.store_player(&pending.player, player);
        self.store_pool(pool)?;

        Ok(vec![event])
    }
}
