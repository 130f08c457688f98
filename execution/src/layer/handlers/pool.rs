use super::super::*;
use tracing::info;

impl<'a, S: State> Layer<'a, S> {
    pub(in crate::layer) async fn handle_create_pool(
        &mut self,
        public: &PublicKey,
        entry_fee: u64,
        spin_fee: u64,
        coordinator: &PublicKey,
    ) -> Result<Vec<Event>, ApplyError> {
        if self.get(&Key::Pool).await?.is_some() {
            return Err(WheelError::PoolAlreadyExists.into());
        }
        let pool = Pool::new(public.clone(), coordinator.clone(), entry_fee, spin_fee)?;
        let event = Event::PoolCreated {
            operator: pool.operator.clone(),
            coordinator: pool.coordinator.clone(),
            entry_fee: pool.entry_fee,
            spin_fee: pool.spin_fee,
            minimum_funding: pool.minimum_funding,
        };
        info!(
            operator = ?pool.operator,
            entry_fee,
            spin_fee,
            minimum_funding = pool.minimum_funding,
            "pool created"
        );
        self.store_pool(pool)?;

        Ok(vec![event])
    }

    pub(in crate::layer) async fn handle_fund(
        &mut self,
        public: &PublicKey,
        amount: u64,
    ) -> Result<Vec<Event>, ApplyError> {
        let mut pool = self.load_pool().await?;
        if !pool.is_operator(public) {
            return Err(WheelError::AccessDenied.into());
        }
        let opened = pool.fund(amount)?;

        let mut events = vec![Event::PoolFunded {
            amount,
            total_held: pool.total_held,
        }];
        if opened {
            info!(total_held = pool.total_held, "pool opened");
            events.push(Event::PoolOpened {
                total_held: pool.total_held,
            });
        }
        self.store_pool(pool)?;

        Ok(events)
    }

    /// Forfeit every stake to the house, release the reserve to the operator and keep
    /// outstanding winnings held for claims.
    pub(in crate::layer) async fn handle_close(
        &mut self,
        public: &PublicKey,
    ) -> Result<Vec<Event>, ApplyError> {
        let mut pool = self.load_pool().await?;
        if !pool.is_operator(public) {
            return Err(WheelError::AccessDenied.into());
        }
        if pool.is_closed() {
            return Err(WheelError::PoolClosed.into());
        }

        let mut forfeited = 0u64;
        for index in 0..pool.participants {
            let participant = match self.get(&Key::Participant(index)).await? {
                Some(Value::Participant(participant)) => participant,
                _ => {
                    return Err(anyhow::anyhow!("participant {index} missing from registry").into())
                }
            };
            let Some(mut player) = self.load_player(&participant).await? else {
                return Err(anyhow::anyhow!("participant {index} has no ledger").into());
            };
            forfeited = forfeited.saturating_add(pool.forfeit_stake(&mut player)?);
            self.store_player(&participant, player);
        }

        let amount = pool.close()?;
        let reserved_winnings = pool.total_winnings;
        info!(
            amount,
            forfeited,
            reserved_winnings,
            participants = pool.participants,
            "pool closed"
        );
        self.store_pool(pool)?;

        Ok(vec![Event::PoolClosed {
            operator: public.clone(),
            amount,
            reserved_winnings,
        }])
    }
}
