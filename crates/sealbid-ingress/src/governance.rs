//! Access & throttle guard.
//!
//! [`GovernanceState`] holds the owner, the provider set, the pause switch
//! and per-caller cooldown timestamps. It is passed explicitly into every
//! guarded operation rather than living in ambient globals.
//!
//! Guarded operations check, in order: pause, role, cooldown. Ownership
//! transfer, provider management and unpausing are not blocked by the pause
//! switch.

use std::{
    collections::{BTreeSet, HashMap},
    time::Duration,
};

use chrono::{DateTime, TimeDelta, Utc};
use sealbid_types::{Address, AuctionEvent, EngineConfig, Result, SealbidError};

/// The two throttled actions, each with its own cooldown window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThrottledAction {
    SubmitBid,
    RequestDecryption,
}

/// Role, pause and cooldown state for one engine.
#[derive(Debug, Clone)]
pub struct GovernanceState {
    owner: Address,
    providers: BTreeSet<Address>,
    paused: bool,
    submit_cooldown: Duration,
    decryption_cooldown: Duration,
    last_action: HashMap<(ThrottledAction, Address), DateTime<Utc>>,
}

impl GovernanceState {
    /// Create governance state owned by `owner`.
    ///
    /// # Errors
    /// - `ZeroAddress` if `owner` is the zero address
    /// - `Configuration` if a cooldown does not fit a timestamp offset
    pub fn new(owner: Address, submit_cooldown: Duration, decryption_cooldown: Duration) -> Result<Self> {
        if owner.is_zero() {
            return Err(SealbidError::ZeroAddress);
        }
        to_delta(submit_cooldown)?;
        to_delta(decryption_cooldown)?;
        Ok(Self {
            owner,
            providers: BTreeSet::new(),
            paused: false,
            submit_cooldown,
            decryption_cooldown,
            last_action: HashMap::new(),
        })
    }

    /// Create governance state with the cooldowns from `config`.
    pub fn from_config(owner: Address, config: &EngineConfig) -> Result<Self> {
        Self::new(owner, config.submit_cooldown(), config.decryption_cooldown())
    }

    // -----------------------------------------------------------------
    // Guards
    // -----------------------------------------------------------------

    pub fn ensure_not_paused(&self) -> Result<()> {
        if self.paused {
            return Err(SealbidError::Paused);
        }
        Ok(())
    }

    pub fn ensure_owner(&self, caller: Address) -> Result<()> {
        if caller != self.owner {
            return Err(SealbidError::NotOwner(caller));
        }
        Ok(())
    }

    pub fn ensure_provider(&self, caller: Address) -> Result<()> {
        if !self.providers.contains(&caller) {
            return Err(SealbidError::NotProvider(caller));
        }
        Ok(())
    }

    /// Fail with `CooldownActive` if `caller` performed `action` less than
    /// one cooldown window before `now`.
    pub fn check_cooldown(
        &self,
        action: ThrottledAction,
        caller: Address,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let Some(last) = self.last_action.get(&(action, caller)) else {
            return Ok(());
        };
        let window = to_delta(self.cooldown(action))?;
        let ready_at = last.checked_add_signed(window).unwrap_or(DateTime::<Utc>::MAX_UTC);
        if now < ready_at {
            tracing::debug!(caller = %caller.short(), ?action, %ready_at, "Cooldown active");
            return Err(SealbidError::CooldownActive { caller, ready_at });
        }
        Ok(())
    }

    /// Start a new cooldown window for `caller`.
    pub fn record_action(&mut self, action: ThrottledAction, caller: Address, now: DateTime<Utc>) {
        self.last_action.insert((action, caller), now);
    }

    // -----------------------------------------------------------------
    // Owner operations
    // -----------------------------------------------------------------

    /// Hand ownership to `new_owner`. Allowed while paused.
    pub fn transfer_ownership(&mut self, caller: Address, new_owner: Address) -> Result<AuctionEvent> {
        self.ensure_owner(caller)?;
        if new_owner.is_zero() {
            return Err(SealbidError::ZeroAddress);
        }
        let previous = std::mem::replace(&mut self.owner, new_owner);
        tracing::info!(previous = %previous, new_owner = %new_owner, "Ownership transferred");
        Ok(AuctionEvent::OwnershipTransferred {
            previous,
            new_owner,
        })
    }

    /// Register a bid provider. Returns `None` if it was already registered.
    pub fn add_provider(&mut self, caller: Address, provider: Address) -> Result<Option<AuctionEvent>> {
        self.ensure_owner(caller)?;
        if provider.is_zero() {
            return Err(SealbidError::ZeroAddress);
        }
        if !self.providers.insert(provider) {
            return Ok(None);
        }
        tracing::info!(provider = %provider, "Provider added");
        Ok(Some(AuctionEvent::ProviderAdded { provider }))
    }

    /// Deregister a bid provider. Returns `None` if it was not registered.
    pub fn remove_provider(&mut self, caller: Address, provider: Address) -> Result<Option<AuctionEvent>> {
        self.ensure_owner(caller)?;
        if provider.is_zero() {
            return Err(SealbidError::ZeroAddress);
        }
        if !self.providers.remove(&provider) {
            return Ok(None);
        }
        tracing::info!(provider = %provider, "Provider removed");
        Ok(Some(AuctionEvent::ProviderRemoved { provider }))
    }

    pub fn pause(&mut self, caller: Address) -> Result<AuctionEvent> {
        self.ensure_owner(caller)?;
        if self.paused {
            return Err(SealbidError::AlreadyPaused);
        }
        self.paused = true;
        tracing::warn!(by = %caller, "Engine paused");
        Ok(AuctionEvent::Paused { by: caller })
    }

    pub fn unpause(&mut self, caller: Address) -> Result<AuctionEvent> {
        self.ensure_owner(caller)?;
        if !self.paused {
            return Err(SealbidError::NotPaused);
        }
        self.paused = false;
        tracing::info!(by = %caller, "Engine unpaused");
        Ok(AuctionEvent::Unpaused { by: caller })
    }

    /// Replace both cooldown windows. Existing timestamps are kept, so the
    /// new windows apply to actions already taken.
    pub fn set_cooldowns(
        &mut self,
        caller: Address,
        submit: Duration,
        decryption: Duration,
    ) -> Result<AuctionEvent> {
        self.ensure_not_paused()?;
        self.ensure_owner(caller)?;
        to_delta(submit)?;
        to_delta(decryption)?;
        self.submit_cooldown = submit;
        self.decryption_cooldown = decryption;
        tracing::info!(?submit, ?decryption, "Cooldowns updated");
        Ok(AuctionEvent::CooldownsUpdated { submit, decryption })
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    #[must_use]
    pub fn owner(&self) -> Address {
        self.owner
    }

    #[must_use]
    pub fn is_provider(&self, address: &Address) -> bool {
        self.providers.contains(address)
    }

    #[must_use]
    pub fn providers(&self) -> impl Iterator<Item = &Address> {
        self.providers.iter()
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[must_use]
    pub fn cooldown(&self, action: ThrottledAction) -> Duration {
        match action {
            ThrottledAction::SubmitBid => self.submit_cooldown,
            ThrottledAction::RequestDecryption => self.decryption_cooldown,
        }
    }

    #[must_use]
    pub fn last_action(&self, action: ThrottledAction, caller: &Address) -> Option<DateTime<Utc>> {
        self.last_action.get(&(action, *caller)).copied()
    }
}

fn to_delta(window: Duration) -> Result<TimeDelta> {
    TimeDelta::from_std(window)
        .map_err(|_| SealbidError::Configuration(format!("cooldown {window:?} out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: Address = Address([0x0a; 20]);
    const ALICE: Address = Address([0xa1; 20]);

    fn gov() -> GovernanceState {
        GovernanceState::new(OWNER, Duration::from_secs(10), Duration::from_secs(60)).unwrap()
    }

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn zero_owner_rejected() {
        let err = GovernanceState::new(Address::ZERO, Duration::ZERO, Duration::ZERO).unwrap_err();
        assert!(matches!(err, SealbidError::ZeroAddress));
    }

    #[test]
    fn owner_checks() {
        let g = gov();
        assert!(g.ensure_owner(OWNER).is_ok());
        let err = g.ensure_owner(ALICE).unwrap_err();
        assert!(matches!(err, SealbidError::NotOwner(a) if a == ALICE));
    }

    #[test]
    fn add_provider_is_idempotent_without_duplicate_event() {
        let mut g = gov();
        let first = g.add_provider(OWNER, ALICE).unwrap();
        assert_eq!(first, Some(AuctionEvent::ProviderAdded { provider: ALICE }));
        assert!(g.is_provider(&ALICE));

        let second = g.add_provider(OWNER, ALICE).unwrap();
        assert_eq!(second, None);
    }

    #[test]
    fn remove_unknown_provider_is_noop() {
        let mut g = gov();
        assert_eq!(g.remove_provider(OWNER, ALICE).unwrap(), None);
        g.add_provider(OWNER, ALICE).unwrap();
        assert!(g.remove_provider(OWNER, ALICE).unwrap().is_some());
        assert!(!g.is_provider(&ALICE));
    }

    #[test]
    fn provider_management_is_owner_only() {
        let mut g = gov();
        let err = g.add_provider(ALICE, ALICE).unwrap_err();
        assert!(matches!(err, SealbidError::NotOwner(_)));
    }

    #[test]
    fn zero_provider_rejected() {
        let mut g = gov();
        let err = g.add_provider(OWNER, Address::ZERO).unwrap_err();
        assert!(matches!(err, SealbidError::ZeroAddress));
    }

    #[test]
    fn pause_twice_fails() {
        let mut g = gov();
        g.pause(OWNER).unwrap();
        assert!(g.is_paused());
        assert!(matches!(g.pause(OWNER).unwrap_err(), SealbidError::AlreadyPaused));
        assert!(matches!(g.ensure_not_paused().unwrap_err(), SealbidError::Paused));
        g.unpause(OWNER).unwrap();
        assert!(matches!(g.unpause(OWNER).unwrap_err(), SealbidError::NotPaused));
    }

    #[test]
    fn ownership_transfer_works_while_paused() {
        let mut g = gov();
        g.pause(OWNER).unwrap();
        let event = g.transfer_ownership(OWNER, ALICE).unwrap();
        assert_eq!(
            event,
            AuctionEvent::OwnershipTransferred {
                previous: OWNER,
                new_owner: ALICE
            }
        );
        assert_eq!(g.owner(), ALICE);
        assert!(g.ensure_owner(OWNER).is_err());
        // The new owner can unpause.
        g.unpause(ALICE).unwrap();
    }

    #[test]
    fn transfer_to_zero_rejected() {
        let mut g = gov();
        let err = g.transfer_ownership(OWNER, Address::ZERO).unwrap_err();
        assert!(matches!(err, SealbidError::ZeroAddress));
        assert_eq!(g.owner(), OWNER);
    }

    #[test]
    fn cooldown_window() {
        let mut g = gov();
        let action = ThrottledAction::SubmitBid;
        g.check_cooldown(action, ALICE, t(0)).unwrap();
        g.record_action(action, ALICE, t(0));

        let err = g.check_cooldown(action, ALICE, t(9)).unwrap_err();
        assert!(matches!(err, SealbidError::CooldownActive { ready_at, .. } if ready_at == t(10)));

        // Exactly at the boundary the window has elapsed.
        g.check_cooldown(action, ALICE, t(10)).unwrap();
    }

    #[test]
    fn cooldowns_are_per_action_and_caller() {
        let mut g = gov();
        g.record_action(ThrottledAction::SubmitBid, ALICE, t(0));
        g.check_cooldown(ThrottledAction::RequestDecryption, ALICE, t(1)).unwrap();
        g.check_cooldown(ThrottledAction::SubmitBid, OWNER, t(1)).unwrap();
    }

    #[test]
    fn set_cooldowns_applies_to_existing_timestamps() {
        let mut g = gov();
        g.record_action(ThrottledAction::SubmitBid, ALICE, t(0));
        g.set_cooldowns(OWNER, Duration::from_secs(2), Duration::from_secs(5)).unwrap();
        g.check_cooldown(ThrottledAction::SubmitBid, ALICE, t(2)).unwrap();
        assert_eq!(g.cooldown(ThrottledAction::RequestDecryption), Duration::from_secs(5));
    }

    #[test]
    fn set_cooldowns_blocked_while_paused() {
        let mut g = gov();
        g.pause(OWNER).unwrap();
        let err = g.set_cooldowns(OWNER, Duration::ZERO, Duration::ZERO).unwrap_err();
        assert!(matches!(err, SealbidError::Paused));
    }
}
