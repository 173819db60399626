//! Dwell times and switching quota
//!
//! Every tick each consumer earns a small quota increment; every connect or
//! disconnect costs one unit. A consumer that was disconnected must wait
//! `cooldown_short` seconds before it may reconnect, or only
//! `cooldown_long` seconds while its quota is at least one.

use chrono::{DateTime, Utc};
use directline_common::{QUOTA_RELEASE_THRESHOLD, SWITCH_COST};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Per-consumer switching state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchingState {
    /// Switching budget, never clamped
    pub quota: f64,
    /// Time of the last true-to-false transition
    pub last_disconnect: Option<DateTime<Utc>>,
    /// Connect state decided in the current tick
    pub connected: bool,
    /// Connect state of the previous tick
    pub previously_connected: bool,
}

impl Default for SwitchingState {
    fn default() -> Self {
        Self {
            quota: 0.0,
            last_disconnect: None,
            connected: false,
            previously_connected: false,
        }
    }
}

impl SwitchingState {
    /// Whole seconds since the last disconnect, `None` if it never disconnected
    pub fn seconds_since_disconnect(&self, now: DateTime<Utc>) -> Option<i64> {
        self.last_disconnect
            .map(|at| now.signed_duration_since(at).num_seconds())
    }
}

/// Why a consumer may or may not be connected this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Eligibility {
    /// Connected in the previous tick, staying connected is always allowed
    StayConnected,
    /// The short cooldown has passed
    CooldownElapsed,
    /// Quota of at least one and the long cooldown has passed
    QuotaRelease,
    /// Still within its dwell time
    Locked,
}

impl Eligibility {
    #[inline]
    pub fn is_eligible(self) -> bool {
        !matches!(self, Eligibility::Locked)
    }
}

/// Connect-state change of one consumer between two ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchTransition {
    Connected,
    Disconnected,
    Unchanged,
}

impl SwitchTransition {
    fn between(previous: bool, current: bool) -> Self {
        match (previous, current) {
            (false, true) => SwitchTransition::Connected,
            (true, false) => SwitchTransition::Disconnected,
            _ => SwitchTransition::Unchanged,
        }
    }

    #[inline]
    pub fn is_switch(self) -> bool {
        self != SwitchTransition::Unchanged
    }
}

/// Eligibility filter and quota accounting for all consumers
#[derive(Debug, Clone)]
pub struct DebounceController {
    cooldown_short_secs: i64,
    cooldown_long_secs: i64,
    quota_increment: f64,
    states: Vec<SwitchingState>,
}

impl DebounceController {
    pub fn new(
        consumer_count: usize,
        cooldown_short_secs: i64,
        cooldown_long_secs: i64,
        quota_increment: f64,
    ) -> Self {
        Self {
            cooldown_short_secs,
            cooldown_long_secs,
            quota_increment,
            states: vec![SwitchingState::default(); consumer_count],
        }
    }

    pub fn states(&self) -> &[SwitchingState] {
        &self.states
    }

    pub fn state(&self, index: usize) -> Option<&SwitchingState> {
        self.states.get(index)
    }

    /// Current connect state of every consumer
    pub fn connect_state(&self) -> Vec<bool> {
        self.states.iter().map(|s| s.connected).collect()
    }

    /// Earn the per-tick quota and shift current state into previous
    pub fn begin_tick(&mut self) {
        for state in &mut self.states {
            state.quota += self.quota_increment;
            state.previously_connected = state.connected;
        }
    }

    /// Reconnection eligibility of consumer `index` at `now`
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn eligibility(&self, index: usize, now: DateTime<Utc>) -> Eligibility {
        let state = &self.states[index];
        if state.previously_connected {
            return Eligibility::StayConnected;
        }

        // Never disconnected: no dwell time applies
        let elapsed = match state.seconds_since_disconnect(now) {
            None => return Eligibility::CooldownElapsed,
            Some(secs) => secs,
        };

        if elapsed >= self.cooldown_short_secs {
            Eligibility::CooldownElapsed
        } else if state.quota >= QUOTA_RELEASE_THRESHOLD && elapsed >= self.cooldown_long_secs {
            Eligibility::QuotaRelease
        } else {
            Eligibility::Locked
        }
    }

    /// Zero the consumption of consumers that may not be connected this tick
    ///
    /// Returns the filtered consumption and the eligibility mask.
    pub fn filter_consumption(
        &self,
        now: DateTime<Utc>,
        consumption: &[f64],
    ) -> (Vec<f64>, Vec<bool>) {
        let eligible: Vec<bool> = (0..self.states.len())
            .map(|i| self.eligibility(i, now).is_eligible())
            .collect();
        let filtered = consumption
            .iter()
            .zip(&eligible)
            .map(|(&c, &ok)| if ok { c } else { 0.0 })
            .collect();
        (filtered, eligible)
    }

    /// Record the tick's decision and charge every switch against the quota
    pub fn apply_decision(&mut self, connect: &[bool], now: DateTime<Utc>) -> Vec<SwitchTransition> {
        debug_assert_eq!(connect.len(), self.states.len());

        let mut transitions = Vec::with_capacity(self.states.len());
        for (index, (state, &decision)) in self.states.iter_mut().zip(connect).enumerate() {
            state.connected = decision;
            let transition = SwitchTransition::between(state.previously_connected, decision);
            match transition {
                SwitchTransition::Connected => {
                    state.quota -= SWITCH_COST;
                }
                SwitchTransition::Disconnected => {
                    state.quota -= SWITCH_COST;
                    state.last_disconnect = Some(now);
                }
                SwitchTransition::Unchanged => {}
            }
            if transition.is_switch() {
                debug!(consumer = index, ?transition, quota = state.quota, "Consumer switched");
            }
            transitions.push(transition);
        }
        transitions
    }
}
