//! Periodic effects bound to an aura's active window.
//!
//! A dot starts ticking when its aura activates and stops when the aura
//! fades. Each tick sees the aura's stack count at that moment, so stacks
//! gained mid-duration scale the remaining ticks.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::trace;

use crate::engine::{EventHandle, Pending, Sim};
use crate::types::{AuraId, DotId, SpellId};

/// Hook run on every tick.
pub type DotTickHook = Arc<dyn Fn(&mut Sim, &DotTick) + Send + Sync>;

/// What happens to a running dot when its aura is refreshed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DotRefreshPolicy {
    /// Restart the full tick count, next tick one interval from now.
    #[default]
    Reset,
    /// Keep the current tick schedule.
    Unchanged,
}

/// Context passed to a tick hook.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DotTick {
    pub dot: DotId,
    pub aura: AuraId,
    pub spell: Option<SpellId>,
    /// Aura stacks at the time of this tick.
    pub stacks: u32,
    /// 1-based tick number since the last application.
    pub tick: u32,
}

/// Builder passed to [`crate::Registry::new_dot`].
#[derive(Clone)]
pub struct DotConfig {
    pub aura: AuraId,
    pub spell: Option<SpellId>,
    pub ticks: u32,
    pub tick_length: Duration,
    pub refresh: DotRefreshPolicy,
    pub(crate) on_tick: Option<DotTickHook>,
}

impl DotConfig {
    pub fn new(aura: AuraId, ticks: u32, tick_length: Duration) -> Self {
        Self {
            aura,
            spell: None,
            ticks,
            tick_length,
            refresh: DotRefreshPolicy::Reset,
            on_tick: None,
        }
    }

    pub fn spell(mut self, spell: SpellId) -> Self {
        self.spell = Some(spell);
        self
    }

    pub fn refresh(mut self, policy: DotRefreshPolicy) -> Self {
        self.refresh = policy;
        self
    }

    pub fn on_tick<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Sim, &DotTick) + Send + Sync + 'static,
    {
        self.on_tick = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for DotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DotConfig")
            .field("aura", &self.aura)
            .field("spell", &self.spell)
            .field("ticks", &self.ticks)
            .field("tick_length", &self.tick_length)
            .field("refresh", &self.refresh)
            .finish_non_exhaustive()
    }
}

/// Registered dot; same shape as its config.
pub type DotDef = DotConfig;

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct DotState {
    pub(crate) ticks_remaining: u32,
    pub(crate) pending: Option<EventHandle>,
}

impl Sim {
    pub fn dot_ticks_remaining(&self, dot: DotId) -> u32 {
        self.dot_state(dot).ticks_remaining
    }

    pub fn is_dot_ticking(&self, dot: DotId) -> bool {
        self.dot_state(dot).pending.is_some()
    }

    pub(crate) fn apply_dot(&mut self, dot: DotId) {
        let bp = self.blueprint();
        let def = bp.dot(dot);
        if let Some(pending) = self.dot_state_mut(dot).pending.take() {
            self.cancel(pending);
        }
        let at = self.now() + def.tick_length;
        let handle = self.schedule_pending(at, Pending::DotTick(dot));
        let state = self.dot_state_mut(dot);
        state.ticks_remaining = def.ticks;
        state.pending = Some(handle);
    }

    pub(crate) fn refresh_dot(&mut self, dot: DotId) {
        match self.blueprint_ref().dot(dot).refresh {
            DotRefreshPolicy::Reset => self.apply_dot(dot),
            DotRefreshPolicy::Unchanged => {}
        }
    }

    pub(crate) fn cancel_dot(&mut self, dot: DotId) {
        let state = self.dot_state_mut(dot);
        state.ticks_remaining = 0;
        if let Some(pending) = state.pending.take() {
            self.cancel(pending);
        }
    }

    /// Fires the pending tick now if it is due at the current instant.
    pub(crate) fn flush_due_dot_tick(&mut self, dot: DotId) {
        let now = self.now();
        let Some(pending) = self.dot_state(dot).pending else {
            return;
        };
        if pending.at() == now {
            self.cancel(pending);
            self.tick_dot(dot);
        }
    }

    pub(crate) fn tick_dot(&mut self, dot: DotId) {
        let bp = self.blueprint();
        let def = bp.dot(dot);
        self.dot_state_mut(dot).pending = None;
        if self.dot_state(dot).ticks_remaining == 0 || !self.is_aura_active(def.aura) {
            return;
        }

        let remaining = self.dot_state(dot).ticks_remaining - 1;
        let next = if remaining > 0 {
            let at = self.now() + def.tick_length;
            Some(self.schedule_pending(at, Pending::DotTick(dot)))
        } else {
            None
        };
        let state = self.dot_state_mut(dot);
        state.ticks_remaining = remaining;
        state.pending = next;

        let tick = DotTick {
            dot,
            aura: def.aura,
            spell: def.spell,
            stacks: self.aura_stacks(def.aura),
            tick: def.ticks - remaining,
        };
        trace!(
            target: "sim::dot",
            dot = %dot,
            tick = tick.tick,
            stacks = tick.stacks,
            at = %self.now(),
            "tick"
        );
        if let Some(hook) = &def.on_tick {
            hook(self, &tick);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::aura::AuraConfig;
    use crate::registry::Registry;
    use crate::types::SimTime;

    type Ticks = Arc<Mutex<Vec<(SimTime, u32, u32)>>>;

    fn poison(policy: DotRefreshPolicy, duration: Duration) -> (Sim, AuraId, DotId, Ticks) {
        let ticks: Ticks = Arc::default();
        let log = Arc::clone(&ticks);
        let mut registry = Registry::new();
        let unit = registry.add_unit("Target");
        let aura = registry
            .register_aura(
                unit,
                AuraConfig::new("Deadly Poison").duration(duration).max_stacks(5),
            )
            .unwrap();
        let dot = registry
            .new_dot(
                DotConfig::new(aura, 4, Duration::from_secs(3))
                    .refresh(policy)
                    .on_tick(move |sim, tick| {
                        log.lock().unwrap().push((sim.now(), tick.tick, tick.stacks));
                    }),
            )
            .unwrap();
        let sim = Sim::new(Arc::new(registry.finish().unwrap()), 0);
        (sim, aura, dot, ticks)
    }

    fn secs(s: u64) -> SimTime {
        SimTime::from_millis(s * 1000)
    }

    #[test]
    fn ticks_at_each_interval_with_current_stacks() {
        let (mut sim, aura, dot, ticks) = poison(DotRefreshPolicy::Reset, Duration::from_secs(12));
        sim.run_until(secs(1));
        sim.activate_aura(aura);
        sim.run_until(secs(5));
        sim.add_stack(aura, 2);
        sim.run_until(secs(30));

        assert_eq!(
            *ticks.lock().unwrap(),
            vec![(secs(4), 1, 1), (secs(7), 2, 3), (secs(10), 3, 3), (secs(13), 4, 3)]
        );
        assert!(!sim.is_aura_active(aura), "aura faded after its final tick");
        assert!(!sim.is_dot_ticking(dot));
    }

    #[test]
    fn reset_policy_restarts_ticks() {
        let (mut sim, aura, dot, ticks) = poison(DotRefreshPolicy::Reset, Duration::from_secs(12));
        sim.activate_aura(aura);
        sim.run_until(secs(7));
        assert_eq!(sim.dot_ticks_remaining(dot), 2);
        sim.refresh_aura(aura);
        assert_eq!(sim.dot_ticks_remaining(dot), 4);
        sim.run_until(secs(40));

        let times: Vec<SimTime> = ticks.lock().unwrap().iter().map(|t| t.0).collect();
        assert_eq!(times, vec![secs(3), secs(6), secs(10), secs(13), secs(16), secs(19)]);
    }

    #[test]
    fn unchanged_policy_keeps_schedule() {
        let (mut sim, aura, dot, ticks) =
            poison(DotRefreshPolicy::Unchanged, Duration::from_secs(12));
        sim.activate_aura(aura);
        sim.run_until(secs(7));
        sim.refresh_aura(aura);
        assert_eq!(sim.dot_ticks_remaining(dot), 2);
        sim.run_until(secs(40));
        assert_eq!(ticks.lock().unwrap().len(), 4);
    }

    #[test]
    fn deactivation_stops_ticking() {
        let (mut sim, aura, dot, ticks) = poison(DotRefreshPolicy::Reset, Duration::from_secs(12));
        sim.activate_aura(aura);
        sim.run_until(secs(4));
        sim.deactivate_aura(aura);
        assert!(!sim.is_dot_ticking(dot));
        sim.run_until(secs(40));
        assert_eq!(ticks.lock().unwrap().len(), 1);
    }

    #[test]
    fn invalid_dots_are_rejected() {
        let mut registry = Registry::new();
        let unit = registry.add_unit("Target");
        let aura = registry.register_aura(unit, AuraConfig::new("Rupture")).unwrap();
        assert!(registry.new_dot(DotConfig::new(aura, 0, Duration::from_secs(2))).is_err());
        assert!(registry.new_dot(DotConfig::new(aura, 3, Duration::ZERO)).is_err());
        registry.new_dot(DotConfig::new(aura, 3, Duration::from_secs(2))).unwrap();
        assert!(registry.new_dot(DotConfig::new(aura, 3, Duration::from_secs(2))).is_err());
    }
}
