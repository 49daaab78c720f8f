use std::time::Duration;

use tracing::trace;

use super::{AuraDuration, AuraState, Reactivation};
use crate::engine::{Pending, Sim};
use crate::types::AuraId;

impl Sim {
    /// Activates an inactive aura with one stack.
    ///
    /// On an active aura this is a no-op, unless the aura was configured
    /// with [`Reactivation::Refresh`], in which case it refreshes.
    pub fn activate_aura(&mut self, aura: AuraId) {
        let bp = self.blueprint();
        let def = bp.aura(aura);
        if self.aura_state(aura).active {
            if def.reactivation == Reactivation::Refresh {
                self.refresh_aura(aura);
            }
            return;
        }

        let now = self.now();
        let expires = match def.duration {
            AuraDuration::Finite(duration) => {
                Some(self.schedule_pending(now + duration, Pending::AuraExpire(aura)))
            }
            AuraDuration::NeverExpires => None,
        };
        let state = self.aura_state_mut(aura);
        state.active = true;
        state.stacks = 1;
        state.expires = expires;
        state.gained_at = now;
        state.activations += 1;
        trace!(target: "sim::aura", aura = %def.label, unit = %def.unit, at = %now, "gained");

        if let Some(dot) = def.dot {
            self.apply_dot(dot);
        }
        if let Some(hook) = &def.hooks.on_stacks_change {
            hook(self, aura, 0, 1);
        }
        if self.aura_state(aura).active {
            if let Some(hook) = &def.hooks.on_gain {
                hook(self, aura);
            }
        }
    }

    /// Restarts the expiry timer of an active aura without touching its
    /// stacks or re-running `on_gain`. Inactive auras are left alone.
    pub fn refresh_aura(&mut self, aura: AuraId) {
        if !self.aura_state(aura).active {
            return;
        }
        let bp = self.blueprint();
        let def = bp.aura(aura);
        let now = self.now();
        if let AuraDuration::Finite(duration) = def.duration {
            if let Some(old) = self.aura_state_mut(aura).expires.take() {
                self.cancel(old);
            }
            let handle = self.schedule_pending(now + duration, Pending::AuraExpire(aura));
            self.aura_state_mut(aura).expires = Some(handle);
        }
        if let Some(dot) = def.dot {
            self.refresh_dot(dot);
        }
        trace!(target: "sim::aura", aura = %def.label, at = %now, "refreshed");
        if let Some(hook) = &def.hooks.on_refresh {
            hook(self, aura);
        }
    }

    /// Adds `count` stacks, clamped to the aura's maximum. Inactive auras
    /// ignore the call.
    pub fn add_stack(&mut self, aura: AuraId, count: u32) {
        let stacks = self.aura_state(aura).stacks;
        self.change_stacks(aura, stacks.saturating_add(count));
    }

    pub fn remove_stack(&mut self, aura: AuraId, count: u32) {
        let stacks = self.aura_state(aura).stacks;
        self.set_stacks(aura, stacks.saturating_sub(count));
    }

    /// Sets the stack count of an active aura, clamped to its maximum.
    /// Setting zero deactivates the aura.
    pub fn set_stacks(&mut self, aura: AuraId, stacks: u32) {
        if stacks == 0 {
            self.deactivate_aura(aura);
        } else {
            self.change_stacks(aura, stacks);
        }
    }

    fn change_stacks(&mut self, aura: AuraId, requested: u32) {
        let state = self.aura_state(aura);
        if !state.active {
            return;
        }
        let bp = self.blueprint();
        let def = bp.aura(aura);
        let old = state.stacks;
        let new = requested.clamp(1, def.stack_limit());
        if new == old {
            return;
        }
        self.aura_state_mut(aura).stacks = new;
        trace!(target: "sim::aura", aura = %def.label, old, new, "stacks changed");
        if let Some(hook) = &def.hooks.on_stacks_change {
            hook(self, aura, old, new);
        }
    }

    /// Removes an active aura. Permanent auras ignore the call.
    pub fn deactivate_aura(&mut self, aura: AuraId) {
        let bp = self.blueprint();
        let def = bp.aura(aura);
        if !self.aura_state(aura).active || def.permanent {
            return;
        }
        let now = self.now();
        let state = self.aura_state_mut(aura);
        let old = state.stacks;
        let expires = state.expires.take();
        state.active = false;
        state.stacks = 0;
        state.uptime += now.since(state.gained_at);

        if let Some(handle) = expires {
            self.cancel(handle);
        }
        if let Some(dot) = def.dot {
            self.cancel_dot(dot);
        }
        trace!(target: "sim::aura", aura = %def.label, unit = %def.unit, at = %now, "faded");
        if old != 0 {
            if let Some(hook) = &def.hooks.on_stacks_change {
                hook(self, aura, old, 0);
            }
        }
        if let Some(hook) = &def.hooks.on_expire {
            hook(self, aura);
        }
    }

    /// Natural expiry. A dot tick due at the same instant fires first.
    pub(crate) fn expire_aura(&mut self, aura: AuraId) {
        self.aura_state_mut(aura).expires = None;
        if let Some(dot) = self.blueprint_ref().aura(aura).dot {
            self.flush_due_dot_tick(dot);
        }
        // The final tick may have refreshed or removed the aura.
        let state = self.aura_state(aura);
        if state.active && state.expires.is_none() {
            self.deactivate_aura(aura);
        }
    }

    pub fn is_aura_active(&self, aura: AuraId) -> bool {
        self.aura_state(aura).active
    }

    pub fn aura_stacks(&self, aura: AuraId) -> u32 {
        self.aura_state(aura).stacks
    }

    /// Time left before expiry; `None` when inactive or never expiring.
    pub fn aura_remaining(&self, aura: AuraId) -> Option<Duration> {
        let state = self.aura_state(aura);
        if !state.active {
            return None;
        }
        state.expires.map(|handle| handle.at().since(self.now()))
    }

    /// Clears every aura and runs reset hooks in registration order.
    pub(crate) fn reset_auras(&mut self) {
        for state in &mut self.auras {
            *state = AuraState::default();
        }
        let bp = self.blueprint();
        for def in bp.auras() {
            if let Some(hook) = &def.hooks.on_reset {
                hook(self, def.id);
            }
            if def.permanent || def.auto_activate {
                self.activate_aura(def.id);
            }
        }
    }
}
