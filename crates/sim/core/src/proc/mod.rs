//! Proc trigger engine.
//!
//! Every combat event goes through [`Sim::emit`]. The observing unit's
//! active auras that listen to the event kind run in registration order:
//! first the aura's own event hook, then each proc trigger it carries.
//! Hooks and triggers may emit further events; those are dispatched
//! synchronously before the outer dispatch continues.

mod event;
mod trigger;

pub use event::{Callbacks, CombatEvent, EventKind, Outcome, ProcMask};
pub(crate) use trigger::TriggerState;
pub use trigger::{ProcAction, ProcChance, ProcHook, ProcTrigger, TriggerDef, ppm_chance};

use crate::config::SimConfig;
use crate::engine::Sim;

impl Sim {
    /// Dispatches one combat event to the observing unit's auras.
    ///
    /// # Panics
    ///
    /// Panics when nested dispatch exceeds [`SimConfig::MAX_EVENT_DEPTH`],
    /// which only happens when effects trigger each other without end.
    pub fn emit(&mut self, event: CombatEvent) {
        if self.event_depth >= SimConfig::MAX_EVENT_DEPTH {
            panic!(
                "combat event cascade exceeded {} nested dispatches ({} from {})",
                SimConfig::MAX_EVENT_DEPTH,
                event.kind,
                event.unit
            );
        }
        self.event_depth += 1;

        let bp = self.blueprint();
        for &aura in bp.listeners(event.observer(), event.kind) {
            if !self.is_aura_active(aura) {
                continue;
            }
            let def = bp.aura(aura);
            if let Some(hook) = def.hooks.event(event.kind) {
                hook(self, aura, &event);
            }
            for &trigger in &def.triggers {
                self.evaluate_trigger(trigger, &event);
            }
        }

        self.event_depth -= 1;
    }

    /// Emits `event` and, for hits, the mirrored event on the target side.
    pub(crate) fn emit_with_mirror(&mut self, event: CombatEvent) {
        self.emit(event);
        if let Some(mirrored) = event.mirrored() {
            self.emit(mirrored);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::aura::AuraConfig;
    use crate::registry::Registry;
    use crate::types::UnitId;

    fn event(kind: EventKind, unit: UnitId, target: UnitId) -> CombatEvent {
        CombatEvent {
            kind,
            unit,
            target,
            spell: None,
            proc_mask: ProcMask::SPELL_DAMAGE,
            outcome: Outcome::HIT,
            amount: 1.0,
        }
    }

    #[test]
    fn listeners_run_in_registration_order() {
        let log: Arc<Mutex<Vec<&'static str>>> = Arc::default();
        let mut registry = Registry::new();
        let unit = registry.add_unit("Mage");
        let target = registry.add_unit("Target");
        for label in ["first", "second", "third"] {
            let log = Arc::clone(&log);
            let aura = registry
                .register_aura(
                    unit,
                    AuraConfig::new(label).on_spell_hit_dealt(move |_, _, _| {
                        log.lock().unwrap().push(label);
                    }),
                )
                .unwrap();
            registry.make_permanent(aura).unwrap();
        }
        let mut sim = Sim::new(Arc::new(registry.finish().unwrap()), 0);

        sim.emit(event(EventKind::SpellHitDealt, unit, target));
        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);

        // The target observes only the taken side.
        sim.emit(event(EventKind::SpellHitDealt, target, unit));
        assert_eq!(log.lock().unwrap().len(), 3);
    }

    #[test]
    fn inactive_auras_are_skipped() {
        let hits = Arc::new(Mutex::new(0));
        let mut registry = Registry::new();
        let unit = registry.add_unit("Priest");
        let counter = Arc::clone(&hits);
        let aura = registry
            .register_aura(
                unit,
                AuraConfig::new("Inner Focus").on_cast_complete(move |_, _, _| {
                    *counter.lock().unwrap() += 1;
                }),
            )
            .unwrap();
        let mut sim = Sim::new(Arc::new(registry.finish().unwrap()), 0);

        sim.emit(event(EventKind::CastComplete, unit, unit));
        assert_eq!(*hits.lock().unwrap(), 0);
        sim.activate_aura(aura);
        sim.emit(event(EventKind::CastComplete, unit, unit));
        assert_eq!(*hits.lock().unwrap(), 1);
    }

    #[test]
    fn cascades_recurse_synchronously() {
        let mut registry = Registry::new();
        let unit = registry.add_unit("Shaman");
        let target = registry.add_unit("Target");
        let echo = registry.register_aura(unit, AuraConfig::new("Echo")).unwrap();
        let source = registry
            .register_aura(
                unit,
                AuraConfig::new("Source").on_spell_hit_dealt(move |sim, _, ev| {
                    if ev.proc_mask == ProcMask::SPELL_DAMAGE {
                        sim.emit(CombatEvent {
                            kind: EventKind::HealDealt,
                            proc_mask: ProcMask::SPELL_HEALING,
                            ..*ev
                        });
                    }
                }),
            )
            .unwrap();
        registry
            .make_proc_trigger_aura(
                unit,
                ProcTrigger::new("Echo Trigger", Callbacks::HEAL_DEALT)
                    .action(ProcAction::Activate(echo)),
            )
            .unwrap();
        registry.make_permanent(source).unwrap();
        let mut sim = Sim::new(Arc::new(registry.finish().unwrap()), 0);

        sim.emit(event(EventKind::SpellHitDealt, unit, target));
        assert!(sim.is_aura_active(echo));
    }

    #[test]
    #[should_panic(expected = "cascade exceeded")]
    fn runaway_cascade_aborts() {
        let mut registry = Registry::new();
        let unit = registry.add_unit("Loop");
        let aura = registry
            .register_aura(
                unit,
                AuraConfig::new("Feedback").on_spell_hit_dealt(|sim, _, ev| sim.emit(*ev)),
            )
            .unwrap();
        registry.make_permanent(aura).unwrap();
        let mut sim = Sim::new(Arc::new(registry.finish().unwrap()), 0);
        sim.emit(event(EventKind::SpellHitDealt, unit, unit));
    }

    #[test]
    fn units_without_auras_have_no_listeners() {
        let mut registry = Registry::new();
        let unit = registry.add_unit("Solo");
        let sim = Sim::new(Arc::new(registry.finish().unwrap()), 0);
        assert!(sim.blueprint().listeners(unit, EventKind::HealDealt).is_empty());
    }
}
