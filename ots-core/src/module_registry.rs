//! Hardware-Module und ihre Registry
//!
//! Ein Modul kapselt ein Stück Hardware (Nuke-Panel, Alert-Panel, Link-LED)
//! mit einheitlichem Lebenszyklus: `init` beim Boot, `update` periodisch,
//! `handle_event` für jedes Event vom Bus, `shutdown` beim Herunterfahren.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use heapless::Vec;

use crate::config::MAX_MODULES;
use crate::error::{ModuleError, RegistryError};
use crate::event_bus::EventHandler;
use crate::types::{Event, ModuleStatus};

/// Schnittstelle eines Hardware-Moduls
pub trait Module {
    /// Name für Logs und Diagnose
    fn name(&self) -> &str;

    /// Deaktivierte Module werden weder initialisiert noch aktualisiert
    fn enabled(&self) -> bool {
        true
    }

    fn init(&mut self) -> Result<(), ModuleError>;

    fn update(&mut self) -> Result<(), ModuleError>;

    /// Gibt `true` zurück, wenn das Modul das Event verarbeitet hat
    fn handle_event(&mut self, event: &Event) -> bool;

    fn status(&self) -> ModuleStatus;

    fn shutdown(&mut self) -> Result<(), ModuleError> {
        Ok(())
    }
}

/// Registry mit fester Kapazität (`MAX_MODULES`)
///
/// Die Reihenfolge der Registrierung bestimmt die Reihenfolge von
/// `init_all`, `update_all` und `route_event`.
pub struct ModuleRegistry<'a> {
    modules: Vec<&'a mut dyn Module, MAX_MODULES>,
}

impl Default for ModuleRegistry<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> ModuleRegistry<'a> {
    pub const fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    pub fn register(&mut self, module: &'a mut dyn Module) -> Result<(), RegistryError> {
        if self.modules.is_full() {
            warn!("Modules: registry full, rejecting {}", module.name());
            return Err(RegistryError::RegistryFull);
        }
        info!("Modules: registered {}", module.name());
        self.modules
            .push(module)
            .map_err(|_| RegistryError::RegistryFull)
    }

    /// Initialisiert alle aktiven Module in Registrierungsreihenfolge
    ///
    /// Der erste Fehler bricht ab; nachfolgende Module bleiben uninitialisiert.
    pub fn init_all(&mut self) -> Result<(), RegistryError> {
        for (index, module) in self.modules.iter_mut().enumerate() {
            if !module.enabled() {
                info!("Modules: {} disabled, skipping init", module.name());
                continue;
            }
            module.init().map_err(|source| {
                error!("Modules: init of {} failed: {}", module.name(), source);
                RegistryError::InitFailed { index, source }
            })?;
            info!("Modules: {} initialized", module.name());
        }
        Ok(())
    }

    /// Ruft `update` aller aktiven Module auf
    ///
    /// Fehler werden geloggt und gezählt, die Iteration läuft weiter.
    pub fn update_all(&mut self) -> usize {
        let mut failures = 0;
        for module in self.modules.iter_mut().filter(|m| m.enabled()) {
            if let Err(e) = module.update() {
                warn!("Modules: update of {} failed: {}", module.name(), e);
                failures += 1;
            }
        }
        failures
    }

    /// Reicht ein Event an alle aktiven Module weiter
    pub fn route_event(&mut self, event: &Event) -> bool {
        let mut handled = false;
        for module in self.modules.iter_mut().filter(|m| m.enabled()) {
            handled |= module.handle_event(event);
        }
        handled
    }

    /// Fährt alle aktiven Module in umgekehrter Reihenfolge herunter
    pub fn shutdown_all(&mut self) {
        for module in self.modules.iter_mut().rev().filter(|m| m.enabled()) {
            if let Err(e) = module.shutdown() {
                warn!("Modules: shutdown of {} failed: {}", module.name(), e);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Status aller Module (auch deaktivierter) in Registrierungsreihenfolge
    pub fn statuses(&self) -> impl Iterator<Item = (&str, ModuleStatus)> + '_ {
        self.modules.iter().map(|m| (m.name(), m.status()))
    }
}

/// Registry, geteilt zwischen Dispatcher- und Update-Task
///
/// Beide Tasks laufen auf demselben Executor und halten die Sperre nie über
/// einen `await`-Punkt.
pub struct SharedModules<'a> {
    inner: Mutex<NoopRawMutex, RefCell<ModuleRegistry<'a>>>,
}

impl<'a> SharedModules<'a> {
    pub fn new(registry: ModuleRegistry<'a>) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(registry)),
        }
    }

    /// Exklusiver Zugriff auf die Registry
    pub fn with<R>(&self, f: impl FnOnce(&mut ModuleRegistry<'a>) -> R) -> R {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }

    pub fn update_all(&self) -> usize {
        self.with(|registry| registry.update_all())
    }
}

/// Als Wildcard-Handler registriert, leitet jedes Event an die Module weiter
impl EventHandler for SharedModules<'_> {
    fn handle(&self, event: &Event) -> bool {
        self.with(|registry| registry.route_event(event))
    }
}
