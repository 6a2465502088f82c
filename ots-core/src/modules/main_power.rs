//! Main-Power-Panel mit der Link-LED
//!
//! Die Link-LED zeigt den Verbindungszustand:
//! - aus: kein Netzwerk
//! - blinkt 500 ms: Netzwerk, aber keine WebSocket-Verbindung
//! - blinkt 200 ms: WebSocket-Fehler
//! - an: verbunden
//!
//! Nach einer Expander-Recovery blinkt die LED kurz schnell und kehrt dann
//! in den vorherigen Zustand zurück.

use crate::config::{LINK_BLINK_ERROR_MS, LINK_BLINK_NO_SERVER_MS, RECOVERY_FLASH_UPDATES};
use crate::error::{LedCommandError, ModuleError};
use crate::led_engine::LedController;
use crate::module_registry::Module;
use crate::types::{Event, EventType, ModuleStatus};

/// Zustand der Link-LED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    #[default]
    Off,
    On,
    /// Netzwerk ok, kein Server
    NoServer,
    Error,
}

pub struct MainPowerModule<'a> {
    leds: LedController<'a>,
    link: LinkState,
    /// Verbleibende Updates des Recovery-Blinkens
    flash_remaining: u8,
    status: ModuleStatus,
}

impl<'a> MainPowerModule<'a> {
    pub fn new(leds: LedController<'a>) -> Self {
        Self {
            leds,
            link: LinkState::Off,
            flash_remaining: 0,
            status: ModuleStatus::default(),
        }
    }

    pub fn link_state(&self) -> LinkState {
        self.link
    }

    pub fn is_flashing(&self) -> bool {
        self.flash_remaining > 0
    }

    fn show(&self, state: LinkState) -> Result<(), LedCommandError> {
        match state {
            LinkState::Off => self.leds.link_set(false),
            LinkState::On => self.leds.link_set(true),
            LinkState::NoServer => self.leds.link_blink(LINK_BLINK_NO_SERVER_MS),
            LinkState::Error => self.leds.link_blink(LINK_BLINK_ERROR_MS),
        }
    }

    fn set_link(&mut self, state: LinkState) {
        self.link = state;
        self.flash_remaining = 0;
        if let Err(e) = self.show(state) {
            warn!("MainPower: link LED command failed: {}", e);
            self.status.record_error("LED command rejected");
        }
    }

    fn start_recovery_flash(&mut self) {
        info!("MainPower: expander recovered, flashing link LED");
        match self.leds.link_blink(LINK_BLINK_ERROR_MS) {
            Ok(()) => self.flash_remaining = RECOVERY_FLASH_UPDATES,
            Err(e) => {
                warn!("MainPower: link LED command failed: {}", e);
                self.status.record_error("LED command rejected");
            }
        }
    }
}

impl Module for MainPowerModule<'_> {
    fn name(&self) -> &str {
        "Main Power Module"
    }

    fn init(&mut self) -> Result<(), ModuleError> {
        self.leds.link_set(false)?;
        self.link = LinkState::Off;
        self.flash_remaining = 0;
        self.status.initialized = true;
        self.status.operational = true;
        self.status.error_count = 0;
        info!("MainPower: initialized (link LED)");
        Ok(())
    }

    fn update(&mut self) -> Result<(), ModuleError> {
        if self.flash_remaining == 0 {
            return Ok(());
        }
        self.flash_remaining -= 1;
        if self.flash_remaining == 0 {
            debug!("MainPower: recovery flash done, restoring {}", self.link);
            self.show(self.link)?;
        }
        Ok(())
    }

    fn handle_event(&mut self, event: &Event) -> bool {
        let state = match event.kind {
            EventType::NetworkConnected | EventType::WsConnected => LinkState::On,
            EventType::NetworkDisconnected => LinkState::Off,
            EventType::WsDisconnected => LinkState::NoServer,
            EventType::WsError => LinkState::Error,
            EventType::ExpanderRecovered => {
                self.start_recovery_flash();
                return true;
            }
            _ => return false,
        };
        info!("MainPower: link {} -> {}", self.link, state);
        self.set_link(state);
        true
    }

    fn status(&self) -> ModuleStatus {
        self.status.clone()
    }

    fn shutdown(&mut self) -> Result<(), ModuleError> {
        info!("MainPower: shutting down");
        self.status.operational = false;
        self.flash_remaining = 0;
        self.leds.link_set(false)?;
        Ok(())
    }
}
