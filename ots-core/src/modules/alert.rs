//! Alert-Panel: Warn-LED plus fünf Alert-LEDs
//!
//! Reihenfolge der Kanäle: warning, atom, hydro, mirv, land, naval. Die
//! Warn-LED wird von der LED-Engine mitgeführt, solange ein Alert aktiv ist.

use crate::config::{ALERT_LED_COUNT, INVASION_ALERT_DURATION_MS, NUKE_ALERT_DURATION_MS};
use crate::error::{LedCommandError, ModuleError};
use crate::led_engine::LedController;
use crate::module_registry::Module;
use crate::types::{Event, EventType, ModuleStatus};

pub const WARNING: u8 = 0;
pub const ATOM: u8 = 1;
pub const HYDRO: u8 = 2;
pub const MIRV: u8 = 3;
pub const LAND: u8 = 4;
pub const NAVAL: u8 = 5;

pub struct AlertModule<'a> {
    leds: LedController<'a>,
    status: ModuleStatus,
}

impl<'a> AlertModule<'a> {
    pub fn new(leds: LedController<'a>) -> Self {
        Self {
            leds,
            status: ModuleStatus::default(),
        }
    }

    fn all_off(&self) -> Result<(), LedCommandError> {
        let mut result = Ok(());
        for index in 0..ALERT_LED_COUNT {
            if let Err(e) = self.leds.alert_off(index) {
                result = Err(e);
            }
        }
        result
    }

    fn checked(&mut self, result: Result<(), LedCommandError>) {
        if let Err(e) = result {
            warn!("Alert: LED command failed: {}", e);
            self.status.record_error("LED command rejected");
        }
    }
}

impl Module for AlertModule<'_> {
    fn name(&self) -> &str {
        "Alert Module"
    }

    fn init(&mut self) -> Result<(), ModuleError> {
        self.all_off()?;
        self.status.initialized = true;
        self.status.operational = true;
        self.status.error_count = 0;
        info!("Alert: initialized (6 LEDs)");
        Ok(())
    }

    fn update(&mut self) -> Result<(), ModuleError> {
        Ok(())
    }

    fn handle_event(&mut self, event: &Event) -> bool {
        let result = match event.kind {
            EventType::AlertAtom => self.leds.alert_on(ATOM, NUKE_ALERT_DURATION_MS),
            EventType::AlertHydro => self.leds.alert_on(HYDRO, NUKE_ALERT_DURATION_MS),
            EventType::AlertMirv => self.leds.alert_on(MIRV, NUKE_ALERT_DURATION_MS),
            EventType::AlertLand => self.leds.alert_on(LAND, INVASION_ALERT_DURATION_MS),
            EventType::AlertNaval => self.leds.alert_on(NAVAL, INVASION_ALERT_DURATION_MS),
            EventType::NukeExploded | EventType::NukeIntercepted => {
                // Welche Nuke gemeint ist, steht nicht im Event
                [ATOM, HYDRO, MIRV]
                    .into_iter()
                    .map(|index| self.leds.alert_off(index))
                    .fold(Ok(()), |acc, r| r.and(acc))
            }
            EventType::GameStart => self.leds.alert_on(WARNING, 0),
            EventType::GameEnd | EventType::GameWon | EventType::GameLost => self.all_off(),
            _ => return false,
        };

        debug!("Alert: handled {}", event.kind);
        self.checked(result);
        true
    }

    fn status(&self) -> ModuleStatus {
        self.status.clone()
    }

    fn shutdown(&mut self) -> Result<(), ModuleError> {
        info!("Alert: shutting down");
        self.status.operational = false;
        self.all_off()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LedCommandChannel;
    use crate::types::{EventSource, LedEffect, LedKind};

    #[test]
    fn test_invasion_alert_uses_long_duration() {
        let queue = LedCommandChannel::new();
        let mut alert = AlertModule::new(LedController::new(queue.sender()));

        assert!(alert.handle_event(&Event::new(EventType::AlertNaval, EventSource::WebSocket, 0)));
        let command = queue.try_receive().unwrap();
        assert_eq!(command.kind, LedKind::Alert);
        assert_eq!(command.index, NAVAL);
        assert_eq!(command.effect, LedEffect::BlinkTimed);
        assert_eq!(command.duration_ms, INVASION_ALERT_DURATION_MS);
    }

    #[test]
    fn test_exploded_clears_nuke_alerts() {
        let queue = LedCommandChannel::new();
        let mut alert = AlertModule::new(LedController::new(queue.sender()));

        alert.handle_event(&Event::new(EventType::NukeExploded, EventSource::WebSocket, 0));
        let mut cleared = [false; ALERT_LED_COUNT as usize];
        while let Ok(command) = queue.try_receive() {
            assert_eq!(command.effect, LedEffect::Off);
            cleared[usize::from(command.index)] = true;
        }
        assert_eq!(cleared, [false, true, true, true, false, false]);
    }

    #[test]
    fn test_unrelated_event_ignored() {
        let queue = LedCommandChannel::new();
        let mut alert = AlertModule::new(LedController::new(queue.sender()));
        assert!(!alert.handle_event(&Event::new(EventType::Info, EventSource::System, 0)));
        assert!(queue.try_receive().is_err());
    }
}
