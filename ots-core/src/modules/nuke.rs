//! Nuke-Panel: drei Buttons und drei LEDs (atom, hydro, mirv)
//!
//! Ein Tastendruck wird als Launch-Event auf den Bus gelegt. Launch-Events
//! (lokal oder vom Server) lassen die passende LED blinken.

use core::fmt::Write;

use crate::config::{NUKE_BLINK_DURATION_MS, NUKE_LED_COUNT};
use crate::error::ModuleError;
use crate::event_bus::EventPublisher;
use crate::led_engine::LedController;
use crate::module_registry::Module;
use crate::types::{Event, EventSource, EventType, LedEffect, LedKind, ModuleStatus};

/// Button-Index → Launch-Event und Nuke-Typ
const NUKE_TYPES: [(EventType, &str); NUKE_LED_COUNT as usize] = [
    (EventType::NukeLaunched, "atom"),
    (EventType::HydroLaunched, "hydro"),
    (EventType::MirvLaunched, "mirv"),
];

pub struct NukeModule<'a> {
    leds: LedController<'a>,
    events: EventPublisher<'a>,
    status: ModuleStatus,
}

impl<'a> NukeModule<'a> {
    pub fn new(leds: LedController<'a>, events: EventPublisher<'a>) -> Self {
        Self {
            leds,
            events,
            status: ModuleStatus::default(),
        }
    }

    fn all_leds_off(&self) -> Result<(), ModuleError> {
        for index in 0..NUKE_LED_COUNT {
            self.leds.set(LedKind::Nuke, index, LedEffect::Off)?;
        }
        Ok(())
    }

    fn launch(&mut self, pressed: &Event) -> bool {
        let Some((kind, name)) = pressed
            .data
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|button| NUKE_TYPES.get(button))
        else {
            warn!("Nuke: invalid button index {}", pressed.data.as_str());
            return false;
        };

        info!("Nuke: button pressed ({})", *name);
        let mut event =
            Event::new(*kind, EventSource::Button, pressed.timestamp).with_message("Nuke sent");
        let _ = write!(event.data, "{{\"nukeType\":\"{}\"}}", name);
        if self.events.post(event).is_err() {
            self.status.record_error("launch event dropped");
        }
        true
    }

    fn launched(&mut self, index: u8) -> bool {
        info!("Nuke: launched, blinking LED {}", index);
        if let Err(e) = self.leds.nuke_blink(index, NUKE_BLINK_DURATION_MS) {
            warn!("Nuke: LED command failed: {}", e);
            self.status.record_error("LED command rejected");
        }
        true
    }
}

impl Module for NukeModule<'_> {
    fn name(&self) -> &str {
        "Nuke Module"
    }

    fn init(&mut self) -> Result<(), ModuleError> {
        self.all_leds_off()?;
        self.status.initialized = true;
        self.status.operational = true;
        self.status.error_count = 0;
        info!("Nuke: initialized (3 buttons, 3 LEDs)");
        Ok(())
    }

    fn update(&mut self) -> Result<(), ModuleError> {
        Ok(())
    }

    fn handle_event(&mut self, event: &Event) -> bool {
        match event.kind {
            EventType::ButtonPressed => self.launch(event),
            EventType::NukeLaunched => self.launched(0),
            EventType::HydroLaunched => self.launched(1),
            EventType::MirvLaunched => self.launched(2),
            _ => false,
        }
    }

    fn status(&self) -> ModuleStatus {
        self.status.clone()
    }

    fn shutdown(&mut self) -> Result<(), ModuleError> {
        info!("Nuke: shutting down");
        self.status.operational = false;
        self.all_leds_off()
    }
}
