//! RGB-Status-LED (WS2812) auf dem Controller-Board
//!
//! Zeigt den Verbindungs- und Spielzustand als Farbe. Die LED hängt direkt
//! am Controller und nicht am Expander, deshalb schreibt das Modul selbst.

use rgb::RGB8;

use crate::config::STATUS_LED_BRIGHTNESS;
use crate::error::ModuleError;
use crate::logic::dim_color;
use crate::module_registry::Module;
use crate::traits::SmartLedWriter;
use crate::types::{Event, EventType, ModuleStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RgbStatus {
    #[default]
    Disconnected,
    WifiConnecting,
    WifiOnly,
    UserscriptConnected,
    GameStarted,
    Error,
}

impl RgbStatus {
    /// Farbe bei voller Helligkeit
    pub const fn color(self) -> RGB8 {
        match self {
            Self::Disconnected => RGB8 { r: 0, g: 0, b: 0 },
            Self::WifiConnecting => RGB8 { r: 0, g: 0, b: 255 },
            Self::WifiOnly => RGB8 { r: 255, g: 255, b: 0 },
            Self::UserscriptConnected => RGB8 { r: 128, g: 0, b: 255 },
            Self::GameStarted => RGB8 { r: 0, g: 255, b: 0 },
            Self::Error => RGB8 { r: 255, g: 0, b: 0 },
        }
    }

    /// Zustand nach einem Event; `None` wenn das Event die Farbe nicht ändert
    pub fn from_event(kind: EventType) -> Option<Self> {
        Some(match kind {
            EventType::NetworkConnected | EventType::WsDisconnected => Self::WifiOnly,
            EventType::NetworkDisconnected => Self::Disconnected,
            EventType::WsConnected
            | EventType::GameEnd
            | EventType::GameWon
            | EventType::GameLost => Self::UserscriptConnected,
            EventType::WsError => Self::Error,
            EventType::GameStart => Self::GameStarted,
            _ => return None,
        })
    }
}

pub struct StatusLedModule<W> {
    writer: W,
    state: RgbStatus,
    brightness: u8,
    status: ModuleStatus,
}

impl<W: SmartLedWriter> StatusLedModule<W> {
    pub fn new(writer: W) -> Self {
        Self::with_brightness(writer, STATUS_LED_BRIGHTNESS)
    }

    pub fn with_brightness(writer: W, brightness: u8) -> Self {
        Self {
            writer,
            state: RgbStatus::Disconnected,
            brightness,
            status: ModuleStatus::default(),
        }
    }

    pub fn state(&self) -> RgbStatus {
        self.state
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Setzt den Zustand; geschrieben wird nur bei einer Änderung
    pub fn set_state(&mut self, state: RgbStatus) -> Result<(), ModuleError> {
        if state == self.state {
            return Ok(());
        }
        info!("StatusLed: {} -> {}", self.state, state);
        self.state = state;
        self.show()
    }

    fn show(&mut self) -> Result<(), ModuleError> {
        let color = dim_color(self.state.color(), self.brightness);
        self.writer.write(color).map_err(|_| {
            self.status.record_error("status LED write failed");
            ModuleError::Hardware
        })
    }
}

impl<W: SmartLedWriter> Module for StatusLedModule<W> {
    fn name(&self) -> &str {
        "Status LED"
    }

    fn init(&mut self) -> Result<(), ModuleError> {
        self.state = RgbStatus::WifiConnecting;
        self.show()?;
        self.status.initialized = true;
        self.status.operational = true;
        info!("StatusLed: initialized");
        Ok(())
    }

    fn update(&mut self) -> Result<(), ModuleError> {
        Ok(())
    }

    fn handle_event(&mut self, event: &Event) -> bool {
        let Some(next) = RgbStatus::from_event(event.kind) else {
            return false;
        };
        if self.set_state(next).is_err() {
            warn!("StatusLed: write failed");
        }
        true
    }

    fn status(&self) -> ModuleStatus {
        self.status.clone()
    }

    fn shutdown(&mut self) -> Result<(), ModuleError> {
        self.status.operational = false;
        self.state = RgbStatus::Disconnected;
        self.show()
    }
}
