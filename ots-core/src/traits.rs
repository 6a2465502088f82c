//! Hardware Abstraction Traits
//!
//! Diese Traits definieren Schnittstellen für Hardware-Zugriff
//! ohne konkrete Implementierung.

use rgb::RGB8;

use crate::types::LedChannel;

/// Fehler-Typ für LED-Operationen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedError {
    WriteFailed,
}

/// Fehler einer einzelnen I2C-Transaktion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// Gerät hat nicht quittiert
    Nack,
    /// Transaktion hat das Timeout überschritten
    Timeout,
    Other,
}

/// Trait für SmartLED Hardware-Zugriff
///
/// Abstrahiert den Zugriff auf die RGB Status-LED (WS2812/Neopixel).
///
/// # Implementierungen
/// - **Production:** RmtLedWriter (ESP32 RMT Peripheral)
/// - **Testing:** MockSmartLed (in-memory Mock)
pub trait SmartLedWriter: Send {
    /// Schreibt eine RGB-Farbe auf die LED
    ///
    /// # Fehlerbehandlung
    /// Gibt `LedError::WriteFailed` zurück wenn Hardware-Zugriff fehlschlägt
    fn write(&mut self, color: RGB8) -> Result<(), LedError>;
}

/// Trait für die Einzel-LEDs am Ausgangs-Expander
///
/// # Implementierungen
/// - **Production:** `module_io::ExpanderLedWriter`
/// - **Testing:** RecordingLedWriter
#[allow(async_fn_in_trait)]
pub trait LedWriter {
    /// Setzt den Pegel einer LED
    async fn write(&mut self, channel: LedChannel, on: bool) -> Result<(), LedError>;
}

/// Register-Zugriff auf einen I2C GPIO-Expander
///
/// `attach`/`detach` bilden das Anlegen bzw. Freigeben des Geräte-Handles
/// ab. Jede Transaktion muss zeitlich begrenzt sein.
#[allow(async_fn_in_trait)]
pub trait ExpanderBus {
    async fn attach(&mut self, address: u8) -> Result<(), BusError>;

    async fn detach(&mut self, address: u8);

    async fn read_register(&mut self, address: u8, register: u8) -> Result<u8, BusError>;

    async fn write_register(&mut self, address: u8, register: u8, value: u8)
    -> Result<(), BusError>;
}

/// Monotone Zeitquelle in Millisekunden
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Wird nach erfolgreicher Wiederherstellung eines Boards aufgerufen
pub trait RecoveryListener {
    fn board_recovered(&self, board: u8, was_down: bool);
}

impl<F> RecoveryListener for F
where
    F: Fn(u8, bool),
{
    fn board_recovered(&self, board: u8, was_down: bool) {
        self(board, was_down)
    }
}
