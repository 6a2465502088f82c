// Library-Root: Hardware-Anbindung und Tasks der Koffer-Firmware
// Keine Standard-Bibliothek (Embedded System)
#![no_std]

// Module
pub mod config;
pub mod hal;
pub mod tasks;

// Re-exports von ots-core
pub use ots_core::{EventChannel, Expander, LedCommandChannel};

use esp_hal::Async;
use esp_hal::i2c::master::I2c;

use crate::hal::I2cBus;

// ============================================================================
// Type-Aliase für die geteilte Hardware
// ============================================================================
//
// Diese Type-Aliase vereinfachen die Lesbarkeit der Funktionssignaturen.
// Statt:  ots_core::SharedExpander<'a, I2cBus<I2c<'static, Async>>, Delay>
// Nutze:  SharedExpander<'a>

/// I2C-Bus des Koffers (beide MCP23017 hängen daran)
pub type FirmwareBus = I2cBus<I2c<'static, Async>>;

/// Expander-Layer mit echter Hardware und Embassy-Delay
pub type FirmwareExpander<'a> = Expander<'a, FirmwareBus, embassy_time::Delay>;

/// Expander hinter einem async Mutex
///
/// I/O-Scan und LED-Engine greifen beide auf den Bus zu.
pub type SharedExpander<'a> = ots_core::SharedExpander<'a, FirmwareBus, embassy_time::Delay>;
