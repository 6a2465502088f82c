// SmartLED Writer für die RGB Status-LED
//
// Implementiert ots_core::SmartLedWriter über das RMT Peripheral.

use esp_hal::Blocking;
use esp_hal::rmt::{PulseCode, Rmt};
use esp_hal::time::Rate;
use esp_hal_smartled::SmartLedsAdapter;
use ots_core::{LedError, SmartLedWriter};
use rgb::RGB8;
use smart_leds_trait::SmartLedsWrite;

/// Buffer-Größe für 1 LED (3 Farben * 8 Bits + 1 Reset)
pub const LED_BUFFER_SIZE: usize = 25;

/// Real Hardware LED Writer
///
/// Nutzt ESP32 RMT Peripheral um die WS2812 Status-LED anzusteuern.
///
/// Hinweis: Der Buffer muss so lange leben wie der Writer, daher wird er
/// außerhalb erstellt (smart_led_buffer!(1)) und als Parameter übergeben.
pub struct RmtLedWriter<'a> {
    led: SmartLedsAdapter<'a, LED_BUFFER_SIZE>,
}

impl<'a> RmtLedWriter<'a> {
    /// Erstellt einen neuen RmtLedWriter
    ///
    /// # Parameter
    /// - `gpio8`: GPIO8 Peripheral für LED-Datenleitung
    /// - `rmt_peripheral`: RMT Peripheral
    /// - `rmt_clock_mhz`: RMT Clock Frequenz in MHz (z.B. 80)
    /// - `buffer`: Buffer für LED-Daten
    ///
    /// # Fehlerbehandlung
    /// Gibt `LedError::WriteFailed` zurück, wenn das RMT Peripheral die
    /// Taktfrequenz ablehnt.
    pub fn new(
        gpio8: esp_hal::peripherals::GPIO8<'a>,
        rmt_peripheral: esp_hal::peripherals::RMT<'a>,
        rmt_clock_mhz: u32,
        buffer: &'a mut [PulseCode; LED_BUFFER_SIZE],
    ) -> Result<Self, LedError> {
        let rmt: Rmt<'a, Blocking> = Rmt::new(rmt_peripheral, Rate::from_mhz(rmt_clock_mhz))
            .map_err(|_| LedError::WriteFailed)?;

        let led = SmartLedsAdapter::new(rmt.channel0, gpio8, buffer);

        Ok(Self { led })
    }
}

impl SmartLedWriter for RmtLedWriter<'_> {
    fn write(&mut self, color: RGB8) -> Result<(), LedError> {
        self.led
            .write([color].into_iter())
            .map_err(|_| LedError::WriteFailed)
    }
}
