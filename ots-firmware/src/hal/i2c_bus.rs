// I2C-Anbindung der MCP23017 Expander
//
// Jede Transaktion läuft mit Timeout, damit ein hängender Bus den
// aufrufenden Task nicht blockiert.

use defmt::debug;
use embassy_time::{Duration, with_timeout};
use embedded_hal_async::i2c::{Error as _, ErrorKind, I2c};
use ots_core::{BusError, ExpanderBus};

/// Register-Zugriff über einen async I2C-Master
///
/// Generisch über `embedded_hal_async::i2c::I2c`, in der Firmware ist das
/// `esp_hal::i2c::master::I2c<'static, Async>`.
pub struct I2cBus<I> {
    i2c: I,
    timeout: Duration,
}

impl<I: I2c> I2cBus<I> {
    pub fn new(i2c: I, timeout_ms: u64) -> Self {
        Self {
            i2c,
            timeout: Duration::from_millis(timeout_ms),
        }
    }
}

/// Übersetzt HAL-Fehler in die Fehlerklassen des Expander-Layers
fn map_error<E: embedded_hal_async::i2c::Error>(error: E) -> BusError {
    match error.kind() {
        ErrorKind::NoAcknowledge(_) => BusError::Nack,
        _ => BusError::Other,
    }
}

impl<I: I2c> ExpanderBus for I2cBus<I> {
    async fn attach(&mut self, address: u8) -> Result<(), BusError> {
        // Der Bus ist geteilt, ein eigenes Geräte-Handle gibt es nicht
        debug!("I2C: device {:#x} attached", address);
        Ok(())
    }

    async fn detach(&mut self, address: u8) {
        debug!("I2C: device {:#x} detached", address);
    }

    async fn read_register(&mut self, address: u8, register: u8) -> Result<u8, BusError> {
        let mut buffer = [0u8; 1];
        with_timeout(
            self.timeout,
            self.i2c.write_read(address, &[register], &mut buffer),
        )
        .await
        .map_err(|_| BusError::Timeout)?
        .map_err(map_error)?;
        Ok(buffer[0])
    }

    async fn write_register(
        &mut self,
        address: u8,
        register: u8,
        value: u8,
    ) -> Result<(), BusError> {
        with_timeout(self.timeout, self.i2c.write(address, &[register, value]))
            .await
            .map_err(|_| BusError::Timeout)?
            .map_err(map_error)
    }
}
