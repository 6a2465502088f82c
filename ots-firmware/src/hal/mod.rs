// Hardware Abstraction Layer (HAL) Module
//
// Implementiert die Traits aus ots-core für die ESP32-C6 Peripherie.

pub mod clock;
pub mod i2c_bus;
pub mod led_writer;

pub use clock::EmbassyClock;
pub use i2c_bus::I2cBus;
pub use led_writer::RmtLedWriter;
