// Firmware-Konfiguration: Pin-Zuordnungen und Bus-Parameter
//
// Kapazitäten und Zeitwerte der Orchestrierung stehen in ots_core::config.

// ============================================================================
// I2C Konfiguration
// ============================================================================

/// GPIO-Pin für I2C SDA
pub const I2C_SDA_PIN: u8 = 6;

/// GPIO-Pin für I2C SCL
pub const I2C_SCL_PIN: u8 = 7;

/// I2C Taktfrequenz in kHz
/// 100 kHz (Standard-Mode) reicht für zwei Expander und ist robust bei langen Kabeln
pub const I2C_FREQUENCY_KHZ: u32 = 100;

/// Timeout pro I2C-Transaktion in Millisekunden
pub const I2C_TIMEOUT_MS: u64 = 1_000;

// ============================================================================
// Status-LED Konfiguration
// ============================================================================

/// GPIO-Pin für die RGB Status-LED (WS2812/Neopixel)
pub const STATUS_LED_GPIO_PIN: u8 = 8;

/// RMT Taktfrequenz in MHz
/// 80 MHz ist optimal für WS2812 LED-Timing
pub const RMT_CLOCK_MHZ: u32 = 80;
