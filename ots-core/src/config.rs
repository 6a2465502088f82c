//! Konfigurationswerte für die Orchestrierung
//!
//! Die Kapazitätsgrenzen entsprechen der bisherigen Firmware, damit sich das
//! Gerät unter Last gleich verhält. Zeitwerte, die in Tests variiert werden,
//! stecken zusätzlich in `ExpanderConfig`.

// ============================================================================
// Event-Bus
// ============================================================================

/// Anzahl Events in der Event-Queue
pub const EVENT_QUEUE_SIZE: usize = 32;

/// Maximale Handler pro Event-Typ (gilt auch für die Wildcard-Liste)
pub const MAX_HANDLERS_PER_TYPE: usize = 8;

/// Maximale Anzahl unterschiedlicher Event-Typen mit eigenen Handlern
pub const MAX_EVENT_TYPES: usize = 32;

/// Länge des Nachrichtentexts eines Events (Bytes)
pub const EVENT_MESSAGE_LEN: usize = 128;

/// Länge des Datenfelds eines Events (Bytes, meist JSON)
pub const EVENT_DATA_LEN: usize = 256;

// ============================================================================
// Module
// ============================================================================

/// Maximale Anzahl registrierter Hardware-Module
pub const MAX_MODULES: usize = 8;

/// Länge der letzten Fehlermeldung im Modul-Status
pub const MODULE_ERROR_LEN: usize = 64;

/// Intervall für `ModuleRegistry::update_all` in Millisekunden
pub const MODULE_UPDATE_INTERVAL_MS: u64 = 100;

// ============================================================================
// LED-Engine
// ============================================================================

/// Kapazität der LED-Command-Queue
pub const LED_COMMAND_QUEUE_SIZE: usize = 16;

/// Standard-Blinkperiode in Millisekunden (für blink_rate_ms = 0)
pub const LED_BLINK_INTERVAL_MS: u32 = 500;

/// Takt des LED-Tasks in Millisekunden
pub const LED_UPDATE_INTERVAL_MS: u64 = 50;

/// Anzahl Nuke-LEDs (atom, hydro, mirv)
pub const NUKE_LED_COUNT: u8 = 3;

/// Anzahl Alert-LEDs (warning, atom, hydro, mirv, land, naval)
pub const ALERT_LED_COUNT: u8 = 6;

/// Blinkdauer nach einem Nuke-Launch
pub const NUKE_BLINK_DURATION_MS: u32 = 10_000;

/// Dauer eines Nuke-Alerts (atom, hydro, mirv)
pub const NUKE_ALERT_DURATION_MS: u32 = 10_000;

/// Dauer eines Land- oder Naval-Alerts
pub const INVASION_ALERT_DURATION_MS: u32 = 15_000;

/// Link-LED Blinkperiode: Netzwerk ok, aber keine WebSocket-Verbindung
pub const LINK_BLINK_NO_SERVER_MS: u32 = 500;

/// Link-LED Blinkperiode: WebSocket-Fehler bzw. Expander-Recovery
pub const LINK_BLINK_ERROR_MS: u32 = 200;

/// Anzahl Modul-Updates, die das Recovery-Signal auf der Link-LED sichtbar bleibt
pub const RECOVERY_FLASH_UPDATES: u8 = 10;

/// Helligkeit der RGB Status-LED (0-255)
/// Wert ist gedimmt für Augenschonung
pub const STATUS_LED_BRIGHTNESS: u8 = 32;

// ============================================================================
// GPIO-Expander (MCP23017)
// ============================================================================

/// Maximale Anzahl Expander-Boards
pub const MAX_BOARDS: usize = 2;

/// Pins pro Board (zwei 8-Bit Ports A/B)
pub const PINS_PER_BOARD: u8 = 16;

/// I2C-Adressen der Boards: 0x20 = Eingänge, 0x21 = Ausgänge
pub const EXPANDER_ADDRESSES: [u8; MAX_BOARDS] = [0x20, 0x21];

// ============================================================================
// I/O Scan
// ============================================================================

/// Anzahl Nuke-Buttons
pub const BUTTON_COUNT: usize = 3;

/// Entprellzeit der Buttons in Millisekunden
pub const BUTTON_DEBOUNCE_MS: u64 = 50;

/// Scan-Intervall des I/O-Tasks in Millisekunden
pub const IO_SCAN_INTERVAL_MS: u64 = 50;

/// Retry-, Backoff- und Health-Parameter des Expander-Layers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ExpanderConfig {
    /// Maximale Init-Versuche pro Board
    pub max_retries: u8,
    /// Wartezeit vor dem ersten Retry
    pub initial_retry_delay_ms: u32,
    /// Obergrenze für die verdoppelte Wartezeit
    pub max_retry_delay_ms: u32,
    /// Mindestabstand zwischen zwei Health-Checks eines Boards
    pub health_check_interval_ms: u64,
    /// Aufeinanderfolgende Fehler, ab denen ein Board als unhealthy gilt
    pub error_threshold: u32,
}

impl Default for ExpanderConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_retry_delay_ms: 100,
            max_retry_delay_ms: 5_000,
            health_check_interval_ms: 10_000,
            error_threshold: 3,
        }
    }
}
