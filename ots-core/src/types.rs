//! Core Types für Events, LEDs und Expander
//!
//! Datenstrukturen ohne Hardware-Dependencies

use heapless::String;

use crate::config::{
    ALERT_LED_COUNT, EVENT_DATA_LEN, EVENT_MESSAGE_LEN, MODULE_ERROR_LEN, NUKE_LED_COUNT,
};

/// Kopiert `s` in einen String fester Kapazität, abgeschnitten an einer Zeichengrenze
pub fn truncated<const N: usize>(s: &str) -> String<N> {
    let mut out = String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

// ============================================================================
// Events
// ============================================================================

/// Event-Typen des Spiels und interne Zustandswechsel
///
/// Der Protokollname (`as_str`) ist stabil und wird vom Netzwerk-Layer
/// für das Mapping eingehender Nachrichten verwendet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventType {
    Info,
    Error,
    GameSpawning,
    GameStart,
    GameEnd,
    GameWon,
    GameLost,
    SoundPlay,
    HardwareDiagnostic,
    NukeLaunched,
    HydroLaunched,
    MirvLaunched,
    NukeExploded,
    NukeIntercepted,
    AlertAtom,
    AlertHydro,
    AlertMirv,
    AlertLand,
    AlertNaval,
    TroopUpdate,
    HardwareTest,
    NetworkConnected,
    NetworkDisconnected,
    WsConnected,
    WsDisconnected,
    WsError,
    ButtonPressed,
    ExpanderRecovered,
}

impl EventType {
    /// Protokollname des Event-Typs
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Error => "ERROR",
            Self::GameSpawning => "GAME_SPAWNING",
            Self::GameStart => "GAME_START",
            Self::GameEnd => "GAME_END",
            Self::GameWon => "GAME_WON",
            Self::GameLost => "GAME_LOST",
            Self::SoundPlay => "SOUND_PLAY",
            Self::HardwareDiagnostic => "HARDWARE_DIAGNOSTIC",
            Self::NukeLaunched => "NUKE_LAUNCHED",
            Self::HydroLaunched => "HYDRO_LAUNCHED",
            Self::MirvLaunched => "MIRV_LAUNCHED",
            Self::NukeExploded => "NUKE_EXPLODED",
            Self::NukeIntercepted => "NUKE_INTERCEPTED",
            Self::AlertAtom => "ALERT_ATOM",
            Self::AlertHydro => "ALERT_HYDRO",
            Self::AlertMirv => "ALERT_MIRV",
            Self::AlertLand => "ALERT_LAND",
            Self::AlertNaval => "ALERT_NAVAL",
            Self::TroopUpdate => "TROOP_UPDATE",
            Self::HardwareTest => "HARDWARE_TEST",
            Self::NetworkConnected => "INTERNAL:NET_CONNECTED",
            Self::NetworkDisconnected => "INTERNAL:NET_DISCONNECTED",
            Self::WsConnected => "INTERNAL:WS_CONNECTED",
            Self::WsDisconnected => "INTERNAL:WS_DISCONNECTED",
            Self::WsError => "INTERNAL:WS_ERROR",
            Self::ButtonPressed => "INTERNAL:BUTTON_PRESSED",
            Self::ExpanderRecovered => "INTERNAL:EXPANDER_RECOVERED",
        }
    }

    /// true für interne Events, die nie vom Spiel-Server kommen
    pub const fn is_internal(self) -> bool {
        matches!(
            self,
            Self::NetworkConnected
                | Self::NetworkDisconnected
                | Self::WsConnected
                | Self::WsDisconnected
                | Self::WsError
                | Self::ButtonPressed
                | Self::ExpanderRecovered
        )
    }
}

impl core::convert::TryFrom<&str> for EventType {
    type Error = ();

    fn try_from(name: &str) -> Result<Self, ()> {
        match name {
            "INFO" => Ok(Self::Info),
            "ERROR" => Ok(Self::Error),
            "GAME_SPAWNING" => Ok(Self::GameSpawning),
            "GAME_START" => Ok(Self::GameStart),
            "GAME_END" => Ok(Self::GameEnd),
            "GAME_WON" => Ok(Self::GameWon),
            "GAME_LOST" => Ok(Self::GameLost),
            "SOUND_PLAY" => Ok(Self::SoundPlay),
            "HARDWARE_DIAGNOSTIC" => Ok(Self::HardwareDiagnostic),
            "NUKE_LAUNCHED" | "atom" => Ok(Self::NukeLaunched),
            "HYDRO_LAUNCHED" | "hydro" => Ok(Self::HydroLaunched),
            "MIRV_LAUNCHED" | "mirv" => Ok(Self::MirvLaunched),
            "NUKE_EXPLODED" => Ok(Self::NukeExploded),
            "NUKE_INTERCEPTED" => Ok(Self::NukeIntercepted),
            "ALERT_ATOM" => Ok(Self::AlertAtom),
            "ALERT_HYDRO" => Ok(Self::AlertHydro),
            "ALERT_MIRV" => Ok(Self::AlertMirv),
            "ALERT_LAND" => Ok(Self::AlertLand),
            "ALERT_NAVAL" => Ok(Self::AlertNaval),
            "TROOP_UPDATE" => Ok(Self::TroopUpdate),
            "HARDWARE_TEST" => Ok(Self::HardwareTest),
            "INTERNAL:NET_CONNECTED" => Ok(Self::NetworkConnected),
            "INTERNAL:NET_DISCONNECTED" => Ok(Self::NetworkDisconnected),
            "INTERNAL:WS_CONNECTED" => Ok(Self::WsConnected),
            "INTERNAL:WS_DISCONNECTED" => Ok(Self::WsDisconnected),
            "INTERNAL:WS_ERROR" => Ok(Self::WsError),
            "INTERNAL:BUTTON_PRESSED" => Ok(Self::ButtonPressed),
            "INTERNAL:EXPANDER_RECOVERED" => Ok(Self::ExpanderRecovered),
            _ => Err(()),
        }
    }
}

/// Schlüssel für die Handler-Registrierung
///
/// `Any` ist der Wildcard-Eintrag. Er existiert nur für die Registrierung
/// und kann nicht gepostet werden.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventFilter {
    Any,
    Only(EventType),
}

impl From<EventType> for EventFilter {
    fn from(kind: EventType) -> Self {
        Self::Only(kind)
    }
}

/// Herkunft eines Events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventSource {
    Button,
    WebSocket,
    Timer,
    System,
    Unknown,
}

/// Event auf dem internen Bus
///
/// Wird per Wert in die Queue kopiert. Nachricht und Daten werden beim
/// Setzen auf die feste Kapazität gekürzt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: EventType,
    pub source: EventSource,
    /// Monotone Zeit in Millisekunden
    pub timestamp: u64,
    pub message: String<EVENT_MESSAGE_LEN>,
    pub data: String<EVENT_DATA_LEN>,
}

impl Event {
    pub fn new(kind: EventType, source: EventSource, timestamp: u64) -> Self {
        Self {
            kind,
            source,
            timestamp,
            message: String::new(),
            data: String::new(),
        }
    }

    pub fn with_message(mut self, message: &str) -> Self {
        self.message = truncated(message);
        self
    }

    pub fn with_data(mut self, data: &str) -> Self {
        self.data = truncated(data);
        self
    }
}

/// Spiel-Event in der Form, wie es der Netzwerk-Layer liefert
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameEvent {
    pub kind: EventType,
    pub timestamp: u64,
    pub message: String<EVENT_MESSAGE_LEN>,
    pub data: String<EVENT_DATA_LEN>,
}

impl GameEvent {
    /// Kopiert das Spiel-Event mit Herkunft in ein Bus-Event
    pub fn to_event(&self, source: EventSource) -> Event {
        Event {
            kind: self.kind,
            source,
            timestamp: self.timestamp,
            message: self.message.clone(),
            data: self.data.clone(),
        }
    }
}

// ============================================================================
// LEDs
// ============================================================================

/// LED-Gruppe auf dem Ausgangs-Board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedKind {
    Nuke,
    Alert,
    Link,
}

impl LedKind {
    /// Anzahl LEDs in dieser Gruppe
    pub const fn count(self) -> u8 {
        match self {
            Self::Nuke => NUKE_LED_COUNT,
            Self::Alert => ALERT_LED_COUNT,
            Self::Link => 1,
        }
    }
}

/// Einzelne LED, adressiert über Gruppe und Index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedChannel {
    pub kind: LedKind,
    pub index: u8,
}

impl LedChannel {
    /// Warn-LED, wird von den übrigen Alert-LEDs mitgeschaltet
    pub const WARNING: Self = Self {
        kind: LedKind::Alert,
        index: 0,
    };

    pub const LINK: Self = Self {
        kind: LedKind::Link,
        index: 0,
    };

    /// Gibt `None` zurück, wenn der Index für die Gruppe nicht existiert
    pub const fn new(kind: LedKind, index: u8) -> Option<Self> {
        if index < kind.count() {
            Some(Self { kind, index })
        } else {
            None
        }
    }

    /// Alle gültigen Kanäle in fester Reihenfolge: Nuke, Alert, Link
    pub fn all() -> impl Iterator<Item = LedChannel> {
        [LedKind::Nuke, LedKind::Alert, LedKind::Link]
            .into_iter()
            .flat_map(|kind| (0..kind.count()).map(move |index| LedChannel { kind, index }))
    }
}

/// Effekt einer LED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedEffect {
    #[default]
    Off,
    On,
    Blink,
    /// Blinkt bis `duration_ms` abgelaufen ist, danach aus
    BlinkTimed,
}

/// Kommando an die LED-Engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedCommand {
    pub kind: LedKind,
    pub index: u8,
    pub effect: LedEffect,
    /// Nur für `BlinkTimed`; 0 = kein Ablauf
    pub duration_ms: u32,
    /// Blinkperiode; 0 = Standardwert
    pub blink_rate_ms: u32,
}

impl LedCommand {
    pub const fn new(kind: LedKind, index: u8, effect: LedEffect) -> Self {
        Self {
            kind,
            index,
            effect,
            duration_ms: 0,
            blink_rate_ms: 0,
        }
    }

    pub fn channel(&self) -> Option<LedChannel> {
        LedChannel::new(self.kind, self.index)
    }
}

/// Laufzeitzustand eines LED-Kanals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelState {
    pub effect: LedEffect,
    /// Zeitpunkt, ab dem `BlinkTimed` abgelaufen ist
    pub effect_end_tick: Option<u64>,
    pub blink_period_ms: u32,
    pub last_toggle_tick: u64,
    /// Zuletzt angeforderter Pegel
    pub is_on: bool,
}

// ============================================================================
// Expander
// ============================================================================

/// Pin-Modus am GPIO-Expander
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinMode {
    Input,
    InputPullup,
    Output,
}

/// Health-Zähler eines Boards
///
/// `healthy` startet mit `false` und wird erst durch eine erfolgreiche
/// Initialisierung gesetzt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BoardHealth {
    pub error_count: u32,
    pub consecutive_errors: u32,
    pub healthy: bool,
    pub last_error_time: u64,
    pub last_health_check: u64,
    pub recovery_count: u32,
}

// ============================================================================
// Module
// ============================================================================

/// Status eines Hardware-Moduls
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModuleStatus {
    pub initialized: bool,
    pub operational: bool,
    pub error_count: u32,
    pub last_error: String<MODULE_ERROR_LEN>,
}

impl ModuleStatus {
    /// Zählt einen Fehler und merkt sich die Meldung
    pub fn record_error(&mut self, message: &str) {
        self.error_count = self.error_count.saturating_add(1);
        self.last_error = truncated(message);
    }
}

// ============================================================================
// defmt::Format Implementations (optional feature)
// ============================================================================

#[cfg(feature = "defmt")]
impl defmt::Format for Event {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "Event {{ kind: {}, source: {}, t: {}, msg: {}, data: {} }}",
            self.kind.as_str(),
            self.source,
            self.timestamp,
            self.message.as_str(),
            self.data.as_str()
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ModuleStatus {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "ModuleStatus {{ init: {}, ok: {}, errors: {}, last: {} }}",
            self.initialized,
            self.operational,
            self.error_count,
            self.last_error.as_str()
        )
    }
}
