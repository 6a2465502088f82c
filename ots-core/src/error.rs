//! Fehler-Typen der Orchestrierung
//!
//! Kleine `Copy`-Enums ohne Allokation. Hardware-nahe Fehler (I2C) werden im
//! Expander-Layer in den Health-Status verbucht und tauchen hier nur als
//! Ergebnis einer einzelnen Operation auf.

use core::fmt;

use crate::traits::BusError;

/// Fehler beim Posten oder Registrieren am Event-Bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventError {
    /// Queue voll, Event wurde verworfen
    QueueFull,
    /// Alle Handler-Slots für diesen Schlüssel belegt
    CapacityExceeded,
    /// Handler war für diesen Schlüssel nicht registriert
    NotFound,
}

impl fmt::Display for EventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueueFull => f.write_str("event queue full"),
            Self::CapacityExceeded => f.write_str("handler capacity exceeded"),
            Self::NotFound => f.write_str("handler not registered"),
        }
    }
}

/// Fehler eines einzelnen Hardware-Moduls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModuleError {
    /// Hardware antwortet nicht oder Schreibzugriff fehlgeschlagen
    Hardware,
    /// Modul wurde noch nicht initialisiert
    NotReady,
    /// LED-Kommando konnte nicht eingereiht werden
    Command(LedCommandError),
    /// Event konnte nicht gepostet werden
    Event(EventError),
}

impl fmt::Display for ModuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hardware => f.write_str("hardware access failed"),
            Self::NotReady => f.write_str("module not initialized"),
            Self::Command(e) => write!(f, "LED command rejected: {e}"),
            Self::Event(e) => write!(f, "event rejected: {e}"),
        }
    }
}

impl From<LedCommandError> for ModuleError {
    fn from(e: LedCommandError) -> Self {
        Self::Command(e)
    }
}

impl From<EventError> for ModuleError {
    fn from(e: EventError) -> Self {
        Self::Event(e)
    }
}

/// Fehler der Modul-Registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistryError {
    /// Mehr als `MAX_MODULES` Module registriert
    RegistryFull,
    /// `init()` eines Moduls ist fehlgeschlagen (Boot wird abgebrochen)
    InitFailed { index: usize, source: ModuleError },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RegistryFull => f.write_str("module registry full"),
            Self::InitFailed { index, source } => {
                write!(f, "module #{index} failed to initialize: {source}")
            }
        }
    }
}

/// Fehler beim Einreihen eines LED-Kommandos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedCommandError {
    /// Command-Queue voll, Kommando verworfen
    QueueFull,
    /// Kombination aus LED-Typ und Index existiert nicht
    InvalidChannel,
}

impl fmt::Display for LedCommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueueFull => f.write_str("LED command queue full"),
            Self::InvalidChannel => f.write_str("invalid LED channel"),
        }
    }
}

/// Fehler des Expander-Layers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExpanderError {
    /// Board- oder Pin-Index außerhalb des gültigen Bereichs
    InvalidArgument,
    /// Board ist (noch) nicht initialisiert
    NotInitialized,
    /// Einzelne I2C-Transaktion fehlgeschlagen
    Bus(BusError),
    /// Alle Init-Versuche erschöpft
    RetriesExhausted,
}

impl fmt::Display for ExpanderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument => f.write_str("invalid board or pin"),
            Self::NotInitialized => f.write_str("board not initialized"),
            Self::Bus(e) => write!(f, "I2C transaction failed: {e:?}"),
            Self::RetriesExhausted => f.write_str("board unreachable after retries"),
        }
    }
}

impl From<BusError> for ExpanderError {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}
