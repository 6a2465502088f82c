//! OTS Core - Platform-agnostic Orchestration
//!
//! Diese Crate enthält KEINE Chip-Dependencies.
//! Event-Bus, Modul-Registry, LED-Engine und Expander-Layer sprechen
//! Hardware nur über Traits an und laufen deshalb auch auf dem Host.

#![no_std]

// Muss zuerst kommen, damit die Logging-Makros in allen Modulen sichtbar sind
mod fmt;

pub mod buttons;
pub mod config;
pub mod error;
pub mod event_bus;
pub mod expander;
pub mod game_state;
pub mod io_scan;
pub mod led_engine;
pub mod logic;
pub mod module_io;
pub mod module_registry;
pub mod modules;
pub mod traits;
pub mod types;

// Re-exports für einfachen Zugriff
pub use error::{EventError, ExpanderError, LedCommandError, ModuleError, RegistryError};
pub use event_bus::{Dispatcher, EventHandler, EventPublisher, HandlerId};
pub use expander::Expander;
pub use led_engine::{LedController, LedEngine};
pub use module_registry::{Module, ModuleRegistry, SharedModules};
pub use traits::{
    BusError, Clock, ExpanderBus, LedError, LedWriter, RecoveryListener, SmartLedWriter,
};
pub use types::{
    BoardHealth, ChannelState, Event, EventFilter, EventSource, EventType, GameEvent, LedChannel,
    LedCommand, LedEffect, LedKind, ModuleStatus, PinMode,
};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use embassy_sync::mutex::Mutex;

use crate::config::{EVENT_QUEUE_SIZE, LED_COMMAND_QUEUE_SIZE};

// ============================================================================
// Type-Aliase für Channel-Typen
// ============================================================================
//
// CriticalSectionRawMutex, weil Producer aus beliebigen Tasks (und dem
// Recovery-Callback) posten dürfen.

/// Event-Queue (alle Producer → Dispatcher-Task)
pub type EventChannel = Channel<CriticalSectionRawMutex, Event, EVENT_QUEUE_SIZE>;

/// Sender für Events, erzeugt aus EventChannel
pub type EventSender<'a> = Sender<'a, CriticalSectionRawMutex, Event, EVENT_QUEUE_SIZE>;

/// Receiver für Events (nur der Dispatcher-Task)
pub type EventReceiver<'a> = Receiver<'a, CriticalSectionRawMutex, Event, EVENT_QUEUE_SIZE>;

/// Queue für LED-Kommandos (Module → LED-Task)
pub type LedCommandChannel = Channel<CriticalSectionRawMutex, LedCommand, LED_COMMAND_QUEUE_SIZE>;

/// Sender für LED-Kommandos
pub type LedCommandSender<'a> =
    Sender<'a, CriticalSectionRawMutex, LedCommand, LED_COMMAND_QUEUE_SIZE>;

/// Receiver für LED-Kommandos (nur der LED-Task)
pub type LedCommandReceiver<'a> =
    Receiver<'a, CriticalSectionRawMutex, LedCommand, LED_COMMAND_QUEUE_SIZE>;

/// Expander hinter einem async Mutex
///
/// I/O-Scan und LED-Engine teilen sich den Bus. Wer den Mutex hält, darf
/// über `await`-Punkte hinweg Transaktionen ausführen, lange Pausen
/// (Recovery-Backoff) laufen außerhalb.
pub type SharedExpander<'a, B, D> = Mutex<CriticalSectionRawMutex, Expander<'a, B, D>>;
