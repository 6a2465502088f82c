//! Event-Bus: Queue, Publisher und Dispatcher
//!
//! Producer (I/O-Task, Netzwerk, Recovery-Callback) posten über einen
//! [`EventPublisher`] nicht-blockierend in die Queue. Genau ein Consumer-Task
//! besitzt den [`Dispatcher`] und verteilt die Events nacheinander an die
//! registrierten Handler.
//!
//! Reihenfolge pro Event: zuerst alle Wildcard-Handler, dann alle Handler
//! des konkreten Typs, jeweils in Registrierungsreihenfolge. Es wird nie
//! abgebrochen, auch wenn ein früherer Handler das Event schon behandelt hat.

use core::fmt::Write;

use heapless::{LinearMap, Vec};

use crate::config::{MAX_EVENT_TYPES, MAX_HANDLERS_PER_TYPE};
use crate::error::EventError;
use crate::traits::{Clock, RecoveryListener};
use crate::types::{Event, EventFilter, EventSource, EventType, GameEvent};
use crate::{EventReceiver, EventSender};

/// Handler für Events
///
/// `handle` nimmt `&self`, damit derselbe Handler für mehrere Typen
/// registriert werden kann. Zustand liegt in `Cell`/`RefCell`.
pub trait EventHandler {
    /// Gibt `true` zurück, wenn das Event behandelt wurde
    fn handle(&self, event: &Event) -> bool;
}

impl<F> EventHandler for F
where
    F: Fn(&Event) -> bool,
{
    fn handle(&self, event: &Event) -> bool {
        self(event)
    }
}

/// Token einer Registrierung, wird für `unregister` gebraucht
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HandlerId(u16);

struct Slot<'a> {
    id: HandlerId,
    handler: &'a dyn EventHandler,
}

type HandlerList<'a> = Vec<Slot<'a>, MAX_HANDLERS_PER_TYPE>;

// ============================================================================
// Producer-Seite
// ============================================================================

/// Handle zum Posten von Events
///
/// Kopierbar, kann an beliebig viele Tasks verteilt werden. Der Zeitstempel
/// für `post_simple` kommt aus der übergebenen Uhr.
#[derive(Clone, Copy)]
pub struct EventPublisher<'a> {
    sender: EventSender<'a>,
    clock: &'a dyn Clock,
}

impl<'a> EventPublisher<'a> {
    pub fn new(sender: EventSender<'a>, clock: &'a dyn Clock) -> Self {
        Self { sender, clock }
    }

    /// Reiht ein Event ein, ohne zu blockieren
    ///
    /// Bei voller Queue wird das Event verworfen und `QueueFull` geliefert,
    /// der Queue-Inhalt bleibt unverändert.
    pub fn post(&self, event: Event) -> Result<(), EventError> {
        let kind = event.kind;
        self.sender.try_send(event).map_err(|_| {
            warn!("EventBus: queue full, dropping {}", kind.as_str());
            EventError::QueueFull
        })
    }

    /// Postet ein Event ohne Nachricht und Daten
    pub fn post_simple(&self, kind: EventType, source: EventSource) -> Result<(), EventError> {
        self.post(Event::new(kind, source, self.clock.now_ms()))
    }

    /// Übernimmt ein Spiel-Event aus dem Netzwerk-Layer
    ///
    /// Der Zeitstempel kommt wie bei `post_simple` aus der Publisher-Uhr,
    /// der Zeitstempel des Spiels wird nicht übernommen.
    pub fn post_from(&self, game_event: &GameEvent, source: EventSource) -> Result<(), EventError> {
        let mut event = game_event.to_event(source);
        event.timestamp = self.clock.now_ms();
        self.post(event)
    }

    /// Aktuelle Zeit der Publisher-Uhr
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }
}

/// Meldet eine Board-Wiederherstellung als `ExpanderRecovered` auf dem Bus
impl RecoveryListener for EventPublisher<'_> {
    fn board_recovered(&self, board: u8, was_down: bool) {
        let message = if was_down { "was_down" } else { "restored" };
        let mut event =
            Event::new(EventType::ExpanderRecovered, EventSource::System, self.now_ms())
                .with_message(message);
        let _ = write!(event.data, "{board}");
        if self.post(event).is_err() {
            warn!("EventBus: recovery of board {} not reported", board);
        }
    }
}

// ============================================================================
// Consumer-Seite
// ============================================================================

/// Verteilt Events an registrierte Handler
pub struct Dispatcher<'a> {
    wildcard: HandlerList<'a>,
    typed: LinearMap<EventType, HandlerList<'a>, MAX_EVENT_TYPES>,
    next_id: u16,
}

impl Default for Dispatcher<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Dispatcher<'a> {
    pub fn new() -> Self {
        Self {
            wildcard: Vec::new(),
            typed: LinearMap::new(),
            next_id: 0,
        }
    }

    /// Registriert einen Handler für einen Typ oder als Wildcard
    ///
    /// # Fehlerbehandlung
    /// `CapacityExceeded` wenn die Handler-Liste oder die Typ-Tabelle voll ist
    pub fn register(
        &mut self,
        filter: impl Into<EventFilter>,
        handler: &'a dyn EventHandler,
    ) -> Result<HandlerId, EventError> {
        let filter = filter.into();
        let list = match filter {
            EventFilter::Any => &mut self.wildcard,
            EventFilter::Only(kind) => {
                if !self.typed.contains_key(&kind) {
                    self.typed.insert(kind, Vec::new()).map_err(|_| {
                        warn!("EventBus: type table full, cannot add {}", kind.as_str());
                        EventError::CapacityExceeded
                    })?;
                }
                self.typed
                    .get_mut(&kind)
                    .ok_or(EventError::CapacityExceeded)?
            }
        };

        let id = HandlerId(self.next_id);
        list.push(Slot { id, handler }).map_err(|_| {
            warn!("EventBus: handler list full for {}", filter);
            EventError::CapacityExceeded
        })?;
        self.next_id = self.next_id.wrapping_add(1);
        Ok(id)
    }

    /// Entfernt eine Registrierung, die übrigen Handler behalten ihre Reihenfolge
    pub fn unregister(
        &mut self,
        filter: impl Into<EventFilter>,
        id: HandlerId,
    ) -> Result<(), EventError> {
        let list = match filter.into() {
            EventFilter::Any => &mut self.wildcard,
            EventFilter::Only(kind) => self.typed.get_mut(&kind).ok_or(EventError::NotFound)?,
        };
        let position = list
            .iter()
            .position(|slot| slot.id == id)
            .ok_or(EventError::NotFound)?;
        list.remove(position);
        Ok(())
    }

    /// Anzahl registrierter Handler für einen Schlüssel
    pub fn handler_count(&self, filter: impl Into<EventFilter>) -> usize {
        match filter.into() {
            EventFilter::Any => self.wildcard.len(),
            EventFilter::Only(kind) => self.typed.get(&kind).map_or(0, |list| list.len()),
        }
    }

    /// Ruft alle passenden Handler auf
    ///
    /// Gibt `true` zurück, wenn mindestens ein Handler das Event behandelt hat.
    pub fn dispatch(&self, event: &Event) -> bool {
        let mut handled = false;
        for slot in &self.wildcard {
            handled |= slot.handler.handle(event);
        }
        if let Some(list) = self.typed.get(&event.kind) {
            for slot in list {
                handled |= slot.handler.handle(event);
            }
        }
        if !handled {
            debug!("EventBus: no handler for {}", event.kind.as_str());
        }
        handled
    }

    /// Verarbeitet alle aktuell wartenden Events und kehrt dann zurück
    pub fn process_pending(&self, receiver: &EventReceiver<'_>) -> usize {
        let mut count = 0;
        while let Ok(event) = receiver.try_receive() {
            self.dispatch(&event);
            count += 1;
        }
        count
    }

    /// Consumer-Schleife: wartet auf Events und verteilt sie in FIFO-Reihenfolge
    pub async fn run(&self, receiver: EventReceiver<'_>) -> ! {
        info!("EventBus: dispatcher running");
        loop {
            let event = receiver.receive().await;
            self.dispatch(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use super::*;
    use crate::EventChannel;

    struct FixedClock(u64);

    impl Clock for FixedClock {
        fn now_ms(&self) -> u64 {
            self.0
        }
    }

    #[test]
    fn test_post_simple_stamps_clock() {
        let channel = EventChannel::new();
        let clock = FixedClock(1234);
        let publisher = EventPublisher::new(channel.sender(), &clock);

        publisher
            .post_simple(EventType::GameStart, EventSource::WebSocket)
            .unwrap();

        let event = channel.try_receive().unwrap();
        assert_eq!(event.kind, EventType::GameStart);
        assert_eq!(event.source, EventSource::WebSocket);
        assert_eq!(event.timestamp, 1234);
    }

    #[test]
    fn test_recovery_listener_posts_event() {
        let channel = EventChannel::new();
        let clock = FixedClock(7);
        let publisher = EventPublisher::new(channel.sender(), &clock);

        publisher.board_recovered(1, true);

        let event = channel.try_receive().unwrap();
        assert_eq!(event.kind, EventType::ExpanderRecovered);
        assert_eq!(event.data.as_str(), "1");
        assert_eq!(event.message.as_str(), "was_down");
    }

    #[test]
    fn test_unregister_unknown_filter() {
        let handler = |_: &Event| true;
        let mut dispatcher = Dispatcher::new();
        let id = dispatcher.register(EventType::Info, &handler).unwrap();
        assert_eq!(
            dispatcher.unregister(EventType::Error, id),
            Err(EventError::NotFound)
        );
        assert_eq!(dispatcher.unregister(EventType::Info, id), Ok(()));
        assert_eq!(
            dispatcher.unregister(EventType::Info, id),
            Err(EventError::NotFound)
        );
    }

    #[test]
    fn test_wildcard_capacity() {
        let handler = |_: &Event| false;
        let mut dispatcher = Dispatcher::new();
        for _ in 0..MAX_HANDLERS_PER_TYPE {
            dispatcher.register(EventFilter::Any, &handler).unwrap();
        }
        assert_eq!(
            dispatcher.register(EventFilter::Any, &handler),
            Err(EventError::CapacityExceeded)
        );
    }

    #[test]
    fn test_dispatch_without_handler_returns_false() {
        let dispatcher = Dispatcher::new();
        let event = Event::new(EventType::Info, EventSource::System, 0);
        assert!(!dispatcher.dispatch(&event));
    }

    #[test]
    fn test_one_handler_for_several_types() {
        let hits = Cell::new(0u8);
        let handler = |_: &Event| {
            hits.set(hits.get() + 1);
            true
        };
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(EventType::GameStart, &handler).unwrap();
        dispatcher.register(EventType::GameEnd, &handler).unwrap();

        dispatcher.dispatch(&Event::new(EventType::GameStart, EventSource::System, 0));
        dispatcher.dispatch(&Event::new(EventType::GameEnd, EventSource::System, 0));
        dispatcher.dispatch(&Event::new(EventType::Info, EventSource::System, 0));

        assert_eq!(hits.get(), 2);
    }
}
