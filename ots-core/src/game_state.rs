//! Spielphase, abgeleitet aus den Spiel-Events

use core::cell::Cell;

use crate::error::EventError;
use crate::event_bus::{Dispatcher, EventHandler, HandlerId};
use crate::led_engine::LedController;
use crate::types::{Event, EventFilter, EventType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GamePhase {
    Lobby,
    Spawning,
    InGame,
    Won,
    Lost,
    Ended,
}

/// Verfolgt die Phase; bei Spielstart werden alle Nuke- und Alert-LEDs gelöscht
pub struct GameState<'a> {
    phase: Cell<GamePhase>,
    leds: LedController<'a>,
}

impl<'a> GameState<'a> {
    pub fn new(leds: LedController<'a>) -> Self {
        Self {
            phase: Cell::new(GamePhase::Lobby),
            leds,
        }
    }

    /// Registriert den Handler als Wildcard
    ///
    /// Wildcards laufen vor den typisierten Handlern. Das Löschen der LEDs
    /// bei Spielstart landet so vor den Kommandos der Module in der Queue.
    /// Muss vor den Modulen registriert werden.
    pub fn register(&'a self, dispatcher: &mut Dispatcher<'a>) -> Result<HandlerId, EventError> {
        dispatcher.register(EventFilter::Any, self)
    }

    pub fn phase(&self) -> GamePhase {
        self.phase.get()
    }

    pub fn is_in_game(&self) -> bool {
        matches!(self.phase(), GamePhase::InGame | GamePhase::Spawning)
    }

    pub fn reset(&self) {
        self.phase.set(GamePhase::Lobby);
        info!("GameState: reset to lobby");
    }
}

impl EventHandler for GameState<'_> {
    fn handle(&self, event: &Event) -> bool {
        let next = match event.kind {
            EventType::GameSpawning => GamePhase::Spawning,
            EventType::GameStart => GamePhase::InGame,
            EventType::GameEnd => GamePhase::Ended,
            EventType::GameWon => GamePhase::Won,
            EventType::GameLost => GamePhase::Lost,
            _ => return false,
        };

        if event.kind == EventType::GameStart && self.leds.all_off().is_err() {
            warn!("GameState: could not clear all LEDs at game start");
        }

        let previous = self.phase.replace(next);
        if previous != next {
            info!("GameState: {} -> {}", previous, next);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LedCommandChannel;
    use crate::types::EventSource;

    #[test]
    fn test_phase_follows_game_events() {
        let queue = LedCommandChannel::new();
        let state = GameState::new(LedController::new(queue.sender()));

        assert!(state.handle(&Event::new(EventType::GameSpawning, EventSource::WebSocket, 0)));
        assert!(state.is_in_game());
        state.handle(&Event::new(EventType::GameWon, EventSource::WebSocket, 0));
        assert_eq!(state.phase(), GamePhase::Won);
        assert!(!state.handle(&Event::new(EventType::AlertAtom, EventSource::WebSocket, 0)));
        assert_eq!(state.phase(), GamePhase::Won);
        state.reset();
        assert_eq!(state.phase(), GamePhase::Lobby);
    }

    #[test]
    fn test_game_start_clears_leds() {
        let queue = LedCommandChannel::new();
        let state = GameState::new(LedController::new(queue.sender()));

        state.handle(&Event::new(EventType::GameStart, EventSource::WebSocket, 0));
        assert_eq!(queue.len(), 9);
        assert_eq!(state.phase(), GamePhase::InGame);
    }
}
