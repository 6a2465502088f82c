//! Entprellung der Nuke-Buttons
//!
//! Ein neuer Pegel wird erst übernommen, wenn er seit `debounce_ms`
//! unverändert anliegt.

use crate::config::{BUTTON_COUNT, BUTTON_DEBOUNCE_MS};

#[derive(Debug, Clone, Copy, Default)]
struct ButtonState {
    /// Entprellter Zustand
    current: bool,
    /// Letzter Rohwert
    raw: bool,
    last_change: u64,
    press_time: u64,
}

/// Flanke nach der Entprellung
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonEdge {
    pub button: usize,
    pub pressed: bool,
    pub timestamp: u64,
}

pub struct ButtonDebouncer {
    states: [ButtonState; BUTTON_COUNT],
    debounce_ms: u64,
}

impl Default for ButtonDebouncer {
    fn default() -> Self {
        Self::new(BUTTON_DEBOUNCE_MS)
    }
}

impl ButtonDebouncer {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            states: [ButtonState::default(); BUTTON_COUNT],
            debounce_ms,
        }
    }

    /// Verarbeitet einen Rohwert und liefert ggf. eine Flanke
    pub fn update(&mut self, button: usize, pressed: bool, now_ms: u64) -> Option<ButtonEdge> {
        let state = self.states.get_mut(button)?;

        if pressed != state.raw {
            state.raw = pressed;
            state.last_change = now_ms;
        }

        if now_ms.saturating_sub(state.last_change) < self.debounce_ms || pressed == state.current {
            return None;
        }

        state.current = pressed;
        if pressed {
            state.press_time = now_ms;
            info!("Buttons: button {} pressed", button);
        } else {
            debug!(
                "Buttons: button {} released (held {} ms)",
                button,
                now_ms.saturating_sub(state.press_time)
            );
        }
        Some(ButtonEdge {
            button,
            pressed,
            timestamp: now_ms,
        })
    }

    /// Entprellter Zustand eines Buttons
    pub fn is_pressed(&self, button: usize) -> bool {
        self.states.get(button).is_some_and(|s| s.current)
    }
}
