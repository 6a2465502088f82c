//! Periodischer I/O-Scan
//!
//! Liest die Nuke-Buttons, postet entprellte Tastendrücke und prüft in
//! größerem Abstand die Gesundheit der Expander-Boards.

use core::fmt::Write;

use embedded_hal_async::delay::DelayNs;

use crate::buttons::ButtonDebouncer;
use crate::config::BUTTON_COUNT;
use crate::event_bus::EventPublisher;
use crate::expander::Expander;
use crate::module_io::{configure_board_role, read_nuke_button};
use crate::traits::ExpanderBus;
use crate::types::{Event, EventSource, EventType};
use crate::SharedExpander;

/// Ergebnis eines Scan-Durchlaufs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScanReport {
    /// Gepostete Tastendrücke
    pub presses: u8,
    /// `Some(n)` wenn in diesem Durchlauf eine Recovery lief
    pub recovered: Option<u8>,
}

pub struct IoScanner {
    buttons: ButtonDebouncer,
    last_health_check: u64,
}

impl Default for IoScanner {
    fn default() -> Self {
        Self::new(ButtonDebouncer::default())
    }
}

impl IoScanner {
    pub fn new(buttons: ButtonDebouncer) -> Self {
        Self {
            buttons,
            last_health_check: 0,
        }
    }

    /// Ein Durchlauf; `now_ms` kommt vom Aufrufer (Ticker)
    ///
    /// Läuft eine Recovery, passiert das hier am Stück inklusive Backoff.
    /// Wer den Expander mit anderen Tasks teilt, nimmt stattdessen
    /// [`IoScanner::poll_buttons`], [`IoScanner::check_health`] und
    /// [`recover_boards`].
    pub async fn scan<B, D>(
        &mut self,
        expander: &mut Expander<'_, B, D>,
        events: &EventPublisher<'_>,
        now_ms: u64,
    ) -> ScanReport
    where
        B: ExpanderBus,
        D: DelayNs,
    {
        let mut report = ScanReport {
            presses: self.poll_buttons(expander, events, now_ms).await,
            recovered: None,
        };

        if self.check_health(expander, now_ms).await {
            let candidates = expander.recovery_candidates();
            let recovered = expander.attempt_recovery().await;
            for board in candidates {
                if expander.is_board_present(board) {
                    reconfigure(expander, board).await;
                }
            }
            report.recovered = Some(recovered);
        }

        report
    }

    /// Liest die Buttons und postet entprellte Tastendrücke
    ///
    /// Gibt die Anzahl geposteter Tastendrücke zurück.
    pub async fn poll_buttons<B, D>(
        &mut self,
        expander: &mut Expander<'_, B, D>,
        events: &EventPublisher<'_>,
        now_ms: u64,
    ) -> u8
    where
        B: ExpanderBus,
        D: DelayNs,
    {
        let mut presses = 0;
        for button in 0..BUTTON_COUNT {
            let Ok(pressed) = read_nuke_button(expander, button).await else {
                continue;
            };
            let Some(edge) = self.buttons.update(button, pressed, now_ms) else {
                continue;
            };
            if !edge.pressed {
                continue;
            }

            let mut event = Event::new(EventType::ButtonPressed, EventSource::Button, now_ms);
            let _ = write!(event.data, "{}", edge.button);
            if events.post(event).is_ok() {
                presses += 1;
            }
        }
        presses
    }

    /// Periodischer Health-Check
    ///
    /// Gibt `true` zurück, wenn der Check fällig war und eine Recovery
    /// nötig ist.
    pub async fn check_health<B, D>(&mut self, expander: &mut Expander<'_, B, D>, now_ms: u64) -> bool
    where
        B: ExpanderBus,
        D: DelayNs,
    {
        let interval = expander.config().health_check_interval_ms;
        if now_ms.saturating_sub(self.last_health_check) < interval {
            return false;
        }
        self.last_health_check = now_ms;
        if expander.health_check().await {
            return false;
        }
        warn!("IoScan: expander health check failed, attempting recovery");
        true
    }

    pub fn buttons(&self) -> &ButtonDebouncer {
        &self.buttons
    }
}

/// Recovery mit kurzen Lock-Abschnitten
///
/// Jeder Versuch sperrt den Expander nur für die eigentliche
/// I2C-Transaktion, die Backoff-Pause läuft ohne Lock über `delay`. Ein
/// wiederhergestelltes Board wird im selben Lock-Abschnitt neu
/// eingerichtet, damit die LED-Engine nie ein halb konfiguriertes Board
/// sieht. Gibt die Anzahl wiederhergestellter Boards zurück.
pub async fn recover_boards<B, D, W>(expander: &SharedExpander<'_, B, D>, delay: &mut W) -> u8
where
    B: ExpanderBus,
    D: DelayNs,
    W: DelayNs,
{
    let (candidates, max_retries) = {
        let guard = expander.lock().await;
        (guard.recovery_candidates(), guard.max_retries())
    };

    let mut recovered = 0;
    for board in candidates {
        let mut back = false;
        for attempt in 0..max_retries {
            let wait = expander.lock().await.retry_delay_ms(attempt);
            if wait > 0 {
                debug!("IoScan: retry #{} for board #{} in {} ms", attempt, board, wait);
                delay.delay_ms(wait).await;
            }

            let mut guard = expander.lock().await;
            if guard.recover_attempt(board).await.is_ok() {
                reconfigure(&mut *guard, board).await;
                back = true;
                break;
            }
        }

        if back {
            recovered += 1;
        } else {
            error!("IoScan: board #{} still unreachable after {} attempts", board, max_retries);
        }
    }

    if recovered > 0 {
        info!("IoScan: recovered {} board(s)", recovered);
    }
    recovered
}

async fn reconfigure<B, D>(expander: &mut Expander<'_, B, D>, board: u8)
where
    B: ExpanderBus,
    D: DelayNs,
{
    if let Err(e) = configure_board_role(expander, board).await {
        error!("IoScan: setup of recovered board #{} failed: {}", board, e);
    }
}
