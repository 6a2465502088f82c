//! Resilienz-Layer für MCP23017 GPIO-Expander
//!
//! Jedes Board wird mit Retry und exponentiellem Backoff initialisiert. Jede
//! Pin-Operation zählt als Erfolg oder Fehler in den [`BoardHealth`] des
//! Boards. Nach `error_threshold` Fehlern in Folge gilt ein Board als
//! unhealthy und kommt nur über eine Re-Initialisierung zurück
//! ([`Expander::attempt_recovery`]).

use embedded_hal_async::delay::DelayNs;
use heapless::Vec;

use crate::config::{ExpanderConfig, MAX_BOARDS, PINS_PER_BOARD};
use crate::error::ExpanderError;
use crate::logic::{backoff_delay_ms, pin_register, with_bit};
use crate::traits::{BusError, Clock, ExpanderBus, RecoveryListener};
use crate::types::{BoardHealth, PinMode};

/// MCP23017 Register (IOCON.BANK = 0)
pub mod regs {
    pub const IODIRA: u8 = 0x00;
    pub const IODIRB: u8 = 0x01;
    pub const GPPUA: u8 = 0x0C;
    pub const GPPUB: u8 = 0x0D;
    pub const GPIOA: u8 = 0x12;
    pub const GPIOB: u8 = 0x13;
    pub const OLATA: u8 = 0x14;
    pub const OLATB: u8 = 0x15;
}

/// Ein konfiguriertes Board
#[derive(Debug, Clone, Copy)]
struct ExpanderBoard {
    address: u8,
    attached: bool,
    initialized: bool,
    health: BoardHealth,
}

impl ExpanderBoard {
    fn new(address: u8, now_ms: u64) -> Self {
        Self {
            address,
            attached: false,
            initialized: false,
            health: BoardHealth {
                last_health_check: now_ms,
                ..BoardHealth::default()
            },
        }
    }
}

/// Bis zu `MAX_BOARDS` Expander an einem gemeinsamen I2C-Bus
pub struct Expander<'a, B, D> {
    bus: B,
    delay: D,
    clock: &'a dyn Clock,
    config: ExpanderConfig,
    boards: Vec<ExpanderBoard, MAX_BOARDS>,
    listener: Option<&'a dyn RecoveryListener>,
}

impl<'a, B, D> Expander<'a, B, D>
where
    B: ExpanderBus,
    D: DelayNs,
{
    pub fn new(bus: B, delay: D, clock: &'a dyn Clock, config: ExpanderConfig) -> Self {
        Self {
            bus,
            delay,
            clock,
            config,
            boards: Vec::new(),
            listener: None,
        }
    }

    /// Callback nach erfolgreicher Re-Initialisierung eines Boards
    pub fn set_recovery_callback(&mut self, listener: &'a dyn RecoveryListener) {
        self.listener = Some(listener);
        info!("Expander: recovery callback registered");
    }

    pub fn config(&self) -> &ExpanderConfig {
        &self.config
    }

    /// Zugriff auf den Bus (z.B. für Diagnose im Test)
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Konfiguriert die Boards und initialisiert jedes mit Retry
    ///
    /// Gibt `true` nur zurück, wenn alle Boards erreichbar waren. Erfolgreich
    /// initialisierte Boards bleiben auch bei `false` nutzbar.
    pub async fn begin(&mut self, addresses: &[u8]) -> bool {
        if addresses.is_empty() || addresses.len() > MAX_BOARDS {
            error!(
                "Expander: invalid board count {} (max {})",
                addresses.len(),
                MAX_BOARDS
            );
            return false;
        }

        for board in self.boards.iter_mut().filter(|b| b.attached) {
            self.bus.detach(board.address).await;
            board.attached = false;
        }
        self.boards.clear();

        info!("Expander: initializing {} board(s)", addresses.len());
        let now = self.clock.now_ms();
        let mut all_ok = true;
        for (index, &address) in addresses.iter().enumerate() {
            if self.boards.push(ExpanderBoard::new(address, now)).is_err() {
                return false;
            }
            if self.init_board(index).await.is_err() {
                error!("Expander: board #{} at {:#x} failed to initialize", index, address);
                all_ok = false;
            }
        }

        let ready = self.boards.iter().filter(|b| b.initialized).count();
        info!("Expander: {}/{} board(s) ready", ready, addresses.len());
        if !all_ok {
            warn!("Expander: some boards missing, recovery will retry them");
        }
        all_ok
    }

    /// Init mit Retry und Backoff
    async fn init_board(&mut self, index: usize) -> Result<(), ExpanderError> {
        let Some(address) = self.boards.get(index).map(|b| b.address) else {
            return Err(ExpanderError::InvalidArgument);
        };

        for attempt in 0..self.config.max_retries {
            let wait = self.retry_delay_ms(attempt);
            if wait > 0 {
                warn!(
                    "Expander: retry #{} for {:#x} in {} ms",
                    attempt, address, wait
                );
                self.delay.delay_ms(wait).await;
            }

            if self.try_attach(address).await.is_ok() {
                self.mark_ready(index, attempt);
                return Ok(());
            }
        }

        error!(
            "Expander: {:#x} unreachable after {} attempts",
            address, self.config.max_retries
        );
        Err(ExpanderError::RetriesExhausted)
    }

    fn mark_ready(&mut self, index: usize, attempt: u8) {
        let board = &mut self.boards[index];
        board.attached = true;
        board.initialized = true;
        board.health.healthy = true;
        board.health.consecutive_errors = 0;
        info!(
            "Expander: board #{} ready at {:#x} (attempt {})",
            index,
            board.address,
            attempt + 1
        );
    }

    /// Ein Versuch: Gerät anlegen und mit einem Test-Read prüfen
    async fn try_attach(&mut self, address: u8) -> Result<(), BusError> {
        self.bus.attach(address).await?;
        match self.bus.read_register(address, regs::IODIRA).await {
            Ok(_) => Ok(()),
            Err(e) => {
                self.bus.detach(address).await;
                Err(e)
            }
        }
    }

    /// Prüft Board- und Pin-Index und liefert Index und Adresse
    fn target(&self, board: u8, pin: u8) -> Result<(usize, u8), ExpanderError> {
        let index = usize::from(board);
        let entry = self
            .boards
            .get(index)
            .ok_or(ExpanderError::InvalidArgument)?;
        if pin >= PINS_PER_BOARD {
            return Err(ExpanderError::InvalidArgument);
        }
        if !entry.initialized {
            return Err(ExpanderError::NotInitialized);
        }
        Ok((index, entry.address))
    }

    /// Read-Modify-Write eines einzelnen Bits
    async fn modify_bit(
        &mut self,
        address: u8,
        register: u8,
        bit: u8,
        set: bool,
    ) -> Result<(), BusError> {
        let current = self.bus.read_register(address, register).await?;
        self.bus
            .write_register(address, register, with_bit(current, bit, set))
            .await
    }

    /// Verbucht das Ergebnis einer Transaktion im Health-Status
    fn track<T>(&mut self, index: usize, result: Result<T, BusError>) -> Result<T, ExpanderError> {
        match result {
            Ok(value) => {
                self.record_success(index);
                Ok(value)
            }
            Err(e) => {
                self.record_error(index);
                Err(e.into())
            }
        }
    }

    fn record_error(&mut self, index: usize) {
        let now = self.clock.now_ms();
        let threshold = self.config.error_threshold;
        let Some(board) = self.boards.get_mut(index) else {
            return;
        };
        let health = &mut board.health;
        health.error_count = health.error_count.saturating_add(1);
        health.consecutive_errors = health.consecutive_errors.saturating_add(1);
        health.last_error_time = now;

        if health.healthy && health.consecutive_errors >= threshold {
            health.healthy = false;
            warn!(
                "Expander: board #{} marked unhealthy ({} consecutive errors)",
                index, health.consecutive_errors
            );
        }
    }

    /// Setzt nur die Fehlerserie zurück; `healthy` bleibt unverändert
    fn record_success(&mut self, index: usize) {
        if let Some(board) = self.boards.get_mut(index) {
            board.health.consecutive_errors = 0;
        }
    }

    pub async fn set_pin_mode(
        &mut self,
        board: u8,
        pin: u8,
        mode: PinMode,
    ) -> Result<(), ExpanderError> {
        let (index, address) = self.target(board, pin)?;
        let (direction, bit) = pin_register(regs::IODIRA, pin);
        let input = mode != PinMode::Output;

        let mut result = self.modify_bit(address, direction, bit, input).await;
        if result.is_ok() && input {
            let (pullup, _) = pin_register(regs::GPPUA, pin);
            result = self
                .modify_bit(address, pullup, bit, mode == PinMode::InputPullup)
                .await;
        }
        self.track(index, result)
    }

    pub async fn digital_write(&mut self, board: u8, pin: u8, high: bool) -> Result<(), ExpanderError> {
        let (index, address) = self.target(board, pin)?;
        let (latch, bit) = pin_register(regs::OLATA, pin);
        let result = self.modify_bit(address, latch, bit, high).await;
        self.track(index, result)
    }

    pub async fn digital_read(&mut self, board: u8, pin: u8) -> Result<bool, ExpanderError> {
        let (index, address) = self.target(board, pin)?;
        let (port, bit) = pin_register(regs::GPIOA, pin);
        let result = self
            .bus
            .read_register(address, port)
            .await
            .map(|value| value & (1 << bit) != 0);
        self.track(index, result)
    }

    /// Prüft fällige Boards mit einem Test-Read
    ///
    /// Jedes Board wird höchstens alle `health_check_interval_ms` geprüft.
    /// Gibt `true` zurück, wenn alle konfigurierten Boards initialisiert und
    /// healthy sind.
    pub async fn health_check(&mut self) -> bool {
        if self.boards.is_empty() {
            return false;
        }

        let now = self.clock.now_ms();
        let interval = self.config.health_check_interval_ms;
        let mut all_healthy = true;

        for index in 0..self.boards.len() {
            let board = &mut self.boards[index];
            if !board.initialized {
                all_healthy = false;
                continue;
            }
            if now.saturating_sub(board.health.last_health_check) < interval {
                all_healthy &= board.health.healthy;
                continue;
            }
            board.health.last_health_check = now;
            let address = board.address;

            let result = self.bus.read_register(address, regs::IODIRA).await;
            if self.track(index, result).is_err() {
                warn!("Expander: health check failed for board #{} ({:#x})", index, address);
            }
            all_healthy &= self.boards[index].health.healthy;
        }
        all_healthy
    }

    /// Initialisiert alle Boards neu, die nicht verfügbar sind
    ///
    /// Betrifft unhealthy Boards und Boards, die nie hochgekommen sind.
    /// Gibt die Anzahl wiederhergestellter Boards zurück.
    pub async fn attempt_recovery(&mut self) -> u8 {
        let mut recovered = 0;
        for board in 0..self.boards.len() as u8 {
            if self.is_board_present(board) {
                continue;
            }
            if let Some(health) = self.health(board) {
                info!(
                    "Expander: recovering board #{} (errors: {}, consecutive: {})",
                    board, health.error_count, health.consecutive_errors
                );
            }
            if self.reinit_board(board).await.is_ok() {
                recovered += 1;
            }
        }

        if recovered > 0 {
            info!("Expander: recovered {} board(s)", recovered);
        } else {
            warn!("Expander: no boards recovered");
        }
        recovered
    }

    /// Gerät freigeben und mit Retry neu initialisieren
    ///
    /// War das Board vorher nicht verfügbar, zählt ein Erfolg als Recovery:
    /// `recovery_count += 1` und einmaliger Callback. Ein gesundes Board wird
    /// nur neu angelegt.
    pub async fn reinit_board(&mut self, board: u8) -> Result<(), ExpanderError> {
        let was_down = !self.is_board_present(board);
        let index = self.release(board).await?;
        self.init_board(index).await?;
        self.finish_recovery(board, was_down);
        Ok(())
    }

    /// Boards, die initialisiert werden müssen
    pub fn recovery_candidates(&self) -> Vec<u8, MAX_BOARDS> {
        (0..self.board_count())
            .filter(|&board| !self.is_board_present(board))
            .collect()
    }

    /// Wartezeit vor Versuch `attempt` (0 für den ersten)
    pub fn retry_delay_ms(&self, attempt: u8) -> u32 {
        backoff_delay_ms(
            attempt,
            self.config.initial_retry_delay_ms,
            self.config.max_retry_delay_ms,
        )
    }

    pub fn max_retries(&self) -> u8 {
        self.config.max_retries
    }

    /// Ein einzelner Recovery-Versuch ohne Wartezeit
    ///
    /// Für Aufrufer, die den Expander hinter einem Mutex teilen: der Backoff
    /// zwischen zwei Versuchen läuft dann außerhalb des Locks
    /// ([`crate::io_scan::recover_boards`]). Ein bereits verfügbares Board
    /// bleibt unangetastet.
    pub async fn recover_attempt(&mut self, board: u8) -> Result<(), ExpanderError> {
        if self.is_board_present(board) {
            return Ok(());
        }
        let index = self.release(board).await?;
        let address = self.boards[index].address;
        self.try_attach(address).await?;
        self.mark_ready(index, 0);
        self.finish_recovery(board, true);
        Ok(())
    }

    /// Markiert das Board als nicht verfügbar und gibt das Gerät frei
    async fn release(&mut self, board: u8) -> Result<usize, ExpanderError> {
        let index = usize::from(board);
        let Some(entry) = self.boards.get_mut(index) else {
            return Err(ExpanderError::InvalidArgument);
        };
        info!("Expander: reinitializing board #{} ({:#x})", board, entry.address);

        let address = entry.address;
        let was_attached = entry.attached;
        entry.attached = false;
        entry.initialized = false;
        entry.health.healthy = false;
        if was_attached {
            self.bus.detach(address).await;
        }
        Ok(index)
    }

    fn finish_recovery(&mut self, board: u8, was_down: bool) {
        if !was_down {
            return;
        }
        let health = &mut self.boards[usize::from(board)].health;
        health.recovery_count = health.recovery_count.saturating_add(1);
        info!(
            "Expander: board #{} back online (recoveries: {})",
            board, health.recovery_count
        );
        if let Some(listener) = self.listener {
            listener.board_recovered(board, true);
        }
    }

    /// Summe aller Recoveries seit `begin`
    ///
    /// Steigt bei jeder Recovery; nach einem Wiederanlauf hat das Board seine
    /// Ausgangs-Latches verloren.
    pub fn recovery_total(&self) -> u32 {
        self.boards
            .iter()
            .fold(0u32, |sum, b| sum.saturating_add(b.health.recovery_count))
    }

    /// Setzt die Fehlerzähler eines Boards zurück
    pub fn reset_errors(&mut self, board: u8) {
        if let Some(entry) = self.boards.get_mut(usize::from(board)) {
            entry.health.error_count = 0;
            entry.health.consecutive_errors = 0;
            info!("Expander: error counters reset for board #{}", board);
        }
    }

    /// Initialisiert und healthy
    pub fn is_board_present(&self, board: u8) -> bool {
        self.boards
            .get(usize::from(board))
            .is_some_and(|b| b.initialized && b.health.healthy)
    }

    pub fn health(&self, board: u8) -> Option<BoardHealth> {
        self.boards.get(usize::from(board)).map(|b| b.health)
    }

    /// Anzahl konfigurierter Boards (auch nicht erreichbarer)
    pub fn board_count(&self) -> u8 {
        self.boards.len() as u8
    }

    /// true wenn mindestens ein Board initialisiert ist
    pub fn is_initialized(&self) -> bool {
        self.boards.iter().any(|b| b.initialized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_map_port_b_follows_port_a() {
        assert_eq!(regs::IODIRB, regs::IODIRA + 1);
        assert_eq!(regs::GPPUB, regs::GPPUA + 1);
        assert_eq!(regs::GPIOB, regs::GPIOA + 1);
        assert_eq!(regs::OLATB, regs::OLATA + 1);
    }

    #[test]
    fn test_new_board_is_not_healthy() {
        let board = ExpanderBoard::new(0x20, 42);
        assert!(!board.initialized);
        assert!(!board.health.healthy);
        assert_eq!(board.health.last_health_check, 42);
    }
}
