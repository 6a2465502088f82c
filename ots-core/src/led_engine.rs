//! LED-Effekt-Engine
//!
//! Module schicken über den [`LedController`] Kommandos in eine Queue. Der
//! LED-Task besitzt die [`LedEngine`] und ruft in festem Takt
//! [`LedEngine::update`] auf:
//!
//! 1. wartende Kommandos übernehmen
//! 2. abgelaufene `BlinkTimed`-Effekte ausschalten
//! 3. blinkende Kanäle umschalten
//!
//! Die Warn-LED (Alert 0) wird automatisch mitgeschaltet: sie leuchtet,
//! solange irgendeine andere Alert-LED aktiv ist.

use crate::config::{ALERT_LED_COUNT, LED_BLINK_INTERVAL_MS, NUKE_LED_COUNT};
use crate::error::LedCommandError;
use crate::logic::blink_due;
use crate::traits::LedWriter;
use crate::types::{ChannelState, LedChannel, LedCommand, LedEffect, LedKind};
use crate::{LedCommandReceiver, LedCommandSender};

// ============================================================================
// Producer-Seite
// ============================================================================

/// Nicht-blockierende Schnittstelle zur LED-Engine
#[derive(Clone, Copy)]
pub struct LedController<'a> {
    sender: LedCommandSender<'a>,
}

impl<'a> LedController<'a> {
    pub fn new(sender: LedCommandSender<'a>) -> Self {
        Self { sender }
    }

    /// Prüft den Kanal und reiht das Kommando ein
    ///
    /// # Fehlerbehandlung
    /// - `InvalidChannel` für ungültige Typ/Index-Kombinationen (nichts wird eingereiht)
    /// - `QueueFull` wenn die Queue voll ist (Kommando wird verworfen)
    pub fn send_command(&self, command: LedCommand) -> Result<(), LedCommandError> {
        if command.channel().is_none() {
            warn!(
                "LED: invalid channel {} #{}",
                command.kind, command.index
            );
            return Err(LedCommandError::InvalidChannel);
        }
        self.sender.try_send(command).map_err(|_| {
            warn!("LED: command queue full, dropping command");
            LedCommandError::QueueFull
        })
    }

    pub fn set(&self, kind: LedKind, index: u8, effect: LedEffect) -> Result<(), LedCommandError> {
        self.send_command(LedCommand::new(kind, index, effect))
    }

    /// Nuke-LED blinkt mit Standardperiode für `duration_ms`
    pub fn nuke_blink(&self, index: u8, duration_ms: u32) -> Result<(), LedCommandError> {
        self.send_command(LedCommand {
            duration_ms,
            blink_rate_ms: LED_BLINK_INTERVAL_MS,
            ..LedCommand::new(LedKind::Nuke, index, LedEffect::BlinkTimed)
        })
    }

    /// Alert-LED an; mit Dauer blinkt sie bis zum Ablauf
    pub fn alert_on(&self, index: u8, duration_ms: u32) -> Result<(), LedCommandError> {
        let command = if duration_ms == 0 {
            LedCommand::new(LedKind::Alert, index, LedEffect::On)
        } else {
            LedCommand {
                duration_ms,
                ..LedCommand::new(LedKind::Alert, index, LedEffect::BlinkTimed)
            }
        };
        self.send_command(command)
    }

    pub fn alert_off(&self, index: u8) -> Result<(), LedCommandError> {
        self.set(LedKind::Alert, index, LedEffect::Off)
    }

    pub fn link_set(&self, on: bool) -> Result<(), LedCommandError> {
        let effect = if on { LedEffect::On } else { LedEffect::Off };
        self.set(LedKind::Link, 0, effect)
    }

    pub fn link_blink(&self, period_ms: u32) -> Result<(), LedCommandError> {
        self.send_command(LedCommand {
            blink_rate_ms: period_ms,
            ..LedCommand::new(LedKind::Link, 0, LedEffect::Blink)
        })
    }

    /// Schaltet alle Nuke- und Alert-LEDs aus
    ///
    /// Versucht jeden Kanal; der letzte Fehler wird zurückgegeben.
    pub fn all_off(&self) -> Result<(), LedCommandError> {
        let mut result = Ok(());
        for channel in LedChannel::all().filter(|c| c.kind != LedKind::Link) {
            if let Err(e) = self.set(channel.kind, channel.index, LedEffect::Off) {
                result = Err(e);
            }
        }
        result
    }
}

// ============================================================================
// Consumer-Seite
// ============================================================================

/// Zustand aller LED-Kanäle, gehört dem LED-Task
pub struct LedEngine {
    nuke: [ChannelState; NUKE_LED_COUNT as usize],
    alert: [ChannelState; ALERT_LED_COUNT as usize],
    link: ChannelState,
    /// Stand von `Expander::recovery_total` beim letzten Resync
    synced_recoveries: u32,
}

impl Default for LedEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LedEngine {
    pub fn new() -> Self {
        Self {
            nuke: [ChannelState::default(); NUKE_LED_COUNT as usize],
            alert: [ChannelState::default(); ALERT_LED_COUNT as usize],
            link: ChannelState::default(),
            synced_recoveries: 0,
        }
    }

    /// Aktueller Zustand eines Kanals (für Diagnose und Tests)
    pub fn channel(&self, channel: LedChannel) -> Option<&ChannelState> {
        let index = usize::from(channel.index);
        match channel.kind {
            LedKind::Nuke => self.nuke.get(index),
            LedKind::Alert => self.alert.get(index),
            LedKind::Link => (index == 0).then_some(&self.link),
        }
    }

    fn channel_mut(&mut self, channel: LedChannel) -> Option<&mut ChannelState> {
        let index = usize::from(channel.index);
        match channel.kind {
            LedKind::Nuke => self.nuke.get_mut(index),
            LedKind::Alert => self.alert.get_mut(index),
            LedKind::Link => (index == 0).then_some(&mut self.link),
        }
    }

    /// Ein Takt der Engine
    pub async fn update<W: LedWriter>(
        &mut self,
        now_ms: u64,
        commands: &LedCommandReceiver<'_>,
        writer: &mut W,
    ) {
        while let Ok(command) = commands.try_receive() {
            self.apply(now_ms, command, writer).await;
        }
        self.tick(now_ms, writer).await;
    }

    /// Schreibt den aktuellen Pegel aller Kanäle erneut
    ///
    /// Nötig, wenn die Hardware ihre Ausgänge verloren hat (Board nach
    /// Recovery neu eingerichtet). Effekte und Blink-Phasen bleiben.
    pub async fn resync<W: LedWriter>(&mut self, writer: &mut W) {
        for channel in LedChannel::all() {
            let Some(on) = self.channel(channel).map(|state| state.is_on) else {
                continue;
            };
            if writer.write(channel, on).await.is_err() {
                warn!("LED: resync of {} #{} failed", channel.kind, channel.index);
            }
        }
    }

    /// Resync, sobald sich die Zahl der Board-Recoveries geändert hat
    ///
    /// Gibt `true` zurück, wenn neu geschrieben wurde.
    pub async fn resync_after_recovery<W: LedWriter>(
        &mut self,
        recoveries: u32,
        writer: &mut W,
    ) -> bool {
        if recoveries == self.synced_recoveries {
            return false;
        }
        self.synced_recoveries = recoveries;
        info!("LED: resyncing outputs after expander recovery");
        self.resync(writer).await;
        true
    }

    /// Übernimmt ein einzelnes Kommando
    ///
    /// Der Effekt wird immer überschrieben. Blink-Effekte starten in der
    /// hellen Phase.
    pub async fn apply<W: LedWriter>(&mut self, now_ms: u64, command: LedCommand, writer: &mut W) {
        let Some(channel) = command.channel() else {
            warn!("LED: ignoring command for invalid channel");
            return;
        };
        let Some(state) = self.channel_mut(channel) else {
            return;
        };
        debug!("LED: {} #{} -> {}", channel.kind, channel.index, command.effect);

        state.effect = command.effect;
        state.blink_period_ms = if command.blink_rate_ms == 0 {
            LED_BLINK_INTERVAL_MS
        } else {
            command.blink_rate_ms
        };
        state.effect_end_tick = match command.effect {
            LedEffect::BlinkTimed if command.duration_ms > 0 => {
                Some(now_ms + u64::from(command.duration_ms))
            }
            _ => None,
        };
        state.last_toggle_tick = now_ms;
        let on = command.effect != LedEffect::Off;
        drive(state, channel, on, writer).await;

        if is_aggregated_alert(channel) {
            if on {
                self.force_warning(true, writer).await;
            } else {
                self.release_warning(writer).await;
            }
        }
    }

    /// Ablauf und Blinken ohne neue Kommandos
    pub async fn tick<W: LedWriter>(&mut self, now_ms: u64, writer: &mut W) {
        let mut alert_expired = false;

        for channel in LedChannel::all() {
            let Some(state) = self.channel_mut(channel) else {
                continue;
            };

            let expired = state.effect == LedEffect::BlinkTimed
                && state.effect_end_tick.is_some_and(|end| now_ms >= end);
            if expired {
                state.effect = LedEffect::Off;
                state.effect_end_tick = None;
                drive(state, channel, false, writer).await;
                alert_expired |= is_aggregated_alert(channel);
                continue;
            }

            let blinking = matches!(state.effect, LedEffect::Blink | LedEffect::BlinkTimed);
            if blinking && blink_due(now_ms, state.last_toggle_tick, state.blink_period_ms) {
                state.last_toggle_tick = now_ms;
                let on = !state.is_on;
                drive(state, channel, on, writer).await;
            }
        }

        if alert_expired {
            self.release_warning(writer).await;
        }
    }

    fn any_alert_active(&self) -> bool {
        self.alert[1..].iter().any(|s| s.effect != LedEffect::Off)
    }

    async fn force_warning<W: LedWriter>(&mut self, on: bool, writer: &mut W) {
        let warning = &mut self.alert[0];
        warning.effect = if on { LedEffect::On } else { LedEffect::Off };
        warning.effect_end_tick = None;
        drive(warning, LedChannel::WARNING, on, writer).await;
    }

    async fn release_warning<W: LedWriter>(&mut self, writer: &mut W) {
        if !self.any_alert_active() {
            self.force_warning(false, writer).await;
        }
    }
}

fn is_aggregated_alert(channel: LedChannel) -> bool {
    channel.kind == LedKind::Alert && channel.index > 0
}

/// Setzt den Pegel; Schreibfehler werden nur geloggt
async fn drive<W: LedWriter>(state: &mut ChannelState, channel: LedChannel, on: bool, writer: &mut W) {
    state.is_on = on;
    if writer.write(channel, on).await.is_err() {
        warn!("LED: write to {} #{} failed", channel.kind, channel.index);
    }
}
