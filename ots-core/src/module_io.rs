//! Pin-Zuordnung der Module auf den Expander-Boards
//!
//! Board 0 (0x20): alle 16 Pins Eingang mit Pull-up (Buttons).
//! Board 1 (0x21): alle 16 Pins Ausgang (LEDs).

use embedded_hal_async::delay::DelayNs;

use crate::config::{BUTTON_COUNT, PINS_PER_BOARD};
use crate::error::ExpanderError;
use crate::expander::Expander;
use crate::led_engine::LedEngine;
use crate::traits::{ExpanderBus, LedError, LedWriter};
use crate::types::{LedChannel, LedKind, PinMode};
use crate::LedCommandReceiver;

pub const INPUT_BOARD: u8 = 0;
pub const OUTPUT_BOARD: u8 = 1;

/// Link-LED des Main-Power-Moduls
pub const LINK_LED_PIN: u8 = 7;

/// Nuke-LEDs: atom, hydro, mirv
pub const NUKE_LED_PINS: [u8; 3] = [8, 9, 10];

/// Alert-LEDs: warning, atom, hydro, mirv, land, naval
pub const ALERT_LED_PINS: [u8; 6] = [0, 1, 2, 3, 4, 5];

/// Nuke-Buttons (Eingangs-Board, active low): atom, hydro, mirv
pub const NUKE_BUTTON_PINS: [u8; BUTTON_COUNT] = [1, 2, 3];

/// Board und Pin einer LED
pub fn led_pin(channel: LedChannel) -> Option<(u8, u8)> {
    let index = usize::from(channel.index);
    let pin = match channel.kind {
        LedKind::Nuke => NUKE_LED_PINS.get(index).copied(),
        LedKind::Alert => ALERT_LED_PINS.get(index).copied(),
        LedKind::Link => (index == 0).then_some(LINK_LED_PIN),
    }?;
    Some((OUTPUT_BOARD, pin))
}

/// Richtet beide Boards ein und schaltet alle Ausgänge aus
///
/// Nicht verfügbare Boards werden übersprungen. Gibt die Anzahl
/// eingerichteter Boards zurück.
pub async fn configure_boards<B, D>(expander: &mut Expander<'_, B, D>) -> u8
where
    B: ExpanderBus,
    D: DelayNs,
{
    let mut configured = 0;
    for board in [INPUT_BOARD, OUTPUT_BOARD] {
        if !expander.is_board_present(board) {
            warn!("ModuleIO: board {} not present", board);
            continue;
        }
        match configure_board_role(expander, board).await {
            Ok(()) => configured += 1,
            Err(e) => error!("ModuleIO: board {} setup failed: {}", board, e),
        }
    }
    configured
}

/// Richtet ein Board nach seiner Rolle ein
///
/// Eingangs-Board: Pull-ups. Ausgangs-Board: Ausgänge, alle auf Low. Nach
/// einer Recovery wird nur das wiederhergestellte Board neu eingerichtet,
/// die Latches eines gesunden Ausgangs-Boards bleiben stehen.
pub async fn configure_board_role<B, D>(
    expander: &mut Expander<'_, B, D>,
    board: u8,
) -> Result<(), ExpanderError>
where
    B: ExpanderBus,
    D: DelayNs,
{
    match board {
        INPUT_BOARD => {
            configure_board(expander, board, PinMode::InputPullup).await?;
            info!("ModuleIO: board {} configured as input", board);
        }
        OUTPUT_BOARD => {
            configure_board(expander, board, PinMode::Output).await?;
            for pin in 0..PINS_PER_BOARD {
                expander.digital_write(board, pin, false).await?;
            }
            info!("ModuleIO: board {} configured as output", board);
        }
        _ => return Err(ExpanderError::InvalidArgument),
    }
    Ok(())
}

async fn configure_board<B, D>(
    expander: &mut Expander<'_, B, D>,
    board: u8,
    mode: PinMode,
) -> Result<(), ExpanderError>
where
    B: ExpanderBus,
    D: DelayNs,
{
    for pin in 0..PINS_PER_BOARD {
        expander.set_pin_mode(board, pin, mode).await?;
    }
    Ok(())
}

/// Liest einen Nuke-Button (0 = atom, 1 = hydro, 2 = mirv)
///
/// Gibt `true` zurück, wenn der Button gedrückt ist (Pin auf Low).
pub async fn read_nuke_button<B, D>(
    expander: &mut Expander<'_, B, D>,
    button: usize,
) -> Result<bool, ExpanderError>
where
    B: ExpanderBus,
    D: DelayNs,
{
    let pin = *NUKE_BUTTON_PINS
        .get(button)
        .ok_or(ExpanderError::InvalidArgument)?;
    let level = expander.digital_read(INPUT_BOARD, pin).await?;
    Ok(!level)
}

/// LED-Ausgabe über den Expander
///
/// Wird pro Durchlauf des LED-Tasks um den gesperrten Expander gelegt.
pub struct ExpanderLedWriter<'e, 'a, B, D> {
    expander: &'e mut Expander<'a, B, D>,
}

impl<'e, 'a, B, D> ExpanderLedWriter<'e, 'a, B, D> {
    pub fn new(expander: &'e mut Expander<'a, B, D>) -> Self {
        Self { expander }
    }
}

impl<B, D> LedWriter for ExpanderLedWriter<'_, '_, B, D>
where
    B: ExpanderBus,
    D: DelayNs,
{
    async fn write(&mut self, channel: LedChannel, on: bool) -> Result<(), LedError> {
        let (board, pin) = led_pin(channel).ok_or(LedError::WriteFailed)?;
        self.expander
            .digital_write(board, pin, on)
            .await
            .map_err(|_| LedError::WriteFailed)
    }
}

/// Ein Takt der LED-Engine auf dem gesperrten Expander
///
/// Hat seit dem letzten Takt eine Board-Recovery stattgefunden, werden
/// zuerst alle Kanäle neu geschrieben.
pub async fn update_leds<B, D>(
    engine: &mut LedEngine,
    now_ms: u64,
    commands: &LedCommandReceiver<'_>,
    expander: &mut Expander<'_, B, D>,
) where
    B: ExpanderBus,
    D: DelayNs,
{
    let recoveries = expander.recovery_total();
    let mut writer = ExpanderLedWriter::new(expander);
    engine.resync_after_recovery(recoveries, &mut writer).await;
    engine.update(now_ms, commands, &mut writer).await;
}
