// LED Engine - setzt LED-Kommandos und Effekte auf den Expander um
use defmt::info;
use embassy_time::{Duration, Instant, Ticker};
use ots_core::config::LED_UPDATE_INTERVAL_MS;
use ots_core::module_io::update_leds;
use ots_core::{LedCommandReceiver, LedEngine};

use crate::SharedExpander;

/// LED Engine Schleife
///
/// Alle 50 ms werden die anstehenden Kommandos übernommen und die Effekte
/// (Blinken, Ablauf, Warn-LED) fortgeschrieben. Ausgabe über den
/// Ausgangs-Expander, Schreibfehler halten die Engine nicht an. Nach einer
/// Board-Recovery schreibt die Engine alle Pegel neu.
///
/// # Parameter
/// - `expander`: geteilter Expander (auch vom I/O-Scan genutzt)
/// - `commands`: Receiver der LED-Command-Queue
pub async fn led_engine_loop(expander: &SharedExpander<'_>, commands: LedCommandReceiver<'_>) {
    let mut engine = LedEngine::new();
    let mut ticker = Ticker::every(Duration::from_millis(LED_UPDATE_INTERVAL_MS));

    info!("LedEngine: running");
    loop {
        {
            let mut guard = expander.lock().await;
            update_leds(&mut engine, Instant::now().as_millis(), &commands, &mut *guard).await;
        }

        ticker.next().await;
    }
}
