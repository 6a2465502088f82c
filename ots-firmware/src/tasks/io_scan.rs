// I/O Scan - liest die Nuke-Buttons und überwacht den Expander
use defmt::{info, warn};
use embassy_time::{Delay, Duration, Instant, Ticker};
use ots_core::EventPublisher;
use ots_core::config::IO_SCAN_INTERVAL_MS;
use ots_core::io_scan::{IoScanner, recover_boards};

use crate::SharedExpander;

/// I/O Scan Schleife
///
/// Pro Durchlauf wird der Expander kurz gesperrt, die Buttons werden
/// entprellt und als `ButtonPressed` gepostet. Fällt der periodische
/// Health-Check durch, läuft die Recovery mit Lock nur pro Versuch, damit
/// die LED-Schleife während der Backoff-Pausen weiterläuft.
///
/// # Parameter
/// - `expander`: geteilter Expander (auch von der LED-Schleife genutzt)
/// - `events`: Publisher für Button-Events
pub async fn io_scan_loop(expander: &SharedExpander<'_>, events: EventPublisher<'_>) {
    let mut scanner = IoScanner::default();
    let mut ticker = Ticker::every(Duration::from_millis(IO_SCAN_INTERVAL_MS));
    let mut delay = Delay;

    info!("IoScan: running");
    loop {
        let needs_recovery = {
            let mut guard = expander.lock().await;
            let now = Instant::now().as_millis();
            scanner.poll_buttons(&mut *guard, &events, now).await;
            scanner.check_health(&mut *guard, now).await
        };

        if needs_recovery {
            match recover_boards(expander, &mut delay).await {
                0 => warn!("IoScan: no board recovered"),
                count => info!("IoScan: {} board(s) recovered", count),
            }
        }

        ticker.next().await;
    }
}
