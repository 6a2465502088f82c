// Module Update - ruft periodisch update() aller Module auf
use defmt::warn;
use embassy_time::{Duration, Ticker};
use ots_core::SharedModules;
use ots_core::config::MODULE_UPDATE_INTERVAL_MS;

pub async fn module_update_loop(modules: &SharedModules<'_>) {
    let mut ticker = Ticker::every(Duration::from_millis(MODULE_UPDATE_INTERVAL_MS));

    loop {
        let failures = modules.update_all();
        if failures > 0 {
            warn!("Modules: {} update(s) failed", failures);
        }
        ticker.next().await;
    }
}
