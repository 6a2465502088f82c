// Monotone Zeitquelle auf Basis des Embassy-Timers

use embassy_time::Instant;
use ots_core::Clock;

/// Millisekunden seit Boot
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }
}
