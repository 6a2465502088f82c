// Task-Modul: Enthält die Schleifen der Firmware
//
// Alle Schleifen laufen nebenläufig im Main-Task (join), weil Module,
// Dispatcher und Expander lokale Referenzen auf Uhr und Publisher halten.
// Kommunikation über die Event-Queue und die LED-Command-Queue, der
// Expander wird über einen async Mutex geteilt.

pub mod event_dispatch;
pub mod io_scan;
pub mod led_engine;
pub mod module_update;

// Re-export für einfachen Import
pub use event_dispatch::event_dispatch_loop;
pub use io_scan::io_scan_loop;
pub use led_engine::led_engine_loop;
pub use module_update::module_update_loop;
