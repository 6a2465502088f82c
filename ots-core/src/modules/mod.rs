//! Hardware-Module der Konsole
//!
//! Jedes Modul implementiert [`crate::Module`] und reagiert auf Events vom
//! Bus, indem es LED-Kommandos einreiht oder neue Events postet. Kein Modul
//! greift direkt auf den Expander zu.

pub mod alert;
pub mod main_power;
pub mod nuke;
pub mod status_led;

pub use alert::AlertModule;
pub use main_power::{LinkState, MainPowerModule};
pub use nuke::NukeModule;
pub use status_led::{RgbStatus, StatusLedModule};
