//! Pure Business Logic Functions
//!
//! Funktionen ohne Hardware-Dependencies (testbar!)

use rgb::RGB8;

/// Wartezeit vor Init-Versuch `attempt` (0-basiert)
///
/// Der erste Versuch startet sofort, jeder Retry verdoppelt die Wartezeit
/// bis zur Obergrenze.
///
/// # Beispiele
///
/// ```
/// # use ots_core::logic::backoff_delay_ms;
/// assert_eq!(backoff_delay_ms(0, 100, 5000), 0);
/// assert_eq!(backoff_delay_ms(1, 100, 5000), 100);
/// assert_eq!(backoff_delay_ms(3, 100, 5000), 400);
/// assert_eq!(backoff_delay_ms(10, 100, 5000), 5000);
/// ```
pub fn backoff_delay_ms(attempt: u8, initial_ms: u32, max_ms: u32) -> u32 {
    if attempt == 0 {
        return 0;
    }
    let shift = u32::from(attempt - 1);
    let factor = 1u32.checked_shl(shift).unwrap_or(u32::MAX);
    initial_ms.saturating_mul(factor).min(max_ms)
}

/// Register-Adresse und Bit für einen Pin
///
/// `port_a_register` ist das Port-A-Register (BANK = 0), Port B liegt direkt
/// dahinter. Pins 0..8 liegen auf Port A, 8..16 auf Port B.
pub const fn pin_register(port_a_register: u8, pin: u8) -> (u8, u8) {
    (port_a_register + pin / 8, pin % 8)
}

/// Setzt oder löscht ein Bit
pub const fn with_bit(value: u8, bit: u8, set: bool) -> u8 {
    if set {
        value | (1 << bit)
    } else {
        value & !(1 << bit)
    }
}

/// true wenn eine Blinkphase abgelaufen ist
pub const fn blink_due(now_ms: u64, last_toggle_ms: u64, period_ms: u32) -> bool {
    now_ms.saturating_sub(last_toggle_ms) >= period_ms as u64
}

/// Skaliert eine Farbe auf die gewünschte Helligkeit (0-255)
///
/// # Beispiele
///
/// ```
/// # use rgb::RGB8;
/// # use ots_core::logic::dim_color;
/// let full = RGB8 { r: 255, g: 128, b: 0 };
/// assert_eq!(dim_color(full, 255), full);
/// assert_eq!(dim_color(full, 0), RGB8 { r: 0, g: 0, b: 0 });
/// ```
pub fn dim_color(color: RGB8, brightness: u8) -> RGB8 {
    let scale = |c: u8| ((u16::from(c) * u16::from(brightness)) / 255) as u8;
    RGB8 {
        r: scale(color.r),
        g: scale(color.g),
        b: scale(color.b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_first_attempt_immediate() {
        assert_eq!(backoff_delay_ms(0, 100, 5000), 0);
    }

    #[test]
    fn test_backoff_doubles() {
        assert_eq!(backoff_delay_ms(1, 100, 5000), 100);
        assert_eq!(backoff_delay_ms(2, 100, 5000), 200);
        assert_eq!(backoff_delay_ms(3, 100, 5000), 400);
        assert_eq!(backoff_delay_ms(4, 100, 5000), 800);
    }

    #[test]
    fn test_backoff_capped() {
        assert_eq!(backoff_delay_ms(7, 100, 5000), 5000);
        assert_eq!(backoff_delay_ms(200, 100, 5000), 5000);
    }

    #[test]
    fn test_pin_register_port_a() {
        assert_eq!(pin_register(0x12, 0), (0x12, 0));
        assert_eq!(pin_register(0x12, 7), (0x12, 7));
    }

    #[test]
    fn test_pin_register_port_b() {
        assert_eq!(pin_register(0x12, 8), (0x13, 0));
        assert_eq!(pin_register(0x14, 15), (0x15, 7));
    }

    #[test]
    fn test_with_bit() {
        assert_eq!(with_bit(0b0000_0000, 3, true), 0b0000_1000);
        assert_eq!(with_bit(0b1111_1111, 0, false), 0b1111_1110);
        assert_eq!(with_bit(0b0000_1000, 3, true), 0b0000_1000);
    }

    #[test]
    fn test_blink_due() {
        assert!(!blink_due(499, 0, 500));
        assert!(blink_due(500, 0, 500));
        assert!(!blink_due(0, 100, 500));
    }

    #[test]
    fn test_dim_color_half() {
        let dimmed = dim_color(RGB8 { r: 255, g: 0, b: 100 }, 128);
        assert_eq!(dimmed, RGB8 { r: 128, g: 0, b: 50 });
    }
}
