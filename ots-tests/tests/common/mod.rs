//! Gemeinsame Mocks für die Host-Tests
//!
//! Jede Testdatei bindet dieses Modul mit `mod common;` ein und nutzt nur
//! einen Teil davon.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use embedded_hal_async::delay::DelayNs;
use ots_core::expander::regs;
use ots_core::{BusError, Clock, ExpanderBus, LedChannel, LedError, LedWriter, SmartLedWriter};
use rgb::RGB8;

// Critical-Section-Implementierung (std) für die embassy-sync Channels
use critical_section as _;

// ============================================================================
// Mock Clock
// ============================================================================

#[derive(Default)]
pub struct MockClock {
    now: Cell<u64>,
}

impl MockClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

// ============================================================================
// Mock Delay
// ============================================================================

/// Zeichnet angeforderte Wartezeiten auf
///
/// Der Expander besitzt das Delay, deshalb teilen sich Klone das Protokoll.
#[derive(Clone, Default)]
pub struct MockDelay {
    delays_ms: Rc<RefCell<Vec<u32>>>,
}

impl MockDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delays(&self) -> Vec<u32> {
        self.delays_ms.borrow().clone()
    }

    pub fn clear(&self) {
        self.delays_ms.borrow_mut().clear();
    }
}

impl DelayNs for MockDelay {
    async fn delay_ns(&mut self, _ns: u32) {}

    async fn delay_ms(&mut self, ms: u32) {
        self.delays_ms.borrow_mut().push(ms);
    }
}

// ============================================================================
// Mock I2C Bus
// ============================================================================

const REGISTER_COUNT: usize = 0x16;

/// Registersatz eines simulierten MCP23017
#[derive(Debug, Clone)]
struct MockDevice {
    reachable: bool,
    registers: [u8; REGISTER_COUNT],
}

impl MockDevice {
    fn new() -> Self {
        let mut registers = [0u8; REGISTER_COUNT];
        // Power-on: alle Pins Eingang, Eingänge offen (High)
        registers[usize::from(regs::IODIRA)] = 0xFF;
        registers[usize::from(regs::IODIRB)] = 0xFF;
        registers[usize::from(regs::GPIOA)] = 0xFF;
        registers[usize::from(regs::GPIOB)] = 0xFF;
        Self {
            reachable: true,
            registers,
        }
    }
}

/// Simulierter I2C-Bus mit mehreren MCP23017
///
/// Nicht angelegte Adressen antworten mit `Nack`. `fail_next` lässt die
/// nächsten n Transaktionen scheitern, unabhängig von der Adresse.
#[derive(Default)]
pub struct MockBus {
    devices: HashMap<u8, MockDevice>,
    attached: Vec<u8>,
    pub fail_next: u32,
    pub attach_calls: Vec<u8>,
    pub detach_calls: Vec<u8>,
    pub reads: u32,
    pub writes: Vec<(u8, u8, u8)>,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_devices(addresses: &[u8]) -> Self {
        let mut bus = Self::new();
        for &address in addresses {
            bus.add_device(address);
        }
        bus
    }

    pub fn add_device(&mut self, address: u8) {
        self.devices.insert(address, MockDevice::new());
    }

    /// Gerät vom Bus trennen bzw. wieder anschließen
    pub fn set_reachable(&mut self, address: u8, reachable: bool) {
        if let Some(device) = self.devices.get_mut(&address) {
            device.reachable = reachable;
        }
    }

    pub fn register(&self, address: u8, register: u8) -> Option<u8> {
        self.devices
            .get(&address)
            .map(|d| d.registers[usize::from(register)])
    }

    /// Pegel eines Eingangs setzen (Pin 0..15)
    pub fn set_input(&mut self, address: u8, pin: u8, high: bool) {
        let register = if pin < 8 { regs::GPIOA } else { regs::GPIOB };
        let bit = 1 << (pin % 8);
        if let Some(device) = self.devices.get_mut(&address) {
            let value = &mut device.registers[usize::from(register)];
            if high {
                *value |= bit;
            } else {
                *value &= !bit;
            }
        }
    }

    pub fn is_attached(&self, address: u8) -> bool {
        self.attached.contains(&address)
    }

    fn transaction(&mut self, address: u8) -> Result<&mut MockDevice, BusError> {
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(BusError::Timeout);
        }
        match self.devices.get_mut(&address) {
            Some(device) if device.reachable => Ok(device),
            _ => Err(BusError::Nack),
        }
    }
}

impl ExpanderBus for MockBus {
    async fn attach(&mut self, address: u8) -> Result<(), BusError> {
        self.attach_calls.push(address);
        if !self.attached.contains(&address) {
            self.attached.push(address);
        }
        Ok(())
    }

    async fn detach(&mut self, address: u8) {
        self.detach_calls.push(address);
        self.attached.retain(|&a| a != address);
    }

    async fn read_register(&mut self, address: u8, register: u8) -> Result<u8, BusError> {
        self.reads += 1;
        let device = self.transaction(address)?;
        device
            .registers
            .get(usize::from(register))
            .copied()
            .ok_or(BusError::Other)
    }

    async fn write_register(
        &mut self,
        address: u8,
        register: u8,
        value: u8,
    ) -> Result<(), BusError> {
        let device = self.transaction(address)?;
        let slot = device
            .registers
            .get_mut(usize::from(register))
            .ok_or(BusError::Other)?;
        *slot = value;
        self.writes.push((address, register, value));
        Ok(())
    }
}

// ============================================================================
// Mock LED Writer (Expander-LEDs)
// ============================================================================

#[derive(Default)]
pub struct RecordingLedWriter {
    pub writes: Vec<(LedChannel, bool)>,
    levels: HashMap<(u8, u8), bool>,
    pub fail_writes: bool,
}

fn key(channel: LedChannel) -> (u8, u8) {
    (channel.kind as u8, channel.index)
}

impl RecordingLedWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zuletzt geschriebener Pegel, `None` wenn nie geschrieben
    pub fn level(&self, channel: LedChannel) -> Option<bool> {
        self.levels.get(&key(channel)).copied()
    }

    pub fn is_on(&self, channel: LedChannel) -> bool {
        self.level(channel).unwrap_or(false)
    }

    /// Anzahl Schreibzugriffe auf einen Kanal
    pub fn writes_to(&self, channel: LedChannel) -> usize {
        self.writes.iter().filter(|(c, _)| *c == channel).count()
    }

    pub fn clear(&mut self) {
        self.writes.clear();
    }
}

impl LedWriter for RecordingLedWriter {
    async fn write(&mut self, channel: LedChannel, on: bool) -> Result<(), LedError> {
        if self.fail_writes {
            return Err(LedError::WriteFailed);
        }
        self.writes.push((channel, on));
        self.levels.insert(key(channel), on);
        Ok(())
    }
}

// ============================================================================
// Mock SmartLED (Status-LED)
// ============================================================================

#[derive(Default)]
pub struct MockSmartLed {
    pub last_color: Option<RGB8>,
    pub write_count: usize,
    pub fail_next_write: bool,
}

impl MockSmartLed {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SmartLedWriter for MockSmartLed {
    fn write(&mut self, color: RGB8) -> Result<(), LedError> {
        if self.fail_next_write {
            self.fail_next_write = false;
            return Err(LedError::WriteFailed);
        }

        self.last_color = Some(color);
        self.write_count += 1;
        Ok(())
    }
}
