//! Integration Tests für die Modul-Registry und die Hardware-Module

mod common;

use std::cell::RefCell;

use common::{MockClock, MockSmartLed};
use ots_core::config::{MAX_MODULES, STATUS_LED_BRIGHTNESS};
use ots_core::logic::dim_color;
use ots_core::modules::{AlertModule, MainPowerModule, NukeModule, RgbStatus, StatusLedModule};
use ots_core::{
    Dispatcher, Event, EventChannel, EventFilter, EventPublisher, EventSource, EventType,
    LedCommandChannel, LedController, LedEffect, LedKind, Module, ModuleError, ModuleRegistry,
    ModuleStatus, RegistryError, SharedModules,
};

// ============================================================================
// Test-Modul
// ============================================================================

type Log = RefCell<Vec<String>>;

struct TestModule<'l> {
    name: &'static str,
    enabled: bool,
    fail_init: bool,
    fail_update: bool,
    handles: Option<EventType>,
    log: &'l Log,
    status: ModuleStatus,
}

impl<'l> TestModule<'l> {
    fn new(name: &'static str, log: &'l Log) -> Self {
        Self {
            name,
            enabled: true,
            fail_init: false,
            fail_update: false,
            handles: None,
            log,
            status: ModuleStatus::default(),
        }
    }

    fn record(&self, action: &str) {
        self.log.borrow_mut().push(format!("{}:{}", self.name, action));
    }
}

impl Module for TestModule<'_> {
    fn name(&self) -> &str {
        self.name
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn init(&mut self) -> Result<(), ModuleError> {
        self.record("init");
        if self.fail_init {
            return Err(ModuleError::Hardware);
        }
        self.status.initialized = true;
        self.status.operational = true;
        Ok(())
    }

    fn update(&mut self) -> Result<(), ModuleError> {
        self.record("update");
        if self.fail_update {
            self.status.record_error("update failed");
            return Err(ModuleError::NotReady);
        }
        Ok(())
    }

    fn handle_event(&mut self, event: &Event) -> bool {
        self.record("event");
        self.handles == Some(event.kind)
    }

    fn status(&self) -> ModuleStatus {
        self.status.clone()
    }

    fn shutdown(&mut self) -> Result<(), ModuleError> {
        self.record("shutdown");
        self.status.operational = false;
        Ok(())
    }
}

fn entries(log: &Log) -> Vec<String> {
    log.borrow().clone()
}

// ============================================================================
// Tests: Registry
// ============================================================================

#[test]
fn test_registry_capacity() {
    let log = Log::default();
    let mut modules: Vec<TestModule> = (0..=MAX_MODULES).map(|_| TestModule::new("m", &log)).collect();
    let (fits, extra) = modules.split_at_mut(MAX_MODULES);

    let mut registry = ModuleRegistry::new();
    for module in fits.iter_mut() {
        registry.register(module).unwrap();
    }
    assert_eq!(registry.register(&mut extra[0]), Err(RegistryError::RegistryFull));
    assert_eq!(registry.len(), MAX_MODULES);
}

#[test]
fn test_init_all_stops_at_first_failure() {
    let log = Log::default();
    let mut first = TestModule::new("first", &log);
    let mut broken = TestModule::new("broken", &log);
    broken.fail_init = true;
    let mut last = TestModule::new("last", &log);

    let mut registry = ModuleRegistry::new();
    registry.register(&mut first).unwrap();
    registry.register(&mut broken).unwrap();
    registry.register(&mut last).unwrap();

    assert_eq!(
        registry.init_all(),
        Err(RegistryError::InitFailed {
            index: 1,
            source: ModuleError::Hardware
        })
    );
    assert_eq!(entries(&log), vec!["first:init", "broken:init"]);

    let initialized: Vec<bool> = registry.statuses().map(|(_, s)| s.initialized).collect();
    assert_eq!(initialized, vec![true, false, false]);
}

#[test]
fn test_disabled_module_isolation() {
    let log = Log::default();
    let mut active = TestModule::new("active", &log);
    active.handles = Some(EventType::Info);
    let mut disabled = TestModule::new("disabled", &log);
    disabled.enabled = false;
    disabled.handles = Some(EventType::Info);

    let mut registry = ModuleRegistry::new();
    registry.register(&mut active).unwrap();
    registry.register(&mut disabled).unwrap();

    registry.init_all().unwrap();
    assert_eq!(registry.update_all(), 0);
    assert!(registry.route_event(&Event::new(EventType::Info, EventSource::System, 0)));
    registry.shutdown_all();

    assert!(entries(&log).iter().all(|e| e.starts_with("active:")));
    assert_eq!(entries(&log).len(), 4);
}

#[test]
fn test_update_failures_are_counted_not_fatal() {
    let log = Log::default();
    let mut flaky = TestModule::new("flaky", &log);
    flaky.fail_update = true;
    let mut steady = TestModule::new("steady", &log);

    let mut registry = ModuleRegistry::new();
    registry.register(&mut flaky).unwrap();
    registry.register(&mut steady).unwrap();
    registry.init_all().unwrap();

    assert_eq!(registry.update_all(), 1);
    assert_eq!(registry.update_all(), 1);
    assert!(entries(&log).contains(&"steady:update".to_string()));

    let (name, status) = registry.statuses().next().unwrap();
    assert_eq!(name, "flaky");
    assert_eq!(status.error_count, 2);
    assert_eq!(status.last_error.as_str(), "update failed");
}

#[test]
fn test_shutdown_in_reverse_order() {
    let log = Log::default();
    let mut a = TestModule::new("a", &log);
    let mut b = TestModule::new("b", &log);
    let mut c = TestModule::new("c", &log);

    let mut registry = ModuleRegistry::new();
    registry.register(&mut a).unwrap();
    registry.register(&mut b).unwrap();
    registry.register(&mut c).unwrap();
    registry.shutdown_all();

    assert_eq!(entries(&log), vec!["c:shutdown", "b:shutdown", "a:shutdown"]);
}

#[test]
fn test_route_event_reaches_every_module() {
    let log = Log::default();
    let mut a = TestModule::new("a", &log);
    a.handles = Some(EventType::GameStart);
    let mut b = TestModule::new("b", &log);

    let mut registry = ModuleRegistry::new();
    registry.register(&mut a).unwrap();
    registry.register(&mut b).unwrap();

    assert!(registry.route_event(&Event::new(EventType::GameStart, EventSource::System, 0)));
    assert!(!registry.route_event(&Event::new(EventType::GameEnd, EventSource::System, 0)));
    assert_eq!(entries(&log), vec!["a:event", "b:event", "a:event", "b:event"]);
}

#[test]
fn test_shared_modules_as_wildcard_handler() {
    let log = Log::default();
    let mut module = TestModule::new("net", &log);
    module.handles = Some(EventType::WsConnected);

    let mut registry = ModuleRegistry::new();
    registry.register(&mut module).unwrap();
    let shared = SharedModules::new(registry);

    let mut dispatcher = Dispatcher::new();
    dispatcher.register(EventFilter::Any, &shared).unwrap();

    assert!(dispatcher.dispatch(&Event::new(EventType::WsConnected, EventSource::WebSocket, 0)));
    assert_eq!(shared.update_all(), 0);
    assert_eq!(shared.with(|r| r.len()), 1);
    assert_eq!(entries(&log), vec!["net:event", "net:update"]);
}

// ============================================================================
// Tests: Hardware-Module
// ============================================================================

#[test]
fn test_module_init_turns_leds_off() {
    let clock = MockClock::new();
    let events = EventChannel::new();
    let leds = LedCommandChannel::new();
    let controller = LedController::new(leds.sender());
    let mut nuke = NukeModule::new(controller, EventPublisher::new(events.sender(), &clock));
    let mut alert = AlertModule::new(controller);
    let mut power = MainPowerModule::new(controller);

    {
        let mut registry = ModuleRegistry::new();
        registry.register(&mut nuke).unwrap();
        registry.register(&mut alert).unwrap();
        registry.register(&mut power).unwrap();
        registry.init_all().unwrap();
        assert!(registry.statuses().all(|(_, s)| s.initialized && s.operational));
    }

    let mut count = 0;
    while let Ok(command) = leds.try_receive() {
        assert_eq!(command.effect, LedEffect::Off);
        count += 1;
    }
    // 3 Nuke + 6 Alert + Link
    assert_eq!(count, 10);
}

#[test]
fn test_alert_module_nuke_alert() {
    let leds = LedCommandChannel::new();
    let mut alert = AlertModule::new(LedController::new(leds.sender()));

    assert!(alert.handle_event(&Event::new(EventType::AlertHydro, EventSource::WebSocket, 0)));
    let command = leds.try_receive().unwrap();
    assert_eq!(command.kind, LedKind::Alert);
    assert_eq!(command.index, 2);
    assert_eq!(command.effect, LedEffect::BlinkTimed);
    assert_eq!(command.duration_ms, 10_000);
}

#[test]
fn test_alert_module_game_end_clears_all() {
    let leds = LedCommandChannel::new();
    let mut alert = AlertModule::new(LedController::new(leds.sender()));

    alert.handle_event(&Event::new(EventType::GameLost, EventSource::WebSocket, 0));
    let commands: Vec<_> = std::iter::from_fn(|| leds.try_receive().ok()).collect();
    assert_eq!(commands.len(), 6);
    assert!(commands.iter().all(|c| c.effect == LedEffect::Off));
}

#[test]
fn test_module_records_rejected_led_command() {
    let leds = LedCommandChannel::new();
    let controller = LedController::new(leds.sender());
    let mut alert = AlertModule::new(controller);

    // Queue füllen, damit das nächste Kommando abgelehnt wird
    while controller.alert_off(1).is_ok() {}

    assert!(alert.handle_event(&Event::new(EventType::AlertAtom, EventSource::WebSocket, 0)));
    let status = alert.status();
    assert_eq!(status.error_count, 1);
    assert_eq!(status.last_error.as_str(), "LED command rejected");
}

#[test]
fn test_status_led_follows_connection() {
    let mut status = StatusLedModule::new(MockSmartLed::new());
    status.init().unwrap();
    assert_eq!(status.state(), RgbStatus::WifiConnecting);

    status.handle_event(&Event::new(EventType::NetworkConnected, EventSource::System, 0));
    assert_eq!(status.state(), RgbStatus::WifiOnly);
    status.handle_event(&Event::new(EventType::WsConnected, EventSource::System, 0));
    status.handle_event(&Event::new(EventType::GameStart, EventSource::WebSocket, 0));
    assert_eq!(status.state(), RgbStatus::GameStarted);
    assert_eq!(
        status.writer().last_color,
        Some(dim_color(RgbStatus::GameStarted.color(), STATUS_LED_BRIGHTNESS))
    );
    assert_eq!(status.writer().write_count, 4);
}

#[test]
fn test_status_led_writes_only_on_change() {
    let mut status = StatusLedModule::new(MockSmartLed::new());
    status.set_state(RgbStatus::Error).unwrap();
    status.set_state(RgbStatus::Error).unwrap();
    assert_eq!(status.writer().write_count, 1);

    assert!(!status.handle_event(&Event::new(EventType::AlertAtom, EventSource::WebSocket, 0)));
    assert_eq!(status.writer().write_count, 1);
}

#[test]
fn test_status_led_write_failure() {
    let mut led = MockSmartLed::new();
    led.fail_next_write = true;
    let mut status = StatusLedModule::new(led);

    assert_eq!(status.init(), Err(ModuleError::Hardware));
    assert_eq!(status.status().error_count, 1);
}
