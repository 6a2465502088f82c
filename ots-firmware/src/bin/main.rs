// Keine Standard-Bibliothek verwenden (Embedded System)
#![no_std]
// Kein normaler main() Einstiegspunkt (wird von esp_rtos bereitgestellt)
#![no_main]
// Verbiete mem::forget - gefährlich bei ESP HAL Types mit DMA-Buffern
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
// Verbiete große Stack-Frames (Stack ist auf Embedded Systemen begrenzt)
#![deny(clippy::large_stack_frames)]

// Embassy Async Runtime
use defmt::{error, info, warn};
use embassy_executor::Spawner;
use embassy_futures::join::join4;
use embassy_sync::mutex::Mutex;
use embassy_time::{Delay, Duration, Timer};

// ESP32-C6 HAL
use esp_hal::clock::CpuClock;
use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::time::Rate;
use esp_hal::timer::timg::TimerGroup;
use esp_hal_smartled::smart_led_buffer;

// Backtrace bei Panic und println!() Support
use {esp_backtrace as _, esp_println as _};

// Orchestrierung
use ots_core::config::{EXPANDER_ADDRESSES, ExpanderConfig};
use ots_core::game_state::GameState;
use ots_core::module_io::configure_boards;
use ots_core::modules::{AlertModule, MainPowerModule, NukeModule, StatusLedModule};
use ots_core::{
    Clock, Dispatcher, Event, EventFilter, EventPublisher, EventSource, EventType, LedController,
    ModuleRegistry, SharedModules,
};

// Projekt-Module und Konfiguration
use ots_firmware::config::{
    I2C_FREQUENCY_KHZ, I2C_SCL_PIN, I2C_SDA_PIN, I2C_TIMEOUT_MS, RMT_CLOCK_MHZ,
    STATUS_LED_GPIO_PIN,
};
use ots_firmware::hal::{EmbassyClock, I2cBus, RmtLedWriter};
use ots_firmware::tasks::{
    event_dispatch_loop, io_scan_loop, led_engine_loop, module_update_loop,
};
use ots_firmware::{EventChannel, Expander, LedCommandChannel};

// ESP-IDF App Descriptor - erforderlich für den Bootloader!
// Ohne diesen schlägt das Flashen mit "ESP-IDF App Descriptor missing" fehl
esp_bootloader_esp_idf::esp_app_desc!();

/// Monotone Uhr für Event-Zeitstempel und Expander-Health
static CLOCK: EmbassyClock = EmbassyClock;

/// Hält die Firmware nach einem fatalen Init-Fehler an
async fn park() -> ! {
    loop {
        Timer::after(Duration::from_secs(3600)).await;
    }
}

/// Main Entry Point
///
/// Initialisiert Hardware, Expander, Module und Event-Bus. Danach laufen
/// Dispatcher, Modul-Updates, I/O-Scan und LED-Engine nebenläufig.
#[esp_rtos::main]
async fn main(_spawner: Spawner) -> ! {
    // ESP32-C6 Konfiguration: CPU auf maximale Taktfrequenz (160 MHz)
    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    // Embassy Runtime initialisieren (Timer + Software Interrupt)
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let sw_interrupt =
        esp_hal::interrupt::software::SoftwareInterruptControl::new(peripherals.SW_INTERRUPT);
    esp_rtos::start(timg0.timer0, sw_interrupt.software_interrupt0);

    info!("OTS: booting");

    // Event-Queue (alle Producer → Dispatcher)
    static EVENTS: static_cell::StaticCell<EventChannel> = static_cell::StaticCell::new();
    let events = &*EVENTS.init(EventChannel::new());
    let publisher = EventPublisher::new(events.sender(), &CLOCK);

    // LED Command-Queue (Module → LED-Engine)
    static LED_COMMANDS: static_cell::StaticCell<LedCommandChannel> =
        static_cell::StaticCell::new();
    let led_commands = &*LED_COMMANDS.init(LedCommandChannel::new());
    let leds = LedController::new(led_commands.sender());

    // I2C Bus für beide MCP23017
    info!(
        "I2C: SDA=GPIO{} SCL=GPIO{} @ {} kHz",
        I2C_SDA_PIN, I2C_SCL_PIN, I2C_FREQUENCY_KHZ
    );
    let i2c_config = I2cConfig::default().with_frequency(Rate::from_khz(I2C_FREQUENCY_KHZ));
    let i2c = match I2c::new(peripherals.I2C0, i2c_config) {
        Ok(i2c) => i2c
            .with_sda(peripherals.GPIO6)
            .with_scl(peripherals.GPIO7)
            .into_async(),
        Err(_) => {
            error!("I2C: invalid bus configuration");
            park().await
        }
    };

    // Expander mit Retry/Backoff hochfahren, fehlende Boards holt der I/O-Scan nach
    let mut expander = Expander::new(
        I2cBus::new(i2c, I2C_TIMEOUT_MS),
        Delay,
        &CLOCK,
        ExpanderConfig::default(),
    );
    expander.set_recovery_callback(&publisher);
    if !expander.begin(&EXPANDER_ADDRESSES).await {
        warn!("Expander: not all boards present, recovery will retry");
    }
    let configured = configure_boards(&mut expander).await;
    info!("Expander: {} board(s) configured", configured);
    let expander = Mutex::new(expander);

    // RGB Status-LED über RMT
    // Buffer für SmartLED Daten (1 LED), muss so lange leben wie der Writer
    let mut rmt_buffer = smart_led_buffer!(1);
    let mut status_led = match RmtLedWriter::new(
        peripherals.GPIO8,
        peripherals.RMT,
        RMT_CLOCK_MHZ,
        &mut rmt_buffer,
    ) {
        Ok(writer) => Some(StatusLedModule::new(writer)),
        Err(_) => {
            error!("StatusLed: RMT init failed on GPIO{}", STATUS_LED_GPIO_PIN);
            None
        }
    };

    // Hardware-Module
    let mut nuke = NukeModule::new(leds, publisher);
    let mut alert = AlertModule::new(leds);
    let mut main_power = MainPowerModule::new(leds);

    let mut registry = ModuleRegistry::new();
    let registered = [
        registry.register(&mut nuke),
        registry.register(&mut alert),
        registry.register(&mut main_power),
    ];
    if registered.iter().any(Result::is_err) {
        error!("Modules: registry full");
    }
    if let Some(status_led) = status_led.as_mut() {
        if registry.register(status_led).is_err() {
            error!("Modules: no slot for status LED");
        }
    }

    if let Err(e) = registry.init_all() {
        error!("Modules: init failed: {}", e);
        park().await
    }
    info!("Modules: {} initialized", registry.len());
    let modules = SharedModules::new(registry);

    // Event-Bus: GameState zuerst, damit das Löschen bei Spielstart vor den
    // Kommandos der Module in der LED-Queue landet
    let game = GameState::new(leds);
    let mut dispatcher = Dispatcher::new();
    if game.register(&mut dispatcher).is_err()
        || dispatcher.register(EventFilter::Any, &modules).is_err()
    {
        error!("EventBus: handler registration failed");
        park().await
    }

    let ready = Event::new(EventType::Info, EventSource::System, CLOCK.now_ms())
        .with_message("System ready");
    if publisher.post(ready).is_err() {
        warn!("EventBus: ready event dropped");
    }

    info!("OTS: running");
    join4(
        event_dispatch_loop(&dispatcher, events.receiver()),
        module_update_loop(&modules),
        io_scan_loop(&expander, publisher),
        led_engine_loop(&expander, led_commands.receiver()),
    )
    .await;

    // Die Schleifen laufen endlos
    park().await
}
