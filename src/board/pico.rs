//! Raspberry Pi Pico (RP2040) adapter.
//!
//! The Pico has no dedicated user button; the BOOTSEL flash chip-select
//! doubles as one, read the same way the bootrom reads it. The debug console
//! rides UART0 on GPIO0/GPIO1, the pins the board breaks out next to the
//! USB connector.

use embassy_rp::gpio::{Level, Output};
use embassy_rp::peripherals::USB;
use embassy_rp::uart::{self, Blocking, Uart};
use embassy_rp::usb::{Driver, InterruptHandler};
use embassy_rp::{bind_interrupts, pac};

use crate::board::Board;
use crate::config::{ButtonSource, Config, PortRole};

bind_interrupts!(pub struct Irqs {
    USBCTRL_IRQ => InterruptHandler<USB>;
});

/// USB driver type this adapter hands to the device stack.
pub type UsbDriver = Driver<'static, USB>;

pub const BOARD_NAME: &str = "Raspberry Pi Pico";

/// Core clock after `embassy_rp::init` with the default clock tree: 12 MHz
/// crystal, PLL to 125 MHz.
const CORE_CLOCK_HZ: u32 = 125_000_000;

/// What this board has wired.
pub const DEFAULT_CONFIG: Config = Config {
    console_baud: 115_200,
    console_enabled: cfg!(feature = "console"),
    button: if cfg!(feature = "button-bootsel") {
        ButtonSource::BootSelect
    } else {
        ButtonSource::None
    },
    usb_ports: [PortRole::Device, PortRole::Disabled],
};

/// Everything bring-up hands back to the application.
pub struct Bringup {
    pub board: Pico,
    /// Present when the configuration assigns a port the device role.
    pub usb: Option<UsbDriver>,
}

pub struct Pico {
    led: Output<'static>,
    console: Option<Uart<'static, Blocking>>,
    button: ButtonSource,
}

/// Bring the board to a known-good state: clocks, pins, optional console,
/// USB controller. Must run before anything else touches the hardware.
pub fn init(config: &Config) -> Bringup {
    let p = embassy_rp::init(Default::default());

    #[cfg(feature = "systick")]
    if let Some(mut core) = cortex_m::Peripherals::take() {
        crate::uptime::start(&mut core.SYST, CORE_CLOCK_HZ);
    }

    let led = Output::new(p.PIN_25, Level::Low);

    let console = if config.console_enabled {
        let mut uart_config = uart::Config::default();
        uart_config.baudrate = config.console_baud;
        Some(Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config))
    } else {
        None
    };

    // The RP2040 exposes a single controller; any other device port index
    // in the configuration leaves the stack without a driver.
    let usb = match config.device_port() {
        Some(0) => Some(Driver::new(p.USB, Irqs)),
        _ => None,
    };

    #[cfg(feature = "debug")]
    defmt::info!("{=str} bring-up complete", BOARD_NAME);

    Bringup {
        board: Pico {
            led,
            console,
            button: config.button,
        },
        usb,
    }
}

/// Reads the BOOTSEL button the way the bootrom does: float the flash chip
/// select and watch whether the button pulls it low.
///
/// Must execute from RAM because flash is unreachable while its chip select
/// is floated; the caller masks interrupts for the same reason. Does not
/// guard against the second core touching flash meanwhile.
#[inline(never)]
#[link_section = ".data.ram_func"]
fn bootsel_is_low() -> bool {
    const CS_PIN_INDEX: usize = 1;

    let cs_io = pac::IO_QSPI.gpio(CS_PIN_INDEX);
    cs_io
        .ctrl()
        .modify(|w| w.set_oeover(pac::io::vals::Oeover::DISABLE));

    // Let the pull settle. Plain counted loop of nops so nothing here
    // touches flash.
    let mut i = 0u32;
    while i < 2_000 {
        cortex_m::asm::nop();
        i = i.wrapping_add(1);
    }

    // The button pulls the pad low when pressed.
    let pressed = !cs_io.status().read().infrompad();

    cs_io
        .ctrl()
        .modify(|w| w.set_oeover(pac::io::vals::Oeover::NORMAL));

    pressed
}

fn bootsel_pressed() -> bool {
    cortex_m::interrupt::free(|_| bootsel_is_low())
}

impl Board for Pico {
    fn set_indicator(&mut self, on: bool) {
        // LED is active high on this board.
        self.led.set_level(if on { Level::High } else { Level::Low });
    }

    fn button_pressed(&mut self) -> bool {
        match self.button {
            ButtonSource::BootSelect => bootsel_pressed(),
            // No dedicated GPIO button exists on this board.
            _ => false,
        }
    }

    fn console_read(&mut self, buf: &mut [u8]) -> usize {
        if self.console.is_none() {
            return 0;
        }
        // Drain whatever the RX FIFO already holds, never wait for more.
        let mut moved = 0;
        while moved < buf.len() && !pac::UART0.uartfr().read().rxfe() {
            buf[moved] = pac::UART0.uartdr().read().data();
            moved += 1;
        }
        moved
    }

    fn console_write(&mut self, buf: &[u8]) -> usize {
        if self.console.is_none() {
            return 0;
        }
        // Fill the TX FIFO as far as it goes and report what fit.
        let mut moved = 0;
        while moved < buf.len() && !pac::UART0.uartfr().read().txff() {
            pac::UART0.uartdr().write(|w| w.set_data(buf[moved]));
            moved += 1;
        }
        moved
    }
}
