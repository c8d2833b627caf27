//! Adafruit Feather STM32F405 Express adapter.
//!
//! The indicator is the red LED on PC1 plus the onboard WS2812 pixel on
//! PC0, driven together as one logical on/off signal. The board has no user
//! button and no wired console; both degrade to neutral values.

use embassy_stm32::gpio::{Level, Output, Speed};
use embassy_stm32::peripherals::USB_OTG_FS;
use embassy_stm32::rcc::{
    mux, AHBPrescaler, APBPrescaler, Hse, HseMode, Pll, PllMul, PllPDiv, PllPreDiv, PllQDiv,
    PllSource, Sysclk,
};
use embassy_stm32::time::Hertz;
use embassy_stm32::usb::{self, InterruptHandler};
use embassy_stm32::{bind_interrupts, Config as ChipConfig};
use static_cell::ConstStaticCell;

use crate::board::Board;
use crate::config::{ButtonSource, Config, PortRole};
use crate::indicator::{PixelBuffer, Rgb};

bind_interrupts!(pub struct Irqs {
    OTG_FS => InterruptHandler<USB_OTG_FS>;
});

/// USB driver type this adapter hands to the device stack.
pub type UsbDriver = usb::Driver<'static, USB_OTG_FS>;

pub const BOARD_NAME: &str = "Feather STM32F405 Express";

/// Core clock after the PLL settles.
const CORE_CLOCK_HZ: u32 = 168_000_000;

/// Pixels on the board: a single WS2812 next to the reset button.
const NEOPIXEL_COUNT: usize = 1;

/// Pixel palette: dim magenta during bring-up, dim red for "on", dim green
/// for "off".
const PIXEL_BOOT: Rgb = Rgb::new(0x10, 0x00, 0x10);
const PIXEL_ON: Rgb = Rgb::new(0x10, 0x00, 0x00);
const PIXEL_OFF: Rgb = Rgb::new(0x00, 0x10, 0x00);

/// What this board has wired: no button, no console, device on the OTG_FS
/// port. The second OTG controller exists in silicon but is not exposed.
pub const DEFAULT_CONFIG: Config = Config {
    console_baud: 115_200,
    console_enabled: false,
    button: ButtonSource::None,
    usb_ports: [PortRole::Device, PortRole::Disabled],
};

static EP_OUT_BUFFER: ConstStaticCell<[u8; 256]> = ConstStaticCell::new([0u8; 256]);

/// Everything bring-up hands back to the application.
pub struct Bringup {
    pub board: FeatherF405,
    /// Present when the configuration assigns a port the device role.
    pub usb: Option<UsbDriver>,
}

pub struct FeatherF405 {
    led: Output<'static>,
    neopixel: Output<'static>,
    pixels: PixelBuffer<NEOPIXEL_COUNT>,
}

/// Clock tree for USB operation: 12 MHz crystal through the PLL to a
/// 168 MHz system clock, with the PLL Q tap providing the 48 MHz the OTG
/// controller requires.
fn clock_config() -> ChipConfig {
    let mut config = ChipConfig::default();

    config.rcc.hse = Some(Hse {
        freq: Hertz(12_000_000),
        mode: HseMode::Oscillator,
    });
    config.rcc.pll_src = PllSource::HSE;

    // PLL input 12/6 = 2 MHz, VCO 2*168 = 336 MHz, sysclk 336/2 = 168 MHz,
    // USB clock 336/7 = 48 MHz.
    config.rcc.pll = Some(Pll {
        prediv: PllPreDiv::DIV6,
        mul: PllMul::MUL168,
        divp: Some(PllPDiv::DIV2),
        divq: Some(PllQDiv::DIV7),
        divr: None,
    });

    config.rcc.sys = Sysclk::PLL1_P;
    config.rcc.ahb_pre = AHBPrescaler::DIV1;
    config.rcc.apb1_pre = APBPrescaler::DIV4;
    config.rcc.apb2_pre = APBPrescaler::DIV2;

    config.rcc.mux.clk48sel = mux::Clk48sel::PLL1_Q;

    config
}

/// Bring the board to a known-good state: clocks, pins, indicator boot
/// pattern, USB controller. Must run before anything else touches the
/// hardware.
pub fn init(config: &Config) -> Bringup {
    let p = embassy_stm32::init(clock_config());

    #[cfg(feature = "systick")]
    if let Some(mut core) = cortex_m::Peripherals::take() {
        crate::uptime::start(&mut core.SYST, CORE_CLOCK_HZ);
    }

    let led = Output::new(p.PC1, Level::Low, Speed::Low);
    let neopixel = Output::new(p.PC0, Level::Low, Speed::VeryHigh);

    let mut board = FeatherF405 {
        led,
        neopixel,
        pixels: PixelBuffer::new(),
    };

    // Show the boot pattern until the application takes over the indicator.
    board.pixels.fill(PIXEL_BOOT);
    board.show();

    let usb = match config.device_port() {
        Some(0) => {
            let mut usb_config = usb::Config::default();
            // Bus powered board with no VBUS sense wiring.
            usb_config.vbus_detection = false;

            Some(usb::Driver::new_fs(
                p.USB_OTG_FS,
                Irqs,
                p.PA12,
                p.PA11,
                EP_OUT_BUFFER.take(),
                usb_config,
            ))
        }
        _ => None,
    };

    #[cfg(feature = "debug")]
    defmt::info!("{=str} bring-up complete", BOARD_NAME);

    Bringup { board, usb }
}

// WS2812 bit timing at the 168 MHz core clock. A bit lasts ~1.25 us; ones
// hold the line high roughly twice as long as zeros.
const ONE_HIGH_CYCLES: u32 = 120;
const ONE_LOW_CYCLES: u32 = 90;
const ZERO_HIGH_CYCLES: u32 = 50;
const ZERO_LOW_CYCLES: u32 = 160;
const LATCH_CYCLES: u32 = 13_440;

/// Shift the whole pixel buffer out on the data pin. Interrupts stay masked
/// for the frame so the high/low phases hold their timing.
fn shift_out(pin: &mut Output<'static>, pixels: &PixelBuffer<NEOPIXEL_COUNT>) {
    cortex_m::interrupt::free(|_| {
        for pixel in pixels.iter() {
            let grb = pixel.grb();
            for bit in (0..24).rev() {
                if grb & (1 << bit) != 0 {
                    pin.set_high();
                    cortex_m::asm::delay(ONE_HIGH_CYCLES);
                    pin.set_low();
                    cortex_m::asm::delay(ONE_LOW_CYCLES);
                } else {
                    pin.set_high();
                    cortex_m::asm::delay(ZERO_HIGH_CYCLES);
                    pin.set_low();
                    cortex_m::asm::delay(ZERO_LOW_CYCLES);
                }
            }
        }
    });
    // Hold the line low long enough for the pixels to latch the frame.
    cortex_m::asm::delay(LATCH_CYCLES);
}

impl FeatherF405 {
    fn show(&mut self) {
        shift_out(&mut self.neopixel, &self.pixels);
    }
}

impl Board for FeatherF405 {
    fn set_indicator(&mut self, on: bool) {
        self.led.set_level(if on { Level::High } else { Level::Low });
        self.pixels.fill(if on { PIXEL_ON } else { PIXEL_OFF });
        self.show();
    }

    fn button_pressed(&mut self) -> bool {
        // No user input is wired on this board.
        false
    }

    fn console_read(&mut self, _buf: &mut [u8]) -> usize {
        0
    }

    fn console_write(&mut self, _buf: &[u8]) -> usize {
        0
    }
}
