//! Demo firmware for the board layer.
//!
//! Exposes a CDC ACM serial port bridged to the board's debug console, with
//! the indicator blinking a heartbeat that the button overrides to solid
//! on. The same binary builds for every supported board; only the `board-*`
//! feature changes.

#![no_std]
#![no_main]

use boardkit::board::{self, Board};
use embassy_executor::Spawner;
use embassy_futures::join::join;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::pipe::Pipe;
use embassy_time::{Duration, Ticker, Timer};
use embassy_usb::class::cdc_acm::{CdcAcmClass, Receiver, Sender, State};
use embassy_usb::{Builder, UsbDevice};
use static_cell::{ConstStaticCell, StaticCell};

// Import panic handler and defmt RTT for debugging
#[cfg(not(feature = "debug"))]
use panic_halt as _;
#[cfg(feature = "debug")]
use {defmt_rtt as _, panic_probe as _};

#[cfg(not(any(feature = "board-pico", feature = "board-feather-f405")))]
compile_error!("No board selected. Build with --features board-pico or board-feather-f405");

type Driver = board::active::UsbDriver;

/// Both supported boards run full-speed USB.
const MAX_PACKET_SIZE: u16 = 64;

/// Bytes queued from the USB host toward the board console.
static HOST_TO_CONSOLE: Pipe<CriticalSectionRawMutex, 64> = Pipe::new();
/// Bytes queued from the board console toward the USB host.
static CONSOLE_TO_HOST: Pipe<CriticalSectionRawMutex, 64> = Pipe::new();

/// Descriptor and control buffers for the USB device.
struct UsbBuffers {
    config_descriptor: [u8; 256],
    bos_descriptor: [u8; 256],
    control_buf: [u8; 64],
}

impl UsbBuffers {
    const fn new() -> Self {
        Self {
            config_descriptor: [0u8; 256],
            bos_descriptor: [0u8; 256],
            control_buf: [0u8; 64],
        }
    }
}

static USB_BUFFERS: ConstStaticCell<UsbBuffers> = ConstStaticCell::new(UsbBuffers::new());
static ACM_STATE: StaticCell<State<'static>> = StaticCell::new();

/// Main application entry point
///
/// Brings the board up, builds the USB device and spawns the worker tasks.
/// Never returns; the spawned tasks run indefinitely.
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    #[cfg(feature = "debug")]
    defmt::info!("Starting boardkit demo v{=str}", env!("CARGO_PKG_VERSION"));

    let config = board::active::DEFAULT_CONFIG;
    let bringup = board::active::init(&config);
    let driver = bringup
        .usb
        .expect("active configuration does not expose a USB device port");

    let mut usb_config = embassy_usb::Config::new(0xc0de, 0xcafe);
    usb_config.manufacturer = Some("boardkit");
    usb_config.product = Some(board::active::BOARD_NAME);
    usb_config.serial_number = Some("12345678");

    let buffers = USB_BUFFERS.take();
    let mut builder = Builder::new(
        driver,
        usb_config,
        &mut buffers.config_descriptor,
        &mut buffers.bos_descriptor,
        &mut [], // no msos descriptors
        &mut buffers.control_buf,
    );

    let acm = CdcAcmClass::new(&mut builder, ACM_STATE.init(State::new()), MAX_PACKET_SIZE);
    let device = builder.build();

    spawner.spawn(usb_task(device)).unwrap();
    spawner.spawn(cdc_task(acm)).unwrap();
    spawner.spawn(board_task(bringup.board)).unwrap();

    // Main task can do system-level monitoring
    loop {
        Timer::after(Duration::from_secs(60)).await;
        #[cfg(feature = "debug")]
        defmt::info!("System heartbeat - all tasks running");
    }
}

/// Run the USB device. This is the stack's own event loop; everything else
/// talks to it through the endpoints.
#[embassy_executor::task]
async fn usb_task(mut device: UsbDevice<'static, Driver>) -> ! {
    device.run().await
}

/// Shuttle bytes between the CDC ACM endpoints and the console pipes, both
/// directions at once.
#[embassy_executor::task]
async fn cdc_task(class: CdcAcmClass<'static, Driver>) {
    let (mut tx, mut rx) = class.split();
    join(host_to_board(&mut rx), board_to_host(&mut tx)).await;
}

async fn host_to_board(rx: &mut Receiver<'static, Driver>) {
    let mut buf = [0u8; MAX_PACKET_SIZE as usize];
    loop {
        rx.wait_connection().await;
        #[cfg(feature = "debug")]
        defmt::info!("Host opened the serial port");
        while let Ok(count) = rx.read_packet(&mut buf).await {
            let mut rest = &buf[..count];
            while !rest.is_empty() {
                let moved = HOST_TO_CONSOLE.write(rest).await;
                rest = &rest[moved..];
            }
        }
        #[cfg(feature = "debug")]
        defmt::info!("Host closed the serial port");
    }
}

async fn board_to_host(tx: &mut Sender<'static, Driver>) {
    let mut buf = [0u8; MAX_PACKET_SIZE as usize];
    loop {
        tx.wait_connection().await;
        loop {
            let count = CONSOLE_TO_HOST.read(&mut buf).await;
            if tx.write_packet(&buf[..count]).await.is_err() {
                break;
            }
        }
    }
}

/// Services everything the board owns: the heartbeat blink, the button
/// override and the console side of the serial bridge.
#[embassy_executor::task]
async fn board_task(mut board: board::Active) {
    // 10 ms cadence: fast enough to pump single bytes without drops at
    // 115200 baud, slow enough to stay out of the USB tasks' way.
    const SERVICE_PERIOD: Duration = Duration::from_millis(10);
    const BLINK_HALF_PERIOD_MS: u32 = 500;

    let mut ticker = Ticker::every(SERVICE_PERIOD);
    let mut scratch = [0u8; 64];
    let mut phase_ms: u32 = 0;
    let mut blink_lit = false;
    let mut shown = None;

    loop {
        phase_ms += SERVICE_PERIOD.as_millis() as u32;
        if phase_ms >= BLINK_HALF_PERIOD_MS {
            phase_ms = 0;
            blink_lit = !blink_lit;
        }

        // A held button pins the indicator on; otherwise it follows the
        // blink phase.
        let want = board.button_pressed() || blink_lit;
        if shown != Some(want) {
            board.set_indicator(want);
            shown = Some(want);
        }

        // Console to host. Drop what the pipe will not take; the bridge is
        // best effort end to end.
        let pending = board.console_read(&mut scratch);
        if pending > 0 {
            let _ = CONSOLE_TO_HOST.try_write(&scratch[..pending]);
        }

        // Host to console.
        if let Ok(count) = HOST_TO_CONSOLE.try_read(&mut scratch) {
            let mut rest = &scratch[..count];
            while !rest.is_empty() {
                let moved = board.console_write(rest);
                if moved == 0 {
                    break;
                }
                rest = &rest[moved..];
            }
        }

        ticker.next().await;
    }
}
