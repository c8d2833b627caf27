//! Board abstraction consumed by the USB stack and applications.
//!
//! One adapter per physical board implements [`Board`]. The active adapter
//! is chosen at build time with a `board-*` feature, so application code
//! never names a chip directly. Adapters are pure: they hold no application
//! logic, only the mapping from this contract onto their HAL.
//!
//! Bring-up is the adapter's `init`, which is also the only way to obtain a
//! value implementing [`Board`]. Nothing can reach the contract before the
//! clocks, pins and peripherals are in a known-good state.

#[cfg(feature = "board-pico")]
pub mod pico;
#[cfg(feature = "board-pico")]
pub use pico as active;
#[cfg(feature = "board-pico")]
pub type Active = pico::Pico;

#[cfg(feature = "board-feather-f405")]
pub mod feather_f405;
#[cfg(feature = "board-feather-f405")]
pub use feather_f405 as active;
#[cfg(feature = "board-feather-f405")]
pub type Active = feather_f405::FeatherF405;

#[cfg(all(feature = "board-pico", feature = "board-feather-f405"))]
compile_error!("Select exactly one board feature");

/// Operations every board provides, however little of it is wired.
///
/// Capabilities a board lacks degrade to neutral values instead of errors:
/// a missing button reads as not pressed, a missing console moves zero
/// bytes. Nothing in this contract fails after bring-up.
pub trait Board {
    /// Drive the visual indicator to an on/off state. The hardware reflects
    /// the new state before the call returns, and the state is exactly the
    /// last write.
    fn set_indicator(&mut self, on: bool);

    /// Sample the user button. Raw poll: no debounce, no edge detection.
    /// Boards without a button report `false`.
    fn button_pressed(&mut self) -> bool;

    /// Copy bytes already pending on the debug console into `buf`, up to
    /// its length, and return how many were moved. Never blocks. Boards
    /// without a console return 0.
    fn console_read(&mut self, buf: &mut [u8]) -> usize;

    /// Queue bytes to the debug console and return how many were accepted.
    /// Never blocks. Boards without a console return 0.
    fn console_write(&mut self, buf: &[u8]) -> usize;
}

#[cfg(test)]
mod tests {
    use super::Board;
    use std::collections::VecDeque;

    /// Software double used to pin down the contract the adapters follow.
    /// The console is a loopback: writes land in a queue that reads drain.
    struct FakeBoard {
        indicator: bool,
        button: bool,
        console: Option<VecDeque<u8>>,
    }

    impl FakeBoard {
        fn with_console() -> Self {
            Self {
                indicator: false,
                button: false,
                console: Some(VecDeque::new()),
            }
        }

        fn bare() -> Self {
            Self {
                indicator: false,
                button: false,
                console: None,
            }
        }
    }

    impl Board for FakeBoard {
        fn set_indicator(&mut self, on: bool) {
            self.indicator = on;
        }

        fn button_pressed(&mut self) -> bool {
            self.button
        }

        fn console_read(&mut self, buf: &mut [u8]) -> usize {
            let Some(fifo) = self.console.as_mut() else {
                return 0;
            };
            let mut moved = 0;
            while moved < buf.len() {
                match fifo.pop_front() {
                    Some(byte) => {
                        buf[moved] = byte;
                        moved += 1;
                    }
                    None => break,
                }
            }
            moved
        }

        fn console_write(&mut self, buf: &[u8]) -> usize {
            let Some(fifo) = self.console.as_mut() else {
                return 0;
            };
            fifo.extend(buf.iter().copied());
            buf.len()
        }
    }

    #[test]
    fn indicator_state_is_only_the_last_write() {
        let mut toggled = FakeBoard::with_console();
        toggled.set_indicator(true);
        toggled.set_indicator(false);

        let mut direct = FakeBoard::with_console();
        direct.set_indicator(false);

        assert_eq!(toggled.indicator, direct.indicator);
    }

    #[test]
    fn button_poll_is_stable_while_the_input_is_stable() {
        let mut board = FakeBoard::with_console();
        let first = board.button_pressed();
        for _ in 0..100 {
            assert_eq!(board.button_pressed(), first);
        }

        board.button = true;
        let held = board.button_pressed();
        for _ in 0..100 {
            assert_eq!(board.button_pressed(), held);
        }
    }

    #[test]
    fn console_round_trips_bytes_in_order() {
        let mut board = FakeBoard::with_console();
        let sent = b"console loopback";
        assert_eq!(board.console_write(sent), sent.len());

        let mut received = [0u8; 32];
        let moved = board.console_read(&mut received);
        assert_eq!(&received[..moved], sent);
    }

    #[test]
    fn short_reads_drain_the_console_in_chunks() {
        let mut board = FakeBoard::with_console();
        assert_eq!(board.console_write(b"abcdefgh"), 8);

        let mut chunk = [0u8; 3];
        assert_eq!(board.console_read(&mut chunk), 3);
        assert_eq!(&chunk, b"abc");
        assert_eq!(board.console_read(&mut chunk), 3);
        assert_eq!(&chunk, b"def");
        assert_eq!(board.console_read(&mut chunk), 2);
        assert_eq!(&chunk[..2], b"gh");
        assert_eq!(board.console_read(&mut chunk), 0);
    }

    #[test]
    fn missing_console_moves_no_bytes() {
        let mut board = FakeBoard::bare();

        assert_eq!(board.console_write(&[]), 0);
        assert_eq!(board.console_write(&[0xAA; 512]), 0);

        let mut empty: [u8; 0] = [];
        assert_eq!(board.console_read(&mut empty), 0);
        let mut large = [0u8; 512];
        assert_eq!(board.console_read(&mut large), 0);
    }
}
