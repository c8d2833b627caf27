//! Millisecond uptime counter for images that run without a scheduler.
//!
//! A 1 kHz SysTick interrupt is the single writer; every other context only
//! loads the value, so no locking is needed. Reads may lag the interrupt by
//! one tick, which callers tolerate. Scheduler builds do not compile this
//! module; timekeeping belongs to embassy-time there.

use core::sync::atomic::{AtomicU32, Ordering};

static TICKS: AtomicU32 = AtomicU32::new(0);

/// Milliseconds since bring-up armed the tick. Wraps after about 49.7 days.
pub fn millis() -> u32 {
    TICKS.load(Ordering::Relaxed)
}

/// Single-writer increment, so a load/store pair is race free. Wrapping add
/// keeps the counter monotonic modulo 2^32.
fn tick() {
    let now = TICKS.load(Ordering::Relaxed);
    TICKS.store(now.wrapping_add(1), Ordering::Relaxed);
}

/// Arm SysTick to fire once per millisecond.
///
/// Called during board bring-up with the core clock frequency the board
/// settled on.
#[cfg(feature = "systick")]
pub fn start(syst: &mut cortex_m::peripheral::SYST, core_hz: u32) {
    use cortex_m::peripheral::syst::SystClkSource;

    syst.set_clock_source(SystClkSource::Core);
    syst.set_reload(core_hz / 1_000 - 1);
    syst.clear_current();
    syst.enable_counter();
    syst.enable_interrupt();
}

#[cfg(feature = "systick")]
#[cortex_m_rt::exception]
fn SysTick() {
    tick();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(value: u32) {
        TICKS.store(value, Ordering::Relaxed);
    }

    // One test owns the process-wide counter so nothing races it.
    #[test]
    fn counter_is_monotonic_and_wraps_at_the_32_bit_boundary() {
        set(0);
        let before = millis();
        tick();
        tick();
        tick();
        let after = millis();
        assert!(after >= before);
        assert_eq!(after - before, 3);

        set(u32::MAX);
        tick();
        assert_eq!(millis(), 0);
    }
}
