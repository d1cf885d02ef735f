//! Timer interrupt attachment

use core::cell::Cell;
use core::sync::atomic::{AtomicBool, Ordering};

use critical_section::Mutex;

/// Interrupt service routine body
pub type Handler = fn();

/// The platform facility that routes the timer expiry interrupt to a handler.
pub trait TimerInterrupt {
    /// Install `handler` as the timer service routine, replacing any previous one.
    fn attach(&mut self, handler: Handler);

    /// Allow the interrupt to be delivered.
    fn unmask(&mut self);

    /// Block delivery of the interrupt.
    fn mask(&mut self);
}

/// Software-triggered stand-in for the timer interrupt.
///
/// [`fire`](Self::fire) plays the role of the hardware: it runs the attached
/// handler if one is attached and the line is unmasked.
#[derive(Debug)]
pub struct SoftInterrupt {
    handler: Mutex<Cell<Option<Handler>>>,
    unmasked: AtomicBool,
}

impl SoftInterrupt {
    pub const fn new() -> Self {
        Self {
            handler: Mutex::new(Cell::new(None)),
            unmasked: AtomicBool::new(false),
        }
    }

    /// Deliver one interrupt. Returns whether a handler ran.
    pub fn fire(&self) -> bool {
        if !self.unmasked.load(Ordering::Acquire) {
            return false;
        }
        match critical_section::with(|cs| self.handler.borrow(cs).get()) {
            Some(handler) => {
                handler();
                true
            }
            None => false,
        }
    }

    pub fn is_unmasked(&self) -> bool {
        self.unmasked.load(Ordering::Acquire)
    }

    pub fn is_attached(&self) -> bool {
        critical_section::with(|cs| self.handler.borrow(cs).get().is_some())
    }
}

impl Default for SoftInterrupt {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerInterrupt for SoftInterrupt {
    fn attach(&mut self, handler: Handler) {
        critical_section::with(|cs| self.handler.borrow(cs).set(Some(handler)));
    }

    fn unmask(&mut self) {
        self.unmasked.store(true, Ordering::Release);
    }

    fn mask(&mut self) {
        self.unmasked.store(false, Ordering::Release);
    }
}

#[cfg(target_arch = "xtensa")]
pub use esp8266::Frc1Interrupt;

#[cfg(target_arch = "xtensa")]
mod esp8266 {
    use core::cell::Cell;
    use core::ffi::c_void;

    use critical_section::Mutex;

    use super::{Handler, TimerInterrupt};

    /// Interrupt number of FRC1 (TIMER1) on the ESP8266.
    const ETS_FRC_TIMER1_INUM: i32 = 9;

    extern "C" {
        fn ets_isr_attach(inum: i32, handler: unsafe extern "C" fn(*mut c_void), arg: *mut c_void);
        fn ets_isr_mask(mask: u32);
        fn ets_isr_unmask(mask: u32);
    }

    static HANDLER: Mutex<Cell<Option<Handler>>> = Mutex::new(Cell::new(None));

    unsafe extern "C" fn trampoline(_arg: *mut c_void) {
        if let Some(handler) = critical_section::with(|cs| HANDLER.borrow(cs).get()) {
            handler();
        }
    }

    /// FRC1 interrupt line, driven through the ROM interrupt table.
    #[derive(Debug)]
    pub struct Frc1Interrupt {
        _private: (),
    }

    impl Frc1Interrupt {
        /// # Safety
        ///
        /// At most one instance may exist; it owns the FRC1 interrupt slot.
        pub const unsafe fn new() -> Self {
            Self { _private: () }
        }
    }

    impl TimerInterrupt for Frc1Interrupt {
        fn attach(&mut self, handler: Handler) {
            critical_section::with(|cs| HANDLER.borrow(cs).set(Some(handler)));
            // SAFETY: the ROM routine only records the pointer; the trampoline
            // lives for the whole program.
            unsafe { ets_isr_attach(ETS_FRC_TIMER1_INUM, trampoline, core::ptr::null_mut()) };
        }

        fn unmask(&mut self) {
            // SAFETY: ROM routine, sets one bit of INTENABLE.
            unsafe { ets_isr_unmask(1 << ETS_FRC_TIMER1_INUM) };
        }

        fn mask(&mut self) {
            // SAFETY: ROM routine, clears one bit of INTENABLE.
            unsafe { ets_isr_mask(1 << ETS_FRC_TIMER1_INUM) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::AtomicU32;

    static FIRED: AtomicU32 = AtomicU32::new(0);

    fn count_fire() {
        FIRED.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn masked_line_does_not_deliver() {
        let mut irq = SoftInterrupt::new();
        irq.attach(count_fire);
        assert!(!irq.fire());

        irq.unmask();
        assert!(irq.fire());
        irq.mask();
        assert!(!irq.fire());

        assert_eq!(FIRED.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unattached_line_reports_no_delivery() {
        let mut irq = SoftInterrupt::new();
        irq.unmask();
        assert!(!irq.is_attached());
        assert!(!irq.fire());
    }
}
