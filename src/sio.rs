//! Driver seam for the link port.
//!
//! The console holds one active [`SioDriver`] at a time and invokes it
//! uniformly; JOY bus is one interchangeable mode among several. The [`Sio`]
//! front end owns the JOY bus registers and routes CPU register writes
//! through the active driver's interceptor before committing them.

use crate::io::JoyRegisters;

/// One interchangeable link-port mode.
///
/// All hooks run on the emulation thread; implementations never block and
/// hold no locks.
pub trait SioDriver {
    /// Called when the driver becomes the active link handler.
    fn on_load(&mut self) -> bool {
        true
    }

    /// Intercepts a CPU write to a link register before it is committed.
    /// Returns the value that should actually be stored.
    fn write_register(&mut self, regs: &mut JoyRegisters, address: u32, value: u16) -> u16 {
        let _ = (regs, address);
        value
    }

    /// Advance the driver by `cycles` elapsed cycles. Returns the number of
    /// cycles until it must be invoked again.
    fn process_events(&mut self, regs: &mut JoyRegisters, if_reg: &mut u16, cycles: i32) -> i32;

    /// Release driver resources. Safe to call at any time, repeatedly.
    fn teardown(&mut self) {}
}

/// A stub driver used when no link peer is attached. Register writes pass
/// through untouched and no work is ever due.
#[derive(Default)]
pub struct NullSioDriver;

impl SioDriver for NullSioDriver {
    fn process_events(&mut self, _regs: &mut JoyRegisters, _if_reg: &mut u16, _cycles: i32) -> i32 {
        i32::MAX
    }
}

/// MMIO front end for the link port registers.
pub struct Sio {
    pub regs: JoyRegisters,
    driver: Box<dyn SioDriver>,
}

impl Default for Sio {
    fn default() -> Self {
        Self::new()
    }
}

impl Sio {
    pub fn new() -> Self {
        Self {
            regs: JoyRegisters::default(),
            driver: Box::new(NullSioDriver),
        }
    }

    /// Swap in a new active driver, tearing down the previous one.
    /// Returns whether the new driver loaded successfully.
    pub fn set_driver(&mut self, mut driver: Box<dyn SioDriver>) -> bool {
        self.driver.teardown();
        let loaded = driver.on_load();
        self.driver = driver;
        loaded
    }

    pub fn driver_mut(&mut self) -> &mut dyn SioDriver {
        self.driver.as_mut()
    }

    pub fn read(&self, address: u32) -> u16 {
        self.regs.load(address)
    }

    /// CPU write path: the active driver's interceptor decides what is
    /// actually stored.
    pub fn write(&mut self, address: u32, value: u16) {
        let value = self.driver.write_register(&mut self.regs, address, value);
        self.regs.store(address, value);
    }

    pub fn process_events(&mut self, if_reg: &mut u16, cycles: i32) -> i32 {
        self.driver.process_events(&mut self.regs, if_reg, cycles)
    }
}
