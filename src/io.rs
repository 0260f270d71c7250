//! JOY bus registers shared between the CPU bus and the active link driver.
//!
//! The console owns these registers; drivers only observe and mutate them as
//! side effects of intercepted writes and command dispatch.

pub const REG_JOYCNT: u32 = 0x0400_0140;
pub const REG_JOY_RECV_LO: u32 = 0x0400_0150;
pub const REG_JOY_RECV_HI: u32 = 0x0400_0152;
pub const REG_JOY_TRANS_LO: u32 = 0x0400_0154;
pub const REG_JOY_TRANS_HI: u32 = 0x0400_0156;
pub const REG_JOYSTAT: u32 = 0x0400_0158;

/// JOYCNT: device reset occurred. Write-one-to-clear from the CPU side.
pub const JOYCNT_RESET: u16 = 1 << 0;
/// JOYCNT: receive completed. Write-one-to-clear from the CPU side.
pub const JOYCNT_RECV: u16 = 1 << 1;
/// JOYCNT: transmit completed. Write-one-to-clear from the CPU side.
pub const JOYCNT_TRANS: u16 = 1 << 2;
/// JOYCNT: raise the serial interrupt when a transaction completes.
pub const JOYCNT_IRQ_ENABLE: u16 = 1 << 6;

/// JOYSTAT: receive data available.
pub const JOYSTAT_RECV: u16 = 1 << 1;
/// JOYSTAT: transmit data ready. Set on a transmit-register write, cleared
/// when the host collects the data with a TRANS command.
pub const JOYSTAT_TRANS: u16 = 1 << 3;
/// JOYSTAT: general-purpose flags, the only CPU-writable bits.
pub const JOYSTAT_GP_MASK: u16 = 0x0030;

/// Serial I/O bit in the IF register.
pub const IRQ_SERIAL: u16 = 1 << 7;

/// The JOY bus slice of the console's I/O register file.
#[derive(Debug, Default)]
pub struct JoyRegisters {
    pub joycnt: u16,
    pub joystat: u16,
    pub recv_lo: u16,
    pub recv_hi: u16,
    pub trans_lo: u16,
    pub trans_hi: u16,
}

impl JoyRegisters {
    pub fn load(&self, address: u32) -> u16 {
        match address {
            REG_JOYCNT => self.joycnt,
            REG_JOYSTAT => self.joystat,
            REG_JOY_RECV_LO => self.recv_lo,
            REG_JOY_RECV_HI => self.recv_hi,
            REG_JOY_TRANS_LO => self.trans_lo,
            REG_JOY_TRANS_HI => self.trans_hi,
            _ => 0,
        }
    }

    pub fn store(&mut self, address: u32, value: u16) {
        match address {
            REG_JOYCNT => self.joycnt = value,
            REG_JOYSTAT => self.joystat = value,
            REG_JOY_RECV_LO => self.recv_lo = value,
            REG_JOY_RECV_HI => self.recv_hi = value,
            REG_JOY_TRANS_LO => self.trans_lo = value,
            REG_JOY_TRANS_HI => self.trans_hi = value,
            _ => {}
        }
    }
}
