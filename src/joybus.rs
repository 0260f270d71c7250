//! JOY bus link port bridged to a remote host over TCP.
//!
//! The remote peer acts as the JOY bus host. It sends single-byte commands on
//! the data channel and periodic 4-byte big-endian cycle grants on the clock
//! channel; each grant bounds how far this side may advance before yielding,
//! keeping the emulated port in step with the host's clock. Both channels are
//! non-blocking: an empty socket never stalls the emulation loop.

use std::io::{self, Read, Write};
use std::net::{IpAddr, SocketAddr, TcpStream};

use log::{debug, info, trace, warn};

use crate::io::{
    IRQ_SERIAL, JOYCNT_IRQ_ENABLE, JOYCNT_RECV, JOYCNT_RESET, JOYCNT_TRANS, JOYSTAT_GP_MASK,
    JOYSTAT_RECV, JOYSTAT_TRANS, JoyRegisters, REG_JOY_TRANS_HI, REG_JOY_TRANS_LO, REG_JOYCNT,
    REG_JOYSTAT,
};
use crate::sio::SioDriver;

/// Emulated line rate of the JOY bus, in CPU cycles per bit.
pub const CYCLES_PER_BIT: i32 = 75;

/// Cycle cost charged when a processing step finds no command waiting.
const CLOCK_GRAIN: i32 = 8 * CYCLES_PER_BIT;

pub const DEFAULT_DATA_PORT: u16 = 54970;
pub const DEFAULT_CLOCK_PORT: u16 = 49420;

const CMD_RESET: u8 = 0xFF;
const CMD_POLL: u8 = 0x00;
const CMD_TRANS: u8 = 0x14;
const CMD_RECV: u8 = 0x15;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Command {
    Reset,
    Poll,
    Trans,
    Recv,
    Unknown,
}

impl Command {
    fn decode(byte: u8) -> Self {
        match byte {
            CMD_RESET => Self::Reset,
            CMD_POLL => Self::Poll,
            CMD_TRANS => Self::Trans,
            CMD_RECV => Self::Recv,
            _ => Self::Unknown,
        }
    }
}

/// JOY bus driver backed by a data/clock TCP channel pair.
#[derive(Default)]
pub struct JoyBusLink {
    data: Option<TcpStream>,
    clock: Option<TcpStream>,
    next_event: i32,
    clock_slice: i32,
}

impl JoyBusLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open both channels to the host. A port of zero selects the default.
    ///
    /// Any previously open channels are closed first. On failure both
    /// channels end up absent; there is no partial-success state.
    pub fn connect(&mut self, address: IpAddr, data_port: u16, clock_port: u16) -> io::Result<()> {
        self.teardown();

        let data_port = if data_port == 0 {
            DEFAULT_DATA_PORT
        } else {
            data_port
        };
        let clock_port = if clock_port == 0 {
            DEFAULT_CLOCK_PORT
        } else {
            clock_port
        };

        match open_channels(address, data_port, clock_port) {
            Ok((data, clock)) => {
                info!("joybus: connected to {address} (data {data_port}, clock {clock_port})");
                self.data = Some(data);
                self.clock = Some(clock);
                Ok(())
            }
            Err(e) => {
                warn!("joybus: connection to {address} failed: {e}");
                Err(e)
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.data.is_some() && self.clock.is_some()
    }

    /// Consume one pending clock grant, if a whole one has arrived.
    fn poll_clock_grant(&mut self) {
        let Some(clock) = self.clock.as_mut() else {
            return;
        };
        let mut grant = [0u8; 4];
        // Peek first so a partially arrived grant stays on the socket until
        // all four bytes are in.
        match clock.peek(&mut grant) {
            Ok(4) => {}
            Ok(_) => return,
            Err(e)
                if e.kind() == io::ErrorKind::WouldBlock
                    || e.kind() == io::ErrorKind::Interrupted =>
            {
                return;
            }
            Err(e) => {
                warn!("joybus: clock channel error: {e}");
                return;
            }
        }
        if clock.read_exact(&mut grant).is_ok() {
            let slice = i32::from_be_bytes(grant);
            trace!("joybus: clock grant of {slice} cycles");
            // The grant is peer-controlled input; don't let it wrap.
            self.clock_slice = self.clock_slice.saturating_add(slice);
        }
    }

    /// Non-blocking read of one command byte from the data channel.
    fn recv_command(&mut self) -> Option<u8> {
        let data = self.data.as_mut()?;
        let mut byte = [0u8; 1];
        loop {
            match data.read(&mut byte) {
                Ok(1) => return Some(byte[0]),
                // Peer hangup reads as an idle line.
                Ok(_) => return None,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return None,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    warn!("joybus: data channel error: {e}");
                    return None;
                }
            }
        }
    }

    /// Best-effort read of a RECV payload. Missing bytes read as zero.
    fn recv_payload(&mut self) -> [u8; 4] {
        let mut payload = [0u8; 4];
        if let Some(data) = self.data.as_mut() {
            let _ = data.read(&mut payload);
        }
        payload
    }

    /// Best-effort send on the data channel. Short or failed sends are not
    /// retried; the transaction proceeds regardless.
    fn send(&mut self, payload: &[u8]) {
        if let Some(data) = self.data.as_mut()
            && let Err(e) = data.write(payload)
            && e.kind() != io::ErrorKind::WouldBlock
        {
            warn!("joybus: dropped {}-byte response: {e}", payload.len());
        }
    }

    /// Response shared by Reset and Poll: the JOY bus device type ID followed
    /// by the current JOYSTAT value.
    fn send_status_frame(&mut self, regs: &JoyRegisters) {
        self.send(&[0x00, 0x04, regs.joystat as u8]);
    }

    /// Dispatch one host command. Returns the transaction's cycle cost:
    /// `(8 + 1 + extra_bits) * CYCLES_PER_BIT` for the command byte, its
    /// framing bit and the command-specific bits on the line.
    fn process_command(&mut self, byte: u8, regs: &mut JoyRegisters, if_reg: &mut u16) -> i32 {
        let command = Command::decode(byte);
        trace!("joybus: host command {command:?} (0x{byte:02X})");

        let mut bits_on_line = 8 + 1;
        match command {
            Command::Reset => {
                regs.joycnt |= JOYCNT_RESET;
                raise_serial_irq(regs, if_reg);
                self.send_status_frame(regs);
                bits_on_line += 24 + 1;
            }
            Command::Poll => {
                self.send_status_frame(regs);
                bits_on_line += 24 + 1;
            }
            Command::Recv => {
                regs.joycnt |= JOYCNT_RECV;
                regs.joystat |= JOYSTAT_RECV;
                let payload = self.recv_payload();
                regs.recv_lo = u16::from_le_bytes([payload[0], payload[1]]);
                regs.recv_hi = u16::from_le_bytes([payload[2], payload[3]]);
                self.send(&[regs.joystat as u8]);
                raise_serial_irq(regs, if_reg);
                bits_on_line += 40 + 1;
            }
            Command::Trans => {
                regs.joycnt |= JOYCNT_TRANS;
                regs.joystat &= !JOYSTAT_TRANS;
                let [lo0, lo1] = regs.trans_lo.to_le_bytes();
                let [hi0, hi1] = regs.trans_hi.to_le_bytes();
                self.send(&[lo0, lo1, hi0, hi1, regs.joystat as u8]);
                raise_serial_irq(regs, if_reg);
                bits_on_line += 40 + 1;
            }
            // Absorbed with the base framing cost; no response goes out.
            Command::Unknown => {}
        }
        bits_on_line * CYCLES_PER_BIT
    }
}

impl SioDriver for JoyBusLink {
    fn on_load(&mut self) -> bool {
        self.next_event = 0;
        self.clock_slice = 0;
        true
    }

    fn write_register(&mut self, regs: &mut JoyRegisters, address: u32, value: u16) -> u16 {
        match address {
            // Bit 6 is taken as written; bits 0-2 are write-one-to-clear.
            REG_JOYCNT => {
                (value & JOYCNT_IRQ_ENABLE)
                    | (regs.joycnt & !(value & 0x0007) & !JOYCNT_IRQ_ENABLE)
            }
            // Only the general-purpose bits are CPU-writable.
            REG_JOYSTAT => (value & JOYSTAT_GP_MASK) | (regs.joystat & !JOYSTAT_GP_MASK),
            REG_JOY_TRANS_LO | REG_JOY_TRANS_HI => {
                regs.joystat |= JOYSTAT_TRANS;
                value
            }
            _ => value,
        }
    }

    fn process_events(&mut self, regs: &mut JoyRegisters, if_reg: &mut u16, cycles: i32) -> i32 {
        self.next_event -= cycles;
        self.clock_slice -= cycles;
        if self.next_event <= 0 {
            if self.clock_slice <= 0 {
                self.poll_clock_grant();
            }

            if let Some(command) = self.recv_command() {
                self.next_event += self.process_command(command, regs, if_reg);
            } else {
                self.next_event += CLOCK_GRAIN;
            }

            // Never claim more cycles than the host has budgeted.
            if self.next_event > self.clock_slice {
                self.next_event = self.clock_slice;
            }
        }
        self.next_event
    }

    fn teardown(&mut self) {
        let was_connected = self.data.take().is_some() | self.clock.take().is_some();
        if was_connected {
            debug!("joybus: link torn down");
        }
    }
}

fn open_channels(
    address: IpAddr,
    data_port: u16,
    clock_port: u16,
) -> io::Result<(TcpStream, TcpStream)> {
    let data = TcpStream::connect(SocketAddr::new(address, data_port))?;
    // If the clock channel fails here, dropping `data` closes it.
    let clock = TcpStream::connect(SocketAddr::new(address, clock_port))?;
    data.set_nonblocking(true)?;
    clock.set_nonblocking(true)?;
    // Responses are tiny; don't let Nagle sit on them.
    data.set_nodelay(true)?;
    Ok((data, clock))
}

fn raise_serial_irq(regs: &JoyRegisters, if_reg: &mut u16) {
    if regs.joycnt & JOYCNT_IRQ_ENABLE != 0 {
        *if_reg |= IRQ_SERIAL;
    }
}
