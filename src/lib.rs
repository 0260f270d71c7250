//! Game Boy Advance JOY bus link port, bridged over TCP.
//!
//! This crate contains the serial I/O plumbing for the GBA's JOY bus mode:
//! the shared hardware registers, the driver seam the console steps once per
//! scheduler tick, and a driver that exchanges JOY bus transactions with a
//! remote host over a pair of TCP connections. The CPU/memory bus, interrupt
//! controller and frontend live elsewhere and drive this crate via the
//! [`sio`] facade.

/// JOY bus register file and interrupt bits shared with the CPU bus.
pub mod io;

/// JOY bus driver bridged to a remote host over TCP.
pub mod joybus;

/// Driver seam and MMIO front end for the link port.
pub mod sio;
