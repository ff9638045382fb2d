//! Simulated ds3231 hardware for integration tests
#![expect(dead_code, reason = "each test binary uses part of the simulation")]

use alloc::rc::Rc;
use core::{cell::RefCell, convert::Infallible};

use embedded_hal::{
    delay::DelayNs,
    digital::{self, InputPin, OutputPin},
    i2c::{self, ErrorKind, NoAcknowledgeSource, Operation},
};

pub const ADDR: u8 = 0x68;
const REGISTERS: usize = 0x13;

/// ds3231 register file behind an [`i2c::I2c`] interface
///
/// The first byte of each write sets the register pointer; further bytes are stored with
/// auto-increment. Reads continue from the pointer.
pub struct FakeDs3231 {
    pub registers: [u8; REGISTERS],
    pointer: usize,
    /// Number of bytes delivered before the read is cut short with a NACK
    pub short_read: Option<usize>,
    /// Every `(register, value)` stored, in order
    pub writes: Vec<(u8, u8)>,
}

impl FakeDs3231 {
    pub fn new(time: [u8; 7]) -> Self {
        let mut registers = [0; REGISTERS];
        registers[..7].copy_from_slice(&time);
        Self {
            registers,
            pointer: 0,
            short_read: None,
            writes: Vec::new(),
        }
    }

    pub fn time(&self) -> [u8; 7] {
        let mut time = [0; 7];
        time.copy_from_slice(&self.registers[..7]);
        time
    }

    fn advance(&mut self) {
        self.pointer = (self.pointer + 1) % REGISTERS;
    }
}

impl i2c::ErrorType for FakeDs3231 {
    type Error = ErrorKind;
}

impl i2c::I2c for FakeDs3231 {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if address != ADDR {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }

        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    if let Some((&pointer, data)) = bytes.split_first() {
                        self.pointer = usize::from(pointer) % REGISTERS;
                        for &value in data {
                            self.registers[self.pointer] = value;
                            self.writes.push((self.pointer as u8, value));
                            self.advance();
                        }
                    }
                }
                Operation::Read(buf) => {
                    for (i, slot) in buf.iter_mut().enumerate() {
                        if self.short_read.is_some_and(|limit| i >= limit) {
                            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data));
                        }
                        *slot = self.registers[self.pointer];
                        self.advance();
                    }
                }
            }
        }
        Ok(())
    }
}

/// Slave side of the simulated bus: a register file answering at one address
#[derive(Debug, Clone, Copy)]
enum Phase {
    /// Waiting for a start condition
    Idle,
    /// Shifting in a byte from the master
    Receive { bits: u8, byte: u8 },
    /// Holding SDA low for the acknowledge clock
    Ack { then_transmit: bool },
    /// Shifting out a byte; `bits` have been put on the line so far
    Transmit { bits: u8, byte: u8 },
    /// Master's acknowledge clock after a transmitted byte
    MasterAck { ack: bool },
}

pub struct BusState {
    master_sda: bool,
    master_scl: bool,
    slave_sda_low: bool,
    /// Holds SCL low forever, as a hung slave would
    pub scl_stuck: bool,

    address: u8,
    phase: Phase,
    addressed: bool,
    pointer_set: bool,
    pub registers: [u8; REGISTERS],
    pointer: usize,
    /// Every byte clocked in by the slave, including address bytes
    pub received: Vec<u8>,
    pub starts: usize,
    pub stops: usize,
}

impl BusState {
    fn sda(&self) -> bool {
        self.master_sda && !self.slave_sda_low
    }

    fn scl(&self) -> bool {
        self.master_scl && !self.scl_stuck
    }

    fn load(&mut self) -> u8 {
        let byte = self.registers[self.pointer];
        self.pointer = (self.pointer + 1) % REGISTERS;
        byte
    }

    fn drive_bit(&mut self, byte: u8, bits: u8) {
        self.slave_sda_low = byte & (0x80 >> bits) == 0;
    }

    fn on_byte(&mut self, byte: u8) -> Option<bool> {
        self.received.push(byte);
        if !self.addressed {
            if byte >> 1 != self.address {
                return None;
            }
            self.addressed = true;
            self.pointer_set = false;
            return Some(byte & 1 == 1);
        }
        if self.pointer_set {
            self.registers[self.pointer] = byte;
            self.pointer = (self.pointer + 1) % REGISTERS;
        } else {
            self.pointer = usize::from(byte) % REGISTERS;
            self.pointer_set = true;
        }
        Some(false)
    }

    /// React to a line change caused by the master
    fn update(&mut self, old_scl: bool, old_sda: bool) {
        let scl = self.scl();
        let sda = self.sda();

        if old_scl && scl && old_sda != sda {
            if sda {
                self.stops += 1;
                self.phase = Phase::Idle;
            } else {
                self.starts += 1;
                self.addressed = false;
                self.phase = Phase::Receive { bits: 0, byte: 0 };
            }
            self.slave_sda_low = false;
            return;
        }

        if !old_scl && scl {
            match &mut self.phase {
                Phase::Receive { bits, byte } => {
                    *byte = (*byte << 1) | u8::from(sda);
                    *bits += 1;
                }
                Phase::MasterAck { ack } => *ack = !sda,
                _ => {}
            }
        } else if old_scl && !scl {
            match self.phase {
                Phase::Receive { bits: 8, byte } => match self.on_byte(byte) {
                    Some(then_transmit) => {
                        self.slave_sda_low = true;
                        self.phase = Phase::Ack { then_transmit };
                    }
                    None => self.phase = Phase::Idle,
                },
                Phase::Ack { then_transmit } => {
                    self.slave_sda_low = false;
                    if then_transmit {
                        let byte = self.load();
                        self.drive_bit(byte, 0);
                        self.phase = Phase::Transmit { bits: 1, byte };
                    } else {
                        self.phase = Phase::Receive { bits: 0, byte: 0 };
                    }
                }
                Phase::Transmit { bits: 8, .. } => {
                    self.slave_sda_low = false;
                    self.phase = Phase::MasterAck { ack: false };
                }
                Phase::Transmit { bits, byte } => {
                    self.drive_bit(byte, bits);
                    self.phase = Phase::Transmit {
                        bits: bits + 1,
                        byte,
                    };
                }
                Phase::MasterAck { ack: true } => {
                    let byte = self.load();
                    self.drive_bit(byte, 0);
                    self.phase = Phase::Transmit { bits: 1, byte };
                }
                Phase::MasterAck { ack: false } => self.phase = Phase::Idle,
                _ => {}
            }
        }
    }
}

/// Two open-drain lines with pull-ups and one slave attached
#[derive(Clone)]
pub struct SimBus(pub Rc<RefCell<BusState>>);

impl SimBus {
    pub fn new(address: u8, time: [u8; 7]) -> Self {
        let mut registers = [0; REGISTERS];
        registers[..7].copy_from_slice(&time);
        Self(Rc::new(RefCell::new(BusState {
            master_sda: true,
            master_scl: true,
            slave_sda_low: false,
            scl_stuck: false,
            address,
            phase: Phase::Idle,
            addressed: false,
            pointer_set: false,
            registers,
            pointer: 0,
            received: Vec::new(),
            starts: 0,
            stops: 0,
        })))
    }

    pub fn sda(&self) -> SimPin {
        SimPin {
            bus: self.clone(),
            line: Line::Sda,
        }
    }

    pub fn scl(&self) -> SimPin {
        SimPin {
            bus: self.clone(),
            line: Line::Scl,
        }
    }
}

#[derive(Clone, Copy)]
enum Line {
    Sda,
    Scl,
}

/// Master's handle on one line
pub struct SimPin {
    bus: SimBus,
    line: Line,
}

impl SimPin {
    fn drive(&mut self, high: bool) {
        let mut state = self.bus.0.borrow_mut();
        let (old_scl, old_sda) = (state.scl(), state.sda());
        match self.line {
            Line::Sda => state.master_sda = high,
            Line::Scl => state.master_scl = high,
        }
        state.update(old_scl, old_sda);
    }

    fn level(&self) -> bool {
        let state = self.bus.0.borrow();
        match self.line {
            Line::Sda => state.sda(),
            Line::Scl => state.scl(),
        }
    }
}

impl digital::ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(true);
        Ok(())
    }
}

impl InputPin for SimPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.level())
    }
}

/// Delay that only counts
#[derive(Clone, Default)]
pub struct SimDelay(pub Rc<RefCell<u64>>);

impl SimDelay {
    pub fn elapsed_us(&self) -> u64 {
        *self.0.borrow() / 1000
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        *self.0.borrow_mut() += u64::from(ns);
    }
}
