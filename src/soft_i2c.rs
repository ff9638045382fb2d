//! Bit-banged I2C bus master
//!
//! Drives SDA and SCL as open-drain lines: `set_high` releases a line to its pull-up, `set_low`
//! pulls it down, and reading returns the actual line level. Slaves may stretch the clock by
//! holding SCL low; the master waits for SCL to rise for at most [`Config::timeout_us`].

use core::fmt;

use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
    i2c::{self, ErrorKind, NoAcknowledgeSource, Operation, SevenBitAddress},
};

/// Bus timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Delay for each half of a bit period, in microseconds
    pub delay_us: u32,
    /// Longest a slave may stretch the clock, in microseconds
    pub timeout_us: u32,
}

impl Default for Config {
    /// 5µs half periods (just under 100kHz) and a one second stretch limit
    fn default() -> Self {
        Self {
            delay_us: 5,
            timeout_us: 1_000_000,
        }
    }
}

/// Software I2C errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    /// A GPIO line could not be read or driven
    Pin(E),
    /// SCL stayed low for longer than the configured timeout
    Timeout,
    /// The slave did not acknowledge
    NoAcknowledge(NoAcknowledgeSource),
}

impl<E: fmt::Debug> i2c::Error for Error<E> {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Pin(_) | Self::Timeout => ErrorKind::Other,
            Self::NoAcknowledge(source) => ErrorKind::NoAcknowledge(*source),
        }
    }
}

type BusResult<E, T = ()> = Result<T, Error<E>>;

/// I2C master on two GPIO lines
#[must_use]
pub struct SoftI2c<SDA, SCL, D> {
    sda: SDA,
    scl: SCL,
    delay: D,
    config: Config,
}

impl<SDA, SCL, D, E> SoftI2c<SDA, SCL, D>
where
    SDA: InputPin<Error = E> + OutputPin<Error = E>,
    SCL: InputPin<Error = E> + OutputPin<Error = E>,
    D: DelayNs,
{
    /// Take ownership of the lines and release both to idle
    ///
    /// # Errors
    /// Returns an error if either line cannot be driven
    pub fn new(mut sda: SDA, mut scl: SCL, delay: D, config: Config) -> Result<Self, E> {
        sda.set_high()?;
        scl.set_high()?;
        Ok(Self {
            sda,
            scl,
            delay,
            config,
        })
    }

    /// Give back the lines and delay provider
    pub fn release(self) -> (SDA, SCL, D) {
        (self.sda, self.scl, self.delay)
    }

    fn half_bit(&mut self) {
        self.delay.delay_us(self.config.delay_us);
    }

    fn sda_high(&mut self) -> BusResult<E> {
        self.sda.set_high().map_err(Error::Pin)
    }

    fn sda_low(&mut self) -> BusResult<E> {
        self.sda.set_low().map_err(Error::Pin)
    }

    fn scl_low(&mut self) -> BusResult<E> {
        self.scl.set_low().map_err(Error::Pin)
    }

    /// Release SCL and wait out any clock stretching
    fn scl_high(&mut self) -> BusResult<E> {
        self.scl.set_high().map_err(Error::Pin)?;

        let step = self.config.delay_us.max(1);
        let mut waited = 0u32;
        while self.scl.is_low().map_err(Error::Pin)? {
            if waited >= self.config.timeout_us {
                return Err(Error::Timeout);
            }
            self.delay.delay_us(step);
            waited = waited.saturating_add(step);
        }
        Ok(())
    }

    /// (Repeated) start condition: SDA falls while SCL is high
    fn start(&mut self) -> BusResult<E> {
        self.sda_high()?;
        self.scl_high()?;
        self.half_bit();
        self.sda_low()?;
        self.half_bit();
        self.scl_low()
    }

    /// Stop condition: SDA rises while SCL is high
    fn stop(&mut self) -> BusResult<E> {
        self.sda_low()?;
        self.half_bit();
        self.scl_high()?;
        self.half_bit();
        self.sda_high()?;
        self.half_bit();
        Ok(())
    }

    fn write_bit(&mut self, bit: bool) -> BusResult<E> {
        if bit {
            self.sda_high()?;
        } else {
            self.sda_low()?;
        }
        self.half_bit();
        self.scl_high()?;
        self.half_bit();
        self.scl_low()
    }

    fn read_bit(&mut self) -> BusResult<E, bool> {
        self.sda_high()?;
        self.half_bit();
        self.scl_high()?;
        let bit = self.sda.is_high().map_err(Error::Pin)?;
        self.half_bit();
        self.scl_low()?;
        Ok(bit)
    }

    /// Shift out a byte MSB first; returns whether the slave acknowledged
    fn write_byte(&mut self, byte: u8) -> BusResult<E, bool> {
        for i in (0..8).rev() {
            self.write_bit(byte & (1 << i) != 0)?;
        }
        Ok(!self.read_bit()?)
    }

    /// Shift in a byte MSB first, then acknowledge it or signal the end of the read
    fn read_byte(&mut self, ack: bool) -> BusResult<E, u8> {
        let mut byte = 0;
        for _ in 0..8 {
            byte = (byte << 1) | u8::from(self.read_bit()?);
        }
        self.write_bit(!ack)?;
        Ok(byte)
    }

    fn address(&mut self, address: SevenBitAddress, read: bool) -> BusResult<E> {
        self.start()?;
        if self.write_byte((address << 1) | u8::from(read))? {
            Ok(())
        } else {
            Err(Error::NoAcknowledge(NoAcknowledgeSource::Address))
        }
    }

    fn run(&mut self, address: SevenBitAddress, operations: &mut [Operation<'_>]) -> BusResult<E> {
        let mut reading = None;

        for i in 0..operations.len() {
            let read = matches!(operations[i], Operation::Read(_));
            // Adjacent operations of the same kind share one start and address
            if reading != Some(read) {
                self.address(address, read)?;
                reading = Some(read);
            }
            let more_reads = matches!(operations.get(i + 1), Some(Operation::Read(_)));

            match &mut operations[i] {
                Operation::Write(bytes) => {
                    for &byte in bytes.iter() {
                        if !self.write_byte(byte)? {
                            return Err(Error::NoAcknowledge(NoAcknowledgeSource::Data));
                        }
                    }
                }
                Operation::Read(buf) => {
                    let len = buf.len();
                    for (j, slot) in buf.iter_mut().enumerate() {
                        let last = j + 1 == len && !more_reads;
                        *slot = self.read_byte(!last)?;
                    }
                }
            }
        }

        Ok(())
    }
}

impl<SDA, SCL, D, E> i2c::ErrorType for SoftI2c<SDA, SCL, D>
where
    SDA: InputPin<Error = E> + OutputPin<Error = E>,
    SCL: InputPin<Error = E> + OutputPin<Error = E>,
    D: DelayNs,
    E: embedded_hal::digital::Error,
{
    type Error = Error<E>;
}

impl<SDA, SCL, D, E> i2c::I2c<SevenBitAddress> for SoftI2c<SDA, SCL, D>
where
    SDA: InputPin<Error = E> + OutputPin<Error = E>,
    SCL: InputPin<Error = E> + OutputPin<Error = E>,
    D: DelayNs,
    E: embedded_hal::digital::Error,
{
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if operations.is_empty() {
            return Ok(());
        }

        let result = self.run(address, operations);
        // The bus is always handed back with a stop, even after a failure
        let stopped = self.stop();
        result.and(stopped)
    }
}
