//! Simulated I2C bus.
//!
//! A [`SimulatedBus`] routes transactions to [`SimDevice`] models by slave
//! address. Devices can sit directly on the bus or behind a TCA9544A-style
//! multiplexer, in which case they only answer while their channel is
//! selected. Every handle type here is a cheap clone over shared state so a
//! test can keep one copy while the code under test drives another from its
//! own thread.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use anapad_errors::{BusError, BusResult};
use anapad_i2c::{BusHandle, BusProvider, I2cTransport, RegisterWidth, SlaveAddress, device_path};
use parking_lot::Mutex;

/// A chip model answering raw transactions.
pub trait SimDevice: Send {
    /// Handle a write message.
    fn write(&mut self, bytes: &[u8]) -> BusResult<()>;

    /// Handle a read message.
    fn read(&mut self, buf: &mut [u8]) -> BusResult<()>;
}

/// One recorded bus transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    /// Plain write
    Write {
        /// Target slave
        slave: SlaveAddress,
        /// Bytes written
        bytes: Vec<u8>,
    },
    /// Plain read
    Read {
        /// Target slave
        slave: SlaveAddress,
        /// Bytes requested
        len: usize,
    },
    /// Combined write then read
    WriteRead {
        /// Target slave
        slave: SlaveAddress,
        /// Bytes written
        bytes: Vec<u8>,
        /// Bytes requested
        len: usize,
    },
}

impl Transaction {
    /// Slave the transaction addressed.
    pub fn slave(&self) -> SlaveAddress {
        match self {
            Transaction::Write { slave, .. }
            | Transaction::Read { slave, .. }
            | Transaction::WriteRead { slave, .. } => *slave,
        }
    }
}

struct Multiplexer {
    address: SlaveAddress,
    control: u8,
    downstream: HashMap<(u8, SlaveAddress), Box<dyn SimDevice>>,
}

impl Multiplexer {
    fn selected(&self) -> Option<u8> {
        (self.control & 0b100 != 0).then_some(self.control & 0b11)
    }
}

#[derive(Default)]
struct BusState {
    devices: HashMap<SlaveAddress, Box<dyn SimDevice>>,
    mux: Option<Multiplexer>,
    log: Vec<Transaction>,
    attempts: usize,
    fail_next: usize,
    failing: bool,
    closes: usize,
}

impl BusState {
    fn inject(&mut self, slave: SlaveAddress) -> BusResult<()> {
        self.attempts += 1;
        if self.failing {
            return Err(BusError::transfer(slave, "injected failure"));
        }
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(BusError::transfer(slave, "injected failure"));
        }
        Ok(())
    }

    fn device(&mut self, slave: SlaveAddress) -> BusResult<&mut Box<dyn SimDevice>> {
        if self.devices.contains_key(&slave) {
            return self
                .devices
                .get_mut(&slave)
                .ok_or(BusError::NotAcknowledged { slave });
        }
        let mux = self
            .mux
            .as_mut()
            .ok_or(BusError::NotAcknowledged { slave })?;
        let channel = mux.selected().ok_or(BusError::NotAcknowledged { slave })?;
        mux.downstream
            .get_mut(&(channel, slave))
            .ok_or(BusError::NotAcknowledged { slave })
    }

    fn is_mux(&self, slave: SlaveAddress) -> bool {
        self.mux.as_ref().is_some_and(|m| m.address == slave)
    }

    fn write(&mut self, slave: SlaveAddress, bytes: &[u8]) -> BusResult<()> {
        self.inject(slave)?;
        self.log.push(Transaction::Write {
            slave,
            bytes: bytes.to_vec(),
        });
        if self.is_mux(slave) {
            if let (Some(mux), Some(&control)) = (self.mux.as_mut(), bytes.last()) {
                mux.control = control;
            }
            return Ok(());
        }
        self.device(slave)?.write(bytes)
    }

    fn read(&mut self, slave: SlaveAddress, buf: &mut [u8]) -> BusResult<()> {
        self.inject(slave)?;
        self.log.push(Transaction::Read {
            slave,
            len: buf.len(),
        });
        if self.is_mux(slave) {
            let control = self.mux.as_ref().map_or(0, |m| m.control);
            buf.fill(control);
            return Ok(());
        }
        self.device(slave)?.read(buf)
    }

    fn write_read(&mut self, slave: SlaveAddress, bytes: &[u8], buf: &mut [u8]) -> BusResult<()> {
        self.inject(slave)?;
        self.log.push(Transaction::WriteRead {
            slave,
            bytes: bytes.to_vec(),
            len: buf.len(),
        });
        let device = self.device(slave)?;
        device.write(bytes)?;
        device.read(buf)
    }
}

/// In-memory I2C bus.
#[derive(Clone, Default)]
pub struct SimulatedBus {
    state: Arc<Mutex<BusState>>,
}

impl SimulatedBus {
    /// Empty bus; every address NAKs until a device is added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a device directly to the bus.
    pub fn add_device(&self, slave: SlaveAddress, device: impl SimDevice + 'static) -> &Self {
        self.state.lock().devices.insert(slave, Box::new(device));
        self
    }

    /// Attach a four-channel multiplexer at `slave`.
    pub fn add_multiplexer(&self, slave: SlaveAddress) -> &Self {
        self.state.lock().mux = Some(Multiplexer {
            address: slave,
            control: 0,
            downstream: HashMap::new(),
        });
        self
    }

    /// Attach a device behind multiplexer `channel`.
    ///
    /// Does nothing if no multiplexer was added.
    pub fn add_downstream_device(
        &self,
        channel: u8,
        slave: SlaveAddress,
        device: impl SimDevice + 'static,
    ) -> &Self {
        if let Some(mux) = self.state.lock().mux.as_mut() {
            mux.downstream.insert((channel, slave), Box::new(device));
        }
        self
    }

    /// Channel the multiplexer currently connects, if any.
    pub fn selected_channel(&self) -> Option<u8> {
        self.state.lock().mux.as_ref().and_then(Multiplexer::selected)
    }

    /// Fail the next `count` transactions with a transfer error.
    pub fn fail_next(&self, count: usize) {
        self.state.lock().fail_next = count;
    }

    /// Fail every transaction until turned off.
    pub fn set_failing(&self, failing: bool) {
        self.state.lock().failing = failing;
    }

    /// Transactions attempted, including injected failures.
    pub fn transaction_count(&self) -> usize {
        self.state.lock().attempts
    }

    /// Transactions that reached a device or the multiplexer.
    pub fn transactions(&self) -> Vec<Transaction> {
        self.state.lock().log.clone()
    }

    /// Plain writes addressed to `slave`.
    pub fn writes_to(&self, slave: SlaveAddress) -> Vec<Vec<u8>> {
        self.state
            .lock()
            .log
            .iter()
            .filter_map(|t| match t {
                Transaction::Write { slave: s, bytes } if *s == slave => Some(bytes.clone()),
                _ => None,
            })
            .collect()
    }

    /// Forget the transaction log.
    pub fn clear_log(&self) {
        self.state.lock().log.clear();
    }

    /// How many transports opened on this bus were closed.
    pub fn close_count(&self) -> usize {
        self.state.lock().closes
    }

    /// A transport bound to this bus.
    pub fn transport(&self) -> Box<dyn I2cTransport> {
        Box::new(SimTransport {
            state: Arc::clone(&self.state),
            closed: false,
        })
    }

    /// A handle bound to this bus as bus `index`.
    pub fn handle(&self, index: u8) -> BusHandle {
        BusHandle::new(index, self.transport())
    }
}

struct SimTransport {
    state: Arc<Mutex<BusState>>,
    closed: bool,
}

impl SimTransport {
    fn check_open(&self, slave: SlaveAddress) -> BusResult<()> {
        if self.closed {
            return Err(BusError::transfer(slave, "transport closed"));
        }
        Ok(())
    }
}

impl I2cTransport for SimTransport {
    fn write(&mut self, slave: SlaveAddress, bytes: &[u8]) -> BusResult<()> {
        self.check_open(slave)?;
        self.state.lock().write(slave, bytes)
    }

    fn read(&mut self, slave: SlaveAddress, buf: &mut [u8]) -> BusResult<()> {
        self.check_open(slave)?;
        self.state.lock().read(slave, buf)
    }

    fn write_read(&mut self, slave: SlaveAddress, bytes: &[u8], buf: &mut [u8]) -> BusResult<()> {
        self.check_open(slave)?;
        self.state.lock().write_read(slave, bytes, buf)
    }

    fn close(&mut self) -> BusResult<()> {
        if !self.closed {
            self.closed = true;
            self.state.lock().closes += 1;
        }
        Ok(())
    }
}

/// Provides simulated buses by index.
#[derive(Clone, Default)]
pub struct SimulatedBusProvider {
    buses: Arc<Mutex<HashMap<u8, SimulatedBus>>>,
    opens: Arc<Mutex<usize>>,
}

impl SimulatedBusProvider {
    /// Provider with no buses; every open fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `bus` for index `index`.
    #[must_use]
    pub fn with_bus(self, index: u8, bus: SimulatedBus) -> Self {
        self.buses.lock().insert(index, bus);
        self
    }

    /// Remove a bus so later opens of `index` fail.
    pub fn remove_bus(&self, index: u8) {
        self.buses.lock().remove(&index);
    }

    /// Successful opens so far.
    pub fn open_count(&self) -> usize {
        *self.opens.lock()
    }
}

impl BusProvider for SimulatedBusProvider {
    fn open(&self, bus: u8) -> BusResult<BusHandle> {
        let sim = self
            .buses
            .lock()
            .get(&bus)
            .cloned()
            .ok_or_else(|| BusError::open(device_path(bus), "No such file or directory"))?;
        *self.opens.lock() += 1;
        Ok(sim.handle(bus))
    }
}

/// Auto-incrementing register storage shared by the chip models.
#[derive(Debug)]
struct Registers {
    width: RegisterWidth,
    values: HashMap<u16, u8>,
    pointer: u16,
}

impl Registers {
    fn new(width: RegisterWidth) -> Self {
        Self {
            width,
            values: HashMap::new(),
            pointer: 0,
        }
    }

    fn get(&self, reg: u16) -> u8 {
        self.values.get(&reg).copied().unwrap_or(0)
    }

    fn set(&mut self, reg: u16, value: u8) {
        self.values.insert(reg, value);
    }

    /// Apply a write message; returns the registers that received data.
    fn write(&mut self, bytes: &[u8]) -> Vec<u16> {
        let split = self.width.byte_len().min(bytes.len());
        let (address, data) = bytes.split_at(split);
        self.pointer = match address {
            [a] => u16::from(*a),
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            _ => self.pointer,
        };
        let mut touched = Vec::with_capacity(data.len());
        for &byte in data {
            let reg = self.pointer;
            self.set(reg, byte);
            touched.push(reg);
            self.pointer = self.pointer.wrapping_add(1);
        }
        touched
    }

    fn read(&mut self, buf: &mut [u8]) {
        for slot in buf.iter_mut() {
            *slot = self.get(self.pointer);
            self.pointer = self.pointer.wrapping_add(1);
        }
    }
}

/// Plain register file, for chips whose registers have no side effects.
#[derive(Debug, Clone)]
pub struct RegisterFile {
    inner: Arc<Mutex<Registers>>,
}

impl RegisterFile {
    /// Register file with `width` addressing, all registers zero.
    pub fn new(width: RegisterWidth) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Registers::new(width))),
        }
    }

    /// Current register value.
    pub fn get(&self, reg: u16) -> u8 {
        self.inner.lock().get(reg)
    }

    /// Overwrite a register.
    pub fn set(&self, reg: u16, value: u8) {
        self.inner.lock().set(reg, value);
    }
}

impl SimDevice for RegisterFile {
    fn write(&mut self, bytes: &[u8]) -> BusResult<()> {
        self.inner.lock().write(bytes);
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> BusResult<()> {
        self.inner.lock().read(buf);
        Ok(())
    }
}

const NAU_PU_CTRL: u16 = 0x00;
const NAU_CTRL2: u16 = 0x02;
const NAU_ADC_B2: u16 = 0x12;
const NAU_PUA: u8 = 1 << 2;
const NAU_PUR: u8 = 1 << 3;
const NAU_CS: u8 = 1 << 4;
const NAU_CR: u8 = 1 << 5;
const NAU_CALS: u8 = 1 << 2;
const NAU_CAL_ERR: u8 = 1 << 3;

#[derive(Debug)]
struct Nau7802State {
    regs: Registers,
    samples: VecDeque<i32>,
    idle_sample: i32,
    calibration_failures: usize,
    calibrations: usize,
    sync_pulses: usize,
    data_ready: bool,
}

/// NAU7802 24-bit ADC model.
///
/// Power-up completes instantly, calibration clears its start bit on the
/// same write, and conversions are always ready unless disabled. Samples are
/// served from a queue, falling back to a fixed idle value.
#[derive(Debug, Clone)]
pub struct Nau7802Sim {
    inner: Arc<Mutex<Nau7802State>>,
}

impl Default for Nau7802Sim {
    fn default() -> Self {
        Self::new()
    }
}

impl Nau7802Sim {
    /// Model reading zero.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Nau7802State {
                regs: Registers::new(RegisterWidth::Bits8),
                samples: VecDeque::new(),
                idle_sample: 0,
                calibration_failures: 0,
                calibrations: 0,
                sync_pulses: 0,
                data_ready: true,
            })),
        }
    }

    /// Queue raw signed samples, served one per result read.
    pub fn push_samples(&self, samples: impl IntoIterator<Item = i32>) {
        self.inner.lock().samples.extend(samples);
    }

    /// Value returned once the queue is empty.
    pub fn set_idle_sample(&self, sample: i32) {
        self.inner.lock().idle_sample = sample;
    }

    /// Make the next `count` calibrations report an error.
    pub fn fail_calibrations(&self, count: usize) {
        self.inner.lock().calibration_failures = count;
    }

    /// Control the conversion-ready bit.
    pub fn set_data_ready(&self, ready: bool) {
        self.inner.lock().data_ready = ready;
    }

    /// Calibrations started so far.
    pub fn calibrations(&self) -> usize {
        self.inner.lock().calibrations
    }

    /// Cycle-start pulses seen so far.
    pub fn sync_pulses(&self) -> usize {
        self.inner.lock().sync_pulses
    }

    /// Current register value.
    pub fn register(&self, reg: u16) -> u8 {
        self.inner.lock().regs.get(reg)
    }
}

impl SimDevice for Nau7802Sim {
    fn write(&mut self, bytes: &[u8]) -> BusResult<()> {
        let mut state = self.inner.lock();
        for reg in state.regs.write(bytes) {
            let value = state.regs.get(reg);
            match reg {
                NAU_PU_CTRL => {
                    if value & NAU_PUA != 0 {
                        state.regs.set(reg, value | NAU_PUR);
                    }
                    if value & NAU_CS != 0 {
                        state.sync_pulses += 1;
                    }
                }
                NAU_CTRL2 if value & NAU_CALS != 0 => {
                    state.calibrations += 1;
                    let failed = state.calibration_failures > 0;
                    if failed {
                        state.calibration_failures -= 1;
                    }
                    let mut updated = value & !NAU_CALS;
                    if failed {
                        updated |= NAU_CAL_ERR;
                    } else {
                        updated &= !NAU_CAL_ERR;
                    }
                    state.regs.set(reg, updated);
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> BusResult<()> {
        let mut state = self.inner.lock();
        match state.regs.pointer {
            NAU_PU_CTRL => {
                let value = state.regs.get(NAU_PU_CTRL);
                let value = if state.data_ready {
                    value | NAU_CR
                } else {
                    value & !NAU_CR
                };
                state.regs.set(NAU_PU_CTRL, value);
            }
            NAU_ADC_B2 => {
                let sample = match state.samples.pop_front() {
                    Some(sample) => sample,
                    None => state.idle_sample,
                };
                let [_, b2, b1, b0] = sample.to_be_bytes();
                state.regs.set(NAU_ADC_B2, b2);
                state.regs.set(NAU_ADC_B2 + 1, b1);
                state.regs.set(NAU_ADC_B2 + 2, b0);
            }
            _ => {}
        }
        state.regs.read(buf);
        Ok(())
    }
}

const GT_RESOLUTION: u16 = 0x8146;
const GT_STATUS: u16 = 0x814E;
const GT_POINTS: u16 = 0x814F;

#[derive(Debug)]
struct Gt9110State {
    regs: Registers,
    frames: VecDeque<Vec<[u8; 8]>>,
    triggers: usize,
}

/// GT9110 touch controller model.
///
/// Queued frames are latched into the status and point registers the next
/// time the status register is read while its ready bit is clear, which is
/// how the real chip behaves after the host acknowledges a frame by writing
/// zero to the status register.
#[derive(Debug, Clone)]
pub struct Gt9110Sim {
    inner: Arc<Mutex<Gt9110State>>,
}

impl Gt9110Sim {
    /// Model with the given resolution.
    pub fn new(resolution_x: u16, resolution_y: u16) -> Self {
        let mut regs = Registers::new(RegisterWidth::Bits16);
        let [x_lo, x_hi] = resolution_x.to_le_bytes();
        let [y_lo, y_hi] = resolution_y.to_le_bytes();
        regs.set(GT_RESOLUTION, x_lo);
        regs.set(GT_RESOLUTION + 1, x_hi);
        regs.set(GT_RESOLUTION + 2, y_lo);
        regs.set(GT_RESOLUTION + 3, y_hi);
        Self {
            inner: Arc::new(Mutex::new(Gt9110State {
                regs,
                frames: VecDeque::new(),
                triggers: 0,
            })),
        }
    }

    /// Queue a frame of raw 8-byte point records.
    pub fn push_frame(&self, records: Vec<[u8; 8]>) {
        self.inner.lock().frames.push_back(records);
    }

    /// Preload the configuration block starting at `0x8047`.
    pub fn set_configuration(&self, bytes: &[u8]) {
        let mut state = self.inner.lock();
        for (offset, &byte) in (0u16..).zip(bytes) {
            state.regs.set(0x8047 + offset, byte);
        }
    }

    /// `len` register bytes starting at `reg`.
    pub fn registers(&self, reg: u16, len: u16) -> Vec<u8> {
        let state = self.inner.lock();
        (0..len).map(|i| state.regs.get(reg + i)).collect()
    }

    /// Writes of zero to the status register seen so far.
    pub fn triggers(&self) -> usize {
        self.inner.lock().triggers
    }
}

impl SimDevice for Gt9110Sim {
    fn write(&mut self, bytes: &[u8]) -> BusResult<()> {
        let mut state = self.inner.lock();
        let touched = state.regs.write(bytes);
        if touched.first() == Some(&GT_STATUS) && state.regs.get(GT_STATUS) == 0 {
            state.triggers += 1;
        }
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> BusResult<()> {
        let mut state = self.inner.lock();
        if state.regs.pointer == GT_STATUS && state.regs.get(GT_STATUS) & 0x80 == 0 {
            if let Some(frame) = state.frames.pop_front() {
                let count = u8::try_from(frame.len()).unwrap_or(u8::MAX);
                state.regs.set(GT_STATUS, 0x80 | (count & 0x0F));
                for (slot, record) in (0u16..).zip(&frame) {
                    for (offset, &byte) in (0u16..).zip(record) {
                        state.regs.set(GT_POINTS + slot * 8 + offset, byte);
                    }
                }
            }
        }
        state.regs.read(buf);
        Ok(())
    }
}
