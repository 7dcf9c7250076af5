//! In-memory pin bank.
//!
//! Implements [`PinPort`] over shared state so a test (or a bench run
//! without hardware) can flip input levels while the door owns another
//! handle to the same bank.  Levels are logical, as the port expects.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::app::ports::PinPort;
use crate::error::PinError;
use crate::fsm::context::{InputLevels, InputLine, OutputLine};

#[derive(Debug, Default)]
struct Bank {
    inputs: InputLevels,
    power: bool,
    direction: bool,
    fail_reads: bool,
    writes: Vec<(OutputLine, bool)>,
}

/// Cloneable handle to one simulated pin bank.
#[derive(Debug, Clone, Default)]
pub struct SimulatedPins {
    bank: Arc<Mutex<Bank>>,
}

impl SimulatedPins {
    pub fn new() -> Self {
        Self::default()
    }

    fn bank(&self) -> MutexGuard<'_, Bank> {
        self.bank.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drive a simulated input line.
    pub fn set_input(&self, line: InputLine, level: bool) {
        self.bank().inputs.set(line, level);
    }

    pub fn input(&self, line: InputLine) -> bool {
        self.bank().inputs.get(line)
    }

    /// Current power line level.
    pub fn power(&self) -> bool {
        self.bank().power
    }

    /// Current direction relay level.
    pub fn direction(&self) -> bool {
        self.bank().direction
    }

    /// Make every subsequent read fail until cleared.
    pub fn fail_reads(&self, fail: bool) {
        self.bank().fail_reads = fail;
    }

    /// Every output write so far, oldest first.
    pub fn write_log(&self) -> Vec<(OutputLine, bool)> {
        self.bank().writes.clone()
    }
}

impl PinPort for SimulatedPins {
    fn read(&mut self, line: InputLine) -> Result<bool, PinError> {
        let bank = self.bank();
        if bank.fail_reads {
            return Err(PinError::ReadFailed(line));
        }
        Ok(bank.inputs.get(line))
    }

    fn write(&mut self, line: OutputLine, level: bool) -> Result<(), PinError> {
        let mut bank = self.bank();
        match line {
            OutputLine::Power => bank.power = level,
            OutputLine::Direction => bank.direction = level,
        }
        bank.writes.push((line, level));
        Ok(())
    }
}
