//! Hardware adapter: bridges embedded-hal pins to the [`PinPort`] trait.
//!
//! Owns the four input pins and two output pins and is the only place
//! that knows about electrical polarity.  Any pin type implementing the
//! embedded-hal 1.0 digital traits can be plugged in; the daemon uses
//! [`SysfsPin`](crate::drivers::sysfs_gpio::SysfsPin).

use embedded_hal::digital::{InputPin, OutputPin, PinState};

use crate::app::ports::PinPort;
use crate::error::PinError;
use crate::fsm::context::{InputLine, OutputLine};

/// Concrete adapter over six embedded-hal pins.
pub struct HalPins<I, O> {
    upper: I,
    lower: I,
    up: I,
    down: I,
    power: O,
    direction: O,
    power_active_low: bool,
}

/// Input pins in [`InputLine`] order.
pub struct InputBank<I> {
    pub upper: I,
    pub lower: I,
    pub up: I,
    pub down: I,
}

impl<I, O> HalPins<I, O>
where
    I: InputPin,
    O: OutputPin,
{
    pub fn new(inputs: InputBank<I>, power: O, direction: O, power_active_low: bool) -> Self {
        Self {
            upper: inputs.upper,
            lower: inputs.lower,
            up: inputs.up,
            down: inputs.down,
            power,
            direction,
            power_active_low,
        }
    }

    fn input_mut(&mut self, line: InputLine) -> &mut I {
        match line {
            InputLine::Upper => &mut self.upper,
            InputLine::Lower => &mut self.lower,
            InputLine::Up => &mut self.up,
            InputLine::Down => &mut self.down,
        }
    }
}

impl<I, O> PinPort for HalPins<I, O>
where
    I: InputPin + Send,
    O: OutputPin + Send,
{
    fn read(&mut self, line: InputLine) -> Result<bool, PinError> {
        self.input_mut(line)
            .is_high()
            .map_err(|_| PinError::ReadFailed(line))
    }

    fn write(&mut self, line: OutputLine, level: bool) -> Result<(), PinError> {
        let (pin, electrical) = match line {
            OutputLine::Power => (&mut self.power, level != self.power_active_low),
            OutputLine::Direction => (&mut self.direction, level),
        };
        pin.set_state(PinState::from(electrical))
            .map_err(|_| PinError::WriteFailed(line))
    }
}
