/// Highest servo angle in degrees.
pub const MAX_ANGLE: u16 = 180;

/// Triangle-wave servo sweep between 0 and [`MAX_ANGLE`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Oscillator {
    angle: u16,
    increasing: bool,
    step: u16,
}

impl Oscillator {
    /// Starts at 0°, sweeping upwards by `step` degrees per tick.
    pub fn new(step: u16) -> Self {
        Self {
            angle: 0,
            increasing: true,
            step,
        }
    }

    /// Advances one step and returns the new angle.
    ///
    /// The angle is clamped at either end and the direction flips there.
    pub fn advance(&mut self) -> u16 {
        if self.increasing {
            self.angle = self.angle.saturating_add(self.step);
            if self.angle >= MAX_ANGLE {
                self.angle = MAX_ANGLE;
                self.increasing = false;
            }
        } else {
            self.angle = self.angle.saturating_sub(self.step);
            if self.angle == 0 {
                self.increasing = true;
            }
        }
        self.angle
    }

    pub fn angle(&self) -> u16 {
        self.angle
    }

    pub fn is_increasing(&self) -> bool {
        self.increasing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_sweep() {
        let mut osc = Oscillator::new(2);
        let up: Vec<u16> = (0..90).map(|_| osc.advance()).collect();
        assert_eq!(up, (1..=90).map(|i| i * 2).collect::<Vec<u16>>());
        assert!(!osc.is_increasing());

        let down: Vec<u16> = (0..90).map(|_| osc.advance()).collect();
        assert_eq!(down, (0..90).rev().map(|i| i * 2).collect::<Vec<u16>>());
        assert!(osc.is_increasing());
        assert_eq!(osc.advance(), 2);
    }

    #[test]
    fn test_uneven_step_clamps() {
        let mut osc = Oscillator::new(7);
        let mut peaks = 0;
        let mut troughs = 0;
        for _ in 0..200 {
            match osc.advance() {
                MAX_ANGLE => peaks += 1,
                0 => troughs += 1,
                angle => assert!(angle < MAX_ANGLE),
            }
        }
        assert!(peaks >= 3);
        assert!(troughs >= 3);
    }
}
