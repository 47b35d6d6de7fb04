pub const SPEED_OPTIONS: [(&str, f64); 6] = [
    ("0.5x", 0.5),
    ("0.75x", 0.75),
    ("1.0x", 1.0),
    ("1.25x", 1.25),
    ("1.5x", 1.5),
    ("2.0x", 2.0),
];

pub const DEFAULT_SPEED_INDEX: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedSelector {
    index: usize,
}

impl Default for SpeedSelector {
    fn default() -> Self {
        Self { index: DEFAULT_SPEED_INDEX }
    }
}

impl SpeedSelector {
    pub fn with_index(index: usize) -> Self {
        if index < SPEED_OPTIONS.len() {
            Self { index }
        } else {
            Self::default()
        }
    }

    #[allow(dead_code)]
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn value(&self) -> f64 {
        SPEED_OPTIONS[self.index].1
    }

    pub fn label(&self) -> &'static str {
        SPEED_OPTIONS[self.index].0
    }

    /// Next option, wrapping from the fastest back to the slowest.
    pub fn cycle(&mut self) -> f64 {
        self.index = (self.index + 1) % SPEED_OPTIONS.len();
        self.value()
    }

    pub fn select_value(&mut self, speed: f64) -> bool {
        match SPEED_OPTIONS.iter().position(|(_, v)| (v - speed).abs() < f64::EPSILON) {
            Some(index) => {
                self.index = index;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_normal_speed() {
        let speed = SpeedSelector::default();
        assert_eq!(speed.value(), 1.0);
        assert_eq!(speed.label(), "1.0x");
    }

    #[test]
    fn test_cycle_wraps_around() {
        let mut speed = SpeedSelector::default();
        assert_eq!(speed.cycle(), 1.25);
        assert_eq!(speed.cycle(), 1.5);
        assert_eq!(speed.cycle(), 2.0);
        assert_eq!(speed.cycle(), 0.5);
        assert_eq!(speed.label(), "0.5x");
    }

    #[test]
    fn test_select_value() {
        let mut speed = SpeedSelector::default();
        assert!(speed.select_value(0.75));
        assert_eq!(speed.index(), 1);
        assert!(!speed.select_value(3.0));
        assert_eq!(speed.index(), 1);
    }

    #[test]
    fn test_out_of_range_index_falls_back() {
        assert_eq!(SpeedSelector::with_index(42), SpeedSelector::default());
        assert_eq!(SpeedSelector::with_index(5).value(), 2.0);
    }
}
