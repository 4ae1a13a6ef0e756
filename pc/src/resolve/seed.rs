//! Seed sources and the digit classes derived from a seed

/// Source of selection seeds
pub trait SeedProvider {
    fn next_seed(&mut self) -> i64;
}

/// Current wall-clock time in Unix milliseconds
#[derive(Debug, Default, Clone, Copy)]
pub struct ClockSeed;

impl SeedProvider for ClockSeed {
    fn next_seed(&mut self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Always returns the same seed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedSeed(pub i64);

impl SeedProvider for FixedSeed {
    fn next_seed(&mut self) -> i64 {
        self.0
    }
}

/// How many trailing digits of the seed a template refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigitClass {
    LastDigit,
    LastTwoDigits,
    LastThreeDigits,
}

/// Trailing digits of a seed. Always non-negative, even for negative seeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedDigits {
    pub last_digit: u64,
    pub last_two_digits: u64,
    pub last_three_digits: u64,
}

impl SeedDigits {
    pub fn from_seed(seed: i64) -> Self {
        Self {
            last_digit: seed.rem_euclid(10) as u64,
            last_two_digits: seed.rem_euclid(100) as u64,
            last_three_digits: seed.rem_euclid(1000) as u64,
        }
    }

    pub fn value(&self, class: DigitClass) -> u64 {
        match class {
            DigitClass::LastDigit => self.last_digit,
            DigitClass::LastTwoDigits => self.last_two_digits,
            DigitClass::LastThreeDigits => self.last_three_digits,
        }
    }

    pub fn is_even(&self) -> bool {
        self.last_digit % 2 == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digits() {
        let digits = SeedDigits::from_seed(1_700_000_123_457);
        assert_eq!(digits.last_digit, 7);
        assert_eq!(digits.last_two_digits, 57);
        assert_eq!(digits.last_three_digits, 457);
        assert!(!digits.is_even());
        assert_eq!(digits.value(DigitClass::LastTwoDigits), 57);
    }

    #[test]
    fn test_negative_seed_digits_non_negative() {
        let digits = SeedDigits::from_seed(-3);
        assert_eq!(digits.last_digit, 7);
        assert_eq!(digits.last_two_digits, 97);
        assert_eq!(digits.last_three_digits, 997);
    }

    #[test]
    fn test_fixed_seed() {
        let mut seeds = FixedSeed(42);
        assert_eq!(seeds.next_seed(), 42);
        assert_eq!(seeds.next_seed(), 42);
    }

    #[test]
    fn test_clock_seed_is_positive() {
        assert!(ClockSeed.next_seed() > 0);
    }
}
