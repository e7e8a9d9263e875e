use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// A score sub-factor weight constrained to [0.0, 10.0]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Display, From, Serialize, Deserialize)]
pub struct ScoreFactor(f32);

impl ScoreFactor {
    const MIN: f32 = 0.0;
    const MAX: f32 = 10.0;

    pub fn new(value: f32) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn get(self) -> f32 {
        self.0
    }
}

impl Default for ScoreFactor {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// A minimum accepted placement score constrained to [0.0, 100.0]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Display, From, Serialize, Deserialize)]
pub struct MinScore(f32);

impl MinScore {
    const MIN: f32 = 0.0;
    const MAX: f32 = 100.0;

    pub fn new(value: f32) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn get(self) -> f32 {
        self.0
    }
}

impl Default for MinScore {
    fn default() -> Self {
        Self::new(0.01)
    }
}

/// A bonus-grid multiplier constrained to [0.1, 10.0]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Display, From, Serialize, Deserialize)]
pub struct BonusMultiplier(f32);

impl BonusMultiplier {
    const MIN: f32 = 0.1;
    const MAX: f32 = 10.0;

    pub fn new(value: f32) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn get(self) -> f32 {
        self.0
    }
}

impl Default for BonusMultiplier {
    fn default() -> Self {
        Self::new(1.5)
    }
}

/// A multiple of a district radius constrained to [1.0, 5.0]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Display, From, Serialize, Deserialize)]
pub struct RadiusFactor(f32);

impl RadiusFactor {
    const MIN: f32 = 1.0;
    const MAX: f32 = 5.0;

    pub fn new(value: f32) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn get(self) -> f32 {
        self.0
    }
}

impl Default for RadiusFactor {
    fn default() -> Self {
        Self::new(1.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_factor_clamping() {
        assert_eq!(ScoreFactor::new(-1.0).get(), 0.0);
        assert_eq!(ScoreFactor::new(3.0).get(), 3.0);
        assert_eq!(ScoreFactor::new(25.0).get(), 10.0);
    }

    #[test]
    fn test_bonus_multiplier_clamping() {
        assert_eq!(BonusMultiplier::new(0.0).get(), 0.1);
        assert_eq!(BonusMultiplier::new(2.0).get(), 2.0);
        assert_eq!(BonusMultiplier::new(50.0).get(), 10.0);
    }

    #[test]
    fn test_display() {
        let factor = RadiusFactor::new(2.5);
        assert_eq!(format!("{factor}"), "2.5");
    }

    #[test]
    fn test_defaults() {
        assert_eq!(ScoreFactor::default().get(), 1.0);
        assert_eq!(MinScore::default().get(), 0.01);
        assert_eq!(BonusMultiplier::default().get(), 1.5);
        assert_eq!(RadiusFactor::default().get(), 1.5);
    }
}
