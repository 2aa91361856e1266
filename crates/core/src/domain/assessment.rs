use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskProfile {
    Conservative,
    Moderate,
    Aggressive,
}

impl fmt::Display for RiskProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskProfile::Conservative => "Conservative",
            RiskProfile::Moderate => "Moderate",
            RiskProfile::Aggressive => "Aggressive",
        };
        f.write_str(s)
    }
}

/// Target percentage split across the four asset classes. Only the three
/// fixed tuples below are ever produced; each sums to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub stocks: u8,
    pub bonds: u8,
    pub gold: u8,
    pub cash: u8,
}

impl Allocation {
    pub const CONSERVATIVE: Allocation = Allocation {
        stocks: 25,
        bonds: 45,
        gold: 20,
        cash: 10,
    };
    pub const MODERATE: Allocation = Allocation {
        stocks: 55,
        bonds: 30,
        gold: 10,
        cash: 5,
    };
    pub const AGGRESSIVE: Allocation = Allocation {
        stocks: 80,
        bonds: 10,
        gold: 5,
        cash: 5,
    };

    pub fn for_profile(profile: RiskProfile) -> Allocation {
        match profile {
            RiskProfile::Conservative => Allocation::CONSERVATIVE,
            RiskProfile::Moderate => Allocation::MODERATE,
            RiskProfile::Aggressive => Allocation::AGGRESSIVE,
        }
    }

    pub fn total(&self) -> u16 {
        self.stocks as u16 + self.bonds as u16 + self.gold as u16 + self.cash as u16
    }
}

/// Derived from a questionnaire, immutable once computed. Recomputed fresh
/// per request and never persisted by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub score: i32,
    pub risk_profile: RiskProfile,
    pub allocation: Allocation,
    pub description: String,
}
