use crate::domain::answers::{
    AgeBand, EmergencyFund, IncomeBand, InvestmentHorizon, MarketDropResponse,
    QuestionnaireAnswers, RiskTolerance,
};
use crate::domain::assessment::{Allocation, RiskAssessment, RiskProfile};

const BASE_SCORE: i32 = 50;

const CONSERVATIVE_MAX_SCORE: i32 = 45;
const AGGRESSIVE_MIN_SCORE: i32 = 70;

/// Score a questionnaire and derive profile, allocation and narrative.
/// Pure and total: every answer contributes a fixed integer adjustment and
/// `Unspecified` contributes zero, so there is no failure path.
pub fn assess(answers: &QuestionnaireAnswers) -> RiskAssessment {
    let score = BASE_SCORE
        + age_adjustment(answers.age)
        + horizon_adjustment(answers.investment_horizon)
        + emergency_fund_adjustment(answers.emergency_fund)
        + income_adjustment(answers.income)
        + drawdown_adjustment(answers.market_drop_response)
        + tolerance_adjustment(answers.risk_tolerance);

    let risk_profile = profile_for_score(score);

    RiskAssessment {
        score,
        risk_profile,
        allocation: Allocation::for_profile(risk_profile),
        description: describe(risk_profile, answers),
    }
}

pub fn profile_for_score(score: i32) -> RiskProfile {
    if score <= CONSERVATIVE_MAX_SCORE {
        RiskProfile::Conservative
    } else if score >= AGGRESSIVE_MIN_SCORE {
        RiskProfile::Aggressive
    } else {
        RiskProfile::Moderate
    }
}

fn age_adjustment(age: AgeBand) -> i32 {
    match age {
        AgeBand::From18To25 => 10,
        AgeBand::From26To35 => 8,
        AgeBand::From36To45 => 4,
        AgeBand::From46To55 => 1,
        AgeBand::Over55 => -4,
        AgeBand::Unspecified => 0,
    }
}

fn horizon_adjustment(horizon: InvestmentHorizon) -> i32 {
    match horizon {
        InvestmentHorizon::Over10Years => 15,
        InvestmentHorizon::From5To10Years => 10,
        InvestmentHorizon::From3To5Years => 5,
        InvestmentHorizon::From1To3Years => -5,
        InvestmentHorizon::Unspecified => 0,
    }
}

fn emergency_fund_adjustment(fund: EmergencyFund) -> i32 {
    match fund {
        EmergencyFund::Yes => 5,
        EmergencyFund::No => -10,
        EmergencyFund::Unspecified => 0,
    }
}

fn income_adjustment(income: IncomeBand) -> i32 {
    match income {
        IncomeBand::Under5L => -3,
        IncomeBand::From5LTo10L => 0,
        IncomeBand::From10LTo20L => 3,
        IncomeBand::From20LTo50L => 6,
        IncomeBand::Over50L => 8,
        IncomeBand::Unspecified => 0,
    }
}

fn drawdown_adjustment(response: MarketDropResponse) -> i32 {
    match response {
        MarketDropResponse::SellAll => -20,
        MarketDropResponse::SellSome => -10,
        MarketDropResponse::DoNothing => 5,
        MarketDropResponse::BuyMore => 15,
        MarketDropResponse::Unspecified => 0,
    }
}

fn tolerance_adjustment(tolerance: RiskTolerance) -> i32 {
    match tolerance {
        RiskTolerance::Conservative => -8,
        RiskTolerance::Moderate => 0,
        RiskTolerance::Aggressive => 10,
        RiskTolerance::Unspecified => 0,
    }
}

// Template selection only; no free-form generation.
fn describe(profile: RiskProfile, answers: &QuestionnaireAnswers) -> String {
    let profile_sentence = match profile {
        RiskProfile::Conservative => {
            "You appear to be a conservative investor who prioritises capital preservation \
             and lower volatility over aggressive growth."
        }
        RiskProfile::Aggressive => {
            "You appear to be an aggressive investor who is comfortable with meaningful \
             short-term volatility in pursuit of higher long-term returns."
        }
        RiskProfile::Moderate => {
            "You appear to be a moderate investor who seeks a balance between growth and \
             capital protection."
        }
    };

    let horizon_text = match answers.investment_horizon {
        InvestmentHorizon::From1To3Years => "a relatively short investment horizon",
        InvestmentHorizon::From3To5Years => "a medium-term investment horizon",
        InvestmentHorizon::From5To10Years => "a long-term investment horizon",
        InvestmentHorizon::Over10Years => "a very long-term investment horizon",
        InvestmentHorizon::Unspecified => "your stated investment horizon",
    };

    let emergency_text = match answers.emergency_fund {
        EmergencyFund::Yes => {
            "You already have an emergency fund, which increases your capacity to take risk."
        }
        _ => {
            "You are still building your emergency fund, so your plan should leave some \
             room for safety."
        }
    };

    format!("{profile_sentence} Your answers suggest {horizon_text}. {emergency_text}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn neutral_answers() -> QuestionnaireAnswers {
        QuestionnaireAnswers {
            age: AgeBand::Unspecified,
            income: IncomeBand::Unspecified,
            emergency_fund: EmergencyFund::Unspecified,
            investment_horizon: InvestmentHorizon::Unspecified,
            market_drop_response: MarketDropResponse::Unspecified,
            risk_tolerance: RiskTolerance::Unspecified,
        }
    }

    #[test]
    fn all_unspecified_scores_base_50_moderate() {
        let a = assess(&neutral_answers());
        assert_eq!(a.score, 50);
        assert_eq!(a.risk_profile, RiskProfile::Moderate);
        assert_eq!(a.allocation, Allocation::MODERATE);
    }

    #[test]
    fn allocation_always_sums_to_100() {
        for alloc in [
            Allocation::CONSERVATIVE,
            Allocation::MODERATE,
            Allocation::AGGRESSIVE,
        ] {
            assert_eq!(alloc.total(), 100);
        }
    }

    #[test]
    fn tier_boundaries_are_inclusive() {
        // 50 - 5 = 45, the conservative ceiling.
        let mut a = neutral_answers();
        a.investment_horizon = InvestmentHorizon::From1To3Years;
        let r = assess(&a);
        assert_eq!(r.score, 45);
        assert_eq!(r.risk_profile, RiskProfile::Conservative);

        // 50 - 4 = 46, just above it.
        let mut a = neutral_answers();
        a.age = AgeBand::Over55;
        let r = assess(&a);
        assert_eq!(r.score, 46);
        assert_eq!(r.risk_profile, RiskProfile::Moderate);

        // 50 + 15 + 1 + 3 = 69, just below the aggressive floor.
        let mut a = neutral_answers();
        a.investment_horizon = InvestmentHorizon::Over10Years;
        a.age = AgeBand::From46To55;
        a.income = IncomeBand::From10LTo20L;
        let r = assess(&a);
        assert_eq!(r.score, 69);
        assert_eq!(r.risk_profile, RiskProfile::Moderate);

        // 50 + 15 + 5 = 70, the aggressive floor.
        let mut a = neutral_answers();
        a.investment_horizon = InvestmentHorizon::Over10Years;
        a.emergency_fund = EmergencyFund::Yes;
        let r = assess(&a);
        assert_eq!(r.score, 70);
        assert_eq!(r.risk_profile, RiskProfile::Aggressive);
        assert_eq!(r.allocation, Allocation::AGGRESSIVE);
    }

    #[test]
    fn panic_seller_profile_is_conservative() {
        let a = QuestionnaireAnswers {
            age: AgeBand::Over55,
            income: IncomeBand::Under5L,
            emergency_fund: EmergencyFund::No,
            investment_horizon: InvestmentHorizon::From1To3Years,
            market_drop_response: MarketDropResponse::SellAll,
            risk_tolerance: RiskTolerance::Conservative,
        };
        let r = assess(&a);
        // 50 - 4 - 3 - 10 - 5 - 20 - 8 = 0
        assert_eq!(r.score, 0);
        assert_eq!(r.risk_profile, RiskProfile::Conservative);
        assert_eq!(r.allocation, Allocation::CONSERVATIVE);
    }

    #[test]
    fn young_buyer_profile_is_aggressive() {
        let a = QuestionnaireAnswers {
            age: AgeBand::From18To25,
            income: IncomeBand::Over50L,
            emergency_fund: EmergencyFund::Yes,
            investment_horizon: InvestmentHorizon::Over10Years,
            market_drop_response: MarketDropResponse::BuyMore,
            risk_tolerance: RiskTolerance::Aggressive,
        };
        let r = assess(&a);
        // 50 + 10 + 8 + 5 + 15 + 15 + 10 = 113
        assert_eq!(r.score, 113);
        assert_eq!(r.risk_profile, RiskProfile::Aggressive);
    }

    #[test]
    fn assess_is_deterministic() {
        let a = QuestionnaireAnswers {
            age: AgeBand::From36To45,
            income: IncomeBand::From20LTo50L,
            emergency_fund: EmergencyFund::Yes,
            investment_horizon: InvestmentHorizon::From5To10Years,
            market_drop_response: MarketDropResponse::DoNothing,
            risk_tolerance: RiskTolerance::Moderate,
        };
        let r1 = assess(&a);
        let r2 = assess(&a);
        assert_eq!(r1.score, r2.score);
        assert_eq!(r1.risk_profile, r2.risk_profile);
        assert_eq!(r1.allocation, r2.allocation);
        assert_eq!(r1.description, r2.description);
    }

    #[test]
    fn description_reflects_horizon_and_fund() {
        let mut a = neutral_answers();
        a.investment_horizon = InvestmentHorizon::Over10Years;
        a.emergency_fund = EmergencyFund::Yes;
        let r = assess(&a);
        assert!(r.description.contains("very long-term investment horizon"));
        assert!(r.description.contains("already have an emergency fund"));
    }
}
