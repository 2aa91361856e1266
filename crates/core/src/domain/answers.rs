use serde::{Deserialize, Serialize};

/// Questionnaire answers as submitted by the frontend. All six fields are
/// required; a wire value that matches none of the known options lands on the
/// `Unspecified` variant and contributes nothing to the score, so a deliberate
/// non-answer and an unknown string are the same named state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireAnswers {
    pub age: AgeBand,
    pub income: IncomeBand,
    pub emergency_fund: EmergencyFund,
    pub investment_horizon: InvestmentHorizon,
    pub market_drop_response: MarketDropResponse,
    pub risk_tolerance: RiskTolerance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum AgeBand {
    #[serde(rename = "18-25")]
    From18To25,
    #[serde(rename = "26-35")]
    From26To35,
    #[serde(rename = "36-45")]
    From36To45,
    #[serde(rename = "46-55")]
    From46To55,
    #[serde(rename = "55+")]
    Over55,
    #[serde(rename = "unspecified")]
    Unspecified,
}

impl From<String> for AgeBand {
    fn from(s: String) -> Self {
        match s.as_str() {
            "18-25" => AgeBand::From18To25,
            "26-35" => AgeBand::From26To35,
            "36-45" => AgeBand::From36To45,
            "46-55" => AgeBand::From46To55,
            "55+" => AgeBand::Over55,
            _ => AgeBand::Unspecified,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum IncomeBand {
    #[serde(rename = "<5L")]
    Under5L,
    #[serde(rename = "5L-10L")]
    From5LTo10L,
    #[serde(rename = "10L-20L")]
    From10LTo20L,
    #[serde(rename = "20L-50L")]
    From20LTo50L,
    #[serde(rename = ">50L")]
    Over50L,
    #[serde(rename = "unspecified")]
    Unspecified,
}

impl From<String> for IncomeBand {
    fn from(s: String) -> Self {
        match s.as_str() {
            "<5L" => IncomeBand::Under5L,
            "5L-10L" => IncomeBand::From5LTo10L,
            "10L-20L" => IncomeBand::From10LTo20L,
            "20L-50L" => IncomeBand::From20LTo50L,
            ">50L" => IncomeBand::Over50L,
            _ => IncomeBand::Unspecified,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum EmergencyFund {
    #[serde(rename = "yes")]
    Yes,
    #[serde(rename = "no")]
    No,
    #[serde(rename = "unspecified")]
    Unspecified,
}

impl From<String> for EmergencyFund {
    fn from(s: String) -> Self {
        match s.as_str() {
            "yes" => EmergencyFund::Yes,
            "no" => EmergencyFund::No,
            _ => EmergencyFund::Unspecified,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum InvestmentHorizon {
    #[serde(rename = "1-3 years")]
    From1To3Years,
    #[serde(rename = "3-5 years")]
    From3To5Years,
    #[serde(rename = "5-10 years")]
    From5To10Years,
    #[serde(rename = "10+ years")]
    Over10Years,
    #[serde(rename = "unspecified")]
    Unspecified,
}

impl From<String> for InvestmentHorizon {
    fn from(s: String) -> Self {
        match s.as_str() {
            "1-3 years" => InvestmentHorizon::From1To3Years,
            "3-5 years" => InvestmentHorizon::From3To5Years,
            // The original frontend emitted both capitalizations.
            "5-10 years" | "5-10 Years" => InvestmentHorizon::From5To10Years,
            "10+ years" => InvestmentHorizon::Over10Years,
            _ => InvestmentHorizon::Unspecified,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum MarketDropResponse {
    #[serde(rename = "sell-all")]
    SellAll,
    #[serde(rename = "sell-some")]
    SellSome,
    #[serde(rename = "do-nothing")]
    DoNothing,
    #[serde(rename = "buy-more")]
    BuyMore,
    #[serde(rename = "unspecified")]
    Unspecified,
}

impl From<String> for MarketDropResponse {
    fn from(s: String) -> Self {
        match s.as_str() {
            "sell-all" => MarketDropResponse::SellAll,
            "sell-some" => MarketDropResponse::SellSome,
            "do-nothing" => MarketDropResponse::DoNothing,
            "buy-more" => MarketDropResponse::BuyMore,
            _ => MarketDropResponse::Unspecified,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum RiskTolerance {
    Conservative,
    Moderate,
    Aggressive,
    #[serde(rename = "unspecified")]
    Unspecified,
}

impl From<String> for RiskTolerance {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Conservative" => RiskTolerance::Conservative,
            "Moderate" => RiskTolerance::Moderate,
            "Aggressive" => RiskTolerance::Aggressive,
            _ => RiskTolerance::Unspecified,
        }
    }
}
