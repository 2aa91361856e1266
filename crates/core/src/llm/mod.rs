pub mod anthropic;
pub mod error;
pub mod json;

use crate::domain::answers::QuestionnaireAnswers;
use crate::domain::assessment::RiskAssessment;
use crate::domain::contract::StockPickSet;

/// Everything the model needs to pick stocks for one user: the computed
/// assessment plus the answers it came from.
#[derive(Debug, Clone)]
pub struct PicksRequest {
    pub assessment: RiskAssessment,
    pub answers: QuestionnaireAnswers,
}

impl PicksRequest {
    pub fn user_context_json(&self) -> serde_json::Value {
        serde_json::json!({
            "riskProfile": self.assessment.risk_profile,
            "allocation": self.assessment.allocation,
            "age": self.answers.age,
            "income": self.answers.income,
            "investmentHorizon": self.answers.investment_horizon,
            "emergencyFund": self.answers.emergency_fund,
            "behaviourOnDrawdown": self.answers.market_drop_response,
        })
    }
}

#[derive(Debug, Clone)]
pub enum Provider {
    Anthropic,
}

#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    fn provider(&self) -> Provider;

    /// Output is validated through `domain::contract` before it is returned;
    /// raw model text never leaves this layer unchecked.
    async fn generate_stock_picks(&self, request: &PicksRequest)
        -> anyhow::Result<StockPickSet>;
}
