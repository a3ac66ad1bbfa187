//! Scripted backend for exercising the orchestrator without a network.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use valuecheck_llm::{LlmBackend, LlmError, LlmInvocation, LlmResult};
use valuecheck_utils::types::StageId;

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unscripted {
    Canned,
    Fail,
}

#[derive(Debug, Default)]
struct Script {
    queued: HashMap<String, VecDeque<Reply>>,
    calls: Vec<LlmInvocation>,
}

/// [`LlmBackend`] that answers from per-stage queues.
///
/// Queued replies are consumed in order. Once a stage's queue is empty the
/// backend answers with [`canned_response`] (or fails, for
/// [`ScriptedBackend::failing`]). Every invocation is recorded.
#[derive(Debug, Clone)]
pub struct ScriptedBackend {
    script: Arc<Mutex<Script>>,
    unscripted: Unscripted,
    delay: Option<Duration>,
    has_credentials: bool,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedBackend {
    /// Backend that answers every stage with a valid canned response.
    #[must_use]
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(Script::default())),
            unscripted: Unscripted::Canned,
            delay: None,
            has_credentials: true,
        }
    }

    /// Backend whose every unscripted call fails with a transport error.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            unscripted: Unscripted::Fail,
            ..Self::new()
        }
    }

    /// Backend that reports missing credentials.
    #[must_use]
    pub fn without_credentials() -> Self {
        Self {
            has_credentials: false,
            ..Self::new()
        }
    }

    #[must_use]
    pub fn reply(self, stage: StageId, text: impl Into<String>) -> Self {
        self.push(stage.as_str(), Reply::Text(text.into()));
        self
    }

    #[must_use]
    pub fn fail(self, stage: StageId, message: impl Into<String>) -> Self {
        self.push(stage.as_str(), Reply::Fail(message.into()));
        self
    }

    /// Sleep before answering each call.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every invocation received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<LlmInvocation> {
        self.lock().calls.clone()
    }

    /// `(stage_id, segment_id)` of every invocation, in order.
    #[must_use]
    pub fn call_sequence(&self) -> Vec<(String, Option<String>)> {
        self.lock()
            .calls
            .iter()
            .map(|call| (call.stage_id.clone(), call.segment_id.clone()))
            .collect()
    }

    fn push(&self, stage_id: &str, reply: Reply) {
        self.lock()
            .queued
            .entry(stage_id.to_string())
            .or_default()
            .push_back(reply);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_reply(&self, inv: &LlmInvocation) -> Reply {
        let mut script = self.lock();
        script.calls.push(inv.clone());

        if let Some(reply) = script
            .queued
            .get_mut(&inv.stage_id)
            .and_then(VecDeque::pop_front)
        {
            return reply;
        }

        match (self.unscripted, inv.stage_id.parse::<StageId>()) {
            (Unscripted::Fail, _) => Reply::Fail("scripted outage".to_string()),
            (Unscripted::Canned, Ok(stage)) => Reply::Text(canned_response(stage)),
            (Unscripted::Canned, Err(_)) => Reply::Text(r#"{"status":"ready"}"#.to_string()),
        }
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let reply = self.next_reply(&inv);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match reply {
            Reply::Text(text) => Ok(LlmResult::new(text, "scripted", inv.model)),
            Reply::Fail(message) => Err(LlmError::Transport(message)),
        }
    }

    fn check_configuration(&self) -> Result<(), LlmError> {
        if self.has_credentials {
            Ok(())
        } else {
            Err(LlmError::Misconfiguration(
                "API key not found in environment variable 'OPENAI_API_KEY'".to_string(),
            ))
        }
    }
}

/// A valid model reply for `stage`, fenced the way chat models often answer.
#[must_use]
pub fn canned_response(stage: StageId) -> String {
    let body = match stage {
        StageId::Segmentation => json!({
            "segmentationApproach": "Split by fleet size and sustainability mandate",
            "keyObservations": ["Fleets buy on TCO", "Mandated buyers pay for verified impact"],
            "segments": [
                {
                    "id": "fleet",
                    "name": "Fleet Operators",
                    "description": "Delivery fleets replacing vans for urban routes",
                    "primaryNeeds": ["Uptime", "Low running cost"],
                    "buyingCriteria": ["Payback under 2 years"],
                    "pricingSensitivity": "High",
                    "representativeShare": "60%",
                    "valueDriversFocus": ["Energy savings"],
                    "riskFactors": ["Battery replacement cost"]
                },
                {
                    "id": "leaders",
                    "name": "Sustainability Leads",
                    "description": "Corporate programmes with emissions targets",
                    "primaryNeeds": ["Verified emissions reduction"],
                    "buyingCriteria": ["Recycled content"],
                    "pricingSensitivity": "low",
                    "representativeShare": "40%",
                    "valueDriversFocus": ["Brand halo"],
                    "riskFactors": ["Reporting effort"]
                }
            ]
        }),
        StageId::NbaAnalysis => json!({
            "searchMethodology": "Dealer listings and fleet tenders",
            "identifiedAlternatives": [
                {"name": "Legacy Cruiser", "estimatedPrice": "$1,800", "priceRange": "medium"},
                {"name": "Import E-Bike", "estimatedPrice": 2200, "priceRange": "low"}
            ],
            "marketPositioning": "Premium but justified",
            "confidenceLevel": "Medium"
        }),
        StageId::NbaValue => json!({
            "nbaValue": 2000,
            "valuationMethodology": "Average of alternatives",
            "justification": "Two comparable products",
            "assumptions": ["List prices hold"],
            "confidenceLevel": "Medium"
        }),
        StageId::ValueDifferentiators => json!({
            "differentiators": [
                {"name": "Energy savings", "value": 2500, "calculation": "500 kWh x 10 years"},
                {"name": "Recycled frame credit", "value": 1500}
            ],
            "totalDifferentiatorValue": 4000
        }),
        StageId::WillingnessToPay => json!({
            "calculation": "NBA plus differentiators",
            "nbaValue": 2000,
            "differentiatorValue": 4000,
            "totalWillingnessToPay": 6000,
            "priceRecommendation": {
                "recommendedPrice": 5500,
                "floorPrice": 5000,
                "stretchPrice": 6500,
                "confidence": "High",
                "rationale": "Strong TCO story"
            },
            "customerSegments": [
                {"segment": "Urban fleets", "willingnessToPay": 6000, "reasoning": "High mileage"}
            ]
        }),
        StageId::CustomerCommunication => json!({
            "communicationStrategy": "Lead with five-year TCO",
            "tcoGuidance": {"message": "Show savings", "tools": "TCO calculator", "objectives": "Payback"},
            "storytellingThemes": ["Lower running cost"]
        }),
        StageId::CompanyGuidance => json!({
            "valueDriverStrengths": [{"driver": "Durability", "strengthLevel": "high"}],
            "valueDriverWeaknesses": [{"driver": "Service network", "weaknessLevel": "medium"}],
            "competitivePositioning": {"currentPosition": "Premium challenger"}
        }),
    };

    format!("Here is the analysis.\n```json\n{body:#}\n```")
}
