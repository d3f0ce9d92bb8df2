use async_trait::async_trait;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use topic_mbti::workflows::quiz::{
    Axis, GatewayError, InterpretationDetail, PersonalityType, Question, QuizGateway,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

const OFFLINE_REASON: &str = "offline mode: generative service disabled";

/// Gateway used without network access. Topics are derived from the keyword; every
/// generation call fails so the local question battery and fallback interpretation
/// take over.
#[derive(Debug, Default, Clone)]
pub(crate) struct OfflineGateway;

impl OfflineGateway {
    pub(crate) fn topics_for(keyword: &str, style: Option<&str>) -> Vec<String> {
        let mut topics = vec![
            format!("{keyword} 스타일 테스트"),
            format!("{keyword} 속 나의 캐릭터"),
            format!("{keyword} 궁합 MBTI"),
        ];
        if let Some(style) = style.map(str::trim).filter(|style| !style.is_empty()) {
            for topic in &mut topics {
                topic.push_str(&format!(" ({style})"));
            }
        }
        topics
    }
}

#[async_trait]
impl QuizGateway for OfflineGateway {
    async fn suggest_topics(
        &self,
        keyword: &str,
        style: Option<&str>,
    ) -> Result<Vec<String>, GatewayError> {
        Ok(Self::topics_for(keyword, style))
    }

    async fn generate_questions(&self, _topic: &str) -> Result<Vec<Question>, GatewayError> {
        Err(GatewayError::Unavailable(OFFLINE_REASON.to_string()))
    }

    async fn generate_tie_breaker(
        &self,
        _topic: &str,
        _axis: Axis,
    ) -> Result<Question, GatewayError> {
        Err(GatewayError::Unavailable(OFFLINE_REASON.to_string()))
    }

    async fn generate_interpretation(
        &self,
        _topic: &str,
        _personality_type: &PersonalityType,
    ) -> Result<InterpretationDetail, GatewayError> {
        Err(GatewayError::Unavailable(OFFLINE_REASON.to_string()))
    }
}
