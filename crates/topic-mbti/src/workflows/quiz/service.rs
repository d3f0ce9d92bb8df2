use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use super::domain::{ChoiceSide, QuestionId};
use super::export;
use super::gateway::{GatewayRequest, QuizGateway};
use super::session::{QuizError, QuizSession, SessionView};

/// Async facade owning the single active session and the gateway it talks to.
///
/// The session lock is never held across a gateway await, so snapshots taken while a
/// request is in flight observe the loading phase.
pub struct QuizService<G> {
    gateway: Arc<G>,
    session: Mutex<QuizSession>,
}

impl<G> QuizService<G>
where
    G: QuizGateway + 'static,
{
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            session: Mutex::new(QuizSession::new()),
        }
    }

    pub fn snapshot(&self) -> Result<SessionView, QuizError> {
        Ok(self.lock()?.view())
    }

    /// Run a read-only closure against the live session.
    pub fn inspect<T>(&self, f: impl FnOnce(&QuizSession) -> T) -> Result<T, QuizError> {
        let session = self.lock()?;
        Ok(f(&*session))
    }

    pub async fn submit_keyword(&self, keyword: &str) -> Result<SessionView, QuizError> {
        let request = self.lock()?.submit_keyword(keyword)?;
        self.drive(Some(request)).await
    }

    pub async fn regenerate_suggestions(
        &self,
        style: Option<&str>,
    ) -> Result<SessionView, QuizError> {
        let request = self.lock()?.regenerate_suggestions(style)?;
        self.drive(Some(request)).await
    }

    pub async fn select_topic(&self, topic: &str) -> Result<SessionView, QuizError> {
        let request = self.lock()?.select_topic(topic)?;
        self.drive(Some(request)).await
    }

    pub async fn answer(
        &self,
        question_id: &QuestionId,
        side: ChoiceSide,
    ) -> Result<SessionView, QuizError> {
        let request = self.lock()?.answer(question_id, side)?;
        self.drive(request).await
    }

    pub fn go_back(&self) -> Result<SessionView, QuizError> {
        let mut session = self.lock()?;
        session.go_back();
        Ok(session.view())
    }

    pub fn restart(&self) -> Result<SessionView, QuizError> {
        let mut session = self.lock()?;
        session.restart();
        Ok(session.view())
    }

    /// Transcript of a finished session.
    pub fn transcript(&self) -> Result<(String, String), QuizError> {
        let session = self.lock()?;
        if session.result().is_none() {
            return Err(QuizError::NoResult);
        }
        Ok((
            export::transcript_file_name(session.topic()),
            export::transcript(&session),
        ))
    }

    /// Await each request with the lock released, then settle it. A stale settlement
    /// means the session moved on in the meantime; the outcome is dropped.
    async fn drive(&self, mut request: Option<GatewayRequest>) -> Result<SessionView, QuizError> {
        while let Some(GatewayRequest { ticket, call }) = request.take() {
            let outcome = call.dispatch(self.gateway.as_ref()).await;
            let mut session = self.lock()?;
            request = match session.settle(ticket, outcome) {
                Ok(next) => next,
                Err(QuizError::StaleSettlement) => {
                    debug!(kind = call.kind(), "session moved on before the request settled");
                    None
                }
                Err(err) => return Err(err),
            };
        }
        self.snapshot()
    }

    fn lock(&self) -> Result<MutexGuard<'_, QuizSession>, QuizError> {
        self.session.lock().map_err(|_| QuizError::StateUnavailable)
    }
}
