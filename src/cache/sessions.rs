use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::cache::SessionCache;
use crate::error::AppError;
use crate::services::session::{BookingSession, SessionStage, SessionView};

impl SessionCache {
    /// Сохранить новую сессию
    pub async fn insert(&self, session: BookingSession) -> SessionView {
        let view = session.view();
        self.sessions.write().await.insert(session.id(), session);
        debug!("session {} stored", view.id);
        view
    }

    /// Прочитать сессию без изменения
    pub async fn read<R>(&self, id: Uuid, f: impl FnOnce(&BookingSession) -> R) -> Result<R, AppError> {
        let sessions = self.sessions.read().await;
        sessions.get(&id).map(f).ok_or(AppError::SessionNotFound(id))
    }

    /// Изменить сессию под блокировкой записи
    pub async fn update<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut BookingSession) -> Result<R, AppError>,
    ) -> Result<R, AppError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or(AppError::SessionNotFound(id))?;
        f(session)
    }

    pub async fn view(&self, id: Uuid) -> Result<SessionView, AppError> {
        self.read(id, |s| s.view()).await
    }

    pub async fn remove(&self, id: Uuid) -> Option<BookingSession> {
        self.sessions.write().await.remove(&id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Удалить сессии без активности с `cutoff`. Сессии с незавершённым платежом остаются.
    pub async fn evict_idle(&self, cutoff: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.stage() == SessionStage::AwaitingPayment || s.updated_at() >= cutoff);
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!("🧹 Evicted {} idle sessions", evicted);
        }
        evicted
    }
}
