use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::cache::SessionCache;
use crate::config::{BookingConfig, MAX_SESSION_TTL_SECONDS};
use super::payment::PaymentService;

/// Фоновая очистка: брошенные сессии и завершённые платежи.
#[derive(Clone)]
pub struct CleanupService {
    sessions: SessionCache,
    payments: PaymentService,
    session_ttl: Duration,
    interval: std::time::Duration,
}

impl CleanupService {
    pub fn new(sessions: SessionCache, payments: PaymentService, config: &BookingConfig) -> Self {
        // TTL ограничен сверху, поэтому в i64 секунд он помещается всегда
        let ttl = config.session_ttl_seconds.min(MAX_SESSION_TTL_SECONDS);
        Self {
            sessions,
            payments,
            session_ttl: Duration::seconds(i64::try_from(ttl).unwrap_or(i64::MAX)),
            interval: std::time::Duration::from_secs(config.cleanup_interval_seconds.max(1)),
        }
    }

    pub fn interval(&self) -> std::time::Duration {
        self.interval
    }

    /// Запускает полную очистку и возвращает, сколько удалено
    pub async fn run_full_cleanup(&self) -> CleanupStats {
        debug!("🧹 Starting cleanup pass");
        let cutoff = Utc::now() - self.session_ttl;

        // Сессии без активности дольше TTL; ожидающие оплату не трогаем
        let evicted_sessions = self.sessions.evict_idle(cutoff).await;

        // Конечные платежи старше TTL больше никому не нужны
        let forgotten_payments = self.payments.forget_finished(cutoff);
        if forgotten_payments > 0 {
            info!("💳 Forgot {} finished payments", forgotten_payments);
        }

        let stats = CleanupStats {
            evicted_sessions,
            forgotten_payments,
            active_sessions: self.sessions.len().await,
            pending_payments: self.payments.pending_count(),
        };
        if stats.total_items_cleaned() > 0 {
            info!("✅ Cleanup pass removed {} items", stats.total_items_cleaned());
        } else {
            debug!("✅ Cleanup pass completed, nothing to remove");
        }
        stats
    }

    /// Бесконечный цикл очистки, запускается через `tokio::spawn`
    pub async fn run_forever(self) {
        info!("🧹 Cleanup loop started, every {:?}", self.interval);
        loop {
            tokio::time::sleep(self.interval).await;
            self.run_full_cleanup().await;
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanupStats {
    pub evicted_sessions: usize,
    pub forgotten_payments: usize,
    pub active_sessions: usize,
    pub pending_payments: usize,
}

impl CleanupStats {
    pub fn total_items_cleaned(&self) -> usize {
        self.evicted_sessions + self.forgotten_payments
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, InMemoryCatalog};
    use crate::models::{Money, PaymentMethod, SeatLabelScheme};
    use crate::services::pricing::{PricingRules, PromoTable};
    use crate::services::session::BookingSession;
    use std::sync::Arc;

    fn session() -> BookingSession {
        let catalog = InMemoryCatalog::seeded();
        let route = catalog.route("1").unwrap();
        let rules = PricingRules::new(Arc::new(PromoTable::defaults()), Some(500));
        BookingSession::new_bus(route, Vec::new(), SeatLabelScheme::RowNumberLetter, 4, rules)
    }

    fn config(ttl: u64) -> BookingConfig {
        BookingConfig {
            max_seats: 4,
            seat_scheme: SeatLabelScheme::RowNumberLetter,
            session_ttl_seconds: ttl,
            cleanup_interval_seconds: 60,
        }
    }

    #[tokio::test]
    async fn fresh_sessions_survive() {
        let sessions = SessionCache::new();
        sessions.insert(session()).await;
        let cleanup = CleanupService::new(sessions.clone(), PaymentService::new(std::time::Duration::from_secs(60)), &config(1_800));

        let stats = cleanup.run_full_cleanup().await;
        assert_eq!(stats.evicted_sessions, 0);
        assert_eq!(stats.active_sessions, 1);
    }

    #[tokio::test]
    async fn oversized_ttl_keeps_fresh_sessions() {
        let sessions = SessionCache::new();
        sessions.insert(session()).await;
        let cleanup = CleanupService::new(sessions.clone(), PaymentService::new(std::time::Duration::from_secs(60)), &config(u64::MAX));

        let stats = cleanup.run_full_cleanup().await;
        assert_eq!(stats.evicted_sessions, 0);
        assert_eq!(stats.active_sessions, 1);
    }

    #[tokio::test]
    async fn idle_sessions_are_evicted_but_paying_ones_stay() {
        let sessions = SessionCache::new();
        let payments = PaymentService::new(std::time::Duration::from_secs(60));
        let idle = sessions.insert(session()).await;
        let paying = sessions.insert(session()).await;

        sessions
            .update(paying.id, |s| {
                s.toggle_seat("5C")?;
                s.set_passenger(crate::models::PassengerDetails {
                    name: "Neha Kapoor".to_string(),
                    email: "neha@example.com".to_string(),
                    phone: "9123456780".to_string(),
                    age: 41,
                })?;
                let handle = payments.start(s.id(), Money::from_major(10), PaymentMethod::Upi);
                s.begin_payment(handle.payment_id, PaymentMethod::Upi)
            })
            .await
            .unwrap();

        // TTL = 0: всё, что не ждёт оплаты, уже просрочено
        let cleanup = CleanupService::new(sessions.clone(), payments, &config(0));
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let stats = cleanup.run_full_cleanup().await;

        assert_eq!(stats.evicted_sessions, 1);
        assert_eq!(stats.pending_payments, 1);
        assert!(sessions.view(idle.id).await.is_err());
        assert!(sessions.view(paying.id).await.is_ok());
    }
}
