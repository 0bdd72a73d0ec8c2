//! payment.rs
//!
//! Имитация платёжного шлюза. Настоящих списаний нет: платёж - это фоновая
//! задача tokio, которая завершается через заданную задержку.
//!
//! Ключевые компоненты:
//! 1.  **PaymentService**: запускает платежи, хранит их статусы и умеет их отменять.
//! 2.  **PaymentHandle**: наблюдатель за одним платежом. Статус приходит через
//!     `tokio::sync::watch`, поэтому и завершение, и отмена видны вызывающему.
//! 3.  **PaymentStatus**: `Pending` -> `Completed` | `Cancelled`. Конечные статусы
//!     больше не меняются; отмена после завершения ничего не делает.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::{oneshot, watch};
use tokio::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::PaymentConfig;
use crate::models::{Money, PaymentMethod};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Cancelled,
}

impl PaymentStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

/// Снимок состояния платежа для API.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentInfo {
    pub payment_id: Uuid,
    pub session_id: Uuid,
    pub amount: Money,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

struct PaymentEntry {
    session_id: Uuid,
    amount: Money,
    method: PaymentMethod,
    status: watch::Receiver<PaymentStatus>,
    cancel: Option<oneshot::Sender<()>>,
    created_at: DateTime<Utc>,
}

impl PaymentEntry {
    // отмена принята, но задача могла ещё не выставить статус
    fn current_status(&self) -> PaymentStatus {
        match *self.status.borrow() {
            PaymentStatus::Pending if self.cancel.is_none() => PaymentStatus::Cancelled,
            status => status,
        }
    }

    fn info(&self, payment_id: Uuid) -> PaymentInfo {
        PaymentInfo {
            payment_id,
            session_id: self.session_id,
            amount: self.amount,
            method: self.method,
            status: self.current_status(),
            created_at: self.created_at,
        }
    }
}

/// Наблюдатель за одним платежом.
#[derive(Debug, Clone)]
pub struct PaymentHandle {
    pub payment_id: Uuid,
    status: watch::Receiver<PaymentStatus>,
}

impl PaymentHandle {
    pub fn status(&self) -> PaymentStatus {
        *self.status.borrow()
    }

    /// Ждёт конечного статуса.
    pub async fn wait(mut self) -> PaymentStatus {
        loop {
            let current = *self.status.borrow_and_update();
            if current.is_terminal() {
                return current;
            }
            if self.status.changed().await.is_err() {
                // задача завершилась, не выставив статус
                let last = *self.status.borrow();
                return if last.is_terminal() { last } else { PaymentStatus::Cancelled };
            }
        }
    }
}

#[derive(Clone)]
pub struct PaymentService {
    delay: Duration,
    payments: Arc<RwLock<HashMap<Uuid, PaymentEntry>>>,
}

impl PaymentService {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            payments: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn from_config(config: &PaymentConfig) -> Self {
        Self::new(Duration::from_millis(config.simulated_delay_ms))
    }

    /// Запускает платёж. Задача завершится сама через `delay`, если её не отменят.
    pub fn start(&self, session_id: Uuid, amount: Money, method: PaymentMethod) -> PaymentHandle {
        let payment_id = Uuid::new_v4();
        let (status_tx, status_rx) = watch::channel(PaymentStatus::Pending);
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();

        {
            let mut payments = self.payments.write().unwrap_or_else(|p| p.into_inner());
            payments.insert(
                payment_id,
                PaymentEntry {
                    session_id,
                    amount,
                    method,
                    status: status_rx.clone(),
                    cancel: Some(cancel_tx),
                    created_at: Utc::now(),
                },
            );
        }

        let delay = self.delay;
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    let _ = status_tx.send(PaymentStatus::Completed);
                    info!("💳 Payment {} completed ({})", payment_id, amount);
                }
                _ = cancel_rx => {
                    let _ = status_tx.send(PaymentStatus::Cancelled);
                    info!("💳 Payment {} cancelled", payment_id);
                }
            }
        });

        debug!("payment {} started for session {}", payment_id, session_id);
        PaymentHandle {
            payment_id,
            status: status_rx,
        }
    }

    pub fn info(&self, payment_id: Uuid) -> Option<PaymentInfo> {
        let payments = self.payments.read().unwrap_or_else(|p| p.into_inner());
        payments.get(&payment_id).map(|e| e.info(payment_id))
    }

    pub fn status(&self, payment_id: Uuid) -> Option<PaymentStatus> {
        self.info(payment_id).map(|i| i.status)
    }

    pub fn subscribe(&self, payment_id: Uuid) -> Option<PaymentHandle> {
        let payments = self.payments.read().unwrap_or_else(|p| p.into_inner());
        payments.get(&payment_id).map(|e| PaymentHandle {
            payment_id,
            status: e.status.clone(),
        })
    }

    /// Запрашивает отмену. `false`, если платёж неизвестен или уже завершён.
    pub fn cancel(&self, payment_id: Uuid) -> bool {
        let mut payments = self.payments.write().unwrap_or_else(|p| p.into_inner());
        let Some(entry) = payments.get_mut(&payment_id) else {
            return false;
        };
        if entry.status.borrow().is_terminal() {
            return false;
        }
        match entry.cancel.take() {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }

    /// Удаляет завершённые платежи старше `cutoff`. Незавершённые не трогает.
    pub fn forget_finished(&self, cutoff: DateTime<Utc>) -> usize {
        let mut payments = self.payments.write().unwrap_or_else(|p| p.into_inner());
        let before = payments.len();
        payments.retain(|_, e| !(e.status.borrow().is_terminal() && e.created_at < cutoff));
        before - payments.len()
    }

    pub fn pending_count(&self) -> usize {
        let payments = self.payments.read().unwrap_or_else(|p| p.into_inner());
        payments.values().filter(|e| !e.status.borrow().is_terminal()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn payment_completes_after_delay() {
        let service = PaymentService::new(Duration::from_millis(10));
        let handle = service.start(Uuid::new_v4(), Money::from_major(895), PaymentMethod::Upi);
        assert_eq!(handle.status(), PaymentStatus::Pending);

        let id = handle.payment_id;
        assert_eq!(handle.wait().await, PaymentStatus::Completed);
        assert_eq!(service.status(id), Some(PaymentStatus::Completed));
        assert!(!service.cancel(id), "cancel after completion must be a no-op");
    }

    #[tokio::test]
    async fn cancellation_is_observable() {
        let service = PaymentService::new(Duration::from_secs(60));
        let handle = service.start(Uuid::new_v4(), Money::from_major(100), PaymentMethod::Card);
        let id = handle.payment_id;

        assert!(service.cancel(id));
        assert_eq!(handle.wait().await, PaymentStatus::Cancelled);
        assert_eq!(service.status(id), Some(PaymentStatus::Cancelled));
        assert!(!service.cancel(id));
    }

    #[tokio::test]
    async fn accepted_cancel_is_reported_before_task_runs() {
        let service = PaymentService::new(Duration::from_secs(60));
        let handle = service.start(Uuid::new_v4(), Money::from_major(100), PaymentMethod::Upi);

        assert!(service.cancel(handle.payment_id));
        // без await: задача ещё не успела выставить статус
        assert_eq!(service.status(handle.payment_id), Some(PaymentStatus::Cancelled));
    }

    #[tokio::test]
    async fn forget_keeps_pending_payments() {
        let service = PaymentService::new(Duration::from_secs(60));
        let pending = service.start(Uuid::new_v4(), Money::from_major(1), PaymentMethod::Wallet);
        let done = service.start(Uuid::new_v4(), Money::from_major(1), PaymentMethod::Wallet);
        service.cancel(done.payment_id);
        done.wait().await;

        let removed = service.forget_finished(Utc::now() + chrono::Duration::seconds(1));
        assert_eq!(removed, 1);
        assert_eq!(service.status(pending.payment_id), Some(PaymentStatus::Pending));
        assert_eq!(service.pending_count(), 1);
    }

    #[tokio::test]
    async fn unknown_payment() {
        let service = PaymentService::new(Duration::from_millis(1));
        assert!(service.status(Uuid::new_v4()).is_none());
        assert!(!service.cancel(Uuid::new_v4()));
    }
}
