//! booking.rs
//!
//! Сервисный слой сценариев бронирования. Связывает сессии (`SessionCache`),
//! каталог, платёжный сервис и уведомления пользователю.
//!
//! Завершение платежа идемпотентно: повторный сигнал для той же сессии и того
//! же платежа возвращает уже созданную бронь и не списывает остатки второй раз.

use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::cache::SessionCache;
use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::AppError;
use crate::models::{BookingRecord, PassengerDetails, PaymentMethod, SeatLabelScheme};
use super::notify::{Notice, Notifier};
use super::payment::{PaymentInfo, PaymentService, PaymentStatus};
use super::pricing::{PricingRules, PromoTable};
use super::selection::{RejectReason, ToggleOutcome};
use super::session::{BookingSession, PromoOutcome, SessionStage, SessionView};

#[derive(Debug, Clone)]
pub struct BookingSettings {
    pub max_seats: usize,
    pub seat_scheme: SeatLabelScheme,
    pub bus_convenience_fee_bps: Option<u32>,
    pub match_convenience_fee_bps: Option<u32>,
    pub promos_enabled: bool,
}

impl BookingSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_seats: config.booking.max_seats,
            seat_scheme: config.booking.seat_scheme,
            bus_convenience_fee_bps: config.pricing.bus_convenience_fee_bps,
            match_convenience_fee_bps: config.pricing.match_convenience_fee_bps,
            promos_enabled: config.features.enable_promos,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ToggleResult {
    pub outcome: ToggleOutcome,
    pub session: SessionView,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PromoResult {
    pub outcome: PromoOutcome,
    pub session: SessionView,
}

#[derive(Clone)]
pub struct BookingService {
    catalog: Arc<dyn Catalog>,
    sessions: SessionCache,
    payments: PaymentService,
    notifier: Arc<dyn Notifier>,
    promos: Arc<PromoTable>,
    settings: BookingSettings,
}

impl BookingService {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        sessions: SessionCache,
        payments: PaymentService,
        notifier: Arc<dyn Notifier>,
        promos: Arc<PromoTable>,
        settings: BookingSettings,
    ) -> Self {
        Self {
            catalog,
            sessions,
            payments,
            notifier,
            promos,
            settings,
        }
    }

    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    pub fn sessions(&self) -> &SessionCache {
        &self.sessions
    }

    pub fn payments(&self) -> &PaymentService {
        &self.payments
    }

    pub fn promos(&self) -> &PromoTable {
        &self.promos
    }

    fn rules(&self, fee_bps: Option<u32>) -> PricingRules {
        let promos = if self.settings.promos_enabled {
            self.promos.clone()
        } else {
            Arc::new(PromoTable::default())
        };
        PricingRules::new(promos, fee_bps)
    }

    /* ---------- старт сессий ---------- */

    pub async fn start_bus(&self, route_id: &str) -> Result<SessionView, AppError> {
        let route = self
            .catalog
            .route(route_id)
            .ok_or_else(|| AppError::RouteNotFound(route_id.to_string()))?;
        let booked = self.catalog.booked_seats(route_id);

        let session = BookingSession::new_bus(
            route,
            booked,
            self.settings.seat_scheme,
            self.settings.max_seats,
            self.rules(self.settings.bus_convenience_fee_bps),
        );
        info!("🚌 Bus session {} started for route {}", session.id(), route_id);
        Ok(self.sessions.insert(session).await)
    }

    pub async fn start_match(&self, match_id: &str) -> Result<SessionView, AppError> {
        let fixture = self
            .catalog
            .fixture(match_id)
            .ok_or_else(|| AppError::MatchNotFound(match_id.to_string()))?;
        let categories = self.catalog.ticket_categories(match_id);

        let session = BookingSession::new_match(
            fixture,
            categories,
            self.rules(self.settings.match_convenience_fee_bps),
        );
        info!("🏏 Match session {} started for match {}", session.id(), match_id);
        Ok(self.sessions.insert(session).await)
    }

    pub async fn view(&self, session_id: Uuid) -> Result<SessionView, AppError> {
        self.sessions.view(session_id).await
    }

    /* ---------- выбор ---------- */

    pub async fn toggle_seat(&self, session_id: Uuid, label: &str) -> Result<ToggleResult, AppError> {
        let (outcome, session) = self
            .sessions
            .update(session_id, |s| {
                let outcome = s.toggle_seat(label)?;
                Ok((outcome, s.view()))
            })
            .await?;

        match outcome {
            ToggleOutcome::Rejected(RejectReason::Booked) => {
                self.notifier.notify(Notice::destructive(format!("Seat {} is already booked", label.trim())));
            }
            ToggleOutcome::Rejected(RejectReason::CapReached) => {
                self.notifier.notify(
                    Notice::destructive("Seat limit reached")
                        .with_description(format!("You can select up to {} seats", self.settings.max_seats)),
                );
            }
            ToggleOutcome::Rejected(RejectReason::UnknownSeat) => {
                self.notifier.notify(Notice::destructive(format!("Seat {} does not exist", label.trim())));
            }
            _ => {}
        }

        Ok(ToggleResult { outcome, session })
    }

    pub async fn select_category(&self, session_id: Uuid, category_id: &str) -> Result<SessionView, AppError> {
        self.sessions
            .update(session_id, |s| {
                s.select_category(category_id)?;
                Ok(s.view())
            })
            .await
    }

    pub async fn set_quantity(&self, session_id: Uuid, quantity: u32) -> Result<SessionView, AppError> {
        self.sessions
            .update(session_id, |s| {
                s.set_quantity(quantity)?;
                Ok(s.view())
            })
            .await
    }

    pub async fn apply_promo(&self, session_id: Uuid, code: &str) -> Result<PromoResult, AppError> {
        if !self.settings.promos_enabled && !code.trim().is_empty() {
            return Err(AppError::FeatureDisabled("promo codes"));
        }

        let (outcome, session) = self
            .sessions
            .update(session_id, |s| {
                let outcome = s.apply_promo(code)?;
                Ok((outcome, s.view()))
            })
            .await?;

        match &outcome {
            PromoOutcome::Applied { discount, .. } => {
                self.notifier.notify(Notice::success(format!("Promo applied! You saved ₹{}", discount)));
            }
            PromoOutcome::Unknown { code } => {
                self.notifier.notify(Notice::destructive(format!("Promo code {} is not valid", code)));
            }
            PromoOutcome::Cleared => {}
        }

        Ok(PromoResult { outcome, session })
    }

    pub async fn set_passenger(&self, session_id: Uuid, details: PassengerDetails) -> Result<SessionView, AppError> {
        self.sessions
            .update(session_id, |s| {
                s.set_passenger(details)?;
                Ok(s.view())
            })
            .await
    }

    pub async fn reset(&self, session_id: Uuid) -> Result<SessionView, AppError> {
        self.sessions
            .update(session_id, |s| {
                s.reset()?;
                Ok(s.view())
            })
            .await
    }

    /* ---------- оплата ---------- */

    /// Запускает имитацию оплаты. По завершении платежа бронь фиксируется
    /// фоновой задачей; отмена возвращает сессию к выбору.
    pub async fn start_payment(&self, session_id: Uuid, method: PaymentMethod) -> Result<PaymentInfo, AppError> {
        let handle = self
            .sessions
            .update(session_id, |s| {
                let amount = s.checkout_amount()?;
                let handle = self.payments.start(session_id, amount, method);
                s.begin_payment(handle.payment_id, method)?;
                Ok(handle)
            })
            .await?;

        let payment_id = handle.payment_id;
        let info = self.payments.info(payment_id).ok_or(AppError::PaymentNotFound)?;

        let service = self.clone();
        tokio::spawn(async move {
            match handle.wait().await {
                PaymentStatus::Completed => {
                    if let Err(e) = service.complete_payment(session_id, payment_id).await {
                        error!("failed to complete booking for payment {}: {}", payment_id, e);
                    }
                }
                PaymentStatus::Cancelled => service.payment_cancelled(session_id, payment_id).await,
                PaymentStatus::Pending => {}
            }
        });

        Ok(info)
    }

    pub async fn payment_status(&self, session_id: Uuid) -> Result<PaymentInfo, AppError> {
        let payment_id = self.current_payment_id(session_id).await?;
        self.payments.info(payment_id).ok_or(AppError::PaymentNotFound)
    }

    /// Отмена платежа. Возвращает `true`, если отмена была принята.
    pub async fn cancel_payment(&self, session_id: Uuid) -> Result<bool, AppError> {
        let payment_id = self.current_payment_id(session_id).await?;
        let cancelled = self.payments.cancel(payment_id);
        if cancelled {
            // не ждём фоновую задачу, чтобы клиент сразу увидел сессию в Selecting
            self.payment_cancelled(session_id, payment_id).await;
        }
        Ok(cancelled)
    }

    async fn current_payment_id(&self, session_id: Uuid) -> Result<Uuid, AppError> {
        self.sessions
            .read(session_id, |s| s.last_payment_id().or_else(|| s.booking().map(|b| b.payment_id)))
            .await?
            .ok_or(AppError::PaymentNotFound)
    }

    async fn payment_cancelled(&self, session_id: Uuid, payment_id: Uuid) {
        let reverted = self
            .sessions
            .update(session_id, |s| Ok(s.abandon_payment(payment_id)))
            .await
            .unwrap_or(false);
        if reverted {
            self.notifier.notify(Notice::info("Payment cancelled"));
        }
    }

    /// Сигнал об успешной оплате: фиксирует бронь в каталоге.
    pub async fn complete_payment(&self, session_id: Uuid, payment_id: Uuid) -> Result<BookingRecord, AppError> {
        let catalog = self.catalog.clone();

        let result = self
            .sessions
            .update(session_id, |s| {
                if let Some(existing) = s.booking() {
                    if existing.payment_id == payment_id {
                        return Ok((existing.clone(), false));
                    }
                    return Err(AppError::PaymentMismatch(payment_id));
                }
                if s.stage() != SessionStage::AwaitingPayment {
                    return Err(AppError::SessionLocked(s.stage()));
                }

                let draft = s.draft_booking(payment_id)?;
                match catalog.commit_booking(draft) {
                    Ok(record) => {
                        s.finish(record.clone());
                        Ok((record, true))
                    }
                    Err(e) => {
                        s.abandon_payment(payment_id);
                        Err(AppError::Catalog(e))
                    }
                }
            })
            .await;

        match result {
            Ok((record, true)) => {
                info!("✅ Booking {} confirmed for session {}", record.booking_reference, session_id);
                self.notifier.notify(
                    Notice::success("Booking Confirmed!")
                        .with_description(format!("Your booking reference is {}", record.booking_reference)),
                );
                Ok(record)
            }
            Ok((record, false)) => {
                warn!("payment {} already completed, returning {}", payment_id, record.booking_reference);
                Ok(record)
            }
            Err(e) => {
                if matches!(e, AppError::Catalog(_)) {
                    self.notifier.notify(Notice::destructive("Booking Failed").with_description(e.to_string()));
                }
                Err(e)
            }
        }
    }

    pub fn booking(&self, reference: &str) -> Result<BookingRecord, AppError> {
        self.catalog
            .booking(reference)
            .ok_or_else(|| AppError::BookingNotFound(reference.to_string()))
    }
}
