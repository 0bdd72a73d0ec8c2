//! session.rs
//!
//! Состояние одной сессии бронирования: автобус (схема мест + выбор) или
//! матч (категория + количество), промокод, данные пассажира и текущий расчёт.
//! Расчёт пересчитывается после каждого изменения выбора или промокода.
//!
//! Этапы: `Selecting` -> `AwaitingPayment` -> `Completed`. Отмена платежа
//! возвращает сессию в `Selecting`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::models::{
    BookedItem, BookingRecord, BookingStatus, Fixture, Money, PassengerDetails, PaymentMethod,
    Route, SeatId, SeatLabelScheme, TicketCategory,
};
use super::pricing::{self, PricingResult, PricingRules};
use super::seat_map::{RowView, SeatMap};
use super::selection::{RejectReason, Selection, ToggleOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowKind {
    Bus,
    Match,
}

impl fmt::Display for FlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowKind::Bus => f.write_str("bus"),
            FlowKind::Match => f.write_str("match"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStage {
    Selecting,
    AwaitingPayment,
    Completed,
}

impl fmt::Display for SessionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStage::Selecting => f.write_str("selecting"),
            SessionStage::AwaitingPayment => f.write_str("awaiting payment"),
            SessionStage::Completed => f.write_str("completed"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BusFlow {
    pub route: Route,
    seat_map: SeatMap,
    selection: Selection,
}

#[derive(Debug, Clone)]
pub struct MatchFlow {
    pub fixture: Fixture,
    categories: Vec<TicketCategory>,
    category: Option<TicketCategory>,
    quantity: u32,
}

#[derive(Debug, Clone)]
pub enum Flow {
    Bus(BusFlow),
    Match(MatchFlow),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PendingPayment {
    pub payment_id: Uuid,
    pub method: PaymentMethod,
    pub amount: Money,
}

/// Итог применения промокода.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PromoOutcome {
    Applied { code: String, discount: Money },
    Unknown { code: String },
    Cleared,
}

#[derive(Debug, Clone)]
pub struct BookingSession {
    id: Uuid,
    flow: Flow,
    rules: PricingRules,
    promo_code: Option<String>,
    pricing: PricingResult,
    passenger: Option<PassengerDetails>,
    stage: SessionStage,
    payment: Option<PendingPayment>,
    // последний начатый платёж, переживает отмену
    last_payment_id: Option<Uuid>,
    booking: Option<BookingRecord>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BookingSession {
    pub fn new_bus(
        route: Route,
        booked: Vec<SeatId>,
        scheme: SeatLabelScheme,
        max_seats: usize,
        rules: PricingRules,
    ) -> Self {
        let layout = route.layout.clone().with_scheme(scheme);
        let seat_map = SeatMap::build(&layout, booked);
        Self::with_flow(
            Flow::Bus(BusFlow {
                route,
                seat_map,
                selection: Selection::new(max_seats),
            }),
            rules,
        )
    }

    pub fn new_match(fixture: Fixture, categories: Vec<TicketCategory>, rules: PricingRules) -> Self {
        Self::with_flow(
            Flow::Match(MatchFlow {
                fixture,
                categories,
                category: None,
                quantity: 1,
            }),
            rules,
        )
    }

    fn with_flow(flow: Flow, rules: PricingRules) -> Self {
        let now = Utc::now();
        let mut session = Self {
            id: Uuid::new_v4(),
            flow,
            rules,
            promo_code: None,
            pricing: PricingResult::default(),
            passenger: None,
            stage: SessionStage::Selecting,
            payment: None,
            last_payment_id: None,
            booking: None,
            created_at: now,
            updated_at: now,
        };
        session.recompute();
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> FlowKind {
        match self.flow {
            Flow::Bus(_) => FlowKind::Bus,
            Flow::Match(_) => FlowKind::Match,
        }
    }

    pub fn stage(&self) -> SessionStage {
        self.stage
    }

    pub fn pricing(&self) -> PricingResult {
        self.pricing
    }

    pub fn promo_code(&self) -> Option<&str> {
        self.promo_code.as_deref()
    }

    pub fn payment(&self) -> Option<PendingPayment> {
        self.payment
    }

    /// Текущий платёж, иначе последний начатый (в т.ч. отменённый)
    pub fn last_payment_id(&self) -> Option<Uuid> {
        self.payment.map(|p| p.payment_id).or(self.last_payment_id)
    }

    pub fn booking(&self) -> Option<&BookingRecord> {
        self.booking.as_ref()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn selected_labels(&self) -> Vec<String> {
        match &self.flow {
            Flow::Bus(bus) => bus
                .selection
                .seats()
                .iter()
                .map(|id| bus.seat_map.label(*id))
                .collect(),
            Flow::Match(_) => Vec::new(),
        }
    }

    fn ensure_selecting(&self) -> Result<(), AppError> {
        if self.stage != SessionStage::Selecting {
            return Err(AppError::SessionLocked(self.stage));
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn recompute(&mut self) {
        let (unit_price, count) = match &self.flow {
            Flow::Bus(bus) => (bus.route.price, bus.selection.len() as u32),
            Flow::Match(m) => match &m.category {
                Some(c) => (c.price, m.quantity),
                None => (Money::ZERO, 0),
            },
        };
        self.pricing = pricing::compute(unit_price, count, self.promo_code.as_deref(), &self.rules);
    }

    /// Нажатие на место по метке. Неизвестная метка - отказ без изменений.
    pub fn toggle_seat(&mut self, label: &str) -> Result<ToggleOutcome, AppError> {
        self.ensure_selecting()?;
        let Flow::Bus(bus) = &mut self.flow else {
            return Err(AppError::WrongFlow(FlowKind::Bus));
        };

        let outcome = match bus.seat_map.resolve(label) {
            Some(id) => bus.selection.toggle(id, &bus.seat_map),
            None => ToggleOutcome::Rejected(RejectReason::UnknownSeat),
        };
        if outcome.is_accepted() {
            self.recompute();
            self.touch();
        }
        Ok(outcome)
    }

    /// Выбор категории сбрасывает количество на 1.
    pub fn select_category(&mut self, category_id: &str) -> Result<(), AppError> {
        self.ensure_selecting()?;
        let Flow::Match(m) = &mut self.flow else {
            return Err(AppError::WrongFlow(FlowKind::Match));
        };
        let category = m
            .categories
            .iter()
            .find(|c| c.id == category_id)
            .cloned()
            .ok_or_else(|| AppError::CategoryNotFound(category_id.to_string()))?;
        m.category = Some(category);
        m.quantity = 1;
        self.recompute();
        self.touch();
        Ok(())
    }

    /// Количество зажимается в [1, доступно]; возвращает итоговое значение.
    pub fn set_quantity(&mut self, quantity: u32) -> Result<u32, AppError> {
        self.ensure_selecting()?;
        let Flow::Match(m) = &mut self.flow else {
            return Err(AppError::WrongFlow(FlowKind::Match));
        };
        let category = m.category.as_ref().ok_or(AppError::CategoryRequired)?;
        let clamped = quantity.clamp(1, category.available_seats.max(1));
        m.quantity = clamped;
        self.recompute();
        self.touch();
        Ok(clamped)
    }

    /// Пустой код снимает промокод; неизвестный код скидки не даёт.
    pub fn apply_promo(&mut self, code: &str) -> Result<PromoOutcome, AppError> {
        self.ensure_selecting()?;
        let code = code.trim();
        let known = !code.is_empty() && self.rules.promos.lookup(code).is_some();
        self.promo_code = known.then(|| code.to_string());
        self.recompute();
        self.touch();

        Ok(if code.is_empty() {
            PromoOutcome::Cleared
        } else if known {
            PromoOutcome::Applied {
                code: code.to_string(),
                discount: self.pricing.discount,
            }
        } else {
            PromoOutcome::Unknown { code: code.to_string() }
        })
    }

    pub fn set_passenger(&mut self, details: PassengerDetails) -> Result<(), AppError> {
        self.ensure_selecting()?;
        details.validate()?;
        self.passenger = Some(details);
        self.touch();
        Ok(())
    }

    /// Начать заново: сбросить выбор, промокод и категорию.
    pub fn reset(&mut self) -> Result<(), AppError> {
        self.ensure_selecting()?;
        match &mut self.flow {
            Flow::Bus(bus) => bus.selection.clear(),
            Flow::Match(m) => {
                m.category = None;
                m.quantity = 1;
            }
        }
        self.promo_code = None;
        self.recompute();
        self.touch();
        Ok(())
    }

    /// Проверяет, что сессию можно оплачивать, и возвращает сумму к оплате.
    pub fn checkout_amount(&self) -> Result<Money, AppError> {
        self.ensure_selecting()?;
        match &self.flow {
            Flow::Bus(bus) => {
                if bus.selection.is_empty() {
                    return Err(AppError::EmptySelection);
                }
                if self.passenger.is_none() {
                    return Err(AppError::PassengerRequired);
                }
            }
            Flow::Match(m) => {
                if m.category.is_none() {
                    return Err(AppError::CategoryRequired);
                }
            }
        }
        Ok(self.pricing.total)
    }

    pub fn begin_payment(&mut self, payment_id: Uuid, method: PaymentMethod) -> Result<Money, AppError> {
        let amount = self.checkout_amount()?;
        self.payment = Some(PendingPayment { payment_id, method, amount });
        self.last_payment_id = Some(payment_id);
        self.stage = SessionStage::AwaitingPayment;
        self.touch();
        Ok(amount)
    }

    /// Платёж отменён или не прошёл: назад к выбору, выбор сохраняется.
    pub fn abandon_payment(&mut self, payment_id: Uuid) -> bool {
        match self.payment {
            Some(p) if p.payment_id == payment_id && self.stage == SessionStage::AwaitingPayment => {
                self.payment = None;
                self.stage = SessionStage::Selecting;
                self.touch();
                true
            }
            _ => false,
        }
    }

    /// Черновик записи о брони для фиксации в каталоге.
    pub fn draft_booking(&self, payment_id: Uuid) -> Result<BookingRecord, AppError> {
        let payment = match self.payment {
            Some(p) if p.payment_id == payment_id => p,
            Some(_) => return Err(AppError::PaymentMismatch(payment_id)),
            None => return Err(AppError::PaymentNotFound),
        };

        let item = match &self.flow {
            Flow::Bus(bus) => BookedItem::Bus {
                route_id: bus.route.id.clone(),
                seats: self.selected_labels(),
            },
            Flow::Match(m) => {
                let category = m.category.as_ref().ok_or(AppError::CategoryRequired)?;
                BookedItem::Match {
                    match_id: m.fixture.id.clone(),
                    ticket_category_id: category.id.clone(),
                    quantity: m.quantity,
                }
            }
        };

        Ok(BookingRecord {
            booking_reference: BookingRecord::reference_for(&item, payment_id),
            session_id: self.id,
            payment_id,
            payment_method: payment.method,
            item,
            passenger: self.passenger.clone(),
            pricing: self.pricing,
            total_amount: self.pricing.total,
            booking_status: BookingStatus::Confirmed,
            created_at: Utc::now(),
        })
    }

    /// Закрывает сессию: запоминает запись о брони и очищает выбор.
    pub fn finish(&mut self, record: BookingRecord) {
        if let Flow::Bus(bus) = &mut self.flow {
            bus.selection.clear();
        }
        self.booking = Some(record);
        self.stage = SessionStage::Completed;
        self.touch();
    }

    pub fn view(&self) -> SessionView {
        let (bus, fixture) = match &self.flow {
            Flow::Bus(b) => (
                Some(BusView {
                    route: b.route.clone(),
                    rows: b.seat_map.rows(&b.selection),
                    selected_seats: self.selected_labels(),
                    selected_count: b.selection.len(),
                    max_seats: b.selection.max_seats(),
                    remaining: b.selection.remaining(),
                    available_seats: b.seat_map.available_count(),
                }),
                None,
            ),
            Flow::Match(m) => (
                None,
                Some(MatchView {
                    fixture: m.fixture.clone(),
                    categories: m.categories.clone(),
                    selected_category: m.category.clone(),
                    quantity: m.quantity,
                }),
            ),
        };

        SessionView {
            id: self.id,
            kind: self.kind(),
            stage: self.stage,
            bus,
            fixture,
            promo_code: self.promo_code.clone(),
            pricing: self.pricing,
            passenger: self.passenger.clone(),
            payment: self.payment,
            booking_reference: self.booking.as_ref().map(|b| b.booking_reference.clone()),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BusView {
    pub route: Route,
    pub rows: Vec<RowView>,
    pub selected_seats: Vec<String>,
    pub selected_count: usize,
    pub max_seats: usize,
    pub remaining: usize,
    pub available_seats: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchView {
    pub fixture: Fixture,
    pub categories: Vec<TicketCategory>,
    pub selected_category: Option<TicketCategory>,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub kind: FlowKind,
    pub stage: SessionStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bus: Option<BusView>,
    #[serde(rename = "match", skip_serializing_if = "Option::is_none")]
    pub fixture: Option<MatchView>,
    pub promo_code: Option<String>,
    pub pricing: PricingResult,
    pub passenger: Option<PassengerDetails>,
    pub payment: Option<PendingPayment>,
    pub booking_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
