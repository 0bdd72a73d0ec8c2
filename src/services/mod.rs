pub mod analytics;
pub mod booking;
pub mod cleanup;
pub mod notify;
pub mod payment;
pub mod pricing;
pub mod seat_map;
pub mod selection;
pub mod session;

pub use booking::{BookingService, BookingSettings};
pub use notify::{LogNotifier, Notice, NoticeLevel, Notifier};
pub use payment::{PaymentService, PaymentStatus};
pub use pricing::{PricingResult, PricingRules, PromoTable};
pub use seat_map::SeatMap;
pub use selection::{RejectReason, Selection, ToggleOutcome};
pub use session::{BookingSession, FlowKind, SessionStage, SessionView};
