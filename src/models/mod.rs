pub mod money;
pub mod seat;
pub mod layout;
pub mod promo;
pub mod route;
pub mod event;
pub mod merchandise;
pub mod booking;

pub use money::Money;
pub use seat::{Seat, SeatId, SeatLabelScheme, SeatView};
pub use layout::LayoutSpec;
pub use promo::{Discount, PromoRule};
pub use route::Route;
pub use event::{Fixture, MatchStatus, Team, TicketCategory, TicketType, Venue};
pub use merchandise::{Merchandise, MerchandiseOrder, MerchandiseOrderRequest};
pub use booking::{BookedItem, BookingRecord, BookingStatus, PassengerDetails, PaymentMethod};
