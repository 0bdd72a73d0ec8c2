//! catalog.rs
//!
//! Слой доступа к данным: рейсы, матчи, категории билетов, мерч и
//! завершённые бронирования. Сервисы получают каталог как `Arc<dyn Catalog>`,
//! поэтому хранилище можно подменить (в тестах, или на настоящую БД).
//!
//! `InMemoryCatalog` держит всё в памяти и заполняется демо-данными.

use chrono::{NaiveDate, TimeZone, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::CatalogError;
use crate::models::{
    BookedItem, BookingRecord, Fixture, LayoutSpec, MatchStatus, Merchandise, MerchandiseOrder,
    MerchandiseOrderRequest, Money, Route, SeatId, SeatLabelScheme, Team, TicketCategory,
    TicketType, Venue,
};

pub trait Catalog: Send + Sync {
    fn routes(&self) -> Vec<Route>;
    fn route(&self, id: &str) -> Option<Route>;
    /// Поиск рейсов по городам (без учёта регистра); пустой фильтр пропускает всё.
    fn search_routes(&self, from: Option<&str>, to: Option<&str>) -> Vec<Route>;
    fn booked_seats(&self, route_id: &str) -> Vec<SeatId>;

    fn fixtures(&self) -> Vec<Fixture>;
    fn fixture(&self, id: &str) -> Option<Fixture>;
    /// Категории с доступными местами, по возрастанию цены.
    fn ticket_categories(&self, match_id: &str) -> Vec<TicketCategory>;
    fn ticket_category(&self, id: &str) -> Option<TicketCategory>;

    fn merchandise(&self) -> Vec<Merchandise>;
    fn place_merchandise_order(&self, order: &MerchandiseOrderRequest) -> Result<MerchandiseOrder, CatalogError>;

    /// Фиксирует бронь и списывает остатки. Повторный вызов с тем же
    /// `payment_id` возвращает уже сохранённую запись и ничего не списывает.
    fn commit_booking(&self, record: BookingRecord) -> Result<BookingRecord, CatalogError>;
    fn booking(&self, reference: &str) -> Option<BookingRecord>;
    fn bookings(&self) -> Vec<BookingRecord>;
}

#[derive(Default)]
struct CatalogData {
    routes: Vec<Route>,
    booked: HashMap<String, BTreeSet<SeatId>>,
    fixtures: Vec<Fixture>,
    categories: Vec<TicketCategory>,
    merchandise: Vec<Merchandise>,
    orders: Vec<MerchandiseOrder>,
    bookings: Vec<BookingRecord>,
}

#[derive(Default)]
pub struct InMemoryCatalog {
    data: RwLock<CatalogData>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route(self, route: Route, booked: impl IntoIterator<Item = SeatId>) -> Self {
        if let Ok(mut data) = self.data.write() {
            data.booked.insert(route.id.clone(), booked.into_iter().collect());
            data.routes.push(route);
        }
        self
    }

    pub fn with_fixture(self, fixture: Fixture, categories: Vec<TicketCategory>) -> Self {
        if let Ok(mut data) = self.data.write() {
            data.fixtures.push(fixture);
            data.categories.extend(categories);
        }
        self
    }

    pub fn with_merchandise(self, item: Merchandise) -> Self {
        if let Ok(mut data) = self.data.write() {
            data.merchandise.push(item);
        }
        self
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, CatalogData> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, CatalogData> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Демо-каталог: три рейса Нью-Йорк -> Вашингтон, два матча, немного мерча.
    pub fn seeded() -> Self {
        let scheme = SeatLabelScheme::RowNumberLetter;
        let mock_booked: Vec<SeatId> = ["1A", "1B", "2C", "3E", "4F", "5H", "6A", "7D", "8G", "9I"]
            .iter()
            .filter_map(|l| scheme.parse(l))
            .collect();
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap_or_default();

        let route = |id: &str, operator: &str, dep: &str, arr: &str, bus: &str, price: i64, original: i64| Route {
            id: id.to_string(),
            operator_name: operator.to_string(),
            from: "New York".to_string(),
            to: "Washington DC".to_string(),
            departure_time: dep.to_string(),
            arrival_time: arr.to_string(),
            duration: "4h 30m".to_string(),
            bus_type: bus.to_string(),
            price: Money::from_major(price),
            original_price: Money::from_major(original),
            date,
            layout: LayoutSpec::standard_bus(),
        };

        let team = |name: &str, short: &str, city: &str, color: &str| Team {
            name: name.to_string(),
            short_name: short.to_string(),
            city: city.to_string(),
            primary_color: Some(color.to_string()),
        };
        let wankhede = Venue {
            name: "Wankhede Stadium".to_string(),
            city: "Mumbai".to_string(),
            state: "Maharashtra".to_string(),
            capacity: 33_108,
        };
        let chepauk = Venue {
            name: "M. A. Chidambaram Stadium".to_string(),
            city: "Chennai".to_string(),
            state: "Tamil Nadu".to_string(),
            capacity: 38_000,
        };
        let mi = team("Mumbai Indians", "MI", "Mumbai", "#004BA0");
        let csk = team("Chennai Super Kings", "CSK", "Chennai", "#F9CD05");
        let rcb = team("Royal Challengers Bengaluru", "RCB", "Bengaluru", "#EC1C24");

        let fixture = |id: &str, t1: &Team, t2: &Team, venue: &Venue, day: u32| Fixture {
            id: id.to_string(),
            team1: t1.clone(),
            team2: t2.clone(),
            venue: venue.clone(),
            match_type: "League".to_string(),
            match_date: Utc
                .with_ymd_and_hms(2025, 4, day, 14, 0, 0)
                .single()
                .unwrap_or_else(Utc::now),
            base_price: Money::from_major(800),
            status: MatchStatus::Upcoming,
        };
        let category = |id: &str, match_id: &str, name: &str, section: Option<&str>, kind: TicketType, price: i64, total: u32, available: u32| TicketCategory {
            id: id.to_string(),
            match_id: match_id.to_string(),
            category_name: name.to_string(),
            section_name: section.map(str::to_string),
            ticket_type: kind,
            price: Money::from_major(price),
            total_seats: total,
            available_seats: available,
        };

        let merch = |id: &str, name: &str, team: &str, price: i64, stock: u32| Merchandise {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            kind: "jersey".to_string(),
            team: Some(team.to_string()),
            price: Money::from_major(price),
            sizes: ["S", "M", "L", "XL"].iter().map(|s| s.to_string()).collect(),
            stock_quantity: stock,
        };

        Self::new()
            .with_route(route("1", "Elite Express", "06:00", "10:30", "AC Sleeper", 75, 85), mock_booked.clone())
            .with_route(route("2", "Comfort Lines", "08:15", "12:45", "AC Seater", 45, 50), mock_booked.clone())
            .with_route(route("3", "Night Rider", "22:30", "03:00", "Non-AC Sleeper", 35, 40), mock_booked)
            .with_fixture(
                fixture("m1", &mi, &csk, &wankhede, 12),
                vec![
                    category("c1", "m1", "General Stand", Some("North Stand"), TicketType::General, 800, 5_000, 1_200),
                    category("c2", "m1", "Premium Pavilion", Some("Garware Pavilion"), TicketType::Premium, 2_500, 1_000, 150),
                    category("c3", "m1", "VIP Box", None, TicketType::Vip, 8_000, 100, 0),
                    category("c4", "m1", "Hospitality Lounge", Some("Level 3"), TicketType::Hospitality, 15_000, 40, 6),
                ],
            )
            .with_fixture(
                fixture("m2", &csk, &rcb, &chepauk, 18),
                vec![
                    category("c5", "m2", "General Stand", Some("East Stand"), TicketType::General, 750, 6_000, 2_400),
                    category("c6", "m2", "Premium Pavilion", None, TicketType::Premium, 2_200, 900, 3),
                ],
            )
            .with_merchandise(merch("p1", "MI Home Jersey 2025", "Mumbai Indians", 2_499, 40))
            .with_merchandise(merch("p2", "CSK Yellow Jersey 2025", "Chennai Super Kings", 2_299, 7))
    }
}

impl Catalog for InMemoryCatalog {
    fn routes(&self) -> Vec<Route> {
        self.read().routes.clone()
    }

    fn route(&self, id: &str) -> Option<Route> {
        self.read().routes.iter().find(|r| r.id == id).cloned()
    }

    fn search_routes(&self, from: Option<&str>, to: Option<&str>) -> Vec<Route> {
        let matches = |field: &str, wanted: Option<&str>| match wanted.map(str::trim) {
            None | Some("") => true,
            Some(w) => field.to_lowercase().contains(&w.to_lowercase()),
        };
        self.read()
            .routes
            .iter()
            .filter(|r| matches(&r.from, from) && matches(&r.to, to))
            .cloned()
            .collect()
    }

    fn booked_seats(&self, route_id: &str) -> Vec<SeatId> {
        self.read()
            .booked
            .get(route_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    fn fixtures(&self) -> Vec<Fixture> {
        let mut fixtures = self.read().fixtures.clone();
        fixtures.sort_by_key(|f| f.match_date);
        fixtures
    }

    fn fixture(&self, id: &str) -> Option<Fixture> {
        self.read().fixtures.iter().find(|f| f.id == id).cloned()
    }

    fn ticket_categories(&self, match_id: &str) -> Vec<TicketCategory> {
        let mut categories: Vec<TicketCategory> = self
            .read()
            .categories
            .iter()
            .filter(|c| c.match_id == match_id && c.available_seats > 0)
            .cloned()
            .collect();
        categories.sort_by_key(|c| c.price);
        categories
    }

    fn ticket_category(&self, id: &str) -> Option<TicketCategory> {
        self.read().categories.iter().find(|c| c.id == id).cloned()
    }

    fn merchandise(&self) -> Vec<Merchandise> {
        self.read().merchandise.clone()
    }

    fn place_merchandise_order(&self, req: &MerchandiseOrderRequest) -> Result<MerchandiseOrder, CatalogError> {
        let mut data = self.write();
        let item = data
            .merchandise
            .iter_mut()
            .find(|m| m.id == req.merchandise_id)
            .ok_or_else(|| CatalogError::UnknownMerchandise(req.merchandise_id.clone()))?;

        if !item.sizes.iter().any(|s| s == &req.size) {
            return Err(CatalogError::UnknownSize(req.size.clone()));
        }
        if item.stock_quantity < req.quantity {
            return Err(CatalogError::OutOfStock {
                available: item.stock_quantity,
                requested: req.quantity,
            });
        }

        item.stock_quantity -= req.quantity;
        if item.is_low_stock() {
            warn!("merchandise {} is low on stock: {} left", item.id, item.stock_quantity);
        }
        let order = MerchandiseOrder {
            id: Uuid::new_v4(),
            merchandise_id: item.id.clone(),
            size: req.size.clone(),
            quantity: req.quantity,
            total_amount: item.price * req.quantity,
            order_status: "confirmed".to_string(),
            created_at: Utc::now(),
        };
        data.orders.push(order.clone());
        info!("merchandise order {} placed ({} x {})", order.id, order.quantity, order.merchandise_id);
        Ok(order)
    }

    fn commit_booking(&self, record: BookingRecord) -> Result<BookingRecord, CatalogError> {
        let mut data = self.write();

        if let Some(existing) = data.bookings.iter().find(|b| b.payment_id == record.payment_id) {
            warn!("payment {} already committed as {}", record.payment_id, existing.booking_reference);
            return Ok(existing.clone());
        }

        match &record.item {
            BookedItem::Bus { route_id, seats } => {
                let route = data
                    .routes
                    .iter()
                    .find(|r| &r.id == route_id)
                    .cloned()
                    .ok_or_else(|| CatalogError::UnknownRoute(route_id.clone()))?;
                let scheme = route.layout.scheme;
                let ids: Vec<SeatId> = seats.iter().filter_map(|l| scheme.parse_lenient(l)).collect();

                let booked = data.booked.entry(route_id.clone()).or_default();
                let taken: Vec<String> = ids
                    .iter()
                    .filter(|id| booked.contains(id))
                    .map(|id| scheme.format(*id))
                    .collect();
                if !taken.is_empty() {
                    return Err(CatalogError::SeatsTaken(taken));
                }
                booked.extend(ids);
            }
            BookedItem::Match { ticket_category_id, quantity, .. } => {
                let category = data
                    .categories
                    .iter_mut()
                    .find(|c| &c.id == ticket_category_id)
                    .ok_or_else(|| CatalogError::UnknownCategory(ticket_category_id.clone()))?;
                if category.available_seats < *quantity {
                    return Err(CatalogError::InsufficientSeats {
                        available: category.available_seats,
                        requested: *quantity,
                    });
                }
                category.available_seats -= quantity;
            }
        }

        info!("booking {} committed", record.booking_reference);
        data.bookings.push(record.clone());
        Ok(record)
    }

    fn booking(&self, reference: &str) -> Option<BookingRecord> {
        self.read()
            .bookings
            .iter()
            .find(|b| b.booking_reference == reference)
            .cloned()
    }

    fn bookings(&self) -> Vec<BookingRecord> {
        let mut bookings = self.read().bookings.clone();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        bookings
    }
}
