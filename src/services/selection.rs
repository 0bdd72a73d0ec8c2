use serde::Serialize;

use crate::models::SeatId;
use super::seat_map::SeatMap;

pub const DEFAULT_MAX_SEATS: usize = 4;

/// Результат нажатия на место. Отказ не меняет выбор.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOutcome {
    Selected,
    Deselected,
    Rejected(RejectReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    UnknownSeat,
    Booked,
    CapReached,
}

impl ToggleOutcome {
    pub fn is_accepted(self) -> bool {
        !matches!(self, ToggleOutcome::Rejected(_))
    }
}

/// Выбранные места в порядке выбора, без повторов, не больше `max_seats`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    seats: Vec<SeatId>,
    max_seats: usize,
}

impl Default for Selection {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SEATS)
    }
}

impl Selection {
    pub fn new(max_seats: usize) -> Self {
        Self {
            seats: Vec::new(),
            max_seats,
        }
    }

    pub fn toggle(&mut self, seat: SeatId, map: &SeatMap) -> ToggleOutcome {
        match map.get(seat) {
            None => return ToggleOutcome::Rejected(RejectReason::UnknownSeat),
            Some(s) if s.is_booked => return ToggleOutcome::Rejected(RejectReason::Booked),
            Some(_) => {}
        }

        if let Some(pos) = self.seats.iter().position(|s| *s == seat) {
            self.seats.remove(pos);
            return ToggleOutcome::Deselected;
        }

        if self.seats.len() >= self.max_seats {
            return ToggleOutcome::Rejected(RejectReason::CapReached);
        }

        self.seats.push(seat);
        ToggleOutcome::Selected
    }

    pub fn contains(&self, seat: SeatId) -> bool {
        self.seats.contains(&seat)
    }

    pub fn seats(&self) -> &[SeatId] {
        &self.seats
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn max_seats(&self) -> usize {
        self.max_seats
    }

    pub fn remaining(&self) -> usize {
        self.max_seats.saturating_sub(self.seats.len())
    }

    pub fn clear(&mut self) {
        self.seats.clear();
    }
}

/// Функциональная форма: возвращает новый выбор, не трогая текущий.
pub fn toggle(seat: SeatId, map: &SeatMap, max_seats: usize, current: &[SeatId]) -> Vec<SeatId> {
    let mut selection = Selection {
        seats: current.to_vec(),
        max_seats,
    };
    selection.toggle(seat, map);
    selection.seats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LayoutSpec, SeatLabelScheme};

    fn bus_map() -> SeatMap {
        let scheme = SeatLabelScheme::RowNumberLetter;
        let booked = ["1C", "5E"].iter().filter_map(|l| scheme.parse(l));
        SeatMap::build(&LayoutSpec::standard_bus(), booked)
    }

    fn id(map: &SeatMap, label: &str) -> SeatId {
        map.resolve(label).unwrap()
    }

    #[test]
    fn cap_rejects_fifth_seat() {
        let map = bus_map();
        let mut sel = Selection::new(4);
        for label in ["1A", "1B", "2C", "2D"] {
            assert_eq!(sel.toggle(id(&map, label), &map), ToggleOutcome::Selected);
        }
        let before = sel.clone();

        assert_eq!(
            sel.toggle(id(&map, "3E"), &map),
            ToggleOutcome::Rejected(RejectReason::CapReached)
        );
        assert_eq!(sel, before);
        let labels: Vec<_> = sel.seats().iter().map(|s| map.label(*s)).collect();
        assert_eq!(labels, vec!["1A", "1B", "2C", "2D"]);
        assert_eq!(sel.remaining(), 0);
    }

    #[test]
    fn booked_seat_is_never_selected() {
        let map = bus_map();
        let mut sel = Selection::new(4);
        assert_eq!(
            sel.toggle(id(&map, "1C"), &map),
            ToggleOutcome::Rejected(RejectReason::Booked)
        );
        assert!(sel.is_empty());
    }

    #[test]
    fn unknown_seat_is_rejected() {
        let map = bus_map();
        let mut sel = Selection::new(4);
        assert_eq!(
            sel.toggle(SeatId::new(11, 1), &map),
            ToggleOutcome::Rejected(RejectReason::UnknownSeat)
        );
        assert!(sel.is_empty());
    }

    #[test]
    fn toggle_round_trips_membership() {
        let map = bus_map();
        let seat = id(&map, "4B");
        let mut sel = Selection::new(4);

        assert_eq!(sel.toggle(seat, &map), ToggleOutcome::Selected);
        assert_eq!(sel.toggle(seat, &map), ToggleOutcome::Deselected);
        assert!(!sel.contains(seat));
        assert_eq!(sel.toggle(seat, &map), ToggleOutcome::Selected);
        assert!(sel.contains(seat));
    }

    #[test]
    fn deselect_allowed_at_cap_and_keeps_order() {
        let map = bus_map();
        let mut sel = Selection::new(2);
        sel.toggle(id(&map, "2A"), &map);
        sel.toggle(id(&map, "2B"), &map);
        assert_eq!(sel.toggle(id(&map, "2A"), &map), ToggleOutcome::Deselected);
        sel.toggle(id(&map, "3A"), &map);

        assert_eq!(sel.seats(), &[id(&map, "2B"), id(&map, "3A")]);
    }

    #[test]
    fn huge_cap_means_unlimited() {
        let map = bus_map();
        let mut sel = Selection::new(1_000_000_000_000);
        assert_eq!(sel.toggle(id(&map, "7A"), &map), ToggleOutcome::Selected);
        assert_eq!(sel.len(), 1);
        assert_eq!(sel.remaining(), 999_999_999_999);
    }

    #[test]
    fn functional_toggle_leaves_input_untouched() {
        let map = bus_map();
        let current = vec![id(&map, "6B")];
        let next = toggle(id(&map, "6C"), &map, 4, &current);
        assert_eq!(current.len(), 1);
        assert_eq!(next, vec![id(&map, "6B"), id(&map, "6C")]);
    }
}
