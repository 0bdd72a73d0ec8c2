//! seat_map.rs
//!
//! Построение схемы мест для рейса: полный перебор рядов и мест в порядке
//! "ряд за рядом", с пометкой уже проданных мест. Схема строится один раз на
//! сессию и дальше не меняется.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::models::{LayoutSpec, Seat, SeatId, SeatLabelScheme, SeatView};
use super::selection::Selection;

#[derive(Debug, Clone)]
pub struct SeatMap {
    layout: LayoutSpec,
    seats: Vec<Seat>,
    index: HashMap<SeatId, usize>,
}

/// Ряд для отрисовки, разбитый проходами на сегменты.
#[derive(Debug, Clone, Serialize)]
pub struct RowView {
    pub row: u16,
    pub segments: Vec<Vec<SeatView>>,
}

impl SeatMap {
    /// Строит схему. Проданные места вне схемы игнорируются; пустая схема (0 рядов
    /// или 0 мест) даёт пустую карту.
    pub fn build<I>(layout: &LayoutSpec, booked: I) -> Self
    where
        I: IntoIterator<Item = SeatId>,
    {
        let booked: HashSet<SeatId> = booked.into_iter().collect();
        let mut seats = Vec::with_capacity(layout.capacity());
        let mut index = HashMap::with_capacity(layout.capacity());

        for row in 1..=layout.rows {
            for column in 1..=layout.seats_per_row {
                let id = SeatId::new(row, column);
                index.insert(id, seats.len());
                seats.push(Seat {
                    id,
                    label: layout.scheme.format(id),
                    is_booked: booked.contains(&id),
                });
            }
        }

        Self {
            layout: layout.clone(),
            seats,
            index,
        }
    }

    pub fn layout(&self) -> &LayoutSpec {
        &self.layout
    }

    pub fn scheme(&self) -> SeatLabelScheme {
        self.layout.scheme
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn get(&self, id: SeatId) -> Option<&Seat> {
        self.index.get(&id).map(|&i| &self.seats[i])
    }

    pub fn contains(&self, id: SeatId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn is_booked(&self, id: SeatId) -> bool {
        self.get(id).is_some_and(|s| s.is_booked)
    }

    pub fn available_count(&self) -> usize {
        self.seats.iter().filter(|s| !s.is_booked).count()
    }

    pub fn booked_count(&self) -> usize {
        self.seats.len() - self.available_count()
    }

    /// Метка -> идентификатор места, присутствующего в схеме.
    pub fn resolve(&self, label: &str) -> Option<SeatId> {
        self.scheme()
            .parse_lenient(label)
            .filter(|id| self.contains(*id))
    }

    pub fn label(&self, id: SeatId) -> String {
        self.get(id)
            .map(|s| s.label.clone())
            .unwrap_or_else(|| self.scheme().format(id))
    }

    pub fn view(&self, selection: &Selection) -> Vec<SeatView> {
        self.seats
            .iter()
            .map(|seat| SeatView {
                label: seat.label.clone(),
                row: seat.id.row,
                column: seat.id.column,
                is_booked: seat.is_booked,
                is_selected: selection.contains(seat.id),
            })
            .collect()
    }

    /// Места по рядам с разбиением на сегменты по проходам.
    pub fn rows(&self, selection: &Selection) -> Vec<RowView> {
        let per_row = self.layout.seats_per_row as usize;
        if per_row == 0 {
            return Vec::new();
        }

        self.view(selection)
            .chunks(per_row)
            .map(|chunk| {
                let row = chunk.first().map(|s| s.row).unwrap_or_default();
                let mut segments: Vec<Vec<SeatView>> = vec![Vec::new()];
                for seat in chunk {
                    if let Some(current) = segments.last_mut() {
                        current.push(seat.clone());
                    }
                    if self.layout.aisles_after.contains(&seat.column)
                        && seat.column < self.layout.seats_per_row
                    {
                        segments.push(Vec::new());
                    }
                }
                RowView { row, segments }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_booked(scheme: SeatLabelScheme) -> Vec<SeatId> {
        ["1A", "1B", "2C", "3E", "4F", "5H", "6A", "7D", "8G", "9I"]
            .iter()
            .filter_map(|l| scheme.parse(l))
            .collect()
    }

    #[test]
    fn builds_every_seat_once_in_row_major_order() {
        let layout = LayoutSpec::standard_bus();
        let map = SeatMap::build(&layout, mock_booked(layout.scheme));

        assert_eq!(map.len(), 100);
        assert_eq!(map.seats()[0].label, "1A");
        assert_eq!(map.seats()[9].label, "1J");
        assert_eq!(map.seats()[10].label, "2A");
        assert_eq!(map.seats()[99].label, "10J");

        let unique: HashSet<_> = map.seats().iter().map(|s| s.id).collect();
        assert_eq!(unique.len(), 100);
    }

    #[test]
    fn marks_booked_seats() {
        let layout = LayoutSpec::standard_bus();
        let map = SeatMap::build(&layout, mock_booked(layout.scheme));

        assert_eq!(map.booked_count(), 10);
        assert!(map.is_booked(SeatId::new(1, 1)));
        assert!(map.is_booked(SeatId::new(9, 9)));
        assert!(!map.is_booked(SeatId::new(1, 3)));
    }

    #[test]
    fn empty_layout_builds_empty_map() {
        assert!(SeatMap::build(&LayoutSpec::new(0, 10), vec![]).is_empty());
        assert!(SeatMap::build(&LayoutSpec::new(5, 0), vec![]).is_empty());
    }

    #[test]
    fn booked_ids_outside_layout_are_ignored() {
        let map = SeatMap::build(&LayoutSpec::new(2, 2), vec![SeatId::new(7, 7)]);
        assert_eq!(map.len(), 4);
        assert_eq!(map.booked_count(), 0);
    }

    #[test]
    fn resolve_accepts_legacy_labels_inside_layout_only() {
        let map = SeatMap::build(&LayoutSpec::new(3, 4), vec![]);
        assert_eq!(map.resolve("2B"), Some(SeatId::new(2, 2)));
        assert_eq!(map.resolve("B2"), Some(SeatId::new(2, 2)));
        assert_eq!(map.resolve("4A"), None);
        assert_eq!(map.resolve("1E"), None);
    }

    #[test]
    fn letter_number_scheme_labels() {
        let layout = LayoutSpec::new(2, 3).with_scheme(SeatLabelScheme::RowLetterNumber);
        let map = SeatMap::build(&layout, vec![]);
        let labels: Vec<_> = map.seats().iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["A1", "A2", "A3", "B1", "B2", "B3"]);
    }

    #[test]
    fn rows_split_on_aisles() {
        let map = SeatMap::build(&LayoutSpec::standard_bus(), vec![]);
        let rows = map.rows(&Selection::new(4));

        assert_eq!(rows.len(), 10);
        let sizes: Vec<_> = rows[0].segments.iter().map(|s| s.len()).collect();
        assert_eq!(sizes, vec![2, 4, 4]);
    }
}
