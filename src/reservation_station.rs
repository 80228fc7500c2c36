// reservation_station.rs
//
// One slot in the issue window, and the bank of stations grouped by
// instruction category. Station ids are globally unique and stable for
// the life of the bank; id 0 is reserved as "no producer" (see
// `registers::NO_PRODUCER`).

use crate::instruction::{Category, Op};
use crate::registers::NO_PRODUCER;

#[derive(Debug, Clone)]
pub struct ReservationStation {
    pub name: String,
    pub id: usize,
    pub busy: bool,
    pub op: Option<Op>,
    pub vj: u16,
    pub vk: u16,
    pub qj: usize,
    pub qk: usize,
    /// Immediate on issue; becomes the effective address for LOAD/STORE
    /// once address resolution completes.
    pub a: i64,
    pub cycles_for_exec: usize,
    pub cycles_for_addr: usize,
    pub rem_cycles_exec: usize,
    pub rem_cycles_addr: usize,
    pub inst_index: usize,
    pub result: u16,
}

impl ReservationStation {
    pub fn new(name: String, id: usize, cycles_for_exec: usize, cycles_for_addr: usize) -> Self {
        Self {
            name,
            id,
            busy: false,
            op: None,
            vj: 0,
            vk: 0,
            qj: NO_PRODUCER,
            qk: NO_PRODUCER,
            a: 0,
            cycles_for_exec,
            cycles_for_addr,
            rem_cycles_exec: 0,
            rem_cycles_addr: 0,
            inst_index: 0,
            result: 0,
        }
    }

}

/// A vector of stations of one category, plus its static station-name prefix.
pub struct StationGroup {
    pub stations: Vec<ReservationStation>,
}

/// The full station bank, indexed by `Category::ordinal()`, plus the
/// id -> (category, slot) lookup used by write-back and flush.
pub struct StationBank {
    groups: Vec<StationGroup>,
    lookup: Vec<(usize, usize)>, // indexed by id - 1
}

impl StationBank {
    pub fn new(counts: &[(usize, usize, usize)]) -> Self {
        assert_eq!(counts.len(), Category::ALL.len());
        let mut groups = Vec::with_capacity(counts.len());
        let mut lookup = Vec::new();
        let mut next_id = 1usize;
        for (cat, &(count, cycles_for_exec, cycles_for_addr)) in Category::ALL.iter().zip(counts) {
            let mut stations = Vec::with_capacity(count);
            for slot in 0..count {
                let name = format!("{cat}{}", slot + 1);
                stations.push(ReservationStation::new(name, next_id, cycles_for_exec, cycles_for_addr));
                lookup.push((cat.ordinal(), slot));
                next_id += 1;
            }
            groups.push(StationGroup { stations });
        }
        Self { groups, lookup }
    }

    pub fn group(&self, category: Category) -> &[ReservationStation] {
        &self.groups[category.ordinal()].stations
    }

    pub fn group_mut(&mut self, category: Category) -> &mut Vec<ReservationStation> {
        &mut self.groups[category.ordinal()].stations
    }

    pub fn station(&self, id: usize) -> &ReservationStation {
        let (cat, slot) = self.lookup[id - 1];
        &self.groups[cat].stations[slot]
    }

    pub fn station_mut(&mut self, id: usize) -> &mut ReservationStation {
        let (cat, slot) = self.lookup[id - 1];
        &mut self.groups[cat].stations[slot]
    }

    pub fn category_of(&self, id: usize) -> Category {
        Category::ALL[self.lookup[id - 1].0]
    }

    /// First non-busy station in the category, in ascending slot (ascending
    /// id) order — deterministic, so issue order is reproducible.
    pub fn find_free(&mut self, category: Category) -> Option<usize> {
        self.group_mut(category)
            .iter()
            .position(|s| !s.busy)
    }

    pub fn iter_all(&self) -> impl Iterator<Item = &ReservationStation> {
        self.groups.iter().flat_map(|g| g.stations.iter())
    }

    pub fn iter_all_mut(&mut self) -> impl Iterator<Item = &mut ReservationStation> {
        self.groups.iter_mut().flat_map(|g| g.stations.iter_mut())
    }

    pub fn categories_in_order(&self) -> impl Iterator<Item = Category> {
        Category::ALL.into_iter()
    }
}
