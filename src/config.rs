// config.rs
//
// The hardware configuration: how many reservation stations of each
// category exist, and their static latencies. Either the documented
// defaults, or parsed from a seven-line text file.

use crate::errors::SimulatorError;
use crate::instruction::Category;

#[derive(Debug, Clone, Copy)]
pub struct StationConfig {
    pub count: usize,
    pub cycles_for_exec: usize,
    pub cycles_for_addr: usize,
}

#[derive(Debug, Clone)]
pub struct HardwareConfig {
    /// Indexed by `Category::ordinal()`, in the fixed order
    /// LOAD, STORE, BEQ, JUMP, ADDITION, MUL, NOR.
    stations: [StationConfig; 7],
}

impl HardwareConfig {
    pub fn station(&self, category: Category) -> StationConfig {
        self.stations[category.ordinal()]
    }

    pub fn as_tuples(&self) -> Vec<(usize, usize, usize)> {
        self.stations
            .iter()
            .map(|s| (s.count, s.cycles_for_exec, s.cycles_for_addr))
            .collect()
    }

    /// The documented defaults: LOAD 2x(2,4); STORE 2x(2,4); BEQ 2x(1);
    /// JUMP 1x(1); ADD 4x(2); MUL 2x(10); NOR 2x(1).
    pub fn default_config() -> Self {
        Self {
            stations: [
                StationConfig { count: 2, cycles_for_exec: 2, cycles_for_addr: 4 }, // LOAD
                StationConfig { count: 2, cycles_for_exec: 2, cycles_for_addr: 4 }, // STORE
                StationConfig { count: 2, cycles_for_exec: 1, cycles_for_addr: 0 }, // BEQ
                StationConfig { count: 1, cycles_for_exec: 1, cycles_for_addr: 0 }, // JUMP
                StationConfig { count: 4, cycles_for_exec: 2, cycles_for_addr: 0 }, // ADDITION
                StationConfig { count: 2, cycles_for_exec: 10, cycles_for_addr: 0 }, // MUL
                StationConfig { count: 2, cycles_for_exec: 1, cycles_for_addr: 0 }, // NOR
            ],
        }
    }

    pub fn parse(text: &str) -> Result<Self, SimulatorError> {
        let rows: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .collect();

        if rows.len() != 7 {
            return Err(SimulatorError::MalformedConfiguration(format!(
                "expected 7 category rows (LOAD, STORE, BEQ, JUMP, ADD, MUL, NOR), found {}",
                rows.len()
            )));
        }

        let mut stations = [StationConfig { count: 0, cycles_for_exec: 0, cycles_for_addr: 0 }; 7];
        for (i, row) in rows.iter().enumerate() {
            let fields: Vec<i64> = row
                .split_whitespace()
                .map(|f| {
                    f.parse::<i64>().map_err(|_| {
                        SimulatorError::MalformedConfiguration(format!(
                            "row {} (\"{}\") is not all integers",
                            i + 1,
                            row
                        ))
                    })
                })
                .collect::<Result<_, _>>()?;

            if fields.len() < 2 || fields.len() > 3 {
                return Err(SimulatorError::MalformedConfiguration(format!(
                    "row {} must have 2 or 3 fields, found {}",
                    i + 1,
                    fields.len()
                )));
            }
            let count = fields[0];
            let cycles_for_exec = fields[1];
            let cycles_for_addr = fields.get(2).copied().unwrap_or(0);
            if count <= 0 || cycles_for_exec < 0 || cycles_for_addr < 0 {
                return Err(SimulatorError::MalformedConfiguration(format!(
                    "row {} has a non-positive station count or negative latency",
                    i + 1
                )));
            }

            stations[i] = StationConfig {
                count: count as usize,
                cycles_for_exec: cycles_for_exec as usize,
                cycles_for_addr: cycles_for_addr as usize,
            };
        }

        Ok(Self { stations })
    }
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self::default_config()
    }
}
