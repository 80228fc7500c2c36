// engine.rs
//
// The scheduling engine: the per-cycle Issue / Execute / Write-Back driver,
// the broadcast and flush policies, and PC redirection. This is the core
// of the simulator; every other module exists to feed it or read from it.

use log::debug;
use serde::Serialize;

use crate::config::HardwareConfig;
use crate::errors::SimulatorError;
use crate::instruction::{Category, Instruction, Op};
use crate::memory::Memory;
use crate::order_queue::LoadStoreQueue;
use crate::registers::{RegisterFile, RenameTable, NO_PRODUCER, NUM_REGISTERS};
use crate::reservation_station::StationBank;
use crate::speculation::SpeculationStack;

pub struct Engine {
    pub program: Vec<Instruction>,
    bank: StationBank,
    registers: RegisterFile,
    rename: RenameTable,
    lsq: LoadStoreQueue,
    spec_stack: SpeculationStack,
    memory: Memory,
    pc: usize,
    cycle: usize,

    written: usize,
    beq_count: usize,
    mispredictions: usize,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct EngineStats {
    pub cycle: usize,
    pub written: usize,
    pub beq: usize,
    pub mispredictions: usize,
    pub ipc: f64,
}

impl Engine {
    pub fn new(program: Vec<Instruction>, config: &HardwareConfig, memory: Memory, initial_pc: usize) -> Self {
        Self {
            program,
            bank: StationBank::new(&config.as_tuples()),
            registers: RegisterFile::new(),
            rename: RenameTable::new(),
            lsq: LoadStoreQueue::new(),
            spec_stack: SpeculationStack::new(),
            memory,
            pc: initial_pc,
            cycle: 1,
            written: 0,
            beq_count: 0,
            mispredictions: 0,
        }
    }

    // ---- Read-only observers -------------------------------------------------

    pub fn cycle(&self) -> usize {
        self.cycle
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    pub fn rename_table(&self) -> &RenameTable {
        &self.rename
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn stations(&self) -> impl Iterator<Item = &crate::reservation_station::ReservationStation> {
        self.bank.iter_all()
    }

    pub fn is_terminated(&self) -> bool {
        self.pc >= self.program.len() && !self.bank.iter_all().any(|s| s.busy)
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            cycle: self.cycle,
            written: self.written,
            beq: self.beq_count,
            mispredictions: self.mispredictions,
            ipc: if self.cycle > 0 {
                self.written as f64 / self.cycle as f64
            } else {
                0.0
            },
        }
    }

    // ---- Driver ----------------------------------------------------------

    /// Advances exactly one cycle: Issue, then Execute (sub-phase A then B),
    /// then Write-Back, then the cycle counter is incremented.
    pub fn step(&mut self) -> Result<(), SimulatorError> {
        if self.pc < self.program.len() {
            self.issue();
        }
        self.execute_arithmetic();
        self.execute_memory()?;
        self.write_back()?;
        self.cycle += 1;
        Ok(())
    }

    pub fn run_to_completion(&mut self) -> Result<(), SimulatorError> {
        while !self.is_terminated() {
            self.step()?;
        }
        Ok(())
    }

    // ---- Issue -------------------------------------------------------------

    fn issue(&mut self) {
        let idx = self.pc;
        let category = self.program[idx].category;

        let Some(slot) = self.bank.find_free(category) else {
            // Structural stall: no free station, PC does not advance.
            return;
        };
        let station_id = self.bank.group(category)[slot].id;

        let instr = &self.program[idx];
        let rd = instr.rd;
        let rs = instr.rs;
        let rt = instr.rt;
        let imm = instr.imm as i64;

        let (qj, vj) = match self.rename.get(rs) {
            NO_PRODUCER => (NO_PRODUCER, self.registers.read(rs)),
            producer => (producer, 0),
        };
        let (qk, vk) = match self.rename.get(rt) {
            NO_PRODUCER => (NO_PRODUCER, self.registers.read(rt)),
            producer => (producer, 0),
        };

        {
            let station = &mut self.bank.group_mut(category)[slot];
            station.busy = true;
            station.op = instr.op;
            station.inst_index = idx;
            station.a = imm;
            station.rem_cycles_exec = station.cycles_for_exec;
            station.rem_cycles_addr = station.cycles_for_addr;
            station.qj = qj;
            station.vj = vj;
            station.qk = qk;
            station.vk = vk;
        }

        // Rename destination: while one or more branches/jumps are in
        // flight, the write targets the top snapshot instead of the live
        // table. A second in-flight speculative producer is therefore
        // invisible to its dependents, which still consult the live table
        // when looking up their own source operands. Kept as-is rather
        // than corrected.
        if rd != 0 {
            match self.spec_stack.top_mut() {
                Some(top) => top.rename_table.set(rd, station_id),
                None => self.rename.set(rd, station_id),
            }
        }

        if category.is_memory() {
            self.lsq.push(idx);
        }

        if category.is_control() {
            let snapshot = match self.spec_stack.top_mut() {
                Some(top) => top.rename_table.clone(),
                None => self.rename.clone(),
            };
            self.spec_stack.push(self.cycle, snapshot);
        }

        self.program[idx].issue = self.cycle;
        self.pc += 1;
        debug!("cycle {}: issue {} -> {}", self.cycle, idx, self.bank.station(station_id).name);
    }

    // ---- Execute, sub-phase A: arithmetic/control --------------------------

    fn execute_arithmetic(&mut self) {
        for category in [Category::Beq, Category::Jump, Category::Addition, Category::Mul, Category::Nor] {
            for station_idx in 0..self.bank.group(category).len() {
                let inst_index = {
                    let s = &self.bank.group(category)[station_idx];
                    if !s.busy {
                        continue;
                    }
                    s.inst_index
                };
                let issue_cycle = self.program[inst_index].issue;
                if issue_cycle >= self.cycle {
                    continue;
                }
                if let Some(front) = self.spec_stack.front() {
                    if issue_cycle > front.issue_cycle {
                        continue;
                    }
                }

                let station = &mut self.bank.group_mut(category)[station_idx];
                if station.qj != NO_PRODUCER || station.qk != NO_PRODUCER || station.rem_cycles_exec == 0 {
                    continue;
                }
                if station.rem_cycles_exec == station.cycles_for_exec && self.program[inst_index].exec_start == 0 {
                    self.program[inst_index].exec_start = self.cycle;
                }
                station.rem_cycles_exec -= 1;
                if station.rem_cycles_exec == 0 {
                    let result = compute_result(category, station.op, station.vj, station.vk, station.a, inst_index);
                    station.result = result;
                    self.program[inst_index].exec_end = self.cycle;
                }
            }
        }
    }

    // ---- Execute, sub-phase B: memory ---------------------------------------

    fn execute_memory(&mut self) -> Result<(), SimulatorError> {
        let mut pop_queue = false;

        for category in [Category::Load, Category::Store] {
            for station_idx in 0..self.bank.group(category).len() {
                let inst_index = {
                    let s = &self.bank.group(category)[station_idx];
                    if !s.busy {
                        continue;
                    }
                    s.inst_index
                };
                let issue_cycle = self.program[inst_index].issue;
                if issue_cycle >= self.cycle {
                    continue;
                }
                if let Some(front) = self.spec_stack.front() {
                    if issue_cycle > front.issue_cycle {
                        continue;
                    }
                }

                let rem_addr = self.bank.group(category)[station_idx].rem_cycles_addr;
                if rem_addr > 0 {
                    let (qj, own_index) = {
                        let s = &self.bank.group(category)[station_idx];
                        (s.qj, s.inst_index)
                    };
                    if qj != NO_PRODUCER || self.lsq.head() != Some(own_index) {
                        continue;
                    }
                    let station = &mut self.bank.group_mut(category)[station_idx];
                    if station.rem_cycles_addr == station.cycles_for_addr && self.program[inst_index].exec_start == 0 {
                        self.program[inst_index].exec_start = self.cycle;
                    }
                    station.rem_cycles_addr -= 1;
                    if station.rem_cycles_addr == 0 {
                        station.a = station.vj as i64 + station.a;
                        if category == Category::Load {
                            station.result = self.memory.read(station.a)?;
                        }
                        pop_queue = true;
                    }
                } else {
                    let rem_exec = self.bank.group(category)[station_idx].rem_cycles_exec;
                    if rem_exec == 0 {
                        continue;
                    }
                    let (own_a, own_issue) = {
                        let s = &self.bank.group(category)[station_idx];
                        (s.a, self.program[s.inst_index].issue)
                    };

                    // A single "unfinished older memory op at the same address
                    // stalls me" check stands in for separate WAW and RAW
                    // tests, which come out behaviorally equivalent anyway.
                    let mut stalled = false;
                    for store in self.bank.group(Category::Store) {
                        if store.busy
                            && store.rem_cycles_exec != 0
                            && self.program[store.inst_index].issue < own_issue
                            && store.a == own_a
                        {
                            stalled = true;
                            break;
                        }
                    }
                    if category == Category::Store && !stalled {
                        for load in self.bank.group(Category::Load) {
                            if load.busy
                                && load.rem_cycles_exec != 0
                                && self.program[load.inst_index].issue < own_issue
                                && load.a == own_a
                            {
                                stalled = true;
                                break;
                            }
                        }
                    }

                    if !stalled {
                        let station = &mut self.bank.group_mut(category)[station_idx];
                        station.rem_cycles_exec -= 1;
                        if station.rem_cycles_exec == 0 {
                            self.program[inst_index].exec_end = self.cycle;
                            if category == Category::Load {
                                let addr = station.a;
                                station.result = self.memory.read(addr)?;
                            }
                        }
                    }
                }
            }
        }

        if pop_queue {
            self.lsq.pop_head();
        }
        Ok(())
    }

    // ---- Write-Back ---------------------------------------------------------

    fn write_back(&mut self) -> Result<(), SimulatorError> {
        let (store_id, other_id) = self.find_writeback_candidates();

        if let Some(id) = store_id {
            self.retire_store(id)?;
        }
        if let Some(id) = other_id {
            self.retire_other(id);
        }
        Ok(())
    }

    /// Scans every eligible station once, in category order, keeping a
    /// single running minimum issue cycle shared between the STORE and
    /// non-STORE winners rather than two independent minima. A STORE
    /// found earlier in the scan with a lower issue cycle raises the bar
    /// high enough to keep a later, otherwise-eligible non-STORE candidate
    /// from winning its own slot this cycle, and vice versa.
    fn find_writeback_candidates(&self) -> (Option<usize>, Option<usize>) {
        let mut store_id = None;
        let mut other_id = None;
        let mut min_issue = usize::MAX;

        for category in self.bank.categories_in_order() {
            let is_store = category == Category::Store;
            for station in self.bank.group(category) {
                if !station.busy || station.rem_cycles_exec != 0 {
                    continue;
                }
                let instr = &self.program[station.inst_index];
                if instr.exec_end >= self.cycle {
                    continue;
                }
                if is_store && station.qk != NO_PRODUCER {
                    continue;
                }
                let issue_cycle = instr.issue;
                if issue_cycle < min_issue {
                    min_issue = issue_cycle;
                    if is_store {
                        store_id = Some(station.id);
                    } else {
                        other_id = Some(station.id);
                    }
                }
            }
        }
        (store_id, other_id)
    }

    fn retire_store(&mut self, id: usize) -> Result<(), SimulatorError> {
        let (inst_index, addr, value) = {
            let station = self.bank.station_mut(id);
            station.busy = false;
            (station.inst_index, station.a, station.vk)
        };
        self.program[inst_index].write_back = self.cycle;
        self.memory.write(addr, value)?;
        self.written += 1;
        debug!("cycle {}: write-back (store) {} -> mem[{}]={}", self.cycle, id, addr, value);
        Ok(())
    }

    fn retire_other(&mut self, id: usize) {
        let category = self.bank.category_of(id);
        let (inst_index, op, a, vj, result) = {
            let station = self.bank.station_mut(id);
            station.busy = false;
            (station.inst_index, station.op, station.a, station.vj, station.result)
        };
        self.program[inst_index].write_back = self.cycle;
        self.written += 1;
        debug!("cycle {}: write-back {} [{}]", self.cycle, id, category);

        match category {
            Category::Jump => {
                if op == Some(Op::Call) {
                    self.pc = (a + inst_index as i64 + 1) as usize;
                    self.registers.write(1, a as u16);
                } else {
                    self.pc = vj as usize;
                }
                self.spec_stack.clear();
                self.flush(self.program[inst_index].issue);
            },
            Category::Beq => {
                self.beq_count += 1;
                let issue = self.program[inst_index].issue;
                if result == 1 {
                    self.pc = (inst_index as i64 + 1 + a) as usize;
                    self.mispredictions += 1;
                    self.spec_stack.clear();
                    self.flush(issue);
                } else if let Some(snapshot) = self.spec_stack.pop_front() {
                    self.rename.overwrite_all(&snapshot.rename_table);
                }
            },
            _ => {},
        }

        // Every retiring station except BEQ writes its register (if any)
        // and broadcasts — including JUMP, whose generic register write
        // runs in addition to CALL's direct `registers[1] := a` above, so
        // the conventional return address (`result`) is what actually
        // sticks in R1.
        if category != Category::Beq {
            for reg in 1..NUM_REGISTERS as u8 {
                if self.rename.get(reg) == id {
                    self.registers.write(reg, result);
                    self.rename.clear(reg);
                }
            }
            self.broadcast(id, result);
        }
    }

    fn broadcast(&mut self, producer_id: usize, result: u16) {
        let cycle = self.cycle;
        for station in self.bank.iter_all_mut() {
            if !station.busy {
                continue;
            }
            let mut resolved_this_cycle = false;
            if station.qj == producer_id {
                station.qj = NO_PRODUCER;
                station.vj = result;
                resolved_this_cycle = true;
            }
            if station.qk == producer_id {
                station.qk = NO_PRODUCER;
                station.vk = result;
                resolved_this_cycle = true;
            }
            if resolved_this_cycle && station.qj == NO_PRODUCER && station.qk == NO_PRODUCER {
                let instr = &mut self.program[station.inst_index];
                if instr.exec_start == 0 {
                    instr.exec_start = cycle;
                }
            }
        }
    }

    fn flush(&mut self, pivot_issue: usize) {
        let program = &self.program;
        let mut flushed_ids = Vec::new();
        for station in self.bank.iter_all_mut() {
            if station.busy && program[station.inst_index].issue > pivot_issue {
                station.busy = false;
                flushed_ids.push(station.id);
            }
        }
        for id in flushed_ids {
            self.rename.clear_producer(id);
        }
        let program = &self.program;
        self.lsq.retain_issued_at_or_before(pivot_issue, |idx| program[idx].issue);
    }
}

fn compute_result(category: Category, op: Option<Op>, vj: u16, vk: u16, a: i64, _inst_index: usize) -> u16 {
    match category {
        Category::Beq => u16::from(vj == vk),
        Category::Addition => match op {
            Some(Op::Addi) => vj.wrapping_add(a as u16),
            _ => vj.wrapping_add(vk),
        },
        Category::Mul => ((vj as u32 * vk as u32) & 0xFFFF) as u16,
        Category::Nor => !(vj | vk),
        Category::Jump => match op {
            Some(Op::Call) => (_inst_index as u32 + 1) as u16,
            _ => vj, // RET
        },
        Category::Load | Category::Store => unreachable!("handled in execute_memory"),
    }
}
