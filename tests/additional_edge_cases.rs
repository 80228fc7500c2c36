// tests/additional_edge_cases.rs
//
// The documented open questions (`§9` of the scheduling-engine spec) are
// reproduced verbatim rather than "fixed". These tests pin down that
// behavior so a future change can't silently patch it away.

use tomasulo_sim::{decode_program, Engine, HardwareConfig, Memory};

fn run(source: &str) -> Engine {
    let program = decode_program(source).expect("program should decode");
    let config = HardwareConfig::default_config();
    let mut engine = Engine::new(program, &config, Memory::new(), 0);
    engine.run_to_completion().expect("program should run to completion");
    engine
}

#[test]
fn call_retirement_rename_is_clobbered_by_the_generic_broadcast_step() {
    // Open question 2: CALL's retirement writes `registers[1] := a`
    // directly, but the CALL's own rename entry for R1 is never cleared
    // by that direct write — only by the generic "else" register/
    // broadcast pass every non-STORE, non-BEQ retirement also runs
    // (reproduced verbatim from the reference implementation). That
    // pass fires immediately afterward and re-writes `registers[1]` to
    // `result` (`inst_index + 1`, the conventional return address),
    // so the direct write to `a` is clobbered in the same cycle.
    let engine = run(
        "CALL 2
         ADDI R2,R0,9
         ADDI R3,R0,9
         ADDI R4,R0,7
         RET",
    );
    assert_eq!(engine.registers().as_slice()[1], 1, "inst_index + 1 of the CALL at index 0");
}

#[test]
fn speculative_destination_rename_targets_the_top_snapshot_only() {
    // Open question 1: while a branch/jump is in flight, Issue writes a
    // new destination rename into the *top* speculation snapshot
    // instead of the live rename table. The live table is therefore
    // left with no producer recorded for a register renamed entirely
    // inside a speculative window, until some retirement copies a
    // snapshot back into it.
    let program = decode_program(
        "BEQ R0,R1,10
         ADDI R2,R0,5
         BEQ R0,R1,10",
    )
    .unwrap();
    let config = HardwareConfig::default_config();
    let mut engine = Engine::new(program, &config, Memory::new(), 0);

    // Issue all three instructions (distinct BEQ/ADD stations, no
    // structural stall in the default configuration).
    engine.step().unwrap();
    engine.step().unwrap();
    engine.step().unwrap();

    // R2's rename lives only in the first BEQ's snapshot, not in the
    // live rename table, which still reads 0 (no producer) for R2.
    assert_eq!(engine.rename_table().get(2), 0);
}

#[test]
fn taken_branch_clears_the_entire_speculation_stack() {
    // Two nested branches, the outer one taken: both snapshots are
    // discarded and everything issued after the outer BEQ is flushed,
    // including the inner (never-resolved) BEQ.
    let engine = run(
        "ADDI R1,R0,1
         BEQ R1,R1,3
         BEQ R1,R1,0
         ADDI R2,R0,9
         ADDI R3,R0,9
         ADDI R4,R0,4",
    );
    assert_eq!(engine.registers().as_slice()[2], 0, "flushed by the outer branch");
    assert_eq!(engine.registers().as_slice()[3], 0, "flushed by the outer branch");
    assert_eq!(engine.registers().as_slice()[4], 4, "reached via the outer branch's target");
    assert_eq!(engine.stats().mispredictions, 1);
}

#[test]
fn flush_drops_a_speculatively_issued_load_from_the_order_queue() {
    // The misprediction flush must remove the LOAD's entry from the
    // load/store order queue along with freeing its station, or the
    // later STORE would jam forever behind a queue head that can never
    // resolve.
    let engine = run(
        "ADDI R1,R0,1
         BEQ R1,R1,2
         LOAD R2,0(R0)
         ADDI R3,R0,9
         STORE R1,0(R0)",
    );
    assert_eq!(engine.registers().as_slice()[2], 0, "LOAD flushed before it could retire");
    assert_eq!(engine.registers().as_slice()[3], 0, "ADDI flushed before it could retire");
    assert_eq!(engine.stats().mispredictions, 1);
    assert_eq!(engine.memory().read(0).unwrap(), 1, "STORE at the branch target still retires");
}

#[test]
fn nor_computes_bitwise_nor_of_both_operands() {
    let engine = run("ADDI R1,R0,5\nADDI R2,R0,3\nNOR R3,R1,R2");
    assert_eq!(engine.registers().as_slice()[3], !(5u16 | 3));
}

#[test]
fn register_zero_cannot_be_renamed_even_as_an_explicit_destination() {
    // ADDI R0,R0,9 would (if renamed) leave a dangling producer id in
    // the rename table for register 0; the data model forbids this.
    let engine = run("ADDI R0,R0,9");
    assert_eq!(engine.rename_table().get(0), 0);
    assert_eq!(engine.registers().as_slice()[0], 0);
}
