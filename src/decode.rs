// decode.rs
//
// Turns program text into `Instruction` records. One non-comment,
// non-blank line per instruction; `index` is assigned in the order
// instructions appear, so comments and blank lines don't consume one.

use crate::errors::SimulatorError;
use crate::instruction::{Category, Instruction, Op};

const REG_IMM_BOUND: (i32, i32) = (-16, 15);
const CALL_IMM_BOUND: (i32, i32) = (-64, 63);

pub fn decode_program(text: &str) -> Result<Vec<Instruction>, SimulatorError> {
    let mut program = Vec::new();
    for (line_no, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let index = program.len();
        program.push(decode_line(index, line_no + 1, line)?);
    }
    Ok(program)
}

fn decode_line(index: usize, line_no: usize, line: &str) -> Result<Instruction, SimulatorError> {
    let mnemonic_end = line.find(char::is_whitespace).unwrap_or(line.len());
    let mnemonic = line[..mnemonic_end].to_ascii_uppercase();
    let rest = line[mnemonic_end..].trim();

    let malformed = || SimulatorError::MalformedInstruction {
        line: line_no,
        text: line.to_string(),
    };

    match mnemonic.as_str() {
        "LOAD" | "STORE" => {
            let (reg_tok, imm_tok, base_tok) = split_mem_operand(rest).ok_or_else(malformed)?;
            let reg = parse_register(reg_tok).ok_or_else(malformed)?;
            let base = parse_register(base_tok).ok_or_else(malformed)?;
            let imm = parse_int(imm_tok).ok_or_else(malformed)?;
            check_bound(imm, REG_IMM_BOUND, line_no, line)?;
            let (category, rd, rt) = if mnemonic == "LOAD" {
                (Category::Load, reg, 0)
            } else {
                (Category::Store, 0, reg)
            };
            Ok(Instruction::new(
                index,
                category,
                None,
                rd,
                base,
                rt,
                imm,
                line.to_string(),
            ))
        },
        "BEQ" => {
            let parts = split_commas(rest, 3).ok_or_else(malformed)?;
            let rs = parse_register(parts[0]).ok_or_else(malformed)?;
            let rt = parse_register(parts[1]).ok_or_else(malformed)?;
            let imm = parse_int(parts[2]).ok_or_else(malformed)?;
            check_bound(imm, REG_IMM_BOUND, line_no, line)?;
            Ok(Instruction::new(
                index,
                Category::Beq,
                None,
                0,
                rs,
                rt,
                imm,
                line.to_string(),
            ))
        },
        "CALL" => {
            let imm = parse_int(rest.trim()).ok_or_else(malformed)?;
            check_bound(imm, CALL_IMM_BOUND, line_no, line)?;
            Ok(Instruction::new(
                index,
                Category::Jump,
                Some(Op::Call),
                1,
                0,
                0,
                imm,
                line.to_string(),
            ))
        },
        "RET" => {
            if !rest.is_empty() {
                return Err(malformed());
            }
            Ok(Instruction::new(
                index,
                Category::Jump,
                Some(Op::Ret),
                0,
                1,
                0,
                0,
                line.to_string(),
            ))
        },
        "ADD" | "MUL" | "NOR" => {
            let parts = split_commas(rest, 3).ok_or_else(malformed)?;
            let rd = parse_register(parts[0]).ok_or_else(malformed)?;
            let rs = parse_register(parts[1]).ok_or_else(malformed)?;
            let rt = parse_register(parts[2]).ok_or_else(malformed)?;
            let category = match mnemonic.as_str() {
                "ADD" => Category::Addition,
                "MUL" => Category::Mul,
                _ => Category::Nor,
            };
            let op = if mnemonic == "ADD" { Some(Op::Add) } else { None };
            Ok(Instruction::new(index, category, op, rd, rs, rt, 0, line.to_string()))
        },
        "ADDI" => {
            let parts = split_commas(rest, 3).ok_or_else(malformed)?;
            let rd = parse_register(parts[0]).ok_or_else(malformed)?;
            let rs = parse_register(parts[1]).ok_or_else(malformed)?;
            let imm = parse_int(parts[2]).ok_or_else(malformed)?;
            check_bound(imm, REG_IMM_BOUND, line_no, line)?;
            Ok(Instruction::new(
                index,
                Category::Addition,
                Some(Op::Addi),
                rd,
                rs,
                0,
                imm,
                line.to_string(),
            ))
        },
        _ => Err(malformed()),
    }
}

fn check_bound(value: i32, bound: (i32, i32), line_no: usize, text: &str) -> Result<(), SimulatorError> {
    let (low, high) = bound;
    if value < low || value > high {
        return Err(SimulatorError::ImmediateOutOfRange {
            line: line_no,
            text: text.to_string(),
            low,
            high,
        });
    }
    Ok(())
}

/// Splits `Rd, imm(Rs)` into (`Rd`, `imm`, `Rs`).
fn split_mem_operand(rest: &str) -> Option<(&str, &str, &str)> {
    let comma = rest.find(',')?;
    let reg_tok = rest[..comma].trim();
    let remainder = rest[comma + 1..].trim();
    let open = remainder.find('(')?;
    let close = remainder.find(')')?;
    if close < open {
        return None;
    }
    let imm_tok = remainder[..open].trim();
    let base_tok = remainder[open + 1..close].trim();
    Some((reg_tok, imm_tok, base_tok))
}

fn split_commas(rest: &str, expected: usize) -> Option<Vec<&str>> {
    let parts: Vec<&str> = rest.split(',').map(str::trim).collect();
    if parts.len() != expected || parts.iter().any(|p| p.is_empty()) {
        return None;
    }
    Some(parts)
}

/// Accepts either a bare register digit (`3`) or an `R`/`r`-prefixed one (`R3`).
fn parse_register(token: &str) -> Option<u8> {
    let digits = token.strip_prefix(['R', 'r']).unwrap_or(token);
    let value: u8 = digits.parse().ok()?;
    if value <= 7 {
        Some(value)
    } else {
        None
    }
}

fn parse_int(token: &str) -> Option<i32> {
    token.parse().ok()
}
