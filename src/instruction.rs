// instruction.rs
//
// The decoded instruction record. An `Instruction` is immutable except for
// the four timestamp fields the scheduling engine fills in as the
// instruction moves through issue, execute, and write-back.

use std::fmt;

/// The seven instruction categories, in station-bank ordinal order.
/// `StationBank` is indexed by this ordinal, so the discriminant values
/// below are load-bearing, not cosmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Load = 0,
    Store = 1,
    Beq = 2,
    Jump = 3,
    Addition = 4,
    Mul = 5,
    Nor = 6,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Load,
        Category::Store,
        Category::Beq,
        Category::Jump,
        Category::Addition,
        Category::Mul,
        Category::Nor,
    ];

    pub fn ordinal(self) -> usize {
        self as usize
    }

    pub fn is_memory(self) -> bool {
        matches!(self, Category::Load | Category::Store)
    }

    pub fn is_control(self) -> bool {
        matches!(self, Category::Beq | Category::Jump)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Load => "LOAD",
            Category::Store => "STORE",
            Category::Beq => "BEQ",
            Category::Jump => "JUMP",
            Category::Addition => "ADDITION",
            Category::Mul => "MUL",
            Category::Nor => "NOR",
        };
        write!(f, "{name}")
    }
}

/// Sub-operation distinguishing instructions whose category alone doesn't
/// pin down the operation: JUMP is CALL or RET, ADDITION is ADD or ADDI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Call,
    Ret,
    Add,
    Addi,
}

#[derive(Debug, Clone)]
pub struct Instruction {
    pub index: usize,
    pub category: Category,
    pub op: Option<Op>,
    pub rd: u8,
    pub rs: u8,
    pub rt: u8,
    pub imm: i32,
    pub source: String,

    // Filled exactly once each, by the engine. 0 means "not yet set".
    pub issue: usize,
    pub exec_start: usize,
    pub exec_end: usize,
    pub write_back: usize,
}

impl Instruction {
    pub fn new(
        index: usize,
        category: Category,
        op: Option<Op>,
        rd: u8,
        rs: u8,
        rt: u8,
        imm: i32,
        source: String,
    ) -> Self {
        Self {
            index,
            category,
            op,
            rd,
            rs,
            rt,
            imm,
            source,
            issue: 0,
            exec_start: 0,
            exec_end: 0,
            write_back: 0,
        }
    }

}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:>3}] {}", self.index, self.source)
    }
}
