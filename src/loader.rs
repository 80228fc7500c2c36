// loader.rs
//
// Seeds the flat memory array from an optional `address value` text file.
// The program decoder lives in `decode.rs`; this module only covers the
// initial-memory collaborator.

use crate::errors::SimulatorError;
use crate::memory::Memory;

pub fn load_memory_image(text: &str, memory: &mut Memory) -> Result<(), SimulatorError> {
    for (line_no, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let malformed = || SimulatorError::MissingMemoryInitLine {
            line: line_no + 1,
            text: line.to_string(),
        };

        let mut fields = line.split_whitespace();
        let addr_tok = fields.next().ok_or_else(malformed)?;
        let value_tok = fields.next().ok_or_else(malformed)?;
        if fields.next().is_some() {
            return Err(malformed());
        }

        let addr: i64 = addr_tok.parse().map_err(|_| malformed())?;
        let value: i64 = value_tok.parse().map_err(|_| malformed())?;

        if addr < 0 || addr as u64 >= crate::memory::MEMORY_SIZE as u64 {
            return Err(SimulatorError::IllegalMemoryAccess(addr));
        }
        memory.write_unchecked(addr as usize, value as u16);
    }
    Ok(())
}
