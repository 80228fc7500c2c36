// Copyright (c) 2024 Mudit Bhargava
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.
//

// lib.rs
//
// Library root for the Tomasulo scheduling simulator. Re-exports the
// pieces a driver needs: decoding a program, configuring hardware,
// seeding memory, and running the engine.

pub mod config;
pub mod decode;
pub mod engine;
pub mod errors;
pub mod instruction;
pub mod loader;
pub mod memory;
pub mod order_queue;
pub mod registers;
pub mod reservation_station;
pub mod speculation;
pub mod utils;

pub use config::HardwareConfig;
pub use decode::decode_program;
pub use engine::{Engine, EngineStats};
pub use errors::SimulatorError;
pub use instruction::{Category, Instruction, Op};
pub use loader::load_memory_image;
pub use memory::Memory;
