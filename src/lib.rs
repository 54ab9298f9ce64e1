pub mod cpu6502;
mod instructions;
