use alloy::primitives::U256;
use clap::Parser;
use evmstate_config::Configuration;
use evmstate_vm::core::{
    advisor::{MemoryFamily, MemoryGrowthAdvisor},
    memory::Memory,
    opcodes,
    stack::Stack,
};

use crate::error::Error;

/// Command line arguments for the advise command
#[derive(Debug, Clone, Parser)]
#[clap(
    about = "Show how much memory an instruction would grow to, and what the growth costs",
    override_usage = "evmstate advise <OPCODE> [OPERANDS]..."
)]
pub(crate) struct AdviseArgs {
    /// The instruction, as a mnemonic (`MSTORE`) or a hex byte (`0x52`).
    #[clap(required = true)]
    pub(crate) opcode: String,

    /// The instruction's stack operands, top of stack first, as decimal or `0x` hex.
    pub(crate) operands: Vec<String>,

    /// The current memory length, in bytes.
    #[clap(long, default_value_t = 0)]
    pub(crate) memory: usize,
}

/// The memory the advisor settled on for one instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Advice {
    pub(crate) mnemonic: &'static str,
    pub(crate) length: usize,
    pub(crate) expansion_cost: u128,
}

fn parse_opcode(opcode: &str) -> Result<u8, Error> {
    let parsed = match opcode.strip_prefix("0x") {
        Some(hex) => u8::from_str_radix(hex, 16).ok(),
        None => opcodes::from_name(opcode),
    };

    parsed
        .filter(|opcode| MemoryFamily::from_opcode(*opcode).is_some())
        .ok_or_else(|| Error::Generic(format!("'{}' is not a memory-touching opcode", opcode)))
}

fn parse_operand(operand: &str) -> Result<U256, Error> {
    let parsed = match operand.strip_prefix("0x") {
        Some(hex) => U256::from_str_radix(hex, 16),
        None => U256::from_str_radix(operand, 10),
    };

    parsed.map_err(|e| Error::Generic(format!("invalid operand '{}': {}", operand, e)))
}

/// Runs the growth advisor against the given operands, honoring the configured memory limit.
pub(crate) fn advise(args: &AdviseArgs, configuration: &Configuration) -> Result<Advice, Error> {
    let opcode = parse_opcode(&args.opcode)?;

    let mut stack = Stack::new();
    for operand in args.operands.iter().rev() {
        stack.push(parse_operand(operand)?);
    }

    if args.memory > configuration.max_memory_size {
        return Err(Error::Generic(format!(
            "current memory of {} bytes is past the limit of {} bytes",
            args.memory, configuration.max_memory_size
        )));
    }

    let mut memory = Memory::new();
    memory.resize(args.memory);

    let advisor = MemoryGrowthAdvisor::new(configuration.max_memory_size);
    let before = memory.clone();
    advisor.prepare(opcode, &stack, &mut memory)?;

    Ok(Advice {
        mnemonic: opcodes::name(opcode).unwrap_or("UNKNOWN"),
        length: memory.length(),
        expansion_cost: before.expansion_cost(memory.length()),
    })
}
