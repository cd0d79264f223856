use alloy::primitives::U256;
use tracing::trace;

use crate::error::{Error, Result};

use super::{memory::Memory, opcodes, stack::StackPeek};

/// The opcode families which touch memory, grouped by the shape of their operands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemoryFamily {
    /// `MSTORE`: offset, value
    Store32,
    /// `MSTORE8`: offset, value
    Store8,
    /// `CODECOPY`: memOffset, codeOffset, length
    CodeCopy,
    /// `CALLDATACOPY`: memOffset, dataOffset, length
    CallDataCopy,
    /// `EXTCODECOPY`: address, memOffset, codeOffset, length
    ExtCodeCopy,
    /// `CALL`, `CALLCODE`: gas, to, value, inOffset, inLength, outOffset, outLength
    Call,
    /// `DELEGATECALL`, `STATICCALL`: gas, to, inOffset, inLength, outOffset, outLength
    DelegateCall,
}

impl MemoryFamily {
    /// Maps an opcode to its memory family, or `None` if it does not touch memory through the
    /// advisor.
    pub fn from_opcode(opcode: u8) -> Option<MemoryFamily> {
        match opcode {
            opcodes::MSTORE => Some(MemoryFamily::Store32),
            opcodes::MSTORE8 => Some(MemoryFamily::Store8),
            opcodes::CODECOPY => Some(MemoryFamily::CodeCopy),
            opcodes::CALLDATACOPY => Some(MemoryFamily::CallDataCopy),
            opcodes::EXTCODECOPY => Some(MemoryFamily::ExtCodeCopy),
            opcodes::CALL | opcodes::CALLCODE => Some(MemoryFamily::Call),
            opcodes::DELEGATECALL | opcodes::STATICCALL => Some(MemoryFamily::DelegateCall),
            _ => None,
        }
    }

    /// The number of stack operands the family reads.
    pub fn operands(&self) -> usize {
        match self {
            MemoryFamily::Store32 | MemoryFamily::Store8 => 2,
            MemoryFamily::CodeCopy | MemoryFamily::CallDataCopy => 3,
            MemoryFamily::ExtCodeCopy => 4,
            MemoryFamily::Call => 7,
            MemoryFamily::DelegateCall => 6,
        }
    }

    /// Picks the `(offset, length)` memory region out of the peeked operands, which are in stack
    /// order (top first).
    ///
    /// Call-style families only cover the output region. Growth for the input region is not
    /// requested here.
    fn region(&self, operands: &[U256]) -> (U256, U256) {
        match self {
            MemoryFamily::Store32 => (operands[0], U256::from(32)),
            MemoryFamily::Store8 => (operands[0], U256::from(1)),
            MemoryFamily::CodeCopy | MemoryFamily::CallDataCopy => (operands[0], operands[2]),
            MemoryFamily::ExtCodeCopy => (operands[1], operands[3]),
            MemoryFamily::Call => (operands[5], operands[6]),
            MemoryFamily::DelegateCall => (operands[4], operands[5]),
        }
    }
}

/// Grows [`Memory`] ahead of memory-touching instructions.
///
/// The advisor peeks at the operands of the upcoming instruction, computes the highest byte it
/// will touch, and resizes memory to at least that size before the instruction runs. Operands are
/// never popped. Offsets and lengths are added as full 256-bit words and only then narrowed to a
/// byte count, which must not exceed `max_memory_size`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryGrowthAdvisor {
    max_memory_size: usize,
}

impl Default for MemoryGrowthAdvisor {
    fn default() -> Self {
        Self::new(32 * 1024 * 1024)
    }
}

impl MemoryGrowthAdvisor {
    /// Creates an advisor which refuses to grow memory past `max_memory_size` bytes.
    pub fn new(max_memory_size: usize) -> Self {
        Self { max_memory_size }
    }

    /// The largest memory, in bytes, this advisor will request.
    pub fn max_memory_size(&self) -> usize {
        self.max_memory_size
    }

    /// Prepares memory for `opcode`. Opcodes that do not touch memory are a no-op.
    ///
    /// ```
    /// use alloy::primitives::U256;
    /// use evmstate_vm::core::{
    ///     advisor::MemoryGrowthAdvisor, memory::Memory, opcodes::MSTORE, stack::Stack,
    /// };
    ///
    /// let mut stack = Stack::new();
    /// stack.push(U256::from(0xff)); // value
    /// stack.push(U256::from(4)); // offset
    ///
    /// let mut memory = Memory::new();
    /// MemoryGrowthAdvisor::default().prepare(MSTORE, &stack, &mut memory).expect("within limit");
    ///
    /// assert_eq!(memory.length(), 36);
    /// assert_eq!(stack.size(), 2);
    /// ```
    pub fn prepare<S: StackPeek>(&self, opcode: u8, stack: &S, memory: &mut Memory) -> Result<()> {
        match MemoryFamily::from_opcode(opcode) {
            Some(family) => self.grow(family, stack, memory).map(|_| ()),
            None => Ok(()),
        }
    }

    /// Grows memory for the given family and returns the required size.
    pub fn grow<S: StackPeek>(
        &self,
        family: MemoryFamily,
        stack: &S,
        memory: &mut Memory,
    ) -> Result<usize> {
        let operands = stack.peek_n(family.operands());
        let (offset, length) = family.region(&operands);
        let required = self.required_size(offset, length)?;

        trace!(?family, %offset, %length, required, "preparing memory");
        memory.resize(required);
        Ok(required)
    }

    /// Computes `offset + length` without overflow and narrows it to a byte count, failing if
    /// the result exceeds the configured maximum.
    pub fn required_size(&self, offset: U256, length: U256) -> Result<usize> {
        offset
            .checked_add(length)
            .and_then(|required| usize::try_from(required).ok())
            .filter(|required| *required <= self.max_memory_size)
            .ok_or(Error::MemoryLimitExceeded { offset, length, limit: self.max_memory_size })
    }

    /// Memory growth for `MSTORE`.
    pub fn mstore<S: StackPeek>(&self, stack: &S, memory: &mut Memory) -> Result<usize> {
        self.grow(MemoryFamily::Store32, stack, memory)
    }

    /// Memory growth for `MSTORE8`.
    pub fn mstore8<S: StackPeek>(&self, stack: &S, memory: &mut Memory) -> Result<usize> {
        self.grow(MemoryFamily::Store8, stack, memory)
    }

    /// Memory growth for `CODECOPY`.
    pub fn codecopy<S: StackPeek>(&self, stack: &S, memory: &mut Memory) -> Result<usize> {
        self.grow(MemoryFamily::CodeCopy, stack, memory)
    }

    /// Memory growth for `CALLDATACOPY`.
    pub fn calldatacopy<S: StackPeek>(&self, stack: &S, memory: &mut Memory) -> Result<usize> {
        self.grow(MemoryFamily::CallDataCopy, stack, memory)
    }

    /// Memory growth for `EXTCODECOPY`.
    pub fn extcodecopy<S: StackPeek>(&self, stack: &S, memory: &mut Memory) -> Result<usize> {
        self.grow(MemoryFamily::ExtCodeCopy, stack, memory)
    }

    /// Memory growth for value-carrying calls (`CALL`, `CALLCODE`).
    // TODO: the input region (inOffset + inLength) is not grown here; revisit once the dispatch
    // loop's CALL handler states whether it relies on prior growth for its input.
    pub fn call<S: StackPeek>(&self, stack: &S, memory: &mut Memory) -> Result<usize> {
        self.grow(MemoryFamily::Call, stack, memory)
    }

    /// Memory growth for calls without a value operand (`DELEGATECALL`, `STATICCALL`).
    pub fn delegatecall<S: StackPeek>(&self, stack: &S, memory: &mut Memory) -> Result<usize> {
        self.grow(MemoryFamily::DelegateCall, stack, memory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stack::Stack;

    /// Builds a stack whose top-of-stack is `operands[0]`.
    fn stack_of(operands: &[u64]) -> Stack {
        let mut stack = Stack::new();
        for value in operands.iter().rev() {
            stack.push(U256::from(*value));
        }
        stack
    }

    #[test]
    fn test_mstore_grows_to_offset_plus_word() {
        let stack = stack_of(&[64, 0xff]);
        let mut memory = Memory::new();
        let required =
            MemoryGrowthAdvisor::default().mstore(&stack, &mut memory).expect("growth failed");
        assert_eq!(required, 96);
        assert_eq!(memory.length(), 96);
    }

    #[test]
    fn test_mstore8_grows_to_offset_plus_one() {
        let stack = stack_of(&[10, 0xff]);
        let mut memory = Memory::new();
        MemoryGrowthAdvisor::default().mstore8(&stack, &mut memory).expect("growth failed");
        assert_eq!(memory.length(), 11);
    }

    #[test]
    fn test_copy_families() {
        let advisor = MemoryGrowthAdvisor::default();

        let mut memory = Memory::new();
        advisor.codecopy(&stack_of(&[8, 1000, 24]), &mut memory).expect("growth failed");
        assert_eq!(memory.length(), 32);

        let mut memory = Memory::new();
        advisor.calldatacopy(&stack_of(&[100, 0, 4]), &mut memory).expect("growth failed");
        assert_eq!(memory.length(), 104);

        let mut memory = Memory::new();
        advisor.extcodecopy(&stack_of(&[0xdead, 50, 7, 10]), &mut memory).expect("growth failed");
        assert_eq!(memory.length(), 60);
    }

    #[test]
    fn test_call_families_only_cover_output_region() {
        let advisor = MemoryGrowthAdvisor::default();

        // gas, to, value, inOffset, inLength, outOffset, outLength
        let mut memory = Memory::new();
        advisor.call(&stack_of(&[5000, 0xaa, 1, 4096, 64, 32, 32]), &mut memory).expect("growth");
        assert_eq!(memory.length(), 64);

        // gas, to, inOffset, inLength, outOffset, outLength
        let mut memory = Memory::new();
        advisor.delegatecall(&stack_of(&[5000, 0xaa, 4096, 64, 0, 16]), &mut memory).expect("growth");
        assert_eq!(memory.length(), 16);
    }

    #[test]
    fn test_advisor_does_not_consume_operands() {
        let stack = stack_of(&[5000, 0xaa, 1, 0, 0, 32, 32]);
        let mut memory = Memory::new();
        MemoryGrowthAdvisor::default().prepare(opcodes::CALL, &stack, &mut memory).expect("growth");
        assert_eq!(stack.size(), 7);
        assert_eq!(stack.peek(0), U256::from(5000));
    }

    #[test]
    fn test_advisor_never_shrinks() {
        let mut memory = Memory::new();
        memory.resize(256);
        MemoryGrowthAdvisor::default().mstore(&stack_of(&[0, 0]), &mut memory).expect("growth");
        assert_eq!(memory.length(), 256);
    }

    #[test]
    fn test_prepare_routes_opcodes() {
        let advisor = MemoryGrowthAdvisor::default();
        let stack = stack_of(&[0, 0, 0, 0, 0, 8, 8]);

        let expected = [
            (opcodes::MSTORE, 32),
            (opcodes::MSTORE8, 1),
            (opcodes::CODECOPY, 0),
            (opcodes::CALLDATACOPY, 0),
            (opcodes::EXTCODECOPY, 0),
            (opcodes::CALL, 16),
            (opcodes::CALLCODE, 16),
            (opcodes::DELEGATECALL, 8),
            (opcodes::STATICCALL, 8),
            (opcodes::ADD, 0),
        ];
        for (opcode, length) in expected {
            let mut memory = Memory::new();
            advisor.prepare(opcode, &stack, &mut memory).expect("growth failed");
            assert_eq!(memory.length(), length, "opcode {opcode:#04x}");
        }
    }

    #[test]
    fn test_limit_is_inclusive() {
        let advisor = MemoryGrowthAdvisor::new(64);
        let mut memory = Memory::new();

        advisor.mstore(&stack_of(&[32, 0]), &mut memory).expect("64 bytes is within the limit");
        assert_eq!(memory.length(), 64);

        assert_eq!(
            advisor.mstore(&stack_of(&[33, 0]), &mut memory),
            Err(Error::MemoryLimitExceeded {
                offset: U256::from(33),
                length: U256::from(32),
                limit: 64
            })
        );
        assert_eq!(memory.length(), 64);
    }

    #[test]
    fn test_huge_operands_fail_instead_of_wrapping() {
        let advisor = MemoryGrowthAdvisor::default();
        let mut stack = Stack::new();
        stack.push(U256::MAX); // length
        stack.push(U256::ZERO); // codeOffset
        stack.push(U256::from(1)); // memOffset

        let mut memory = Memory::new();
        assert!(matches!(
            advisor.codecopy(&stack, &mut memory),
            Err(Error::MemoryLimitExceeded { .. })
        ));
        assert_eq!(memory.length(), 0);

        assert!(advisor.required_size(U256::MAX, U256::MAX).is_err());
        assert!(advisor.required_size(U256::from(u128::MAX), U256::ZERO).is_err());
    }
}
