use std::{collections::VecDeque, fmt::Display};

use alloy::primitives::U256;

use crate::error::{Error, Result};

/// Peek-only access to the operand stack.
///
/// This is the only capability the
/// [`MemoryGrowthAdvisor`](super::advisor::MemoryGrowthAdvisor) needs: it inspects the operands
/// of the upcoming instruction without consuming them, leaving the pops to the instruction
/// itself.
pub trait StackPeek {
    /// Returns the top `n` values, top of stack first, without changing the stack depth.
    fn peek_n(&self, n: usize) -> Vec<U256>;
}

/// The [`Stack`] struct represents the operand stack.
/// It is a LIFO data structure backed by a [`VecDeque`] of [`U256`] words.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Stack {
    /// The front of the deque represents the top of the stack.
    stack: VecDeque<U256>,
}

impl Stack {
    /// Creates a new, empty [`Stack`].
    ///
    /// ```
    /// use evmstate_vm::core::stack::Stack;
    ///
    /// let stack = Stack::new();
    /// assert_eq!(stack.size(), 0);
    /// ```
    pub fn new() -> Stack {
        Stack { stack: VecDeque::with_capacity(1024) }
    }

    /// Push a value onto the stack.
    ///
    /// ```
    /// use evmstate_vm::core::stack::Stack;
    /// use alloy::primitives::U256;
    ///
    /// let mut stack = Stack::new();
    /// stack.push(U256::from(0x00));
    /// assert_eq!(stack.size(), 1);
    /// ```
    pub fn push(&mut self, value: U256) {
        self.stack.push_front(value);
    }

    /// Pop a value off the stack.
    ///
    /// ```
    /// use evmstate_vm::core::stack::Stack;
    /// use alloy::primitives::U256;
    ///
    /// let mut stack = Stack::new();
    /// stack.push(U256::from(0x01));
    ///
    /// assert_eq!(stack.pop().expect("stack is not empty"), U256::from(0x01));
    /// assert!(stack.pop().is_err());
    /// ```
    pub fn pop(&mut self) -> Result<U256> {
        self.stack.pop_front().ok_or(Error::StackUnderflow { requested: 1, depth: 0 })
    }

    /// Pop `n` values off the stack, top of stack first. Fails without popping anything if the
    /// stack holds fewer than `n` values.
    ///
    /// ```
    /// use evmstate_vm::core::stack::Stack;
    /// use alloy::primitives::U256;
    ///
    /// let mut stack = Stack::new();
    /// stack.push(U256::from(0x00));
    /// stack.push(U256::from(0x01));
    /// stack.push(U256::from(0x02));
    ///
    /// // stack is now [0x02, 0x01, 0x00]
    /// let values = stack.pop_n(2).expect("stack is deep enough");
    /// assert_eq!(values, vec![U256::from(0x02), U256::from(0x01)]);
    /// assert_eq!(stack.size(), 1);
    /// ```
    pub fn pop_n(&mut self, n: usize) -> Result<Vec<U256>> {
        if n > self.stack.len() {
            return Err(Error::StackUnderflow { requested: n, depth: self.stack.len() });
        }
        Ok(self.stack.drain(0..n).collect())
    }

    /// Peek at the value `index` slots below the top. Slots past the bottom read as zero.
    ///
    /// ```
    /// use evmstate_vm::core::stack::Stack;
    /// use alloy::primitives::U256;
    ///
    /// let mut stack = Stack::new();
    /// stack.push(U256::from(0x07));
    ///
    /// assert_eq!(stack.peek(0), U256::from(0x07));
    /// assert_eq!(stack.peek(1), U256::ZERO);
    /// ```
    pub fn peek(&self, index: usize) -> U256 {
        self.stack.get(index).copied().unwrap_or_default()
    }

    /// Get the size of the stack
    pub fn size(&self) -> usize {
        self.stack.len()
    }

    /// Check if the stack is empty.
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

impl StackPeek for Stack {
    fn peek_n(&self, n: usize) -> Vec<U256> {
        (0..n).map(|i| self.peek(i)).collect()
    }
}

impl Display for Stack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let values = self.stack.iter().map(|value| format!("{value:#x}")).collect::<Vec<_>>();
        write!(f, "[{}]", values.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::U256;

    use crate::core::stack::{Stack, StackPeek};

    #[test]
    fn test_push_pop() {
        let mut stack = Stack::new();
        stack.push(U256::from(1));
        stack.push(U256::from(2));
        assert_eq!(stack.pop().expect("pop failed"), U256::from(2));
        assert_eq!(stack.pop().expect("pop failed"), U256::from(1));
        assert!(stack.is_empty());
        assert!(stack.pop().is_err());
    }

    #[test]
    fn test_pop_n() {
        let mut stack = Stack::new();
        stack.push(U256::from(1));
        stack.push(U256::from(2));
        stack.push(U256::from(3));
        let values = stack.pop_n(2).expect("pop_n failed");
        assert_eq!(values, vec![U256::from(3), U256::from(2)]);
        assert_eq!(stack.pop().expect("pop failed"), U256::from(1));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_pop_n_underflow_pops_nothing() {
        let mut stack = Stack::new();
        stack.push(U256::from(1));
        assert!(stack.pop_n(2).is_err());
        assert_eq!(stack.size(), 1);
    }

    #[test]
    fn test_peek_n_does_not_consume() {
        let mut stack = Stack::new();
        stack.push(U256::from(1));
        stack.push(U256::from(2));
        stack.push(U256::from(3));
        assert_eq!(stack.peek_n(2), vec![U256::from(3), U256::from(2)]);
        assert_eq!(stack.peek_n(4), vec![U256::from(3), U256::from(2), U256::from(1), U256::ZERO]);
        assert_eq!(stack.size(), 3);
    }

    #[test]
    fn test_display() {
        let mut stack = Stack::new();
        stack.push(U256::from(1));
        stack.push(U256::from(255));
        assert_eq!(stack.to_string(), "[0xff, 0x1]");
    }
}
