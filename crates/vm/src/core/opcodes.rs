//! Opcode byte values for the instructions this crate inspects.

/// Addition operation
pub const ADD: u8 = 0x01;
/// Copy input data in current environment to memory
pub const CALLDATACOPY: u8 = 0x37;
/// Copy code running in current environment to memory
pub const CODECOPY: u8 = 0x39;
/// Copy an account's code to memory
pub const EXTCODECOPY: u8 = 0x3c;
/// Save word to memory
pub const MSTORE: u8 = 0x52;
/// Save byte to memory
pub const MSTORE8: u8 = 0x53;
/// Message-call into an account
pub const CALL: u8 = 0xf1;
/// Message-call into this account with an alternative account's code
pub const CALLCODE: u8 = 0xf2;
/// Message-call into this account with an alternative account's code, persisting the current
/// sender and value
pub const DELEGATECALL: u8 = 0xf4;
/// Static message-call into an account
pub const STATICCALL: u8 = 0xfa;

const KNOWN: [u8; 10] =
    [ADD, CALLDATACOPY, CODECOPY, EXTCODECOPY, MSTORE, MSTORE8, CALL, CALLCODE, DELEGATECALL, STATICCALL];

/// Returns the mnemonic of a known opcode.
///
/// ```
/// use evmstate_vm::core::opcodes::{name, MSTORE};
///
/// assert_eq!(name(MSTORE), Some("MSTORE"));
/// assert_eq!(name(0xfe), None);
/// ```
pub fn name(opcode: u8) -> Option<&'static str> {
    match opcode {
        ADD => Some("ADD"),
        CALLDATACOPY => Some("CALLDATACOPY"),
        CODECOPY => Some("CODECOPY"),
        EXTCODECOPY => Some("EXTCODECOPY"),
        MSTORE => Some("MSTORE"),
        MSTORE8 => Some("MSTORE8"),
        CALL => Some("CALL"),
        CALLCODE => Some("CALLCODE"),
        DELEGATECALL => Some("DELEGATECALL"),
        STATICCALL => Some("STATICCALL"),
        _ => None,
    }
}

/// Looks up a known opcode by mnemonic, ignoring case.
///
/// ```
/// use evmstate_vm::core::opcodes::{from_name, STATICCALL};
///
/// assert_eq!(from_name("staticcall"), Some(STATICCALL));
/// assert_eq!(from_name("INVALID"), None);
/// ```
pub fn from_name(mnemonic: &str) -> Option<u8> {
    KNOWN.into_iter().find(|opcode| name(*opcode).is_some_and(|n| n.eq_ignore_ascii_case(mnemonic)))
}
