use eyre::{eyre, Result};
use std::fmt::Write;

/// Decodes a hex string into a vector of bytes. An optional `0x` prefix is stripped, and an odd
/// number of nibbles is treated as if it had a leading zero (`0xabc` -> `0x0abc`).
///
/// ```
/// use evmstate_common::utils::strings::decode_hex;
///
/// let hex = "48656c6c6f20576f726c64"; // "Hello World" in hex
/// let result = decode_hex(hex).expect("should decode hex");
/// assert_eq!(result, vec![72, 101, 108, 108, 111, 32, 87, 111, 114, 108, 100]);
///
/// assert_eq!(decode_hex("0x1").expect("should decode hex"), vec![0x01]);
/// ```
pub fn decode_hex(s: &str) -> Result<Vec<u8>> {
    // normalize
    let s = s.trim();
    let s = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);

    if s.is_empty() {
        return Ok(vec![]);
    }

    let padded;
    let s = if s.len() % 2 == 1 {
        padded = format!("0{s}");
        padded.as_str()
    } else {
        s
    };

    if !s.is_ascii() {
        return Err(eyre!("invalid hex string: {}", s));
    }

    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16))
        .collect::<Result<Vec<u8>, _>>()
        .map_err(|_| eyre!("invalid hex string: {}", s))
}

/// Decodes a hex string and left-pads the result with zero bytes to `width`.
///
/// Values longer than `width` are rejected rather than truncated.
///
/// ```
/// use evmstate_common::utils::strings::decode_hex_padded;
///
/// let key = decode_hex_padded("0x01", 4).expect("should decode hex");
/// assert_eq!(key, vec![0, 0, 0, 1]);
/// ```
pub fn decode_hex_padded(s: &str, width: usize) -> Result<Vec<u8>> {
    let bytes = decode_hex(s)?;
    if bytes.len() > width {
        return Err(eyre!("hex value is {} bytes, expected at most {}", bytes.len(), width));
    }

    let mut padded = vec![0u8; width - bytes.len()];
    padded.extend_from_slice(&bytes);
    Ok(padded)
}

/// Encodes a slice of bytes into a lowercase hex string, without a prefix.
///
/// ```
/// use evmstate_common::utils::strings::encode_hex;
///
/// let bytes = vec![72, 101, 108, 108, 111, 32, 87, 111, 114, 108, 100];
/// let result = encode_hex(&bytes);
/// assert_eq!(result, "48656c6c6f20576f726c64");
/// ```
pub fn encode_hex(s: &[u8]) -> String {
    s.iter().fold(String::with_capacity(s.len() * 2), |mut acc, b| {
        let _ = write!(acc, "{b:02x}");
        acc
    })
}
