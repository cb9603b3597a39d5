//! Hex encoding utilities.
//!
//! Bytecode reaches the host either as raw bytes or as hex text with an
//! optional `0x` prefix. Selectors and storage slots travel as bare
//! lowercase hex in the engine's JSON payload.

/// Strip a leading `0x`/`0X` from a hex string.
pub fn strip_hex_prefix(hex_str: &str) -> &str {
    hex_str
        .strip_prefix("0x")
        .or_else(|| hex_str.strip_prefix("0X"))
        .unwrap_or(hex_str)
}

/// Parse hex text (with or without `0x` prefix) into raw bytes.
///
/// Surrounding whitespace is ignored so that bytecode read from a file with a
/// trailing newline decodes cleanly.
///
/// # Examples
///
/// ```
/// use evmole_types::encoding::parse_hex_bytes;
///
/// assert_eq!(parse_hex_bytes("0x6001").unwrap(), vec![0x60, 0x01]);
/// assert_eq!(parse_hex_bytes("6001\n").unwrap(), vec![0x60, 0x01]);
/// ```
pub fn parse_hex_bytes(hex_str: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(strip_hex_prefix(hex_str.trim()))
}

/// Decode exactly `N` bytes from hex text.
///
/// With `left_pad`, shorter inputs are zero-extended on the left, the way a
/// 256-bit storage slot number is written without leading zeros.
pub(crate) fn decode_fixed<const N: usize>(
    hex_str: &str,
    left_pad: bool,
) -> Result<[u8; N], String> {
    let digits = strip_hex_prefix(hex_str);
    let expected = N * 2;
    if digits.is_empty() || digits.len() > expected || (!left_pad && digits.len() != expected) {
        return Err(format!(
            "expected {} hex characters, got {} in '{}'",
            expected,
            digits.len(),
            hex_str
        ));
    }
    let padded = format!("{:0>width$}", digits, width = expected);
    let mut out = [0u8; N];
    hex::decode_to_slice(&padded, &mut out)
        .map_err(|e| format!("invalid hex '{}': {}", hex_str, e))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_bytes_prefixes() {
        assert_eq!(parse_hex_bytes("6001600055").unwrap(), vec![0x60, 0x01, 0x60, 0x00, 0x55]);
        assert_eq!(parse_hex_bytes("0x6001600055").unwrap().len(), 5);
        assert_eq!(parse_hex_bytes("0X60").unwrap(), vec![0x60]);
        assert!(parse_hex_bytes("0x").unwrap().is_empty());
        assert!(parse_hex_bytes("0x6").is_err());
        assert!(parse_hex_bytes("zz").is_err());
    }

    #[test]
    fn test_decode_fixed_exact() {
        assert_eq!(decode_fixed::<4>("fae7ab82", false).unwrap(), [0xfa, 0xe7, 0xab, 0x82]);
        assert!(decode_fixed::<4>("fae7ab", false).is_err());
        assert!(decode_fixed::<4>("fae7ab8200", false).is_err());
        assert!(decode_fixed::<4>("", false).is_err());
    }

    #[test]
    fn test_decode_fixed_left_pad() {
        let slot = decode_fixed::<32>("1", true).unwrap();
        assert_eq!(slot[31], 1);
        assert!(slot[..31].iter().all(|b| *b == 0));
        assert!(decode_fixed::<32>(&"0".repeat(65), true).is_err());
    }
}
