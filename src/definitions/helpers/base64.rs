//! Standard (padded) base64 as used by every encoded field the relying party receives.

/// Encode bytes or a string as standard, padded base64.
pub fn encode<T: AsRef<[u8]>>(input: T) -> String {
    ::base64::encode(input)
}

/// Decode standard base64, ignoring ASCII whitespace.
pub fn decode<T: AsRef<[u8]>>(input: T) -> Result<Vec<u8>, ::base64::DecodeError> {
    let compact: Vec<u8> = input
        .as_ref()
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    ::base64::decode(compact)
}
