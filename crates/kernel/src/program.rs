use crate::error::KernelError;

/// Parses program source: hex byte pairs, optionally separated by whitespace.
///
/// ```
/// let image = kernel::program::parse("A9 03 8D 40 00 00").unwrap();
/// assert_eq!(image, vec![0xA9, 0x03, 0x8D, 0x40, 0x00, 0x00]);
/// ```
pub fn parse(source: &str) -> Result<Vec<u8>, KernelError> {
    if let Some(bad) = source
        .chars()
        .find(|c| !c.is_ascii_hexdigit() && !c.is_whitespace())
    {
        return Err(KernelError::InvalidProgram(format!(
            "unexpected character {:?}",
            bad
        )));
    }

    let mut digits = String::with_capacity(source.len());
    for token in source.split_whitespace() {
        if token.len() % 2 != 0 {
            return Err(KernelError::InvalidProgram(format!(
                "{:?} is not a sequence of byte pairs",
                token
            )));
        }
        digits.push_str(token);
    }
    if digits.is_empty() {
        return Err(KernelError::InvalidProgram("no code".to_string()));
    }
    hex::decode(&digits).map_err(|e| KernelError::InvalidProgram(e.to_string()))
}
