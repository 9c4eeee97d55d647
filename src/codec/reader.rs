//! Bounded cursor over wire bytes

use super::CodecError;

/// Forward-only reader with explicit truncation errors.
pub(crate) struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if self.remaining() < n {
            return Err(CodecError::Truncated {
                needed: n - self.remaining(),
            });
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn take_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    pub fn take_u32(&mut self) -> Result<u32, CodecError> {
        let bytes: [u8; 4] = self.take(4)?.try_into().expect("slice length checked");
        Ok(u32::from_be_bytes(bytes))
    }

    pub fn take_i32(&mut self) -> Result<i32, CodecError> {
        let bytes: [u8; 4] = self.take(4)?.try_into().expect("slice length checked");
        Ok(i32::from_be_bytes(bytes))
    }

    pub fn take_i64(&mut self) -> Result<i64, CodecError> {
        let bytes: [u8; 8] = self.take(8)?.try_into().expect("slice length checked");
        Ok(i64::from_be_bytes(bytes))
    }

    /// Length-prefixed UTF-8 string.
    pub fn take_string(&mut self) -> Result<String, CodecError> {
        let len = self.take_u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| CodecError::Malformed(format!("invalid UTF-8: {e}")))
    }

    /// Guard against length prefixes claiming more elements than bytes left.
    /// Every element needs at least one tag byte.
    pub fn check_capacity(&self, count: usize) -> Result<(), CodecError> {
        if count > self.remaining() {
            return Err(CodecError::Malformed(format!(
                "declared {count} elements but only {} bytes remain",
                self.remaining()
            )));
        }
        Ok(())
    }
}
