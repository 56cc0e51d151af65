// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Append-only byte buffer for binary file formats.

/// Largest value a variable-length quantity can hold (four 7-bit groups)
pub const MAX_VAR_LEN: u32 = 0x0FFF_FFFF;

/// Big-endian byte builder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteWriter {
    bytes: Vec<u8>,
}

impl ByteWriter {
    /// Create an empty writer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one byte
    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.bytes.push(value);
        self
    }

    /// Append a 16-bit big-endian value
    pub fn u16_be(&mut self, value: u16) -> &mut Self {
        self.bytes.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Append a 32-bit big-endian value
    pub fn u32_be(&mut self, value: u32) -> &mut Self {
        self.bytes.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Append raw bytes
    pub fn bytes(&mut self, data: &[u8]) -> &mut Self {
        self.bytes.extend_from_slice(data);
        self
    }

    /// Append the UTF-8 bytes of a string, without a length prefix
    pub fn text(&mut self, text: &str) -> &mut Self {
        self.bytes(text.as_bytes())
    }

    /// Append a variable-length quantity
    ///
    /// 7 bits per byte, most significant group first, continuation bit set on
    /// every byte but the last. Values above [`MAX_VAR_LEN`] are clamped.
    pub fn var_len(&mut self, value: u32) -> &mut Self {
        let mut value = value.min(MAX_VAR_LEN);
        let mut groups = [0u8; 4];
        let mut count = 0;
        loop {
            groups[count] = (value & 0x7F) as u8;
            count += 1;
            value >>= 7;
            if value == 0 {
                break;
            }
        }
        for i in (0..count).rev() {
            let continuation = if i > 0 { 0x80 } else { 0 };
            self.bytes.push(groups[i] | continuation);
        }
        self
    }

    /// Bytes written so far
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if nothing was written
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// View the buffer
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Take the buffer
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
