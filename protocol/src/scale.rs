//! The slice of SCALE the pallet needs: compact integers, byte vectors,
//! 32-byte arrays and vectors of them.

use crate::ScaleError;

/// Append a compact-encoded unsigned integer.
pub fn encode_compact(value: u64, out: &mut Vec<u8>) {
    match value {
        0..=0x3f => out.push((value as u8) << 2),
        0x40..=0x3fff => out.extend_from_slice(&(((value as u16) << 2) | 0b01).to_le_bytes()),
        0x4000..=0x3fff_ffff => {
            out.extend_from_slice(&(((value as u32) << 2) | 0b10).to_le_bytes())
        }
        _ => {
            let bytes = value.to_le_bytes();
            let len = 8 - (value.leading_zeros() / 8) as usize;
            out.push((((len - 4) as u8) << 2) | 0b11);
            out.extend_from_slice(&bytes[..len]);
        }
    }
}

/// Append a length-prefixed byte vector (`Vec<u8>`).
pub fn encode_bytes(bytes: &[u8], out: &mut Vec<u8>) {
    encode_compact(bytes.len() as u64, out);
    out.extend_from_slice(bytes);
}

/// Cursor over SCALE-encoded input.
pub struct ScaleReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ScaleReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], ScaleError> {
        if self.remaining() < n {
            return Err(ScaleError::UnexpectedEof {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, ScaleError> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_array32(&mut self) -> Result<[u8; 32], ScaleError> {
        let mut out = [0u8; 32];
        out.copy_from_slice(self.read_bytes(32)?);
        Ok(out)
    }

    pub fn read_compact(&mut self) -> Result<u64, ScaleError> {
        let first = self.read_u8()?;
        match first & 0b11 {
            0b00 => Ok(u64::from(first >> 2)),
            0b01 => {
                let second = self.read_u8()?;
                let value = u64::from(u16::from_le_bytes([first, second]) >> 2);
                if value < 0x40 {
                    return Err(ScaleError::InvalidCompact);
                }
                Ok(value)
            }
            0b10 => {
                let rest = self.read_bytes(3)?;
                let value = u64::from(u32::from_le_bytes([first, rest[0], rest[1], rest[2]]) >> 2);
                if value < 0x4000 {
                    return Err(ScaleError::InvalidCompact);
                }
                Ok(value)
            }
            _ => {
                let len = usize::from(first >> 2) + 4;
                if len > 8 {
                    return Err(ScaleError::InvalidCompact);
                }
                let raw = self.read_bytes(len)?;
                let mut buf = [0u8; 8];
                buf[..len].copy_from_slice(raw);
                let value = u64::from_le_bytes(buf);
                if value < 0x4000_0000 || raw[len - 1] == 0 {
                    return Err(ScaleError::InvalidCompact);
                }
                Ok(value)
            }
        }
    }

    /// Read a `Vec<u8>`.
    pub fn read_vec(&mut self) -> Result<Vec<u8>, ScaleError> {
        let len = self.read_len()?;
        Ok(self.read_bytes(len)?.to_vec())
    }

    /// Read a `Vec<[u8; 32]>`.
    pub fn read_vec_array32(&mut self) -> Result<Vec<[u8; 32]>, ScaleError> {
        let len = self.read_len()?;
        let needed = len.saturating_mul(32);
        if self.remaining() < needed {
            return Err(ScaleError::UnexpectedEof {
                needed,
                remaining: self.remaining(),
            });
        }
        (0..len).map(|_| self.read_array32()).collect()
    }

    /// Fail unless all input has been consumed.
    pub fn finish(self) -> Result<(), ScaleError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(ScaleError::TrailingBytes(n)),
        }
    }

    fn read_len(&mut self) -> Result<usize, ScaleError> {
        let len = self.read_compact()?;
        usize::try_from(len).map_err(|_| ScaleError::InvalidCompact)
    }
}
