use tracing::trace;

use crate::error::{DnsError, Result};

/// Largest DNS message carried over plain UDP (no EDNS).
pub const MAX_PACKET_SIZE: usize = 512;

/// Compression pointers followed while decoding a single name.
pub const MAX_JUMPS: usize = 5;

pub const MAX_LABEL_LEN: usize = 63;

const POINTER_MASK: u8 = 0xC0;

/// Fixed-capacity big-endian cursor over one DNS message.
///
/// A buffer lives for exactly one encode or decode call. Every access is
/// checked against [`MAX_PACKET_SIZE`], never against the length of the
/// datagram that was copied in, so a short datagram reads as zero padded.
#[derive(Clone, Debug)]
pub struct PacketBuffer {
    buf: [u8; MAX_PACKET_SIZE],
    pos: usize,
}

impl Default for PacketBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketBuffer {
    pub fn new() -> Self {
        Self {
            buf: [0; MAX_PACKET_SIZE],
            pos: 0,
        }
    }

    /// Copy a received datagram into a fresh buffer positioned at 0.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() > MAX_PACKET_SIZE {
            return Err(DnsError::BufferBounds {
                pos: 0,
                len: data.len(),
            });
        }

        let mut buffer = Self::new();
        buffer.buf[..data.len()].copy_from_slice(data);
        Ok(buffer)
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Bytes written so far, i.e. everything before the cursor.
    pub fn bytes(&self) -> &[u8] {
        &self.buf[..self.pos]
    }

    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos >= MAX_PACKET_SIZE {
            return Err(DnsError::BufferBounds { pos, len: 0 });
        }
        self.pos = pos;
        Ok(())
    }

    /// Advance the cursor without reading. The cursor may land exactly on
    /// the capacity, after which any further read fails.
    pub fn step(&mut self, steps: usize) -> Result<()> {
        self.check(self.pos, steps)?;
        self.pos += steps;
        Ok(())
    }

    fn check(&self, pos: usize, len: usize) -> Result<()> {
        match pos.checked_add(len) {
            Some(end) if end <= MAX_PACKET_SIZE => Ok(()),
            _ => Err(DnsError::BufferBounds { pos, len }),
        }
    }

    pub fn get(&self, pos: usize) -> Result<u8> {
        self.check(pos, 1)?;
        Ok(self.buf[pos])
    }

    /// Random-access read that leaves the cursor where it is.
    pub fn read_range(&self, pos: usize, len: usize) -> Result<&[u8]> {
        self.check(pos, len)?;
        Ok(&self.buf[pos..pos + len])
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let value = self.get(self.pos)?;
        self.pos += 1;
        Ok(value)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.read_range(self.pos, 2)?;
        let value = u16::from_be_bytes([bytes[0], bytes[1]]);
        self.pos += 2;
        Ok(value)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.read_range(self.pos, 4)?;
        let value = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        self.pos += 4;
        Ok(value)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let bytes = self.read_range(self.pos, len)?.to_vec();
        self.pos += len;
        Ok(bytes)
    }

    /// Decode a possibly compressed domain name starting at the cursor.
    ///
    /// Labels are followed through at most [`MAX_JUMPS`] compression
    /// pointers. The cursor ends up just past the name as it appears at the
    /// current position: past the terminating zero when no pointer was
    /// taken, or past the first pointer otherwise.
    ///
    /// Label bytes that are not UTF-8 decode lossily as U+FFFD.
    pub fn read_name(&mut self) -> Result<String> {
        let mut local_pos = self.pos;
        let mut jumps = 0;
        let mut name = String::new();

        loop {
            let len = self.get(local_pos)?;

            if len & POINTER_MASK == POINTER_MASK {
                if local_pos + 1 >= MAX_PACKET_SIZE {
                    return Err(DnsError::MalformedLabel(format!(
                        "compression pointer at position {} is cut off",
                        local_pos
                    )));
                }
                let low = self.get(local_pos + 1)?;

                // only the first pointer moves the caller's cursor
                if jumps == 0 {
                    self.pos = local_pos + 2;
                }

                jumps += 1;
                if jumps > MAX_JUMPS {
                    return Err(DnsError::MalformedLabel(format!(
                        "exceeded the limit of {} jumps while reading name",
                        MAX_JUMPS
                    )));
                }

                let target = (((len & !POINTER_MASK) as usize) << 8) | low as usize;
                if target >= MAX_PACKET_SIZE {
                    return Err(DnsError::MalformedLabel(format!(
                        "compression pointer at position {} targets {}",
                        local_pos, target
                    )));
                }
                trace!("Following compression pointer {} -> {}", local_pos, target);
                local_pos = target;
                continue;
            }

            if len as usize > MAX_LABEL_LEN {
                return Err(DnsError::MalformedLabel(format!(
                    "invalid length byte {:#04x} at position {}",
                    len, local_pos
                )));
            }

            local_pos += 1;
            if len == 0 {
                break;
            }

            // the label plus at least a terminating byte must fit
            if local_pos + len as usize >= MAX_PACKET_SIZE {
                return Err(DnsError::MalformedLabel(format!(
                    "label of {} bytes at position {} runs past the end of the message",
                    len, local_pos
                )));
            }

            let label = self.read_range(local_pos, len as usize)?;

            if !name.is_empty() {
                name.push('.');
            }
            name.push_str(&String::from_utf8_lossy(label));
            local_pos += len as usize;
        }

        if jumps == 0 {
            self.pos = local_pos;
        }

        Ok(name)
    }

    pub fn set_u8(&mut self, pos: usize, value: u8) -> Result<()> {
        self.check(pos, 1)?;
        self.buf[pos] = value;
        Ok(())
    }

    pub fn set_u16(&mut self, pos: usize, value: u16) -> Result<()> {
        self.check(pos, 2)?;
        self.buf[pos..pos + 2].copy_from_slice(&value.to_be_bytes());
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.set_u8(self.pos, value)?;
        self.pos += 1;
        Ok(())
    }

    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.set_u16(self.pos, value)?;
        self.pos += 2;
        Ok(())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.check(self.pos, bytes.len())?;
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(())
    }

    /// Write an uncompressed name. Empty labels are skipped, so `""` and a
    /// trailing dot both encode as the root terminator only.
    pub fn write_name(&mut self, name: &str) -> Result<()> {
        for label in name.split('.').filter(|label| !label.is_empty()) {
            if label.len() > MAX_LABEL_LEN {
                return Err(DnsError::LabelTooLong(label.len()));
            }
            self.write_u8(label.len() as u8)?;
            self.write_bytes(label.as_bytes())?;
        }

        self.write_u8(0)
    }

    /// Reserve a 16-bit length field, run `write_fn`, then patch the field
    /// with the number of bytes it produced.
    pub fn write_length_prefixed<F>(&mut self, write_fn: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let length_pos = self.pos;
        self.write_u16(0)?;

        write_fn(self)?;

        let size = self.pos - (length_pos + 2);
        self.set_u16(length_pos, size as u16)
    }
}
