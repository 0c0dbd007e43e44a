//! Little-endian random access reads over an in-memory buffer.
//!
//! All section decoders read through [ByteCursor].
//! Reads past the end of the buffer fail with [RbhError::TruncatedInput]
//! instead of panicking or returning partial data.
use std::io::Cursor;

use binrw::{BinRead, Endian, NullString};

use crate::RbhError;

/// A read position into a borrowed byte buffer.
#[derive(Debug)]
pub struct ByteCursor<'a> {
    reader: Cursor<&'a [u8]>,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            reader: Cursor::new(data),
        }
    }

    /// The total length of the underlying buffer in bytes.
    pub fn len(&self) -> u64 {
        self.reader.get_ref().len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn position(&self) -> u64 {
        self.reader.position()
    }

    /// The number of bytes between the current position and the end of the buffer.
    pub fn remaining(&self) -> u64 {
        self.len().saturating_sub(self.position())
    }

    /// Moves to an absolute position.
    /// Seeking exactly to the end of the buffer is allowed.
    pub fn seek(&mut self, position: u64) -> Result<(), RbhError> {
        if position > self.len() {
            return Err(RbhError::TruncatedInput {
                position,
                len: self.len(),
            });
        }
        self.reader.set_position(position);
        Ok(())
    }

    pub fn skip(&mut self, count: u64) -> Result<(), RbhError> {
        let position = self.position().saturating_add(count);
        self.seek(position)
    }

    /// Checks that `count` more bytes can be read from the current position.
    /// Used before reading count prefixed arrays to avoid allocating for counts the input can't contain.
    pub fn ensure_remaining(&self, count: u64) -> Result<(), RbhError> {
        if count > self.remaining() {
            Err(RbhError::TruncatedInput {
                position: self.position(),
                len: self.len(),
            })
        } else {
            Ok(())
        }
    }

    /// Reads any little-endian record without arguments such as a primitive or derived struct.
    pub fn read<T>(&mut self) -> Result<T, RbhError>
    where
        T: for<'b> BinRead<Args<'b> = ()>,
    {
        let position = self.position();
        let len = self.len();
        T::read_options(&mut self.reader, Endian::Little, ()).map_err(|e| {
            if e.is_eof() {
                RbhError::TruncatedInput { position, len }
            } else {
                e.into()
            }
        })
    }

    pub fn read_u8(&mut self) -> Result<u8, RbhError> {
        self.read()
    }

    pub fn read_u16(&mut self) -> Result<u16, RbhError> {
        self.read()
    }

    pub fn read_i16(&mut self) -> Result<i16, RbhError> {
        self.read()
    }

    pub fn read_u32(&mut self) -> Result<u32, RbhError> {
        self.read()
    }

    pub fn read_i32(&mut self) -> Result<i32, RbhError> {
        self.read()
    }

    pub fn read_f32(&mut self) -> Result<f32, RbhError> {
        self.read()
    }

    /// Reads exactly `count` bytes.
    pub fn read_bytes(&mut self, count: u64) -> Result<&'a [u8], RbhError> {
        self.ensure_remaining(count)?;
        let start = self.position() as usize;
        let end = start + count as usize;
        let data: &'a [u8] = *self.reader.get_ref();
        self.reader.set_position(end as u64);
        Ok(&data[start..end])
    }

    /// Reads `count` bytes of ASCII text such as a chunk tag.
    pub fn read_fixed_string(&mut self, count: u64) -> Result<String, RbhError> {
        let bytes = self.read_bytes(count)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Reads text up to and including the next zero byte.
    /// The terminator is consumed but not included in the result.
    pub fn read_nul_terminated_string(&mut self) -> Result<String, RbhError> {
        let value: NullString = self.read()?;
        Ok(String::from_utf8_lossy(&value.0).into_owned())
    }
}
