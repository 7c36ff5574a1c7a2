//! Byte-level streams.
//!
//! Little-endian primitives, compact sizes (one byte below 255, otherwise `255`
//! followed by an `i32`), optional headers, slices and encapsulations.

use slicegen_core::layout::{OPTIONAL_END_MARKER, OptionalFormat, TAG_ESCAPE};

use crate::error::DecodeError;

pub const ENCODING_MAJOR: u8 = 1;
pub const ENCODING_MINOR: u8 = 1;

/// Slice header flag bits.
pub mod flags {
    pub const HAS_TYPE_ID_STRING: u8 = 0x01;
    pub const HAS_TYPE_ID_COMPACT: u8 = 0x03;
    pub const HAS_OPTIONAL_MEMBERS: u8 = 0x04;
    pub const HAS_SLICE_SIZE: u8 = 0x10;
    pub const IS_LAST_SLICE: u8 = 0x20;
}

#[derive(Debug)]
struct OpenSlice {
    flags_pos: usize,
    size_pos: usize,
    flags: u8,
}

/// Growable output buffer.
#[derive(Debug, Default)]
pub struct OutputStream {
    buf: Vec<u8>,
    slices: Vec<OpenSlice>,
    encaps: Vec<usize>,
}

impl OutputStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_bool(&mut self, v: bool) {
        self.buf.push(u8::from(v));
    }

    pub fn write_byte(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_short(&mut self, v: i16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_int(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_long(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_float(&mut self, v: f32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_double(&mut self, v: f64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_size(&mut self, v: usize) {
        if v < 255 {
            self.buf.push(v as u8);
        } else {
            self.buf.push(255);
            self.write_int(v as i32);
        }
    }

    pub fn write_string(&mut self, v: &str) {
        self.write_size(v.len());
        self.buf.extend_from_slice(v.as_bytes());
    }

    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Header preceding an optional value. Marks the open slice as carrying optionals.
    pub fn write_optional_header(&mut self, tag: i32, format: OptionalFormat) {
        debug_assert!(tag >= 0, "negative tag {tag}");
        if tag < TAG_ESCAPE {
            self.buf.push(((tag as u8) << 3) | format.code());
        } else {
            self.buf.push(((TAG_ESCAPE as u8) << 3) | format.code());
            self.write_size(tag as usize);
        }
        if let Some(slice) = self.slices.last_mut() {
            slice.flags |= flags::HAS_OPTIONAL_MEMBERS;
        }
    }

    pub fn write_optional_end_marker(&mut self) {
        self.buf.push(OPTIONAL_END_MARKER);
    }

    /// Reserve a 4-byte size; returns its position for [`Self::end_size`].
    pub fn start_size(&mut self) -> usize {
        let pos = self.buf.len();
        self.write_int(0);
        pos
    }

    /// Patch the size reserved at `pos` with the byte count written after it.
    pub fn end_size(&mut self, pos: usize) {
        let size = (self.buf.len() - pos - 4) as i32;
        self.rewrite_int(pos, size);
    }

    fn rewrite_int(&mut self, pos: usize, v: i32) {
        self.buf[pos..pos + 4].copy_from_slice(&v.to_le_bytes());
    }

    pub fn start_encapsulation(&mut self) {
        let pos = self.buf.len();
        self.write_int(0);
        self.write_byte(ENCODING_MAJOR);
        self.write_byte(ENCODING_MINOR);
        self.encaps.push(pos);
    }

    pub fn end_encapsulation(&mut self) {
        if let Some(pos) = self.encaps.pop() {
            let size = (self.buf.len() - pos) as i32;
            self.rewrite_int(pos, size);
        }
    }

    /// Open a slice. `compact_id` takes precedence over the string type id.
    pub fn start_slice(&mut self, type_id: &str, compact_id: Option<i32>, last: bool) {
        let flags_pos = self.buf.len();
        let mut slice_flags = flags::HAS_SLICE_SIZE;
        if last {
            slice_flags |= flags::IS_LAST_SLICE;
        }
        self.write_byte(0);
        match compact_id {
            Some(id) => {
                slice_flags |= flags::HAS_TYPE_ID_COMPACT;
                self.write_size(id as usize);
            }
            None => {
                slice_flags |= flags::HAS_TYPE_ID_STRING;
                self.write_string(type_id);
            }
        }
        let size_pos = self.buf.len();
        self.write_int(0);
        self.slices.push(OpenSlice {
            flags_pos,
            size_pos,
            flags: slice_flags,
        });
    }

    pub fn end_slice(&mut self) {
        let Some(slice) = self.slices.pop() else {
            return;
        };
        if slice.flags & flags::HAS_OPTIONAL_MEMBERS != 0 {
            self.write_optional_end_marker();
        }
        let size = (self.buf.len() - slice.size_pos) as i32;
        self.rewrite_int(slice.size_pos, size);
        self.buf[slice.flags_pos] = slice.flags;
    }

    /// Close a slice whose body was copied verbatim from a preserved slice.
    pub fn end_slice_preserved(&mut self, has_optional_members: bool) {
        if has_optional_members && let Some(slice) = self.slices.last_mut() {
            slice.flags |= flags::HAS_OPTIONAL_MEMBERS;
        }
        self.end_slice();
    }
}

/// Parsed slice header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceHeader {
    pub flags: u8,
    /// Empty when the slice uses a compact id.
    pub type_id: String,
    pub compact_id: Option<i32>,
    pub body_start: usize,
    pub end: usize,
}

impl SliceHeader {
    pub fn is_last(&self) -> bool {
        self.flags & flags::IS_LAST_SLICE != 0
    }

    pub fn has_optional_members(&self) -> bool {
        self.flags & flags::HAS_OPTIONAL_MEMBERS != 0
    }

    /// Type id for messages: the string id or `#<compact>`.
    pub fn display_id(&self) -> String {
        match self.compact_id {
            Some(id) => format!("#{id}"),
            None => self.type_id.clone(),
        }
    }
}

/// Cursor over an immutable buffer.
#[derive(Debug, Clone)]
pub struct InputStream<'b> {
    buf: &'b [u8],
    pos: usize,
    encaps: Vec<usize>,
}

impl<'b> InputStream<'b> {
    pub fn new(buf: &'b [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            encaps: Vec::new(),
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// End of the innermost encapsulation, or of the buffer.
    pub fn limit(&self) -> usize {
        self.encaps.last().copied().unwrap_or(self.buf.len())
    }

    pub fn remaining(&self) -> usize {
        self.limit().saturating_sub(self.pos)
    }

    fn take(&mut self, n: usize) -> Result<&'b [u8], DecodeError> {
        if self.remaining() < n {
            return Err(DecodeError::UnexpectedEof {
                offset: self.pos,
                needed: n,
            });
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn skip(&mut self, n: usize) -> Result<(), DecodeError> {
        self.take(n).map(|_| ())
    }

    pub fn peek_byte(&self) -> Option<u8> {
        (self.pos < self.limit()).then(|| self.buf[self.pos])
    }

    pub fn read_bool(&mut self) -> Result<bool, DecodeError> {
        Ok(self.read_byte()? != 0)
    }

    pub fn read_byte(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_short(&mut self) -> Result<i16, DecodeError> {
        Ok(i16::from_le_bytes(self.take_array()?))
    }

    pub fn read_int(&mut self) -> Result<i32, DecodeError> {
        Ok(i32::from_le_bytes(self.take_array()?))
    }

    pub fn read_long(&mut self) -> Result<i64, DecodeError> {
        Ok(i64::from_le_bytes(self.take_array()?))
    }

    pub fn read_float(&mut self) -> Result<f32, DecodeError> {
        Ok(f32::from_le_bytes(self.take_array()?))
    }

    pub fn read_double(&mut self) -> Result<f64, DecodeError> {
        Ok(f64::from_le_bytes(self.take_array()?))
    }

    pub fn read_size(&mut self) -> Result<usize, DecodeError> {
        let b = self.read_byte()?;
        if b < 255 {
            return Ok(b as usize);
        }
        let v = self.read_int()?;
        if v < 0 {
            return Err(DecodeError::NegativeSize(v));
        }
        Ok(v as usize)
    }

    /// Size of a sequence whose elements take at least `min_size` bytes each.
    pub fn read_and_check_seq_size(&mut self, min_size: usize) -> Result<usize, DecodeError> {
        let n = self.read_size()?;
        let needed = n.saturating_mul(min_size.max(1));
        if needed > self.remaining() {
            return Err(DecodeError::UnexpectedEof {
                offset: self.pos,
                needed,
            });
        }
        Ok(n)
    }

    pub fn read_string(&mut self) -> Result<String, DecodeError> {
        let n = self.read_size()?;
        let offset = self.pos;
        let bytes = self.take(n)?;
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|_| DecodeError::InvalidString(offset))
    }

    pub fn read_raw(&mut self, n: usize) -> Result<&'b [u8], DecodeError> {
        self.take(n)
    }

    /// Read an optional header; `None` at the end marker or the end of the scope.
    /// The end marker is not consumed.
    pub fn read_optional_header(
        &mut self,
        end: usize,
    ) -> Result<Option<(i32, OptionalFormat)>, DecodeError> {
        if self.pos >= end {
            return Ok(None);
        }
        match self.peek_byte() {
            None | Some(OPTIONAL_END_MARKER) => return Ok(None),
            Some(_) => {}
        }
        let v = self.read_byte()?;
        let format = OptionalFormat::from_code(v & 0x07).ok_or(DecodeError::InvalidFormat(v & 0x07))?;
        let mut tag = i32::from(v >> 3);
        if tag == TAG_ESCAPE {
            tag = self.read_size()? as i32;
        }
        Ok(Some((tag, format)))
    }

    /// Skip the value of an optional encoded with `format`.
    pub fn skip_optional(&mut self, format: OptionalFormat) -> Result<(), DecodeError> {
        match format {
            OptionalFormat::F1 => self.skip(1),
            OptionalFormat::F2 => self.skip(2),
            OptionalFormat::F4 => self.skip(4),
            OptionalFormat::F8 => self.skip(8),
            OptionalFormat::Size | OptionalFormat::Class => self.read_size().map(|_| ()),
            OptionalFormat::VSize => {
                let n = self.read_size()?;
                self.skip(n)
            }
            OptionalFormat::FSize => {
                let n = self.read_int()?;
                if n < 0 {
                    return Err(DecodeError::NegativeSize(n));
                }
                self.skip(n as usize)
            }
        }
    }

    /// Skip every remaining optional up to `end`, consuming the end marker if present.
    pub fn skip_optionals(&mut self, end: usize) -> Result<(), DecodeError> {
        while let Some((_, format)) = self.read_optional_header(end)? {
            self.skip_optional(format)?;
        }
        if self.pos < end && self.peek_byte() == Some(OPTIONAL_END_MARKER) {
            self.pos += 1;
        }
        Ok(())
    }

    pub fn start_encapsulation(&mut self) -> Result<(), DecodeError> {
        let start = self.pos;
        let size = self.read_int()?;
        if size < 6 {
            return Err(DecodeError::NegativeSize(size));
        }
        let major = self.read_byte()?;
        let minor = self.read_byte()?;
        if major != ENCODING_MAJOR || minor > ENCODING_MINOR {
            return Err(DecodeError::UnsupportedEncoding { major, minor });
        }
        let end = start + size as usize;
        if end > self.limit() {
            return Err(DecodeError::EncapsulationSize {
                size: size as usize,
                actual: self.limit() - start,
            });
        }
        self.encaps.push(end);
        Ok(())
    }

    /// Leave the innermost encapsulation, skipping unread trailing bytes.
    pub fn end_encapsulation(&mut self) {
        if let Some(end) = self.encaps.pop() {
            self.pos = end;
        }
    }

    pub fn read_slice_header(&mut self) -> Result<SliceHeader, DecodeError> {
        let slice_flags = self.read_byte()?;
        let (type_id, compact_id) =
            if slice_flags & flags::HAS_TYPE_ID_COMPACT == flags::HAS_TYPE_ID_COMPACT {
                (String::new(), Some(self.read_size()? as i32))
            } else if slice_flags & flags::HAS_TYPE_ID_STRING != 0 {
                (self.read_string()?, None)
            } else {
                (String::new(), None)
            };

        let size_pos = self.pos;
        let end = if slice_flags & flags::HAS_SLICE_SIZE != 0 {
            let size = self.read_int()?;
            let end = size_pos as i64 + i64::from(size);
            if size < 4 || end > self.limit() as i64 {
                return Err(DecodeError::TruncatedSlice {
                    type_id: match compact_id {
                        Some(id) => format!("#{id}"),
                        None => type_id,
                    },
                });
            }
            end as usize
        } else {
            self.limit()
        };

        Ok(SliceHeader {
            flags: slice_flags,
            type_id,
            compact_id,
            body_start: self.pos,
            end,
        })
    }
}
