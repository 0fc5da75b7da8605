//! Compact binary form of the manifest.
//!
//! Protobuf-style tagged fields. The blob is a sequence of length-delimited
//! field-1 entries, one per manifest id; each entry holds one record:
//!
//! | tag | field       | wire type                          |
//! |-----|-------------|------------------------------------|
//! | 1   | id          | length-delimited UTF-8             |
//! | 2   | width       | varint                             |
//! | 3   | height      | varint                             |
//! | 4   | x           | varint                             |
//! | 5   | y           | varint                             |
//! | 6   | pixel ratio | fixed32 float, omitted when 1.0    |
//! | 7   | sdf         | varint bool, omitted when false    |
//!
//! Zones are not part of the binary form. Unknown fields are skipped on decode.

use crate::error::{Result, SpriteError};
use crate::model::{Manifest, ManifestRecord};

const WIRE_VARINT: u8 = 0;
const WIRE_FIXED64: u8 = 1;
const WIRE_LEN: u8 = 2;
const WIRE_FIXED32: u8 = 5;

const FIELD_RECORD: u32 = 1;
const FIELD_ID: u32 = 1;
const FIELD_WIDTH: u32 = 2;
const FIELD_HEIGHT: u32 = 3;
const FIELD_X: u32 = 4;
const FIELD_Y: u32 = 5;
const FIELD_PIXEL_RATIO: u32 = 6;
const FIELD_SDF: u32 = 7;

fn put_varint(out: &mut Vec<u8>, mut v: u64) {
    while v >= 0x80 {
        out.push((v as u8) | 0x80);
        v >>= 7;
    }
    out.push(v as u8);
}

fn put_key(out: &mut Vec<u8>, field: u32, wire: u8) {
    put_varint(out, (u64::from(field) << 3) | u64::from(wire));
}

fn put_bytes(out: &mut Vec<u8>, field: u32, bytes: &[u8]) {
    put_key(out, field, WIRE_LEN);
    put_varint(out, bytes.len() as u64);
    out.extend_from_slice(bytes);
}

fn put_uint(out: &mut Vec<u8>, field: u32, v: u32) {
    put_key(out, field, WIRE_VARINT);
    put_varint(out, u64::from(v));
}

/// Encodes one record body under `id`.
pub fn encode_record(id: &str, record: &ManifestRecord) -> Vec<u8> {
    let mut out = Vec::with_capacity(id.len() + 24);
    put_bytes(&mut out, FIELD_ID, id.as_bytes());
    put_uint(&mut out, FIELD_WIDTH, record.width);
    put_uint(&mut out, FIELD_HEIGHT, record.height);
    put_uint(&mut out, FIELD_X, record.x);
    put_uint(&mut out, FIELD_Y, record.y);
    if record.pixel_ratio != 1.0 {
        put_key(&mut out, FIELD_PIXEL_RATIO, WIRE_FIXED32);
        out.extend_from_slice(&record.pixel_ratio.to_le_bytes());
    }
    if record.sdf {
        put_key(&mut out, FIELD_SDF, WIRE_VARINT);
        put_varint(&mut out, 1);
    }
    out
}

/// Encodes every `(id, record)` pair of the manifest, ids in ascending order.
pub fn encode_manifest(manifest: &Manifest) -> Vec<u8> {
    let mut out = Vec::new();
    for (id, record) in manifest.iter() {
        put_bytes(&mut out, FIELD_RECORD, &encode_record(id, record));
    }
    out
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn varint(&mut self) -> Result<u64> {
        let mut value = 0u64;
        for shift in (0..64).step_by(7) {
            let byte = *self
                .buf
                .get(self.pos)
                .ok_or_else(|| decode_error("truncated varint"))?;
            self.pos += 1;
            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(decode_error("varint longer than 10 bytes"))
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or_else(|| decode_error("field runs past end of data"))?;
        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn key(&mut self) -> Result<(u32, u8)> {
        let key = self.varint()?;
        let field = u32::try_from(key >> 3).map_err(|_| decode_error("field number overflow"))?;
        Ok((field, (key & 0x7) as u8))
    }

    fn len_delimited(&mut self) -> Result<&'a [u8]> {
        let len = self.varint()?;
        let len = usize::try_from(len).map_err(|_| decode_error("length overflow"))?;
        self.take(len)
    }

    fn skip(&mut self, wire: u8) -> Result<()> {
        match wire {
            WIRE_VARINT => self.varint().map(|_| ()),
            WIRE_FIXED64 => self.take(8).map(|_| ()),
            WIRE_LEN => self.len_delimited().map(|_| ()),
            WIRE_FIXED32 => self.take(4).map(|_| ()),
            other => Err(decode_error(&format!("unsupported wire type {other}"))),
        }
    }

    fn uint(&mut self) -> Result<u32> {
        u32::try_from(self.varint()?).map_err(|_| decode_error("value does not fit in u32"))
    }
}

fn decode_error(msg: &str) -> SpriteError {
    SpriteError::ManifestDecode(msg.to_string())
}

fn expect_wire(field: u32, wire: u8, expected: u8) -> Result<()> {
    if wire != expected {
        return Err(decode_error(&format!(
            "field {field} has wire type {wire}, expected {expected}"
        )));
    }
    Ok(())
}

/// Decodes one record body.
pub fn decode_record(body: &[u8]) -> Result<ManifestRecord> {
    let mut r = Reader::new(body);
    let mut id = None;
    let mut record = ManifestRecord {
        id: String::new(),
        x: 0,
        y: 0,
        width: 0,
        height: 0,
        pixel_ratio: 1.0,
        sdf: false,
        metadata: Default::default(),
    };
    while !r.is_empty() {
        let (field, wire) = r.key()?;
        match field {
            FIELD_ID => {
                expect_wire(field, wire, WIRE_LEN)?;
                let bytes = r.len_delimited()?;
                let text = std::str::from_utf8(bytes)
                    .map_err(|_| decode_error("record id is not UTF-8"))?;
                id = Some(text.to_string());
            }
            FIELD_WIDTH | FIELD_HEIGHT | FIELD_X | FIELD_Y => {
                expect_wire(field, wire, WIRE_VARINT)?;
                let v = r.uint()?;
                match field {
                    FIELD_WIDTH => record.width = v,
                    FIELD_HEIGHT => record.height = v,
                    FIELD_X => record.x = v,
                    _ => record.y = v,
                }
            }
            FIELD_PIXEL_RATIO => {
                expect_wire(field, wire, WIRE_FIXED32)?;
                let bytes = r.take(4)?;
                record.pixel_ratio = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            }
            FIELD_SDF => {
                expect_wire(field, wire, WIRE_VARINT)?;
                record.sdf = r.varint()? != 0;
            }
            _ => r.skip(wire)?,
        }
    }
    record.id = id.ok_or_else(|| decode_error("record without id"))?;
    Ok(record)
}

/// Decodes a blob produced by [`encode_manifest`].
pub fn decode_manifest(blob: &[u8]) -> Result<Manifest> {
    let mut r = Reader::new(blob);
    let mut manifest = Manifest::new();
    while !r.is_empty() {
        let (field, wire) = r.key()?;
        if field == FIELD_RECORD && wire == WIRE_LEN {
            let record = decode_record(r.len_delimited()?)?;
            if manifest.contains(&record.id) {
                return Err(decode_error(&format!("duplicate record id {:?}", record.id)));
            }
            manifest.insert(record);
        } else {
            r.skip(wire)?;
        }
    }
    Ok(manifest)
}
