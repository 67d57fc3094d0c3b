//! DBF attribute table parsing: one property map per record. Character
//! fields decode with the configured legacy encoding; numeric, logical, and
//! date fields coerce to JSON values leniently.

use encoding_rs::Encoding;
use geojson::{JsonObject, JsonValue};
use serde_json::Number;

use crate::shapefile::ShapefileError;

const FIELD_DESCRIPTOR_LEN: usize = 32;
const HEADER_TERMINATOR: u8 = 0x0D;
const DELETED_FLAG: u8 = b'*';

struct FieldDescriptor {
    name: String,
    kind: u8,
    len: usize,
}

/// Parse the table into per-record property maps. Records flagged as
/// deleted are skipped.
pub fn read_records(
    bytes: &[u8],
    encoding: &'static Encoding,
) -> Result<Vec<JsonObject>, ShapefileError> {
    if bytes.len() < 32 {
        return Err(ShapefileError::Truncated { section: "table header" });
    }
    let record_count = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
    let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
    let record_len = u16::from_le_bytes([bytes[10], bytes[11]]) as usize;
    if header_len > bytes.len() {
        return Err(ShapefileError::Truncated { section: "table header" });
    }

    let fields = read_field_descriptors(&bytes[..header_len])?;
    let cells_len: usize = fields.iter().map(|field| field.len).sum();
    if record_len < 1 + cells_len {
        return Err(ShapefileError::Malformed(format!(
            "record length {record_len} is smaller than the field layout ({})",
            1 + cells_len
        )));
    }

    // The declared record count is untrusted; it must fit the bytes actually
    // present before it drives any allocation.
    let declared_len = record_count
        .checked_mul(record_len)
        .and_then(|len| len.checked_add(header_len))
        .ok_or(ShapefileError::Truncated { section: "record" })?;
    if declared_len > bytes.len() {
        return Err(ShapefileError::Truncated { section: "record" });
    }

    let mut records = Vec::with_capacity(record_count);
    let mut pos = header_len;
    for _ in 0..record_count {
        if pos + record_len > bytes.len() {
            return Err(ShapefileError::Truncated { section: "record" });
        }
        let record = &bytes[pos..pos + record_len];
        pos += record_len;
        if record[0] == DELETED_FLAG {
            continue;
        }

        let mut properties = JsonObject::new();
        let mut cell_pos = 1;
        for field in &fields {
            let raw = &record[cell_pos..cell_pos + field.len];
            cell_pos += field.len;
            properties.insert(field.name.clone(), decode_value(field.kind, raw, encoding));
        }
        records.push(properties);
    }
    Ok(records)
}

fn read_field_descriptors(header: &[u8]) -> Result<Vec<FieldDescriptor>, ShapefileError> {
    let mut fields = Vec::new();
    let mut offset = 32;
    while offset < header.len() && header[offset] != HEADER_TERMINATOR {
        if offset + FIELD_DESCRIPTOR_LEN > header.len() {
            return Err(ShapefileError::Truncated { section: "field descriptors" });
        }
        let descriptor = &header[offset..offset + FIELD_DESCRIPTOR_LEN];
        let name_len = descriptor[..11]
            .iter()
            .position(|&byte| byte == 0)
            .unwrap_or(11);
        let name = String::from_utf8_lossy(&descriptor[..name_len])
            .trim()
            .to_string();
        fields.push(FieldDescriptor {
            name,
            kind: descriptor[11],
            len: descriptor[16] as usize,
        });
        offset += FIELD_DESCRIPTOR_LEN;
    }
    Ok(fields)
}

fn decode_value(kind: u8, raw: &[u8], encoding: &'static Encoding) -> JsonValue {
    match kind {
        b'N' | b'F' => decode_numeric(raw),
        b'L' => decode_logical(raw),
        b'D' => decode_date(raw),
        // 'C' and anything unrecognized: text in the configured encoding.
        _ => decode_text(raw, encoding),
    }
}

fn decode_text(raw: &[u8], encoding: &'static Encoding) -> JsonValue {
    let (text, _, _) = encoding.decode(raw);
    let trimmed = text.trim_matches(|c: char| c == ' ' || c == '\0');
    if trimmed.is_empty() {
        JsonValue::Null
    } else {
        JsonValue::String(trimmed.to_string())
    }
}

fn decode_numeric(raw: &[u8]) -> JsonValue {
    let text = String::from_utf8_lossy(raw);
    let trimmed = text.trim_matches(|c: char| c == ' ' || c == '\0' || c == '*');
    if trimmed.is_empty() {
        return JsonValue::Null;
    }
    if !trimmed.contains('.') {
        if let Ok(value) = trimmed.parse::<i64>() {
            return JsonValue::Number(Number::from(value));
        }
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(JsonValue::Number)
        .unwrap_or(JsonValue::Null)
}

fn decode_logical(raw: &[u8]) -> JsonValue {
    match raw.iter().find(|&&byte| byte != b' ') {
        Some(b'T') | Some(b't') | Some(b'Y') | Some(b'y') => JsonValue::Bool(true),
        Some(b'F') | Some(b'f') | Some(b'N') | Some(b'n') => JsonValue::Bool(false),
        _ => JsonValue::Null,
    }
}

fn decode_date(raw: &[u8]) -> JsonValue {
    let text = String::from_utf8_lossy(raw);
    let trimmed = text.trim();
    if trimmed.len() == 8 && trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
        JsonValue::String(format!(
            "{}-{}-{}",
            &trimmed[..4],
            &trimmed[4..6],
            &trimmed[6..8]
        ))
    } else {
        JsonValue::Null
    }
}
