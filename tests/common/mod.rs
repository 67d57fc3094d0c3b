//! Programmatic SHP/DBF fixture builders shared across suites. The builders
//! emit minimal but well-formed binaries: 100-byte SHP header, big-endian
//! record headers, little-endian shape content; dBASE III table layout.

#![allow(dead_code)]

fn shp_header(shape_type: i32, records: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(100 + records.len());
    bytes.extend_from_slice(&9994i32.to_be_bytes());
    bytes.extend_from_slice(&[0u8; 20]);
    bytes.extend_from_slice(&(((100 + records.len()) / 2) as i32).to_be_bytes());
    bytes.extend_from_slice(&1000i32.to_le_bytes());
    bytes.extend_from_slice(&shape_type.to_le_bytes());
    bytes.extend_from_slice(&[0u8; 64]); // bbox + z/m ranges, unused here
    bytes.extend_from_slice(records);
    bytes
}

fn push_record(out: &mut Vec<u8>, number: i32, content: &[u8]) {
    out.extend_from_slice(&number.to_be_bytes());
    out.extend_from_slice(&((content.len() / 2) as i32).to_be_bytes());
    out.extend_from_slice(content);
}

/// One Point record per coordinate pair.
pub fn shp_points(points: &[(f64, f64)]) -> Vec<u8> {
    let mut records = Vec::new();
    for (index, (x, y)) in points.iter().enumerate() {
        let mut content = Vec::new();
        content.extend_from_slice(&1i32.to_le_bytes());
        content.extend_from_slice(&x.to_le_bytes());
        content.extend_from_slice(&y.to_le_bytes());
        push_record(&mut records, index as i32 + 1, &content);
    }
    shp_header(1, &records)
}

fn parts_content(shape_type: i32, parts: &[Vec<(f64, f64)>]) -> Vec<u8> {
    let mut content = Vec::new();
    content.extend_from_slice(&shape_type.to_le_bytes());
    content.extend_from_slice(&[0u8; 32]); // record bbox
    content.extend_from_slice(&(parts.len() as i32).to_le_bytes());
    let total: i32 = parts.iter().map(|part| part.len() as i32).sum();
    content.extend_from_slice(&total.to_le_bytes());
    let mut start = 0i32;
    for part in parts {
        content.extend_from_slice(&start.to_le_bytes());
        start += part.len() as i32;
    }
    for part in parts {
        for (x, y) in part {
            content.extend_from_slice(&x.to_le_bytes());
            content.extend_from_slice(&y.to_le_bytes());
        }
    }
    content
}

/// One PolyLine record with the given parts.
pub fn shp_polyline(parts: &[Vec<(f64, f64)>]) -> Vec<u8> {
    let mut records = Vec::new();
    push_record(&mut records, 1, &parts_content(3, parts));
    shp_header(3, &records)
}

/// One Polygon record with the given rings (caller controls winding).
pub fn shp_polygon(rings: &[Vec<(f64, f64)>]) -> Vec<u8> {
    let mut records = Vec::new();
    push_record(&mut records, 1, &parts_content(5, rings));
    shp_header(5, &records)
}

/// One MultiPoint record.
pub fn shp_multipoint(points: &[(f64, f64)]) -> Vec<u8> {
    let mut content = Vec::new();
    content.extend_from_slice(&8i32.to_le_bytes());
    content.extend_from_slice(&[0u8; 32]);
    content.extend_from_slice(&(points.len() as i32).to_le_bytes());
    for (x, y) in points {
        content.extend_from_slice(&x.to_le_bytes());
        content.extend_from_slice(&y.to_le_bytes());
    }
    let mut records = Vec::new();
    push_record(&mut records, 1, &content);
    shp_header(8, &records)
}

/// One Null shape record.
pub fn shp_null() -> Vec<u8> {
    let mut records = Vec::new();
    push_record(&mut records, 1, &0i32.to_le_bytes());
    shp_header(0, &records)
}

/// One record with caller-supplied content bytes, for malformed inputs.
pub fn shp_record(shape_type: i32, content: &[u8]) -> Vec<u8> {
    let mut records = Vec::new();
    push_record(&mut records, 1, content);
    shp_header(shape_type, &records)
}

/// One record of an out-of-scope shape type (e.g. 11 = PointZ).
pub fn shp_unsupported(shape_type: i32) -> Vec<u8> {
    let mut content = Vec::new();
    content.extend_from_slice(&shape_type.to_le_bytes());
    content.extend_from_slice(&[0u8; 24]);
    let mut records = Vec::new();
    push_record(&mut records, 1, &content);
    shp_header(shape_type, &records)
}

pub struct DbfField {
    pub name: &'static str,
    pub kind: u8,
    pub len: u8,
}

/// Build a dBASE III table. Cells are raw bytes so legacy encodings can be
/// exercised; shorter cells are space-padded to the field length.
pub fn dbf_table(fields: &[DbfField], rows: &[Vec<Vec<u8>>]) -> Vec<u8> {
    let header_len = 32 + 32 * fields.len() + 1;
    let record_len = 1 + fields.iter().map(|field| field.len as usize).sum::<usize>();

    let mut bytes = Vec::new();
    bytes.push(0x03);
    bytes.extend_from_slice(&[26, 1, 1]); // last-update date
    bytes.extend_from_slice(&(rows.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&(header_len as u16).to_le_bytes());
    bytes.extend_from_slice(&(record_len as u16).to_le_bytes());
    bytes.extend_from_slice(&[0u8; 20]);
    for field in fields {
        let mut descriptor = [0u8; 32];
        descriptor[..field.name.len()].copy_from_slice(field.name.as_bytes());
        descriptor[11] = field.kind;
        descriptor[16] = field.len;
        bytes.extend_from_slice(&descriptor);
    }
    bytes.push(0x0D);
    for row in rows {
        bytes.push(b' ');
        for (field, cell) in fields.iter().zip(row) {
            let mut padded = vec![b' '; field.len as usize];
            let len = cell.len().min(field.len as usize);
            padded[..len].copy_from_slice(&cell[..len]);
            bytes.extend_from_slice(&padded);
        }
    }
    bytes.push(0x1A);
    bytes
}

pub fn text_cells(cells: &[&str]) -> Vec<Vec<u8>> {
    cells.iter().map(|cell| cell.as_bytes().to_vec()).collect()
}

/// A one-column, one-row name table: the typical attribute fixture.
pub fn dbf_names(names: &[&str]) -> Vec<u8> {
    let fields = [DbfField {
        name: "NAME",
        kind: b'C',
        len: 32,
    }];
    let rows: Vec<Vec<Vec<u8>>> = names.iter().map(|name| text_cells(&[name])).collect();
    dbf_table(&fields, &rows)
}
