//! SHP geometry record parsing. Supported shape types: 0 (Null), 1 (Point),
//! 3 (PolyLine), 5 (Polygon), 8 (MultiPoint).

use geojson::{Geometry, Value};

use crate::shapefile::ShapefileError;

const SHP_FILE_CODE: i32 = 9994;
const SHP_HEADER_LEN: usize = 100;

const SHAPE_NULL: i32 = 0;
const SHAPE_POINT: i32 = 1;
const SHAPE_POLYLINE: i32 = 3;
const SHAPE_POLYGON: i32 = 5;
const SHAPE_MULTIPOINT: i32 = 8;

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, len: usize, section: &'static str) -> Result<&'a [u8], ShapefileError> {
        if self.remaining() < len {
            return Err(ShapefileError::Truncated { section });
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn i32_be(&mut self, section: &'static str) -> Result<i32, ShapefileError> {
        let bytes = self.take(4, section)?;
        Ok(i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn i32_le(&mut self, section: &'static str) -> Result<i32, ShapefileError> {
        let bytes = self.take(4, section)?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn f64_le(&mut self, section: &'static str) -> Result<f64, ShapefileError> {
        let bytes = self.take(8, section)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(f64::from_le_bytes(raw))
    }
}

/// Parse all geometry records. `None` entries are null shapes (features with
/// null geometry in the output document).
pub fn read_geometries(bytes: &[u8]) -> Result<Vec<Option<Geometry>>, ShapefileError> {
    let mut cursor = Cursor::new(bytes);
    let file_code = cursor.i32_be("file header")?;
    if file_code != SHP_FILE_CODE {
        return Err(ShapefileError::BadFileCode(file_code));
    }
    cursor.take(SHP_HEADER_LEN - 4, "file header")?;

    let mut geometries = Vec::new();
    while cursor.remaining() >= 8 {
        let _record_number = cursor.i32_be("record header")?;
        let content_words = cursor.i32_be("record header")?;
        let content_len = usize::try_from(content_words)
            .map_err(|_| ShapefileError::Truncated { section: "record header" })?
            * 2;
        let content = cursor.take(content_len, "record content")?;
        geometries.push(read_shape(content)?);
    }
    Ok(geometries)
}

fn read_shape(content: &[u8]) -> Result<Option<Geometry>, ShapefileError> {
    let mut cursor = Cursor::new(content);
    let shape_type = cursor.i32_le("shape type")?;
    match shape_type {
        SHAPE_NULL => Ok(None),
        SHAPE_POINT => {
            let x = cursor.f64_le("point")?;
            let y = cursor.f64_le("point")?;
            Ok(Some(Geometry::new(Value::Point(vec![x, y]))))
        }
        SHAPE_MULTIPOINT => {
            cursor.take(32, "multipoint box")?;
            let num_points = read_count(&mut cursor, "multipoint count")?;
            let points = read_points(&mut cursor, num_points, "multipoint points")?;
            Ok(Some(Geometry::new(Value::MultiPoint(points))))
        }
        SHAPE_POLYLINE => {
            let parts = read_parts(&mut cursor, "polyline")?;
            if parts.len() == 1 {
                let mut parts = parts;
                Ok(Some(Geometry::new(Value::LineString(
                    parts.swap_remove(0),
                ))))
            } else {
                Ok(Some(Geometry::new(Value::MultiLineString(parts))))
            }
        }
        SHAPE_POLYGON => {
            let rings = read_parts(&mut cursor, "polygon")?;
            let mut polygons = group_rings(rings);
            if polygons.len() == 1 {
                Ok(Some(Geometry::new(Value::Polygon(polygons.swap_remove(0)))))
            } else {
                Ok(Some(Geometry::new(Value::MultiPolygon(polygons))))
            }
        }
        other => Err(ShapefileError::UnsupportedShapeType(other)),
    }
}

fn read_count(cursor: &mut Cursor<'_>, section: &'static str) -> Result<usize, ShapefileError> {
    let count = cursor.i32_le(section)?;
    usize::try_from(count).map_err(|_| ShapefileError::Truncated { section })
}

fn read_points(
    cursor: &mut Cursor<'_>,
    count: usize,
    section: &'static str,
) -> Result<Vec<Vec<f64>>, ShapefileError> {
    // 16 bytes per point; a declared count beyond the remaining bytes must
    // fail before it drives the allocation.
    if count > cursor.remaining() / 16 {
        return Err(ShapefileError::Truncated { section });
    }
    let mut points = Vec::with_capacity(count);
    for _ in 0..count {
        let x = cursor.f64_le(section)?;
        let y = cursor.f64_le(section)?;
        points.push(vec![x, y]);
    }
    Ok(points)
}

/// Read the shared PolyLine/Polygon layout (box, part indices, point pool)
/// and split the pool into per-part point lists.
fn read_parts(
    cursor: &mut Cursor<'_>,
    section: &'static str,
) -> Result<Vec<Vec<Vec<f64>>>, ShapefileError> {
    cursor.take(32, section)?;
    let num_parts = read_count(cursor, section)?;
    let num_points = read_count(cursor, section)?;

    // 4 bytes per part index, checked like the point count above.
    if num_parts > cursor.remaining() / 4 {
        return Err(ShapefileError::Truncated { section });
    }
    let mut starts = Vec::with_capacity(num_parts);
    for _ in 0..num_parts {
        starts.push(read_count(cursor, section)?);
    }
    let points = read_points(cursor, num_points, section)?;

    let mut parts = Vec::with_capacity(num_parts);
    for (index, &start) in starts.iter().enumerate() {
        let end = starts.get(index + 1).copied().unwrap_or(num_points);
        if start > end || end > num_points {
            return Err(ShapefileError::Truncated { section });
        }
        parts.push(points[start..end].to_vec());
    }
    Ok(parts)
}

/// Group polygon rings by winding: a clockwise ring opens a new polygon,
/// counter-clockwise rings are holes attached to the last opened one. A
/// leading hole is promoted to an outer ring.
fn group_rings(rings: Vec<Vec<Vec<f64>>>) -> Vec<Vec<Vec<Vec<f64>>>> {
    let mut polygons: Vec<Vec<Vec<Vec<f64>>>> = Vec::new();
    for ring in rings {
        let clockwise = signed_area(&ring) < 0.0;
        match polygons.last_mut() {
            Some(polygon) if !clockwise => polygon.push(ring),
            _ => polygons.push(vec![ring]),
        }
    }
    polygons
}

fn signed_area(ring: &[Vec<f64>]) -> f64 {
    let mut sum = 0.0;
    for window in ring.windows(2) {
        sum += window[0][0] * window[1][1] - window[1][0] * window[0][1];
    }
    sum / 2.0
}
