//! NumPy `.npy` encoding for spectrogram arrays
//!
//! Writes format version 1.0 with a little-endian `float32` payload in C order,
//! readable with `numpy.load`. The reader accepts versions 1.0 and 2.0 with
//! `<f4` or `<f8` payloads.

use std::io::{Read, Write};

/// Magic prefix of every `.npy` file
const MAGIC: &[u8; 6] = b"\x93NUMPY";

/// Header block (magic + version + length + dict) is padded to this multiple
const HEADER_ALIGN: usize = 64;

/// Array decoded from a `.npy` file
#[derive(Debug, Clone, PartialEq)]
pub struct NpyArray {
    /// Shape of the array
    pub shape: Vec<usize>,
    /// Values in C (row-major) order
    pub data: Vec<f32>,
}

/// Write a row-major `f32` array
///
/// `data.len()` must equal the product of `shape`.
pub fn write_npy_f32<W: Write>(writer: &mut W, shape: &[usize], data: &[f32]) -> std::io::Result<()> {
    let expected: usize = shape.iter().product();
    if expected != data.len() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("shape {:?} needs {} values, got {}", shape, expected, data.len()),
        ));
    }

    let shape_text = match shape {
        [single] => format!("({},)", single),
        dims => format!(
            "({})",
            dims.iter().map(|d| d.to_string()).collect::<Vec<_>>().join(", ")
        ),
    };
    let mut header = format!(
        "{{'descr': '<f4', 'fortran_order': False, 'shape': {}, }}",
        shape_text
    );

    // 6 magic + 2 version + 2 length + header + trailing newline
    let unpadded = MAGIC.len() + 2 + 2 + header.len() + 1;
    let padding = (HEADER_ALIGN - unpadded % HEADER_ALIGN) % HEADER_ALIGN;
    header.push_str(&" ".repeat(padding));
    header.push('\n');

    let header_len = u16::try_from(header.len()).map_err(|_| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "npy header too long")
    })?;

    writer.write_all(MAGIC)?;
    writer.write_all(&[1, 0])?;
    writer.write_all(&header_len.to_le_bytes())?;
    writer.write_all(header.as_bytes())?;

    let mut payload = Vec::with_capacity(data.len() * 4);
    for v in data {
        payload.extend_from_slice(&v.to_le_bytes());
    }
    writer.write_all(&payload)?;
    writer.flush()
}

/// Read an `f32` (or `f64`, narrowed) array
pub fn read_npy_f32<R: Read>(reader: &mut R) -> std::io::Result<NpyArray> {
    let mut magic = [0u8; 6];
    reader.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(invalid("not an npy file (bad magic)"));
    }

    let mut version = [0u8; 2];
    reader.read_exact(&mut version)?;
    let header_len = match version[0] {
        1 => {
            let mut len = [0u8; 2];
            reader.read_exact(&mut len)?;
            u16::from_le_bytes(len) as usize
        }
        2 | 3 => {
            let mut len = [0u8; 4];
            reader.read_exact(&mut len)?;
            u32::from_le_bytes(len) as usize
        }
        other => return Err(invalid(&format!("unsupported npy version {}", other))),
    };

    let header = read_exactly(reader, header_len as u64)?;
    let header = String::from_utf8_lossy(&header);

    let descr = header_value(&header, "descr")
        .map(|v| v.trim_matches(|c| c == '\'' || c == '"').to_string())
        .ok_or_else(|| invalid("npy header has no descr"))?;
    let fortran_order = header_value(&header, "fortran_order")
        .map(|v| v.trim() == "True")
        .unwrap_or(false);
    if fortran_order {
        return Err(invalid("fortran-ordered arrays are not supported"));
    }
    let shape = parse_shape(&header).ok_or_else(|| invalid("npy header has no valid shape"))?;
    let count = shape
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| invalid(&format!("npy shape {:?} overflows", shape)))?;

    let width = match descr.as_str() {
        "<f4" => 4,
        "<f8" => 8,
        other => return Err(invalid(&format!("unsupported npy dtype {}", other))),
    };
    let byte_len = count
        .checked_mul(width)
        .and_then(|n| u64::try_from(n).ok())
        .ok_or_else(|| invalid(&format!("npy shape {:?} overflows", shape)))?;
    let bytes = read_exactly(reader, byte_len)?;

    let data = if width == 4 {
        bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect()
    } else {
        bytes
            .chunks_exact(8)
            .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]) as f32)
            .collect()
    };

    Ok(NpyArray { shape, data })
}

/// Read exactly `len` bytes, growing the buffer only as data arrives
fn read_exactly<R: Read>(reader: &mut R, len: u64) -> std::io::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    reader.by_ref().take(len).read_to_end(&mut bytes)?;
    if (bytes.len() as u64) < len {
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("npy file truncated: expected {} bytes, got {}", len, bytes.len()),
        ));
    }
    Ok(bytes)
}

fn invalid(msg: &str) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, msg.to_string())
}

/// Raw text of `'key': value` up to the next top-level comma
fn header_value<'a>(header: &'a str, key: &str) -> Option<&'a str> {
    let pattern = format!("'{}':", key);
    let start = header.find(&pattern)? + pattern.len();
    let rest = header[start..].trim_start();
    let end = rest.find(',').unwrap_or(rest.len());
    Some(rest[..end].trim())
}

fn parse_shape(header: &str) -> Option<Vec<usize>> {
    let start = header.find("'shape':")?;
    let rest = &header[start..];
    let open = rest.find('(')?;
    let close = rest.find(')')?;
    rest[open + 1..close]
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<usize>().ok())
        .collect()
}
