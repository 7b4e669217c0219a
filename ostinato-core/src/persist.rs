//! Session-state codec for the two generative amounts.
//!
//! The amounts trail the host's earlier fields as two little-endian `f32`s
//! (spice, then humanize). A stream that ends before the first float predates
//! them and loads as the defaults; one that ends after the first float but
//! before the second is corrupt.

use std::io::{ErrorKind, Read, Write};

use ostinato_types::GenerativeAmounts;

#[derive(Debug)]
pub enum PersistError {
    Io(std::io::Error),
    /// The stream ended partway through the named field.
    Truncated { field: &'static str },
}

impl From<std::io::Error> for PersistError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl std::fmt::Display for PersistError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {}", e),
            Self::Truncated { field } => write!(f, "state stream truncated in {}", field),
        }
    }
}

impl std::error::Error for PersistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Truncated { .. } => None,
        }
    }
}

pub fn write_amounts<W: Write>(out: &mut W, amounts: &GenerativeAmounts) -> Result<(), PersistError> {
    out.write_all(&amounts.spice.to_le_bytes())?;
    out.write_all(&amounts.humanize.to_le_bytes())?;
    Ok(())
}

pub fn read_amounts<R: Read>(input: &mut R) -> Result<GenerativeAmounts, PersistError> {
    let spice = match read_f32(input)? {
        Field::Missing => {
            log::debug!(target: "persist", "no generative amounts in state, using defaults");
            return Ok(GenerativeAmounts::default());
        }
        Field::Partial => return Err(PersistError::Truncated { field: "spice" }),
        Field::Value(v) => v,
    };
    let humanize = match read_f32(input)? {
        Field::Value(v) => v,
        Field::Missing | Field::Partial => {
            log::warn!(target: "persist", "state stream ends after spice amount");
            return Err(PersistError::Truncated { field: "humanize" });
        }
    };
    Ok(GenerativeAmounts::new(spice, humanize))
}

enum Field {
    Missing,
    Partial,
    Value(f32),
}

fn read_f32<R: Read>(input: &mut R) -> Result<Field, PersistError> {
    let mut buf = [0u8; 4];
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(match filled {
        0 => Field::Missing,
        4 => Field::Value(f32::from_le_bytes(buf)),
        _ => Field::Partial,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trip_is_exact() {
        let mut buf = Vec::new();
        write_amounts(&mut buf, &GenerativeAmounts::new(0.35, 0.25)).unwrap();
        assert_eq!(buf.len(), 8);
        let loaded = read_amounts(&mut Cursor::new(buf)).unwrap();
        assert_eq!(loaded.spice, 0.35);
        assert_eq!(loaded.humanize, 0.25);
    }

    #[test]
    fn empty_stream_loads_defaults() {
        let loaded = read_amounts(&mut Cursor::new(Vec::<u8>::new())).unwrap();
        assert_eq!(loaded, GenerativeAmounts::default());
    }

    #[test]
    fn missing_second_amount_is_corrupt() {
        let buf = 0.5f32.to_le_bytes().to_vec();
        let err = read_amounts(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, PersistError::Truncated { field: "humanize" }));
    }

    #[test]
    fn partial_floats_are_corrupt() {
        let err = read_amounts(&mut Cursor::new(vec![0u8, 1])).unwrap_err();
        assert!(matches!(err, PersistError::Truncated { field: "spice" }));

        let mut buf = 0.5f32.to_le_bytes().to_vec();
        buf.extend_from_slice(&[0, 0, 0]);
        let err = read_amounts(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, PersistError::Truncated { field: "humanize" }));
    }

    #[test]
    fn loaded_values_are_sanitized() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&f32::NAN.to_le_bytes());
        buf.extend_from_slice(&4.0f32.to_le_bytes());
        let loaded = read_amounts(&mut Cursor::new(buf)).unwrap();
        assert_eq!(loaded, GenerativeAmounts::new(0.0, 1.0));
    }

    #[test]
    fn reads_after_earlier_fields() {
        let mut buf = b"HOST".to_vec();
        write_amounts(&mut buf, &GenerativeAmounts::new(0.1, 0.9)).unwrap();
        let mut cursor = Cursor::new(buf);
        let mut header = [0u8; 4];
        cursor.read_exact(&mut header).unwrap();
        let loaded = read_amounts(&mut cursor).unwrap();
        assert_eq!(loaded, GenerativeAmounts::new(0.1, 0.9));
    }
}
