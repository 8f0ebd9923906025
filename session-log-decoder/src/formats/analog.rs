//! Analog data file reader
//!
//! Analog files are a flat stream of little-endian 32-bit signed integers with
//! no header. Consecutive pairs form one sample: `(timestamp_ms, value)`.

use crate::types::{LogError, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;

/// Size of one `(timestamp, value)` record in bytes
const RECORD_SIZE: usize = 8;

/// One analog sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalogSample {
    /// Milliseconds since the session started
    pub time: i32,
    /// Raw sample value
    pub value: i32,
}

/// Read an analog data file into memory and decode all samples
pub fn load_analog_data(path: &Path) -> Result<Vec<AnalogSample>> {
    log::info!("Loading analog data file: {:?}", path);

    let bytes = std::fs::read(path)?;
    let samples = parse_analog_data(&bytes)?;

    log::debug!("Read {} analog samples from {:?}", samples.len(), path);
    Ok(samples)
}

/// Decode analog samples from raw bytes
pub fn parse_analog_data(bytes: &[u8]) -> Result<Vec<AnalogSample>> {
    if bytes.len() % RECORD_SIZE != 0 {
        return Err(LogError::InvalidData(format!(
            "analog data length {} is not a whole number of (timestamp, value) pairs",
            bytes.len()
        )));
    }

    let mut reader = Cursor::new(bytes);
    let mut samples = Vec::with_capacity(bytes.len() / RECORD_SIZE);

    for _ in 0..bytes.len() / RECORD_SIZE {
        let time = reader.read_i32::<LittleEndian>()?;
        let value = reader.read_i32::<LittleEndian>()?;
        samples.push(AnalogSample { time, value });
    }

    Ok(samples)
}
