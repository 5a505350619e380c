use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;
use tracing::info;

use super::RawHand;

/// One recorded frame of tracker output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceFrame {
    /// Milliseconds since the previous frame.
    pub dt_ms: u64,
    #[serde(default)]
    pub hands: Vec<RawHand>,
}

/// A landmark recording stored as JSON lines, one `TraceFrame` per line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trace {
    pub frames: Vec<TraceFrame>,
}

impl Trace {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Trace> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("Failed to open trace: {:?}", path))?;
        let trace = Self::from_reader(file).with_context(|| format!("Failed to parse trace: {:?}", path))?;

        info!("Loaded {} frames from {:?}", trace.frames.len(), path);
        Ok(trace)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Trace> {
        let reader = BufReader::new(reader);
        let mut frames = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read line {}", line_num + 1))?;

            if line.trim().is_empty() {
                continue;
            }

            let frame: TraceFrame = serde_json::from_str(&line)
                .with_context(|| format!("Invalid frame at line {}", line_num + 1))?;
            frames.push(frame);
        }

        Ok(Trace { frames })
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        for frame in &self.frames {
            serde_json::to_writer(&mut writer, frame).context("Failed to serialize frame")?;
            writer.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Total recorded duration.
    pub fn duration_ms(&self) -> u64 {
        self.frames.iter().map(|f| f.dt_ms).sum()
    }
}
