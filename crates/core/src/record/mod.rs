use std::path::{Path, PathBuf};

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::{Result, TrailError};

/// Configuration options for the recording subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingSettings {
    pub output_dir: PathBuf,
    /// Write every Nth frame; 1 keeps them all.
    pub every_nth: u32,
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("frames"),
            every_nth: 1,
        }
    }
}

/// Writes composited frames as a numbered PNG sequence.
#[derive(Debug, Default)]
pub struct FrameRecorder {
    settings: RecordingSettings,
    is_recording: bool,
    offered: u64,
    written: u64,
}

impl FrameRecorder {
    pub fn new(settings: RecordingSettings) -> Self {
        Self {
            settings,
            is_recording: false,
            offered: 0,
            written: 0,
        }
    }

    pub fn start(&mut self) -> Result<()> {
        std::fs::create_dir_all(&self.settings.output_dir)?;
        self.is_recording = true;
        tracing::info!(dir = ?self.settings.output_dir, "recording started");
        Ok(())
    }

    /// Saves `frame` if recording and it falls on the sampling stride.
    /// Returns the written path.
    pub fn write_frame(&mut self, frame: &RgbaImage) -> Result<Option<PathBuf>> {
        if !self.is_recording {
            return Err(TrailError::msg("recorder has not been started"));
        }

        let stride = u64::from(self.settings.every_nth.max(1));
        let offered = self.offered;
        self.offered += 1;
        if offered % stride != 0 {
            return Ok(None);
        }

        let path = self.frame_path(self.written);
        frame.save(&path)?;
        self.written += 1;
        Ok(Some(path))
    }

    pub fn stop(&mut self) -> Result<()> {
        self.is_recording = false;
        tracing::info!(written = self.written, "recording stopped");
        Ok(())
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording
    }

    pub fn frames_written(&self) -> u64 {
        self.written
    }

    pub fn output_dir(&self) -> &Path {
        &self.settings.output_dir
    }

    fn frame_path(&self, index: u64) -> PathBuf {
        self.settings
            .output_dir
            .join(format!("frame_{index:05}.png"))
    }
}
