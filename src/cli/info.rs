use std::path::Path;

use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use serde::Serialize;

use super::command::{Cli, InfoArgs};
use crate::config::Config;
use crate::input::InputReader;
use crate::timestamp::time_str;
use av3a::process::extract::{Extractor, ExtractorState};
use av3a::process::output::FrameSink;
use av3a::structs::format::{FrameMetadata, StreamFormat};

pub fn cmd_info(args: &InfoArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!("Analyzing AV3A stream: {}", args.input.display());

    let config = Config::resolve(cli)?;
    let summary = analyze_stream(&args.input, &config, multi)?;

    if args.yaml {
        print!("{}", serde_yaml_ng::to_string(&summary)?);
    } else {
        display_summary(&summary);
    }

    if cli.strict && summary.headers_rejected > 0 {
        anyhow::bail!(
            "{} sync candidates were rejected (--strict)",
            summary.headers_rejected
        );
    }

    Ok(())
}

fn analyze_stream(
    input_path: &Path,
    config: &Config,
    multi: Option<&MultiProgress>,
) -> Result<StreamSummary> {
    let mut input_reader = InputReader::new(input_path)?;
    let mut extractor = Extractor::new(config.extractor_config());
    let mut context = AnalysisContext::default();

    if let Some(multi) = multi {
        let pb = multi.add(ProgressBar::new_spinner());
        pb.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb.set_message("Analyzing frames...");
        context.pb = Some(pb);
    }

    extractor.packet_started(config.start_time_us.unwrap_or(0));

    let mut input_bytes = 0u64;
    input_reader.process_chunks(config.chunk_size, |chunk| {
        input_bytes += chunk.len() as u64;
        extractor.consume(chunk, &mut context)?;
        Ok(true)
    })?;

    if extractor.state() != ExtractorState::Searching {
        log::warn!("Stream ends inside a frame; the partial frame is dropped");
    }

    if let Some(pb) = context.pb.take() {
        pb.finish_and_clear();
    }

    Ok(context.summary(&extractor, input_bytes))
}

#[derive(Default)]
struct AnalysisContext {
    format: Option<StreamFormat>,
    frame_count: usize,
    frame_bytes: u64,
    first_timestamp_us: Option<i64>,
    last_timestamp_us: Option<i64>,
    duration_us: i64,
    min_frame_size: Option<usize>,
    max_frame_size: Option<usize>,
    pb: Option<ProgressBar>,
}

impl AnalysisContext {
    fn summary(&self, extractor: &Extractor, input_bytes: u64) -> StreamSummary {
        StreamSummary {
            format: self.format.as_ref().map(FormatSummary::from),
            frames: self.frame_count,
            frame_bytes: self.frame_bytes,
            input_bytes,
            skipped_bytes: input_bytes.saturating_sub(self.frame_bytes),
            headers_rejected: extractor.headers_rejected(),
            format_changes: extractor.format_changes(),
            first_timestamp_us: self.first_timestamp_us,
            last_timestamp_us: self.last_timestamp_us,
            duration_us: self.duration_us,
            min_frame_size: self.min_frame_size,
            max_frame_size: self.max_frame_size,
        }
    }
}

impl FrameSink for AnalysisContext {
    fn format(&mut self, format: &StreamFormat) -> Result<()> {
        self.format = Some(format.clone());
        Ok(())
    }

    fn sample_data(&mut self, _data: &[u8]) -> Result<()> {
        Ok(())
    }

    fn sample_metadata(&mut self, metadata: &FrameMetadata) -> Result<()> {
        if let Some(ts) = metadata.timestamp_us {
            self.first_timestamp_us.get_or_insert(ts);
            self.last_timestamp_us = Some(ts);
        }

        self.frame_count += 1;
        self.frame_bytes += metadata.size as u64;
        self.duration_us += metadata.duration_us;

        let size = metadata.size;
        self.min_frame_size = Some(self.min_frame_size.map_or(size, |m| m.min(size)));
        self.max_frame_size = Some(self.max_frame_size.map_or(size, |m| m.max(size)));

        if self.frame_count.is_multiple_of(100) {
            if let Some(ref pb) = self.pb {
                pb.set_message(format!("Analyzing frames...       {}", self.frame_count));
                pb.tick();
            }
        }

        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct StreamSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<FormatSummary>,
    frames: usize,
    frame_bytes: u64,
    input_bytes: u64,
    skipped_bytes: u64,
    headers_rejected: usize,
    format_changes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_timestamp_us: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_timestamp_us: Option<i64>,
    duration_us: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_frame_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_frame_size: Option<usize>,
}

#[derive(Debug, Serialize)]
pub(super) struct FormatSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    mime_type: String,
    channels: u32,
    sample_rate: u32,
    bitrate: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<String>,
    max_input_size: usize,
}

impl From<&StreamFormat> for FormatSummary {
    fn from(format: &StreamFormat) -> Self {
        Self {
            id: format.id.clone(),
            mime_type: format.sample_mime_type.to_string(),
            channels: format.channel_count,
            sample_rate: format.sample_rate,
            bitrate: format.average_bitrate,
            language: format.language.clone(),
            max_input_size: format.max_input_size,
        }
    }
}

fn display_summary(summary: &StreamSummary) {
    let Some(format) = &summary.format else {
        println!("No AV3A frame header found in the input.");
        println!("This doesn't appear to be a valid AV3A stream.");
        return;
    };

    println!();
    println!("AV3A Stream Information");
    println!("=======================");
    println!();

    println!("Stream Information");
    println!("  MIME type                 {}", format.mime_type);
    println!("  Sampling rate             {} Hz", format.sample_rate);
    println!("  Channels                  {}", format.channels);
    println!("  Bitrate                   {} kbps", format.bitrate / 1000);
    if let Some(language) = &format.language {
        println!("  Language                  {language}");
    }
    println!();

    println!("Analysis Summary");
    println!("  Frames processed          {}", summary.frames);

    let size_mb = summary.input_bytes as f64 / 1_000_000.0;
    println!(
        "  Size                      {size_mb:.2} MB ({} bytes)",
        summary.input_bytes
    );

    if summary.skipped_bytes > 0 {
        println!("  Bytes outside frames      {}", summary.skipped_bytes);
    }

    if let (Some(min), Some(max)) = (summary.min_frame_size, summary.max_frame_size) {
        println!("  Frame size                {min} - {max} bytes");
    }

    if let Some(first) = summary.first_timestamp_us {
        println!("  First timestamp           {}", time_str(first));
    }

    println!("  Duration                  {}", time_str(summary.duration_us));

    if summary.duration_us > 0 {
        let avg_kbps =
            (summary.frame_bytes as f64 * 8.0) / (summary.duration_us as f64 / 1000.0);
        println!("  Average data rate         {avg_kbps:.1} kbps");
    }

    println!("  Rejected sync candidates  {}", summary.headers_rejected);

    if summary.format_changes > 0 {
        println!("  Format changes            {}", summary.format_changes);
    }

    println!();
}

#[cfg(test)]
pub(super) mod tests {
    use super::*;
    use av3a::process::EXAMPLE_HEADER;

    pub(in crate::cli) const FRAME_SIZE: usize = 64;
    pub(in crate::cli) const FRAME_DURATION_US: i64 = 1333;

    /// One 64-byte stereo frame whose payload never forms a sync marker.
    pub(in crate::cli) fn stereo_frame() -> Vec<u8> {
        let mut frame = EXAMPLE_HEADER.to_vec();
        frame.extend((EXAMPLE_HEADER.len()..FRAME_SIZE).map(|i| i as u8));
        frame
    }

    /// Garbage, two whole frames with garbage between them, then a frame cut
    /// short by the end of input.
    pub(in crate::cli) fn noisy_stream() -> Vec<u8> {
        let frame = stereo_frame();

        let mut stream = vec![0x00, 0x13, 0xFF];
        stream.extend(&frame);
        stream.extend([0xAA, 0xFF]);
        stream.extend(&frame);
        stream.extend(&frame[..40]);
        stream
    }

    #[test]
    fn summary_counts_whole_frames_only() -> Result<()> {
        let stream = noisy_stream();

        let mut extractor = Extractor::default();
        let mut context = AnalysisContext::default();

        extractor.packet_started(0);
        for chunk in stream.chunks(7) {
            extractor.consume(chunk, &mut context)?;
        }
        assert_eq!(extractor.state(), ExtractorState::ReadingFrame);

        let summary = context.summary(&extractor, stream.len() as u64);

        assert_eq!(summary.frames, 2);
        assert_eq!(summary.frame_bytes, 2 * FRAME_SIZE as u64);
        assert_eq!(summary.input_bytes, stream.len() as u64);
        assert_eq!(summary.skipped_bytes, 3 + 2 + 40);
        assert_eq!(summary.first_timestamp_us, Some(0));
        assert_eq!(summary.last_timestamp_us, Some(FRAME_DURATION_US));
        assert_eq!(summary.duration_us, 2 * FRAME_DURATION_US);
        assert_eq!(summary.min_frame_size, Some(FRAME_SIZE));
        assert_eq!(summary.max_frame_size, Some(FRAME_SIZE));
        assert_eq!(summary.headers_rejected, 2);

        let format = summary.format.as_ref().unwrap();
        assert_eq!(format.channels, 2);
        assert_eq!(format.sample_rate, 48000);

        let yaml = serde_yaml_ng::to_string(&summary)?;
        assert!(yaml.contains("frames: 2"));
        assert!(yaml.contains("skipped_bytes: 45"));

        Ok(())
    }

    #[test]
    fn summary_without_frames_has_no_format() {
        let extractor = Extractor::default();
        let context = AnalysisContext::default();

        let summary = context.summary(&extractor, 10);

        assert!(summary.format.is_none());
        assert_eq!(summary.frames, 0);
        assert_eq!(summary.skipped_bytes, 10);
        assert_eq!(summary.duration_us, 0);
    }
}
