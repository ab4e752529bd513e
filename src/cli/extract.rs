use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use serde::Serialize;

use super::command::{Cli, ExtractArgs};
use super::info::FormatSummary;
use crate::config::Config;
use crate::input::InputReader;
use crate::timestamp::time_str;
use av3a::process::extract::{Extractor, ExtractorState};
use av3a::process::output::FrameSink;
use av3a::structs::format::{FrameMetadata, StreamFormat};

pub fn cmd_extract(args: &ExtractArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!(
        "Extracting frames: {} -> {}",
        args.input.display(),
        args.output.display()
    );

    let mut config = Config::resolve(cli)?;
    if args.language.is_some() {
        config.language = args.language.clone();
    }

    let mut input_reader = InputReader::new(&args.input)?;
    let mut extractor = Extractor::new(config.extractor_config());
    let mut writer = FrameWriter::create(&args.output, args.index.is_some())?;

    let pb = match (multi, input_reader.size()) {
        (Some(multi), Some(size)) => {
            let pb = multi.add(ProgressBar::new(size));
            pb.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta})",
                )?
                .progress_chars("#>-"),
            );
            Some(pb)
        }
        (Some(multi), None) => {
            let pb = multi.add(ProgressBar::new_spinner());
            pb.set_style(ProgressStyle::with_template("{spinner:.green} {bytes} read")?);
            Some(pb)
        }
        _ => None,
    };

    extractor.packet_started(config.start_time_us.unwrap_or(0));

    input_reader.process_chunks(config.chunk_size, |chunk| {
        extractor.consume(chunk, &mut writer)?;

        if let Some(ref pb) = pb {
            pb.inc(chunk.len() as u64);
        }

        Ok(true)
    })?;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    if extractor.state() != ExtractorState::Searching {
        log::warn!(
            "Stream ends inside a frame; dropping {} trailing bytes",
            writer.pending.len()
        );
    }

    let stats = writer.finish()?;

    log::info!(
        "Wrote {} frames ({} bytes, {})",
        stats.frames,
        stats.bytes,
        time_str(stats.duration_us)
    );

    if let Some(index_path) = &args.index {
        let index = FrameIndex {
            format: extractor.stream_format().map(FormatSummary::from),
            frames: stats.index,
        };
        write_index(index_path, &index)?;
        log::info!("Frame index written to {}", index_path.display());
    }

    if cli.strict && extractor.headers_rejected() > 0 {
        anyhow::bail!(
            "{} sync candidates were rejected (--strict)",
            extractor.headers_rejected()
        );
    }

    Ok(())
}

/// Writes whole frames only; bytes of a frame are held until its metadata
/// arrives.
struct FrameWriter<W: Write> {
    output: W,
    pending: Vec<u8>,
    stats: ExtractStats,
    build_index: bool,
}

#[derive(Default)]
struct ExtractStats {
    frames: usize,
    bytes: u64,
    duration_us: i64,
    index: Vec<IndexEntry>,
}

impl FrameWriter<BufWriter<File>> {
    fn create(path: &Path, build_index: bool) -> Result<Self> {
        let file =
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;

        Ok(Self::new(BufWriter::new(file), build_index))
    }
}

impl<W: Write> FrameWriter<W> {
    fn new(output: W, build_index: bool) -> Self {
        Self {
            output,
            pending: Vec::new(),
            stats: ExtractStats::default(),
            build_index,
        }
    }

    fn finish(mut self) -> Result<ExtractStats> {
        self.output.flush()?;
        Ok(self.stats)
    }
}

impl<W: Write> FrameSink for FrameWriter<W> {
    fn format(&mut self, format: &StreamFormat) -> Result<()> {
        log::debug!("Output format: {format}");
        Ok(())
    }

    fn sample_data(&mut self, data: &[u8]) -> Result<()> {
        self.pending.extend_from_slice(data);
        Ok(())
    }

    fn sample_metadata(&mut self, metadata: &FrameMetadata) -> Result<()> {
        let start = self
            .pending
            .len()
            .checked_sub(metadata.size)
            .context("Frame metadata exceeds buffered data")?;

        self.output.write_all(&self.pending[start..])?;
        self.pending.clear();

        if self.build_index {
            self.stats.index.push(IndexEntry {
                offset: self.stats.bytes,
                size: metadata.size,
                timestamp_us: metadata.timestamp_us,
                duration_us: metadata.duration_us,
            });
        }

        self.stats.frames += 1;
        self.stats.bytes += metadata.size as u64;
        self.stats.duration_us += metadata.duration_us;

        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct FrameIndex {
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<FormatSummary>,
    frames: Vec<IndexEntry>,
}

#[derive(Debug, Serialize)]
struct IndexEntry {
    /// Byte offset in the extracted stream.
    offset: u64,
    size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp_us: Option<i64>,
    duration_us: i64,
}

fn write_index(path: &Path, index: &FrameIndex) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    serde_yaml_ng::to_writer(&mut writer, index)?;
    writer.flush()?;

    Ok(())
}
