use std::path::PathBuf;

use tracing::info;
use trackdraw_core::lineweight::LineweightTable;
use trackdraw_io::{DrawingBackend, read_track_file};

use crate::errors::EngineError;
use crate::render::{RenderSummary, TrackStyle, render_track};

/// 一次转换所需的全部输入：数据文件、模板、输出路径与样式。
#[derive(Debug, Clone)]
pub struct ConversionJob {
    pub track_path: PathBuf,
    pub template_path: PathBuf,
    pub output_path: PathBuf,
    pub style: TrackStyle,
    pub lineweights: LineweightTable,
}

/// 读取管线数据，打开模板，追加图元后另存为输出文件。
/// 数据文件先于模板读取，格式错误时不会产生任何输出。
pub fn run_conversion<B: DrawingBackend>(
    job: &ConversionJob,
    backend: &B,
) -> Result<RenderSummary, EngineError> {
    if job.output_path == job.template_path {
        return Err(EngineError::OutputIsTemplate(job.output_path.clone()));
    }

    let track = read_track_file(&job.track_path)?;
    let mut drawing = backend.load(&job.template_path)?;
    let summary = render_track(&mut drawing, &track, &job.lineweights, &job.style);
    backend.save(&drawing, &job.output_path)?;

    info!(
        template = %job.template_path.display(),
        output = %job.output_path.display(),
        lines = summary.lines,
        circles = summary.circles,
        "转换完成"
    );
    Ok(summary)
}
