use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::info;
use trackdraw_core::geometry::Point2;
use trackdraw_core::track::{DotRecord, LineRecord, TrackData};

use crate::IoError;

const LINE_FIELDS: usize = 5;
const DOT_FIELDS: usize = 3;

/// 管线二维数据文本的格式错误，行号从 1 开始。
#[derive(Debug, Error, PartialEq)]
pub enum TrackError {
    #[error("line {line}: expected {expected}, found end of file")]
    MissingLine { line: usize, expected: &'static str },
    #[error("line {line}: expected {expected} values, found {found}")]
    TokenCount {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: \"{token}\" is not a valid {kind}")]
    InvalidNumber {
        line: usize,
        token: String,
        kind: &'static str,
    },
}

/// 读取管线二维数据文件。
pub fn read_track_file(path: &Path) -> Result<TrackData, IoError> {
    let data = fs::read_to_string(path).map_err(|source| IoError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    let track = parse_track(&data).map_err(|source| IoError::InvalidTrackData {
        path: path.to_path_buf(),
        source,
    })?;
    info!(
        path = %path.display(),
        lines = track.lines.len(),
        dots = track.dots.len(),
        "已读取管线二维数据"
    );
    Ok(track)
}

/// 解析文本：首行为 `L D`，随后 L 行 `Ax Ay Bx By W`，再 D 行 `Cx Cy R`。
/// 声明数量之后的内容被忽略。
pub fn parse_track(source: &str) -> Result<TrackData, TrackError> {
    let mut reader = TrackReader::new(source);

    let (line, header) = reader.next_line("header with line and dot counts")?;
    let counts = split_fields(line, header, 2)?;
    let line_count = parse_count(line, counts[0])?;
    let dot_count = parse_count(line, counts[1])?;

    // 声明数量不可信，不据此预分配
    let mut track = TrackData::default();

    for _ in 0..line_count {
        let (line, text) = reader.next_line("line record `Ax Ay Bx By W`")?;
        let [ax, ay, bx, by, weight] = parse_reals::<LINE_FIELDS>(line, text)?;
        track.lines.push(LineRecord {
            start: Point2::new(ax, ay),
            end: Point2::new(bx, by),
            weight,
        });
    }

    for _ in 0..dot_count {
        let (line, text) = reader.next_line("dot record `Cx Cy R`")?;
        let [cx, cy, radius] = parse_reals::<DOT_FIELDS>(line, text)?;
        track.dots.push(DotRecord {
            center: Point2::new(cx, cy),
            radius,
        });
    }

    Ok(track)
}

struct TrackReader<'a> {
    lines: std::str::Lines<'a>,
    line_number: usize,
}

impl<'a> TrackReader<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines(),
            line_number: 0,
        }
    }

    fn next_line(&mut self, expected: &'static str) -> Result<(usize, &'a str), TrackError> {
        self.line_number += 1;
        match self.lines.next() {
            Some(text) => Ok((self.line_number, text)),
            None => Err(TrackError::MissingLine {
                line: self.line_number,
                expected,
            }),
        }
    }
}

fn split_fields(line: usize, text: &str, expected: usize) -> Result<Vec<&str>, TrackError> {
    let fields: Vec<&str> = text.split_whitespace().collect();
    if fields.len() != expected {
        return Err(TrackError::TokenCount {
            line,
            expected,
            found: fields.len(),
        });
    }
    Ok(fields)
}

fn parse_count(line: usize, token: &str) -> Result<usize, TrackError> {
    token.parse::<usize>().map_err(|_| TrackError::InvalidNumber {
        line,
        token: token.to_string(),
        kind: "count",
    })
}

fn parse_reals<const N: usize>(line: usize, text: &str) -> Result<[f64; N], TrackError> {
    let fields = split_fields(line, text, N)?;
    let mut values = [0.0; N];
    for (slot, token) in values.iter_mut().zip(fields) {
        *slot = token.parse::<f64>().map_err(|_| TrackError::InvalidNumber {
            line,
            token: token.to_string(),
            kind: "number",
        })?;
    }
    Ok(values)
}
