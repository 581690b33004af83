pub mod track;

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use thiserror::Error;
use tracing::{debug, info, warn};
use trackdraw_core::{
    document::{Document, DrawingTarget, Entity, EntityId, EntityStyle},
    geometry::Point2,
};

pub use track::{TrackError, parse_track, read_track_file};

const BINARY_DXF_SENTINEL: &[u8] = b"AutoCAD Binary DXF";
/// R2000（AC1015）起实体才带有子类标记与线宽组码。
const FIRST_LINEWEIGHT_VERSION: u32 = 1015;
/// R2007（AC1021）起 DXF 文本固定为 UTF-8，忽略 `$DWGCODEPAGE`。
const FIRST_UTF8_VERSION: u32 = 1021;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {path:?}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid document structure: {0}")]
    InvalidDocument(String),
    #[error("invalid track data in {path:?}: {source}")]
    InvalidTrackData {
        path: PathBuf,
        #[source]
        source: TrackError,
    },
    #[error("refusing to overwrite template {path:?}")]
    OverwriteTemplate { path: PathBuf },
}

/// 绘图文档的打开与保存能力。管线只通过该接口访问具体格式。
pub trait DrawingBackend {
    type Drawing: DrawingTarget;

    fn load(&self, path: &Path) -> Result<Self::Drawing, IoError>;
    fn save(&self, drawing: &Self::Drawing, path: &Path) -> Result<(), IoError>;
}

pub struct DxfFacade;

impl DxfFacade {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DxfFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawingBackend for DxfFacade {
    type Drawing = DxfDocument;

    fn load(&self, path: &Path) -> Result<DxfDocument, IoError> {
        let bytes = fs::read(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        if bytes.starts_with(BINARY_DXF_SENTINEL) {
            return Err(IoError::UnsupportedFeature(format!(
                "binary DXF template {path:?}"
            )));
        }
        let document = DxfDocument::parse(&bytes, path)?;
        info!(
            path = %path.display(),
            version = document.version().unwrap_or("unknown"),
            encoding = document.encoding_name(),
            template_entities = document.template_entity_count(),
            "已加载 DXF 模板"
        );
        Ok(document)
    }

    fn save(&self, drawing: &DxfDocument, path: &Path) -> Result<(), IoError> {
        if is_same_path(drawing.source_path(), path) {
            return Err(IoError::OverwriteTemplate {
                path: path.to_path_buf(),
            });
        }
        let write_error = |source: std::io::Error| IoError::WriteError {
            path: path.to_path_buf(),
            source,
        };
        let file = File::create(path).map_err(write_error)?;
        let mut writer = BufWriter::new(file);
        drawing.write_to(&mut writer).map_err(write_error)?;
        writer.flush().map_err(write_error)?;
        info!(
            path = %path.display(),
            entities = drawing.model_space().entity_count(),
            "已保存 DXF 文档"
        );
        Ok(())
    }
}

#[derive(Debug)]
enum DxfError {
    Invalid { message: String },
}

impl DxfError {
    fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

impl From<DxfError> for IoError {
    fn from(err: DxfError) -> Self {
        match err {
            DxfError::Invalid { message } => IoError::InvalidDocument(message),
        }
    }
}

/// 组码与值构成的一对 DXF 记录。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupPair {
    pub code: i32,
    pub value: String,
}

impl GroupPair {
    pub fn new(code: i32, value: impl Into<String>) -> Self {
        Self {
            code,
            value: value.into(),
        }
    }

    fn is_marker(&self, marker: &str) -> bool {
        self.code == 0 && self.value.trim() == marker
    }
}

/// 段的起止位置：`start` 指向 `0/SECTION`，`end` 指向 `0/ENDSEC`。
#[derive(Debug, Clone, Copy)]
struct SectionSpan {
    start: usize,
    end: usize,
}

/// 模板中写出时需要修改或插入内容的位置。
#[derive(Debug, Default)]
struct TemplateLayout {
    version: Option<String>,
    header: Option<SectionSpan>,
    entities: Option<SectionSpan>,
    objects: Option<SectionSpan>,
    eof: Option<usize>,
    lwdisplay_value: Option<usize>,
    handseed_value: Option<usize>,
    handle_seed: Option<u64>,
    /// HEADER 之外组码 5/105 中最大的十六进制句柄。
    max_handle: Option<u64>,
    model_space_owner: Option<String>,
    template_entity_count: usize,
}

/// 以模板为底的 DXF 文档。模板的原始字节按原样保留，
/// 新增图元记录在模型空间中，保存时插入 ENTITIES 段末尾。
#[derive(Debug)]
pub struct DxfDocument {
    source_path: PathBuf,
    source: Vec<u8>,
    raw: Vec<RawPair>,
    pairs: Vec<GroupPair>,
    encoding: &'static Encoding,
    line_ending: &'static [u8],
    layout: TemplateLayout,
    model_space: Document,
}

impl DxfDocument {
    /// 解析 ASCII DXF。文本按 `$ACADVER`/`$DWGCODEPAGE` 选定的编码解码。
    pub fn parse(
        source: impl AsRef<[u8]>,
        source_path: impl Into<PathBuf>,
    ) -> Result<Self, IoError> {
        let source = source.as_ref().to_vec();
        let raw = DxfReader::new(&source).read_all()?;
        let encoding = detect_encoding(&source, &raw);
        let pairs: Vec<GroupPair> = raw
            .iter()
            .map(|pair| GroupPair {
                code: pair.code,
                value: decode_value(encoding, &source[pair.value_line.clone()]),
            })
            .collect();
        let layout = TemplateLayout::scan(&pairs)?;
        let line_ending: &'static [u8] = if raw
            .first()
            .is_some_and(|pair| source[pair.code_line.clone()].ends_with(b"\r"))
        {
            b"\r\n"
        } else {
            b"\n"
        };
        Ok(Self {
            source_path: source_path.into(),
            source,
            raw,
            pairs,
            encoding,
            line_ending,
            layout,
            model_space: Document::new(),
        })
    }

    #[inline]
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// `$ACADVER` 的值，例如 `AC1015`。
    pub fn version(&self) -> Option<&str> {
        self.layout.version.as_deref()
    }

    /// 解码模板所用的字符编码名称，例如 `windows-1251`。
    #[inline]
    pub fn encoding_name(&self) -> &'static str {
        self.encoding.name()
    }

    #[inline]
    pub fn template_entity_count(&self) -> usize {
        self.layout.template_entity_count
    }

    /// 模板的全部组码对，按文件顺序。
    #[inline]
    pub fn pairs(&self) -> &[GroupPair] {
        &self.pairs
    }

    #[inline]
    pub fn model_space(&self) -> &Document {
        &self.model_space
    }

    #[inline]
    pub fn uses_handles(&self) -> bool {
        self.first_handle().is_some()
    }

    /// 是否按 R2000+ 的格式写出实体（子类标记、所属块记录、线宽）。
    pub fn supports_lineweight(&self) -> bool {
        self.layout
            .version
            .as_deref()
            .and_then(version_number)
            .is_some_and(|number| number >= FIRST_LINEWEIGHT_VERSION)
    }

    /// 新图元的首个句柄。取 `$HANDSEED` 与模板已用句柄之后的较大者；
    /// R2000+ 模板缺少 `$HANDSEED` 时同样从已用句柄之后分配。
    fn first_handle(&self) -> Option<u64> {
        let above_used = self.layout.max_handle.map_or(1, |max| max + 1);
        match self.layout.handle_seed {
            Some(seed) => Some(seed.max(above_used)),
            None if self.supports_lineweight() => Some(above_used),
            None => None,
        }
    }

    /// 写出模板及新增图元。未修改的组码行按原始字节写回。
    pub fn write_to<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        let (overrides, insertions) = self.plan_edits();
        for index in 0..=self.raw.len() {
            if let Some(extra) = insertions.get(&index) {
                for pair in extra {
                    self.write_new_pair(&mut writer, pair.code, &pair.value)?;
                }
            }
            let Some(raw) = self.raw.get(index) else {
                continue;
            };
            writer.write_all(&self.source[raw.code_line.clone()])?;
            writer.write_all(b"\n")?;
            match overrides.get(&index) {
                Some(value) => {
                    writer.write_all(&self.encode_value(value))?;
                    writer.write_all(self.line_ending)?;
                }
                None => {
                    writer.write_all(&self.source[raw.value_line.clone()])?;
                    writer.write_all(b"\n")?;
                }
            }
        }
        if self.layout.eof.is_none() {
            self.write_new_pair(&mut writer, 0, "EOF")?;
        }
        Ok(())
    }

    fn write_new_pair<W: Write>(
        &self,
        writer: &mut W,
        code: i32,
        value: &str,
    ) -> std::io::Result<()> {
        write!(writer, "{code:>3}")?;
        writer.write_all(self.line_ending)?;
        writer.write_all(&self.encode_value(value))?;
        writer.write_all(self.line_ending)
    }

    /// 以模板编码写出文本；编码无法表示的字符写成 `\U+XXXX`。
    fn encode_value<'v>(&self, value: &'v str) -> Cow<'v, [u8]> {
        let (bytes, _, unmappable) = self.encoding.encode(value);
        if !unmappable {
            return bytes;
        }
        let mut escaped = String::with_capacity(value.len());
        let mut buffer = [0u8; 4];
        for ch in value.chars() {
            let (_, _, failed) = self.encoding.encode(ch.encode_utf8(&mut buffer));
            if failed {
                escaped.push_str(&format!("\\U+{:04X}", u32::from(ch)));
            } else {
                escaped.push(ch);
            }
        }
        warn!(
            value,
            encoding = self.encoding.name(),
            "模板编码无法表示部分字符，已转义为 \\U+XXXX"
        );
        Cow::Owned(self.encoding.encode(&escaped).0.into_owned())
    }

    fn plan_edits(&self) -> (HashMap<usize, String>, BTreeMap<usize, Vec<GroupPair>>) {
        let mut overrides: HashMap<usize, String> = HashMap::new();
        let mut insertions: BTreeMap<usize, Vec<GroupPair>> = BTreeMap::new();
        let mut header_additions: Vec<GroupPair> = Vec::new();
        let lwdisplay = if self.model_space.lineweight_display() {
            "1"
        } else {
            "0"
        };

        match self.layout.lwdisplay_value {
            Some(index) => {
                overrides.insert(index, lwdisplay.to_string());
            }
            None => header_additions.extend([
                GroupPair::new(9, "$LWDISPLAY"),
                GroupPair::new(290, lwdisplay),
            ]),
        }

        let modern = self.supports_lineweight();
        let owner = if modern {
            self.layout.model_space_owner.as_deref()
        } else {
            None
        };
        let mut next_handle = self.first_handle();
        let mut entity_pairs = Vec::new();
        let mut dropped_lineweights = 0usize;
        for (_, entity) in self.model_space.entities() {
            let handle = next_handle;
            next_handle = next_handle.map(|seed| seed + 1);
            if !modern && entity.style().lineweight.is_some() {
                dropped_lineweights += 1;
            }
            entity_pairs.extend(entity_to_pairs(entity, handle, owner, modern));
        }
        if dropped_lineweights > 0 {
            warn!(
                count = dropped_lineweights,
                version = self.version().unwrap_or("unknown"),
                "模板版本早于 R2000，线宽组码 370 未写出"
            );
        }

        if self.model_space.entity_count() > 0 {
            if let Some(seed) = next_handle {
                match self.layout.handseed_value {
                    Some(index) => {
                        overrides.insert(index, format!("{seed:X}"));
                    }
                    None => header_additions.extend([
                        GroupPair::new(9, "$HANDSEED"),
                        GroupPair::new(5, format!("{seed:X}")),
                    ]),
                }
            }
        }

        if !header_additions.is_empty() {
            match self.layout.header {
                Some(header) => {
                    insertions
                        .entry(header.end)
                        .or_default()
                        .extend(header_additions);
                }
                None => {
                    let section = insertions.entry(0).or_default();
                    section.push(GroupPair::new(0, "SECTION"));
                    section.push(GroupPair::new(2, "HEADER"));
                    section.extend(header_additions);
                    section.push(GroupPair::new(0, "ENDSEC"));
                }
            }
        }

        if !entity_pairs.is_empty() {
            match self.layout.entities {
                Some(section) => {
                    insertions.entry(section.end).or_default().extend(entity_pairs);
                }
                None => {
                    let position = self
                        .layout
                        .objects
                        .map(|section| section.start)
                        .or(self.layout.eof)
                        .unwrap_or(self.pairs.len());
                    debug!(position, "模板缺少 ENTITIES 段，新建该段");
                    let section = insertions.entry(position).or_default();
                    section.push(GroupPair::new(0, "SECTION"));
                    section.push(GroupPair::new(2, "ENTITIES"));
                    section.extend(entity_pairs);
                    section.push(GroupPair::new(0, "ENDSEC"));
                }
            }
        }

        (overrides, insertions)
    }
}

impl DrawingTarget for DxfDocument {
    fn add_line(&mut self, start: Point2, end: Point2, style: EntityStyle) -> EntityId {
        self.model_space.add_line(start, end, style)
    }

    fn add_circle(&mut self, center: Point2, radius: f64, style: EntityStyle) -> EntityId {
        self.model_space.add_circle(center, radius, style)
    }

    fn set_lineweight_display(&mut self, enabled: bool) {
        self.model_space.set_lineweight_display(enabled);
    }
}

impl TemplateLayout {
    fn scan(pairs: &[GroupPair]) -> Result<Self, DxfError> {
        let mut layout = TemplateLayout::default();
        let mut current: Option<(String, usize)> = None;
        let mut record = TableRecord::default();

        let mut index = 0;
        while index < pairs.len() {
            let pair = &pairs[index];
            if pair.is_marker("SECTION") {
                if let Some((name, _)) = &current {
                    return Err(DxfError::invalid(format!(
                        "段 {name} 未以 ENDSEC 结束即开始新的 SECTION"
                    )));
                }
                let name = match pairs.get(index + 1) {
                    Some(next) if next.code == 2 => next.value.trim().to_string(),
                    Some(next) => {
                        return Err(DxfError::invalid(format!(
                            "SECTION 名称使用了组码 {}（期望 2）",
                            next.code
                        )));
                    }
                    None => return Err(DxfError::invalid("SECTION 缺少名称（组码 2）")),
                };
                current = Some((name, index));
                index += 2;
                continue;
            }

            if pair.is_marker("ENDSEC") {
                let Some((name, start)) = current.take() else {
                    return Err(DxfError::invalid(format!(
                        "第 {} 组出现多余的 ENDSEC",
                        index + 1
                    )));
                };
                record.finish(&mut layout);
                let span = SectionSpan { start, end: index };
                let slot = match name.as_str() {
                    "HEADER" => Some(&mut layout.header),
                    "ENTITIES" => Some(&mut layout.entities),
                    "OBJECTS" => Some(&mut layout.objects),
                    _ => None,
                };
                if let Some(slot) = slot {
                    slot.get_or_insert(span);
                }
                index += 1;
                continue;
            }

            if pair.is_marker("EOF") {
                if let Some((name, _)) = &current {
                    return Err(DxfError::invalid(format!("段 {name} 未找到 ENDSEC 终止标记")));
                }
                layout.eof.get_or_insert(index);
                index += 1;
                continue;
            }

            let section = current.as_ref().map(|(name, _)| name.as_str());
            if section != Some("HEADER") && matches!(pair.code, 5 | 105) {
                if let Ok(handle) = u64::from_str_radix(pair.value.trim(), 16) {
                    layout.max_handle = layout.max_handle.max(Some(handle));
                }
            }

            match section {
                Some("HEADER") if pair.code == 9 => {
                    let value_index = index + 1;
                    match pair.value.trim() {
                        "$ACADVER" => {
                            layout.version =
                                pairs.get(value_index).map(|v| v.value.trim().to_string());
                        }
                        "$LWDISPLAY" if value_index < pairs.len() => {
                            layout.lwdisplay_value = Some(value_index);
                        }
                        "$HANDSEED" => {
                            let raw = pairs.get(value_index).map(|v| v.value.trim()).ok_or_else(
                                || DxfError::invalid("$HANDSEED 缺少取值"),
                            )?;
                            let seed = u64::from_str_radix(raw, 16).map_err(|_| {
                                DxfError::invalid(format!("$HANDSEED \"{raw}\" 不是十六进制句柄"))
                            })?;
                            layout.handseed_value = Some(value_index);
                            layout.handle_seed = Some(seed);
                        }
                        _ => {}
                    }
                }
                Some("TABLES") => record.observe(pair, &mut layout),
                Some("ENTITIES") if pair.code == 0 => {
                    if !matches!(pair.value.trim(), "VERTEX" | "SEQEND" | "ATTRIB") {
                        layout.template_entity_count += 1;
                    }
                }
                _ => {}
            }
            index += 1;
        }

        if let Some((name, _)) = current {
            return Err(DxfError::invalid(format!("段 {name} 未找到 ENDSEC 终止标记")));
        }
        Ok(layout)
    }
}

/// TABLES 段中正在读取的表记录，用于定位 `*Model_Space` 块记录句柄。
#[derive(Debug, Default)]
struct TableRecord {
    kind: String,
    handle: Option<String>,
    name: Option<String>,
}

impl TableRecord {
    fn observe(&mut self, pair: &GroupPair, layout: &mut TemplateLayout) {
        match pair.code {
            0 => {
                self.finish(layout);
                self.kind = pair.value.trim().to_string();
            }
            5 => self.handle = Some(pair.value.trim().to_string()),
            2 => self.name = Some(pair.value.trim().to_string()),
            _ => {}
        }
    }

    fn finish(&mut self, layout: &mut TemplateLayout) {
        let record = std::mem::take(self);
        if record.kind != "BLOCK_RECORD" || layout.model_space_owner.is_some() {
            return;
        }
        if let (Some(handle), Some(name)) = (record.handle, record.name) {
            if name.eq_ignore_ascii_case("*Model_Space") {
                layout.model_space_owner = Some(handle);
            }
        }
    }
}

fn entity_to_pairs(
    entity: &Entity,
    handle: Option<u64>,
    owner: Option<&str>,
    modern: bool,
) -> Vec<GroupPair> {
    let (kind, subclass, style) = match entity {
        Entity::Line(line) => ("LINE", "AcDbLine", &line.style),
        Entity::Circle(circle) => ("CIRCLE", "AcDbCircle", &circle.style),
    };

    let mut pairs = vec![GroupPair::new(0, kind)];
    if let Some(handle) = handle {
        pairs.push(GroupPair::new(5, format!("{handle:X}")));
    }
    if let Some(owner) = owner {
        pairs.push(GroupPair::new(330, owner));
    }
    if modern {
        pairs.push(GroupPair::new(100, "AcDbEntity"));
    }
    pairs.push(GroupPair::new(8, style.layer.as_str()));
    if let Some(color) = style.color {
        pairs.push(GroupPair::new(62, color.index().to_string()));
    }
    if modern {
        if let Some(lineweight) = style.lineweight {
            pairs.push(GroupPair::new(370, lineweight.get().to_string()));
        }
        pairs.push(GroupPair::new(100, subclass));
    }

    match entity {
        Entity::Line(line) => {
            push_point(&mut pairs, 10, line.start);
            push_point(&mut pairs, 11, line.end);
        }
        Entity::Circle(circle) => {
            push_point(&mut pairs, 10, circle.center);
            pairs.push(GroupPair::new(40, format_real(circle.radius)));
        }
    }
    pairs
}

fn push_point(pairs: &mut Vec<GroupPair>, code: i32, point: Point2) {
    pairs.push(GroupPair::new(code, format_real(point.x())));
    pairs.push(GroupPair::new(code + 10, format_real(point.y())));
    pairs.push(GroupPair::new(code + 20, format_real(0.0)));
}

/// 浮点数按最短往返格式输出，整数值补 `.0`。
fn format_real(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// `AC1015` → `1015`。
fn version_number(version: &str) -> Option<u32> {
    version.trim().strip_prefix("AC")?.parse().ok()
}

/// 按 `$ACADVER` 与 `$DWGCODEPAGE` 选择文本编码。未声明代码页时，
/// 合法 UTF-8 按 UTF-8 读取，否则按 Windows-1252 读取。
fn detect_encoding(source: &[u8], raw: &[RawPair]) -> &'static Encoding {
    let text = |pair: &RawPair| source[pair.value_line.clone()].trim_ascii();
    let header = |name: &[u8]| {
        raw.windows(2)
            .find(|w| w[0].code == 9 && text(&w[0]) == name)
            .map(|w| String::from_utf8_lossy(text(&w[1])).into_owned())
    };
    let version = header(b"$ACADVER".as_slice());
    if version
        .as_deref()
        .and_then(version_number)
        .is_some_and(|number| number >= FIRST_UTF8_VERSION)
    {
        return UTF_8;
    }
    if let Some(encoding) = header(b"$DWGCODEPAGE".as_slice())
        .as_deref()
        .and_then(codepage_encoding)
    {
        return encoding;
    }
    if std::str::from_utf8(source).is_ok() {
        UTF_8
    } else {
        WINDOWS_1252
    }
}

/// `$DWGCODEPAGE` 取值到编码的映射，例如 `ANSI_1251` → windows-1251。
fn codepage_encoding(codepage: &str) -> Option<&'static Encoding> {
    let codepage = codepage.trim().to_ascii_uppercase();
    match codepage.strip_prefix("ANSI_") {
        Some("932") => Some(encoding_rs::SHIFT_JIS),
        Some("936") => Some(encoding_rs::GBK),
        Some("949") => Some(encoding_rs::EUC_KR),
        Some("950") => Some(encoding_rs::BIG5),
        Some(number) => Encoding::for_label(format!("windows-{number}").as_bytes()),
        None => Encoding::for_label(codepage.as_bytes()),
    }
}

fn decode_value(encoding: &'static Encoding, line: &[u8]) -> String {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    encoding.decode_without_bom_handling(line).0.into_owned()
}

fn is_same_path(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// 一对组码在源字节中的位置。行范围不含 `\n`，保留行尾的 `\r`。
#[derive(Debug, Clone)]
struct RawPair {
    code: i32,
    code_line: Range<usize>,
    value_line: Range<usize>,
}

struct DxfReader<'a> {
    source: &'a [u8],
    offset: usize,
    line_number: usize,
}

impl<'a> DxfReader<'a> {
    fn new(source: &'a [u8]) -> Self {
        Self {
            source,
            offset: 0,
            line_number: 0,
        }
    }

    fn read_all(mut self) -> Result<Vec<RawPair>, DxfError> {
        let mut pairs = Vec::new();
        while let Some(pair) = self.next_pair()? {
            pairs.push(pair);
        }
        Ok(pairs)
    }

    fn next_line(&mut self) -> Option<Range<usize>> {
        if self.offset >= self.source.len() {
            return None;
        }
        let start = self.offset;
        let end = self.source[start..]
            .iter()
            .position(|&byte| byte == b'\n')
            .map_or(self.source.len(), |len| start + len);
        self.offset = end + 1;
        self.line_number += 1;
        Some(start..end)
    }

    fn next_pair(&mut self) -> Result<Option<RawPair>, DxfError> {
        let source = self.source;
        let Some(code_line) = self.next_line() else {
            return Ok(None);
        };
        let code_text = source[code_line.clone()].trim_ascii();

        // 文件末尾的空行不构成组码
        let rest = source.get(self.offset..).unwrap_or_default();
        if code_text.is_empty() && rest.trim_ascii().is_empty() {
            return Ok(None);
        }

        let Some(value_line) = self.next_line() else {
            return Err(DxfError::invalid(format!(
                "文件在第 {} 行结束，缺少与组码对应的值行",
                self.line_number
            )));
        };

        let code = std::str::from_utf8(code_text)
            .ok()
            .and_then(|text| text.parse::<i32>().ok())
            .ok_or_else(|| {
                DxfError::invalid(format!(
                    "第 {} 行的组码 \"{}\" 无法解析为整数",
                    self.line_number - 1,
                    String::from_utf8_lossy(code_text)
                ))
            })?;
        Ok(Some(RawPair {
            code,
            code_line,
            value_line,
        }))
    }
}
