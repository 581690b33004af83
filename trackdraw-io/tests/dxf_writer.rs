use std::fs;
use std::path::PathBuf;

use trackdraw_core::{
    color::AciColor,
    document::{DrawingTarget, EntityStyle},
    geometry::Point2,
    lineweight::LineWeight,
};
use trackdraw_io::{DrawingBackend, DxfDocument, DxfFacade, GroupPair, IoError};

fn fixture(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/data");
    path.push(name);
    path
}

fn green_line_style() -> EntityStyle {
    EntityStyle::default()
        .with_color(AciColor::GREEN)
        .with_lineweight(LineWeight::new(35))
}

fn red_dot_style() -> EntityStyle {
    EntityStyle::default().with_color(AciColor::RED)
}

fn add_sample_entities(doc: &mut DxfDocument) {
    doc.add_line(
        Point2::new(0.0, 0.0),
        Point2::new(10.0, 10.0),
        green_line_style(),
    );
    doc.add_circle(Point2::new(5.0, 5.0), 2.0, red_dot_style());
    doc.set_lineweight_display(true);
}

/// 取出 ENTITIES 段中的实体，每个实体为以 `0/<类型>` 开头的组码序列。
fn entity_blocks(pairs: &[GroupPair]) -> Vec<Vec<GroupPair>> {
    let start = pairs
        .windows(2)
        .position(|w| w[0] == GroupPair::new(0, "SECTION") && w[1] == GroupPair::new(2, "ENTITIES"))
        .expect("ENTITIES 段")
        + 2;
    let mut blocks: Vec<Vec<GroupPair>> = Vec::new();
    for pair in &pairs[start..] {
        if pair.code == 0 {
            if pair.value == "ENDSEC" {
                break;
            }
            blocks.push(Vec::new());
        }
        blocks
            .last_mut()
            .expect("实体以组码 0 开始")
            .push(pair.clone());
    }
    blocks
}

fn header_value<'a>(pairs: &'a [GroupPair], variable: &str) -> Option<&'a str> {
    pairs
        .windows(2)
        .find(|w| w[0].code == 9 && w[0].value == variable)
        .map(|w| w[1].value.as_str())
}

fn expected(pairs: &[(i32, &str)]) -> Vec<GroupPair> {
    pairs
        .iter()
        .map(|(code, value)| GroupPair::new(*code, *value))
        .collect()
}

#[test]
fn appends_entities_to_r2000_template() {
    let template = fixture("template_r2000.dxf");
    let template_bytes = fs::read(&template).expect("读取模板");
    let dir = tempfile::tempdir().expect("临时目录");
    let output = dir.path().join("out.dxf");

    let backend = DxfFacade::new();
    let mut doc = backend.load(&template).expect("加载模板");
    assert_eq!(doc.version(), Some("AC1015"));
    assert_eq!(doc.template_entity_count(), 1);
    assert!(doc.uses_handles());
    assert!(doc.supports_lineweight());

    add_sample_entities(&mut doc);
    backend.save(&doc, &output).expect("保存文档");

    assert_eq!(fs::read(&template).expect("再次读取模板"), template_bytes);

    let written = fs::read_to_string(&output).expect("读取输出");
    let reparsed = DxfDocument::parse(&written, &output).expect("输出可重新解析");
    assert_eq!(reparsed.template_entity_count(), 3);

    let pairs = reparsed.pairs();
    assert_eq!(header_value(pairs, "$LWDISPLAY"), Some("1"));
    assert_eq!(header_value(pairs, "$HANDSEED"), Some("32"));
    assert_eq!(header_value(pairs, "$INSUNITS"), Some("4"));

    let blocks = entity_blocks(pairs);
    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[0][0], GroupPair::new(0, "LINE"));
    assert!(blocks[0].contains(&GroupPair::new(8, "WALLS")));
    assert_eq!(
        blocks[1],
        expected(&[
            (0, "LINE"),
            (5, "30"),
            (330, "1F"),
            (100, "AcDbEntity"),
            (8, "0"),
            (62, "3"),
            (370, "35"),
            (100, "AcDbLine"),
            (10, "0.0"),
            (20, "0.0"),
            (30, "0.0"),
            (11, "10.0"),
            (21, "10.0"),
            (31, "0.0"),
        ])
    );
    assert_eq!(
        blocks[2],
        expected(&[
            (0, "CIRCLE"),
            (5, "31"),
            (330, "1F"),
            (100, "AcDbEntity"),
            (8, "0"),
            (62, "1"),
            (100, "AcDbCircle"),
            (10, "5.0"),
            (20, "5.0"),
            (30, "0.0"),
            (40, "2.0"),
        ])
    );

    // OBJECTS 段与 EOF 原样保留
    assert!(pairs.contains(&GroupPair::new(100, "AcDbDictionary")));
    assert_eq!(pairs.last(), Some(&GroupPair::new(0, "EOF")));
}

#[test]
fn untouched_template_is_written_back_verbatim() {
    let template = fixture("template_r2000.dxf");
    let original = fs::read_to_string(&template).expect("读取模板");
    let doc = DxfDocument::parse(&original, &template).expect("解析模板");

    let mut buffer = Vec::new();
    doc.write_to(&mut buffer).expect("写出");
    assert_eq!(String::from_utf8(buffer).unwrap(), original);
}

#[test]
fn r12_template_gets_header_flag_but_no_lineweight() {
    let template = fixture("template_r12.dxf");
    let backend = DxfFacade::new();
    let mut doc = backend.load(&template).expect("加载模板");
    assert!(!doc.supports_lineweight());
    assert!(!doc.uses_handles());

    add_sample_entities(&mut doc);
    let mut buffer = Vec::new();
    doc.write_to(&mut buffer).expect("写出");
    let written = String::from_utf8(buffer).unwrap();
    let reparsed = DxfDocument::parse(&written, "out.dxf").expect("输出可重新解析");
    let pairs = reparsed.pairs();

    assert_eq!(header_value(pairs, "$ACADVER"), Some("AC1009"));
    assert_eq!(header_value(pairs, "$LWDISPLAY"), Some("1"));

    let blocks = entity_blocks(pairs);
    assert_eq!(blocks.len(), 3);
    assert_eq!(
        blocks[1],
        expected(&[
            (0, "LINE"),
            (8, "0"),
            (62, "3"),
            (10, "0.0"),
            (20, "0.0"),
            (30, "0.0"),
            (11, "10.0"),
            (21, "10.0"),
            (31, "0.0"),
        ])
    );
    assert!(!pairs.iter().any(|pair| pair.code == 370 || pair.code == 5));
}

#[test]
fn missing_sections_are_created() {
    let source = "  0\nSECTION\n  2\nOBJECTS\n  0\nDICTIONARY\n  0\nENDSEC\n  0\nEOF\n";
    let mut doc = DxfDocument::parse(source, "bare.dxf").expect("解析模板");
    add_sample_entities(&mut doc);

    let mut buffer = Vec::new();
    doc.write_to(&mut buffer).expect("写出");
    let written = String::from_utf8(buffer).unwrap();
    let reparsed = DxfDocument::parse(&written, "out.dxf").expect("输出可重新解析");
    let pairs = reparsed.pairs();

    assert_eq!(&pairs[..2], &expected(&[(0, "SECTION"), (2, "HEADER")])[..]);
    assert_eq!(header_value(pairs, "$LWDISPLAY"), Some("1"));
    assert_eq!(entity_blocks(pairs).len(), 2);

    let entities_at = pairs
        .iter()
        .position(|pair| *pair == GroupPair::new(2, "ENTITIES"))
        .unwrap();
    let objects_at = pairs
        .iter()
        .position(|pair| *pair == GroupPair::new(2, "OBJECTS"))
        .unwrap();
    assert!(entities_at < objects_at);
}

#[test]
fn missing_eof_is_appended() {
    let source = "  0\nSECTION\n  2\nENTITIES\n  0\nENDSEC\n";
    let mut doc = DxfDocument::parse(source, "noeof.dxf").expect("解析模板");
    add_sample_entities(&mut doc);

    let mut buffer = Vec::new();
    doc.write_to(&mut buffer).expect("写出");
    let written = String::from_utf8(buffer).unwrap();
    assert!(written.ends_with("  0\nEOF\n"));
    let reparsed = DxfDocument::parse(&written, "out.dxf").expect("输出可重新解析");
    assert_eq!(reparsed.template_entity_count(), 2);
}

#[test]
fn saving_over_the_template_is_refused() {
    let dir = tempfile::tempdir().expect("临时目录");
    let template = dir.path().join("template.dxf");
    fs::copy(fixture("template_r2000.dxf"), &template).expect("复制模板");
    let before = fs::read(&template).unwrap();

    let backend = DxfFacade::new();
    let mut doc = backend.load(&template).expect("加载模板");
    add_sample_entities(&mut doc);

    let err = backend.save(&doc, &template).unwrap_err();
    assert!(matches!(err, IoError::OverwriteTemplate { .. }));
    assert_eq!(fs::read(&template).unwrap(), before);
}

#[test]
fn unreadable_or_unsupported_templates_fail() {
    let dir = tempfile::tempdir().expect("临时目录");
    let backend = DxfFacade::new();

    let err = backend.load(&dir.path().join("missing.dxf")).unwrap_err();
    assert!(matches!(err, IoError::ReadError { .. }));

    let binary = dir.path().join("binary.dxf");
    fs::write(&binary, b"AutoCAD Binary DXF\r\n\x1a\x00\x00\x00").unwrap();
    let err = backend.load(&binary).unwrap_err();
    assert!(matches!(err, IoError::UnsupportedFeature(_)));

    let broken = dir.path().join("broken.dxf");
    fs::write(&broken, "  0\nSECTION\n  2\nENTITIES\n  0\nEOF\n").unwrap();
    let err = backend.load(&broken).unwrap_err();
    assert!(matches!(err, IoError::InvalidDocument(_)));
}

#[test]
fn unwritable_output_reports_write_error() {
    let dir = tempfile::tempdir().expect("临时目录");
    let backend = DxfFacade::new();
    let mut doc = backend.load(&fixture("template_r12.dxf")).expect("加载模板");
    add_sample_entities(&mut doc);

    let err = backend
        .save(&doc, &dir.path().join("no-such-dir").join("out.dxf"))
        .unwrap_err();
    assert!(matches!(err, IoError::WriteError { .. }));
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[test]
fn ansi_codepage_template_keeps_its_bytes() {
    const PIPES_1251: &[u8] = b"\xD2\xF0\xF3\xE1\xFB";

    let template = fixture("template_cp1251.dxf");
    let template_bytes = fs::read(&template).expect("读取模板");
    let backend = DxfFacade::new();
    let mut doc = backend.load(&template).expect("加载模板");
    assert_eq!(doc.encoding_name(), "windows-1251");
    assert!(doc.pairs().contains(&GroupPair::new(8, "Трубы")));

    doc.add_line(
        Point2::new(0.0, 0.0),
        Point2::new(10.0, 0.0),
        EntityStyle::on_layer("Трубы").with_color(AciColor::GREEN),
    );
    doc.add_circle(
        Point2::new(5.0, 5.0),
        2.0,
        EntityStyle::on_layer("管线").with_color(AciColor::RED),
    );
    doc.set_lineweight_display(true);

    let mut written = Vec::new();
    doc.write_to(&mut written).expect("写出");

    // 修改点之前、之间与之后的模板字节原样保留
    let lwdisplay = find(&template_bytes, b"$LWDISPLAY\n290\n").unwrap() + 15;
    assert_eq!(&written[..lwdisplay], &template_bytes[..lwdisplay]);
    let tables_start = find(&template_bytes, b"  0\nSECTION\n  2\nTABLES\n").unwrap();
    let entities_end = find(&template_bytes, b"  0\nENDSEC\n  0\nSECTION\n  2\nOBJECTS\n").unwrap();
    assert!(find(&written, &template_bytes[tables_start..entities_end]).is_some());
    assert!(written.ends_with(&template_bytes[entities_end..]));

    let layer_lines = written
        .split(|&byte| byte == b'\n')
        .filter(|line| *line == PIPES_1251)
        .count();
    assert_eq!(layer_lines, 3);
    assert!(find(&written, b"  8\n\\U+7BA1\\U+7EBF\n").is_some());
    assert!(std::str::from_utf8(&written).is_err());

    let reparsed = DxfDocument::parse(&written, "out.dxf").expect("输出可重新解析");
    assert_eq!(reparsed.encoding_name(), "windows-1251");
    assert_eq!(header_value(reparsed.pairs(), "$LWDISPLAY"), Some("1"));
    assert_eq!(header_value(reparsed.pairs(), "$HANDSEED"), Some("32"));
    let blocks = entity_blocks(reparsed.pairs());
    assert_eq!(blocks.len(), 3);
    assert!(blocks[1].contains(&GroupPair::new(8, "Трубы")));
    assert!(blocks[1].contains(&GroupPair::new(5, "30")));
}
