pub mod geometry {
    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    /// 二维点，内部以 `glam::DVec2` 表示，坐标保持双精度。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }
    }
}

pub mod color {
    use serde::{Deserialize, Serialize};

    /// AutoCAD 颜色索引（ACI），对应 DXF 组码 62。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct AciColor(u8);

    impl AciColor {
        pub const RED: AciColor = AciColor(1);
        pub const GREEN: AciColor = AciColor(3);

        #[inline]
        pub const fn new(index: u8) -> Self {
            Self(index)
        }

        #[inline]
        pub fn index(self) -> u8 {
            self.0
        }
    }

}

pub mod lineweight {
    use serde::{Deserialize, Serialize};
    use thiserror::Error;

    /// DXF 允许的线宽取值（单位：0.01 mm），按升序排列，对应组码 370。
    pub const VALID_DXF_LINEWEIGHTS: [i16; 24] = [
        0, 5, 9, 13, 15, 18, 20, 25, 30, 35, 40, 50, 53, 60, 70, 80, 90, 100, 106, 120, 140, 158,
        200, 211,
    ];

    /// 离散线宽值（0.01 mm）。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
    pub struct LineWeight(i16);

    impl LineWeight {
        #[inline]
        pub const fn new(value: i16) -> Self {
            Self(value)
        }

        #[inline]
        pub fn get(self) -> i16 {
            self.0
        }
    }

    #[derive(Debug, Error, PartialEq, Eq)]
    pub enum LineweightError {
        #[error("lineweight table is empty")]
        Empty,
        #[error("lineweight table is not ascending at index {index} ({previous} >= {current})")]
        NotAscending {
            index: usize,
            previous: i16,
            current: i16,
        },
    }

    /// 非空、严格升序的线宽表。
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct LineweightTable {
        values: Vec<i16>,
    }

    impl LineweightTable {
        pub fn new(values: Vec<i16>) -> Result<Self, LineweightError> {
            if values.is_empty() {
                return Err(LineweightError::Empty);
            }
            for (index, pair) in values.windows(2).enumerate() {
                if pair[0] >= pair[1] {
                    return Err(LineweightError::NotAscending {
                        index: index + 1,
                        previous: pair[0],
                        current: pair[1],
                    });
                }
            }
            Ok(Self { values })
        }

        /// DXF 格式规定的线宽表。
        pub fn dxf() -> Self {
            Self {
                values: VALID_DXF_LINEWEIGHTS.to_vec(),
            }
        }

        #[inline]
        pub fn values(&self) -> &[i16] {
            &self.values
        }

        #[inline]
        pub fn largest(&self) -> LineWeight {
            // 构造时保证非空
            LineWeight(self.values[self.values.len() - 1])
        }

        /// 将连续线宽吸附到表中的离散值。
        ///
        /// 依次扫描相邻值对 `(t[i], t[i+1])`：等于 `t[i]` 时原样返回，落在
        /// `(t[i], t[i+1]]` 区间时向上取 `t[i+1]`。没有任何值对命中时返回表中最大值，
        /// 因此小于最小值的输入（以及 NaN）同样得到最大值。
        pub fn snap(&self, weight: f64) -> LineWeight {
            for pair in self.values.windows(2) {
                let lower = f64::from(pair[0]);
                let upper = f64::from(pair[1]);
                if weight == lower {
                    return LineWeight(pair[0]);
                }
                if lower < weight && weight <= upper {
                    return LineWeight(pair[1]);
                }
            }
            self.largest()
        }
    }

    impl Default for LineweightTable {
        fn default() -> Self {
            Self::dxf()
        }
    }

}

pub mod track {
    use serde::{Deserialize, Serialize};

    use crate::geometry::Point2;

    /// 管线二维图中的一条线段，`weight` 为连续线宽。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct LineRecord {
        pub start: Point2,
        pub end: Point2,
        pub weight: f64,
    }

    /// 节点圆点。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct DotRecord {
        pub center: Point2,
        pub radius: f64,
    }

    /// 按文件顺序保存的线段与圆点。
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct TrackData {
        pub lines: Vec<LineRecord>,
        pub dots: Vec<DotRecord>,
    }

    impl TrackData {
        pub fn is_empty(&self) -> bool {
            self.lines.is_empty() && self.dots.is_empty()
        }
    }
}

pub mod document {
    use serde::{Deserialize, Serialize};

    use crate::color::AciColor;
    use crate::geometry::Point2;
    use crate::lineweight::LineWeight;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct EntityId(u64);

    impl EntityId {
        #[inline]
        pub fn new(raw: u64) -> Self {
            Self(raw)
        }

        /// 提供原始数值，便于序列化或日志输出。
        #[inline]
        pub fn get(self) -> u64 {
            self.0
        }
    }

    /// 图元的显示属性：图层、颜色与线宽。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct EntityStyle {
        pub layer: String,
        pub color: Option<AciColor>,
        pub lineweight: Option<LineWeight>,
    }

    impl EntityStyle {
        pub fn on_layer(layer: impl Into<String>) -> Self {
            Self {
                layer: layer.into(),
                color: None,
                lineweight: None,
            }
        }

        pub fn with_color(mut self, color: AciColor) -> Self {
            self.color = Some(color);
            self
        }

        pub fn with_lineweight(mut self, lineweight: LineWeight) -> Self {
            self.lineweight = Some(lineweight);
            self
        }
    }

    impl Default for EntityStyle {
        fn default() -> Self {
            Self::on_layer("0")
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub enum Entity {
        Line(Line),
        Circle(Circle),
    }

    impl Entity {
        #[inline]
        pub fn style(&self) -> &EntityStyle {
            match self {
                Entity::Line(line) => &line.style,
                Entity::Circle(circle) => &circle.style,
            }
        }

        #[inline]
        pub fn layer_name(&self) -> &str {
            &self.style().layer
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Line {
        pub start: Point2,
        pub end: Point2,
        pub style: EntityStyle,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Circle {
        pub center: Point2,
        pub radius: f64,
        pub style: EntityStyle,
    }

    /// 可追加图元的绘图目标。模板文档与内存文档都实现该能力，
    /// 渲染逻辑只依赖此接口。
    pub trait DrawingTarget {
        fn add_line(&mut self, start: Point2, end: Point2, style: EntityStyle) -> EntityId;
        fn add_circle(&mut self, center: Point2, radius: f64, style: EntityStyle) -> EntityId;
        fn set_lineweight_display(&mut self, enabled: bool);
    }

    /// 内存中的模型空间：按追加顺序记录图元。
    #[derive(Debug, Default, Clone, Serialize, Deserialize)]
    pub struct Document {
        entities: Vec<(EntityId, Entity)>,
        next_entity_id: u64,
        lineweight_display: bool,
    }

    impl Document {
        pub fn new() -> Self {
            Self::default()
        }

        #[inline]
        pub fn entities(&self) -> impl Iterator<Item = &(EntityId, Entity)> {
            self.entities.iter()
        }

        #[inline]
        pub fn entity_count(&self) -> usize {
            self.entities.len()
        }

        pub fn entity(&self, id: EntityId) -> Option<&Entity> {
            self.entities
                .iter()
                .find_map(|(entity_id, entity)| (*entity_id == id).then_some(entity))
        }

        #[inline]
        pub fn lineweight_display(&self) -> bool {
            self.lineweight_display
        }

        fn push(&mut self, entity: Entity) -> EntityId {
            let id = self.next_id();
            self.entities.push((id, entity));
            id
        }

        fn next_id(&mut self) -> EntityId {
            let id = self.next_entity_id;
            self.next_entity_id += 1;
            EntityId(id)
        }
    }

    impl DrawingTarget for Document {
        fn add_line(&mut self, start: Point2, end: Point2, style: EntityStyle) -> EntityId {
            self.push(Entity::Line(Line { start, end, style }))
        }

        fn add_circle(&mut self, center: Point2, radius: f64, style: EntityStyle) -> EntityId {
            self.push(Entity::Circle(Circle {
                center,
                radius,
                style,
            }))
        }

        fn set_lineweight_display(&mut self, enabled: bool) {
            self.lineweight_display = enabled;
        }
    }

}
