pub mod pipeline;

pub mod errors {
    use thiserror::Error;
    use trackdraw_io::IoError;

    #[derive(Debug, Error)]
    pub enum EngineError {
        #[error(transparent)]
        Io(#[from] IoError),
        #[error("output path {0:?} is the template path")]
        OutputIsTemplate(std::path::PathBuf),
    }
}

pub mod render {
    use tracing::{debug, info, warn};
    use trackdraw_core::color::AciColor;
    use trackdraw_core::document::{DrawingTarget, EntityStyle};
    use trackdraw_core::lineweight::{LineWeight, LineweightTable};
    use trackdraw_core::track::TrackData;

    /// 管线图元的固定样式：线段与圆点的颜色以及所在图层。
    #[derive(Debug, Clone, PartialEq)]
    pub struct TrackStyle {
        pub layer: String,
        pub line_color: AciColor,
        pub dot_color: AciColor,
    }

    impl TrackStyle {
        pub fn line_style(&self, lineweight: LineWeight) -> EntityStyle {
            EntityStyle::on_layer(self.layer.as_str())
                .with_color(self.line_color)
                .with_lineweight(lineweight)
        }

        pub fn dot_style(&self) -> EntityStyle {
            EntityStyle::on_layer(self.layer.as_str()).with_color(self.dot_color)
        }
    }

    impl Default for TrackStyle {
        fn default() -> Self {
            Self {
                layer: "0".to_string(),
                line_color: AciColor::GREEN,
                dot_color: AciColor::RED,
            }
        }
    }

    /// 一次渲染的统计信息。
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RenderSummary {
        pub lines: usize,
        pub circles: usize,
    }

    /// 将管线数据追加到绘图目标：每条线段一条 LINE（线宽经吸附），
    /// 每个圆点一个 CIRCLE，并打开线宽显示。
    pub fn render_track<T: DrawingTarget>(
        target: &mut T,
        track: &TrackData,
        lineweights: &LineweightTable,
        style: &TrackStyle,
    ) -> RenderSummary {
        info!(table = ?lineweights.values(), "可用线宽");

        for (index, record) in track.lines.iter().enumerate() {
            let lineweight = lineweights.snap(record.weight);
            let id = target.add_line(record.start, record.end, style.line_style(lineweight));
            debug!(
                index,
                id = id.get(),
                weight = record.weight,
                lineweight = lineweight.get(),
                "追加线段"
            );
        }

        for (index, record) in track.dots.iter().enumerate() {
            if record.radius.is_nan() || record.radius <= 0.0 {
                warn!(index, radius = record.radius, "圆点半径非正，按原值写出");
            }
            let id = target.add_circle(record.center, record.radius, style.dot_style());
            debug!(index, id = id.get(), radius = record.radius, "追加圆点");
        }

        target.set_lineweight_display(true);

        let summary = RenderSummary {
            lines: track.lines.len(),
            circles: track.dots.len(),
        };
        info!(
            lines = summary.lines,
            circles = summary.circles,
            "管线图元已写入模型空间"
        );
        summary
    }

}
