use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};
use trackdraw_config::AppConfig;
use trackdraw_core::color::AciColor;
use trackdraw_core::lineweight::LineweightTable;
use trackdraw_engine::pipeline::{ConversionJob, run_conversion};
use trackdraw_engine::render::TrackStyle;
use trackdraw_io::DxfFacade;

fn main() {
    let config = match AppConfig::discover() {
        Ok(config) => config,
        Err(err) => {
            init_logging(&AppConfig::default());
            error!(error = %err, "加载配置失败");
            std::process::exit(1);
        }
    };
    init_logging(&config);
    info!("启动管线 DXF 转换");

    let job = build_job(&config);
    if let Err(err) = run_conversion(&job, &DxfFacade::new()) {
        error!(error = %err, "转换失败");
        std::process::exit(1);
    }
}

fn build_job(config: &AppConfig) -> ConversionJob {
    ConversionJob {
        track_path: config.paths.track_data.clone(),
        template_path: config.paths.template.clone(),
        output_path: config.paths.output.clone(),
        style: TrackStyle {
            layer: config.style.layer.clone(),
            line_color: AciColor::new(config.style.line_color),
            dot_color: AciColor::new(config.style.dot_color),
        },
        lineweights: LineweightTable::dxf(),
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
