use clap::Parser;
use lesion_classifier::classifier::{DEFAULT_THRESHOLD, DEFAULT_TOP_K};
use lesion_classifier::config::{DEFAULT_IMAGE_DIR, DEFAULT_MAX_UPLOAD_SIZE, ServerConfig};
use lesion_classifier::preprocess::DEFAULT_INPUT_SIZE;
use lesion_classifier::{AppState, logging, server};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(
        long,
        default_value = "127.0.0.1",
        help = "Host address to bind the server to"
    )]
    host: String,

    #[arg(long, default_value_t = 4000, help = "Port number to listen on")]
    port: u16,

    #[arg(long, help = "Path to the ONNX export of the trained classifier")]
    model_path: PathBuf,

    #[arg(
        long,
        help = "Optional labels file, one class per line in model output order"
    )]
    labels_path: Option<PathBuf>,

    #[arg(
        long,
        default_value = DEFAULT_IMAGE_DIR,
        help = "Directory uploaded images are saved to and served from"
    )]
    image_dir: PathBuf,

    #[arg(long, default_value_t = DEFAULT_INPUT_SIZE, help = "Model input width in pixels")]
    input_width: u32,

    #[arg(long, default_value_t = DEFAULT_INPUT_SIZE, help = "Model input height in pixels")]
    input_height: u32,

    #[arg(
        long,
        default_value_t = DEFAULT_TOP_K,
        help = "Number of ranked labels to report"
    )]
    top_k: usize,

    #[arg(
        long,
        default_value_t = DEFAULT_THRESHOLD,
        help = "Minimum top confidence (percent) before the result is reported as unknown"
    )]
    threshold: f64,

    #[arg(
        long,
        default_value_t = 1,
        help = "Maximum number of inferences running at the same time"
    )]
    max_concurrent_inferences: usize,

    #[arg(
        long,
        default_value_t = DEFAULT_MAX_UPLOAD_SIZE,
        help = "Maximum accepted upload size in bytes"
    )]
    max_upload_size: usize,

    #[arg(
        long,
        default_value = "info",
        help = "Log level: off, error, warn, info, debug, trace"
    )]
    log_level: log::LevelFilter,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        ServerConfig {
            host: args.host,
            port: args.port,
            model_path: args.model_path,
            labels_path: args.labels_path,
            image_dir: args.image_dir,
            input_width: args.input_width,
            input_height: args.input_height,
            top_k: args.top_k,
            threshold: args.threshold,
            max_concurrent_inferences: args.max_concurrent_inferences,
            max_upload_size: args.max_upload_size,
            log_level: args.log_level,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from(Args::parse());
    logging::init_logging(config.log_level);

    let app_state = AppState::new(&config)?;
    actix_web::rt::System::new().block_on(server::startup(config, app_state))?;
    Ok(())
}
