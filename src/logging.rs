use std::io::Write;
use std::sync::Once;

static INIT: Once = Once::new();

/// Installs the global logger. Later calls are ignored so tests and the
/// binary can both call it.
pub fn init_logging(level: log::LevelFilter) {
    INIT.call_once(|| {
        let _ = env_logger::Builder::new()
            .format(|buf, record| {
                writeln!(
                    buf,
                    "{} - {} - {}",
                    chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                    record.level(),
                    record.args()
                )
            })
            .filter(None, level)
            .parse_default_env()
            .try_init();
    });
}
