use {
    crate::{config::Config, panic_hook},
    std::{io::IsTerminal, sync::Once},
    time::macros::format_description,
    tracing::level_filters::LevelFilter,
    tracing_subscriber::{
        EnvFilter,
        Layer,
        Registry,
        fmt::{
            time::UtcTime,
            writer::{BoxMakeWriter, MakeWriterExt as _},
        },
        layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    },
};

/// Initializes tracing setup that is shared between the binaries.
/// `env_filter` has similar syntax to env_logger. It is documented at
/// https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html
pub fn initialize(config: &Config) {
    set_tracing_subscriber(config);
    panic_hook::install();
}

/// Like [`initialize`], but can be called multiple times in a row. Later calls
/// are ignored.
///
/// Useful for tests.
pub fn initialize_reentrant(config: &Config) {
    // The tracing subscriber below is global object so initializing it again in the
    // same process by a different thread would fail.
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        set_tracing_subscriber(config);
        panic_hook::install();
    });
}

fn set_tracing_subscriber(config: &Config) {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer(config.stderr_threshold))
        .with_timer(UtcTime::new(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
        )))
        .with_ansi(std::io::stdout().is_terminal());
    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = if config.use_json_format {
        fmt_layer.json().boxed()
    } else {
        fmt_layer.boxed()
    };

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(EnvFilter::new(&config.env_filter)))
        .init();
}

/// Events at or above `stderr_threshold` go to stderr, everything else to
/// stdout.
fn writer(stderr_threshold: LevelFilter) -> BoxMakeWriter {
    match stderr_threshold.into_level() {
        Some(level) => {
            BoxMakeWriter::new(std::io::stderr.with_max_level(level).or_else(std::io::stdout))
        }
        None => BoxMakeWriter::new(std::io::stdout),
    }
}
