use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const ENV_LOG_FORMAT: &str = "NEWS_LOG_FORMAT";
const DEFAULT_FILTER: &str = "news_analyzer=info,reporter=info,warn";

/// Install the global tracing subscriber.
///
/// Filter comes from `RUST_LOG`, falling back to [`DEFAULT_FILTER`].
/// `NEWS_LOG_FORMAT=json` switches to JSON lines. Calling this twice is
/// harmless (the second install fails quietly).
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let json = std::env::var(ENV_LOG_FORMAT)
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    let _ = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
}
