use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding `EnvFilter` directives.
pub const LOG_ENV: &str = "MEDIACUT_LOG";

/// Initialize structured JSON logging on stderr at `error` unless `MEDIACUT_LOG` says otherwise.
pub fn init() {
    init_with_default(LevelFilter::ERROR);
}

/// Like [`init`], with a different fallback level. Later calls are no-ops.
pub fn init_with_default(default: LevelFilter) {
    let directives = std::env::var(LOG_ENV).unwrap_or_default();

    let _ = tracing_subscriber::registry()
        .with(filter_for(&directives, default))
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .with_span_list(true),
        )
        .try_init();
}

fn filter_for(directives: &str, default: LevelFilter) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(default.into())
        .parse_lossy(directives)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init();
        init_with_default(LevelFilter::INFO);
    }

    #[test]
    fn empty_directives_fall_back_to_default_level() {
        let filter = filter_for("", LevelFilter::INFO);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn directives_can_raise_verbosity_for_the_engine() {
        let filter = filter_for("mediacut::engines=debug", LevelFilter::ERROR);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }
}
