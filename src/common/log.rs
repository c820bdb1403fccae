use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_tree::HierarchicalLayer;
use tracing_tree::time::Uptime;

const DEFAULT_FILTER: &str = "zonal=info";

/// Installs the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let tree = HierarchicalLayer::new(2)
        .with_writer(std::io::stderr)
        .with_indent_lines(true)
        .with_targets(true)
        .with_timer(Uptime::default());

    // A second init (tests, repeated CLI entry) keeps the first subscriber.
    let _ = tracing_subscriber::registry().with(filter).with(tree).try_init();
}
