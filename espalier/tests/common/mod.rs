use tracing_subscriber::EnvFilter;

/// Route engine logs to the test output. Filter with `ESPALIER_LOG`,
/// e.g. `ESPALIER_LOG=espalier=trace`.
pub fn setup() {
    let filter =
        EnvFilter::try_from_env("ESPALIER_LOG").unwrap_or_else(|_| EnvFilter::new("off"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .with_target(true)
        .compact()
        .try_init()
        .ok();
}
