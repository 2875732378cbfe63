use tracing_subscriber::EnvFilter;

/// Workspace crate targets that receive log output.
const CRATE_TARGETS: &[&str] = &[
    "teval",
    "teval_ensemble",
    "teval_io",
    "teval_metrics",
    "teval_stats",
];

/// Initialize tracing from the CLI verbosity count.
///
/// 0 maps to warn, `-v` to info, `-vv` to debug and anything above to
/// trace. `RUST_LOG` overrides the flag when set.
pub fn init(verbosity: u8) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn default_filter(verbosity: u8) -> String {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    CRATE_TARGETS
        .iter()
        .map(|t| format!("{t}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert!(default_filter(0).starts_with("teval=warn,"));
        assert!(default_filter(1).contains("teval_io=info"));
        assert!(default_filter(2).contains("teval_metrics=debug"));
        assert!(default_filter(7).ends_with("teval_stats=trace"));
    }
}
