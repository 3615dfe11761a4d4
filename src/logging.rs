use crate::config::Environment;
use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` is honored on top of the crate default (`debug` in
/// development, `info` otherwise).
pub fn init(environment: Environment) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(filter_for(environment)?)
        .with_target(false)
        .init();
    Ok(())
}

fn filter_for(environment: Environment) -> Result<EnvFilter> {
    let level = if environment.is_development() {
        "debug"
    } else {
        "info"
    };
    Ok(EnvFilter::from_default_env()
        .add_directive(format!("portfolio_server={}", level).parse()?)
        .add_directive(format!("check_translations={}", level).parse()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_level_follows_environment() {
        let dev = filter_for(Environment::Development).unwrap().to_string();
        let prod = filter_for(Environment::Production).unwrap().to_string();

        assert!(dev.contains("portfolio_server=debug"));
        assert!(prod.contains("portfolio_server=info"));
    }
}
