use clap::Parser;

/// Terminal client that renders generated test cases as cards.
#[derive(Parser, Debug, Clone, Default)]
#[command(version)]
pub struct Cli {
    /// Base URL of the generator service (overrides the config file).
    #[arg(long, value_name = "URL")]
    pub server: Option<String>,

    /// Run a single request without the terminal UI and print the final
    /// document markup to stdout.
    #[arg(long, value_name = "PROMPT")]
    pub once: Option<String>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, default_value_t = false)]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let cli = Cli::parse_from(["casecards", "--server", "http://gen:8000", "--once", "Login page"]);
        assert_eq!(cli.server.as_deref(), Some("http://gen:8000"));
        assert_eq!(cli.once.as_deref(), Some("Login page"));
        assert!(!cli.debug);
    }

    #[test]
    fn test_no_flags() {
        let cli = Cli::parse_from(["casecards"]);
        assert!(cli.server.is_none());
        assert!(cli.once.is_none());
    }
}
