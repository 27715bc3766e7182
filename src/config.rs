use clap::Parser;

// CLI argument structure, every flag can also come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "shot-gateway")]
#[command(about = "Rate limited HTTP front for remote screenshot rendering")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "SHOT_PORT", default_value_t = 8080)]
    pub port: u16,

    // Render backends (comma-separated)
    // Example: "localhost:3000,render-2:3000"
    #[arg(short, long, env = "SHOT_BACKENDS", default_value = "localhost:3000")]
    pub backends: String,

    // Rate limit max requests per client per window
    #[arg(long, env = "SHOT_RATE_LIMIT", default_value_t = 60)]
    pub rate_limit: u32,

    // Rate limit window in seconds
    #[arg(long, env = "SHOT_RATE_WINDOW", value_parser = clap::value_parser!(u64).range(1..), default_value_t = 60)]
    pub rate_window: u64,

    // Seconds between sweeps of stale rate limit records
    #[arg(long, env = "SHOT_SWEEP_INTERVAL", value_parser = clap::value_parser!(u64).range(1..), default_value_t = 60)]
    pub sweep_interval: u64,

    // Health check interval in seconds
    #[arg(long, env = "SHOT_HEALTH_INTERVAL", value_parser = clap::value_parser!(u64).range(1..), default_value_t = 30)]
    pub health_interval: u64,

    // Path probed on each backend by the health checker
    #[arg(long, env = "SHOT_HEALTH_PATH", default_value = "/json/version")]
    pub health_path: String,

    // Header set by the trusted proxy with the real client ip
    #[arg(long, env = "SHOT_TRUSTED_IP_HEADER", default_value = "cf-connecting-ip")]
    pub trusted_ip_header: String,

    // Allowed CORS origins (comma-separated)
    #[arg(long, env = "SHOT_CORS_ORIGINS", default_value = "http://localhost:3000")]
    pub cors_origins: String,
}

impl Args {
    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["shot-gateway"]).unwrap();
        assert_eq!(args.port, 8080);
        assert_eq!(args.rate_limit, 60);
        assert_eq!(args.rate_window, 60);
        assert_eq!(args.trusted_ip_header, "cf-connecting-ip");
        assert_eq!(args.cors_origins(), vec!["http://localhost:3000"]);
    }

    #[test]
    fn origins_are_split_and_trimmed() {
        let args = Args::try_parse_from([
            "shot-gateway",
            "--cors-origins",
            "https://a.example, https://b.example,",
            "--rate-limit",
            "5",
        ])
        .unwrap();
        assert_eq!(args.rate_limit, 5);
        assert_eq!(args.cors_origins(), vec!["https://a.example", "https://b.example"]);
    }
}
