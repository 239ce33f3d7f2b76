/// Server configuration
///
/// # Environment variables
///
/// All settings can be overridden through environment variables:
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | DATABASE_PATH | ./storefront.db | SQLite database file |
/// | HTTP_PORT | 3000 | HTTP API port |
/// | ENVIRONMENT | development | development \| staging \| production |
/// | TAX_RATE | 0.08 | Flat tax rate applied to the subtotal |
/// | DELIVERY_FEE | 5.99 | Flat delivery fee below the free threshold |
/// | FREE_DELIVERY_THRESHOLD | 50.0 | Subtotal at which delivery becomes free |
/// | CURRENCY | usd | ISO currency code sent to the gateway |
/// | STRIPE_SECRET_KEY | (empty) | Gateway API key |
/// | STRIPE_WEBHOOK_SECRET | (empty) | Webhook signing secret |
/// | GATEWAY_TIMEOUT_MS | 10000 | Bound on every gateway call |
/// | WEBHOOK_TOLERANCE_SECS | 300 | Max signature timestamp skew |
///
/// # Example
///
/// ```ignore
/// DATABASE_PATH=/data/storefront.db HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file path
    pub database_path: String,
    /// HTTP API port
    pub http_port: u16,
    /// Runtime environment: development | staging | production
    pub environment: String,

    // === Checkout pricing ===
    /// Flat tax rate applied to the subtotal
    pub tax_rate: f64,
    /// Flat delivery fee charged below the free-delivery threshold
    pub delivery_fee: f64,
    /// Subtotal at or above which delivery is free
    pub free_delivery_threshold: f64,
    /// Currency code used for payment intents
    pub currency: String,

    // === Payment gateway ===
    /// Gateway secret API key
    pub stripe_secret_key: String,
    /// Webhook signing secret shared with the gateway
    pub stripe_webhook_secret: String,
    /// Timeout for gateway HTTP calls (milliseconds)
    pub gateway_timeout_ms: u64,
    /// Accepted clock skew for webhook signatures (seconds)
    pub webhook_tolerance_secs: i64,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset variables fall back to defaults.
    pub fn from_env() -> Self {
        Self {
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "./storefront.db".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),

            tax_rate: std::env::var("TAX_RATE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.08),
            delivery_fee: std::env::var("DELIVERY_FEE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5.99),
            free_delivery_threshold: std::env::var("FREE_DELIVERY_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(50.0),
            currency: std::env::var("CURRENCY").unwrap_or_else(|_| "usd".into()),

            stripe_secret_key: std::env::var("STRIPE_SECRET_KEY").unwrap_or_default(),
            stripe_webhook_secret: std::env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_default(),
            gateway_timeout_ms: std::env::var("GATEWAY_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10_000),
            webhook_tolerance_secs: std::env::var("WEBHOOK_TOLERANCE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
        }
    }

    /// Override database path and port, keeping everything else from env
    ///
    /// Mostly used by tests.
    pub fn with_overrides(database_path: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.database_path = database_path.into();
        config.http_port = http_port;
        config
    }
}
