use std::sync::Arc;

use sqlx::SqlitePool;

use crate::core::Config;
use crate::db::DbService;
use crate::orders::coupon::{CouponEvaluator, NoCoupons};
use crate::payments::{PaymentGateway, StripeGateway};
use shared::AppError;

/// Server state - holds shared handles to every service
///
/// `ServerState` is the single data structure threaded through the axum
/// router. `Clone` is shallow: the pool and the trait objects are shared.
///
/// | Field | Type | Description |
/// |-------|------|-------------|
/// | config | Config | Configuration (immutable) |
/// | db | SqlitePool | SQLite connection pool |
/// | gateway | Arc<dyn PaymentGateway> | Payment gateway adapter |
/// | coupons | Arc<dyn CouponEvaluator> | Coupon evaluator collaborator |
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Config,
    /// SQLite connection pool
    pub db: SqlitePool,
    /// Payment gateway adapter
    pub gateway: Arc<dyn PaymentGateway>,
    /// Coupon evaluator
    pub coupons: Arc<dyn CouponEvaluator>,
}

impl ServerState {
    /// Create server state from parts
    ///
    /// Usually [`initialize()`](Self::initialize) is what you want; tests use
    /// this constructor to inject an in-memory pool and a mock gateway.
    pub fn new(
        config: Config,
        db: SqlitePool,
        gateway: Arc<dyn PaymentGateway>,
        coupons: Arc<dyn CouponEvaluator>,
    ) -> Self {
        Self {
            config,
            db,
            gateway,
            coupons,
        }
    }

    /// Initialize the full server state from configuration
    pub async fn initialize(config: &Config) -> Result<Self, AppError> {
        let db_service = DbService::new(&config.database_path).await?;

        let gateway: Arc<dyn PaymentGateway> = Arc::new(StripeGateway::new(
            &config.stripe_secret_key,
            config.gateway_timeout_ms,
        )?);

        let coupons: Arc<dyn CouponEvaluator> = Arc::new(NoCoupons);

        Ok(Self::new(config.clone(), db_service.pool, gateway, coupons))
    }

    /// Get the database pool
    pub fn get_db(&self) -> SqlitePool {
        self.db.clone()
    }
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("config", &self.config)
            .field("db", &"<SqlitePool>")
            .finish()
    }
}
