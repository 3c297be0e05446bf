use crate::{config::AppConfig, db::DbPool, razorpay::RazorpayClient};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: AppConfig,
    pub razorpay: RazorpayClient,
}

impl AppState {
    pub fn new(pool: DbPool, config: AppConfig) -> Self {
        let razorpay = RazorpayClient::new(
            config.razorpay_key_id.clone(),
            config.razorpay_key_secret.clone(),
        );
        Self {
            pool,
            config,
            razorpay,
        }
    }
}
