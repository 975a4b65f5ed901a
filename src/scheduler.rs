use crate::services::PriceService;
use std::sync::Arc;
use tokio::time::{ interval_at, Duration, Instant, MissedTickBehavior };

/// Drives the price oracle once per period. The startup refresh is the
/// caller's, so the first tick lands one period later.
pub struct Scheduler {
    price_service: Arc<PriceService>,
    period: Duration,
}

impl Scheduler {
    pub fn new(price_service: Arc<PriceService>, period: Duration) -> Self {
        Self {
            price_service,
            period,
        }
    }

    pub async fn start(self) {
        let mut interval = interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!("Price refresher running every {:?}", self.period);

        loop {
            interval.tick().await;
            self.price_service.refresh().await;
        }
    }
}
