use axum::{ extract::State, Json };

use crate::services::PriceSnapshot;

use super::AppState;

/// `null` until the first refresh has run.
pub async fn get_prices(State(state): State<AppState>) -> Json<Option<PriceSnapshot>> {
    let snapshot = state.price_service.current().await;
    Json(snapshot.map(|s| (*s).clone()))
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{ app, send };
    use crate::testing::{ FakeChainProvider, FakePriceFeed };
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_prices_before_and_after_refresh() {
        let (app, state) = app(FakeChainProvider::new("fake"), FakePriceFeed::new(&[("ETH", 2000.0)]));

        let (status, body) = send(&app, "GET", "/api/prices", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_null());

        state.price_service.refresh().await;
        let (_, body) = send(&app, "GET", "/api/prices", None).await;
        assert_eq!(body["source"], "live");
        assert_eq!(body["prices"]["ETH"]["usd"], 2000.0);
    }

    #[tokio::test]
    async fn test_prices_fall_back_when_feed_is_down() {
        let (app, state) = app(FakeChainProvider::new("fake"), FakePriceFeed::unreachable());
        state.price_service.refresh().await;

        let (_, body) = send(&app, "GET", "/api/prices", None).await;
        assert_eq!(body["source"], "fallback");
        assert_eq!(body["prices"]["MNDM"]["usd"], 0.0);
    }
}
