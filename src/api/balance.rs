use axum::{ extract::{ Path, State }, Json };
use serde::Serialize;

use crate::chains::detect_chain;
use crate::error::{ AppError, Result };
use crate::services::AddressSnapshot;

use super::AppState;

#[derive(Serialize)]
pub struct RefreshResponse {
    /// False when the cycle was skipped because another one was running.
    pub refreshed: bool,
    pub snapshot: Option<AddressSnapshot>,
}

pub async fn list_balances(State(state): State<AppState>) -> Json<Vec<AddressSnapshot>> {
    Json(state.aggregator.snapshots().await)
}

pub async fn get_balance(
    State(state): State<AppState>,
    Path(address): Path<String>
) -> Result<Json<AddressSnapshot>> {
    let snapshot = state.aggregator
        .snapshot(&address).await
        .ok_or_else(|| AppError::NotTracked(address))?;

    Ok(Json(snapshot))
}

pub async fn refresh_balance(
    State(state): State<AppState>,
    Path(address): Path<String>
) -> Result<Json<RefreshResponse>> {
    let chain = detect_chain(&address).ok_or_else(|| AppError::InvalidAddress(address.clone()))?;

    let response = match state.aggregator.fetch_balances(&address, chain).await? {
        Some(snapshot) =>
            RefreshResponse {
                refreshed: true,
                snapshot: Some(snapshot),
            },
        None =>
            RefreshResponse {
                refreshed: false,
                snapshot: state.aggregator.snapshot(&address).await,
            },
    };

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{ app, send };
    use crate::testing::{ FakeChainProvider, FakePriceFeed };
    use axum::http::StatusCode;
    use ethers::types::U256;

    const USDC: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";

    #[tokio::test]
    async fn test_refresh_then_read_back() {
        let provider = FakeChainProvider::new("fake")
            .with_native(U256::from(10u64).pow(U256::from(18u64)))
            .with_token(USDC, Some(U256::from(1_500_000u64)));
        let (app, state) = app(provider, FakePriceFeed::new(&[("ETH", 2000.0), ("USDC", 1.0)]));
        state.price_service.refresh().await;
        let address = format!("0x{}", "a".repeat(40));

        let (status, body) = send(&app, "POST", &format!("/api/balances/{}/refresh", address), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["refreshed"], true);
        assert_eq!(body["snapshot"]["native"]["formatted"], "1.0000 ETH");
        assert_eq!(body["snapshot"]["tokens"][0]["symbol"], "USDC");
        assert_eq!(body["snapshot"]["total_usd"], 2001.5);

        let (status, body) = send(&app, "GET", &format!("/api/balances/{}", address), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["address"], address);

        let (_, body) = send(&app, "GET", "/api/balances", None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_address_is_not_found() {
        let (app, _) = app(FakeChainProvider::new("fake"), FakePriceFeed::unreachable());
        let address = format!("0x{}", "b".repeat(40));

        let (status, body) = send(&app, "GET", &format!("/api/balances/{}", address), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_TRACKED");
    }

    #[tokio::test]
    async fn test_refresh_rejects_bad_address() {
        let (app, _) = app(FakeChainProvider::new("fake"), FakePriceFeed::unreachable());

        let (status, _) = send(&app, "POST", "/api/balances/nope/refresh", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
