use axum::{ extract::{ Path, State }, http::StatusCode, Json };
use serde::{ Deserialize, Serialize };

use crate::chains::detect_chain;
use crate::enums::Chain;
use crate::error::{ AppError, Result };
use crate::services::AddressSnapshot;

use super::AppState;

#[derive(Deserialize)]
pub struct ConnectWalletRequest {
    pub address: String,
}

#[derive(Serialize)]
pub struct ConnectWalletResponse {
    pub address: String,
    pub chain: Chain,
    pub snapshot: Option<AddressSnapshot>,
}

pub async fn connect_wallet(
    State(state): State<AppState>,
    Json(request): Json<ConnectWalletRequest>
) -> Result<Json<ConnectWalletResponse>> {
    let address = request.address.trim();
    let chain = detect_chain(address).ok_or_else(|| AppError::InvalidAddress(address.to_string()))?;

    let snapshot = state.aggregator.connect_wallet(address).await?;

    Ok(
        Json(ConnectWalletResponse {
            address: chain.normalize_address(address),
            chain,
            snapshot,
        })
    )
}

pub async fn disconnect_wallet(
    State(state): State<AppState>,
    Path(address): Path<String>
) -> Result<StatusCode> {
    if !state.aggregator.clear_balances(&address).await {
        return Err(AppError::NotTracked(address));
    }

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{ app, send };
    use crate::testing::{ FakeChainProvider, FakePriceFeed };
    use axum::http::StatusCode;
    use ethers::types::U256;
    use serde_json::json;

    fn provider() -> FakeChainProvider {
        FakeChainProvider::new("fake").with_native(U256::from(10u64).pow(U256::from(18u64)))
    }

    #[tokio::test]
    async fn test_connect_then_disconnect() {
        let (app, state) = app(provider(), FakePriceFeed::new(&[("ETH", 2000.0)]));
        state.price_service.refresh().await;
        let address = format!("0x{}", "A".repeat(40));

        let (status, body) = send(
            &app,
            "POST",
            "/api/wallets/connect",
            Some(json!({ "address": address }))
        ).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["chain"], "ethereum");
        assert_eq!(body["address"], address.to_lowercase());
        assert_eq!(body["snapshot"]["total_usd"], 2000.0);
        assert_eq!(state.aggregator.tracked_addresses().await.len(), 1);

        let (status, _) = send(&app, "DELETE", &format!("/api/wallets/{}", address), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(state.aggregator.tracked_addresses().await.is_empty());

        let (status, body) = send(&app, "DELETE", &format!("/api/wallets/{}", address), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_TRACKED");
    }

    #[tokio::test]
    async fn test_connect_rejects_unclassifiable_address() {
        let (app, state) = app(provider(), FakePriceFeed::new(&[("ETH", 2000.0)]));

        let (status, body) = send(
            &app,
            "POST",
            "/api/wallets/connect",
            Some(json!({ "address": "hello" }))
        ).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_ADDRESS");
        assert!(state.aggregator.tracked_addresses().await.is_empty());
    }
}
