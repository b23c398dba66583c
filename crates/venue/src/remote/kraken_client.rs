use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::config::{DEFAULT_VENUE_BASE_URL, DEFAULT_VENUE_TIMEOUT, VenueSettings};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method};
use tracing::{debug, error, info, warn};
use url::form_urlencoded;

use super::balance_response::{BalanceResponse, TradeBalanceResponse};
use super::envelope;
use super::order_request::OrderInput;
use super::order_response::{AddOrderResponse, CancelOrderResponse};
use crate::error::VenueError;
use crate::nonce::{MonotonicNonce, NonceSource};
use crate::signature::Signer;
use crate::traits::OrderVenue;

pub const PRIVATE_PATH_PREFIX: &str = "/0/private/";

const USER_AGENT: &str = concat!("signal-relay/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct KrakenClient {
    client: Client,
    base_url: String,
    api_key: String,
    signer: Signer,
    nonce: Arc<dyn NonceSource>,
    timeout: Duration,
}

impl KrakenClient {
    pub fn new(api_key: &str, api_secret: &str) -> Result<Self, VenueError> {
        Self::with_endpoint(api_key, api_secret, DEFAULT_VENUE_BASE_URL, DEFAULT_VENUE_TIMEOUT)
    }

    pub fn from_settings(settings: &VenueSettings) -> Result<Self, VenueError> {
        Self::with_endpoint(
            &settings.api_key,
            &settings.api_secret,
            &settings.base_url,
            settings.timeout,
        )
    }

    pub fn with_endpoint(
        api_key: &str,
        api_secret: &str,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, VenueError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(VenueError::MissingApiKey);
        }
        let signer = Signer::new(api_secret)?;

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(VenueError::Client)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            signer,
            nonce: Arc::new(MonotonicNonce::new()),
            timeout,
        })
    }

    /// Replaces the nonce source. Clients sharing credentials must share one source.
    pub fn with_nonce_source(mut self, nonce: Arc<dyn NonceSource>) -> Self {
        self.nonce = nonce;
        self
    }

    async fn send_signed(
        &self,
        method: Method,
        path: &str,
        mut params: BTreeMap<String, String>,
    ) -> Result<Vec<u8>, VenueError> {
        if !path.starts_with(PRIVATE_PATH_PREFIX) {
            return Err(VenueError::InvalidPath(path.to_string()));
        }

        let nonce = self.nonce.next_nonce().to_string();
        params.insert("nonce".to_string(), nonce.clone());
        let body = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params.iter())
            .finish();
        let signature = self.signer.sign(path, &nonce, &body);
        let url = format!("{}{}", self.base_url, path);

        debug!(%method, path, nonce = %nonce, "Sending signed request");

        let resp = self
            .client
            .request(method, &url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(ACCEPT, "application/json")
            .header("API-Key", &self.api_key)
            .header("API-Sign", signature)
            .body(body)
            .send()
            .await
            .map_err(|e| self.transport_error(path, e))?;

        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| self.transport_error(path, e))?;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes).into_owned();
            error!(path, status = status.as_u16(), "Venue request failed: {}", body);
            return Err(VenueError::HttpStatus {
                path: path.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(bytes.to_vec())
    }

    fn transport_error(&self, path: &str, source: reqwest::Error) -> VenueError {
        if source.is_timeout() {
            warn!(path, timeout = ?self.timeout, "Venue request timed out");
            VenueError::Timeout {
                path: path.to_string(),
                timeout: self.timeout,
            }
        } else {
            warn!(path, "Venue request failed: {}", source);
            VenueError::Transport {
                path: path.to_string(),
                source,
            }
        }
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: BTreeMap<String, String>,
    ) -> Result<T, VenueError> {
        let body = self.send_signed(Method::POST, path, params).await?;
        envelope::decode(path, &body)
    }

    pub async fn add_order(&self, order: &OrderInput) -> Result<AddOrderResponse, VenueError> {
        info!(
            pair = %order.pair,
            side = %order.side,
            order_type = %order.order_type,
            volume = %order.volume,
            validate = order.validate,
            "Placing order"
        );
        let resp: AddOrderResponse = self.call("/0/private/AddOrder", order.form_params()).await?;
        info!(
            description = %resp.description.order,
            tx_ids = ?resp.tx_ids,
            "Order accepted"
        );
        Ok(resp)
    }

    pub async fn get_balance(&self) -> Result<BalanceResponse, VenueError> {
        self.call("/0/private/Balance", BTreeMap::new()).await
    }

    /// `asset` defaults to `ZUSD` on the venue side when `None`.
    pub async fn get_trade_balance(
        &self,
        asset: Option<&str>,
    ) -> Result<TradeBalanceResponse, VenueError> {
        let mut params = BTreeMap::new();
        if let Some(asset) = asset.map(str::trim).filter(|a| !a.is_empty()) {
            params.insert("asset".to_string(), asset.to_string());
        }
        self.call("/0/private/TradeBalance", params).await
    }

    pub async fn cancel_order(&self, tx_id: &str) -> Result<CancelOrderResponse, VenueError> {
        info!(tx_id, "Cancelling order");
        let mut params = BTreeMap::new();
        params.insert("txid".to_string(), tx_id.to_string());
        self.call("/0/private/CancelOrder", params).await
    }
}

#[async_trait]
impl OrderVenue for KrakenClient {
    async fn add_order(&self, order: &OrderInput) -> Result<AddOrderResponse, VenueError> {
        KrakenClient::add_order(self, order).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::CloseOrder;
    use crate::signature;
    use axum::Router;
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode, Uri};
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU64, Ordering};

    const SECRET: &str =
        "kQH5HW/8p1uGOVjbgWA7FunAmGO8lsSUXNsu3eow76sz84Q18fWxnyRzBHCd3pd5nE9qa99HAZtuZuj6F1huXg==";

    #[derive(Debug, Clone)]
    struct Captured {
        path: String,
        api_key: String,
        api_sign: String,
        body: String,
    }

    impl Captured {
        fn form(&self) -> BTreeMap<String, String> {
            form_urlencoded::parse(self.body.as_bytes())
                .into_owned()
                .collect()
        }
    }

    #[derive(Clone)]
    struct FakeVenue {
        requests: Arc<Mutex<Vec<Captured>>>,
        status: StatusCode,
        reply: String,
        delay: Duration,
    }

    impl FakeVenue {
        fn replying(status: StatusCode, reply: &str) -> Self {
            Self {
                requests: Arc::default(),
                status,
                reply: reply.to_string(),
                delay: Duration::ZERO,
            }
        }

        fn captured(&self) -> Vec<Captured> {
            self.requests.lock().unwrap().clone()
        }
    }

    async fn record(
        State(venue): State<FakeVenue>,
        uri: Uri,
        headers: HeaderMap,
        body: String,
    ) -> (StatusCode, String) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string()
        };
        venue.requests.lock().unwrap().push(Captured {
            path: uri.path().to_string(),
            api_key: header("API-Key"),
            api_sign: header("API-Sign"),
            body,
        });
        if !venue.delay.is_zero() {
            tokio::time::sleep(venue.delay).await;
        }
        (venue.status, venue.reply.clone())
    }

    async fn serve(venue: FakeVenue) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().fallback(record).with_state(venue);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    struct SequenceNonce(AtomicU64);

    impl NonceSource for SequenceNonce {
        fn next_nonce(&self) -> u64 {
            self.0.fetch_add(1, Ordering::SeqCst)
        }
    }

    fn client(base_url: &str, timeout: Duration) -> KrakenClient {
        KrakenClient::with_endpoint("test-key", SECRET, base_url, timeout)
            .unwrap()
            .with_nonce_source(Arc::new(SequenceNonce(AtomicU64::new(1616492376594))))
    }

    fn limit_buy() -> OrderInput {
        OrderInput {
            pair: "XBTUSD".to_string(),
            side: "buy".to_string(),
            order_type: "limit".to_string(),
            volume: "1.25".to_string(),
            price: Some("37500".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn add_order_is_signed_and_decoded() {
        let venue = FakeVenue::replying(
            StatusCode::OK,
            r#"{"error":[],"result":{"descr":{"order":"buy 1.25 XBTUSD @ limit 37500","close":"close position @ stop loss 36000"},"txid":["OABC12-DEF34-GHI56"]}}"#,
        );
        let base_url = serve(venue.clone()).await;
        let order = OrderInput {
            close: Some(CloseOrder {
                order_type: Some("stop-loss".to_string()),
                price: Some("36000".to_string()),
                price2: None,
            }),
            ..limit_buy()
        };

        let resp = client(&base_url, Duration::from_secs(5))
            .add_order(&order)
            .await
            .unwrap();
        assert_eq!(resp.first_tx_id(), Some("OABC12-DEF34-GHI56"));
        assert_eq!(resp.description.order, "buy 1.25 XBTUSD @ limit 37500");

        let captured = venue.captured();
        assert_eq!(captured.len(), 1);
        let request = &captured[0];
        assert_eq!(request.path, "/0/private/AddOrder");
        assert_eq!(request.api_key, "test-key");

        let form = request.form();
        assert_eq!(form["nonce"], "1616492376594");
        assert_eq!(form["close[ordertype]"], "stop-loss");
        assert_eq!(form["close[price]"], "36000");
        assert!(!form.contains_key("close[price2]"));
        assert!(!form.contains_key("validate"));

        let secret = BASE64.decode(SECRET).unwrap();
        let expected = signature::sign(&secret, &request.path, &form["nonce"], &request.body);
        assert_eq!(request.api_sign, expected);
    }

    #[tokio::test]
    async fn signature_matches_the_published_example() {
        let venue = FakeVenue::replying(
            StatusCode::OK,
            r#"{"error":[],"result":{"descr":{"order":"buy 1.25 XBTUSD @ limit 37500"}}}"#,
        );
        let base_url = serve(venue.clone()).await;

        client(&base_url, Duration::from_secs(5))
            .add_order(&limit_buy())
            .await
            .unwrap();

        let request = &venue.captured()[0];
        assert_eq!(
            request.body,
            "nonce=1616492376594&ordertype=limit&pair=XBTUSD&price=37500&type=buy&volume=1.25"
        );
        assert_eq!(
            request.api_sign,
            "4/dpxb3iT4tp/ZCVEwSnEsLxx0bqyhLpdfOpc6fn7OR8+UClSV5n9E6aSS8MPtnRfp32bAb0nmbRn6H8ndwLUQ=="
        );
    }

    #[tokio::test]
    async fn every_request_gets_a_fresh_nonce() {
        let venue = FakeVenue::replying(
            StatusCode::OK,
            r#"{"error":[],"result":{"XXBT":"0.5000000000","ZUSD":"120.0000"}}"#,
        );
        let base_url = serve(venue.clone()).await;
        let client = KrakenClient::with_endpoint("test-key", SECRET, &base_url, Duration::from_secs(5))
            .unwrap();

        let balances = client.get_balance().await.unwrap();
        assert_eq!(balances["ZUSD"], "120.0000");
        client.get_balance().await.unwrap();

        let nonces: Vec<u64> = venue
            .captured()
            .iter()
            .map(|r| r.form()["nonce"].parse().unwrap())
            .collect();
        assert_eq!(nonces.len(), 2);
        assert!(nonces[0] < nonces[1]);
    }

    #[tokio::test]
    async fn cancel_order_sends_the_txid() {
        let venue = FakeVenue::replying(
            StatusCode::OK,
            r#"{"error":[],"result":{"count":1,"pending":true}}"#,
        );
        let base_url = serve(venue.clone()).await;

        let resp = client(&base_url, Duration::from_secs(5))
            .cancel_order("OABC12-DEF34-GHI56")
            .await
            .unwrap();
        assert_eq!(resp.count, 1);
        assert!(resp.pending);

        let captured = venue.captured();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].path, "/0/private/CancelOrder");
        let form = captured[0].form();
        assert_eq!(form["txid"], "OABC12-DEF34-GHI56");
        assert_eq!(form["nonce"], "1616492376594");
        assert_eq!(form.len(), 2);
    }

    #[tokio::test]
    async fn cancel_order_without_pending_flag() {
        let base_url = serve(FakeVenue::replying(
            StatusCode::OK,
            r#"{"error":[],"result":{"count":2}}"#,
        ))
        .await;

        let resp = client(&base_url, Duration::from_secs(5))
            .cancel_order("OTX-1")
            .await
            .unwrap();
        assert_eq!(resp.count, 2);
        assert!(!resp.pending);
    }

    #[tokio::test]
    async fn venue_errors_are_aggregated() {
        let venue = FakeVenue::replying(
            StatusCode::OK,
            r#"{"error":["EOrder:Insufficient funds","EGeneral:Invalid arguments"]}"#,
        );
        let base_url = serve(venue).await;

        let err = client(&base_url, Duration::from_secs(5))
            .add_order(&limit_buy())
            .await
            .unwrap_err();
        match &err {
            VenueError::Api(api) => assert_eq!(
                api.messages,
                vec!["EOrder:Insufficient funds", "EGeneral:Invalid arguments"]
            ),
            other => panic!("expected api error, got {other:?}"),
        }
        assert!(!err.outcome_unknown());
    }

    #[tokio::test]
    async fn success_without_result_is_rejected() {
        let base_url = serve(FakeVenue::replying(StatusCode::OK, r#"{"error":[]}"#)).await;

        let err = client(&base_url, Duration::from_secs(5))
            .get_trade_balance(Some("ZUSD"))
            .await
            .unwrap_err();
        assert!(matches!(err, VenueError::EmptyResult { .. }));
    }

    #[tokio::test]
    async fn non_2xx_keeps_status_and_body() {
        let base_url = serve(FakeVenue::replying(
            StatusCode::BAD_GATEWAY,
            "<html>bad gateway</html>",
        ))
        .await;

        let err = client(&base_url, Duration::from_secs(5))
            .add_order(&limit_buy())
            .await
            .unwrap_err();
        match &err {
            VenueError::HttpStatus { status, body, .. } => {
                assert_eq!(*status, 502);
                assert_eq!(body, "<html>bad gateway</html>");
            }
            other => panic!("expected http status error, got {other:?}"),
        }
        assert!(err.outcome_unknown());
    }

    #[tokio::test]
    async fn unreadable_success_leaves_outcome_unknown() {
        let base_url = serve(FakeVenue::replying(StatusCode::OK, "<html>cf</html>")).await;

        let err = client(&base_url, Duration::from_secs(5))
            .add_order(&limit_buy())
            .await
            .unwrap_err();
        match &err {
            VenueError::Decode { body, .. } => assert_eq!(body, "<html>cf</html>"),
            other => panic!("expected decode error, got {other:?}"),
        }
        assert!(err.outcome_unknown());
    }

    #[tokio::test]
    async fn timeout_leaves_outcome_unknown() {
        let venue = FakeVenue {
            delay: Duration::from_secs(2),
            ..FakeVenue::replying(StatusCode::OK, r#"{"error":[],"result":{}}"#)
        };
        let base_url = serve(venue).await;

        let err = client(&base_url, Duration::from_millis(200))
            .add_order(&limit_buy())
            .await
            .unwrap_err();
        assert!(matches!(err, VenueError::Timeout { .. }), "got {err:?}");
        assert!(err.outcome_unknown());
    }

    #[tokio::test]
    async fn refused_connection_is_known_not_to_have_executed() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(&format!("http://{addr}"), Duration::from_secs(5))
            .add_order(&limit_buy())
            .await
            .unwrap_err();
        assert!(matches!(err, VenueError::Transport { .. }), "got {err:?}");
        assert!(err.is_transport());
        assert!(!err.outcome_unknown());
    }

    #[tokio::test]
    async fn only_private_paths_are_signed() {
        let client = client("http://127.0.0.1:1", Duration::from_secs(1));
        let err = client
            .send_signed(Method::POST, "/0/public/Time", BTreeMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, VenueError::InvalidPath(p) if p == "/0/public/Time"));
    }

    #[test]
    fn rejects_missing_credentials() {
        assert!(matches!(KrakenClient::new("  ", SECRET), Err(VenueError::MissingApiKey)));
        assert!(matches!(KrakenClient::new("key", ""), Err(VenueError::MissingApiSecret)));
        assert!(matches!(
            KrakenClient::new("key", "%%%"),
            Err(VenueError::InvalidSecret(_))
        ));
    }
}
