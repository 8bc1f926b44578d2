use futures_util::SinkExt;
use mockito::Matcher;
use serde_json::json;
use spreadbot::api::{AlpacaClient, PriceStreamClient};
use spreadbot::execution::{OrderComposer, PriceSampler, TickOutcome, Trader};
use spreadbot::risk::RiskParams;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

const TICK: Duration = Duration::from_millis(100);

async fn spawn_feed(frames: Vec<&'static str>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
        for frame in frames {
            ws.send(Message::Text(frame.to_string())).await.unwrap();
        }
        // Keep the stream open so the trader never sees a close
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    format!("ws://{}", addr)
}

async fn trader(
    feed_url: String,
    server: &mockito::Server,
) -> Trader<PriceStreamClient, AlpacaClient, AlpacaClient> {
    let feed = PriceStreamClient::connect(feed_url).await.unwrap();
    let alpaca = AlpacaClient::new("key", "secret", server.url(), server.url(), 200).unwrap();

    Trader::new(
        PriceSampler::new(feed, alpaca.clone(), "BTC/USD", TICK),
        alpaca,
        OrderComposer::new("BTC/USD", RiskParams::default()),
        TICK,
    )
}

async fn mock_quote(server: &mut mockito::Server, ask: f64) -> mockito::Mock {
    server
        .mock("GET", "/v1beta3/crypto/us/latest/quotes")
        .match_query(Matcher::UrlEncoded("symbols".into(), "BTC/USD".into()))
        .with_status(200)
        .with_body(json!({ "quotes": { "BTC/USD": { "ap": ask } } }).to_string())
        .create_async()
        .await
}

#[tokio::test]
async fn test_divergent_tick_submits_bracket_order() {
    let mut server = mockito::Server::new_async().await;
    let _quote = mock_quote(&mut server, 100.0).await;
    let account = server
        .mock("GET", "/v2/account")
        .with_status(200)
        .with_body(r#"{"buying_power":"10100"}"#)
        .expect(1)
        .create_async()
        .await;
    let order = server
        .mock("POST", "/v2/orders")
        .match_body(Matcher::PartialJson(json!({
            "symbol": "BTC/USD",
            "qty": "1",
            "side": "buy",
            "order_class": "bracket",
            "take_profit": { "limit_price": "102.01" },
            "stop_loss": { "stop_price": "100.495" }
        })))
        .with_status(200)
        .with_body(r#"{"id":"61e69015-8549-4bfd-b9c3-01e75843f47d","status":"accepted"}"#)
        .expect(1)
        .create_async()
        .await;

    let feed_url = spawn_feed(vec![r#"{"price": 101.0, "confidence_interval": 0.005}"#]).await;
    let mut trader = trader(feed_url, &server).await;

    let outcome = trader.run_tick().await.unwrap();

    assert!(matches!(outcome, TickOutcome::Submitted(ack) if ack.status == "accepted"));
    account.assert_async().await;
    order.assert_async().await;
}

#[tokio::test]
async fn test_tick_inside_band_places_nothing() {
    let mut server = mockito::Server::new_async().await;
    let _quote = mock_quote(&mut server, 100.0).await;
    let account = server
        .mock("GET", "/v2/account")
        .expect(0)
        .create_async()
        .await;
    let order = server
        .mock("POST", "/v2/orders")
        .expect(0)
        .create_async()
        .await;

    let feed_url = spawn_feed(vec![r#"{"price": 100.3, "confidence_interval": 0.005}"#]).await;
    let mut trader = trader(feed_url, &server).await;

    assert_eq!(trader.run_tick().await.unwrap(), TickOutcome::Held);
    account.assert_async().await;
    order.assert_async().await;
}

#[tokio::test]
async fn test_silent_feed_skips_tick() {
    let mut server = mockito::Server::new_async().await;
    let quote = server
        .mock("GET", "/v1beta3/crypto/us/latest/quotes")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let feed_url = spawn_feed(vec![]).await;
    let mut trader = trader(feed_url, &server).await;

    let err = trader.run_tick().await.unwrap_err();

    assert!(matches!(err, spreadbot::BotError::FeedTimeout(_)));
    quote.assert_async().await;
}
