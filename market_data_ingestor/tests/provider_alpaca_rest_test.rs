use chrono::{Duration, NaiveDate, Utc};
use market_data_ingestor::{
    models::{
        asset::AssetClass,
        request_params::{BarsRequestParams, ProviderParams},
        timeframe::{TimeFrame, TimeFrameUnit},
    },
    providers::{
        DataProvider, ProviderError,
        alpaca_rest::{
            params::{AlpacaBarsParams, Sort},
            provider::AlpacaProvider,
        },
        fetch_daily_series,
    },
};
use secrecy::SecretString;
use serial_test::serial;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    sync::mpsc,
};

/// A request as seen by the mock server.
#[derive(Debug)]
struct Recorded {
    request_line: String,
    /// Header names lowercased, values as sent.
    headers: Vec<(String, String)>,
}

impl Recorded {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }
}

/// Reads one request head, `None` if the peer goes away first.
async fn read_head(socket: &mut TcpStream) -> Option<Recorded> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let head = String::from_utf8_lossy(&buf).to_string();
    let mut lines = head.split("\r\n");
    let request_line = lines.next()?.to_string();
    let headers = lines
        .take_while(|l| !l.is_empty())
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();
    Some(Recorded { request_line, headers })
}

/// Serves canned responses on a local port. Each connection gets the answer
/// chosen by `respond` for its request line; every request is reported back
/// through the returned channel so assertions run on the test task.
async fn mock_server(
    respond: fn(&str) -> (u16, String),
) -> (String, mpsc::UnboundedReceiver<Recorded>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let tx = tx.clone();
            tokio::spawn(async move {
                let Some(recorded) = read_head(&mut socket).await else {
                    return;
                };
                let (status, body) = respond(&recorded.request_line);
                let _ = tx.send(recorded);
                let reply = format!(
                    "HTTP/1.1 {status} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(reply.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (format!("http://{addr}"), rx)
}

fn provider(base_url: &str) -> AlpacaProvider {
    AlpacaProvider::with_credentials(
        SecretString::new("test-key".into()),
        SecretString::new("test-secret".into()),
    )
    .unwrap()
    .with_base_url(base_url)
}

fn paged(request_line: &str) -> (u16, String) {
    if request_line.contains("page_token=page2") {
        (
            200,
            r#"{"bars":{"AAPL":[
                {"t":"2024-01-04T05:00:00Z","o":3,"h":3,"l":3,"c":3,"v":300},
                {"t":"2024-01-05T05:00:00Z","o":4,"h":4,"l":4,"c":4,"v":400}
            ]},"next_page_token":null}"#
                .to_string(),
        )
    } else {
        (
            200,
            r#"{"bars":{"AAPL":[
                {"t":"2024-01-02T05:00:00Z","o":1,"h":1,"l":1,"c":1,"v":100,"n":10,"vw":1.0},
                {"t":"2024-01-03T05:00:00Z","o":2,"h":2,"l":2,"c":2,"v":200,"n":20,"vw":2.0}
            ]},"next_page_token":"page2"}"#
                .to_string(),
        )
    }
}

fn forbidden(_request_line: &str) -> (u16, String) {
    (403, r#"{"message":"forbidden"}"#.to_string())
}

fn empty(_request_line: &str) -> (u16, String) {
    (200, r#"{"bars":{},"next_page_token":null}"#.to_string())
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn follows_next_page_token() {
    let (url, mut requests) = mock_server(paged).await;
    let series = fetch_daily_series(
        &provider(&url),
        "AAPL",
        date(2024, 1, 1),
        date(2024, 1, 31),
        ProviderParams::None,
    )
    .await
    .unwrap();

    let closes: Vec<f64> = series.closes().map(|(_, c)| c).collect();
    assert_eq!(closes, vec![1.0, 2.0, 3.0, 4.0]);
    assert_eq!(series.first_date(), Some(date(2024, 1, 2)));
    assert_eq!(series.bars[0].trade_count, Some(10));

    let first = requests.recv().await.unwrap();
    assert!(first.request_line.starts_with("GET /v2/stocks/bars?"));
    assert!(first.request_line.contains("symbols=AAPL"));
    assert!(first.request_line.contains("timeframe=1Day"));
    assert!(!first.request_line.contains("page_token"));
    assert_eq!(first.header("apca-api-key-id"), Some("test-key"));
    assert_eq!(first.header("apca-api-secret-key"), Some("test-secret"));
    let second = requests.recv().await.unwrap();
    assert!(second.request_line.contains("page_token=page2"));
    assert_eq!(second.header("apca-api-secret-key"), Some("test-secret"));
}

#[tokio::test]
async fn non_success_status_is_an_api_error() {
    let (url, mut requests) = mock_server(forbidden).await;
    let err = fetch_daily_series(
        &provider(&url),
        "AAPL",
        date(2024, 1, 1),
        date(2024, 1, 31),
        ProviderParams::None,
    )
    .await
    .unwrap_err();

    match err {
        ProviderError::Api { status, message, .. } => {
            assert_eq!(status, 403);
            assert!(message.contains("forbidden"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    // a 403 is not retried by the provider itself
    assert!(requests.recv().await.is_some());
    assert!(requests.try_recv().is_err());
}

#[tokio::test]
async fn empty_bars_map_is_no_data() {
    let (url, _requests) = mock_server(empty).await;
    let err = fetch_daily_series(
        &provider(&url),
        "ZZZZ",
        date(2024, 1, 1),
        date(2024, 1, 31),
        ProviderParams::None,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ProviderError::NoData { .. }));
}

#[tokio::test]
async fn unsupported_timeframe_is_rejected_before_any_request() {
    let p = provider("http://127.0.0.1:9");
    let mut params = BarsRequestParams::daily("AAPL", date(2024, 1, 1), date(2024, 1, 31));
    params.timeframe = TimeFrame::new(2, TimeFrameUnit::Day);
    let err = p.fetch_bars(params).await.unwrap_err();
    assert!(matches!(err, ProviderError::Validation { .. }));
}

#[tokio::test]
#[serial]
#[ignore]
async fn test_alpaca_provider_fetch_bars() {
    // This test requires APCA_API_KEY_ID and APCA_API_SECRET_KEY to be set in the environment.
    if std::env::var("APCA_API_KEY_ID").is_err() || std::env::var("APCA_API_SECRET_KEY").is_err() {
        println!("Skipping test_alpaca_provider_fetch_bars: API keys not set.");
        return;
    }

    let provider = AlpacaProvider::new().expect("Failed to create AlpacaProvider");

    let params = BarsRequestParams {
        symbols: vec!["AAPL".to_string()],
        timeframe: TimeFrame::day(),
        start: Utc::now() - Duration::days(10),
        end: Utc::now() - Duration::days(1),
        asset_class: AssetClass::UsEquity,
        provider_specific: ProviderParams::Alpaca(AlpacaBarsParams {
            sort: Some(Sort::Desc),
            limit: Some(5),
            ..Default::default()
        }),
    };

    let result = provider.fetch_bars(params).await;
    assert!(result.is_ok(), "fetch_bars returned an error: {:?}", result.err());

    let bar_series_vec = result.unwrap();
    assert_eq!(bar_series_vec.len(), 1, "Expected 1 BarSeries for AAPL");

    let aapl_series = &bar_series_vec[0];
    assert_eq!(aapl_series.symbol, "AAPL");
    assert!(!aapl_series.bars.is_empty(), "Expected to fetch at least one bar for AAPL");

    if aapl_series.bars.len() > 1 {
        assert!(aapl_series.bars[0].timestamp > aapl_series.bars[1].timestamp);
    }
}
