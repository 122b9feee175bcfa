//! Gateway tests against a one-shot local HTTP server.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;

use scanreport_core::{
    ConnectionConfig, IndexPath, QueryError, QueryGateway, ScanId, ScanResolver,
};
use scanreport_query::ElasticGateway;

struct Captured {
    request_line: String,
    headers: Vec<(String, String)>,
    body: String,
}

impl Captured {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

/// Serve exactly one request with `status` and `body`, returning the base URL
/// and a receiver for the captured request.
fn serve_once(status: u16, body: &'static str) -> (String, mpsc::Receiver<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());

        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();

        let mut headers = Vec::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((k, v)) = line.split_once(':') {
                headers.push((k.trim().to_string(), v.trim().to_string()));
            }
        }

        let length = headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, v)| v.parse::<usize>().ok())
            .unwrap_or(0);
        let mut request_body = vec![0u8; length];
        reader.read_exact(&mut request_body).unwrap();

        let reason = if status == 200 { "OK" } else { "Error" };
        let response = format!(
            "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let mut stream = stream;
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();

        let _ = tx.send(Captured {
            request_line: request_line.trim_end().to_string(),
            headers,
            body: String::from_utf8(request_body).unwrap(),
        });
    });

    (format!("http://{addr}"), rx)
}

/// A URL nothing listens on.
fn dead_host() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

fn gateway(hosts: Vec<String>, api_key: Option<&str>) -> ElasticGateway {
    ElasticGateway::new(&ConnectionConfig {
        es_hosts: hosts,
        es_api_key: api_key.map(String::from),
        index: "files".to_string(),
        status_index: "scans".to_string(),
        timeout_secs: 5,
    })
}

const CHILDREN_BODY: &str = r#"{
    "aggregations": {
        "size": {"value": 1000.0},
        "count": {"value": 12.0},
        "children": {
            "doc_count": 10,
            "segments": {"buckets": [
                {"key": "x", "doc_count": 5, "size": {"value": 400.0},
                 "count": {"value": 5.0}, "mean_heat": {"value": 3.0}},
                {"key": "y", "doc_count": 5, "size": {"value": 500.0},
                 "count": {"value": 5.0}, "mean_heat": {"value": 9.5}}
            ]}
        }
    }
}"#;

#[test]
fn test_children_breakdown_request_and_decode() {
    let (url, rx) = serve_once(200, CHILDREN_BODY);
    let gateway = gateway(vec![url], Some("secret"));

    let response = gateway
        .children_breakdown(&IndexPath::new("/data"), "files", &ScanId::new("s1"))
        .unwrap();

    assert_eq!(response.total_size, Some(1000));
    assert_eq!(response.total_count, Some(12));
    assert_eq!(response.buckets.len(), 2);
    assert_eq!(response.buckets[1].key.as_deref(), Some("y"));
    assert_eq!(response.buckets[1].mean_heat, Some(9.5));

    let captured = rx.recv().unwrap();
    assert!(captured.request_line.starts_with("POST /files/_search"));
    assert_eq!(captured.header("x-api-key"), Some("secret"));
    let sent = captured.json();
    assert_eq!(sent["query"]["bool"]["filter"][0]["term"]["scan_id"], "s1");

    let script = &sent["aggs"]["children"]["aggs"]["segments"]["terms"]["script"];
    assert_eq!(script["params"]["prefix"], "/data/");
    assert_eq!(script["params"]["kind_field"], "type");
    assert!(script["source"].as_str().unwrap().contains("return null"));
}

#[test]
fn test_user_breakdown() {
    let (url, rx) = serve_once(
        200,
        r#"{"aggregations": {"labels": {"buckets": [
            {"key": "alice", "doc_count": 3, "size": {"value": 30.0}}
        ]}}}"#,
    );
    let gateway = gateway(vec![url], None);

    let response = gateway
        .user_breakdown(&IndexPath::new("/data"), "files", &ScanId::new("s1"))
        .unwrap();
    assert_eq!(response.buckets.len(), 1);
    assert_eq!(response.buckets[0].label.as_deref(), Some("alice"));
    assert_eq!(response.buckets[0].count, Some(3));

    let captured = rx.recv().unwrap();
    assert_eq!(captured.header("x-api-key"), None);
    assert_eq!(captured.json()["aggs"]["labels"]["terms"]["field"], "user");
}

#[test]
fn test_latest_scan_found() {
    let (url, rx) = serve_once(
        200,
        r#"{"hits": {"hits": [
            {"_source": {"scan_id": "scan-7", "path": "/data", "end_time": "2024-03-01T10:00:00Z"}}
        ]}}"#,
    );
    let gateway = gateway(vec![url], None);

    let snapshot = gateway
        .latest_scan(&IndexPath::new("/data/x"), "scans")
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.scan_id.as_str(), "scan-7");
    assert_eq!(snapshot.path.as_str(), "/data");
    assert_eq!(snapshot.status_index, "scans");
    assert_eq!(
        snapshot.completed_at.map(|t| t.timestamp()),
        Some(1_709_287_200)
    );

    let captured = rx.recv().unwrap();
    assert!(captured.request_line.starts_with("POST /scans/_search"));
}

#[test]
fn test_latest_scan_none() {
    let (url, _rx) = serve_once(200, r#"{"hits": {"hits": []}}"#);
    let gateway = gateway(vec![url], None);

    let snapshot = gateway.latest_scan(&IndexPath::new("/data"), "scans").unwrap();
    assert!(snapshot.is_none());
}

#[test]
fn test_latest_scan_without_id_is_decode_error() {
    let (url, _rx) = serve_once(200, r#"{"hits": {"hits": [{"_source": {"path": "/data"}}]}}"#);
    let gateway = gateway(vec![url], None);

    let result = gateway.latest_scan(&IndexPath::new("/data"), "scans");
    assert!(matches!(result, Err(QueryError::Decode { .. })));
}

#[test]
fn test_status_error() {
    let (url, _rx) = serve_once(500, r#"{"error": "boom"}"#);
    let gateway = gateway(vec![url], None);

    let result = gateway.heat_breakdown(&IndexPath::new("/data"), "files", &ScanId::new("s1"));
    match result {
        Err(QueryError::Status { code, body }) => {
            assert_eq!(code, 500);
            assert!(body.contains("boom"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[test]
fn test_failover_to_next_host() {
    let (url, rx) = serve_once(200, r#"{"aggregations": {"labels": {"buckets": []}}}"#);
    let gateway = gateway(vec![dead_host(), url], None);

    let response = gateway
        .filetype_breakdown(&IndexPath::new("/data"), "files", &ScanId::new("s1"))
        .unwrap();
    assert!(response.buckets.is_empty());
    assert_eq!(rx.recv().unwrap().json()["aggs"]["labels"]["terms"]["field"], "extension");
}

#[test]
fn test_all_hosts_unreachable() {
    let gateway = gateway(vec![dead_host(), dead_host()], None);

    let result = gateway.user_breakdown(&IndexPath::new("/data"), "files", &ScanId::new("s1"));
    assert!(matches!(result, Err(QueryError::Transport { .. })));
}
