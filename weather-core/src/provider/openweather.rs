use async_trait::async_trait;
use reqwest::{Client, Request, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{FetchError, LocationWeatherRecord};

use super::WeatherSource;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";
const GROUP_PATH: &str = "/data/2.5/group";

/// Client for OpenWeather's `group` endpoint: current weather for several city ids.
#[derive(Debug, Clone)]
pub struct OpenWeatherGroupProvider {
    base_url: String,
    http: Client,
}

impl Default for OpenWeatherGroupProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenWeatherGroupProvider {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    pub fn build_request(&self, api_key: &str, location_ids: &[u64]) -> reqwest::Result<Request> {
        let ids = location_ids
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(",");

        self.http
            .get(format!("{}{GROUP_PATH}", self.base_url))
            .query(&[("id", ids.as_str()), ("appid", api_key), ("units", "metric")])
            .build()
    }
}

#[derive(Debug, Deserialize)]
struct OwGroupResponse {
    list: Vec<LocationWeatherRecord>,
}

fn check_status(status: StatusCode) -> Result<(), FetchError> {
    if !status.is_success() {
        warn!(%status, "OpenWeather group request rejected");
        return Err(FetchError::Service { status: status.as_u16() });
    }
    Ok(())
}

/// Classify a finished response. A non-success status wins over whatever the body holds.
pub fn parse_group_response(
    status: StatusCode,
    body: &str,
) -> Result<Vec<LocationWeatherRecord>, FetchError> {
    check_status(status)?;

    let parsed: OwGroupResponse = serde_json::from_str(body)?;
    Ok(parsed.list)
}

#[async_trait]
impl WeatherSource for OpenWeatherGroupProvider {
    async fn fetch_group(
        &self,
        api_key: &str,
        location_ids: &[u64],
    ) -> Result<Vec<LocationWeatherRecord>, FetchError> {
        let request = self.build_request(api_key, location_ids)?;
        debug!(ids = location_ids.len(), path = request.url().path(), "requesting weather group");

        let res = self.http.execute(request).await?;
        let status = res.status();
        // The body of a rejected request is never read.
        check_status(status)?;
        let body = res.text().await?;

        parse_group_response(status, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::KYIV_JSON;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    /// Serves `response` verbatim to the first connection, then hangs up.
    async fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{addr}")
    }

    fn group_body(entries: &[&str]) -> String {
        format!(r#"{{"cnt": {}, "list": [{}]}}"#, entries.len(), entries.join(","))
    }

    #[test]
    fn request_batches_all_ids_in_one_query() {
        let provider = OpenWeatherGroupProvider::new();
        let req = provider.build_request("SECRET", &[703448, 692194]).unwrap();

        let url = req.url();
        assert_eq!(url.host_str(), Some("api.openweathermap.org"));
        assert_eq!(url.path(), "/data/2.5/group");

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("id".to_string(), "703448,692194".to_string()),
                ("appid".to_string(), "SECRET".to_string()),
                ("units".to_string(), "metric".to_string()),
            ]
        );
    }

    #[test]
    fn empty_and_duplicate_ids_pass_through() {
        let provider = OpenWeatherGroupProvider::with_base_url("http://localhost:9000/");

        let req = provider.build_request("K", &[]).unwrap();
        assert_eq!(req.url().as_str(), "http://localhost:9000/data/2.5/group?id=&appid=K&units=metric");

        let req = provider.build_request("K", &[1, 1]).unwrap();
        assert!(req.url().query().unwrap().starts_with("id=1%2C1&"));
    }

    #[test]
    fn success_keeps_server_order() {
        let sumy = KYIV_JSON.replace("703448", "692194").replace("Kyiv", "Sumy");
        let body = group_body(&[KYIV_JSON, &sumy]);

        let records = parse_group_response(StatusCode::OK, &body).unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();

        assert_eq!(names, ["Kyiv", "Sumy"]);
        assert_eq!(records[1].id, 692194);
    }

    #[test]
    fn error_status_skips_body() {
        let body = group_body(&[KYIV_JSON]);
        let err = parse_group_response(StatusCode::INTERNAL_SERVER_ERROR, &body).unwrap_err();

        assert!(matches!(err, FetchError::Service { status: 500 }));
        assert_eq!(err.to_string(), "Failed to load weather data");
    }

    #[test]
    fn unauthorized_is_a_service_error() {
        let body = r#"{"cod": 401, "message": "Invalid API key"}"#;
        let err = parse_group_response(StatusCode::UNAUTHORIZED, body).unwrap_err();

        assert!(matches!(err, FetchError::Service { status: 401 }));
    }

    #[test]
    fn shape_mismatch_is_a_parse_error() {
        let err = parse_group_response(StatusCode::OK, r#"{"cnt": 0}"#).unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));

        let err = parse_group_response(StatusCode::OK, "<html>").unwrap_err();
        assert!(err.to_string().contains("malformed response body"));
    }

    #[test]
    fn empty_list_is_ready_and_empty() {
        let records = parse_group_response(StatusCode::OK, &group_body(&[])).unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn connection_refused_reports_cause_without_api_key() {
        let provider = OpenWeatherGroupProvider::with_base_url("http://127.0.0.1:1");

        let err = provider
            .fetch_group("SECRET_KEY_123", &[703448])
            .await
            .unwrap_err();
        let msg = err.to_string();

        assert!(matches!(err, FetchError::Transport(_)));
        assert!(msg.starts_with("Error fetching data: "));
        assert!(msg.to_lowercase().contains("connect"), "{msg}");
        assert!(!msg.contains("SECRET_KEY_123"), "{msg}");
        assert!(!msg.contains("appid"), "{msg}");
    }

    #[tokio::test]
    async fn server_error_ignores_truncated_body() {
        let base_url = serve_once(
            "HTTP/1.1 500 Internal Server Error\r\n\
             Content-Type: application/json\r\n\
             Content-Length: 500\r\n\r\n\
             {\"list\": [",
        )
        .await;
        let provider = OpenWeatherGroupProvider::with_base_url(&base_url);

        let err = provider.fetch_group("KEY", &[703448]).await.unwrap_err();

        assert!(matches!(err, FetchError::Service { status: 500 }));
        assert_eq!(err.to_string(), "Failed to load weather data");
    }

    #[tokio::test]
    async fn ok_response_is_parsed_over_the_wire() {
        let base_url = serve_once(
            "HTTP/1.1 200 OK\r\n\
             Content-Type: application/json\r\n\
             Content-Length: 22\r\n\
             Connection: close\r\n\r\n\
             {\"cnt\": 0, \"list\": []}",
        )
        .await;
        let provider = OpenWeatherGroupProvider::with_base_url(&base_url);

        let records = provider.fetch_group("KEY", &[703448]).await.unwrap();
        assert!(records.is_empty());
    }
}
