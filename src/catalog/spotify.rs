use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::catalog::{AlbumImage, FetchError, Track, TrackCatalog};
use crate::config::ApiConfig;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Deserialize, Debug)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
}

#[derive(Deserialize, Debug)]
struct TrackResponse {
    #[serde(default)]
    id: Option<String>,
    name: String,
    artists: Vec<ArtistResponse>,
    album: AlbumResponse,
    duration_ms: u64,
}

#[derive(Deserialize, Debug)]
struct ArtistResponse {
    name: String,
}

#[derive(Deserialize, Debug)]
struct AlbumResponse {
    #[serde(default)]
    name: String,
    images: Vec<ImageResponse>,
}

#[derive(Deserialize, Debug)]
struct ImageResponse {
    url: String,
    width: Option<u32>,
    height: Option<u32>,
}

/// Spotify Web API 曲目元数据提供者
pub struct SpotifyCatalog {
    client: reqwest::Client,
    api: ApiConfig,
    credentials: Option<(String, String)>,
}

impl SpotifyCatalog {
    /// 创建新的 Spotify 提供者，`credentials` 为 (client_id, client_secret)
    pub fn new(api: ApiConfig, credentials: Option<(String, String)>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(api.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();

        Self {
            client,
            api,
            credentials,
        }
    }

    /// 使用 client credentials 换取 access token
    async fn access_token(&self) -> Result<String, FetchError> {
        let (client_id, client_secret) = self.credentials.as_ref().ok_or_else(|| {
            FetchError::AuthFailure("未配置 client_id / client_secret".to_string())
        })?;

        debug!("换取 Spotify access token");

        let resp = self
            .client
            .post(&self.api.token_url)
            .basic_auth(client_id, Some(client_secret))
            .form(&[("grant_type", "client_credentials")])
            .timeout(self.timeout())
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            error!("Spotify token 请求失败: HTTP {}", status);
            return Err(FetchError::AuthFailure(format!("token 请求失败: HTTP {}", status)));
        }

        let body = resp.text().await.map_err(classify_transport_error)?;
        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| FetchError::AuthFailure(format!("token 响应无法解析: {}", e)))?;

        if token.access_token.is_empty() {
            return Err(FetchError::AuthFailure("token 响应缺少 access_token".to_string()));
        }

        Ok(token.access_token)
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// 曲目请求地址，ID 作为单独的路径段编码
    fn track_url(&self, track_id: &str) -> Result<reqwest::Url, FetchError> {
        let mut url = reqwest::Url::parse(&self.api.api_base).map_err(|e| {
            FetchError::MalformedResponse(format!("无效的 API 地址 {}: {}", self.api.api_base, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                FetchError::MalformedResponse(format!("无效的 API 地址 {}", self.api.api_base))
            })?
            .pop_if_empty()
            .push("tracks")
            .push(track_id);
        Ok(url)
    }
}

#[async_trait]
impl TrackCatalog for SpotifyCatalog {
    fn name(&self) -> &str {
        "spotify"
    }

    async fn fetch_track(&self, track_id: &str) -> Result<Track, FetchError> {
        let token = self.access_token().await?;
        let url = self.track_url(track_id)?;

        debug!("请求曲目元数据: {}", url);

        let resp = self
            .client
            .get(url)
            .bearer_auth(token)
            .timeout(self.timeout())
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            error!("Spotify 曲目请求失败: HTTP {}", status);
            return Err(classify_status(status, track_id));
        }

        let body = resp.text().await.map_err(classify_transport_error)?;
        let track = parse_track(&body, track_id)?;
        info!("Spotify 返回曲目: {} ({} 位艺术家)", track.title, track.artists.len());
        Ok(track)
    }

    async fn fetch_artwork(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        debug!("下载专辑封面: {}", url);

        let resp = self
            .client
            .get(url)
            .timeout(self.timeout())
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(classify_status(status, url));
        }

        let bytes = resp.bytes().await.map_err(classify_transport_error)?;
        Ok(bytes.to_vec())
    }
}

/// 将 HTTP 状态码归类为获取错误
fn classify_status(status: StatusCode, subject: &str) -> FetchError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            FetchError::AuthFailure(format!("HTTP {}", status))
        }
        StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => {
            FetchError::NotFound(subject.to_string())
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            FetchError::TransientNetworkFailure(format!("HTTP {}", status))
        }
        s if s.is_server_error() => FetchError::TransientNetworkFailure(format!("HTTP {}", s)),
        s => FetchError::MalformedResponse(format!("意外的响应状态 HTTP {}", s)),
    }
}

/// 将传输层错误归类
fn classify_transport_error(e: reqwest::Error) -> FetchError {
    if e.is_decode() {
        FetchError::MalformedResponse(e.to_string())
    } else {
        // 超时、连接失败、读取响应体失败都可以重试
        FetchError::TransientNetworkFailure(e.to_string())
    }
}

/// 解析曲目响应
fn parse_track(body: &str, requested_id: &str) -> Result<Track, FetchError> {
    let resp: TrackResponse =
        serde_json::from_str(body).map_err(|e| FetchError::MalformedResponse(e.to_string()))?;

    Ok(Track {
        id: resp.id.unwrap_or_else(|| requested_id.to_string()),
        title: resp.name,
        artists: resp.artists.into_iter().map(|a| a.name).collect(),
        album: resp.album.name,
        images: resp
            .album
            .images
            .into_iter()
            .map(|img| AlbumImage {
                url: img.url,
                width: img.width,
                height: img.height,
            })
            .collect(),
        duration_ms: resp.duration_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACK_JSON: &str = r#"{
        "id": "4uLU6hMCjMI75M1A2tKUQC",
        "name": "Never Gonna Give You Up",
        "duration_ms": 213573,
        "explicit": false,
        "artists": [
            {"id": "0gxyHStUsqpMadRV0Di1Qt", "name": "Rick Astley"}
        ],
        "album": {
            "name": "Whenever You Need Somebody",
            "images": [
                {"url": "https://i.scdn.co/image/640", "width": 640, "height": 640},
                {"url": "https://i.scdn.co/image/300", "width": 300, "height": 300},
                {"url": "https://i.scdn.co/image/64", "width": 64, "height": 64}
            ]
        }
    }"#;

    #[test]
    fn test_parse_track() {
        let track = parse_track(TRACK_JSON, "ignored").unwrap();
        assert_eq!(track.id, "4uLU6hMCjMI75M1A2tKUQC");
        assert_eq!(track.title, "Never Gonna Give You Up");
        assert_eq!(track.artists, vec!["Rick Astley".to_string()]);
        assert_eq!(track.album, "Whenever You Need Somebody");
        assert_eq!(track.images.len(), 3);
        assert_eq!(track.duration_secs(), 213);
    }

    #[test]
    fn test_parse_track_malformed() {
        let missing_duration = r#"{"name": "x", "artists": [], "album": {"images": []}}"#;
        assert!(matches!(
            parse_track(missing_duration, "x"),
            Err(FetchError::MalformedResponse(_))
        ));

        assert!(matches!(
            parse_track("<html>oops</html>", "x"),
            Err(FetchError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_parse_track_without_id_uses_requested() {
        let body = r#"{"name": "x", "artists": [{"name": "a"}], "album": {"images": []}, "duration_ms": 1000}"#;
        assert_eq!(parse_track(body, "req").unwrap().id, "req");
    }

    #[test]
    fn test_classify_status() {
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, "id"),
            FetchError::AuthFailure(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN, "id"),
            FetchError::AuthFailure(_)
        ));
        assert_eq!(
            classify_status(StatusCode::NOT_FOUND, "id"),
            FetchError::NotFound("id".to_string())
        );
        assert_eq!(
            classify_status(StatusCode::BAD_REQUEST, "id"),
            FetchError::NotFound("id".to_string())
        );
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, "id"),
            FetchError::TransientNetworkFailure(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY, "id"),
            FetchError::TransientNetworkFailure(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::IM_A_TEAPOT, "id"),
            FetchError::MalformedResponse(_)
        ));
    }

    #[test]
    fn test_track_url() {
        let api = ApiConfig {
            api_base: "https://api.example.com/v1/".to_string(),
            ..ApiConfig::default()
        };
        let catalog = SpotifyCatalog::new(api, None);
        assert_eq!(
            catalog.track_url("abc123").unwrap().as_str(),
            "https://api.example.com/v1/tracks/abc123"
        );
    }

    #[test]
    fn test_track_url_keeps_id_in_one_segment() {
        let catalog = SpotifyCatalog::new(ApiConfig::default(), None);
        let url = catalog.track_url("../../v1/me").unwrap();
        assert!(url.path().contains("/tracks/"));
        assert!(!url.path().ends_with("/v1/me"));
        assert_eq!(url.path_segments().unwrap().count(), 3);
    }

    #[test]
    fn test_track_url_invalid_base() {
        let api = ApiConfig {
            api_base: "not a url".to_string(),
            ..ApiConfig::default()
        };
        let catalog = SpotifyCatalog::new(api, None);
        assert!(matches!(
            catalog.track_url("abc123"),
            Err(FetchError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_credentials_is_auth_failure() {
        let catalog = SpotifyCatalog::new(ApiConfig::default(), None);
        let err = catalog.fetch_track("abc123").await.unwrap_err();
        assert!(matches!(err, FetchError::AuthFailure(_)));
    }

    #[tokio::test]
    async fn test_unreachable_token_endpoint_is_transient() {
        let api = ApiConfig {
            token_url: "http://127.0.0.1:9/api/token".to_string(),
            timeout_secs: 2,
            ..ApiConfig::default()
        };
        let catalog = SpotifyCatalog::new(api, Some(("id".to_string(), "secret".to_string())));
        let err = catalog.fetch_track("abc123").await.unwrap_err();
        assert!(matches!(err, FetchError::TransientNetworkFailure(_)));
    }
}
