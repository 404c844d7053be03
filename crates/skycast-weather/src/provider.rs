//! HTTP client for goweather-style endpoints: `GET {base}/weather/{city}`.

use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;
use url::Url;

use crate::types::{WeatherError, WeatherRecord, WeatherResponse};

pub const DEFAULT_API_BASE: &str = "https://goweather.xyz";

/// Part of a city name that goes into the request path: everything before
/// the first comma ("Seattle, WA" → "Seattle").
pub fn city_segment(city: &str) -> &str {
    city.split(',').next().unwrap_or(city)
}

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    base_url: Url,
}

impl WeatherProvider {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, WeatherError> {
        let base_url =
            Url::parse(base_url).map_err(|e| WeatherError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(WeatherError::InvalidUrl(base_url.to_string()));
        }

        let client = Client::builder().timeout(request_timeout).build()?;

        Ok(Self {
            client: Arc::new(client),
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Request URL for `city`; the segment is percent-encoded as one path component
    pub fn city_url(&self, city: &str) -> Result<Url, WeatherError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| WeatherError::InvalidUrl(self.base_url.to_string()))?;
            segments
                .pop_if_empty()
                .push("weather")
                .push(city_segment(city));
        }
        Ok(url)
    }

    /// Fetch current conditions and forecast for `city`.
    ///
    /// Succeeds only for a 2xx JSON body with a non-empty `description`.
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch(&self, city: &str) -> Result<WeatherRecord, WeatherError> {
        let url = self.city_url(city)?;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(%status, %body, "Weather response");

        if !status.is_success() {
            return Err(WeatherError::Status(status.as_u16()));
        }

        let parsed: WeatherResponse =
            serde_json::from_str(&body).map_err(|e| WeatherError::Parse(e.to_string()))?;
        parsed.into_record()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Reading;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base: &str) -> WeatherProvider {
        WeatherProvider::new(base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_city_segment() {
        assert_eq!(city_segment("Seattle, WA"), "Seattle");
        assert_eq!(city_segment("Tokyo"), "Tokyo");
        assert_eq!(city_segment("Washington, DC, USA"), "Washington");
        assert_eq!(city_segment(""), "");
    }

    #[test]
    fn test_city_url() {
        let p = provider("https://goweather.xyz");
        assert_eq!(
            p.city_url("Seattle, WA").unwrap().as_str(),
            "https://goweather.xyz/weather/Seattle"
        );
        assert_eq!(
            p.city_url("New York, NY").unwrap().as_str(),
            "https://goweather.xyz/weather/New%20York"
        );
    }

    #[test]
    fn test_city_url_keeps_base_path() {
        let p = provider("http://localhost:8080/api/");
        assert_eq!(
            p.city_url("Oslo").unwrap().as_str(),
            "http://localhost:8080/api/weather/Oslo"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            WeatherProvider::new("not a url", Duration::from_secs(1)),
            Err(WeatherError::InvalidUrl(_))
        ));
        assert!(matches!(
            WeatherProvider::new("mailto:weather@example.com", Duration::from_secs(1)),
            Err(WeatherError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather/Tokyo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "description": "Sunny",
                "temperature": 70,
                "wind": 5,
                "forecast": []
            })))
            .mount(&mock_server)
            .await;

        let record = provider(&mock_server.uri()).fetch("Tokyo").await.unwrap();

        assert_eq!(record.description, "Sunny");
        assert_eq!(record.temperature, Some(Reading::Number(70.0)));
        assert!(record.forecast.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_strips_region() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather/Seattle"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "temperature": "+12 °C",
                "wind": "9 km/h",
                "description": "Rainy",
                "forecast": [
                    {"day": "1", "temperature": "+11 °C", "wind": "7 km/h"},
                    {"day": "2", "temperature": "+13 °C", "wind": "5 km/h"},
                    {"day": "3", "temperature": "+14 °C", "wind": "4 km/h"}
                ]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let record = provider(&mock_server.uri())
            .fetch("Seattle, WA")
            .await
            .unwrap();

        assert_eq!(record.forecast.len(), 3);
        assert_eq!(record.wind, Some(Reading::Text("9 km/h".into())));
    }

    #[tokio::test]
    async fn test_fetch_missing_description() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather/Nowhere"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&mock_server)
            .await;

        let result = provider(&mock_server.uri()).fetch("Nowhere").await;
        assert!(matches!(result, Err(WeatherError::MissingDescription)));
    }

    #[tokio::test]
    async fn test_fetch_not_found() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather/Atlantis"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({"message": "NOT_FOUND"})),
            )
            .mount(&mock_server)
            .await;

        let result = provider(&mock_server.uri()).fetch("Atlantis").await;
        assert!(matches!(result, Err(WeatherError::Status(404))));
    }

    #[tokio::test]
    async fn test_fetch_malformed_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather/Paris"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&mock_server)
            .await;

        let result = provider(&mock_server.uri()).fetch("Paris").await;
        assert!(matches!(result, Err(WeatherError::Parse(_))));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        // Nothing listens on port 9 on test machines
        let result = provider("http://127.0.0.1:9").fetch("Paris").await;
        assert!(matches!(result, Err(WeatherError::Network(_))));
    }
}
