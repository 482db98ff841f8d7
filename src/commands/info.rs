//! Time, date, and weather answers.

use crate::config::Settings;
use chrono::Local;
use reqwest::Client;
use serde_json::Value;

const WEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

pub struct InfoService {
    client: Client,
    weather_key: Option<String>,
    city: Option<String>,
}

impl InfoService {
    pub fn new(settings: &Settings) -> Self {
        let client = Client::builder()
            .timeout(settings.timings.cloud_timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            weather_key: settings.weather_key().map(str::to_string),
            city: settings.city_name.clone(),
        }
    }

    pub fn current_time(&self) -> String {
        format!(
            "It's about time you asked! It's {}.",
            Local::now().format("%I:%M %p")
        )
    }

    pub fn current_date(&self) -> String {
        format!("Today is {}.", Local::now().format("%A, %B %-d, %Y"))
    }

    /// Weather for the configured city. Infrastructure problems come back
    /// as speakable text, never as errors.
    pub async fn weather(&self) -> String {
        let (key, city) = match (&self.weather_key, &self.city) {
            (Some(key), Some(city)) => (key, city),
            _ => {
                return "Weather services are offline. Set WEATHER_API_KEY and CITY_NAME in .env."
                    .to_string()
            }
        };

        match self.fetch_weather(key, city).await {
            Ok(report) => report,
            Err(e) => {
                log::warn!("Weather lookup failed: {}", e);
                "I couldn't reach the weather service. Try again later.".to_string()
            }
        }
    }

    async fn fetch_weather(&self, key: &str, city: &str) -> Result<String, reqwest::Error> {
        let response = self
            .client
            .get(WEATHER_BASE_URL)
            .query(&[("q", city), ("appid", key), ("units", "metric")])
            .send()
            .await?
            .error_for_status()?;

        let json: Value = response.json().await?;
        let description = json["weather"][0]["description"]
            .as_str()
            .unwrap_or("indescribable")
            .to_string();
        let temp = json["main"]["temp"].as_f64().unwrap_or(0.0);

        Ok(format!(
            "Currently in {}: {} at {:.0} degrees Celsius.",
            city, description, temp
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    #[test]
    fn time_answer_has_clock_text() {
        let info = InfoService::new(&Settings::offline());
        let answer = info.current_time();
        assert!(answer.starts_with("It's about time you asked!"));
        assert!(answer.contains("AM") || answer.contains("PM"));
    }

    #[tokio::test]
    async fn weather_without_key_reports_offline() {
        let info = InfoService::new(&Settings::offline());
        let answer = info.weather().await;
        assert!(answer.contains("Weather services are offline"));
    }
}
