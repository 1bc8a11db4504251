use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

const HTTP_TIMEOUT_SECS: u64 = 10;
const DETAIL_FIELDS: &str =
    "place_id,name,formatted_address,geometry,rating,types,opening_hours,photos";
const PHOTO_MAX_WIDTH: u32 = 800;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// An unconfirmed search hit, prior to detail enrichment.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub place_id: String,
    pub name: String,
    pub types: Vec<String>,
    pub location: Option<GeoPoint>,
}

#[derive(Debug, Clone)]
pub struct SearchPage {
    pub candidates: Vec<Candidate>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PlaceDetailRecord {
    pub place_id: String,
    pub name: String,
    pub formatted_address: Option<String>,
    pub location: Option<GeoPoint>,
    pub rating: Option<f64>,
    pub types: Vec<String>,
    pub weekday_text: Vec<String>,
    pub photo_references: Vec<String>,
}

#[async_trait]
pub trait PlacesApi: Send + Sync {
    async fn geocode(&self, city: &str) -> AppResult<GeoPoint>;
    async fn text_search(
        &self,
        category: &str,
        city: &str,
        center: GeoPoint,
        radius_m: u32,
    ) -> AppResult<SearchPage>;
    async fn place_details(&self, place_id: &str) -> AppResult<PlaceDetailRecord>;
}

/// Public photo endpoint URL for a photo reference. The API key is not
/// embedded; the serving layer appends its own.
pub fn photo_url(reference: &str) -> String {
    format!(
        "https://maps.googleapis.com/maps/api/place/photo?maxwidth={PHOTO_MAX_WIDTH}&photo_reference={reference}"
    )
}

pub struct HttpPlacesClient {
    http: Client,
    api_key: SecretString,
    base_url: String,
}

impl HttpPlacesClient {
    pub fn new(api_key: SecretString, base_url: &str) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PlacesApi for HttpPlacesClient {
    async fn geocode(&self, city: &str) -> AppResult<GeoPoint> {
        #[derive(Deserialize)]
        struct Response {
            status: String,
            results: Vec<ResponseResult>,
        }

        #[derive(Deserialize)]
        struct ResponseResult {
            geometry: ResponseGeometry,
        }

        #[derive(Deserialize)]
        struct ResponseGeometry {
            location: GeoPoint,
        }

        let url = format!("{}/maps/api/geocode/json", self.base_url);
        let response = self
            .http
            .get(url)
            .query(&[("address", city), ("key", self.api_key.expose_secret())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::provider(
                Some(status.as_u16()),
                format!("geocoding request for '{city}' failed ({status})"),
            ));
        }

        let parsed: Response = response.json().await?;
        if parsed.status != "OK" {
            return Err(AppError::provider(
                None,
                format!("geocoding failed for '{city}': {}", parsed.status),
            ));
        }
        parsed
            .results
            .into_iter()
            .next()
            .map(|result| result.geometry.location)
            .ok_or_else(|| {
                AppError::provider(None, format!("geocoding returned no results for '{city}'"))
            })
    }

    async fn text_search(
        &self,
        category: &str,
        city: &str,
        center: GeoPoint,
        radius_m: u32,
    ) -> AppResult<SearchPage> {
        #[derive(Deserialize)]
        struct Response {
            status: String,
            #[serde(default)]
            results: Vec<ResponsePlace>,
            next_page_token: Option<String>,
        }

        #[derive(Deserialize)]
        struct ResponsePlace {
            place_id: String,
            name: String,
            #[serde(default)]
            types: Vec<String>,
            geometry: Option<ResponseGeometry>,
        }

        #[derive(Deserialize)]
        struct ResponseGeometry {
            location: Option<GeoPoint>,
        }

        let url = format!("{}/maps/api/place/textsearch/json", self.base_url);
        let query = format!("{category} in {city}");
        let location = format!("{},{}", center.lat, center.lng);
        let response = self
            .http
            .get(url)
            .query(&[
                ("query", query.as_str()),
                ("location", location.as_str()),
                ("radius", &radius_m.to_string()),
                ("key", self.api_key.expose_secret()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::provider(
                Some(status.as_u16()),
                format!("text search for '{query}' failed ({status})"),
            ));
        }

        let parsed: Response = response.json().await?;
        if parsed.status != "OK" && parsed.status != "ZERO_RESULTS" {
            return Err(AppError::provider(
                None,
                format!("text search failed for '{query}': {}", parsed.status),
            ));
        }

        let candidates = parsed
            .results
            .into_iter()
            .map(|place| Candidate {
                place_id: place.place_id,
                name: place.name,
                types: place.types,
                location: place.geometry.and_then(|g| g.location),
            })
            .collect();

        Ok(SearchPage {
            candidates,
            next_page_token: parsed.next_page_token,
        })
    }

    async fn place_details(&self, place_id: &str) -> AppResult<PlaceDetailRecord> {
        #[derive(Deserialize)]
        struct Response {
            status: String,
            result: Option<ResponseDetail>,
        }

        #[derive(Deserialize)]
        struct ResponseDetail {
            place_id: Option<String>,
            name: Option<String>,
            formatted_address: Option<String>,
            geometry: Option<ResponseGeometry>,
            rating: Option<f64>,
            #[serde(default)]
            types: Vec<String>,
            opening_hours: Option<ResponseHours>,
            #[serde(default)]
            photos: Vec<ResponsePhoto>,
        }

        #[derive(Deserialize)]
        struct ResponseGeometry {
            location: Option<GeoPoint>,
        }

        #[derive(Deserialize)]
        struct ResponseHours {
            #[serde(default)]
            weekday_text: Vec<String>,
        }

        #[derive(Deserialize)]
        struct ResponsePhoto {
            photo_reference: Option<String>,
        }

        let url = format!("{}/maps/api/place/details/json", self.base_url);
        let response = self
            .http
            .get(url)
            .query(&[
                ("place_id", place_id),
                ("fields", DETAIL_FIELDS),
                ("key", self.api_key.expose_secret()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::provider(
                Some(status.as_u16()),
                format!("place details request for '{place_id}' failed ({status})"),
            ));
        }

        let parsed: Response = response.json().await?;
        let detail = match (parsed.status.as_str(), parsed.result) {
            ("OK", Some(detail)) => detail,
            (other, _) => {
                return Err(AppError::provider(
                    None,
                    format!("place details failed for '{place_id}': {other}"),
                ))
            }
        };

        Ok(PlaceDetailRecord {
            place_id: detail.place_id.unwrap_or_else(|| place_id.to_string()),
            name: detail.name.unwrap_or_default(),
            formatted_address: detail.formatted_address,
            location: detail.geometry.and_then(|g| g.location),
            rating: detail.rating,
            types: detail.types,
            weekday_text: detail
                .opening_hours
                .map(|hours| hours.weekday_text)
                .unwrap_or_default(),
            photo_references: detail
                .photos
                .into_iter()
                .filter_map(|photo| photo.photo_reference)
                .collect(),
        })
    }
}
