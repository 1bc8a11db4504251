use std::time::Duration;

use futures_util::future::join_all;
use serde::Serialize;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::errors::AppResult;
use crate::inference::{self, AmenityFlags, AttributeFlags, OpeningHours};
use crate::places::{photo_url, Candidate, PlaceDetailRecord, PlacesApi};
use crate::retry::retry_with_backoff;

/// A fully enriched record ready for insertion.
#[derive(Debug, Clone, Serialize)]
pub struct NewWorkspace {
    pub google_place_id: String,
    pub name: String,
    pub description: String,
    pub address: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub amenities: AmenityFlags,
    pub attributes: AttributeFlags,
    pub opening_hours: Vec<OpeningHours>,
    pub photo_urls: Vec<String>,
    pub city: String,
    pub is_public: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct BatchSettings {
    pub batch_size: usize,
    pub stagger: Duration,
    pub max_attempts: u32,
    pub base_backoff: Duration,
}

/// Fetches details for each candidate in fixed-size batches. Requests inside
/// a batch start staggered by `stagger * index`; each fetch is independently
/// retried. A candidate whose fetch fails after retries, or whose detail
/// record lacks geometry, is dropped without failing the batch.
pub async fn process_candidates(
    api: &dyn PlacesApi,
    candidates: &[Candidate],
    city: &str,
    settings: BatchSettings,
) -> Vec<NewWorkspace> {
    let mut records = Vec::with_capacity(candidates.len());
    let mut dropped = 0usize;

    for batch in candidates.chunks(settings.batch_size.max(1)) {
        let fetches = batch
            .iter()
            .enumerate()
            .map(|(index, candidate)| fetch_one(api, candidate, index, city, settings));
        for outcome in join_all(fetches).await {
            match outcome {
                Some(record) => records.push(record),
                None => dropped += 1,
            }
        }
    }

    debug!(
        city,
        fetched = records.len(),
        dropped,
        "processed candidate batches"
    );
    records
}

async fn fetch_one(
    api: &dyn PlacesApi,
    candidate: &Candidate,
    index_in_batch: usize,
    city: &str,
    settings: BatchSettings,
) -> Option<NewWorkspace> {
    if index_in_batch > 0 {
        sleep(settings.stagger * index_in_batch as u32).await;
    }

    let detail: AppResult<PlaceDetailRecord> = retry_with_backoff(
        || api.place_details(&candidate.place_id),
        settings.max_attempts,
        settings.base_backoff,
    )
    .await;

    let detail = match detail {
        Ok(detail) => detail,
        Err(err) => {
            warn!(
                ?err,
                place_id = %candidate.place_id,
                "dropping candidate after failed details fetch"
            );
            return None;
        }
    };

    let Some(location) = detail.location else {
        warn!(
            place_id = %candidate.place_id,
            "dropping candidate with no geometry in details"
        );
        return None;
    };

    Some(to_workspace(candidate, detail, location.lat, location.lng, city))
}

fn to_workspace(
    candidate: &Candidate,
    detail: PlaceDetailRecord,
    lat: f64,
    lng: f64,
    city: &str,
) -> NewWorkspace {
    let name = if detail.name.trim().is_empty() {
        candidate.name.clone()
    } else {
        detail.name.clone()
    };
    let amenities = inference::infer_amenities(&detail.types);
    let attributes = inference::infer_attributes(&detail.types, detail.rating);
    let opening_hours = inference::parse_opening_hours(&detail.weekday_text);
    let photo_urls = detail
        .photo_references
        .iter()
        .map(|reference| photo_url(reference))
        .collect();

    NewWorkspace {
        google_place_id: detail.place_id,
        description: format!("{name} in {city}"),
        name,
        address: detail.formatted_address,
        lat,
        lng,
        amenities,
        attributes,
        opening_hours,
        photo_urls,
        city: city.to_string(),
        is_public: true,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::errors::AppError;
    use crate::places::{GeoPoint, SearchPage};

    struct ScriptedDetails {
        responses: HashMap<String, Result<PlaceDetailRecord, u16>>,
        calls: AtomicUsize,
    }

    impl ScriptedDetails {
        fn new(responses: HashMap<String, Result<PlaceDetailRecord, u16>>) -> Self {
            Self {
                responses,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PlacesApi for ScriptedDetails {
        async fn geocode(&self, _city: &str) -> AppResult<GeoPoint> {
            Ok(GeoPoint { lat: 0.0, lng: 0.0 })
        }

        async fn text_search(
            &self,
            _category: &str,
            _city: &str,
            _center: GeoPoint,
            _radius_m: u32,
        ) -> AppResult<SearchPage> {
            Ok(SearchPage {
                candidates: Vec::new(),
                next_page_token: None,
            })
        }

        async fn place_details(&self, place_id: &str) -> AppResult<PlaceDetailRecord> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.responses.get(place_id) {
                Some(Ok(detail)) => Ok(detail.clone()),
                Some(Err(status)) => Err(AppError::provider(Some(*status), "scripted failure")),
                None => Err(AppError::provider(Some(404), "unknown place")),
            }
        }
    }

    fn candidate(place_id: &str) -> Candidate {
        Candidate {
            place_id: place_id.to_string(),
            name: format!("Candidate {place_id}"),
            types: vec!["cafe".into()],
            location: Some(GeoPoint { lat: 1.0, lng: 2.0 }),
        }
    }

    fn detail(place_id: &str, with_geometry: bool) -> PlaceDetailRecord {
        PlaceDetailRecord {
            place_id: place_id.to_string(),
            name: format!("Detail {place_id}"),
            formatted_address: Some("123 Street".into()),
            location: with_geometry.then_some(GeoPoint { lat: 30.0, lng: -97.0 }),
            rating: Some(4.2),
            types: vec!["cafe".into()],
            weekday_text: vec!["Monday: 7:00 AM - 5:00 PM".into()],
            photo_references: vec!["ref-a".into()],
        }
    }

    fn settings() -> BatchSettings {
        BatchSettings {
            batch_size: 2,
            stagger: Duration::from_millis(1),
            max_attempts: 2,
            base_backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn converts_successful_fetches_into_workspaces() {
        let api = ScriptedDetails::new(HashMap::from([
            ("a".to_string(), Ok(detail("a", true))),
            ("b".to_string(), Ok(detail("b", true))),
        ]));

        let records =
            process_candidates(&api, &[candidate("a"), candidate("b")], "Austin", settings()).await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].google_place_id, "a");
        assert_eq!(records[0].city, "Austin");
        assert!(records[0].amenities.wifi);
        assert_eq!(records[0].opening_hours.len(), 1);
        assert!(records[0].photo_urls[0].contains("ref-a"));
        assert!(records[0].is_public);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_candidate_is_dropped_without_aborting_the_batch() {
        let api = ScriptedDetails::new(HashMap::from([
            ("a".to_string(), Ok(detail("a", true))),
            ("b".to_string(), Err(503u16)),
            ("c".to_string(), Ok(detail("c", true))),
        ]));

        let records = process_candidates(
            &api,
            &[candidate("a"), candidate("b"), candidate("c")],
            "Austin",
            settings(),
        )
        .await;
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.google_place_id != "b"));
        // "b" was retried to exhaustion: 2 attempts + one each for "a"/"c".
        assert_eq!(api.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_geometry_drops_the_candidate() {
        let api = ScriptedDetails::new(HashMap::from([
            ("a".to_string(), Ok(detail("a", false))),
            ("b".to_string(), Ok(detail("b", true))),
        ]));

        let records =
            process_candidates(&api, &[candidate("a"), candidate("b")], "Austin", settings()).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].google_place_id, "b");
    }

    #[tokio::test(start_paused = true)]
    async fn falls_back_to_candidate_name_when_detail_name_is_blank() {
        let mut blank = detail("a", true);
        blank.name = "  ".into();
        let api = ScriptedDetails::new(HashMap::from([("a".to_string(), Ok(blank))]));

        let records = process_candidates(&api, &[candidate("a")], "Austin", settings()).await;
        assert_eq!(records[0].name, "Candidate a");
    }
}
