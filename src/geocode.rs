//! Reverse geocoding of an estimated fleet center to a place label.
//!
//! Display-layer concern only: the core never calls this. Uses the public
//! Nominatim reverse endpoint, which requires an identifying User-Agent.

use reqwest::header::{HeaderValue, USER_AGENT};
use serde::Deserialize;

use crate::fetch::{FetchError, HttpClient};

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/reverse";
const AGENT: &str = "gtfs-rt-mocker/0.1";

#[derive(Debug, Deserialize)]
struct Place {
    address: Option<Address>,
}

#[derive(Debug, Default, Deserialize)]
struct Address {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    county: Option<String>,
    country: Option<String>,
}

/// Looks up a human-readable label ("Paris, France") for a coordinate.
///
/// A successful answer without a usable locality yields `Ok(None)`, as
/// does a non-success HTTP status; callers treat `None` as "no label".
///
/// # Errors
///
/// Returns [`FetchError`] when the request or response decoding fails.
pub async fn reverse_geocode<C: HttpClient>(
    client: &C,
    lat: f64,
    lon: f64,
) -> Result<Option<String>, FetchError> {
    let url = format!("{NOMINATIM_URL}?format=json&lat={lat}&lon={lon}&zoom=10&addressdetails=1");
    let url = url
        .parse::<reqwest::Url>()
        .map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

    let mut req = reqwest::Request::new(reqwest::Method::GET, url);
    req.headers_mut()
        .insert(USER_AGENT, HeaderValue::from_static(AGENT));

    let resp = client.execute(req).await?;
    if !resp.status().is_success() {
        return Ok(None);
    }

    let place: Place = resp.json().await?;
    Ok(place.address.as_ref().and_then(place_label))
}

/// Locality preference order, then the country appended when known.
fn place_label(address: &Address) -> Option<String> {
    let city = non_empty(&address.city)
        .or_else(|| non_empty(&address.town))
        .or_else(|| non_empty(&address.village))
        .or_else(|| non_empty(&address.municipality))
        .or_else(|| non_empty(&address.county))?;

    match non_empty(&address.country) {
        Some(country) => Some(format!("{city}, {country}")),
        None => Some(city.to_string()),
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_label_prefers_city() {
        let address = Address {
            city: Some("Paris".to_string()),
            town: Some("Montreuil".to_string()),
            country: Some("France".to_string()),
            ..Default::default()
        };
        assert_eq!(place_label(&address), Some("Paris, France".to_string()));
    }

    #[test]
    fn test_place_label_falls_back_through_localities() {
        let address = Address {
            village: Some("Èze".to_string()),
            country: Some("France".to_string()),
            ..Default::default()
        };
        assert_eq!(place_label(&address), Some("Èze, France".to_string()));

        let address = Address {
            county: Some("Kent".to_string()),
            ..Default::default()
        };
        assert_eq!(place_label(&address), Some("Kent".to_string()));
    }

    #[test]
    fn test_place_label_requires_a_locality() {
        let address = Address {
            country: Some("France".to_string()),
            ..Default::default()
        };
        assert_eq!(place_label(&address), None);

        let address = Address {
            city: Some(String::new()),
            country: Some("France".to_string()),
            ..Default::default()
        };
        assert_eq!(place_label(&address), None);
    }

    #[test]
    fn test_nominatim_response_shape_parses() {
        let body = r#"{
            "place_id": 12345,
            "address": {
                "city": "Rennes",
                "county": "Ille-et-Vilaine",
                "country": "France",
                "country_code": "fr"
            }
        }"#;
        let place: Place = serde_json::from_str(body).unwrap();
        assert_eq!(
            place.address.as_ref().and_then(place_label),
            Some("Rennes, France".to_string())
        );
    }
}
