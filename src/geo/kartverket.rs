//! Kartverket (geonorge) REST client
//!
//! - address point search: `/adresser/v1/punktsok`
//! - municipality point lookup: `/kommuneinfo/v1/punkt`
//!
//! Coordinates are sent as EUREF89 geographic (EPSG:4258), which matches
//! WGS84 well within the accuracy of either lookup.

use super::LocationLookup;
use funnskjema_common::{AddressLookupResult, LatLon, MunicipalityLookupResult};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://ws.geonorge.no";

/// Search radius of the address point search, metres
const ADDRESS_RADIUS_M: u32 = 10_000;
const ADDRESS_HITS: u32 = 5;
const EUREF89_GEOGRAPHIC: u32 = 4258;

pub struct KartverketClient {
    client: reqwest::Client,
    base_url: String,
}

impl KartverketClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("funnskjema/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|e| {
                log::warn!("HTTP client setup failed, using defaults: {}", e);
                reqwest::Client::new()
            });
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn address_url(&self, lat: f64, lon: f64) -> String {
        format!(
            "{}/adresser/v1/punktsok?lat={}&lon={}&radius={}&koordsys={}&utkoordsys={}&treffPerSide={}&side=0&asciiKompatibel=true",
            self.base_url, lat, lon, ADDRESS_RADIUS_M, EUREF89_GEOGRAPHIC, EUREF89_GEOGRAPHIC, ADDRESS_HITS
        )
    }

    pub fn municipality_url(&self, lat: f64, lon: f64) -> String {
        format!(
            "{}/kommuneinfo/v1/punkt?nord={}&ost={}&koordsys={}",
            self.base_url, lat, lon, EUREF89_GEOGRAPHIC
        )
    }

    /// GET returning the body, or `None` on any transport or status failure
    async fn fetch(&self, url: &str) -> Option<String> {
        log::debug!("GET {}", url);
        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                log::warn!("lookup request failed: {}", e);
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            log::warn!("lookup returned HTTP {} for {}", status, url);
            return None;
        }

        match response.text().await {
            Ok(body) => Some(body),
            Err(e) => {
                log::warn!("lookup response unreadable: {}", e);
                None
            }
        }
    }
}

impl LocationLookup for KartverketClient {
    async fn resolve_address(&self, lat: f64, lon: f64) -> Option<AddressLookupResult> {
        let body = self.fetch(&self.address_url(lat, lon)).await?;
        let result = parse_address_response(&body);
        if result.is_none() {
            log::debug!("no address near {:.6}, {:.6}", lat, lon);
        }
        result
    }

    async fn resolve_municipality(&self, lat: f64, lon: f64) -> Option<MunicipalityLookupResult> {
        let body = self.fetch(&self.municipality_url(lat, lon)).await?;
        let result = parse_municipality_response(&body);
        if result.is_none() {
            log::debug!("no municipality for {:.6}, {:.6}", lat, lon);
        }
        result
    }
}

// ============================================
// Response parsing
// ============================================

/// gardsnummer/bruksnummer arrive as numbers, sometimes as strings
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(i64),
    Text(String),
}

impl NumberOrText {
    fn into_string(self) -> String {
        match self {
            NumberOrText::Number(n) => n.to_string(),
            NumberOrText::Text(s) => s.trim().to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PointResponse {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddressHit {
    #[serde(default)]
    adressetekst: String,
    #[serde(default)]
    postnummer: String,
    #[serde(default)]
    poststed: String,
    #[serde(default)]
    kommunenavn: String,
    gardsnummer: Option<NumberOrText>,
    bruksnummer: Option<NumberOrText>,
    meter_distanse_til_punkt: Option<f64>,
    representasjonspunkt: Option<PointResponse>,
}

#[derive(Debug, Deserialize)]
struct AddressResponse {
    #[serde(default)]
    adresser: Vec<AddressHit>,
}

#[derive(Debug, Deserialize)]
struct MunicipalityResponse {
    #[serde(default)]
    fylkesnavn: String,
    #[serde(default)]
    fylkesnummer: String,
    #[serde(default)]
    kommunenavn: String,
    #[serde(default)]
    kommunenummer: String,
}

/// Nearest hit of an address point search body. Hits come sorted by distance.
pub fn parse_address_response(body: &str) -> Option<AddressLookupResult> {
    let response: AddressResponse = match serde_json::from_str(body) {
        Ok(r) => r,
        Err(e) => {
            log::warn!("address response is not valid JSON: {}", e);
            return None;
        }
    };

    let hit = response.adresser.into_iter().next()?;
    Some(AddressLookupResult {
        street_text: hit.adressetekst,
        postal_code: hit.postnummer,
        postal_place: hit.poststed,
        municipality_name: hit.kommunenavn,
        farm_number: hit.gardsnummer.map(NumberOrText::into_string).unwrap_or_default(),
        holding_number: hit.bruksnummer.map(NumberOrText::into_string).unwrap_or_default(),
        distance_meters: hit.meter_distanse_til_punkt,
        point: hit
            .representasjonspunkt
            .map(|p| LatLon { lat: p.lat, lon: p.lon }),
    })
}

/// Municipality point lookup body. A body without a municipality number is "no result".
pub fn parse_municipality_response(body: &str) -> Option<MunicipalityLookupResult> {
    let response: MunicipalityResponse = match serde_json::from_str(body) {
        Ok(r) => r,
        Err(e) => {
            log::warn!("municipality response is not valid JSON: {}", e);
            return None;
        }
    };

    if response.kommunenummer.trim().is_empty() && response.kommunenavn.trim().is_empty() {
        return None;
    }

    Some(MunicipalityLookupResult {
        county_name: response.fylkesnavn,
        county_number: response.fylkesnummer,
        municipality_name: response.kommunenavn,
        municipality_number: response.kommunenummer,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS_BODY: &str = r#"{
        "metadata": {"totaltAntallTreff": 2},
        "adresser": [
            {
                "adressetekst": "Storgata 5",
                "postnummer": "0155",
                "poststed": "OSLO",
                "kommunenavn": "OSLO",
                "kommunenummer": "0301",
                "gardsnummer": 207,
                "bruksnummer": 45,
                "meterDistanseTilPunkt": 12.4,
                "representasjonspunkt": {"epsg": "EPSG:4258", "lat": 59.9139, "lon": 10.7522}
            },
            {
                "adressetekst": "Storgata 7",
                "postnummer": "0155",
                "poststed": "OSLO",
                "kommunenavn": "OSLO",
                "gardsnummer": 207,
                "bruksnummer": 46
            }
        ]
    }"#;

    #[test]
    fn test_parse_address_takes_nearest() {
        let result = parse_address_response(ADDRESS_BODY).unwrap();
        assert_eq!(result.street_text, "Storgata 5");
        assert_eq!(result.postal_code, "0155");
        assert_eq!(result.postal_place, "OSLO");
        assert_eq!(result.farm_number, "207");
        assert_eq!(result.holding_number, "45");
        assert_eq!(result.distance_meters, Some(12.4));
        assert_eq!(result.point, Some(LatLon { lat: 59.9139, lon: 10.7522 }));
    }

    #[test]
    fn test_parse_address_text_numbers() {
        let body = r#"{"adresser": [{"adressetekst": "Gården", "gardsnummer": " 12 ", "bruksnummer": "3"}]}"#;
        let result = parse_address_response(body).unwrap();
        assert_eq!(result.farm_number, "12");
        assert_eq!(result.holding_number, "3");
        assert!(result.point.is_none());
    }

    #[test]
    fn test_parse_address_no_hits() {
        assert!(parse_address_response(r#"{"adresser": []}"#).is_none());
        assert!(parse_address_response("{}").is_none());
        assert!(parse_address_response("<html>").is_none());
    }

    #[test]
    fn test_parse_municipality() {
        let body = r#"{
            "fylkesnavn": "Trøndelag",
            "fylkesnummer": "50",
            "kommunenavn": "Trondheim",
            "kommunenummer": "5001"
        }"#;
        let result = parse_municipality_response(body).unwrap();
        assert_eq!(result.county_name, "Trøndelag");
        assert_eq!(result.county_number, "50");
        assert_eq!(result.municipality_name, "Trondheim");
        assert_eq!(result.municipality_number, "5001");
    }

    #[test]
    fn test_parse_municipality_empty() {
        assert!(parse_municipality_response("{}").is_none());
        assert!(parse_municipality_response("not json").is_none());
    }

    #[test]
    fn test_urls() {
        let client = KartverketClient::new("https://ws.geonorge.no/", Duration::from_secs(1));
        let url = client.address_url(60.5, 9.25);
        assert!(url.starts_with("https://ws.geonorge.no/adresser/v1/punktsok?"));
        assert!(url.contains("lat=60.5&lon=9.25"));
        assert!(url.contains("radius=10000"));
        assert!(url.contains("treffPerSide=5"));
        assert!(url.contains("asciiKompatibel=true"));

        let url = client.municipality_url(60.5, 9.25);
        assert_eq!(
            url,
            "https://ws.geonorge.no/kommuneinfo/v1/punkt?nord=60.5&ost=9.25&koordsys=4258"
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_gives_none() {
        let client = KartverketClient::new("http://127.0.0.1:9", Duration::from_secs(2));
        assert!(client.resolve_address(60.0, 10.0).await.is_none());
        assert!(client.resolve_municipality(60.0, 10.0).await.is_none());
    }
}
