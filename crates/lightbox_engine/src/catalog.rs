use engine_logging::engine_warn;
use serde_json::Value;

use crate::{CatalogEntry, CatalogError, FetchSettings};

/// One-shot fetch and parse of the remote photo catalog.
pub async fn load_catalog(
    url: &str,
    settings: &FetchSettings,
) -> Result<Vec<CatalogEntry>, CatalogError> {
    let parsed =
        reqwest::Url::parse(url).map_err(|err| CatalogError::Unavailable(err.to_string()))?;
    let client = reqwest::Client::builder()
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.request_timeout)
        .build()
        .map_err(|err| CatalogError::Unavailable(err.to_string()))?;

    let response = client
        .get(parsed)
        .send()
        .await
        .map_err(|err| CatalogError::Unavailable(err.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(CatalogError::Unavailable(status.to_string()));
    }
    let body = response
        .bytes()
        .await
        .map_err(|err| CatalogError::Unavailable(err.to_string()))?;

    parse_catalog(&body)
}

/// Parses a JSON object mapping display name to photo URL. Entries whose
/// URL does not parse are skipped; entry order follows the object's keys.
pub fn parse_catalog(bytes: &[u8]) -> Result<Vec<CatalogEntry>, CatalogError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|err| CatalogError::Malformed(err.to_string()))?;
    let Value::Object(map) = value else {
        return Err(CatalogError::Malformed(
            "expected a JSON object of name to url".to_string(),
        ));
    };

    let mut entries = Vec::with_capacity(map.len());
    for (name, url) in map {
        let Value::String(url) = url else {
            return Err(CatalogError::Malformed(format!(
                "entry {name:?} is not a string"
            )));
        };
        if url::Url::parse(&url).is_err() {
            engine_warn!("skipping catalog entry {:?}: invalid url {:?}", name, url);
            continue;
        }
        entries.push(CatalogEntry { name, url });
    }

    if entries.is_empty() {
        return Err(CatalogError::Malformed(
            "catalog has no usable entries".to_string(),
        ));
    }
    Ok(entries)
}
