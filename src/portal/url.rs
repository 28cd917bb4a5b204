/// Everything before the dataset identifier in an ArcGIS open data download URL
pub const PORTAL_PREFIX: &str = "https://opendata.arcgis.com/datasets/";

/// Everything after the dataset identifier
pub const PORTAL_SUFFIX: &str = ".geojson";

/// Place a dataset identifier into the ArcGIS open data URL pattern.
///
/// The identifier is not checked, a malformed one just produces a URL that fails when fetched.
pub fn build_url(identifier: &str) -> String {
    format!("{PORTAL_PREFIX}{identifier}{PORTAL_SUFFIX}")
}

/// Reduce a full download URL to its bare dataset identifier.
///
/// Bare identifiers come back unchanged, so `strip_url(strip_url(x)) == strip_url(x)`.
pub fn strip_url(identifier_or_url: &str) -> &str {
    let trimmed = identifier_or_url.trim();
    let code = trimmed.strip_prefix(PORTAL_PREFIX).unwrap_or(trimmed);
    code.strip_suffix(PORTAL_SUFFIX).unwrap_or(code)
}
