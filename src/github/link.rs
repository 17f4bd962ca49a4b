use super::FetchError;

/// Extract the `page` number of the `rel="next"` entry of a GitHub `Link`
/// header.
///
/// The header looks like:
///
/// ```text
/// <https://api.github.com/repositories/1/issues?page=2&per_page=100>; rel="next",
/// <https://api.github.com/repositories/1/issues?page=5&per_page=100>; rel="last"
/// ```
///
/// Returns `Ok(None)` when there is no next entry (last page).
pub fn parse_next_page(header: &str) -> Result<Option<u32>, FetchError> {
    for entry in header.split(',') {
        let mut parts = entry.split(';');
        let target = parts.next().unwrap_or_default().trim();
        let is_next = parts.any(|param| {
            let param = param.trim();
            param == "rel=\"next\"" || param == "rel=next"
        });
        if !is_next {
            continue;
        }

        let url = target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .ok_or_else(|| FetchError::InvalidLink(header.to_string()))?;
        let url =
            reqwest::Url::parse(url).map_err(|_| FetchError::InvalidLink(header.to_string()))?;
        let page = url
            .query_pairs()
            .find(|(k, _)| k == "page")
            .and_then(|(_, v)| v.parse::<u32>().ok())
            .ok_or_else(|| FetchError::InvalidLink(header.to_string()))?;
        return Ok(Some(page));
    }
    Ok(None)
}
