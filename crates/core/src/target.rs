//! Work-identifier extraction from scrape target URLs.
//!
//! TripAdvisor hotel review URLs follow the shape
//! `https://…/Hotel_Review-g<geo>-d<loc>-Reviews-<Hotel_Name>-<City>.html`.
//! The hotel name is the fifth dash-separated segment; it keys both the
//! container environment and the artifact path, so invalid URLs are
//! rejected here before any backend call is made.

/// Errors from parsing a scrape target URL.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetUrlError {
    /// The URL does not contain enough dash-separated segments to carry
    /// a hotel name.
    #[error("target URL has no hotel-name segment: {0}")]
    MissingNameSegment(String),

    /// The URL does not look like a hotel review page at all.
    #[error("target URL is not a hotel review URL: {0}")]
    NotHotelReview(String),
}

/// Index of the hotel-name segment in a dash-split review URL.
const NAME_SEGMENT: usize = 4;

/// Extract the work identifier (hotel name) from a hotel review URL.
///
/// # Examples
///
/// ```
/// use reviewdock_core::target::work_id_from_url;
///
/// let url = "https://www.tripadvisor.com/Hotel_Review-g188107-d231860-Reviews-Fawlty_Towers-Torquay.html";
/// assert_eq!(work_id_from_url(url).unwrap(), "Fawlty_Towers");
/// ```
pub fn work_id_from_url(url: &str) -> Result<String, TargetUrlError> {
    if !url.contains("Hotel_Review") {
        return Err(TargetUrlError::NotHotelReview(url.to_string()));
    }

    let segments: Vec<&str> = url.split('-').collect();
    let name = segments
        .get(NAME_SEGMENT)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| TargetUrlError::MissingNameSegment(url.to_string()))?;

    Ok((*name).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hotel_name_segment() {
        let url = "https://www.tripadvisor.com/Hotel_Review-g188107-d231860-Reviews-Grand_Palace-Luzern.html";
        assert_eq!(work_id_from_url(url).unwrap(), "Grand_Palace");
    }

    #[test]
    fn hotel_name_keeps_underscores() {
        let url = "https://www.tripadvisor.com/Hotel_Review-g1-d2-Reviews-The_Old_Mill_Inn-Somewhere.html";
        assert_eq!(work_id_from_url(url).unwrap(), "The_Old_Mill_Inn");
    }

    #[test]
    fn rejects_non_review_urls() {
        let err = work_id_from_url("https://www.tripadvisor.com/Airline_Review-d123").unwrap_err();
        assert!(matches!(err, TargetUrlError::NotHotelReview(_)));
    }

    #[test]
    fn rejects_urls_with_too_few_segments() {
        let err = work_id_from_url("https://host/Hotel_Review-g1-d2").unwrap_err();
        assert!(matches!(err, TargetUrlError::MissingNameSegment(_)));
    }
}
