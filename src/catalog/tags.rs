//! Popular-tag rule
//!
//! A restaurant is popular when it has more than 100 Yelp reviews and a Yelp
//! rating of at least 4.0.

use serde::{Deserialize, Serialize};

/// Reviews needed before a restaurant can be popular (exclusive)
pub const POPULAR_MIN_REVIEWS: u64 = 100;
/// Minimum rating for a popular restaurant (inclusive)
pub const POPULAR_MIN_RATING: f64 = 4.0;

pub fn is_popular(review_count: u64, rating: f64) -> bool {
    review_count > POPULAR_MIN_REVIEWS && rating >= POPULAR_MIN_RATING
}

/// One entry of a Yelp info export
#[derive(Debug, Clone, Deserialize)]
pub struct YelpRecord {
    pub name: Option<String>,
    #[serde(default)]
    pub yelp: YelpInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct YelpInfo {
    #[serde(default)]
    pub yelp_review_count: u64,
    #[serde(default)]
    pub yelp_rating: f64,
    pub yelp_url: Option<String>,
}

/// Popular-tag verdict for one restaurant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PopularTag {
    pub name: Option<String>,
    pub popular: bool,
    pub yelp_review_count: u64,
    pub yelp_rating: f64,
    pub yelp_url: Option<String>,
}

/// Apply the popular rule to every record of a Yelp export
pub fn popular_tags(records: &[YelpRecord]) -> Vec<PopularTag> {
    records
        .iter()
        .map(|record| PopularTag {
            name: record.name.clone(),
            popular: is_popular(record.yelp.yelp_review_count, record.yelp.yelp_rating),
            yelp_review_count: record.yelp.yelp_review_count,
            yelp_rating: record.yelp.yelp_rating,
            yelp_url: record.yelp.yelp_url.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_popular_above_thresholds() {
        assert!(is_popular(150, 4.2));
        assert!(is_popular(1000, 4.0));
    }

    #[test]
    fn test_not_popular_with_too_few_reviews() {
        assert!(!is_popular(100, 4.2));
        assert!(!is_popular(99, 4.5));
        assert!(is_popular(101, 4.5));
    }

    #[test]
    fn test_both_thresholds_at_their_edges() {
        assert!(is_popular(101, 4.0));
        assert!(!is_popular(100, 4.0));
        assert!(!is_popular(101, 3.99));
    }

    #[test]
    fn test_not_popular_with_low_rating() {
        assert!(!is_popular(200, 3.9));
        assert!(!is_popular(500, 2.0));
    }

    #[test]
    fn test_popular_tags_from_export() {
        let json = r#"[
            {"name": "Taco Town", "yelp": {"yelp_review_count": 320, "yelp_rating": 4.5, "yelp_url": "https://yelp.com/biz/taco-town"}},
            {"name": "Quiet Cafe", "yelp": {"yelp_review_count": 12, "yelp_rating": 4.8}},
            {"name": "No Yelp"}
        ]"#;
        let records: Vec<YelpRecord> = serde_json::from_str(json).unwrap();

        let tags = popular_tags(&records);
        assert_eq!(tags.len(), 3);
        assert!(tags[0].popular);
        assert!(!tags[1].popular);
        assert!(!tags[2].popular);
        assert_eq!(tags[2].yelp_review_count, 0);
        assert_eq!(tags[0].yelp_url.as_deref(), Some("https://yelp.com/biz/taco-town"));
    }
}
