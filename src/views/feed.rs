//! Cross-foot review aggregation shared by the feet and admin pages.
//!
//! There is no aggregation endpoint, so every foot's reviews are fetched
//! (one request per foot) and reduced client-side.

use std::cmp::Ordering;

use futures::future::try_join_all;

use crate::api::ApiClient;
use crate::error::ApiResult;
use crate::models::{FeedReview, Foot};

/// Sidebar counters for the feet page.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FeetStats {
    pub total_feet: usize,
    pub total_reviews: usize,
    pub my_feet: usize,
    pub my_reviews: usize,
    pub my_average_rating: f64,
}

impl FeetStats {
    /// Reduce over the flattened review list. An empty `username` yields zero
    /// personal counters.
    pub fn compute(feet: &[Foot], reviews: &[FeedReview], username: &str) -> Self {
        let (my_feet, mine): (usize, Vec<u8>) = if username.is_empty() {
            (0, Vec::new())
        } else {
            (
                feet.iter()
                    .filter(|foot| foot.owner_username == username)
                    .count(),
                reviews
                    .iter()
                    .filter(|r| r.review.review_username == username)
                    .map(|r| r.review.rate_aspect)
                    .collect(),
            )
        };

        Self {
            total_feet: feet.len(),
            total_reviews: reviews.len(),
            my_feet,
            my_reviews: mine.len(),
            my_average_rating: average_rating(&mine),
        }
    }
}

/// sum / count, or 0 for no ratings.
pub fn average_rating(ratings: &[u8]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: u32 = ratings.iter().map(|&r| u32::from(r)).sum();
    f64::from(sum) / ratings.len() as f64
}

/// Fetch reviews of every foot concurrently and tag them with their foot.
pub async fn collect_reviews(client: &ApiClient, feet: &[Foot]) -> ApiResult<Vec<FeedReview>> {
    let per_foot = try_join_all(feet.iter().map(|foot| async move {
        let reviews = client.list_reviews(foot.id).await?;
        Ok::<_, crate::error::ApiError>(
            reviews
                .into_iter()
                .map(|review| FeedReview {
                    foot_id: foot.id,
                    review,
                })
                .collect::<Vec<_>>(),
        )
    }))
    .await?;

    Ok(per_foot.into_iter().flatten().collect())
}

/// Newest first, truncated to `limit`. Completion order of the fan-out never
/// leaks into the result.
pub fn latest(mut reviews: Vec<FeedReview>, limit: usize) -> Vec<FeedReview> {
    reviews.sort_by(newest_first);
    reviews.truncate(limit);
    reviews
}

fn newest_first(a: &FeedReview, b: &FeedReview) -> Ordering {
    match (a.review.created_at_utc(), b.review.created_at_utc()) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Result of one side-panel load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedSnapshot {
    pub latest: Vec<FeedReview>,
    pub stats: FeetStats,
}

/// Load the side panel: optional feet fetch, fan-out, sort, reduce.
pub async fn load_snapshot(
    client: &ApiClient,
    feet: Option<Vec<Foot>>,
    username: &str,
    limit: usize,
) -> ApiResult<FeedSnapshot> {
    let feet = match feet {
        Some(feet) => feet,
        None => client.list_feet().await?,
    };
    if feet.is_empty() {
        return Ok(FeedSnapshot::default());
    }

    let reviews = collect_reviews(client, &feet).await?;
    let stats = FeetStats::compute(&feet, &reviews, username);
    Ok(FeedSnapshot {
        latest: latest(reviews, limit),
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArchType, Review};

    fn foot(id: i64, owner: &str) -> Foot {
        Foot {
            id,
            title: format!("foot-{}", id),
            image_url: String::new(),
            arch_type: ArchType::PesRectus,
            owner_username: owner.to_string(),
            created_at: "2024-01-01T00:00:00".to_string(),
        }
    }

    fn review(id: i64, foot_id: i64, user: &str, rate: u8, at: &str) -> FeedReview {
        FeedReview {
            foot_id,
            review: Review {
                id,
                comment: format!("c{}", id),
                rate_aspect: rate,
                review_username: user.to_string(),
                created_at: at.to_string(),
            },
        }
    }

    #[test]
    fn average_is_sum_over_count() {
        assert_eq!(average_rating(&[5, 3, 4]), 4.0);
        assert_eq!(average_rating(&[]), 0.0);
        assert_eq!(average_rating(&[5, 4]), 4.5);
    }

    #[test]
    fn stats_for_user() {
        let feet = vec![foot(1, "ana"), foot(2, "luis"), foot(3, "ana")];
        let reviews = vec![
            review(1, 1, "luis", 5, "2024-01-01T00:00:00"),
            review(2, 2, "ana", 3, "2024-01-02T00:00:00"),
            review(3, 3, "ana", 4, "2024-01-03T00:00:00"),
            review(4, 2, "ana", 5, "2024-01-04T00:00:00"),
        ];
        let stats = FeetStats::compute(&feet, &reviews, "ana");
        assert_eq!(stats.total_feet, 3);
        assert_eq!(stats.total_reviews, 4);
        assert_eq!(stats.my_feet, 2);
        assert_eq!(stats.my_reviews, 3);
        assert_eq!(stats.my_average_rating, 4.0);
    }

    #[test]
    fn stats_without_user_or_data() {
        let stats = FeetStats::compute(&[foot(1, "ana")], &[], "");
        assert_eq!(stats.my_feet, 0);
        assert_eq!(stats.my_average_rating, 0.0);
        assert_eq!(FeetStats::compute(&[], &[], "ana"), FeetStats::default());
    }

    #[test]
    fn latest_sorts_newest_first_and_truncates() {
        let reviews = vec![
            review(1, 1, "a", 5, "2024-01-01T00:00:00"),
            review(2, 1, "a", 5, "bogus"),
            review(3, 2, "a", 5, "2024-03-01T00:00:00Z"),
            review(4, 2, "a", 5, "2024-02-01T00:00:00"),
        ];
        let ids: Vec<i64> = latest(reviews.clone(), 10).iter().map(|r| r.review.id).collect();
        assert_eq!(ids, vec![3, 4, 1, 2]);

        let top: Vec<i64> = latest(reviews, 2).iter().map(|r| r.review.id).collect();
        assert_eq!(top, vec![3, 4]);
    }
}
