//! Idea ranking: likes, mean score, and author popularity.
//!
//! [`rank_ideas`] is a pure function over already-loaded ideas, evaluations,
//! and follower counts. It scans every evaluation for every candidate, which
//! is fine for the data volumes this service handles.
//!
//! Mean scores are rounded to two decimal places, half away from zero.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::domain::{Evaluation, Idea, IdeaId, UserId};

/// Caller-supplied thresholds for [`rank_ideas`].
///
/// Time bounds are inclusive; `None` leaves that side open.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdeaFilter {
    pub min_created_at: Option<DateTime<Utc>>,
    pub max_created_at: Option<DateTime<Utc>>,
    pub min_likes: u64,
    pub min_score: f64,
    pub min_followers: u64,
}

impl IdeaFilter {
    /// Whether `created_at` falls inside the configured window.
    pub fn admits_creation_time(&self, created_at: DateTime<Utc>) -> bool {
        self.min_created_at.is_none_or(|min| created_at >= min)
            && self.max_created_at.is_none_or(|max| created_at <= max)
    }
}

/// An idea together with the figures it was ranked by.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedIdea {
    pub idea: Idea,
    pub likes: u64,
    pub avg_score: f64,
    pub followers: u64,
}

/// Round to two decimal places, half away from zero.
///
/// # Examples
/// ```
/// use ideaboard::domain::round_to_hundredths;
///
/// assert_eq!(round_to_hundredths(4.0), 4.0);
/// assert_eq!(round_to_hundredths(3.333_333), 3.33);
/// assert_eq!(round_to_hundredths(2.675_000_1), 2.68);
/// ```
pub fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Rounded mean of the scores present in `evaluations`; `0.0` when none.
pub fn mean_score<'a>(evaluations: impl IntoIterator<Item = &'a Evaluation>) -> f64 {
    let (sum, count) = evaluations
        .into_iter()
        .filter_map(|evaluation| evaluation.score)
        .fold((0_u64, 0_u64), |(sum, count), score| {
            (sum + u64::from(score.get()), count + 1)
        });
    if count == 0 {
        return 0.0;
    }
    round_to_hundredths(sum as f64 / count as f64)
}

/// Number of evaluations with `liked` set.
pub fn like_count<'a>(evaluations: impl IntoIterator<Item = &'a Evaluation>) -> u64 {
    evaluations
        .into_iter()
        .filter(|evaluation| evaluation.liked)
        .count() as u64
}

/// Filter and order ideas.
///
/// `follower_counts` maps authors to their follower totals; authors absent
/// from the map count as zero. The result is sorted descending by
/// `(likes, avg_score, followers, created_at)`.
pub fn rank_ideas(
    candidates: Vec<Idea>,
    evaluations: &[Evaluation],
    follower_counts: &HashMap<UserId, u64>,
    filter: &IdeaFilter,
) -> Vec<RankedIdea> {
    let mut by_idea: HashMap<IdeaId, Vec<&Evaluation>> = HashMap::new();
    for evaluation in evaluations {
        by_idea.entry(evaluation.idea_id).or_default().push(evaluation);
    }

    let mut ranked: Vec<RankedIdea> = candidates
        .into_iter()
        .filter(|idea| filter.admits_creation_time(idea.created_at))
        .filter_map(|idea| {
            let for_idea = by_idea.get(&idea.id).map(Vec::as_slice).unwrap_or_default();
            let likes = like_count(for_idea.iter().copied());
            if likes < filter.min_likes {
                return None;
            }
            let avg_score = mean_score(for_idea.iter().copied());
            if avg_score < filter.min_score {
                return None;
            }
            let followers = follower_counts
                .get(&idea.created_by)
                .copied()
                .unwrap_or_default();
            if followers < filter.min_followers {
                return None;
            }
            Some(RankedIdea {
                idea,
                likes,
                avg_score,
                followers,
            })
        })
        .collect();

    ranked.sort_by(compare_descending);
    ranked
}

fn compare_descending(a: &RankedIdea, b: &RankedIdea) -> Ordering {
    b.likes
        .cmp(&a.likes)
        .then_with(|| b.avg_score.total_cmp(&a.avg_score))
        .then_with(|| b.followers.cmp(&a.followers))
        .then_with(|| b.idea.created_at.cmp(&a.idea.created_at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EvaluationId, Score};
    use chrono::{Duration, TimeZone};
    use rstest::{fixture, rstest};

    #[fixture]
    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn idea(author: UserId, created_at: DateTime<Utc>) -> Idea {
        Idea {
            id: IdeaId::random(),
            title: "t".to_owned(),
            description: "d".to_owned(),
            market: "m".to_owned(),
            target_audience: "a".to_owned(),
            created_by: author,
            created_at,
        }
    }

    fn evaluation(idea: &Idea, score: Option<i64>, liked: bool) -> Evaluation {
        Evaluation {
            id: EvaluationId::random(),
            idea_id: idea.id,
            user_id: UserId::random(),
            score: score.map(|raw| Score::new(raw).expect("valid score")),
            comment: None,
            liked,
            updated_at: idea.created_at,
        }
    }

    #[rstest]
    #[case(4.0, 4.0)]
    #[case(3.333_333, 3.33)]
    #[case(3.335_000_1, 3.34)]
    #[case(-1.005_000_1, -1.01)]
    fn rounding_is_half_away_from_zero(#[case] input: f64, #[case] expected: f64) {
        assert_eq!(round_to_hundredths(input), expected);
    }

    #[rstest]
    fn three_likes_and_scores_average_to_four(epoch: DateTime<Utc>) {
        let candidate = idea(UserId::random(), epoch);
        let evaluations = vec![
            evaluation(&candidate, Some(4), true),
            evaluation(&candidate, Some(5), true),
            evaluation(&candidate, Some(3), true),
        ];

        let ranked = rank_ideas(
            vec![candidate],
            &evaluations,
            &HashMap::new(),
            &IdeaFilter::default(),
        );

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].likes, 3);
        assert_eq!(ranked[0].avg_score, 4.0);
    }

    #[rstest]
    fn ideas_without_evaluations_score_zero(epoch: DateTime<Utc>) {
        let ranked = rank_ideas(
            vec![idea(UserId::random(), epoch)],
            &[],
            &HashMap::new(),
            &IdeaFilter::default(),
        );
        assert_eq!(ranked[0].likes, 0);
        assert_eq!(ranked[0].avg_score, 0.0);
        assert_eq!(ranked[0].followers, 0);
    }

    #[rstest]
    fn unscored_evaluations_do_not_drag_the_mean(epoch: DateTime<Utc>) {
        let candidate = idea(UserId::random(), epoch);
        let evaluations = vec![
            evaluation(&candidate, Some(5), false),
            evaluation(&candidate, None, true),
        ];
        assert_eq!(mean_score(&evaluations), 5.0);
    }

    #[rstest]
    fn ties_are_broken_by_recency(epoch: DateTime<Utc>) {
        let author = UserId::random();
        let older = idea(author, epoch);
        let newer = idea(author, epoch + Duration::hours(1));
        let mut evaluations = Vec::new();
        for candidate in [&older, &newer] {
            for _ in 0..5 {
                evaluations.push(evaluation(candidate, Some(4), true));
            }
        }
        let followers = HashMap::from([(author, 10)]);

        let ranked = rank_ideas(
            vec![older.clone(), newer.clone()],
            &evaluations,
            &followers,
            &IdeaFilter::default(),
        );

        let order: Vec<IdeaId> = ranked.iter().map(|r| r.idea.id).collect();
        assert_eq!(order, vec![newer.id, older.id]);
        assert!(ranked.iter().all(|r| r.likes == 5 && r.avg_score == 4.0 && r.followers == 10));
    }

    #[rstest]
    fn ordering_prefers_likes_then_score_then_followers(epoch: DateTime<Utc>) {
        let popular_author = UserId::random();
        let quiet_author = UserId::random();
        let most_liked = idea(quiet_author, epoch);
        let best_scored = idea(quiet_author, epoch);
        let best_followed = idea(popular_author, epoch);
        let evaluations = vec![
            evaluation(&most_liked, Some(1), true),
            evaluation(&most_liked, Some(1), true),
            evaluation(&best_scored, Some(5), true),
            evaluation(&best_followed, Some(3), true),
        ];
        let followers = HashMap::from([(popular_author, 50), (quiet_author, 1)]);

        let ranked = rank_ideas(
            vec![best_followed.clone(), best_scored.clone(), most_liked.clone()],
            &evaluations,
            &followers,
            &IdeaFilter::default(),
        );

        let order: Vec<IdeaId> = ranked.iter().map(|r| r.idea.id).collect();
        assert_eq!(order, vec![most_liked.id, best_scored.id, best_followed.id]);
    }

    #[rstest]
    fn thresholds_discard_ideas(epoch: DateTime<Utc>) {
        let author = UserId::random();
        let liked = idea(author, epoch);
        let ignored = idea(author, epoch);
        let evaluations = vec![
            evaluation(&liked, Some(5), true),
            evaluation(&ignored, Some(2), false),
        ];
        let followers = HashMap::from([(author, 3)]);

        let by_likes = rank_ideas(
            vec![liked.clone(), ignored.clone()],
            &evaluations,
            &followers,
            &IdeaFilter {
                min_likes: 1,
                ..IdeaFilter::default()
            },
        );
        assert_eq!(by_likes.len(), 1);
        assert_eq!(by_likes[0].idea.id, liked.id);

        let by_score = rank_ideas(
            vec![liked.clone(), ignored.clone()],
            &evaluations,
            &followers,
            &IdeaFilter {
                min_score: 2.5,
                ..IdeaFilter::default()
            },
        );
        assert_eq!(by_score.len(), 1);

        let by_followers = rank_ideas(
            vec![liked, ignored],
            &evaluations,
            &followers,
            &IdeaFilter {
                min_followers: 4,
                ..IdeaFilter::default()
            },
        );
        assert!(by_followers.is_empty());
    }

    #[rstest]
    fn time_window_is_inclusive(epoch: DateTime<Utc>) {
        let author = UserId::random();
        let before = idea(author, epoch - Duration::seconds(1));
        let at_start = idea(author, epoch);
        let at_end = idea(author, epoch + Duration::days(1));
        let after = idea(author, epoch + Duration::days(1) + Duration::seconds(1));

        let ranked = rank_ideas(
            vec![before, at_start.clone(), at_end.clone(), after],
            &[],
            &HashMap::new(),
            &IdeaFilter {
                min_created_at: Some(epoch),
                max_created_at: Some(epoch + Duration::days(1)),
                ..IdeaFilter::default()
            },
        );

        let mut kept: Vec<IdeaId> = ranked.iter().map(|r| r.idea.id).collect();
        kept.sort();
        let mut expected = vec![at_start.id, at_end.id];
        expected.sort();
        assert_eq!(kept, expected);
    }
}
