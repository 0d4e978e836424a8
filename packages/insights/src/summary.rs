//! Descriptive clause generation from ranked outliers.
//!
//! Takes the most extreme subcategory per category (rank 1), orders by
//! descending outlier score, and phrases the top entries through a fixed
//! per-category rule table. Residents of the tract are described as
//! likely to "<clause>", so every clause reads as a verb phrase.

use location_insights_insights_models::{AffinityRecord, Category, OutlierRecord};

/// Default number of clauses in a summary.
pub const DEFAULT_TOP_N: usize = 4;

/// Builds descriptive clauses from a tract's outlier rows.
///
/// Filters to `rank == 1`, sorts by descending score (stable, so the
/// original row order breaks ties), takes `top_n`, and phrases each row.
/// Rows without a phrasing rule, and age-group rows that fail to parse,
/// are dropped rather than failing the request — the result may hold
/// fewer than `top_n` clauses, down to none at all.
#[must_use]
pub fn summarize(outliers: &[OutlierRecord], top_n: usize) -> Vec<String> {
    let mut extremes: Vec<&OutlierRecord> =
        outliers.iter().filter(|o| o.rank == 1).collect();
    extremes.sort_by(|a, b| b.score.total_cmp(&a.score));

    extremes.into_iter().take(top_n).filter_map(clause).collect()
}

/// Returns the strongest local affinity: lowest rank, ties broken by
/// row order.
#[must_use]
pub fn top_affinity(affinities: &[AffinityRecord]) -> Option<&AffinityRecord> {
    affinities.iter().min_by_key(|a| a.rank)
}

/// Phrases one outlier row, or `None` when the category has no rule or
/// the subcategory cannot be parsed.
fn clause(record: &OutlierRecord) -> Option<String> {
    let sub = record.subcategory.as_str();
    match &record.category {
        Category::Language => {
            // Subcategories look like "LANG-Spanish"; keep the text after
            // the first hyphen.
            let name = sub.split_once('-').map_or(sub, |(_, rest)| rest);
            Some(format!("speak {name}"))
        }
        Category::Religion => Some(format!("identify as {}", capitalize(sub))),
        Category::DwellingType => Some(format!(
            "live in a {}",
            sub.to_lowercase().replace('_', " ")
        )),
        Category::EthnicGroup => Some(format!("have a {} background", capitalize(sub))),
        Category::AgeGroup => age_group_clause(record),
        Category::NetWorth => Some(format!("have a {}", sub.to_lowercase())),
        Category::Income => Some(format!("have an {}", sub.to_lowercase())),
        Category::Education => Some(format!("have an education at {sub} level")),
        Category::Other(_) => None,
    }
}

/// Parses an age-group subcategory like `AGE_GROUP_25_34` into its
/// numeric bounds. Malformed subcategories skip the clause; a single
/// optional clause is never worth failing the request.
fn age_group_clause(record: &OutlierRecord) -> Option<String> {
    let tokens: Vec<&str> = record.subcategory.split('_').collect();
    if tokens.len() < 4 {
        log::debug!(
            "Skipping age-group clause for '{}': expected at least 4 tokens",
            record.subcategory
        );
        return None;
    }

    let (Ok(start), Ok(end)) = (tokens[2].parse::<i64>(), tokens[3].parse::<i64>()) else {
        log::debug!(
            "Skipping age-group clause for '{}': non-numeric bounds",
            record.subcategory
        );
        return None;
    };

    Some(format!("be part of age group {start} to {end}"))
}

/// Uppercases the first character and lowercases the rest.
fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
    })
}

#[cfg(test)]
mod tests {
    use location_insights_insights_models::WinsorizedBucket;

    use super::*;

    fn outlier(category: Category, subcategory: &str, rank: u32, score: f64) -> OutlierRecord {
        OutlierRecord {
            tract_id: "T7".to_string(),
            category,
            subcategory: subcategory.to_string(),
            rank,
            score,
            description: String::new(),
            bucket: WinsorizedBucket::High,
        }
    }

    #[test]
    fn orders_by_descending_score() {
        let outliers = vec![
            outlier(Category::Income, "HIGH", 1, 8.5),
            outlier(Category::Education, "GRADUATE", 1, 9.1),
        ];
        let summary = summarize(&outliers, 4);
        assert_eq!(
            summary,
            vec![
                "have an education at GRADUATE level".to_string(),
                "have an high".to_string(),
            ]
        );
    }

    #[test]
    fn only_rank_one_rows_qualify() {
        let outliers = vec![
            outlier(Category::Income, "HIGH", 1, 8.5),
            outlier(Category::Income, "MEDIUM", 2, 9.9),
        ];
        let summary = summarize(&outliers, 4);
        assert_eq!(summary, vec!["have an high".to_string()]);
    }

    #[test]
    fn truncates_to_top_n() {
        let outliers = vec![
            outlier(Category::Income, "HIGH", 1, 9.0),
            outlier(Category::Education, "GRADUATE", 1, 8.0),
            outlier(Category::Religion, "CATHOLIC", 1, 7.0),
        ];
        assert_eq!(summarize(&outliers, 2).len(), 2);
    }

    #[test]
    fn tolerates_empty_and_short_inputs() {
        assert!(summarize(&[], 4).is_empty());
        let one = vec![outlier(Category::NetWorth, "HIGH_NET_WORTH", 1, 5.0)];
        assert_eq!(summarize(&one, 4), vec!["have a high_net_worth".to_string()]);
    }

    #[test]
    fn phrases_every_mapped_category() {
        let cases = [
            (Category::Language, "LANG-Spanish", "speak Spanish"),
            (Category::Religion, "CATHOLIC", "identify as Catholic"),
            (
                Category::DwellingType,
                "SINGLE_FAMILY",
                "live in a single family",
            ),
            (
                Category::EthnicGroup,
                "ITALIAN",
                "have a Italian background",
            ),
            (
                Category::AgeGroup,
                "AGE_GROUP_25_34",
                "be part of age group 25 to 34",
            ),
            (Category::NetWorth, "MODEST", "have a modest"),
            (Category::Income, "HIGH", "have an high"),
            (
                Category::Education,
                "GRADUATE",
                "have an education at GRADUATE level",
            ),
        ];
        for (category, subcategory, expected) in cases {
            let summary = summarize(&[outlier(category, subcategory, 1, 1.0)], 1);
            assert_eq!(summary, vec![expected.to_string()]);
        }
    }

    #[test]
    fn language_without_hyphen_keeps_whole_subcategory() {
        let summary = summarize(&[outlier(Category::Language, "Tagalog", 1, 1.0)], 1);
        assert_eq!(summary, vec!["speak Tagalog".to_string()]);
    }

    #[test]
    fn malformed_age_group_is_skipped_not_fatal() {
        let outliers = vec![
            outlier(Category::AgeGroup, "AGE_GROUP", 1, 9.0),
            outlier(Category::AgeGroup, "AGE_GROUP_X_Y", 1, 8.0),
            outlier(Category::Income, "HIGH", 1, 7.0),
        ];
        let summary = summarize(&outliers, 4);
        assert_eq!(summary, vec!["have an high".to_string()]);
    }

    #[test]
    fn unmapped_categories_produce_no_clause() {
        let outliers = vec![
            outlier(Category::Other("PET_OWNERSHIP".to_string()), "DOGS", 1, 9.9),
            outlier(Category::Income, "HIGH", 1, 1.0),
        ];
        let summary = summarize(&outliers, 4);
        assert_eq!(summary, vec!["have an high".to_string()]);
    }

    #[test]
    fn top_affinity_prefers_lowest_rank_then_row_order() {
        let affinities = vec![
            AffinityRecord {
                tract_id: "T7".to_string(),
                entity: "Harbor Coffee".to_string(),
                entity_kind: "RETAILER".to_string(),
                rank: 1,
                boost: 2.6,
            },
            AffinityRecord {
                tract_id: "T7".to_string(),
                entity: "Jazz Collective".to_string(),
                entity_kind: "MUSICIAN".to_string(),
                rank: 1,
                boost: 1.8,
            },
        ];
        assert_eq!(top_affinity(&affinities).unwrap().entity, "Harbor Coffee");
        assert!(top_affinity(&[]).is_none());
    }
}
