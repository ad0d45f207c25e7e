//! SEO content analysis.
//!
//! A pure function over already-fetched posts: no crawling, nothing is
//! persisted, the report is recomputed on demand.

use serde::{Deserialize, Serialize};

use super::{Post, PostStatus};

/// Excerpts double as meta descriptions; search results favor 120-155 chars.
const EXCERPT_MIN_CHARS: usize = 120;
/// Below this word count content tends to rank poorly.
const CONTENT_MIN_WORDS: usize = 700;
/// Optimal keyword density window, in percent of words.
const DENSITY_OPTIMAL: (f64, f64) = (1.0, 2.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckLevel {
    Pass,
    Warn,
    Fail,
}

/// One qualitative flag in the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeoCheck {
    pub name: String,
    pub level: CheckLevel,
    pub detail: String,
}

/// Meta-content quality report over the published posts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeoReport {
    /// Overall score, 0-100.
    pub score: u8,
    pub published_count: usize,
    pub checks: Vec<SeoCheck>,
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn keyword_density(content: &str, keyword: &str) -> f64 {
    let words = word_count(content);
    if words == 0 {
        return 0.0;
    }
    let keyword = keyword.to_lowercase();
    let hits = content
        .to_lowercase()
        .split_whitespace()
        .filter(|w| w.trim_matches(|c: char| !c.is_alphanumeric()) == keyword)
        .count();
    hits as f64 * 100.0 / words as f64
}

fn ratio_check(name: &str, passing: usize, total: usize, detail: String) -> SeoCheck {
    // With nothing published there is nothing to pass; 0 of 0 is not a pass.
    let level = if total == 0 {
        CheckLevel::Warn
    } else if passing == total {
        CheckLevel::Pass
    } else if passing * 2 >= total {
        CheckLevel::Warn
    } else {
        CheckLevel::Fail
    };
    SeoCheck {
        name: name.to_owned(),
        level,
        detail,
    }
}

/// Analyze the published subset of `posts` for meta-content quality.
///
/// `keyword` enables the keyword checks; without one only the length
/// heuristics and the published-post count contribute.
pub fn analyze(posts: &[Post], keyword: Option<&str>) -> SeoReport {
    let published: Vec<&Post> = posts
        .iter()
        .filter(|p| p.status == PostStatus::Published)
        .collect();
    let total = published.len();

    let mut checks = Vec::new();

    let good_excerpts = published
        .iter()
        .filter(|p| p.excerpt.chars().count() >= EXCERPT_MIN_CHARS)
        .count();
    checks.push(ratio_check(
        "Meta Description",
        good_excerpts,
        total,
        format!(
            "{good_excerpts} of {total} published posts have an excerpt of at \
             least {EXCERPT_MIN_CHARS} characters"
        ),
    ));

    let long_enough = published
        .iter()
        .filter(|p| word_count(&p.content) >= CONTENT_MIN_WORDS)
        .count();
    checks.push(ratio_check(
        "Content Length",
        long_enough,
        total,
        format!(
            "{long_enough} of {total} published posts reach \
             {CONTENT_MIN_WORDS} words"
        ),
    ));

    if let Some(keyword) = keyword.filter(|k| !k.trim().is_empty()) {
        let in_title = published
            .iter()
            .filter(|p| p.title.to_lowercase().contains(&keyword.to_lowercase()))
            .count();
        checks.push(ratio_check(
            "Keyword in Title",
            in_title,
            total,
            format!("'{keyword}' appears in {in_title} of {total} titles"),
        ));

        let optimal_density = published
            .iter()
            .filter(|p| {
                let d = keyword_density(&p.content, keyword);
                (DENSITY_OPTIMAL.0..=DENSITY_OPTIMAL.1).contains(&d)
            })
            .count();
        checks.push(ratio_check(
            "Keyword Density",
            optimal_density,
            total,
            format!(
                "{optimal_density} of {total} posts keep '{keyword}' density \
                 between {:.0}% and {:.0}%",
                DENSITY_OPTIMAL.0, DENSITY_OPTIMAL.1
            ),
        ));
    }

    checks.push(SeoCheck {
        name: "Published Posts".to_owned(),
        level: if total >= 5 {
            CheckLevel::Pass
        } else if total >= 1 {
            CheckLevel::Warn
        } else {
            CheckLevel::Fail
        },
        detail: format!("{total} published posts indexed"),
    });

    let points: u32 = checks
        .iter()
        .map(|c| match c.level {
            CheckLevel::Pass => 100,
            CheckLevel::Warn => 50,
            CheckLevel::Fail => 0,
        })
        .sum();
    let score = (points / checks.len() as u32) as u8;

    SeoReport {
        score,
        published_count: total,
        checks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, PostDraft, PostStatus};
    use uuid::Uuid;

    fn post(status: PostStatus, title: &str, excerpt: &str, content: &str) -> Post {
        Post::new(
            Uuid::new_v4(),
            PostDraft {
                title: title.to_owned(),
                excerpt: excerpt.to_owned(),
                content: content.to_owned(),
                category: Category::Tech,
                image_url: String::new(),
                read_time: None,
                featured: false,
                trending: false,
                popular: false,
                status: Some(status),
                scheduled_date: None,
            },
        )
    }

    #[test]
    fn drafts_are_excluded_from_the_report() {
        let posts = vec![
            post(PostStatus::Draft, "Draft", "", ""),
            post(PostStatus::Published, "Live", "", ""),
        ];
        let report = analyze(&posts, None);
        assert_eq!(report.published_count, 1);
    }

    #[test]
    fn short_excerpts_flag_the_meta_description_check() {
        let posts = vec![post(PostStatus::Published, "Live", "too short", "body")];
        let report = analyze(&posts, None);
        let check = report
            .checks
            .iter()
            .find(|c| c.name == "Meta Description")
            .unwrap();
        assert_eq!(check.level, CheckLevel::Fail);
    }

    #[test]
    fn long_excerpt_passes_meta_description() {
        let posts = vec![post(
            PostStatus::Published,
            "Live",
            &"e".repeat(140),
            "body",
        )];
        let report = analyze(&posts, None);
        let check = report
            .checks
            .iter()
            .find(|c| c.name == "Meta Description")
            .unwrap();
        assert_eq!(check.level, CheckLevel::Pass);
    }

    #[test]
    fn keyword_checks_only_run_with_a_keyword() {
        let posts = vec![post(PostStatus::Published, "Rust news", "", "rust is fast")];

        let without = analyze(&posts, None);
        assert!(!without.checks.iter().any(|c| c.name.starts_with("Keyword")));

        let with = analyze(&posts, Some("rust"));
        let title_check = with
            .checks
            .iter()
            .find(|c| c.name == "Keyword in Title")
            .unwrap();
        assert_eq!(title_check.level, CheckLevel::Pass);
    }

    #[test]
    fn keyword_density_measures_whole_words() {
        // 2 hits in 100 words = 2%, inside the optimal window.
        let body = format!("rust {} rust", "filler ".repeat(98).trim());
        assert!((keyword_density(&body, "rust") - 2.0).abs() < 0.1);
        // substring occurrences do not count
        assert_eq!(keyword_density("trusty crustacean", "rust"), 0.0);
    }

    #[test]
    fn empty_store_scores_zero_published() {
        let report = analyze(&[], None);
        assert_eq!(report.published_count, 0);
        let check = report
            .checks
            .iter()
            .find(|c| c.name == "Published Posts")
            .unwrap();
        assert_eq!(check.level, CheckLevel::Fail);

        // The ratio checks must not pass vacuously over zero posts.
        for name in ["Meta Description", "Content Length"] {
            let check = report.checks.iter().find(|c| c.name == name).unwrap();
            assert_eq!(check.level, CheckLevel::Warn, "{name}");
        }
        assert!(report.score < 50);
    }
}
