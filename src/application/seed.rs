//! Initial content inserted into an empty database.

use tracing::info;

use crate::application::repos::{
    CreatePostParams, RepoError, SeedComment, SeedPost, SeedReport, SeedRepo,
};

struct SeedEntry {
    slug: &'static str,
    title: &'static str,
    summary: &'static str,
    body: &'static str,
    category: &'static str,
    comments: &'static [(&'static str, &'static str)],
}

const SEED_ENTRIES: &[SeedEntry] = &[
    SeedEntry {
        slug: "welcome-to-with-risk",
        title: "Welcome to With Risk",
        summary: "What this blog is about and why it exists.",
        body: "Every interesting decision carries some risk. This blog collects notes on \
               taking those decisions deliberately: what we tried, what broke, and what we \
               would do again.",
        category: "meta",
        comments: &[
            ("ada", "Looking forward to the first real post."),
            ("grace", "Subscribed."),
        ],
    },
    SeedEntry {
        slug: "shipping-on-a-friday",
        title: "Shipping on a Friday",
        summary: "A small deploy, a long weekend, and the checklist that came out of it.",
        body: "The change was three lines. The rollback took four hours. Here is the \
               checklist we now run before any release, regardless of the day of the week.",
        category: "engineering",
        comments: &[("linus", "The checklist is the real post here.")],
    },
    SeedEntry {
        slug: "measuring-what-matters",
        title: "Measuring What Matters",
        summary: "Picking metrics that change decisions instead of decorating dashboards.",
        body: "A metric is only useful if a change in its value would change what you do \
               next. Everything else is trivia with a chart attached.",
        category: "product",
        comments: &[],
    },
];

/// The fixed seed batch: a few posts, some with comments.
pub fn seed_batch() -> Vec<SeedPost> {
    SEED_ENTRIES
        .iter()
        .map(|entry| SeedPost {
            post: CreatePostParams {
                slug: entry.slug.to_string(),
                title: entry.title.to_string(),
                summary: entry.summary.to_string(),
                body: entry.body.to_string(),
                category: entry.category.to_string(),
            },
            comments: entry
                .comments
                .iter()
                .map(|(author, body)| SeedComment {
                    author: author.to_string(),
                    body: body.to_string(),
                })
                .collect(),
        })
        .collect()
}

/// Populate the seed content when the database holds no posts yet.
///
/// Safe to call on every start: a non-empty database is left untouched and
/// an empty [`SeedReport`] is returned.
pub async fn seed_data(repo: &dyn SeedRepo) -> Result<SeedReport, RepoError> {
    let report = repo.seed_if_empty(seed_batch()).await?;
    if report.is_empty() {
        info!(target = "withrisk::seed", "existing content found; seeding skipped");
    } else {
        info!(
            target = "withrisk::seed",
            posts = report.posts,
            comments = report.comments,
            "seed content inserted"
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::domain::slug::derive_slug;

    use super::*;

    #[test]
    fn seed_slugs_are_unique_and_derived_from_titles() {
        let batch = seed_batch();
        let slugs: HashSet<_> = batch.iter().map(|entry| entry.post.slug.clone()).collect();
        assert_eq!(slugs.len(), batch.len());
        for entry in &batch {
            assert_eq!(
                derive_slug(&entry.post.title).expect("slug"),
                entry.post.slug
            );
        }
    }

    #[test]
    fn seed_batch_has_comments() {
        let comments: usize = seed_batch().iter().map(|entry| entry.comments.len()).sum();
        assert_eq!(comments, 3);
    }
}
