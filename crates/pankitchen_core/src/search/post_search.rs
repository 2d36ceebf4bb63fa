//! Post keyword query composer.
//!
//! # Responsibility
//! - Build one id projection per searchable branch (post text, recipe
//!   text, tag names) and union them.
//! - Paginate the deduplicated union, never the individual branches.
//!
//! # Invariants
//! - Matching is a case-insensitive substring test using `fold_case`,
//!   independent of column collation.
//! - Only posts that have a recipe take part in the recipe branch.
//! - A post matching several branches appears once.
//! - An empty keyword matches every post.

use crate::db::FOLD_CASE_FUNCTION;
use crate::model::PostId;
use crate::repo::{Page, RepoResult};
use once_cell::sync::Lazy;
use rusqlite::{named_params, Connection};

/// One searchable branch of the post graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchBranch {
    /// `posts.title`, `posts.description`, `posts.bread_type`.
    PostText,
    /// `recipes.ingredients`, `recipes.instructions`.
    RecipeText,
    /// `tags.name` joined through `post_tags`.
    TagName,
}

impl SearchBranch {
    pub const ALL: [SearchBranch; 3] = [Self::PostText, Self::RecipeText, Self::TagName];

    /// SQL projecting the ids of posts matching `:needle` in this branch.
    fn id_projection(self) -> String {
        let f = FOLD_CASE_FUNCTION;
        match self {
            Self::PostText => format!(
                "SELECT id AS post_id FROM posts
                 WHERE instr({f}(title), :needle) > 0
                    OR instr({f}(description), :needle) > 0
                    OR instr({f}(bread_type), :needle) > 0"
            ),
            Self::RecipeText => format!(
                "SELECT post_id FROM recipes
                 WHERE instr({f}(ingredients), :needle) > 0
                    OR instr({f}(instructions), :needle) > 0"
            ),
            Self::TagName => format!(
                "SELECT pt.post_id FROM post_tags pt
                 INNER JOIN tags t ON t.id = pt.tag_id
                 WHERE instr({f}(t.name), :needle) > 0"
            ),
        }
    }
}

/// Normalized search input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchTerm {
    /// Empty keyword. The empty string is a substring of every text.
    Everything,
    /// Case-folded needle.
    Substring(String),
}

impl SearchTerm {
    /// Folds `keyword` for matching. Whitespace is kept as part of the needle.
    pub fn parse(keyword: &str) -> Self {
        if keyword.is_empty() {
            Self::Everything
        } else {
            Self::Substring(keyword.to_lowercase())
        }
    }
}

static UNION_SEARCH_SQL: Lazy<String> = Lazy::new(|| {
    let union = SearchBranch::ALL
        .iter()
        .map(|branch| branch.id_projection())
        .collect::<Vec<_>>()
        .join("\n UNION \n");
    format!(
        "SELECT id FROM posts
         WHERE id IN ({union})
         ORDER BY id ASC
         LIMIT :limit OFFSET :offset;"
    )
});

/// Returns one page of ids of posts matching `needle` in any branch.
///
/// `needle` must already be case-folded (see [`SearchTerm::parse`]).
pub fn search_post_ids(conn: &Connection, needle: &str, page: Page) -> RepoResult<Vec<PostId>> {
    let mut stmt = conn.prepare_cached(&UNION_SEARCH_SQL)?;
    let ids = stmt
        .query_map(
            named_params! {
                ":needle": needle,
                ":limit": page.limit,
                ":offset": page.offset,
            },
            |row| row.get(0),
        )?
        .collect::<rusqlite::Result<Vec<PostId>>>()?;
    Ok(ids)
}
