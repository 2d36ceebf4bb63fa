//! Post repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Create, read, update and delete posts together with their recipe,
//!   photos and tag links.
//! - Hydrate the full `Post` read model.
//!
//! # Invariants
//! - Every write runs in one savepoint: a failure at any step leaves no
//!   partial post, recipe, photo or tag link behind.
//! - Tags are resolved by exact name and created on first use; tag rows
//!   are never deleted here.
//! - Photo and tag updates replace the whole set.
//! - Deleting a post removes its recipe, photos, tag links and likes
//!   before the post row.
//! - List order is creation order (`id ASC`).

use crate::db::UnitOfWork;
use crate::model::post::{
    distinct_tag_names, NewPhoto, NewPost, NewRecipe, Photo, Post, PostPatch, Recipe,
    RecipePatch, Tag,
};
use crate::model::social::Like;
use crate::model::validation::ValidationError;
use crate::model::{PostId, TagId, UserId};
use crate::repo::user_repo::user_exists;
use crate::repo::{Page, RepoError, RepoResult};
use crate::search::post_search::{search_post_ids, SearchTerm};
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension, Row};

const POST_SELECT_SQL: &str = "SELECT id, title, description, bread_type, user_id FROM posts";

/// Repository interface for bread posts.
pub trait PostRepository {
    /// Inserts a post and all of its children in one step.
    fn create_post(&mut self, owner_id: UserId, post: &NewPost) -> RepoResult<Post>;
    fn get_post(&self, post_id: PostId) -> RepoResult<Option<Post>>;
    fn list_posts_by_user(&self, user_id: UserId, page: Page) -> RepoResult<Vec<Post>>;
    fn list_all_posts(&self, page: Page) -> RepoResult<Vec<Post>>;
    /// Applies a partial update. Returns `None` when the post does not exist.
    fn update_post(&mut self, post_id: PostId, patch: &PostPatch) -> RepoResult<Option<Post>>;
    /// Deletes a post and its children. Returns `false` when it does not exist.
    fn delete_post(&mut self, post_id: PostId) -> RepoResult<bool>;
    /// Case-insensitive substring search over post, recipe and tag text.
    fn search_posts(&self, keyword: &str, page: Page) -> RepoResult<Vec<Post>>;
}

/// SQLite-backed post repository bound to one unit of work.
pub struct SqlitePostRepository<'u, 'conn> {
    uow: &'u mut UnitOfWork<'conn>,
}

impl<'u, 'conn> SqlitePostRepository<'u, 'conn> {
    pub fn new(uow: &'u mut UnitOfWork<'conn>) -> Self {
        Self { uow }
    }
}

impl PostRepository for SqlitePostRepository<'_, '_> {
    fn create_post(&mut self, owner_id: UserId, post: &NewPost) -> RepoResult<Post> {
        post.validate()?;

        let created = self.uow.atomic(|conn| {
            if !user_exists(conn, owner_id)? {
                return Err(RepoError::InvalidArgument(ValidationError::UnknownUser(
                    owner_id,
                )));
            }

            conn.execute(
                "INSERT INTO posts (title, description, bread_type, user_id)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    post.title.as_str(),
                    post.description.as_deref(),
                    post.bread_type.as_str(),
                    owner_id,
                ],
            )?;
            let post_id = conn.last_insert_rowid();

            if let Some(recipe) = &post.recipe {
                insert_recipe(conn, post_id, recipe)?;
            }
            insert_photos(conn, post_id, &post.photos)?;
            link_tags(conn, post_id, &post.tags)?;

            require_post(conn, post_id)
        })?;

        info!(
            "event=post_create module=repo status=ok post_id={} photos={} tags={} recipe={}",
            created.id,
            created.photos.len(),
            created.tags.len(),
            created.recipe.is_some()
        );
        Ok(created)
    }

    fn get_post(&self, post_id: PostId) -> RepoResult<Option<Post>> {
        load_post(self.uow.connection(), post_id)
    }

    fn list_posts_by_user(&self, user_id: UserId, page: Page) -> RepoResult<Vec<Post>> {
        let conn = self.uow.connection();
        let mut stmt = conn.prepare(&format!(
            "{POST_SELECT_SQL}
             WHERE user_id = ?1
             ORDER BY id ASC
             LIMIT ?2 OFFSET ?3;"
        ))?;
        let rows = stmt
            .query_map(params![user_id, page.limit, page.offset], parse_post_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        hydrate_all(conn, rows)
    }

    fn list_all_posts(&self, page: Page) -> RepoResult<Vec<Post>> {
        let conn = self.uow.connection();
        let mut stmt = conn.prepare(&format!(
            "{POST_SELECT_SQL}
             ORDER BY id ASC
             LIMIT ?1 OFFSET ?2;"
        ))?;
        let rows = stmt
            .query_map(params![page.limit, page.offset], parse_post_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        hydrate_all(conn, rows)
    }

    fn update_post(&mut self, post_id: PostId, patch: &PostPatch) -> RepoResult<Option<Post>> {
        patch.validate()?;

        let updated = self.uow.atomic(|conn| {
            let Some(current) = load_post_row(conn, post_id)? else {
                return Ok(None);
            };

            conn.execute(
                "UPDATE posts
                 SET title = ?1, description = ?2, bread_type = ?3
                 WHERE id = ?4;",
                params![
                    patch.title.as_deref().unwrap_or(&current.title),
                    match &patch.description {
                        Some(description) => description.as_deref(),
                        None => current.description.as_deref(),
                    },
                    patch.bread_type.as_deref().unwrap_or(&current.bread_type),
                    post_id,
                ],
            )?;

            if let Some(recipe) = &patch.recipe {
                upsert_recipe(conn, post_id, recipe)?;
            }

            if let Some(photos) = &patch.photos {
                conn.execute("DELETE FROM photos WHERE post_id = ?1;", [post_id])?;
                insert_photos(conn, post_id, photos)?;
            }

            if let Some(tags) = &patch.tags {
                conn.execute("DELETE FROM post_tags WHERE post_id = ?1;", [post_id])?;
                link_tags(conn, post_id, tags)?;
            }

            require_post(conn, post_id).map(Some)
        })?;

        if updated.is_some() {
            info!("event=post_update module=repo status=ok post_id={post_id}");
        }
        Ok(updated)
    }

    fn delete_post(&mut self, post_id: PostId) -> RepoResult<bool> {
        let deleted = self.uow.atomic(|conn| {
            if load_post_row(conn, post_id)?.is_none() {
                return Ok::<_, RepoError>(false);
            }

            let recipes = conn.execute("DELETE FROM recipes WHERE post_id = ?1;", [post_id])?;
            let photos = conn.execute("DELETE FROM photos WHERE post_id = ?1;", [post_id])?;
            let links = conn.execute("DELETE FROM post_tags WHERE post_id = ?1;", [post_id])?;
            let likes = conn.execute("DELETE FROM likes WHERE post_id = ?1;", [post_id])?;
            conn.execute("DELETE FROM posts WHERE id = ?1;", [post_id])?;

            debug!(
                "event=post_delete_cascade module=repo post_id={post_id} recipes={recipes} photos={photos} tag_links={links} likes={likes}"
            );
            Ok(true)
        })?;

        if deleted {
            info!("event=post_delete module=repo status=ok post_id={post_id}");
        }
        Ok(deleted)
    }

    fn search_posts(&self, keyword: &str, page: Page) -> RepoResult<Vec<Post>> {
        let conn = self.uow.connection();
        let ids = match SearchTerm::parse(keyword) {
            SearchTerm::Everything => {
                let mut stmt =
                    conn.prepare("SELECT id FROM posts ORDER BY id ASC LIMIT ?1 OFFSET ?2;")?;
                let ids = stmt
                    .query_map(params![page.limit, page.offset], |row| row.get(0))?
                    .collect::<rusqlite::Result<Vec<PostId>>>()?;
                ids
            }
            SearchTerm::Substring(needle) => search_post_ids(conn, &needle, page)?,
        };

        let mut posts = Vec::with_capacity(ids.len());
        for id in ids {
            posts.push(require_post(conn, id)?);
        }
        Ok(posts)
    }
}

/// Scalar columns of one `posts` row.
#[derive(Debug)]
struct PostRow {
    id: PostId,
    title: String,
    description: Option<String>,
    bread_type: String,
    owner_id: UserId,
}

fn parse_post_row(row: &Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        bread_type: row.get("bread_type")?,
        owner_id: row.get("user_id")?,
    })
}

fn load_post_row(conn: &Connection, post_id: PostId) -> RepoResult<Option<PostRow>> {
    let row = conn
        .query_row(
            &format!("{POST_SELECT_SQL} WHERE id = ?1;"),
            [post_id],
            parse_post_row,
        )
        .optional()?;
    Ok(row)
}

fn load_post(conn: &Connection, post_id: PostId) -> RepoResult<Option<Post>> {
    match load_post_row(conn, post_id)? {
        Some(row) => hydrate(conn, row).map(Some),
        None => Ok(None),
    }
}

fn require_post(conn: &Connection, post_id: PostId) -> RepoResult<Post> {
    load_post(conn, post_id)?
        .ok_or_else(|| RepoError::InvalidData(format!("post {post_id} vanished during read-back")))
}

fn hydrate_all(conn: &Connection, rows: Vec<PostRow>) -> RepoResult<Vec<Post>> {
    rows.into_iter().map(|row| hydrate(conn, row)).collect()
}

fn hydrate(conn: &Connection, row: PostRow) -> RepoResult<Post> {
    let recipe = conn
        .query_row(
            "SELECT id, post_id, ingredients, instructions, fermentation_time
             FROM recipes
             WHERE post_id = ?1;",
            [row.id],
            |r| {
                Ok(Recipe {
                    id: r.get("id")?,
                    post_id: r.get("post_id")?,
                    ingredients: r.get("ingredients")?,
                    instructions: r.get("instructions")?,
                    fermentation_time: r.get("fermentation_time")?,
                })
            },
        )
        .optional()?;

    let mut stmt = conn.prepare(
        "SELECT id, post_id, url, \"order\"
         FROM photos
         WHERE post_id = ?1
         ORDER BY id ASC;",
    )?;
    let photos = stmt
        .query_map([row.id], |r| {
            Ok(Photo {
                id: r.get("id")?,
                post_id: r.get("post_id")?,
                url: r.get("url")?,
                order: r.get("order")?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut stmt = conn.prepare(
        "SELECT t.id, t.name
         FROM post_tags pt
         INNER JOIN tags t ON t.id = pt.tag_id
         WHERE pt.post_id = ?1
         ORDER BY pt.rowid ASC;",
    )?;
    let tags = stmt
        .query_map([row.id], |r| {
            Ok(Tag {
                id: r.get(0)?,
                name: r.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut stmt = conn.prepare(
        "SELECT id, user_id, post_id
         FROM likes
         WHERE post_id = ?1
         ORDER BY id ASC;",
    )?;
    let likes = stmt
        .query_map([row.id], |r| {
            Ok(Like {
                id: r.get("id")?,
                user_id: r.get("user_id")?,
                post_id: r.get("post_id")?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(Post {
        id: row.id,
        title: row.title,
        description: row.description,
        bread_type: row.bread_type,
        owner_id: row.owner_id,
        recipe,
        photos,
        tags,
        likes,
    })
}

fn insert_recipe(conn: &Connection, post_id: PostId, recipe: &NewRecipe) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO recipes (post_id, ingredients, instructions, fermentation_time)
         VALUES (?1, ?2, ?3, ?4);",
        params![
            post_id,
            recipe.ingredients.as_str(),
            recipe.instructions.as_str(),
            recipe.fermentation_time.as_deref(),
        ],
    )?;
    Ok(())
}

/// Patches the existing recipe field by field, or creates one.
///
/// Creating requires both `ingredients` and `instructions`.
fn upsert_recipe(conn: &Connection, post_id: PostId, patch: &RecipePatch) -> RepoResult<()> {
    let fermentation_time = patch.fermentation_time.as_ref();
    let changed = conn.execute(
        "UPDATE recipes
         SET
            ingredients = COALESCE(?1, ingredients),
            instructions = COALESCE(?2, instructions),
            fermentation_time = CASE WHEN ?3 THEN ?4 ELSE fermentation_time END
         WHERE post_id = ?5;",
        params![
            patch.ingredients.as_deref(),
            patch.instructions.as_deref(),
            fermentation_time.is_some(),
            fermentation_time.and_then(|value| value.as_deref()),
            post_id,
        ],
    )?;
    if changed > 0 {
        return Ok(());
    }

    let ingredients = patch
        .ingredients
        .clone()
        .ok_or(ValidationError::BlankField("recipe.ingredients"))?;
    let instructions = patch
        .instructions
        .clone()
        .ok_or(ValidationError::BlankField("recipe.instructions"))?;
    insert_recipe(
        conn,
        post_id,
        &NewRecipe {
            ingredients,
            instructions,
            fermentation_time: patch.fermentation_time.clone().flatten(),
        },
    )
}

fn insert_photos(conn: &Connection, post_id: PostId, photos: &[NewPhoto]) -> RepoResult<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO photos (post_id, url, \"order\")
         VALUES (?1, ?2, ?3);",
    )?;
    for photo in photos {
        stmt.execute(params![post_id, photo.url.as_str(), photo.order])?;
    }
    Ok(())
}

fn link_tags(conn: &Connection, post_id: PostId, tags: &[String]) -> RepoResult<()> {
    for name in distinct_tag_names(tags) {
        let tag_id = find_or_create_tag(conn, name)?;
        conn.execute(
            "INSERT INTO post_tags (post_id, tag_id) VALUES (?1, ?2);",
            params![post_id, tag_id],
        )?;
    }
    Ok(())
}

fn find_or_create_tag(conn: &Connection, name: &str) -> RepoResult<TagId> {
    conn.execute("INSERT OR IGNORE INTO tags (name) VALUES (?1);", [name])?;
    let tag_id = conn.query_row("SELECT id FROM tags WHERE name = ?1;", [name], |row| {
        row.get(0)
    })?;
    Ok(tag_id)
}
