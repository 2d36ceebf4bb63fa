//! Bread post model with its recipe, photos and tags.
//!
//! # Responsibility
//! - Define the hydrated `Post` read model returned by repositories.
//! - Define create (`NewPost`) and partial update (`PostPatch`) inputs.
//!
//! # Invariants
//! - A post has at most one recipe.
//! - `photos` keep the order they were submitted in.
//! - `tags` hold one entry per distinct tag name.

use super::social::Like;
use super::validation::{require_text, ValidationError};
use super::{PostId, TagId, UserId};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;

/// Fully hydrated post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub description: Option<String>,
    pub bread_type: String,
    /// Serialized as `user_id` to match the wire schema.
    #[serde(rename = "user_id")]
    pub owner_id: UserId,
    pub recipe: Option<Recipe>,
    pub photos: Vec<Photo>,
    pub tags: Vec<Tag>,
    pub likes: Vec<Like>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub post_id: PostId,
    pub ingredients: String,
    pub instructions: String,
    /// Free text such as "2 hours at room temperature".
    pub fermentation_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub id: i64,
    pub post_id: PostId,
    /// Location returned by the file-storage collaborator. Not validated.
    pub url: String,
    /// Display rank chosen by the client. Stored as given.
    pub order: i64,
}

/// Shared tag. Rows are reused by exact name and never deleted by post writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecipe {
    pub ingredients: String,
    pub instructions: String,
    #[serde(default)]
    pub fermentation_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPhoto {
    pub url: String,
    pub order: i64,
}

impl NewPhoto {
    pub fn new(url: impl Into<String>, order: i64) -> Self {
        Self {
            url: url.into(),
            order,
        }
    }
}

/// Create input for one post and all of its children.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub bread_type: String,
    #[serde(default)]
    pub recipe: Option<NewRecipe>,
    #[serde(default)]
    pub photos: Vec<NewPhoto>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewPost {
    pub fn new(title: impl Into<String>, bread_type: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            bread_type: bread_type.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)?;
        require_text("bread_type", &self.bread_type)?;
        if let Some(recipe) = &self.recipe {
            validate_recipe_text(Some(&recipe.ingredients), Some(&recipe.instructions))?;
        }
        validate_photos(&self.photos)?;
        validate_tags(&self.tags)?;
        Ok(())
    }
}

/// Field-level partial update of a recipe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipePatch {
    #[serde(default)]
    pub ingredients: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
    /// `Some(None)` clears the stored value.
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub fermentation_time: Option<Option<String>>,
}

/// Partial update of a post.
///
/// `None` leaves a field untouched. For `photos` and `tags`, `Some(list)`
/// replaces the whole set, so `Some(vec![])` clears it. Nullable columns
/// use `Option<Option<_>>`: an explicit `null` arrives as `Some(None)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub bread_type: Option<String>,
    #[serde(default)]
    pub recipe: Option<RecipePatch>,
    #[serde(default)]
    pub photos: Option<Vec<NewPhoto>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl PostPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            require_text("title", title)?;
        }
        if let Some(bread_type) = &self.bread_type {
            require_text("bread_type", bread_type)?;
        }
        if let Some(recipe) = &self.recipe {
            validate_recipe_text(recipe.ingredients.as_deref(), recipe.instructions.as_deref())?;
        }
        if let Some(photos) = &self.photos {
            validate_photos(photos)?;
        }
        if let Some(tags) = &self.tags {
            validate_tags(tags)?;
        }
        Ok(())
    }
}

/// Maps a present field to `Some`, keeping `null` as `Some(None)`.
/// Absent fields never reach this and fall back to `None` via `default`.
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Drops repeated tag names, keeping the first occurrence of each.
pub fn distinct_tag_names(tags: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    tags.iter()
        .map(String::as_str)
        .filter(|name| seen.insert(*name))
        .collect()
}

fn validate_recipe_text(
    ingredients: Option<&str>,
    instructions: Option<&str>,
) -> Result<(), ValidationError> {
    if let Some(value) = ingredients {
        require_text("recipe.ingredients", value)?;
    }
    if let Some(value) = instructions {
        require_text("recipe.instructions", value)?;
    }
    Ok(())
}

fn validate_photos(photos: &[NewPhoto]) -> Result<(), ValidationError> {
    for photo in photos {
        require_text("photos.url", &photo.url)?;
    }
    Ok(())
}

fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    for tag in tags {
        require_text("tags.name", tag)?;
    }
    Ok(())
}
