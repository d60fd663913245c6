//! Group entity for post communities.

use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue;
use serde::{Deserialize, Serialize};

/// Maximum length of a group title and of its slug.
pub const HEADER_LENGTH: usize = 200;

/// Group entity - a community posts can be filed under.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "group")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Group title.
    pub title: String,

    /// URL-safe unique short name.
    #[sea_orm(unique)]
    pub slug: String,

    /// What the group is about.
    #[sea_orm(column_type = "Text")]
    pub description: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::post::Entity")]
    Posts,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Posts.def()
    }
}

/// Derive a slug from a group title.
///
/// Transliterates to ASCII, lower-cases, joins words with `-` and truncates
/// to [`HEADER_LENGTH`] characters. Returns an empty string when the title
/// has nothing to transliterate.
#[must_use]
pub fn derive_slug(title: &str) -> String {
    let slug = slug::slugify(title);
    match slug.char_indices().nth(HEADER_LENGTH) {
        Some((idx, _)) => slug[..idx].trim_end_matches('-').to_string(),
        None => slug,
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if !insert {
            return Ok(self);
        }

        let has_slug = matches!(
            &self.slug,
            ActiveValue::Set(slug) | ActiveValue::Unchanged(slug) if !slug.is_empty()
        );
        if has_slug {
            return Ok(self);
        }

        let derived = match &self.title {
            ActiveValue::Set(title) | ActiveValue::Unchanged(title) => derive_slug(title),
            ActiveValue::NotSet => {
                return Err(DbErr::Custom("group title is required".to_string()));
            }
        };
        if derived.is_empty() {
            return Err(DbErr::Custom(
                "could not derive a slug from the group title".to_string(),
            ));
        }

        self.slug = ActiveValue::Set(derived);
        Ok(self)
    }
}
