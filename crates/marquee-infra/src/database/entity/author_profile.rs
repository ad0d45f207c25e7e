//! Author profile entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use marquee_core::domain::{AuthorProfile, SocialLinks};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "author_profiles")]
pub struct Model {
    /// Keyed by the owning account id, not an independent surrogate key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub avatar: String,
    #[sea_orm(column_type = "Text")]
    pub bio: String,
    pub role: String,
    pub social: Option<Json>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::post::Entity")]
    Post,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for AuthorProfile {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            avatar: model.avatar,
            bio: model.bio,
            role: model.role,
            social: model
                .social
                .and_then(|value| serde_json::from_value::<SocialLinks>(value).ok()),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<AuthorProfile> for ActiveModel {
    fn from(profile: AuthorProfile) -> Self {
        Self {
            id: Set(profile.id),
            name: Set(profile.name),
            avatar: Set(profile.avatar),
            bio: Set(profile.bio),
            role: Set(profile.role),
            social: Set(profile
                .social
                .and_then(|links| serde_json::to_value(links).ok())),
            created_at: Set(profile.created_at.into()),
            updated_at: Set(profile.updated_at.into()),
        }
    }
}
