//! Post view entity for SeaORM. Append-only counter rows.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use marquee_core::domain::PostView;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "post_views")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub post_id: Uuid,
    pub viewer_ip: String,
    pub viewed_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::post::Entity",
        from = "Column::PostId",
        to = "super::post::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Post,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for PostView {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            post_id: model.post_id,
            viewer_ip: model.viewer_ip,
            viewed_at: model.viewed_at.into(),
        }
    }
}

impl From<PostView> for ActiveModel {
    fn from(view: PostView) -> Self {
        Self {
            id: Set(view.id),
            post_id: Set(view.post_id),
            viewer_ip: Set(view.viewer_ip),
            viewed_at: Set(view.viewed_at.into()),
        }
    }
}
