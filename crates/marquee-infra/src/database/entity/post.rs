//! Post entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use marquee_core::domain;

/// Editorial category, stored as lowercase text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum Category {
    #[sea_orm(string_value = "movie")]
    Movie,
    #[sea_orm(string_value = "game")]
    Game,
    #[sea_orm(string_value = "tech")]
    Tech,
    #[sea_orm(string_value = "series")]
    Series,
    #[sea_orm(string_value = "comics")]
    Comics,
}

/// Lifecycle status, stored as lowercase text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum Status {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "published")]
    Published,
    #[sea_orm(string_value = "scheduled")]
    Scheduled,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub excerpt: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub category: Category,
    pub image_url: String,
    pub author_id: Uuid,
    pub date: DateTimeWithTimeZone,
    pub read_time: i32,
    pub featured: bool,
    pub trending: bool,
    pub popular: bool,
    pub status: Status,
    pub scheduled_date: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::author_profile::Entity",
        from = "Column::AuthorId",
        to = "super::author_profile::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    AuthorProfile,
}

impl Related<super::author_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuthorProfile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Category> for domain::Category {
    fn from(value: Category) -> Self {
        match value {
            Category::Movie => domain::Category::Movie,
            Category::Game => domain::Category::Game,
            Category::Tech => domain::Category::Tech,
            Category::Series => domain::Category::Series,
            Category::Comics => domain::Category::Comics,
        }
    }
}

impl From<domain::Category> for Category {
    fn from(value: domain::Category) -> Self {
        match value {
            domain::Category::Movie => Category::Movie,
            domain::Category::Game => Category::Game,
            domain::Category::Tech => Category::Tech,
            domain::Category::Series => Category::Series,
            domain::Category::Comics => Category::Comics,
        }
    }
}

impl From<Status> for domain::PostStatus {
    fn from(value: Status) -> Self {
        match value {
            Status::Draft => domain::PostStatus::Draft,
            Status::Published => domain::PostStatus::Published,
            Status::Scheduled => domain::PostStatus::Scheduled,
        }
    }
}

impl From<domain::PostStatus> for Status {
    fn from(value: domain::PostStatus) -> Self {
        match value {
            domain::PostStatus::Draft => Status::Draft,
            domain::PostStatus::Published => Status::Published,
            domain::PostStatus::Scheduled => Status::Scheduled,
        }
    }
}

/// Conversion from SeaORM Model to domain Post.
impl From<Model> for domain::Post {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            excerpt: model.excerpt,
            content: model.content,
            category: model.category.into(),
            image_url: model.image_url,
            author_id: model.author_id,
            date: model.date.into(),
            read_time: model.read_time,
            featured: model.featured,
            trending: model.trending,
            popular: model.popular,
            status: model.status.into(),
            scheduled_date: model.scheduled_date.map(Into::into),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

/// Conversion from domain Post to SeaORM ActiveModel.
impl From<domain::Post> for ActiveModel {
    fn from(post: domain::Post) -> Self {
        Self {
            id: Set(post.id),
            title: Set(post.title),
            excerpt: Set(post.excerpt),
            content: Set(post.content),
            category: Set(post.category.into()),
            image_url: Set(post.image_url),
            author_id: Set(post.author_id),
            date: Set(post.date.into()),
            read_time: Set(post.read_time),
            featured: Set(post.featured),
            trending: Set(post.trending),
            popular: Set(post.popular),
            status: Set(post.status.into()),
            scheduled_date: Set(post.scheduled_date.map(Into::into)),
            created_at: Set(post.created_at.into()),
            updated_at: Set(post.updated_at.into()),
        }
    }
}
