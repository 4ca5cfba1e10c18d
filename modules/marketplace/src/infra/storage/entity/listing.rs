use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "listings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    /// Price in cents.
    pub price_cents: i64,
    pub category: String,
    pub location: String,
    /// Folded `category`, compared by browse filters.
    pub category_key: String,
    /// Folded `location`, compared by browse filters.
    pub location_key: String,
    /// Folded title and description, searched by free-text filters.
    #[sea_orm(column_type = "Text")]
    pub search_key: String,
    pub condition: Option<String>,
    /// JSON array of image references.
    #[sea_orm(column_type = "Text")]
    pub images: String,
    pub contact_number: Option<String>,
    /// `active` or `sold`.
    pub status: String,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::OwnerId",
        to = "super::account::Column::Id",
        on_delete = "Cascade"
    )]
    Account,
    #[sea_orm(has_many = "super::like::Entity")]
    Like,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl Related<super::like::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Like.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
