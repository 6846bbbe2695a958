use sea_orm::entity::prelude::*;

use crate::models::{ColorList, ImageList, SizeList, VariantList};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub sku: String,
    pub description: Option<String>,
    pub price: i64,
    #[sea_orm(column_type = "JsonBinary")]
    pub images: ImageList,
    #[sea_orm(column_type = "JsonBinary")]
    pub variants: VariantList,
    #[sea_orm(column_type = "JsonBinary")]
    pub sizes: SizeList,
    #[sea_orm(column_type = "JsonBinary")]
    pub colors: ColorList,
    pub fabric: Option<String>,
    pub is_made_to_order: bool,
    pub published: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product_categories::Entity")]
    ProductCategories,
    #[sea_orm(has_many = "super::order_items::Entity")]
    OrderItems,
}

impl Related<super::product_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductCategories.def()
    }
}

impl Related<super::order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        super::product_categories::Relation::Categories.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::product_categories::Relation::Products.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
