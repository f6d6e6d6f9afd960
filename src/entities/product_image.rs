use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product image with a source slot and two derived renditions.
///
/// `image_medium` and `image_small` are only ever written together with
/// `image_large`, by the store's image commit path.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_images")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub product_id: i32,

    pub image_large: Option<String>,
    pub image_medium: Option<String>,
    pub image_small: Option<String>,

    pub sort: i32,
}

impl Model {
    /// Storage keys of every populated slot.
    pub fn stored_keys(&self) -> Vec<String> {
        [&self.image_large, &self.image_medium, &self.image_small]
            .into_iter()
            .flatten()
            .cloned()
            .collect()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id",
        on_delete = "Cascade"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
