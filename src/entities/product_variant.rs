use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-size stock record for a product. `quantity` is the only stock signal.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_variants")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub product_id: i32,

    pub size: ProductSize,

    pub quantity: i32,
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

/// Garment sizes carried by the shop.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, DeriveActiveEnum,
    Serialize, Deserialize,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
#[serde(into = "i32", try_from = "i32")]
pub enum ProductSize {
    #[sea_orm(num_value = 48)]
    S48,
    #[sea_orm(num_value = 50)]
    S50,
    #[sea_orm(num_value = 52)]
    S52,
    #[sea_orm(num_value = 54)]
    S54,
    #[sea_orm(num_value = 56)]
    S56,
    #[sea_orm(num_value = 58)]
    S58,
    #[sea_orm(num_value = 60)]
    S60,
}

impl Default for ProductSize {
    fn default() -> Self {
        Self::S48
    }
}

impl ProductSize {
    pub const ALL: [ProductSize; 7] = [
        Self::S48,
        Self::S50,
        Self::S52,
        Self::S54,
        Self::S56,
        Self::S58,
        Self::S60,
    ];

    pub fn as_i32(self) -> i32 {
        match self {
            Self::S48 => 48,
            Self::S50 => 50,
            Self::S52 => 52,
            Self::S54 => 54,
            Self::S56 => 56,
            Self::S58 => 58,
            Self::S60 => 60,
        }
    }
}

impl From<ProductSize> for i32 {
    fn from(size: ProductSize) -> Self {
        size.as_i32()
    }
}

/// Raised for a size outside the carried range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported size {0}")]
pub struct UnknownSize(pub i32);

impl TryFrom<i32> for ProductSize {
    type Error = UnknownSize;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|size| size.as_i32() == value)
            .ok_or(UnknownSize(value))
    }
}

impl fmt::Display for ProductSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_round_trip_through_integers() {
        for size in ProductSize::ALL {
            assert_eq!(ProductSize::try_from(size.as_i32()), Ok(size));
        }
    }

    #[test]
    fn odd_sizes_are_rejected() {
        assert_eq!(ProductSize::try_from(49), Err(UnknownSize(49)));
        assert_eq!(ProductSize::try_from(62), Err(UnknownSize(62)));
    }

    #[test]
    fn size_serializes_as_plain_number() {
        let json = serde_json::to_value(ProductSize::S54).unwrap();
        assert_eq!(json, serde_json::json!(54));
        let parsed: ProductSize = serde_json::from_value(serde_json::json!(58)).unwrap();
        assert_eq!(parsed, ProductSize::S58);
    }
}
