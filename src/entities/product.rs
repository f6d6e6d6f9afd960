use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product entity. Owned by a category; listings default to newest first.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub category_id: i32,

    #[sea_orm(unique)]
    pub name: String,

    #[sea_orm(unique, indexed)]
    pub slug: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    #[sea_orm(column_type = "Text")]
    pub detail: String,

    /// Price in the smallest currency unit
    pub price: i64,

    /// Discount percentage, 0..=100
    pub discount: i32,

    /// Stamped once on insert
    pub created_at: DateTime<Utc>,
}

impl Model {
    /// Price after applying the percentage discount, rounded down.
    pub fn new_price(&self) -> i64 {
        effective_price(self.price, self.discount)
    }
}

/// `price - price * discount / 100` with floor division. Discounts above
/// 100 are treated as 100.
pub fn effective_price(price: i64, discount: i32) -> i64 {
    if discount <= 0 {
        return price;
    }
    // The product can exceed i64 for large prices; the result never does.
    let price = i128::from(price);
    let reduced = price - price * i128::from(discount.min(100)) / 100;
    i64::try_from(reduced).unwrap_or_default()
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_delete = "Cascade"
    )]
    Category,
    #[sea_orm(has_many = "super::product_variant::Entity")]
    ProductVariants,
    #[sea_orm(has_many = "super::product_image::Entity")]
    ProductImages,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::product_variant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductVariants.def()
    }
}

impl Related<super::product_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductImages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(1000, 0, 1000)]
    #[case(1000, 20, 800)]
    #[case(1000, 30, 700)]
    #[case(999, 30, 700)]
    #[case(1, 50, 1)]
    #[case(1000, 100, 0)]
    #[case(i64::MAX / 10, 20, 737869762948382064)]
    #[case(i64::MAX, 30, 6456360425798343065)]
    #[case(i64::MAX, 100, 0)]
    fn new_price_applies_floor_discount(
        #[case] price: i64,
        #[case] discount: i32,
        #[case] expected: i64,
    ) {
        assert_eq!(effective_price(price, discount), expected);
    }

    proptest! {
        #[test]
        fn new_price_matches_integer_formula(price in 0i64..=i64::MAX, discount in 0i32..=100) {
            let wide = i128::from(price);
            let expected = (wide - wide * i128::from(discount) / 100) as i64;
            prop_assert_eq!(effective_price(price, discount), expected);
            prop_assert!(effective_price(price, discount) <= price);
            prop_assert!(effective_price(price, discount) >= 0);
        }

        #[test]
        fn zero_discount_keeps_price(price in 0i64..=i64::MAX) {
            prop_assert_eq!(effective_price(price, 0), price);
        }

        #[test]
        fn full_discount_is_free(price in 0i64..=i64::MAX) {
            prop_assert_eq!(effective_price(price, 100), 0);
        }
    }
}
