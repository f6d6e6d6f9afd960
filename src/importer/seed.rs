//! Categories the shop has always carried. The importer recreates exactly
//! these, with these ids, before loading legacy products.

use crate::services::NewCategory;

#[derive(Debug, Clone, Copy)]
pub struct SeedCategory {
    pub id: i32,
    pub name: &'static str,
    pub description: &'static str,
    pub slug: &'static str,
    pub sort: i32,
}

impl SeedCategory {
    pub fn to_new_category(&self) -> NewCategory {
        NewCategory {
            id: Some(self.id),
            name: self.name.to_string(),
            description: self.description.to_string(),
            slug: self.slug.to_string(),
            sort: self.sort,
        }
    }
}

pub const CATALOG_CATEGORIES: [SeedCategory; 7] = [
    SeedCategory {
        id: 1,
        name: "Блузки и Жакеты",
        description: "В данной категории нашего интернет-магазина Вы можете найти блузки и жакеты \
                      российского и белорусского производства. Доставка почтой наложенным платежом.",
        slug: "bluzki-i-jaketyi",
        sort: 1,
    },
    SeedCategory {
        id: 2,
        name: "Юбки",
        description: "Наш интернет-магазин предлагаем Вам женские юбки от 50 до 58 размера. \
                      Мы отправляем заказы почтой без предоплаты.",
        slug: "yubki",
        sort: 3,
    },
    SeedCategory {
        id: 3,
        name: "Белорусские костюмы",
        description: "В данной категории нашего интернет-магазина Вы найдете женские костюмы \
                      белорусских производителей от 50 до 58 размера. Мы отправляем заказы \
                      наложенным платежом.",
        slug: "belorusskie-kostyumyi",
        sort: 4,
    },
    SeedCategory {
        id: 4,
        name: "Белорусские платья",
        description: "Данная категория нашего интернет-магазина содержит платья белорусского \
                      производства для праздника и повседневной жизни. Мы отправляем заказы \
                      без предоплаты.",
        slug: "belorusskie-platya",
        sort: 5,
    },
    SeedCategory {
        id: 5,
        name: "Российские платья",
        description: "В данной категории нашего интернет-магазина Вы можете найти платья от \
                      российских производителей. Мы отправляем заказы наложенным платежом по \
                      всей России.",
        slug: "rossiyskie-platya",
        sort: 6,
    },
    SeedCategory {
        id: 6,
        name: "Брюки",
        description: "В данной категории нашего интернет-магазина представлены женские брюки \
                      от 50 до 58 размера. Мы отправляем заказы почтой без предоплаты.",
        slug: "bryuki",
        sort: 2,
    },
    SeedCategory {
        id: 7,
        name: "Верхняя одежда",
        description: "В данной категории мы предлагаем Вам женские куртки, пальто и плащи от 50 \
                      до 58 размера по приятным ценам без предоплаты.",
        slug: "verhnyaya-odejda",
        sort: 7,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use validator::Validate;

    #[test]
    fn seed_categories_are_unique_and_valid() {
        let ids: HashSet<_> = CATALOG_CATEGORIES.iter().map(|c| c.id).collect();
        let slugs: HashSet<_> = CATALOG_CATEGORIES.iter().map(|c| c.slug).collect();
        let sorts: HashSet<_> = CATALOG_CATEGORIES.iter().map(|c| c.sort).collect();
        assert_eq!(ids.len(), 7);
        assert_eq!(slugs.len(), 7);
        assert_eq!(sorts.len(), 7);

        for category in &CATALOG_CATEGORIES {
            assert!(category.to_new_category().validate().is_ok(), "{}", category.slug);
        }
    }

    #[test]
    fn descriptions_are_single_spaced() {
        for category in &CATALOG_CATEGORIES {
            assert!(!category.description.contains("  "), "{}", category.slug);
        }
    }
}
