pub mod category;
pub mod product;
pub mod product_image;
pub mod product_variant;

pub use category::{Entity as Category, Model as CategoryModel};
pub use product::{Entity as Product, Model as ProductModel};
pub use product_image::{Entity as ProductImage, Model as ProductImageModel};
pub use product_variant::{Entity as ProductVariant, Model as ProductVariantModel, ProductSize};
