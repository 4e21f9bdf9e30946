pub mod product;
pub mod inventory;

pub use product::{CreateProductInput, NewProduct, Product, ProductFilter, ProductRepository, ProductService};
pub use inventory::{RestockPolicy, RestockReport, RestockService, LOW_STOCK_THRESHOLD, RESTOCK_INCREMENT};
