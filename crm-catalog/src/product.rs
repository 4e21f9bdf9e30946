use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use crm_core::repository::{parse_order_by, Page, SortKey, Sortable};
use crm_core::validation::{validate_length, validate_price, validate_stock, NAME_MAX_LENGTH};
use crm_core::{CoreError, CoreResult, MutationResult};
use crm_shared::models::events::ProductCreatedEvent;
use crm_shared::DomainEvent;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

/// Core product structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub stock: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub price: Decimal,
    pub stock: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    /// Case-insensitive substring.
    pub name: Option<String>,
    pub price_gte: Option<Decimal>,
    pub price_lte: Option<Decimal>,
    pub stock_lt: Option<i32>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(name) = &self.name {
            if !product.name.to_lowercase().contains(&name.to_lowercase()) {
                return false;
            }
        }
        if let Some(min) = self.price_gte {
            if product.price < min {
                return false;
            }
        }
        if let Some(max) = self.price_lte {
            if product.price > max {
                return false;
            }
        }
        if let Some(limit) = self.stock_lt {
            if product.stock >= limit {
                return false;
            }
        }
        true
    }
}

impl Sortable for Product {
    const SORT_FIELDS: &'static [&'static str] = &["id", "name", "price", "stock"];

    fn compare_field(&self, other: &Self, field: &str) -> Ordering {
        match field {
            "id" => self.id.cmp(&other.id),
            "name" => self.name.cmp(&other.name),
            "price" => self.price.cmp(&other.price),
            "stock" => self.stock.cmp(&other.stock),
            _ => Ordering::Equal,
        }
    }

    fn sort_column(field: &str) -> Option<&'static str> {
        match field {
            "id" => Some("id"),
            "name" => Some("name"),
            "price" => Some("price"),
            "stock" => Some("stock"),
            _ => None,
        }
    }
}

/// Repository trait for product catalog access
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn create_product(&self, product: &NewProduct) -> CoreResult<Product>;

    async fn get_product(&self, id: Uuid) -> CoreResult<Option<Product>>;

    /// Resolves the ids that exist. Each product appears once, however often its id is repeated.
    async fn get_products(&self, ids: &[Uuid]) -> CoreResult<Vec<Product>>;

    async fn find_by_name(&self, name: &str) -> CoreResult<Option<Product>>;

    async fn list_products(&self, filter: &ProductFilter, order_by: &[SortKey]) -> CoreResult<Vec<Product>>;

    /// Products with `stock < threshold`.
    async fn list_below_stock(&self, threshold: i32) -> CoreResult<Vec<Product>>;

    /// Fails with `NotFound` when the product is gone.
    async fn update_stock(&self, id: Uuid, stock: i32) -> CoreResult<Product>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductInput {
    pub name: String,
    pub price: Decimal,
    pub stock: Option<i32>,
}

pub struct ProductService {
    repo: Arc<dyn ProductRepository>,
}

impl ProductService {
    pub fn new(repo: Arc<dyn ProductRepository>) -> Self {
        Self { repo }
    }

    #[instrument(skip_all)]
    pub async fn create_product(&self, input: CreateProductInput) -> CoreResult<MutationResult<Product>> {
        let stock = input.stock.unwrap_or(0);

        if let Err(e) = validate_price(input.price).and_then(|_| validate_stock(stock)) {
            return Ok(rejected(e));
        }
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Ok(MutationResult::rejected("Name is required."));
        }
        if let Err(e) = validate_length("Name", &name, NAME_MAX_LENGTH) {
            return Ok(rejected(e));
        }

        let product = self
            .repo
            .create_product(&NewProduct { name, price: input.price, stock })
            .await?;

        info!(product_id = %product.id, price = %product.price, stock = product.stock, "Product created");
        DomainEvent::ProductCreated(ProductCreatedEvent {
            product_id: product.id,
            price: product.price,
            stock: product.stock,
            timestamp: Utc::now().timestamp(),
        })
        .emit();

        Ok(MutationResult::ok(product, "Product created."))
    }

    pub async fn list_products(&self, filter: &ProductFilter, order_by: &[String]) -> CoreResult<Page<Product>> {
        let keys = parse_order_by::<Product>(order_by)?;
        let products = self.repo.list_products(filter, &keys).await?;
        Ok(Page::new(products))
    }
}

fn rejected(e: CoreError) -> MutationResult<Product> {
    match e {
        CoreError::ValidationError(msg) => MutationResult::rejected(msg),
        other => MutationResult::rejected(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use std::sync::Mutex;

    /// Stores created products; the remaining operations are unused here.
    #[derive(Default)]
    struct CreatedProducts(Mutex<Vec<Product>>);

    #[async_trait]
    impl ProductRepository for CreatedProducts {
        async fn create_product(&self, product: &NewProduct) -> CoreResult<Product> {
            let product = Product {
                id: Uuid::new_v4(),
                name: product.name.clone(),
                price: product.price,
                stock: product.stock,
            };
            self.0.lock().unwrap().push(product.clone());
            Ok(product)
        }

        async fn get_product(&self, _: Uuid) -> CoreResult<Option<Product>> {
            unimplemented!()
        }

        async fn get_products(&self, _: &[Uuid]) -> CoreResult<Vec<Product>> {
            unimplemented!()
        }

        async fn find_by_name(&self, _: &str) -> CoreResult<Option<Product>> {
            unimplemented!()
        }

        async fn list_products(&self, _: &ProductFilter, _: &[SortKey]) -> CoreResult<Vec<Product>> {
            unimplemented!()
        }

        async fn list_below_stock(&self, _: i32) -> CoreResult<Vec<Product>> {
            unimplemented!()
        }

        async fn update_stock(&self, _: Uuid, _: i32) -> CoreResult<Product> {
            unimplemented!()
        }
    }

    fn create_input(name: &str) -> CreateProductInput {
        CreateProductInput {
            name: name.to_string(),
            price: Decimal::from_str("9.99").unwrap(),
            stock: None,
        }
    }

    #[tokio::test]
    async fn test_create_rejects_overlong_name() {
        let repo = Arc::new(CreatedProducts::default());
        let service = ProductService::new(repo.clone());

        let result = service.create_product(create_input(&"p".repeat(256))).await.unwrap();

        assert!(!result.success);
        assert_eq!(result.message, "Name must be at most 255 characters.");
        assert!(repo.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_defaults_stock_to_zero() {
        let repo = Arc::new(CreatedProducts::default());
        let service = ProductService::new(repo.clone());

        let result = service.create_product(create_input(&"p".repeat(NAME_MAX_LENGTH))).await.unwrap();

        assert!(result.success, "{}", result.message);
        assert_eq!(result.record.unwrap().stock, 0);
        assert_eq!(repo.0.lock().unwrap().len(), 1);
    }

    fn product(name: &str, price: &str, stock: i32) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: name.to_string(),
            price: Decimal::from_str(price).unwrap(),
            stock,
        }
    }

    #[test]
    fn test_filter_by_price_range_and_stock() {
        let laptop = product("Laptop", "999.99", 10);
        let mouse = product("Mouse", "19.99", 3);

        let filter = ProductFilter {
            price_lte: Some(Decimal::from(100)),
            ..Default::default()
        };
        assert!(!filter.matches(&laptop));
        assert!(filter.matches(&mouse));

        let filter = ProductFilter { stock_lt: Some(10), ..Default::default() };
        assert!(!filter.matches(&laptop));
        assert!(filter.matches(&mouse));

        let filter = ProductFilter { name: Some("LAP".to_string()), ..Default::default() };
        assert!(filter.matches(&laptop));
    }

    #[test]
    fn test_sort_by_price_desc() {
        let mut products = vec![product("A", "1.00", 1), product("B", "3.00", 1), product("C", "2.00", 1)];
        crm_core::repository::sort_records(&mut products, &[SortKey::desc("price")]);
        let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["B", "C", "A"]);
    }
}
