use async_trait::async_trait;
use crm_catalog::{NewProduct, Product, ProductFilter, ProductRepository};
use crm_core::repository::order_clause;
use crm_core::{CoreError, CoreResult, SortKey};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::{like_pattern, map_db_error};

const PRODUCT_COLUMNS: &str = "id, name, price, stock";

pub struct StoreProductRepository {
    pool: PgPool,
}

impl StoreProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    price: Decimal,
    stock: i32,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            price: row.price,
            stock: row.stock,
        }
    }
}

#[async_trait]
impl ProductRepository for StoreProductRepository {
    async fn create_product(&self, product: &NewProduct) -> CoreResult<Product> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "INSERT INTO products (id, name, price, stock) VALUES ($1, $2, $3, $4) RETURNING {}",
            PRODUCT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&product.name)
        .bind(product.price)
        .bind(product.stock)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(row.into())
    }

    async fn get_product(&self, id: Uuid) -> CoreResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(row.map(Product::from))
    }

    async fn get_products(&self, ids: &[Uuid]) -> CoreResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products WHERE id = ANY($1)",
            PRODUCT_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn find_by_name(&self, name: &str) -> CoreResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products WHERE name = $1 ORDER BY id LIMIT 1",
            PRODUCT_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(row.map(Product::from))
    }

    async fn list_products(&self, filter: &ProductFilter, order_by: &[SortKey]) -> CoreResult<Vec<Product>> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM products WHERE TRUE", PRODUCT_COLUMNS));

        if let Some(name) = &filter.name {
            qb.push(" AND name ILIKE ").push_bind(like_pattern(name));
        }
        if let Some(min) = filter.price_gte {
            qb.push(" AND price >= ").push_bind(min);
        }
        if let Some(max) = filter.price_lte {
            qb.push(" AND price <= ").push_bind(max);
        }
        if let Some(limit) = filter.stock_lt {
            qb.push(" AND stock < ").push_bind(limit);
        }
        qb.push(order_clause::<Product>(order_by, "name ASC, id ASC"));

        let rows = qb
            .build_query_as::<ProductRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn list_below_stock(&self, threshold: i32) -> CoreResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products WHERE stock < $1 ORDER BY name, id",
            PRODUCT_COLUMNS
        ))
        .bind(threshold)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn update_stock(&self, id: Uuid, stock: i32) -> CoreResult<Product> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE products SET stock = $1 WHERE id = $2 RETURNING {}",
            PRODUCT_COLUMNS
        ))
        .bind(stock)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        row.map(Product::from)
            .ok_or_else(|| CoreError::NotFound(format!("Product {} does not exist", id)))
    }
}
