use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crm_catalog::Product;
use crm_core::repository::order_clause;
use crm_core::{CoreError, CoreResult, SortKey};
use crm_order::{CustomerSummary, NewOrder, Order, OrderFilter, OrderRepository};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::map_db_error;

const ORDER_SELECT: &str = "SELECT o.id, o.total_amount, o.order_date, \
     c.id AS customer_id, c.name AS customer_name, c.email AS customer_email \
     FROM orders o JOIN customers c ON c.id = o.customer_id";

pub struct StoreOrderRepository {
    pool: PgPool,
}

impl StoreOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads the linked products of every order in one round trip, in link order.
    async fn attach_products(&self, rows: Vec<OrderRow>) -> CoreResult<Vec<Order>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let links = sqlx::query_as::<_, OrderProductRow>(
            r#"
            SELECT op.order_id, p.id, p.name, p.price, p.stock
            FROM order_products op
            JOIN products p ON p.id = op.product_id
            WHERE op.order_id = ANY($1)
            ORDER BY op.order_id, op.position
            "#,
        )
        .bind(&order_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        let mut products: HashMap<Uuid, Vec<Product>> = HashMap::new();
        for link in links {
            products.entry(link.order_id).or_default().push(Product {
                id: link.id,
                name: link.name,
                price: link.price,
                stock: link.stock,
            });
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let linked = products.remove(&row.id).unwrap_or_default();
                row.into_order(linked)
            })
            .collect())
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    total_amount: Decimal,
    order_date: DateTime<Utc>,
    customer_id: Uuid,
    customer_name: String,
    customer_email: String,
}

impl OrderRow {
    fn into_order(self, products: Vec<Product>) -> Order {
        Order {
            id: self.id,
            customer: CustomerSummary {
                id: self.customer_id,
                name: self.customer_name,
                email: self.customer_email,
            },
            products,
            total_amount: self.total_amount,
            order_date: self.order_date,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderProductRow {
    order_id: Uuid,
    id: Uuid,
    name: String,
    price: Decimal,
    stock: i32,
}

#[async_trait]
impl OrderRepository for StoreOrderRepository {
    async fn create_order(&self, order: &NewOrder) -> CoreResult<Order> {
        let order_id = Uuid::new_v4();
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, customer_id, total_amount, order_date)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(order_id)
        .bind(order.customer_id)
        .bind(order.total_amount)
        .bind(order.order_date)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        for (position, product_id) in order.product_ids.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_products (order_id, product_id, position)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(order_id)
            .bind(*product_id)
            .bind(position as i32)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        }

        tx.commit().await.map_err(map_db_error)?;

        self.get_order(order_id)
            .await?
            .ok_or_else(|| CoreError::InternalError(format!("Order {} vanished after commit", order_id)))
    }

    async fn get_order(&self, id: Uuid) -> CoreResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("{} WHERE o.id = $1", ORDER_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        match row {
            Some(row) => Ok(self.attach_products(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_orders(&self, filter: &OrderFilter, order_by: &[SortKey]) -> CoreResult<Vec<Order>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!("{} WHERE TRUE", ORDER_SELECT));

        if let Some(from) = filter.order_date_gte {
            qb.push(" AND o.order_date >= ").push_bind(from);
        }
        if let Some(to) = filter.order_date_lte {
            qb.push(" AND o.order_date <= ").push_bind(to);
        }
        qb.push(order_clause::<Order>(order_by, "o.order_date DESC, o.id ASC"));

        let rows = qb
            .build_query_as::<OrderRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        self.attach_products(rows).await
    }

    async fn list_customer_orders(&self, customer_id: Uuid) -> CoreResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "{} WHERE o.customer_id = $1 ORDER BY o.order_date DESC",
            ORDER_SELECT
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        self.attach_products(rows).await
    }
}
