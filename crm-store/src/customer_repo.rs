use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crm_core::repository::order_clause;
use crm_core::{CoreResult, Customer, CustomerFilter, CustomerRepository, NewCustomer, SortKey};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::{like_pattern, map_db_error};

const CUSTOMER_COLUMNS: &str = "id, name, nickname, email, phone, created_at";

pub struct StoreCustomerRepository {
    pool: PgPool,
}

impl StoreCustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: Uuid,
    name: String,
    nickname: Option<String>,
    email: String,
    phone: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            name: row.name,
            nickname: row.nickname,
            email: row.email,
            phone: row.phone,
            created_at: row.created_at,
        }
    }
}

async fn insert_customer<'e, E>(executor: E, customer: &NewCustomer) -> Result<CustomerRow, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, CustomerRow>(&format!(
        "INSERT INTO customers (id, name, nickname, email, phone) VALUES ($1, $2, $3, $4, $5) RETURNING {}",
        CUSTOMER_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(&customer.name)
    .bind(&customer.nickname)
    .bind(&customer.email)
    .bind(&customer.phone)
    .fetch_one(executor)
    .await
}

#[async_trait]
impl CustomerRepository for StoreCustomerRepository {
    async fn create_customer(&self, customer: &NewCustomer) -> CoreResult<Customer> {
        let row = insert_customer(&self.pool, customer).await.map_err(map_db_error)?;
        Ok(row.into())
    }

    async fn create_customers(&self, customers: &[NewCustomer]) -> CoreResult<Vec<Customer>> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;
        let mut created = Vec::with_capacity(customers.len());

        for customer in customers {
            let row = insert_customer(&mut *tx, customer).await.map_err(map_db_error)?;
            created.push(row.into());
        }

        tx.commit().await.map_err(map_db_error)?;
        Ok(created)
    }

    async fn get_customer(&self, id: Uuid) -> CoreResult<Option<Customer>> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {} FROM customers WHERE id = $1",
            CUSTOMER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(row.map(Customer::from))
    }

    async fn find_by_email(&self, email: &str) -> CoreResult<Option<Customer>> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {} FROM customers WHERE email = $1",
            CUSTOMER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(row.map(Customer::from))
    }

    async fn email_exists(&self, email: &str) -> CoreResult<bool> {
        let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM customers WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(exists)
    }

    async fn list_customers(&self, filter: &CustomerFilter, order_by: &[SortKey]) -> CoreResult<Vec<Customer>> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM customers WHERE TRUE", CUSTOMER_COLUMNS));

        if let Some(name) = &filter.name {
            qb.push(" AND name ILIKE ").push_bind(like_pattern(name));
        }
        if let Some(email) = &filter.email {
            qb.push(" AND email ILIKE ").push_bind(like_pattern(email));
        }
        qb.push(order_clause::<Customer>(order_by, "created_at ASC, id ASC"));

        let rows = qb
            .build_query_as::<CustomerRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(rows.into_iter().map(Customer::from).collect())
    }
}
