use std::str::FromStr;

use crm_catalog::{NewProduct, Product, ProductRepository};
use crm_core::{CoreError, CoreResult, Customer, CustomerRepository, NewCustomer};
use crm_order::{CreateOrderInput, OrderManager, OrderOutcome, OrderRepository};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument};

use crate::Repositories;

const CUSTOMERS: &[(&str, &str, Option<&str>)] = &[
    ("Alice", "alice@example.com", Some("+1234567890")),
    ("Bob", "bob@example.com", Some("123-456-7890")),
    ("Carol", "carol@example.com", None),
];

const PRODUCTS: &[(&str, &str, i32)] = &[
    ("Laptop", "999.99", 10),
    ("Phone", "499.99", 25),
    ("Mouse", "19.99", 100),
];

/// Customer email and the product names of each fixture order.
const ORDERS: &[(&str, &[&str])] = &[
    ("alice@example.com", &["Laptop"]),
    ("bob@example.com", &["Phone", "Mouse"]),
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub customers_created: usize,
    pub products_created: usize,
    pub orders_created: usize,
}

/// Loads the fixture data set. Rows that already exist are reused, so running
/// it twice leaves the store unchanged.
#[instrument(skip_all)]
pub async fn seed_fixtures(repos: &Repositories) -> CoreResult<SeedSummary> {
    let mut summary = SeedSummary::default();

    let mut customers = Vec::with_capacity(CUSTOMERS.len());
    for (name, email, phone) in CUSTOMERS {
        let (customer, created) = customer_or_create(repos, name, email, *phone).await?;
        summary.customers_created += created as usize;
        customers.push(customer);
    }

    let mut products = Vec::with_capacity(PRODUCTS.len());
    for (name, price, stock) in PRODUCTS {
        let (product, created) = product_or_create(repos, name, price, *stock).await?;
        summary.products_created += created as usize;
        products.push(product);
    }

    let manager = OrderManager::new(repos.customers.clone(), repos.products.clone(), repos.orders.clone());
    for (email, names) in ORDERS {
        let customer = customers
            .iter()
            .find(|c| c.email == *email)
            .ok_or_else(|| CoreError::InternalError(format!("Fixture customer {} missing", email)))?;

        if !repos.orders.list_customer_orders(customer.id).await?.is_empty() {
            continue;
        }

        let product_ids = names
            .iter()
            .map(|name| {
                products
                    .iter()
                    .find(|p| p.name == *name)
                    .map(|p| p.id)
                    .ok_or_else(|| CoreError::InternalError(format!("Fixture product {} missing", name)))
            })
            .collect::<CoreResult<Vec<_>>>()?;

        let input = CreateOrderInput {
            customer_id: customer.id,
            product_ids,
            order_date: None,
        };
        match manager.create_order(input).await? {
            OrderOutcome::Created { .. } => summary.orders_created += 1,
            OrderOutcome::Failed { message, .. } => return Err(CoreError::InternalError(message)),
        }
    }

    info!(
        customers = summary.customers_created,
        products = summary.products_created,
        orders = summary.orders_created,
        "Fixtures seeded"
    );
    Ok(summary)
}

async fn customer_or_create(
    repos: &Repositories,
    name: &str,
    email: &str,
    phone: Option<&str>,
) -> CoreResult<(Customer, bool)> {
    if let Some(existing) = repos.customers.find_by_email(email).await? {
        return Ok((existing, false));
    }

    let customer = repos
        .customers
        .create_customer(&NewCustomer {
            name: name.to_string(),
            nickname: None,
            email: email.to_string(),
            phone: phone.map(str::to_string),
        })
        .await?;
    Ok((customer, true))
}

async fn product_or_create(repos: &Repositories, name: &str, price: &str, stock: i32) -> CoreResult<(Product, bool)> {
    if let Some(existing) = repos.products.find_by_name(name).await? {
        return Ok((existing, false));
    }

    let price = Decimal::from_str(price).map_err(|e| CoreError::InternalError(e.to_string()))?;
    let product = repos
        .products
        .create_product(&NewProduct {
            name: name.to_string(),
            price,
            stock,
        })
        .await?;
    Ok((product, true))
}
