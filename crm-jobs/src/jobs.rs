//! Scheduled jobs. Each run appends timestamped lines to its sink; API failures
//! become error lines and never fail the run.

use chrono::{DateTime, Duration, Local, Utc};
use crm_order::CrmReport;
use crm_store::app_config::JobsConfig;
use tracing::{error, info, instrument};

use crate::client::ApiClient;
use crate::error::JobResult;
use crate::sink::FileSink;

/// Timestamp layout of heartbeat lines.
pub const HEARTBEAT_TIME_FORMAT: &str = "%d/%m/%Y-%H:%M:%S";
/// Timestamp layout of every other job log.
pub const LOG_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// How far back the reminder job looks for orders.
pub const REMINDER_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    Heartbeat,
    Restock,
    Reminders,
    Report,
}

impl Job {
    pub fn name(&self) -> &'static str {
        match self {
            Job::Heartbeat => "heartbeat",
            Job::Restock => "restock",
            Job::Reminders => "reminders",
            Job::Report => "report",
        }
    }

    pub fn sink(&self, config: &JobsConfig) -> FileSink {
        let path = match self {
            Job::Heartbeat => &config.heartbeat_log,
            Job::Restock => &config.low_stock_log,
            Job::Reminders => &config.reminders_log,
            Job::Report => &config.report_log,
        };
        FileSink::new(path)
    }

    /// Runs the job at `now`. Only a failure to write the log is returned.
    pub async fn run(&self, api: &dyn ApiClient, sink: &FileSink, now: DateTime<Local>) -> JobResult<()> {
        match self {
            Job::Heartbeat => heartbeat(api, sink, now).await,
            Job::Restock => restock(api, sink, now).await,
            Job::Reminders => reminders(api, sink, now).await,
            Job::Report => report(api, sink, now).await,
        }
    }
}

#[instrument(skip_all)]
pub async fn heartbeat(api: &dyn ApiClient, sink: &FileSink, now: DateTime<Local>) -> JobResult<()> {
    let status = match api.hello().await {
        Ok(greeting) => greeting,
        Err(e) => {
            error!("Heartbeat API check failed: {}", e);
            format!("Error {}", e)
        }
    };

    sink.append(&format!("{} CRM is alive | API: {}", now.format(HEARTBEAT_TIME_FORMAT), status))
        .await
}

#[instrument(skip_all)]
pub async fn restock(api: &dyn ApiClient, sink: &FileSink, now: DateTime<Local>) -> JobResult<()> {
    let ts = now.format(LOG_TIME_FORMAT);

    match api.restock_low_stock().await {
        Ok(report) => {
            for product in &report.updated_products {
                sink.append(&format!("{} - Product: {}, New Stock: {}", ts, product.name, product.stock))
                    .await?;
            }
            info!(updated = report.updated_products.len(), "{}", report.message);
            sink.append(&format!("{} - {}", ts, report.message)).await
        }
        Err(e) => {
            error!("Restock failed: {}", e);
            sink.append(&format!("{} - Error: {}", ts, e)).await
        }
    }
}

#[instrument(skip_all)]
pub async fn reminders(api: &dyn ApiClient, sink: &FileSink, now: DateTime<Local>) -> JobResult<()> {
    let ts = now.format(LOG_TIME_FORMAT);
    let to = now.with_timezone(&Utc);
    let from = to - Duration::days(REMINDER_WINDOW_DAYS);

    match api.orders_between(Some(from), Some(to)).await {
        Ok(page) => {
            for order in &page.items {
                sink.append(&format!(
                    "{} - Order ID: {}, Customer Email: {}",
                    ts, order.id, order.customer.email
                ))
                .await?;
            }
            info!(orders = page.items.len(), "Order reminders processed");
            Ok(())
        }
        Err(e) => {
            error!("Fetching recent orders failed: {}", e);
            sink.append(&format!("{} - Error: {}", ts, e)).await
        }
    }
}

#[instrument(skip_all)]
pub async fn report(api: &dyn ApiClient, sink: &FileSink, now: DateTime<Local>) -> JobResult<()> {
    let ts = now.format(LOG_TIME_FORMAT);

    let fetched = async {
        let customers = api.customers().await?;
        let orders = api.orders_between(None, None).await?;
        JobResult::Ok(CrmReport::new(customers.total_count, &orders.items))
    }
    .await;

    match fetched {
        Ok(report) => {
            info!(customers = report.customers, orders = report.orders, revenue = %report.revenue, "CRM report generated");
            sink.append(&format!("{} - Report: {}", ts, report)).await
        }
        Err(e) => {
            error!("CRM report failed: {}", e);
            sink.append(&format!("{} - Error generating report: {}", ts, e)).await
        }
    }
}
