use std::path::Path;
use std::sync::Arc;

use ledgerly_core::{
    clock::{Clock, SystemClock},
    investments::{InvestmentAssetRepositoryTrait, InvestmentService, InvestmentServiceTrait},
    invoices::{InvoiceService, InvoiceServiceTrait},
    market_data::{MarketPriceLookupTrait, ProviderPriceLookup},
    recurring::{RecurrenceService, RecurrenceServiceTrait},
    scheduler::SchedulerStateRepositoryTrait,
};
use ledgerly_market_data::{MarketDataProvider, ProviderChain, YahooProvider};
use ledgerly_storage_sqlite::{
    db, AccountRepository, InvestmentAssetRepository, InvoiceRepository,
    RecurringTemplateRepository, SchedulerStateRepository, TransactionRepository,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;

/// Everything the background loops need, wired once at startup.
pub struct AppState {
    pub invoice_service: Arc<dyn InvoiceServiceTrait>,
    pub recurrence_service: Arc<dyn RecurrenceServiceTrait>,
    pub investment_service: Arc<dyn InvestmentServiceTrait>,
    pub asset_repository: Arc<dyn InvestmentAssetRepositoryTrait>,
    pub scheduler_state_repository: Arc<dyn SchedulerStateRepositoryTrait>,
    pub clock: Arc<dyn Clock>,
    pub db_path: String,
}

pub fn init_tracing(log_format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

/// Market prices come from Yahoo; without it prices are simply never refreshed.
fn build_price_lookup() -> Arc<dyn MarketPriceLookupTrait> {
    let mut providers: Vec<Arc<dyn MarketDataProvider>> = Vec::new();
    match YahooProvider::new() {
        Ok(yahoo) => providers.push(Arc::new(yahoo)),
        Err(e) => tracing::warn!("Yahoo provider unavailable: {}", e),
    }
    Arc::new(ProviderPriceLookup::new(Arc::new(ProviderChain::new(
        providers,
    ))))
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    // Keep DATABASE_URL aligned with LEDGERLY_DB_PATH so storage picks the right file
    std::env::set_var("DATABASE_URL", &config.db_path);
    let data_dir = Path::new(&config.db_path)
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_string_lossy()
        .to_string();
    let db_path = db::init(&data_dir)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = db::spawn_writer((*pool).clone());

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let account_repository = Arc::new(AccountRepository::new(pool.clone(), writer.clone()));
    let transaction_repository =
        Arc::new(TransactionRepository::new(pool.clone(), writer.clone()));
    let invoice_repository = Arc::new(InvoiceRepository::new(pool.clone(), writer.clone()));
    let template_repository =
        Arc::new(RecurringTemplateRepository::new(pool.clone(), writer.clone()));
    let asset_repository = Arc::new(InvestmentAssetRepository::new(
        pool.clone(),
        writer.clone(),
    ));
    let scheduler_state_repository = Arc::new(SchedulerStateRepository::new(pool, writer));

    let invoice_service: Arc<dyn InvoiceServiceTrait> = Arc::new(InvoiceService::new(
        invoice_repository,
        account_repository,
        transaction_repository,
        clock.clone(),
    ));
    let recurrence_service: Arc<dyn RecurrenceServiceTrait> = Arc::new(RecurrenceService::new(
        template_repository,
        invoice_service.clone(),
        clock.clone(),
    ));
    let investment_service: Arc<dyn InvestmentServiceTrait> = Arc::new(InvestmentService::new(
        asset_repository.clone(),
        build_price_lookup(),
        clock.clone(),
    ));

    Ok(Arc::new(AppState {
        invoice_service,
        recurrence_service,
        investment_service,
        asset_repository,
        scheduler_state_repository,
        clock,
        db_path,
    }))
}
