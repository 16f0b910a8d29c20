//! Investments module - positions, their ledger and cost basis accounting.

mod investments_model;
mod investments_service;
mod investments_traits;
pub mod position_calculator;


pub use investments_model::{
    AssetSelector, AssetType, BuyRequest, IncomeRequest, InvestmentAsset, InvestmentTransaction,
    InvestmentTransactionType, NewInvestmentAsset, NewInvestmentTransaction,
    PriceRefreshSummary, SellRequest,
};
pub use investments_service::InvestmentService;
pub use investments_traits::{InvestmentAssetRepositoryTrait, InvestmentServiceTrait};
