//! Database seeder for Bursar development and testing.
//!
//! Seeds a school chart of accounts, the built-in approval rules, and a demo
//! bank account. Safe to run repeatedly.
//!
//! Usage: cargo run --bin seeder

use uuid::Uuid;

use bursar_core::ledger::{AccountType, LedgerError, NewAccount};
use bursar_core::reconciliation::{NewBankAccount, ReconciliationError};
use bursar_db::{AccountRepository, ApprovalRuleRepository, ReconciliationRepository};
use bursar_shared::config::DatabaseConfig;
use bursar_shared::types::UserId;

/// Seed user ID (consistent for all seeds)
const SEED_USER_ID: &str = "00000000-0000-0000-0000-000000000002";

/// Code, name, type, system flag.
const CHART: &[(&str, &str, AccountType, bool)] = &[
    ("1000", "Cash on Hand", AccountType::Asset, true),
    ("1010", "Bank - Operating", AccountType::Asset, true),
    ("1100", "Fees Receivable", AccountType::Asset, true),
    ("1500", "Furniture & Equipment", AccountType::Asset, false),
    ("2000", "Accounts Payable", AccountType::Liability, true),
    ("2100", "Refunds Payable", AccountType::Liability, false),
    ("2200", "Staff Loans Payable", AccountType::Liability, false),
    ("3000", "Accumulated Fund", AccountType::Equity, true),
    ("4000", "Tuition Revenue", AccountType::Revenue, true),
    ("4100", "Other Income", AccountType::Revenue, false),
    ("5000", "Salaries & Wages", AccountType::Expense, true),
    ("5100", "Operating Expenses", AccountType::Expense, false),
];

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = bursar_db::connect(&DatabaseConfig {
        url: database_url,
        max_connections: 2,
        min_connections: 1,
    })
    .await
    .expect("Failed to connect to database");
    let actor = UserId::from_uuid(Uuid::parse_str(SEED_USER_ID).expect("valid seed user id"));

    println!("Seeding chart of accounts...");
    seed_accounts(&AccountRepository::new(db.clone()), actor).await;

    println!("Seeding approval rules...");
    match ApprovalRuleRepository::new(db.clone())
        .ensure_default_rules(actor)
        .await
    {
        Ok(0) => println!("  Default rules already present, skipping..."),
        Ok(n) => println!("  Created {n} approval rules"),
        Err(e) => eprintln!("Failed to seed approval rules: {e}"),
    }

    println!("Seeding bank account...");
    seed_bank_account(&ReconciliationRepository::new(db), actor).await;

    println!("Seeding complete!");
}

/// Seeds the school chart of accounts.
async fn seed_accounts(repo: &AccountRepository, actor: UserId) {
    for (code, name, account_type, is_system_account) in CHART {
        let input = NewAccount {
            code: (*code).to_string(),
            name: (*name).to_string(),
            account_type: *account_type,
            normal_balance: None,
            parent_id: None,
            is_system_account: *is_system_account,
        };
        match repo.create_account(input, actor).await {
            Ok(account) => println!("  Created account {} {}", account.code, account.name),
            Err(LedgerError::DuplicateAccountCode(_)) => {
                println!("  Account {code} already exists, skipping...");
            }
            Err(e) => eprintln!("Failed to insert account {code}: {e}"),
        }
    }
}

/// Seeds a demo operating bank account.
async fn seed_bank_account(repo: &ReconciliationRepository, actor: UserId) {
    let input = NewBankAccount {
        account_name: "Greenfield Academy Operating".to_string(),
        account_number: "0123456789".to_string(),
        bank_name: "First Bank".to_string(),
        branch: Some("Main Street".to_string()),
    };
    match repo.create_bank_account(&input, actor).await {
        Ok(account) => println!("  Created bank account {}", account.account_number),
        Err(ReconciliationError::DuplicateAccountNumber(_)) => {
            println!("  Bank account already exists, skipping...");
        }
        Err(e) => eprintln!("Failed to insert bank account: {e}"),
    }
}
