//! Database seeder for BLUD development and testing.
//!
//! Seeds a trimmed BLUD chart of accounts and the mapping rules used by
//! the service modules during local development. Safe to run repeatedly:
//! accounts are upserted by code and existing rules are left alone.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::Context;
use blud_core::account::{Account, AccountType};
use blud_core::mapping::{LineTemplate, MappingError, MappingRuleInput, MappingRuleService};
use blud_core::store::AccountStore;
use blud_db::{AccountRepository, MappingRuleRepository, connect};
use blud_shared::AppConfig;
use rust_decimal_macros::dec;
use tracing::info;

/// `(code, name, type, is_header)`
const CHART: &[(&str, &str, AccountType, bool)] = &[
    ("1", "Aset", AccountType::Asset, true),
    ("1.1", "Aset Lancar", AccountType::Asset, true),
    ("1.1.1", "Kas dan Setara Kas", AccountType::Asset, true),
    ("1.1.1.01", "Kas di Bendahara Penerimaan", AccountType::Asset, false),
    ("1.1.1.02", "Kas di Bendahara Pengeluaran", AccountType::Asset, false),
    ("1.1.1.03", "Kas di Bank BLUD", AccountType::Asset, false),
    ("1.1.2", "Piutang", AccountType::Asset, true),
    ("1.1.2.01", "Piutang Pelayanan Pasien", AccountType::Asset, false),
    ("2", "Kewajiban", AccountType::Liability, true),
    ("2.1", "Kewajiban Jangka Pendek", AccountType::Liability, true),
    ("2.1.1", "Utang Perpajakan", AccountType::Liability, true),
    ("2.1.1.01", "Utang PPh Pasal 21", AccountType::Liability, false),
    ("2.1.1.02", "Utang PPN", AccountType::Liability, false),
    ("3", "Ekuitas", AccountType::Equity, true),
    ("3.1", "Ekuitas", AccountType::Equity, true),
    ("3.1.1", "Ekuitas Awal", AccountType::Equity, false),
    ("4", "Pendapatan", AccountType::Revenue, true),
    ("4.1", "Pendapatan BLUD", AccountType::Revenue, true),
    ("4.1.1", "Pendapatan Jasa Layanan", AccountType::Revenue, true),
    ("4.1.1.01", "Pendapatan Jasa Layanan Umum", AccountType::Revenue, false),
    ("4.1.1.02", "Pendapatan Jasa Layanan BPJS", AccountType::Revenue, false),
    ("4.1.2", "Pendapatan Hibah", AccountType::Revenue, false),
    ("5", "Beban", AccountType::Expense, true),
    ("5.1", "Beban Operasional", AccountType::Expense, true),
    ("5.1.1", "Beban Pegawai", AccountType::Expense, true),
    ("5.1.1.01", "Beban Gaji dan Tunjangan", AccountType::Expense, false),
    ("5.1.2", "Beban Barang dan Jasa", AccountType::Expense, true),
    ("5.1.2.01", "Beban Bahan Habis Pakai", AccountType::Expense, false),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blud=info".into()),
        )
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let db = connect(
        config.database_url()?,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await
    .context("Failed to connect to database")?;

    let accounts = Arc::new(AccountRepository::new(db.clone()));
    seed_chart(accounts.as_ref()).await?;

    let rules = MappingRuleService::new(Arc::new(MappingRuleRepository::new(db)), accounts);
    seed_rules(&rules).await?;

    info!("Seeding complete");
    Ok(())
}

async fn seed_chart(accounts: &dyn AccountStore) -> anyhow::Result<()> {
    for (code, name, account_type, is_header) in CHART {
        let account = Account::new(code, *name, *account_type, *is_header)?;
        accounts.upsert(account).await?;
    }
    info!(accounts = CHART.len(), "Chart of accounts seeded");
    Ok(())
}

fn rules() -> Vec<MappingRuleInput> {
    vec![
        MappingRuleInput {
            source_type: "PENDAPATAN_JASA".to_string(),
            description: Some("Penerimaan pendapatan jasa layanan".to_string()),
            debit_templates: vec![LineTemplate::percentage(
                "1.1.1.01",
                "Kas diterima",
                dec!(100),
            )],
            credit_templates: vec![LineTemplate::percentage(
                "4.1.1.01",
                "Pendapatan jasa layanan umum",
                dec!(100),
            )],
            is_active: true,
            priority: 10,
        },
        MappingRuleInput {
            source_type: "BELANJA_PEGAWAI".to_string(),
            description: Some("Pembayaran gaji dengan potongan PPh 21".to_string()),
            debit_templates: vec![LineTemplate::percentage(
                "5.1.1.01",
                "Beban gaji",
                dec!(100),
            )],
            credit_templates: vec![
                LineTemplate::percentage("1.1.1.02", "Kas dibayarkan", dec!(95)),
                LineTemplate::percentage("2.1.1.01", "Potongan PPh 21", dec!(5)),
            ],
            is_active: true,
            priority: 0,
        },
    ]
}

async fn seed_rules(service: &MappingRuleService) -> anyhow::Result<()> {
    for input in rules() {
        match service.get_by_source_type(&input.source_type).await {
            Ok(existing) => {
                info!(source_type = %existing.source_type, "Mapping rule already exists, skipping");
            }
            Err(MappingError::SourceTypeNotFound(_)) => {
                let rule = service.create(input).await?;
                info!(source_type = %rule.source_type, "Mapping rule seeded");
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}
