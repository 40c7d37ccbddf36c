//! Ledger schema: chart of accounts, mapping rules, journals with their
//! number sequences, ledger balances with their applied journals and
//! trial balances.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: MASTER DATA
        // ============================================================
        db.execute_unprepared(ACCOUNTS_SQL).await?;
        db.execute_unprepared(MAPPING_RULES_SQL).await?;

        // ============================================================
        // PART 2: JOURNALS
        // ============================================================
        db.execute_unprepared(JOURNAL_SEQUENCES_SQL).await?;
        db.execute_unprepared(JOURNAL_ENTRIES_SQL).await?;
        db.execute_unprepared(JOURNAL_LINES_SQL).await?;

        // ============================================================
        // PART 3: BALANCES
        // ============================================================
        db.execute_unprepared(LEDGER_BALANCES_SQL).await?;
        db.execute_unprepared(LEDGER_POSTINGS_SQL).await?;
        db.execute_unprepared(TRIAL_BALANCES_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(DROP_ALL_SQL)
            .await?;
        Ok(())
    }
}

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id              UUID PRIMARY KEY,
    code            VARCHAR(64) NOT NULL,
    name            VARCHAR(255) NOT NULL,
    account_type    VARCHAR(16) NOT NULL
                    CHECK (account_type IN ('ASSET','LIABILITY','EQUITY','REVENUE','EXPENSE','FINANCING')),
    level           SMALLINT NOT NULL CHECK (level BETWEEN 1 AND 6),
    parent_code     VARCHAR(64),
    normal_balance  VARCHAR(8) NOT NULL CHECK (normal_balance IN ('DEBIT','CREDIT')),
    is_active       BOOLEAN NOT NULL DEFAULT TRUE,
    is_header       BOOLEAN NOT NULL DEFAULT FALSE,

    CONSTRAINT uq_accounts_code UNIQUE (code)
);
";

const MAPPING_RULES_SQL: &str = r"
CREATE TABLE mapping_rules (
    id                UUID PRIMARY KEY,
    source_type       VARCHAR(100) NOT NULL,
    description       TEXT,
    debit_templates   JSONB NOT NULL DEFAULT '[]'::jsonb,
    credit_templates  JSONB NOT NULL DEFAULT '[]'::jsonb,
    is_active         BOOLEAN NOT NULL DEFAULT TRUE,
    priority          INTEGER NOT NULL DEFAULT 0,
    created_at        TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at        TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_mapping_rules_source_type UNIQUE (source_type)
);

CREATE INDEX idx_mapping_rules_active ON mapping_rules(source_type, priority DESC) WHERE is_active;
";

const JOURNAL_SEQUENCES_SQL: &str = r"
CREATE TABLE journal_sequences (
    year        INTEGER NOT NULL,
    month       INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
    last_value  INTEGER NOT NULL DEFAULT 0,

    PRIMARY KEY (year, month)
);
";

const JOURNAL_ENTRIES_SQL: &str = r"
CREATE TABLE journal_entries (
    id                   UUID PRIMARY KEY,
    journal_number       VARCHAR(32) NOT NULL,
    entry_date           DATE NOT NULL,
    period               VARCHAR(7) NOT NULL,
    year                 INTEGER NOT NULL,
    entry_type           VARCHAR(16) NOT NULL
                         CHECK (entry_type IN ('GENERAL','AUTO','REVERSAL','ADJUSTMENT','OPENING','CLOSING')),
    source_type          VARCHAR(100),
    source_id            VARCHAR(100),
    description          TEXT NOT NULL,
    total_debit          NUMERIC(20, 4) NOT NULL DEFAULT 0,
    total_credit         NUMERIC(20, 4) NOT NULL DEFAULT 0,
    is_balanced          BOOLEAN NOT NULL DEFAULT FALSE,
    status               VARCHAR(16) NOT NULL DEFAULT 'DRAFT'
                         CHECK (status IN ('DRAFT','POSTED','CANCELLED')),
    is_posted            BOOLEAN NOT NULL DEFAULT FALSE,
    is_approved          BOOLEAN NOT NULL DEFAULT FALSE,
    is_reversed          BOOLEAN NOT NULL DEFAULT FALSE,
    reversal_journal_id  UUID REFERENCES journal_entries(id),
    reversal_of          UUID REFERENCES journal_entries(id),
    reversal_reason      TEXT,
    created_by           VARCHAR(100) NOT NULL,
    created_at           TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at           TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    posted_by            VARCHAR(100),
    posted_at            TIMESTAMPTZ,
    approved_by          VARCHAR(100),
    approved_at          TIMESTAMPTZ,
    reversed_by          VARCHAR(100),
    reversed_at          TIMESTAMPTZ,

    CONSTRAINT uq_journal_entries_number UNIQUE (journal_number),
    CONSTRAINT chk_journal_posted_flag CHECK (status = 'DRAFT' OR is_posted)
);

CREATE INDEX idx_journal_entries_source ON journal_entries(source_type, source_id);
CREATE INDEX idx_journal_entries_period ON journal_entries(period) WHERE is_posted;
CREATE INDEX idx_journal_entries_date ON journal_entries(entry_date DESC, journal_number DESC);
";

const JOURNAL_LINES_SQL: &str = r"
CREATE TABLE journal_lines (
    id            UUID PRIMARY KEY,
    journal_id    UUID NOT NULL REFERENCES journal_entries(id) ON DELETE CASCADE,
    line_number   INTEGER NOT NULL,
    account_id    UUID NOT NULL REFERENCES accounts(id),
    account_code  VARCHAR(64) NOT NULL,
    account_name  VARCHAR(255) NOT NULL,
    cost_center   VARCHAR(100),
    description   TEXT,
    debit         NUMERIC(20, 4) NOT NULL DEFAULT 0 CHECK (debit >= 0),
    credit        NUMERIC(20, 4) NOT NULL DEFAULT 0 CHECK (credit >= 0),

    CONSTRAINT uq_journal_lines_position UNIQUE (journal_id, line_number),
    CONSTRAINT chk_journal_lines_single_side CHECK ((debit = 0) <> (credit = 0))
);

CREATE INDEX idx_journal_lines_account ON journal_lines(account_id);
";

const LEDGER_BALANCES_SQL: &str = r"
CREATE TABLE ledger_balances (
    id               UUID PRIMARY KEY,
    account_id       UUID NOT NULL REFERENCES accounts(id),
    account_code     VARCHAR(64) NOT NULL,
    account_name     VARCHAR(255) NOT NULL,
    account_type     VARCHAR(16) NOT NULL,
    normal_balance   VARCHAR(8) NOT NULL,
    period           VARCHAR(7) NOT NULL,
    year             INTEGER NOT NULL,
    opening_balance  NUMERIC(20, 4) NOT NULL DEFAULT 0,
    period_debit     NUMERIC(20, 4) NOT NULL DEFAULT 0,
    period_credit    NUMERIC(20, 4) NOT NULL DEFAULT 0,
    net_movement     NUMERIC(20, 4) NOT NULL DEFAULT 0,
    closing_balance  NUMERIC(20, 4) NOT NULL DEFAULT 0,
    updated_at       TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_ledger_balances_account_period UNIQUE (account_id, period)
);

CREATE INDEX idx_ledger_balances_period ON ledger_balances(period, account_code);
";

// Journals whose lines are already counted in ledger_balances.
const LEDGER_POSTINGS_SQL: &str = r"
CREATE TABLE ledger_postings (
    journal_id  UUID PRIMARY KEY REFERENCES journal_entries(id),
    period      VARCHAR(7) NOT NULL,
    applied_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_ledger_postings_period ON ledger_postings(period);
";

const TRIAL_BALANCES_SQL: &str = r"
CREATE TABLE trial_balances (
    id                 UUID PRIMARY KEY,
    period             VARCHAR(7) NOT NULL,
    year               INTEGER NOT NULL,
    account_id         UUID NOT NULL REFERENCES accounts(id),
    account_code       VARCHAR(64) NOT NULL,
    account_name       VARCHAR(255) NOT NULL,
    account_type       VARCHAR(16) NOT NULL,
    normal_balance     VARCHAR(8) NOT NULL,
    debit              NUMERIC(20, 4) NOT NULL DEFAULT 0,
    credit             NUMERIC(20, 4) NOT NULL DEFAULT 0,
    debit_adjustment   NUMERIC(20, 4) NOT NULL DEFAULT 0,
    credit_adjustment  NUMERIC(20, 4) NOT NULL DEFAULT 0,
    debit_adjusted     NUMERIC(20, 4) NOT NULL DEFAULT 0,
    credit_adjusted    NUMERIC(20, 4) NOT NULL DEFAULT 0,
    generated_at       TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_trial_balances_period_account UNIQUE (period, account_id)
);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS trial_balances CASCADE;
DROP TABLE IF EXISTS ledger_postings CASCADE;
DROP TABLE IF EXISTS ledger_balances CASCADE;
DROP TABLE IF EXISTS journal_lines CASCADE;
DROP TABLE IF EXISTS journal_entries CASCADE;
DROP TABLE IF EXISTS journal_sequences CASCADE;
DROP TABLE IF EXISTS mapping_rules CASCADE;
DROP TABLE IF EXISTS accounts CASCADE;
";
