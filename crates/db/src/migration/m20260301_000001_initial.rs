//! Initial database migration.
//!
//! Creates the enums, ledger tables, approval workflow tables, bank
//! reconciliation tables, and the audit log.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: LEDGER
        // ============================================================
        db.execute_unprepared(ACCOUNTS_SQL).await?;
        db.execute_unprepared(JOURNAL_ENTRIES_SQL).await?;
        db.execute_unprepared(JOURNAL_LINES_SQL).await?;

        // ============================================================
        // PART 3: APPROVAL WORKFLOW
        // ============================================================
        db.execute_unprepared(APPROVAL_RULES_SQL).await?;
        db.execute_unprepared(APPROVAL_REQUESTS_SQL).await?;

        // ============================================================
        // PART 4: BANK RECONCILIATION
        // ============================================================
        db.execute_unprepared(BANK_ACCOUNTS_SQL).await?;
        db.execute_unprepared(BANK_STATEMENTS_SQL).await?;
        db.execute_unprepared(BANK_STATEMENT_LINES_SQL).await?;

        // ============================================================
        // PART 5: AUDIT LOG
        // ============================================================
        db.execute_unprepared(AUDIT_LOGS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE account_type AS ENUM ('asset', 'liability', 'equity', 'revenue', 'expense');

CREATE TYPE normal_balance AS ENUM ('debit', 'credit');

CREATE TYPE journal_entry_type AS ENUM (
    'fee_payment',
    'expense',
    'salary',
    'refund',
    'opening_balance',
    'adjustment',
    'asset_purchase',
    'asset_disposal',
    'loan_disbursement',
    'loan_repayment'
);

CREATE TYPE payment_method AS ENUM (
    'cash',
    'bank_transfer',
    'cheque',
    'mobile_money',
    'card',
    'other'
);

CREATE TYPE approval_status AS ENUM ('pending', 'approved', 'rejected');

CREATE TYPE approver_role AS ENUM ('accountant', 'bursar', 'principal', 'admin');

CREATE TYPE statement_status AS ENUM ('pending', 'partial', 'reconciled');
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id UUID PRIMARY KEY,
    code VARCHAR(20) NOT NULL UNIQUE,
    name VARCHAR(255) NOT NULL,
    account_type account_type NOT NULL,
    normal_balance normal_balance NOT NULL,
    parent_id UUID REFERENCES accounts(id) ON DELETE RESTRICT,
    is_system_account BOOLEAN NOT NULL DEFAULT false,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_account_not_own_parent CHECK (parent_id IS NULL OR parent_id <> id)
);

CREATE INDEX idx_accounts_parent ON accounts(parent_id) WHERE parent_id IS NOT NULL;
";

const JOURNAL_ENTRIES_SQL: &str = r"
CREATE TABLE journal_entries (
    id UUID PRIMARY KEY,
    reference VARCHAR(100) NOT NULL UNIQUE,
    entry_date DATE NOT NULL,
    entry_type journal_entry_type NOT NULL,
    description TEXT NOT NULL,
    student_id UUID,
    staff_id UUID,
    term_id UUID,
    payment_method payment_method,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    is_posted BOOLEAN NOT NULL DEFAULT false,
    posted_by UUID,
    posted_at TIMESTAMPTZ,

    approval_status approval_status NOT NULL DEFAULT 'approved',
    approved_by UUID,
    approved_at TIMESTAMPTZ,

    is_voided BOOLEAN NOT NULL DEFAULT false,
    voided_by UUID,
    voided_at TIMESTAMPTZ,
    void_reason TEXT,

    CONSTRAINT chk_description_not_blank CHECK (length(trim(description)) > 0),
    CONSTRAINT chk_posted_stamp CHECK (NOT is_posted OR (posted_by IS NOT NULL AND posted_at IS NOT NULL)),
    CONSTRAINT chk_voided_stamp CHECK (
        NOT is_voided OR (voided_by IS NOT NULL AND voided_at IS NOT NULL AND void_reason IS NOT NULL)
    )
);

CREATE INDEX idx_journal_entries_date ON journal_entries(entry_date);
CREATE INDEX idx_journal_entries_effective ON journal_entries(entry_date)
    WHERE is_posted AND NOT is_voided;
";

const JOURNAL_LINES_SQL: &str = r"
CREATE TABLE journal_lines (
    id UUID PRIMARY KEY,
    entry_id UUID NOT NULL REFERENCES journal_entries(id) ON DELETE CASCADE,
    account_id UUID NOT NULL REFERENCES accounts(id) ON DELETE RESTRICT,
    debit_amount NUMERIC(19, 2) NOT NULL DEFAULT 0,
    credit_amount NUMERIC(19, 2) NOT NULL DEFAULT 0,
    memo TEXT,

    CONSTRAINT chk_line_single_sided CHECK (
        (debit_amount > 0 AND credit_amount = 0) OR
        (credit_amount > 0 AND debit_amount = 0)
    )
);

CREATE INDEX idx_journal_lines_entry ON journal_lines(entry_id);
CREATE INDEX idx_journal_lines_account ON journal_lines(account_id);
";

const APPROVAL_RULES_SQL: &str = r"
CREATE TABLE approval_rules (
    id UUID PRIMARY KEY,
    name VARCHAR(100) NOT NULL,
    transaction_type journal_entry_type NOT NULL,
    min_amount NUMERIC(19, 2),
    max_amount NUMERIC(19, 2),
    min_age_days INTEGER,
    required_approver_role approver_role NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_rule_amount_range CHECK (
        min_amount IS NULL OR max_amount IS NULL OR min_amount <= max_amount
    ),
    CONSTRAINT chk_rule_thresholds_non_negative CHECK (
        (min_amount IS NULL OR min_amount >= 0) AND
        (max_amount IS NULL OR max_amount >= 0) AND
        (min_age_days IS NULL OR min_age_days >= 0)
    )
);

CREATE INDEX idx_approval_rules_active ON approval_rules(transaction_type) WHERE is_active;
";

const APPROVAL_REQUESTS_SQL: &str = r"
CREATE TABLE approval_requests (
    id UUID PRIMARY KEY,
    entry_id UUID NOT NULL REFERENCES journal_entries(id) ON DELETE CASCADE,
    rule_id UUID NOT NULL REFERENCES approval_rules(id) ON DELETE RESTRICT,
    status approval_status NOT NULL DEFAULT 'pending',
    requested_by UUID NOT NULL,
    requested_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    reviewed_by UUID,
    reviewed_at TIMESTAMPTZ,
    review_notes TEXT,
    required_approver_role approver_role NOT NULL,

    CONSTRAINT chk_reviewed_stamp CHECK (
        status = 'pending' OR (reviewed_by IS NOT NULL AND reviewed_at IS NOT NULL)
    )
);

CREATE INDEX idx_approval_requests_entry ON approval_requests(entry_id);
CREATE INDEX idx_approval_requests_pending ON approval_requests(requested_at) WHERE status = 'pending';
";

const BANK_ACCOUNTS_SQL: &str = r"
CREATE TABLE bank_accounts (
    id UUID PRIMARY KEY,
    account_name VARCHAR(255) NOT NULL,
    account_number VARCHAR(50) NOT NULL UNIQUE,
    bank_name VARCHAR(255) NOT NULL,
    branch VARCHAR(255),
    current_balance NUMERIC(19, 2) NOT NULL DEFAULT 0,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const BANK_STATEMENTS_SQL: &str = r"
CREATE TABLE bank_statements (
    id UUID PRIMARY KEY,
    bank_account_id UUID NOT NULL REFERENCES bank_accounts(id) ON DELETE RESTRICT,
    statement_date DATE NOT NULL,
    period_start DATE,
    period_end DATE,
    opening_balance NUMERIC(19, 2) NOT NULL,
    closing_balance NUMERIC(19, 2) NOT NULL,
    status statement_status NOT NULL DEFAULT 'pending',
    reconciled_by UUID,
    reconciled_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_statement_period CHECK (
        period_start IS NULL OR period_end IS NULL OR period_start <= period_end
    ),
    CONSTRAINT chk_reconciled_stamp CHECK (
        status <> 'reconciled' OR (reconciled_by IS NOT NULL AND reconciled_at IS NOT NULL)
    )
);

CREATE INDEX idx_bank_statements_account ON bank_statements(bank_account_id, statement_date DESC);
";

const BANK_STATEMENT_LINES_SQL: &str = r"
CREATE TABLE bank_statement_lines (
    id UUID PRIMARY KEY,
    statement_id UUID NOT NULL REFERENCES bank_statements(id) ON DELETE CASCADE,
    line_date DATE NOT NULL,
    description TEXT NOT NULL,
    reference VARCHAR(100),
    debit_amount NUMERIC(19, 2) NOT NULL DEFAULT 0,
    credit_amount NUMERIC(19, 2) NOT NULL DEFAULT 0,
    running_balance NUMERIC(19, 2),
    is_matched BOOLEAN NOT NULL DEFAULT false,
    matched_transaction_id UUID,
    matched_by UUID,
    matched_at TIMESTAMPTZ,

    CONSTRAINT chk_statement_line_single_sided CHECK (
        (debit_amount > 0 AND credit_amount = 0) OR
        (credit_amount > 0 AND debit_amount = 0)
    ),
    CONSTRAINT chk_match_consistent CHECK (is_matched = (matched_transaction_id IS NOT NULL))
);

CREATE INDEX idx_statement_lines_statement ON bank_statement_lines(statement_id);

-- One transaction is matched to at most one line
CREATE UNIQUE INDEX uq_statement_lines_matched_transaction
    ON bank_statement_lines(matched_transaction_id)
    WHERE matched_transaction_id IS NOT NULL;
";

const AUDIT_LOGS_SQL: &str = r"
CREATE TABLE audit_logs (
    id UUID PRIMARY KEY,
    actor_id UUID NOT NULL,
    action VARCHAR(50) NOT NULL,
    entity VARCHAR(50) NOT NULL,
    entity_id UUID NOT NULL,
    before JSONB,
    after JSONB,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_audit_logs_entity ON audit_logs(entity, entity_id, created_at);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS audit_logs CASCADE;
DROP TABLE IF EXISTS bank_statement_lines CASCADE;
DROP TABLE IF EXISTS bank_statements CASCADE;
DROP TABLE IF EXISTS bank_accounts CASCADE;
DROP TABLE IF EXISTS approval_requests CASCADE;
DROP TABLE IF EXISTS approval_rules CASCADE;
DROP TABLE IF EXISTS journal_lines CASCADE;
DROP TABLE IF EXISTS journal_entries CASCADE;
DROP TABLE IF EXISTS accounts CASCADE;

DROP TYPE IF EXISTS statement_status;
DROP TYPE IF EXISTS approver_role;
DROP TYPE IF EXISTS approval_status;
DROP TYPE IF EXISTS payment_method;
DROP TYPE IF EXISTS journal_entry_type;
DROP TYPE IF EXISTS normal_balance;
DROP TYPE IF EXISTS account_type;
";
