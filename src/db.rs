use crate::entities::{
    Account, AccountOwner, AccountType, AccountTypeInfo, Client, Dependent, Direction, Document,
    EstatePlanning, Frequency, Goal, GoalAllocation, Holding, Income, IncomeType,
    InsuranceCoverage, Liability, LiabilityType, MaritalStatus, OwnershipType, PortfolioActivity,
    RiskTolerance, Security, SecurityType, Transaction, TransactionType,
};
use crate::snapshot::ClientSnapshot;
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Params, Row};
use std::path::Path;
use std::str::FromStr;

// ============================================================================
// CONNECTION & SCHEMA
// ============================================================================

/// Open (or create) the database file with foreign keys enforced
pub fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database at {}", path.display()))?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(conn)
}

/// `column IN ('a', 'b', ...)` for a TEXT-backed enum
fn one_of<T>(column: &str, all: &[T], text: fn(&T) -> &'static str) -> String {
    let values: Vec<String> = all.iter().map(|v| format!("'{}'", text(v))).collect();
    format!("{} IN ({})", column, values.join(", "))
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    // ==========================================================================
    // Clients
    // ==========================================================================
    conn.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS clients (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                date_of_birth TEXT NOT NULL,
                retirement_age INTEGER NOT NULL DEFAULT 65 CHECK (retirement_age > 0),
                risk_tolerance TEXT NOT NULL CHECK ({}),
                marital_status TEXT NOT NULL CHECK ({}),
                primary_client_id TEXT REFERENCES clients(id),
                is_primary INTEGER NOT NULL DEFAULT 1,
                state TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            one_of("risk_tolerance", RiskTolerance::ALL, RiskTolerance::as_str),
            one_of("marital_status", MaritalStatus::ALL, MaritalStatus::as_str),
        ),
        [],
    )?;

    // ==========================================================================
    // Accounts, owners, securities, holdings
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS account_types (
            name TEXT PRIMARY KEY,
            tax_advantaged INTEGER NOT NULL,
            is_roth INTEGER NOT NULL,
            is_liquid INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS accounts (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            account_type TEXT NOT NULL REFERENCES account_types(name),
            institution TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS account_owners (
                account_id TEXT NOT NULL REFERENCES accounts(id),
                client_id TEXT NOT NULL REFERENCES clients(id),
                ownership_type TEXT NOT NULL CHECK ({}),
                PRIMARY KEY (account_id, client_id)
            )",
            one_of("ownership_type", OwnershipType::ALL, OwnershipType::as_str),
        ),
        [],
    )?;

    conn.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS securities (
                id TEXT PRIMARY KEY,
                symbol TEXT NOT NULL,
                name TEXT NOT NULL,
                security_type TEXT NOT NULL CHECK ({}),
                expense_ratio REAL CHECK (expense_ratio IS NULL OR expense_ratio >= 0)
            )",
            one_of("security_type", SecurityType::ALL, SecurityType::as_str),
        ),
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS holdings (
            id TEXT PRIMARY KEY,
            account_id TEXT NOT NULL REFERENCES accounts(id),
            security_id TEXT NOT NULL REFERENCES securities(id),
            quantity REAL NOT NULL CHECK (quantity >= 0),
            cost_basis REAL NOT NULL CHECK (cost_basis >= 0),
            as_of_date TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Cash flow: transactions, liabilities, income
    // ==========================================================================
    conn.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS transactions (
                id TEXT PRIMARY KEY,
                client_id TEXT NOT NULL REFERENCES clients(id),
                account_id TEXT REFERENCES accounts(id),
                date TEXT NOT NULL,
                amount REAL NOT NULL CHECK (amount >= 0),
                direction TEXT NOT NULL CHECK ({}),
                transaction_type TEXT NOT NULL CHECK ({}),
                description TEXT
            )",
            one_of("direction", Direction::ALL, Direction::as_str),
            one_of("transaction_type", TransactionType::ALL, TransactionType::as_str),
        ),
        [],
    )?;

    conn.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS liabilities (
                id TEXT PRIMARY KEY,
                client_id TEXT NOT NULL REFERENCES clients(id),
                liability_type TEXT NOT NULL CHECK ({}),
                balance REAL NOT NULL CHECK (balance >= 0),
                interest_rate REAL NOT NULL CHECK (interest_rate >= 0),
                minimum_payment REAL NOT NULL CHECK (minimum_payment >= 0)
            )",
            one_of("liability_type", LiabilityType::ALL, LiabilityType::as_str),
        ),
        [],
    )?;

    conn.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS income (
                id TEXT PRIMARY KEY,
                client_id TEXT NOT NULL REFERENCES clients(id),
                income_type TEXT NOT NULL CHECK ({}),
                amount REAL NOT NULL CHECK (amount >= 0),
                frequency TEXT NOT NULL CHECK ({}),
                start_date TEXT NOT NULL,
                end_date TEXT
            )",
            one_of("income_type", IncomeType::ALL, IncomeType::as_str),
            one_of("frequency", Frequency::ALL, Frequency::as_str),
        ),
        [],
    )?;

    // ==========================================================================
    // Protection, activity, goals, estate
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS insurance_coverage (
            id TEXT PRIMARY KEY,
            client_id TEXT NOT NULL REFERENCES clients(id),
            life_insurance_coverage REAL NOT NULL DEFAULT 0 CHECK (life_insurance_coverage >= 0),
            life_insurance_type TEXT NOT NULL DEFAULT 'none',
            disability_coverage_monthly REAL NOT NULL DEFAULT 0 CHECK (disability_coverage_monthly >= 0),
            disability_coverage_type TEXT NOT NULL DEFAULT 'none',
            umbrella_coverage REAL NOT NULL DEFAULT 0 CHECK (umbrella_coverage >= 0),
            long_term_care INTEGER NOT NULL DEFAULT 0,
            effective_date TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS portfolio_metrics (
            id TEXT PRIMARY KEY,
            client_id TEXT NOT NULL REFERENCES clients(id),
            snapshot_date TEXT NOT NULL,
            annual_turnover REAL NOT NULL DEFAULT 0 CHECK (annual_turnover >= 0),
            trades_last_12_months INTEGER NOT NULL DEFAULT 0 CHECK (trades_last_12_months >= 0)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS goals (
            id TEXT PRIMARY KEY,
            client_id TEXT NOT NULL REFERENCES clients(id),
            name TEXT NOT NULL,
            target_amount REAL NOT NULL,
            target_date TEXT NOT NULL,
            priority INTEGER NOT NULL DEFAULT 3 CHECK (priority BETWEEN 1 AND 5),
            monthly_contribution REAL NOT NULL DEFAULT 0 CHECK (monthly_contribution >= 0)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS goal_account_allocations (
            goal_id TEXT NOT NULL REFERENCES goals(id),
            account_id TEXT NOT NULL REFERENCES accounts(id),
            allocation_percentage REAL NOT NULL CHECK (allocation_percentage BETWEEN 0 AND 100),
            PRIMARY KEY (goal_id, account_id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS estate_planning (
            client_id TEXT PRIMARY KEY REFERENCES clients(id),
            has_will INTEGER NOT NULL DEFAULT 0,
            will_last_updated TEXT,
            has_trust INTEGER NOT NULL DEFAULT 0,
            has_poa_financial INTEGER NOT NULL DEFAULT 0,
            has_poa_healthcare INTEGER NOT NULL DEFAULT 0,
            has_healthcare_directive INTEGER NOT NULL DEFAULT 0,
            beneficiaries_updated INTEGER NOT NULL DEFAULT 0,
            beneficiaries_last_reviewed TEXT,
            digital_estate_documented INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS documents (
            id TEXT PRIMARY KEY,
            client_id TEXT NOT NULL REFERENCES clients(id),
            document_type TEXT NOT NULL,
            file_name TEXT NOT NULL,
            file_hash TEXT,
            uploaded_on TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS dependents (
            id TEXT PRIMARY KEY,
            client_id TEXT NOT NULL REFERENCES clients(id),
            name TEXT NOT NULL,
            date_of_birth TEXT,
            relationship TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_transactions_client_date ON transactions(client_id, date)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_holdings_account ON holdings(account_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_documents_hash ON documents(client_id, file_hash)",
        [],
    )?;

    // ==========================================================================
    // Reference data
    // ==========================================================================
    for account_type in AccountType::ALL {
        let info = AccountTypeInfo::standard(*account_type);
        conn.execute(
            "INSERT OR IGNORE INTO account_types (name, tax_advantaged, is_roth, is_liquid)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                account_type.as_str(),
                info.tax_advantaged,
                info.is_roth,
                info.is_liquid
            ],
        )?;
    }

    tracing::debug!("database schema ready");
    Ok(())
}

// ============================================================================
// INSERTS
// ============================================================================

/// Ids are UUID v4 unless the caller already assigned one
fn record_id(id: &str) -> String {
    if id.is_empty() {
        uuid::Uuid::new_v4().to_string()
    } else {
        id.to_string()
    }
}

pub fn insert_client(conn: &Connection, client: &Client) -> Result<String> {
    let id = record_id(&client.id);
    conn.execute(
        "INSERT INTO clients (
            id, name, date_of_birth, retirement_age, risk_tolerance, marital_status,
            primary_client_id, is_primary, state
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            id,
            client.name,
            client.date_of_birth,
            client.retirement_age,
            client.risk_tolerance.as_str(),
            client.marital_status.as_str(),
            client.primary_client_id,
            client.is_primary,
            client.state,
        ],
    )
    .with_context(|| format!("Failed to insert client {}", client.name))?;
    Ok(id)
}

/// Accounts can be shared by household members, so re-inserting is a no-op
pub fn insert_account(conn: &Connection, account: &Account) -> Result<String> {
    let id = record_id(&account.id);
    conn.execute(
        "INSERT OR IGNORE INTO accounts (id, name, account_type, institution)
         VALUES (?1, ?2, ?3, ?4)",
        params![id, account.name, account.account_type.as_str(), account.institution],
    )
    .with_context(|| format!("Failed to insert account {}", account.name))?;
    Ok(id)
}

pub fn insert_account_owner(conn: &Connection, owner: &AccountOwner) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO account_owners (account_id, client_id, ownership_type)
         VALUES (?1, ?2, ?3)",
        params![owner.account_id, owner.client_id, owner.ownership_type.as_str()],
    )
    .with_context(|| format!("Failed to link account {} to client {}", owner.account_id, owner.client_id))?;
    Ok(())
}

/// Securities are shared reference data
pub fn insert_security(conn: &Connection, security: &Security) -> Result<String> {
    let id = record_id(&security.id);
    conn.execute(
        "INSERT OR IGNORE INTO securities (id, symbol, name, security_type, expense_ratio)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            id,
            security.symbol,
            security.name,
            security.security_type.as_str(),
            security.expense_ratio
        ],
    )
    .with_context(|| format!("Failed to insert security {}", security.symbol))?;
    Ok(id)
}

pub fn insert_holding(conn: &Connection, holding: &Holding) -> Result<String> {
    let id = record_id(&holding.id);
    conn.execute(
        "INSERT INTO holdings (id, account_id, security_id, quantity, cost_basis, as_of_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            id,
            holding.account_id,
            holding.security_id,
            holding.quantity,
            holding.cost_basis,
            holding.as_of_date
        ],
    )
    .with_context(|| format!("Failed to insert holding in account {}", holding.account_id))?;
    Ok(id)
}

pub fn insert_transactions(conn: &Connection, transactions: &[Transaction]) -> Result<usize> {
    let mut stmt = conn.prepare(
        "INSERT INTO transactions (
            id, client_id, account_id, date, amount, direction, transaction_type, description
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;

    let mut inserted = 0;
    for tx in transactions {
        stmt.execute(params![
            record_id(&tx.id),
            tx.client_id,
            tx.account_id,
            tx.date,
            tx.amount,
            tx.direction.as_str(),
            tx.transaction_type.as_str(),
            tx.description,
        ])
        .with_context(|| format!("Failed to insert transaction dated {}", tx.date))?;
        inserted += 1;
    }

    tracing::debug!(inserted, "transactions inserted");
    Ok(inserted)
}

pub fn insert_liability(conn: &Connection, liability: &Liability) -> Result<String> {
    let id = record_id(&liability.id);
    conn.execute(
        "INSERT INTO liabilities (
            id, client_id, liability_type, balance, interest_rate, minimum_payment
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            id,
            liability.client_id,
            liability.liability_type.as_str(),
            liability.balance,
            liability.interest_rate,
            liability.minimum_payment
        ],
    )
    .context("Failed to insert liability")?;
    Ok(id)
}

pub fn insert_income(conn: &Connection, income: &Income) -> Result<String> {
    let id = record_id(&income.id);
    conn.execute(
        "INSERT INTO income (id, client_id, income_type, amount, frequency, start_date, end_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            id,
            income.client_id,
            income.income_type.as_str(),
            income.amount,
            income.frequency.as_str(),
            income.start_date,
            income.end_date
        ],
    )
    .context("Failed to insert income")?;
    Ok(id)
}

pub fn insert_goal(conn: &Connection, goal: &Goal) -> Result<String> {
    let id = record_id(&goal.id);
    conn.execute(
        "INSERT INTO goals (
            id, client_id, name, target_amount, target_date, priority, monthly_contribution
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            id,
            goal.client_id,
            goal.name,
            goal.target_amount,
            goal.target_date,
            goal.priority,
            goal.monthly_contribution
        ],
    )
    .with_context(|| format!("Failed to insert goal {}", goal.name))?;
    Ok(id)
}

pub fn insert_goal_allocation(conn: &Connection, allocation: &GoalAllocation) -> Result<()> {
    conn.execute(
        "INSERT INTO goal_account_allocations (goal_id, account_id, allocation_percentage)
         VALUES (?1, ?2, ?3)",
        params![
            allocation.goal_id,
            allocation.account_id,
            allocation.allocation_percentage
        ],
    )
    .with_context(|| format!("Failed to allocate account {} to goal {}", allocation.account_id, allocation.goal_id))?;
    Ok(())
}

pub fn insert_insurance(conn: &Connection, coverage: &InsuranceCoverage) -> Result<String> {
    let id = record_id(&coverage.id);
    conn.execute(
        "INSERT INTO insurance_coverage (
            id, client_id, life_insurance_coverage, life_insurance_type,
            disability_coverage_monthly, disability_coverage_type, umbrella_coverage,
            long_term_care, effective_date
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            id,
            coverage.client_id,
            coverage.life_insurance_coverage,
            coverage.life_insurance_type,
            coverage.disability_coverage_monthly,
            coverage.disability_coverage_type,
            coverage.umbrella_coverage,
            coverage.long_term_care,
            coverage.effective_date
        ],
    )
    .context("Failed to insert insurance coverage")?;
    Ok(id)
}

pub fn insert_portfolio_activity(
    conn: &Connection,
    client_id: &str,
    activity: &PortfolioActivity,
) -> Result<String> {
    let id = record_id("");
    conn.execute(
        "INSERT INTO portfolio_metrics (
            id, client_id, snapshot_date, annual_turnover, trades_last_12_months
        ) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            id,
            client_id,
            activity.snapshot_date,
            activity.annual_turnover,
            activity.trades_last_12_months
        ],
    )
    .context("Failed to insert portfolio metrics")?;
    Ok(id)
}

/// One row per client; a second save replaces the first
pub fn upsert_estate_planning(conn: &Connection, estate: &EstatePlanning) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO estate_planning (
            client_id, has_will, will_last_updated, has_trust, has_poa_financial,
            has_poa_healthcare, has_healthcare_directive, beneficiaries_updated,
            beneficiaries_last_reviewed, digital_estate_documented
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            estate.client_id,
            estate.has_will,
            estate.will_last_updated,
            estate.has_trust,
            estate.has_poa_financial,
            estate.has_poa_healthcare,
            estate.has_healthcare_directive,
            estate.beneficiaries_updated,
            estate.beneficiaries_last_reviewed,
            estate.digital_estate_documented
        ],
    )
    .context("Failed to save estate planning")?;
    Ok(())
}

pub fn insert_document(conn: &Connection, document: &Document) -> Result<String> {
    let id = record_id(&document.id);
    conn.execute(
        "INSERT INTO documents (id, client_id, document_type, file_name, file_hash, uploaded_on)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            id,
            document.client_id,
            document.document_type,
            document.file_name,
            document.file_hash,
            document.uploaded_on
        ],
    )
    .with_context(|| format!("Failed to insert document {}", document.file_name))?;
    Ok(id)
}

pub fn insert_dependent(conn: &Connection, dependent: &Dependent) -> Result<String> {
    let id = record_id(&dependent.id);
    conn.execute(
        "INSERT INTO dependents (id, client_id, name, date_of_birth, relationship)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            id,
            dependent.client_id,
            dependent.name,
            dependent.date_of_birth,
            dependent.relationship
        ],
    )
    .with_context(|| format!("Failed to insert dependent {}", dependent.name))?;
    Ok(id)
}

/// Persist every record of a snapshot in one transaction
pub fn save_snapshot(conn: &Connection, snapshot: &ClientSnapshot) -> Result<()> {
    let tx = conn.unchecked_transaction()?;

    insert_client(&tx, &snapshot.client)?;
    for security in &snapshot.securities {
        insert_security(&tx, security)?;
    }
    for account in &snapshot.accounts {
        insert_account(&tx, account)?;
    }
    for owner in &snapshot.owners {
        insert_account_owner(&tx, owner)?;
    }
    for holding in &snapshot.holdings {
        insert_holding(&tx, holding)?;
    }
    insert_transactions(&tx, &snapshot.transactions)?;
    for liability in &snapshot.liabilities {
        insert_liability(&tx, liability)?;
    }
    for income in &snapshot.income {
        insert_income(&tx, income)?;
    }
    for goal in &snapshot.goals {
        insert_goal(&tx, goal)?;
    }
    for allocation in &snapshot.goal_allocations {
        insert_goal_allocation(&tx, allocation)?;
    }
    if let Some(coverage) = &snapshot.insurance {
        insert_insurance(&tx, coverage)?;
    }
    if let Some(estate) = &snapshot.estate {
        upsert_estate_planning(&tx, estate)?;
    }
    for document in &snapshot.documents {
        insert_document(&tx, document)?;
    }
    for dependent in &snapshot.dependents {
        insert_dependent(&tx, dependent)?;
    }
    if let Some(activity) = &snapshot.portfolio_activity {
        insert_portfolio_activity(&tx, &snapshot.client.id, activity)?;
    }

    tx.commit()?;
    tracing::info!(client_id = %snapshot.client.id, "snapshot saved");
    Ok(())
}

// ============================================================================
// ROW MAPPING
// ============================================================================

/// Parse an enumerated TEXT column
fn text_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn query_all<T, P, F>(conn: &Connection, sql: &str, params: P, map: F) -> Result<Vec<T>>
where
    P: Params,
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut stmt = conn
        .prepare(sql)
        .with_context(|| format!("Failed to prepare query: {}", sql))?;
    let rows = stmt.query_map(params, map)?.collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

const CLIENT_COLUMNS: &str = "id, name, date_of_birth, retirement_age, risk_tolerance,
    marital_status, primary_client_id, is_primary, state";

fn client_from_row(row: &Row<'_>) -> rusqlite::Result<Client> {
    Ok(Client {
        id: row.get(0)?,
        name: row.get(1)?,
        date_of_birth: row.get(2)?,
        retirement_age: row.get(3)?,
        risk_tolerance: text_column(row, 4)?,
        marital_status: text_column(row, 5)?,
        primary_client_id: row.get(6)?,
        is_primary: row.get(7)?,
        state: row.get(8)?,
    })
}

// ============================================================================
// QUERIES
// ============================================================================

pub fn get_client(conn: &Connection, client_id: &str) -> Result<Option<Client>> {
    let client = conn
        .query_row(
            &format!("SELECT {} FROM clients WHERE id = ?1", CLIENT_COLUMNS),
            params![client_id],
            client_from_row,
        )
        .optional()?;
    Ok(client)
}

/// Household heads, ordered by name
pub fn get_primary_clients(conn: &Connection) -> Result<Vec<Client>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM clients WHERE is_primary = 1 ORDER BY name, id",
            CLIENT_COLUMNS
        ),
        [],
        client_from_row,
    )
}

/// A document already on file with the same content hash
pub fn find_document_by_hash(
    conn: &Connection,
    client_id: &str,
    file_hash: &str,
) -> Result<Option<Document>> {
    let document = conn
        .query_row(
            "SELECT id, client_id, document_type, file_name, file_hash, uploaded_on
             FROM documents WHERE client_id = ?1 AND file_hash = ?2
             ORDER BY uploaded_on, id LIMIT 1",
            params![client_id, file_hash],
            |row| {
                Ok(Document {
                    id: row.get(0)?,
                    client_id: row.get(1)?,
                    document_type: row.get(2)?,
                    file_name: row.get(3)?,
                    file_hash: row.get(4)?,
                    uploaded_on: row.get(5)?,
                })
            },
        )
        .optional()?;
    Ok(document)
}

/// Everything the calculators need for one client as of a date.
///
/// Rows dated after `as_of` are left out, and every list has a fixed order
/// so two loads of the same data produce the same snapshot.
pub fn load_snapshot(conn: &Connection, client_id: &str, as_of: NaiveDate) -> Result<ClientSnapshot> {
    let client = match get_client(conn, client_id)? {
        Some(client) => client,
        None => bail!("Client {} not found", client_id),
    };

    let mut snapshot = ClientSnapshot::new(client, as_of);

    snapshot.accounts = query_all(
        conn,
        "SELECT a.id, a.name, a.account_type, t.tax_advantaged, t.is_roth, t.is_liquid, a.institution
         FROM accounts a
         JOIN account_owners o ON o.account_id = a.id
         JOIN account_types t ON t.name = a.account_type
         WHERE o.client_id = ?1
         ORDER BY a.id",
        params![client_id],
        |row| {
            Ok(Account {
                id: row.get(0)?,
                name: row.get(1)?,
                account_type: text_column(row, 2)?,
                tax_advantaged: row.get(3)?,
                is_roth: row.get(4)?,
                is_liquid: row.get(5)?,
                institution: row.get(6)?,
            })
        },
    )
    .context("Failed to load accounts")?;

    snapshot.owners = query_all(
        conn,
        "SELECT account_id, client_id, ownership_type FROM account_owners
         WHERE account_id IN (SELECT account_id FROM account_owners WHERE client_id = ?1)
         ORDER BY account_id, client_id",
        params![client_id],
        |row| {
            Ok(AccountOwner {
                account_id: row.get(0)?,
                client_id: row.get(1)?,
                ownership_type: text_column(row, 2)?,
            })
        },
    )
    .context("Failed to load account owners")?;

    snapshot.holdings = query_all(
        conn,
        "SELECT h.id, h.account_id, h.security_id, h.quantity, h.cost_basis, h.as_of_date
         FROM holdings h
         JOIN account_owners o ON o.account_id = h.account_id
         WHERE o.client_id = ?1 AND h.as_of_date <= ?2
         ORDER BY h.id",
        params![client_id, as_of],
        |row| {
            Ok(Holding {
                id: row.get(0)?,
                account_id: row.get(1)?,
                security_id: row.get(2)?,
                quantity: row.get(3)?,
                cost_basis: row.get(4)?,
                as_of_date: row.get(5)?,
            })
        },
    )
    .context("Failed to load holdings")?;

    snapshot.securities = query_all(
        conn,
        "SELECT DISTINCT s.id, s.symbol, s.name, s.security_type, s.expense_ratio
         FROM securities s
         JOIN holdings h ON h.security_id = s.id
         JOIN account_owners o ON o.account_id = h.account_id
         WHERE o.client_id = ?1 AND h.as_of_date <= ?2
         ORDER BY s.id",
        params![client_id, as_of],
        |row| {
            Ok(Security {
                id: row.get(0)?,
                symbol: row.get(1)?,
                name: row.get(2)?,
                security_type: text_column(row, 3)?,
                expense_ratio: row.get(4)?,
            })
        },
    )
    .context("Failed to load securities")?;

    snapshot.transactions = query_all(
        conn,
        "SELECT id, client_id, account_id, date, amount, direction, transaction_type, description
         FROM transactions
         WHERE client_id = ?1 AND date <= ?2
         ORDER BY date, id",
        params![client_id, as_of],
        |row| {
            Ok(Transaction {
                id: row.get(0)?,
                client_id: row.get(1)?,
                account_id: row.get(2)?,
                date: row.get(3)?,
                amount: row.get(4)?,
                direction: text_column(row, 5)?,
                transaction_type: text_column(row, 6)?,
                description: row.get(7)?,
            })
        },
    )
    .context("Failed to load transactions")?;

    snapshot.liabilities = query_all(
        conn,
        "SELECT id, client_id, liability_type, balance, interest_rate, minimum_payment
         FROM liabilities WHERE client_id = ?1
         ORDER BY id",
        params![client_id],
        |row| {
            Ok(Liability {
                id: row.get(0)?,
                client_id: row.get(1)?,
                liability_type: text_column(row, 2)?,
                balance: row.get(3)?,
                interest_rate: row.get(4)?,
                minimum_payment: row.get(5)?,
            })
        },
    )
    .context("Failed to load liabilities")?;

    snapshot.income = query_all(
        conn,
        "SELECT id, client_id, income_type, amount, frequency, start_date, end_date
         FROM income WHERE client_id = ?1
         ORDER BY id",
        params![client_id],
        |row| {
            Ok(Income {
                id: row.get(0)?,
                client_id: row.get(1)?,
                income_type: text_column(row, 2)?,
                amount: row.get(3)?,
                frequency: text_column(row, 4)?,
                start_date: row.get(5)?,
                end_date: row.get(6)?,
            })
        },
    )
    .context("Failed to load income")?;

    snapshot.goals = query_all(
        conn,
        "SELECT id, client_id, name, target_amount, target_date, priority, monthly_contribution
         FROM goals WHERE client_id = ?1
         ORDER BY priority, target_date, id",
        params![client_id],
        |row| {
            Ok(Goal {
                id: row.get(0)?,
                client_id: row.get(1)?,
                name: row.get(2)?,
                target_amount: row.get(3)?,
                target_date: row.get(4)?,
                priority: row.get(5)?,
                monthly_contribution: row.get(6)?,
            })
        },
    )
    .context("Failed to load goals")?;

    snapshot.goal_allocations = query_all(
        conn,
        "SELECT a.goal_id, a.account_id, a.allocation_percentage
         FROM goal_account_allocations a
         JOIN goals g ON g.id = a.goal_id
         WHERE g.client_id = ?1
         ORDER BY a.goal_id, a.account_id",
        params![client_id],
        |row| {
            Ok(GoalAllocation {
                goal_id: row.get(0)?,
                account_id: row.get(1)?,
                allocation_percentage: row.get(2)?,
            })
        },
    )
    .context("Failed to load goal allocations")?;

    // Latest coverage in force wins
    snapshot.insurance = conn
        .query_row(
            "SELECT id, client_id, life_insurance_coverage, life_insurance_type,
                    disability_coverage_monthly, disability_coverage_type,
                    umbrella_coverage, long_term_care, effective_date
             FROM insurance_coverage
             WHERE client_id = ?1 AND effective_date <= ?2
             ORDER BY effective_date DESC, id LIMIT 1",
            params![client_id, as_of],
            |row| {
                Ok(InsuranceCoverage {
                    id: row.get(0)?,
                    client_id: row.get(1)?,
                    life_insurance_coverage: row.get(2)?,
                    life_insurance_type: row.get(3)?,
                    disability_coverage_monthly: row.get(4)?,
                    disability_coverage_type: row.get(5)?,
                    umbrella_coverage: row.get(6)?,
                    long_term_care: row.get(7)?,
                    effective_date: row.get(8)?,
                })
            },
        )
        .optional()
        .context("Failed to load insurance coverage")?;

    snapshot.estate = conn
        .query_row(
            "SELECT client_id, has_will, will_last_updated, has_trust, has_poa_financial,
                    has_poa_healthcare, has_healthcare_directive, beneficiaries_updated,
                    beneficiaries_last_reviewed, digital_estate_documented
             FROM estate_planning WHERE client_id = ?1",
            params![client_id],
            |row| {
                Ok(EstatePlanning {
                    client_id: row.get(0)?,
                    has_will: row.get(1)?,
                    will_last_updated: row.get(2)?,
                    has_trust: row.get(3)?,
                    has_poa_financial: row.get(4)?,
                    has_poa_healthcare: row.get(5)?,
                    has_healthcare_directive: row.get(6)?,
                    beneficiaries_updated: row.get(7)?,
                    beneficiaries_last_reviewed: row.get(8)?,
                    digital_estate_documented: row.get(9)?,
                })
            },
        )
        .optional()
        .context("Failed to load estate planning")?;

    snapshot.documents = query_all(
        conn,
        "SELECT id, client_id, document_type, file_name, file_hash, uploaded_on
         FROM documents
         WHERE client_id = ?1 AND uploaded_on <= ?2
         ORDER BY uploaded_on, id",
        params![client_id, as_of],
        |row| {
            Ok(Document {
                id: row.get(0)?,
                client_id: row.get(1)?,
                document_type: row.get(2)?,
                file_name: row.get(3)?,
                file_hash: row.get(4)?,
                uploaded_on: row.get(5)?,
            })
        },
    )
    .context("Failed to load documents")?;

    snapshot.dependents = query_all(
        conn,
        "SELECT id, client_id, name, date_of_birth, relationship
         FROM dependents WHERE client_id = ?1
         ORDER BY name, id",
        params![client_id],
        |row| {
            Ok(Dependent {
                id: row.get(0)?,
                client_id: row.get(1)?,
                name: row.get(2)?,
                date_of_birth: row.get(3)?,
                relationship: row.get(4)?,
            })
        },
    )
    .context("Failed to load dependents")?;

    snapshot.portfolio_activity = conn
        .query_row(
            "SELECT snapshot_date, annual_turnover, trades_last_12_months
             FROM portfolio_metrics
             WHERE client_id = ?1 AND snapshot_date <= ?2
             ORDER BY snapshot_date DESC, id LIMIT 1",
            params![client_id, as_of],
            |row| {
                Ok(PortfolioActivity {
                    snapshot_date: row.get(0)?,
                    annual_turnover: row.get(1)?,
                    trades_last_12_months: row.get(2)?,
                })
            },
        )
        .optional()
        .context("Failed to load portfolio metrics")?;

    tracing::debug!(
        client_id,
        %as_of,
        accounts = snapshot.accounts.len(),
        holdings = snapshot.holdings.len(),
        transactions = snapshot.transactions.len(),
        goals = snapshot.goals.len(),
        "snapshot loaded"
    );

    Ok(snapshot)
}
