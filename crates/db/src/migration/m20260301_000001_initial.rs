//! Initial database migration.
//!
//! Creates the enums, tables and indexes of the audit workflow and its
//! remediation plans.

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
        // PART 2: PROVIDERS & AUDITORS
        // ============================================================
        db.execute_unprepared(PROVIDERS_SQL).await?;
        db.execute_unprepared(AUDITORS_SQL).await?;

        // ============================================================
        // PART 3: REQUESTS & ASSIGNMENTS
        // ============================================================
        db.execute_unprepared(AUDIT_REQUESTS_SQL).await?;
        db.execute_unprepared(ASSIGNMENTS_SQL).await?;

        // ============================================================
        // PART 4: AUDITS
        // ============================================================
        db.execute_unprepared(AUDITS_SQL).await?;
        db.execute_unprepared(AUDIT_CHILDREN_SQL).await?;

        // ============================================================
        // PART 5: REMEDIATION PLANS
        // ============================================================
        db.execute_unprepared(REMEDIATION_PLANS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

const ENUMS_SQL: &str = r"
CREATE TYPE audit_status AS ENUM ('pending', 'in_progress', 'suspended', 'completed');
CREATE TYPE assignment_status AS ENUM ('pending', 'started');
CREATE TYPE request_status AS ENUM ('pending', 'validated', 'rejected');
CREATE TYPE vulnerability_severity AS ENUM ('critical', 'major', 'moderate', 'minor');
";

const PROVIDERS_SQL: &str = r"
CREATE TABLE providers (
    id                  UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name                VARCHAR(100) NOT NULL UNIQUE,
    market_number       VARCHAR(50),
    market_subject      VARCHAR(255),
    budget_total        NUMERIC(19, 2) CHECK (budget_total >= 0),
    contract_start      DATE,
    contract_end        DATE,
    realisation         NUMERIC(19, 2) NOT NULL DEFAULT 0 CHECK (realisation >= 0),
    solde               NUMERIC(19, 2) CHECK (solde >= 0),
    annual_amount       NUMERIC(19, 2),
    contract_years      NUMERIC(10, 2),
    classes             VARCHAR(255),
    budget_jour_homme   NUMERIC(19, 2) CHECK (budget_jour_homme >= 0),
    created_at          TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at          TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_contract_period CHECK (
        contract_start IS NULL OR contract_end IS NULL OR contract_end >= contract_start
    )
);
";

const AUDITORS_SQL: &str = r"
CREATE TABLE auditors (
    id              UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    last_name       VARCHAR(100) NOT NULL,
    first_name      VARCHAR(100) NOT NULL,
    email           VARCHAR(255) NOT NULL,
    phone           VARCHAR(20) NOT NULL,
    provider_id     UUID NOT NULL REFERENCES providers(id),
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_auditors_provider ON auditors(provider_id);
";

const AUDIT_REQUESTS_SQL: &str = r"
CREATE TABLE audit_requests (
    id                  UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    status              request_status NOT NULL DEFAULT 'pending',
    requester_email     VARCHAR(255) NOT NULL,
    application_name    VARCHAR(100) NOT NULL,
    description         TEXT NOT NULL,
    application_type    VARCHAR(100) NOT NULL,
    target_url          VARCHAR(255) NOT NULL,
    planned_date        DATE,
    test_accounts       JSONB NOT NULL DEFAULT '[]',
    rejection_comment   TEXT,
    created_by          VARCHAR(200) NOT NULL,
    created_at          TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at          TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_rejection_comment CHECK (
        status <> 'rejected' OR rejection_comment IS NOT NULL
    )
);

CREATE INDEX idx_audit_requests_status ON audit_requests(status);
CREATE INDEX idx_audit_requests_requester ON audit_requests(requester_email);
";

const ASSIGNMENTS_SQL: &str = r"
CREATE TABLE assignments (
    id                  UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    audit_request_id    UUID NOT NULL REFERENCES audit_requests(id),
    provider_id         UUID REFERENCES providers(id),
    audit_type          VARCHAR(150) NOT NULL,
    assigned_on         DATE NOT NULL DEFAULT CURRENT_DATE,
    status              assignment_status NOT NULL DEFAULT 'pending',
    created_at          TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at          TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_assignments_request ON assignments(audit_request_id);
CREATE INDEX idx_assignments_provider ON assignments(provider_id);

CREATE TABLE assignment_auditors (
    assignment_id   UUID NOT NULL REFERENCES assignments(id) ON DELETE CASCADE,
    auditor_id      UUID NOT NULL REFERENCES auditors(id) ON DELETE CASCADE,
    PRIMARY KEY (assignment_id, auditor_id)
);
";

const AUDITS_SQL: &str = r"
CREATE TABLE audits (
    id                      UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    audit_request_id        UUID NOT NULL REFERENCES audit_requests(id),
    assignment_id           UUID NOT NULL REFERENCES assignments(id),
    provider_id             UUID REFERENCES providers(id),
    status                  audit_status NOT NULL DEFAULT 'pending',
    accumulated_duration    NUMERIC(10, 2) NOT NULL DEFAULT 0 CHECK (accumulated_duration >= 0),
    active_interval_start   TIMESTAMPTZ,
    last_pause_time         TIMESTAMPTZ,
    created_at              TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at              TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    -- The running interval exists exactly while the audit is in progress
    CONSTRAINT chk_active_interval CHECK (
        (status = 'in_progress') = (active_interval_start IS NOT NULL)
    )
);

CREATE INDEX idx_audits_status ON audits(status);
CREATE INDEX idx_audits_provider ON audits(provider_id);
CREATE INDEX idx_audits_assignment ON audits(assignment_id);

CREATE TABLE audit_auditors (
    audit_id    UUID NOT NULL REFERENCES audits(id) ON DELETE CASCADE,
    auditor_id  UUID NOT NULL REFERENCES auditors(id) ON DELETE CASCADE,
    PRIMARY KEY (audit_id, auditor_id)
);
";

const AUDIT_CHILDREN_SQL: &str = r"
CREATE TABLE comments (
    id          UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    audit_id    UUID NOT NULL REFERENCES audits(id) ON DELETE CASCADE,
    author      VARCHAR(200) NOT NULL,
    content     VARCHAR(500) NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_comments_audit ON comments(audit_id, created_at);

CREATE TABLE attachments (
    id              UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    audit_id        UUID NOT NULL REFERENCES audits(id) ON DELETE CASCADE,
    author          VARCHAR(200) NOT NULL,
    filename        VARCHAR(255) NOT NULL,
    storage_key     VARCHAR(500) NOT NULL UNIQUE,
    content_type    VARCHAR(100) NOT NULL,
    size_bytes      BIGINT NOT NULL CHECK (size_bytes > 0),
    uploaded_at     TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_attachments_audit ON attachments(audit_id);
";

const REMEDIATION_PLANS_SQL: &str = r"
CREATE TABLE remediation_plans (
    id                  UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    reference           VARCHAR(20) NOT NULL UNIQUE,
    application         VARCHAR(100) NOT NULL,
    application_type    VARCHAR(100),
    audit_type          VARCHAR(150) NOT NULL,
    security_level      VARCHAR(50),
    realised_on         DATE NOT NULL,
    closed_on           DATE,
    reported_on         DATE,
    remediation_rate    NUMERIC(5, 2) CHECK (remediation_rate BETWEEN 0 AND 100),
    security_comment    TEXT,
    project_comment     TEXT,
    created_at          TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at          TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_remediation_plans_realised ON remediation_plans(realised_on);

CREATE TABLE vulnerabilities (
    id                  UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    plan_id             UUID NOT NULL REFERENCES remediation_plans(id) ON DELETE CASCADE,
    title               VARCHAR(255) NOT NULL,
    severity            vulnerability_severity NOT NULL,
    remediation_status  VARCHAR(100),
    created_at          TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_vulnerabilities_plan ON vulnerabilities(plan_id);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS vulnerabilities CASCADE;
DROP TABLE IF EXISTS remediation_plans CASCADE;
DROP TABLE IF EXISTS attachments CASCADE;
DROP TABLE IF EXISTS comments CASCADE;
DROP TABLE IF EXISTS audit_auditors CASCADE;
DROP TABLE IF EXISTS audits CASCADE;
DROP TABLE IF EXISTS assignment_auditors CASCADE;
DROP TABLE IF EXISTS assignments CASCADE;
DROP TABLE IF EXISTS audit_requests CASCADE;
DROP TABLE IF EXISTS auditors CASCADE;
DROP TABLE IF EXISTS providers CASCADE;

DROP TYPE IF EXISTS vulnerability_severity CASCADE;
DROP TYPE IF EXISTS request_status CASCADE;
DROP TYPE IF EXISTS assignment_status CASCADE;
DROP TYPE IF EXISTS audit_status CASCADE;
";
