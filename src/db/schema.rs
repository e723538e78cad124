pub const SCHEMA_VERSION: i32 = 1;

pub const SCHEMA_V1: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY,
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS contacts (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT,
    phone TEXT,
    company TEXT,
    title TEXT,
    notes TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS interactions (
    id TEXT PRIMARY KEY,
    type TEXT NOT NULL CHECK(type IN ('meeting', 'call', 'email', 'message', 'note')),
    title TEXT,
    content TEXT,
    occurred_at TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Many-to-many: an interaction can involve several contacts
CREATE TABLE IF NOT EXISTS interaction_contacts (
    interaction_id TEXT NOT NULL,
    contact_id TEXT NOT NULL,
    PRIMARY KEY (interaction_id, contact_id),
    FOREIGN KEY (interaction_id) REFERENCES interactions(id) ON DELETE CASCADE,
    FOREIGN KEY (contact_id) REFERENCES contacts(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS follow_ups (
    id TEXT PRIMARY KEY,
    contact_id TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT,
    due_date TEXT NOT NULL,
    priority TEXT NOT NULL DEFAULT 'medium' CHECK(priority IN ('low', 'medium', 'high')),
    completed_at TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    FOREIGN KEY (contact_id) REFERENCES contacts(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS tags (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    color TEXT
);

CREATE TABLE IF NOT EXISTS contact_tags (
    contact_id TEXT NOT NULL,
    tag_id TEXT NOT NULL,
    added_at TEXT NOT NULL,
    PRIMARY KEY (contact_id, tag_id),
    FOREIGN KEY (contact_id) REFERENCES contacts(id) ON DELETE CASCADE,
    FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
);

-- Key/value settings (AI provider, model, key)
CREATE TABLE IF NOT EXISTS app_settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_contact_name ON contacts(name);
CREATE INDEX IF NOT EXISTS idx_contact_company ON contacts(company);
CREATE INDEX IF NOT EXISTS idx_interaction_date ON interactions(occurred_at);
CREATE INDEX IF NOT EXISTS idx_interaction_type ON interactions(type);
CREATE INDEX IF NOT EXISTS idx_interaction_contact ON interaction_contacts(contact_id);
CREATE INDEX IF NOT EXISTS idx_follow_up_contact ON follow_ups(contact_id);
CREATE INDEX IF NOT EXISTS idx_follow_up_due ON follow_ups(due_date);
CREATE INDEX IF NOT EXISTS idx_follow_up_completed ON follow_ups(completed_at);
CREATE INDEX IF NOT EXISTS idx_contact_tag ON contact_tags(contact_id);
"#;
