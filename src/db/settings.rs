use anyhow::Result;
use rusqlite::OptionalExtension;

use super::Database;

impl Database {
    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM app_settings WHERE key = ?",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO app_settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [key, value],
        )?;
        Ok(())
    }

    pub fn delete_setting(&self, key: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM app_settings WHERE key = ?", [key])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setting_crud() {
        let db = Database::open_memory().unwrap();
        assert_eq!(db.get_setting("ai_provider").unwrap(), None);

        db.set_setting("ai_provider", "anthropic").unwrap();
        assert_eq!(db.get_setting("ai_provider").unwrap().as_deref(), Some("anthropic"));

        db.set_setting("ai_provider", "openai").unwrap();
        assert_eq!(db.get_setting("ai_provider").unwrap().as_deref(), Some("openai"));

        assert!(db.delete_setting("ai_provider").unwrap());
        assert!(!db.delete_setting("ai_provider").unwrap());
        assert_eq!(db.get_setting("ai_provider").unwrap(), None);
    }
}
