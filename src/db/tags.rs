use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use super::{parse_uuid, timestamp, Database};
use crate::error::ValidationErrors;
use crate::models::{Tag, TagInput};

impl Database {
    /// Validate and insert a tag. Names are unique.
    pub fn create_tag(&self, input: &TagInput) -> Result<Tag> {
        input.validate()?;
        let tag = input.clone().into_tag();

        if self.get_tag_by_name(&tag.name)?.is_some() {
            let mut errors = ValidationErrors::new();
            errors.add("name", "A tag with this name already exists");
            return Err(errors.into());
        }

        self.conn.execute(
            "INSERT INTO tags (id, name, color) VALUES (?, ?, ?)",
            params![tag.id.to_string(), tag.name, tag.color],
        )?;
        tracing::info!(tag_id = %tag.id, name = %tag.name, "created tag");
        Ok(tag)
    }

    pub fn list_tags(&self) -> Result<Vec<Tag>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, color FROM tags ORDER BY name COLLATE NOCASE")?;
        let tags = stmt
            .query_map([], Self::row_to_tag)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }

    /// Case-insensitive lookup
    pub fn get_tag_by_name(&self, name: &str) -> Result<Option<Tag>> {
        let tag = self
            .conn
            .query_row(
                "SELECT id, name, color FROM tags WHERE name = ? COLLATE NOCASE",
                [name.trim()],
                Self::row_to_tag,
            )
            .optional()?;
        Ok(tag)
    }

    /// Delete a tag; contact assignments go with it.
    pub fn delete_tag(&self, id: Uuid) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM tags WHERE id = ?", [id.to_string()])?;
        if rows > 0 {
            tracing::info!(tag_id = %id, "deleted tag");
        }
        Ok(rows > 0)
    }

    /// Attach a tag to a contact. Assigning twice is a no-op.
    pub fn assign_tag(&self, contact_id: Uuid, tag_id: Uuid) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO contact_tags (contact_id, tag_id, added_at) VALUES (?, ?, ?)",
            params![
                contact_id.to_string(),
                tag_id.to_string(),
                timestamp(&Utc::now())
            ],
        )?;
        tracing::debug!(contact_id = %contact_id, tag_id = %tag_id, "assigned tag");
        Ok(())
    }

    pub fn remove_tag(&self, contact_id: Uuid, tag_id: Uuid) -> Result<bool> {
        let rows = self.conn.execute(
            "DELETE FROM contact_tags WHERE contact_id = ? AND tag_id = ?",
            [contact_id.to_string(), tag_id.to_string()],
        )?;
        Ok(rows > 0)
    }

    pub fn get_tags_for_contact(&self, contact_id: Uuid) -> Result<Vec<Tag>> {
        let mut stmt = self.conn.prepare(
            r#"SELECT t.id, t.name, t.color FROM tags t
               JOIN contact_tags ct ON ct.tag_id = t.id
               WHERE ct.contact_id = ?
               ORDER BY t.name COLLATE NOCASE"#,
        )?;
        let tags = stmt
            .query_map([contact_id.to_string()], Self::row_to_tag)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }

    fn row_to_tag(row: &Row) -> rusqlite::Result<Tag> {
        let id: String = row.get("id")?;
        Ok(Tag {
            id: parse_uuid(&id)?,
            name: row.get("name")?,
            color: row.get("color")?,
        })
    }
}
