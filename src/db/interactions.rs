use anyhow::{anyhow, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use uuid::Uuid;

use super::{parse_timestamp, parse_uuid, timestamp, Database};
use crate::models::{
    ContactRef, Interaction, InteractionInput, InteractionType, InteractionWithContacts,
};

impl Database {
    // ==================== INTERACTION CREATE ====================

    /// Validate input, insert the interaction and link it to its contacts in
    /// one transaction.
    pub fn create_interaction(&self, input: &InteractionInput) -> Result<Interaction> {
        input.validate()?;
        let mut interaction = Interaction::new(input.interaction_type);
        input.apply_to(&mut interaction);

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            r#"INSERT INTO interactions (
                id, type, title, content, occurred_at, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)"#,
            params![
                interaction.id.to_string(),
                interaction.interaction_type.as_str(),
                interaction.title,
                interaction.content,
                timestamp(&interaction.occurred_at),
                timestamp(&interaction.created_at),
                timestamp(&interaction.updated_at),
            ],
        )?;
        link_contacts(&tx, interaction.id, &input.contact_ids)?;
        tx.commit()?;

        tracing::info!(
            interaction_id = %interaction.id,
            contacts = input.contact_ids.len(),
            "created interaction"
        );
        Ok(interaction)
    }

    // ==================== INTERACTION READ ====================

    pub fn get_interaction(&self, id: Uuid) -> Result<Option<InteractionWithContacts>> {
        let interaction = self
            .conn
            .query_row(
                "SELECT * FROM interactions WHERE id = ?",
                [id.to_string()],
                Self::row_to_interaction,
            )
            .optional()?;

        let Some(interaction) = interaction else {
            return Ok(None);
        };
        let mut contacts = self.get_linked_contacts(&[id])?;
        Ok(Some(InteractionWithContacts {
            contacts: contacts.remove(&id).unwrap_or_default(),
            interaction,
        }))
    }

    /// Newest first, optionally filtered by type and capped at `limit`
    pub fn list_interactions(
        &self,
        interaction_type: Option<InteractionType>,
        limit: Option<u32>,
    ) -> Result<Vec<InteractionWithContacts>> {
        let mut stmt = self.conn.prepare(
            r#"SELECT * FROM interactions
               WHERE (?1 IS NULL OR type = ?1)
               ORDER BY occurred_at DESC
               LIMIT ?2"#,
        )?;

        // SQLite treats a negative LIMIT as no limit
        let limit = limit.map(i64::from).unwrap_or(-1);
        let interactions = stmt
            .query_map(
                params![interaction_type.map(|t| t.as_str()), limit],
                Self::row_to_interaction,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        self.attach_contacts(interactions)
    }

    /// Interactions linked to one contact, newest first
    pub fn get_interactions_for_contact(
        &self,
        contact_id: Uuid,
        limit: Option<u32>,
    ) -> Result<Vec<Interaction>> {
        let mut stmt = self.conn.prepare(
            r#"SELECT i.* FROM interactions i
               JOIN interaction_contacts ic ON ic.interaction_id = i.id
               WHERE ic.contact_id = ?1
               ORDER BY i.occurred_at DESC
               LIMIT ?2"#,
        )?;

        let limit = limit.map(i64::from).unwrap_or(-1);
        let interactions = stmt
            .query_map(
                params![contact_id.to_string(), limit],
                Self::row_to_interaction,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(interactions)
    }

    pub(crate) fn attach_contacts(
        &self,
        interactions: Vec<Interaction>,
    ) -> Result<Vec<InteractionWithContacts>> {
        let ids: Vec<Uuid> = interactions.iter().map(|i| i.id).collect();
        let mut contacts = self.get_linked_contacts(&ids)?;

        Ok(interactions
            .into_iter()
            .map(|interaction| InteractionWithContacts {
                contacts: contacts.remove(&interaction.id).unwrap_or_default(),
                interaction,
            })
            .collect())
    }

    /// Linked contacts for many interactions in a single query
    fn get_linked_contacts(
        &self,
        interaction_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<ContactRef>>> {
        if interaction_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders: Vec<&str> = interaction_ids.iter().map(|_| "?").collect();
        let sql = format!(
            r#"SELECT ic.interaction_id, c.id, c.name
               FROM interaction_contacts ic
               JOIN contacts c ON c.id = ic.contact_id
               WHERE ic.interaction_id IN ({})
               ORDER BY c.name COLLATE NOCASE"#,
            placeholders.join(", ")
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let id_strings: Vec<String> = interaction_ids.iter().map(|id| id.to_string()).collect();

        let rows = stmt
            .query_map(rusqlite::params_from_iter(id_strings.iter()), |row| {
                let interaction_id: String = row.get(0)?;
                let contact_id: String = row.get(1)?;
                Ok((
                    parse_uuid(&interaction_id)?,
                    ContactRef {
                        id: parse_uuid(&contact_id)?,
                        name: row.get(2)?,
                    },
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut map: HashMap<Uuid, Vec<ContactRef>> = HashMap::new();
        for (interaction_id, contact) in rows {
            map.entry(interaction_id).or_default().push(contact);
        }
        Ok(map)
    }

    // ==================== INTERACTION UPDATE ====================

    /// Overwrite fields and replace the contact links. Returns false if the
    /// interaction does not exist.
    pub fn update_interaction(&self, id: Uuid, input: &InteractionInput) -> Result<bool> {
        input.validate()?;
        let Some(existing) = self.get_interaction(id)? else {
            return Ok(false);
        };
        let mut interaction = existing.interaction;
        input.apply_to(&mut interaction);
        interaction.updated_at = Utc::now();

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            r#"UPDATE interactions SET
                type = ?, title = ?, content = ?, occurred_at = ?, updated_at = ?
               WHERE id = ?"#,
            params![
                interaction.interaction_type.as_str(),
                interaction.title,
                interaction.content,
                timestamp(&interaction.occurred_at),
                timestamp(&interaction.updated_at),
                id.to_string(),
            ],
        )?;
        tx.execute(
            "DELETE FROM interaction_contacts WHERE interaction_id = ?",
            [id.to_string()],
        )?;
        link_contacts(&tx, id, &input.contact_ids)?;
        tx.commit()?;

        tracing::info!(interaction_id = %id, "updated interaction");
        Ok(true)
    }

    // ==================== INTERACTION DELETE ====================

    pub fn delete_interaction(&self, id: Uuid) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM interactions WHERE id = ?", [id.to_string()])?;
        if rows > 0 {
            tracing::info!(interaction_id = %id, "deleted interaction");
        }
        Ok(rows > 0)
    }

    pub(crate) fn row_to_interaction(row: &Row) -> rusqlite::Result<Interaction> {
        let id: String = row.get("id")?;
        let interaction_type: String = row.get("type")?;
        let occurred_at: String = row.get("occurred_at")?;
        let created_at: String = row.get("created_at")?;
        let updated_at: String = row.get("updated_at")?;

        Ok(Interaction {
            id: parse_uuid(&id)?,
            interaction_type: interaction_type.parse().unwrap_or_default(),
            title: row.get("title")?,
            content: row.get("content")?,
            occurred_at: parse_timestamp(&occurred_at)?,
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        })
    }
}

fn link_contacts(conn: &Connection, interaction_id: Uuid, contact_ids: &[Uuid]) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO interaction_contacts (interaction_id, contact_id) VALUES (?, ?)",
    )?;
    for contact_id in contact_ids {
        stmt.execute([interaction_id.to_string(), contact_id.to_string()])
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(err, _)
                    if err.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    anyhow!("Contact not found: {}", contact_id)
                }
                other => other.into(),
            })?;
    }
    Ok(())
}
