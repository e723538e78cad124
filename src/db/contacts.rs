use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use std::collections::HashMap;
use uuid::Uuid;

use super::{escape_like, parse_timestamp, parse_uuid, timestamp, Database};
use crate::models::{Contact, ContactDetail, ContactInput, ContactWithTags, Tag};

impl Database {
    // ==================== CONTACT CREATE ====================

    /// Validate input and insert a new contact.
    pub fn create_contact(&self, input: &ContactInput) -> Result<Contact> {
        input.validate()?;
        let contact = input.clone().into_contact();
        self.insert_contact(&contact)?;
        tracing::info!(contact_id = %contact.id, "created contact");
        Ok(contact)
    }

    pub(crate) fn insert_contact(&self, contact: &Contact) -> Result<()> {
        self.conn.execute(
            r#"INSERT INTO contacts (
                id, name, email, phone, company, title, notes, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                contact.id.to_string(),
                contact.name,
                contact.email,
                contact.phone,
                contact.company,
                contact.title,
                contact.notes,
                timestamp(&contact.created_at),
                timestamp(&contact.updated_at),
            ],
        )?;
        Ok(())
    }

    // ==================== CONTACT READ ====================

    pub fn get_contact(&self, id: Uuid) -> Result<Option<Contact>> {
        let contact = self
            .conn
            .query_row(
                "SELECT * FROM contacts WHERE id = ?",
                [id.to_string()],
                Self::row_to_contact,
            )
            .optional()?;
        Ok(contact)
    }

    /// Contacts whose name contains `query`, case-insensitive, by name.
    pub fn find_contacts_by_name(&self, query: &str, limit: u32) -> Result<Vec<Contact>> {
        let pattern = format!("%{}%", escape_like(query.trim()));
        let mut stmt = self.conn.prepare(
            r#"SELECT * FROM contacts
               WHERE name LIKE ?1 ESCAPE '\'
               ORDER BY name COLLATE NOCASE
               LIMIT ?2"#,
        )?;

        let contacts = stmt
            .query_map(params![pattern, limit], Self::row_to_contact)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(contacts)
    }

    /// List contacts by name. `search` matches name or company
    /// case-insensitively; `tag_id` keeps only contacts carrying that tag.
    pub fn list_contacts(
        &self,
        search: Option<&str>,
        tag_id: Option<Uuid>,
    ) -> Result<Vec<ContactWithTags>> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", escape_like(s)));
        let tag = tag_id.map(|id| id.to_string());

        let mut stmt = self.conn.prepare(
            r#"SELECT c.* FROM contacts c
               WHERE (?1 IS NULL
                      OR casefold(c.name) LIKE casefold(?1) ESCAPE '\'
                      OR casefold(c.company) LIKE casefold(?1) ESCAPE '\')
                 AND (?2 IS NULL OR EXISTS (
                      SELECT 1 FROM contact_tags ct
                      WHERE ct.contact_id = c.id AND ct.tag_id = ?2))
               ORDER BY c.name COLLATE NOCASE"#,
        )?;

        let contacts = stmt
            .query_map(params![pattern, tag], Self::row_to_contact)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let ids: Vec<Uuid> = contacts.iter().map(|c| c.id).collect();
        let mut tags = self.get_tags_for_contacts(&ids)?;

        Ok(contacts
            .into_iter()
            .map(|contact| {
                let tags = tags.remove(&contact.id).unwrap_or_default();
                ContactWithTags { contact, tags }
            })
            .collect())
    }

    pub fn count_contacts(&self) -> Result<u32> {
        let count: u32 = self
            .conn
            .query_row("SELECT COUNT(*) FROM contacts", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Contact with interactions, follow-ups and tags
    pub fn get_contact_detail(&self, id: Uuid) -> Result<Option<ContactDetail>> {
        let Some(contact) = self.get_contact(id)? else {
            return Ok(None);
        };

        Ok(Some(ContactDetail {
            interactions: self.get_interactions_for_contact(id, None)?,
            follow_ups: self.get_follow_ups_for_contact(id, false)?,
            tags: self.get_tags_for_contact(id)?,
            contact,
        }))
    }

    /// Tags for many contacts in a single query
    fn get_tags_for_contacts(&self, contact_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<Tag>>> {
        if contact_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders: Vec<&str> = contact_ids.iter().map(|_| "?").collect();
        let sql = format!(
            r#"SELECT ct.contact_id, t.id, t.name, t.color
               FROM contact_tags ct
               JOIN tags t ON t.id = ct.tag_id
               WHERE ct.contact_id IN ({})
               ORDER BY t.name"#,
            placeholders.join(", ")
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let id_strings: Vec<String> = contact_ids.iter().map(|id| id.to_string()).collect();

        let rows = stmt
            .query_map(rusqlite::params_from_iter(id_strings.iter()), |row| {
                let contact_id: String = row.get(0)?;
                let tag_id: String = row.get(1)?;
                Ok((
                    parse_uuid(&contact_id)?,
                    Tag {
                        id: parse_uuid(&tag_id)?,
                        name: row.get(2)?,
                        color: row.get(3)?,
                    },
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut map: HashMap<Uuid, Vec<Tag>> = HashMap::new();
        for (contact_id, tag) in rows {
            map.entry(contact_id).or_default().push(tag);
        }
        Ok(map)
    }

    // ==================== CONTACT UPDATE ====================

    /// Validate input and overwrite the contact's fields. Returns false if
    /// the contact does not exist.
    pub fn update_contact(&self, id: Uuid, input: &ContactInput) -> Result<bool> {
        input.validate()?;
        let Some(mut contact) = self.get_contact(id)? else {
            return Ok(false);
        };
        input.apply_to(&mut contact);
        contact.updated_at = Utc::now();

        let rows = self.conn.execute(
            r#"UPDATE contacts SET
                name = ?, email = ?, phone = ?, company = ?, title = ?, notes = ?,
                updated_at = ?
               WHERE id = ?"#,
            params![
                contact.name,
                contact.email,
                contact.phone,
                contact.company,
                contact.title,
                contact.notes,
                timestamp(&contact.updated_at),
                contact.id.to_string(),
            ],
        )?;
        tracing::info!(contact_id = %id, "updated contact");
        Ok(rows > 0)
    }

    // ==================== CONTACT DELETE ====================

    /// Hard delete a contact; links and follow-ups go with it (via CASCADE).
    pub fn delete_contact(&self, id: Uuid) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM contacts WHERE id = ?", [id.to_string()])?;
        if rows > 0 {
            tracing::info!(contact_id = %id, "deleted contact");
        }
        Ok(rows > 0)
    }

    pub(crate) fn row_to_contact(row: &Row) -> rusqlite::Result<Contact> {
        let id: String = row.get("id")?;
        let created_at: String = row.get("created_at")?;
        let updated_at: String = row.get("updated_at")?;

        Ok(Contact {
            id: parse_uuid(&id)?,
            name: row.get("name")?,
            email: row.get("email")?,
            phone: row.get("phone")?,
            company: row.get("company")?,
            title: row.get("title")?,
            notes: row.get("notes")?,
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationErrors;
    use crate::models::TagInput;

    fn add(db: &Database, name: &str, company: Option<&str>) -> Contact {
        db.create_contact(&ContactInput {
            name: name.to_string(),
            company: company.map(str::to_string),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_create_and_get_contact() {
        let db = Database::open_memory().unwrap();
        let contact = db
            .create_contact(&ContactInput {
                name: "Ada Lovelace".to_string(),
                email: Some("ada@example.com".to_string()),
                phone: Some(String::new()),
                ..Default::default()
            })
            .unwrap();

        let retrieved = db.get_contact(contact.id).unwrap().unwrap();
        assert_eq!(retrieved.name, "Ada Lovelace");
        assert_eq!(retrieved.email.as_deref(), Some("ada@example.com"));
        assert_eq!(retrieved.phone, None);
    }

    #[test]
    fn test_create_rejects_invalid_input() {
        let db = Database::open_memory().unwrap();
        let err = db.create_contact(&ContactInput::default()).unwrap_err();
        let errors = err.downcast_ref::<ValidationErrors>().unwrap();
        assert_eq!(errors.field("name"), ["Name is required".to_string()]);
        assert_eq!(db.count_contacts().unwrap(), 0);
    }

    #[test]
    fn test_list_search_name_or_company() {
        let db = Database::open_memory().unwrap();
        add(&db, "Zed Shaw", Some("ACME Corp"));
        add(&db, "Ada Lovelace", None);
        add(&db, "Acme Fan", None);

        let all = db.list_contacts(None, None).unwrap();
        let names: Vec<&str> = all.iter().map(|c| c.contact.name.as_str()).collect();
        assert_eq!(names, vec!["Acme Fan", "Ada Lovelace", "Zed Shaw"]);

        let acme = db.list_contacts(Some("acme"), None).unwrap();
        assert_eq!(acme.len(), 2);
    }

    #[test]
    fn test_list_by_tag() {
        let db = Database::open_memory().unwrap();
        let ada = add(&db, "Ada", None);
        add(&db, "Bob", None);
        let tag = db
            .create_tag(&TagInput {
                name: "investor".to_string(),
                color: None,
            })
            .unwrap();
        db.assign_tag(ada.id, tag.id).unwrap();

        let tagged = db.list_contacts(None, Some(tag.id)).unwrap();
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].contact.id, ada.id);
        assert_eq!(tagged[0].tags[0].name, "investor");
    }

    #[test]
    fn test_update_contact() {
        let db = Database::open_memory().unwrap();
        let contact = add(&db, "Ada", None);

        let updated = db
            .update_contact(
                contact.id,
                &ContactInput {
                    name: "Ada King".to_string(),
                    title: Some("Countess".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(updated);

        let retrieved = db.get_contact(contact.id).unwrap().unwrap();
        assert_eq!(retrieved.name, "Ada King");
        assert_eq!(retrieved.title.as_deref(), Some("Countess"));
        assert!(retrieved.updated_at >= contact.updated_at);

        let missing = db
            .update_contact(Uuid::new_v4(), &ContactInput {
                name: "Nobody".to_string(),
                ..Default::default()
            })
            .unwrap();
        assert!(!missing);
    }

    #[test]
    fn test_delete_contact() {
        let db = Database::open_memory().unwrap();
        let contact = add(&db, "Ada", None);

        assert!(db.delete_contact(contact.id).unwrap());
        assert!(db.get_contact(contact.id).unwrap().is_none());
        assert!(!db.delete_contact(contact.id).unwrap());
    }

    #[test]
    fn test_find_by_name() {
        let db = Database::open_memory().unwrap();
        add(&db, "Grace Hopper", None);
        add(&db, "Grace Kelly", None);
        add(&db, "Alan Turing", None);

        assert_eq!(db.find_contacts_by_name("grace", 10).unwrap().len(), 2);
        assert_eq!(db.find_contacts_by_name("TURING", 10).unwrap().len(), 1);
        assert!(db.find_contacts_by_name("100%", 10).unwrap().is_empty());
    }
}
