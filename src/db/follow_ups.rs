use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use super::{date_string, parse_date, parse_timestamp, parse_uuid, timestamp, Database};
use crate::error::ValidationErrors;
use crate::models::{ContactRef, FollowUp, FollowUpInput, FollowUpWithContact, Priority};

/// Follow-up columns plus the owning contact's name
const SELECT_WITH_CONTACT: &str = r#"SELECT f.*, c.name AS contact_name
    FROM follow_ups f
    LEFT JOIN contacts c ON c.id = f.contact_id"#;

impl Database {
    // ==================== FOLLOW-UP CREATE ====================

    pub fn create_follow_up(&self, input: &FollowUpInput) -> Result<FollowUp> {
        self.validate_follow_up(input)?;
        let mut follow_up = FollowUp::new(Uuid::nil(), String::new(), Utc::now().date_naive());
        input.apply_to(&mut follow_up);

        self.conn.execute(
            r#"INSERT INTO follow_ups (
                id, contact_id, title, description, due_date, priority,
                completed_at, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                follow_up.id.to_string(),
                follow_up.contact_id.to_string(),
                follow_up.title,
                follow_up.description,
                date_string(&follow_up.due_date),
                follow_up.priority.as_str(),
                follow_up.completed_at.as_ref().map(timestamp),
                timestamp(&follow_up.created_at),
                timestamp(&follow_up.updated_at),
            ],
        )?;
        tracing::info!(
            follow_up_id = %follow_up.id,
            contact_id = %follow_up.contact_id,
            "created follow-up"
        );
        Ok(follow_up)
    }

    /// Field validation plus the check that the contact exists
    fn validate_follow_up(&self, input: &FollowUpInput) -> Result<()> {
        input.validate()?;
        if let Some(contact_id) = input.contact_id {
            if self.get_contact(contact_id)?.is_none() {
                let mut errors = ValidationErrors::new();
                errors.add("contact_id", "Select a contact");
                return Err(errors.into());
            }
        }
        Ok(())
    }

    // ==================== FOLLOW-UP READ ====================

    pub fn get_follow_up(&self, id: Uuid) -> Result<Option<FollowUpWithContact>> {
        let sql = format!("{} WHERE f.id = ?", SELECT_WITH_CONTACT);
        let follow_up = self
            .conn
            .query_row(&sql, [id.to_string()], Self::row_to_follow_up_with_contact)
            .optional()?;
        Ok(follow_up)
    }

    /// By due date. `completed`: `Some(false)` open only, `Some(true)` done
    /// only, `None` everything.
    pub fn list_follow_ups(&self, completed: Option<bool>) -> Result<Vec<FollowUpWithContact>> {
        let filter = match completed {
            Some(false) => "WHERE f.completed_at IS NULL",
            Some(true) => "WHERE f.completed_at IS NOT NULL",
            None => "",
        };
        let sql = format!(
            "{} {} ORDER BY f.due_date ASC, f.priority = 'high' DESC, f.created_at ASC",
            SELECT_WITH_CONTACT, filter
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let follow_ups = stmt
            .query_map([], Self::row_to_follow_up_with_contact)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(follow_ups)
    }

    /// A contact's follow-ups by due date; `open_only` drops completed ones
    pub fn get_follow_ups_for_contact(
        &self,
        contact_id: Uuid,
        open_only: bool,
    ) -> Result<Vec<FollowUp>> {
        let sql = if open_only {
            "SELECT * FROM follow_ups
             WHERE contact_id = ? AND completed_at IS NULL
             ORDER BY due_date"
        } else {
            "SELECT * FROM follow_ups WHERE contact_id = ? ORDER BY due_date"
        };

        let mut stmt = self.conn.prepare(sql)?;
        let follow_ups = stmt
            .query_map([contact_id.to_string()], Self::row_to_follow_up)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(follow_ups)
    }

    // ==================== FOLLOW-UP UPDATE ====================

    pub fn update_follow_up(&self, id: Uuid, input: &FollowUpInput) -> Result<bool> {
        self.validate_follow_up(input)?;
        let Some(existing) = self.get_follow_up(id)? else {
            return Ok(false);
        };
        let mut follow_up = existing.follow_up;
        input.apply_to(&mut follow_up);
        follow_up.updated_at = Utc::now();

        let rows = self.conn.execute(
            r#"UPDATE follow_ups SET
                contact_id = ?, title = ?, description = ?, due_date = ?, priority = ?,
                updated_at = ?
               WHERE id = ?"#,
            params![
                follow_up.contact_id.to_string(),
                follow_up.title,
                follow_up.description,
                date_string(&follow_up.due_date),
                follow_up.priority.as_str(),
                timestamp(&follow_up.updated_at),
                id.to_string(),
            ],
        )?;
        tracing::info!(follow_up_id = %id, "updated follow-up");
        Ok(rows > 0)
    }

    /// Mark done as of `at`
    pub fn complete_follow_up(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool> {
        self.set_completed_at(id, Some(at))
    }

    pub fn reopen_follow_up(&self, id: Uuid) -> Result<bool> {
        self.set_completed_at(id, None)
    }

    fn set_completed_at(&self, id: Uuid, at: Option<DateTime<Utc>>) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE follow_ups SET completed_at = ?, updated_at = ? WHERE id = ?",
            params![
                at.as_ref().map(timestamp),
                timestamp(&Utc::now()),
                id.to_string()
            ],
        )?;
        tracing::info!(follow_up_id = %id, completed = at.is_some(), "changed follow-up status");
        Ok(rows > 0)
    }

    // ==================== FOLLOW-UP DELETE ====================

    pub fn delete_follow_up(&self, id: Uuid) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM follow_ups WHERE id = ?", [id.to_string()])?;
        if rows > 0 {
            tracing::info!(follow_up_id = %id, "deleted follow-up");
        }
        Ok(rows > 0)
    }

    pub(crate) fn row_to_follow_up(row: &Row) -> rusqlite::Result<FollowUp> {
        let id: String = row.get("id")?;
        let contact_id: String = row.get("contact_id")?;
        let due_date: String = row.get("due_date")?;
        let priority: String = row.get("priority")?;
        let completed_at: Option<String> = row.get("completed_at")?;
        let created_at: String = row.get("created_at")?;
        let updated_at: String = row.get("updated_at")?;

        Ok(FollowUp {
            id: parse_uuid(&id)?,
            contact_id: parse_uuid(&contact_id)?,
            title: row.get("title")?,
            description: row.get("description")?,
            due_date: parse_date(&due_date)?,
            priority: priority.parse().unwrap_or(Priority::Medium),
            completed_at: completed_at.as_deref().map(parse_timestamp).transpose()?,
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        })
    }

    pub(crate) fn row_to_follow_up_with_contact(
        row: &Row,
    ) -> rusqlite::Result<FollowUpWithContact> {
        let follow_up = Self::row_to_follow_up(row)?;
        let contact_name: Option<String> = row.get("contact_name")?;
        Ok(FollowUpWithContact {
            contact: contact_name.map(|name| ContactRef {
                id: follow_up.contact_id,
                name,
            }),
            follow_up,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Contact, ContactInput};
    use chrono::NaiveDate;

    fn add_contact(db: &Database, name: &str) -> Contact {
        db.create_contact(&ContactInput {
            name: name.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn input(contact: &Contact, title: &str, due: &str) -> FollowUpInput {
        FollowUpInput {
            contact_id: Some(contact.id),
            title: title.to_string(),
            description: None,
            due_date: Some(date(due)),
            priority: Priority::Medium,
        }
    }

    #[test]
    fn test_create_and_get() {
        let db = Database::open_memory().unwrap();
        let ada = add_contact(&db, "Ada");
        let mut i = input(&ada, "Send proposal", "2024-06-15");
        i.priority = Priority::High;
        i.description = Some("Include pricing".to_string());

        let created = db.create_follow_up(&i).unwrap();
        let fetched = db.get_follow_up(created.id).unwrap().unwrap();

        assert_eq!(fetched.follow_up.title, "Send proposal");
        assert_eq!(fetched.follow_up.due_date, date("2024-06-15"));
        assert_eq!(fetched.follow_up.priority, Priority::High);
        assert_eq!(fetched.contact.unwrap().name, "Ada");
        assert!(!fetched.follow_up.is_completed());
    }

    #[test]
    fn test_unknown_contact_is_validation_error() {
        let db = Database::open_memory().unwrap();
        let ghost = Contact::new("Ghost".to_string());
        let err = db.create_follow_up(&input(&ghost, "Boo", "2024-06-15")).unwrap_err();
        let errors = err.downcast_ref::<ValidationErrors>().unwrap();
        assert_eq!(errors.field("contact_id"), ["Select a contact".to_string()]);
    }

    #[test]
    fn test_complete_and_filter() {
        let db = Database::open_memory().unwrap();
        let ada = add_contact(&db, "Ada");
        let later = db.create_follow_up(&input(&ada, "Later", "2024-07-01")).unwrap();
        let sooner = db.create_follow_up(&input(&ada, "Sooner", "2024-06-01")).unwrap();

        let all = db.list_follow_ups(None).unwrap();
        assert_eq!(all[0].follow_up.id, sooner.id);

        assert!(db.complete_follow_up(sooner.id, Utc::now()).unwrap());
        let open = db.list_follow_ups(Some(false)).unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].follow_up.id, later.id);

        let done = db.list_follow_ups(Some(true)).unwrap();
        assert_eq!(done.len(), 1);
        assert!(done[0].follow_up.completed_at.is_some());

        assert!(db.reopen_follow_up(sooner.id).unwrap());
        assert_eq!(db.list_follow_ups(Some(false)).unwrap().len(), 2);
        assert_eq!(db.get_follow_ups_for_contact(ada.id, true).unwrap().len(), 2);
    }

    #[test]
    fn test_update_and_delete() {
        let db = Database::open_memory().unwrap();
        let ada = add_contact(&db, "Ada");
        let bob = add_contact(&db, "Bob");
        let created = db.create_follow_up(&input(&ada, "Call", "2024-06-01")).unwrap();

        assert!(db
            .update_follow_up(created.id, &input(&bob, "Call Bob instead", "2024-06-02"))
            .unwrap());
        let fetched = db.get_follow_up(created.id).unwrap().unwrap();
        assert_eq!(fetched.follow_up.contact_id, bob.id);
        assert_eq!(fetched.follow_up.title, "Call Bob instead");

        assert!(db.delete_follow_up(created.id).unwrap());
        assert!(db.get_follow_up(created.id).unwrap().is_none());
    }

    #[test]
    fn test_contact_delete_cascades() {
        let db = Database::open_memory().unwrap();
        let ada = add_contact(&db, "Ada");
        let created = db.create_follow_up(&input(&ada, "Call", "2024-06-01")).unwrap();

        db.delete_contact(ada.id).unwrap();
        assert!(db.get_follow_up(created.id).unwrap().is_none());
    }
}
