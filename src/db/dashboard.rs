use anyhow::{anyhow, Result};
use chrono::{Duration, NaiveDate, NaiveTime};
use rusqlite::params;

use super::{date_string, timestamp, Database};
use crate::models::{Contact, Dashboard, FollowUpWithContact, InteractionWithContacts};

/// Default window for "needs attention"
pub const DEFAULT_ATTENTION_DAYS: u32 = 30;
const RECENT_LIMIT: u32 = 5;

impl Database {
    /// Open follow-ups due before `today`, oldest first
    pub fn overdue_follow_ups(&self, today: NaiveDate) -> Result<Vec<FollowUpWithContact>> {
        let mut stmt = self.conn.prepare(
            r#"SELECT f.*, c.name AS contact_name
               FROM follow_ups f
               LEFT JOIN contacts c ON c.id = f.contact_id
               WHERE f.completed_at IS NULL AND f.due_date < ?
               ORDER BY f.due_date ASC"#,
        )?;
        let follow_ups = stmt
            .query_map([date_string(&today)], Self::row_to_follow_up_with_contact)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(follow_ups)
    }

    pub fn recent_interactions(&self, limit: u32) -> Result<Vec<InteractionWithContacts>> {
        self.list_interactions(None, Some(limit))
    }

    /// Contacts with no interaction on or after `since`, including contacts
    /// never interacted with. Longest-neglected first.
    pub fn needs_attention(&self, since: NaiveDate) -> Result<Vec<Contact>> {
        let cutoff = timestamp(&since.and_time(NaiveTime::MIN).and_utc());
        let mut stmt = self.conn.prepare(
            r#"SELECT c.*, MAX(i.occurred_at) AS last_seen
               FROM contacts c
               LEFT JOIN interaction_contacts ic ON ic.contact_id = c.id
               LEFT JOIN interactions i ON i.id = ic.interaction_id
               GROUP BY c.id
               HAVING last_seen IS NULL OR last_seen < ?1
               ORDER BY last_seen IS NOT NULL, last_seen ASC, c.name COLLATE NOCASE"#,
        )?;
        let contacts = stmt
            .query_map(params![cutoff], Self::row_to_contact)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(contacts)
    }

    /// Overview as of `today` with a `days` attention window
    pub fn dashboard(&self, today: NaiveDate, days: u32) -> Result<Dashboard> {
        let since = today
            .checked_sub_signed(Duration::days(i64::from(days)))
            .ok_or_else(|| anyhow!("Attention window of {} days is out of range", days))?;
        Ok(Dashboard {
            today,
            contact_count: self.count_contacts()?,
            overdue: self.overdue_follow_ups(today)?,
            recent: self.recent_interactions(RECENT_LIMIT)?,
            needs_attention: self.needs_attention(since)?,
            attention_days: days,
        })
    }
}
