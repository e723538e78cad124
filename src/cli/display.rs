use chrono::NaiveDate;
use serde::Serialize;

use super::ui::{local_time, short_id, truncate};
use crate::models::{
    ContactDetail, ContactRef, ContactWithTags, Dashboard, FollowUp, FollowUpWithContact,
    Interaction, InteractionWithContacts, Tag,
};
use crate::search::{Filter, SearchOutcome};

/// Print any serializable value as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn contact_names(contacts: &[ContactRef]) -> String {
    if contacts.is_empty() {
        return "(no contacts)".to_string();
    }
    contacts
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

// ==================== CONTACTS ====================

/// Print a full contact detail (only non-empty fields)
pub fn print_contact_detail(detail: &ContactDetail, today: NaiveDate) {
    let contact = &detail.contact;
    println!("{}  [{}]\n", contact.name, short_id(&contact.id));

    if let Some(headline) = contact.headline() {
        println!("  {}", headline);
    }
    for value in [&contact.email, &contact.phone].into_iter().flatten() {
        println!("  {}", value);
    }
    if !detail.tags.is_empty() {
        println!("  #{}", detail.tag_names().join(" #"));
    }
    if let Some(notes) = contact.notes.as_deref().filter(|n| !n.is_empty()) {
        println!("  {}", truncate(notes, 60));
    }
    if let Some(last) = detail.last_interaction() {
        println!("\n  Last contact {} ({})", local_time(&last.occurred_at), last.interaction_type);
    }

    let open: Vec<&FollowUp> = detail.open_follow_ups().collect();
    if !open.is_empty() {
        println!("\nFollow-ups");
        for f in open {
            print_follow_up_line(f, None, today);
        }
    }

    if !detail.interactions.is_empty() {
        println!("\nInteractions");
        for i in &detail.interactions {
            print_interaction_line(i, None);
        }
    }
}

pub fn print_contact_list(contacts: &[ContactWithTags]) {
    if contacts.is_empty() {
        println!("No contacts.");
        return;
    }
    for c in contacts {
        let headline = c.contact.headline().unwrap_or_default();
        let tags = if c.tags.is_empty() {
            String::new()
        } else {
            format!(
                "  #{}",
                c.tags.iter().map(|t| t.name.as_str()).collect::<Vec<_>>().join(" #")
            )
        };
        println!(
            "{}  {:<24} {}{}",
            short_id(&c.contact.id),
            truncate(&c.contact.name, 24),
            truncate(&headline, 40),
            tags
        );
    }
}

// ==================== INTERACTIONS ====================

fn print_interaction_line(i: &Interaction, contacts: Option<&[ContactRef]>) {
    let with = contacts
        .map(|c| format!("  with {}", contact_names(c)))
        .unwrap_or_default();
    println!(
        "  {}  {}  {:<8} {}{}",
        short_id(&i.id),
        local_time(&i.occurred_at),
        i.interaction_type.as_str(),
        truncate(&i.label(), 50),
        with
    );
}

pub fn print_interaction_list(interactions: &[InteractionWithContacts]) {
    if interactions.is_empty() {
        println!("No interactions.");
        return;
    }
    for i in interactions {
        print_interaction_line(&i.interaction, Some(&i.contacts));
    }
}

pub fn print_interactions(interactions: &[Interaction]) {
    if interactions.is_empty() {
        println!("No interactions.");
        return;
    }
    for i in interactions {
        print_interaction_line(i, None);
    }
}

pub fn print_interaction_detail(i: &InteractionWithContacts) {
    let interaction = &i.interaction;
    println!("{}  [{}]\n", interaction.label(), short_id(&interaction.id));
    println!("  {} on {}", interaction.interaction_type, local_time(&interaction.occurred_at));
    println!("  with {}", contact_names(&i.contacts));
    if let Some(content) = &interaction.content {
        println!();
        for line in content.lines() {
            println!("  {}", line);
        }
    }
}

// ==================== FOLLOW-UPS ====================

fn print_follow_up_line(f: &FollowUp, contact: Option<&ContactRef>, today: NaiveDate) {
    let marker = if f.is_completed() {
        "done"
    } else if f.is_overdue(today) {
        "LATE"
    } else {
        ""
    };
    let who = contact
        .map(|c| format!("  ({})", c.name))
        .unwrap_or_default();
    println!(
        "  {}  {}  {:<6} {:<4} {}{}",
        short_id(&f.id),
        f.due_date.format("%Y-%m-%d"),
        f.priority.as_str(),
        marker,
        truncate(&f.title, 50),
        who
    );
}

pub fn print_follow_up_list(follow_ups: &[FollowUpWithContact], today: NaiveDate) {
    if follow_ups.is_empty() {
        println!("No follow-ups.");
        return;
    }
    for f in follow_ups {
        print_follow_up_line(&f.follow_up, f.contact.as_ref(), today);
    }
}

pub fn print_follow_up_detail(f: &FollowUpWithContact, today: NaiveDate) {
    let follow_up = &f.follow_up;
    println!("{}  [{}]\n", follow_up.title, short_id(&follow_up.id));
    if let Some(contact) = &f.contact {
        println!("  for {}", contact.name);
    }
    println!(
        "  due {}, {} priority",
        follow_up.due_date.format("%Y-%m-%d"),
        follow_up.priority
    );
    match follow_up.completed_at {
        Some(at) => println!("  completed {}", local_time(&at)),
        None if follow_up.is_overdue(today) => println!("  overdue"),
        None => {}
    }
    if let Some(description) = &follow_up.description {
        println!("\n  {}", description);
    }
}

// ==================== TAGS ====================

pub fn print_tags(tags: &[Tag]) {
    if tags.is_empty() {
        println!("No tags.");
        return;
    }
    for tag in tags {
        match &tag.color {
            Some(color) => println!("{}  {}", tag.name, color),
            None => println!("{}", tag.name),
        }
    }
}

// ==================== DASHBOARD ====================

pub fn print_dashboard(d: &Dashboard) {
    println!("{} contacts\n", d.contact_count);

    println!("Overdue follow-ups");
    if d.overdue.is_empty() {
        println!("  none");
    }
    for f in &d.overdue {
        print_follow_up_line(&f.follow_up, f.contact.as_ref(), d.today);
    }

    println!("\nRecent interactions");
    if d.recent.is_empty() {
        println!("  none");
    }
    for i in &d.recent {
        print_interaction_line(&i.interaction, Some(&i.contacts));
    }

    println!("\nNot contacted in {} days", d.attention_days);
    if d.needs_attention.is_empty() {
        println!("  none");
    }
    for c in &d.needs_attention {
        println!("  {}  {}", short_id(&c.id), c.name);
    }
}

// ==================== SEARCH ====================

fn describe_filter(filter: &Filter) -> String {
    match filter {
        Filter::Text(f) => format!("{} {} \"{}\"", f.field.as_str(), f.operator.as_str(), f.value),
        Filter::Date(f) => format!("{} {} {}", f.field.as_str(), f.operator.as_str(), f.value),
    }
}

/// Columns shown for each result row
fn summary_columns(outcome: &SearchOutcome) -> &'static [&'static str] {
    match outcome.table {
        crate::search::Collection::Contacts => &["name", "company", "email"],
        crate::search::Collection::Interactions => &["occurred_at", "type", "title"],
        crate::search::Collection::FollowUps => &["due_date", "priority", "title"],
    }
}

pub fn print_search_outcome(outcome: &SearchOutcome) {
    let filters: Vec<String> = outcome.filters.iter().map(describe_filter).collect();
    if filters.is_empty() {
        println!("{}", outcome.table);
    } else {
        println!("{} where {}", outcome.table, filters.join(" and "));
    }
    println!();

    if outcome.results.is_empty() {
        println!("No results.");
        return;
    }
    let columns = summary_columns(outcome);
    for record in &outcome.results {
        let id = record
            .get("id")
            .and_then(|v| v.as_str())
            .map(|s| s.chars().take(8).collect::<String>())
            .unwrap_or_default();
        let cells: Vec<String> = columns
            .iter()
            .filter_map(|col| record.get(*col).and_then(|v| v.as_str()))
            .map(|s| truncate(s, 40))
            .collect();
        println!("{}  {}", id, cells.join("  "));
    }
    println!("\n{} result(s)", outcome.results.len());
}
