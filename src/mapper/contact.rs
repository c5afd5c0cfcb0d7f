//! Contact row and mapper.

use rusqlite::types::Value;
use rusqlite::Row;

use super::{from_millis, opt_text, parse_json, text, to_json, to_millis, Mapper, TableRow};
use crate::model::{Contact, SocialLinks};
use crate::storage::ident::{Column, Table};

/// Flat `contacts` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRow {
    pub id: String,
    pub avatar: Option<String>,
    pub initials: Option<String>,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub company_id: Option<String>,
    pub address: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
    /// JSON object text
    pub social_links: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TableRow for ContactRow {
    const TABLE: Table = Table::Contacts;

    fn id(&self) -> &str {
        &self.id
    }

    fn fields(&self) -> Vec<(Column, Value)> {
        vec![
            (Column::Id, text(&self.id)),
            (Column::Avatar, opt_text(self.avatar.as_ref())),
            (Column::Initials, opt_text(self.initials.as_ref())),
            (Column::Name, text(&self.name)),
            (Column::Email, opt_text(self.email.as_ref())),
            (Column::Phone, opt_text(self.phone.as_ref())),
            (Column::Position, opt_text(self.position.as_ref())),
            (Column::CompanyId, opt_text(self.company_id.as_ref())),
            (Column::Address, opt_text(self.address.as_ref())),
            (Column::State, opt_text(self.state.as_ref())),
            (Column::City, opt_text(self.city.as_ref())),
            (Column::Zip, opt_text(self.zip.as_ref())),
            (Column::Country, opt_text(self.country.as_ref())),
            (Column::SocialLinks, opt_text(self.social_links.as_ref())),
            (Column::CreatedAt, Value::Integer(self.created_at)),
            (Column::UpdatedAt, Value::Integer(self.updated_at)),
        ]
    }

    fn from_sql_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            avatar: row.get("avatar")?,
            initials: row.get("initials")?,
            name: row.get("name")?,
            email: row.get("email")?,
            phone: row.get("phone")?,
            position: row.get("position")?,
            company_id: row.get("company_id")?,
            address: row.get("address")?,
            state: row.get("state")?,
            city: row.get("city")?,
            zip: row.get("zip")?,
            country: row.get("country")?,
            social_links: row.get("social_links")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn set_updated_at(&mut self, millis: i64) {
        self.updated_at = millis;
    }
}

/// Domain contact to row. An empty social-links map is stored as NULL.
#[must_use]
pub fn contact_to_row(contact: &Contact) -> ContactRow {
    let social_links = contact.social_links.as_ref().filter(|links| !links.is_empty());

    ContactRow {
        id: contact.id.clone(),
        avatar: contact.avatar.clone(),
        initials: contact.initials.clone(),
        name: contact.name.clone(),
        email: contact.email.clone(),
        phone: contact.phone.clone(),
        position: contact.position.clone(),
        company_id: contact.company_id.clone(),
        address: contact.address.clone(),
        state: contact.state.clone(),
        city: contact.city.clone(),
        zip: contact.zip.clone(),
        country: contact.country.clone(),
        social_links: to_json(social_links),
        created_at: to_millis(&contact.created_at),
        updated_at: to_millis(&contact.updated_at),
    }
}

/// Row to domain contact.
#[must_use]
pub fn contact_from_row(row: ContactRow) -> Contact {
    let social_links: Option<SocialLinks> =
        parse_json(Column::SocialLinks, &row.id, row.social_links.as_deref())
            .filter(|links: &SocialLinks| !links.is_empty());

    Contact {
        social_links,
        created_at: from_millis(row.created_at),
        updated_at: from_millis(row.updated_at),
        id: row.id,
        avatar: row.avatar,
        initials: row.initials,
        name: row.name,
        email: row.email,
        phone: row.phone,
        position: row.position,
        company_id: row.company_id,
        address: row.address,
        state: row.state,
        city: row.city,
        zip: row.zip,
        country: row.country,
    }
}

pub const CONTACT_MAPPER: Mapper<Contact, ContactRow> = Mapper {
    to_row: contact_to_row,
    from_row: contact_from_row,
};

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn full_contact() -> Contact {
        let mut contact = Contact::new("Ann Lee")
            .with_id("c1")
            .with_email("ann@example.com")
            .with_company("co1")
            .with_country("NZ");
        contact.phone = Some("555".to_string());
        contact.initials = Some("AL".to_string());
        contact.social_links = Some(SocialLinks::from([
            ("linkedin".to_string(), "ann-lee".to_string()),
            ("x".to_string(), "@ann".to_string()),
        ]));
        contact
    }

    #[test]
    fn test_round_trip() {
        let contact = full_contact();
        assert_eq!(contact_from_row(contact_to_row(&contact)), contact);
    }

    #[test]
    fn test_row_shape() {
        let row = contact_to_row(&full_contact());
        assert_eq!(row.company_id.as_deref(), Some("co1"));
        assert!(row.social_links.as_deref().unwrap().contains("\"linkedin\":\"ann-lee\""));
        assert_eq!(row.fields().len(), 16);
        assert_eq!(row.fields()[0].0, Column::Id);
    }

    #[test]
    fn test_empty_social_links_collapse_to_absent() {
        let mut contact = full_contact();
        contact.social_links = Some(SocialLinks::new());

        let row = contact_to_row(&contact);
        assert_eq!(row.social_links, None);
        assert_eq!(contact_from_row(row).social_links, None);

        // Same for an empty object written by someone else
        let mut row = contact_to_row(&full_contact());
        row.social_links = Some("{}".to_string());
        assert_eq!(contact_from_row(row).social_links, None);
    }

    #[test]
    #[traced_test]
    fn test_invalid_social_links_are_dropped_and_logged() {
        let mut row = contact_to_row(&full_contact());
        row.social_links = Some("{not json".to_string());

        let contact = contact_from_row(row);
        assert_eq!(contact.social_links, None);
        assert_eq!(contact.name, "Ann Lee");
        assert!(logs_contain("Failed to parse JSON column"));
    }
}
