//! Company row and mapper.

use rusqlite::types::Value;
use rusqlite::Row;

use super::{
    from_millis, opt_date, opt_millis, opt_text, parse_json, text, to_json, to_millis, Mapper,
    TableRow,
};
use crate::model::Company;
use crate::storage::ident::{Column, Table};

/// Flat `companies` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyRow {
    pub id: String,
    pub logo: Option<String>,
    pub name: String,
    pub domain: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
    pub angel_list: Option<String>,
    pub linkedin: Option<String>,
    pub connection_strength_id: Option<String>,
    pub x: Option<String>,
    pub instagram: Option<String>,
    pub facebook: Option<String>,
    pub telegram: Option<String>,
    pub founded_at: Option<i64>,
    pub estimated_arr_id: Option<String>,
    pub employee_range_id: Option<String>,
    pub last_interaction_at: Option<i64>,
    pub last_contacted: Option<String>,
    pub team_id: Option<String>,
    /// JSON `{name, state}` text
    pub badge: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TableRow for CompanyRow {
    const TABLE: Table = Table::Companies;

    fn id(&self) -> &str {
        &self.id
    }

    fn fields(&self) -> Vec<(Column, Value)> {
        vec![
            (Column::Id, text(&self.id)),
            (Column::Logo, opt_text(self.logo.as_ref())),
            (Column::Name, text(&self.name)),
            (Column::Domain, opt_text(self.domain.as_ref())),
            (Column::Email, opt_text(self.email.as_ref())),
            (Column::Phone, opt_text(self.phone.as_ref())),
            (Column::Description, opt_text(self.description.as_ref())),
            (Column::Address, opt_text(self.address.as_ref())),
            (Column::State, opt_text(self.state.as_ref())),
            (Column::City, opt_text(self.city.as_ref())),
            (Column::Zip, opt_text(self.zip.as_ref())),
            (Column::Country, opt_text(self.country.as_ref())),
            (Column::AngelList, opt_text(self.angel_list.as_ref())),
            (Column::Linkedin, opt_text(self.linkedin.as_ref())),
            (Column::ConnectionStrengthId, opt_text(self.connection_strength_id.as_ref())),
            (Column::X, opt_text(self.x.as_ref())),
            (Column::Instagram, opt_text(self.instagram.as_ref())),
            (Column::Facebook, opt_text(self.facebook.as_ref())),
            (Column::Telegram, opt_text(self.telegram.as_ref())),
            (Column::FoundedAt, self.founded_at.into()),
            (Column::EstimatedArrId, opt_text(self.estimated_arr_id.as_ref())),
            (Column::EmployeeRangeId, opt_text(self.employee_range_id.as_ref())),
            (Column::LastInteractionAt, self.last_interaction_at.into()),
            (Column::LastContacted, opt_text(self.last_contacted.as_ref())),
            (Column::TeamId, opt_text(self.team_id.as_ref())),
            (Column::Badge, opt_text(self.badge.as_ref())),
            (Column::CreatedAt, Value::Integer(self.created_at)),
            (Column::UpdatedAt, Value::Integer(self.updated_at)),
        ]
    }

    fn from_sql_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            logo: row.get("logo")?,
            name: row.get("name")?,
            domain: row.get("domain")?,
            email: row.get("email")?,
            phone: row.get("phone")?,
            description: row.get("description")?,
            address: row.get("address")?,
            state: row.get("state")?,
            city: row.get("city")?,
            zip: row.get("zip")?,
            country: row.get("country")?,
            angel_list: row.get("angel_list")?,
            linkedin: row.get("linkedin")?,
            connection_strength_id: row.get("connection_strength_id")?,
            x: row.get("x")?,
            instagram: row.get("instagram")?,
            facebook: row.get("facebook")?,
            telegram: row.get("telegram")?,
            founded_at: row.get("founded_at")?,
            estimated_arr_id: row.get("estimated_arr_id")?,
            employee_range_id: row.get("employee_range_id")?,
            last_interaction_at: row.get("last_interaction_at")?,
            last_contacted: row.get("last_contacted")?,
            team_id: row.get("team_id")?,
            badge: row.get("badge")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn set_updated_at(&mut self, millis: i64) {
        self.updated_at = millis;
    }
}

/// Domain company to row. Relation id lists are not part of the row.
#[must_use]
pub fn company_to_row(company: &Company) -> CompanyRow {
    CompanyRow {
        id: company.id.clone(),
        logo: company.logo.clone(),
        name: company.name.clone(),
        domain: company.domain.clone(),
        email: company.email.clone(),
        phone: company.phone.clone(),
        description: company.description.clone(),
        address: company.address.clone(),
        state: company.state.clone(),
        city: company.city.clone(),
        zip: company.zip.clone(),
        country: company.country.clone(),
        angel_list: company.angel_list.clone(),
        linkedin: company.linkedin.clone(),
        connection_strength_id: company.connection_strength_id.clone(),
        x: company.x.clone(),
        instagram: company.instagram.clone(),
        facebook: company.facebook.clone(),
        telegram: company.telegram.clone(),
        founded_at: opt_millis(company.founded_at.as_ref()),
        estimated_arr_id: company.estimated_arr_id.clone(),
        employee_range_id: company.employee_range_id.clone(),
        last_interaction_at: opt_millis(company.last_interaction_at.as_ref()),
        last_contacted: company.last_contacted.clone(),
        team_id: company.team_id.clone(),
        badge: to_json(company.badge.as_ref()),
        created_at: to_millis(&company.created_at),
        updated_at: to_millis(&company.updated_at),
    }
}

/// Row to domain company, with empty relation lists.
#[must_use]
pub fn company_from_row(row: CompanyRow) -> Company {
    let badge = parse_json(Column::Badge, &row.id, row.badge.as_deref());

    Company {
        badge,
        category_ids: Vec::new(),
        contact_ids: Vec::new(),
        founded_at: opt_date(row.founded_at),
        last_interaction_at: opt_date(row.last_interaction_at),
        created_at: from_millis(row.created_at),
        updated_at: from_millis(row.updated_at),
        id: row.id,
        logo: row.logo,
        name: row.name,
        domain: row.domain,
        email: row.email,
        phone: row.phone,
        description: row.description,
        address: row.address,
        state: row.state,
        city: row.city,
        zip: row.zip,
        country: row.country,
        angel_list: row.angel_list,
        linkedin: row.linkedin,
        connection_strength_id: row.connection_strength_id,
        x: row.x,
        instagram: row.instagram,
        facebook: row.facebook,
        telegram: row.telegram,
        estimated_arr_id: row.estimated_arr_id,
        employee_range_id: row.employee_range_id,
        last_contacted: row.last_contacted,
        team_id: row.team_id,
    }
}

pub const COMPANY_MAPPER: Mapper<Company, CompanyRow> = Mapper {
    to_row: company_to_row,
    from_row: company_from_row,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{now, Badge};
    use tracing_test::traced_test;

    fn full_company() -> Company {
        let mut company = Company::new("Acme")
            .with_id("co1")
            .with_domain("acme.test")
            .with_country("US");
        company.connection_strength_id = Some("3".to_string());
        company.employee_range_id = Some("2".to_string());
        company.founded_at = Some(now());
        company.badge = Some(Badge {
            name: "Hot".to_string(),
            state: "active".to_string(),
        });
        company
    }

    #[test]
    fn test_round_trip() {
        let company = full_company();
        assert_eq!(company_from_row(company_to_row(&company)), company);
    }

    #[test]
    fn test_relation_ids_are_not_stored() {
        let mut company = full_company();
        company.contact_ids = vec!["c1".to_string()];
        company.category_ids = vec!["1".to_string()];

        let back = company_from_row(company_to_row(&company));
        assert!(back.contact_ids.is_empty());
        assert!(back.category_ids.is_empty());
    }

    #[test]
    #[traced_test]
    fn test_invalid_badge_is_dropped_and_logged() {
        let mut row = company_to_row(&full_company());
        row.badge = Some("[1, 2".to_string());

        assert_eq!(company_from_row(row).badge, None);
        assert!(logs_contain("Failed to parse JSON column"));
    }
}
