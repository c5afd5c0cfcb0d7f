//! Closed sets of table, column and junction identifiers.
//!
//! Dynamic SQL in this crate is only ever assembled from these enums, so no
//! identifier can come from caller input. Values are always bound as
//! parameters.

use std::fmt;

/// Entity and lookup tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Contacts,
    Companies,
    Deals,
    Tasks,
    Notes,
    Categories,
    ConnectionStrengths,
    EmployeeRanges,
    EstimatedArrs,
}

impl Table {
    pub const ALL: [Self; 9] = [
        Self::Categories,
        Self::ConnectionStrengths,
        Self::EmployeeRanges,
        Self::EstimatedArrs,
        Self::Companies,
        Self::Contacts,
        Self::Deals,
        Self::Tasks,
        Self::Notes,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Contacts => "contacts",
            Self::Companies => "companies",
            Self::Deals => "deals",
            Self::Tasks => "tasks",
            Self::Notes => "notes",
            Self::Categories => "categories",
            Self::ConnectionStrengths => "connection_strengths",
            Self::EmployeeRanges => "employee_ranges",
            Self::EstimatedArrs => "estimated_arrs",
        }
    }

    /// Resolve a table from its SQL name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every column name used by entity and lookup tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Id,
    CreatedAt,
    UpdatedAt,

    // Shared entity fields
    Name,
    Email,
    Phone,
    Address,
    State,
    City,
    Zip,
    Country,
    Avatar,
    Logo,
    Title,
    Content,
    Status,
    Priority,
    DueAt,
    CompletedAt,
    CompletedBy,
    CreatedBy,

    // Contacts
    Initials,
    Position,
    CompanyId,
    SocialLinks,

    // Companies
    Domain,
    Description,
    AngelList,
    Linkedin,
    ConnectionStrengthId,
    X,
    Instagram,
    Facebook,
    Telegram,
    FoundedAt,
    EstimatedArrId,
    EmployeeRangeId,
    LastInteractionAt,
    LastContacted,
    TeamId,
    Badge,

    // Deals
    UserName,
    Comments,
    Amount,
    Currency,
    PaymentDate,
    PaymentType,
    ContractNumber,
    Discount,

    // Lookups
    Color,
    Bullet,
    Label,
}

impl Column {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::Name => "name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Address => "address",
            Self::State => "state",
            Self::City => "city",
            Self::Zip => "zip",
            Self::Country => "country",
            Self::Avatar => "avatar",
            Self::Logo => "logo",
            Self::Title => "title",
            Self::Content => "content",
            Self::Status => "status",
            Self::Priority => "priority",
            Self::DueAt => "due_at",
            Self::CompletedAt => "completed_at",
            Self::CompletedBy => "completed_by",
            Self::CreatedBy => "created_by",
            Self::Initials => "initials",
            Self::Position => "position",
            Self::CompanyId => "company_id",
            Self::SocialLinks => "social_links",
            Self::Domain => "domain",
            Self::Description => "description",
            Self::AngelList => "angel_list",
            Self::Linkedin => "linkedin",
            Self::ConnectionStrengthId => "connection_strength_id",
            Self::X => "x",
            Self::Instagram => "instagram",
            Self::Facebook => "facebook",
            Self::Telegram => "telegram",
            Self::FoundedAt => "founded_at",
            Self::EstimatedArrId => "estimated_arr_id",
            Self::EmployeeRangeId => "employee_range_id",
            Self::LastInteractionAt => "last_interaction_at",
            Self::LastContacted => "last_contacted",
            Self::TeamId => "team_id",
            Self::Badge => "badge",
            Self::UserName => "user_name",
            Self::Comments => "comments",
            Self::Amount => "amount",
            Self::Currency => "currency",
            Self::PaymentDate => "payment_date",
            Self::PaymentType => "payment_type",
            Self::ContractNumber => "contract_number",
            Self::Discount => "discount",
            Self::Color => "color",
            Self::Bullet => "bullet",
            Self::Label => "label",
        }
    }

    /// Columns that an update must never rewrite.
    #[must_use]
    pub const fn is_immutable(&self) -> bool {
        matches!(self, Self::Id | Self::CreatedAt)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Many-to-many junction tables.
///
/// Each junction has an owner side (the entity whose repository manages the
/// relation) and an other side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Junction {
    CompanyContacts,
    CompanyCategories,
    DealCompanies,
    DealContacts,
    DealRelatedDeals,
    TaskCompanies,
    TaskContacts,
    TaskDeals,
    TaskAssignedContacts,
    NoteCompanies,
    NoteAssignedContacts,
    NoteDeals,
}

impl Junction {
    pub const ALL: [Self; 12] = [
        Self::CompanyContacts,
        Self::CompanyCategories,
        Self::DealCompanies,
        Self::DealContacts,
        Self::DealRelatedDeals,
        Self::TaskCompanies,
        Self::TaskContacts,
        Self::TaskDeals,
        Self::TaskAssignedContacts,
        Self::NoteCompanies,
        Self::NoteAssignedContacts,
        Self::NoteDeals,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CompanyContacts => "company_contacts",
            Self::CompanyCategories => "company_categories",
            Self::DealCompanies => "deal_companies",
            Self::DealContacts => "deal_contacts",
            Self::DealRelatedDeals => "deal_related_deals",
            Self::TaskCompanies => "task_companies",
            Self::TaskContacts => "task_contacts",
            Self::TaskDeals => "task_deals",
            Self::TaskAssignedContacts => "task_assigned_contacts",
            Self::NoteCompanies => "note_companies",
            Self::NoteAssignedContacts => "note_assigned_contacts",
            Self::NoteDeals => "note_deals",
        }
    }

    /// Column holding the owning entity's id.
    #[must_use]
    pub const fn owner_column(&self) -> &'static str {
        match self {
            Self::CompanyContacts | Self::CompanyCategories => "company_id",
            Self::DealCompanies
            | Self::DealContacts
            | Self::DealRelatedDeals => "deal_id",
            Self::TaskCompanies
            | Self::TaskContacts
            | Self::TaskDeals
            | Self::TaskAssignedContacts => "task_id",
            Self::NoteCompanies | Self::NoteAssignedContacts | Self::NoteDeals => "note_id",
        }
    }

    /// Column holding the related entity's id.
    #[must_use]
    pub const fn other_column(&self) -> &'static str {
        match self {
            Self::CompanyContacts
            | Self::DealContacts
            | Self::TaskContacts
            | Self::TaskAssignedContacts
            | Self::NoteAssignedContacts => "contact_id",
            Self::CompanyCategories => "category_id",
            Self::DealCompanies | Self::TaskCompanies | Self::NoteCompanies => "company_id",
            Self::DealRelatedDeals => "related_deal_id",
            Self::TaskDeals | Self::NoteDeals => "deal_id",
        }
    }
}

impl fmt::Display for Junction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_lookup() {
        assert_eq!(Table::from_name("deals"), Some(Table::Deals));
        assert_eq!(Table::from_name("deals; DROP TABLE deals"), None);
        assert_eq!(Table::EstimatedArrs.to_string(), "estimated_arrs");
    }

    #[test]
    fn test_junction_columns() {
        assert_eq!(Junction::DealRelatedDeals.owner_column(), "deal_id");
        assert_eq!(Junction::DealRelatedDeals.other_column(), "related_deal_id");
        assert_eq!(Junction::NoteAssignedContacts.owner_column(), "note_id");
        assert_eq!(Junction::CompanyCategories.other_column(), "category_id");
    }

    #[test]
    fn test_immutable_columns() {
        assert!(Column::Id.is_immutable());
        assert!(Column::CreatedAt.is_immutable());
        assert!(!Column::UpdatedAt.is_immutable());
    }
}
