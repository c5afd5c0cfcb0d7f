//! Company queries and relations.

use super::Repository;
use crate::error::Result;
use crate::mapper::CompanyRow;
use crate::model::Company;
use crate::storage::ident::{Column, Junction};
use crate::storage::query::{text, Condition, OrderBy};

pub type CompanyRepository<'db> = Repository<'db, Company, CompanyRow>;

const BY_NAME: Option<OrderBy> = Some(OrderBy::asc(Column::Name));

impl CompanyRepository<'_> {
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn find_by_domain(&self, domain: &str) -> Result<Option<Company>> {
        Ok(self
            .find_where(&Condition::eq(Column::Domain, text(domain)), None, Some(1))?
            .into_iter()
            .next())
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn search_by_name(&self, term: &str) -> Result<Vec<Company>> {
        self.find_where(&Condition::like_any(&[Column::Name], term), BY_NAME, None)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn find_by_country(&self, country: &str) -> Result<Vec<Company>> {
        self.find_by(Column::Country, text(country), BY_NAME)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn find_by_connection_strength(&self, strength_id: &str) -> Result<Vec<Company>> {
        self.find_by(Column::ConnectionStrengthId, text(strength_id), BY_NAME)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_recent(&self, limit: u32) -> Result<Vec<Company>> {
        self.find_where(&Condition::All, Some(OrderBy::desc(Column::CreatedAt)), Some(limit))
    }

    // ── Contacts ─────────────────────────────────────────────

    /// # Errors
    ///
    /// Returns an error if the insert or save fails.
    pub fn add_contact(&self, company_id: &str, contact_id: &str) -> Result<()> {
        self.link(Junction::CompanyContacts, company_id, contact_id)
    }

    /// # Errors
    ///
    /// Returns an error if the delete or save fails.
    pub fn remove_contact(&self, company_id: &str, contact_id: &str) -> Result<bool> {
        self.unlink(Junction::CompanyContacts, company_id, contact_id)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn contact_ids(&self, company_id: &str) -> Result<Vec<String>> {
        self.linked_ids(Junction::CompanyContacts, company_id)
    }

    // ── Categories ───────────────────────────────────────────

    /// # Errors
    ///
    /// Returns an error if the insert or save fails.
    pub fn add_category(&self, company_id: &str, category_id: &str) -> Result<()> {
        self.link(Junction::CompanyCategories, company_id, category_id)
    }

    /// # Errors
    ///
    /// Returns an error if the delete or save fails.
    pub fn remove_category(&self, company_id: &str, category_id: &str) -> Result<bool> {
        self.unlink(Junction::CompanyCategories, company_id, category_id)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn category_ids(&self, company_id: &str) -> Result<Vec<String>> {
        self.linked_ids(Junction::CompanyCategories, company_id)
    }

    /// Company with `contact_ids` and `category_ids` filled in.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub fn get_with_relationships(&self, id: &str) -> Result<Option<Company>> {
        let Some(mut company) = self.get_by_id(id)? else {
            return Ok(None);
        };
        company.contact_ids = self.contact_ids(id)?;
        company.category_ids = self.category_ids(id)?;
        Ok(Some(company))
    }
}

#[cfg(test)]
mod tests {
    use crate::model::Company;
    use crate::storage::SqliteStorage;

    #[test]
    fn test_delete_then_get_is_none() {
        let db = SqliteStorage::open_memory().unwrap();
        let repo = db.companies();
        repo.create(&Company::new("Acme").with_id("co1")).unwrap();

        assert!(repo.delete("co1").unwrap());
        assert!(repo.get_by_id("co1").unwrap().is_none());
        assert!(!repo.delete("co1").unwrap());
    }

    #[test]
    fn test_lookups() {
        let db = SqliteStorage::open_memory().unwrap();
        let repo = db.companies();
        repo.create(&Company::new("Globex").with_domain("globex.test").with_country("US")).unwrap();
        repo.create(&Company::new("Acme").with_country("US")).unwrap();
        repo.create(&Company::new("Initech").with_country("CA")).unwrap();

        assert_eq!(
            repo.find_by_domain("globex.test").unwrap().map(|c| c.name),
            Some("Globex".to_string())
        );
        let us: Vec<String> = repo.find_by_country("US").unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(us, vec!["Acme", "Globex"]);
        assert_eq!(repo.search_by_name("tech").unwrap().len(), 1);
    }

    #[test]
    fn test_connection_strength() {
        let db = SqliteStorage::open_memory().unwrap();
        let repo = db.companies();
        let mut strong = Company::new("Strong Co");
        strong.connection_strength_id = Some("3".to_string());
        repo.create(&strong).unwrap();
        repo.create(&Company::new("Unknown Co")).unwrap();

        let found = repo.find_by_connection_strength("3").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Strong Co");
    }

    #[test]
    fn test_relationships() {
        let db = SqliteStorage::open_memory().unwrap();
        let repo = db.companies();
        repo.create(&Company::new("Acme").with_id("co1")).unwrap();

        repo.add_contact("co1", "c1").unwrap();
        repo.add_contact("co1", "c2").unwrap();
        repo.add_contact("co1", "c1").unwrap();
        repo.add_category("co1", "1").unwrap();

        let company = repo.get_with_relationships("co1").unwrap().unwrap();
        assert_eq!(company.contact_ids, vec!["c1", "c2"]);
        assert_eq!(company.category_ids, vec!["1"]);

        assert!(repo.remove_contact("co1", "c1").unwrap());
        assert!(repo.remove_category("co1", "1").unwrap());
        let company = repo.get_with_relationships("co1").unwrap().unwrap();
        assert_eq!(company.contact_ids, vec!["c2"]);
        assert!(company.category_ids.is_empty());

        // Plain reads never carry relations
        assert!(repo.get_by_id("co1").unwrap().unwrap().contact_ids.is_empty());
        assert!(repo.get_with_relationships("missing").unwrap().is_none());
    }
}
