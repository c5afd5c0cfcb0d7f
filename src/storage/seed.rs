//! The default migration list.
//!
//! Version 1 seeds the lookup tables. Versions 2-4 load a small demo data
//! set through the repositories, so they go through the same mapping and
//! save path as user writes. A demo record that fails to import is logged
//! and skipped; the migration still succeeds. Version 5 rewrites synonym
//! status/priority text to its canonical spelling and has no inverse.

use chrono::Duration;
use rusqlite::types::Value;
use tracing::{info, warn};

use super::canonical::canonicalize_workflow_text;
use super::migrations::Migration;
use super::query::{execute_insert, text, Statement};
use super::sqlite::SqliteStorage;
use crate::error::Result;
use crate::repository::start_of_today;
use crate::model::{Badge, Company, Contact, Deal, Priority, SocialLinks, WorkStatus};

/// Every migration this build knows, in version order.
pub const ALL_MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "seed_lookup_tables",
        up: seed_lookup_tables,
        down: Some(clear_lookup_tables),
    },
    Migration {
        version: 2,
        name: "seed_contacts",
        up: seed_contacts,
        down: Some(clear_contacts),
    },
    Migration {
        version: 3,
        name: "seed_companies",
        up: seed_companies,
        down: Some(clear_companies),
    },
    Migration {
        version: 4,
        name: "seed_deals",
        up: seed_deals,
        down: Some(clear_deals),
    },
    Migration {
        version: 5,
        name: "canonical_workflow_text",
        up: canonical_workflow_text,
        down: None,
    },
];

/// Look up a migration by version.
#[must_use]
pub fn find_migration(version: i64) -> Option<&'static Migration> {
    ALL_MIGRATIONS.iter().find(|m| m.version == version)
}

// ── 001 lookups ──────────────────────────────────────────────

const CATEGORIES: &[(&str, &str, &str, &str)] = &[
    ("1", "Technology", "blue", "Technology companies"),
    ("2", "Finance", "green", "Financial services"),
    ("3", "Healthcare", "red", "Healthcare providers"),
    ("4", "Retail", "purple", "Retail businesses"),
    ("5", "Manufacturing", "orange", "Manufacturing companies"),
];

const CATEGORY_BULLET: &str = "●";

const CONNECTION_STRENGTHS: &[(&str, &str, &str)] = &[
    ("1", "Weak", "red"),
    ("2", "Medium", "yellow"),
    ("3", "Strong", "green"),
    ("4", "Very Strong", "blue"),
    ("5", "Extremely Strong", "purple"),
];

const EMPLOYEE_RANGES: &[(&str, &str)] = &[
    ("1", "1-10"),
    ("2", "11-50"),
    ("3", "51-200"),
    ("4", "201-500"),
    ("5", "501-1000"),
    ("6", "1000+"),
];

const ESTIMATED_ARRS: &[(&str, &str)] = &[
    ("1", "$0-$100K"),
    ("2", "$100K-$500K"),
    ("3", "$500K-$1M"),
    ("4", "$1M-$5M"),
    ("5", "$5M-$10M"),
    ("6", "$10M+"),
];

/// Tailwind class list for a strength color.
fn strength_classes(color: &str) -> String {
    format!("bg-{color}-500 text-{color}-900 dark:bg-{color}-500 dark:text-{color}-100")
}

fn insert_or_ignore(storage: &SqliteStorage, sql: &str, params: Vec<Value>) -> Result<()> {
    execute_insert(storage.conn(), &Statement::new(sql, params))?;
    Ok(())
}

fn seed_lookup_tables(storage: &SqliteStorage) -> Result<()> {
    for (id, name, color, description) in CATEGORIES {
        insert_or_ignore(
            storage,
            "INSERT OR IGNORE INTO categories (id, name, color, bullet, description) VALUES (?, ?, ?, ?, ?)",
            vec![text(id), text(name), text(color), text(CATEGORY_BULLET), text(description)],
        )?;
    }

    for (id, name, color) in CONNECTION_STRENGTHS {
        insert_or_ignore(
            storage,
            "INSERT OR IGNORE INTO connection_strengths (id, name, color) VALUES (?, ?, ?)",
            vec![text(id), text(name), Value::Text(strength_classes(color))],
        )?;
    }

    for (id, label) in EMPLOYEE_RANGES {
        insert_or_ignore(
            storage,
            "INSERT OR IGNORE INTO employee_ranges (id, label) VALUES (?, ?)",
            vec![text(id), text(label)],
        )?;
    }

    for (id, label) in ESTIMATED_ARRS {
        insert_or_ignore(
            storage,
            "INSERT OR IGNORE INTO estimated_arrs (id, label) VALUES (?, ?)",
            vec![text(id), text(label)],
        )?;
    }

    info!("Lookup tables seeded");
    Ok(())
}

fn clear_lookup_tables(storage: &SqliteStorage) -> Result<()> {
    storage.execute_batch(
        "DELETE FROM categories;
         DELETE FROM connection_strengths;
         DELETE FROM employee_ranges;
         DELETE FROM estimated_arrs;",
    )?;
    info!("Lookup tables cleared");
    Ok(())
}

// ── 002 contacts ─────────────────────────────────────────────

struct DemoContact {
    id: &'static str,
    name: &'static str,
    email: &'static str,
    position: &'static str,
    city: &'static str,
    country: &'static str,
    linkedin: Option<&'static str>,
}

const DEMO_CONTACTS: &[DemoContact] = &[
    DemoContact {
        id: "contact-1",
        name: "Olivia Martin",
        email: "olivia.martin@northwind.test",
        position: "Head of Operations",
        city: "Seattle",
        country: "United States",
        linkedin: Some("olivia-martin"),
    },
    DemoContact {
        id: "contact-2",
        name: "Jackson Lee",
        email: "jackson.lee@contoso.test",
        position: "CTO",
        city: "Toronto",
        country: "Canada",
        linkedin: None,
    },
    DemoContact {
        id: "contact-3",
        name: "Isabella Nguyen",
        email: "isabella@fabrikam.test",
        position: "Procurement Lead",
        city: "Berlin",
        country: "Germany",
        linkedin: Some("isabella-nguyen"),
    },
    DemoContact {
        id: "contact-4",
        name: "William Kim",
        email: "will.kim@northwind.test",
        position: "Finance Director",
        city: "Seattle",
        country: "United States",
        linkedin: None,
    },
    DemoContact {
        id: "contact-5",
        name: "Sofia Davis",
        email: "sofia.davis@tailspin.test",
        position: "Founder",
        city: "Austin",
        country: "United States",
        linkedin: Some("sofia-davis"),
    },
];

fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|part| part.chars().next())
        .collect::<String>()
        .to_uppercase()
}

fn seed_contacts(storage: &SqliteStorage) -> Result<()> {
    let repo = storage.contacts();
    let mut imported = 0;

    for demo in DEMO_CONTACTS {
        let mut contact = Contact::new(demo.name)
            .with_id(demo.id)
            .with_email(demo.email)
            .with_country(demo.country);
        contact.initials = Some(initials(demo.name));
        contact.position = Some(demo.position.to_string());
        contact.city = Some(demo.city.to_string());
        contact.social_links = demo.linkedin.map(|handle| {
            SocialLinks::from([("linkedin".to_string(), handle.to_string())])
        });

        match repo.create(&contact) {
            Ok(_) => imported += 1,
            Err(e) => warn!(name = demo.name, error = %e, "Failed to import contact"),
        }
    }

    info!(imported, "Contacts imported");
    Ok(())
}

fn clear_contacts(storage: &SqliteStorage) -> Result<()> {
    storage.execute_batch("DELETE FROM contacts; DELETE FROM company_contacts;")?;
    info!("Contacts cleared");
    Ok(())
}

// ── 003 companies ────────────────────────────────────────────

struct DemoCompany {
    id: &'static str,
    name: &'static str,
    domain: &'static str,
    country: &'static str,
    strength: &'static str,
    employees: &'static str,
    arr: &'static str,
    badge: Option<(&'static str, &'static str)>,
    categories: &'static [&'static str],
    contacts: &'static [&'static str],
}

const DEMO_COMPANIES: &[DemoCompany] = &[
    DemoCompany {
        id: "company-1",
        name: "Northwind Traders",
        domain: "northwind.test",
        country: "United States",
        strength: "4",
        employees: "4",
        arr: "4",
        badge: Some(("Key account", "active")),
        categories: &["4"],
        contacts: &["contact-1", "contact-4"],
    },
    DemoCompany {
        id: "company-2",
        name: "Contoso",
        domain: "contoso.test",
        country: "Canada",
        strength: "3",
        employees: "5",
        arr: "5",
        badge: None,
        categories: &["1", "2"],
        contacts: &["contact-2"],
    },
    DemoCompany {
        id: "company-3",
        name: "Fabrikam",
        domain: "fabrikam.test",
        country: "Germany",
        strength: "2",
        employees: "3",
        arr: "3",
        badge: Some(("Prospect", "pending")),
        categories: &["5"],
        contacts: &["contact-3"],
    },
    DemoCompany {
        id: "company-4",
        name: "Tailspin Toys",
        domain: "tailspin.test",
        country: "United States",
        strength: "1",
        employees: "1",
        arr: "1",
        badge: None,
        categories: &["4"],
        contacts: &["contact-5"],
    },
];

fn seed_companies(storage: &SqliteStorage) -> Result<()> {
    let repo = storage.companies();
    let mut imported = 0;

    for demo in DEMO_COMPANIES {
        let mut company = Company::new(demo.name)
            .with_id(demo.id)
            .with_domain(demo.domain)
            .with_country(demo.country);
        company.email = Some(format!("hello@{}", demo.domain));
        company.connection_strength_id = Some(demo.strength.to_string());
        company.employee_range_id = Some(demo.employees.to_string());
        company.estimated_arr_id = Some(demo.arr.to_string());
        company.badge = demo.badge.map(|(name, state)| Badge {
            name: name.to_string(),
            state: state.to_string(),
        });

        if let Err(e) = repo.create(&company) {
            warn!(name = demo.name, error = %e, "Failed to import company");
            continue;
        }

        for category_id in demo.categories {
            if let Err(e) = repo.add_category(demo.id, category_id) {
                warn!(company = demo.id, category = category_id, error = %e, "Failed to add category");
            }
        }
        for contact_id in demo.contacts {
            if let Err(e) = repo.add_contact(demo.id, contact_id) {
                warn!(company = demo.id, contact = contact_id, error = %e, "Failed to add contact");
            }
        }

        imported += 1;
    }

    info!(imported, "Companies imported");
    Ok(())
}

fn clear_companies(storage: &SqliteStorage) -> Result<()> {
    storage.execute_batch(
        "DELETE FROM companies;
         DELETE FROM company_contacts;
         DELETE FROM company_categories;",
    )?;
    info!("Companies cleared");
    Ok(())
}

// ── 004 deals ────────────────────────────────────────────────

struct DemoDeal {
    id: &'static str,
    title: &'static str,
    owner: &'static str,
    status: WorkStatus,
    priority: Priority,
    due_in_days: i64,
    amount: f64,
    companies: &'static [&'static str],
    contacts: &'static [&'static str],
}

const DEMO_DEALS: &[DemoDeal] = &[
    DemoDeal {
        id: "deal-1",
        title: "Northwind annual renewal",
        owner: "Olivia Martin",
        status: WorkStatus::InProgress,
        priority: Priority::High,
        due_in_days: 14,
        amount: 48_000.0,
        companies: &["company-1"],
        contacts: &["contact-1", "contact-4"],
    },
    DemoDeal {
        id: "deal-2",
        title: "Contoso platform pilot",
        owner: "Jackson Lee",
        status: WorkStatus::Pending,
        priority: Priority::Medium,
        due_in_days: 30,
        amount: 12_500.0,
        companies: &["company-2"],
        contacts: &["contact-2"],
    },
    DemoDeal {
        id: "deal-3",
        title: "Fabrikam tooling upgrade",
        owner: "Isabella Nguyen",
        status: WorkStatus::Completed,
        priority: Priority::Low,
        due_in_days: -10,
        amount: 7_200.0,
        companies: &["company-3"],
        contacts: &["contact-3"],
    },
];

fn seed_deals(storage: &SqliteStorage) -> Result<()> {
    let repo = storage.deals();
    let mut imported = 0;
    // Due dates are anchored at midnight so reseeding is stable within a day
    let today = start_of_today();

    for demo in DEMO_DEALS {
        let mut deal = Deal::new(
            demo.title,
            &format!("{} opportunity", demo.title),
            demo.owner,
            today + Duration::days(demo.due_in_days),
        )
        .with_id(demo.id)
        .with_status(demo.status)
        .with_priority(demo.priority)
        .with_amount(demo.amount, "USD");
        if demo.status == WorkStatus::Completed {
            deal.completed_at = Some(deal.due_at);
            deal.completed_by = Some(demo.owner.to_string());
        }

        if let Err(e) = repo.create(&deal) {
            warn!(title = demo.title, error = %e, "Failed to import deal");
            continue;
        }

        for company_id in demo.companies {
            if let Err(e) = repo.add_company(demo.id, company_id) {
                warn!(deal = demo.id, company = company_id, error = %e, "Failed to add company");
            }
        }
        for contact_id in demo.contacts {
            if let Err(e) = repo.add_contact(demo.id, contact_id) {
                warn!(deal = demo.id, contact = contact_id, error = %e, "Failed to add contact");
            }
        }

        imported += 1;
    }

    info!(imported, "Deals imported");
    Ok(())
}

fn clear_deals(storage: &SqliteStorage) -> Result<()> {
    storage.execute_batch(
        "DELETE FROM deals;
         DELETE FROM deal_companies;
         DELETE FROM deal_contacts;
         DELETE FROM deal_related_deals;",
    )?;
    info!("Deals cleared");
    Ok(())
}

// ── 005 canonical status/priority ────────────────────────────

fn canonical_workflow_text(storage: &SqliteStorage) -> Result<()> {
    canonicalize_workflow_text(storage.conn())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::migrations::{rollback_migration, run_migrations};

    #[test]
    fn test_versions_are_sequential() {
        let versions: Vec<i64> = ALL_MIGRATIONS.iter().map(|m| m.version).collect();
        assert_eq!(versions, vec![1, 2, 3, 4, 5]);
        assert!(ALL_MIGRATIONS[..4].iter().all(|m| m.down.is_some()));
        assert!(find_migration(5).unwrap().down.is_none());
        assert_eq!(find_migration(3).map(|m| m.name), Some("seed_companies"));
        assert!(find_migration(9).is_none());
    }

    #[test]
    fn test_strength_classes() {
        assert_eq!(
            strength_classes("red"),
            "bg-red-500 text-red-900 dark:bg-red-500 dark:text-red-100"
        );
        assert_eq!(initials("Olivia Martin"), "OM");
    }

    #[test]
    fn test_full_seed() {
        let storage = SqliteStorage::open_memory().unwrap();
        assert_eq!(run_migrations(&storage, ALL_MIGRATIONS).unwrap(), 5);

        let stats = storage.stats().unwrap();
        assert_eq!(stats.count_of("contacts"), Some(5));
        assert_eq!(stats.count_of("companies"), Some(4));
        assert_eq!(stats.count_of("deals"), Some(3));
        assert_eq!(stats.count_of("company_contacts"), Some(5));
        assert_eq!(stats.count_of("deal_contacts"), Some(4));

        let northwind = storage.companies().get_with_relationships("company-1").unwrap().unwrap();
        assert_eq!(northwind.contact_ids, vec!["contact-1", "contact-4"]);
        assert_eq!(northwind.badge.map(|b| b.name), Some("Key account".to_string()));

        let contact = storage.contacts().get_by_id("contact-1").unwrap().unwrap();
        assert_eq!(contact.initials.as_deref(), Some("OM"));

        assert!(storage.check_foreign_keys().unwrap().is_empty());
    }

    #[test]
    fn test_existing_record_is_skipped_not_fatal() {
        let storage = SqliteStorage::open_memory().unwrap();
        storage.contacts().create(&Contact::new("Already here").with_id("contact-2")).unwrap();

        run_migrations(&storage, &ALL_MIGRATIONS[..2]).unwrap();
        assert_eq!(storage.contacts().count(&crate::storage::query::Condition::All).unwrap(), 5);
        assert_eq!(
            storage.contacts().get_by_id("contact-2").unwrap().map(|c| c.name),
            Some("Already here".to_string())
        );
    }

    #[test]
    fn test_rollback_deals() {
        let storage = SqliteStorage::open_memory().unwrap();
        run_migrations(&storage, ALL_MIGRATIONS).unwrap();

        rollback_migration(&storage, &ALL_MIGRATIONS[3]).unwrap();
        let stats = storage.stats().unwrap();
        assert_eq!(stats.count_of("deals"), Some(0));
        assert_eq!(stats.count_of("deal_contacts"), Some(0));
        assert_eq!(stats.count_of("companies"), Some(4));
    }
}
