//! Deal row and mapper.

use rusqlite::types::Value;
use rusqlite::Row;

use super::{
    from_millis, opt_date, opt_millis, opt_text, parse_priority, parse_status, text, to_millis,
    Mapper, TableRow,
};
use crate::model::Deal;
use crate::storage::ident::{Column, Table};

/// Flat `deals` row.
#[derive(Debug, Clone, PartialEq)]
pub struct DealRow {
    pub id: String,
    pub title: String,
    pub content: String,
    pub user_name: String,
    pub avatar: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_at: i64,
    pub completed_at: Option<i64>,
    pub completed_by: Option<String>,
    pub comments: i64,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub payment_date: Option<i64>,
    pub payment_type: Option<String>,
    pub contract_number: Option<String>,
    pub discount: Option<f64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TableRow for DealRow {
    const TABLE: Table = Table::Deals;

    fn id(&self) -> &str {
        &self.id
    }

    fn fields(&self) -> Vec<(Column, Value)> {
        vec![
            (Column::Id, text(&self.id)),
            (Column::Title, text(&self.title)),
            (Column::Content, text(&self.content)),
            (Column::UserName, text(&self.user_name)),
            (Column::Avatar, opt_text(self.avatar.as_ref())),
            (Column::Status, opt_text(self.status.as_ref())),
            (Column::Priority, opt_text(self.priority.as_ref())),
            (Column::DueAt, Value::Integer(self.due_at)),
            (Column::CompletedAt, self.completed_at.into()),
            (Column::CompletedBy, opt_text(self.completed_by.as_ref())),
            (Column::Comments, Value::Integer(self.comments)),
            (Column::Amount, self.amount.into()),
            (Column::Currency, opt_text(self.currency.as_ref())),
            (Column::PaymentDate, self.payment_date.into()),
            (Column::PaymentType, opt_text(self.payment_type.as_ref())),
            (Column::ContractNumber, opt_text(self.contract_number.as_ref())),
            (Column::Discount, self.discount.into()),
            (Column::CreatedAt, Value::Integer(self.created_at)),
            (Column::UpdatedAt, Value::Integer(self.updated_at)),
        ]
    }

    fn from_sql_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            content: row.get("content")?,
            user_name: row.get("user_name")?,
            avatar: row.get("avatar")?,
            status: row.get("status")?,
            priority: row.get("priority")?,
            due_at: row.get("due_at")?,
            completed_at: row.get("completed_at")?,
            completed_by: row.get("completed_by")?,
            comments: row.get::<_, Option<i64>>("comments")?.unwrap_or(0),
            amount: row.get("amount")?,
            currency: row.get("currency")?,
            payment_date: row.get("payment_date")?,
            payment_type: row.get("payment_type")?,
            contract_number: row.get("contract_number")?,
            discount: row.get("discount")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn set_updated_at(&mut self, millis: i64) {
        self.updated_at = millis;
    }
}

#[must_use]
pub fn deal_to_row(deal: &Deal) -> DealRow {
    DealRow {
        id: deal.id.clone(),
        title: deal.title.clone(),
        content: deal.content.clone(),
        user_name: deal.user_name.clone(),
        avatar: deal.avatar.clone(),
        status: deal.status.map(|s| s.as_str().to_string()),
        priority: deal.priority.map(|p| p.as_str().to_string()),
        due_at: to_millis(&deal.due_at),
        completed_at: opt_millis(deal.completed_at.as_ref()),
        completed_by: deal.completed_by.clone(),
        comments: deal.comments,
        amount: deal.amount,
        currency: deal.currency.clone(),
        payment_date: opt_millis(deal.payment_date.as_ref()),
        payment_type: deal.payment_type.clone(),
        contract_number: deal.contract_number.clone(),
        discount: deal.discount,
        created_at: to_millis(&deal.created_at),
        updated_at: to_millis(&deal.updated_at),
    }
}

#[must_use]
pub fn deal_from_row(row: DealRow) -> Deal {
    Deal {
        status: parse_status(&row.id, row.status.as_deref()),
        priority: parse_priority(&row.id, row.priority.as_deref()),
        due_at: from_millis(row.due_at),
        completed_at: opt_date(row.completed_at),
        payment_date: opt_date(row.payment_date),
        created_at: from_millis(row.created_at),
        updated_at: from_millis(row.updated_at),
        company_ids: Vec::new(),
        contact_ids: Vec::new(),
        related_deal_ids: Vec::new(),
        id: row.id,
        title: row.title,
        content: row.content,
        user_name: row.user_name,
        avatar: row.avatar,
        completed_by: row.completed_by,
        comments: row.comments,
        amount: row.amount,
        currency: row.currency,
        payment_type: row.payment_type,
        contract_number: row.contract_number,
        discount: row.discount,
    }
}

pub const DEAL_MAPPER: Mapper<Deal, DealRow> = Mapper {
    to_row: deal_to_row,
    from_row: deal_from_row,
};
