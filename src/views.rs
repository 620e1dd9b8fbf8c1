//! Read-only listings behind the browse pages.
//!
//! Each listing issues a single read against the backend, using its server-side filters where
//! it has them, then narrows the rows down locally.
use crate::api::{
    Bill, Category, Customer, Employee, InventoryItem, MenuItem, OrderStatus, OrderSummary,
    PaymentStatus, Reservation, ReservationStatus,
};
use crate::database::{Database, OrderQuery};
use crate::errors::Result;
use chrono::NaiveDate;

/// Party size assumed for reservations without a table
pub const DEFAULT_PARTY_SIZE: u32 = 2;

/// Placeholder shown for reservations, orders carry no phone number
pub const NO_PHONE: &str = "(No phone on record)";

/// Case insensitive substring match of the search term in any of the fields.
/// An empty term matches everything.
fn matches_search(term: &str, fields: &[&str]) -> bool {
    let term = term.trim().to_lowercase();
    term.is_empty()
        || fields
            .iter()
            .any(|field| field.to_lowercase().contains(&term))
}

/// All orders, newest first, narrowed down to those whose id, customer or status match
pub fn orders(db: &dyn Database, search: &str) -> Result<Vec<OrderSummary>> {
    let orders = db.list_orders(&OrderQuery::all())?;
    Ok(orders
        .into_iter()
        .filter(|summary| {
            let order = &summary.order;
            let status: &str = order.status.as_ref();
            matches_search(
                search,
                &[
                    order.id.to_string().as_str(),
                    order.customer_name.as_str(),
                    status,
                ],
            )
        })
        .collect())
}

/// Reservation status shown for an order in a given state
fn reservation_status(status: OrderStatus) -> ReservationStatus {
    match status {
        OrderStatus::Completed => ReservationStatus::Confirmed,
        OrderStatus::Pending | OrderStatus::InProgress => ReservationStatus::Pending,
        OrderStatus::Cancelled => ReservationStatus::Cancelled,
    }
}

/// Reservations of one day, derived from the orders created that day.
///
/// `status` None shows every reservation.
pub fn reservations(
    db: &dyn Database,
    date: NaiveDate,
    status: Option<ReservationStatus>,
) -> Result<Vec<Reservation>> {
    let orders = db.list_orders(&OrderQuery::created_on(date))?;
    Ok(orders
        .into_iter()
        .map(|summary| {
            let order = summary.order;
            Reservation {
                id: order.id,
                name: order.customer_name,
                people: order.table_number.unwrap_or(DEFAULT_PARTY_SIZE),
                time: order.created_at.format("%H:%M").to_string(),
                date: order.created_at.date_naive(),
                status: reservation_status(order.status),
                phone: NO_PHONE.to_string(),
                table_number: order.table_number,
            }
        })
        .filter(|reservation| status.map_or(true, |status| reservation.status == status))
        .collect())
}

/// Menu items of a category (or all of them), whose name or description match the search
pub fn menu(db: &dyn Database, category: Option<Category>, search: &str) -> Result<Vec<MenuItem>> {
    Ok(db
        .list_menu_items()?
        .into_iter()
        .filter(|item| category.map_or(true, |category| item.category == category))
        .filter(|item| matches_search(search, &[item.name.as_str(), item.description.as_str()]))
        .collect())
}

/// Orders seen as bills, newest first, optionally only those with the given payment status
pub fn bills(db: &dyn Database, payment_status: Option<PaymentStatus>) -> Result<Vec<Bill>> {
    let query = OrderQuery {
        payment_status,
        ..Default::default()
    };
    Ok(db
        .list_orders(&query)?
        .into_iter()
        .map(|summary| {
            let order = summary.order;
            Bill {
                order_id: order.id,
                customer_name: order.customer_name,
                table_number: order.table_number,
                total_amount: order.total_amount,
                payment_method: order.payment_method,
                payment_status: order.payment_status,
                created_at: order.created_at,
            }
        })
        .collect())
}

pub fn customers(db: &dyn Database, search: &str) -> Result<Vec<Customer>> {
    Ok(db
        .list_customers()?
        .into_iter()
        .filter(|c| matches_search(search, &[c.name.as_str(), c.phone.as_str(), c.email.as_str()]))
        .collect())
}

pub fn employees(db: &dyn Database, search: &str) -> Result<Vec<Employee>> {
    Ok(db
        .list_employees()?
        .into_iter()
        .filter(|e| matches_search(search, &[e.name.as_str(), e.role.as_str()]))
        .collect())
}

/// Stock items matching the search, only those to reorder if `low_stock_only` is set
pub fn inventory(db: &dyn Database, search: &str, low_stock_only: bool) -> Result<Vec<InventoryItem>> {
    Ok(db
        .list_inventory()?
        .into_iter()
        .filter(|item| !low_stock_only || item.is_low_stock())
        .filter(|item| matches_search(search, &[item.name.as_str()]))
        .collect())
}
