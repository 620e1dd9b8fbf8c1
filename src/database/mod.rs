use crate::api::{
    Category, Customer, Employee, InventoryItem, MenuItem, NewCustomer, NewEmployee,
    NewInventoryItem, NewOrder, NewOrderItem, Order, OrderId, OrderItem, OrderSummary,
    PaymentStatus,
};
use crate::errors::Result;
use chrono::NaiveDate;

pub mod mock;
pub mod sqlite;

/// Server-side filters applied by `Database::list_orders`.
///
/// Results are always sorted by creation time, newest first.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OrderQuery {
    /// Only orders created on this (UTC) day
    pub created_on: Option<NaiveDate>,
    pub payment_status: Option<PaymentStatus>,
}

impl OrderQuery {
    /// Every order
    pub fn all() -> OrderQuery {
        OrderQuery::default()
    }

    pub fn created_on(date: NaiveDate) -> OrderQuery {
        OrderQuery {
            created_on: Some(date),
            ..Default::default()
        }
    }

    /// Whether an order passes the filters. Backends without query support use this.
    pub fn matches(&self, order: &Order) -> bool {
        self.created_on
            .map_or(true, |date| order.created_at.date_naive() == date)
            && self
                .payment_status
                .map_or(true, |status| order.payment_status == status)
    }
}

/// Trait hiding the backend storing the restaurant's tables
///
/// Every method is a single request against the backend: there is no cross-call transaction, so
/// callers that issue several requests in a row are responsible for cleaning up after a failure
/// in the middle.
pub trait Database {
    /// Create a new empty database
    fn new() -> Result<Self>
    where
        Self: Sized;

    /// Insert an order row. The backend generates the id and the creation time.
    fn insert_order(&mut self, order: NewOrder) -> Result<Order>;

    /// Insert a batch of order lines. Either all of them are stored or none is.
    fn insert_order_items(&mut self, items: Vec<NewOrderItem>) -> Result<Vec<OrderItem>>;

    /// Delete an order along with its lines
    ///
    /// Returns a NotFound error if there is no such order
    fn delete_order(&mut self, order_id: OrderId) -> Result<()>;

    /// Retrieve an order by id
    ///
    /// Returns a NotFound error if the request succeeds but the order doesn't exist
    fn get_order(&self, order_id: OrderId) -> Result<Order>;

    /// Retrieve the lines of an order, possibly empty
    fn get_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>>;

    /// List orders matching the query, newest first, with their line count
    fn list_orders(&self, query: &OrderQuery) -> Result<Vec<OrderSummary>>;

    fn list_menu_items(&self) -> Result<Vec<MenuItem>>;
    fn insert_menu_item(&mut self, item: MenuItem) -> Result<MenuItem>;

    fn list_customers(&self) -> Result<Vec<Customer>>;
    fn insert_customer(&mut self, customer: NewCustomer) -> Result<Customer>;

    fn list_employees(&self) -> Result<Vec<Employee>>;
    fn insert_employee(&mut self, employee: NewEmployee) -> Result<Employee>;

    fn list_inventory(&self) -> Result<Vec<InventoryItem>>;
    fn insert_inventory_item(&mut self, item: NewInventoryItem) -> Result<InventoryItem>;
}

/// The menu the restaurant starts with
pub fn sample_menu() -> Vec<MenuItem> {
    const PHOTO: &str = "/uploads/6d4c469f-6bac-4583-9cc5-654712a55973.png";
    let item = |id: &str, name: &str, price, description: &str, image_url: &str, category| {
        MenuItem {
            id: id.to_string(),
            name: name.to_string(),
            price,
            description: description.to_string(),
            image_url: image_url.to_string(),
            category,
        }
    };

    vec![
        item("prod1", "Beef Ribs", 15000, "Slow-cooked tender beef ribs", PHOTO, Category::NyamaChoma),
        item("prod2", "Goat Meat", 12000, "Grilled goat meat with spices", PHOTO, Category::NyamaChoma),
        item("prod3", "Grilled Chicken", 10000, "Whole grilled chicken with spices", PHOTO, Category::Kuku),
        item("prod4", "Chicken Wings", 8000, "Spicy grilled chicken wings", "", Category::Kuku),
        item("prod5", "Chips Masala", 5000, "Fries with special masala seasoning", "", Category::Chips),
        item("prod6", "Ugali", 2000, "Traditional corn meal dish", "", Category::Ugali),
        item("prod7", "Pilau Rice", 4000, "Spiced rice with aromatic spices", "", Category::Rice),
        item("prod8", "Soda", 1500, "Assorted soft drinks", "", Category::Beverages),
    ]
}

/// Insert the sample menu in the given database
pub fn seed_menu(db: &mut dyn Database) -> Result<()> {
    for item in sample_menu() {
        db.insert_menu_item(item)?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::api::{OrderStatus, PaymentMethod};
    use chrono::{TimeZone, Utc};
    use strum::IntoEnumIterator;
    use uuid::Uuid;

    #[test]
    fn test_sample_menu_covers_every_category() {
        let menu = sample_menu();
        assert_eq!(menu.len(), 8);
        for category in Category::iter() {
            assert!(menu.iter().any(|item| item.category == category));
        }
        let ribs = menu.iter().find(|item| item.id == "prod1").unwrap();
        assert_eq!(ribs.price, 15000);
    }

    #[test]
    fn test_order_query_matches() {
        let order = Order {
            id: Uuid::new_v4(),
            customer_name: "Guest".to_string(),
            table_number: None,
            payment_method: PaymentMethod::Cash,
            payment_status: PaymentStatus::Pending,
            status: OrderStatus::InProgress,
            total_amount: 1500,
            created_at: Utc.with_ymd_and_hms(2026, 10, 19, 23, 59, 0).unwrap(),
        };
        let day = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();

        assert!(OrderQuery::all().matches(&order));
        assert!(OrderQuery::created_on(day).matches(&order));
        assert!(!OrderQuery::created_on(day.succ_opt().unwrap()).matches(&order));

        let paid = OrderQuery {
            payment_status: Some(PaymentStatus::Paid),
            ..Default::default()
        };
        assert!(!paid.matches(&order));
    }
}
