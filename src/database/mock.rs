use super::{Database, OrderQuery};
use crate::api::{
    Customer, Employee, InventoryItem, MenuItem, NewCustomer, NewEmployee, NewInventoryItem,
    NewOrder, NewOrderItem, Order, OrderId, OrderItem, OrderSummary,
};
use crate::errors::{Error, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// In-memory backend for unit tests.
///
/// Requests can be made to fail on demand to exercise the error paths of the callers, and every
/// write is counted.
#[derive(Debug, Default)]
pub struct MockDB {
    orders: Vec<Order>,
    order_items: Vec<OrderItem>,
    menu: Vec<MenuItem>,
    customers: Vec<Customer>,
    employees: Vec<Employee>,
    inventory: Vec<InventoryItem>,

    /// Creation time given to new orders instead of the current time
    clock: Option<DateTime<Utc>>,

    fail_order_insert: bool,
    fail_items_insert: bool,
    fail_delete: bool,
    fail_reads: bool,
    crash_order_insert: bool,

    /// Number of insert requests received, successful or not
    pub order_inserts: usize,
    pub item_inserts: usize,
    pub deletes: usize,
}

impl MockDB {
    /// Make the next order insert fail
    pub fn fail_next_order_insert(&mut self) {
        self.fail_order_insert = true;
    }

    /// Make the next order items insert fail
    pub fn fail_next_items_insert(&mut self) {
        self.fail_items_insert = true;
    }

    /// Make the next delete fail
    pub fn fail_next_delete(&mut self) {
        self.fail_delete = true;
    }

    /// Make the next order insert panic, as a bug in the backend driver would
    pub fn crash_next_order_insert(&mut self) {
        self.crash_order_insert = true;
    }

    /// Make every read fail until switched back
    pub fn fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// Pin the creation time of the next orders
    pub fn set_clock(&mut self, now: Option<DateTime<Utc>>) {
        self.clock = now;
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn order_items(&self) -> &[OrderItem] {
        &self.order_items
    }

    fn check_reads(&self) -> Result<()> {
        if self.fail_reads {
            Err(Error::Unavailable("reads disabled".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Consume a one-shot failure flag
fn take_failure(flag: &mut bool, what: &str) -> Result<()> {
    if std::mem::take(flag) {
        Err(Error::Unavailable(format!("{} rejected", what)))
    } else {
        Ok(())
    }
}

impl Database for MockDB {
    fn new() -> Result<Self> {
        Ok(MockDB::default())
    }

    fn insert_order(&mut self, order: NewOrder) -> Result<Order> {
        self.order_inserts += 1;
        if std::mem::take(&mut self.crash_order_insert) {
            panic!("order insert crashed");
        }
        take_failure(&mut self.fail_order_insert, "order insert")?;

        let created_at = self.clock.unwrap_or_else(Utc::now);
        let order = Order::from_new(Uuid::new_v4(), created_at, order);
        self.orders.push(order.clone());
        Ok(order)
    }

    fn insert_order_items(&mut self, items: Vec<NewOrderItem>) -> Result<Vec<OrderItem>> {
        self.item_inserts += 1;
        take_failure(&mut self.fail_items_insert, "order items insert")?;

        if let Some(orphan) = items
            .iter()
            .find(|item| !self.orders.iter().any(|order| order.id == item.order_id))
        {
            return Err(Error::NotFound(format!("No order with id {}", orphan.order_id)));
        }

        let items: Vec<_> = items
            .into_iter()
            .map(|item| OrderItem::from_new(Uuid::new_v4(), item))
            .collect();
        self.order_items.extend(items.iter().cloned());
        Ok(items)
    }

    fn delete_order(&mut self, order_id: OrderId) -> Result<()> {
        self.deletes += 1;
        take_failure(&mut self.fail_delete, "order delete")?;

        let old_len = self.orders.len();
        self.orders.retain(|order| order.id != order_id);
        if old_len == self.orders.len() {
            return Err(Error::NotFound(format!("No order with id {}", order_id)));
        }
        self.order_items.retain(|item| item.order_id != order_id);
        Ok(())
    }

    fn get_order(&self, order_id: OrderId) -> Result<Order> {
        self.check_reads()?;
        self.orders
            .iter()
            .find(|order| order.id == order_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("No order with id {}", order_id)))
    }

    fn get_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        self.check_reads()?;
        Ok(self
            .order_items
            .iter()
            .filter(|item| item.order_id == order_id)
            .cloned()
            .collect())
    }

    fn list_orders(&self, query: &OrderQuery) -> Result<Vec<OrderSummary>> {
        self.check_reads()?;
        // Reversed first so that orders sharing a timestamp come out newest first too
        let mut orders: Vec<_> = self
            .orders
            .iter()
            .rev()
            .filter(|order| query.matches(order))
            .map(|order| OrderSummary {
                order: order.clone(),
                item_count: self
                    .order_items
                    .iter()
                    .filter(|item| item.order_id == order.id)
                    .count(),
            })
            .collect();
        orders.sort_by(|a, b| b.order.created_at.cmp(&a.order.created_at));
        Ok(orders)
    }

    fn list_menu_items(&self) -> Result<Vec<MenuItem>> {
        self.check_reads()?;
        Ok(self.menu.clone())
    }

    fn insert_menu_item(&mut self, item: MenuItem) -> Result<MenuItem> {
        if self.menu.iter().any(|existing| existing.id == item.id) {
            return Err(Error::Validation(format!(
                "A menu item with id {} already exists",
                item.id
            )));
        }
        self.menu.push(item.clone());
        Ok(item)
    }

    fn list_customers(&self) -> Result<Vec<Customer>> {
        self.check_reads()?;
        Ok(self.customers.clone())
    }

    fn insert_customer(&mut self, customer: NewCustomer) -> Result<Customer> {
        let customer = Customer {
            id: Uuid::new_v4(),
            name: customer.name,
            phone: customer.phone,
            email: customer.email,
        };
        self.customers.push(customer.clone());
        Ok(customer)
    }

    fn list_employees(&self) -> Result<Vec<Employee>> {
        self.check_reads()?;
        Ok(self.employees.clone())
    }

    fn insert_employee(&mut self, employee: NewEmployee) -> Result<Employee> {
        let employee = Employee {
            id: Uuid::new_v4(),
            name: employee.name,
            role: employee.role,
            phone: employee.phone,
        };
        self.employees.push(employee.clone());
        Ok(employee)
    }

    fn list_inventory(&self) -> Result<Vec<InventoryItem>> {
        self.check_reads()?;
        Ok(self.inventory.clone())
    }

    fn insert_inventory_item(&mut self, item: NewInventoryItem) -> Result<InventoryItem> {
        let item = InventoryItem {
            id: Uuid::new_v4(),
            name: item.name,
            unit: item.unit,
            quantity: item.quantity,
            reorder_level: item.reorder_level,
        };
        self.inventory.push(item.clone());
        Ok(item)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::api::{OrderStatus, PaymentMethod, PaymentStatus};
    use chrono::TimeZone;

    fn new_order(name: &str, total: u64) -> NewOrder {
        NewOrder {
            customer_name: name.to_string(),
            table_number: Some(3),
            payment_method: PaymentMethod::Cash,
            payment_status: PaymentStatus::Pending,
            status: OrderStatus::InProgress,
            total_amount: total,
        }
    }

    fn line(order_id: OrderId, menu_item_id: &str, quantity: u32, unit_price: u64) -> NewOrderItem {
        NewOrderItem {
            order_id,
            menu_item_id: menu_item_id.to_string(),
            quantity,
            unit_price,
            subtotal: unit_price * quantity as u64,
        }
    }

    #[test]
    fn test_mock_db() {
        let mut db = MockDB::new().unwrap();
        let ribs = db.insert_order(new_order("Amina", 15000)).unwrap();
        let soda = db.insert_order(new_order("Baraka", 3000)).unwrap();

        db.insert_order_items(vec![line(ribs.id, "prod1", 1, 15000)])
            .unwrap();
        db.insert_order_items(vec![line(soda.id, "prod8", 2, 1500)])
            .unwrap();

        assert_eq!(db.get_order(ribs.id).unwrap().customer_name, "Amina");
        assert_eq!(db.get_order_items(soda.id).unwrap()[0].subtotal, 3000);
        assert!(db.get_order(Uuid::new_v4()).is_err());

        let listed = db.list_orders(&OrderQuery::all()).unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|summary| summary.item_count == 1));

        db.delete_order(ribs.id).unwrap();
        assert!(db.get_order(ribs.id).is_err());
        assert!(db.get_order_items(ribs.id).unwrap().is_empty());
        assert!(matches!(db.delete_order(ribs.id), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_items_need_an_existing_order() {
        let mut db = MockDB::new().unwrap();
        let result = db.insert_order_items(vec![line(Uuid::new_v4(), "prod1", 1, 15000)]);
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert!(db.order_items().is_empty());
    }

    #[test]
    fn test_failures_are_one_shot() {
        let mut db = MockDB::new().unwrap();
        db.fail_next_order_insert();
        assert!(matches!(
            db.insert_order(new_order("Guest", 0)),
            Err(Error::Unavailable(_))
        ));
        assert!(db.insert_order(new_order("Guest", 0)).is_ok());
        assert_eq!(db.order_inserts, 2);
        assert_eq!(db.orders().len(), 1);

        db.fail_reads(true);
        assert!(db.list_orders(&OrderQuery::all()).is_err());
        db.fail_reads(false);
        assert!(db.list_orders(&OrderQuery::all()).is_ok());
    }

    #[test]
    fn test_list_orders_newest_first() {
        let mut db = MockDB::new().unwrap();
        db.set_clock(Some(Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()));
        db.insert_order(new_order("Yesterday", 0)).unwrap();
        db.set_clock(Some(Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()));
        db.insert_order(new_order("Breakfast", 0)).unwrap();
        db.insert_order(new_order("Second breakfast", 0)).unwrap();

        let names: Vec<_> = db
            .list_orders(&OrderQuery::all())
            .unwrap()
            .into_iter()
            .map(|summary| summary.order.customer_name)
            .collect();
        assert_eq!(names, vec!["Second breakfast", "Breakfast", "Yesterday"]);

        let day = chrono::NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let listed = db.list_orders(&OrderQuery::created_on(day)).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].order.customer_name, "Yesterday");
    }

    #[test]
    fn test_duplicate_menu_ids_are_rejected() {
        let mut db = MockDB::new().unwrap();
        super::super::seed_menu(&mut db).unwrap();
        assert_eq!(db.list_menu_items().unwrap().len(), 8);
        let ribs = db.list_menu_items().unwrap()[0].clone();
        assert!(matches!(db.insert_menu_item(ribs), Err(Error::Validation(_))));
    }
}
