use crate::api::{
    Amount, Customer, Employee, InventoryItem, MenuItem, NewCustomer, NewEmployee,
    NewInventoryItem, NewOrder, NewOrderItem, Order, OrderId, OrderItem, OrderSummary,
};
use crate::database::{Database, OrderQuery};
use crate::errors::{Error, Result};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

/// Contains the SQL queries used to interact with the database
pub mod sql_queries {
    pub const CREATE_TABLES: &str = "
        CREATE TABLE IF NOT EXISTS orders (
            id TEXT PRIMARY KEY,
            customer_name TEXT NOT NULL,
            table_number INTEGER,
            payment_method TEXT NOT NULL,
            payment_status TEXT NOT NULL,
            status TEXT NOT NULL,
            total_amount INTEGER NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS order_items (
            id TEXT PRIMARY KEY,
            order_id TEXT NOT NULL REFERENCES orders (id),
            menu_item_id TEXT NOT NULL,
            quantity INTEGER NOT NULL,
            unit_price INTEGER NOT NULL,
            subtotal INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS order_items_by_order ON order_items (order_id);
        CREATE TABLE IF NOT EXISTS menu_items (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            price INTEGER NOT NULL,
            description TEXT NOT NULL,
            image_url TEXT NOT NULL,
            category TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS customers (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            phone TEXT NOT NULL,
            email TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS employees (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            role TEXT NOT NULL,
            phone TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS inventory (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            unit TEXT NOT NULL,
            quantity INTEGER NOT NULL,
            reorder_level INTEGER NOT NULL
        );";

    pub const INSERT_ORDER: &str = "INSERT INTO orders (id, customer_name, table_number, payment_method, payment_status, status, total_amount, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";
    pub const SELECT_ORDER: &str = "SELECT id, customer_name, table_number, payment_method, payment_status, status, total_amount, created_at FROM orders WHERE id = ?1";
    // created_at is fixed width RFC 3339 in UTC, so its first 10 characters are the date and
    // text ordering is chronological
    pub const SELECT_ORDERS: &str = "
        SELECT o.id, o.customer_name, o.table_number, o.payment_method, o.payment_status,
               o.status, o.total_amount, o.created_at,
               (SELECT COUNT(*) FROM order_items i WHERE i.order_id = o.id)
        FROM orders o
        WHERE (?1 IS NULL OR substr(o.created_at, 1, 10) = ?1)
          AND (?2 IS NULL OR o.payment_status = ?2)
        ORDER BY o.created_at DESC, o.rowid DESC";
    pub const DELETE_ORDER: &str = "DELETE FROM orders WHERE id = ?1";

    pub const INSERT_ORDER_ITEM: &str = "INSERT INTO order_items (id, order_id, menu_item_id, quantity, unit_price, subtotal) VALUES (?1, ?2, ?3, ?4, ?5, ?6)";
    pub const SELECT_ORDER_ITEMS: &str = "SELECT id, order_id, menu_item_id, quantity, unit_price, subtotal FROM order_items WHERE order_id = ?1 ORDER BY rowid";
    pub const DELETE_ORDER_ITEMS: &str = "DELETE FROM order_items WHERE order_id = ?1";
    pub const ORDER_EXISTS: &str = "SELECT 1 FROM orders WHERE id = ?1";

    pub const INSERT_MENU_ITEM: &str = "INSERT INTO menu_items (id, name, price, description, image_url, category) VALUES (?1, ?2, ?3, ?4, ?5, ?6)";
    pub const SELECT_MENU_ITEMS: &str = "SELECT id, name, price, description, image_url, category FROM menu_items ORDER BY rowid";

    pub const INSERT_CUSTOMER: &str = "INSERT INTO customers (id, name, phone, email) VALUES (?1, ?2, ?3, ?4)";
    pub const SELECT_CUSTOMERS: &str = "SELECT id, name, phone, email FROM customers ORDER BY name";

    pub const INSERT_EMPLOYEE: &str = "INSERT INTO employees (id, name, role, phone) VALUES (?1, ?2, ?3, ?4)";
    pub const SELECT_EMPLOYEES: &str = "SELECT id, name, role, phone FROM employees ORDER BY name";

    pub const INSERT_INVENTORY_ITEM: &str = "INSERT INTO inventory (id, name, unit, quantity, reorder_level) VALUES (?1, ?2, ?3, ?4, ?5)";
    pub const SELECT_INVENTORY: &str = "SELECT id, name, unit, quantity, reorder_level FROM inventory ORDER BY name";
}

/// Backend storing every table in SQLite, either in memory or in a file
pub struct SQLiteConnection {
    conn: Connection,
}

impl SQLiteConnection {
    /// Open (and create if needed) the database at the given path. ":memory:" gives a private
    /// in-memory database.
    pub fn open(path: &str) -> Result<Self> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };
        conn.execute_batch(sql_queries::CREATE_TABLES)?;
        tracing::debug!(path, "SQLite database ready");
        Ok(SQLiteConnection { conn })
    }
}

fn timestamp_to_sql(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn timestamp_from_sql(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}

/// SQLite integers are signed
fn amount_to_sql(amount: Amount) -> Result<i64> {
    i64::try_from(amount)
        .map_err(|_| Error::Validation(format!("Amount {} is out of range", amount)))
}

fn amount_from_sql(raw: i64) -> Result<Amount> {
    Amount::try_from(raw).map_err(|_| Error::CorruptedRow(format!("negative amount {}", raw)))
}

/// Raw columns of an order, before the text fields are parsed
struct OrderRow {
    id: String,
    customer_name: String,
    table_number: Option<u32>,
    payment_method: String,
    payment_status: String,
    status: String,
    total_amount: i64,
    created_at: String,
}

impl OrderRow {
    fn read(row: &Row) -> rusqlite::Result<OrderRow> {
        Ok(OrderRow {
            id: row.get(0)?,
            customer_name: row.get(1)?,
            table_number: row.get(2)?,
            payment_method: row.get(3)?,
            payment_status: row.get(4)?,
            status: row.get(5)?,
            total_amount: row.get(6)?,
            created_at: row.get(7)?,
        })
    }
}

/// Turns the parse errors of a stored value into a corrupted row error
fn parse_column<T>(raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|err: T::Err| Error::CorruptedRow(format!("'{}': {}", raw, err)))
}

impl TryFrom<OrderRow> for Order {
    type Error = Error;

    fn try_from(row: OrderRow) -> Result<Order> {
        Ok(Order {
            id: Uuid::parse_str(&row.id)?,
            customer_name: row.customer_name,
            table_number: row.table_number,
            payment_method: parse_column(&row.payment_method)?,
            payment_status: parse_column(&row.payment_status)?,
            status: parse_column(&row.status)?,
            total_amount: amount_from_sql(row.total_amount)?,
            created_at: timestamp_from_sql(&row.created_at)?,
        })
    }
}

struct OrderItemRow {
    id: String,
    order_id: String,
    menu_item_id: String,
    quantity: u32,
    unit_price: i64,
    subtotal: i64,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = Error;

    fn try_from(row: OrderItemRow) -> Result<OrderItem> {
        Ok(OrderItem {
            id: Uuid::parse_str(&row.id)?,
            order_id: Uuid::parse_str(&row.order_id)?,
            menu_item_id: row.menu_item_id,
            quantity: row.quantity,
            unit_price: amount_from_sql(row.unit_price)?,
            subtotal: amount_from_sql(row.subtotal)?,
        })
    }
}

/// Run a query returning rows that need a fallible conversion after being read
fn query_rows<R, T, P>(
    conn: &Connection,
    sql: &str,
    params: P,
    read: fn(&Row) -> rusqlite::Result<R>,
) -> Result<Vec<T>>
where
    T: TryFrom<R, Error = Error>,
    P: rusqlite::Params,
{
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, read)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    rows.into_iter().map(T::try_from).collect()
}

impl Database for SQLiteConnection {
    fn new() -> Result<Self> {
        SQLiteConnection::open(":memory:")
    }

    fn insert_order(&mut self, order: NewOrder) -> Result<Order> {
        // Stored with microsecond precision, the returned order must match what is read back
        let order = Order::from_new(Uuid::new_v4(), Utc::now().trunc_subsecs(6), order);
        self.conn.execute(
            sql_queries::INSERT_ORDER,
            params![
                order.id.to_string(),
                order.customer_name,
                order.table_number,
                order.payment_method.to_string(),
                order.payment_status.to_string(),
                order.status.to_string(),
                amount_to_sql(order.total_amount)?,
                timestamp_to_sql(&order.created_at),
            ],
        )?;
        Ok(order)
    }

    fn insert_order_items(&mut self, items: Vec<NewOrderItem>) -> Result<Vec<OrderItem>> {
        let items: Vec<_> = items
            .into_iter()
            .map(|item| OrderItem::from_new(Uuid::new_v4(), item))
            .collect();

        let tx = self.conn.transaction()?;
        insert_items(&tx, &items)?;
        tx.commit()?;

        Ok(items)
    }

    fn delete_order(&mut self, order_id: OrderId) -> Result<()> {
        let id = order_id.to_string();
        let tx = self.conn.transaction()?;
        tx.execute(sql_queries::DELETE_ORDER_ITEMS, params![id])?;
        let deleted = tx.execute(sql_queries::DELETE_ORDER, params![id])?;
        if deleted == 0 {
            return Err(Error::NotFound(format!("No order with id {}", order_id)));
        }
        tx.commit()?;
        Ok(())
    }

    fn get_order(&self, order_id: OrderId) -> Result<Order> {
        let row = self
            .conn
            .query_row(
                sql_queries::SELECT_ORDER,
                params![order_id.to_string()],
                OrderRow::read,
            )
            .optional()?;
        row.ok_or_else(|| Error::NotFound(format!("No order with id {}", order_id)))?
            .try_into()
    }

    fn get_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        query_rows(
            &self.conn,
            sql_queries::SELECT_ORDER_ITEMS,
            params![order_id.to_string()],
            |row| {
                Ok(OrderItemRow {
                    id: row.get(0)?,
                    order_id: row.get(1)?,
                    menu_item_id: row.get(2)?,
                    quantity: row.get(3)?,
                    unit_price: row.get(4)?,
                    subtotal: row.get(5)?,
                })
            },
        )
    }

    fn list_orders(&self, query: &OrderQuery) -> Result<Vec<OrderSummary>> {
        let date = query
            .created_on
            .map(|date| date.format("%Y-%m-%d").to_string());
        let payment_status = query.payment_status.map(|status| status.to_string());

        let mut stmt = self.conn.prepare(sql_queries::SELECT_ORDERS)?;
        let rows = stmt
            .query_map(params![date, payment_status], |row| {
                Ok((OrderRow::read(row)?, row.get::<_, i64>(8)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(order, count)| {
                Ok(OrderSummary {
                    order: order.try_into()?,
                    item_count: usize::try_from(count)
                        .map_err(|_| Error::CorruptedRow(format!("item count {}", count)))?,
                })
            })
            .collect()
    }

    fn list_menu_items(&self) -> Result<Vec<MenuItem>> {
        let mut stmt = self.conn.prepare(sql_queries::SELECT_MENU_ITEMS)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, name, price, description, image_url, category)| {
                Ok(MenuItem {
                    id,
                    name,
                    price: amount_from_sql(price)?,
                    description,
                    image_url,
                    category: parse_column(&category)?,
                })
            })
            .collect()
    }

    fn insert_menu_item(&mut self, item: MenuItem) -> Result<MenuItem> {
        let result = self.conn.execute(
            sql_queries::INSERT_MENU_ITEM,
            params![
                item.id,
                item.name,
                amount_to_sql(item.price)?,
                item.description,
                item.image_url,
                item.category.to_string(),
            ],
        );
        match result {
            Ok(_) => Ok(item),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(Error::Validation(format!(
                    "A menu item with id {} already exists",
                    item.id
                )))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn list_customers(&self) -> Result<Vec<Customer>> {
        let mut stmt = self.conn.prepare(sql_queries::SELECT_CUSTOMERS)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, name, phone, email)| {
                Ok(Customer {
                    id: Uuid::parse_str(&id)?,
                    name,
                    phone,
                    email,
                })
            })
            .collect()
    }

    fn insert_customer(&mut self, customer: NewCustomer) -> Result<Customer> {
        let customer = Customer {
            id: Uuid::new_v4(),
            name: customer.name,
            phone: customer.phone,
            email: customer.email,
        };
        self.conn.execute(
            sql_queries::INSERT_CUSTOMER,
            params![
                customer.id.to_string(),
                customer.name,
                customer.phone,
                customer.email
            ],
        )?;
        Ok(customer)
    }

    fn list_employees(&self) -> Result<Vec<Employee>> {
        let mut stmt = self.conn.prepare(sql_queries::SELECT_EMPLOYEES)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, name, role, phone)| {
                Ok(Employee {
                    id: Uuid::parse_str(&id)?,
                    name,
                    role,
                    phone,
                })
            })
            .collect()
    }

    fn insert_employee(&mut self, employee: NewEmployee) -> Result<Employee> {
        let employee = Employee {
            id: Uuid::new_v4(),
            name: employee.name,
            role: employee.role,
            phone: employee.phone,
        };
        self.conn.execute(
            sql_queries::INSERT_EMPLOYEE,
            params![
                employee.id.to_string(),
                employee.name,
                employee.role,
                employee.phone
            ],
        )?;
        Ok(employee)
    }

    fn list_inventory(&self) -> Result<Vec<InventoryItem>> {
        let mut stmt = self.conn.prepare(sql_queries::SELECT_INVENTORY)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, name, unit, quantity, reorder_level)| {
                Ok(InventoryItem {
                    id: Uuid::parse_str(&id)?,
                    name,
                    unit,
                    quantity,
                    reorder_level,
                })
            })
            .collect()
    }

    fn insert_inventory_item(&mut self, item: NewInventoryItem) -> Result<InventoryItem> {
        let item = InventoryItem {
            id: Uuid::new_v4(),
            name: item.name,
            unit: item.unit,
            quantity: item.quantity,
            reorder_level: item.reorder_level,
        };
        self.conn.execute(
            sql_queries::INSERT_INVENTORY_ITEM,
            params![
                item.id.to_string(),
                item.name,
                item.unit,
                item.quantity,
                item.reorder_level
            ],
        )?;
        Ok(item)
    }
}

/// Insert a batch of order lines inside an open transaction
///
/// Fails without inserting anything if the parent order doesn't exist.
fn insert_items(tx: &rusqlite::Transaction, items: &[OrderItem]) -> Result<()> {
    let mut exists = tx.prepare(sql_queries::ORDER_EXISTS)?;
    let mut stmt = tx.prepare(sql_queries::INSERT_ORDER_ITEM)?;

    for item in items.iter() {
        let order_id = item.order_id.to_string();
        if !exists.exists(params![order_id])? {
            return Err(Error::NotFound(format!("No order with id {}", item.order_id)));
        }
        stmt.execute(params![
            item.id.to_string(),
            order_id,
            item.menu_item_id,
            item.quantity,
            amount_to_sql(item.unit_price)?,
            amount_to_sql(item.subtotal)?,
        ])?;
    }

    Ok(())
}
