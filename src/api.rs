// This file contains the basic types used to communicate through the API
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};
use uuid::Uuid;

/// Identifier of a persisted order, generated by the backend on creation
pub type OrderId = Uuid;

/// Identifier of a menu item. These are chosen by whoever creates the item ("prod1", ...)
pub type MenuItemId = String;

/// Amount of money in Tanzanian shillings. There is no minor unit.
pub type Amount = u64;

// The enums below travel as plain strings, both in JSON and in the database columns.
// Parsing with `FromStr` is case insensitive.

/// How the customer settles the bill
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
    Display, EnumString, AsRefStr, IntoStaticStr, EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    MobileMoney,
}

#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
    Display, EnumString, AsRefStr, IntoStaticStr, EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Refunded,
}

/// Kitchen/service progress of an order
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
    Display, EnumString, AsRefStr, IntoStaticStr, EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum OrderStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
    Display, EnumString, AsRefStr, IntoStaticStr, EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum ReservationStatus {
    Confirmed,
    Pending,
    Cancelled,
}

/// Menu sections. The list is fixed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
    Display, EnumString, AsRefStr, IntoStaticStr, EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum Category {
    #[serde(rename = "Nyama Choma")]
    #[strum(to_string = "Nyama Choma")]
    NyamaChoma,
    Kuku,
    Chips,
    Ugali,
    Rice,
    Beverages,
}

/// A line of the cart
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CartItem {
    /// Menu item this line refers to. Unique within a cart.
    pub id: MenuItemId,
    pub name: String,
    /// Unit price
    pub price: Amount,
    pub quantity: u32,
}

/// Body of a quantity update on a cart line
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct QuantityUpdate {
    pub quantity: u32,
}

/// Information collected at checkout time
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OrderDetails {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub table_number: Option<u32>,
    pub payment_method: PaymentMethod,
}

/// Order entered by staff without going through the cart
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NewOrderRequest {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub table_number: Option<u32>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    pub items: Vec<NewOrderLine>,
}

/// A menu item and how many of it, priced from the menu when the order is created
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NewOrderLine {
    pub menu_item_id: MenuItemId,
    pub quantity: u32,
}

/// Row inserted in the orders collection. The backend assigns the id and creation time.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub customer_name: String,
    pub table_number: Option<u32>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    pub total_amount: Amount,
}

/// A persisted order
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub customer_name: String,
    pub table_number: Option<u32>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    pub total_amount: Amount,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Build the persisted order out of an insert request
    pub fn from_new(id: OrderId, created_at: DateTime<Utc>, new: NewOrder) -> Order {
        Order {
            id,
            customer_name: new.customer_name,
            table_number: new.table_number,
            payment_method: new.payment_method,
            payment_status: new.payment_status,
            status: new.status,
            total_amount: new.total_amount,
            created_at,
        }
    }
}

/// An order as returned by list queries, with the number of lines it holds
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OrderSummary {
    #[serde(flatten)]
    pub order: Order,
    pub item_count: usize,
}

/// Row inserted in the order items collection
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub order_id: OrderId,
    pub menu_item_id: MenuItemId,
    pub quantity: u32,
    pub unit_price: Amount,
    pub subtotal: Amount,
}

/// A persisted order line
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: OrderId,
    pub menu_item_id: MenuItemId,
    pub quantity: u32,
    pub unit_price: Amount,
    pub subtotal: Amount,
}

impl OrderItem {
    pub fn from_new(id: Uuid, new: NewOrderItem) -> OrderItem {
        OrderItem {
            id,
            order_id: new.order_id,
            menu_item_id: new.menu_item_id,
            quantity: new.quantity,
            unit_price: new.unit_price,
            subtotal: new.subtotal,
        }
    }
}

/// Response to a successful checkout
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CheckoutResult {
    pub order_id: OrderId,
    /// Short reference shown to staff, first 8 characters of the id in upper case
    pub reference: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ReceiptLine {
    pub name: String,
    pub quantity: u32,
    pub unit_price: Amount,
    pub subtotal: Amount,
}

/// Display-ready summary of an order. Never stored.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub order_id: OrderId,
    pub customer_name: String,
    pub table_number: Option<u32>,
    pub lines: Vec<ReceiptLine>,
    pub total: Amount,
    pub payment_method: PaymentMethod,
    pub date: DateTime<Utc>,
}

/// An entry of the menu
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub id: MenuItemId,
    pub name: String,
    pub price: Amount,
    #[serde(default)]
    pub description: String,
    /// Path or URL of the picture, empty when there is none
    #[serde(default)]
    pub image_url: String,
    pub category: Category,
}

/// A reservation, as derived from the orders of one day
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub id: OrderId,
    pub name: String,
    /// Party size. Falls back to 2 when the order has no table.
    pub people: u32,
    /// "HH:MM"
    pub time: String,
    pub date: NaiveDate,
    pub status: ReservationStatus,
    pub phone: String,
    pub table_number: Option<u32>,
}

/// An order seen from the cashier's side
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Bill {
    pub order_id: OrderId,
    pub customer_name: String,
    pub table_number: Option<u32>,
    pub total_amount: Amount,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NewEmployee {
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Employee {
    pub id: Uuid,
    pub name: String,
    pub role: String,
    pub phone: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NewInventoryItem {
    pub name: String,
    /// Unit the quantity is counted in ("kg", "crate", ...)
    pub unit: String,
    pub quantity: u32,
    pub reorder_level: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct InventoryItem {
    pub id: Uuid,
    pub name: String,
    pub unit: String,
    pub quantity: u32,
    pub reorder_level: u32,
}

impl InventoryItem {
    /// Whether the stock has reached the point where it must be reordered
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.reorder_level
    }
}

/// Error payload sent back by the server
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}
