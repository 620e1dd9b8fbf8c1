use crate::api::{
    CartItem, MenuItem, NewOrder, NewOrderItem, NewOrderRequest, Order, OrderDetails, OrderId,
    OrderItem, OrderStatus, PaymentMethod, PaymentStatus, Receipt, ReceiptLine,
};
use crate::cart::{format_currency, line_total, Cart};
use crate::database::Database;
use crate::errors::{Error, Result};
use serde::Serialize;
use std::collections::HashMap;

/// Name stored on orders placed without a customer name
pub const GUEST: &str = "Guest";

/// Where the order submission flow currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "order_id", rename_all = "snake_case")]
pub enum SubmissionState {
    Idle,
    Submitting,
    Succeeded(OrderId),
    Failed,
}

/// What the cart held when an order was placed. Receipts are built from it since the cart itself
/// is emptied on success.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Snapshot {
    order_id: OrderId,
    lines: Vec<ReceiptLine>,
    total: u64,
    payment_method: PaymentMethod,
}

/// An order ready to be stored, with every amount already computed
struct Draft {
    order: NewOrder,
    lines: Vec<CartItem>,
    subtotals: Vec<u64>,
}

impl Draft {
    /// Fill in the subtotals and the total of the order, refusing amounts that overflow
    fn new(mut order: NewOrder, lines: Vec<CartItem>) -> Result<Draft> {
        let out_of_range = || Error::Validation("Order total is out of range".to_string());
        let subtotals = lines
            .iter()
            .map(|line| line_total(line).ok_or_else(out_of_range))
            .collect::<Result<Vec<_>>>()?;
        order.total_amount = subtotals
            .iter()
            .try_fold(0u64, |total, subtotal| total.checked_add(*subtotal))
            .ok_or_else(out_of_range)?;
        Ok(Draft {
            order,
            lines,
            subtotals,
        })
    }
}

/// State of one till: its backend connection, the order being taken and the last one placed.
///
/// There is no global instance, the owner passes it around (the server keeps it behind a mutex).
pub struct PointOfSale<D: Database + ?Sized = dyn Database + Send> {
    db: Box<D>,
    cart: Cart,
    state: SubmissionState,
    last_order: Option<Snapshot>,
}

impl<D: Database + ?Sized> PointOfSale<D> {
    pub fn new(db: Box<D>) -> PointOfSale<D> {
        PointOfSale {
            db,
            cart: Cart::new(),
            state: SubmissionState::Idle,
            last_order: None,
        }
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn cart_mut(&mut self) -> &mut Cart {
        &mut self.cart
    }

    pub fn database(&self) -> &D {
        &self.db
    }

    pub fn database_mut(&mut self) -> &mut D {
        &mut self.db
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    /// Whether an order is being submitted right now
    pub fn is_processing(&self) -> bool {
        self.state == SubmissionState::Submitting
    }

    /// Id of the last order placed from this till
    pub fn last_order_id(&self) -> Option<OrderId> {
        self.last_order.as_ref().map(|snapshot| snapshot.order_id)
    }

    /// Add one or more of a menu item to the cart, by id
    pub fn add_menu_item(&mut self, menu_item_id: &str, quantity: u32) -> Result<&CartItem> {
        let item = self.menu_item(menu_item_id)?;
        self.cart.add_item(CartItem {
            id: item.id,
            name: item.name,
            price: item.price,
            quantity,
        })?;
        self.cart.get(menu_item_id).ok_or_else(|| {
            Error::Validation(format!("Cannot add {} of {}", quantity, menu_item_id))
        })
    }

    fn menu_item(&self, menu_item_id: &str) -> Result<MenuItem> {
        self.db
            .list_menu_items()?
            .into_iter()
            .find(|item| item.id == menu_item_id)
            .ok_or_else(|| Error::NotFound(format!("No menu item with id {}", menu_item_id)))
    }

    /// Put the till back in a usable state after a panic interrupted a submission
    pub fn recover(&mut self) {
        if self.state == SubmissionState::Submitting {
            tracing::warn!("Submission interrupted, till reset");
            self.state = SubmissionState::Idle;
        }
    }

    /// Turn the cart into a persisted order with one line per cart item.
    ///
    /// On success the cart is emptied and the new order id is returned. On failure the cart is
    /// left untouched so that the order can be submitted again. If the lines cannot be stored
    /// the order row is deleted again; should that fail too, a PartialFailure naming the
    /// orphaned order is returned.
    pub fn submit_order(&mut self, details: OrderDetails) -> Result<OrderId> {
        if self.is_processing() {
            return Err(Error::Busy);
        }
        if self.cart.is_empty() {
            tracing::warn!("Rejected checkout of an empty cart");
            return Err(Error::Validation(
                "Cannot process an order with an empty cart".to_string(),
            ));
        }

        let customer_name = match details.customer_name.trim() {
            "" => GUEST.to_string(),
            name => name.to_string(),
        };
        let draft = Draft::new(
            NewOrder {
                customer_name,
                table_number: details.table_number,
                payment_method: details.payment_method,
                payment_status: PaymentStatus::Pending,
                status: OrderStatus::InProgress,
                total_amount: 0,
            },
            self.cart.items().to_vec(),
        )?;

        self.state = SubmissionState::Submitting;
        let result = self.place_order(&draft);
        self.state = match &result {
            Ok((order, _)) => SubmissionState::Succeeded(order.id),
            Err(_) => SubmissionState::Failed,
        };

        let (order, _) = result.map_err(|err| {
            tracing::error!(error = %err, "Order processing failed");
            err
        })?;

        let order_id = order.id;
        tracing::info!(
            %order_id,
            reference = %order_reference(order_id),
            total = %format_currency(draft.order.total_amount),
            lines = draft.lines.len(),
            "Order created"
        );
        self.cart.clear();
        let lines = draft
            .lines
            .into_iter()
            .zip(draft.subtotals)
            .map(|(item, subtotal)| ReceiptLine {
                name: item.name,
                quantity: item.quantity,
                unit_price: item.price,
                subtotal,
            })
            .collect();
        self.last_order = Some(Snapshot {
            order_id,
            lines,
            total: draft.order.total_amount,
            payment_method: details.payment_method,
        });
        Ok(order_id)
    }

    /// Create an order entered by staff directly, leaving the cart alone.
    ///
    /// Lines name menu items, their prices come from the menu. Lines with the same item are
    /// merged. The same cleanup as `submit_order` applies when the lines cannot be stored.
    pub fn create_order(&mut self, request: NewOrderRequest) -> Result<(Order, Vec<OrderItem>)> {
        if request.items.is_empty() {
            tracing::warn!("Rejected new order without items");
            return Err(Error::Validation(
                "Please add at least one item to the order".to_string(),
            ));
        }

        let mut lines = Cart::new();
        for line in &request.items {
            if line.quantity == 0 {
                return Err(Error::Validation(format!(
                    "Quantity of {} must be positive",
                    line.menu_item_id
                )));
            }
            let item = self.menu_item(&line.menu_item_id)?;
            lines.add_item(CartItem {
                id: item.id,
                name: item.name,
                price: item.price,
                quantity: line.quantity,
            })?;
        }

        let customer_name = match request.customer_name.trim() {
            "" => GUEST.to_string(),
            name => name.to_string(),
        };
        let draft = Draft::new(
            NewOrder {
                customer_name,
                table_number: request.table_number,
                payment_method: request.payment_method,
                payment_status: request.payment_status,
                status: request.status,
                total_amount: 0,
            },
            lines.items().to_vec(),
        )?;

        let (order, items) = self.place_order(&draft).map_err(|err| {
            tracing::error!(error = %err, "New order failed");
            err
        })?;
        tracing::info!(
            order_id = %order.id,
            total = %format_currency(order.total_amount),
            lines = items.len(),
            "Order entered by staff"
        );
        Ok((order, items))
    }

    /// Store the order, then its lines. The order is deleted again if the lines fail.
    fn place_order(&mut self, draft: &Draft) -> Result<(Order, Vec<OrderItem>)> {
        let order = self.db.insert_order(draft.order.clone())?;

        let lines = draft
            .lines
            .iter()
            .zip(&draft.subtotals)
            .map(|(item, subtotal)| NewOrderItem {
                order_id: order.id,
                menu_item_id: item.id.clone(),
                quantity: item.quantity,
                unit_price: item.price,
                subtotal: *subtotal,
            })
            .collect();

        match self.db.insert_order_items(lines) {
            Ok(items) => Ok((order, items)),
            Err(err) => Err(self.discard_order(order.id, err)),
        }
    }

    /// Remove an order whose lines could not be stored and return the error to report
    fn discard_order(&mut self, order_id: OrderId, cause: Error) -> Error {
        match self.db.delete_order(order_id) {
            Ok(()) => {
                tracing::warn!(%order_id, "Deleted order whose items could not be stored");
                cause
            }
            Err(delete_err) => {
                tracing::error!(
                    %order_id,
                    error = %delete_err,
                    "Could not delete order whose items failed, it is left without items"
                );
                Error::PartialFailure {
                    order_id,
                    source: Box::new(cause),
                }
            }
        }
    }

    /// Build the receipt of an order.
    ///
    /// The order itself is always read back from the backend. The lines come from the cart as
    /// it was when the order was placed from this till, or from the stored order items for any
    /// other order.
    pub fn receipt(&self, order_id: OrderId) -> Result<Receipt> {
        let order = self.db.get_order(order_id)?;

        let snapshot = self
            .last_order
            .as_ref()
            .filter(|snapshot| snapshot.order_id == order_id);

        match snapshot {
            Some(snapshot) => Ok(Receipt {
                order_id,
                customer_name: order.customer_name,
                table_number: order.table_number,
                lines: snapshot.lines.clone(),
                total: snapshot.total,
                payment_method: snapshot.payment_method,
                date: order.created_at,
            }),
            None => self.stored_receipt(order),
        }
    }

    fn stored_receipt(&self, order: Order) -> Result<Receipt> {
        let names: HashMap<String, String> = self
            .db
            .list_menu_items()?
            .into_iter()
            .map(|item: MenuItem| (item.id, item.name))
            .collect();

        let lines = self
            .db
            .get_order_items(order.id)?
            .into_iter()
            .map(|item| ReceiptLine {
                name: names
                    .get(&item.menu_item_id)
                    .cloned()
                    .unwrap_or(item.menu_item_id),
                quantity: item.quantity,
                unit_price: item.unit_price,
                subtotal: item.subtotal,
            })
            .collect();

        Ok(Receipt {
            order_id: order.id,
            customer_name: order.customer_name,
            table_number: order.table_number,
            lines,
            total: order.total_amount,
            payment_method: order.payment_method,
            date: order.created_at,
        })
    }
}

/// Short reference shown to staff for an order
pub fn order_reference(order_id: OrderId) -> String {
    order_id.simple().to_string()[..8].to_uppercase()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::database::mock::MockDB;
    use crate::database::sqlite::SQLiteConnection;
    use crate::api::{NewOrderLine, NewOrderRequest};
    use crate::database::{seed_menu, OrderQuery};
    use std::panic::{catch_unwind, AssertUnwindSafe};

    fn ribs() -> CartItem {
        CartItem {
            id: "prod1".to_string(),
            name: "Beef Ribs".to_string(),
            price: 15000,
            quantity: 1,
        }
    }

    fn chips(quantity: u32) -> CartItem {
        CartItem {
            id: "prod5".to_string(),
            name: "Chips Masala".to_string(),
            price: 5000,
            quantity,
        }
    }

    fn cash(customer_name: &str) -> OrderDetails {
        OrderDetails {
            customer_name: customer_name.to_string(),
            table_number: None,
            payment_method: PaymentMethod::Cash,
        }
    }

    fn till(configure: impl FnOnce(&mut MockDB)) -> PointOfSale<MockDB> {
        let mut db = MockDB::new().unwrap();
        configure(&mut db);
        PointOfSale::new(Box::new(db))
    }

    #[test]
    fn test_single_item_checkout() {
        let mut pos = till(|_| {});
        pos.cart_mut().add_item(ribs()).unwrap();
        assert_eq!(pos.cart().total(), 15000);

        let order_id = pos.submit_order(cash("")).unwrap();

        assert!(pos.cart().is_empty());
        assert_eq!(pos.state(), SubmissionState::Succeeded(order_id));
        assert_eq!(pos.last_order_id(), Some(order_id));

        let db = pos.database();
        assert_eq!(db.orders().len(), 1);
        let order = &db.orders()[0];
        assert_eq!(order.id, order_id);
        assert_eq!(order.total_amount, 15000);
        assert_eq!(order.customer_name, GUEST);
        assert_eq!(order.table_number, None);
        assert_eq!(order.status, OrderStatus::InProgress);
        assert_eq!(order.payment_status, PaymentStatus::Pending);

        assert_eq!(db.order_items().len(), 1);
        let line = &db.order_items()[0];
        assert_eq!(line.order_id, order_id);
        assert_eq!(line.menu_item_id, "prod1");
        assert_eq!(line.subtotal, 15000);
    }

    #[test]
    fn test_checkout_matches_cart_snapshot() {
        let mut pos = till(|_| {});
        pos.cart_mut().add_item(ribs()).unwrap();
        pos.cart_mut().add_item(chips(2)).unwrap();
        pos.cart_mut().add_item(chips(1)).unwrap();
        let expected = pos.cart().clone();

        let details = OrderDetails {
            customer_name: "Neema".to_string(),
            table_number: Some(7),
            payment_method: PaymentMethod::Card,
        };
        let order_id = pos.submit_order(details).unwrap();

        let db = pos.database();
        assert_eq!(db.order_inserts, 1);
        assert_eq!(db.item_inserts, 1);
        assert_eq!(db.orders()[0].total_amount, expected.total());
        assert_eq!(db.orders()[0].table_number, Some(7));
        assert_eq!(db.order_items().len(), expected.len());
        for (line, item) in db.order_items().iter().zip(expected.items()) {
            assert_eq!(line.order_id, order_id);
            assert_eq!(line.menu_item_id, item.id);
            assert_eq!(line.quantity, item.quantity);
            assert_eq!(line.unit_price, item.price);
            assert_eq!(line.subtotal, item.price * item.quantity as u64);
        }
    }

    #[test]
    fn test_empty_cart_is_rejected_without_backend_calls() {
        let mut pos = till(|_| {});

        let result = pos.submit_order(cash("Amina"));

        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(pos.state(), SubmissionState::Idle);
        assert_eq!(pos.database().order_inserts, 0);
        assert_eq!(pos.database().item_inserts, 0);
    }

    #[test]
    fn test_order_insert_failure_keeps_cart() {
        let mut pos = till(|db| db.fail_next_order_insert());
        pos.cart_mut().add_item(ribs()).unwrap();
        let before = pos.cart().clone();

        let result = pos.submit_order(cash("Amina"));

        assert!(matches!(result, Err(Error::Unavailable(_))));
        assert_eq!(pos.state(), SubmissionState::Failed);
        assert_eq!(pos.cart(), &before);
        assert_eq!(pos.database().item_inserts, 0);

        // No automatic retry, but a manual one goes through
        let order_id = pos.submit_order(cash("Amina")).unwrap();
        assert_eq!(pos.database().orders().len(), 1);
        assert_eq!(pos.database().orders()[0].id, order_id);
    }

    #[test]
    fn test_items_failure_deletes_order_and_keeps_cart() {
        let mut pos = till(|db| db.fail_next_items_insert());
        pos.cart_mut().add_item(ribs()).unwrap();
        pos.cart_mut().add_item(chips(3)).unwrap();
        let before = pos.cart().clone();

        let result = pos.submit_order(cash("Amina"));

        assert!(matches!(result, Err(Error::Unavailable(_))));
        assert_eq!(pos.cart(), &before);
        assert_eq!(pos.last_order_id(), None);
        assert_eq!(pos.database().order_inserts, 1);
        assert_eq!(pos.database().deletes, 1);
        assert!(pos.database().orders().is_empty());
        assert!(pos.database().order_items().is_empty());
    }

    #[test]
    fn test_failed_cleanup_reports_orphan() {
        let mut pos = till(|db| {
            db.fail_next_items_insert();
            db.fail_next_delete();
        });
        pos.cart_mut().add_item(ribs()).unwrap();

        let result = pos.submit_order(cash("Amina"));

        let orphan = pos.database().orders()[0].id;
        match result {
            Err(Error::PartialFailure { order_id, source }) => {
                assert_eq!(order_id, orphan);
                assert!(matches!(*source, Error::Unavailable(_)));
            }
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(pos.cart().len(), 1);
        assert_eq!(pos.state(), SubmissionState::Failed);
    }

    #[test]
    fn test_receipt_uses_snapshot() {
        let mut pos = till(|_| {});
        pos.cart_mut().add_item(ribs()).unwrap();
        pos.cart_mut().add_item(chips(2)).unwrap();
        let order_id = pos
            .submit_order(OrderDetails {
                customer_name: "Baraka".to_string(),
                table_number: Some(4),
                payment_method: PaymentMethod::MobileMoney,
            })
            .unwrap();

        let receipt = pos.receipt(order_id).unwrap();
        assert_eq!(receipt.order_id, order_id);
        assert_eq!(receipt.customer_name, "Baraka");
        assert_eq!(receipt.table_number, Some(4));
        assert_eq!(receipt.total, 25000);
        assert_eq!(receipt.payment_method, PaymentMethod::MobileMoney);
        assert_eq!(receipt.lines.len(), 2);
        assert_eq!(receipt.lines[1].name, "Chips Masala");
        assert_eq!(receipt.lines[1].subtotal, 10000);
        assert_eq!(receipt.date, pos.database().orders()[0].created_at);
    }

    #[test]
    fn test_receipt_of_unknown_order() {
        let pos = till(|_| {});
        assert!(matches!(
            pos.receipt(uuid::Uuid::new_v4()),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_receipt_rebuilt_from_backend() {
        let mut db = SQLiteConnection::new().unwrap();
        seed_menu(&mut db).unwrap();
        let mut pos = PointOfSale::new(Box::new(db));

        pos.add_menu_item("prod3", 1).unwrap();
        let first = pos.submit_order(cash("Rehema")).unwrap();
        pos.add_menu_item("prod8", 2).unwrap();
        let second = pos.submit_order(cash("")).unwrap();
        assert_eq!(pos.last_order_id(), Some(second));

        let receipt = pos.receipt(first).unwrap();
        assert_eq!(receipt.customer_name, "Rehema");
        assert_eq!(receipt.total, 10000);
        assert_eq!(receipt.lines.len(), 1);
        assert_eq!(receipt.lines[0].name, "Grilled Chicken");

        let listed = pos.database().list_orders(&OrderQuery::all()).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].order.id, second);
        assert_eq!(listed[0].item_count, 1);
    }

    #[test]
    fn test_add_menu_item() {
        let mut db = MockDB::new().unwrap();
        seed_menu(&mut db).unwrap();
        let mut pos = PointOfSale::new(Box::new(db));

        assert_eq!(pos.add_menu_item("prod5", 2).unwrap().quantity, 2);
        assert_eq!(pos.add_menu_item("prod5", 1).unwrap().quantity, 3);
        assert_eq!(pos.cart().total(), 15000);
        assert!(matches!(
            pos.add_menu_item("prod42", 1),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            pos.add_menu_item("prod6", 0),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_order_reference() {
        let id = uuid::Uuid::parse_str("6d4c469f-6bac-4583-9cc5-654712a55973").unwrap();
        assert_eq!(order_reference(id), "6D4C469F");
    }

    #[test]
    fn test_interrupted_submission_blocks_until_recovered() {
        let mut pos = till(|db| db.crash_next_order_insert());
        pos.cart_mut().add_item(ribs()).unwrap();

        let crashed = catch_unwind(AssertUnwindSafe(|| pos.submit_order(cash("Amina"))));
        assert!(crashed.is_err());
        assert!(pos.is_processing());

        assert!(matches!(pos.submit_order(cash("Amina")), Err(Error::Busy)));
        assert_eq!(pos.database().order_inserts, 1);

        pos.recover();
        assert_eq!(pos.state(), SubmissionState::Idle);
        let order_id = pos.submit_order(cash("Amina")).unwrap();
        assert_eq!(pos.state(), SubmissionState::Succeeded(order_id));
        assert!(pos.cart().is_empty());
    }

    #[test]
    fn test_out_of_range_amounts_never_reach_the_backend() {
        let mut db = MockDB::new().unwrap();
        db.insert_menu_item(MenuItem {
            id: "gold".to_string(),
            name: "Gold plated ribs".to_string(),
            price: u64::MAX / 2 + 1,
            description: String::new(),
            image_url: String::new(),
            category: crate::api::Category::NyamaChoma,
        })
        .unwrap();
        let mut pos = PointOfSale::new(Box::new(db));

        pos.add_menu_item("gold", 1).unwrap();
        assert!(matches!(
            pos.add_menu_item("gold", 1),
            Err(Error::Validation(_))
        ));
        assert_eq!(pos.cart().get("gold").unwrap().quantity, 1);

        let result = pos.create_order(NewOrderRequest {
            customer_name: String::new(),
            table_number: None,
            payment_method: PaymentMethod::Cash,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            items: vec![NewOrderLine {
                menu_item_id: "gold".to_string(),
                quantity: 2,
            }],
        });
        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(pos.database().order_inserts, 0);
        assert_eq!(pos.state(), SubmissionState::Idle);
    }

    fn staff_order(items: &[(&str, u32)]) -> NewOrderRequest {
        NewOrderRequest {
            customer_name: "Zawadi".to_string(),
            table_number: Some(3),
            payment_method: PaymentMethod::Card,
            status: OrderStatus::Completed,
            payment_status: PaymentStatus::Paid,
            items: items
                .iter()
                .map(|(id, quantity)| NewOrderLine {
                    menu_item_id: id.to_string(),
                    quantity: *quantity,
                })
                .collect(),
        }
    }

    fn seeded_till(configure: impl FnOnce(&mut MockDB)) -> PointOfSale<MockDB> {
        till(|db| {
            seed_menu(db).unwrap();
            configure(db);
        })
    }

    #[test]
    fn test_staff_order_leaves_cart_alone() {
        let mut pos = seeded_till(|_| {});
        pos.add_menu_item("prod6", 1).unwrap();
        let cart = pos.cart().clone();

        let (order, items) = pos
            .create_order(staff_order(&[("prod2", 1), ("prod7", 2), ("prod2", 1)]))
            .unwrap();

        assert_eq!(order.customer_name, "Zawadi");
        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert_eq!(order.total_amount, 2 * 12000 + 2 * 4000);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].menu_item_id, "prod2");
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[0].subtotal, 24000);
        assert_eq!(items[1].unit_price, 4000);

        assert_eq!(pos.cart(), &cart);
        assert_eq!(pos.state(), SubmissionState::Idle);
        assert_eq!(pos.last_order_id(), None);
        assert_eq!(pos.database().orders().len(), 1);
    }

    #[test]
    fn test_staff_order_validation() {
        let mut pos = seeded_till(|_| {});

        let mut request = staff_order(&[]);
        request.customer_name = " ".to_string();
        assert!(matches!(pos.create_order(request), Err(Error::Validation(_))));
        assert!(matches!(
            pos.create_order(staff_order(&[("prod1", 0)])),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            pos.create_order(staff_order(&[("prod99", 1)])),
            Err(Error::NotFound(_))
        ));
        assert_eq!(pos.database().order_inserts, 0);

        let mut request = staff_order(&[("prod1", 1)]);
        request.customer_name = String::new();
        let (order, _) = pos.create_order(request).unwrap();
        assert_eq!(order.customer_name, GUEST);
    }

    #[test]
    fn test_staff_order_cleanup() {
        let mut pos = seeded_till(|db| db.fail_next_items_insert());
        let result = pos.create_order(staff_order(&[("prod1", 1)]));
        assert!(matches!(result, Err(Error::Unavailable(_))));
        assert_eq!(pos.database().deletes, 1);
        assert!(pos.database().orders().is_empty());

        let mut pos = seeded_till(|db| {
            db.fail_next_items_insert();
            db.fail_next_delete();
        });
        let result = pos.create_order(staff_order(&[("prod1", 1)]));
        let orphan = pos.database().orders()[0].id;
        assert!(matches!(
            result,
            Err(Error::PartialFailure { order_id, .. }) if order_id == orphan
        ));
    }
}
