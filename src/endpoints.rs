use crate::api::{
    Amount, CartItem, CheckoutResult, MenuItem, NewCustomer, NewEmployee, NewInventoryItem,
    NewOrderRequest, Order, OrderDetails, OrderId, OrderItem, QuantityUpdate,
};
use crate::cart::format_currency;
use crate::database::Database;
use crate::errors::{Error, Result};
use crate::http::{Request, Response};
use crate::pos::{order_reference, PointOfSale, SubmissionState};
use crate::routes::*;
use crate::views;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

/// Body of a request adding a menu item to the cart
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AddToCart {
    pub menu_item_id: String,
    #[serde(default = "one")]
    pub quantity: u32,
}

fn one() -> u32 {
    1
}

/// The cart as shown on the till
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub total: Amount,
    pub formatted_total: String,
}

/// Where the till stands, as returned by GET checkout
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CheckoutStatus {
    pub processing: bool,
    pub last_order_id: Option<OrderId>,
}

/// An order along with its lines
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Create the router serving the whole API
pub fn create_http_router() -> Result<HttpRouter> {
    let mut router = HttpRouter::new()?;

    router.add_route("GET", endpoints::CART, get_cart);
    router.add_route("POST", endpoints::CART, add_to_cart);
    router.add_route("DELETE", endpoints::CART, clear_cart);
    router.add_route("PUT", endpoints::CART_ITEM, update_cart_item);
    router.add_route("DELETE", endpoints::CART_ITEM, remove_cart_item);

    router.add_route("GET", endpoints::CHECKOUT, get_checkout);
    router.add_route("POST", endpoints::CHECKOUT, checkout);

    router.add_route("GET", endpoints::ORDERS, get_orders);
    router.add_route("POST", endpoints::ORDERS, post_order);
    router.add_route("GET", endpoints::ORDER_BY_ID, get_order);
    router.add_route("GET", endpoints::RECEIPT, get_receipt);

    router.add_route("GET", endpoints::RESERVATIONS, get_reservations);
    router.add_route("GET", endpoints::MENU, get_menu);
    router.add_route("POST", endpoints::MENU, post_menu_item);
    router.add_route("GET", endpoints::BILLING, get_billing);
    router.add_route("GET", endpoints::CUSTOMERS, get_customers);
    router.add_route("POST", endpoints::CUSTOMERS, post_customer);
    router.add_route("GET", endpoints::EMPLOYEES, get_employees);
    router.add_route("POST", endpoints::EMPLOYEES, post_employee);
    router.add_route("GET", endpoints::INVENTORY, get_inventory);
    router.add_route("POST", endpoints::INVENTORY, post_inventory_item);

    Ok(router)
}

/// Route a request against the shared till and turn any error into a response
pub fn handle(router: &HttpRouter, pos: &Mutex<PointOfSale>, request: Request) -> Response {
    let mut pos = match pos.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            // a handler panicked while holding the till
            let mut guard = poisoned.into_inner();
            guard.recover();
            guard
        }
    };
    router
        .route(request, &mut pos)
        .unwrap_or_else(|err| Response::from_error(&err))
}

fn cart_view(pos: &PointOfSale) -> Result<Response> {
    let cart = pos.cart();
    Response::json(
        200,
        &CartView {
            items: cart.items().to_vec(),
            total: cart.total(),
            formatted_total: format_currency(cart.total()),
        },
    )
}

fn get_cart(_: Request, _: HttpParams, pos: &mut PointOfSale) -> Result<Response> {
    cart_view(pos)
}

fn add_to_cart(request: Request, _: HttpParams, pos: &mut PointOfSale) -> Result<Response> {
    let body: AddToCart = request.json()?;
    pos.add_menu_item(&body.menu_item_id, body.quantity)?;
    cart_view(pos)
}

fn clear_cart(_: Request, _: HttpParams, pos: &mut PointOfSale) -> Result<Response> {
    pos.cart_mut().clear();
    cart_view(pos)
}

fn item_id_param(params: &HttpParams) -> Result<&str> {
    params
        .get(params::ITEM_ID)
        .map(|id| id.as_str())
        .ok_or_else(|| Error::BadRequest("Missing item_id".to_string()))
}

fn update_cart_item(request: Request, params: HttpParams, pos: &mut PointOfSale) -> Result<Response> {
    let item_id = item_id_param(&params)?;
    let update: QuantityUpdate = request.json()?;
    if !pos.cart_mut().update_quantity(item_id, update.quantity)? {
        return Err(Error::NotFound(format!("No item {} in the cart", item_id)));
    }
    cart_view(pos)
}

fn remove_cart_item(_: Request, params: HttpParams, pos: &mut PointOfSale) -> Result<Response> {
    let item_id = item_id_param(&params)?;
    if !pos.cart_mut().remove_item(item_id) {
        return Err(Error::NotFound(format!("No item {} in the cart", item_id)));
    }
    cart_view(pos)
}

fn get_checkout(_: Request, _: HttpParams, pos: &mut PointOfSale) -> Result<Response> {
    Response::json(
        200,
        &CheckoutStatus {
            processing: pos.state() == SubmissionState::Submitting,
            last_order_id: pos.last_order_id(),
        },
    )
}

fn checkout(request: Request, _: HttpParams, pos: &mut PointOfSale) -> Result<Response> {
    let details: OrderDetails = request.json()?;
    let order_id = pos.submit_order(details)?;
    Response::json(
        201,
        &CheckoutResult {
            order_id,
            reference: order_reference(order_id),
        },
    )
}

fn order_id_param(params: &HttpParams) -> Result<OrderId> {
    let raw = params
        .get(params::ORDER_ID)
        .ok_or_else(|| Error::BadRequest("Missing order_id".to_string()))?;
    OrderId::parse_str(raw).map_err(|err| Error::BadRequest(format!("Invalid order id: {}", err)))
}

/// Optional filter from the query string. Absent, empty and "all" mean no filter.
fn filter_param<T: std::str::FromStr>(query: &HashMap<String, String>, key: &str) -> Result<Option<T>> {
    match query.get(key).map(|value| value.trim()) {
        None | Some("") => Ok(None),
        Some(value) if value.eq_ignore_ascii_case("all") => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| Error::BadRequest(format!("Unknown {} '{}'", key, value))),
    }
}

fn search_param(query: &HashMap<String, String>) -> &str {
    query.get("search").map_or("", |search| search.as_str())
}

fn get_orders(request: Request, _: HttpParams, pos: &mut PointOfSale) -> Result<Response> {
    let query = request.query();
    Response::json(200, &views::orders(pos.database(), search_param(&query))?)
}

fn post_order(request: Request, _: HttpParams, pos: &mut PointOfSale) -> Result<Response> {
    let new_order: NewOrderRequest = request.json()?;
    let (order, items) = pos.create_order(new_order)?;
    Response::json(201, &OrderWithItems { order, items })
}

fn get_order(_: Request, params: HttpParams, pos: &mut PointOfSale) -> Result<Response> {
    let order_id = order_id_param(&params)?;
    let order = pos.database().get_order(order_id)?;
    let items = pos.database().get_order_items(order_id)?;
    Response::json(200, &OrderWithItems { order, items })
}

fn get_receipt(_: Request, params: HttpParams, pos: &mut PointOfSale) -> Result<Response> {
    let order_id = order_id_param(&params)?;
    Response::json(200, &pos.receipt(order_id)?)
}

fn get_reservations(request: Request, _: HttpParams, pos: &mut PointOfSale) -> Result<Response> {
    let query = request.query();
    let date = match query.get("date").map(|date| date.trim()) {
        None | Some("") => Utc::now().date_naive(),
        Some(date) => NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|err| Error::BadRequest(format!("Invalid date '{}': {}", date, err)))?,
    };
    let status = filter_param(&query, "status")?;
    Response::json(200, &views::reservations(pos.database(), date, status)?)
}

fn get_menu(request: Request, _: HttpParams, pos: &mut PointOfSale) -> Result<Response> {
    let query = request.query();
    let category = filter_param(&query, "category")?;
    Response::json(
        200,
        &views::menu(pos.database(), category, search_param(&query))?,
    )
}

fn post_menu_item(request: Request, _: HttpParams, pos: &mut PointOfSale) -> Result<Response> {
    let item: MenuItem = request.json()?;
    if item.id.trim().is_empty() || item.name.trim().is_empty() {
        return Err(Error::Validation("A menu item needs an id and a name".to_string()));
    }
    Response::json(201, &pos.database_mut().insert_menu_item(item)?)
}

fn get_billing(request: Request, _: HttpParams, pos: &mut PointOfSale) -> Result<Response> {
    let query = request.query();
    let payment_status = filter_param(&query, "payment_status")?;
    Response::json(200, &views::bills(pos.database(), payment_status)?)
}

fn require_name(name: &str, what: &str) -> Result<()> {
    if name.trim().is_empty() {
        Err(Error::Validation(format!("A {} needs a name", what)))
    } else {
        Ok(())
    }
}

fn get_customers(request: Request, _: HttpParams, pos: &mut PointOfSale) -> Result<Response> {
    let query = request.query();
    Response::json(200, &views::customers(pos.database(), search_param(&query))?)
}

fn post_customer(request: Request, _: HttpParams, pos: &mut PointOfSale) -> Result<Response> {
    let customer: NewCustomer = request.json()?;
    require_name(&customer.name, "customer")?;
    Response::json(201, &pos.database_mut().insert_customer(customer)?)
}

fn get_employees(request: Request, _: HttpParams, pos: &mut PointOfSale) -> Result<Response> {
    let query = request.query();
    Response::json(200, &views::employees(pos.database(), search_param(&query))?)
}

fn post_employee(request: Request, _: HttpParams, pos: &mut PointOfSale) -> Result<Response> {
    let employee: NewEmployee = request.json()?;
    require_name(&employee.name, "employee")?;
    Response::json(201, &pos.database_mut().insert_employee(employee)?)
}

fn get_inventory(request: Request, _: HttpParams, pos: &mut PointOfSale) -> Result<Response> {
    let query = request.query();
    let low_stock = match query.get("low_stock").map(|value| value.trim()) {
        None | Some("") | Some("false") | Some("0") => false,
        Some("true") | Some("1") => true,
        Some(other) => {
            return Err(Error::BadRequest(format!("Invalid low_stock '{}'", other)));
        }
    };
    Response::json(
        200,
        &views::inventory(pos.database(), search_param(&query), low_stock)?,
    )
}

fn post_inventory_item(request: Request, _: HttpParams, pos: &mut PointOfSale) -> Result<Response> {
    let item: NewInventoryItem = request.json()?;
    require_name(&item.name, "stock item")?;
    Response::json(201, &pos.database_mut().insert_inventory_item(item)?)
}
