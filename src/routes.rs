use std::collections::HashMap;

use crate::pos::PointOfSale;
use crate::{
    errors,
    http::{Request, Response},
};
use errors::{Error, Result};
use matchit::Router;

/// Utility macro generating a constant for the HTTP endpoint, and associate it with
/// an identifier. Matchit requires both
macro_rules! make_paths {
        ($($name:ident: $path:expr,)*) => {

        pub mod paths {
                    $(
                        pub const $name: &str = concat!("/api/v1", $path);
                    )*
        }
        pub mod endpoints {
            $(
                pub const $name: &str = stringify!($name);
            )*
        }

        /// Every endpoint, used to fill the router
        const ALL_PATHS: &[(&str, &str)] = &[$((paths::$name, endpoints::$name),)*];
        }
    }

make_paths! {
    CART: "/cart",
    CART_ITEM: "/cart/items/{item_id}",
    CHECKOUT: "/checkout",
    ORDERS: "/orders",
    ORDER_BY_ID: "/orders/{order_id}",
    RECEIPT: "/orders/{order_id}/receipt",
    RESERVATIONS: "/reservations",
    MENU: "/menu",
    BILLING: "/billing",
    CUSTOMERS: "/customers",
    EMPLOYEES: "/employees",
    INVENTORY: "/inventory",
}

/// Names of the parameters in the HTTP paths, used to extract them
/// from the parameters inside of request handling
pub mod params {
    /// Key of order ids in HTTP paths
    pub const ORDER_ID: &str = "order_id";

    /// Key of menu item ids in HTTP paths
    pub const ITEM_ID: &str = "item_id";
}

/// Return the HTTP path for an order based on its id
pub fn order_by_id(order_id: &str) -> String {
    paths::ORDER_BY_ID.replace("{order_id}", order_id)
}

/// Return the HTTP path for the receipt of an order
pub fn receipt(order_id: &str) -> String {
    paths::RECEIPT.replace("{order_id}", order_id)
}

/// Return the HTTP path for a line of the cart based on its menu item id
pub fn cart_item(item_id: &str) -> String {
    paths::CART_ITEM.replace("{item_id}", item_id)
}

/// Append a query string to a path, leaving out empty values
pub fn with_query(path: &str, query: &[(&str, &str)]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in query.iter().filter(|(_, value)| !value.is_empty()) {
        serializer.append_pair(key, value);
    }
    match serializer.finish() {
        query if query.is_empty() => path.to_string(),
        query => format!("{}?{}", path, query),
    }
}

// spurious warning, I am using this in tests
#[allow(unused_macros)]
/// Utility to create easily hashmaps of parameters for testing
macro_rules! make_params {
    () => {
        std::collections::HashMap::new()
    };
    ($name:ident: $value:expr $(, $name2:ident: $value2:expr)* ) => {
        {
            let mut map = std::collections::HashMap::new();
            map.insert(params::$name.to_string(), $value.to_string());
            $(
                map.insert(params::$name2.to_string(), $value2.to_string());
            )*
            map
        }
        }
    }

#[allow(unused_imports)]
pub(crate) use make_params;

/// Create a new router with the paths defined in this module
///
/// Errors from this functions are programming errors, most likely stemming from a
/// misuse of matchit
fn new_router() -> errors::Result<Router<&'static str>> {
    let mut router = Router::new();
    for (path, endpoint) in ALL_PATHS {
        router.insert(*path, *endpoint)?;
    }
    Ok(router)
}

/// Type of the object containing the HTTP path parameters passed to handlers
pub type HttpParams = HashMap<String, String>;
/// Type of the function that handles HTTP requests
pub type HttpHandler = fn(Request, HttpParams, &mut PointOfSale) -> Result<Response>;

/// The router is in charge of taking in raw HTTP requests and to dispatch them to
/// the appropriate handler function.
pub struct HttpRouter {
    routes: Router<&'static str>,
    handlers: HashMap<&'static str, HashMap<&'static str, HttpHandler>>,
}

impl HttpRouter {
    /// Creates a new empty router
    ///
    /// Although the matchit router is not empty, there are no methods associated
    /// to the routes yet, so no request can be processed
    /// Errors in this function are programming errors.
    pub fn new() -> Result<Self> {
        let routes = new_router()?;
        Ok(HttpRouter {
            routes,
            handlers: HashMap::new(),
        })
    }

    /// Add a new route to the router
    pub fn add_route(&mut self, method: &'static str, route: &'static str, handler: HttpHandler) {
        let method_to_handler = self.handlers.entry(route).or_default();
        method_to_handler.insert(method, handler);
    }

    /// Sends a request to the appropriate handler if it exists
    ///
    /// If there is a route matching the request, its handler will be called and the result of the
    /// function will be the result of the handler. If no route is defined for this request,
    /// return Error::NotFound
    ///
    /// Checking that all parameters are presents and that the body is correct is the
    /// responsibility of the handler
    pub fn route(&self, request: Request, pos: &mut PointOfSale) -> Result<Response> {
        let route = self
            .routes
            .at(request.route_path())
            .map_err(|_| Error::NotFound(format!("No route for {}", request.route_path())))?;
        let method_to_handler = self.handlers.get(route.value).ok_or_else(|| {
            Error::NotFound(format!(
                "No method associated to this route: {}",
                route.value
            ))
        })?;
        let handler = method_to_handler
            .get(request.method.as_str())
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "No handler for {} {}",
                    request.method.as_str(),
                    route.value
                ))
            })?;

        let params: HashMap<String, String> = route
            .params
            .iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        handler(request, params, pos)
    }
}
