use pos::api::{
    Category, CheckoutResult, MenuItem, OrderDetails, OrderSummary, PaymentMethod, Receipt,
    Reservation,
};
use pos::cart::format_currency;
use pos::cli::*;
use pos::endpoints::{AddToCart, CartView};
use pos::errors::{Error, Result};
use pos::http::{code_to_string, decode, HttpClient, Response};
use pos::routes;
use routes::paths;

#[derive(Debug, PartialEq, Eq)]
enum Action {
    Menu {
        category: Option<Category>,
        search: String,
    },
    Add {
        item_id: String,
        quantity: u32,
    },
    Cart,
    Remove {
        item_id: String,
    },
    Checkout(OrderDetails),
    Orders {
        search: String,
    },
    Receipt {
        order_id: String,
    },
    Reservations {
        date: String,
        status: String,
    },
}

#[derive(Debug, PartialEq, Eq)]
struct CLIOptions {
    target: String,
    action: Action,
}

const USAGE: &str = "\
Usage: pos-client [host:port] <action> [arguments]

Actions:
  menu [category] [search]                 List the menu
  add <item id> [quantity]                 Add a menu item to the cart
  cart                                     Show the cart
  remove <item id>                         Remove an item from the cart
  checkout <payment> [table] [customer]    Place the order (payment: cash, card, mobile-money)
  orders [search]                          List the orders
  receipt <order id>                       Print the receipt of an order
  reservations [YYYY-MM-DD] [status]       List the reservations of a day";

fn parse_action<I>(action: &str, mut args: I) -> std::result::Result<Action, CLIError>
where
    I: Iterator<Item = String>,
{
    let action = match action.to_ascii_lowercase().as_str() {
        "menu" => {
            let category = match args.next() {
                Some(category) if category != "all" => Some(
                    category
                        .parse()
                        .map_err(|_| CLIError::InvalidParameter(category))?,
                ),
                _ => None,
            };
            Action::Menu {
                category,
                search: args.collect::<Vec<_>>().join(" "),
            }
        }
        "add" => Action::Add {
            item_id: args.next().ok_or(CLIError::MissingParameter("item id"))?,
            quantity: args
                .next()
                .map(|quantity| parse_number(&quantity))
                .transpose()?
                .unwrap_or(1),
        },
        "cart" => Action::Cart,
        "remove" => Action::Remove {
            item_id: args.next().ok_or(CLIError::MissingParameter("item id"))?,
        },
        "checkout" => {
            let payment = args.next().ok_or(CLIError::MissingParameter("payment"))?;
            let payment_method: PaymentMethod = payment
                .parse()
                .map_err(|_| CLIError::InvalidParameter(payment))?;
            let table_number = match args.next() {
                Some(table) if table != "-" => Some(parse_number(&table)?),
                _ => None,
            };
            Action::Checkout(OrderDetails {
                customer_name: args.collect::<Vec<_>>().join(" "),
                table_number,
                payment_method,
            })
        }
        "orders" => Action::Orders {
            search: args.collect::<Vec<_>>().join(" "),
        },
        "receipt" => Action::Receipt {
            order_id: args.next().ok_or(CLIError::MissingParameter("order id"))?,
        },
        "reservations" => Action::Reservations {
            date: args.next().unwrap_or_default(),
            status: args.next().unwrap_or_default(),
        },
        other => return Err(CLIError::UnknownAction(other.to_string())),
    };
    Ok(action)
}

fn parse_cli_args<I>(mut args: I) -> std::result::Result<CLIOptions, CLIError>
where
    I: Iterator<Item = String>,
{
    args.next(); // Skip the program name
    let maybe_target = args
        .next()
        .ok_or(CLIError::MissingParameter("target or action"))?;

    let (target, action) = match validate_address(&maybe_target) {
        Ok(target) => (
            target.to_string(),
            args.next().ok_or(CLIError::MissingParameter("action"))?,
        ),
        Err(_) => (DEFAULT_ADDRESS.to_string(), maybe_target),
    };

    Ok(CLIOptions {
        target,
        action: parse_action(&action, args)?,
    })
}

/// Send a single request; the server closes the connection after each response
fn send(target: &str, method: &str, endpoint: &str, body: &str) -> Result<Response> {
    let response = HttpClient::new(target)?.send(method, endpoint, body)?;
    match response.status {
        Some(code) if code < 400 => Ok(response),
        Some(code) => {
            println!("Response Status: {} - {}", code, code_to_string(code));
            let message = decode::<pos::api::ErrorBody>(&response)
                .map(|body| body.error)
                .unwrap_or(response.body);
            Err(Error::BadRequest(message))
        }
        None => Err(Error::NoResponse),
    }
}

fn print_cart(cart: &CartView) {
    if cart.items.is_empty() {
        println!("The cart is empty");
        return;
    }
    for item in &cart.items {
        println!(
            "{:>3} x {:<24} {:>12}",
            item.quantity,
            item.name,
            format_currency(item.price * item.quantity as u64)
        );
    }
    println!("Total: {}", cart.formatted_total);
}

fn print_receipt(receipt: &Receipt) {
    println!("Order #{}", pos::pos::order_reference(receipt.order_id));
    println!("Date: {}", receipt.date.format("%Y-%m-%d %H:%M"));
    println!("Customer: {}", receipt.customer_name);
    if let Some(table) = receipt.table_number {
        println!("Table: {}", table);
    }
    for line in &receipt.lines {
        println!(
            "{:>3} x {:<24} {:>12}",
            line.quantity,
            line.name,
            format_currency(line.subtotal)
        );
    }
    println!("Total: {}", format_currency(receipt.total));
    println!("Paid by: {}", receipt.payment_method);
}

fn run(options: CLIOptions) -> Result<()> {
    let target = options.target.as_str();

    match options.action {
        Action::Menu { category, search } => {
            let category = category.map(|category| category.to_string()).unwrap_or_default();
            let path = routes::with_query(
                paths::MENU,
                &[("category", &category), ("search", &search)],
            );
            let menu: Vec<MenuItem> = decode(&send(target, "GET", &path, "")?)?;
            for item in menu {
                println!(
                    "{:<6} {:<24} {:>12}  {}",
                    item.id,
                    item.name,
                    format_currency(item.price),
                    item.category
                );
            }
        }
        Action::Add { item_id, quantity } => {
            let body = serde_json::to_string(&AddToCart {
                menu_item_id: item_id,
                quantity,
            })?;
            print_cart(&decode(&send(target, "POST", paths::CART, &body)?)?);
        }
        Action::Cart => print_cart(&decode(&send(target, "GET", paths::CART, "")?)?),
        Action::Remove { item_id } => {
            let path = routes::cart_item(&item_id);
            print_cart(&decode(&send(target, "DELETE", &path, "")?)?);
        }
        Action::Checkout(details) => {
            let body = serde_json::to_string(&details)?;
            let result: CheckoutResult = decode(&send(target, "POST", paths::CHECKOUT, &body)?)?;
            println!("Order placed: #{}", result.reference);
            let receipt = send(target, "GET", &routes::receipt(&result.order_id.to_string()), "")?;
            print_receipt(&decode(&receipt)?);
        }
        Action::Orders { search } => {
            let path = routes::with_query(paths::ORDERS, &[("search", &search)]);
            let orders: Vec<OrderSummary> = decode(&send(target, "GET", &path, "")?)?;
            for summary in orders {
                let order = summary.order;
                println!(
                    "{}  {}  {:<20} {:>3} items {:>12}  {}",
                    order.id,
                    order.created_at.format("%Y-%m-%d %H:%M"),
                    order.customer_name,
                    summary.item_count,
                    format_currency(order.total_amount),
                    order.status
                );
            }
        }
        Action::Receipt { order_id } => {
            print_receipt(&decode(&send(target, "GET", &routes::receipt(&order_id), "")?)?)
        }
        Action::Reservations { date, status } => {
            let path = routes::with_query(
                paths::RESERVATIONS,
                &[("date", &date), ("status", &status)],
            );
            let reservations: Vec<Reservation> = decode(&send(target, "GET", &path, "")?)?;
            for reservation in reservations {
                println!(
                    "{}  {:<20} {:>2} people  {:<10} {}",
                    reservation.time,
                    reservation.name,
                    reservation.people,
                    reservation.status,
                    reservation
                        .table_number
                        .map_or("-".to_string(), |table| format!("table {}", table))
                );
            }
        }
    }
    Ok(())
}

fn main() {
    let options = match parse_cli_args(std::env::args()) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("{}\n\n{}", err, USAGE);
            std::process::exit(1);
        }
    };

    if let Err(err) = run(options) {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(args: &[&str]) -> std::result::Result<CLIOptions, CLIError> {
        parse_cli_args(
            std::iter::once("pos-client")
                .chain(args.iter().copied())
                .map(String::from),
        )
    }

    #[test]
    fn test_default_target() {
        let options = parse(&["cart"]).unwrap();
        assert_eq!(options.target, DEFAULT_ADDRESS);
        assert_eq!(options.action, Action::Cart);

        let options = parse(&["till-2:8080", "add", "prod5", "3"]).unwrap();
        assert_eq!(options.target, "till-2:8080");
        assert_eq!(
            options.action,
            Action::Add {
                item_id: "prod5".to_string(),
                quantity: 3
            }
        );
    }

    #[test]
    fn test_checkout_arguments() {
        let options = parse(&["checkout", "mobile-money", "4", "Amina", "Juma"]).unwrap();
        assert_eq!(
            options.action,
            Action::Checkout(OrderDetails {
                customer_name: "Amina Juma".to_string(),
                table_number: Some(4),
                payment_method: PaymentMethod::MobileMoney,
            })
        );

        let options = parse(&["checkout", "cash"]).unwrap();
        assert_eq!(
            options.action,
            Action::Checkout(OrderDetails {
                customer_name: String::new(),
                table_number: None,
                payment_method: PaymentMethod::Cash,
            })
        );

        assert_eq!(
            parse(&["checkout", "cheque"]),
            Err(CLIError::InvalidParameter("cheque".to_string()))
        );
    }

    #[test]
    fn test_invalid_arguments() {
        assert_eq!(parse(&[]), Err(CLIError::MissingParameter("target or action")));
        assert_eq!(
            parse(&["127.0.0.1:9898"]),
            Err(CLIError::MissingParameter("action"))
        );
        assert_eq!(
            parse(&["dance"]),
            Err(CLIError::UnknownAction("dance".to_string()))
        );
        assert_eq!(
            parse(&["add", "prod1", "-2"]),
            Err(CLIError::InvalidParameter("-2".to_string()))
        );
        assert_eq!(parse(&["remove"]), Err(CLIError::MissingParameter("item id")));
    }
}
