use crate::api::{Amount, CartItem};
use crate::errors::{Error, Result};
use serde::Serialize;

/// Items selected for the order being taken, before it is submitted.
///
/// Lines are unique by menu item id. The total is never cached, it is recomputed from the lines
/// every time it is read. Changes that would make a quantity or the total overflow are refused,
/// so the total always fits an `Amount`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Cart {
        Cart::default()
    }

    /// Add a line to the cart, or bump the quantity of the existing line with the same id.
    ///
    /// Adding zero of an item that isn't in the cart yet does nothing.
    pub fn add_item(&mut self, item: CartItem) -> Result<()> {
        let mut items = self.items.clone();
        match items.iter_mut().find(|line| line.id == item.id) {
            Some(line) => {
                line.quantity = line.quantity.checked_add(item.quantity).ok_or_else(|| {
                    Error::Validation(format!("Too many {} in the cart", item.id))
                })?;
            }
            None if item.quantity > 0 => items.push(item),
            None => return Ok(()),
        }
        self.replace_items(items)
    }

    /// Replace the quantity of a line. A quantity of zero removes the line.
    ///
    /// Returns false if there is no line with this id.
    pub fn update_quantity(&mut self, id: &str, quantity: u32) -> Result<bool> {
        if quantity == 0 {
            return Ok(self.remove_item(id));
        }
        let mut items = self.items.clone();
        match items.iter_mut().find(|line| line.id == id) {
            Some(line) => line.quantity = quantity,
            None => return Ok(false),
        }
        self.replace_items(items)?;
        Ok(true)
    }

    fn replace_items(&mut self, items: Vec<CartItem>) -> Result<()> {
        checked_total(&items)
            .ok_or_else(|| Error::Validation("The cart total is out of range".to_string()))?;
        self.items = items;
        Ok(())
    }

    /// Remove a line. Returns false if there was no line with this id.
    pub fn remove_item(&mut self, id: &str) -> bool {
        let old_len = self.items.len();
        self.items.retain(|line| line.id != id);
        old_len != self.items.len()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of price x quantity over every line
    pub fn total(&self) -> Amount {
        // lines are only accepted when the total fits
        checked_total(&self.items).unwrap_or(Amount::MAX)
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&CartItem> {
        self.items.iter().find(|line| line.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// Price x quantity of a line, None on overflow
pub fn line_total(line: &CartItem) -> Option<Amount> {
    line.price.checked_mul(Amount::from(line.quantity))
}

fn checked_total(items: &[CartItem]) -> Option<Amount> {
    items
        .iter()
        .try_fold(0 as Amount, |total, line| total.checked_add(line_total(line)?))
}

/// Render an amount the way it is shown to staff, e.g. "TZS 15,000"
pub fn format_currency(amount: Amount) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("TZS {}", grouped)
}
