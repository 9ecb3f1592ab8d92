use serde::{Deserialize, Serialize};

/// One chosen option on a cart line or order item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedOption {
    pub group_name: String,
    pub choice_name: String,
    #[serde(default)]
    pub price_modifier: i64,
}

/// One line of the shared cart.
///
/// `name` and `price` are snapshots taken when the line was added; later menu
/// edits do not reach lines already in the cart. `total_price` is derived and
/// any client-supplied value is overwritten by [`CartLine::normalized`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    #[serde(default)]
    pub menu_item_id: Option<i64>,
    pub name: String,
    pub price: i64,
    pub quantity: i64,
    #[serde(default)]
    pub options: Vec<SelectedOption>,
    #[serde(default)]
    pub total_price: i64,
}

impl CartLine {
    /// Unit price including every option delta, or `None` on overflow.
    pub fn checked_unit_price(&self) -> Option<i64> {
        self.options
            .iter()
            .try_fold(self.price, |acc, o| acc.checked_add(o.price_modifier))
    }

    /// `(unit price + Σ option deltas) × quantity`, or `None` on overflow.
    pub fn checked_line_total(&self) -> Option<i64> {
        self.checked_unit_price()?.checked_mul(self.quantity)
    }

    /// Saturating form of [`CartLine::checked_unit_price`].
    pub fn unit_price(&self) -> i64 {
        self.options
            .iter()
            .fold(self.price, |acc, o| acc.saturating_add(o.price_modifier))
    }

    /// Saturating form of [`CartLine::checked_line_total`]. Callers that
    /// accept client input validate with the checked form first.
    pub fn line_total(&self) -> i64 {
        self.unit_price().saturating_mul(self.quantity)
    }

    /// Same line with `total_price` recomputed.
    pub fn normalized(mut self) -> Self {
        self.total_price = self.line_total();
        self
    }
}

/// The single shared cart mirrored to every customer display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartState {
    pub items: Vec<CartLine>,
    pub total_price: i64,
    /// Unix epoch milliseconds of the last replacement.
    pub last_updated: i64,
}

impl CartState {
    pub fn empty(last_updated: i64) -> Self {
        Self {
            items: Vec::new(),
            total_price: 0,
            last_updated,
        }
    }

    /// Sum of every line total, or `None` if any step overflows `i64`.
    pub fn checked_total(lines: &[CartLine]) -> Option<i64> {
        lines
            .iter()
            .try_fold(0i64, |acc, l| acc.checked_add(l.checked_line_total()?))
    }

    /// Build a cart from raw lines, deriving every line total and the cart total.
    ///
    /// Arithmetic saturates; use [`CartState::checked_total`] to reject
    /// lines whose totals do not fit.
    pub fn from_lines(lines: Vec<CartLine>, last_updated: i64) -> Self {
        let items: Vec<CartLine> = lines.into_iter().map(CartLine::normalized).collect();
        let total_price = items
            .iter()
            .fold(0i64, |acc, l| acc.saturating_add(l.total_price));
        Self {
            items,
            total_price,
            last_updated,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(price: i64, qty: i64, deltas: &[i64]) -> CartLine {
        CartLine {
            menu_item_id: Some(1),
            name: "item".into(),
            price,
            quantity: qty,
            options: deltas
                .iter()
                .map(|d| SelectedOption {
                    group_name: "size".into(),
                    choice_name: format!("+{d}"),
                    price_modifier: *d,
                })
                .collect(),
            total_price: 0,
        }
    }

    #[test]
    fn line_total_includes_option_deltas() {
        assert_eq!(line(1000, 3, &[500, -200]).line_total(), 3900);
    }

    #[test]
    fn overflowing_totals_are_detected() {
        let huge = line(i64::MAX / 2, 3, &[]);
        assert_eq!(huge.checked_line_total(), None);
        assert_eq!(line(i64::MAX, 1, &[1]).checked_unit_price(), None);
        assert_eq!(
            CartState::checked_total(&[line(i64::MAX / 2, 1, &[]), line(i64::MAX / 2, 2, &[])]),
            None
        );
        assert_eq!(
            CartState::checked_total(&[line(1000, 3, &[500]), line(300, 1, &[])]),
            Some(4800)
        );

        // The unchecked path saturates instead of panicking or wrapping.
        let cart = CartState::from_lines(vec![huge.clone(), huge], 1);
        assert_eq!(cart.items[0].total_price, i64::MAX);
        assert_eq!(cart.total_price, i64::MAX);
    }

    #[test]
    fn client_supplied_totals_are_overwritten() {
        let mut l = line(1000, 2, &[]);
        l.total_price = 1;
        let cart = CartState::from_lines(vec![l, line(300, 1, &[200])], 42);
        assert_eq!(cart.items[0].total_price, 2000);
        assert_eq!(cart.items[1].total_price, 500);
        assert_eq!(cart.total_price, 2500);
        assert_eq!(cart.last_updated, 42);
    }

    #[test]
    fn cart_serializes_camel_case() {
        let cart = CartState::from_lines(vec![line(1000, 2, &[])], 7);
        let v = serde_json::to_value(&cart).unwrap();
        assert_eq!(v["totalPrice"], 2000);
        assert_eq!(v["lastUpdated"], 7);
        assert_eq!(v["items"][0]["menuItemId"], 1);
    }

    #[test]
    fn cart_line_accepts_missing_derived_fields() {
        let l: CartLine =
            serde_json::from_str(r#"{"menuItemId":4,"name":"Odeng","price":3000,"quantity":1}"#)
                .unwrap();
        assert!(l.options.is_empty());
        assert_eq!(l.normalized().total_price, 3000);
    }
}
