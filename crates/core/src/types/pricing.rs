//! Line item pricing.
//!
//! Cart items and order items price themselves the same way: quantity times
//! the product's current price. Order items do not snapshot the price at
//! purchase time, so both totals move when the catalog price changes.

use rust_decimal::Decimal;

/// Total for `quantity` units at `unit_price`.
#[must_use]
pub fn line_total(quantity: i32, unit_price: Decimal) -> Decimal {
    Decimal::from(quantity) * unit_price
}

/// A priced (product, quantity) pair inside a cart or an order.
pub trait LineItem {
    /// Number of units.
    fn quantity(&self) -> i32;

    /// Current price of one unit.
    fn unit_price(&self) -> Decimal;

    /// Quantity times unit price.
    fn total_price(&self) -> Decimal {
        line_total(self.quantity(), self.unit_price())
    }
}

/// Sum of the totals of `items`. Zero for an empty collection.
pub fn sum_line_totals<'a, T, I>(items: I) -> Decimal
where
    T: LineItem + 'a,
    I: IntoIterator<Item = &'a T>,
{
    items.into_iter().map(LineItem::total_price).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Line(i32, Decimal);

    impl LineItem for Line {
        fn quantity(&self) -> i32 {
            self.0
        }

        fn unit_price(&self) -> Decimal {
            self.1
        }
    }

    #[test]
    fn test_line_total() {
        assert_eq!(line_total(2, Decimal::new(1999, 2)), Decimal::new(3998, 2));
        assert_eq!(line_total(0, Decimal::new(1999, 2)), Decimal::ZERO);
    }

    #[test]
    fn test_line_item_total_uses_line_total() {
        let line = Line(3, Decimal::new(1050, 2));
        assert_eq!(line.total_price(), Decimal::new(3150, 2));
    }

    #[test]
    fn test_sum_line_totals() {
        let lines = vec![
            Line(2, Decimal::new(1999, 2)),
            Line(1, Decimal::new(500, 2)),
            Line(4, Decimal::new(25, 2)),
        ];
        assert_eq!(sum_line_totals(&lines), Decimal::new(4598, 2));
    }

    #[test]
    fn test_sum_of_nothing_is_zero() {
        let lines: Vec<Line> = Vec::new();
        assert_eq!(sum_line_totals(&lines), Decimal::ZERO);
    }
}
