//! Monetary units and money range rules.

pub type Amount = i64;

pub const COIN: Amount = 1_000_000;

/// No amount larger than this (in base units) is valid.
pub const MAX_MONEY: Amount = 45_000_000_000 * COIN;

pub fn money_range(value: Amount) -> bool {
    (0..=MAX_MONEY).contains(&value)
}

/// Sums amounts, failing on overflow or when the running total leaves the money range.
pub fn checked_sum<I>(values: I) -> Option<Amount>
where
    I: IntoIterator<Item = Amount>,
{
    let mut total: Amount = 0;
    for value in values {
        if !money_range(value) {
            return None;
        }
        total = total.checked_add(value)?;
        if !money_range(total) {
            return None;
        }
    }
    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sum_rejects_out_of_range() {
        assert_eq!(checked_sum([1, 2, 3]), Some(6));
        assert_eq!(checked_sum(Vec::new()), Some(0));
        assert_eq!(checked_sum([MAX_MONEY, 1]), None);
        assert_eq!(checked_sum([-1]), None);
    }
}
