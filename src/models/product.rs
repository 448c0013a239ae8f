use serde::{Deserialize, Serialize};

/// A catalog entry. Prices are whole Indian Rupees.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: u32,
    pub image: String,
    pub description: String,
    pub brand: String,
}

impl Product {
    /// Price in Indian digit grouping, e.g. `₹2,499` or `₹12,50,000`.
    pub fn display_price(&self) -> String {
        format!("₹{}", group_indian(self.price))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PriceComparison {
    pub platform: String,
    pub price: u32,
    pub delivery_days: u32,
    pub in_stock: bool,
    pub logo: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OfflineStore {
    pub name: String,
    pub distance: String,
    pub address: String,
    pub phone: String,
}

/// Last three digits, then groups of two (lakh/crore).
fn group_indian(value: u32) -> String {
    let digits = value.to_string();
    if digits.len() <= 3 {
        return digits;
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut out = String::with_capacity(digits.len() + digits.len() / 2);
    for (idx, ch) in head.chars().enumerate() {
        if idx > 0 && (head.len() - idx) % 2 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.push(',');
    out.push_str(tail);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_prices_in_lakhs() {
        assert_eq!(group_indian(0), "0");
        assert_eq!(group_indian(999), "999");
        assert_eq!(group_indian(2499), "2,499");
        assert_eq!(group_indian(99999), "99,999");
        assert_eq!(group_indian(100000), "1,00,000");
        assert_eq!(group_indian(1250000), "12,50,000");
        assert_eq!(group_indian(123456789), "12,34,56,789");
    }
}
