//! Chat-platform footer protocol (spec.md §6): every card/reply writes a footer
//! that round-trips to an `OrderID`. Three formats are recognised for backward
//! compatibility.

/// `OrderID`s are 24 hex-char identifiers (spec.md §3).
fn is_order_id(s: &str) -> bool {
    s.len() == 24 && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// Parse a footer string into the `OrderID` it encodes, if any.
pub fn parse_order_id(footer: &str) -> Option<String> {
    let trimmed = footer.trim();

    if is_order_id(trimmed) {
        return Some(trimmed.to_string());
    }

    if let Some(rest) = trimmed.strip_prefix("🔗 ") {
        if is_order_id(rest) {
            return Some(rest.to_string());
        }
    }

    if let Some(rest) = trimmed.strip_prefix("Order: ") {
        if is_order_id(rest) {
            return Some(rest.to_string());
        }
    }

    None
}

pub fn render(order_id: &str) -> String {
    order_id.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "507f1f77bcf86cd799439011";

    #[test]
    fn parses_bare_id() {
        assert_eq!(parse_order_id(ID), Some(ID.to_string()));
    }

    #[test]
    fn parses_link_prefixed_id() {
        assert_eq!(parse_order_id(&format!("🔗 {ID}")), Some(ID.to_string()));
    }

    #[test]
    fn parses_order_label_id() {
        assert_eq!(parse_order_id(&format!("Order: {ID}")), Some(ID.to_string()));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_order_id("not an order id"), None);
        assert_eq!(parse_order_id("Order: too-short"), None);
    }
}
