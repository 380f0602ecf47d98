// models.rs - Core order record and related enums

use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;
use std::time::Instant;

/// Order side: Buy or Sell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order status over its lifetime in the pipeline
///
/// Every order enters as `Pending`. The remaining states exist for the
/// downstream systems that receive batches; the pipeline itself never
/// transitions an order out of `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Filled,
    Cancelled,
    Rejected,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Filled => "FILLED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Rejected => "REJECTED",
        }
    }
}

// ============================================================
// ORDER (the fixed-layout record moved through the pipeline)
// ============================================================

/// Number of bytes in the inline symbol field, including the NUL terminator.
pub const SYMBOL_LEN: usize = 16;

/// A single buy/sell intent, ~44 bytes, trivially copyable.
///
/// The symbol lives inline as a NUL-terminated byte array so that orders
/// can cross the ring and the batcher without touching the heap. Prices
/// are carried as integer cents; quantities as whole units.
///
/// Equality and ordering consider `order_id` only. Uniqueness of ids is
/// guaranteed per producer, not globally.
#[derive(Debug, Clone, Copy)]
pub struct Order {
    pub order_id: u64,
    /// Creation time from the process monotonic clock, in nanoseconds.
    pub timestamp_ns: u64,
    /// NUL-terminated ASCII, truncated to 15 chars on overflow.
    pub symbol: [u8; SYMBOL_LEN],
    pub quantity: u32,
    /// Price scaled by 100, rounded half-up at construction.
    pub price_cents: u32,
    pub side: Side,
    pub status: OrderStatus,
    /// Zero. Reserved for alignment/versioning.
    pub reserved: u16,
}

fn encode_symbol(symbol: &str) -> [u8; SYMBOL_LEN] {
    let mut buf = [0u8; SYMBOL_LEN];
    let bytes = symbol.as_bytes();
    // Last byte stays NUL so the field is always terminated
    let n = bytes.len().min(SYMBOL_LEN - 1);
    buf[..n].copy_from_slice(&bytes[..n]);
    buf
}

/// Shared zero point so timestamps taken on different threads compare.
static CLOCK_EPOCH: OnceLock<Instant> = OnceLock::new();

/// Monotonic nanoseconds since the first order was stamped. Never moves
/// backward, unlike wall-clock time under NTP adjustment.
fn now_ns() -> u64 {
    CLOCK_EPOCH.get_or_init(Instant::now).elapsed().as_nanos() as u64
}

impl Order {
    /// Create a new pending order stamped with the current time.
    pub fn new(order_id: u64, symbol: &str, side: Side, price: f64, quantity: u32) -> Self {
        Self {
            order_id,
            timestamp_ns: now_ns(),
            symbol: encode_symbol(symbol),
            quantity,
            price_cents: (price * 100.0 + 0.5) as u32,
            side,
            status: OrderStatus::Pending,
            reserved: 0,
        }
    }

    /// Convenience constructor for a buy order.
    pub fn buy(order_id: u64, symbol: &str, price: f64, quantity: u32) -> Self {
        Self::new(order_id, symbol, Side::Buy, price, quantity)
    }

    /// Convenience constructor for a sell order.
    pub fn sell(order_id: u64, symbol: &str, price: f64, quantity: u32) -> Self {
        Self::new(order_id, symbol, Side::Sell, price, quantity)
    }

    /// Symbol as a string slice (up to the first NUL).
    pub fn symbol(&self) -> &str {
        let end = self
            .symbol
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(SYMBOL_LEN);
        std::str::from_utf8(&self.symbol[..end]).unwrap_or("")
    }

    /// Price in decimal units.
    #[inline]
    pub fn price(&self) -> f64 {
        self.price_cents as f64 / 100.0
    }

    /// Set the price from a decimal value, rounding half-up to cents.
    pub fn set_price(&mut self, price: f64) {
        self.price_cents = (price * 100.0 + 0.5) as u32;
    }

    /// Notional value in cents. Widened to u64: quantity and price each
    /// fit u32 but their product does not.
    #[inline]
    pub fn value_cents(&self) -> u64 {
        self.quantity as u64 * self.price_cents as u64
    }

    /// Notional value in decimal units.
    #[inline]
    pub fn value(&self) -> f64 {
        self.value_cents() as f64 / 100.0
    }

    /// A well-formed order: non-zero id, positive quantity and price,
    /// non-empty symbol.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.order_id != 0 && self.quantity > 0 && self.price_cents > 0 && self.symbol[0] != 0
    }

    #[inline]
    pub fn is_buy(&self) -> bool {
        self.side == Side::Buy
    }

    #[inline]
    pub fn is_sell(&self) -> bool {
        self.side == Side::Sell
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }
}

// Identity is the order id; two records with the same id compare equal
// even if their payloads differ.
impl PartialEq for Order {
    fn eq(&self, other: &Self) -> bool {
        self.order_id == other.order_id
    }
}

impl Eq for Order {}

impl PartialOrd for Order {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Order {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order_id.cmp(&other.order_id)
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Order[{}] {} {} {}@{:.2} {} t={}",
            self.order_id,
            self.symbol(),
            self.side,
            self.quantity,
            self.price(),
            self.status.as_str(),
            self.timestamp_ns
        )
    }
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_order_is_pending_and_valid() {
        let order = Order::new(1, "AAPL", Side::Buy, 150.25, 100);

        assert_eq!(order.order_id, 1);
        assert_eq!(order.symbol(), "AAPL");
        assert_eq!(order.quantity, 100);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.reserved, 0);
        assert!(order.is_valid());
        assert!(order.is_pending());
    }

    #[test]
    fn test_timestamps_never_move_backward() {
        let mut prev = Order::new(1, "AAPL", Side::Buy, 100.0, 1).timestamp_ns;
        for id in 2..=100 {
            let ts = Order::new(id, "AAPL", Side::Buy, 100.0, 1).timestamp_ns;
            assert!(ts >= prev, "timestamp regressed: {ts} < {prev}");
            prev = ts;
        }
    }

    #[test]
    fn test_price_rounds_to_nearest_cent() {
        // 150.256 → 15025.6 rounds up to 15026
        let order = Order::new(1, "AAPL", Side::Buy, 150.256, 1);
        assert_eq!(order.price_cents, 15026);

        // 99.994 → 9999.4 rounds down to 9999
        let order = Order::new(2, "AAPL", Side::Sell, 99.994, 1);
        assert_eq!(order.price_cents, 9999);
    }

    #[test]
    fn test_price_round_trip_within_half_cent() {
        // Round-tripping decimal → cents → decimal must stay within 0.005
        for &price in &[100.0, 150.25, 199.99, 0.01, 123.456] {
            let order = Order::new(1, "MSFT", Side::Buy, price, 1);
            assert!(
                (order.price() - price).abs() <= 0.005,
                "price {} round-tripped to {}",
                price,
                order.price()
            );
        }
    }

    #[test]
    fn test_set_price() {
        let mut order = Order::new(1, "AAPL", Side::Buy, 100.0, 1);
        order.set_price(175.50);
        assert_eq!(order.price_cents, 17550);
        assert!((order.price() - 175.50).abs() < f64::EPSILON);
    }

    #[test]
    fn test_symbol_truncated_to_15_chars() {
        let order = Order::new(1, "VERYLONGSYMBOLNAME", Side::Buy, 100.0, 1);
        // 15 chars kept, terminator preserved
        assert_eq!(order.symbol(), "VERYLONGSYMBOLN");
        assert_eq!(order.symbol[SYMBOL_LEN - 1], 0);
        assert!(order.is_valid());
    }

    #[test]
    fn test_invalid_orders() {
        // Zero id
        assert!(!Order::new(0, "AAPL", Side::Buy, 100.0, 10).is_valid());
        // Zero quantity
        assert!(!Order::new(1, "AAPL", Side::Buy, 100.0, 0).is_valid());
        // Zero price
        assert!(!Order::new(1, "AAPL", Side::Buy, 0.0, 10).is_valid());
        // Empty symbol
        assert!(!Order::new(1, "", Side::Buy, 100.0, 10).is_valid());
    }

    #[test]
    fn test_value_cents_widens_to_u64() {
        // u32::MAX quantity at u32::MAX cents overflows u32 but not u64
        let mut order = Order::new(1, "AAPL", Side::Buy, 1.0, u32::MAX);
        order.price_cents = u32::MAX;
        assert_eq!(order.value_cents(), u32::MAX as u64 * u32::MAX as u64);
    }

    #[test]
    fn test_equality_and_ordering_by_id_only() {
        let a = Order::new(7, "AAPL", Side::Buy, 100.0, 10);
        let b = Order::new(7, "TSLA", Side::Sell, 200.0, 99);
        let c = Order::new(8, "AAPL", Side::Buy, 100.0, 10);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a < c);
    }

    #[test]
    fn test_side_predicates() {
        assert!(Order::buy(1, "AAPL", 100.0, 1).is_buy());
        assert!(Order::sell(2, "AAPL", 100.0, 1).is_sell());
    }

    #[test]
    fn test_display_format() {
        let order = Order::buy(42, "GOOGL", 150.25, 10);
        let s = order.to_string();
        assert!(s.starts_with("Order[42] GOOGL BUY 10@150.25 PENDING"), "{s}");
    }
}
