//! Customer orders: line records expanded into per-unit items.

use crate::item::Item;
use cartonize_core::{Error, PackingConfig, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "serde")]
fn default_quantity() -> usize {
    1
}

/// One line of a customer order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrderLine {
    /// Item name or id.
    pub item_name: String,
    /// Order identifier.
    pub order_id: String,
    /// Unit length.
    pub length: f64,
    /// Unit width.
    pub width: f64,
    /// Unit height.
    pub height: f64,
    /// Unit weight.
    pub weight: f64,
    /// Number of units.
    #[cfg_attr(feature = "serde", serde(default = "default_quantity"))]
    pub quantity: usize,
}

impl OrderLine {
    /// Creates a single-unit line.
    pub fn new(
        item_name: impl Into<String>,
        order_id: impl Into<String>,
        dims: [f64; 3],
        weight: f64,
    ) -> Self {
        Self {
            item_name: item_name.into(),
            order_id: order_id.into(),
            length: dims[0],
            width: dims[1],
            height: dims[2],
            weight,
            quantity: 1,
        }
    }

    /// Sets the number of units.
    pub fn with_quantity(mut self, quantity: usize) -> Self {
        self.quantity = quantity;
        self
    }

    fn validate(&self) -> Result<()> {
        let dims = [self.length, self.width, self.height];
        if dims.iter().any(|&v| !v.is_finite() || v <= 0.0) {
            return Err(Error::InvalidItem(format!(
                "{}: dimensions must be positive, got {:?}",
                self.item_name, dims
            )));
        }
        if !self.weight.is_finite() || self.weight <= 0.0 {
            return Err(Error::InvalidItem(format!(
                "{}: weight must be positive, got {}",
                self.item_name, self.weight
            )));
        }
        if self.quantity == 0 {
            return Err(Error::InvalidItem(format!(
                "{}: quantity must be at least 1",
                self.item_name
            )));
        }
        Ok(())
    }
}

/// An order expanded into units, ready for packing.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    items: Vec<Item>,
    distinct_lines: usize,
}

impl Order {
    /// Expands order lines into items.
    ///
    /// Every unit becomes an item named `{item_name}_Num_{k}`. When the order
    /// has more than one line, units are sorted by their longest side,
    /// longest first; units with equal longest sides come out in reverse
    /// line and unit order.
    pub fn from_lines(lines: &[OrderLine], config: &PackingConfig) -> Result<Self> {
        if lines.is_empty() {
            return Err(Error::InvalidItem("order has no lines".into()));
        }
        for line in lines {
            line.validate()?;
        }
        let total: usize = lines.iter().map(|l| l.quantity).sum();
        if total > config.max_order_items {
            return Err(Error::InvalidItem(format!(
                "order has {} units, at most {} are supported",
                total, config.max_order_items
            )));
        }

        let mut units = Vec::with_capacity(total);
        for line in lines {
            for k in 1..=line.quantity {
                units.push(Item::new(
                    0,
                    format!("{}_Num_{}", line.item_name, k),
                    line.order_id.clone(),
                    [line.length, line.width, line.height],
                    line.weight,
                )?);
            }
        }
        if lines.len() > 1 {
            units.sort_by(|a, b| {
                a.base_real_size()[0]
                    .partial_cmp(&b.base_real_size()[0])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            units.reverse();
        }
        for (id, item) in units.iter_mut().enumerate() {
            item.id = id;
        }

        Ok(Self {
            items: units,
            distinct_lines: lines.len(),
        })
    }

    /// Units in packing order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Number of order lines.
    pub fn distinct_lines(&self) -> usize {
        self.distinct_lines
    }

    /// Number of units.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the order has no units.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
