/// A display item placed into a surface cell.
///
/// Items are plain values: every stamp and every button placement writes a
/// fresh clone, so nothing on a surface aliases template state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Item {
    /// Host material key (e.g. `"gray_pane"`, `"emerald"`).
    pub material: String,
    /// Optional display name shown instead of the material.
    pub label: Option<String>,
    /// Stack size.
    pub amount: u32,
}

impl Item {
    /// Create a single item of the given material.
    pub fn new(material: impl Into<String>) -> Self {
        Self {
            material: material.into(),
            label: None,
            amount: 1,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_amount(mut self, amount: u32) -> Self {
        self.amount = amount;
        self
    }

    /// Text a host should show for this item: the label if set, else the material.
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.material)
    }
}

impl From<&str> for Item {
    fn from(material: &str) -> Self {
        Item::new(material)
    }
}

impl From<String> for Item {
    fn from(material: String) -> Self {
        Item::new(material)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_prefers_label() {
        let plain = Item::new("stone");
        assert_eq!(plain.display_name(), "stone");
        let named = Item::new("stone").with_label("Back");
        assert_eq!(named.display_name(), "Back");
    }

    #[test]
    fn builder_sets_amount() {
        let item = Item::from("arrow").with_amount(16);
        assert_eq!(item.amount, 16);
        assert_eq!(item.material, "arrow");
    }
}
