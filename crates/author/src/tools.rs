use cubeedit_common::Colour;
use serde::{Deserialize, Serialize};

/// Swatches offered when no configuration supplies any.
pub const DEFAULT_SWATCHES: [&str; 6] = [
    "#E63946", "#F4A261", "#E9C46A", "#2A9D8F", "#457B9D", "#FFFFFF",
];

/// What a click does, as chosen in the control bar.
pub trait ToolSelection {
    fn is_deleting(&self) -> bool;
    /// Colour for new cubes. Black while deleting.
    fn current_colour(&self) -> Colour;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tool {
    Delete,
    /// Paint with the swatch at this slot.
    Swatch(usize),
}

/// A delete tool followed by editable colour swatches. Exactly one is selected.
///
/// Swatches are kept as the text the user typed; parsing happens when a
/// colour is needed, so a malformed entry still shows its label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlBar {
    swatches: Vec<String>,
    selected: Tool,
}

impl ControlBar {
    /// Select the first swatch, or the delete tool if there are none.
    pub fn new(swatches: Vec<String>) -> Self {
        let selected = if swatches.is_empty() {
            Tool::Delete
        } else {
            Tool::Swatch(0)
        };
        Self { swatches, selected }
    }

    pub fn selected(&self) -> Tool {
        self.selected
    }

    pub fn swatches(&self) -> &[String] {
        &self.swatches
    }

    /// Switch tools. Selecting a swatch slot that does not exist is ignored.
    pub fn select(&mut self, tool: Tool) {
        if let Tool::Swatch(slot) = tool
            && slot >= self.swatches.len()
        {
            tracing::debug!(slot, "no such swatch");
            return;
        }
        self.selected = tool;
    }

    /// Replace the text of a swatch, as a colour picker would.
    pub fn set_swatch(&mut self, slot: usize, text: impl Into<String>) {
        match self.swatches.get_mut(slot) {
            Some(swatch) => *swatch = text.into(),
            None => tracing::debug!(slot, "no such swatch"),
        }
    }

    /// Colour of a swatch, black when its text is not `#RRGGBB`.
    pub fn swatch_colour(&self, slot: usize) -> Option<Colour> {
        self.swatches.get(slot).map(|text| Colour::from_hex(text))
    }
}

impl Default for ControlBar {
    fn default() -> Self {
        Self::new(DEFAULT_SWATCHES.iter().map(|s| s.to_string()).collect())
    }
}

impl ToolSelection for ControlBar {
    fn is_deleting(&self) -> bool {
        self.selected == Tool::Delete
    }

    fn current_colour(&self) -> Colour {
        match self.selected {
            Tool::Delete => Colour::BLACK,
            Tool::Swatch(slot) => self.swatch_colour(slot).unwrap_or(Colour::BLACK),
        }
    }
}
