/// Whether the model is currently selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    Idle,
    Selected,
}

impl Selection {
    /// A hit toggles the selection; a miss always clears it.
    pub fn on_click(self, hit: bool) -> Self {
        match (self, hit) {
            (Self::Idle, true) => Self::Selected,
            (Self::Selected, true) => Self::Idle,
            (_, false) => Self::Idle,
        }
    }

    pub fn is_selected(self) -> bool {
        self == Self::Selected
    }
}
