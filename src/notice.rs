use std::fmt;

/// User-facing notices raised by form and picker operations.
///
/// A notice never changes state: the operation that raised it leaves the
/// form exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A category was submitted with no node behind it.
    ChooseAnotherCategory,
    /// The category title is already attached to the product.
    AlreadySelected { title: String },
    /// The category parent chain loops back on itself.
    MalformedHierarchy { node_id: String },
    /// Special price must stay below the regular price.
    PromotionPriceTooHigh,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::ChooseAnotherCategory => write!(f, "Please choose another category"),
            Notice::AlreadySelected { title } => {
                write!(f, "Category \"{}\" is already selected", title)
            }
            Notice::MalformedHierarchy { node_id } => {
                write!(f, "Category {} has a malformed hierarchy", node_id)
            }
            Notice::PromotionPriceTooHigh => {
                write!(f, "Promotion price must be less than the default price")
            }
        }
    }
}
