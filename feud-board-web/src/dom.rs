//! The subset of the DOM touched by the built-in renderers.

/// An error returned by a DOM operation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct DomError(pub String);

/// A document in which elements are looked up by id.
pub trait Document {
    type Element: Element;

    /// Returns the element with the given `id`. Pages are not required to contain every element,
    /// so `None` is not an error.
    fn element_by_id(&self, id: &str) -> Option<Self::Element>;
}

pub trait Element {
    /// Replaces the text content of the element.
    fn set_text(&self, text: &str);

    /// Adds `class` to the element if `present` is `true`, removes it otherwise.
    fn set_class(&self, class: &str, present: bool) -> Result<(), DomError>;
}

impl Document for web_sys::Document {
    type Element = web_sys::Element;

    #[inline]
    fn element_by_id(&self, id: &str) -> Option<Self::Element> {
        self.get_element_by_id(id)
    }
}

impl Element for web_sys::Element {
    #[inline]
    fn set_text(&self, text: &str) {
        self.set_text_content(Some(text));
    }

    fn set_class(&self, class: &str, present: bool) -> Result<(), DomError> {
        match self.class_list().toggle_with_force(class, present) {
            Ok(_) => Ok(()),
            Err(err) => Err(DomError(format!(
                "failed to toggle class {} on #{}: {:?}",
                class,
                self.id(),
                err
            ))),
        }
    }
}
