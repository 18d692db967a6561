//! Class-name tables.

use crate::layout::GridLayout;
use crate::util::{YoloPostError, YoloPostResult};

/// The 20 Pascal VOC class names, in model output order.
pub const VOC_CLASS_NAMES: [&str; 20] = [
    "aeroplane",
    "bicycle",
    "bird",
    "boat",
    "bottle",
    "bus",
    "car",
    "cat",
    "chair",
    "cow",
    "diningtable",
    "dog",
    "horse",
    "motorbike",
    "person",
    "pottedplant",
    "sheep",
    "sofa",
    "train",
    "tvmonitor",
];

/// Ordered class names indexed by class index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassNames {
    names: Vec<String>,
}

impl ClassNames {
    /// Wraps an explicit list of names.
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Parses comma-separated names, trimming whitespace around each entry.
    ///
    /// A trailing separator (or trailing newline) does not add an empty name.
    pub fn parse_comma_separated(text: &str) -> Self {
        let mut names: Vec<String> = text.split(',').map(|s| s.trim().to_owned()).collect();
        if names.last().is_some_and(|s| s.is_empty()) {
            names.pop();
        }
        Self { names }
    }

    /// Pascal VOC names.
    pub fn voc() -> Self {
        Self::new(VOC_CLASS_NAMES.iter().map(|s| (*s).to_owned()).collect())
    }

    /// Name of class `index`.
    pub fn label(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Number of names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True when the table is empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Fails unless there is exactly one name per class of `layout`.
    pub fn ensure_matches(&self, layout: &GridLayout) -> YoloPostResult<()> {
        if self.names.len() != layout.classes() {
            return Err(YoloPostError::ClassCountMismatch {
                expected: layout.classes(),
                got: self.names.len(),
            });
        }
        Ok(())
    }

    /// Iterates over the names in class order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_trims_names() {
        let names = ClassNames::parse_comma_separated("cat, dog,bird ,\n");
        assert_eq!(names.len(), 3);
        assert_eq!(names.label(2), Some("bird"));
        assert_eq!(names.label(3), None);
    }

    #[test]
    fn voc_matches_voc_preset() {
        let names = ClassNames::voc();
        assert!(names.ensure_matches(&GridLayout::tiny_yolov2_voc()).is_ok());
        assert_eq!(names.label(14), Some("person"));
    }

    #[test]
    fn mismatched_table_is_rejected() {
        let names = ClassNames::parse_comma_separated("a,b");
        let err = names
            .ensure_matches(&GridLayout::tiny_yolov2_voc())
            .unwrap_err();
        assert_eq!(
            err,
            YoloPostError::ClassCountMismatch {
                expected: 20,
                got: 2
            }
        );
    }
}
