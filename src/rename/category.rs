//! Android resource categories, one nested accessor class each.

use strum::{AsRefStr, Display, EnumCount, EnumIter, EnumString};

/// A resource category, named as its nested accessor class (`R$<category>`).
///
/// # Examples
///
/// ```rust
/// use rembed::rename::ResourceCategory;
/// use strum::{EnumCount, IntoEnumIterator};
///
/// assert_eq!(ResourceCategory::COUNT, 23);
/// assert_eq!(ResourceCategory::Drawable.to_string(), "drawable");
/// assert_eq!(ResourceCategory::iter().next(), Some(ResourceCategory::Anim));
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    EnumCount,
    AsRefStr,
    Display,
    EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[allow(missing_docs)]
pub enum ResourceCategory {
    Anim,
    Animator,
    Array,
    Attr,
    Bool,
    Color,
    Dimen,
    Drawable,
    Font,
    Fraction,
    Id,
    Integer,
    Interpolator,
    Layout,
    Menu,
    Mipmap,
    Plurals,
    Raw,
    String,
    Style,
    Styleable,
    Transition,
    Xml,
}

#[cfg(test)]
mod tests {
    use std::{collections::HashSet, str::FromStr};

    use strum::{EnumCount, IntoEnumIterator};

    use super::*;

    #[test]
    fn names_are_lowercase_and_unique() {
        let names: HashSet<String> = ResourceCategory::iter().map(|c| c.to_string()).collect();
        assert_eq!(names.len(), ResourceCategory::COUNT);
        assert!(names.iter().all(|name| name.chars().all(|c| c.is_ascii_lowercase())));
        assert_eq!(ResourceCategory::Styleable.as_ref(), "styleable");
    }

    #[test]
    fn parses_from_name() {
        assert_eq!(
            ResourceCategory::from_str("interpolator").unwrap(),
            ResourceCategory::Interpolator
        );
        assert!(ResourceCategory::from_str("raws").is_err());
    }
}
