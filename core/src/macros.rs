/// Builds a [`Record`](crate::Record) from `name => value` pairs.
///
/// Works for both props and state, since they share one representation.
///
/// # Usage
///
/// ```ignore
/// let props = props! { "class" => "row", "count" => 3 };
/// let state = props! { "mode" => "say" };
/// ```
#[macro_export]
macro_rules! props {
    () => {
        $crate::Record::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {
        $crate::Record::new()$(.with($name, $value))+
    };
}

/// Builds an [`Element`](crate::Element) from a tag, optional props and children.
///
/// # Usage
///
/// ```ignore
/// let list = el!("ul" { "class" => "todo" } [
///     el!("li" [text("first")]),
///     el!("li" [text("second")]),
/// ]);
/// ```
#[macro_export]
macro_rules! el {
    ($tag:tt) => {
        $crate::element($tag)
    };
    ($tag:tt { $($name:expr => $value:expr),* $(,)? }) => {
        $crate::element($tag).props($crate::props!($($name => $value),*))
    };
    ($tag:tt [ $($child:expr),* $(,)? ]) => {
        $crate::element($tag)$(.child($child))*
    };
    ($tag:tt { $($name:expr => $value:expr),* $(,)? } [ $($child:expr),* $(,)? ]) => {
        $crate::element($tag)
            .props($crate::props!($($name => $value),*))
            $(.child($child))*
    };
}
