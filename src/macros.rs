#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

/// Build a [`Category`](crate::Category) from literal fields, panicking on
/// validation errors. Intended for fixtures and tests.
///
/// ```
/// use patterngraph::category;
///
/// let c = category!(pattern: "hello *", template: "Hi!");
/// assert_eq!(c.pattern(), "HELLO *");
/// assert_eq!(c.that(), "*");
/// ```
#[macro_export]
macro_rules! category {
    (
        pattern: $pattern:expr
        $(, that: $that:expr)?
        $(, topic: $topic:expr)?
        , template: $template:expr
        $(, source: $source:expr)?
        $(,)?
    ) => {{
        let that: &str = $crate::__field_or!("*" $(, $that)?);
        let topic: &str = $crate::__field_or!("*" $(, $topic)?);
        let source: &str = $crate::__field_or!("unknown.aiml" $(, $source)?);
        $crate::Category::new($pattern, that, topic, $template, source)
            .unwrap_or_else(|err| panic!("invalid category fixture: {err}"))
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __field_or {
    ($default:expr) => {
        $default
    };
    ($default:expr, $value:expr) => {
        $value
    };
}
