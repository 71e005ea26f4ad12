#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

/// Builds a [`Rule`](crate::Rule) from its metadata and the two application
/// forms.
#[macro_export]
macro_rules! rule {
    (
        name: $name:expr,
        symbolic: $symbolic:expr,
        docs: $docs:expr
        $(, reusable: $reusable:expr)?
        , context: $context:expr,
        strict: $strict:expr,
        naive: $naive:expr
        $(,)?
    ) => {{
        $crate::Rule {
            name: $name,
            symbolic: $symbolic,
            docs: $docs,
            reusable: { false $(|| $reusable)? },
            context: $context,
            strict: Box::new($strict),
            naive: Box::new($naive),
        }
    }};
}
